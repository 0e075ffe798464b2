//! OAuth providers and the identity exchange client.

use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::auth::{AuthConfig, ProviderCredentials};

/// Supported OAuth providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Google,
    Discord,
}

impl Provider {
    fn authorize_endpoint(self) -> &'static str {
        match self {
            Provider::Google => "https://accounts.google.com/o/oauth2/v2/auth",
            Provider::Discord => "https://discord.com/oauth2/authorize",
        }
    }

    fn token_endpoint(self) -> &'static str {
        match self {
            Provider::Google => "https://oauth2.googleapis.com/token",
            Provider::Discord => "https://discord.com/api/oauth2/token",
        }
    }

    fn userinfo_endpoint(self) -> &'static str {
        match self {
            Provider::Google => "https://openidconnect.googleapis.com/v1/userinfo",
            Provider::Discord => "https://discord.com/api/users/@me",
        }
    }

    fn scope(self) -> &'static str {
        match self {
            Provider::Google => "openid email profile",
            Provider::Discord => "identify email",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Google => write!(f, "google"),
            Provider::Discord => write!(f, "discord"),
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(Provider::Google),
            "discord" => Ok(Provider::Discord),
            _ => Err(format!("unknown provider: {}", s)),
        }
    }
}

/// Identity vouched for by a provider after a successful code exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Email address. May be empty when the provider withholds it, in which
    /// case the login is rejected downstream.
    pub email: String,
    /// Display name, when the provider shares one.
    pub name: Option<String>,
    /// Avatar image URL, when the provider shares one.
    pub avatar_url: Option<String>,
}

/// Boundary between the callback flow and the OAuth providers.
///
/// The production implementation is [`OAuthClient`]; tests substitute a stub
/// so the callback can be exercised without network access.
#[async_trait]
pub trait IdentityExchange: Send + Sync {
    /// Authorization URL the browser is sent to for consent, or `None` when
    /// the provider has no configured credentials.
    fn authorize_url(&self, provider: Provider, state: &str) -> Option<String>;

    /// Exchange an authorization code for the identity it stands for.
    async fn exchange_code(&self, provider: Provider, code: &str) -> Result<Identity>;
}

/// Identity exchange backed by the providers' HTTP APIs.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    config: AuthConfig,
    client: Client,
}

impl OAuthClient {
    pub fn new(config: AuthConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn credentials(&self, provider: Provider) -> Option<&ProviderCredentials> {
        match provider {
            Provider::Google => self.config.google.as_ref(),
            Provider::Discord => self.config.discord.as_ref(),
        }
    }

    /// Redirect URI registered with the provider.
    fn redirect_uri(&self, provider: Provider) -> String {
        format!("{}/api/auth/callback/{}", self.config.api_origin, provider)
    }
}

#[async_trait]
impl IdentityExchange for OAuthClient {
    fn authorize_url(&self, provider: Provider, state: &str) -> Option<String> {
        let creds = self.credentials(provider)?;
        Some(format!(
            "{}?client_id={}&redirect_uri={}&scope={}&state={}&response_type=code",
            provider.authorize_endpoint(),
            urlencoding::encode(&creds.client_id),
            urlencoding::encode(&self.redirect_uri(provider)),
            urlencoding::encode(provider.scope()),
            urlencoding::encode(state),
        ))
    }

    async fn exchange_code(&self, provider: Provider, code: &str) -> Result<Identity> {
        let creds = self
            .credentials(provider)
            .ok_or_else(|| anyhow!("provider '{}' has no configured credentials", provider))?;
        let client_secret = creds.resolve_client_secret()?;
        let redirect_uri = self.redirect_uri(provider);

        let token_response = self
            .client
            .post(provider.token_endpoint())
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", creds.client_id.as_str()),
                ("client_secret", client_secret.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
            ])
            .send()
            .await
            .with_context(|| format!("requesting access token from {}", provider))?;

        if !token_response.status().is_success() {
            let status = token_response.status();
            let body = token_response.text().await.unwrap_or_default();
            bail!("{} token endpoint returned {}: {}", provider, status, body);
        }

        let token: TokenResponse = token_response
            .json()
            .await
            .with_context(|| format!("decoding {} token response", provider))?;

        let userinfo_response = self
            .client
            .get(provider.userinfo_endpoint())
            .bearer_auth(&token.access_token)
            .send()
            .await
            .with_context(|| format!("requesting profile from {}", provider))?;

        if !userinfo_response.status().is_success() {
            let status = userinfo_response.status();
            let body = userinfo_response.text().await.unwrap_or_default();
            bail!("{} userinfo endpoint returned {}: {}", provider, status, body);
        }

        let identity = match provider {
            Provider::Google => {
                let profile: GoogleProfile = userinfo_response
                    .json()
                    .await
                    .context("decoding Google profile")?;
                profile.into_identity()
            }
            Provider::Discord => {
                let profile: DiscordProfile = userinfo_response
                    .json()
                    .await
                    .context("decoding Discord profile")?;
                profile.into_identity()
            }
        };

        debug!(provider = %provider, "exchanged authorization code for identity");
        Ok(identity)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Profile shape returned by Google's OpenID Connect userinfo endpoint.
#[derive(Debug, Deserialize)]
struct GoogleProfile {
    email: Option<String>,
    name: Option<String>,
    given_name: Option<String>,
    picture: Option<String>,
}

impl GoogleProfile {
    fn into_identity(self) -> Identity {
        Identity {
            email: self.email.unwrap_or_default(),
            name: self.name.or(self.given_name),
            avatar_url: self.picture,
        }
    }
}

/// Profile shape returned by Discord's `/users/@me` endpoint.
#[derive(Debug, Deserialize)]
struct DiscordProfile {
    id: String,
    username: String,
    global_name: Option<String>,
    email: Option<String>,
    avatar: Option<String>,
}

impl DiscordProfile {
    fn into_identity(self) -> Identity {
        // Discord returns an avatar hash; the image lives on their CDN.
        let avatar_url = self
            .avatar
            .map(|hash| format!("https://cdn.discordapp.com/avatars/{}/{}.png", self.id, hash));

        let name = self
            .global_name
            .filter(|name| !name.is_empty())
            .or(Some(self.username))
            .filter(|name| !name.is_empty());

        Identity {
            email: self.email.unwrap_or_default(),
            name,
            avatar_url,
        }
    }
}
