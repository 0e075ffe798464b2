//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Upper bound on `session_ttl_secs` (ten years). Keeps configured
/// lifetimes inside the range the expiry arithmetic supports.
const MAX_SESSION_TTL_SECS: i64 = 315_360_000;

/// Authentication configuration.
///
/// Validated once at startup and shared immutably with the cookie codec,
/// the session service and the OAuth client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Public origin of the frontend application. Login redirects land here.
    pub app_origin: String,

    /// Public origin of this API. OAuth redirect URIs are built from it.
    pub api_origin: String,

    /// Allowed CORS origins. If empty, only the app origin is allowed.
    pub allowed_origins: Vec<String>,

    /// Session lifetime in seconds.
    pub session_ttl_secs: i64,

    /// Session cookie attributes.
    pub cookie: CookieConfig,

    /// Google OAuth credentials.
    pub google: Option<ProviderCredentials>,

    /// Discord OAuth credentials.
    pub discord: Option<ProviderCredentials>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            app_origin: "http://localhost:3000".to_string(),
            api_origin: "http://localhost:8080".to_string(),
            allowed_origins: Vec::new(),
            session_ttl_secs: 2_592_000,
            cookie: CookieConfig::default(),
            google: None,
            discord: None,
        }
    }
}

impl AuthConfig {
    /// Origins allowed for CORS. Falls back to the app origin when the list
    /// is not configured.
    pub fn cors_origins(&self) -> Vec<String> {
        if self.allowed_origins.is_empty() {
            vec![self.app_origin.clone()]
        } else {
            self.allowed_origins.clone()
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        validate_origin("app_origin", &self.app_origin)?;
        validate_origin("api_origin", &self.api_origin)?;
        for origin in &self.allowed_origins {
            validate_origin("allowed_origins", origin)?;
        }

        if self.session_ttl_secs <= 0 {
            return Err(ConfigValidationError::NonPositiveTtl);
        }

        if self.session_ttl_secs > MAX_SESSION_TTL_SECS {
            return Err(ConfigValidationError::ExcessiveTtl);
        }

        if self.cookie.name.is_empty() {
            return Err(ConfigValidationError::EmptyCookieName);
        }

        if self.cookie.same_site == SameSite::None && !self.cookie.secure {
            return Err(ConfigValidationError::SameSiteNoneRequiresSecure);
        }

        if let Some(ref creds) = self.google {
            creds.validate("google")?;
        }
        if let Some(ref creds) = self.discord {
            creds.validate("discord")?;
        }

        Ok(())
    }
}

fn validate_origin(field: &str, value: &str) -> Result<(), ConfigValidationError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigValidationError::InvalidOrigin(field.to_string()))
    }
}

/// Session cookie attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieConfig {
    /// Cookie name.
    pub name: String,

    /// Optional `Domain` attribute.
    pub domain: Option<String>,

    /// Set the `Secure` attribute.
    pub secure: bool,

    /// `SameSite` attribute.
    pub same_site: SameSite,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "wicket_session".to_string(),
            domain: None,
            secure: false,
            same_site: SameSite::Lax,
        }
    }
}

/// `SameSite` cookie attribute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    Lax,
    Strict,
    None,
}

impl std::fmt::Display for SameSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SameSite::Lax => write!(f, "Lax"),
            SameSite::Strict => write!(f, "Strict"),
            SameSite::None => write!(f, "None"),
        }
    }
}

/// OAuth client credentials for one provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderCredentials {
    /// Client ID issued by the provider.
    pub client_id: String,

    /// Client secret, either a literal or `env:VAR_NAME`.
    pub client_secret: String,
}

impl ProviderCredentials {
    /// Resolve the client secret, expanding `env:VAR_NAME` syntax.
    pub fn resolve_client_secret(&self) -> Result<String, ConfigValidationError> {
        if let Some(var_name) = self.client_secret.strip_prefix("env:") {
            match std::env::var(var_name) {
                Ok(secret) if !secret.is_empty() => Ok(secret),
                Ok(_) => Err(ConfigValidationError::EnvVarEmpty(var_name.to_string())),
                Err(_) => Err(ConfigValidationError::EnvVarNotFound(var_name.to_string())),
            }
        } else {
            Ok(self.client_secret.clone())
        }
    }

    fn validate(&self, provider: &str) -> Result<(), ConfigValidationError> {
        if self.client_id.is_empty() {
            return Err(ConfigValidationError::MissingClientId(provider.to_string()));
        }
        if self.client_secret.is_empty() {
            return Err(ConfigValidationError::MissingClientSecret(
                provider.to_string(),
            ));
        }
        self.resolve_client_secret()?;
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// An origin is not an absolute http(s) URL.
    InvalidOrigin(String),
    /// Session TTL must be positive.
    NonPositiveTtl,
    /// Session TTL exceeds the supported maximum.
    ExcessiveTtl,
    /// Cookie name is empty.
    EmptyCookieName,
    /// `SameSite=None` cookies must also be `Secure`.
    SameSiteNoneRequiresSecure,
    /// A configured provider is missing its client ID.
    MissingClientId(String),
    /// A configured provider is missing its client secret.
    MissingClientSecret(String),
    /// Environment variable not found (for `env:VAR_NAME` syntax).
    EnvVarNotFound(String),
    /// Environment variable is empty (for `env:VAR_NAME` syntax).
    EnvVarEmpty(String),
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidOrigin(field) => {
                write!(
                    f,
                    "'{}' must be an absolute http:// or https:// origin.",
                    field
                )
            }
            Self::NonPositiveTtl => {
                write!(f, "session_ttl_secs must be a positive number of seconds.")
            }
            Self::ExcessiveTtl => {
                write!(
                    f,
                    "session_ttl_secs must not exceed {} seconds (ten years).",
                    MAX_SESSION_TTL_SECS
                )
            }
            Self::EmptyCookieName => {
                write!(f, "cookie.name must not be empty.")
            }
            Self::SameSiteNoneRequiresSecure => {
                write!(
                    f,
                    "cookie.same_site = \"none\" requires cookie.secure = true."
                )
            }
            Self::MissingClientId(provider) => {
                write!(f, "OAuth provider '{}' is missing client_id.", provider)
            }
            Self::MissingClientSecret(provider) => {
                write!(f, "OAuth provider '{}' is missing client_secret.", provider)
            }
            Self::EnvVarNotFound(var) => {
                write!(
                    f,
                    "Environment variable '{}' not found (referenced via env:{} in config).",
                    var, var
                )
            }
            Self::EnvVarEmpty(var) => {
                write!(
                    f,
                    "Environment variable '{}' is empty (referenced via env:{} in config).",
                    var, var
                )
            }
        }
    }
}

impl std::error::Error for ConfigValidationError {}

#[cfg(test)]
#[allow(clippy::field_reassign_with_default)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_config_default() {
        let config = AuthConfig::default();
        assert_eq!(config.session_ttl_secs, 2_592_000);
        assert_eq!(config.cookie.name, "wicket_session");
        assert_eq!(config.cookie.same_site, SameSite::Lax);
        assert!(!config.cookie.secure);
        assert!(config.cookie.domain.is_none());
        assert!(config.google.is_none());
        assert!(config.discord.is_none());
    }

    #[test]
    fn test_default_config_validates() {
        assert!(AuthConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_positive_ttl() {
        let mut config = AuthConfig::default();
        config.session_ttl_secs = 0;
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigValidationError::NonPositiveTtl
        );
    }

    #[test]
    fn test_validate_rejects_excessive_ttl() {
        let mut config = AuthConfig::default();
        config.session_ttl_secs = MAX_SESSION_TTL_SECS + 1;
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigValidationError::ExcessiveTtl
        );

        // An i64::MAX lifetime would overflow the expiry arithmetic; it has
        // to die here instead.
        config.session_ttl_secs = i64::MAX;
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigValidationError::ExcessiveTtl
        );
    }

    #[test]
    fn test_validate_accepts_max_ttl() {
        let mut config = AuthConfig::default();
        config.session_ttl_secs = MAX_SESSION_TTL_SECS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_relative_origin() {
        let mut config = AuthConfig::default();
        config.app_origin = "localhost:3000".to_string();
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigValidationError::InvalidOrigin("app_origin".to_string())
        );
    }

    #[test]
    fn test_validate_rejects_samesite_none_without_secure() {
        let mut config = AuthConfig::default();
        config.cookie.same_site = SameSite::None;
        config.cookie.secure = false;
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigValidationError::SameSiteNoneRequiresSecure
        );
    }

    #[test]
    fn test_validate_rejects_provider_without_client_id() {
        let mut config = AuthConfig::default();
        config.google = Some(ProviderCredentials {
            client_id: String::new(),
            client_secret: "secret".to_string(),
        });
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigValidationError::MissingClientId("google".to_string())
        );
    }

    #[test]
    fn test_resolve_client_secret_literal() {
        let creds = ProviderCredentials {
            client_id: "id".to_string(),
            client_secret: "literal-secret".to_string(),
        };
        assert_eq!(
            creds.resolve_client_secret().unwrap(),
            "literal-secret".to_string()
        );
    }

    #[test]
    fn test_resolve_client_secret_env_var() {
        // SAFETY: This is a test-only environment variable with a unique name
        unsafe {
            std::env::set_var("TEST_WICKET_OAUTH_SECRET_9731", "from-env");
        }

        let creds = ProviderCredentials {
            client_id: "id".to_string(),
            client_secret: "env:TEST_WICKET_OAUTH_SECRET_9731".to_string(),
        };
        assert_eq!(creds.resolve_client_secret().unwrap(), "from-env");

        // SAFETY: Cleaning up test environment variable
        unsafe {
            std::env::remove_var("TEST_WICKET_OAUTH_SECRET_9731");
        }
    }

    #[test]
    fn test_resolve_client_secret_env_var_not_found() {
        let creds = ProviderCredentials {
            client_id: "id".to_string(),
            client_secret: "env:NONEXISTENT_WICKET_VAR_9731".to_string(),
        };
        assert_eq!(
            creds.resolve_client_secret().unwrap_err(),
            ConfigValidationError::EnvVarNotFound("NONEXISTENT_WICKET_VAR_9731".to_string())
        );
    }

    #[test]
    fn test_cors_origins_fall_back_to_app_origin() {
        let config = AuthConfig::default();
        assert_eq!(config.cors_origins(), vec![config.app_origin.clone()]);

        let mut config = AuthConfig::default();
        config.allowed_origins = vec!["https://app.example.com".to_string()];
        assert_eq!(
            config.cors_origins(),
            vec!["https://app.example.com".to_string()]
        );
    }

    #[test]
    fn test_same_site_display_and_serde() {
        assert_eq!(SameSite::Lax.to_string(), "Lax");
        assert_eq!(SameSite::None.to_string(), "None");
        let parsed: SameSite = serde_json::from_str("\"strict\"").unwrap();
        assert_eq!(parsed, SameSite::Strict);
    }
}
