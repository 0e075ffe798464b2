//! Session cookie codec.
//!
//! Builds `Set-Cookie` values and pulls the session token back out of
//! request headers. Attributes come from [`CookieConfig`]; `HttpOnly` and
//! `Path=/` are always set so the token stays out of script reach.

use axum::http::{HeaderMap, header};
use chrono::{DateTime, Utc};

use super::config::CookieConfig;

/// Encoder/decoder for the session cookie.
#[derive(Debug, Clone)]
pub struct CookieCodec {
    config: CookieConfig,
}

impl CookieCodec {
    pub fn new(config: CookieConfig) -> Self {
        Self { config }
    }

    /// Build the `Set-Cookie` value carrying `token` until `expires_at`.
    pub fn encode(&self, token: &str, expires_at: DateTime<Utc>) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; Expires={}; HttpOnly; SameSite={}",
            self.config.name,
            token,
            http_date(expires_at),
            self.config.same_site
        );
        if self.config.secure {
            cookie.push_str("; Secure");
        }
        if let Some(ref domain) = self.config.domain {
            cookie.push_str("; Domain=");
            cookie.push_str(domain);
        }
        cookie
    }

    /// Build the clearing `Set-Cookie` value: same attributes, empty value,
    /// epoch expiry.
    pub fn encode_cleared(&self) -> String {
        self.encode("", DateTime::UNIX_EPOCH)
    }

    /// Extract the session token from request cookies.
    ///
    /// Tolerates multiple `Cookie` headers and multiple pairs per header,
    /// matches the configured name exactly, and treats an empty value as
    /// absent. Never fails on malformed input.
    pub fn extract(&self, headers: &HeaderMap) -> Option<String> {
        for value in headers.get_all(header::COOKIE) {
            let Ok(raw) = value.to_str() else {
                continue;
            };
            for pair in raw.split(';') {
                let Some((name, value)) = pair.trim().split_once('=') else {
                    continue;
                };
                if name == self.config.name && !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
        None
    }
}

fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::config::SameSite;
    use chrono::TimeZone;

    fn codec() -> CookieCodec {
        CookieCodec::new(CookieConfig::default())
    }

    fn headers_with_cookie(raw: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, raw.parse().unwrap());
        headers
    }

    #[test]
    fn test_encode_default_attributes() {
        let expires = Utc.with_ymd_and_hms(2025, 1, 15, 12, 30, 45).unwrap();
        let cookie = codec().encode("tok-123", expires);

        assert!(cookie.starts_with("wicket_session=tok-123; "));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Expires=Wed, 15 Jan 2025 12:30:45 GMT"));
        assert!(!cookie.contains("Secure"));
        assert!(!cookie.contains("Domain"));
    }

    #[test]
    fn test_encode_secure_and_domain() {
        let config = CookieConfig {
            name: "wicket_session".to_string(),
            domain: Some(".example.com".to_string()),
            secure: true,
            same_site: SameSite::Strict,
        };
        let cookie = CookieCodec::new(config).encode("tok", Utc::now());

        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("Domain=.example.com"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("HttpOnly"));
    }

    #[test]
    fn test_encode_cleared_uses_epoch_and_empty_value() {
        let cookie = codec().encode_cleared();
        assert!(cookie.starts_with("wicket_session=; "));
        assert!(cookie.contains("Expires=Thu, 01 Jan 1970 00:00:00 GMT"));
        assert!(cookie.contains("HttpOnly"));
    }

    #[test]
    fn test_extract_round_trip() {
        let codec = codec();
        let token = "11111111-2222-3333-4444-555555555555.aaaa";
        let set_cookie = codec.encode(token, Utc::now());
        let pair = set_cookie.split(';').next().unwrap();

        let extracted = codec.extract(&headers_with_cookie(pair));
        assert_eq!(extracted.as_deref(), Some(token));
    }

    #[test]
    fn test_extract_among_other_cookies() {
        let headers = headers_with_cookie("theme=dark; wicket_session=tok-1; lang=en");
        assert_eq!(codec().extract(&headers).as_deref(), Some("tok-1"));
    }

    #[test]
    fn test_extract_across_multiple_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, "theme=dark".parse().unwrap());
        headers.append(header::COOKIE, "wicket_session=tok-2".parse().unwrap());
        assert_eq!(codec().extract(&headers).as_deref(), Some("tok-2"));
    }

    #[test]
    fn test_extract_requires_exact_name() {
        let headers = headers_with_cookie("wicket_session2=nope; xwicket_session=nope");
        assert_eq!(codec().extract(&headers), None);
    }

    #[test]
    fn test_extract_empty_value_is_absent() {
        let codec = codec();
        let cleared_pair = codec.encode_cleared();
        let pair = cleared_pair.split(';').next().unwrap();
        assert_eq!(codec.extract(&headers_with_cookie(pair)), None);
    }

    #[test]
    fn test_extract_tolerates_malformed_segments() {
        let headers = headers_with_cookie("garbage; ;; =; wicket_session=ok");
        assert_eq!(codec().extract(&headers).as_deref(), Some("ok"));
    }

    #[test]
    fn test_extract_missing() {
        assert_eq!(codec().extract(&HeaderMap::new()), None);
    }
}
