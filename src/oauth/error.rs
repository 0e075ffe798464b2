//! Terminal failure exits of the OAuth callback flow.

use thiserror::Error;

/// Ways the callback can fail after the provider redirects back.
///
/// Every variant ends the login attempt; the browser is redirected to the
/// login page with a machine-readable code and the user must start over.
/// Underlying errors stay in the logs.
#[derive(Debug, Error)]
pub enum CallbackError {
    /// The provider redirected back without an authorization code.
    #[error("callback carried no authorization code")]
    MissingCode,

    /// Exchanging the code with the provider failed.
    #[error("code exchange failed: {0}")]
    Exchange(anyhow::Error),

    /// The provider vouched for an identity without a usable email.
    #[error("provider identity carried no email")]
    IdentityRejected,

    /// Account upsert or session issuance failed after a good exchange.
    #[error("login completion failed: {0}")]
    Completion(anyhow::Error),
}

impl CallbackError {
    /// Code carried in the `error` query parameter of the login redirect.
    pub fn redirect_code(&self) -> &'static str {
        match self {
            Self::MissingCode => "no_code",
            Self::Exchange(_) => "auth_failed",
            Self::IdentityRejected => "invalid_user",
            Self::Completion(_) => "callback_failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_codes() {
        assert_eq!(CallbackError::MissingCode.redirect_code(), "no_code");
        assert_eq!(
            CallbackError::Exchange(anyhow::anyhow!("provider 500")).redirect_code(),
            "auth_failed"
        );
        assert_eq!(CallbackError::IdentityRejected.redirect_code(), "invalid_user");
        assert_eq!(
            CallbackError::Completion(anyhow::anyhow!("insert failed")).redirect_code(),
            "callback_failed"
        );
    }
}
