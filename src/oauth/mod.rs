//! OAuth login against external identity providers.
//!
//! The flow is the standard authorization-code dance: the login endpoint
//! sends the browser to the provider's consent page, and the callback
//! exchanges the returned code for a verified identity. Everything past the
//! exchange (account upsert, session issuance) belongs to the API layer.

mod error;
mod provider;

pub use error::CallbackError;
pub use provider::{Identity, IdentityExchange, OAuthClient, Provider};
