//! Capabilities provided by the surrounding application.
//!
//! Request signing and the HTTP transport live outside this workspace;
//! these traits are the only contract the core relies on.

use crate::types::User;
use anyhow::Result;
use async_trait::async_trait;

/// Produces the per-request authentication token.
///
/// The algorithm is opaque to the core. Implementations must be cheap enough
/// to call once per request.
pub trait Signer: Send + Sync {
    fn sign(&self, method: &str, path: &str) -> Result<String>;
}

/// Signer that hands out a fixed token, for dry runs and tests.
#[derive(Debug, Clone)]
pub struct StaticSigner {
    token: String,
}

impl StaticSigner {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

impl Signer for StaticSigner {
    fn sign(&self, _method: &str, _path: &str) -> Result<String> {
        Ok(self.token.clone())
    }
}

/// Transport for a single block call.
#[async_trait]
pub trait BlockApi: Send + Sync {
    /// Method and path the call is signed for.
    fn endpoint(&self) -> (&'static str, &'static str) {
        ("POST", "/1.1/blocks/create.json")
    }

    /// Block `user`, authenticated with `token`.
    async fn block(&self, user: &User, token: &str) -> Result<()>;
}
