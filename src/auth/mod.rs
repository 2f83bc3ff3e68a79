//! The `auth` module defines the authentication collaborator consumed at
//! connection admission.
//!
//! Token validation itself is someone else's problem: the engine only needs
//! `authenticate(token) -> Identity | error` before a session may go active.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::registry::IdentityId;
use crate::utils::error::AuthError;

/// The authenticated principal a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub id: IdentityId,
}

/// External credential validator consulted once per connection, before the
/// session is registered anywhere.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<Identity, AuthError>;
}

/// In-memory token table.
///
/// Stands in for the backend's real token validator in local runs and tests;
/// a deployment wires its own [`Authenticator`] into the engine instead.
#[derive(Debug, Default)]
pub struct TokenAuthenticator {
    tokens: DashMap<String, Identity>,
}

impl TokenAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_token(&self, token: impl Into<String>, identity: Identity) {
        self.tokens.insert(token.into(), identity);
    }
}

#[async_trait]
impl Authenticator for TokenAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<Identity, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingCredential);
        }
        self.tokens
            .get(token)
            .map(|entry| *entry.value())
            .ok_or(AuthError::InvalidCredential)
    }
}
