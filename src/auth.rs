/// Authentication extractors and the session authorization gates
use crate::{
    account::UserStore,
    context::AppContext,
    crypto::TokenCodec,
    db::account::User,
    error::{AuthError, AuthResult},
};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts, http::HeaderMap};
use std::sync::Arc;

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.to_string())
}

/// Resolves bearer tokens to accounts and gates admin-only operations.
///
/// Per-request state machine: a presented token either becomes an
/// authenticated account or is rejected; a missing token, a malformed or
/// expired one, and a subject that no longer resolves all produce the same
/// uniform rejection.
pub struct Authenticator {
    tokens: Arc<TokenCodec>,
    users: Arc<UserStore>,
}

impl Authenticator {
    pub fn new(tokens: Arc<TokenCodec>, users: Arc<UserStore>) -> Self {
        Self { tokens, users }
    }

    /// Resolve a bearer token to the account it asserts.
    ///
    /// Store failures stay internal errors; only credential problems
    /// collapse into [`AuthError::Unauthenticated`].
    pub async fn authenticate(&self, token: &str) -> AuthResult<User> {
        let claims = self.tokens.validate(token)?;

        match self.users.find_by_email(&claims.sub).await? {
            Some(user) => Ok(user),
            None => {
                tracing::debug!("Token rejected: subject no longer resolves to an account");
                Err(AuthError::Unauthenticated)
            }
        }
    }

    /// Gate an already-authenticated account on the admin role
    pub fn require_admin(&self, user: &User) -> AuthResult<()> {
        if !user.is_admin {
            tracing::debug!(user_id = %user.id, "Admin access denied");
            return Err(AuthError::Forbidden);
        }

        Ok(())
    }
}

/// Authenticated context - extracts and validates the bearer token
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: User,
}

#[async_trait]
impl FromRequestParts<AppContext> for AuthContext {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers).ok_or(AuthError::Unauthenticated)?;

        let user = state.authenticator.authenticate(&token).await?;

        Ok(AuthContext { user })
    }
}

/// Admin context - requires an authenticated account with the admin flag
#[derive(Debug, Clone)]
pub struct AdminContext {
    pub user: User,
}

#[async_trait]
impl FromRequestParts<AppContext> for AdminContext {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let AuthContext { user } = AuthContext::from_request_parts(parts, state).await?;

        state.authenticator.require_admin(&user)?;

        Ok(AdminContext { user })
    }
}
