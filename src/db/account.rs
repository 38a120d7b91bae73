/// Account database records
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// User record in the database.
///
/// Deliberately not serializable: `password_hash` stays inside the account
/// layer, and anything that leaves the service goes through
/// [`crate::account::UserPublic`] instead.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    /// Normalized (lowercase) email, unique across all accounts
    pub email: String,
    pub password_hash: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub is_admin: bool,
    /// Set only while a password reset is pending, always together with the
    /// expiry below
    pub password_reset_token: Option<String>,
    pub password_reset_token_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Name used when addressing the user, e.g. in reset emails
    pub fn display_name(&self) -> &str {
        self.firstname.as_deref().unwrap_or(&self.email)
    }
}
