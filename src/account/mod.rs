/// Account management system
///
/// Handles account creation, login, profile updates, password lifecycle,
/// and cascading account deletion.

mod auth;
mod lifecycle;
pub(crate) mod store;

pub use auth::AuthService;
pub use lifecycle::PasswordLifecycle;
pub use store::{ResetTokenPatch, UserDraft, UserPatch, UserStore};

use crate::db::account::User;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Signup request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(length(min = 1))]
    pub firstname: String,
    #[validate(length(min = 1))]
    pub lastname: String,
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Issued bearer token response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

/// Profile update request. Only fields that are present are touched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ProfileUpdate {
    #[validate(length(min = 1))]
    pub firstname: Option<String>,
    #[validate(length(min = 1))]
    pub lastname: Option<String>,
    #[validate(email)]
    pub new_email: Option<String>,
}

/// Password reset request (step one of the reset flow)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestPasswordReset {
    pub email: String,
}

/// Password reset confirmation (step two of the reset flow)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

/// Authenticated password change request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Account deletion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteAccountRequest {
    pub current_password: String,
}

/// Generic acknowledgement body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Public view of a user. This is the only user shape that leaves the
/// service; it never carries the password hash or reset token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPublic {
    pub id: String,
    pub email: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub is_admin: bool,
}

impl From<User> for UserPublic {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            firstname: user.firstname,
            lastname: user.lastname,
            is_admin: user.is_admin,
        }
    }
}

impl From<&User> for UserPublic {
    fn from(user: &User) -> Self {
        user.clone().into()
    }
}
