/// Signup, login, profile, and account deletion
use crate::{
    account::{ProfileUpdate, SignupRequest, UserDraft, UserPatch, UserStore},
    crypto::{PasswordHasher, TokenCodec},
    db::account::User,
    error::{AuthError, AuthResult},
    validation,
};
use std::sync::{Arc, OnceLock};

/// Hash verified against when login hits an unknown email, so both failure
/// paths cost one argon2 verification and timing does not reveal whether the
/// account exists.
fn enumeration_guard_hash() -> &'static str {
    static GUARD: OnceLock<String> = OnceLock::new();
    // An empty fallback just makes the guard verification return early;
    // login still fails closed.
    GUARD.get_or_init(|| PasswordHasher::hash("enumeration-guard-placeholder").unwrap_or_default())
}

/// Authentication service: produces credentials rather than consuming them.
pub struct AuthService {
    users: Arc<UserStore>,
    tokens: Arc<TokenCodec>,
}

impl AuthService {
    pub fn new(users: Arc<UserStore>, tokens: Arc<TokenCodec>) -> Self {
        Self { users, tokens }
    }

    /// Register a new account.
    ///
    /// The pre-check turns the common duplicate case into a friendly error;
    /// the store's unique index catches the concurrent-signup race either way.
    pub async fn signup(&self, request: SignupRequest) -> AuthResult<User> {
        let email = validation::normalize_email(&request.email);
        validation::validate_email(&email)?;
        validation::validate_password(&request.password)?;
        validation::validate_name("firstname", &request.firstname)?;
        validation::validate_name("lastname", &request.lastname)?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = PasswordHasher::hash(&request.password)?;

        let user = self
            .users
            .insert(UserDraft {
                email,
                password_hash,
                firstname: Some(request.firstname),
                lastname: Some(request.lastname),
            })
            .await?;

        tracing::info!(user_id = %user.id, "Account created");

        Ok(user)
    }

    /// Authenticate and issue a bearer token.
    ///
    /// An unknown email and a wrong password return the identical error.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<String> {
        let email = validation::normalize_email(email);

        match self.users.find_by_email(&email).await? {
            Some(user) if PasswordHasher::verify(password, &user.password_hash) => {
                let token = self.tokens.issue(&user.email)?;
                tracing::info!(user_id = %user.id, "Login succeeded");
                Ok(token)
            }
            Some(user) => {
                tracing::debug!(user_id = %user.id, "Login failed: wrong password");
                Err(AuthError::InvalidCredentials)
            }
            None => {
                // Burn a verification so this path costs the same as a
                // wrong password for an existing account.
                let _ = PasswordHasher::verify(password, enumeration_guard_hash());
                tracing::debug!("Login failed: unknown email");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Update profile fields; an email change re-checks uniqueness against
    /// other accounts.
    ///
    /// Tokens issued before an email change keep the old email as subject
    /// and stop resolving once the change lands; holders must log in again.
    pub async fn update_profile(&self, user: &User, update: ProfileUpdate) -> AuthResult<User> {
        let mut patch = UserPatch::default();

        if let Some(firstname) = update.firstname {
            validation::validate_name("firstname", &firstname)?;
            patch.firstname = Some(firstname);
        }
        if let Some(lastname) = update.lastname {
            validation::validate_name("lastname", &lastname)?;
            patch.lastname = Some(lastname);
        }
        if let Some(new_email) = update.new_email {
            let new_email = validation::normalize_email(&new_email);
            validation::validate_email(&new_email)?;

            if new_email != user.email {
                if let Some(existing) = self.users.find_by_email(&new_email).await? {
                    if existing.id != user.id {
                        return Err(AuthError::EmailTaken);
                    }
                }
                patch.email = Some(new_email);
            }
        }

        self.users
            .update_fields(&user.id, patch)
            .await?
            .ok_or_else(|| AuthError::NotFound("Account no longer exists".to_string()))
    }

    /// Delete the account after re-verifying the current password.
    ///
    /// Returns `Ok(false)` on a password mismatch with no side effects at
    /// all; nothing is mutated before the guard passes.
    pub async fn delete_account(&self, user: &User, current_password: &str) -> AuthResult<bool> {
        if !PasswordHasher::verify(current_password, &user.password_hash) {
            tracing::debug!(user_id = %user.id, "Account deletion refused: wrong password");
            return Ok(false);
        }

        self.users.delete_cascade(&user.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::store::tests::{count_owned_records, seed_owned_records, test_store};
    use crate::config::AuthConfig;

    fn test_codec() -> Arc<TokenCodec> {
        Arc::new(
            TokenCodec::new(&AuthConfig {
                jwt_secret: "test-secret-key-that-is-long-enough!".to_string(),
                jwt_algorithm: "HS256".to_string(),
                access_token_expire_minutes: 30,
                reset_token_expire_minutes: 60,
            })
            .unwrap(),
        )
    }

    async fn test_service() -> (AuthService, Arc<UserStore>) {
        let users = Arc::new(test_store().await);
        let service = AuthService::new(Arc::clone(&users), test_codec());
        (service, users)
    }

    fn signup_request(email: &str) -> SignupRequest {
        SignupRequest {
            email: email.to_string(),
            password: "Abc12345!".to_string(),
            firstname: "A".to_string(),
            lastname: "B".to_string(),
        }
    }

    #[tokio::test]
    async fn test_signup_creates_regular_user() {
        let (service, _) = test_service().await;

        let user = service.signup(signup_request("a@gmail.com")).await.unwrap();

        assert_eq!(user.email, "a@gmail.com");
        assert!(!user.is_admin);
        // Stored hash verifies, raw password is not stored
        assert_ne!(user.password_hash, "Abc12345!");
        assert!(PasswordHasher::verify("Abc12345!", &user.password_hash));
    }

    #[tokio::test]
    async fn test_signup_normalizes_email() {
        let (service, _) = test_service().await;

        let user = service
            .signup(signup_request("User@Gmail.com"))
            .await
            .unwrap();

        assert_eq!(user.email, "user@gmail.com");
    }

    #[tokio::test]
    async fn test_signup_duplicate_email_any_casing() {
        let (service, _) = test_service().await;
        service.signup(signup_request("user@gmail.com")).await.unwrap();

        let result = service.signup(signup_request("User@Gmail.com")).await;

        assert!(matches!(result.unwrap_err(), AuthError::EmailTaken));
    }

    #[tokio::test]
    async fn test_signup_rejects_weak_password() {
        let (service, _) = test_service().await;

        let mut request = signup_request("a@gmail.com");
        request.password = "weak".to_string();

        assert!(service.signup(request).await.is_err());
    }

    #[tokio::test]
    async fn test_signup_rejects_disallowed_domain() {
        let (service, _) = test_service().await;

        let result = service.signup(signup_request("a@example.com")).await;

        assert!(matches!(result.unwrap_err(), AuthError::Validation(_)));
    }

    #[tokio::test]
    async fn test_login_case_insensitive_email() {
        let (service, _) = test_service().await;
        service.signup(signup_request("a@gmail.com")).await.unwrap();

        let token = service.login("A@GMAIL.com", "Abc12345!").await.unwrap();
        assert!(!token.is_empty());
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (service, _) = test_service().await;
        service.signup(signup_request("a@gmail.com")).await.unwrap();

        let wrong_password = service.login("a@gmail.com", "wrong").await.unwrap_err();
        let unknown_email = service.login("nobody@gmail.com", "wrong").await.unwrap_err();

        // Same variant, same message
        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_email, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn test_login_token_subject_is_email() {
        let (service, _) = test_service().await;
        service.signup(signup_request("a@gmail.com")).await.unwrap();
        let codec = test_codec();

        let token = service.login("a@gmail.com", "Abc12345!").await.unwrap();
        let claims = codec.validate(&token).unwrap();

        assert_eq!(claims.sub, "a@gmail.com");
    }

    #[tokio::test]
    async fn test_update_profile_names() {
        let (service, _) = test_service().await;
        let user = service.signup(signup_request("a@gmail.com")).await.unwrap();

        let updated = service
            .update_profile(
                &user,
                ProfileUpdate {
                    firstname: Some("Ada".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.firstname.as_deref(), Some("Ada"));
        assert_eq!(updated.email, "a@gmail.com");
    }

    #[tokio::test]
    async fn test_update_profile_email_uniqueness() {
        let (service, _) = test_service().await;
        service.signup(signup_request("taken@gmail.com")).await.unwrap();
        let user = service.signup(signup_request("a@gmail.com")).await.unwrap();

        let result = service
            .update_profile(
                &user,
                ProfileUpdate {
                    new_email: Some("Taken@Gmail.com".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result.unwrap_err(), AuthError::EmailTaken));

        // Changing to a fresh address works and normalizes
        let updated = service
            .update_profile(
                &user,
                ProfileUpdate {
                    new_email: Some("Fresh@Gmail.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.email, "fresh@gmail.com");
    }

    #[tokio::test]
    async fn test_update_profile_same_email_is_noop() {
        let (service, _) = test_service().await;
        let user = service.signup(signup_request("a@gmail.com")).await.unwrap();

        let updated = service
            .update_profile(
                &user,
                ProfileUpdate {
                    new_email: Some("A@gmail.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.email, "a@gmail.com");
    }

    #[tokio::test]
    async fn test_delete_account_wrong_password_no_side_effects() {
        let (service, users) = test_service().await;
        let user = service.signup(signup_request("a@gmail.com")).await.unwrap();
        seed_owned_records(&users, &user.id).await;

        let deleted = service.delete_account(&user, "wrong").await.unwrap();

        assert!(!deleted);
        assert!(users.find_by_id(&user.id).await.unwrap().is_some());
        assert_eq!(count_owned_records(&users, &user.id).await, 2);
    }

    #[tokio::test]
    async fn test_delete_account_cascades() {
        let (service, users) = test_service().await;
        let user = service.signup(signup_request("a@gmail.com")).await.unwrap();
        seed_owned_records(&users, &user.id).await;

        let deleted = service.delete_account(&user, "Abc12345!").await.unwrap();

        assert!(deleted);
        assert!(users.find_by_id(&user.id).await.unwrap().is_none());
        assert_eq!(count_owned_records(&users, &user.id).await, 0);
    }
}
