/// Password reset and change flows
use crate::{
    account::{ResetTokenPatch, UserPatch, UserStore},
    crypto::{reset, PasswordHasher},
    db::account::User,
    error::{AuthError, AuthResult},
    mailer::Mailer,
    validation,
};
use chrono::{Duration, Utc};
use std::sync::Arc;

/// Password lifecycle service: out-of-band reset and authenticated change.
pub struct PasswordLifecycle {
    users: Arc<UserStore>,
    mailer: Arc<Mailer>,
    reset_ttl: Duration,
}

impl PasswordLifecycle {
    pub fn new(users: Arc<UserStore>, mailer: Arc<Mailer>, reset_ttl: Duration) -> Self {
        Self {
            users,
            mailer,
            reset_ttl,
        }
    }

    /// Start a password reset.
    ///
    /// Succeeds outwardly whether or not the email maps to an account, so
    /// the endpoint cannot be used to enumerate accounts. The notification
    /// is dispatched on a detached task; a delivery failure is logged and
    /// never reaches the caller.
    pub async fn request_reset(&self, email: &str) -> AuthResult<()> {
        let email = validation::normalize_email(email);

        let Some(user) = self.users.find_by_email(&email).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let token = reset::generate(reset::RESET_TOKEN_BYTES);
        let expires_at = Utc::now() + self.reset_ttl;

        self.users
            .update_fields(
                &user.id,
                UserPatch {
                    reset_token: Some(ResetTokenPatch::Set {
                        token: token.clone(),
                        expires_at,
                    }),
                    ..Default::default()
                },
            )
            .await?;

        tracing::info!(user_id = %user.id, "Password reset token issued");

        let mailer = Arc::clone(&self.mailer);
        let display_name = user.display_name().to_string();
        tokio::spawn(async move {
            if let Err(e) = mailer
                .send_password_reset_email(&user.email, &display_name, &token)
                .await
            {
                tracing::warn!("Failed to send password reset email: {}", e);
            }
        });

        Ok(())
    }

    /// Complete a password reset with a previously issued token.
    ///
    /// The new hash is written and both reset columns are cleared in the
    /// same update, so a confirmed token can never be replayed.
    pub async fn confirm_reset(&self, token: &str, new_password: &str) -> AuthResult<()> {
        let Some(user) = self.users.find_by_reset_token(token).await? else {
            return Err(AuthError::InvalidOrExpiredToken);
        };

        validation::validate_password(new_password)?;
        let password_hash = PasswordHasher::hash(new_password)?;

        self.users
            .update_fields(
                &user.id,
                UserPatch {
                    password_hash: Some(password_hash),
                    reset_token: Some(ResetTokenPatch::Clear),
                    ..Default::default()
                },
            )
            .await?;

        tracing::info!(user_id = %user.id, "Password reset completed");

        Ok(())
    }

    /// Change the password of an authenticated account.
    ///
    /// Returns `Ok(false)` without touching the store when the current
    /// password does not verify. A pending reset token, if one exists, is
    /// left alone; only the hash moves here.
    pub async fn change_password(
        &self,
        user: &User,
        current_password: &str,
        new_password: &str,
    ) -> AuthResult<bool> {
        if !PasswordHasher::verify(current_password, &user.password_hash) {
            tracing::debug!(user_id = %user.id, "Password change refused: wrong current password");
            return Ok(false);
        }

        validation::validate_password(new_password)?;
        let password_hash = PasswordHasher::hash(new_password)?;

        self.users
            .update_fields(
                &user.id,
                UserPatch {
                    password_hash: Some(password_hash),
                    ..Default::default()
                },
            )
            .await?;

        tracing::info!(user_id = %user.id, "Password changed");

        Ok(true)
    }
}
