/// Application context and dependency injection
use crate::{
    account::{AuthService, PasswordLifecycle, UserStore},
    auth::Authenticator,
    config::AppConfig,
    crypto::TokenCodec,
    db,
    error::AuthResult,
    mailer::Mailer,
};
use chrono::Duration;
use std::sync::Arc;

/// Application context holding all shared services.
///
/// Built once at startup; everything inside is read-only or owns its own
/// synchronization, so the context is cheap to clone per request.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub users: Arc<UserStore>,
    pub auth: Arc<AuthService>,
    pub passwords: Arc<PasswordLifecycle>,
    pub authenticator: Arc<Authenticator>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: AppConfig) -> AuthResult<Self> {
        // Validate configuration
        config.validate()?;

        // Initialize account database
        let pool = db::create_pool(&config.database.path, db::DatabaseOptions::default()).await?;
        db::run_migrations(&pool).await?;
        db::test_connection(&pool).await?;

        // Token codec is process-wide; rotating the secret means restarting
        let tokens = Arc::new(TokenCodec::new(&config.auth)?);

        let users = Arc::new(UserStore::new(pool.clone()));

        let mailer = Arc::new(Mailer::new(
            config.email.clone(),
            config.service.frontend_url.clone(),
        )?);
        if mailer.is_configured() {
            tracing::info!("SMTP relay configured; reset emails will be delivered");
        } else {
            tracing::info!("SMTP not configured; reset emails will be logged instead");
        }

        let auth = Arc::new(AuthService::new(Arc::clone(&users), Arc::clone(&tokens)));
        let passwords = Arc::new(PasswordLifecycle::new(
            Arc::clone(&users),
            Arc::clone(&mailer),
            Duration::minutes(config.auth.reset_token_expire_minutes),
        ));
        let authenticator = Arc::new(Authenticator::new(Arc::clone(&tokens), Arc::clone(&users)));

        Ok(Self {
            config: Arc::new(config),
            users,
            auth,
            passwords,
            authenticator,
        })
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }
}
