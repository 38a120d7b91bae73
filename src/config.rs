/// Configuration management for the Adsight account service
use crate::error::{AuthError, AuthResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub email: Option<EmailConfig>,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    /// Base URL of the web frontend, used to build password reset links
    pub frontend_url: String,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

/// Credential and token configuration.
///
/// The secret and algorithm are loaded once at startup and are read-only for
/// the life of the process. Rotating the secret invalidates every token that
/// is already out in the wild; there is no grace-period key list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_algorithm: String,
    pub access_token_expire_minutes: i64,
    pub reset_token_expire_minutes: i64,
}

/// Email configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_url: String,
    pub from_address: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AuthResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("ADSIGHT_HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        let port = env::var("ADSIGHT_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .map_err(|_| AuthError::Validation("Invalid port number".to_string()))?;
        let frontend_url = env::var("ADSIGHT_FRONTEND_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        let path = env::var("ADSIGHT_DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/accounts.sqlite"));

        let jwt_secret = env::var("ADSIGHT_JWT_SECRET")
            .map_err(|_| AuthError::Validation("JWT secret required".to_string()))?;
        let jwt_algorithm = env::var("ADSIGHT_JWT_ALGORITHM").unwrap_or_else(|_| "HS256".to_string());
        let access_token_expire_minutes = env::var("ADSIGHT_ACCESS_TOKEN_EXPIRE_MINUTES")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .unwrap_or(30);
        let reset_token_expire_minutes = env::var("ADSIGHT_RESET_TOKEN_EXPIRE_MINUTES")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .unwrap_or(60);

        let email = if let Ok(smtp_url) = env::var("ADSIGHT_EMAIL_SMTP_URL") {
            Some(EmailConfig {
                smtp_url,
                from_address: env::var("ADSIGHT_EMAIL_FROM_ADDRESS")
                    .unwrap_or_else(|_| format!("noreply@{}", hostname)),
            })
        } else {
            None
        };

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(AppConfig {
            service: ServiceConfig {
                hostname,
                port,
                frontend_url,
            },
            database: DatabaseConfig { path },
            auth: AuthConfig {
                jwt_secret,
                jwt_algorithm,
                access_token_expire_minutes,
                reset_token_expire_minutes,
            },
            email,
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> AuthResult<()> {
        if self.service.hostname.is_empty() {
            return Err(AuthError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.auth.jwt_secret.len() < 32 {
            return Err(AuthError::Validation(
                "JWT secret must be at least 32 characters".to_string(),
            ));
        }

        if self.auth.access_token_expire_minutes <= 0 {
            return Err(AuthError::Validation(
                "Access token lifetime must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
