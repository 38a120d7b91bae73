/// Bearer token encode/decode
use crate::{
    config::AuthConfig,
    error::{AuthError, AuthResult},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account email at issuance time
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signed bearer token codec.
///
/// Holds the shared signing secret and algorithm for the life of the process.
/// Tokens are stateless: there is no revocation list, so a token stays valid
/// until its expiry regardless of what happens to the account in between.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    access_ttl: Duration,
}

impl TokenCodec {
    /// Build the codec from configuration. Only HMAC algorithms make sense
    /// for a single shared secret.
    pub fn new(config: &AuthConfig) -> AuthResult<Self> {
        let algorithm: Algorithm = config
            .jwt_algorithm
            .parse()
            .map_err(|_| AuthError::Validation(format!("Unknown JWT algorithm: {}", config.jwt_algorithm)))?;

        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(AuthError::Validation(format!(
                "JWT algorithm {:?} is not usable with a shared secret",
                algorithm
            )));
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            algorithm,
            access_ttl: Duration::minutes(config.access_token_expire_minutes),
        })
    }

    /// Issue a token for `subject` with the configured access token lifetime
    pub fn issue(&self, subject: &str) -> AuthResult<String> {
        self.issue_with_ttl(subject, self.access_ttl)
    }

    /// Issue a token for `subject` valid for `ttl`
    pub fn issue_with_ttl(&self, subject: &str, ttl: Duration) -> AuthResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Validate a token and return its claims.
    ///
    /// Structural, signature, and expiry failures all collapse to the same
    /// [`AuthError::Unauthenticated`]; the distinction only survives in the
    /// debug log.
    pub fn validate(&self, token: &str) -> AuthResult<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        tracing::debug!("Token rejected: expired");
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        tracing::debug!("Token rejected: invalid signature");
                    }
                    _ => {
                        tracing::debug!("Token rejected: {}", e);
                    }
                }
                AuthError::Unauthenticated
            })
    }
}
