/// Password reset token generation
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{rngs::OsRng, RngCore};

/// Minimum entropy for a reset token. 32 bytes keeps guessing infeasible
/// within any realistic expiry window.
pub const RESET_TOKEN_BYTES: usize = 32;

/// Generate a URL-safe random token from the OS RNG.
///
/// Requests below [`RESET_TOKEN_BYTES`] are rounded up; callers cannot
/// produce a weaker token than the floor.
pub fn generate(byte_length: usize) -> String {
    let mut bytes = vec![0u8; byte_length.max(RESET_TOKEN_BYTES)];
    OsRng.fill_bytes(&mut bytes);

    URL_SAFE_NO_PAD.encode(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_tokens_are_unique() {
        let first = generate(RESET_TOKEN_BYTES);
        let second = generate(RESET_TOKEN_BYTES);

        assert_ne!(first, second);
    }

    #[test]
    fn test_token_is_url_safe() {
        let token = generate(RESET_TOKEN_BYTES);

        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        // 32 bytes of base64 without padding
        assert_eq!(token.len(), 43);
    }

    #[test]
    fn test_short_requests_rounded_up() {
        let token = generate(8);

        // Still at least 32 bytes of entropy
        assert!(token.len() >= 43);
    }
}
