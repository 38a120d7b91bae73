/// Credential primitives
///
/// Password hashing, bearer token encode/decode, and reset token generation.
/// Everything here is stateless apart from the process-wide token codec,
/// which is built once at startup from configuration.
pub mod password;
pub mod reset;
pub mod token;

pub use password::PasswordHasher;
pub use token::{Claims, TokenCodec};
