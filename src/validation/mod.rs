/// Input validation for account operations
///
/// Email normalization plus the signup rules: an allow-list of consumer
/// email domains and a password complexity policy.
use crate::error::{AuthError, AuthResult};

/// Email domains accepted at signup and profile update
pub const ALLOWED_EMAIL_DOMAINS: &[&str] = &["gmail.com", "yahoo.com", "outlook.com"];

/// Special characters accepted by the password policy
const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{};':\"\\|,.<>/?~`";

/// Normalize an email address for storage and lookup.
///
/// Every email that reaches the store or a token subject goes through here,
/// which is what makes email uniqueness and login case-insensitive.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

/// Validate a normalized email address
pub fn validate_email(email: &str) -> AuthResult<()> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(AuthError::Validation(
            "Invalid email format: missing '@' symbol".to_string(),
        ));
    };

    if local.is_empty() || domain.is_empty() {
        return Err(AuthError::Validation("Invalid email format".to_string()));
    }

    if !ALLOWED_EMAIL_DOMAINS.contains(&domain) {
        let allowed = ALLOWED_EMAIL_DOMAINS
            .iter()
            .map(|d| format!("@{}", d))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(AuthError::Validation(format!(
            "Email domain '@{}' is not allowed. Please use one of the following: {}",
            domain, allowed
        )));
    }

    Ok(())
}

/// Validate password complexity
pub fn validate_password(password: &str) -> AuthResult<()> {
    if password.len() < 8 {
        return Err(AuthError::Validation(
            "Password must be at least 8 characters long".to_string(),
        ));
    }

    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(AuthError::Validation(
            "Password must contain at least one uppercase letter".to_string(),
        ));
    }

    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(AuthError::Validation(
            "Password must contain at least one lowercase letter".to_string(),
        ));
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AuthError::Validation(
            "Password must contain at least one digit".to_string(),
        ));
    }

    if !password.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(c)) {
        return Err(AuthError::Validation(
            "Password must contain at least one special character (e.g. !@#$%^&*)".to_string(),
        ));
    }

    Ok(())
}

/// Validate an optional profile name field (non-empty when present)
pub fn validate_name(field: &str, value: &str) -> AuthResult<()> {
    if value.trim().is_empty() {
        return Err(AuthError::Validation(format!("{} cannot be empty", field)));
    }

    Ok(())
}
