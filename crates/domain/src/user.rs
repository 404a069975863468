//! Local mirror of users known to the SSO console.

use rolegrid_core::{AppError, AppResult, UserId};
use serde::{Deserialize, Serialize};

/// Maximum accepted email length.
pub const EMAIL_MAX_LENGTH: usize = 254;

/// Lowercased email address with basic structural validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated email address.
    ///
    /// Requires exactly one `@`, a non-empty local part and a domain with at
    /// least one `.`.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let normalized = value.into().trim().to_lowercase();

        if normalized.is_empty() {
            return Err(AppError::Validation(
                "email address must not be empty".to_owned(),
            ));
        }

        if normalized.len() > EMAIL_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "email address must not exceed {EMAIL_MAX_LENGTH} characters"
            )));
        }

        let Some((local, domain)) = normalized.split_once('@') else {
            return Err(AppError::Validation(
                "email address must contain an '@'".to_owned(),
            ));
        };

        if local.is_empty() || domain.contains('@') {
            return Err(AppError::Validation(format!(
                "email address '{normalized}' is malformed"
            )));
        }

        if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
            return Err(AppError::Validation(format!(
                "email domain '{domain}' is malformed"
            )));
        }

        Ok(Self(normalized))
    }

    /// Returns the validated email string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// User record mirrored from the SSO console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    /// Local user id.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// User id on the SSO console, once linked.
    pub console_user_id: Option<String>,
    /// Creation timestamp in RFC3339.
    pub created_at: String,
    /// Last update timestamp in RFC3339.
    pub updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::EmailAddress;

    #[test]
    fn email_is_lowercased() {
        let email = EmailAddress::new(" Admin@TempoFast.com ");
        assert!(matches!(email, Ok(value) if value.as_str() == "admin@tempofast.com"));
    }

    #[test]
    fn email_without_at_is_rejected() {
        assert!(EmailAddress::new("admin.tempofast.com").is_err());
    }

    #[test]
    fn email_with_two_ats_is_rejected() {
        assert!(EmailAddress::new("a@b@tempofast.com").is_err());
    }

    #[test]
    fn email_without_domain_dot_is_rejected() {
        assert!(EmailAddress::new("admin@localhost").is_err());
    }
}
