use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// An email address was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmailError {
    #[error("email is required")]
    Empty,
}

/// Email value object
///
/// # Invariants
/// - Not blank
/// - Kept exactly as supplied; the store enforces uniqueness on that text
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validates an email address
    ///
    /// # Example
    /// ```
    /// use monolith_api::domain::user::Email;
    ///
    /// let email = Email::parse("ada@example.com").expect("valid email");
    /// assert_eq!(email.as_str(), "ada@example.com");
    /// assert!(Email::parse("   ").is_err());
    /// ```
    pub fn parse(raw: impl Into<String>) -> Result<Self, EmailError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(EmailError::Empty);
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}
