use std::fmt::Display;

use validator::ValidateEmail;

use super::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq)]
/// A syntactically valid email address. Used for leads, for the fallback
/// recipient and for the sender of alert emails.
pub struct SubscriberEmail(String);

impl SubscriberEmail {
    pub fn parse(email: String) -> Result<Self, ValidationError> {
        match ValidateEmail::validate_email(&email) {
            true => Ok(Self(email)),
            false => Err(ValidationError::InvalidEmail(email)),
        }
    }
}

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str { &self.0 }
}

impl Display for SubscriberEmail {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
