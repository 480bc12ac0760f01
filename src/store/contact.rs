use super::{ContactValidation, ContactValidator, SanitizedContact};
use crate::error::StoreError;
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9._%+\-]+@[a-z0-9](?:[a-z0-9\-]*[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9\-]*[a-z0-9])?)+$")
        .expect("valid email regex")
});

const MIN_PHONE_DIGITS: usize = 7;
const MAX_PHONE_DIGITS: usize = 15;

/// Local contact validator: trims and lower-cases the email, strips the phone
/// down to digits and `+`, and checks both for plausible syntax.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicContactValidator;

impl BasicContactValidator {
    pub fn sanitize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    /// Keeps digits and `+`. Blank input becomes `None`.
    pub fn sanitize_phone(phone: &str) -> Option<String> {
        let cleaned: String = phone
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '+')
            .collect();
        (!cleaned.is_empty()).then_some(cleaned)
    }

    pub fn check(email: &str, phone: Option<&str>) -> ContactValidation {
        let sanitized = SanitizedContact {
            email: Self::sanitize_email(email),
            phone: phone.and_then(Self::sanitize_phone),
        };

        let reason = if sanitized.email.is_empty() {
            Some("email is required".to_string())
        } else if !EMAIL_RE.is_match(&sanitized.email) {
            Some(format!("'{}' is not a valid email address", sanitized.email))
        } else {
            sanitized.phone.as_deref().and_then(phone_problem)
        };

        ContactValidation {
            is_valid: reason.is_none(),
            sanitized,
            reason,
        }
    }
}

fn phone_problem(phone: &str) -> Option<String> {
    if phone.chars().skip(1).any(|c| c == '+') {
        return Some("'+' may only lead a phone number".to_string());
    }
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits) {
        return Some(format!(
            "phone number must have {}-{} digits, found {}",
            MIN_PHONE_DIGITS, MAX_PHONE_DIGITS, digits
        ));
    }
    None
}

#[async_trait]
impl ContactValidator for BasicContactValidator {
    async fn validate_contact(
        &self,
        email: &str,
        phone: Option<&str>,
    ) -> Result<ContactValidation, StoreError> {
        Ok(Self::check(email, phone))
    }
}
