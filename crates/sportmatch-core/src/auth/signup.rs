//! Credential and sign-up form validation

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{is_adult, validate_name, MINIMUM_AGE};

/// Minimum password length accepted at sign-up.
pub const MIN_PASSWORD_LEN: usize = 6;

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
    })
}

/// Whether `email` looks like an address.
pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email.trim())
}

/// Whether `password` is long enough.
pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
}

/// Everything collected by the sign-up form.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub birth_date: NaiveDate,
}

impl std::fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("name", &self.name)
            .field("birth_date", &self.birth_date)
            .finish()
    }
}

impl SignupRequest {
    /// Check every field before anything is sent to the auth backend.
    ///
    /// Checks run in form order so the first problem is the one reported.
    pub fn validate(&self, today: NaiveDate) -> Result<()> {
        if !is_valid_email(&self.email) {
            return Err(Error::InvalidInput("Invalid email".to_string()));
        }
        if !is_valid_password(&self.password) {
            return Err(Error::InvalidInput(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        validate_name(&self.name)?;
        if !is_adult(self.birth_date, today) {
            return Err(Error::InvalidInput(format!(
                "You must be at least {MINIMUM_AGE} years old"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> SignupRequest {
        SignupRequest {
            email: "jo@example.com".to_string(),
            password: "secret1".to_string(),
            name: "Jo".to_string(),
            birth_date: NaiveDate::from_ymd_opt(2000, 5, 20).unwrap(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn rejection(request: &SignupRequest) -> String {
        match request.validate(today()).unwrap_err() {
            Error::InvalidInput(message) => message,
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_email_pattern() {
        assert!(is_valid_email("a.b@c.io"));
        assert!(is_valid_email("  padded@example.org "));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("two@@example.com"));
        assert!(!is_valid_email("user@localhost"));
    }

    #[test]
    fn test_valid_request_passes() {
        request().validate(today()).unwrap();
    }

    #[test]
    fn test_reports_first_invalid_field() {
        let mut bad = request();
        bad.email = "nope".to_string();
        bad.password = "123".to_string();
        assert_eq!(rejection(&bad), "Invalid email");

        let mut bad = request();
        bad.password = "12345".to_string();
        assert!(rejection(&bad).contains("at least 6"));

        let mut bad = request();
        bad.name = "J".to_string();
        assert!(rejection(&bad).contains("Name"));

        let mut bad = request();
        bad.birth_date = NaiveDate::from_ymd_opt(2010, 1, 1).unwrap();
        assert!(rejection(&bad).contains("18"));
    }

    #[test]
    fn test_debug_hides_password() {
        assert!(!format!("{:?}", request()).contains("secret1"));
    }
}
