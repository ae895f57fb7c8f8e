/// Input validation helpers shared by the mutation services
use crate::error::CoreError;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_re() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
            .expect("email pattern compiles")
    })
}

/// Checks an already-normalized email address against the accepted shape:
/// local part, `@`, domain, and a TLD of at least two letters.
pub fn is_valid_email(email: &str) -> bool {
    email_re().is_match(email)
}

/// Normalizes an email address for storage and lookup. Uniqueness is
/// enforced on the normalized form.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Parses a `YYYY-MM-DD` calendar date from a request payload.
///
/// `field` is the payload field name and only feeds the error message,
/// e.g. `Invalid due_date format`.
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| CoreError::Validation(format!("Invalid {field} format")))
}
