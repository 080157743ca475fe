//! Field validation rules shared by every form.
//!
//! Each rule is a pure function returning `None` when the value is valid and
//! `Some(message)` with a user-facing message otherwise. Rules never touch the
//! network; a form collects every rule's result before anything is submitted.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Smallest amount accepted by `amount`.
pub const MIN_AMOUNT: f64 = 0.01;
/// Largest amount accepted by `amount`.
pub const MAX_AMOUNT: f64 = 999_999_999.0;

pub const MIN_AGE: i64 = 1;
pub const MAX_AGE: i64 = 120;

/// PINs rejected even though they are well-formed.
pub const WEAK_PINS: [&str; 12] = [
    "0000", "1111", "2222", "3333", "4444", "5555", "6666", "7777", "8888", "9999", "1234",
    "4321",
];

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

static PIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}$").expect("pin pattern compiles"));

/// Validate a new account password.
///
/// Checked in order, first failure wins:
/// - At least 8 characters
/// - One uppercase letter
/// - One lowercase letter
/// - One digit
/// - One character that is not a letter or digit
pub fn password(value: &str) -> Option<String> {
    if value.is_empty() {
        return Some("Password is required".to_string());
    }

    if value.chars().count() < 8 {
        return Some("Password must be at least 8 characters".to_string());
    }

    if !value.chars().any(|c| c.is_ascii_uppercase()) {
        return Some("Password must contain at least one uppercase letter".to_string());
    }

    if !value.chars().any(|c| c.is_ascii_lowercase()) {
        return Some("Password must contain at least one lowercase letter".to_string());
    }

    if !value.chars().any(|c| c.is_ascii_digit()) {
        return Some("Password must contain at least one number".to_string());
    }

    if value.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Some("Password must contain at least one special character (!@#$%^&*)".to_string());
    }

    None
}

/// Validate an email address against the basic `local@domain.tld` shape.
pub fn email(value: &str) -> Option<String> {
    if value.is_empty() {
        return Some("Email is required".to_string());
    }

    if !EMAIL_RE.is_match(value) {
        return Some("Invalid email".to_string());
    }

    None
}

/// Validate a new transaction PIN: exactly four digits and not trivially guessable.
pub fn pin(value: &str) -> Option<String> {
    if let Some(err) = pin_format(value) {
        return Some(err);
    }

    if WEAK_PINS.contains(&value) {
        return Some("PIN is too weak. Avoid simple sequences".to_string());
    }

    None
}

/// Format-only PIN check, used when verifying an existing PIN.
pub fn pin_format(value: &str) -> Option<String> {
    if value.is_empty() {
        return Some("PIN is required".to_string());
    }

    if !PIN_RE.is_match(value) {
        return Some("PIN must be exactly 4 digits".to_string());
    }

    None
}

pub fn age(value: Option<i64>) -> Option<String> {
    match value {
        None => Some("Age is required".to_string()),
        Some(age) if !(MIN_AGE..=MAX_AGE).contains(&age) => Some(format!(
            "Age must be between {} and {} years",
            MIN_AGE, MAX_AGE
        )),
        Some(_) => None,
    }
}

/// Validate a typed-in age. Text that is present but not a whole number is
/// reported as such rather than as missing.
pub fn age_input(raw: &str) -> Option<String> {
    if !raw.trim().is_empty() && parse_whole(raw).is_none() {
        return Some("Age must be a whole number".to_string());
    }
    age(parse_whole(raw))
}

/// Validate a typed-in amount with the default bounds.
pub fn amount_input(raw: &str) -> Option<String> {
    if !raw.trim().is_empty() && parse_amount(raw).is_none() {
        return Some("Amount must be a number".to_string());
    }
    amount(parse_amount(raw))
}

/// Validate a money amount with the default bounds.
pub fn amount(value: Option<f64>) -> Option<String> {
    amount_between(value, MIN_AMOUNT, MAX_AMOUNT)
}

/// Validate a money amount against explicit bounds (inclusive).
pub fn amount_between(value: Option<f64>, min: f64, max: f64) -> Option<String> {
    let amount = match value {
        Some(v) if !v.is_nan() => v,
        _ => return Some("Amount is required".to_string()),
    };

    if amount < min {
        return Some(format!("Amount must be at least {}", min));
    }

    if amount > max {
        return Some(format!("Amount cannot exceed {}", max));
    }

    None
}

/// Validate text length in characters.
///
/// An empty value is only an error when `min > 0`; optional fields pass
/// `min = 0` and are skipped by the caller when blank.
pub fn text_length(value: &str, min: usize, max: usize, label: &str) -> Option<String> {
    if value.is_empty() {
        if min > 0 {
            return Some(format!("{} is required", label));
        }
        return None;
    }

    let len = value.chars().count();

    if len < min {
        return Some(format!("{} must be at least {} characters", label, min));
    }

    if len > max {
        return Some(format!("{} cannot exceed {} characters", label, max));
    }

    None
}

/// Validate an optional absolute http(s) URL.
pub fn url(value: &str) -> Option<String> {
    if value.is_empty() {
        return None;
    }

    match Url::parse(value) {
        Ok(parsed) if is_web_scheme(&parsed) => None,
        Ok(_) => Some("URL must start with http:// or https://".to_string()),
        Err(_) => Some("Invalid URL".to_string()),
    }
}

/// Validate an optional calendar date in `YYYY-MM-DD` form.
pub fn date(value: &str) -> Option<String> {
    if value.is_empty() {
        return None;
    }

    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(_) => None,
        Err(_) => Some("Date must use the YYYY-MM-DD format".to_string()),
    }
}

pub(crate) fn is_web_scheme(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Parse a typed-in amount. Blank input and `NaN` are "absent".
pub fn parse_amount(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Parse a typed-in whole number. Blank input is "absent".
pub fn parse_whole(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<i64>().ok()
}
