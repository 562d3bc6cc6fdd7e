//! Field validators shared by entities. Each returns the trimmed value on success.

use std::str::FromStr;

use email_address::EmailAddress;

use crate::errors::ModelError;

/// Trim and require a non-empty value of at most `max` characters.
pub fn required_text(field: &str, value: &str, max: usize) -> Result<String, ModelError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(ModelError::Validation(format!("{field} required")));
    }
    if v.chars().count() > max {
        return Err(ModelError::Validation(format!("{field} too long (<= {max})")));
    }
    Ok(v.to_string())
}

/// Trim an optional value; blank becomes `None`.
pub fn optional_text(field: &str, value: Option<&str>, max: usize) -> Result<Option<String>, ModelError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) if v.chars().count() > max => {
            Err(ModelError::Validation(format!("{field} too long (<= {max})")))
        }
        Some(v) => Ok(Some(v.to_string())),
    }
}

/// Validate an email address; returns it lowercased.
pub fn email(value: &str) -> Result<String, ModelError> {
    let v = value.trim();
    if v.len() > 254 || EmailAddress::from_str(v).is_err() {
        return Err(ModelError::Validation("invalid email".into()));
    }
    Ok(v.to_ascii_lowercase())
}

/// Loose phone check: digits plus common separators, 6..=40 chars.
pub fn phone(value: Option<&str>) -> Result<Option<String>, ModelError> {
    let Some(v) = optional_text("phone", value, 40)? else { return Ok(None) };
    let digits = v.chars().filter(|c| c.is_ascii_digit()).count();
    let allowed = v.chars().all(|c| c.is_ascii_digit() || " +-().".contains(c));
    if !allowed || digits < 6 {
        return Err(ModelError::Validation("invalid phone number".into()));
    }
    Ok(Some(v))
}
