//! Field-level validation helpers shared by every write operation.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

pub const TITLE_MAX_LEN: usize = 200;
pub const AUTHOR_NAME_MAX_LEN: usize = 100;
pub const USERNAME_MAX_LEN: usize = 150;
pub const PASSWORD_MIN_LEN: usize = 8;

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";

/// Validation failures keyed by field name.
///
/// Fields are kept sorted so error bodies are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an error set holding a single message.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> &BTreeMap<String, Vec<String>> {
        &self.fields
    }

    pub fn into_fields(self) -> BTreeMap<String, Vec<String>> {
        self.fields
    }

    /// Return `value` when nothing was recorded, otherwise the errors.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.fields {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Require a present, non-blank text value no longer than `max_len` characters.
///
/// Returns the trimmed value when it passes.
pub fn required_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<String>,
    max_len: Option<usize>,
) -> Option<String> {
    let Some(value) = value else {
        errors.add(field, REQUIRED);
        return None;
    };
    let value = value.trim().to_string();
    let before = errors.get(field).map_or(0, <[String]>::len);
    match max_len {
        Some(max) => check_text(errors, field, &value, max),
        None if value.is_empty() => errors.add(field, BLANK),
        None => {}
    }
    let after = errors.get(field).map_or(0, <[String]>::len);
    (before == after).then_some(value)
}

/// Check that `value` is non-blank and at most `max_len` characters.
pub fn check_text(errors: &mut ValidationErrors, field: &str, value: &str, max_len: usize) {
    if value.trim().is_empty() {
        errors.add(field, BLANK);
    } else if value.chars().count() > max_len {
        errors.add(
            field,
            format!("Ensure this field has no more than {max_len} characters."),
        );
    }
}

/// Minimal structural email check: a non-empty local part and domain around one `@`.
pub fn check_email(errors: &mut ValidationErrors, field: &str, value: &str) {
    let value = value.trim();
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !value.contains(' ')
        }
        None => false,
    };
    if !valid {
        errors.add(field, "Enter a valid email address.");
    }
}

/// Parse a timestamp given as RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS` (read as UTC)
/// or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    parse_date(raw).and_then(|date| date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc()))
}

/// Parse a bare `YYYY-MM-DD` calendar date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}
