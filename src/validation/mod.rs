//! Form validation rules for the account, profile and item screens
//!
//! Leaf rules implement [`FieldSchema`] and report a single [`Violation`].
//! Form records implement [`FormSchema`] and collect every failing field
//! into one [`ValidationErrors`] value, in field order. Both the inline
//! per-field view and the single toast message are read from it.

mod fields;
mod forms;

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

pub use fields::*;
pub use forms::*;

/// What kind of rule a value broke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Required,
    InvalidFormat,
    TooShort,
    TooLong,
    MissingUppercase,
    MissingLowercase,
    MissingDigit,
    InvalidCharacters,
    Mismatch,
    MustBeTrue,
    InvalidValue,
    OutOfRange,
    InvalidType,
}

/// A single broken rule, before it is attached to a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub kind: ErrorKind,
    pub message: String,
}

impl Violation {
    pub fn new<T: Into<String>>(kind: ErrorKind, message: T) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Attach to a field path
    pub fn at(self, field: &str) -> FieldError {
        FieldError {
            field: field.to_string(),
            kind: self.kind,
            message: self.message,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Violation {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Key of the field in the submitted record
    pub field: String,
    pub kind: ErrorKind,
    pub message: String,
}

/// Every failing field of one form submission, in field order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, violation: Violation) -> Self {
        let mut errors = Self::new();
        errors.push(violation.at(field));
        errors
    }

    pub fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    /// Record the violation of `result` under `field` and pass the value on
    pub fn check<T>(&mut self, field: &str, result: Result<T, Violation>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(violation) => {
                self.push(violation.at(field));
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn has(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// First error reported for `field`
    pub fn get(&self, field: &str) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field == field)
    }

    pub fn first(&self) -> Option<&FieldError> {
        self.errors.first()
    }

    /// Message for a toast
    pub fn first_message(&self) -> Option<&str> {
        self.first().map(|e| e.message.as_str())
    }

    /// Failing fields without duplicates, in the order they were reported
    pub fn fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = Vec::new();
        for error in &self.errors {
            if !fields.contains(&error.field.as_str()) {
                fields.push(&error.field);
            }
        }
        fields
    }

    /// First message per field, for inline display
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        for error in &self.errors {
            map.entry(error.field.clone())
                .or_insert_with(|| error.message.clone());
        }
        map
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// `Ok(value)` when nothing was recorded
    pub fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.first_message() {
            Some(message) => f.write_str(message),
            None => f.write_str("Validation failed"),
        }
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn views_derive_from_one_collection() {
        let mut errors = ValidationErrors::new();
        errors.push(Violation::new(ErrorKind::InvalidFormat, "bad email").at("email"));
        errors.push(Violation::new(ErrorKind::TooShort, "short").at("password"));
        errors.push(Violation::new(ErrorKind::MissingDigit, "digit").at("password"));

        assert_eq!(errors.first_message(), Some("bad email"));
        assert_eq!(errors.to_string(), "bad email");
        assert_eq!(errors.fields(), vec!["email", "password"]);
        assert_eq!(errors.get("password").map(|e| e.kind), Some(ErrorKind::TooShort));
        assert_eq!(errors.to_map().get("password").map(String::as_str), Some("short"));
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn check_records_failures_only() {
        let mut errors = ValidationErrors::new();
        assert_eq!(errors.check("a", Ok::<_, Violation>(1)), Some(1));
        assert!(errors.is_empty());
        assert_eq!(
            errors.check::<u8>("b", Err(Violation::new(ErrorKind::Required, "b is required"))),
            None
        );
        assert!(errors.has("b"));
        assert!(errors.into_result(()).is_err());
    }
}
