use validator::ValidateEmail;

use super::{ErrorKind, Violation};

/// A rule for one text field
pub trait FieldSchema {
    type Output;

    fn parse(&self, input: &str) -> Result<Self::Output, Violation>;

    fn is_valid(&self, input: &str) -> bool {
        self.parse(input).is_ok()
    }
}

pub const EMAIL_MESSAGE: &str = "Please enter a valid email address";

/// Email address; yields the trimmed, lowercased form
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailSchema;

impl FieldSchema for EmailSchema {
    type Output = String;

    fn parse(&self, input: &str) -> Result<String, Violation> {
        let candidate = input.trim().to_lowercase();
        let has_dotted_domain = candidate
            .rsplit_once('@')
            .map(|(_, domain)| {
                domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
            })
            .unwrap_or(false);

        if !has_dotted_domain || !candidate.validate_email() {
            return Err(Violation::new(ErrorKind::InvalidFormat, EMAIL_MESSAGE));
        }
        Ok(candidate)
    }
}

pub const PASSWORD_MIN_LENGTH: usize = 8;

/// New password strength rule.
///
/// Checks run in a fixed order and stop at the first failure: length,
/// digit, uppercase, then lowercase when required.
#[derive(Debug, Clone, Copy)]
pub struct PasswordSchema {
    pub require_lowercase: bool,
}

impl PasswordSchema {
    pub fn new() -> Self {
        Self {
            require_lowercase: true,
        }
    }

    /// The older rule without the lowercase requirement
    pub fn lenient() -> Self {
        Self {
            require_lowercase: false,
        }
    }
}

impl Default for PasswordSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldSchema for PasswordSchema {
    type Output = String;

    fn parse(&self, input: &str) -> Result<String, Violation> {
        if input.chars().count() < PASSWORD_MIN_LENGTH {
            return Err(Violation::new(
                ErrorKind::TooShort,
                format!("Password must be at least {} characters", PASSWORD_MIN_LENGTH),
            ));
        }
        if !input.chars().any(|c| c.is_ascii_digit()) {
            return Err(Violation::new(
                ErrorKind::MissingDigit,
                "Password must contain at least one number",
            ));
        }
        if !input.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(Violation::new(
                ErrorKind::MissingUppercase,
                "Password must contain at least one uppercase letter",
            ));
        }
        if self.require_lowercase && !input.chars().any(|c| c.is_ascii_lowercase()) {
            return Err(Violation::new(
                ErrorKind::MissingLowercase,
                "Password must contain at least one lowercase letter",
            ));
        }
        Ok(input.to_string())
    }
}

/// Username: ASCII letters, digits and underscores
#[derive(Debug, Clone, Copy)]
pub struct UsernameSchema {
    pub min: usize,
    pub max: usize,
    /// Reject a leading or trailing underscore
    pub forbid_edge_underscore: bool,
}

impl UsernameSchema {
    /// 3 to 20 characters
    pub fn standard() -> Self {
        Self {
            min: 3,
            max: 20,
            forbid_edge_underscore: false,
        }
    }

    /// 3 to 30 characters, no underscore at either end
    pub fn strict() -> Self {
        Self {
            min: 3,
            max: 30,
            forbid_edge_underscore: true,
        }
    }
}

impl Default for UsernameSchema {
    fn default() -> Self {
        Self::standard()
    }
}

impl FieldSchema for UsernameSchema {
    type Output = String;

    fn parse(&self, input: &str) -> Result<String, Violation> {
        let length = input.chars().count();
        if length < self.min {
            return Err(Violation::new(
                ErrorKind::TooShort,
                format!("Username must be at least {} characters", self.min),
            ));
        }
        if length > self.max {
            return Err(Violation::new(
                ErrorKind::TooLong,
                format!("Username must be at most {} characters", self.max),
            ));
        }
        if !input.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(Violation::new(
                ErrorKind::InvalidCharacters,
                "Username can only contain letters, numbers, and underscores",
            ));
        }
        if self.forbid_edge_underscore && (input.starts_with('_') || input.ends_with('_')) {
            return Err(Violation::new(
                ErrorKind::InvalidCharacters,
                "Username cannot start or end with an underscore",
            ));
        }
        Ok(input.to_string())
    }
}

/// Upper bound on character count
#[derive(Debug, Clone, Copy)]
pub struct MaxLengthSchema {
    pub label: &'static str,
    pub max: usize,
}

impl MaxLengthSchema {
    pub const fn new(label: &'static str, max: usize) -> Self {
        Self { label, max }
    }

    pub const fn full_name() -> Self {
        Self::new("Full name", 100)
    }

    pub const fn bio() -> Self {
        Self::new("Bio", 500)
    }
}

impl FieldSchema for MaxLengthSchema {
    type Output = String;

    fn parse(&self, input: &str) -> Result<String, Violation> {
        if input.chars().count() > self.max {
            return Err(Violation::new(
                ErrorKind::TooLong,
                format!("{} must be at most {} characters", self.label, self.max),
            ));
        }
        Ok(input.to_string())
    }
}

/// Non-blank text; yields the trimmed value
#[derive(Debug, Clone, Copy)]
pub struct RequiredSchema {
    pub message: &'static str,
    /// When false only an empty value fails and the input is kept as typed
    pub trim: bool,
}

impl RequiredSchema {
    pub const fn new(message: &'static str) -> Self {
        Self { message, trim: true }
    }

    /// Presence check for secrets, where whitespace is significant
    pub const fn untrimmed(message: &'static str) -> Self {
        Self {
            message,
            trim: false,
        }
    }
}

impl FieldSchema for RequiredSchema {
    type Output = String;

    fn parse(&self, input: &str) -> Result<String, Violation> {
        let value = if self.trim { input.trim() } else { input };
        if value.is_empty() {
            return Err(Violation::new(ErrorKind::Required, self.message));
        }
        Ok(value.to_string())
    }
}

/// Treats blank input as unset and otherwise applies the inner rule
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionalOrEmpty<S>(pub S);

impl<S: FieldSchema> FieldSchema for OptionalOrEmpty<S> {
    type Output = Option<S::Output>;

    fn parse(&self, input: &str) -> Result<Self::Output, Violation> {
        if input.trim().is_empty() {
            return Ok(None);
        }
        self.0.parse(input).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_normalized() {
        assert_eq!(
            EmailSchema.parse("  Jane.Doe@Example.COM ").unwrap(),
            "jane.doe@example.com"
        );
    }

    #[test]
    fn email_rejects_bad_shapes() {
        for input in ["", "plainaddress", "no-at.example.com", "a@b", "a@.com", "a b@c.com"] {
            let err = EmailSchema.parse(input).unwrap_err();
            assert_eq!(err.kind, ErrorKind::InvalidFormat, "{}", input);
            assert_eq!(err.message, EMAIL_MESSAGE);
        }
    }

    #[test]
    fn short_passwords_fail_first() {
        for input in ["", "Ab1", "aaaaaaa", "PASSWO1"] {
            assert_eq!(
                PasswordSchema::new().parse(input).unwrap_err().kind,
                ErrorKind::TooShort
            );
        }
    }

    #[test]
    fn long_passwords_without_digit_fail_on_digit() {
        for input in ["password", "PASSWORDS", "Password!", "abcdefghij"] {
            assert_eq!(
                PasswordSchema::new().parse(input).unwrap_err().kind,
                ErrorKind::MissingDigit
            );
        }
    }

    #[test]
    fn password_case_rules() {
        assert_eq!(PasswordSchema::new().parse("Password123").unwrap(), "Password123");
        assert_eq!(
            PasswordSchema::new().parse("password123").unwrap_err().kind,
            ErrorKind::MissingUppercase
        );
        assert_eq!(
            PasswordSchema::new().parse("PASSWORD123").unwrap_err().kind,
            ErrorKind::MissingLowercase
        );
        assert!(PasswordSchema::lenient().parse("PASSWORD123").is_ok());
    }

    #[test]
    fn password_case_rules_count_ascii_letters_only() {
        assert_eq!(
            PasswordSchema::new().parse("password1É").unwrap_err().kind,
            ErrorKind::MissingUppercase
        );
        assert_eq!(
            PasswordSchema::new().parse("PASSWORD1é").unwrap_err().kind,
            ErrorKind::MissingLowercase
        );
    }

    #[test]
    fn username_rules() {
        let standard = UsernameSchema::standard();
        assert_eq!(standard.parse("ab").unwrap_err().kind, ErrorKind::TooShort);
        assert_eq!(standard.parse("validuser123").unwrap(), "validuser123");
        assert_eq!(standard.parse("_under_").unwrap(), "_under_");
        assert_eq!(
            standard.parse("a_very_long_username_here").unwrap_err().kind,
            ErrorKind::TooLong
        );
        assert_eq!(
            standard.parse("bad-name").unwrap_err().kind,
            ErrorKind::InvalidCharacters
        );

        let strict = UsernameSchema::strict();
        assert!(strict.parse("a_very_long_username_here").is_ok());
        assert_eq!(
            strict.parse("_under").unwrap_err().kind,
            ErrorKind::InvalidCharacters
        );
    }

    #[test]
    fn optional_or_empty() {
        let bio = OptionalOrEmpty(MaxLengthSchema::bio());
        assert_eq!(bio.parse("").unwrap(), None);
        assert_eq!(bio.parse("Hi").unwrap(), Some("Hi".to_string()));
        assert_eq!(
            bio.parse(&"x".repeat(501)).unwrap_err().message,
            "Bio must be at most 500 characters"
        );
        assert!(OptionalOrEmpty(UsernameSchema::standard()).parse("ab").is_err());
    }

    #[test]
    fn required_trims() {
        let name = RequiredSchema::new("Item name is required");
        assert_eq!(name.parse("  Shirt ").unwrap(), "Shirt");
        assert_eq!(name.parse("   ").unwrap_err().kind, ErrorKind::Required);
    }
}
