use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{
    EmailSchema, ErrorKind, FieldSchema, MaxLengthSchema, OptionalOrEmpty, PasswordSchema,
    RequiredSchema, UsernameSchema, ValidationErrors, Violation,
};
use crate::models::{
    Category, ClassificationSource, NewWardrobeItem, WarmthLevel, WeatherResistance,
    MANUAL_CONFIDENCE,
};
use crate::profile::ProfileUpdate;

/// JSON type a form field accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Flag,
    Number,
}

impl FieldType {
    fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldType::Text => value.is_string(),
            FieldType::Flag => value.is_boolean(),
            FieldType::Number => value.is_number(),
        }
    }

    fn expected(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Flag => "true or false",
            FieldType::Number => "a number",
        }
    }
}

/// A raw form record and the rules that turn it into a typed value
pub trait FormSchema: DeserializeOwned {
    type Output;

    /// Record keys and the JSON type each accepts
    const FIELDS: &'static [(&'static str, FieldType)];

    fn validate(&self) -> Result<Self::Output, ValidationErrors>;

    /// Parse a plain key-value record as collected from a form.
    ///
    /// Missing and `null` keys take their empty default. A key holding the
    /// wrong JSON type is reported as `InvalidType` on that key.
    fn parse_record(record: Value) -> Result<Self::Output, ValidationErrors> {
        let map = match record {
            Value::Object(map) => map,
            _ => {
                return Err(ValidationErrors::single(
                    "",
                    Violation::new(ErrorKind::InvalidType, "Expected a form record"),
                ))
            }
        };

        let mut errors = ValidationErrors::new();
        let mut fields = Map::new();
        for (name, field_type) in Self::FIELDS {
            match map.get(*name) {
                None | Some(Value::Null) => {}
                Some(value) if field_type.accepts(value) => {
                    fields.insert(name.to_string(), value.clone());
                }
                Some(_) => errors.push(
                    Violation::new(
                        ErrorKind::InvalidType,
                        format!("Expected {} for {}", field_type.expected(), name),
                    )
                    .at(name),
                ),
            }
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        let form: Self = serde_json::from_value(Value::Object(fields)).map_err(|e| {
            ValidationErrors::single("", Violation::new(ErrorKind::InvalidType, e.to_string()))
        })?;
        form.validate()
    }
}

const CONFIRM_PASSWORD: &str = "confirmPassword";
const PASSWORDS_DIFFER: &str = "Passwords do not match";

/// Attach the mismatch to `confirmPassword` unless that field already failed
fn check_confirmation(errors: &mut ValidationErrors, password: &str, confirmation: &str) {
    if password != confirmation && !errors.has(CONFIRM_PASSWORD) {
        errors.push(Violation::new(ErrorKind::Mismatch, PASSWORDS_DIFFER).at(CONFIRM_PASSWORD));
    }
}

fn confirm_rule() -> RequiredSchema {
    RequiredSchema::new("Please confirm your password")
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignUpForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub accept_terms: bool,
    pub username: String,
}

/// Validated sign-up input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpData {
    pub email: String,
    pub password: String,
    pub username: Option<String>,
}

impl FormSchema for SignUpForm {
    type Output = SignUpData;

    const FIELDS: &'static [(&'static str, FieldType)] = &[
        ("email", FieldType::Text),
        ("username", FieldType::Text),
        ("password", FieldType::Text),
        ("confirmPassword", FieldType::Text),
        ("acceptTerms", FieldType::Flag),
    ];

    fn validate(&self) -> Result<SignUpData, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let email = errors.check("email", EmailSchema.parse(&self.email));
        let username = errors.check(
            "username",
            OptionalOrEmpty(UsernameSchema::standard()).parse(&self.username),
        );
        let password = errors.check("password", PasswordSchema::new().parse(&self.password));
        errors.check(CONFIRM_PASSWORD, confirm_rule().parse(&self.confirm_password));
        if !self.accept_terms {
            errors.push(
                Violation::new(
                    ErrorKind::MustBeTrue,
                    "You must accept the terms and conditions",
                )
                .at("acceptTerms"),
            );
        }
        check_confirmation(&mut errors, &self.password, &self.confirm_password);

        match (email, username, password) {
            (Some(email), Some(username), Some(password)) if errors.is_empty() => Ok(SignUpData {
                email,
                password,
                username,
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInData {
    pub email: String,
    pub password: String,
}

impl FormSchema for SignInForm {
    type Output = SignInData;

    const FIELDS: &'static [(&'static str, FieldType)] =
        &[("email", FieldType::Text), ("password", FieldType::Text)];

    fn validate(&self) -> Result<SignInData, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let email = errors.check("email", EmailSchema.parse(&self.email));
        // Existing passwords are only checked for presence and sent as typed.
        let password = errors.check(
            "password",
            RequiredSchema::untrimmed("Password is required").parse(&self.password),
        );

        match (email, password) {
            (Some(email), Some(password)) => Ok(SignInData { email, password }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ForgotPasswordForm {
    pub email: String,
}

impl FormSchema for ForgotPasswordForm {
    /// The normalized email
    type Output = String;

    const FIELDS: &'static [(&'static str, FieldType)] = &[("email", FieldType::Text)];

    fn validate(&self) -> Result<String, ValidationErrors> {
        EmailSchema
            .parse(&self.email)
            .map_err(|v| ValidationErrors::single("email", v))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResetPasswordForm {
    pub password: String,
    pub confirm_password: String,
}

impl FormSchema for ResetPasswordForm {
    /// The new password
    type Output = String;

    const FIELDS: &'static [(&'static str, FieldType)] = &[
        ("password", FieldType::Text),
        ("confirmPassword", FieldType::Text),
    ];

    fn validate(&self) -> Result<String, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let password = errors.check("password", PasswordSchema::new().parse(&self.password));
        errors.check(CONFIRM_PASSWORD, confirm_rule().parse(&self.confirm_password));
        check_confirmation(&mut errors, &self.password, &self.confirm_password);

        match password {
            Some(password) if errors.is_empty() => Ok(password),
            _ => Err(errors),
        }
    }
}

/// Profile edit screen; blank fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub username: String,
    pub full_name: String,
    pub bio: String,
}

impl FormSchema for ProfileForm {
    type Output = ProfileUpdate;

    const FIELDS: &'static [(&'static str, FieldType)] = &[
        ("username", FieldType::Text),
        ("full_name", FieldType::Text),
        ("bio", FieldType::Text),
    ];

    fn validate(&self) -> Result<ProfileUpdate, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let username = errors.check(
            "username",
            OptionalOrEmpty(UsernameSchema::standard()).parse(&self.username),
        );
        let full_name = errors.check(
            "full_name",
            OptionalOrEmpty(MaxLengthSchema::full_name()).parse(&self.full_name),
        );
        let bio = errors.check("bio", OptionalOrEmpty(MaxLengthSchema::bio()).parse(&self.bio));

        match (username, full_name, bio) {
            (Some(username), Some(full_name), Some(bio)) => Ok(ProfileUpdate {
                username,
                full_name,
                bio,
                ..ProfileUpdate::default()
            }),
            _ => Err(errors),
        }
    }
}

/// Add-item screen
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemForm {
    pub name: String,
    pub category: String,
    pub subcategory: String,
    pub primary_color: String,
    pub secondary_color: String,
    pub pattern: String,
    pub material: String,
    pub warmth_level: String,
    pub weather_resistance: String,
    pub notes: String,
    pub classification_source: String,
    pub ai_confidence: Option<f64>,
}

pub const ITEM_NAME_REQUIRED: &str = "Item name is required";
const SELECT_CATEGORY: &str = "Please select a category";

fn parse_choice<T: std::str::FromStr>(input: &str, message: &str) -> Result<Option<T>, Violation> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    input
        .parse()
        .map(Some)
        .map_err(|_| Violation::new(ErrorKind::InvalidValue, message))
}

fn text(input: &str) -> Option<String> {
    let trimmed = input.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl FormSchema for ItemForm {
    type Output = NewWardrobeItem;

    const FIELDS: &'static [(&'static str, FieldType)] = &[
        ("name", FieldType::Text),
        ("category", FieldType::Text),
        ("subcategory", FieldType::Text),
        ("primaryColor", FieldType::Text),
        ("secondaryColor", FieldType::Text),
        ("pattern", FieldType::Text),
        ("material", FieldType::Text),
        ("warmthLevel", FieldType::Text),
        ("weatherResistance", FieldType::Text),
        ("notes", FieldType::Text),
        ("classificationSource", FieldType::Text),
        ("aiConfidence", FieldType::Number),
    ];

    fn validate(&self) -> Result<NewWardrobeItem, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = errors.check(
            "name",
            RequiredSchema::new(ITEM_NAME_REQUIRED).parse(&self.name),
        );
        let category = errors.check(
            "category",
            parse_choice::<Category>(&self.category, SELECT_CATEGORY).and_then(|c| {
                c.ok_or_else(|| Violation::new(ErrorKind::Required, SELECT_CATEGORY))
            }),
        );
        let warmth_level = errors.check(
            "warmthLevel",
            parse_choice::<WarmthLevel>(&self.warmth_level, "Please select a valid warmth level"),
        );
        let weather_resistance = errors.check(
            "weatherResistance",
            parse_choice::<WeatherResistance>(
                &self.weather_resistance,
                "Please select a valid weather resistance",
            ),
        );
        let source = errors.check(
            "classificationSource",
            parse_choice::<ClassificationSource>(
                &self.classification_source,
                "Unknown classification source",
            ),
        );
        if let Some(confidence) = self.ai_confidence {
            if !(0.0..=1.0).contains(&confidence) {
                errors.push(
                    Violation::new(ErrorKind::OutOfRange, "Confidence must be between 0 and 1")
                        .at("aiConfidence"),
                );
            }
        }

        let (Some(name), Some(category), Some(warmth_level), Some(weather_resistance), Some(source)) =
            (name, category, warmth_level, weather_resistance, source)
        else {
            return Err(errors);
        };
        if !errors.is_empty() {
            return Err(errors);
        }

        let mut item = NewWardrobeItem::manual(&name, category);
        if let Some(source) = source.filter(|s| *s != ClassificationSource::Manual) {
            item.classification_source = Some(source);
            item.ai_confidence = self.ai_confidence;
        } else {
            item.ai_confidence = Some(MANUAL_CONFIDENCE);
        }
        item.subcategory = text(&self.subcategory);
        item.primary_color = text(&self.primary_color);
        item.secondary_color = text(&self.secondary_color);
        item.pattern = text(&self.pattern);
        item.material = text(&self.material);
        item.warmth_level = warmth_level;
        item.weather_resistance = weather_resistance;
        item.notes = text(&self.notes);
        Ok(item)
    }
}
