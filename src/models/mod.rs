//! Domain records for the wardrobe and the decode step from remote rows

mod catalog;
mod filters;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::DecodeError;

pub use catalog::*;
pub use filters::*;

/// Declares a closed set of wire strings with labels.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal, $label:literal; )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $wire)] $variant, )+
        }

        impl $name {
            /// Every value, in display order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The value stored in the table
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }

            /// Human readable name
            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownValue;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(UnknownValue {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

/// A string that is not one of an enum's wire values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value '{value}'")]
pub struct UnknownValue {
    pub kind: &'static str,
    pub value: String,
}

wire_enum! {
    /// Clothing category
    Category {
        Tops => "tops", "Tops";
        Bottoms => "bottoms", "Bottoms";
        Dresses => "dresses", "Dresses";
        Outerwear => "outerwear", "Outerwear";
        Shoes => "shoes", "Shoes";
        Accessories => "accessories", "Accessories";
        Activewear => "activewear", "Activewear";
        Formal => "formal", "Formal";
        Other => "other", "Other";
    }
}

wire_enum! {
    /// Temperature suitability, used instead of calendar seasons
    WarmthLevel {
        Ultralight => "ultralight", "Ultralight";
        Light => "light", "Light";
        Medium => "medium", "Medium";
        Heavy => "heavy", "Heavy";
        VeryHeavy => "very_heavy", "Very Heavy";
    }
}

wire_enum! {
    /// How well an item keeps out rain
    WeatherResistance {
        None => "none", "None";
        WaterResistant => "water_resistant", "Water Resistant";
        Waterproof => "waterproof", "Waterproof";
    }
}

wire_enum! {
    /// Where an item's classification came from
    ClassificationSource {
        /// Image classification model
        ImageModel => "fashionclip", "FashionCLIP";
        /// Vision-language model
        VisionLanguageModel => "vlm", "Vision LLM";
        /// Automated result edited by the user
        UserCorrected => "user", "User Corrected";
        Manual => "manual", "Manual Entry";
    }
}

impl ClassificationSource {
    /// True for model-produced classifications
    pub fn is_automated(&self) -> bool {
        matches!(
            self,
            ClassificationSource::ImageModel | ClassificationSource::VisionLanguageModel
        )
    }
}

/// Confidence recorded for manual entries
pub const MANUAL_CONFIDENCE: f64 = 1.0;

/// One clothing item owned by one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WardrobeItem {
    pub id: String,
    pub user_id: String,

    pub name: String,
    pub category: Category,
    #[serde(default)]
    pub subcategory: Option<String>,

    #[serde(default)]
    pub primary_color: Option<String>,
    #[serde(default)]
    pub secondary_color: Option<String>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub size: Option<String>,

    #[serde(default)]
    pub warmth_level: Option<WarmthLevel>,
    #[serde(default)]
    pub weather_resistance: Option<WeatherResistance>,

    #[serde(default)]
    pub style_tags: Option<Vec<String>>,
    #[serde(default)]
    pub occasion: Option<Vec<String>>,

    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,

    #[serde(default)]
    pub classification_source: Option<ClassificationSource>,
    #[serde(default)]
    pub ai_confidence: Option<f64>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub is_favorite: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub times_worn: u32,
    #[serde(default)]
    pub last_worn_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub purchase_date: Option<String>,
    #[serde(default)]
    pub purchase_price: Option<f64>,

    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub ai_classification: Option<Value>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn row_id(row: &Value) -> Option<String> {
    match row.get("id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

impl WardrobeItem {
    /// Map one remote row onto a typed item.
    ///
    /// Beyond the shape check this enforces the item invariants: a
    /// non-blank name and a confidence within [0, 1].
    pub fn decode(row: Value) -> Result<Self, DecodeError> {
        if !row.is_object() {
            return Err(DecodeError::new("wardrobe item", None, "expected a JSON object"));
        }
        let id = row_id(&row);

        let item: WardrobeItem = serde_json::from_value(row)
            .map_err(|e| DecodeError::new("wardrobe item", id.clone(), e))?;

        if item.name.trim().is_empty() {
            return Err(DecodeError::new("wardrobe item", id, "name is blank"));
        }
        if let Some(confidence) = item.ai_confidence {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(DecodeError::new(
                    "wardrobe item",
                    id,
                    format!("ai_confidence {} is outside [0, 1]", confidence),
                ));
            }
        }
        Ok(item)
    }

    /// Decode a response body that should hold an array of rows
    pub fn decode_rows(body: Value) -> Result<Vec<Self>, DecodeError> {
        match body {
            Value::Array(rows) => rows.into_iter().map(Self::decode).collect(),
            Value::Null => Ok(Vec::new()),
            _ => Err(DecodeError::new("wardrobe item", None, "expected an array of rows")),
        }
    }

    /// Decode a representation body that should hold exactly one row.
    ///
    /// Returns `Ok(None)` for an empty result.
    pub fn decode_single(body: Value) -> Result<Option<Self>, DecodeError> {
        match body {
            Value::Array(rows) => {
                let mut rows = rows.into_iter();
                let first = rows.next();
                if rows.next().is_some() {
                    return Err(DecodeError::new(
                        "wardrobe item",
                        None,
                        "expected a single row, got several",
                    ));
                }
                first.map(Self::decode).transpose()
            }
            Value::Null => Ok(None),
            row => Self::decode(row).map(Some),
        }
    }

    /// True when `color` is the primary or the secondary colour
    pub fn has_color(&self, color: &str) -> bool {
        self.primary_color.as_deref() == Some(color) || self.secondary_color.as_deref() == Some(color)
    }
}

/// Insert payload for a new item; the owner id is added by the manager.
///
/// Built through [`NewWardrobeItem::manual`] or `ItemForm`, so a payload
/// always carries a category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewWardrobeItem {
    pub name: String,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warmth_level: Option<WarmthLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather_resistance: Option<WeatherResistance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occasion: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification_source: Option<ClassificationSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_classification: Option<Value>,
}

impl NewWardrobeItem {
    /// A manually entered item: source `manual`, confidence 1.0
    pub fn manual(name: &str, category: Category) -> Self {
        Self {
            name: name.trim().to_string(),
            category,
            subcategory: None,
            primary_color: None,
            secondary_color: None,
            pattern: None,
            material: None,
            brand: None,
            size: None,
            warmth_level: None,
            weather_resistance: None,
            style_tags: None,
            occasion: None,
            image_url: None,
            thumbnail_url: None,
            classification_source: Some(ClassificationSource::Manual),
            ai_confidence: Some(MANUAL_CONFIDENCE),
            notes: None,
            ai_classification: None,
        }
    }

    pub fn with_image(mut self, image_url: &str, thumbnail_url: Option<&str>) -> Self {
        self.image_url = Some(image_url.to_string());
        self.thumbnail_url = thumbnail_url.map(str::to_string);
        self
    }
}

/// Partial update; only `Some` fields are sent
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct WardrobeItemUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warmth_level: Option<WarmthLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather_resistance: Option<WeatherResistance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occasion: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification_source: Option<ClassificationSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub times_worn: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_worn_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<f64>,
}

impl WardrobeItemUpdate {
    pub fn favorite(is_favorite: bool) -> Self {
        Self {
            is_favorite: Some(is_favorite),
            ..Self::default()
        }
    }

    /// True when no field would be sent
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn row(id: &str, name: &str, category: &str) -> Value {
        json!({
            "id": id,
            "user_id": "user-1",
            "name": name,
            "category": category,
            "subcategory": null,
            "primary_color": "navy",
            "warmth_level": "very_heavy",
            "weather_resistance": "water_resistant",
            "classification_source": "fashionclip",
            "ai_confidence": 0.82,
            "is_favorite": null,
            "times_worn": null,
            "last_worn_at": null,
            "created_at": "2024-03-01T10:00:00.123456+00:00",
            "updated_at": "2024-03-01T10:00:00+00:00"
        })
    }

    #[test]
    fn decodes_wire_values() {
        let item = WardrobeItem::decode(row("a", "Parka", "outerwear")).unwrap();
        assert_eq!(item.category, Category::Outerwear);
        assert_eq!(item.warmth_level, Some(WarmthLevel::VeryHeavy));
        assert_eq!(item.weather_resistance, Some(WeatherResistance::WaterResistant));
        assert_eq!(item.classification_source, Some(ClassificationSource::ImageModel));
        assert!(!item.is_favorite);
        assert_eq!(item.times_worn, 0);
    }

    #[test]
    fn rejects_unknown_category() {
        let err = WardrobeItem::decode(row("b", "Cape", "capes")).unwrap_err();
        assert_eq!(err.row.as_deref(), Some("b"));
        assert!(err.to_string().contains("Malformed wardrobe item row b"));
    }

    #[test]
    fn rejects_negative_times_worn() {
        let mut value = row("c", "Tee", "tops");
        value["times_worn"] = json!(-1);
        assert!(WardrobeItem::decode(value).is_err());
    }

    #[test]
    fn rejects_confidence_out_of_range() {
        let mut value = row("d", "Tee", "tops");
        value["ai_confidence"] = json!(1.5);
        let err = WardrobeItem::decode(value).unwrap_err();
        assert!(err.message.contains("outside [0, 1]"));
    }

    #[test]
    fn rejects_blank_name_and_non_objects() {
        assert!(WardrobeItem::decode(row("e", "   ", "tops")).is_err());
        assert!(WardrobeItem::decode(json!("tops")).is_err());
        assert!(WardrobeItem::decode_rows(json!({"id": "x"})).is_err());
    }

    #[test]
    fn decode_single_handles_arrays() {
        assert!(WardrobeItem::decode_single(json!([])).unwrap().is_none());
        let one = WardrobeItem::decode_single(json!([row("f", "Tee", "tops")])).unwrap();
        assert_eq!(one.map(|i| i.id), Some("f".to_string()));
        assert!(
            WardrobeItem::decode_single(json!([row("g", "A", "tops"), row("h", "B", "tops")]))
                .is_err()
        );
    }

    #[test]
    fn manual_item_serializes_only_set_fields() {
        let item = NewWardrobeItem::manual("  Blue Shirt ", Category::Tops);
        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({
                "name": "Blue Shirt",
                "category": "tops",
                "classification_source": "manual",
                "ai_confidence": 1.0
            })
        );
    }

    #[test]
    fn new_item_always_sends_category() {
        let item = NewWardrobeItem::manual("Rain Jacket", Category::Outerwear);
        let body = serde_json::to_value(&item).unwrap();
        assert_eq!(body["category"], json!("outerwear"));
        assert_eq!(body["name"], json!("Rain Jacket"));
    }

    #[test]
    fn update_skips_unset_fields() {
        let update = WardrobeItemUpdate::favorite(true);
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({ "is_favorite": true }));
        assert!(WardrobeItemUpdate::default().is_empty());
        assert!(!update.is_empty());
    }

    #[test]
    fn enum_round_trip_through_strings() {
        for level in WarmthLevel::ALL {
            assert_eq!(level.as_str().parse::<WarmthLevel>().unwrap(), *level);
        }
        assert_eq!(Category::ALL.len(), 9);
        assert!("summer".parse::<WarmthLevel>().is_err());
        assert!(ClassificationSource::VisionLanguageModel.is_automated());
        assert!(!ClassificationSource::UserCorrected.is_automated());
    }
}
