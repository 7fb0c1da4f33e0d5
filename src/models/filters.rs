use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::{Category, WarmthLevel, WardrobeItem, WeatherResistance};

/// Optional predicates applied to the wardrobe query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WardrobeFilters {
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub warmth_level: Option<WarmthLevel>,
    #[serde(default)]
    pub weather_resistance: Option<WeatherResistance>,
    #[serde(default)]
    pub is_favorite: Option<bool>,
    /// Matches either the primary or the secondary colour
    #[serde(default)]
    pub color: Option<String>,
    /// Case-insensitive substring of the name
    #[serde(default)]
    pub search: Option<String>,
}

impl WardrobeFilters {
    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn warmth_level(mut self, level: WarmthLevel) -> Self {
        self.warmth_level = Some(level);
        self
    }

    pub fn weather_resistance(mut self, resistance: WeatherResistance) -> Self {
        self.weather_resistance = Some(resistance);
        self
    }

    pub fn favorites(mut self, is_favorite: bool) -> Self {
        self.is_favorite = Some(is_favorite);
        self
    }

    pub fn color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }

    pub fn search(mut self, term: &str) -> Self {
        self.search = Some(term.to_string());
        self
    }

    /// The search term as typed, or `None` when it is empty
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none()
            && self.warmth_level.is_none()
            && self.weather_resistance.is_none()
            && self.is_favorite.is_none()
            && self.color.is_none()
            && self.search_term().is_none()
    }

    /// Evaluate the same predicates the server applies
    pub fn matches(&self, item: &WardrobeItem) -> bool {
        if let Some(category) = self.category {
            if item.category != category {
                return false;
            }
        }
        if let Some(level) = self.warmth_level {
            if item.warmth_level != Some(level) {
                return false;
            }
        }
        if let Some(resistance) = self.weather_resistance {
            if item.weather_resistance != Some(resistance) {
                return false;
            }
        }
        if let Some(is_favorite) = self.is_favorite {
            if item.is_favorite != is_favorite {
                return false;
            }
        }
        if let Some(color) = &self.color {
            if !item.has_color(color) {
                return false;
            }
        }
        if let Some(term) = self.search_term() {
            if !item.name.to_lowercase().contains(&term.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

/// Column the wardrobe is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    CreatedAt,
    Name,
    TimesWorn,
    LastWornAt,
}

impl SortField {
    pub fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::Name => "name",
            SortField::TimesWorn => "times_worn",
            SortField::LastWornAt => "last_worn_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WardrobeSortOptions {
    pub sort_by: SortField,
    pub order: SortDirection,
}

impl WardrobeSortOptions {
    pub fn new(sort_by: SortField, order: SortDirection) -> Self {
        Self { sort_by, order }
    }

    pub fn is_ascending(&self) -> bool {
        self.order == SortDirection::Asc
    }

    /// Order two items the way the server would.
    ///
    /// Nulls sort last when ascending and first when descending. Names
    /// compare case-insensitively.
    pub fn compare(&self, a: &WardrobeItem, b: &WardrobeItem) -> Ordering {
        let ordering = match self.sort_by {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortField::TimesWorn => a.times_worn.cmp(&b.times_worn),
            SortField::LastWornAt => match (a.last_worn_at, b.last_worn_at) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        };
        // Reversing also moves nulls first for descending order.
        match self.order {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}
