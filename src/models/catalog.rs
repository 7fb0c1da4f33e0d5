//! Fixed vocabularies offered by the item pickers

use super::{Category, WarmthLevel, WeatherResistance};

impl Category {
    /// Suggested subcategories for this category
    pub fn subcategories(&self) -> &'static [&'static str] {
        match self {
            Category::Tops => &[
                "T-Shirts", "Shirts", "Blouses", "Sweaters", "Hoodies", "Tank Tops", "Crop Tops",
                "Polos",
            ],
            Category::Bottoms => &[
                "Jeans", "Pants", "Shorts", "Skirts", "Leggings", "Joggers", "Chinos",
            ],
            Category::Dresses => &[
                "Casual", "Formal", "Maxi", "Mini", "Midi", "Cocktail", "Sundress",
            ],
            Category::Outerwear => &[
                "Jackets", "Coats", "Blazers", "Cardigans", "Vests", "Parkas", "Raincoats",
            ],
            Category::Shoes => &[
                "Sneakers", "Boots", "Heels", "Sandals", "Loafers", "Flats", "Oxford", "Athletic",
            ],
            Category::Accessories => &[
                "Bags", "Hats", "Scarves", "Belts", "Jewelry", "Watches", "Sunglasses", "Ties",
            ],
            Category::Activewear => &[
                "Sports Bras", "Leggings", "Shorts", "Jerseys", "Track Pants", "Swimwear",
            ],
            Category::Formal => &[
                "Suits", "Dress Shirts", "Ties", "Gowns", "Tuxedos", "Dress Pants",
            ],
            Category::Other => &["Loungewear", "Sleepwear", "Underwear", "Socks", "Other"],
        }
    }
}

impl WarmthLevel {
    /// Temperature band in °C as `(min, max)`; `None` means unbounded
    pub fn temperature_range(&self) -> (Option<f64>, Option<f64>) {
        match self {
            WarmthLevel::Ultralight => (Some(25.0), None),
            WarmthLevel::Light => (Some(18.0), Some(25.0)),
            WarmthLevel::Medium => (Some(10.0), Some(18.0)),
            WarmthLevel::Heavy => (Some(0.0), Some(10.0)),
            WarmthLevel::VeryHeavy => (None, Some(0.0)),
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            WarmthLevel::Ultralight => "Very hot weather, maximum breathability",
            WarmthLevel::Light => "Warm weather, light coverage",
            WarmthLevel::Medium => "Mild weather, moderate insulation",
            WarmthLevel::Heavy => "Cold weather, good insulation",
            WarmthLevel::VeryHeavy => "Very cold weather, maximum warmth",
        }
    }

    /// The level to dress for at the given temperature.
    ///
    /// Band edges belong to the warmer-weather level, so 25°C is
    /// `Ultralight` and 0°C is `Heavy`.
    pub fn for_temperature(celsius: f64) -> WarmthLevel {
        if celsius >= 25.0 {
            WarmthLevel::Ultralight
        } else if celsius >= 18.0 {
            WarmthLevel::Light
        } else if celsius >= 10.0 {
            WarmthLevel::Medium
        } else if celsius >= 0.0 {
            WarmthLevel::Heavy
        } else {
            WarmthLevel::VeryHeavy
        }
    }
}

impl WeatherResistance {
    pub fn description(&self) -> &'static str {
        match self {
            WeatherResistance::None => "No water resistance",
            WeatherResistance::WaterResistant => "Light rain/splashes",
            WeatherResistance::Waterproof => "Heavy rain protection",
        }
    }
}

/// A named colour swatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorOption {
    pub value: &'static str,
    pub label: &'static str,
    /// `None` for the multi-colour swatch
    pub hex: Option<&'static str>,
}

const fn color(value: &'static str, label: &'static str, hex: &'static str) -> ColorOption {
    ColorOption {
        value,
        label,
        hex: Some(hex),
    }
}

pub const COLORS: &[ColorOption] = &[
    color("black", "Black", "#000000"),
    color("white", "White", "#FFFFFF"),
    color("gray", "Gray", "#808080"),
    color("navy", "Navy", "#000080"),
    color("blue", "Blue", "#0000FF"),
    color("light_blue", "Light Blue", "#ADD8E6"),
    color("red", "Red", "#FF0000"),
    color("burgundy", "Burgundy", "#800020"),
    color("pink", "Pink", "#FFC0CB"),
    color("orange", "Orange", "#FFA500"),
    color("yellow", "Yellow", "#FFFF00"),
    color("green", "Green", "#008000"),
    color("olive", "Olive", "#808000"),
    color("brown", "Brown", "#8B4513"),
    color("beige", "Beige", "#F5F5DC"),
    color("cream", "Cream", "#FFFDD0"),
    color("purple", "Purple", "#800080"),
    color("lavender", "Lavender", "#E6E6FA"),
    color("teal", "Teal", "#008080"),
    color("coral", "Coral", "#FF7F50"),
    color("gold", "Gold", "#FFD700"),
    color("silver", "Silver", "#C0C0C0"),
    ColorOption {
        value: "multi",
        label: "Multi-color",
        hex: None,
    },
];

pub const PATTERNS: &[&str] = &[
    "Solid",
    "Striped",
    "Plaid",
    "Floral",
    "Polka Dot",
    "Checkered",
    "Animal Print",
    "Geometric",
    "Abstract",
    "Camouflage",
    "Tie-Dye",
    "Other",
];

pub const MATERIALS: &[&str] = &[
    "Cotton", "Polyester", "Wool", "Silk", "Linen", "Denim", "Leather", "Suede", "Cashmere",
    "Velvet", "Nylon", "Spandex", "Rayon", "Fleece", "Other",
];

pub const STYLE_TAGS: &[&str] = &[
    "Casual",
    "Formal",
    "Business Casual",
    "Sporty",
    "Streetwear",
    "Bohemian",
    "Vintage",
    "Minimalist",
    "Preppy",
    "Elegant",
    "Edgy",
    "Romantic",
    "Classic",
    "Trendy",
];

pub const OCCASIONS: &[&str] = &[
    "Everyday",
    "Work",
    "Formal Event",
    "Party",
    "Date Night",
    "Workout",
    "Beach",
    "Travel",
    "Wedding",
    "Interview",
    "Casual Outing",
    "Business Meeting",
];

/// Look up a colour swatch by its stored value
pub fn color_info(value: &str) -> Option<&'static ColorOption> {
    COLORS.iter().find(|c| c.value == value)
}
