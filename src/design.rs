//! The design model: one record describing a thermometer graphic.
//!
//! A [`Design`] is created once from defaults (optionally merged with a
//! query string or JSON document), replaced wholesale on every edit, and
//! rendered by [`build_preview`](crate::build_preview).
//!
//! # JSON Format
//!
//! Designs serialize to camelCase JSON. Every field is optional on input and
//! falls back to [`Design::default`]:
//!
//! ```json
//! {
//!   "goal": 10000.0,
//!   "current": 3500.0,
//!   "currency": "ILS",
//!   "theme": "hellfire",
//!   "sizePreset": "story",
//!   "width": 450,
//!   "height": 800
//! }
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ============================================================================
// Enumerations
// ============================================================================

/// Color theme of the card and thermometer fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Hellfire,
    Molten,
    Shadow,
    Crimson,
    Inferno,
}

/// Typeface family used for all text on the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Gothic,
    Modern,
    Metal,
    Elegant,
}

/// Named output canvas size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum SizePreset {
    #[default]
    Story,
    Square,
    Post,
    Twitter,
    Custom,
}

/// Where a custom currency symbol goes relative to the amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum SymbolPosition {
    #[default]
    Before,
    After,
}

/// Error returned when parsing an unknown option key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown option key: {0:?}")]
pub struct UnknownKey(pub String);

/// Shared key handling for the closed option enums.
///
/// `ALL` lists the variants in table order; the first entry is the fallback
/// for unrecognized keys.
pub trait OptionKey: Copy + Sized + 'static {
    const ALL: &'static [Self];

    /// The lowercase key used in query strings and JSON.
    fn key(self) -> &'static str;

    /// Parses a key, returning `None` if it is not recognized.
    fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.key().eq_ignore_ascii_case(key.trim()))
    }

    /// Parses a key, falling back to the first table entry.
    fn parse_lenient(key: &str) -> Self {
        Self::from_key(key).unwrap_or(Self::ALL[0])
    }
}

macro_rules! option_key {
    ($ty:ident, [$($variant:ident => $key:literal),+ $(,)?]) => {
        impl OptionKey for $ty {
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn key(self) -> &'static str {
                match self {
                    $(Self::$variant => $key),+
                }
            }
        }

        impl FromStr for $ty {
            type Err = UnknownKey;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$ty as OptionKey>::from_key(s).ok_or_else(|| UnknownKey(s.to_string()))
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.key())
            }
        }
    };
}

option_key!(Theme, [
    Hellfire => "hellfire",
    Molten => "molten",
    Shadow => "shadow",
    Crimson => "crimson",
    Inferno => "inferno",
]);

option_key!(FontStyle, [
    Gothic => "gothic",
    Modern => "modern",
    Metal => "metal",
    Elegant => "elegant",
]);

option_key!(SizePreset, [
    Story => "story",
    Square => "square",
    Post => "post",
    Twitter => "twitter",
    Custom => "custom",
]);

option_key!(SymbolPosition, [
    Before => "before",
    After => "after",
]);

impl SizePreset {
    /// The fixed `(width, height)` of this preset, or `None` for `Custom`.
    pub fn dimensions(self) -> Option<(u32, u32)> {
        match self {
            Self::Story => Some((450, 800)),
            Self::Square => Some((800, 800)),
            Self::Post => Some((800, 450)),
            Self::Twitter => Some((800, 400)),
            Self::Custom => None,
        }
    }
}

/// Canvas size used for a custom preset that has no stored dimensions.
pub const CUSTOM_FALLBACK_SIZE: (u32, u32) = (800, 1000);

// ============================================================================
// Option tables
// ============================================================================

/// A labelled choice for a select control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DesignOption<T> {
    pub value: T,
    pub label: &'static str,
    pub desc: &'static str,
}

pub const THEME_OPTIONS: &[DesignOption<Theme>] = &[
    DesignOption { value: Theme::Hellfire, label: "Hellfire", desc: "Classic red and orange flames" },
    DesignOption { value: Theme::Molten, label: "Molten", desc: "Yellow and orange lava flow" },
    DesignOption { value: Theme::Shadow, label: "Shadow", desc: "Dark purples and grays" },
    DesignOption { value: Theme::Crimson, label: "Crimson", desc: "Deep red blood theme" },
    DesignOption { value: Theme::Inferno, label: "Inferno", desc: "Intense orange and black" },
];

pub const FONT_OPTIONS: &[DesignOption<FontStyle>] = &[
    DesignOption { value: FontStyle::Gothic, label: "Gothic", desc: "Classic serif style" },
    DesignOption { value: FontStyle::Modern, label: "Modern", desc: "Clean sans-serif" },
    DesignOption { value: FontStyle::Metal, label: "Metal", desc: "Bold monospace" },
    DesignOption { value: FontStyle::Elegant, label: "Elegant", desc: "Light and refined" },
];

pub const SIZE_OPTIONS: &[DesignOption<SizePreset>] = &[
    DesignOption { value: SizePreset::Story, label: "Story (9:16)", desc: "450 × 800" },
    DesignOption { value: SizePreset::Square, label: "Square Media (1:1)", desc: "800 × 800" },
    DesignOption { value: SizePreset::Post, label: "Landscape (16:9)", desc: "800 × 450" },
    DesignOption { value: SizePreset::Twitter, label: "Twitter (2:1)", desc: "800 × 400" },
    DesignOption { value: SizePreset::Custom, label: "Custom Size", desc: "Any width and height" },
];

// ============================================================================
// Design
// ============================================================================

/// Full configuration of one thermometer graphic.
///
/// `current` may exceed or fall short of `goal`, and either may be zero or
/// negative; the model performs no validation. Range limits on the transform
/// fields are enforced by the controls (see [`DesignField::range`]).
///
/// [`DesignField::range`]: crate::DesignField::range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct Design {
    pub goal: f64,
    pub current: f64,
    pub title: String,
    pub subtitle: String,
    pub custom_message: String,

    /// ISO 4217 code, or `"CUSTOM"` for a user supplied symbol.
    pub currency: String,
    /// Only meaningful when `currency` is `"CUSTOM"`.
    pub custom_symbol: String,
    /// Only meaningful when `currency` is `"CUSTOM"`.
    pub currency_symbol_position: SymbolPosition,

    pub theme: Theme,
    pub font_style: FontStyle,
    pub show_percentage: bool,
    pub show_flame: bool,

    /// Horizontal scale of the thermometer track (0.05-3).
    pub scale_x: f64,
    /// Vertical scale of the thermometer track (0.05-3).
    pub scale_y: f64,
    /// Rotation of the thermometer track in degrees (-180-180).
    pub rotation: f64,
    /// Vertical offset of the track, in percent of its own height.
    pub translate_y: f64,

    /// Zoom of the editing viewport. Has no effect on exports.
    pub preview_scale: f64,

    pub size_preset: SizePreset,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl Default for Design {
    fn default() -> Self {
        let preset = SizePreset::default();
        let size = preset.dimensions();
        Self {
            goal: 10000.0,
            current: 3500.0,
            title: "HELLSCORE FUNDRAISER".to_string(),
            subtitle: "Support ...".to_string(),
            custom_message: "Help us ...".to_string(),
            currency: "ILS".to_string(),
            custom_symbol: String::new(),
            currency_symbol_position: SymbolPosition::Before,
            theme: Theme::Hellfire,
            font_style: FontStyle::Gothic,
            show_percentage: true,
            show_flame: true,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
            translate_y: 0.0,
            preview_scale: 1.0,
            size_preset: preset,
            width: size.map(|(w, _)| w),
            height: size.map(|(_, h)| h),
        }
    }
}

impl Design {
    /// Creates a design with every field at its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Effective canvas size in pixels.
    ///
    /// Stored dimensions win; otherwise the preset's size, otherwise
    /// [`CUSTOM_FALLBACK_SIZE`].
    pub fn dimensions(&self) -> (u32, u32) {
        let fallback = self.size_preset.dimensions().unwrap_or(CUSTOM_FALLBACK_SIZE);
        (
            self.width.unwrap_or(fallback.0),
            self.height.unwrap_or(fallback.1),
        )
    }

    /// Forces width/height to the preset's size when the preset is fixed.
    pub fn normalize_size(&mut self) {
        if let Some((w, h)) = self.size_preset.dimensions() {
            self.width = Some(w);
            self.height = Some(h);
        }
    }

    /// Serializes the design to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serializes the design to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserializes a design from JSON, filling missing fields from defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

// ============================================================================
// Tests
// ============================================================================
