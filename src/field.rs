//! Field edits: the only way a [`Design`] changes.
//!
//! An edit is a [`DesignEdit`], a field paired with its new value. Applying
//! it with [`set_field`] produces a new design; the input is never touched.
//! Two edits carry cross-field rules:
//!
//! - Choosing a standard currency clears the custom symbol and resets its
//!   position, so stale custom state never leaks into a standard render.
//! - Choosing a fixed size preset overwrites width and height.
//!
//! # Example
//!
//! ```
//! use hellscore_renderer::{set_field, Design, DesignEdit, SizePreset};
//!
//! let design = Design::default();
//! let square = set_field(&design, DesignEdit::SizePreset(SizePreset::Square));
//! assert_eq!((square.width, square.height), (Some(800), Some(800)));
//! ```

use std::fmt;
use std::str::FromStr;

use crate::currency::is_custom;
use crate::design::{Design, FontStyle, OptionKey, SizePreset, SymbolPosition, Theme};
use crate::error::{Error, Result};

// ============================================================================
// DesignField
// ============================================================================

/// Names one field of a [`Design`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DesignField {
    Goal,
    Current,
    Title,
    Subtitle,
    CustomMessage,
    Currency,
    CustomSymbol,
    CurrencySymbolPosition,
    Theme,
    FontStyle,
    ShowPercentage,
    ShowFlame,
    ScaleX,
    ScaleY,
    Rotation,
    TranslateY,
    PreviewScale,
    SizePreset,
    Width,
    Height,
}

/// Fields reset together by the transform group's reset control.
pub const TRANSFORM_FIELDS: &[DesignField] = &[
    DesignField::ScaleX,
    DesignField::ScaleY,
    DesignField::Rotation,
    DesignField::TranslateY,
];

/// Fields reset together by the export group's reset control.
pub const EXPORT_FIELDS: &[DesignField] = &[DesignField::PreviewScale];

/// Declared bounds of a slider-backed field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl FieldRange {
    const fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    /// Clamps `value` into `[min, max]`.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

impl DesignField {
    /// Every field, in declaration order.
    pub const ALL: &'static [DesignField] = &[
        Self::Goal,
        Self::Current,
        Self::Title,
        Self::Subtitle,
        Self::CustomMessage,
        Self::Currency,
        Self::CustomSymbol,
        Self::CurrencySymbolPosition,
        Self::Theme,
        Self::FontStyle,
        Self::ShowPercentage,
        Self::ShowFlame,
        Self::ScaleX,
        Self::ScaleY,
        Self::Rotation,
        Self::TranslateY,
        Self::PreviewScale,
        Self::SizePreset,
        Self::Width,
        Self::Height,
    ];

    /// The camelCase name used in query strings and JSON.
    pub fn name(self) -> &'static str {
        match self {
            Self::Goal => "goal",
            Self::Current => "current",
            Self::Title => "title",
            Self::Subtitle => "subtitle",
            Self::CustomMessage => "customMessage",
            Self::Currency => "currency",
            Self::CustomSymbol => "customSymbol",
            Self::CurrencySymbolPosition => "currencySymbolPosition",
            Self::Theme => "theme",
            Self::FontStyle => "fontStyle",
            Self::ShowPercentage => "showPercentage",
            Self::ShowFlame => "showFlame",
            Self::ScaleX => "scaleX",
            Self::ScaleY => "scaleY",
            Self::Rotation => "rotation",
            Self::TranslateY => "translateY",
            Self::PreviewScale => "previewScale",
            Self::SizePreset => "sizePreset",
            Self::Width => "width",
            Self::Height => "height",
        }
    }

    /// The valid range of a slider field, or `None` for unbounded fields.
    pub fn range(self) -> Option<FieldRange> {
        match self {
            Self::ScaleX | Self::ScaleY => Some(FieldRange::new(0.05, 3.0, 0.01)),
            Self::Rotation => Some(FieldRange::new(-180.0, 180.0, 1.0)),
            Self::TranslateY => Some(FieldRange::new(-100.0, 100.0, 1.0)),
            Self::PreviewScale => Some(FieldRange::new(0.01, 3.0, 0.01)),
            _ => None,
        }
    }

    /// Reads this field's current value out of `design` as an edit.
    pub fn value_of(self, design: &Design) -> DesignEdit {
        match self {
            Self::Goal => DesignEdit::Goal(design.goal),
            Self::Current => DesignEdit::Current(design.current),
            Self::Title => DesignEdit::Title(design.title.clone()),
            Self::Subtitle => DesignEdit::Subtitle(design.subtitle.clone()),
            Self::CustomMessage => DesignEdit::CustomMessage(design.custom_message.clone()),
            Self::Currency => DesignEdit::Currency(design.currency.clone()),
            Self::CustomSymbol => DesignEdit::CustomSymbol(design.custom_symbol.clone()),
            Self::CurrencySymbolPosition => {
                DesignEdit::CurrencySymbolPosition(design.currency_symbol_position)
            }
            Self::Theme => DesignEdit::Theme(design.theme),
            Self::FontStyle => DesignEdit::FontStyle(design.font_style),
            Self::ShowPercentage => DesignEdit::ShowPercentage(design.show_percentage),
            Self::ShowFlame => DesignEdit::ShowFlame(design.show_flame),
            Self::ScaleX => DesignEdit::ScaleX(design.scale_x),
            Self::ScaleY => DesignEdit::ScaleY(design.scale_y),
            Self::Rotation => DesignEdit::Rotation(design.rotation),
            Self::TranslateY => DesignEdit::TranslateY(design.translate_y),
            Self::PreviewScale => DesignEdit::PreviewScale(design.preview_scale),
            Self::SizePreset => DesignEdit::SizePreset(design.size_preset),
            Self::Width => DesignEdit::Width(design.width),
            Self::Height => DesignEdit::Height(design.height),
        }
    }

    /// The edit that restores this field to its default value.
    pub fn default_edit(self) -> DesignEdit {
        self.value_of(&Design::default())
    }
}

impl fmt::Display for DesignField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DesignField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.name() == s)
            .ok_or_else(|| Error::UnknownField(s.to_string()))
    }
}

// ============================================================================
// DesignEdit
// ============================================================================

/// A single field edit: which field, and its new value.
#[derive(Debug, Clone, PartialEq)]
pub enum DesignEdit {
    Goal(f64),
    Current(f64),
    Title(String),
    Subtitle(String),
    CustomMessage(String),
    Currency(String),
    CustomSymbol(String),
    CurrencySymbolPosition(SymbolPosition),
    Theme(Theme),
    FontStyle(FontStyle),
    ShowPercentage(bool),
    ShowFlame(bool),
    ScaleX(f64),
    ScaleY(f64),
    Rotation(f64),
    TranslateY(f64),
    PreviewScale(f64),
    SizePreset(SizePreset),
    Width(Option<u32>),
    Height(Option<u32>),
}

impl DesignEdit {
    /// The field this edit targets.
    pub fn field(&self) -> DesignField {
        match self {
            Self::Goal(_) => DesignField::Goal,
            Self::Current(_) => DesignField::Current,
            Self::Title(_) => DesignField::Title,
            Self::Subtitle(_) => DesignField::Subtitle,
            Self::CustomMessage(_) => DesignField::CustomMessage,
            Self::Currency(_) => DesignField::Currency,
            Self::CustomSymbol(_) => DesignField::CustomSymbol,
            Self::CurrencySymbolPosition(_) => DesignField::CurrencySymbolPosition,
            Self::Theme(_) => DesignField::Theme,
            Self::FontStyle(_) => DesignField::FontStyle,
            Self::ShowPercentage(_) => DesignField::ShowPercentage,
            Self::ShowFlame(_) => DesignField::ShowFlame,
            Self::ScaleX(_) => DesignField::ScaleX,
            Self::ScaleY(_) => DesignField::ScaleY,
            Self::Rotation(_) => DesignField::Rotation,
            Self::TranslateY(_) => DesignField::TranslateY,
            Self::PreviewScale(_) => DesignField::PreviewScale,
            Self::SizePreset(_) => DesignField::SizePreset,
            Self::Width(_) => DesignField::Width,
            Self::Height(_) => DesignField::Height,
        }
    }
}

// ============================================================================
// Mutation
// ============================================================================

/// Returns a copy of `design` with `edit` applied.
///
/// Values are taken as given: range clamping belongs to the calling control
/// (see [`parse_edit`] and [`FieldRange::clamp`]).
pub fn set_field(design: &Design, edit: DesignEdit) -> Design {
    let mut next = design.clone();
    match edit {
        DesignEdit::Goal(v) => next.goal = v,
        DesignEdit::Current(v) => next.current = v,
        DesignEdit::Title(v) => next.title = v,
        DesignEdit::Subtitle(v) => next.subtitle = v,
        DesignEdit::CustomMessage(v) => next.custom_message = v,
        DesignEdit::Currency(v) => {
            if !is_custom(&v) {
                next.custom_symbol = String::new();
                next.currency_symbol_position = SymbolPosition::Before;
            }
            next.currency = v;
        }
        DesignEdit::CustomSymbol(v) => next.custom_symbol = v,
        DesignEdit::CurrencySymbolPosition(v) => next.currency_symbol_position = v,
        DesignEdit::Theme(v) => next.theme = v,
        DesignEdit::FontStyle(v) => next.font_style = v,
        DesignEdit::ShowPercentage(v) => next.show_percentage = v,
        DesignEdit::ShowFlame(v) => next.show_flame = v,
        DesignEdit::ScaleX(v) => next.scale_x = v,
        DesignEdit::ScaleY(v) => next.scale_y = v,
        DesignEdit::Rotation(v) => next.rotation = v,
        DesignEdit::TranslateY(v) => next.translate_y = v,
        DesignEdit::PreviewScale(v) => next.preview_scale = v,
        DesignEdit::SizePreset(v) => {
            if let Some((w, h)) = v.dimensions() {
                next.width = Some(w);
                next.height = Some(h);
            }
            next.size_preset = v;
        }
        DesignEdit::Width(v) => next.width = v,
        DesignEdit::Height(v) => next.height = v,
    }
    next
}

/// Restores every field in `fields` to its default, as one replacement.
pub fn reset_fields(design: &Design, fields: &[DesignField]) -> Design {
    fields
        .iter()
        .fold(design.clone(), |acc, f| set_field(&acc, f.default_edit()))
}

/// Returns true if any of `fields` differs from its default, which is when a
/// reset control for that group should be offered.
pub fn differs_from_default(design: &Design, fields: &[DesignField]) -> bool {
    fields
        .iter()
        .any(|f| f.value_of(design) != f.default_edit())
}

// ============================================================================
// Control input parsing
// ============================================================================

/// Turns raw control text into an edit for `field`.
///
/// Recovery rules for bad input:
/// - `goal` / `current`: unparseable becomes `0`.
/// - slider fields: clamped to [`DesignField::range`]; unparseable becomes
///   the default.
/// - `width` / `height`: truncated to an integer; unparseable or negative
///   becomes `0`.
/// - enum fields: unknown keys become the first option.
///
/// Only booleans that are not `true/false/1/0/yes/no/on/off` are rejected.
pub fn parse_edit(field: DesignField, raw: &str) -> Result<DesignEdit> {
    let text = raw.trim();
    let edit = match field {
        DesignField::Goal => DesignEdit::Goal(parse_amount(text)),
        DesignField::Current => DesignEdit::Current(parse_amount(text)),
        DesignField::Title => DesignEdit::Title(raw.to_string()),
        DesignField::Subtitle => DesignEdit::Subtitle(raw.to_string()),
        DesignField::CustomMessage => DesignEdit::CustomMessage(raw.to_string()),
        DesignField::Currency => DesignEdit::Currency(text.to_string()),
        DesignField::CustomSymbol => DesignEdit::CustomSymbol(raw.to_string()),
        DesignField::CurrencySymbolPosition => {
            DesignEdit::CurrencySymbolPosition(SymbolPosition::parse_lenient(text))
        }
        DesignField::Theme => DesignEdit::Theme(Theme::parse_lenient(text)),
        DesignField::FontStyle => DesignEdit::FontStyle(FontStyle::parse_lenient(text)),
        DesignField::ShowPercentage => DesignEdit::ShowPercentage(parse_flag(field, text)?),
        DesignField::ShowFlame => DesignEdit::ShowFlame(parse_flag(field, text)?),
        DesignField::ScaleX
        | DesignField::ScaleY
        | DesignField::Rotation
        | DesignField::TranslateY
        | DesignField::PreviewScale => {
            let value = match (parse_finite(text), field.range()) {
                (Some(v), Some(range)) => range.clamp(v),
                (Some(v), None) => v,
                (None, _) => return Ok(field.default_edit()),
            };
            slider_edit(field, value)
        }
        DesignField::SizePreset => DesignEdit::SizePreset(SizePreset::parse_lenient(text)),
        DesignField::Width => DesignEdit::Width(Some(parse_dimension(text))),
        DesignField::Height => DesignEdit::Height(Some(parse_dimension(text))),
    };
    Ok(edit)
}

fn slider_edit(field: DesignField, value: f64) -> DesignEdit {
    match field {
        DesignField::ScaleX => DesignEdit::ScaleX(value),
        DesignField::ScaleY => DesignEdit::ScaleY(value),
        DesignField::Rotation => DesignEdit::Rotation(value),
        DesignField::TranslateY => DesignEdit::TranslateY(value),
        _ => DesignEdit::PreviewScale(value),
    }
}

pub(crate) fn parse_finite(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a monetary amount, substituting `0` for anything unparseable.
pub fn parse_amount(text: &str) -> f64 {
    parse_finite(text).unwrap_or(0.0)
}

/// Parses a pixel dimension, substituting `0` for unparseable or negative input.
pub fn parse_dimension(text: &str) -> u32 {
    parse_finite(text)
        .map(|v| v.trunc().clamp(0.0, u32::MAX as f64) as u32)
        .unwrap_or(0)
}

pub(crate) fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_flag(field: DesignField, text: &str) -> Result<bool> {
    parse_bool(text).ok_or_else(|| Error::InvalidValue {
        field: field.name(),
        value: text.to_string(),
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn custom_design() -> Design {
        Design {
            currency: "CUSTOM".to_string(),
            custom_symbol: "🔥".to_string(),
            currency_symbol_position: SymbolPosition::After,
            ..Design::default()
        }
    }

    #[test]
    fn set_field_changes_only_target() {
        let d = Design::default();
        let next = set_field(&d, DesignEdit::Title("Tour".into()));
        assert_eq!(next.title, "Tour");
        assert_eq!(Design { title: d.title.clone(), ..next.clone() }, d);
        // input untouched
        assert_eq!(d.title, "HELLSCORE FUNDRAISER");
    }

    #[test]
    fn standard_currency_resets_custom_state() {
        let next = set_field(&custom_design(), DesignEdit::Currency("USD".into()));
        assert_eq!(next.currency, "USD");
        assert_eq!(next.custom_symbol, "");
        assert_eq!(next.currency_symbol_position, SymbolPosition::Before);
    }

    #[test]
    fn custom_currency_keeps_custom_state() {
        let d = Design {
            custom_symbol: "⚡".into(),
            currency_symbol_position: SymbolPosition::After,
            ..Design::default()
        };
        let next = set_field(&d, DesignEdit::Currency("CUSTOM".into()));
        assert_eq!(next.custom_symbol, "⚡");
        assert_eq!(next.currency_symbol_position, SymbolPosition::After);
    }

    #[test]
    fn size_preset_overwrites_dimensions() {
        let d = Design {
            size_preset: SizePreset::Custom,
            width: Some(1234),
            height: Some(99),
            ..Design::default()
        };
        let story = set_field(&d, DesignEdit::SizePreset(SizePreset::Story));
        assert_eq!((story.width, story.height), (Some(450), Some(800)));

        let custom = set_field(&story, DesignEdit::SizePreset(SizePreset::Custom));
        assert_eq!(custom.size_preset, SizePreset::Custom);
        assert_eq!((custom.width, custom.height), (Some(450), Some(800)));
    }

    #[test]
    fn out_of_range_values_are_accepted() {
        let d = set_field(&Design::default(), DesignEdit::ScaleX(42.0));
        assert_eq!(d.scale_x, 42.0);
        let d = set_field(&d, DesignEdit::Rotation(-720.0));
        assert_eq!(d.rotation, -720.0);
    }

    #[test]
    fn set_field_is_idempotent() {
        let edits = [
            DesignEdit::Currency("USD".into()),
            DesignEdit::SizePreset(SizePreset::Twitter),
            DesignEdit::Current(12000.0),
            DesignEdit::ShowFlame(false),
        ];
        for edit in edits {
            let once = set_field(&custom_design(), edit.clone());
            let twice = set_field(&once, edit);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn reset_group_restores_defaults() {
        let mut d = Design::default();
        for edit in [
            DesignEdit::ScaleX(2.0),
            DesignEdit::Rotation(45.0),
            DesignEdit::TranslateY(-20.0),
            DesignEdit::Goal(5.0),
        ] {
            d = set_field(&d, edit);
        }
        assert!(differs_from_default(&d, TRANSFORM_FIELDS));
        let reset = reset_fields(&d, TRANSFORM_FIELDS);
        assert!(!differs_from_default(&reset, TRANSFORM_FIELDS));
        assert_eq!(reset.goal, 5.0);
    }

    #[test]
    fn field_names_round_trip() {
        for field in DesignField::ALL {
            assert_eq!(field.name().parse::<DesignField>().unwrap(), *field);
            assert_eq!(field.value_of(&Design::default()).field(), *field);
        }
        assert!(matches!(
            "colour".parse::<DesignField>(),
            Err(Error::UnknownField(_))
        ));
    }

    #[test]
    fn parse_amount_falls_back_to_zero() {
        assert_eq!(parse_edit(DesignField::Goal, "2500").unwrap(), DesignEdit::Goal(2500.0));
        assert_eq!(parse_edit(DesignField::Current, "abc").unwrap(), DesignEdit::Current(0.0));
        assert_eq!(parse_edit(DesignField::Current, "-40").unwrap(), DesignEdit::Current(-40.0));
        assert_eq!(parse_amount("NaN"), 0.0);
    }

    #[test]
    fn parse_slider_clamps() {
        assert_eq!(parse_edit(DesignField::ScaleX, "9").unwrap(), DesignEdit::ScaleX(3.0));
        assert_eq!(parse_edit(DesignField::ScaleY, "0").unwrap(), DesignEdit::ScaleY(0.05));
        assert_eq!(
            parse_edit(DesignField::Rotation, "-300").unwrap(),
            DesignEdit::Rotation(-180.0)
        );
        assert_eq!(
            parse_edit(DesignField::PreviewScale, "oops").unwrap(),
            DesignEdit::PreviewScale(1.0)
        );
    }

    #[test]
    fn parse_dimensions_truncate() {
        assert_eq!(parse_edit(DesignField::Width, "640.9").unwrap(), DesignEdit::Width(Some(640)));
        assert_eq!(parse_edit(DesignField::Height, "-5").unwrap(), DesignEdit::Height(Some(0)));
        assert_eq!(parse_dimension("wide"), 0);
    }

    #[test]
    fn parse_flags_and_enums() {
        assert_eq!(
            parse_edit(DesignField::ShowFlame, "off").unwrap(),
            DesignEdit::ShowFlame(false)
        );
        assert!(parse_edit(DesignField::ShowPercentage, "maybe").is_err());
        assert_eq!(
            parse_edit(DesignField::Theme, "lava").unwrap(),
            DesignEdit::Theme(Theme::Hellfire)
        );
        assert_eq!(
            parse_edit(DesignField::CurrencySymbolPosition, "after").unwrap(),
            DesignEdit::CurrencySymbolPosition(SymbolPosition::After)
        );
    }

    #[test]
    fn ranges_declared_for_sliders_only() {
        let scale = DesignField::ScaleX.range().unwrap();
        assert!(scale.contains(1.0));
        assert!(!scale.contains(0.0));
        assert!(DesignField::Goal.range().is_none());
        assert_eq!(DesignField::TranslateY.range().unwrap().clamp(500.0), 100.0);
    }
}
