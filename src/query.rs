//! Query-string persistence of a [`Design`].
//!
//! Each field maps to one parameter under its camelCase name. Numbers are
//! written as plain decimals, booleans as `1`/`0`, strings and option keys
//! verbatim. Decoding is total: a missing or unparseable parameter takes the
//! field's default.
//!
//! # Example
//!
//! ```
//! use hellscore_renderer::{decode_from_query, encode_to_query, Design};
//!
//! let design = decode_from_query("goal=500&current=125&theme=molten");
//! assert_eq!(design.goal, 500.0);
//!
//! let query = encode_to_query(&design);
//! assert_eq!(decode_from_query(&query), design);
//! ```

use log::warn;
use url::form_urlencoded;

use crate::design::{Design, FontStyle, OptionKey, SizePreset, SymbolPosition, Theme};
use crate::field::{parse_bool, parse_finite, DesignField};

/// Builds a design from a query string, falling back to defaults per field.
///
/// A leading `?` is ignored. When a parameter appears more than once the
/// last occurrence wins. Unknown parameters are ignored. If the decoded
/// preset has a fixed size, width and height follow it; under the custom
/// preset a missing `width` or `height` stays unset.
pub fn decode_from_query(query: &str) -> Design {
    merge_query(&Design::default(), query)
}

/// Like [`decode_from_query`], but fields missing from `query` (or invalid
/// in it) keep their values from `base`.
///
/// A fixed preset's size is not carried into a custom design: when `query`
/// switches `base` to the custom preset, only the dimensions it gives are set.
pub fn merge_query(base: &Design, query: &str) -> Design {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut design = base.clone();
    let (mut width_given, mut height_given) = (false, false);

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        let Ok(field) = key.parse::<DesignField>() else {
            continue;
        };
        if apply_param(&mut design, field, &value) {
            match field {
                DesignField::Width => width_given = true,
                DesignField::Height => height_given = true,
                _ => {}
            }
        } else {
            warn!("query parameter {field}={value:?} is not valid, keeping {field}");
            restore(&mut design, base, field);
        }
    }

    if design.size_preset == SizePreset::Custom && base.size_preset != SizePreset::Custom {
        if !width_given {
            design.width = None;
        }
        if !height_given {
            design.height = None;
        }
    }
    design.normalize_size();
    design
}

/// Writes every field of `design` as a query string (without a leading `?`).
///
/// `width` and `height` are omitted when unset.
pub fn encode_to_query(design: &Design) -> String {
    let mut out = form_urlencoded::Serializer::new(String::new());
    for field in DesignField::ALL {
        if let Some(value) = encode_param(design, *field) {
            out.append_pair(field.name(), &value);
        }
    }
    out.finish()
}

fn encode_param(design: &Design, field: DesignField) -> Option<String> {
    let flag = |b: bool| if b { "1" } else { "0" }.to_string();
    let value = match field {
        DesignField::Goal => design.goal.to_string(),
        DesignField::Current => design.current.to_string(),
        DesignField::Title => design.title.clone(),
        DesignField::Subtitle => design.subtitle.clone(),
        DesignField::CustomMessage => design.custom_message.clone(),
        DesignField::Currency => design.currency.clone(),
        DesignField::CustomSymbol => design.custom_symbol.clone(),
        DesignField::CurrencySymbolPosition => design.currency_symbol_position.key().to_string(),
        DesignField::Theme => design.theme.key().to_string(),
        DesignField::FontStyle => design.font_style.key().to_string(),
        DesignField::ShowPercentage => flag(design.show_percentage),
        DesignField::ShowFlame => flag(design.show_flame),
        DesignField::ScaleX => design.scale_x.to_string(),
        DesignField::ScaleY => design.scale_y.to_string(),
        DesignField::Rotation => design.rotation.to_string(),
        DesignField::TranslateY => design.translate_y.to_string(),
        DesignField::PreviewScale => design.preview_scale.to_string(),
        DesignField::SizePreset => design.size_preset.key().to_string(),
        DesignField::Width => design.width?.to_string(),
        DesignField::Height => design.height?.to_string(),
    };
    Some(value)
}

/// Stores one decoded parameter. Returns false if the value did not parse.
fn apply_param(design: &mut Design, field: DesignField, value: &str) -> bool {
    fn number(value: &str, slot: &mut f64) -> bool {
        parse_finite(value).map(|v| *slot = v).is_some()
    }
    fn flag(value: &str, slot: &mut bool) -> bool {
        parse_bool(value).map(|v| *slot = v).is_some()
    }
    fn option<T: OptionKey>(value: &str, slot: &mut T) -> bool {
        T::from_key(value).map(|v| *slot = v).is_some()
    }
    fn dimension(value: &str, slot: &mut Option<u32>) -> bool {
        parse_finite(value)
            .filter(|v| *v >= 0.0 && *v <= u32::MAX as f64)
            .map(|v| *slot = Some(v.round() as u32))
            .is_some()
    }

    match field {
        DesignField::Goal => number(value, &mut design.goal),
        DesignField::Current => number(value, &mut design.current),
        DesignField::Title => {
            design.title = value.to_string();
            true
        }
        DesignField::Subtitle => {
            design.subtitle = value.to_string();
            true
        }
        DesignField::CustomMessage => {
            design.custom_message = value.to_string();
            true
        }
        DesignField::Currency => {
            design.currency = value.to_string();
            true
        }
        DesignField::CustomSymbol => {
            design.custom_symbol = value.to_string();
            true
        }
        DesignField::CurrencySymbolPosition => {
            option::<SymbolPosition>(value, &mut design.currency_symbol_position)
        }
        DesignField::Theme => option::<Theme>(value, &mut design.theme),
        DesignField::FontStyle => option::<FontStyle>(value, &mut design.font_style),
        DesignField::ShowPercentage => flag(value, &mut design.show_percentage),
        DesignField::ShowFlame => flag(value, &mut design.show_flame),
        DesignField::ScaleX => number(value, &mut design.scale_x),
        DesignField::ScaleY => number(value, &mut design.scale_y),
        DesignField::Rotation => number(value, &mut design.rotation),
        DesignField::TranslateY => number(value, &mut design.translate_y),
        DesignField::PreviewScale => number(value, &mut design.preview_scale),
        DesignField::SizePreset => option::<SizePreset>(value, &mut design.size_preset),
        DesignField::Width => dimension(value, &mut design.width),
        DesignField::Height => dimension(value, &mut design.height),
    }
}

/// Puts a field back to its value in `base` without any cross-field rules.
fn restore(design: &mut Design, base: &Design, field: DesignField) {
    match field {
        DesignField::Goal => design.goal = base.goal,
        DesignField::Current => design.current = base.current,
        DesignField::CurrencySymbolPosition => {
            design.currency_symbol_position = base.currency_symbol_position
        }
        DesignField::Theme => design.theme = base.theme,
        DesignField::FontStyle => design.font_style = base.font_style,
        DesignField::ShowPercentage => design.show_percentage = base.show_percentage,
        DesignField::ShowFlame => design.show_flame = base.show_flame,
        DesignField::ScaleX => design.scale_x = base.scale_x,
        DesignField::ScaleY => design.scale_y = base.scale_y,
        DesignField::Rotation => design.rotation = base.rotation,
        DesignField::TranslateY => design.translate_y = base.translate_y,
        DesignField::PreviewScale => design.preview_scale = base.preview_scale,
        DesignField::SizePreset => design.size_preset = base.size_preset,
        DesignField::Width => design.width = base.width,
        DesignField::Height => design.height = base.height,
        // text fields always parse
        DesignField::Title
        | DesignField::Subtitle
        | DesignField::CustomMessage
        | DesignField::Currency
        | DesignField::CustomSymbol => {}
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_is_default() {
        assert_eq!(decode_from_query(""), Design::default());
        assert_eq!(decode_from_query("?"), Design::default());
    }

    #[test]
    fn decodes_fields() {
        let d = decode_from_query(
            "?goal=2000&current=150.5&title=Summer%20Tour&currency=CUSTOM&customSymbol=%E2%9A%A1\
             &currencySymbolPosition=after&theme=crimson&fontStyle=metal&showFlame=0\
             &rotation=-45&sizePreset=square",
        );
        assert_eq!(d.goal, 2000.0);
        assert_eq!(d.current, 150.5);
        assert_eq!(d.title, "Summer Tour");
        assert_eq!(d.currency, "CUSTOM");
        assert_eq!(d.custom_symbol, "⚡");
        assert_eq!(d.currency_symbol_position, SymbolPosition::After);
        assert_eq!(d.theme, Theme::Crimson);
        assert_eq!(d.font_style, FontStyle::Metal);
        assert!(!d.show_flame);
        assert!(d.show_percentage);
        assert_eq!(d.rotation, -45.0);
        assert_eq!((d.width, d.height), (Some(800), Some(800)));
    }

    #[test]
    fn bad_values_fall_back_to_defaults() {
        let d = decode_from_query("goal=lots&theme=lava&showPercentage=maybe&scaleX=NaN&width=-3");
        let defaults = Design::default();
        assert_eq!(d.goal, defaults.goal);
        assert_eq!(d.theme, defaults.theme);
        assert_eq!(d.show_percentage, defaults.show_percentage);
        assert_eq!(d.scale_x, defaults.scale_x);
        assert_eq!(d.width, defaults.width);
    }

    #[test]
    fn fixed_preset_overrides_stored_size() {
        let d = decode_from_query("sizePreset=post&width=10&height=10");
        assert_eq!((d.width, d.height), (Some(800), Some(450)));

        let custom = decode_from_query("sizePreset=custom&width=1080&height=1350");
        assert_eq!((custom.width, custom.height), (Some(1080), Some(1350)));
    }

    #[test]
    fn repeated_invalid_parameter_falls_back() {
        let d = decode_from_query("goal=5&goal=oops");
        assert_eq!(d.goal, Design::default().goal);
    }

    #[test]
    fn merge_keeps_base_fields() {
        let base = Design {
            goal: 777.0,
            theme: Theme::Shadow,
            ..Design::default()
        };
        let d = merge_query(&base, "current=7&theme=nope");
        assert_eq!(d.goal, 777.0);
        assert_eq!(d.current, 7.0);
        assert_eq!(d.theme, Theme::Shadow);
    }

    #[test]
    fn unknown_parameters_are_ignored() {
        let d = decode_from_query("utm_source=mail&goal=3");
        assert_eq!(d.goal, 3.0);
    }

    #[test]
    fn encode_writes_every_field() {
        let q = encode_to_query(&Design::default());
        for field in DesignField::ALL {
            assert!(q.contains(&format!("{}=", field.name())), "missing {field}");
        }
        assert!(q.contains("showFlame=1"));
        assert!(q.contains("title=HELLSCORE+FUNDRAISER"));
    }

    #[test]
    fn unset_custom_size_round_trips() {
        let d = Design {
            size_preset: SizePreset::Custom,
            width: None,
            height: None,
            ..Design::default()
        };
        let q = encode_to_query(&d);
        assert!(!q.contains("width="));
        assert!(!q.contains("height="));
        assert_eq!(decode_from_query(&q), d);

        let half = Design {
            width: Some(1080),
            ..d.clone()
        };
        assert_eq!(decode_from_query(&encode_to_query(&half)), half);
    }

    #[test]
    fn custom_preset_without_size_uses_fallback() {
        let d = decode_from_query("sizePreset=custom");
        assert_eq!((d.width, d.height), (None, None));
        assert_eq!(d.dimensions(), (800, 1000));
    }

    #[test]
    fn merge_into_custom_base_keeps_its_size() {
        let base = Design {
            size_preset: SizePreset::Custom,
            width: Some(1200),
            height: Some(900),
            ..Design::default()
        };
        let d = merge_query(&base, "height=600");
        assert_eq!((d.width, d.height), (Some(1200), Some(600)));
    }

    #[test]
    fn round_trip_preserves_design() {
        let d = Design {
            goal: 12345.5,
            current: -20.0,
            title: "a&b=c ?".into(),
            custom_message: String::new(),
            currency: "CUSTOM".into(),
            custom_symbol: "🔥".into(),
            currency_symbol_position: SymbolPosition::After,
            theme: Theme::Inferno,
            font_style: FontStyle::Elegant,
            show_percentage: false,
            scale_x: 0.35,
            rotation: 179.0,
            translate_y: -12.5,
            preview_scale: 0.5,
            size_preset: SizePreset::Custom,
            width: Some(1000),
            height: Some(1500),
            ..Design::default()
        };
        assert_eq!(decode_from_query(&encode_to_query(&d)), d);
    }
}
