//! Theme and font lookup tables.
//!
//! Both tables are exhaustive matches over closed enums, so adding a theme
//! without styling it does not compile.

use palette::{Srgb, Srgba};

use crate::design::{FontStyle, Theme};

/// An 8-bit sRGB color.
pub type Color = Srgb<u8>;

const fn rgb(hex: u32) -> Color {
    Srgb::new((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

fn rgba(hex: u32, alpha: f32) -> Srgba<u8> {
    let c = rgb(hex);
    Srgba::new(c.red, c.green, c.blue, (alpha.clamp(0.0, 1.0) * 255.0).round() as u8)
}

// Tailwind palette entries used by the themes.
const BLACK: Color = rgb(0x000000);
pub(crate) const WHITE: Color = rgb(0xffffff);
const GRAY_300: Color = rgb(0xd1d5db);
pub(crate) const GRAY_500: Color = rgb(0x6b7280);
pub(crate) const GRAY_600: Color = rgb(0x4b5563);
const GRAY_800: Color = rgb(0x1f2937);
const GRAY_900: Color = rgb(0x111827);
const RED_400: Color = rgb(0xf87171);
const RED_500: Color = rgb(0xef4444);
const RED_600: Color = rgb(0xdc2626);
const RED_700: Color = rgb(0xb91c1c);
const RED_800: Color = rgb(0x991b1b);
const RED_900: Color = rgb(0x7f1d1d);
const RED_950: Color = rgb(0x450a0a);
const ORANGE_300: Color = rgb(0xfdba74);
const ORANGE_400: Color = rgb(0xfb923c);
const ORANGE_500: Color = rgb(0xf97316);
const ORANGE_600: Color = rgb(0xea580c);
const ORANGE_900: Color = rgb(0x7c2d12);
const YELLOW_400: Color = rgb(0xfacc15);
const YELLOW_800: Color = rgb(0x854d0e);
const PURPLE_400: Color = rgb(0xc084fc);
const PURPLE_600: Color = rgb(0x9333ea);

/// Secondary text color (the "of X goal" line).
pub(crate) const MUTED_TEXT: Color = GRAY_300;

/// Stroke color of the flame decoration.
pub(crate) const FLAME: Color = ORANGE_400;

/// A three stop linear gradient: `from`, `via`, `to`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gradient {
    pub from: Color,
    pub via: Color,
    pub to: Color,
}

const fn gradient(from: Color, via: Color, to: Color) -> Gradient {
    Gradient { from, via, to }
}

/// Resolved styling of one theme.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThemeStyle {
    /// Card background, top to bottom.
    pub background: Gradient,
    /// Thermometer fill, bottom to top.
    pub fill: Gradient,
    /// Halo around the card.
    pub glow: Srgba<u8>,
    /// Subtitle, percentage and message color.
    pub accent: Color,
    /// Card border color.
    pub border: Color,
}

/// Looks up the styling of `theme`.
pub fn theme_style(theme: Theme) -> ThemeStyle {
    match theme {
        Theme::Hellfire => ThemeStyle {
            background: gradient(RED_900, RED_800, ORANGE_600),
            fill: gradient(ORANGE_400, RED_500, RED_600),
            glow: rgba(0xef4444, 0.5),
            accent: ORANGE_400,
            border: RED_600,
        },
        Theme::Molten => ThemeStyle {
            background: gradient(GRAY_800, ORANGE_900, YELLOW_800),
            fill: gradient(YELLOW_400, ORANGE_500, RED_500),
            glow: rgba(0xf97316, 0.5),
            accent: YELLOW_400,
            border: ORANGE_500,
        },
        Theme::Shadow => ThemeStyle {
            background: gradient(GRAY_900, GRAY_800, BLACK),
            fill: gradient(PURPLE_400, RED_500, GRAY_600),
            glow: rgba(0xa855f7, 0.5),
            accent: PURPLE_400,
            border: PURPLE_600,
        },
        Theme::Crimson => ThemeStyle {
            background: gradient(RED_950, RED_900, RED_800),
            fill: gradient(RED_400, RED_500, RED_700),
            glow: rgba(0xdc2626, 0.5),
            accent: RED_400,
            border: RED_500,
        },
        Theme::Inferno => ThemeStyle {
            background: gradient(BLACK, RED_950, ORANGE_900),
            fill: gradient(ORANGE_300, RED_400, RED_600),
            glow: rgba(0xfb923c, 0.6),
            accent: ORANGE_300,
            border: ORANGE_400,
        },
    }
}

/// Resolved text styling of one font choice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// CSS generic family list.
    pub family: &'static str,
    /// Weight used for body text; headings are always bold.
    pub weight: u16,
    /// Extra spacing between letters, in em.
    pub letter_spacing: f32,
}

/// Looks up the text styling of `font`.
pub fn text_style(font: FontStyle) -> TextStyle {
    match font {
        FontStyle::Gothic => TextStyle {
            family: "serif",
            weight: 400,
            letter_spacing: 0.0,
        },
        FontStyle::Modern => TextStyle {
            family: "sans-serif",
            weight: 400,
            letter_spacing: 0.0,
        },
        FontStyle::Metal => TextStyle {
            family: "monospace",
            weight: 400,
            letter_spacing: 0.1,
        },
        FontStyle::Elegant => TextStyle {
            family: "sans-serif",
            weight: 300,
            letter_spacing: 0.025,
        },
    }
}

/// Formats a color as `#rrggbb`.
pub fn hex(color: Color) -> String {
    format!("#{:02x}{:02x}{:02x}", color.red, color.green, color.blue)
}
