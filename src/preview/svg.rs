//! SVG serialization of a [`PreviewTree`].
//!
//! The output is a standalone document sized to the design's canvas, using
//! only features resvg supports (linear gradients, gaussian blur, clip
//! paths, nested `<svg>` viewports).

use std::fmt::Write;

use super::theme::{hex, Color, Gradient, GRAY_500, GRAY_600};
use super::{Card, Element, PreviewTree, Rect, TextRun, Track};

/// Lucide "flame" outline, drawn in a 24x24 viewport.
const FLAME_PATH: &str = "M8.5 14.5A2.5 2.5 0 0 0 11 12c0-1.38-.5-2-1-3-1.072-2.143-.224-4.054 2-6 \
.5 2.5 2 4.9 4 6.5 2 1.6 3 3.5 3 5.5a7 7 0 1 1-14 0c0-1.153.433-2.294 1-3a2.5 2.5 0 0 0 2.5 2.5z";

/// Serializes `tree` to an SVG document.
pub fn render_svg(tree: &PreviewTree) -> String {
    let mut out = String::with_capacity(4096);
    let (w, h) = (tree.width, tree.height);

    // Writing to a String cannot fail.
    let _ = write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
    );

    for element in &tree.elements {
        match element {
            Element::Card(card) => write_card(&mut out, card),
            Element::Title(t) | Element::Subtitle(t) | Element::Percentage(t) => {
                write_text(&mut out, t)
            }
            Element::Track(track) => write_track(&mut out, track),
            Element::Flame { bounds, color } => write_flame(&mut out, bounds, *color),
            Element::Amounts { current, goal } => {
                write_text(&mut out, current);
                write_text(&mut out, goal);
            }
            Element::Message { text, panel, panel_color } => {
                let _ = write!(
                    out,
                    r#"<rect x="{}" y="{}" width="{}" height="{}" rx="8" fill="{}" fill-opacity="{:.3}"/>"#,
                    panel.x,
                    panel.y,
                    panel.width,
                    panel.height,
                    hex(panel_color.color),
                    panel_color.alpha as f32 / 255.0
                );
                write_text(&mut out, text);
            }
        }
    }

    out.push_str("</svg>");
    out
}

fn write_gradient(out: &mut String, id: &str, g: &Gradient, bottom_up: bool) {
    let (y1, y2) = if bottom_up { (1, 0) } else { (0, 1) };
    let _ = write!(
        out,
        r#"<linearGradient id="{id}" x1="0" y1="{y1}" x2="0" y2="{y2}"><stop offset="0" stop-color="{}"/><stop offset="0.5" stop-color="{}"/><stop offset="1" stop-color="{}"/></linearGradient>"#,
        hex(g.from),
        hex(g.via),
        hex(g.to)
    );
}

fn write_card(out: &mut String, card: &Card) {
    let Rect { x, y, width, height } = card.bounds;
    let r = card.radius;
    let theme = &card.theme;

    out.push_str("<defs>");
    write_gradient(out, "card-bg", &theme.background, false);
    out.push_str(r#"<filter id="card-glow" x="-20%" y="-20%" width="140%" height="140%"><feGaussianBlur stdDeviation="12"/></filter>"#);
    out.push_str("</defs>");

    // Halo, inset so it stays visible inside the canvas.
    let _ = write!(
        out,
        r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{r}" fill="{}" fill-opacity="{:.3}" filter="url(#card-glow)"/>"#,
        x + 4.0,
        y + 4.0,
        (width - 8.0).max(0.0),
        (height - 8.0).max(0.0),
        hex(theme.glow.color),
        theme.glow.alpha as f32 / 255.0
    );
    let _ = write!(
        out,
        r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{r}" fill="url(#card-bg)" stroke="{}" stroke-width="2"/>"#,
        x + 1.0,
        y + 1.0,
        (width - 2.0).max(0.0),
        (height - 2.0).max(0.0),
        hex(theme.border)
    );
}

fn write_text(out: &mut String, t: &TextRun) {
    if t.content.is_empty() {
        return;
    }
    let spacing = t.style.letter_spacing * t.size;
    let _ = write!(
        out,
        r#"<text x="{}" y="{}" text-anchor="middle" font-family="{}" font-size="{}" font-weight="{}""#,
        t.x, t.y, t.style.family, t.size, t.weight
    );
    if spacing > 0.0 {
        let _ = write!(out, r#" letter-spacing="{spacing}""#);
    }
    let _ = write!(out, r#" fill="{}">{}</text>"#, hex(t.color), escape(&t.content));
}

fn write_track(out: &mut String, track: &Track) {
    let (w, h) = (track.width, track.height);
    let radius = w / 2.0;
    let t = &track.transform;
    let (cx, cy) = track.center;
    let offset = t.translate_y as f32 / 100.0 * h;

    out.push_str("<defs>");
    write_gradient(out, "track-fill", &track.fill, true);
    let _ = write!(
        out,
        r#"<clipPath id="track-clip"><rect x="0" y="0" width="{w}" height="{h}" rx="{radius}"/></clipPath><filter id="track-blur" x="-50%" y="-50%" width="200%" height="200%"><feGaussianBlur stdDeviation="4"/></filter>"#
    );
    out.push_str("</defs>");

    let _ = write!(
        out,
        r#"<g transform="translate({cx} {}) scale({} {}) rotate({}) translate({} {})">"#,
        cy + offset,
        t.scale_x,
        t.scale_y,
        t.rotation,
        -w / 2.0,
        -h / 2.0
    );

    let _ = write!(
        out,
        r#"<rect x="0" y="0" width="{w}" height="{h}" rx="{radius}" fill="{}" fill-opacity="0.4" stroke="{}" stroke-width="2"/>"#,
        hex(Color::new(0, 0, 0)),
        hex(GRAY_600)
    );

    out.push_str(r#"<g clip-path="url(#track-clip)">"#);
    let fill = track.bar_height(track.fill_percent);
    if fill > 0.0 {
        let _ = write!(
            out,
            r#"<rect x="0" y="{}" width="{w}" height="{fill}" rx="{}" fill="url(#track-fill)"/>"#,
            h - fill,
            radius.min(fill / 2.0)
        );
    }
    let glow = track.bar_height(track.glow_percent);
    if glow > 0.0 {
        let _ = write!(
            out,
            r#"<rect x="0" y="{}" width="{w}" height="{glow}" rx="{}" fill="url(#track-fill)" opacity="0.6" filter="url(#track-blur)"/>"#,
            h - glow,
            radius.min(glow / 2.0)
        );
    }
    for mark in track.ticks {
        let y = h - (mark as f32 / 100.0) * h;
        let _ = write!(
            out,
            r#"<rect x="0" y="{}" width="{w}" height="2" fill="{}" fill-opacity="0.5"/>"#,
            y - 1.0,
            hex(GRAY_500)
        );
    }
    out.push_str("</g></g>");
}

fn write_flame(out: &mut String, bounds: &Rect, color: Color) {
    #[cfg(feature = "twemoji")]
    {
        if let Some(svg) = twemoji_flame(bounds) {
            out.push_str(&svg);
            return;
        }
    }

    let _ = write!(
        out,
        r#"<svg x="{}" y="{}" width="{}" height="{}" viewBox="0 0 24 24"><path d="{FLAME_PATH}" fill="none" stroke="{}" stroke-width="2" stroke-linecap="round" stroke-linejoin="round"/></svg>"#,
        bounds.x,
        bounds.y,
        bounds.width,
        bounds.height,
        hex(color)
    );
}

/// The 🔥 Twemoji asset, positioned as a nested viewport.
#[cfg(feature = "twemoji")]
fn twemoji_flame(bounds: &Rect) -> Option<String> {
    use twemoji_assets::svg::SvgTwemojiAsset;

    let asset = SvgTwemojiAsset::from_emoji("🔥")?;
    let markup: &str = asset.as_ref();
    let start = markup.find("<svg")?;
    let placement = format!(
        r#"<svg x="{}" y="{}" width="{}" height="{}" "#,
        bounds.x, bounds.y, bounds.width, bounds.height
    );
    Some(markup[start..].replacen("<svg ", &placement, 1))
}

/// Escapes text for use as XML character data.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::Design;
    use crate::preview::build_preview;
    use resvg::usvg::{Options, Tree};

    fn svg_for(design: &Design) -> String {
        render_svg(&build_preview(design))
    }

    #[test]
    fn document_is_sized_to_design() {
        let svg = svg_for(&Design::default());
        assert!(svg.starts_with(r#"<svg xmlns="http://www.w3.org/2000/svg" width="450" height="800""#));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn output_parses_with_usvg() {
        let tree = Tree::from_str(&svg_for(&Design::default()), &Options::default());
        assert!(tree.is_ok());
    }

    #[test]
    fn text_is_escaped() {
        let design = Design {
            title: "Tom & <Jerry>".into(),
            ..Design::default()
        };
        let svg = svg_for(&design);
        assert!(svg.contains("Tom &amp; &lt;Jerry&gt;"));
        assert!(Tree::from_str(&svg, &Options::default()).is_ok());
    }

    #[test]
    fn transform_is_scoped_to_track_group() {
        let design = Design {
            scale_x: 1.5,
            rotation: -30.0,
            translate_y: 50.0,
            ..Design::default()
        };
        let svg = svg_for(&design);
        // centre y 400 + 50% of the 320px track
        assert!(svg.contains("translate(225 560) scale(1.5 1) rotate(-30) translate(-40 -160)"));
        assert_eq!(svg.matches("transform=").count(), 1);
    }

    #[test]
    fn empty_bar_is_not_drawn() {
        let design = Design {
            current: 0.0,
            goal: 100.0,
            ..Design::default()
        };
        let svg = svg_for(&design);
        // only the glow bar uses the gradient when the fill is empty
        assert_eq!(svg.matches(r#"fill="url(#track-fill)""#).count(), 1);
    }

    #[test]
    fn ticks_drawn_at_quarters() {
        let svg = svg_for(&Design::default());
        for y in ["239", "159", "79"] {
            assert!(svg.contains(&format!(r#"y="{y}" width="80" height="2""#)), "tick at {y}");
        }
    }

    #[test]
    fn escape_handles_quotes() {
        assert_eq!(escape(r#"a"b'c"#), "a&quot;b&apos;c");
    }
}
