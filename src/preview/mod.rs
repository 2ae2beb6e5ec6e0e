//! Preview rendering: design in, visual tree and SVG document out.
//!
//! [`build_preview`] is a pure function of the [`Design`]. It lays out the
//! card as an ordered list of [`Element`]s:
//!
//! ```text
//! Card background
//!   Title
//!   Subtitle
//!   Track (fill, glow, ticks)   <- the only element carrying a transform
//!   Flame              (optional)
//!   Percentage readout (optional)
//!   Amounts
//!   Message            (optional)
//! ```
//!
//! The tree is then serialized with [`render_svg`] and wrapped in a
//! [`PreviewNode`], the unit the export pipeline captures. A mounted preview
//! lives in a [`MountedPreview`], which keeps its identity across edits.

pub mod svg;
pub mod theme;

pub use svg::render_svg;
pub use theme::{text_style, theme_style, Color, Gradient, TextStyle, ThemeStyle};

use std::sync::{Arc, PoisonError, RwLock};

use palette::Srgba;

use crate::currency::format_currency;
use crate::design::Design;

// ============================================================================
// Fill percentage
// ============================================================================

/// Percentage of the goal reached, capped at 100.
///
/// Returns 0 when `goal <= 0`. A negative `current` gives a negative result;
/// only the drawn bar is clamped.
pub fn fill_percentage(goal: f64, current: f64) -> f64 {
    if goal <= 0.0 {
        0.0
    } else {
        (current / goal * 100.0).min(100.0)
    }
}

/// Height of the blurred glow above the fill, capped at 100.
pub fn glow_percentage(percentage: f64) -> f64 {
    (percentage + 10.0).min(100.0)
}

/// Positions of the decorative tick marks, in percent of the track height.
pub const TICK_MARKS: [f64; 3] = [25.0, 50.0, 75.0];

// ============================================================================
// Layout constants
// ============================================================================

const PADDING: f32 = 32.0;
const CARD_RADIUS: f32 = 16.0;
const TRACK_WIDTH: f32 = 80.0;
const TRACK_HEIGHT: f32 = 320.0;
const FLAME_SIZE: f32 = 24.0;
const MESSAGE_BOX_HEIGHT: f32 = 36.0;

// ============================================================================
// Visual tree
// ============================================================================

/// A single centered line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub content: String,
    /// Horizontal center.
    pub x: f32,
    /// Baseline.
    pub y: f32,
    pub size: f32,
    pub color: Color,
    pub weight: u16,
    pub style: TextStyle,
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// The themed card behind everything else.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub bounds: Rect,
    pub radius: f32,
    pub theme: ThemeStyle,
}

/// Transform applied to the thermometer track only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackTransform {
    pub scale_x: f64,
    pub scale_y: f64,
    /// Degrees, clockwise.
    pub rotation: f64,
    /// Percent of the track's own height.
    pub translate_y: f64,
}

impl TrackTransform {
    pub fn is_identity(&self) -> bool {
        self.scale_x == 1.0 && self.scale_y == 1.0 && self.rotation == 0.0 && self.translate_y == 0.0
    }
}

/// The thermometer: an untransformed track centered at `center`, plus its
/// transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub center: (f32, f32),
    pub width: f32,
    pub height: f32,
    /// Fill level as computed; may be negative.
    pub fill_percent: f64,
    pub glow_percent: f64,
    pub ticks: [f64; 3],
    pub fill: Gradient,
    pub transform: TrackTransform,
}

impl Track {
    /// Drawn height of a bar at `percent`, clamped to the track.
    pub fn bar_height(&self, percent: f64) -> f32 {
        (percent.clamp(0.0, 100.0) as f32 / 100.0) * self.height
    }
}

/// One element of the preview, in paint order.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Card(Card),
    Title(TextRun),
    Subtitle(TextRun),
    Track(Track),
    Flame { bounds: Rect, color: Color },
    Percentage(TextRun),
    Amounts { current: TextRun, goal: TextRun },
    Message { text: TextRun, panel: Rect, panel_color: Srgba<u8> },
}

/// A laid out preview.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewTree {
    pub width: u32,
    pub height: u32,
    pub elements: Vec<Element>,
}

impl PreviewTree {
    /// The thermometer track. Every tree has exactly one.
    pub fn track(&self) -> Option<&Track> {
        self.elements.iter().find_map(|e| match e {
            Element::Track(t) => Some(t),
            _ => None,
        })
    }

    /// Text of the percentage readout, if shown.
    pub fn percentage_text(&self) -> Option<&str> {
        self.elements.iter().find_map(|e| match e {
            Element::Percentage(t) => Some(t.content.as_str()),
            _ => None,
        })
    }

    /// Formatted current amount.
    pub fn current_text(&self) -> Option<&str> {
        self.elements.iter().find_map(|e| match e {
            Element::Amounts { current, .. } => Some(current.content.as_str()),
            _ => None,
        })
    }

    /// The "of <goal> goal" line.
    pub fn goal_text(&self) -> Option<&str> {
        self.elements.iter().find_map(|e| match e {
            Element::Amounts { goal, .. } => Some(goal.content.as_str()),
            _ => None,
        })
    }

    pub fn has_flame(&self) -> bool {
        self.elements.iter().any(|e| matches!(e, Element::Flame { .. }))
    }

    pub fn message_text(&self) -> Option<&str> {
        self.elements.iter().find_map(|e| match e {
            Element::Message { text, .. } => Some(text.content.as_str()),
            _ => None,
        })
    }
}

/// Lays out the preview of `design`.
pub fn build_preview(design: &Design) -> PreviewTree {
    let (width, height) = design.dimensions();
    let (w, h) = (width as f32, height as f32);
    let theme = theme_style(design.theme);
    let style = text_style(design.font_style);
    let percentage = fill_percentage(design.goal, design.current);
    let cx = w / 2.0;

    let text = |content: String, y: f32, size: f32, color: Color, weight: u16| TextRun {
        content,
        x: cx,
        y,
        size,
        color,
        weight,
        style,
    };

    let mut elements = Vec::with_capacity(8);

    elements.push(Element::Card(Card {
        bounds: Rect { x: 0.0, y: 0.0, width: w, height: h },
        radius: CARD_RADIUS,
        theme,
    }));

    let title_y = PADDING + 32.0 + 24.0;
    elements.push(Element::Title(text(
        design.title.clone(),
        title_y,
        24.0,
        theme::WHITE,
        700,
    )));
    elements.push(Element::Subtitle(text(
        design.subtitle.clone(),
        title_y + 8.0 + 20.0,
        14.0,
        theme.accent,
        style.weight,
    )));

    elements.push(Element::Track(Track {
        center: (cx, h / 2.0),
        width: TRACK_WIDTH,
        height: TRACK_HEIGHT,
        fill_percent: percentage,
        glow_percent: glow_percentage(percentage),
        ticks: TICK_MARKS,
        fill: theme.fill,
        transform: TrackTransform {
            scale_x: design.scale_x,
            scale_y: design.scale_y,
            rotation: design.rotation,
            translate_y: design.translate_y,
        },
    }));

    // The lower block stacks upward from the bottom padding.
    let mut bottom = h - PADDING;
    let mut lower = Vec::with_capacity(4);

    if !design.custom_message.is_empty() {
        let panel = Rect {
            x: PADDING,
            y: bottom - MESSAGE_BOX_HEIGHT,
            width: (w - 2.0 * PADDING).max(0.0),
            height: MESSAGE_BOX_HEIGHT,
        };
        lower.push(Element::Message {
            text: text(
                design.custom_message.clone(),
                panel.y + 23.0,
                14.0,
                theme.accent,
                style.weight,
            ),
            panel,
            panel_color: Srgba::new(0, 0, 0, 77),
        });
        bottom = panel.y - 16.0;
    }

    let amount = |value: f64| {
        format_currency(
            value,
            &design.currency,
            Some(&design.custom_symbol),
            Some(design.currency_symbol_position),
        )
    };
    let goal_line = text(
        format!("of {} goal", amount(design.goal)),
        bottom - 4.0,
        14.0,
        theme::MUTED_TEXT,
        style.weight,
    );
    bottom -= 24.0;
    let current_line = text(amount(design.current), bottom - 6.0, 20.0, theme::WHITE, 600);
    bottom -= 28.0 + 12.0;
    lower.push(Element::Amounts {
        current: current_line,
        goal: goal_line,
    });

    if design.show_percentage {
        lower.push(Element::Percentage(text(
            format!("{percentage:.1}%"),
            bottom - 6.0,
            36.0,
            theme.accent,
            700,
        )));
        bottom -= 40.0;
    }

    if design.show_flame {
        bottom -= 16.0;
        lower.push(Element::Flame {
            bounds: Rect {
                x: cx - FLAME_SIZE / 2.0,
                y: bottom - FLAME_SIZE,
                width: FLAME_SIZE,
                height: FLAME_SIZE,
            },
            color: theme::FLAME,
        });
    }

    // Built bottom-up, painted top-down.
    elements.extend(lower.into_iter().rev());

    PreviewTree { width, height, elements }
}

// ============================================================================
// PreviewNode
// ============================================================================

/// A rendered preview: the visual tree plus its SVG document.
///
/// Nodes are immutable; an edit produces a new node.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewNode {
    pub tree: PreviewTree,
    pub svg: String,
}

impl PreviewNode {
    /// Lays out and serializes `design`.
    pub fn render(design: &Design) -> Self {
        let tree = build_preview(design);
        let svg = render_svg(&tree);
        Self { tree, svg }
    }

    /// Size of the node in pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.tree.width, self.tree.height)
    }
}

/// Mount point of a preview.
///
/// Edits swap the node inside while the mount itself stays the same, so a
/// `Weak<MountedPreview>` only stops upgrading on unmount.
#[derive(Debug)]
pub struct MountedPreview {
    current: RwLock<Arc<PreviewNode>>,
}

impl MountedPreview {
    pub fn new(node: PreviewNode) -> Self {
        Self {
            current: RwLock::new(Arc::new(node)),
        }
    }

    /// The node as of the latest render.
    pub fn current(&self) -> Arc<PreviewNode> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Swaps in a freshly rendered node.
    pub fn replace(&self, node: PreviewNode) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(node);
    }
}

// ============================================================================
// Tests
// ============================================================================
