//! hellscore-renderer: fundraising thermometer designer
//!
//! This crate holds the design model of a shareable fundraising
//! thermometer card, renders it to a preview (a layout tree plus an SVG
//! document) and exports that preview as a PNG or JPEG image.
//!
//! # Example
//!
//! ```
//! use hellscore_renderer::{set_field, Design, DesignEdit, PreviewNode};
//!
//! let design = set_field(&Design::default(), DesignEdit::Current(5000.0));
//! let node = PreviewNode::render(&design);
//!
//! assert_eq!(node.size(), (450, 800));
//! assert_eq!(node.tree.percentage_text(), Some("50.0%"));
//! assert!(node.svg.starts_with("<svg"));
//! ```
//!
//! # Sharing Designs
//!
//! Designs persist as query strings (see [`encode_to_query`]) or as JSON:
//!
//! ```
//! use hellscore_renderer::{Configurable, Design, DesignEditor};
//!
//! let mut editor = DesignEditor::from_query("?goal=2000&current=500&theme=crimson");
//! let query = editor.export_query();
//!
//! let json = editor.design().to_json().unwrap();
//! assert_eq!(Design::from_json(&json).unwrap(), *editor.design());
//! # let _ = query;
//! ```
//!
//! # Exporting
//!
//! ```no_run
//! use std::sync::Arc;
//! use hellscore_renderer::{
//!     DesignEditor, DirectorySink, ExportFormat, Exporter, ResvgRasterizer,
//! };
//!
//! # async fn run() {
//! let mut editor = DesignEditor::default();
//! let node = editor.mount();
//! let (width, height) = editor.design().dimensions();
//!
//! let exporter = Exporter::new(
//!     Arc::new(ResvgRasterizer::with_system_fonts()),
//!     Arc::new(DirectorySink::new(".")),
//! );
//! let status = exporter.export(&node, width, height, ExportFormat::Png).await;
//! println!("{status:?}");
//! # }
//! ```

mod currency;
mod design;
mod editor;
mod error;
mod export;
mod field;
mod preview;
mod query;
mod raster;

pub use currency::{
    currency_symbol, format_currency, group_integer, is_custom, CurrencyInfo, CURRENCIES,
    CUSTOM_CURRENCY, DEFAULT_CUSTOM_SYMBOL,
};
pub use design::{
    Design, DesignOption, FontStyle, OptionKey, SizePreset, SymbolPosition, Theme, UnknownKey,
    CUSTOM_FALLBACK_SIZE, FONT_OPTIONS, SIZE_OPTIONS, THEME_OPTIONS,
};
pub use editor::{Configurable, DesignEditor};
pub use error::{Error, Result};
pub use export::{
    encode, export_file_name, DeliveredFile, DirectorySink, Download, ExportFormat,
    ExportSettings, ExportStatus, ExportedImage, Exporter, MemorySink, DEFAULT_BRAND,
};
pub use field::{
    differs_from_default, parse_amount, parse_dimension, parse_edit, reset_fields, set_field,
    DesignEdit, DesignField, FieldRange, EXPORT_FIELDS, TRANSFORM_FIELDS,
};
pub use preview::{
    build_preview, fill_percentage, glow_percentage, render_svg, text_style, theme_style, Card,
    Color, Element, Gradient, MountedPreview, PreviewNode, PreviewTree, Rect, TextRun, TextStyle,
    ThemeStyle, Track, TrackTransform, TICK_MARKS,
};
pub use query::{decode_from_query, encode_to_query, merge_query};
pub use raster::{composite_over, RasterOptions, Rasterizer, ResvgRasterizer};
