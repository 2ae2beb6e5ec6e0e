//! Rasterization of preview nodes using resvg/usvg.
//!
//! The export pipeline only depends on the [`Rasterizer`] trait, so the
//! capture step can be swapped out (or faked in tests) without touching
//! percentage, formatting or model logic.

use std::sync::Arc;

use image::{Rgba, RgbaImage};
use log::debug;
use resvg::tiny_skia::{self, Pixmap, Transform};
use resvg::usvg::{fontdb, Options, Tree};

use crate::error::{Error, Result};
use crate::preview::PreviewNode;

// ============================================================================
// Rasterizer
// ============================================================================

/// Options for a single capture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterOptions {
    /// Pixel density multiplier (2.0 renders a 450x800 node at 900x1600).
    pub scale: f32,
    /// Fill color behind the node. `None` keeps the background transparent.
    pub background: Option<Rgba<u8>>,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            background: None,
        }
    }
}

/// Turns a rendered preview node into a bitmap.
pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, node: &PreviewNode, options: &RasterOptions) -> Result<RgbaImage>;
}

/// [`Rasterizer`] backed by resvg.
///
/// Text is only drawn for fonts present in the font database; use
/// [`ResvgRasterizer::with_system_fonts`] for exports meant for people.
#[derive(Clone)]
pub struct ResvgRasterizer {
    fontdb: Arc<fontdb::Database>,
}

impl Default for ResvgRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ResvgRasterizer {
    /// Creates a rasterizer with an empty font database.
    pub fn new() -> Self {
        Self {
            fontdb: Arc::new(fontdb::Database::new()),
        }
    }

    /// Creates a rasterizer that can draw text with the system's fonts.
    pub fn with_system_fonts() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        debug!("loaded {} system font faces", db.len());
        Self {
            fontdb: Arc::new(db),
        }
    }

    /// Creates a rasterizer using an existing font database.
    pub fn with_fontdb(fontdb: Arc<fontdb::Database>) -> Self {
        Self { fontdb }
    }
}

impl Rasterizer for ResvgRasterizer {
    fn rasterize(&self, node: &PreviewNode, options: &RasterOptions) -> Result<RgbaImage> {
        let scale = options.scale;
        if !(scale.is_finite() && scale > 0.0) {
            return Err(Error::Rasterize(format!("invalid scale factor {scale}")));
        }

        let opts = Options {
            fontdb: Arc::clone(&self.fontdb),
            ..Options::default()
        };
        let tree =
            Tree::from_str(&node.svg, &opts).map_err(|e| Error::Rasterize(e.to_string()))?;

        let size = tree.size();
        let width = (size.width() * scale).ceil() as u32;
        let height = (size.height() * scale).ceil() as u32;
        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
            Error::Rasterize(format!("cannot allocate a {width}x{height} bitmap"))
        })?;

        if let Some(Rgba([r, g, b, a])) = options.background {
            pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, a));
        }

        resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());
        debug!("rasterized preview at {width}x{height}");

        Ok(pixmap_to_rgba_image(&pixmap))
    }
}

// ============================================================================
// Pixel conversion
// ============================================================================

/// Copies a premultiplied pixmap into a straight-alpha image.
fn pixmap_to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = if c.alpha() == 0 {
            Rgba([0, 0, 0, 0])
        } else {
            Rgba([c.red(), c.green(), c.blue(), c.alpha()])
        };
    }
    img
}

// ============================================================================
// Compositing
// ============================================================================

/// Composites `src` onto `dest` with its top-left corner at `(x, y)`.
///
/// Uses source-over alpha blending; pixels falling outside `dest` are
/// dropped.
pub fn composite_over(dest: &mut RgbaImage, src: &RgbaImage, x: i64, y: i64) {
    let dest_width = dest.width() as i64;
    let dest_height = dest.height() as i64;

    for (sx, sy, src_pixel) in src.enumerate_pixels() {
        let dx = x + sx as i64;
        let dy = y + sy as i64;
        if dx < 0 || dy < 0 || dx >= dest_width || dy >= dest_height {
            continue;
        }

        let dst_pixel = dest.get_pixel_mut(dx as u32, dy as u32);
        *dst_pixel = blend_over(*src_pixel, *dst_pixel);
    }
}

/// Offset that centers an `inner` extent within an `outer` one.
pub fn centered_offset(outer: u32, inner: u32) -> i64 {
    (outer as i64 - inner as i64) / 2
}

/// Source-over for straight-alpha pixels, in 8-bit fixed point.
fn blend_over(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    let src_a = u32::from(src[3]);
    match src_a {
        255 => return src,
        0 => return dst,
        _ => {}
    }

    // destination coverage left visible through the source
    let dst_a = (u32::from(dst[3]) * (255 - src_a) + 127) / 255;
    let out_a = src_a + dst_a;
    if out_a == 0 {
        return Rgba([0, 0, 0, 0]);
    }

    let mut out = Rgba([0, 0, 0, out_a as u8]);
    for i in 0..3 {
        let sum = u32::from(src[i]) * src_a + u32::from(dst[i]) * dst_a;
        out[i] = ((sum + out_a / 2) / out_a) as u8;
    }
    out
}

// ============================================================================
// Tests
// ============================================================================
