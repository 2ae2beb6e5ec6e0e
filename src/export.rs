//! Image export of a mounted preview.
//!
//! An [`Exporter`] captures the current [`PreviewNode`](crate::PreviewNode) of a
//! [`MountedPreview`] through an injected [`Rasterizer`], composites the
//! capture centred on a canvas of the requested size, encodes it and hands
//! the bytes to a [`Download`] sink.
//!
//! Only one export runs at a time. The mount is held weakly, so a preview
//! that is unmounted while an export is pending is detected and reported
//! as [`ExportStatus::NotMounted`] instead of being drawn. Edits made during
//! a capture do not interrupt it; the capture shows the design as it was
//! when the export started.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use chrono::Utc;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, Rgba, RgbImage, RgbaImage};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::preview::MountedPreview;
use crate::raster::{centered_offset, composite_over, RasterOptions, Rasterizer};

/// File name prefix used when no brand is configured.
pub const DEFAULT_BRAND: &str = "hellscore-thermometer";

/// Background JPEG exports are flattened onto.
const JPEG_BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);

// ============================================================================
// Settings and results
// ============================================================================

/// Output encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
}

impl ExportFormat {
    /// File extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpeg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg => "image/jpeg",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpeg" | "jpg" => Ok(ExportFormat::Jpeg),
            _ => Err(Error::InvalidValue {
                field: "format",
                value: s.to_string(),
            }),
        }
    }
}

/// Tunables of an [`Exporter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct ExportSettings {
    /// JPEG quality in `0.0..=1.0`. Ignored for PNG.
    pub quality: f32,
    /// Pixel density multiplier applied to the capture and the canvas.
    pub supersample: f32,
    /// File name prefix.
    pub brand: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            quality: 0.92,
            supersample: 2.0,
            brand: DEFAULT_BRAND.to_string(),
        }
    }
}

impl ExportSettings {
    /// JPEG quality mapped onto the encoder's 1-100 scale.
    pub fn jpeg_quality(&self) -> u8 {
        let q = if self.quality.is_finite() { self.quality } else { 1.0 };
        ((q.clamp(0.0, 1.0) * 100.0).round() as u8).max(1)
    }
}

/// Description of a delivered file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedImage {
    pub file_name: String,
    pub format: ExportFormat,
    /// Pixel width of the encoded image (after supersampling).
    pub width: u32,
    pub height: u32,
    pub byte_len: usize,
}

/// Outcome of [`Exporter::export`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportStatus {
    Completed(ExportedImage),
    /// Another export was still in flight; nothing was done.
    Busy,
    /// The preview was not mounted when capture started or finished.
    NotMounted,
    /// Capture, encoding or delivery failed. The reason has been logged.
    Failed(String),
}

impl ExportStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, ExportStatus::Completed(_))
    }
}

/// Builds `<brand>-<unix-ms>.<ext>`.
pub fn export_file_name(brand: &str, unix_millis: i64, format: ExportFormat) -> String {
    let brand = brand.trim();
    let brand = if brand.is_empty() { DEFAULT_BRAND } else { brand };
    format!("{brand}-{unix_millis}.{}", format.extension())
}

// ============================================================================
// Download sinks
// ============================================================================

/// Destination for finished exports.
///
/// Delivery runs on the blocking pool, so implementations may do
/// synchronous IO.
pub trait Download: Send + Sync {
    fn deliver(&self, file_name: &str, mime_type: &str, bytes: &[u8]) -> Result<()>;
}

/// Writes exports into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Download for DirectorySink {
    fn deliver(&self, file_name: &str, _mime_type: &str, bytes: &[u8]) -> Result<()> {
        let path = self.dir.join(file_name);
        fs::write(&path, bytes)?;
        info!("wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }
}

/// A file held by a [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Keeps exports in memory, e.g. to serve them over HTTP.
#[derive(Debug, Default)]
pub struct MemorySink {
    files: Mutex<Vec<DeliveredFile>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns everything delivered so far.
    pub fn take(&self) -> Vec<DeliveredFile> {
        match self.files.lock() {
            Ok(mut files) => std::mem::take(&mut *files),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl Download for MemorySink {
    fn deliver(&self, file_name: &str, mime_type: &str, bytes: &[u8]) -> Result<()> {
        let file = DeliveredFile {
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            bytes: bytes.to_vec(),
        };
        self.files
            .lock()
            .map_err(|_| Error::Task("memory sink lock poisoned".to_string()))?
            .push(file);
        Ok(())
    }
}

// ============================================================================
// Exporter
// ============================================================================

/// Clears the in-flight flag when an export ends, whichever way it ends.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs exports, one at a time.
pub struct Exporter {
    rasterizer: Arc<dyn Rasterizer>,
    sink: Arc<dyn Download>,
    settings: ExportSettings,
    busy: AtomicBool,
}

impl Exporter {
    pub fn new(rasterizer: Arc<dyn Rasterizer>, sink: Arc<dyn Download>) -> Self {
        Self::with_settings(rasterizer, sink, ExportSettings::default())
    }

    pub fn with_settings(
        rasterizer: Arc<dyn Rasterizer>,
        sink: Arc<dyn Download>,
        settings: ExportSettings,
    ) -> Self {
        Self {
            rasterizer,
            sink,
            settings,
            busy: AtomicBool::new(false),
        }
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// True while an export is in flight. Triggers should be disabled.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn try_begin(&self) -> Option<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(&self.busy))
    }

    /// Exports the preview behind `node` as a `width` x `height` image
    /// (before supersampling).
    pub async fn export(
        &self,
        node: &Weak<MountedPreview>,
        width: u32,
        height: u32,
        format: ExportFormat,
    ) -> ExportStatus {
        let Some(_guard) = self.try_begin() else {
            debug!("export requested while another is in flight");
            return ExportStatus::Busy;
        };

        match self.run(node, width, height, format).await {
            Ok(Some(image)) => {
                info!(
                    "exported {} ({}x{}, {} bytes)",
                    image.file_name, image.width, image.height, image.byte_len
                );
                ExportStatus::Completed(image)
            }
            Ok(None) => {
                debug!("preview is not mounted, export skipped");
                ExportStatus::NotMounted
            }
            Err(e) => {
                error!("export failed: {e}");
                ExportStatus::Failed(e.to_string())
            }
        }
    }

    async fn run(
        &self,
        node: &Weak<MountedPreview>,
        width: u32,
        height: u32,
        format: ExportFormat,
    ) -> Result<Option<ExportedImage>> {
        // Only the node is kept for the capture; the mount itself stays weak.
        let Some(snapshot) = node.upgrade().map(|mount| mount.current()) else {
            return Ok(None);
        };

        let scale = self.settings.supersample;
        let options = RasterOptions {
            scale,
            background: None,
        };
        let rasterizer = Arc::clone(&self.rasterizer);
        let capture =
            tokio::task::spawn_blocking(move || rasterizer.rasterize(&snapshot, &options))
                .await
                .map_err(|e| Error::Task(e.to_string()))??;

        if node.strong_count() == 0 {
            return Ok(None);
        }

        let canvas_width = scaled(width, scale);
        let canvas_height = scaled(height, scale);
        let quality = self.settings.jpeg_quality();
        let file_name =
            export_file_name(&self.settings.brand, Utc::now().timestamp_millis(), format);
        let sink = Arc::clone(&self.sink);
        let delivered = file_name.clone();
        let byte_len = tokio::task::spawn_blocking(move || -> Result<usize> {
            let mut canvas = RgbaImage::new(canvas_width, canvas_height);
            composite_over(
                &mut canvas,
                &capture,
                centered_offset(canvas_width, capture.width()),
                centered_offset(canvas_height, capture.height()),
            );
            let bytes = encode(canvas, format, quality)?;
            sink.deliver(&delivered, format.mime_type(), &bytes)?;
            Ok(bytes.len())
        })
        .await
        .map_err(|e| Error::Task(e.to_string()))??;

        Ok(Some(ExportedImage {
            file_name,
            format,
            width: canvas_width,
            height: canvas_height,
            byte_len,
        }))
    }
}

fn scaled(extent: u32, scale: f32) -> u32 {
    (extent as f32 * scale).round() as u32
}

/// Encodes `image` in `format`. JPEG output is flattened onto black.
pub fn encode(image: RgbaImage, format: ExportFormat, jpeg_quality: u8) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    match format {
        ExportFormat::Png => {
            DynamicImage::ImageRgba8(image).write_with_encoder(PngEncoder::new(&mut bytes))?;
        }
        ExportFormat::Jpeg => {
            let flat = flatten(&image, JPEG_BACKGROUND);
            DynamicImage::ImageRgb8(flat)
                .write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, jpeg_quality))?;
        }
    }
    Ok(bytes)
}

/// Composites `image` over an opaque `background` and drops alpha.
fn flatten(image: &RgbaImage, background: Rgba<u8>) -> RgbImage {
    let mut base = RgbaImage::from_pixel(image.width(), image.height(), background);
    composite_over(&mut base, image, 0, 0);
    DynamicImage::ImageRgba8(base).to_rgb8()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::Design;
    use crate::editor::DesignEditor;
    use crate::field::DesignEdit;
    use crate::preview::PreviewNode;
    use std::sync::mpsc;

    /// Captures as a solid red block the size of the node.
    struct SolidRasterizer;

    impl Rasterizer for SolidRasterizer {
        fn rasterize(&self, node: &PreviewNode, options: &RasterOptions) -> Result<RgbaImage> {
            let (w, h) = node.size();
            Ok(RgbaImage::from_pixel(
                scaled(w, options.scale),
                scaled(h, options.scale),
                Rgba([255, 0, 0, 255]),
            ))
        }
    }

    struct FailingRasterizer;

    impl Rasterizer for FailingRasterizer {
        fn rasterize(&self, _: &PreviewNode, _: &RasterOptions) -> Result<RgbaImage> {
            Err(Error::Rasterize("no surface".into()))
        }
    }

    /// Signals when capture starts, then waits for the test to release it.
    struct GatedRasterizer {
        started: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl Rasterizer for GatedRasterizer {
        fn rasterize(&self, node: &PreviewNode, options: &RasterOptions) -> Result<RgbaImage> {
            self.started.lock().unwrap().send(()).unwrap();
            self.release.lock().unwrap().recv().unwrap();
            SolidRasterizer.rasterize(node, options)
        }
    }

    fn gated() -> (GatedRasterizer, mpsc::Receiver<()>, mpsc::Sender<()>) {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let rasterizer = GatedRasterizer {
            started: Mutex::new(started_tx),
            release: Mutex::new(release_rx),
        };
        (rasterizer, started_rx, release_tx)
    }

    fn mounted() -> Arc<MountedPreview> {
        Arc::new(MountedPreview::new(PreviewNode::render(&Design::default())))
    }

    #[test]
    fn file_names() {
        assert_eq!(
            export_file_name("hellscore-thermometer", 1700000000000, ExportFormat::Png),
            "hellscore-thermometer-1700000000000.png"
        );
        assert_eq!(export_file_name("  ", 5, ExportFormat::Jpeg), "hellscore-thermometer-5.jpeg");
        assert_eq!(export_file_name("tour", 5, ExportFormat::Jpeg), "tour-5.jpeg");
    }

    #[test]
    fn format_parsing() {
        assert_eq!("PNG".parse::<ExportFormat>().unwrap(), ExportFormat::Png);
        assert_eq!("jpg".parse::<ExportFormat>().unwrap(), ExportFormat::Jpeg);
        assert!("gif".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn jpeg_quality_mapping() {
        let mut settings = ExportSettings::default();
        assert_eq!(settings.jpeg_quality(), 92);
        settings.quality = 0.0;
        assert_eq!(settings.jpeg_quality(), 1);
        settings.quality = 7.0;
        assert_eq!(settings.jpeg_quality(), 100);
    }

    #[test]
    fn jpeg_flattens_onto_black() {
        let image = RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 0]));
        let flat = flatten(&image, JPEG_BACKGROUND);
        assert_eq!(flat.get_pixel(0, 0).0, [0, 0, 0]);

        let bytes = encode(image, ExportFormat::Jpeg, 90).unwrap();
        assert_eq!(&bytes[..2], &[0xff, 0xd8]);
    }

    #[tokio::test]
    async fn export_png_to_memory() {
        let sink = Arc::new(MemorySink::new());
        let exporter = Exporter::new(Arc::new(SolidRasterizer), sink.clone());
        let node = mounted();

        let status = exporter
            .export(&Arc::downgrade(&node), 450, 800, ExportFormat::Png)
            .await;

        let ExportStatus::Completed(image) = status else {
            panic!("expected completion, got {status:?}");
        };
        assert_eq!((image.width, image.height), (900, 1600));
        assert!(image.file_name.starts_with("hellscore-thermometer-"));
        assert!(image.file_name.ends_with(".png"));

        let files = sink.take();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].mime_type, "image/png");
        assert_eq!(files[0].bytes.len(), image.byte_len);

        let decoded = image::load_from_memory(&files[0].bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (900, 1600));
        assert_eq!(decoded.get_pixel(450, 800).0, [255, 0, 0, 255]);
        assert!(!exporter.is_busy());
    }

    #[tokio::test]
    async fn capture_is_centred_on_larger_canvas() {
        let sink = Arc::new(MemorySink::new());
        let settings = ExportSettings {
            supersample: 1.0,
            ..ExportSettings::default()
        };
        let exporter = Exporter::with_settings(Arc::new(SolidRasterizer), sink.clone(), settings);
        let node = mounted();

        let status = exporter
            .export(&Arc::downgrade(&node), 650, 800, ExportFormat::Png)
            .await;
        assert!(status.is_completed());

        let files = sink.take();
        let decoded = image::load_from_memory(&files[0].bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (650, 800));
        assert_eq!(decoded.get_pixel(50, 400)[3], 0);
        assert_eq!(decoded.get_pixel(100, 400).0, [255, 0, 0, 255]);
        assert_eq!(decoded.get_pixel(599, 400)[3], 0);
    }

    #[tokio::test]
    async fn unmounted_node_is_not_captured() {
        let sink = Arc::new(MemorySink::new());
        let exporter = Exporter::new(Arc::new(FailingRasterizer), sink.clone());

        let node = mounted();
        let weak = Arc::downgrade(&node);
        drop(node);

        let status = exporter.export(&weak, 450, 800, ExportFormat::Png).await;
        assert_eq!(status, ExportStatus::NotMounted);
        assert!(sink.take().is_empty());
    }

    #[tokio::test]
    async fn rasterizer_failure_is_reported() {
        let exporter = Exporter::new(Arc::new(FailingRasterizer), Arc::new(MemorySink::new()));
        let node = mounted();

        let status = exporter
            .export(&Arc::downgrade(&node), 450, 800, ExportFormat::Jpeg)
            .await;
        assert!(matches!(status, ExportStatus::Failed(ref reason) if reason.contains("no surface")));
        assert!(!exporter.is_busy());
    }

    #[tokio::test]
    async fn sink_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(DirectorySink::new(dir.path().join("missing")));
        let exporter = Exporter::new(Arc::new(SolidRasterizer), sink);
        let node = mounted();

        let status = exporter
            .export(&Arc::downgrade(&node), 450, 800, ExportFormat::Png)
            .await;
        assert!(matches!(status, ExportStatus::Failed(_)));
    }

    #[tokio::test]
    async fn directory_sink_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(
            Arc::new(SolidRasterizer),
            Arc::new(DirectorySink::new(dir.path())),
        );
        let node = mounted();

        let status = exporter
            .export(&Arc::downgrade(&node), 450, 800, ExportFormat::Jpeg)
            .await;
        let ExportStatus::Completed(image) = status else {
            panic!("expected completion, got {status:?}");
        };
        let written = fs::read(dir.path().join(&image.file_name)).unwrap();
        assert_eq!(written.len(), image.byte_len);
        assert_eq!(&written[..2], &[0xff, 0xd8]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn second_export_while_busy() {
        let (rasterizer, started, release) = gated();
        let exporter = Arc::new(Exporter::new(Arc::new(rasterizer), Arc::new(MemorySink::new())));
        let node = mounted();
        let weak = Arc::downgrade(&node);

        let first = {
            let exporter = Arc::clone(&exporter);
            let weak = weak.clone();
            tokio::spawn(async move { exporter.export(&weak, 450, 800, ExportFormat::Png).await })
        };

        tokio::task::spawn_blocking(move || started.recv().unwrap())
            .await
            .unwrap();
        assert!(exporter.is_busy());
        assert_eq!(
            exporter.export(&weak, 450, 800, ExportFormat::Png).await,
            ExportStatus::Busy
        );

        release.send(()).unwrap();
        assert!(first.await.unwrap().is_completed());
        assert!(!exporter.is_busy());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn unmount_during_capture() {
        let (rasterizer, started, release) = gated();
        let sink = Arc::new(MemorySink::new());
        let exporter = Arc::new(Exporter::new(Arc::new(rasterizer), sink.clone()));
        let node = mounted();
        let weak = Arc::downgrade(&node);

        let pending = {
            let exporter = Arc::clone(&exporter);
            tokio::spawn(async move { exporter.export(&weak, 450, 800, ExportFormat::Png).await })
        };

        tokio::task::spawn_blocking(move || started.recv().unwrap())
            .await
            .unwrap();
        drop(node);
        release.send(()).unwrap();

        assert_eq!(pending.await.unwrap(), ExportStatus::NotMounted);
        assert!(sink.take().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn edit_during_capture_completes() {
        let (rasterizer, started, release) = gated();
        let sink = Arc::new(MemorySink::new());
        let exporter = Arc::new(Exporter::new(Arc::new(rasterizer), sink.clone()));
        let mut editor = DesignEditor::default();
        let handle = editor.mount();

        let pending = {
            let exporter = Arc::clone(&exporter);
            let handle = handle.clone();
            tokio::spawn(async move { exporter.export(&handle, 450, 800, ExportFormat::Png).await })
        };

        tokio::task::spawn_blocking(move || started.recv().unwrap())
            .await
            .unwrap();
        assert!(editor.edit(DesignEdit::Title("Updated mid-capture".into())));
        release.send(()).unwrap();

        assert!(pending.await.unwrap().is_completed());
        assert_eq!(sink.take().len(), 1);
        assert!(editor.is_mounted());
        let current = handle.upgrade().unwrap().current();
        assert!(current.svg.contains("Updated mid-capture"));
    }
}
