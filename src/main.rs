//! hellscore-renderer CLI - render a fundraising thermometer to an image.
//!
//! The design is assembled from, lowest to highest precedence: defaults,
//! a JSON design file, a query string, then individual `--set` edits.
//!
//! # Examples
//!
//! ```bash
//! # Default design, 2x PNG in the current directory
//! hellscore-renderer
//!
//! # Start from a shared link and tweak one field
//! hellscore-renderer --query "goal=5000&current=1200&theme=molten" --set title="Tour Fund"
//!
//! # JPEG into ./out, and print the resulting share query
//! hellscore-renderer --design card.json --format jpeg --quality 0.8 --out out --print-query
//! ```

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::Utc;
use clap::Parser;
use log::{debug, error};

use hellscore_renderer::{
    merge_query, Configurable, Design, DesignEditor, DesignField, DirectorySink, Error,
    ExportFormat, ExportSettings, ExportStatus, Exporter, ResvgRasterizer, Result,
    DEFAULT_BRAND,
};

/// Render a fundraising thermometer card to PNG, JPEG or SVG
#[derive(Parser, Debug)]
#[command(name = "hellscore-renderer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Design JSON file to start from
    #[arg(long, value_name = "FILE")]
    design: Option<PathBuf>,

    /// Query string to apply on top of the design (a leading `?` is fine)
    #[arg(long, value_name = "QS")]
    query: Option<String>,

    /// Set one field, e.g. `--set current=1500` (repeatable)
    #[arg(long = "set", value_name = "FIELD=VALUE")]
    set: Vec<String>,

    /// Output format
    #[arg(long, default_value = "png")]
    format: ExportFormat,

    /// JPEG quality between 0 and 1
    #[arg(long, default_value_t = 0.92)]
    quality: f32,

    /// Pixel density multiplier
    #[arg(long, default_value_t = 2.0)]
    supersample: f32,

    /// File name prefix
    #[arg(long, default_value = DEFAULT_BRAND)]
    brand: String,

    /// Output directory
    #[arg(long, default_value = ".")]
    out: PathBuf,

    /// Print the resolved design as a query string
    #[arg(long)]
    print_query: bool,

    /// Print the resolved design as JSON
    #[arg(long)]
    print_json: bool,

    /// Write the SVG document instead of a raster image
    #[arg(long)]
    svg: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut editor = build_editor(&cli)?;

    if cli.print_query {
        println!("?{}", editor.export_query());
    }
    if cli.print_json {
        println!("{}", editor.design().to_json_pretty()?);
    }

    let node = editor.mount();

    if cli.svg {
        let Some(preview) = editor.preview() else {
            return Ok(ExitCode::FAILURE);
        };
        let path = cli.out.join(format!(
            "{}-{}.svg",
            cli.brand,
            Utc::now().timestamp_millis()
        ));
        fs::write(&path, &preview.svg)?;
        println!("{}", path.display());
        return Ok(ExitCode::SUCCESS);
    }

    let settings = ExportSettings {
        quality: cli.quality,
        supersample: cli.supersample,
        brand: cli.brand.clone(),
    };
    let exporter = Exporter::with_settings(
        Arc::new(ResvgRasterizer::with_system_fonts()),
        Arc::new(DirectorySink::new(&cli.out)),
        settings,
    );

    let (width, height) = editor.design().dimensions();
    match exporter.export(&node, width, height, cli.format).await {
        ExportStatus::Completed(image) => {
            println!("{}", cli.out.join(&image.file_name).display());
            Ok(ExitCode::SUCCESS)
        }
        // already logged
        _ => Ok(ExitCode::FAILURE),
    }
}

fn build_editor(cli: &Cli) -> Result<DesignEditor> {
    let mut design = match &cli.design {
        Some(path) => {
            debug!("loading design from {}", path.display());
            let mut design = Design::from_json(&fs::read_to_string(path)?)?;
            design.normalize_size();
            design
        }
        None => Design::default(),
    };
    if let Some(query) = &cli.query {
        design = merge_query(&design, query);
    }

    let mut editor = DesignEditor::new(design);
    for assignment in &cli.set {
        let (name, value) = assignment.split_once('=').ok_or_else(|| Error::InvalidValue {
            field: "set",
            value: assignment.clone(),
        })?;
        let field: DesignField = name.trim().parse()?;
        editor.edit_raw(field, value)?;
    }
    Ok(editor)
}
