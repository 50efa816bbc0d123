use anyhow::Context;
use clap::{Parser, ValueEnum};
use image::ImageReader;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use lightbars::detection::preprocessing::{self, ImageInfo};
use lightbars::{LightBarConfig, LightBarPipeline};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BlurKind {
    None,
    Mean,
    Gaussian,
}

#[derive(Parser)]
#[command(name = "lightbars")]
#[command(about = "Find red and blue light bars in an image")]
struct Cli {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// JSON configuration overriding the default thresholds
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write gray/blur/mask/result images to this directory (must be empty)
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// TrueType font for candidate labels, replacing the bundled one
    #[arg(long, value_name = "TTF")]
    font: Option<PathBuf>,

    /// Blur applied before colour masking
    #[arg(long, value_enum, default_value_t = BlurKind::None)]
    blur: BlurKind,

    /// Blur kernel size (positive, odd)
    #[arg(long, default_value_t = 5)]
    kernel: u32,

    /// Gaussian blur standard deviation
    #[arg(long, default_value_t = 1.0)]
    sigma: f32,

    /// Print image size and channel information
    #[arg(long)]
    info: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn prepare_output_dir(dir: &Path) -> anyhow::Result<()> {
    if dir.exists() {
        let entries = std::fs::read_dir(dir)?;
        if entries.count() > 0 {
            anyhow::bail!("Output directory is not empty: {}", dir.display());
        }
    } else {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_filter = if args.verbose { "lightbars=debug" } else { "lightbars=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let config = match &args.config {
        Some(path) => LightBarConfig::from_json_file(path)?,
        None => LightBarConfig::default(),
    };

    let mut pipeline = LightBarPipeline::from_config(&config)?;
    if let Some(font_path) = &args.font {
        let bytes = std::fs::read(font_path)
            .with_context(|| format!("Failed to read font {}", font_path.display()))?;
        let font = ab_glyph::FontArc::try_from_vec(bytes)
            .map_err(|e| anyhow::anyhow!("Failed to load font {}: {}", font_path.display(), e))?;
        pipeline = pipeline.with_font(font);
    }

    if let Some(dir) = &args.output_dir {
        prepare_output_dir(dir)?;
    }

    let img = ImageReader::open(&args.image_path)?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?
        .to_rgb8();

    if args.info {
        println!("=== Image Info ===");
        println!("Path: {}", args.image_path.display());
        println!("{}\n", ImageInfo::of(&img));
    }

    let gray = preprocessing::to_grayscale(&img);
    let blurred = match args.blur {
        BlurKind::None => None,
        BlurKind::Mean => Some(preprocessing::mean_blur(&img, args.kernel)?),
        BlurKind::Gaussian => Some(preprocessing::gaussian_blur(&img, args.kernel, args.sigma)?),
    };
    let input = blurred.as_ref().unwrap_or(&img);

    let detection = pipeline.detect(input)?;

    println!("\n=== Light Bar Detection Results ===");
    println!("Contours found: {}", detection.contour_count);
    println!("Light bars accepted: {}", detection.candidates.len());
    for summary in detection.summaries() {
        println!("  {}", summary);
    }

    if let Some(dir) = &args.output_dir {
        gray.save(dir.join("gray.png"))?;
        if let Some(blurred) = &blurred {
            blurred.save(dir.join("blur.png"))?;
        }
        detection.mask.as_gray().save(dir.join("mask.png"))?;
        detection.annotated.save(dir.join("result.png"))?;
        println!("\nResults saved to {}", dir.display());
    }

    Ok(())
}
