//! filmsim - apply film looks (3D LUT + grain) to images
//!
//! Entry point and command dispatch.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use filmsim_color::{load_lut, write_cube, GrainStyle, LutSource};
use filmsim_render::{ExportRequest, RenderConfig, Renderer};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod io;

#[derive(Parser)]
#[command(name = "filmsim")]
#[command(author, version, about = "Film simulation: 3D LUTs and grain")]
#[command(long_about = "
Apply film looks to images.

Examples:
  filmsim apply --lut portra.cube --input in.jpg --output out.png
  filmsim apply --lut look.png --input in.jpg --output out.jpg --intensity 0.6 --grain-style fine
  filmsim info look.MS-LUT
  filmsim convert look.bin look.cube
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render an image through a LUT and grain
    Apply(ApplyArgs),

    /// Show a LUT's format, size and title
    Info(InfoArgs),

    /// Re-encode any supported LUT as .cube
    Convert(ConvertArgs),
}

#[derive(Args)]
struct ApplyArgs {
    /// LUT file (.cube, raw float, tiled image, MS-LUT)
    #[arg(short, long)]
    lut: PathBuf,

    /// Input image
    #[arg(short, long)]
    input: PathBuf,

    /// Output image
    #[arg(short, long)]
    output: PathBuf,

    /// LUT intensity in [0, 1]
    #[arg(long)]
    intensity: Option<f32>,

    /// Grain style: fine, medium or coarse (enables grain)
    #[arg(long)]
    grain_style: Option<String>,

    /// Grain intensity (enables grain)
    #[arg(long)]
    grain_intensity: Option<f32>,

    /// Grain scale in pixels per texel (enables grain)
    #[arg(long)]
    grain_scale: Option<f32>,

    /// Render on the CPU only
    #[arg(long)]
    cpu: bool,

    /// JSON render configuration
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct InfoArgs {
    /// LUT file
    lut: PathBuf,
}

#[derive(Args)]
struct ConvertArgs {
    /// LUT file in any supported format
    input: PathBuf,

    /// Output .cube file
    output: PathBuf,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    match cli.command {
        Commands::Apply(args) => apply(args),
        Commands::Info(args) => lut_info(&args.lut),
        Commands::Convert(args) => convert(&args.input, &args.output),
    }
}

/// Layer command-line overrides over the configuration file.
fn render_config(args: &ApplyArgs) -> Result<RenderConfig> {
    let mut config = match &args.config {
        Some(path) => RenderConfig::load(path)?,
        None => RenderConfig::default(),
    };
    if let Some(intensity) = args.intensity {
        config.intensity = intensity;
    }
    if let Some(style) = &args.grain_style {
        config.grain.style = GrainStyle::from_key(style);
        config.grain.enabled = true;
    }
    if let Some(intensity) = args.grain_intensity {
        config.grain.intensity = intensity;
        config.grain.enabled = true;
    }
    if let Some(scale) = args.grain_scale {
        config.grain.scale = scale;
        config.grain.enabled = true;
    }
    if args.cpu {
        config.gpu_enabled = false;
    }
    config.validate()?;
    Ok(config)
}

fn apply(args: ApplyArgs) -> Result<()> {
    let config = render_config(&args)?;
    let lut = load_lut(&args.lut).with_context(|| format!("cannot load {}", args.lut.display()))?;
    let source = io::load_image(&args.input)?;
    info!(
        lut = lut.size(),
        width = source.width(),
        height = source.height(),
        "applying look"
    );

    let request = ExportRequest::new(Arc::new(source))
        .with_lut(Arc::new(lut), config.intensity)
        .with_grain(config.grain);
    let renderer = Renderer::new(config)?;
    let output = renderer.export(request)?;
    io::save_image(&args.output, &output)?;
    info!(path = %args.output.display(), "written");
    Ok(())
}

fn lut_info(path: &Path) -> Result<()> {
    let bytes = std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    let source = LutSource::detect(path, bytes)?;
    let format = source.format_name();
    let lut = source.parse()?;
    println!("{}", path.display());
    println!("  format: {}", format);
    println!("  size:   {}x{}x{}", lut.size(), lut.size(), lut.size());
    if let Some(title) = lut.title() {
        println!("  title:  {}", title);
    }
    Ok(())
}

fn convert(input: &Path, output: &Path) -> Result<()> {
    let lut = load_lut(input).with_context(|| format!("cannot load {}", input.display()))?;
    let title = lut
        .title()
        .map(str::to_owned)
        .or_else(|| input.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "filmsim".into());
    std::fs::write(output, write_cube(&lut, &title))
        .with_context(|| format!("cannot write {}", output.display()))?;
    info!(size = lut.size(), path = %output.display(), "converted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_grain_flags_enable_grain() {
        let cli = Cli::parse_from([
            "filmsim", "apply", "--lut", "a.cube", "--input", "in.png", "--output", "out.png",
            "--grain-style", "coarse", "--cpu",
        ]);
        let Commands::Apply(args) = cli.command else {
            panic!("expected apply");
        };
        let config = render_config(&args).unwrap();
        assert!(config.grain.enabled);
        assert_eq!(config.grain.style, GrainStyle::Coarse);
        assert!(!config.gpu_enabled);
    }

    #[test]
    fn test_convert_writes_cube() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("look.cube");
        let lut = filmsim_color::LutGrid::identity(4).unwrap();
        std::fs::write(&input, write_cube(&lut, "Look")).unwrap();
        let output = dir.path().join("out.cube");
        convert(&input, &output).unwrap();
        assert_eq!(load_lut(&output).unwrap().size(), 4);
    }
}
