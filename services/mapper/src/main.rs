//! ShakeMap mapper.
//!
//! Renders the intensity and contour maps of one processed event.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use mapper::{EventInputs, MapComposer, MappingConfig};

#[derive(Parser, Debug)]
#[command(name = "shakemap-mapper")]
#[command(about = "Render ShakeMap intensity and contour maps")]
struct Args {
    /// Event products directory (info.json, stationlist.json, grids)
    #[arg(short, long)]
    products: PathBuf,

    /// Mapping configuration file
    #[arg(short, long, env = "SHAKEMAP_MAPPING_CONFIG", default_value = "config/mapping.yaml")]
    config: PathBuf,

    /// Output directory (defaults to the products directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(args: &Args) -> Result<()> {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder().with_max_level(level);
    if args.json_logs {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args)?;

    let config = MappingConfig::from_file(&args.config)
        .with_context(|| format!("loading mapping config {}", args.config.display()))?;

    let inputs = EventInputs::load(&args.products, &config.imts, config.topography_path())
        .with_context(|| format!("reading event products in {}", args.products.display()))?;

    let output_dir = args.output.clone().unwrap_or_else(|| args.products.clone());
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("creating output directory {}", output_dir.display()))?;

    info!(
        event_id = %inputs.info.event_id,
        output = %output_dir.display(),
        "Starting map session"
    );

    let composer = MapComposer::new(config, inputs, &output_dir).context("setting up map session")?;
    let written = composer.render_all().context("rendering maps")?;

    for path in &written {
        info!(path = %path.display(), "Wrote map product");
    }
    Ok(())
}
