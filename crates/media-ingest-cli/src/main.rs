use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::atomic::Ordering;

use media_ingest_core::config::LogLevel;
use media_ingest_core::{logging, Config, MediaKind, MediaPipeline};

#[derive(Parser)]
#[command(name = "media-ingest")]
#[command(about = "Import staged media into a deduplicated catalog")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Write logs to rolling files in this directory instead of stderr
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Image,
    Video,
    All,
}

#[derive(Subcommand)]
enum Commands {
    /// Import staged files into the catalog
    Import {
        /// Which media kind to import
        #[arg(long, value_enum, default_value_t = KindArg::All)]
        kind: KindArg,
    },

    /// Report staged images that look like catalogued ones
    ScanDuplicates,

    /// Generate default configuration file
    GenerateConfig {
        /// Path to save configuration file
        #[arg(default_value = "media-ingest.json")]
        path: PathBuf,
    },
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    if let Commands::GenerateConfig { path } = &cli.command {
        Config::default().save_to_file(path)?;
        println!("Configuration file generated at: {}", path.display());
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Config::default(),
    };

    // Set log level based on verbosity
    config.log_level = match cli.verbose {
        0 => config.log_level,
        1 => LogLevel::Debug,
        _ => LogLevel::Trace,
    };
    init_logging(&cli, &config)?;

    let pipeline = MediaPipeline::new(config)?;

    let shutdown = pipeline.shutdown_flag();
    ctrlc::set_handler(move || {
        warn!("Interrupt received, finishing the current file");
        shutdown.store(true, Ordering::SeqCst);
    })
    .context("installing Ctrl-C handler")?;

    match cli.command {
        Commands::Import { kind } => {
            let reports = match kind {
                KindArg::Image => vec![pipeline.import(MediaKind::Image)?],
                KindArg::Video => vec![pipeline.import(MediaKind::Video)?],
                KindArg::All => pipeline.import_all()?,
            };
            for report in &reports {
                println!("{}", report);
            }
        }

        Commands::ScanDuplicates => {
            let report = pipeline.scan_duplicates()?;
            match &report.report_path {
                Some(path) => println!(
                    "{} near-duplicate pair(s) written to {}",
                    report.pairs.len(),
                    path.display()
                ),
                None => println!("No near-duplicates found"),
            }
            if report.failed > 0 {
                println!("{} file(s) could not be decoded", report.failed);
            }
        }

        Commands::GenerateConfig { .. } => {}
    }

    info!("Done");
    Ok(())
}

fn init_logging(cli: &Cli, config: &Config) -> anyhow::Result<()> {
    let level = config.log_level.to_level_filter();
    match &cli.log_dir {
        Some(dir) => logging::init_logger(dir, level)
            .map_err(|e| anyhow::anyhow!("initializing file logger: {}", e))?,
        None => env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(level.as_str()),
        )
        .init(),
    }
    Ok(())
}
