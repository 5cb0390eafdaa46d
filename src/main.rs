//! Site Showcase command line
//!
//! Loads configuration, initializes logging and dispatches to the capture
//! pipeline or one of the read-only catalog commands.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};

use site_showcase::application::{CatalogAudit, CatalogLoader, CatalogReader};
use site_showcase::capture::{CapturePipeline, SessionFactory, generate_missing_fallbacks};
use site_showcase::domain::{CaptureMode, CatalogEntry};
use site_showcase::infrastructure::config::parse_slug_list;
use site_showcase::infrastructure::{
    AppConfig, ArtifactStore, CaptureOverrides, ChromiumSessionFactory, ConfigManager,
    init_logging_with_config,
};

#[derive(Parser)]
#[command(name = "site-showcase")]
#[command(about = "Catalog ingestion and screenshot capture for a website showcase")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture previews for every catalog entry lacking one
    Capture(CaptureArgs),

    /// Generate fallback cards for entries without a usable hero
    Fallbacks,

    /// Print the artifact coverage report as JSON
    Audit,

    /// Print the visible catalog in display order as JSON
    Catalog {
        /// Order equal names by completeness score
        #[arg(long)]
        score_tiebreak: bool,
    },

    /// Write the default configuration file
    InitConfig,
}

#[derive(Args)]
struct CaptureArgs {
    /// Artifact to produce (hero, full)
    #[arg(short, long, default_value = "hero")]
    mode: CaptureMode,

    /// Jobs per batch
    #[arg(long)]
    concurrency: Option<usize>,

    /// Per-attempt navigation timeout
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Retries after the first attempt
    #[arg(long)]
    retries: Option<u32>,

    /// Full-page height cap in pixels
    #[arg(long)]
    max_height: Option<u32>,

    /// Comma-separated slug allow-list
    #[arg(long)]
    include_slugs: Option<String>,

    /// Cap on selected entries
    #[arg(long)]
    max_sites: Option<usize>,
}

impl CaptureArgs {
    fn overrides(&self) -> CaptureOverrides {
        CaptureOverrides {
            concurrency: self.concurrency,
            timeout_ms: self.timeout_ms,
            retries: self.retries,
            max_height: self.max_height,
            include_slugs: self.include_slugs.as_deref().map(parse_slug_list),
            max_sites: self.max_sites,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new()?,
    };

    if matches!(cli.command, Commands::InitConfig) {
        init_logging_with_config(&AppConfig::default().logging)?;
        manager.initialize_on_first_run().await?;
        println!("{}", manager.config_path().display());
        return Ok(());
    }

    let mut config = manager.load_config().await?;
    if let Commands::Capture(args) = &cli.command {
        args.overrides().apply(&mut config.capture);
        config.validate().context("Invalid command line overrides")?;
    }
    init_logging_with_config(&config.logging)?;

    match cli.command {
        Commands::Capture(args) => capture(&config, args.mode).await,
        Commands::Fallbacks => fallbacks(&config).await,
        Commands::Audit => audit(&config),
        Commands::Catalog { score_tiebreak } => catalog(&config, score_tiebreak),
        Commands::InitConfig => Ok(()),
    }
}

fn load_catalog(config: &AppConfig) -> Result<Vec<CatalogEntry>> {
    let (entries, _) = CatalogLoader::from_config(&config.capture)
        .load_file(&config.paths.catalog_csv)
        .context("Failed to load catalog")?;
    Ok(entries)
}

async fn capture(config: &AppConfig, mode: CaptureMode) -> Result<()> {
    let entries = load_catalog(config)?;

    let factory = Arc::new(
        ChromiumSessionFactory::launch(&config.capture)
            .await
            .context("Failed to launch browser")?,
    );
    let sessions: Arc<dyn SessionFactory> = factory.clone();
    let pipeline = CapturePipeline::new(sessions, &config.paths, &config.capture, mode);
    let outcome = pipeline.run(&entries).await;

    drop(pipeline);
    match Arc::try_unwrap(factory) {
        Ok(factory) => factory.shutdown().await,
        Err(_) => info!("Browser still referenced; leaving shutdown to drop"),
    }

    let summary = outcome.context("Capture run aborted")?;
    println!("{summary}");
    Ok(())
}

async fn fallbacks(config: &AppConfig) -> Result<()> {
    let entries = load_catalog(config)?;
    let store = ArtifactStore::from_config(&config.paths, &config.capture);
    let written = generate_missing_fallbacks(&entries, &store).await?;
    println!("Generated {written} fallbacks");
    Ok(())
}

fn audit(config: &AppConfig) -> Result<()> {
    let entries = load_catalog(config)?;
    let store = ArtifactStore::from_config(&config.paths, &config.capture);
    let report = CatalogAudit::run(&entries, &store);
    info!("📊 Hero coverage: {:.1}%", report.hero_coverage_percent());
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn catalog(config: &AppConfig, score_tiebreak: bool) -> Result<()> {
    let store = ArtifactStore::from_config(&config.paths, &config.capture);
    let reader = CatalogReader::new(CatalogLoader::from_config(&config.capture), store);
    let entries = reader
        .visible_entries(&config.paths.catalog_csv, score_tiebreak)
        .context("Failed to load catalog")?;
    println!("{}", serde_json::to_string_pretty(&reader.cards(&entries))?);
    Ok(())
}
