//! Coin Filter CLI and Daemon Binary
//!
//! Entry point for the coin filter. It can run the refresh daemon, answer a
//! one-off filter or ranking query against live data, and initialize or
//! validate configuration files.

use anyhow::{Context, Result};
use cli::{normalize_limit, Cli, Commands, OutputFormat};
use config::{
    generate_default_config, load_config, load_or_default, save_config, validate_config,
    CoinFilterConfig,
};
use exchange::BinanceClient;
use market_data::{Admission, CoinFilter};
use observability::{init_logging, init_metrics, LogFormat};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    match cli.command {
        Commands::Start { config } => start_command(config).await,
        Commands::Filter {
            config,
            limit,
            explain,
            format,
            symbols,
        } => filter_command(config, limit, explain, format, symbols).await,
        Commands::Top {
            config,
            limit,
            format,
        } => top_command(config, limit, format).await,
        Commands::Validate { config } => {
            init_logging("coinfilter", LogFormat::Pretty)?;
            validate_command(config)
        }
        Commands::Init { output } => {
            init_logging("coinfilter", LogFormat::Pretty)?;
            init_command(output)
        }
    }
}

/// Load configuration, bring up logging, and refuse to continue on errors
fn prepare(config_path: Option<PathBuf>) -> Result<CoinFilterConfig> {
    let config = load_or_default(config_path.as_deref())?;

    let format = LogFormat::parse(&config.logging.format).unwrap_or_default();
    init_logging("coinfilter", format)?;
    debug!(?config_path, "Configuration loaded");

    let report = validate_config(&config);
    for warning in &report.warnings {
        warn!(field = %warning.field, message = %warning.message, "Configuration warning");
    }
    if !report.is_valid() {
        for err in &report.errors {
            error!("{}", err);
        }
        anyhow::bail!(
            "Configuration has {} error(s); run 'coinfilter validate' for details",
            report.errors.len()
        );
    }

    Ok(config)
}

fn build_service(config: &CoinFilterConfig) -> Result<CoinFilter> {
    let client = BinanceClient::from_config(&config.exchange)
        .context("Failed to build exchange client")?;
    Ok(CoinFilter::new(config, Arc::new(client)))
}

async fn start_command(config_path: Option<PathBuf>) -> Result<()> {
    let config = prepare(config_path)?;

    if let Some(port) = config.monitoring.metrics_port {
        init_metrics(port)?;
    }

    let service = build_service(&config)?;
    info!(
        interval_secs = config.refresh.interval_seconds,
        base_url = %config.exchange.base_url,
        listings = service.stats().listings,
        "Coin filter daemon starting"
    );

    let handle = service.start(CancellationToken::new());

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, initiating graceful shutdown..."),
        Err(e) => warn!("Failed to listen for Ctrl+C: {}", e),
    }

    // Any cycle in flight finishes and publishes before this returns
    handle.shutdown().await?;

    let stats = service.stats();
    info!(
        generation = stats.generation,
        listings = stats.listings,
        "Coin filter daemon stopped"
    );
    Ok(())
}

async fn filter_command(
    config_path: Option<PathBuf>,
    limit: i64,
    explain: bool,
    format: OutputFormat,
    symbols: Vec<String>,
) -> Result<()> {
    let config = prepare(config_path)?;
    let service = build_service(&config)?;

    let report = service.refresh_now().await?;
    debug!(?report, "Refresh finished");

    if explain {
        return print_verdicts(&service.explain(&symbols), format);
    }

    let clean = service.get_clean_coins(&symbols, normalize_limit(limit));
    print_symbols(&clean, format)
}

async fn top_command(config_path: Option<PathBuf>, limit: i64, format: OutputFormat) -> Result<()> {
    let config = prepare(config_path)?;
    let service = build_service(&config)?;

    service.refresh_now().await?;

    let top = service.get_top_volume_coins(normalize_limit(limit));
    print_symbols(&top, format)
}

fn print_symbols(symbols: &[String], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for symbol in symbols {
                println!("{}", symbol);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(symbols)?),
    }
    Ok(())
}

fn print_verdicts(verdicts: &[(String, Admission)], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for (symbol, verdict) in verdicts {
                let mark = if verdict.is_admitted() { "ok" } else { "--" };
                println!("  [{}] {:<16} {}", mark, symbol, verdict);
            }
        }
        OutputFormat::Json => {
            let rows: Vec<_> = verdicts
                .iter()
                .map(|(symbol, verdict)| {
                    serde_json::json!({
                        "symbol": symbol,
                        "admitted": verdict.is_admitted(),
                        "verdict": verdict.as_str(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }
    Ok(())
}

fn validate_command<P: AsRef<Path>>(config_path: P) -> Result<()> {
    info!(path = ?config_path.as_ref(), "Validating configuration");

    let config = match load_config(&config_path) {
        Ok(c) => c,
        Err(e) => {
            error!(%e, "Failed to load configuration");
            anyhow::bail!(e);
        }
    };

    let report = validate_config(&config);

    println!("\n=== Configuration Validation Report ===\n");

    if !report.warnings.is_empty() {
        println!("Warnings ({}):", report.warnings.len());
        for warning in &report.warnings {
            println!("  [warn] [{}] {}", warning.field, warning.message);
        }
        println!();
    }

    if !report.errors.is_empty() {
        println!("Errors ({}):", report.errors.len());
        for err in &report.errors {
            println!("  [error] {}", err);
        }
        println!();
        anyhow::bail!("Configuration validation failed");
    }

    println!("[ok] Configuration is valid!");
    println!();
    println!("Exchange: {}", config.exchange.base_url);
    println!(
        "Thresholds: {} days listed, {} 24h quote volume, {} open interest ({})",
        config.filter.min_listing_days,
        config.filter.min_quote_volume,
        config.filter.min_open_interest,
        config.filter.quote_asset
    );
    println!("Refresh every: {}s", config.refresh.interval_seconds);
    println!(
        "Listing cache: {}",
        config.persistence.listing_cache_path.display()
    );

    Ok(())
}

fn init_command<P: AsRef<Path>>(output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();
    info!(?output_path, "Initializing new configuration file");

    let config = generate_default_config();

    save_config(&config, output_path)
        .with_context(|| format!("Failed to write configuration to {:?}", output_path))?;

    println!("[ok] Configuration file created successfully!");
    println!();
    println!("Location: {:?}", output_path);
    println!();
    println!("Next steps:");
    println!("  1. Edit the thresholds and refresh interval to taste");
    println!(
        "  2. Run 'coinfilter validate --config {:?}' to check configuration",
        output_path
    );
    println!(
        "  3. Run 'coinfilter start --config {:?}' to start the daemon",
        output_path
    );

    Ok(())
}
