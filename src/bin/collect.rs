use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use tft_playstyle::collect::run_collection;
use tft_playstyle::config::{self, ApiConfig, CollectConfig};
use tft_playstyle::features::FeatureExtractor;
use tft_playstyle::logging::init_tracing;
use tft_playstyle::riot_api::RiotApi;

/// Pull ranked matches, derive feature rows and append them to the raw table.
#[derive(Debug, Parser)]
#[command(name = "collect")]
struct Args {
    /// Stop planning once stored + planned matches reach this count.
    #[arg(long)]
    target: Option<usize>,
    /// Ladder tiers to scan, comma separated.
    #[arg(long)]
    tiers: Option<String>,
    /// Matches per CSV append.
    #[arg(long)]
    batch_size: Option<usize>,
    /// Raw append-only table.
    #[arg(long)]
    data: Option<PathBuf>,
    /// De-duplicated output table.
    #[arg(long)]
    clean: Option<PathBuf>,
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    config::load_dotenv();
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut cfg = CollectConfig::from_env();
    if let Some(target) = args.target {
        cfg.target_match_count = target;
    }
    if let Some(raw) = args.tiers.as_deref() {
        let tiers = config::parse_tiers(raw);
        if !tiers.is_empty() {
            cfg.tiers = tiers;
        }
    }
    if let Some(batch) = args.batch_size {
        cfg.batch_size = batch.max(1);
    }
    if let Some(data) = args.data {
        cfg.data_csv = data;
    }
    if let Some(clean) = args.clean {
        cfg.clean_csv = clean;
    }

    let api = RiotApi::new(ApiConfig::from_env()?)?;
    let summary = run_collection(&api, &FeatureExtractor::default(), &cfg)?;

    info!(
        "collection done: {} processed, {} skipped, {} rows written",
        summary.matches_processed, summary.matches_skipped, summary.rows_written
    );
    if let Some(dedup) = summary.dedup {
        println!("Rows before cleaning: {}", dedup.rows_before);
        println!("Rows after cleaning: {}", dedup.rows_after);
    }
    if !summary.errors.is_empty() {
        println!("Errors: {}", summary.errors.len());
        for err in summary.errors.iter().take(8) {
            println!(" - {err}");
        }
    }
    println!("Data collection done.");
    Ok(())
}
