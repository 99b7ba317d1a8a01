use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use tracing::warn;

use tft_playstyle::config;
use tft_playstyle::dataset::{append_rows, load_existing_match_ids};
use tft_playstyle::features::FeatureExtractor;
use tft_playstyle::local_matches::extract_match_files;
use tft_playstyle::logging::init_tracing;

/// Derive feature rows from saved match-detail JSON files.
#[derive(Debug, Parser)]
#[command(name = "extract")]
struct Args {
    /// Match-detail JSON files.
    #[arg(required = true)]
    files: Vec<PathBuf>,
    /// Raw table to append to.
    #[arg(long)]
    data: Option<PathBuf>,
    /// Print rows as CSV instead of appending.
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    config::load_dotenv();
    let args = Args::parse();
    init_tracing(false);

    let data = args.data.unwrap_or_else(config::data_csv_path);
    let existing = load_existing_match_ids(&data);
    let out = extract_match_files(&args.files, &FeatureExtractor::default(), &existing);
    for err in &out.errors {
        warn!("{err}");
    }
    if out.matches == 0 && !out.errors.is_empty() {
        bail!("no match file could be read");
    }

    if args.dry_run {
        let mut writer = csv::Writer::from_writer(std::io::stdout());
        for row in &out.rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        return Ok(());
    }

    let written = append_rows(&data, &out.rows)?;
    println!(
        "Extracted {} matches ({} already stored), appended {} rows to {}",
        out.matches,
        out.skipped_existing,
        written,
        data.display()
    );
    Ok(())
}
