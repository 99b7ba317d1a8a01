use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use tft_playstyle::config;
use tft_playstyle::dataset::dedup_csv;
use tft_playstyle::logging::init_tracing;

/// Drop repeated (match_id, puuid) rows, keeping the first.
#[derive(Debug, Parser)]
#[command(name = "dedup")]
struct Args {
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    config::load_dotenv();
    let args = Args::parse();
    init_tracing(false);

    let input = args.input.unwrap_or_else(config::data_csv_path);
    let output = args.output.unwrap_or_else(config::clean_csv_path);
    let summary = dedup_csv(&input, &output)?;

    println!("Rows before cleaning: {}", summary.rows_before);
    println!("Rows after cleaning: {}", summary.rows_after);
    println!("Wrote {}", output.display());
    Ok(())
}
