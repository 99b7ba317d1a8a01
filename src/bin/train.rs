use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use tracing::info;

use tft_playstyle::cluster::{KMeans, fit_playstyles};
use tft_playstyle::config::{self, TrainConfig};
use tft_playstyle::dataset::read_playstyle_samples;
use tft_playstyle::logging::init_tracing;
use tft_playstyle::report::{render_report, summarize};

/// Standardize playstyle features, cluster them and save the model.
#[derive(Debug, Parser)]
#[command(name = "train")]
struct Args {
    /// Input table. Defaults to the clean table, then the raw one.
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long)]
    clusters: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    model: Option<PathBuf>,
}

fn main() -> Result<()> {
    config::load_dotenv();
    let args = Args::parse();
    init_tracing(false);

    let mut cfg = TrainConfig::from_env();
    if let Some(k) = args.clusters {
        cfg.clusters = k;
    }
    if let Some(seed) = args.seed {
        cfg.seed = seed;
    }
    if let Some(model) = args.model {
        cfg.model_path = model;
    }
    let input = args.input.unwrap_or_else(|| cfg.input_path());

    let samples = read_playstyle_samples(&input)?;
    if samples.is_empty() {
        bail!("{} has no rows", input.display());
    }
    println!("Training model on {} player games...", samples.len());

    let kmeans = KMeans::new(cfg.clusters, cfg.seed);
    let (model, labels) = fit_playstyles(&samples, &kmeans)?;
    info!(
        "k-means inertia {:.3} after {} iterations",
        model.inertia, model.iterations
    );

    println!();
    print!("{}", render_report(&summarize(&samples, &labels, model.clusters())));

    model.save(&cfg.model_path)?;
    println!();
    println!("Model saved to {}", cfg.model_path.display());
    Ok(())
}
