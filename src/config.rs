use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, anyhow};

pub const DEFAULT_PLATFORM_HOST: &str = "na1.api.riotgames.com";
pub const DEFAULT_REGION_HOST: &str = "americas.api.riotgames.com";
pub const DEFAULT_DATA_CSV: &str = "tft_match_data.csv";
pub const DEFAULT_CLEAN_CSV: &str = "tft_match_data_clean.csv";
pub const DEFAULT_MODEL_PATH: &str = "tft_kmeans_model.json";
pub const ROWS_PER_MATCH: usize = 8;

const DEFAULT_TARGET_MATCH_COUNT: usize = 2000;
const DEFAULT_MATCHES_PER_PLAYER: u32 = 20;
const DEFAULT_BATCH_SIZE: usize = 50;
const DEFAULT_REQUEST_SPACING_MS: u64 = 1200;
const DEFAULT_RATE_LIMIT_BACKOFF_SECS: u64 = 10;
const DEFAULT_RATE_LIMIT_RETRIES: u32 = 3;
const DEFAULT_CLUSTERS: usize = 5;
const DEFAULT_SEED: u64 = 42;

pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_key: String,
    pub platform_host: String,
    pub region_host: String,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self> {
        let api_key = opt_env("RIOT_API_KEY")
            .or_else(|| opt_env("TFT_API_KEY"))
            .ok_or_else(|| anyhow!("RIOT_API_KEY (or TFT_API_KEY) is not set"))?;
        Ok(Self {
            api_key: api_key.trim().to_string(),
            platform_host: opt_env("TFT_PLATFORM_HOST")
                .unwrap_or_else(|| DEFAULT_PLATFORM_HOST.to_string()),
            region_host: opt_env("TFT_REGION_HOST")
                .unwrap_or_else(|| DEFAULT_REGION_HOST.to_string()),
        })
    }
}

#[derive(Debug, Clone)]
pub struct CollectConfig {
    pub tiers: Vec<String>,
    pub target_match_count: usize,
    pub matches_per_player: u32,
    pub batch_size: usize,
    pub request_spacing: Duration,
    pub rate_limit_backoff: Duration,
    pub rate_limit_retries: u32,
    pub data_csv: PathBuf,
    pub clean_csv: PathBuf,
}

impl CollectConfig {
    pub fn from_env() -> Self {
        let tiers = opt_env("TFT_TIERS")
            .map(|raw| parse_tiers(&raw))
            .filter(|tiers| !tiers.is_empty())
            .unwrap_or_else(|| vec!["master".to_string()]);
        Self {
            tiers,
            target_match_count: env_parse("TFT_TARGET_MATCH_COUNT", DEFAULT_TARGET_MATCH_COUNT),
            matches_per_player: env_parse("TFT_MATCHES_PER_PLAYER", DEFAULT_MATCHES_PER_PLAYER)
                .clamp(1, 200),
            batch_size: env_parse("TFT_BATCH_SIZE", DEFAULT_BATCH_SIZE).max(1),
            request_spacing: Duration::from_millis(env_parse(
                "TFT_REQUEST_SPACING_MS",
                DEFAULT_REQUEST_SPACING_MS,
            )),
            rate_limit_backoff: Duration::from_secs(env_parse(
                "TFT_RATE_LIMIT_BACKOFF_SECS",
                DEFAULT_RATE_LIMIT_BACKOFF_SECS,
            )),
            rate_limit_retries: env_parse("TFT_RATE_LIMIT_RETRIES", DEFAULT_RATE_LIMIT_RETRIES)
                .max(1),
            data_csv: data_csv_path(),
            clean_csv: clean_csv_path(),
        }
    }

    pub fn flush_threshold(&self) -> usize {
        self.batch_size.saturating_mul(ROWS_PER_MATCH).max(1)
    }
}

#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub clusters: usize,
    pub seed: u64,
    pub model_path: PathBuf,
    pub data_csv: PathBuf,
    pub clean_csv: PathBuf,
}

impl TrainConfig {
    pub fn from_env() -> Self {
        Self {
            clusters: env_parse("TFT_CLUSTERS", DEFAULT_CLUSTERS).max(1),
            seed: env_parse("TFT_SEED", DEFAULT_SEED),
            model_path: opt_env("TFT_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH)),
            data_csv: data_csv_path(),
            clean_csv: clean_csv_path(),
        }
    }

    /// Clean table when present, raw table otherwise.
    pub fn input_path(&self) -> PathBuf {
        if self.clean_csv.exists() {
            self.clean_csv.clone()
        } else {
            self.data_csv.clone()
        }
    }
}

pub fn data_csv_path() -> PathBuf {
    opt_env("TFT_DATA_CSV")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_CSV))
}

pub fn clean_csv_path() -> PathBuf {
    opt_env("TFT_CLEAN_CSV")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CLEAN_CSV))
}

pub fn fetch_parallelism() -> usize {
    env_parse("FETCH_PARALLELISM", 6_usize).clamp(2, 32)
}

pub fn parse_tiers(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for part in raw.split([',', ';', ' ']) {
        let tier = part.trim().to_ascii_lowercase();
        if !tier.is_empty() && !out.contains(&tier) {
            out.push(tier);
        }
    }
    out
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    opt_env(key)
        .and_then(|val| val.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn opt_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .and_then(|val| if val.trim().is_empty() { None } else { Some(val) })
}
