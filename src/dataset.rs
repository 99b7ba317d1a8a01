use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use tracing::{info, warn};

use crate::cluster::PlaystyleSample;
use crate::model::FeatureRow;

pub const FEATURE_COLUMNS: [&str; 11] = [
    "match_id",
    "puuid",
    "placement",
    "level",
    "gold_left",
    "last_round",
    "time_eliminated",
    "total_damage",
    "board_value",
    "three_star_count",
    "carry_unit_cost",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupSummary {
    pub rows_before: usize,
    pub rows_after: usize,
}

/// Match IDs already present in the raw table. Unreadable tables start fresh.
pub fn load_existing_match_ids(path: &Path) -> HashSet<String> {
    if !path.exists() {
        return HashSet::new();
    }
    info!("found existing {}, loading match ids", path.display());
    match read_match_id_column(path) {
        Ok(ids) => {
            info!("resuming with {} unique matches", ids.len());
            ids
        }
        Err(err) => {
            warn!("{} seems empty or corrupted ({err:#}), starting fresh", path.display());
            HashSet::new()
        }
    }
}

fn read_match_id_column(path: &Path) -> Result<HashSet<String>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("open {}", path.display()))?;
    let headers = reader.headers().context("read csv header")?.clone();
    let idx = column_index(&headers, "match_id")?;
    let mut ids = HashSet::new();
    for record in reader.records() {
        let record = record.context("read csv record")?;
        if let Some(id) = record.get(idx).filter(|id| !id.is_empty()) {
            ids.insert(id.to_string());
        }
    }
    Ok(ids)
}

pub struct BatchWriter {
    path: PathBuf,
    flush_threshold: usize,
    pending: Vec<FeatureRow>,
    rows_written: usize,
}

impl BatchWriter {
    pub fn new(path: impl Into<PathBuf>, flush_threshold: usize) -> Self {
        Self {
            path: path.into(),
            flush_threshold: flush_threshold.max(1),
            pending: Vec::new(),
            rows_written: 0,
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn push(&mut self, rows: Vec<FeatureRow>) -> Result<usize> {
        self.pending.extend(rows);
        if self.pending.len() >= self.flush_threshold {
            return self.flush();
        }
        Ok(0)
    }

    pub fn flush(&mut self) -> Result<usize> {
        if self.pending.is_empty() {
            return Ok(0);
        }
        let count = append_rows(&self.path, &self.pending)?;
        self.pending.clear();
        self.rows_written += count;
        Ok(count)
    }
}

pub fn append_rows(path: &Path, rows: &[FeatureRow]) -> Result<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create {}", parent.display()))?;
    }
    let needs_header = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open {} for append", path.display()))?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);
    for row in rows {
        writer.serialize(row).context("write feature row")?;
    }
    writer.flush().context("flush csv")?;
    Ok(rows.len())
}

/// Copies `input` to `output` keeping the first row per `(match_id, puuid)`.
pub fn dedup_csv(input: &Path, output: &Path) -> Result<DedupSummary> {
    let mut reader = csv::Reader::from_path(input)
        .with_context(|| format!("open {}", input.display()))?;
    let headers = reader.headers().context("read csv header")?.clone();
    let match_idx = column_index(&headers, "match_id")?;
    let puuid_idx = column_index(&headers, "puuid")?;

    let tmp = output.with_extension("csv.tmp");
    let mut writer = csv::Writer::from_path(&tmp)
        .with_context(|| format!("create {}", tmp.display()))?;
    writer.write_record(&headers).context("write csv header")?;

    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut summary = DedupSummary {
        rows_before: 0,
        rows_after: 0,
    };
    for record in reader.records() {
        let record = record.context("read csv record")?;
        summary.rows_before += 1;
        let key = (
            record.get(match_idx).unwrap_or_default().to_string(),
            record.get(puuid_idx).unwrap_or_default().to_string(),
        );
        if !seen.insert(key) {
            continue;
        }
        writer.write_record(&record).context("write csv record")?;
        summary.rows_after += 1;
    }
    writer.flush().context("flush csv")?;
    drop(writer);
    fs::rename(&tmp, output).with_context(|| format!("replace {}", output.display()))?;
    Ok(summary)
}

pub fn read_feature_rows(path: &Path) -> Result<Vec<FeatureRow>> {
    read_all(path)
}

/// Playstyle columns only; blank or unparsable cells read as zero.
pub fn read_playstyle_samples(path: &Path) -> Result<Vec<PlaystyleSample>> {
    let rows: Vec<LenientRow> = read_all(path)?;
    Ok(rows.into_iter().map(LenientRow::into_sample).collect())
}

#[derive(Debug, Deserialize)]
struct LenientRow {
    #[serde(default, deserialize_with = "csv::invalid_option")]
    level: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    gold_left: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    board_value: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    three_star_count: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    carry_unit_cost: Option<f64>,
}

impl LenientRow {
    fn into_sample(self) -> PlaystyleSample {
        PlaystyleSample {
            values: [
                fill_zero(self.level),
                fill_zero(self.gold_left),
                fill_zero(self.board_value),
                fill_zero(self.three_star_count),
                fill_zero(self.carry_unit_cost),
            ],
        }
    }
}

fn fill_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn read_all<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("open {}", path.display()))?;
    let mut out = Vec::new();
    for (idx, record) in reader.deserialize::<T>().enumerate() {
        let row = record.with_context(|| format!("{} row {}", path.display(), idx + 1))?;
        out.push(row);
    }
    Ok(out)
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| anyhow!("missing `{name}` column"))
}
