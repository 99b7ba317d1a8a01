use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;

use crate::config::fetch_parallelism;
use crate::features::FeatureExtractor;
use crate::model::FeatureRow;
use crate::riot_api::parse_match_json;

pub struct LocalExtract {
    pub rows: Vec<FeatureRow>,
    pub matches: usize,
    pub skipped_existing: usize,
    pub errors: Vec<String>,
}

// Output keeps the order of `paths`.
pub fn extract_match_files(
    paths: &[PathBuf],
    extractor: &FeatureExtractor,
    existing: &HashSet<String>,
) -> LocalExtract {
    let results: Vec<Result<(String, Vec<FeatureRow>)>> = with_pool(|| {
        paths
            .par_iter()
            .map(|path| extract_file(path, extractor))
            .collect()
    });

    let mut out = LocalExtract {
        rows: Vec::new(),
        matches: 0,
        skipped_existing: 0,
        errors: Vec::new(),
    };
    let mut seen = HashSet::new();
    for (path, result) in paths.iter().zip(results) {
        match result {
            Ok((match_id, rows)) => {
                if existing.contains(&match_id) || !seen.insert(match_id) {
                    out.skipped_existing += 1;
                    continue;
                }
                out.matches += 1;
                out.rows.extend(rows);
            }
            Err(err) => out.errors.push(format!("{}: {err:#}", path.display())),
        }
    }
    out
}

fn extract_file(path: &Path, extractor: &FeatureExtractor) -> Result<(String, Vec<FeatureRow>)> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let mut record = parse_match_json(&raw).context("invalid match json")?;
    if record.metadata.match_id.is_empty() {
        record.metadata.match_id = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
    }
    let rows = extractor.extract_match(&record);
    Ok((record.metadata.match_id, rows))
}

fn with_pool<T>(action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    match rayon::ThreadPoolBuilder::new()
        .num_threads(fetch_parallelism())
        .build()
    {
        Ok(pool) => pool.install(action),
        Err(_) => action(),
    }
}
