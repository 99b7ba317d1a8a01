use std::collections::HashSet;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use crate::config::CollectConfig;
use crate::dataset::{BatchWriter, DedupSummary, dedup_csv, load_existing_match_ids};
use crate::error::FetchError;
use crate::features::FeatureExtractor;
use crate::model::MatchRecord;
use crate::riot_api::MatchSource;

const PROGRESS_EVERY_PLAYERS: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectSummary {
    pub existing_matches: usize,
    pub players_listed: usize,
    pub players_scanned: usize,
    pub matches_planned: usize,
    pub matches_processed: usize,
    pub matches_skipped: usize,
    pub rows_written: usize,
    pub dedup: Option<DedupSummary>,
    pub errors: Vec<String>,
}

#[derive(Debug, Default)]
struct PlannedMatches {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl PlannedMatches {
    fn insert(&mut self, id: String) {
        if self.seen.insert(id.clone()) {
            self.order.push(id);
        }
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

pub fn run_collection(
    source: &impl MatchSource,
    extractor: &FeatureExtractor,
    cfg: &CollectConfig,
) -> Result<CollectSummary> {
    let mut summary = CollectSummary::default();

    let existing = load_existing_match_ids(&cfg.data_csv);
    summary.existing_matches = existing.len();

    let puuids = list_players(source, cfg, &mut summary);
    let planned = plan_matches(source, cfg, &existing, &puuids, &mut summary);
    summary.matches_planned = planned.len();
    info!("ready to download {} new matches", planned.len());

    let mut writer = BatchWriter::new(&cfg.data_csv, cfg.flush_threshold());
    let total = planned.len();
    for (idx, match_id) in planned.order.iter().enumerate() {
        match fetch_with_retry(source, match_id, cfg) {
            Ok(record) => {
                let rows = extractor.extract_participants(match_id, &record.info.participants);
                summary.matches_processed += 1;
                info!("[{}/{}] processed {}", idx + 1, total, match_id);
                if writer.push(rows)? > 0 {
                    info!("saved batch to {}", cfg.data_csv.display());
                }
            }
            Err(err) => {
                summary.matches_skipped += 1;
                warn!("failed {match_id}: {err}");
                summary.errors.push(format!("{match_id}: {err}"));
            }
        }
        pause(cfg.request_spacing);
    }

    if writer.flush()? > 0 {
        info!("final save complete");
    }
    summary.rows_written = writer.rows_written();

    if cfg.data_csv.exists() {
        let dedup = dedup_csv(&cfg.data_csv, &cfg.clean_csv)?;
        info!(
            "rows before cleaning: {}, after: {}",
            dedup.rows_before, dedup.rows_after
        );
        summary.dedup = Some(dedup);
    }

    Ok(summary)
}

fn list_players(
    source: &impl MatchSource,
    cfg: &CollectConfig,
    summary: &mut CollectSummary,
) -> Vec<String> {
    let mut puuids = Vec::new();
    for tier in &cfg.tiers {
        match source.league_puuids(tier) {
            Ok(found) => {
                info!("found {} players in {tier}", found.len());
                puuids.extend(found);
            }
            Err(err) => {
                warn!("could not fetch {tier}: {err}");
                summary.errors.push(format!("{tier}: {err}"));
            }
        }
    }
    summary.players_listed = puuids.len();
    puuids
}

fn plan_matches(
    source: &impl MatchSource,
    cfg: &CollectConfig,
    existing: &HashSet<String>,
    puuids: &[String],
    summary: &mut CollectSummary,
) -> PlannedMatches {
    info!("collecting match ids from {} players", puuids.len());
    let mut planned = PlannedMatches::default();
    for (i, puuid) in puuids.iter().enumerate() {
        if planned.len() + existing.len() >= cfg.target_match_count {
            break;
        }
        summary.players_scanned += 1;
        match source.match_ids(puuid, cfg.matches_per_player) {
            Ok(ids) => {
                for id in ids {
                    if !existing.contains(&id) {
                        planned.insert(id);
                    }
                }
                if i % PROGRESS_EVERY_PLAYERS == 0 {
                    info!(
                        "scanned {i} players, queue size: {} new matches",
                        planned.len()
                    );
                }
            }
            Err(err) => {
                warn!("error fetching match list: {err}");
                summary.errors.push(format!("{puuid}: {err}"));
            }
        }
        pause(cfg.request_spacing);
    }
    planned
}

fn fetch_with_retry(
    source: &impl MatchSource,
    match_id: &str,
    cfg: &CollectConfig,
) -> Result<MatchRecord, FetchError> {
    let attempts = cfg.rate_limit_retries.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match source.match_detail(match_id) {
            Err(FetchError::RateLimited { retry_after }) if attempt < attempts => {
                let wait = retry_after.unwrap_or(cfg.rate_limit_backoff);
                warn!("rate limit hit, sleeping {}s", wait.as_secs());
                pause(wait);
            }
            other => return other,
        }
    }
}

fn pause(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}
