use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use tft_playstyle::collect::run_collection;
use tft_playstyle::config::CollectConfig;
use tft_playstyle::dataset::{append_rows, read_feature_rows};
use tft_playstyle::error::FetchError;
use tft_playstyle::features::FeatureExtractor;
use tft_playstyle::model::{MatchInfo, MatchMetadata, MatchRecord, Participant, Unit};
use tft_playstyle::riot_api::MatchSource;

#[derive(Default)]
struct ScriptedSource {
    ladders: HashMap<String, Vec<String>>,
    histories: HashMap<String, Vec<String>>,
    matches: HashMap<String, MatchRecord>,
    rate_limits: RefCell<HashMap<String, u32>>,
    detail_calls: RefCell<Vec<String>>,
}

impl MatchSource for ScriptedSource {
    fn league_puuids(&self, tier: &str) -> Result<Vec<String>, FetchError> {
        self.ladders
            .get(tier)
            .cloned()
            .ok_or(FetchError::Status {
                status: 404,
                body: "unknown tier".to_string(),
            })
    }

    fn match_ids(&self, puuid: &str, _count: u32) -> Result<Vec<String>, FetchError> {
        Ok(self.histories.get(puuid).cloned().unwrap_or_default())
    }

    fn match_detail(&self, match_id: &str) -> Result<MatchRecord, FetchError> {
        self.detail_calls.borrow_mut().push(match_id.to_string());
        if let Some(left) = self.rate_limits.borrow_mut().get_mut(match_id)
            && *left > 0
        {
            *left -= 1;
            return Err(FetchError::RateLimited {
                retry_after: Some(Duration::ZERO),
            });
        }
        self.matches.get(match_id).cloned().ok_or(FetchError::Status {
            status: 404,
            body: "missing".to_string(),
        })
    }
}

fn record(match_id: &str, puuids: &[&str]) -> MatchRecord {
    MatchRecord {
        metadata: MatchMetadata {
            match_id: match_id.to_string(),
        },
        info: MatchInfo {
            participants: puuids
                .iter()
                .enumerate()
                .map(|(idx, puuid)| Participant {
                    puuid: puuid.to_string(),
                    placement: idx as i64 + 1,
                    level: 8,
                    gold_left: 4,
                    last_round: 30,
                    time_eliminated: 1800.0,
                    total_damage_to_players: 60,
                    units: vec![Unit {
                        character_id: "TFT15_Jinx".to_string(),
                        rarity: Some(2),
                        tier: Some(2),
                        item_names: vec!["TFT_Item_InfinityEdge".to_string()],
                    }],
                })
                .collect(),
        },
    }
}

fn config(dir: &Path) -> CollectConfig {
    CollectConfig {
        tiers: vec!["master".to_string(), "challenger".to_string()],
        target_match_count: 100,
        matches_per_player: 20,
        batch_size: 1,
        request_spacing: Duration::ZERO,
        rate_limit_backoff: Duration::ZERO,
        rate_limit_retries: 3,
        data_csv: dir.join("data.csv"),
        clean_csv: dir.join("clean.csv"),
    }
}

fn source() -> ScriptedSource {
    let mut src = ScriptedSource::default();
    src.ladders.insert(
        "master".to_string(),
        vec!["a".to_string(), "b".to_string()],
    );
    src.histories.insert(
        "a".to_string(),
        vec!["NA1_1".to_string(), "NA1_2".to_string()],
    );
    src.histories.insert(
        "b".to_string(),
        vec!["NA1_2".to_string(), "NA1_3".to_string()],
    );
    src.matches.insert("NA1_1".to_string(), record("NA1_1", &["a", "x"]));
    src.matches.insert("NA1_2".to_string(), record("NA1_2", &["a", "b"]));
    src.matches.insert("NA1_3".to_string(), record("NA1_3", &["b", "y"]));
    src
}

#[test]
fn collects_new_matches_and_writes_clean_table() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = config(dir.path());
    let src = source();

    let summary = run_collection(&src, &FeatureExtractor::default(), &cfg).expect("collect");
    assert_eq!(summary.players_listed, 2);
    assert_eq!(summary.matches_planned, 3);
    assert_eq!(summary.matches_processed, 3);
    assert_eq!(summary.rows_written, 6);
    // The challenger ladder is not scripted.
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(*src.detail_calls.borrow(), vec!["NA1_1", "NA1_2", "NA1_3"]);

    let rows = read_feature_rows(&cfg.data_csv).unwrap();
    assert_eq!(rows.len(), 6);
    assert_eq!(rows[0].match_id, "NA1_1");
    assert_eq!(rows[0].board_value, 9);
    assert_eq!(rows[0].carry_unit_cost, 3);

    let dedup = summary.dedup.expect("dedup ran");
    assert_eq!(dedup.rows_before, 6);
    assert_eq!(dedup.rows_after, 6);
    assert!(cfg.clean_csv.exists());
}

#[test]
fn stored_matches_are_not_refetched() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = config(dir.path());
    let src = source();

    let stored = FeatureExtractor::default().extract_match(&record("NA1_2", &["a", "b"]));
    append_rows(&cfg.data_csv, &stored).unwrap();

    let summary = run_collection(&src, &FeatureExtractor::default(), &cfg).expect("collect");
    assert_eq!(summary.existing_matches, 1);
    assert_eq!(*src.detail_calls.borrow(), vec!["NA1_1", "NA1_3"]);
    assert_eq!(read_feature_rows(&cfg.data_csv).unwrap().len(), 6);
}

#[test]
fn planning_stops_at_target() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut cfg = config(dir.path());
    cfg.target_match_count = 2;
    let src = source();

    let summary = run_collection(&src, &FeatureExtractor::default(), &cfg).expect("collect");
    assert_eq!(summary.players_scanned, 1);
    assert_eq!(summary.matches_planned, 2);
}

#[test]
fn rate_limited_match_is_retried_then_skipped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = config(dir.path());
    let src = source();
    src.rate_limits.borrow_mut().insert("NA1_1".to_string(), 2);
    src.rate_limits.borrow_mut().insert("NA1_3".to_string(), 5);

    let summary = run_collection(&src, &FeatureExtractor::default(), &cfg).expect("collect");
    assert_eq!(summary.matches_processed, 2);
    assert_eq!(summary.matches_skipped, 1);

    let calls = src.detail_calls.borrow();
    assert_eq!(calls.iter().filter(|id| *id == "NA1_1").count(), 3);
    assert_eq!(calls.iter().filter(|id| *id == "NA1_3").count(), 3);
}
