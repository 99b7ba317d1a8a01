use std::fs;
use std::path::PathBuf;

use tft_playstyle::features::{ExtractorConfig, FeatureExtractor};
use tft_playstyle::model::{Participant, Unit};
use tft_playstyle::riot_api::parse_match_json;

fn unit(id: &str, rarity: i64, tier: i64, items: &[&str]) -> Unit {
    Unit {
        character_id: id.to_string(),
        rarity: Some(rarity),
        tier: Some(tier),
        item_names: items.iter().map(|s| s.to_string()).collect(),
    }
}

fn participant(units: Vec<Unit>) -> Participant {
    Participant {
        puuid: "p1".to_string(),
        placement: 2,
        level: 8,
        gold_left: 14,
        last_round: 31,
        time_eliminated: 2001.5,
        total_damage_to_players: 101,
        units,
    }
}

#[test]
fn worked_example_board_contribution() {
    let extractor = FeatureExtractor::default();
    let units = vec![unit(
        "TFT15_Jinx",
        4,
        3,
        &["Warmog's Armor", "Infinity Edge"],
    )];
    let board = extractor.board_summary(&units);
    assert_eq!(board.board_value, 36);
    assert_eq!(board.three_star_count, 1);
    assert_eq!(extractor.carry_unit_cost(&units), 4);
}

#[test]
fn equal_scores_keep_the_earliest_unit() {
    let extractor = FeatureExtractor::default();
    let units = vec![
        unit("TFT15_A", 3, 2, &["Infinity Edge"]),
        unit("TFT15_B", 3, 2, &["Rabadon's Deathcap"]),
    ];
    let carry = extractor.select_carry(&units).expect("carry exists");
    assert_eq!(carry.character_id, "TFT15_A");

    let reversed: Vec<Unit> = units.into_iter().rev().collect();
    let carry = extractor.select_carry(&reversed).expect("carry exists");
    assert_eq!(carry.character_id, "TFT15_B");
}

#[test]
fn invalid_units_never_become_carry() {
    let extractor = FeatureExtractor::default();
    let three_items = ["Infinity Edge", "Deathblade", "Last Whisper"];
    let units = vec![
        unit("TFT15_Star", 4, 4, &three_items),
        unit("TFT15_Dummy", 9, 1, &three_items),
        unit("TFT15_Plain", 1, 1, &[]),
    ];
    let carry = extractor.select_carry(&units).expect("plain unit survives");
    assert_eq!(carry.character_id, "TFT15_Plain");
    assert_eq!(extractor.carry_unit_cost(&units), 2);
}

#[test]
fn items_outweigh_cost_and_stars() {
    let extractor = FeatureExtractor::default();
    let units = vec![
        unit("TFT15_Legend", 6, 3, &["Bramble Vest"]),
        unit("TFT15_Cheap", 0, 1, &["Infinity Edge"]),
    ];
    let carry = extractor.select_carry(&units).expect("carry exists");
    assert_eq!(carry.character_id, "TFT15_Cheap");
    assert_eq!(extractor.carry_unit_cost(&units), 1);
}

#[test]
fn without_items_carry_falls_back_to_cost_then_stars() {
    let extractor = FeatureExtractor::default();
    let units = vec![
        unit("TFT15_One", 1, 3, &[]),
        unit("TFT15_Four", 4, 1, &[]),
        unit("TFT15_Three", 3, 3, &[]),
    ];
    // 1 + 1.5, 4 + 0.5, 3 + 1.5
    let carry = extractor.select_carry(&units).expect("carry exists");
    assert_eq!(carry.character_id, "TFT15_Four");
}

#[test]
fn scores_at_or_below_floor_are_never_selected() {
    let extractor = FeatureExtractor::default();
    let units = vec![unit("TFT15_Broken", -1, 0, &[])];
    assert!(extractor.select_carry(&units).is_none());
    assert_eq!(extractor.carry_unit_cost(&units), -1);
}

#[test]
fn only_dummy_and_minion_ids_are_excluded_from_board() {
    let extractor = FeatureExtractor::default();
    let units = vec![
        unit("TFT_TargetDummy", 4, 1, &[]),
        unit("TFT15_VoidMinion", 4, 1, &[]),
        unit("TFT15_Minionette", 4, 3, &[]),
        unit("TFT15_Dummyhead", 4, 1, &[]),
        unit("TFT15_Target", 4, 1, &[]),
    ];
    let board = extractor.board_summary(&units);
    assert_eq!(board.board_value, 4 + 4);
    assert_eq!(board.three_star_count, 0);
}

#[test]
fn board_counts_out_of_range_stars_and_zeroes_invalid_cost() {
    let extractor = FeatureExtractor::default();
    let units = vec![
        unit("TFT15_A", 2, 4, &[]),
        unit("TFT15_B", 8, 3, &[]),
        unit("TFT15_C", 5, 3, &[]),
    ];
    let board = extractor.board_summary(&units);
    // rarity 8 is invalid and adds nothing
    assert_eq!(board.board_value, 3 * 27 + 5 * 9);
    assert_eq!(board.three_star_count, 2);
}

#[test]
fn zero_units_yield_sentinels() {
    let extractor = FeatureExtractor::default();
    let row = extractor.extract_participant("NA1_1", &participant(Vec::new()));
    assert_eq!(row.board_value, 0);
    assert_eq!(row.three_star_count, 0);
    assert_eq!(row.carry_unit_cost, -1);
    assert_eq!(row.match_id, "NA1_1");
    assert_eq!(row.puuid, "p1");
    assert_eq!(row.total_damage, 101);
    assert_eq!(row.time_eliminated, 2001.5);
}

#[test]
fn custom_keywords_replace_defaults() {
    let extractor = FeatureExtractor::new(ExtractorConfig {
        tank_keywords: vec!["Edge".to_string()],
        summon_markers: vec!["Golem".to_string()],
    });
    let units = vec![
        unit("TFT15_A", 1, 1, &["Infinity Edge"]),
        unit("TFT15_B", 1, 1, &["Warmog's Armor"]),
        unit("TFT15_Golem", 5, 1, &[]),
    ];
    let carry = extractor.select_carry(&units).expect("carry exists");
    assert_eq!(carry.character_id, "TFT15_B");
    assert_eq!(extractor.board_summary(&units).board_value, 2 + 2);
}

#[test]
fn extracts_fixture_match() {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/fixtures/match_detail.json");
    let raw = fs::read_to_string(path).expect("fixture file should be readable");
    let record = parse_match_json(&raw).expect("fixture should parse");

    let rows = FeatureExtractor::default().extract_match(&record);
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|r| r.match_id == "NA1_5000000001"));

    let summary: Vec<(&str, i64, i64, i64)> = rows
        .iter()
        .map(|r| {
            (
                r.puuid.as_str(),
                r.board_value,
                r.three_star_count,
                r.carry_unit_cost,
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            ("puuid-a", 57, 1, 4),
            ("puuid-b", 6, 0, 3),
            ("puuid-c", 0, 0, -1),
            ("puuid-d", 81, 0, -1),
        ]
    );
    assert_eq!(rows[0].level, 9);
    assert_eq!(rows[0].gold_left, 12);
    assert_eq!(rows[0].last_round, 36);
    assert_eq!(rows[0].total_damage, 140);
}

#[test]
fn missing_tier_skips_carry_but_counts_one_star_on_board() {
    let extractor = FeatureExtractor::default();
    let starless = Unit {
        character_id: "TFT15_Starless".to_string(),
        rarity: Some(4),
        tier: None,
        item_names: vec![
            "Infinity Edge".to_string(),
            "Deathblade".to_string(),
            "Last Whisper".to_string(),
        ],
    };
    let units = vec![starless, unit("TFT15_Plain", 1, 1, &[])];

    let carry = extractor.select_carry(&units).expect("plain unit survives");
    assert_eq!(carry.character_id, "TFT15_Plain");
    assert_eq!(extractor.carry_unit_cost(&units), 2);

    let board = extractor.board_summary(&units);
    assert_eq!(board.board_value, 4 + 2);
    assert_eq!(board.three_star_count, 0);
}
