use crate::model::{FeatureRow, MatchRecord, Participant, Unit};

pub const DEFAULT_TANK_KEYWORDS: &[&str] = &[
    "Warmog",
    "Bramble",
    "Vest",
    "Negatron",
    "Dragon",
    "Claw",
    "Gargoyle",
    "Stoneplate",
    "Sunfire",
    "Redemption",
    "Vow",
    "Steadfast",
    "Crownguard",
    "Protector",
    // Thief's Gloves sit on secondary units too often to count.
    "Thief",
];

pub const DEFAULT_SUMMON_MARKERS: &[&str] = &["TargetDummy", "Minion"];

/// Star level assumed on the board path when the API omits `tier`.
const BOARD_MISSING_TIER: i64 = 1;
const MAX_REAL_RARITY: i64 = 7;
const MAX_REAL_STAR_LEVEL: i64 = 3;
const ITEM_WEIGHT: f64 = 10.0;
const STAR_WEIGHT: f64 = 0.5;
const SCORE_FLOOR: f64 = -1.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorConfig {
    pub tank_keywords: Vec<String>,
    pub summon_markers: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            tank_keywords: DEFAULT_TANK_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            summon_markers: DEFAULT_SUMMON_MARKERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoardSummary {
    pub board_value: i64,
    pub three_star_count: i64,
}

/// Gold cost on the board-value path. Invalid rarities are worth nothing.
pub fn normalize_board_cost(rarity: i64) -> i64 {
    if rarity > MAX_REAL_RARITY {
        0
    } else {
        remap_cost(rarity)
    }
}

/// Gold cost on the carry path. Invalid rarities become the `-1` sentinel.
pub fn normalize_carry_cost(rarity: i64) -> i64 {
    if rarity > MAX_REAL_RARITY {
        -1
    } else {
        remap_cost(rarity)
    }
}

fn remap_cost(rarity: i64) -> i64 {
    match rarity {
        6 => 5,
        0..=2 => rarity + 1,
        _ => rarity,
    }
}

#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    config: ExtractorConfig,
}

impl FeatureExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn is_tank_item(&self, item: &str) -> bool {
        self.config
            .tank_keywords
            .iter()
            .any(|keyword| item.contains(keyword.as_str()))
    }

    pub fn is_summon(&self, unit: &Unit) -> bool {
        self.config
            .summon_markers
            .iter()
            .any(|marker| unit.character_id.contains(marker.as_str()))
    }

    pub fn offensive_item_count(&self, unit: &Unit) -> usize {
        unit.item_names
            .iter()
            .filter(|item| !self.is_tank_item(item))
            .count()
    }

    /// Carry score of a unit, or `None` when its rarity or star level is not real data.
    pub fn carry_score(&self, unit: &Unit) -> Option<f64> {
        let cost = unit.raw_rarity();
        if cost > MAX_REAL_RARITY {
            return None;
        }
        let star_level = unit.star_level();
        if star_level > MAX_REAL_STAR_LEVEL {
            return None;
        }
        let items = self.offensive_item_count(unit) as f64;
        Some(items * ITEM_WEIGHT + cost as f64 + star_level as f64 * STAR_WEIGHT)
    }

    /// Picks the unit the board is built around. The earliest unit wins ties.
    pub fn select_carry<'a>(&self, units: &'a [Unit]) -> Option<&'a Unit> {
        let mut best: Option<&Unit> = None;
        let mut max_score = SCORE_FLOOR;
        for unit in units {
            let Some(score) = self.carry_score(unit) else {
                continue;
            };
            if score > max_score {
                max_score = score;
                best = Some(unit);
            }
        }
        best
    }

    pub fn carry_unit_cost(&self, units: &[Unit]) -> i64 {
        self.select_carry(units)
            .map(|carry| normalize_carry_cost(carry.raw_rarity()))
            .unwrap_or(-1)
    }

    pub fn board_summary(&self, units: &[Unit]) -> BoardSummary {
        let mut summary = BoardSummary::default();
        for unit in units {
            if self.is_summon(unit) {
                continue;
            }
            let star_level = unit.tier.unwrap_or(BOARD_MISSING_TIER);
            let cost = normalize_board_cost(unit.raw_rarity());
            summary.board_value = summary
                .board_value
                .saturating_add(cost.saturating_mul(star_weight(star_level)));
            if star_level == 3 {
                summary.three_star_count += 1;
            }
        }
        summary
    }

    pub fn extract_participant(&self, match_id: &str, participant: &Participant) -> FeatureRow {
        let board = self.board_summary(&participant.units);
        FeatureRow {
            match_id: match_id.to_string(),
            puuid: participant.puuid.clone(),
            placement: participant.placement,
            level: participant.level,
            gold_left: participant.gold_left,
            last_round: participant.last_round,
            time_eliminated: participant.time_eliminated,
            total_damage: participant.total_damage_to_players,
            board_value: board.board_value,
            three_star_count: board.three_star_count,
            carry_unit_cost: self.carry_unit_cost(&participant.units),
        }
    }

    pub fn extract_match(&self, record: &MatchRecord) -> Vec<FeatureRow> {
        self.extract_participants(&record.metadata.match_id, &record.info.participants)
    }

    pub fn extract_participants(
        &self,
        match_id: &str,
        participants: &[Participant],
    ) -> Vec<FeatureRow> {
        participants
            .iter()
            .map(|p| self.extract_participant(match_id, p))
            .collect()
    }
}

// 3^(star - 1): each star upgrade merges three copies. Stars below 1 carry no weight.
fn star_weight(star_level: i64) -> i64 {
    if star_level < 1 {
        return 0;
    }
    let exp = u32::try_from(star_level - 1).unwrap_or(u32::MAX);
    3_i64.saturating_pow(exp)
}
