use serde::{Deserialize, Serialize};

/// Raw rarity used when the API omits the field; lands in the invalid branch.
pub const MISSING_RARITY: i64 = 10;
pub const MISSING_TIER: i64 = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    #[serde(default)]
    pub character_id: String,
    #[serde(default)]
    pub rarity: Option<i64>,
    #[serde(default)]
    pub tier: Option<i64>,
    #[serde(rename = "itemNames", default)]
    pub item_names: Vec<String>,
}

impl Unit {
    pub fn raw_rarity(&self) -> i64 {
        self.rarity.unwrap_or(MISSING_RARITY)
    }

    pub fn star_level(&self) -> i64 {
        self.tier.unwrap_or(MISSING_TIER)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub puuid: String,
    pub placement: i64,
    pub level: i64,
    pub gold_left: i64,
    pub last_round: i64,
    pub time_eliminated: f64,
    pub total_damage_to_players: i64,
    #[serde(default)]
    pub units: Vec<Unit>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchMetadata {
    #[serde(default)]
    pub match_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchInfo {
    #[serde(default)]
    pub participants: Vec<Participant>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    #[serde(default)]
    pub metadata: MatchMetadata,
    #[serde(default)]
    pub info: MatchInfo,
}

/// One output row per participant. Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub match_id: String,
    pub puuid: String,
    pub placement: i64,
    pub level: i64,
    pub gold_left: i64,
    pub last_round: i64,
    pub time_eliminated: f64,
    pub total_damage: i64,
    pub board_value: i64,
    pub three_star_count: i64,
    pub carry_unit_cost: i64,
}
