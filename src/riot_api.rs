use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::RETRY_AFTER;
use serde::Deserialize;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::FetchError;
use crate::http_client::http_client;
use crate::model::MatchRecord;

const TOKEN_HEADER: &str = "X-Riot-Token";
const RANKED_QUEUE: &str = "RANKED_TFT";

pub trait MatchSource {
    fn league_puuids(&self, tier: &str) -> Result<Vec<String>, FetchError>;
    fn match_ids(&self, puuid: &str, count: u32) -> Result<Vec<String>, FetchError>;
    fn match_detail(&self, match_id: &str) -> Result<MatchRecord, FetchError>;
}

pub struct RiotApi {
    client: &'static Client,
    config: ApiConfig,
}

impl RiotApi {
    pub fn new(config: ApiConfig) -> Result<Self, FetchError> {
        let client = http_client()?;
        Ok(Self { client, config })
    }

    pub fn league_url(&self, tier: &str) -> String {
        format!(
            "https://{}/tft/league/v1/{tier}?queue={RANKED_QUEUE}",
            self.config.platform_host
        )
    }

    pub fn match_ids_url(&self, puuid: &str, count: u32) -> String {
        format!(
            "https://{}/tft/match/v1/matches/by-puuid/{puuid}/ids?start=0&count={count}",
            self.config.region_host
        )
    }

    pub fn match_detail_url(&self, match_id: &str) -> String {
        format!(
            "https://{}/tft/match/v1/matches/{match_id}",
            self.config.region_host
        )
    }

    fn get_body(&self, url: &str) -> Result<String, FetchError> {
        debug!(url, "GET");
        let resp = self
            .client
            .get(url)
            .header(TOKEN_HEADER, &self.config.api_key)
            .send()?;
        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after);
            return Err(FetchError::RateLimited { retry_after });
        }
        let body = resp.text()?;
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

impl MatchSource for RiotApi {
    fn league_puuids(&self, tier: &str) -> Result<Vec<String>, FetchError> {
        let body = self.get_body(&self.league_url(tier))?;
        parse_league_json(&body)
    }

    fn match_ids(&self, puuid: &str, count: u32) -> Result<Vec<String>, FetchError> {
        let body = self.get_body(&self.match_ids_url(puuid, count))?;
        parse_match_ids_json(&body)
    }

    fn match_detail(&self, match_id: &str) -> Result<MatchRecord, FetchError> {
        let body = self.get_body(&self.match_detail_url(match_id))?;
        let mut record = parse_match_json(&body)?;
        if record.metadata.match_id.is_empty() {
            record.metadata.match_id = match_id.to_string();
        }
        Ok(record)
    }
}

#[derive(Debug, Deserialize)]
struct LeagueResponse {
    #[serde(default)]
    entries: Vec<LeagueEntry>,
}

#[derive(Debug, Deserialize)]
struct LeagueEntry {
    #[serde(default)]
    puuid: Option<String>,
}

pub fn parse_league_json(raw: &str) -> Result<Vec<String>, FetchError> {
    let Some(trimmed) = non_null(raw) else {
        return Ok(Vec::new());
    };
    let parsed: LeagueResponse = serde_json::from_str(trimmed)?;
    Ok(parsed
        .entries
        .into_iter()
        .filter_map(|e| e.puuid)
        .filter(|p| !p.trim().is_empty())
        .collect())
}

pub fn parse_match_ids_json(raw: &str) -> Result<Vec<String>, FetchError> {
    let Some(trimmed) = non_null(raw) else {
        return Ok(Vec::new());
    };
    Ok(serde_json::from_str(trimmed)?)
}

pub fn parse_match_json(raw: &str) -> Result<MatchRecord, FetchError> {
    let Some(trimmed) = non_null(raw) else {
        return Ok(MatchRecord::default());
    };
    Ok(serde_json::from_str(trimmed)?)
}

fn non_null(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        None
    } else {
        Some(trimmed)
    }
}

fn parse_retry_after(raw: &str) -> Option<Duration> {
    raw.trim().parse::<u64>().ok().map(Duration::from_secs)
}
