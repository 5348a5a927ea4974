use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::dates::match_date;
use super::ids;
use crate::shared::new_id;

/// One player's outcome in a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    #[serde(deserialize_with = "ids::deserialize")]
    pub player_id: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub is_winner: bool,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "ids::optional"
    )]
    pub team_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_breakdown: Option<BTreeMap<String, f64>>,
}

impl MatchResult {
    pub fn new(player_id: impl Into<String>, score: f64) -> Self {
        Self {
            player_id: player_id.into(),
            score,
            is_winner: false,
            team_id: None,
            score_breakdown: None,
        }
    }

    pub fn winner(mut self) -> Self {
        self.is_winner = true;
        self
    }

    pub fn on_team(mut self, team_id: impl Into<String>) -> Self {
        self.team_id = Some(team_id.into());
        self
    }
}

/// A recorded play of a game.
///
/// `created_at` orders matches by recency. Blobs written before it existed
/// get it from the legacy millisecond-timestamp id, or from `date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredMatch")]
pub struct Match {
    pub id: String,
    pub game_id: String,
    #[serde(with = "match_date")]
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub results: Vec<MatchResult>,
    pub created_by: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Match {
    pub fn new(
        game_id: impl Into<String>,
        date: NaiveDate,
        created_by: impl Into<String>,
        results: Vec<MatchResult>,
    ) -> Self {
        Self {
            id: new_id(),
            game_id: game_id.into(),
            date,
            created_at: Utc::now(),
            results,
            created_by: created_by.into(),
            extension_ids: Vec::new(),
            location_id: None,
            notes: None,
        }
    }

    pub fn involves_player(&self, player_id: &str) -> bool {
        self.results.iter().any(|result| result.player_id == player_id)
    }

    pub fn winners(&self) -> impl Iterator<Item = &MatchResult> {
        self.results.iter().filter(|result| result.is_winner)
    }

    /// Orders by `created_at`, then by id (numerically when both ids are numbers)
    pub fn cmp_recency(&self, other: &Match) -> Ordering {
        self.created_at
            .cmp(&other.created_at)
            .then_with(|| compare_ids(&self.id, &other.id))
    }
}

fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredMatch {
    #[serde(deserialize_with = "ids::deserialize")]
    id: String,
    #[serde(deserialize_with = "ids::deserialize")]
    game_id: String,
    #[serde(with = "match_date")]
    date: NaiveDate,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    results: Vec<MatchResult>,
    #[serde(default, deserialize_with = "ids::deserialize")]
    created_by: String,
    #[serde(default, deserialize_with = "ids::list")]
    extension_ids: Vec<String>,
    #[serde(default, deserialize_with = "ids::optional")]
    location_id: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

impl From<StoredMatch> for Match {
    fn from(stored: StoredMatch) -> Self {
        let created_at = stored
            .created_at
            .or_else(|| {
                stored
                    .id
                    .parse::<i64>()
                    .ok()
                    .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
            })
            .or_else(|| {
                stored
                    .date
                    .and_hms_opt(0, 0, 0)
                    .map(|midnight| midnight.and_utc())
            })
            .unwrap_or_default();

        Self {
            id: stored.id,
            game_id: stored.game_id,
            date: stored.date,
            created_at,
            results: stored.results,
            created_by: stored.created_by,
            extension_ids: stored.extension_ids,
            location_id: stored.location_id,
            notes: stored.notes,
        }
    }
}
