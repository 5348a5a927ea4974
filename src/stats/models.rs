use std::fmt;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use crate::models::dates::DATE_FORMAT;

/// Label shown for a game without any visible match
pub const NEVER_PLAYED: &str = "never played";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LastPlayed {
    Never,
    On(NaiveDate),
}

impl fmt::Display for LastPlayed {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LastPlayed::Never => f.write_str(NEVER_PLAYED),
            LastPlayed::On(date) => write!(f, "{}", date.format(DATE_FORMAT)),
        }
    }
}

impl Serialize for LastPlayed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Display fields of a game derived from the matches visible to one user
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub game_id: String,
    pub title: String,
    pub play_count: u32,
    pub last_played: LastPlayed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub player_id: String,
    pub name: String,
    pub games_played: u32,
    pub wins: u32,
    pub total_score: f64,
    pub current_win_streak: u32,
    pub best_win_streak: u32,
}

impl PlayerStats {
    pub fn win_rate(&self) -> f64 {
        if self.games_played == 0 {
            0.0
        } else {
            f64::from(self.wins) / f64::from(self.games_played)
        }
    }
}
