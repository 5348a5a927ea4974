use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, EnumIter, EnumString};

use crate::scoring::ScoreColumn;
use crate::shared::new_id;

/// How a game's results are recorded
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, EnumIter, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GameType {
    #[default]
    Score,
    Team,
    Money,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, EnumIter, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ScoreType {
    #[default]
    Standard,
    Custom,
}

/// Expansion or variant of a game, with its own extra score columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameExtension {
    #[serde(deserialize_with = "crate::models::ids::deserialize")]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_columns: Vec<ScoreColumn>,
}

impl GameExtension {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            custom_columns: Vec::new(),
        }
    }

    pub fn with_columns(mut self, columns: Vec<ScoreColumn>) -> Self {
        self.custom_columns = columns;
        self
    }
}

/// Catalog entry.
///
/// `play_count` and `last_played` are whatever an older build stored; they
/// are kept for round-tripping only. Displayed values always come from
/// `stats::derive_game_view`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    #[serde(deserialize_with = "crate::models::ids::deserialize")]
    pub id: String,
    pub title: String,
    #[serde(rename = "type", default)]
    pub game_type: GameType,
    #[serde(default)]
    pub score_type: ScoreType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_columns: Vec<ScoreColumn>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<GameExtension>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_players: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_players: Option<u32>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::models::ids::optional"
    )]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub play_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_played: Option<String>,
}

impl Game {
    pub fn new(title: impl Into<String>, game_type: GameType) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            game_type,
            score_type: ScoreType::Standard,
            custom_columns: Vec::new(),
            extensions: Vec::new(),
            description: None,
            image: None,
            min_players: None,
            max_players: None,
            created_by: None,
            play_count: None,
            last_played: None,
        }
    }

    /// Switches the game to custom scoring with the given columns
    pub fn with_custom_columns(mut self, columns: Vec<ScoreColumn>) -> Self {
        self.score_type = ScoreType::Custom;
        self.custom_columns = columns;
        self
    }

    pub fn with_extension(mut self, extension: GameExtension) -> Self {
        self.extensions.push(extension);
        self
    }

    pub fn extension(&self, extension_id: &str) -> Option<&GameExtension> {
        self.extensions.iter().find(|ext| ext.id == extension_id)
    }
}
