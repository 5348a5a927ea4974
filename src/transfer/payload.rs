use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::errors::TransferError;
use crate::models::{Game, Match, Player};

pub const EXPORT_TYPE: &str = "match_export";
pub const EXPORT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionRef {
    pub id: String,
    pub title: String,
}

/// Portable set of matches for one game, carrying enough names for the
/// receiving installation to map players and extensions onto its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchExport {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: u32,
    pub source_game_title: String,
    pub matches: Vec<Match>,
    #[serde(default)]
    pub players: Vec<PlayerRef>,
    #[serde(default)]
    pub extensions: Vec<ExtensionRef>,
}

impl MatchExport {
    pub fn to_json(&self) -> Result<String, TransferError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decodes a payload, rejecting other document types and newer versions
    pub fn from_json(raw: &str) -> Result<Self, TransferError> {
        let payload: MatchExport = serde_json::from_str(raw)?;

        if payload.kind != EXPORT_TYPE {
            return Err(TransferError::UnsupportedPayload { kind: payload.kind });
        }
        if payload.version > EXPORT_VERSION {
            return Err(TransferError::UnsupportedVersion {
                version: payload.version,
                supported: EXPORT_VERSION,
            });
        }

        Ok(payload)
    }
}

/// Builds an export of `game`'s matches among `matches`.
///
/// Only players and extensions the exported matches refer to are listed.
/// Results naming a player that no longer exists are left out.
pub fn export_matches(game: &Game, matches: &[&Match], players: &[Player]) -> MatchExport {
    let exported: Vec<Match> = matches
        .iter()
        .filter(|m| m.game_id == game.id)
        .map(|&m| {
            let mut exported = m.clone();
            exported
                .results
                .retain(|result| players.iter().any(|p| p.id == result.player_id));
            exported
        })
        .collect();

    let player_ids: BTreeSet<&str> = exported
        .iter()
        .flat_map(|m| m.results.iter().map(|result| result.player_id.as_str()))
        .collect();
    let extension_ids: BTreeSet<&str> = exported
        .iter()
        .flat_map(|m| m.extension_ids.iter().map(String::as_str))
        .collect();

    let player_refs = players
        .iter()
        .filter(|player| player_ids.contains(player.id.as_str()))
        .map(|player| PlayerRef {
            id: player.id.clone(),
            name: player.name.clone(),
        })
        .collect();
    let extension_refs = game
        .extensions
        .iter()
        .filter(|extension| extension_ids.contains(extension.id.as_str()))
        .map(|extension| ExtensionRef {
            id: extension.id.clone(),
            title: extension.title.clone(),
        })
        .collect();

    debug!(
        game_id = %game.id,
        matches = exported.len(),
        "Built match export"
    );

    MatchExport {
        kind: EXPORT_TYPE.to_string(),
        version: EXPORT_VERSION,
        source_game_title: game.title.clone(),
        matches: exported,
        players: player_refs,
        extensions: extension_refs,
    }
}
