use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{debug, info, instrument};

use super::errors::TransferError;
use super::payload::{ExtensionRef, MatchExport, PlayerRef};
use crate::models::{Game, GameExtension, Match, Player};
use crate::shared::{new_id, normalize_name};

/// What happens to a remote player or extension with no local name match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnmatchedPolicy {
    /// Create a local record with the remote name
    #[default]
    Create,
    /// Leave it unresolved so the user can map it by hand
    Flag,
}

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub policy: UnmatchedPolicy,
    /// Manual choices: remote player id → local player id
    pub player_overrides: BTreeMap<String, String>,
    /// Manual choices: remote extension id → local extension id
    pub extension_overrides: BTreeMap<String, String>,
}

impl ImportOptions {
    pub fn flagging() -> Self {
        Self {
            policy: UnmatchedPolicy::Flag,
            ..Self::default()
        }
    }

    pub fn map_player(mut self, remote_id: impl Into<String>, local_id: impl Into<String>) -> Self {
        self.player_overrides.insert(remote_id.into(), local_id.into());
        self
    }

    pub fn map_extension(mut self, remote_id: impl Into<String>, local_id: impl Into<String>) -> Self {
        self.extension_overrides
            .insert(remote_id.into(), local_id.into());
        self
    }
}

/// Result of reconciling a payload against local records. Nothing has been
/// applied yet; `AppState::import_matches` commits it.
#[derive(Debug, Clone, Default)]
pub struct ImportPlan {
    /// Matches re-keyed onto local ids, ready to append
    pub matches: Vec<Match>,
    pub new_players: Vec<Player>,
    pub new_extensions: Vec<GameExtension>,
    pub unresolved_players: Vec<PlayerRef>,
    pub unresolved_extensions: Vec<ExtensionRef>,
    /// Remote matches left out because something they reference is unresolved
    pub skipped_matches: usize,
    pub player_mapping: BTreeMap<String, String>,
    pub extension_mapping: BTreeMap<String, String>,
}

impl ImportPlan {
    pub fn needs_manual_mapping(&self) -> bool {
        !self.unresolved_players.is_empty() || !self.unresolved_extensions.is_empty()
    }
}

/// Maps remote names onto local records by case-insensitive name and
/// re-keys every fully mappable match onto `target_game`.
///
/// Imported matches get fresh ids and `importer_id` as their recorder;
/// dates, creation times, scores and breakdowns are kept.
#[instrument(skip_all, fields(game_id = %target_game.id, remote_matches = payload.matches.len()))]
pub fn plan_import(
    payload: &MatchExport,
    target_game: &Game,
    local_players: &[Player],
    importer_id: &str,
    options: &ImportOptions,
) -> Result<ImportPlan, TransferError> {
    let mut plan = ImportPlan::default();

    let mut players_by_name: HashMap<String, String> = local_players
        .iter()
        .map(|player| (normalize_name(&player.name), player.id.clone()))
        .collect();

    for remote in &payload.players {
        if let Some(local_id) = options.player_overrides.get(&remote.id) {
            if !local_players.iter().any(|player| &player.id == local_id) {
                return Err(TransferError::UnknownLocalPlayer {
                    player_id: local_id.clone(),
                });
            }
            plan.player_mapping.insert(remote.id.clone(), local_id.clone());
            continue;
        }

        let key = normalize_name(&remote.name);
        if let Some(local_id) = players_by_name.get(&key) {
            debug!(remote = %remote.name, local_id = %local_id, "Mapped player by name");
            plan.player_mapping.insert(remote.id.clone(), local_id.clone());
            continue;
        }

        match options.policy {
            UnmatchedPolicy::Create => {
                let player = Player::new(remote.name.trim());
                players_by_name.insert(key, player.id.clone());
                plan.player_mapping.insert(remote.id.clone(), player.id.clone());
                plan.new_players.push(player);
            }
            UnmatchedPolicy::Flag => plan.unresolved_players.push(remote.clone()),
        }
    }

    let mut extensions_by_title: HashMap<String, String> = target_game
        .extensions
        .iter()
        .map(|extension| (normalize_name(&extension.title), extension.id.clone()))
        .collect();

    for remote in &payload.extensions {
        if let Some(local_id) = options.extension_overrides.get(&remote.id) {
            if target_game.extension(local_id).is_none() {
                return Err(TransferError::UnknownLocalExtension {
                    extension_id: local_id.clone(),
                });
            }
            plan.extension_mapping
                .insert(remote.id.clone(), local_id.clone());
            continue;
        }

        let key = normalize_name(&remote.title);
        if let Some(local_id) = extensions_by_title.get(&key) {
            plan.extension_mapping
                .insert(remote.id.clone(), local_id.clone());
            continue;
        }

        match options.policy {
            UnmatchedPolicy::Create => {
                let extension = GameExtension::new(remote.title.trim());
                extensions_by_title.insert(key, extension.id.clone());
                plan.extension_mapping
                    .insert(remote.id.clone(), extension.id.clone());
                plan.new_extensions.push(extension);
            }
            UnmatchedPolicy::Flag => plan.unresolved_extensions.push(remote.clone()),
        }
    }

    for remote in &payload.matches {
        match rekey_match(remote, &plan, &target_game.id, importer_id) {
            Some(local) => plan.matches.push(local),
            None => {
                debug!(remote_match = %remote.id, "Skipping match with unresolved or merged references");
                plan.skipped_matches += 1;
            }
        }
    }

    info!(
        mapped_matches = plan.matches.len(),
        skipped_matches = plan.skipped_matches,
        new_players = plan.new_players.len(),
        new_extensions = plan.new_extensions.len(),
        unresolved_players = plan.unresolved_players.len(),
        "Import planned"
    );

    Ok(plan)
}

fn rekey_match(remote: &Match, plan: &ImportPlan, game_id: &str, importer_id: &str) -> Option<Match> {
    let mut local = remote.clone();
    local.id = new_id();
    local.game_id = game_id.to_string();
    local.created_by = importer_id.to_string();
    // Locations are per installation
    local.location_id = None;

    let mut seen = HashSet::new();
    for result in &mut local.results {
        result.player_id = plan.player_mapping.get(&result.player_id)?.clone();
        // Two remote players merged onto one local player
        if !seen.insert(result.player_id.clone()) {
            return None;
        }
    }
    for extension_id in &mut local.extension_ids {
        *extension_id = plan.extension_mapping.get(extension_id.as_str())?.clone();
    }

    Some(local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GameType, MatchResult};
    use crate::transfer::payload::{EXPORT_TYPE, EXPORT_VERSION};
    use chrono::NaiveDate;

    fn remote_match(id: &str, player_ids: &[&str], extension_ids: &[&str]) -> Match {
        let mut remote = Match::new(
            "remote-game",
            NaiveDate::from_ymd_opt(2024, 2, 2).unwrap(),
            "remote-user",
            player_ids
                .iter()
                .map(|p| MatchResult::new(*p, 5.0))
                .collect(),
        );
        remote.id = id.to_string();
        remote.extension_ids = extension_ids.iter().map(|e| e.to_string()).collect();
        remote.location_id = Some("remote-location".into());
        remote
    }

    fn payload(players: &[(&str, &str)], extensions: &[(&str, &str)], matches: Vec<Match>) -> MatchExport {
        MatchExport {
            kind: EXPORT_TYPE.into(),
            version: EXPORT_VERSION,
            source_game_title: "Catan".into(),
            matches,
            players: players
                .iter()
                .map(|(id, name)| PlayerRef {
                    id: id.to_string(),
                    name: name.to_string(),
                })
                .collect(),
            extensions: extensions
                .iter()
                .map(|(id, title)| ExtensionRef {
                    id: id.to_string(),
                    title: title.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn maps_remote_player_onto_local_name_ignoring_case() {
        let local_alex = Player::new("alex");
        let game = Game::new("Catan", GameType::Score);
        let payload = payload(&[("r-alex", "Alex")], &[], vec![remote_match("m1", &["r-alex"], &[])]);

        let plan = plan_import(&payload, &game, &[local_alex.clone()], "me", &ImportOptions::default()).unwrap();

        assert!(plan.new_players.is_empty());
        assert_eq!(plan.matches.len(), 1);
        let imported = &plan.matches[0];
        assert_eq!(imported.results[0].player_id, local_alex.id);
        assert_eq!(imported.game_id, game.id);
        assert_eq!(imported.created_by, "me");
        assert_ne!(imported.id, "m1");
        assert_eq!(imported.location_id, None);
    }

    #[test]
    fn creates_unmatched_players_once() {
        let game = Game::new("Catan", GameType::Score);
        let payload = payload(
            &[("r1", "Jo"), ("r2", " JO ")],
            &[],
            vec![remote_match("m1", &["r1", "r2"], &[])],
        );

        let plan = plan_import(&payload, &game, &[], "me", &ImportOptions::default()).unwrap();

        assert_eq!(plan.new_players.len(), 1);
        assert_eq!(plan.new_players[0].name, "Jo");
        assert_eq!(plan.player_mapping["r1"], plan.player_mapping["r2"]);
        assert!(plan.matches.is_empty());
        assert_eq!(plan.skipped_matches, 1);
    }

    #[test]
    fn match_merging_two_remote_players_onto_one_local_is_skipped() {
        let game = Game::new("Catan", GameType::Score);
        let local_jo = Player::new("Jo");
        let payload = payload(
            &[("r1", "Jo"), ("r2", "jo"), ("r3", "Sam")],
            &[],
            vec![
                remote_match("m1", &["r1", "r2"], &[]),
                remote_match("m2", &["r1", "r3"], &[]),
            ],
        );

        let plan = plan_import(&payload, &game, &[local_jo.clone()], "me", &ImportOptions::default()).unwrap();

        assert_eq!(plan.skipped_matches, 1);
        assert_eq!(plan.matches.len(), 1);
        let kept: Vec<&str> = plan.matches[0].results.iter().map(|r| r.player_id.as_str()).collect();
        assert_eq!(kept[0], local_jo.id);
        assert_ne!(kept[1], local_jo.id);
    }

    #[test]
    fn flag_policy_leaves_unmatched_for_manual_mapping() {
        let game = Game::new("Catan", GameType::Score);
        let payload = payload(
            &[("r1", "Kim"), ("r2", "Lee")],
            &[],
            vec![remote_match("m1", &["r1"], &[]), remote_match("m2", &["r2"], &[])],
        );
        let kim = Player::new("Kim");

        let plan = plan_import(&payload, &game, &[kim], "me", &ImportOptions::flagging()).unwrap();

        assert!(plan.needs_manual_mapping());
        assert_eq!(plan.unresolved_players[0].name, "Lee");
        assert_eq!(plan.matches.len(), 1);
        assert_eq!(plan.skipped_matches, 1);
    }

    #[test]
    fn manual_mapping_wins_over_names() {
        let game = Game::new("Catan", GameType::Score);
        let lee = Player::new("Lee");
        let robin = Player::new("Robin");
        let payload = payload(&[("r1", "Lee")], &[], vec![remote_match("m1", &["r1"], &[])]);

        let options = ImportOptions::flagging().map_player("r1", robin.id.clone());
        let plan = plan_import(&payload, &game, &[lee, robin.clone()], "me", &options).unwrap();

        assert_eq!(plan.matches[0].results[0].player_id, robin.id);
    }

    #[test]
    fn manual_mapping_to_missing_player_is_rejected() {
        let game = Game::new("Catan", GameType::Score);
        let payload = payload(&[("r1", "Lee")], &[], vec![]);
        let options = ImportOptions::default().map_player("r1", "nobody");

        let err = plan_import(&payload, &game, &[], "me", &options).unwrap_err();
        assert!(matches!(err, TransferError::UnknownLocalPlayer { player_id } if player_id == "nobody"));
    }

    #[test]
    fn extensions_map_by_title() {
        let seafarers = GameExtension::new("Seafarers");
        let game = Game::new("Catan", GameType::Score).with_extension(seafarers.clone());
        let alex = Player::new("Alex");
        let payload = payload(
            &[("r-alex", "Alex")],
            &[("r-sea", "SEAFARERS"), ("r-cities", "Cities & Knights")],
            vec![
                remote_match("m1", &["r-alex"], &["r-sea"]),
                remote_match("m2", &["r-alex"], &["r-cities"]),
            ],
        );

        let plan = plan_import(&payload, &game, &[alex], "me", &ImportOptions::default()).unwrap();

        assert_eq!(plan.matches[0].extension_ids, vec![seafarers.id]);
        assert_eq!(plan.new_extensions.len(), 1);
        assert_eq!(plan.new_extensions[0].title, "Cities & Knights");
        assert_eq!(plan.matches[1].extension_ids, vec![plan.new_extensions[0].id.clone()]);
    }

    #[test]
    fn results_for_players_missing_from_payload_skip_the_match() {
        let game = Game::new("Catan", GameType::Score);
        let payload = payload(&[], &[], vec![remote_match("m1", &["ghost"], &[])]);

        let plan = plan_import(&payload, &game, &[], "me", &ImportOptions::default()).unwrap();
        assert!(plan.matches.is_empty());
        assert_eq!(plan.skipped_matches, 1);
    }
}
