use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::writer::PersistenceWriter;
use crate::config::TrackerConfig;
use crate::models::{
    Game, GameExtension, GameType, Location, Match, MatchResult, Player, ProfileUpdate, Settings,
    Theme, User,
};
use crate::scoring::ScoreSheet;
use crate::shared::{normalize_name, AppError};
use crate::stats::{self, GameView, PlayerStats};
use crate::storage::{load_or_default, FileKeyValueStore, KeyValueStore, StorageKey};
use crate::transfer::{self, ExtensionRef, ImportOptions, MatchExport, PlayerRef};

/// Input for recording a match; the recorder is always the current user
#[derive(Debug, Clone)]
pub struct MatchDraft {
    pub game_id: String,
    pub date: NaiveDate,
    pub results: Vec<MatchResult>,
    pub extension_ids: Vec<String>,
    pub location_id: Option<String>,
    pub notes: Option<String>,
}

impl MatchDraft {
    pub fn new(game_id: impl Into<String>, date: NaiveDate, results: Vec<MatchResult>) -> Self {
        Self {
            game_id: game_id.into(),
            date,
            results,
            extension_ids: Vec::new(),
            location_id: None,
            notes: None,
        }
    }

    pub fn with_extensions(mut self, extension_ids: Vec<String>) -> Self {
        self.extension_ids = extension_ids;
        self
    }

    pub fn at_location(mut self, location_id: impl Into<String>) -> Self {
        self.location_id = Some(location_id.into());
        self
    }
}

/// Shared, immutable view of the collections at one point in time
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub users: Arc<Vec<User>>,
    pub games: Arc<Vec<Game>>,
    pub matches: Arc<Vec<Match>>,
    pub players: Arc<Vec<Player>>,
    pub locations: Arc<Vec<Location>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
    pub created_players: Vec<Player>,
    pub created_extensions: Vec<GameExtension>,
    pub unresolved_players: Vec<PlayerRef>,
    pub unresolved_extensions: Vec<ExtensionRef>,
}

/// The tracker's whole in-memory state and its only writer.
///
/// Collections are replaced copy-on-write: a `Snapshot` taken before a
/// mutation keeps seeing the old values. Every mutation validates first,
/// so a rejected call leaves the state untouched, and then queues the
/// changed collection for persistence without waiting for it.
pub struct AppState {
    users: Arc<Vec<User>>,
    games: Arc<Vec<Game>>,
    matches: Arc<Vec<Match>>,
    players: Arc<Vec<Player>>,
    locations: Arc<Vec<Location>>,
    settings: Settings,
    current_user_id: Option<String>,
    writer: PersistenceWriter,
}

impl AppState {
    /// Reads every collection concurrently. Missing or malformed documents load as
    /// empty; a stored session naming an unknown user is dropped.
    #[instrument(skip_all)]
    pub async fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let store = storage.as_ref();
        let (users, games, matches, players, locations, settings, session) = futures::join!(
            load_or_default::<Vec<User>>(store, StorageKey::Users),
            load_or_default::<Vec<Game>>(store, StorageKey::Games),
            load_or_default::<Vec<Match>>(store, StorageKey::Matches),
            load_or_default::<Vec<Player>>(store, StorageKey::Players),
            load_or_default::<Vec<Location>>(store, StorageKey::Locations),
            load_or_default::<Settings>(store, StorageKey::Settings),
            load_or_default::<Option<String>>(store, StorageKey::SessionUserId),
        );

        let current_user_id = session.filter(|id| {
            let known = users.iter().any(|user| &user.id == id);
            if !known {
                warn!(user_id = %id, "Stored session names an unknown user, signing out");
            }
            known
        });

        info!(
            users = users.len(),
            games = games.len(),
            matches = matches.len(),
            players = players.len(),
            locations = locations.len(),
            signed_in = current_user_id.is_some(),
            "Tracker state loaded"
        );

        Self {
            users: Arc::new(users),
            games: Arc::new(games),
            matches: Arc::new(matches),
            players: Arc::new(players),
            locations: Arc::new(locations),
            settings,
            current_user_id,
            writer: PersistenceWriter::spawn(storage),
        }
    }

    /// Loads from the JSON files under the configured data directory
    pub async fn open(config: &TrackerConfig) -> Self {
        Self::load(Arc::new(FileKeyValueStore::new(&config.data_dir))).await
    }

    /// Waits for all queued writes to reach storage
    pub async fn flush(&self) -> Result<(), AppError> {
        Ok(self.writer.flush().await?)
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn games(&self) -> &[Game] {
        &self.games
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            users: Arc::clone(&self.users),
            games: Arc::clone(&self.games),
            matches: Arc::clone(&self.matches),
            players: Arc::clone(&self.players),
            locations: Arc::clone(&self.locations),
        }
    }

    pub fn current_user(&self) -> Option<&User> {
        let id = self.current_user_id.as_deref()?;
        self.users.iter().find(|user| user.id == id)
    }

    pub fn game(&self, game_id: &str) -> Option<&Game> {
        self.games.iter().find(|game| game.id == game_id)
    }

    fn require_user_id(&self) -> Result<String, AppError> {
        self.current_user()
            .map(|user| user.id.clone())
            .ok_or(AppError::NoCurrentUser)
    }

    /// Creates an account, signs it in and adds a player linked to it so
    /// the new user can be entered into matches.
    #[instrument(skip(self, email))]
    pub fn register_user(
        &mut self,
        name: &str,
        handle: &str,
        email: &str,
    ) -> Result<User, AppError> {
        let name = required(name, "Name")?;
        let handle = required(handle, "Handle")?;

        let normalized = normalize_name(handle);
        if self
            .users
            .iter()
            .any(|user| normalize_name(&user.handle) == normalized)
        {
            return Err(AppError::validation(format!(
                "Handle '{handle}' is already taken"
            )));
        }

        let user = User::new(name, handle, email.trim());
        let player = Player::new(name).linked_to(&user.id);

        commit(&self.writer, StorageKey::Users, &mut self.users, |users| {
            users.push(user.clone())
        });
        commit(&self.writer, StorageKey::Players, &mut self.players, |players| {
            players.push(player)
        });
        self.set_session(Some(user.id.clone()));

        info!(user_id = %user.id, handle = %user.handle, "User registered");
        Ok(user)
    }

    /// Signs in by handle; there are no credentials
    #[instrument(skip(self))]
    pub fn sign_in(&mut self, handle: &str) -> Result<User, AppError> {
        let normalized = normalize_name(handle);
        let user = self
            .users
            .iter()
            .find(|user| normalize_name(&user.handle) == normalized)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("No user with handle '{handle}'")))?;

        self.set_session(Some(user.id.clone()));
        info!(user_id = %user.id, "User signed in");
        Ok(user)
    }

    pub fn sign_out(&mut self) {
        if let Some(user_id) = self.current_user_id.as_deref() {
            info!(user_id = %user_id, "User signed out");
        }
        self.set_session(None);
    }

    #[instrument(skip(self, update))]
    pub fn update_user_profile(&mut self, update: ProfileUpdate) -> Result<User, AppError> {
        let user_id = self.require_user_id()?;
        let name = update.name.as_deref().map(|name| required(name, "Name")).transpose()?;

        let mut updated = None;
        commit(&self.writer, StorageKey::Users, &mut self.users, |users| {
            if let Some(user) = users.iter_mut().find(|user| user.id == user_id) {
                if let Some(name) = name {
                    user.name = name.to_string();
                }
                if let Some(image) = update.image {
                    user.image = Some(image);
                }
                updated = Some(user.clone());
            }
        });

        updated.ok_or_else(|| AppError::not_found(format!("User {user_id}")))
    }

    fn set_session(&mut self, user_id: Option<String>) {
        match &user_id {
            Some(id) => self.writer.save(StorageKey::SessionUserId, id),
            None => self.writer.remove(StorageKey::SessionUserId),
        }
        self.current_user_id = user_id;
    }

    /// Adds a game to the catalog. Titles are unique ignoring case and
    /// surrounding whitespace; custom score columns must form a valid sheet.
    #[instrument(skip(self, game), fields(title = %game.title))]
    pub fn add_game(&mut self, mut game: Game) -> Result<Game, AppError> {
        self.validate_game(&game, None)?;

        game.title = game.title.trim().to_string();
        if game.created_by.is_none() {
            game.created_by = self.current_user_id.clone();
        }

        commit(&self.writer, StorageKey::Games, &mut self.games, |games| {
            games.push(game.clone())
        });

        info!(game_id = %game.id, "Game added");
        Ok(game)
    }

    #[instrument(skip(self, game), fields(game_id = %game.id))]
    pub fn update_game(&mut self, mut game: Game) -> Result<Game, AppError> {
        if self.game(&game.id).is_none() {
            return Err(AppError::not_found(format!("Game {}", game.id)));
        }
        self.validate_game(&game, Some(&game.id))?;
        game.title = game.title.trim().to_string();

        commit(&self.writer, StorageKey::Games, &mut self.games, |games| {
            if let Some(slot) = games.iter_mut().find(|existing| existing.id == game.id) {
                *slot = game.clone();
            }
        });

        info!("Game updated");
        Ok(game)
    }

    /// Removes a game. Its matches stay in history and drop out of every
    /// aggregate as orphans.
    #[instrument(skip(self))]
    pub fn delete_game(&mut self, game_id: &str) -> Result<Game, AppError> {
        let removed = self
            .game(game_id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Game {game_id}")))?;

        commit(&self.writer, StorageKey::Games, &mut self.games, |games| {
            games.retain(|game| game.id != game_id)
        });

        info!(title = %removed.title, "Game deleted");
        Ok(removed)
    }

    fn validate_game(&self, game: &Game, existing_id: Option<&str>) -> Result<(), AppError> {
        let title = required(&game.title, "Title")?;
        let normalized = normalize_name(title);

        let duplicate = self
            .games
            .iter()
            .filter(|other| Some(other.id.as_str()) != existing_id)
            .any(|other| normalize_name(&other.title) == normalized);
        if duplicate {
            return Err(AppError::validation(format!(
                "A game titled '{title}' already exists"
            )));
        }

        if let (Some(min), Some(max)) = (game.min_players, game.max_players) {
            if min > max {
                return Err(AppError::validation(
                    "Minimum players cannot exceed maximum players",
                ));
            }
        }

        let every_extension: Vec<String> =
            game.extensions.iter().map(|ext| ext.id.clone()).collect();
        ScoreSheet::for_game(game, &every_extension)?;
        Ok(())
    }

    #[instrument(skip(self, player), fields(name = %player.name))]
    pub fn add_player(&mut self, mut player: Player) -> Result<Player, AppError> {
        player.name = required(&player.name, "Player name")?.to_string();
        self.validate_link(&player)?;

        commit(&self.writer, StorageKey::Players, &mut self.players, |players| {
            players.push(player.clone())
        });

        info!(player_id = %player.id, "Player added");
        Ok(player)
    }

    #[instrument(skip(self, player), fields(player_id = %player.id))]
    pub fn update_player(&mut self, mut player: Player) -> Result<Player, AppError> {
        if !self.players.iter().any(|existing| existing.id == player.id) {
            return Err(AppError::not_found(format!("Player {}", player.id)));
        }
        player.name = required(&player.name, "Player name")?.to_string();
        self.validate_link(&player)?;

        commit(&self.writer, StorageKey::Players, &mut self.players, |players| {
            if let Some(slot) = players.iter_mut().find(|existing| existing.id == player.id) {
                *slot = player.clone();
            }
        });

        Ok(player)
    }

    /// Removes a player. Their results stay on recorded matches and are
    /// skipped by player statistics.
    #[instrument(skip(self))]
    pub fn delete_player(&mut self, player_id: &str) -> Result<Player, AppError> {
        let removed = self
            .players
            .iter()
            .find(|player| player.id == player_id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Player {player_id}")))?;

        commit(&self.writer, StorageKey::Players, &mut self.players, |players| {
            players.retain(|player| player.id != player_id)
        });

        Ok(removed)
    }

    fn validate_link(&self, player: &Player) -> Result<(), AppError> {
        match player.linked_user_id.as_deref() {
            Some(user_id) if !self.users.iter().any(|user| user.id == user_id) => Err(
                AppError::validation(format!("Cannot link player to unknown user {user_id}")),
            ),
            _ => Ok(()),
        }
    }

    pub fn add_location(&mut self, mut location: Location) -> Result<Location, AppError> {
        location.name = required(&location.name, "Location name")?.to_string();

        commit(&self.writer, StorageKey::Locations, &mut self.locations, |locations| {
            locations.push(location.clone())
        });

        Ok(location)
    }

    pub fn delete_location(&mut self, location_id: &str) -> Result<Location, AppError> {
        let removed = self
            .locations
            .iter()
            .find(|location| location.id == location_id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Location {location_id}")))?;

        commit(&self.writer, StorageKey::Locations, &mut self.locations, |locations| {
            locations.retain(|location| location.id != location_id)
        });

        Ok(removed)
    }

    /// Records a match as the current user.
    ///
    /// For custom-scored games each result's `score_breakdown` holds the
    /// entered column values; the full breakdown and score are recomputed
    /// from the game's score sheet and any formula failure rejects the match.
    #[instrument(skip(self, draft), fields(game_id = %draft.game_id))]
    pub fn record_match(&mut self, draft: MatchDraft) -> Result<Match, AppError> {
        let user_id = self.require_user_id()?;
        let results = self.prepare_results(
            &draft.game_id,
            &draft.extension_ids,
            draft.location_id.as_deref(),
            draft.results,
        )?;

        let mut game_match = Match::new(draft.game_id, draft.date, user_id, results);
        game_match.created_at = self.next_created_at();
        game_match.extension_ids = draft.extension_ids;
        game_match.location_id = draft.location_id;
        game_match.notes = draft.notes;

        commit(&self.writer, StorageKey::Matches, &mut self.matches, |matches| {
            matches.push(game_match.clone())
        });

        info!(
            match_id = %game_match.id,
            results = game_match.results.len(),
            "Match recorded"
        );
        Ok(game_match)
    }

    /// Corrects a match the current user can see. Recorder and creation
    /// time are kept from the stored match.
    #[instrument(skip(self, corrected), fields(match_id = %corrected.id))]
    pub fn update_match(&mut self, corrected: Match) -> Result<Match, AppError> {
        let stored = self.visible_match(&corrected.id)?.clone();
        let results = self.prepare_results(
            &corrected.game_id,
            &corrected.extension_ids,
            corrected.location_id.as_deref(),
            corrected.results,
        )?;

        let updated = Match {
            results,
            created_by: stored.created_by,
            created_at: stored.created_at,
            ..corrected
        };

        commit(&self.writer, StorageKey::Matches, &mut self.matches, |matches| {
            if let Some(slot) = matches.iter_mut().find(|m| m.id == updated.id) {
                *slot = updated.clone();
            }
        });

        info!("Match updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub fn delete_match(&mut self, match_id: &str) -> Result<Match, AppError> {
        let removed = self.visible_match(match_id)?.clone();

        commit(&self.writer, StorageKey::Matches, &mut self.matches, |matches| {
            matches.retain(|m| m.id != match_id)
        });

        info!("Match deleted");
        Ok(removed)
    }

    /// Recording time for a new match, strictly after every stored one
    fn next_created_at(&self) -> DateTime<Utc> {
        let now = Utc::now();
        match self.matches.iter().map(|m| m.created_at).max() {
            Some(latest) if latest >= now => latest + Duration::milliseconds(1),
            _ => now,
        }
    }

    fn visible_match(&self, match_id: &str) -> Result<&Match, AppError> {
        let user_id = self.require_user_id()?;
        let linked = stats::linked_player_ids(&user_id, &self.players);

        self.matches
            .iter()
            .find(|m| m.id == match_id)
            .filter(|m| stats::is_visible(m, &user_id, &linked))
            .ok_or_else(|| AppError::not_found(format!("Match {match_id}")))
    }

    fn prepare_results(
        &self,
        game_id: &str,
        extension_ids: &[String],
        location_id: Option<&str>,
        mut results: Vec<MatchResult>,
    ) -> Result<Vec<MatchResult>, AppError> {
        let game = self
            .game(game_id)
            .ok_or_else(|| AppError::not_found(format!("Game {game_id}")))?;

        if results.is_empty() {
            return Err(AppError::validation("A match needs at least one result"));
        }

        let mut seen = HashSet::new();
        for result in &results {
            if !self.players.iter().any(|p| p.id == result.player_id) {
                return Err(AppError::not_found(format!("Player {}", result.player_id)));
            }
            if !seen.insert(result.player_id.as_str()) {
                return Err(AppError::validation(format!(
                    "Player {} appears twice in one match",
                    result.player_id
                )));
            }
            if game.game_type == GameType::Team && result.team_id.is_none() {
                return Err(AppError::validation(format!(
                    "Team games need a team for player {}",
                    result.player_id
                )));
            }
        }

        if let Some(unknown) = extension_ids.iter().find(|id| game.extension(id).is_none()) {
            return Err(AppError::validation(format!(
                "Extension {unknown} does not belong to {}",
                game.title
            )));
        }

        if let Some(location_id) = location_id {
            if !self.locations.iter().any(|l| l.id == location_id) {
                return Err(AppError::not_found(format!("Location {location_id}")));
            }
        }

        let sheet = ScoreSheet::for_game(game, extension_ids)?;
        if !sheet.is_empty() {
            for result in &mut results {
                let entered = result.score_breakdown.take().unwrap_or_default();
                let (score, breakdown) = sheet.score_result(&entered)?;
                debug!(player_id = %result.player_id, score, "Scored custom result");
                result.score = score;
                result.score_breakdown = Some(breakdown);
            }
        }

        Ok(results)
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.settings.theme = theme;
        self.writer.save(StorageKey::Settings, &self.settings);
        debug!(theme = theme.as_ref(), "Theme changed");
    }

    /// Matches visible to the current user, newest first. Nobody signed in
    /// sees nothing.
    pub fn visible_matches(&self) -> Vec<&Match> {
        let Some(user) = self.current_user() else {
            return Vec::new();
        };
        let mut visible = stats::visible_matches(&self.matches, user, &self.players);
        stats::sort_recent_first(&mut visible);
        visible
    }

    pub fn game_views(&self) -> Vec<GameView> {
        stats::derive_game_views(&self.games, &self.visible_matches())
    }

    pub fn game_view(&self, game_id: &str) -> Result<GameView, AppError> {
        let game = self
            .game(game_id)
            .ok_or_else(|| AppError::not_found(format!("Game {game_id}")))?;
        Ok(stats::derive_game_view(game, &self.visible_matches()))
    }

    pub fn player_stats(&self) -> Vec<PlayerStats> {
        stats::player_stats(&self.visible_matches(), &self.players, &self.games)
    }

    /// Exports the current user's visible matches of one game
    pub fn export_matches(&self, game_id: &str) -> Result<MatchExport, AppError> {
        self.require_user_id()?;
        let game = self
            .game(game_id)
            .ok_or_else(|| AppError::not_found(format!("Game {game_id}")))?;

        Ok(transfer::export_matches(
            game,
            &self.visible_matches(),
            &self.players,
        ))
    }

    /// Imports a payload onto `target_game_id`, creating players and
    /// extensions per `options`. Unresolved entries are reported and the
    /// matches that need them are left out.
    #[instrument(skip(self, payload, options), fields(source = %payload.source_game_title))]
    pub fn import_matches(
        &mut self,
        payload: &MatchExport,
        target_game_id: &str,
        options: &ImportOptions,
    ) -> Result<ImportReport, AppError> {
        let user_id = self.require_user_id()?;
        let game = self
            .game(target_game_id)
            .ok_or_else(|| AppError::not_found(format!("Game {target_game_id}")))?;

        let plan = transfer::plan_import(payload, game, &self.players, &user_id, options)?;

        if !plan.new_players.is_empty() {
            commit(&self.writer, StorageKey::Players, &mut self.players, |players| {
                players.extend(plan.new_players.iter().cloned())
            });
        }
        if !plan.new_extensions.is_empty() {
            commit(&self.writer, StorageKey::Games, &mut self.games, |games| {
                if let Some(game) = games.iter_mut().find(|g| g.id == target_game_id) {
                    game.extensions.extend(plan.new_extensions.iter().cloned());
                }
            });
        }
        if !plan.matches.is_empty() {
            commit(&self.writer, StorageKey::Matches, &mut self.matches, |matches| {
                matches.extend(plan.matches.iter().cloned())
            });
        }

        let report = ImportReport {
            imported: plan.matches.len(),
            skipped: plan.skipped_matches,
            created_players: plan.new_players,
            created_extensions: plan.new_extensions,
            unresolved_players: plan.unresolved_players,
            unresolved_extensions: plan.unresolved_extensions,
        };

        info!(
            imported = report.imported,
            skipped = report.skipped,
            "Matches imported"
        );
        Ok(report)
    }
}

/// Replaces one collection copy-on-write and queues it for persistence
fn commit<T, F>(writer: &PersistenceWriter, key: StorageKey, slot: &mut Arc<Vec<T>>, edit: F)
where
    T: Clone + Serialize,
    F: FnOnce(&mut Vec<T>),
{
    edit(Arc::make_mut(slot));
    writer.save(key, slot.as_slice());
}

fn required<'a>(value: &'a str, field: &str) -> Result<&'a str, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(AppError::validation(format!("{field} cannot be empty")))
    } else {
        Ok(trimmed)
    }
}
