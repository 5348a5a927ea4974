//! Test assertion helpers - fluent API over the derived views
#![allow(dead_code)] // Test utilities may not all be used in every test

use chrono::NaiveDate;
use tabletally::{AppState, GameView, LastPlayed, PlayerStats};

// ============================================================================
// Assertion Helpers
// ============================================================================

pub struct GameViewAssertion {
    view: GameView,
}

impl GameViewAssertion {
    /// View of `game_id` as the signed-in user sees it
    pub fn for_game(state: &AppState, game_id: &str) -> Self {
        let view = state.game_view(game_id).expect("game should exist");
        Self { view }
    }

    pub fn played(self, expected: u32) -> Self {
        assert_eq!(
            self.view.play_count, expected,
            "{} play count",
            self.view.title
        );
        self
    }

    pub fn last_played_on(self, expected: NaiveDate) -> Self {
        assert_eq!(self.view.last_played, LastPlayed::On(expected));
        self
    }

    pub fn never_played(self) -> Self {
        assert_eq!(self.view.last_played, LastPlayed::Never);
        assert_eq!(self.view.last_played.to_string(), "never played");
        self
    }
}

pub struct PlayerStatsAssertion {
    stats: Vec<PlayerStats>,
}

impl PlayerStatsAssertion {
    pub fn for_state(state: &AppState) -> Self {
        Self {
            stats: state.player_stats(),
        }
    }

    fn row(&self, name: &str) -> &PlayerStats {
        self.stats
            .iter()
            .find(|row| row.name == name)
            .unwrap_or_else(|| panic!("no stats for {name}"))
    }

    pub fn ranked(self, expected: &[&str]) -> Self {
        let names: Vec<&str> = self.stats.iter().map(|row| row.name.as_str()).collect();
        assert_eq!(names, expected);
        self
    }

    pub fn record(self, name: &str, games_played: u32, wins: u32) -> Self {
        let row = self.row(name);
        assert_eq!(row.games_played, games_played, "{name} games played");
        assert_eq!(row.wins, wins, "{name} wins");
        self
    }

    pub fn streaks(self, name: &str, current: u32, best: u32) -> Self {
        let row = self.row(name);
        assert_eq!(row.current_win_streak, current, "{name} current streak");
        assert_eq!(row.best_win_streak, best, "{name} best streak");
        self
    }
}
