#![allow(dead_code)]

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tabletally::models::{Game, GameExtension, GameType, MatchResult};
use tabletally::scoring::ScoreColumn;

use super::setup::TrackerSetup;

/// Day of March 2024
pub fn day(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, day).expect("valid March date")
}

// ============================================================================
// Catalog Builders
// ============================================================================

pub struct GameBuilder {
    game: Game,
}

impl GameBuilder {
    pub fn new(title: &str) -> Self {
        Self {
            game: Game::new(title, GameType::Score),
        }
    }

    pub fn team(mut self) -> Self {
        self.game.game_type = GameType::Team;
        self
    }

    pub fn with_columns(mut self, columns: Vec<ScoreColumn>) -> Self {
        self.game = self.game.with_custom_columns(columns);
        self
    }

    pub fn with_extension(mut self, title: &str, columns: Vec<ScoreColumn>) -> Self {
        self.game = self
            .game
            .with_extension(GameExtension::new(title).with_columns(columns));
        self
    }

    pub fn build(self) -> Game {
        self.game
    }
}

// ============================================================================
// Match Result Builders
// ============================================================================

/// Builds results by player name against a setup's roster
pub struct ResultsBuilder<'a> {
    setup: &'a TrackerSetup,
    results: Vec<MatchResult>,
}

impl<'a> ResultsBuilder<'a> {
    pub fn new(setup: &'a TrackerSetup) -> Self {
        Self {
            setup,
            results: vec![],
        }
    }

    pub fn score(mut self, name: &str, score: f64) -> Self {
        self.results
            .push(MatchResult::new(self.setup.player(name), score));
        self
    }

    pub fn winner(mut self, name: &str, score: f64) -> Self {
        self.results
            .push(MatchResult::new(self.setup.player(name), score).winner());
        self
    }

    /// Entered column values; the final score is computed on recording
    pub fn columns(mut self, name: &str, values: &[(&str, f64)]) -> Self {
        let mut result = MatchResult::new(self.setup.player(name), 0.0);
        result.score_breakdown = Some(
            values
                .iter()
                .map(|(column, value)| (column.to_string(), *value))
                .collect::<BTreeMap<_, _>>(),
        );
        self.results.push(result);
        self
    }

    pub fn build(self) -> Vec<MatchResult> {
        self.results
    }
}
