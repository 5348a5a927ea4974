use std::collections::HashMap;

use tracing::debug;

use super::models::{GameView, LastPlayed, PlayerStats};
use crate::models::{Game, Match, Player};

/// Play count and last-played label of `game` over `visible_matches`.
///
/// Matches of other games are ignored, so the full visible list may be
/// passed. Pure: nothing is cached between calls.
pub fn derive_game_view(game: &Game, visible_matches: &[&Match]) -> GameView {
    let mut play_count = 0;
    let mut latest: Option<&Match> = None;

    for &game_match in visible_matches.iter().filter(|m| m.game_id == game.id) {
        play_count += 1;
        latest = match latest {
            Some(current) if current.cmp_recency(game_match).is_ge() => Some(current),
            _ => Some(game_match),
        };
    }

    GameView {
        game_id: game.id.clone(),
        title: game.title.clone(),
        play_count,
        last_played: latest.map_or(LastPlayed::Never, |m| LastPlayed::On(m.date)),
    }
}

/// Views for the whole catalog in catalog order. Matches whose game no
/// longer exists contribute to nothing.
pub fn derive_game_views(games: &[Game], visible_matches: &[&Match]) -> Vec<GameView> {
    let mut by_game: HashMap<&str, Vec<&Match>> = HashMap::new();
    for &game_match in visible_matches {
        by_game
            .entry(game_match.game_id.as_str())
            .or_default()
            .push(game_match);
    }

    let orphaned: usize = by_game
        .iter()
        .filter(|(game_id, _)| !games.iter().any(|game| game.id == **game_id))
        .map(|(_, matches)| matches.len())
        .sum();
    if orphaned > 0 {
        debug!(orphaned, "Ignoring matches of deleted games");
    }

    games
        .iter()
        .map(|game| {
            let matches = by_game
                .get(game.id.as_str())
                .map(Vec::as_slice)
                .unwrap_or_default();
            derive_game_view(game, matches)
        })
        .collect()
}

/// Per-player totals over `visible_matches`, best record first.
///
/// Matches are replayed oldest first so streaks follow play order. Matches
/// of deleted games and results of deleted players are skipped.
pub fn player_stats(visible_matches: &[&Match], players: &[Player], games: &[Game]) -> Vec<PlayerStats> {
    let mut ordered: Vec<&Match> = visible_matches
        .iter()
        .copied()
        .filter(|m| games.iter().any(|game| game.id == m.game_id))
        .collect();
    ordered.sort_by(|a, b| a.cmp_recency(b));

    let names: HashMap<&str, &str> = players
        .iter()
        .map(|player| (player.id.as_str(), player.name.as_str()))
        .collect();
    let mut stats: HashMap<&str, PlayerStats> = HashMap::new();

    for game_match in ordered {
        for result in &game_match.results {
            let Some(name) = names.get(result.player_id.as_str()) else {
                continue;
            };

            let player_stats = stats
                .entry(result.player_id.as_str())
                .or_insert_with(|| PlayerStats {
                    player_id: result.player_id.clone(),
                    name: name.to_string(),
                    ..PlayerStats::default()
                });

            player_stats.games_played += 1;
            player_stats.total_score += result.score;

            if result.is_winner {
                player_stats.wins += 1;
                player_stats.current_win_streak += 1;
                player_stats.best_win_streak = player_stats
                    .best_win_streak
                    .max(player_stats.current_win_streak);
            } else {
                player_stats.current_win_streak = 0;
            }
        }
    }

    let mut table: Vec<PlayerStats> = stats.into_values().collect();
    table.sort_by(|a, b| {
        b.wins
            .cmp(&a.wins)
            .then_with(|| b.win_rate().total_cmp(&a.win_rate()))
            .then_with(|| a.name.cmp(&b.name))
    });
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GameType, MatchResult};
    use crate::stats::NEVER_PLAYED;
    use chrono::{Duration, NaiveDate, Utc};

    fn game(id: &str) -> Game {
        let mut game = Game::new(id, GameType::Score);
        game.id = id.to_string();
        game
    }

    fn played(id: &str, game_id: &str, day: u32, results: Vec<MatchResult>) -> Match {
        let mut game_match = Match::new(
            game_id,
            NaiveDate::from_ymd_opt(2024, 4, day).unwrap(),
            "u1",
            results,
        );
        game_match.id = id.to_string();
        game_match.created_at = Utc::now() + Duration::hours(i64::from(day));
        game_match
    }

    fn named(id: &str) -> Player {
        let mut player = Player::new(id.to_uppercase());
        player.id = id.to_string();
        player
    }

    #[test]
    fn counts_matches_and_takes_latest_date() {
        let g = game("g");
        let matches = vec![
            played("20", "g", 2, vec![]),
            played("30", "g", 3, vec![]),
            played("10", "g", 1, vec![]),
            played("40", "other", 9, vec![]),
        ];
        let visible: Vec<&Match> = matches.iter().collect();

        let view = derive_game_view(&g, &visible);
        assert_eq!(view.play_count, 3);
        assert_eq!(
            view.last_played,
            LastPlayed::On(NaiveDate::from_ymd_opt(2024, 4, 3).unwrap())
        );
        assert_eq!(view.last_played.to_string(), "2024-04-03");
        assert_eq!(derive_game_view(&g, &visible), view);
    }

    #[test]
    fn no_visible_matches_is_never_played() {
        let mut g = game("g");
        g.play_count = Some(12);
        g.last_played = Some("1/1/2020".into());

        let view = derive_game_view(&g, &[]);
        assert_eq!(view.play_count, 0);
        assert_eq!(view.last_played, LastPlayed::Never);
        assert_eq!(view.last_played.to_string(), NEVER_PLAYED);
    }

    #[test]
    fn catalog_views_skip_orphans() {
        let games = vec![game("a"), game("b")];
        let matches = vec![played("1", "a", 1, vec![]), played("2", "deleted", 2, vec![])];
        let visible: Vec<&Match> = matches.iter().collect();

        let views = derive_game_views(&games, &visible);
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].play_count, 1);
        assert_eq!(views[1].play_count, 0);
    }

    #[test]
    fn player_stats_track_streaks_in_play_order() {
        let games = vec![game("g")];
        let players = vec![named("p1"), named("p2")];
        let matches = vec![
            played("3", "g", 3, vec![MatchResult::new("p1", 4.0), MatchResult::new("p2", 9.0).winner()]),
            played("1", "g", 1, vec![MatchResult::new("p1", 10.0).winner(), MatchResult::new("p2", 2.0)]),
            played("2", "g", 2, vec![MatchResult::new("p1", 8.0).winner(), MatchResult::new("p2", 5.0)]),
        ];
        let visible: Vec<&Match> = matches.iter().collect();

        let table = player_stats(&visible, &players, &games);
        assert_eq!(table[0].player_id, "p1");
        assert_eq!(table[0].wins, 2);
        assert_eq!(table[0].best_win_streak, 2);
        assert_eq!(table[0].current_win_streak, 0);
        assert_eq!(table[0].total_score, 22.0);

        assert_eq!(table[1].name, "P2");
        assert_eq!(table[1].current_win_streak, 1);
        assert!((table[1].win_rate() - 1.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn player_stats_skip_orphans() {
        let games = vec![game("g")];
        let players = vec![named("p1")];
        let matches = vec![
            played("1", "g", 1, vec![MatchResult::new("p1", 1.0), MatchResult::new("ghost", 5.0).winner()]),
            played("2", "deleted", 2, vec![MatchResult::new("p1", 7.0).winner()]),
        ];
        let visible: Vec<&Match> = matches.iter().collect();

        let table = player_stats(&visible, &players, &games);
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].games_played, 1);
        assert_eq!(table[0].wins, 0);
    }
}
