use std::collections::HashSet;

use tracing::debug;

use crate::models::{Match, Player, User};

/// Ids of the players linked to `user_id`
pub fn linked_player_ids<'a>(user_id: &str, players: &'a [Player]) -> HashSet<&'a str> {
    players
        .iter()
        .filter(|player| player.is_linked_to(user_id))
        .map(|player| player.id.as_str())
        .collect()
}

/// A match is visible to the user who recorded it and to every user linked
/// to one of its participants.
pub fn is_visible(game_match: &Match, user_id: &str, linked_players: &HashSet<&str>) -> bool {
    game_match.created_by == user_id
        || game_match
            .results
            .iter()
            .any(|result| linked_players.contains(result.player_id.as_str()))
}

/// Matches `user` may see, in their stored order
pub fn visible_matches<'a>(all_matches: &'a [Match], user: &User, players: &[Player]) -> Vec<&'a Match> {
    let linked = linked_player_ids(&user.id, players);
    let visible: Vec<&Match> = all_matches
        .iter()
        .filter(|game_match| is_visible(game_match, &user.id, &linked))
        .collect();

    debug!(
        user_id = %user.id,
        linked_players = linked.len(),
        total = all_matches.len(),
        visible = visible.len(),
        "Filtered visible matches"
    );

    visible
}

/// Newest first by creation time
pub fn sort_recent_first(matches: &mut [&Match]) {
    matches.sort_by(|a, b| b.cmp_recency(a));
}
