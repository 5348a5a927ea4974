// Derived views over the match history: which matches a user may see, and
// the per-game and per-player figures computed from them.

pub mod aggregation;
pub mod models;
pub mod visibility;

pub use aggregation::{derive_game_view, derive_game_views, player_stats};
pub use models::{GameView, LastPlayed, PlayerStats, NEVER_PLAYED};
pub use visibility::{is_visible, linked_player_ids, sort_recent_first, visible_matches};
