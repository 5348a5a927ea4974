// Records persisted by the tracker. Field names serialize in camelCase so
// blobs written by earlier builds stay readable.

pub mod dates;
pub mod ids;

mod game;
mod location;
mod matches;
mod player;
mod settings;
mod user;

pub use game::{Game, GameExtension, GameType, ScoreType};
pub use location::Location;
pub use matches::{Match, MatchResult};
pub use player::Player;
pub use settings::{Settings, Theme};
pub use user::{ProfileUpdate, User};
