use strum_macros::{AsRefStr, Display, EnumIter};

/// Fixed logical names under which the tracker persists its state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum StorageKey {
    Users,
    Games,
    Matches,
    Players,
    Locations,
    Settings,
    SessionUserId,
}
