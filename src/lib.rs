// Library crate for the board game tracker.
// Everything runs in-process: embedders load an `AppState`, call its
// operations and read the derived views back.

pub mod config;
pub mod logging;
pub mod models;
pub mod scoring;
pub mod shared;
pub mod stats;
pub mod storage;
pub mod store;
pub mod transfer;

// Re-export commonly used types for easier access in tests
pub use config::TrackerConfig;
pub use logging::init_tracing;
pub use shared::AppError;
pub use stats::{GameView, LastPlayed, PlayerStats};
pub use storage::{FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore, StorageKey};
pub use store::{AppState, ImportReport, MatchDraft, Snapshot};
pub use transfer::{ImportOptions, MatchExport, UnmatchedPolicy};
