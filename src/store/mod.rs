// The tracker's in-memory state and the background writer persisting it.

pub use app_state::{AppState, ImportReport, MatchDraft, Snapshot};
pub use writer::PersistenceWriter;

mod app_state;
mod writer;
