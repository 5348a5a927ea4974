// Moving match history between installations: exporting one game's matches
// and importing them onto locally existing players and extensions.

pub use errors::TransferError;
pub use import::{plan_import, ImportOptions, ImportPlan, UnmatchedPolicy};
pub use payload::{export_matches, ExtensionRef, MatchExport, PlayerRef, EXPORT_TYPE, EXPORT_VERSION};

mod errors;
mod import;
mod payload;
