pub mod assertions;
pub mod builders;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use assertions::{GameViewAssertion, PlayerStatsAssertion};
#[allow(unused_imports)]
pub use builders::{day, GameBuilder, ResultsBuilder};
#[allow(unused_imports)]
pub use setup::{TrackerSetup, TrackerSetupBuilder};
