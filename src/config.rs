use std::path::PathBuf;

const DEFAULT_DATA_DIR: &str = "./tabletally-data";
const DEFAULT_LOG_FILTER: &str = "tabletally=info";

/// Runtime configuration for the tracker
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    /// Directory holding one JSON file per storage key
    pub data_dir: PathBuf,
    /// `tracing_subscriber::EnvFilter` directive used by `init_tracing`
    pub log_filter: String,
}

impl TrackerConfig {
    pub fn from_env() -> Self {
        let data_dir = std::env::var("TABLETALLY_DATA_DIR")
            .ok()
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let log_filter = std::env::var("TABLETALLY_LOG")
            .unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());

        Self {
            data_dir,
            log_filter,
        }
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_log_filter(mut self, log_filter: impl Into<String>) -> Self {
        self.log_filter = log_filter.into();
        self
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}
