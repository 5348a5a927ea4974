use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Not a match export payload: type '{kind}'")]
    UnsupportedPayload { kind: String },

    #[error("Export version {version} is newer than supported version {supported}")]
    UnsupportedVersion { version: u32, supported: u32 },

    #[error("Malformed export payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Manual mapping points at unknown local player '{player_id}'")]
    UnknownLocalPlayer { player_id: String },

    #[error("Manual mapping points at unknown local extension '{extension_id}'")]
    UnknownLocalExtension { extension_id: String },
}
