use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{keys::StorageKey, repository::KeyValueStore};

/// Reads and decodes the document under `key`.
///
/// Absent, unreadable or malformed documents all yield `T::default()`; the
/// failure is logged and never reaches the caller.
pub async fn load_or_default<T>(store: &dyn KeyValueStore, key: StorageKey) -> T
where
    T: DeserializeOwned + Default,
{
    let raw = match store.load(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!(key = %key, "Nothing stored, using defaults");
            return T::default();
        }
        Err(e) => {
            warn!(key = %key, error = %e, "Could not read stored document, using defaults");
            return T::default();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(key = %key, error = %e, "Stored document is malformed, using defaults");
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Player, Settings, Theme};
    use crate::storage::InMemoryKeyValueStore;

    #[tokio::test]
    async fn absent_key_yields_empty_collection() {
        let store = InMemoryKeyValueStore::new();
        let players: Vec<Player> = load_or_default(&store, StorageKey::Players).await;
        assert!(players.is_empty());
    }

    #[tokio::test]
    async fn malformed_document_yields_empty_collection() {
        let store = InMemoryKeyValueStore::with_entries(vec![
            (StorageKey::Players, "{not json".into()),
            (StorageKey::Settings, "[1, 2, 3]".into()),
        ]);

        let players: Vec<Player> = load_or_default(&store, StorageKey::Players).await;
        let settings: Settings = load_or_default(&store, StorageKey::Settings).await;

        assert!(players.is_empty());
        assert_eq!(settings.theme, Theme::System);
    }

    #[tokio::test]
    async fn stored_document_is_decoded() {
        let store = InMemoryKeyValueStore::with_entries(vec![(
            StorageKey::Players,
            r#"[{"id": "p1", "name": "Alex", "linkedUserId": "u1"}]"#.into(),
        )]);

        let players: Vec<Player> = load_or_default(&store, StorageKey::Players).await;
        assert_eq!(players.len(), 1);
        assert!(players[0].is_linked_to("u1"));
    }
}
