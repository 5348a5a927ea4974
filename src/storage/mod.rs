// Local persistence: an opaque key-value service holding flat JSON blobs.

pub use errors::StorageError;
pub use keys::StorageKey;
pub use loader::load_or_default;
pub use repository::{FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore};

mod errors;
mod keys;
mod loader;
mod repository;
