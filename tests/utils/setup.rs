//! Tracker fixtures: an in-memory installation with registered users
#![allow(dead_code)] // Test utilities may not all be used in every test

use std::sync::Arc;

use tabletally::models::Player;
use tabletally::{AppState, InMemoryKeyValueStore};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TrackerSetup {
    pub state: AppState,
    pub storage: Arc<InMemoryKeyValueStore>,
}

impl TrackerSetup {
    /// Id of the player named `name` (user-linked players carry the handle)
    pub fn player(&self, name: &str) -> String {
        self.state
            .players()
            .iter()
            .find(|player| player.name == name)
            .map(|player| player.id.clone())
            .unwrap_or_else(|| panic!("no player named {name}"))
    }

    pub fn sign_in(&mut self, handle: &str) {
        self.state.sign_in(handle).expect("user should exist");
    }

    /// Flushes pending writes and loads a second state from the same storage
    pub async fn reload(&self) -> AppState {
        self.state.flush().await.expect("writer should be running");
        AppState::load(self.storage.clone()).await
    }
}

pub struct TrackerSetupBuilder {
    users: Vec<String>,
    guests: Vec<String>,
}

impl TrackerSetupBuilder {
    pub fn new() -> Self {
        Self {
            users: vec![],
            guests: vec![],
        }
    }

    pub fn with_users(mut self, handles: Vec<&str>) -> Self {
        self.users = handles.into_iter().map(|s| s.to_string()).collect();
        self
    }

    /// Unlinked players, added by the first user
    pub fn with_guests(mut self, names: Vec<&str>) -> Self {
        self.guests = names.into_iter().map(|s| s.to_string()).collect();
        self
    }

    /// Registers every user, then signs in as the first one
    pub async fn build(self) -> TrackerSetup {
        let storage = Arc::new(InMemoryKeyValueStore::new());
        let mut state = AppState::load(storage.clone()).await;

        for handle in &self.users {
            state
                .register_user(handle, handle, &format!("{handle}@example.com"))
                .expect("registration should succeed");
        }
        if let Some(first) = self.users.first() {
            state.sign_in(first).expect("first user should exist");
        }
        for guest in &self.guests {
            state
                .add_player(Player::new(guest.as_str()))
                .expect("guest should be added");
        }

        TrackerSetup { state, storage }
    }
}
