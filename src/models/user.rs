use serde::{Deserialize, Serialize};

use crate::shared::new_id;

/// A registered account. Exactly one user is current per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(deserialize_with = "crate::models::ids::deserialize")]
    pub id: String,
    pub name: String,
    pub handle: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl User {
    pub fn new(name: impl Into<String>, handle: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            handle: handle.into(),
            email: email.into(),
            image: None,
        }
    }
}

/// Editable profile fields; `None` leaves the stored value untouched
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub image: Option<String>,
}
