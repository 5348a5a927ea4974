use serde::{Deserialize, Serialize};

use crate::shared::new_id;

/// A match participant. Players linked to a user make their matches
/// visible to that user; guests carry no link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    #[serde(deserialize_with = "crate::models::ids::deserialize")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::models::ids::optional"
    )]
    pub linked_user_id: Option<String>,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            image: None,
            linked_user_id: None,
        }
    }

    pub fn linked_to(mut self, user_id: impl Into<String>) -> Self {
        self.linked_user_id = Some(user_id.into());
        self
    }

    pub fn is_linked_to(&self, user_id: &str) -> bool {
        self.linked_user_id.as_deref() == Some(user_id)
    }
}
