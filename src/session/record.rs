// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session record encoding.

use serde::{Deserialize, Serialize};

/// Key namespace for session records.
pub const SESSION_KEY_PREFIX: &str = "session:";

/// Build the store key for a session id.
pub fn session_key(session_id: &str) -> String {
    format!("{SESSION_KEY_PREFIX}{session_id}")
}

/// A session written by the web tier at login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub username: String,
    /// Unix timestamp of the login that created the record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

impl SessionRecord {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            created_at: Some(chrono::Utc::now().timestamp()),
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode a stored record. A record without a usable username is an error.
    pub fn decode(raw: &str) -> Result<Self, String> {
        let record: SessionRecord = serde_json::from_str(raw).map_err(|e| e.to_string())?;
        if record.username.trim().is_empty() {
            return Err("session record has an empty username".to_string());
        }
        Ok(record)
    }
}
