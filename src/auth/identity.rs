// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Resolved caller identity.

use serde::Serialize;
use utoipa::ToSchema;

/// How an identity was established.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentitySource {
    /// `X-User` set by a trusted edge proxy.
    TrustedHeader,
    /// Reference credential resolved through the session store.
    Session { session_id: String },
    /// Self-contained credential.
    SelfContained { issued_at: u64 },
}

/// The user a request acts on behalf of.
///
/// Computed once per request and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ResolvedIdentity {
    pub username: String,

    /// Resolution path (for logging, not serialized)
    #[serde(skip)]
    pub source: IdentitySource,
}

impl ResolvedIdentity {
    pub fn new(username: impl Into<String>, source: IdentitySource) -> Self {
        Self {
            username: username.into(),
            source,
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        match &self.source {
            IdentitySource::Session { session_id } => Some(session_id),
            _ => None,
        }
    }
}
