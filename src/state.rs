// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::auth::IdentityResolver;
use crate::session::SessionStore;
use crate::store::PeopleStore;

/// API tier state.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<IdentityResolver>,
    pub people: Arc<RwLock<PeopleStore>>,
}

impl AppState {
    pub fn new(resolver: IdentityResolver) -> Self {
        Self {
            resolver: Arc::new(resolver),
            people: Arc::new(RwLock::new(PeopleStore::new())),
        }
    }
}

impl Default for AppState {
    /// No signing secret and no store: every identity resolution fails closed.
    fn default() -> Self {
        Self::new(IdentityResolver::new(
            None,
            SessionStore::degraded("no session store configured"),
        ))
    }
}
