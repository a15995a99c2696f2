// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential issuance on the web tier.
//!
//! Login here is a cooperative step: the username is taken as given. The
//! issuer's job is only to make that username verifiable downstream.

use std::time::Duration;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use super::codec::{CredentialScheme, TokenCodec};
use crate::session::{SessionError, SessionRecord, SessionStore};

/// Longest accepted username, in characters.
pub const MAX_USERNAME_LEN: usize = 64;

/// Login could not produce a credential.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IssueError {
    #[error("{0}")]
    InvalidUsername(&'static str),
    #[error("session store is unavailable")]
    StoreUnavailable,
    #[error("session could not be stored: {0}")]
    Store(String),
}

impl From<SessionError> for IssueError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Unavailable(_) => IssueError::StoreUnavailable,
            other => IssueError::Store(other.to_string()),
        }
    }
}

/// A freshly minted credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCredential {
    pub credential: String,
    pub username: String,
    /// Set for reference credentials.
    pub session_id: Option<String>,
}

/// Mints credentials and owns the session lifecycle.
#[derive(Debug, Clone)]
pub struct SessionIssuer {
    codec: TokenCodec,
    store: SessionStore,
    session_ttl: Duration,
}

impl SessionIssuer {
    pub fn new(codec: TokenCodec, store: SessionStore, session_ttl: Duration) -> Self {
        Self {
            codec,
            store,
            session_ttl,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Issue a credential for `username`.
    ///
    /// Reference scheme: the record is written before anything is signed, so a
    /// store failure never produces a dangling credential.
    pub async fn issue(&self, username: &str) -> Result<IssuedCredential, IssueError> {
        let username = validate_username(username)?;

        match self.codec.scheme() {
            CredentialScheme::Reference => {
                let session_id = Uuid::new_v4().simple().to_string();
                self.store
                    .put(&session_id, &SessionRecord::new(username), self.session_ttl)
                    .await?;
                info!(username = %username, "Issued session");
                Ok(IssuedCredential {
                    credential: self.codec.sign(&session_id),
                    username: username.to_string(),
                    session_id: Some(session_id),
                })
            }
            CredentialScheme::SelfContained { .. } => {
                info!(username = %username, "Issued self-contained credential");
                Ok(IssuedCredential {
                    credential: self.codec.sign(username),
                    username: username.to_string(),
                    session_id: None,
                })
            }
        }
    }

    /// End the session behind `credential`.
    ///
    /// Credentials that do not verify have nothing to revoke. Self-contained
    /// credentials cannot be revoked and simply age out.
    pub async fn revoke(&self, credential: &str) -> Result<(), IssueError> {
        if !self.codec.scheme().uses_store() {
            return Ok(());
        }
        let Ok(session_id) = self.codec.verify(credential) else {
            return Ok(());
        };
        self.store.remove(&session_id).await?;
        info!("Revoked session");
        Ok(())
    }
}

fn validate_username(username: &str) -> Result<&str, IssueError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(IssueError::InvalidUsername("Username is required."));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(IssueError::InvalidUsername("Username is too long."));
    }
    if username.chars().any(char::is_control) {
        return Err(IssueError::InvalidUsername("Username contains invalid characters."));
    }
    Ok(username)
}
