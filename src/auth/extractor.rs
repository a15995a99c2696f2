// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for resolved identities.
//!
//! Use the `Identity` extractor in handlers to require a caller:
//!
//! ```rust,ignore
//! async fn my_handler(Identity(caller): Identity) -> impl IntoResponse {
//!     // caller is ResolvedIdentity
//! }
//! ```
//!
//! Rejections are [`IdentityError`]s, so every endpoint maps failures to the
//! same status codes.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::request::Parts,
};
use tracing::{debug, warn};

use super::{IdentityError, ResolvedIdentity};
use crate::state::AppState;

/// Extractor for the caller of an API request.
pub struct Identity(pub ResolvedIdentity);

impl FromRequestParts<AppState> for Identity {
    type Rejection = IdentityError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Already resolved earlier in this request
        if let Some(identity) = parts.extensions.get::<ResolvedIdentity>().cloned() {
            return Ok(Identity(identity));
        }

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        match state.resolver.resolve(&parts.headers, peer).await {
            Ok(identity) => {
                debug!(username = %identity.username, source = ?identity.source, "Resolved caller");
                parts.extensions.insert(identity.clone());
                Ok(Identity(identity))
            }
            Err(e) if e.is_server_side() => {
                warn!(error_code = e.error_code(), "Identity resolution failed");
                Err(e)
            }
            Err(e) => {
                debug!(error_code = e.error_code(), "Rejected unauthenticated request");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{CredentialScheme, IdentityResolver, IdentitySource, TokenCodec};
    use crate::session::{MemoryBackend, SessionRecord, SessionStore};
    use axum::http::Request;
    use std::sync::Arc;
    use std::time::Duration;

    /// Helper to create a test AppState backed by an in-memory store
    async fn create_test_state() -> (AppState, TokenCodec) {
        let codec = TokenCodec::new("secret", "salt", CredentialScheme::Reference).unwrap();
        let store = SessionStore::from_backend(
            Arc::new(MemoryBackend::default()),
            Duration::from_millis(500),
        );
        store
            .put("sid_123", &SessionRecord::new("alice"), Duration::from_secs(60))
            .await
            .unwrap();
        let state = AppState::new(IdentityResolver::new(Some(codec.clone()), store));
        (state, codec)
    }

    #[tokio::test]
    async fn identity_extractor_requires_credential() {
        let (state, _) = create_test_state().await;
        let mut parts = Request::builder()
            .uri("/test")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let result = Identity::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(IdentityError::NoCredential)));
    }

    #[tokio::test]
    async fn identity_extractor_resolves_session_header() {
        let (state, codec) = create_test_state().await;
        let mut parts = Request::builder()
            .uri("/test")
            .header("X-Session", codec.sign("sid_123"))
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let Identity(identity) = Identity::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(identity.username, "alice");
        assert!(parts.extensions.get::<ResolvedIdentity>().is_some());
    }

    #[tokio::test]
    async fn identity_extractor_prefers_extensions() {
        let (state, _) = create_test_state().await;
        let mut parts = Request::builder()
            .uri("/test")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        parts.extensions.insert(ResolvedIdentity::new(
            "resolved_earlier",
            IdentitySource::TrustedHeader,
        ));

        let result = Identity::from_request_parts(&mut parts, &state).await;
        assert_eq!(result.unwrap().0.username, "resolved_earlier");
    }

    #[tokio::test]
    async fn identity_extractor_passes_peer_address() {
        let proxy: SocketAddr = "10.1.0.1:40000".parse().unwrap();
        let state = AppState::new(
            IdentityResolver::new(None, SessionStore::degraded("unused")).with_trusted_header(
                crate::auth::TrustedHeaderPolicy::from_peers(vec![proxy.ip()]),
            ),
        );

        let mut parts = Request::builder()
            .uri("/test")
            .header("X-User", "proxied")
            .body(())
            .unwrap()
            .into_parts()
            .0;
        parts.extensions.insert(ConnectInfo(proxy));

        let Identity(identity) = Identity::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(identity.username, "proxied");
    }
}
