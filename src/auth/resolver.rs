// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-request identity resolution on the API tier.
//!
//! ## Resolution Order
//!
//! 1. `X-User`, only when the immediate peer is a configured edge proxy
//! 2. Credential from `X-Session`, else the `session` cookie
//! 3. Signature check with the shared secret and salt
//! 4. Session store lookup (reference credentials only)
//!
//! Each step either resolves, fails with an [`IdentityError`], or hands over
//! to the next. Nothing is retried within a request.

use std::net::IpAddr;

use axum::http::HeaderMap;
use tracing::debug;

use super::codec::{CredentialScheme, TokenCodec};
use super::error::IdentityError;
use super::identity::{IdentitySource, ResolvedIdentity};
use super::relay::{forwarded_credential, trusted_username};
use crate::session::SessionStore;

/// When the `X-User` header may be believed.
///
/// Only safe when every path to this service passes through a proxy that
/// strips or overwrites `X-User` on externally originated requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TrustedHeaderPolicy {
    /// `X-User` is always ignored.
    #[default]
    Disabled,
    /// `X-User` is honoured only from these peer addresses.
    TrustedPeers(Vec<IpAddr>),
}

impl TrustedHeaderPolicy {
    /// Build a policy from a proxy allowlist; an empty list disables the header.
    pub fn from_peers(peers: Vec<IpAddr>) -> Self {
        if peers.is_empty() {
            TrustedHeaderPolicy::Disabled
        } else {
            TrustedHeaderPolicy::TrustedPeers(peers.into_iter().map(|ip| ip.to_canonical()).collect())
        }
    }

    fn allows(&self, peer: Option<IpAddr>) -> bool {
        match (self, peer) {
            (TrustedHeaderPolicy::TrustedPeers(peers), Some(peer)) => {
                peers.contains(&peer.to_canonical())
            }
            _ => false,
        }
    }
}

/// Turns an inbound request into a [`ResolvedIdentity`].
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    codec: Option<TokenCodec>,
    store: SessionStore,
    trusted_header: TrustedHeaderPolicy,
}

impl IdentityResolver {
    /// `codec` is `None` when no signing secret is configured.
    pub fn new(codec: Option<TokenCodec>, store: SessionStore) -> Self {
        Self {
            codec,
            store,
            trusted_header: TrustedHeaderPolicy::Disabled,
        }
    }

    pub fn with_trusted_header(mut self, policy: TrustedHeaderPolicy) -> Self {
        self.trusted_header = policy;
        self
    }

    pub fn signing_configured(&self) -> bool {
        self.codec.is_some()
    }

    pub fn scheme(&self) -> Option<CredentialScheme> {
        self.codec.as_ref().map(TokenCodec::scheme)
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Resolve the caller of one request.
    ///
    /// `peer` is the address of the immediate TCP peer, if known.
    pub async fn resolve(
        &self,
        headers: &HeaderMap,
        peer: Option<IpAddr>,
    ) -> Result<ResolvedIdentity, IdentityError> {
        if let Some(username) = trusted_username(headers) {
            if self.trusted_header.allows(peer) {
                return Ok(ResolvedIdentity::new(username, IdentitySource::TrustedHeader));
            }
            debug!(peer = ?peer, "Ignoring X-User header from untrusted peer");
        }

        let credential = forwarded_credential(headers).ok_or(IdentityError::NoCredential)?;
        let codec = self
            .codec
            .as_ref()
            .ok_or(IdentityError::SigningNotConfigured)?;

        let payload = codec.verify_at(&credential, super::codec::unix_now())?;

        match codec.scheme() {
            CredentialScheme::Reference => {
                let session_id = payload.value;
                if session_id.is_empty() {
                    return Err(IdentityError::Malformed);
                }
                let record = self.store.get(&session_id).await?;
                Ok(ResolvedIdentity::new(
                    record.username,
                    IdentitySource::Session { session_id },
                ))
            }
            CredentialScheme::SelfContained { .. } => {
                let username = payload.value;
                if username.trim().is_empty() {
                    return Err(IdentityError::Malformed);
                }
                Ok(ResolvedIdentity::new(
                    username,
                    IdentitySource::SelfContained {
                        issued_at: payload.issued_at.unwrap_or_default(),
                    },
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemoryBackend, SessionBackend, SessionRecord};
    use axum::http::HeaderValue;
    use std::sync::Arc;
    use std::time::Duration;

    const SALT: &str = "test-salt";
    const TTL: Duration = Duration::from_secs(60);
    const TIMEOUT: Duration = Duration::from_millis(500);

    fn reference_codec(secret: &str) -> TokenCodec {
        TokenCodec::new(secret, SALT, CredentialScheme::Reference).unwrap()
    }

    fn memory_store() -> (MemoryBackend, SessionStore) {
        let backend = MemoryBackend::default();
        let store = SessionStore::from_backend(Arc::new(backend.clone()), TIMEOUT);
        (backend, store)
    }

    fn with_session(credential: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-session", HeaderValue::from_str(credential).unwrap());
        headers
    }

    #[tokio::test]
    async fn no_header_or_cookie_is_no_credential() {
        let (_, store) = memory_store();
        let resolver = IdentityResolver::new(Some(reference_codec("secret")), store);

        let result = resolver.resolve(&HeaderMap::new(), None).await;
        assert_eq!(result, Err(IdentityError::NoCredential));
    }

    #[tokio::test]
    async fn wrong_secret_is_invalid_signature() {
        let (_, store) = memory_store();
        let resolver = IdentityResolver::new(Some(reference_codec("backend secret")), store);
        let forged = reference_codec("attacker secret").sign("sid");

        let result = resolver.resolve(&with_session(&forged), None).await;
        assert_eq!(result, Err(IdentityError::InvalidSignature));
    }

    #[tokio::test]
    async fn unknown_session_is_session_expired() {
        let (_, store) = memory_store();
        let codec = reference_codec("secret");
        let resolver = IdentityResolver::new(Some(codec.clone()), store);

        let result = resolver.resolve(&with_session(&codec.sign("missing")), None).await;
        assert_eq!(result, Err(IdentityError::SessionExpired));
    }

    #[tokio::test]
    async fn unreachable_store_is_store_unavailable() {
        let codec = reference_codec("secret");
        let resolver = IdentityResolver::new(
            Some(codec.clone()),
            SessionStore::degraded("connection refused"),
        );

        let result = resolver.resolve(&with_session(&codec.sign("sid")), None).await;
        assert_eq!(result, Err(IdentityError::StoreUnavailable));
    }

    #[tokio::test]
    async fn valid_reference_credential_resolves() {
        let (_, store) = memory_store();
        store
            .put("sid", &SessionRecord::new("alice"), TTL)
            .await
            .unwrap();
        let codec = reference_codec("secret");
        let resolver = IdentityResolver::new(Some(codec.clone()), store);

        let identity = resolver
            .resolve(&with_session(&codec.sign("sid")), None)
            .await
            .unwrap();
        assert_eq!(identity.username, "alice");
        assert_eq!(identity.session_id(), Some("sid"));
    }

    #[tokio::test]
    async fn cookie_credential_resolves() {
        let (_, store) = memory_store();
        store
            .put("sid", &SessionRecord::new("bob"), TTL)
            .await
            .unwrap();
        let codec = reference_codec("secret");
        let resolver = IdentityResolver::new(Some(codec.clone()), store);

        let mut headers = HeaderMap::new();
        headers.insert(
            "cookie",
            HeaderValue::from_str(&format!("session={}", codec.sign("sid"))).unwrap(),
        );
        let identity = resolver.resolve(&headers, None).await.unwrap();
        assert_eq!(identity.username, "bob");
    }

    #[tokio::test]
    async fn unusable_record_is_malformed_session() {
        let (backend, store) = memory_store();
        backend
            .set("session:sid", r#"{"user":"alice"}"#, TTL)
            .await
            .unwrap();
        let codec = reference_codec("secret");
        let resolver = IdentityResolver::new(Some(codec.clone()), store);

        let result = resolver.resolve(&with_session(&codec.sign("sid")), None).await;
        assert_eq!(result, Err(IdentityError::MalformedSession));
    }

    #[tokio::test]
    async fn missing_secret_is_signing_not_configured() {
        let (_, store) = memory_store();
        let resolver = IdentityResolver::new(None, store);

        let result = resolver.resolve(&with_session("r.abc.def"), None).await;
        assert_eq!(result, Err(IdentityError::SigningNotConfigured));
        assert!(!resolver.signing_configured());
    }

    #[tokio::test]
    async fn self_contained_credential_skips_the_store() {
        let codec = TokenCodec::new(
            "secret",
            SALT,
            CredentialScheme::SelfContained {
                max_age: Duration::from_secs(300),
            },
        )
        .unwrap();
        let resolver = IdentityResolver::new(Some(codec.clone()), SessionStore::degraded("unused"));

        let identity = resolver
            .resolve(&with_session(&codec.sign("carol")), None)
            .await
            .unwrap();
        assert_eq!(identity.username, "carol");
        assert!(matches!(identity.source, IdentitySource::SelfContained { .. }));

        let stale = codec.sign_at("carol", 1_000);
        let result = resolver.resolve(&with_session(&stale), None).await;
        assert_eq!(result, Err(IdentityError::Expired));
    }

    #[tokio::test]
    async fn credential_of_the_other_scheme_is_malformed() {
        let (_, store) = memory_store();
        let resolver = IdentityResolver::new(Some(reference_codec("secret")), store);
        let self_contained = TokenCodec::new(
            "secret",
            SALT,
            CredentialScheme::SelfContained {
                max_age: Duration::from_secs(300),
            },
        )
        .unwrap();

        let result = resolver
            .resolve(&with_session(&self_contained.sign("alice")), None)
            .await;
        assert_eq!(result, Err(IdentityError::Malformed));
    }

    #[tokio::test]
    async fn trusted_header_requires_a_trusted_peer() {
        let (_, store) = memory_store();
        let proxy: IpAddr = "10.0.0.2".parse().unwrap();
        let resolver = IdentityResolver::new(Some(reference_codec("secret")), store)
            .with_trusted_header(TrustedHeaderPolicy::from_peers(vec![proxy]));

        let mut headers = HeaderMap::new();
        headers.insert("x-user", HeaderValue::from_static("mallory"));

        let via_proxy = resolver.resolve(&headers, Some(proxy)).await.unwrap();
        assert_eq!(via_proxy.username, "mallory");
        assert_eq!(via_proxy.source, IdentitySource::TrustedHeader);

        let direct = resolver
            .resolve(&headers, Some("203.0.113.9".parse().unwrap()))
            .await;
        assert_eq!(direct, Err(IdentityError::NoCredential));

        let unknown_peer = resolver.resolve(&headers, None).await;
        assert_eq!(unknown_peer, Err(IdentityError::NoCredential));
    }

    #[tokio::test]
    async fn trusted_header_disabled_by_default() {
        let (_, store) = memory_store();
        let resolver = IdentityResolver::new(Some(reference_codec("secret")), store);

        let mut headers = HeaderMap::new();
        headers.insert("x-user", HeaderValue::from_static("mallory"));
        let result = resolver
            .resolve(&headers, Some("127.0.0.1".parse().unwrap()))
            .await;
        assert_eq!(result, Err(IdentityError::NoCredential));
    }

    #[test]
    fn ipv4_mapped_peer_matches_allowlist() {
        let policy = TrustedHeaderPolicy::from_peers(vec!["10.0.0.2".parse().unwrap()]);
        assert!(policy.allows(Some("::ffff:10.0.0.2".parse().unwrap())));
        assert!(TrustedHeaderPolicy::from_peers(Vec::new()) == TrustedHeaderPolicy::Disabled);
    }
}
