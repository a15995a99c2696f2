// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signed credential codec.
//!
//! ## Token Layout
//!
//! ```text
//! reference:       r.<b64url(session_id)>.<b64url(mac)>
//! self-contained:  t.<b64url(username)>.<b64url(issued_at, u64 BE)>.<b64url(mac)>
//! ```
//!
//! The MAC is HMAC-SHA256 over everything before the last `.`, keyed with
//! `HMAC-SHA256(secret, salt)`. Both tiers must share the secret *and* the
//! salt: a salt mismatch is indistinguishable from a forged token.
//!
//! The MAC is checked before anything else is decoded, so a tampered token
//! can only ever produce [`VerifyError::InvalidSignature`].

use std::time::Duration;

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Segment separator inside a token.
const SEPARATOR: char = '.';

/// Tag for reference credentials.
const REFERENCE_TAG: &str = "r";

/// Tag for self-contained credentials.
const SELF_CONTAINED_TAG: &str = "t";

/// Tolerated issuer clock drift for self-contained credentials (seconds).
const FUTURE_SKEW_LEEWAY: u64 = 60;

/// Which credential scheme an instance issues and accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialScheme {
    /// The token carries a session id; the username lives in the store.
    Reference,
    /// The token carries the username and its issue time.
    SelfContained {
        /// Maximum credential age.
        max_age: Duration,
    },
}

impl CredentialScheme {
    fn tag(&self) -> &'static str {
        match self {
            CredentialScheme::Reference => REFERENCE_TAG,
            CredentialScheme::SelfContained { .. } => SELF_CONTAINED_TAG,
        }
    }

    /// Short name used in logs and configuration.
    pub fn name(&self) -> &'static str {
        match self {
            CredentialScheme::Reference => "reference",
            CredentialScheme::SelfContained { .. } => "self-contained",
        }
    }

    /// Whether resolving this scheme requires a session store lookup.
    pub fn uses_store(&self) -> bool {
        matches!(self, CredentialScheme::Reference)
    }
}

/// Credential verification failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VerifyError {
    /// Token structure or signed body cannot be decoded.
    #[error("credential is malformed")]
    Malformed,
    /// MAC does not match under this secret and salt.
    #[error("credential signature is invalid")]
    InvalidSignature,
    /// Self-contained credential is older than the configured max age.
    #[error("credential has expired")]
    Expired,
}

/// Signing key could not be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SigningKeyError {
    #[error("signing secret is empty")]
    EmptySecret,
    #[error("invalid signing key: {0}")]
    InvalidKey(String),
}

/// A verified credential payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPayload {
    /// Session id (reference) or username (self-contained).
    pub value: String,
    /// Issue time, self-contained credentials only.
    pub issued_at: Option<u64>,
}

/// HMAC credential signer/verifier.
#[derive(Clone)]
pub struct TokenCodec {
    mac: HmacSha256,
    scheme: CredentialScheme,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("scheme", &self.scheme)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Build a codec from the shared secret and salt.
    pub fn new(secret: &str, salt: &str, scheme: CredentialScheme) -> Result<Self, SigningKeyError> {
        if secret.is_empty() {
            return Err(SigningKeyError::EmptySecret);
        }

        let mut derive = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| SigningKeyError::InvalidKey(e.to_string()))?;
        derive.update(salt.as_bytes());
        let key = derive.finalize().into_bytes();

        let mac = HmacSha256::new_from_slice(&key)
            .map_err(|e| SigningKeyError::InvalidKey(e.to_string()))?;

        Ok(Self { mac, scheme })
    }

    pub fn scheme(&self) -> CredentialScheme {
        self.scheme
    }

    /// Sign a payload using the current time for self-contained credentials.
    pub fn sign(&self, payload: &str) -> String {
        self.sign_at(payload, unix_now())
    }

    /// Sign a payload with an explicit issue time (ignored for reference credentials).
    pub fn sign_at(&self, payload: &str, issued_at: u64) -> String {
        let mut body = String::with_capacity(payload.len() * 2 + 16);
        body.push_str(self.scheme.tag());
        body.push(SEPARATOR);
        body.push_str(&Base64UrlUnpadded::encode_string(payload.as_bytes()));

        if let CredentialScheme::SelfContained { .. } = self.scheme {
            body.push(SEPARATOR);
            body.push_str(&Base64UrlUnpadded::encode_string(&issued_at.to_be_bytes()));
        }

        let signature = self.signature(&body);
        body.push(SEPARATOR);
        body.push_str(&Base64UrlUnpadded::encode_string(&signature));
        body
    }

    /// Verify a token and return its payload.
    pub fn verify(&self, token: &str) -> Result<String, VerifyError> {
        self.verify_at(token, unix_now()).map(|p| p.value)
    }

    /// Verify a token against an explicit clock.
    pub fn verify_at(&self, token: &str, now: u64) -> Result<VerifiedPayload, VerifyError> {
        let (body, encoded) = token.rsplit_once(SEPARATOR).ok_or(VerifyError::Malformed)?;

        let signature =
            Base64UrlUnpadded::decode_vec(encoded).map_err(|_| VerifyError::InvalidSignature)?;
        let mut mac = self.mac.clone();
        mac.update(body.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| VerifyError::InvalidSignature)?;
        // Only the canonical encoding of the MAC is accepted.
        if Base64UrlUnpadded::encode_string(&signature) != encoded {
            return Err(VerifyError::InvalidSignature);
        }

        // Authentic from here on; anything unexpected is a structural problem.
        let mut segments = body.split(SEPARATOR);
        let tag = segments.next().ok_or(VerifyError::Malformed)?;
        if tag != self.scheme.tag() {
            return Err(VerifyError::Malformed);
        }

        let payload = segments.next().ok_or(VerifyError::Malformed)?;
        let payload = decode_text(payload)?;

        let issued_at = match self.scheme {
            CredentialScheme::Reference => None,
            CredentialScheme::SelfContained { max_age } => {
                let stamp = segments.next().ok_or(VerifyError::Malformed)?;
                let issued_at = decode_timestamp(stamp)?;
                check_age(issued_at, now, max_age)?;
                Some(issued_at)
            }
        };

        if segments.next().is_some() {
            return Err(VerifyError::Malformed);
        }

        Ok(VerifiedPayload {
            value: payload,
            issued_at,
        })
    }

    fn signature(&self, body: &str) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(body.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

fn decode_text(segment: &str) -> Result<String, VerifyError> {
    let bytes = Base64UrlUnpadded::decode_vec(segment).map_err(|_| VerifyError::Malformed)?;
    String::from_utf8(bytes).map_err(|_| VerifyError::Malformed)
}

fn decode_timestamp(segment: &str) -> Result<u64, VerifyError> {
    let bytes = Base64UrlUnpadded::decode_vec(segment).map_err(|_| VerifyError::Malformed)?;
    let bytes: [u8; 8] = bytes.try_into().map_err(|_| VerifyError::Malformed)?;
    Ok(u64::from_be_bytes(bytes))
}

fn check_age(issued_at: u64, now: u64, max_age: Duration) -> Result<(), VerifyError> {
    if issued_at > now.saturating_add(FUTURE_SKEW_LEEWAY) {
        return Err(VerifyError::Expired);
    }
    if now.saturating_sub(issued_at) > max_age.as_secs() {
        return Err(VerifyError::Expired);
    }
    Ok(())
}

/// Current Unix time in seconds.
pub fn unix_now() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
}
