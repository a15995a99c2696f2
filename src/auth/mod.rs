// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! This module carries a user's identity from the web tier to the API tier.
//!
//! ## Relay Flow
//!
//! 1. Web tier login writes `{username}` under `session:<id>` and signs `id`
//!    (or, with the self-contained scheme, signs the username and issue time)
//! 2. The browser keeps the credential in the `session` cookie
//! 3. The web tier forwards it as `X-Session` on every API call
//! 4. API tier:
//!    - Verifies the HMAC with the shared secret and salt
//!    - Looks the session up in the shared store (reference scheme)
//!    - Yields the username or a typed [`IdentityError`]
//!
//! ## Security
//!
//! - Tampered, foreign-salt, or wrong-secret credentials fail closed
//! - `X-User` is ignored unless the peer is a configured edge proxy
//! - Store outages surface as `503`, never as an anonymous or default user

pub mod codec;
pub mod error;
pub mod extractor;
pub mod identity;
pub mod issuer;
pub mod relay;
pub mod resolver;

pub use codec::{CredentialScheme, SigningKeyError, TokenCodec, VerifyError};
pub use error::IdentityError;
pub use extractor::Identity;
pub use identity::{IdentitySource, ResolvedIdentity};
pub use issuer::{IssueError, IssuedCredential, SessionIssuer};
pub use resolver::{IdentityResolver, TrustedHeaderPolicy};
