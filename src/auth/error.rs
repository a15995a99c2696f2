// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity resolution errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use super::codec::VerifyError;
use crate::session::SessionError;

/// Why a request could not be tied to a user.
///
/// Every variant rejects the request; none falls back to a default identity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// Neither the `X-Session` header nor the `session` cookie is present
    #[error("No session credential was presented")]
    NoCredential,
    /// Credential is structurally invalid or uses the other scheme
    #[error("Session credential is malformed")]
    Malformed,
    /// Credential signature does not match the shared secret and salt
    #[error("Session credential signature is invalid")]
    InvalidSignature,
    /// Self-contained credential is past its max age
    #[error("Session credential has expired")]
    Expired,
    /// Store has no record for the referenced session
    #[error("Session has expired or was logged out")]
    SessionExpired,
    /// Store record exists but is unusable
    #[error("Session record is malformed")]
    MalformedSession,
    /// Store is unreachable; the caller did nothing wrong
    #[error("Session store is unavailable")]
    StoreUnavailable,
    /// No signing secret is configured on this instance
    #[error("Credential signing is not configured")]
    SigningNotConfigured,
}

#[derive(Serialize)]
struct IdentityErrorBody {
    error: String,
    error_code: String,
}

impl IdentityError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            IdentityError::NoCredential => "no_credential",
            IdentityError::Malformed => "malformed_credential",
            IdentityError::InvalidSignature => "invalid_signature",
            IdentityError::Expired => "credential_expired",
            IdentityError::SessionExpired => "session_expired",
            IdentityError::MalformedSession => "malformed_session",
            IdentityError::StoreUnavailable => "store_unavailable",
            IdentityError::SigningNotConfigured => "signing_not_configured",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            IdentityError::NoCredential
            | IdentityError::Malformed
            | IdentityError::InvalidSignature
            | IdentityError::Expired
            | IdentityError::SessionExpired
            | IdentityError::MalformedSession => StatusCode::UNAUTHORIZED,
            IdentityError::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            IdentityError::SigningNotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Parse an `error_code` back into an error (used by the web tier).
    pub fn from_code(code: &str) -> Option<Self> {
        let error = match code {
            "no_credential" => IdentityError::NoCredential,
            "malformed_credential" => IdentityError::Malformed,
            "invalid_signature" => IdentityError::InvalidSignature,
            "credential_expired" => IdentityError::Expired,
            "session_expired" => IdentityError::SessionExpired,
            "malformed_session" => IdentityError::MalformedSession,
            "store_unavailable" => IdentityError::StoreUnavailable,
            "signing_not_configured" => IdentityError::SigningNotConfigured,
            _ => return None,
        };
        Some(error)
    }

    /// Failures caused by this service rather than by the caller.
    pub fn is_server_side(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl From<VerifyError> for IdentityError {
    fn from(e: VerifyError) -> Self {
        match e {
            VerifyError::Malformed => IdentityError::Malformed,
            VerifyError::InvalidSignature => IdentityError::InvalidSignature,
            VerifyError::Expired => IdentityError::Expired,
        }
    }
}

impl From<SessionError> for IdentityError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::NotFound => IdentityError::SessionExpired,
            SessionError::Malformed(_) => IdentityError::MalformedSession,
            SessionError::Unavailable(_) => IdentityError::StoreUnavailable,
        }
    }
}

impl IntoResponse for IdentityError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(IdentityErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
