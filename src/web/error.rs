// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::header::InvalidHeaderValue,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::auth::IssueError;
use crate::error::ApiError;

/// Login and logout failures on the web tier.
#[derive(Debug, Error)]
pub enum WebError {
    #[error(transparent)]
    Issue(#[from] IssueError),

    #[error("credential signing is not configured")]
    SigningNotConfigured,

    #[error("credential cannot be stored in a cookie: {0}")]
    Cookie(#[from] InvalidHeaderValue),
}

impl From<WebError> for ApiError {
    fn from(e: WebError) -> Self {
        match e {
            WebError::Issue(IssueError::InvalidUsername(reason)) => {
                ApiError::Validation(reason.to_string())
            }
            WebError::Issue(IssueError::StoreUnavailable) => ApiError::Unavailable(
                "Sessions are temporarily unavailable. Please try again later.".to_string(),
            ),
            WebError::Issue(IssueError::Store(_))
            | WebError::SigningNotConfigured
            | WebError::Cookie(_) => ApiError::Internal("Login is not available.".to_string()),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match &self {
            WebError::Issue(IssueError::InvalidUsername(_)) => {}
            WebError::Issue(IssueError::StoreUnavailable) => warn!(error = %self, "Login failed"),
            _ => error!(error = %self, "Login failed"),
        }
        ApiError::from(self).into_response()
    }
}
