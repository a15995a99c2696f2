// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Web tier client for the people API.
//!
//! Every call carries the browser's credential in `X-Session`. Failures are
//! returned to the caller for display; nothing is retried.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::auth::{relay::relay_credential, IdentityError};
use crate::models::{CreatePersonRequest, Person, UserMeResponse};

/// Per-request timeout for API calls.
pub const BACKEND_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("API URL is not configured")]
    NotConfigured,

    #[error("API request failed: {0}")]
    Unavailable(String),

    #[error("API response was invalid: {0}")]
    InvalidData(String),

    #[error("API rejected the session: {0}")]
    Rejected(IdentityError),

    #[error("API returned {status}: {message}")]
    Status { status: u16, message: String },
}

impl BackendError {
    /// Text safe to show in the browser.
    pub fn user_message(&self) -> String {
        match self {
            BackendError::NotConfigured => "API URL is not configured.".to_string(),
            BackendError::Unavailable(_) => "API unavailable. Please try again later.".to_string(),
            BackendError::InvalidData(_) => "Received invalid data from API.".to_string(),
            BackendError::Rejected(IdentityError::NoCredential) => {
                "Please log in to continue.".to_string()
            }
            BackendError::Rejected(
                IdentityError::SessionExpired
                | IdentityError::Expired
                | IdentityError::InvalidSignature
                | IdentityError::Malformed
                | IdentityError::MalformedSession,
            ) => "Your session has expired. Please log in again.".to_string(),
            BackendError::Rejected(
                IdentityError::StoreUnavailable | IdentityError::SigningNotConfigured,
            ) => "API unavailable. Please try again later.".to_string(),
            BackendError::Status { message, .. } => message.clone(),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
    error_code: Option<String>,
}

/// Make `url` usable as a join base: a path without a trailing `/` would
/// have its last segment replaced by [`Url::join`].
pub fn api_base(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// HTTP client for the API tier.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: Option<Url>,
    http: Client,
}

impl BackendClient {
    pub fn new(base_url: Option<Url>) -> Result<Self, BackendError> {
        let http = Client::builder()
            .timeout(BACKEND_TIMEOUT)
            .build()
            .map_err(|e| BackendError::Unavailable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.map(api_base),
            http,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        let base = self.base_url.as_ref().ok_or(BackendError::NotConfigured)?;
        base.join(path)
            .map_err(|e| BackendError::InvalidData(format!("bad endpoint {path}: {e}")))
    }

    fn get(&self, url: Url, credential: Option<&str>) -> reqwest::RequestBuilder {
        let request = self.http.get(url);
        match credential {
            Some(credential) => relay_credential(request, credential),
            None => request,
        }
    }

    pub async fn list_people(&self, credential: Option<&str>) -> Result<Vec<Person>, BackendError> {
        let url = self.endpoint("v1/people")?;
        let response = send(self.get(url, credential)).await?;
        decode(response).await
    }

    pub async fn add_person(
        &self,
        credential: Option<&str>,
        name: &str,
    ) -> Result<Person, BackendError> {
        let url = self.endpoint("v1/people")?;
        let mut request = self.http.post(url).json(&CreatePersonRequest {
            name: name.to_string(),
        });
        if let Some(credential) = credential {
            request = relay_credential(request, credential);
        }
        let response = send(request).await?;
        decode(response).await
    }

    pub async fn current_user(&self, credential: &str) -> Result<UserMeResponse, BackendError> {
        let url = self.endpoint("v1/users/me")?;
        let response = send(self.get(url, Some(credential))).await?;
        decode(response).await
    }
}

async fn send(request: reqwest::RequestBuilder) -> Result<Response, BackendError> {
    request.send().await.map_err(|e| {
        warn!(error = %e, "API request failed");
        BackendError::Unavailable(e.to_string())
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let status = response.status();
    if !status.is_success() {
        let body: Option<ErrorBody> = response.json().await.ok();
        if let Some(error) = body
            .as_ref()
            .and_then(|b| b.error_code.as_deref())
            .and_then(IdentityError::from_code)
        {
            debug!(error_code = error.error_code(), "API rejected relayed credential");
            return Err(BackendError::Rejected(error));
        }
        let message = body
            .and_then(|b| b.error)
            .unwrap_or_else(|| status.to_string());
        return Err(BackendError::Status {
            status: status.as_u16(),
            message,
        });
    }

    response
        .json()
        .await
        .map_err(|e| BackendError::InvalidData(e.to_string()))
}
