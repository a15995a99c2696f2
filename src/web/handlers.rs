// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Browser-facing handlers.

use axum::{
    extract::{FromRequest, Query, Request, State},
    http::{
        header::{CONTENT_TYPE, SET_COOKIE},
        HeaderMap,
    },
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::form_urlencoded;

use super::{error::WebError, WebState};
use crate::auth::relay::{clear_session_cookie, parse_cookie, session_cookie, SESSION_COOKIE};
use crate::models::Person;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
}

/// Login body, accepted as JSON or as an HTML form.
pub struct LoginInput(pub LoginRequest);

impl<S> FromRequest<S> for LoginInput
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        if is_json {
            let Json(body) = Json::<LoginRequest>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(LoginInput(body))
        } else {
            let Form(body) = Form::<LoginRequest>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(LoginInput(body))
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub status: String,
    pub username: String,
}

pub async fn login(
    State(state): State<WebState>,
    LoginInput(request): LoginInput,
) -> Result<impl IntoResponse, WebError> {
    let issuer = state.issuer.as_ref().ok_or(WebError::SigningNotConfigured)?;
    let issued = issuer.issue(&request.username).await?;
    let cookie = session_cookie(&issued.credential, state.cookie_secure)?;

    Ok((
        [(SET_COOKIE, cookie)],
        Json(LoginResponse {
            status: "ok".to_string(),
            username: issued.username,
        }),
    ))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub status: String,
}

/// Revoke the session and clear the cookie.
///
/// If the store cannot be reached the cookie is kept so the user can retry.
pub async fn logout(
    State(state): State<WebState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, WebError> {
    if let (Some(issuer), Some(credential)) =
        (state.issuer.as_ref(), parse_cookie(&headers, SESSION_COOKIE))
    {
        issuer.revoke(&credential).await?;
    }

    Ok((
        [(SET_COOKIE, clear_session_cookie(state.cookie_secure))],
        Json(LogoutResponse {
            status: "ok".to_string(),
        }),
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct IndexQuery {
    pub error: Option<String>,
}

/// Data the index page renders.
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexPage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub people: Vec<Person>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Index page model.
///
/// An `error` query parameter from a previous redirect wins over any error
/// from this request.
pub async fn index(
    State(state): State<WebState>,
    Query(query): Query<IndexQuery>,
    headers: HeaderMap,
) -> Json<IndexPage> {
    let credential = parse_cookie(&headers, SESSION_COOKIE);
    let mut page = IndexPage {
        username: None,
        people: Vec::new(),
        error_message: query.error,
    };

    match state.backend.list_people(credential.as_deref()).await {
        Ok(people) => {
            page.people = people;
            if let Some(credential) = credential.as_deref() {
                match state.backend.current_user(credential).await {
                    Ok(me) => page.username = Some(me.username),
                    Err(e) => debug!(error = %e, "Could not fetch current user"),
                }
            }
        }
        Err(e) => {
            debug!(error = %e, "Could not list people");
            page.error_message.get_or_insert_with(|| e.user_message());
        }
    }

    Json(page)
}

#[derive(Debug, Deserialize)]
pub struct AddPersonForm {
    pub name: String,
}

/// Add a person, then redirect back to the index.
pub async fn add_person(
    State(state): State<WebState>,
    headers: HeaderMap,
    Form(form): Form<AddPersonForm>,
) -> Redirect {
    let credential = parse_cookie(&headers, SESSION_COOKIE);
    match state.backend.add_person(credential.as_deref(), &form.name).await {
        Ok(_) => Redirect::to("/"),
        Err(e) => {
            warn!(error = %e, "Failed to add person");
            Redirect::to(&error_location(&e.user_message()))
        }
    }
}

fn error_location(message: &str) -> String {
    let message = if message.is_empty() {
        "Failed to add person. API unavailable."
    } else {
        message
    };
    let encoded: String = form_urlencoded::byte_serialize(message.as_bytes()).collect();
    format!("/?error={encoded}")
}
