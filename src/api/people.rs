// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! People endpoints. Every call requires a resolved caller.

use axum::{extract::State, http::StatusCode, Json};
use tracing::info;

use crate::{
    auth::Identity,
    error::ApiError,
    models::{CreatePersonRequest, Person},
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/v1/people",
    tag = "People",
    security(("session" = [])),
    responses(
        (status = 200, body = [Person]),
        (status = 401, description = "Missing, invalid, or expired session credential"),
        (status = 503, description = "Session store unavailable")
    )
)]
pub async fn list_people(
    Identity(_caller): Identity,
    State(state): State<AppState>,
) -> Json<Vec<Person>> {
    let people = state.people.read().await;
    Json(people.list_people())
}

#[utoipa::path(
    post,
    path = "/v1/people",
    request_body = CreatePersonRequest,
    tag = "People",
    security(("session" = [])),
    responses(
        (status = 201, body = Person),
        (status = 401, description = "Missing, invalid, or expired session credential"),
        (status = 422, description = "Invalid name"),
        (status = 503, description = "Session store unavailable")
    )
)]
pub async fn add_person(
    Identity(caller): Identity,
    State(state): State<AppState>,
    Json(request): Json<CreatePersonRequest>,
) -> Result<(StatusCode, Json<Person>), ApiError> {
    let mut people = state.people.write().await;
    let person = people.add_person(request, &caller.username)?;
    info!(person_id = person.id, created_by = %caller.username, "Person added");
    Ok((StatusCode::CREATED, Json(person)))
}
