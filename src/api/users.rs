// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::Json;

use crate::auth::Identity;
use crate::models::UserMeResponse;

/// Get the username the current request resolves to.
#[utoipa::path(
    get,
    path = "/v1/users/me",
    tag = "Users",
    security(("session" = [])),
    responses(
        (status = 200, description = "Resolved caller", body = UserMeResponse),
        (status = 401, description = "Missing, invalid, or expired session credential"),
        (status = 503, description = "Session store unavailable")
    )
)]
pub async fn get_current_user(Identity(caller): Identity) -> Json<UserMeResponse> {
    Json(UserMeResponse {
        username: caller.username,
    })
}
