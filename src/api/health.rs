// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Overall readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Readiness {
    Ok,
    Degraded,
}

/// Shared store connectivity as seen from this instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StoreStatus {
    Connected,
    Disconnected,
}

/// Whether a signing secret is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SigningStatus {
    Configured,
    Missing,
}

/// `GET /health` body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    pub status: Readiness,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    /// Always "ok" while the process answers.
    pub service: String,
    pub store: StoreStatus,
    pub signing: SigningStatus,
    /// Credential scheme accepted here, once signing is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
}

/// Liveness body.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Readiness of the identity path.
///
/// 503 when signing is missing, or when the store is down and the
/// configured scheme reads from it.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = ReadyResponse),
        (status = 503, description = "Service is degraded", body = ReadyResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let resolver = &state.resolver;
    let store = if resolver.store().probe().await {
        StoreStatus::Connected
    } else {
        StoreStatus::Disconnected
    };
    let signing = if resolver.signing_configured() {
        SigningStatus::Configured
    } else {
        SigningStatus::Missing
    };
    let scheme = resolver.scheme();
    let store_required = scheme.map_or(true, |s| s.uses_store());

    let ready = signing == SigningStatus::Configured
        && (store == StoreStatus::Connected || !store_required);

    let response = ReadyResponse {
        status: if ready { Readiness::Ok } else { Readiness::Degraded },
        checks: HealthChecks {
            service: "ok".to_string(),
            store,
            signing,
            scheme: scheme.map(|s| s.name().to_string()),
        },
    };

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

/// Liveness probe. 200 whenever the process answers.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
