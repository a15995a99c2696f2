// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{routing::get, Router};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::ResolvedIdentity,
    models::{CreatePersonRequest, Person, UserMeResponse},
    state::AppState,
};

pub mod health;
pub mod people;
pub mod users;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route(
            "/people",
            get(people::list_people).post(people::add_person),
        )
        .route("/users/me", get(users::get_current_user));

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness));

    Router::new()
        .nest("/v1", v1_routes)
        .merge(health_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

struct SessionSecurity;

impl Modify for SessionSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-Session"))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        people::list_people,
        people::add_person,
        users::get_current_user,
        health::health,
        health::liveness
    ),
    components(
        schemas(
            Person,
            CreatePersonRequest,
            UserMeResponse,
            ResolvedIdentity,
            health::ReadyResponse,
            health::Readiness,
            health::StoreStatus,
            health::SigningStatus,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&SessionSecurity),
    tags(
        (name = "People", description = "People directory"),
        (name = "Users", description = "Caller identity"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn liveness_route_is_public() {
        let app = router(AppState::default());
        let response = app
            .oneshot(Request::get("/health/live").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn people_route_requires_credential() {
        let app = router(AppState::default());
        let response = app
            .oneshot(Request::get("/v1/people").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error_code"], "no_credential");
    }

    #[tokio::test]
    async fn openapi_document_lists_people_paths() {
        let app = router(AppState::default());
        let response = app
            .oneshot(
                Request::get("/api-doc/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["paths"]["/v1/people"].is_object());
        assert!(json["components"]["securitySchemes"]["session"].is_object());
    }
}
