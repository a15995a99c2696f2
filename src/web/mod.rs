// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Web Tier
//!
//! Browser-facing service. It issues credentials at login, keeps them in the
//! `session` cookie, and relays them to the people API on every call.
//!
//! | Route | Method | Behavior |
//! |-------|--------|----------|
//! | `/` | GET | Index page model (people, username, error message) |
//! | `/login` | POST | Issue a credential and set the cookie |
//! | `/logout` | POST | Revoke the session and clear the cookie |
//! | `/add` | POST | Add a person, redirect to `/` or `/?error=...` |
//! | `/health/live` | GET | Liveness probe |

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::api::health;
use crate::auth::SessionIssuer;

pub mod backend;
pub mod error;
pub mod handlers;

pub use backend::{BackendClient, BackendError};
pub use error::WebError;

/// Web tier state.
#[derive(Clone)]
pub struct WebState {
    /// `None` when no signing secret is configured; login then fails.
    pub issuer: Option<Arc<SessionIssuer>>,
    pub backend: BackendClient,
    pub cookie_secure: bool,
}

impl WebState {
    pub fn new(issuer: Option<SessionIssuer>, backend: BackendClient, cookie_secure: bool) -> Self {
        Self {
            issuer: issuer.map(Arc::new),
            backend,
            cookie_secure,
        }
    }
}

pub fn router(state: WebState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/add", post(handlers::add_person))
        .route("/health/live", get(health::liveness))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{CredentialScheme, TokenCodec};
    use crate::session::{MemoryBackend, SessionStore};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use std::time::Duration;
    use tower::ServiceExt;

    fn state_with(store: SessionStore) -> WebState {
        let codec = TokenCodec::new("secret", "salt", CredentialScheme::Reference).unwrap();
        let issuer = SessionIssuer::new(codec, store, Duration::from_secs(60));
        WebState::new(Some(issuer), BackendClient::new(None).unwrap(), false)
    }

    fn memory_store() -> SessionStore {
        SessionStore::from_backend(Arc::new(MemoryBackend::default()), Duration::from_secs(1))
    }

    fn cookie_value(response: &axum::response::Response) -> String {
        let raw = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("set-cookie present")
            .to_str()
            .unwrap();
        raw.split(';').next().unwrap().to_string()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn form_login_sets_http_only_cookie() {
        let app = router(state_with(memory_store()));
        let response = app
            .oneshot(
                Request::post("/login")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("username=alice"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
        assert!(set_cookie.starts_with("session=r."));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("SameSite=Lax"));
        assert!(!set_cookie.contains("Secure"));

        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["username"], "alice");
    }

    #[tokio::test]
    async fn json_login_is_accepted() {
        let app = router(state_with(memory_store()));
        let response = app
            .oneshot(
                Request::post("/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"username":"bob"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["username"], "bob");
    }

    #[tokio::test]
    async fn blank_username_is_unprocessable() {
        let app = router(state_with(memory_store()));
        let response = app
            .oneshot(
                Request::post("/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"username":"  "}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn login_with_store_down_is_503_and_sets_no_cookie() {
        let app = router(state_with(SessionStore::degraded("down")));
        let response = app
            .oneshot(
                Request::post("/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"username":"alice"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn login_without_secret_fails() {
        let state = WebState::new(None, BackendClient::new(None).unwrap(), false);
        let response = router(state)
            .oneshot(
                Request::post("/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"username":"alice"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn logout_deletes_record_and_clears_cookie() {
        let store = memory_store();
        let state = state_with(store.clone());
        let app = router(state.clone());

        let login = app
            .clone()
            .oneshot(
                Request::post("/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"username":"alice"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        let cookie = cookie_value(&login);
        let credential = cookie.trim_start_matches("session=").to_string();

        let issuer = state.issuer.as_ref().unwrap();
        let session_id = issuer.codec().verify(&credential).unwrap();
        assert!(store.get(&session_id).await.is_ok());

        let response = app
            .oneshot(
                Request::post("/logout")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::SET_COOKIE]
            .to_str()
            .unwrap()
            .starts_with("session=deleted"));
        assert!(store.get(&session_id).await.is_err());
    }

    #[tokio::test]
    async fn index_without_api_url_reports_configuration() {
        let app = router(state_with(memory_store()));
        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["people"], serde_json::json!([]));
        assert_eq!(body["error_message"], "API URL is not configured.");
        assert!(body.get("username").is_none());
    }

    #[tokio::test]
    async fn index_keeps_error_from_query() {
        let app = router(state_with(memory_store()));
        let response = app
            .oneshot(
                Request::get("/?error=Name+is+required")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(json_body(response).await["error_message"], "Name is required");
    }

    #[tokio::test]
    async fn add_without_api_url_redirects_with_error() {
        let app = router(state_with(memory_store()));
        let response = app
            .oneshot(
                Request::post("/add")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("name=Ada"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/?error=API+URL+is+not+configured."
        );
    }
}
