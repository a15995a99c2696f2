// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response structures of the people API. All types derive
//! `Serialize`, `Deserialize`, and `ToSchema` for JSON handling and OpenAPI
//! documentation. The web tier decodes the same types from API responses.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A stored person.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Person {
    pub id: u64,
    pub name: String,
    /// Username of the caller that added this person.
    pub created_by: String,
}

/// Body of `POST /v1/people`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct CreatePersonRequest {
    pub name: String,
}

/// Response of `GET /v1/users/me`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserMeResponse {
    pub username: String,
}
