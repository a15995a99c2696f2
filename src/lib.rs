// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session Relay - Cross-service session trust relay
//!
//! A browser-facing web tier issues signed session credentials and relays
//! them to a separate API tier, which re-derives the caller's identity from
//! the credential and a session store both tiers share.
//!
//! ## Modules
//!
//! - `auth` - Credential codec, identity resolution, issuance, relay headers
//! - `session` - Shared session store (Redis or in-process LRU)
//! - `api` - People API handlers (Axum)
//! - `web` - Browser-facing web tier and its API client
//! - `config` - Environment configuration for both binaries

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod server;
pub mod session;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod web;
