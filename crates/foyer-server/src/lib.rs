// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP server for the Foyer invitation-gated membership core.
//!
//! Public surface:
//! - `GET /api/invitations/verify`: rate-limited token usability query
//! - `POST /api/invitations/accept`: stakes a claim cookie and redirects
//!   into the identity provider's signup flow
//! - `POST /webhooks/identity`: the webhook authorization gate, the only
//!   component allowed to spend an invitation
//! - `GET /health`: liveness probe

pub mod api;
pub mod rate_limit;
pub mod routes;

pub use api::{create_app_state, create_router, AppState};
pub use foyer_server_config::ServerConfig;
pub use rate_limit::{Decision, RateLimiter};
