// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Liveness probe.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Server is alive")
    ),
    tag = "health"
)]
pub async fn health() -> impl IntoResponse {
	(StatusCode::OK, Json(serde_json::json!({"status": "ok"})))
}
