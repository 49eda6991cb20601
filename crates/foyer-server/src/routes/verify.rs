// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Public invitation verification.
//!
//! Answers "is this token currently usable, and if so for whom?" to an
//! unauthenticated caller. The rate limiter is consulted before anything
//! else; when it denies, no datastore lookup happens at all. Malformed
//! tokens are rejected before the datastore too, and surface as
//! `not_found` so their responses are indistinguishable from a token that
//! was never issued.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use foyer_server_api::invitations::{
	InvitationDetails, RejectionReason, VerifyInvitationResponse,
};
use foyer_server_auth::{hash_token, is_well_formed_token, token_log_prefix};
use foyer_server_db::LookupOutcome;

use crate::api::AppState;
use crate::rate_limit::source_key;

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
	#[serde(default)]
	pub token: Option<String>,
}

fn rate_limit_headers(limit: u32, remaining: u32) -> [(&'static str, String); 2] {
	[
		("x-ratelimit-limit", limit.to_string()),
		("x-ratelimit-remaining", remaining.to_string()),
	]
}

/// Verify an invitation token.
///
/// # Request
///
/// Query parameters:
/// - `token`: The invitation token from the accept link
///
/// # Response
///
/// Returns [`VerifyInvitationResponse`]; only a valid token carries the
/// invitation projection. Rate-limit headers are present on every
/// response.
///
/// # Security
///
/// - Rate limited per source address before any lookup
/// - Never echoes the token or exposes other invitations
#[utoipa::path(
    get,
    path = "/api/invitations/verify",
    params(
        ("token" = Option<String>, Query, description = "Invitation token")
    ),
    responses(
        (status = 200, description = "Verification outcome", body = VerifyInvitationResponse),
        (status = 429, description = "Rate limited", body = VerifyInvitationResponse)
    ),
    tag = "invitations"
)]
#[tracing::instrument(skip(state, headers, params))]
pub async fn verify_invitation(
	State(state): State<AppState>,
	headers: HeaderMap,
	Query(params): Query<VerifyParams>,
) -> Response {
	let key = source_key(&headers);
	let decision = state.rate_limiter.allow(&key);
	let limit = state.rate_limiter.limit();

	if !decision.allowed {
		tracing::info!(source = %key, "verification rate limited");
		return (
			StatusCode::TOO_MANY_REQUESTS,
			rate_limit_headers(limit, 0),
			[("retry-after", decision.retry_after_secs.to_string())],
			Json(VerifyInvitationResponse::rejected(
				RejectionReason::RateLimited,
			)),
		)
			.into_response();
	}

	let token = params.token.unwrap_or_default();
	if !is_well_formed_token(&token) {
		// Shape note only; the raw input is never logged.
		tracing::info!(source = %key, token_len = token.len(), "malformed token rejected");
		return (
			StatusCode::OK,
			rate_limit_headers(limit, decision.remaining),
			Json(VerifyInvitationResponse::rejected(RejectionReason::NotFound)),
		)
			.into_response();
	}

	let outcome = match state.invitation_repo.lookup(&hash_token(&token)).await {
		Ok(outcome) => outcome,
		Err(e) => {
			tracing::error!(error = %e, source = %key, "invitation lookup failed");
			// Internal distinctions are never surfaced to the caller.
			return (
				StatusCode::OK,
				rate_limit_headers(limit, decision.remaining),
				Json(VerifyInvitationResponse::rejected(RejectionReason::NotFound)),
			)
				.into_response();
		}
	};

	let body = match outcome {
		LookupOutcome::Valid(preview) => VerifyInvitationResponse::valid(InvitationDetails {
			email: preview.email,
			organization_name: preview.organization_name,
			role: preview.role.to_string(),
			expires_at: preview.expires_at,
		}),
		LookupOutcome::Expired => {
			tracing::info!(token_prefix = %token_log_prefix(&token), "verified token is expired");
			VerifyInvitationResponse::rejected(RejectionReason::Expired)
		}
		LookupOutcome::AlreadyUsed => {
			tracing::info!(token_prefix = %token_log_prefix(&token), "verified token already used");
			VerifyInvitationResponse::rejected(RejectionReason::AlreadyUsed)
		}
		LookupOutcome::Revoked => {
			tracing::info!(token_prefix = %token_log_prefix(&token), "verified token is revoked");
			VerifyInvitationResponse::rejected(RejectionReason::Revoked)
		}
		LookupOutcome::NotFound => {
			tracing::info!(source = %key, "verified token not found");
			VerifyInvitationResponse::rejected(RejectionReason::NotFound)
		}
		LookupOutcome::OrganizationInactive => {
			tracing::info!(token_prefix = %token_log_prefix(&token), "organization inactive");
			VerifyInvitationResponse::rejected(RejectionReason::OrganizationInactive)
		}
	};

	(
		StatusCode::OK,
		rate_limit_headers(limit, decision.remaining),
		Json(body),
	)
		.into_response()
}
