// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Acceptance handoff.
//!
//! Given a usable token, stakes a claim in the signed cookie and redirects
//! the caller into the identity provider's signup flow with the email
//! pre-filled. No database mutation happens here: the invitation is only
//! spent by the webhook authorization gate once the provider reports the
//! account was actually created.

use axum::extract::State;
use axum::http::{header::SET_COOKIE, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use foyer_server_api::invitations::{
	AcceptInvitationRequest, AcceptInvitationResponse, InvitationErrorResponse, RejectionReason,
};
use foyer_server_auth::{
	claim_set_cookie, encode_claim, hash_token, is_well_formed_token, token_log_prefix, Claim,
};
use foyer_server_db::LookupOutcome;

use crate::api::AppState;

fn rejection(reason: RejectionReason) -> Response {
	(
		StatusCode::BAD_REQUEST,
		Json(InvitationErrorResponse {
			error: "invalid_invitation".to_string(),
			reason: Some(reason),
		}),
	)
		.into_response()
}

/// Accept an invitation: stake a claim and hand off to the signup flow.
///
/// # Request
///
/// Body ([`AcceptInvitationRequest`]):
/// - `token`: The invitation token from the accept link
///
/// # Response
///
/// On success, sets the claim cookie and returns
/// [`AcceptInvitationResponse`] with the signup redirect target.
///
/// # Errors
///
/// - `400 Bad Request`: token is not currently usable, with the same
///   tagged reason the verification endpoint would return
///
/// # Security
///
/// - Re-validates the invitation at handoff time (a token valid at
///   verify-time may have expired since)
/// - The claim cookie is HttpOnly, Secure, SameSite=Lax, and expires with
///   the invitation
#[utoipa::path(
    post,
    path = "/api/invitations/accept",
    request_body = AcceptInvitationRequest,
    responses(
        (status = 200, description = "Claim staked, redirect into signup", body = AcceptInvitationResponse),
        (status = 400, description = "Invitation not usable", body = InvitationErrorResponse)
    ),
    tag = "invitations"
)]
#[tracing::instrument(skip(state, payload))]
pub async fn accept_invitation(
	State(state): State<AppState>,
	Json(payload): Json<AcceptInvitationRequest>,
) -> Response {
	let token = payload.token;

	if !is_well_formed_token(&token) {
		tracing::info!(token_len = token.len(), "malformed token at handoff");
		return rejection(RejectionReason::NotFound);
	}

	// Defense in depth: the same lookup the verification endpoint runs.
	let outcome = match state.invitation_repo.lookup(&hash_token(&token)).await {
		Ok(outcome) => outcome,
		Err(e) => {
			tracing::error!(error = %e, "invitation lookup failed at handoff");
			return rejection(RejectionReason::NotFound);
		}
	};

	let preview = match outcome {
		LookupOutcome::Valid(preview) => preview,
		LookupOutcome::Expired => return rejection(RejectionReason::Expired),
		LookupOutcome::AlreadyUsed => return rejection(RejectionReason::AlreadyUsed),
		LookupOutcome::Revoked => return rejection(RejectionReason::Revoked),
		LookupOutcome::NotFound => return rejection(RejectionReason::NotFound),
		LookupOutcome::OrganizationInactive => {
			return rejection(RejectionReason::OrganizationInactive)
		}
	};

	let claim = Claim {
		token: token.clone(),
		expires_at: preview.expires_at,
	};
	let cookie = claim_set_cookie(
		&encode_claim(state.claim_secret.expose().as_bytes(), &claim),
		claim.expires_at,
	);

	tracing::info!(
		token_prefix = %token_log_prefix(&token),
		"claim staked, redirecting into signup flow"
	);

	(
		StatusCode::OK,
		[(SET_COOKIE, cookie)],
		Json(AcceptInvitationResponse {
			success: true,
			redirect_url: state.idp_config.signup_redirect_url(&preview.email),
		}),
	)
		.into_response()
}
