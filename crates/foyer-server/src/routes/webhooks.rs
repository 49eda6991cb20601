// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Webhook authorization gate.
//!
//! The only component that treats "an external account now exists" as
//! trustworthy, and the only caller of the atomic accept. Protocol for an
//! `account.created` delivery:
//!
//! 1. Verify the signature; an unverified event gets `401` and touches
//!    nothing, since it might not even be real.
//! 2. An account without a usable email cannot be bound to any invitation:
//!    fatal, compensating delete.
//! 3. The claim cookie is read as a hint only; the email lookup is
//!    authoritative.
//! 4. Accept atomically; on any failure, delete the externally-created
//!    identity (one retry). If the delete fails twice, escalate: an
//!    orphaned unauthorized identity is a security incident.
//! 5. Every failure answers with the same generic `403`; a replayed
//!    webhook must not learn invitation state.
//!
//! `account.updated` is a pass-through profile sync and `account.deleted`
//! deactivates the local account; neither touches invitation state.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header::SET_COOKIE, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;

use foyer_server_api::webhooks::{WebhookAckResponse, WebhookErrorResponse};
use foyer_server_audit::{AuditEventType, AuditLogBuilder};
use foyer_server_auth::{claim_clear_cookie, decode_claim, extract_claim_cookie, hash_token};
use foyer_server_db::AcceptError;
use foyer_server_idp::{
	verify_delivery, IdentityEvent, EVENT_ACCOUNT_CREATED, EVENT_ACCOUNT_DELETED,
	EVENT_ACCOUNT_UPDATED, HEADER_WEBHOOK_ID, HEADER_WEBHOOK_SIGNATURE, HEADER_WEBHOOK_TIMESTAMP,
};

use crate::api::AppState;

fn ack() -> Response {
	(StatusCode::OK, Json(WebhookAckResponse { received: true })).into_response()
}

fn ack_clearing_claim() -> Response {
	(
		StatusCode::OK,
		[(SET_COOKIE, claim_clear_cookie())],
		Json(WebhookAckResponse { received: true }),
	)
		.into_response()
}

fn generic_rejection() -> Response {
	(
		StatusCode::FORBIDDEN,
		[(SET_COOKIE, claim_clear_cookie())],
		Json(WebhookErrorResponse::rejected()),
	)
		.into_response()
}

/// Receive a signed event from the identity provider.
///
/// # Request
///
/// Headers `webhook-id`, `webhook-timestamp`, and `webhook-signature` are
/// all required for signature verification.
///
/// # Response
///
/// - `200 OK`: event processed (or intentionally ignored)
/// - `401 Unauthorized`: missing headers or bad signature, empty body
/// - `403 Forbidden`: authorization failed, generic body
#[utoipa::path(
    post,
    path = "/webhooks/identity",
    responses(
        (status = 200, description = "Event processed", body = WebhookAckResponse),
        (status = 401, description = "Signature verification failed"),
        (status = 403, description = "Authorization failed", body = WebhookErrorResponse)
    ),
    tag = "webhooks"
)]
#[tracing::instrument(skip(state, headers, body))]
pub async fn identity_webhook(
	State(state): State<AppState>,
	headers: HeaderMap,
	body: Bytes,
) -> Response {
	let (Some(id), Some(timestamp), Some(signature)) = (
		headers.get(HEADER_WEBHOOK_ID).and_then(|v| v.to_str().ok()),
		headers
			.get(HEADER_WEBHOOK_TIMESTAMP)
			.and_then(|v| v.to_str().ok()),
		headers
			.get(HEADER_WEBHOOK_SIGNATURE)
			.and_then(|v| v.to_str().ok()),
	) else {
		tracing::warn!("webhook delivery missing verification headers");
		return StatusCode::UNAUTHORIZED.into_response();
	};

	if let Err(e) = verify_delivery(
		state.idp_config.webhook_secret().expose().as_bytes(),
		id,
		timestamp,
		signature,
		&body,
		Utc::now().timestamp(),
	) {
		tracing::warn!(delivery_id = %id, error = %e, "webhook verification failed");
		return StatusCode::UNAUTHORIZED.into_response();
	}

	let event: IdentityEvent = match serde_json::from_slice(&body) {
		Ok(event) => event,
		Err(e) => {
			tracing::warn!(delivery_id = %id, error = %e, "verified webhook payload failed to parse");
			return (StatusCode::BAD_REQUEST, Json(WebhookErrorResponse::rejected()))
				.into_response();
		}
	};

	match event.kind.as_str() {
		EVENT_ACCOUNT_CREATED => handle_account_created(&state, &headers, event).await,
		EVENT_ACCOUNT_UPDATED => handle_account_updated(&state, event).await,
		EVENT_ACCOUNT_DELETED => handle_account_deleted(&state, event).await,
		other => {
			// Acknowledge so the provider does not retry events this
			// service never consumes.
			tracing::debug!(kind = %other, "ignoring unhandled event kind");
			ack()
		}
	}
}

async fn handle_account_created(
	state: &AppState,
	headers: &HeaderMap,
	event: IdentityEvent,
) -> Response {
	let external_id = event.data.id;

	let Some(email) = event.data.email else {
		// An account without a usable email cannot be bound to any
		// invitation.
		tracing::warn!("account created without a primary email");
		return reject_and_compensate(state, &external_id, "missing_email").await;
	};

	let claim_hint = extract_claim_cookie(headers).and_then(|value| {
		match decode_claim(state.claim_secret.expose().as_bytes(), &value, Utc::now()) {
			Ok(claim) => Some(hash_token(&claim.token)),
			Err(e) => {
				tracing::debug!(error = %e, "ignoring unusable claim cookie");
				None
			}
		}
	});

	let result = state
		.invitation_repo
		.accept_atomically(
			&email,
			&external_id,
			event.data.name.as_deref(),
			claim_hint.as_deref(),
		)
		.await;

	match result {
		Ok(account) => {
			state.audit_service.log(
				AuditLogBuilder::new(AuditEventType::MemberAdded)
					.actor(account.id.to_string())
					.resource("org", account.org_id.to_string())
					.details(serde_json::json!({
						"invitation_id": account.invitation_id.to_string(),
						"role": account.role.to_string(),
					}))
					.build(),
			);
			tracing::info!(
				account_id = %account.id,
				org_id = %account.org_id,
				"signup authorized, member account created"
			);
			ack_clearing_claim()
		}
		Err(AcceptError::NoInvitation) => {
			// A provider redelivery for an already-bound identity is not a
			// new signup; acknowledge instead of deleting the account.
			if let Ok(Some(existing)) = state.account_repo.find_by_external_id(&external_id).await {
				if existing.email.eq_ignore_ascii_case(&email) {
					tracing::info!(account_id = %existing.id, "duplicate delivery for bound identity");
					return ack_clearing_claim();
				}
			}
			tracing::info!("no usable invitation for created account");
			reject_and_compensate(state, &external_id, "no_invitation").await
		}
		Err(AcceptError::Expired) => {
			tracing::info!("invitation expired at webhook time");
			reject_and_compensate(state, &external_id, "expired").await
		}
		Err(AcceptError::OrganizationInactive) => {
			tracing::info!("organization inactive at webhook time");
			reject_and_compensate(state, &external_id, "organization_inactive").await
		}
		Err(AcceptError::SeatLimitReached) => {
			tracing::info!("seat limit reached at webhook time");
			reject_and_compensate(state, &external_id, "seat_limit_reached").await
		}
		Err(AcceptError::Db(e)) => {
			// The transaction rolled back; from the provider's point of
			// view "we couldn't authorize this" is the only fact that
			// matters, so the same compensation path applies.
			tracing::error!(error = %e, "accept transaction failed");
			reject_and_compensate(state, &external_id, "internal_error").await
		}
	}
}

/// Delete the externally-created identity and answer with the generic
/// rejection. The delete gets one retry on transient failure; exhausting
/// it is escalated as critical.
async fn reject_and_compensate(state: &AppState, external_id: &str, cause: &str) -> Response {
	state.audit_service.log(
		AuditLogBuilder::new(AuditEventType::SignupRejected)
			.resource("identity", external_id)
			.details(serde_json::json!({"cause": cause}))
			.build(),
	);

	let idp = state.idp.as_ref();
	let delete = foyer_common_http::retry(
		&state.idp_config.retry_config,
		"idp_delete_identity",
		move || idp.delete_identity(external_id),
	)
	.await;

	if let Err(e) = delete {
		tracing::error!(
			error = %e,
			"CRITICAL: compensating delete failed; unauthorized external identity is orphaned"
		);
		state.audit_service.log(
			AuditLogBuilder::new(AuditEventType::CompensationFailed)
				.resource("identity", external_id)
				.details(serde_json::json!({"cause": cause}))
				.build(),
		);
	} else {
		tracing::info!("unauthorized external identity deleted");
	}

	generic_rejection()
}

async fn handle_account_updated(state: &AppState, event: IdentityEvent) -> Response {
	match state
		.account_repo
		.sync_profile(
			&event.data.id,
			event.data.email.as_deref(),
			event.data.name.as_deref(),
		)
		.await
	{
		Ok(synced) => {
			if !synced {
				tracing::debug!("update event for unbound identity ignored");
			}
			ack()
		}
		Err(e) => {
			tracing::error!(error = %e, "profile sync failed");
			(
				StatusCode::INTERNAL_SERVER_ERROR,
				Json(WebhookErrorResponse::rejected()),
			)
				.into_response()
		}
	}
}

async fn handle_account_deleted(state: &AppState, event: IdentityEvent) -> Response {
	match state.account_repo.deactivate(&event.data.id).await {
		Ok(deactivated) => {
			if deactivated {
				state.audit_service.log(
					AuditLogBuilder::new(AuditEventType::MemberDeactivated)
						.resource("identity", event.data.id.as_str())
						.build(),
				);
			}
			ack()
		}
		Err(e) => {
			tracing::error!(error = %e, "account deactivation failed");
			(
				StatusCode::INTERNAL_SERVER_ERROR,
				Json(WebhookErrorResponse::rejected()),
			)
				.into_response()
		}
	}
}
