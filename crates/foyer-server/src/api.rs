// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Application state and router construction.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::{Json, Router};
use sqlx::SqlitePool;
use utoipa::OpenApi;

use foyer_common_config::SecretString;
use foyer_server_audit::{AuditService, SqliteAuditSink};
use foyer_server_config::ServerConfig;
use foyer_server_db::{AccountRepository, InvitationRepository, OrgRepository};
use foyer_server_idp::{IdentityProvider, IdpConfig};

use crate::rate_limit::RateLimiter;
use crate::routes;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
	pub org_repo: Arc<OrgRepository>,
	pub invitation_repo: Arc<InvitationRepository>,
	pub account_repo: Arc<AccountRepository>,
	pub audit_service: Arc<AuditService>,
	pub rate_limiter: Arc<RateLimiter>,
	/// The identity provider's outbound surface (compensating delete).
	pub idp: Arc<dyn IdentityProvider>,
	/// Provider configuration: webhook secret and signup URL builder.
	pub idp_config: IdpConfig,
	/// Signing secret for the claim cookie.
	pub claim_secret: SecretString,
}

/// Build the application state from a pool and configuration.
pub async fn create_app_state(
	pool: SqlitePool,
	config: &ServerConfig,
	idp_config: IdpConfig,
	idp: Arc<dyn IdentityProvider>,
) -> AppState {
	let audit_service = Arc::new(AuditService::new(
		1024,
		vec![Arc::new(SqliteAuditSink::new(pool.clone()))],
	));

	AppState {
		org_repo: Arc::new(OrgRepository::new(pool.clone())),
		invitation_repo: Arc::new(InvitationRepository::new(pool.clone())),
		account_repo: Arc::new(AccountRepository::new(pool)),
		audit_service,
		rate_limiter: Arc::new(RateLimiter::new(
			config.rate_limit.limit,
			Duration::from_secs(config.rate_limit.window_secs),
		)),
		idp,
		idp_config,
		claim_secret: config.claim_secret.clone(),
	}
}

/// OpenAPI documentation for the public surface.
#[derive(OpenApi)]
#[openapi(
	paths(
		routes::health::health,
		routes::verify::verify_invitation,
		routes::accept::accept_invitation,
		routes::webhooks::identity_webhook,
	),
	components(schemas(
		foyer_server_api::invitations::VerifyInvitationResponse,
		foyer_server_api::invitations::InvitationDetails,
		foyer_server_api::invitations::RejectionReason,
		foyer_server_api::invitations::AcceptInvitationRequest,
		foyer_server_api::invitations::AcceptInvitationResponse,
		foyer_server_api::invitations::InvitationErrorResponse,
		foyer_server_api::webhooks::WebhookAckResponse,
		foyer_server_api::webhooks::WebhookErrorResponse,
	)),
	tags(
		(name = "invitations", description = "Invitation verification and acceptance"),
		(name = "webhooks", description = "Identity provider webhook gate")
	)
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
	Json(ApiDoc::openapi())
}

/// Build the router with all routes registered.
pub fn create_router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(routes::health::health))
		.route(
			"/api/invitations/verify",
			get(routes::verify::verify_invitation),
		)
		.route(
			"/api/invitations/accept",
			post(routes::accept::accept_invitation),
		)
		.route("/webhooks/identity", post(routes::webhooks::identity_webhook))
		.route("/api-docs/openapi.json", get(openapi_json))
		.with_state(state)
}
