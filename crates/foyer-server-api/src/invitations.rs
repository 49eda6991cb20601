// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Why a token is not currently usable.
///
/// This is the complete vocabulary an unauthenticated caller can ever see;
/// internal distinctions (which infrastructure failed, which organization a
/// foreign token belongs to) are never surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
	NotFound,
	Expired,
	AlreadyUsed,
	Revoked,
	OrganizationInactive,
	RateLimited,
}

impl fmt::Display for RejectionReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			RejectionReason::NotFound => "not_found",
			RejectionReason::Expired => "expired",
			RejectionReason::AlreadyUsed => "already_used",
			RejectionReason::Revoked => "revoked",
			RejectionReason::OrganizationInactive => "organization_inactive",
			RejectionReason::RateLimited => "rate_limited",
		};
		write!(f, "{s}")
	}
}

/// Projection of a usable invitation, safe for the unauthenticated holder
/// of the token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InvitationDetails {
	pub email: String,
	pub organization_name: String,
	pub role: String,
	pub expires_at: DateTime<Utc>,
}

/// Response of the public verification endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyInvitationResponse {
	pub valid: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub reason: Option<RejectionReason>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub invitation: Option<InvitationDetails>,
}

impl VerifyInvitationResponse {
	/// A valid-token response carrying the projection.
	pub fn valid(invitation: InvitationDetails) -> Self {
		Self {
			valid: true,
			reason: None,
			invitation: Some(invitation),
		}
	}

	/// A rejection with its tagged reason.
	pub fn rejected(reason: RejectionReason) -> Self {
		Self {
			valid: false,
			reason: Some(reason),
			invitation: None,
		}
	}
}

/// Request body of the acceptance handoff.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AcceptInvitationRequest {
	pub token: String,
}

/// Successful handoff: the claim cookie is set and the caller should
/// follow `redirect_url` into the identity provider's signup flow.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AcceptInvitationResponse {
	pub success: bool,
	pub redirect_url: String,
}

/// Error body for invitation endpoints.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InvitationErrorResponse {
	pub error: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub reason: Option<RejectionReason>,
}
