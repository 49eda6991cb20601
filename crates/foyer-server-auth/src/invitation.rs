// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Invitation lifecycle types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{AccountId, InvitationId, OrgId, OrgRole};

/// Lifecycle state of an invitation.
///
/// `Pending` is the only live state; the other three are sinks. Expiry is
/// evaluated lazily: a `Pending` row past its `expires_at` is treated as
/// expired by every reader and persisted as `Expired` the first time any
/// code path observes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
	Pending,
	Accepted,
	Expired,
	Revoked,
}

impl InvitationStatus {
	/// Parse a status from its persisted string form.
	pub fn parse(s: &str) -> Option<Self> {
		match s {
			"pending" => Some(InvitationStatus::Pending),
			"accepted" => Some(InvitationStatus::Accepted),
			"expired" => Some(InvitationStatus::Expired),
			"revoked" => Some(InvitationStatus::Revoked),
			_ => None,
		}
	}

	/// Returns true if no transition can leave this state.
	pub fn is_terminal(&self) -> bool {
		!matches!(self, InvitationStatus::Pending)
	}
}

impl fmt::Display for InvitationStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			InvitationStatus::Pending => write!(f, "pending"),
			InvitationStatus::Accepted => write!(f, "accepted"),
			InvitationStatus::Expired => write!(f, "expired"),
			InvitationStatus::Revoked => write!(f, "revoked"),
		}
	}
}

/// An invitation authorizing one email to join one organization with one
/// role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
	pub id: InvitationId,
	pub org_id: OrgId,
	/// Recipient email, stored lowercased for case-insensitive matching.
	pub email: String,
	pub role: OrgRole,
	pub invited_by: AccountId,
	/// SHA-256 hash of the invitation token; the clear token is never stored.
	pub token_hash: String,
	pub status: InvitationStatus,
	pub invited_at: DateTime<Utc>,
	pub expires_at: DateTime<Utc>,
	pub accepted_at: Option<DateTime<Utc>>,
	pub accepted_by: Option<AccountId>,
}

impl Invitation {
	/// Default validity window for a new invitation.
	pub const EXPIRY_DAYS: i64 = 7;

	/// Returns true if the invitation's validity window has passed at `now`.
	///
	/// This is the wall-clock predicate only; it does not consult `status`.
	pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
		self.expires_at <= now
	}

	/// Returns true if the invitation's validity window has passed.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(Utc::now())
	}

	/// Returns true if the invitation can still be accepted right now.
	pub fn is_usable(&self) -> bool {
		self.status == InvitationStatus::Pending && !self.is_expired()
	}
}
