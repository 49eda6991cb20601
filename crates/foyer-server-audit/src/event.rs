// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core event types for audit logging.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Types of events recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
	// Membership events
	MemberAdded,
	MemberDeactivated,

	// Invitation events
	InvitationRevoked,
	InvitationExpired,

	// Webhook gate events
	WebhookRejected,
	SignupRejected,

	// Compensating-action events
	CompensationFailed,
}

impl fmt::Display for AuditEventType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			AuditEventType::MemberAdded => "member_added",
			AuditEventType::MemberDeactivated => "member_deactivated",
			AuditEventType::InvitationRevoked => "invitation_revoked",
			AuditEventType::InvitationExpired => "invitation_expired",
			AuditEventType::WebhookRejected => "webhook_rejected",
			AuditEventType::SignupRejected => "signup_rejected",
			AuditEventType::CompensationFailed => "compensation_failed",
		};
		write!(f, "{s}")
	}
}

impl AuditEventType {
	/// Default severity for this event type.
	pub fn default_severity(&self) -> AuditSeverity {
		match self {
			AuditEventType::MemberAdded
			| AuditEventType::MemberDeactivated
			| AuditEventType::InvitationRevoked
			| AuditEventType::InvitationExpired => AuditSeverity::Info,
			AuditEventType::WebhookRejected | AuditEventType::SignupRejected => {
				AuditSeverity::Warning
			}
			// An orphaned, unauthorized external identity is a security
			// incident, not a routine error.
			AuditEventType::CompensationFailed => AuditSeverity::Critical,
		}
	}
}

/// Severity levels for audit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
	Info,
	Warning,
	Error,
	Critical,
}

impl fmt::Display for AuditSeverity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			AuditSeverity::Info => "info",
			AuditSeverity::Warning => "warning",
			AuditSeverity::Error => "error",
			AuditSeverity::Critical => "critical",
		};
		write!(f, "{s}")
	}
}

/// A complete audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
	pub id: Uuid,
	pub timestamp: DateTime<Utc>,
	pub event_type: AuditEventType,
	pub severity: AuditSeverity,
	/// The acting party, where one exists (account id or "system").
	pub actor: Option<String>,
	pub resource_type: Option<String>,
	pub resource_id: Option<String>,
	/// Structured context; never free text derived from request bodies.
	pub details: serde_json::Value,
}

/// Fluent builder for [`AuditLogEntry`].
pub struct AuditLogBuilder {
	entry: AuditLogEntry,
}

impl AuditLogBuilder {
	/// Start an entry of the given type at the current time.
	pub fn new(event_type: AuditEventType) -> Self {
		Self {
			entry: AuditLogEntry {
				id: Uuid::new_v4(),
				timestamp: Utc::now(),
				event_type,
				severity: event_type.default_severity(),
				actor: None,
				resource_type: None,
				resource_id: None,
				details: serde_json::Value::Null,
			},
		}
	}

	/// Override the default severity.
	pub fn severity(mut self, severity: AuditSeverity) -> Self {
		self.entry.severity = severity;
		self
	}

	/// Set the acting party.
	pub fn actor(mut self, actor: impl Into<String>) -> Self {
		self.entry.actor = Some(actor.into());
		self
	}

	/// Set the resource the event concerns.
	pub fn resource(mut self, resource_type: impl Into<String>, id: impl Into<String>) -> Self {
		self.entry.resource_type = Some(resource_type.into());
		self.entry.resource_id = Some(id.into());
		self
	}

	/// Attach structured details.
	pub fn details(mut self, details: serde_json::Value) -> Self {
		self.entry.details = details;
		self
	}

	/// Finish the entry.
	pub fn build(self) -> AuditLogEntry {
		self.entry
	}
}
