// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core type definitions for the membership system.
//!
//! This module defines the foundational types used throughout the
//! invitation core:
//!
//! - **ID newtypes**: Type-safe wrappers around UUIDs for different entity
//!   types ([`OrgId`], [`AccountId`], [`InvitationId`]) preventing
//!   accidental mixing
//! - **Role enum**: Organization roles granted by invitation ([`OrgRole`])
//!
//! All ID types implement transparent serde serialization (as UUID strings)
//! and provide conversion to/from [`uuid::Uuid`].

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// ID Newtypes
// =============================================================================

macro_rules! define_id_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(Uuid);

		impl $name {
			/// Create a new ID from a UUID.
			pub fn new(id: Uuid) -> Self {
				Self(id)
			}

			/// Generate a new random ID.
			pub fn generate() -> Self {
				Self(Uuid::new_v4())
			}

			/// Get the inner UUID value.
			pub fn into_inner(self) -> Uuid {
				self.0
			}

			/// Get a reference to the inner UUID.
			pub fn as_uuid(&self) -> &Uuid {
				&self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl From<Uuid> for $name {
			fn from(id: Uuid) -> Self {
				Self(id)
			}
		}

		impl From<$name> for Uuid {
			fn from(id: $name) -> Self {
				id.0
			}
		}
	};
}

define_id_type!(OrgId, "Unique identifier for an organization.");
define_id_type!(AccountId, "Unique identifier for a member account.");
define_id_type!(InvitationId, "Unique identifier for an invitation.");

// =============================================================================
// Organization Roles
// =============================================================================

/// Roles within an organization, granted at invitation-accept time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrgRole {
	/// Full org control, billing, can delete org.
	Owner,
	/// Manage members and settings, cannot delete org.
	Admin,
	/// Standard member access.
	Member,
}

impl OrgRole {
	/// Returns all available organization roles.
	pub fn all() -> &'static [OrgRole] {
		&[OrgRole::Owner, OrgRole::Admin, OrgRole::Member]
	}

	/// Parse a role from its persisted string form, defaulting unknown
	/// values to [`OrgRole::Member`].
	pub fn from_str_or_member(s: &str) -> Self {
		match s {
			"owner" => OrgRole::Owner,
			"admin" => OrgRole::Admin,
			_ => OrgRole::Member,
		}
	}
}

impl fmt::Display for OrgRole {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			OrgRole::Owner => write!(f, "owner"),
			OrgRole::Admin => write!(f, "admin"),
			OrgRole::Member => write!(f, "member"),
		}
	}
}
