// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Webhook event payloads from the identity provider.

use serde::Deserialize;

/// Event kind: the provider created an account (signup completed).
pub const EVENT_ACCOUNT_CREATED: &str = "account.created";

/// Event kind: profile fields changed on an existing account.
pub const EVENT_ACCOUNT_UPDATED: &str = "account.updated";

/// Event kind: the account was deleted at the provider.
pub const EVENT_ACCOUNT_DELETED: &str = "account.deleted";

/// A signed webhook delivery's decoded payload.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityEvent {
	/// Event kind, e.g. `account.created`.
	#[serde(rename = "type")]
	pub kind: String,
	/// The account the event concerns.
	pub data: IdentityAccount,
}

/// The provider's view of an account.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityAccount {
	/// The provider's identity id.
	pub id: String,
	/// Primary email; absent on malformed provisioning.
	#[serde(default)]
	pub email: Option<String>,
	/// Display name, if the signup flow collected one.
	#[serde(default)]
	pub name: Option<String>,
}
