// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Acknowledgement returned to the identity provider.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WebhookAckResponse {
	pub received: bool,
}

/// Generic rejection returned to the identity provider.
///
/// Deliberately carries no detail: an unauthenticated webhook replay must
/// not learn why authorization failed.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WebhookErrorResponse {
	pub error: String,
}

impl WebhookErrorResponse {
	/// The one rejection body every authorization failure shares.
	pub fn rejected() -> Self {
		Self {
			error: "rejected".to_string(),
		}
	}
}
