// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Webhook signature verification for identity provider deliveries.
//!
//! Every delivery carries three headers: a message id, a unix timestamp,
//! and an HMAC-SHA256 signature over `{id}.{timestamp}.{body}` in
//! `v1=<hex>` form. Verification rejects both bad signatures and
//! timestamps outside the tolerance window, so a captured delivery cannot
//! be replayed later.

use tracing::{debug, warn};

use crate::error::IdpError;

/// Header carrying the provider's unique message id.
pub const HEADER_WEBHOOK_ID: &str = "webhook-id";

/// Header carrying the delivery's unix timestamp (seconds).
pub const HEADER_WEBHOOK_TIMESTAMP: &str = "webhook-timestamp";

/// Header carrying the `v1=<hex>` signature.
pub const HEADER_WEBHOOK_SIGNATURE: &str = "webhook-signature";

/// Accepted clock skew between the provider and this service.
pub const TIMESTAMP_TOLERANCE_SECS: i64 = 300;

/// Verify a webhook delivery's signature and timestamp.
///
/// # Arguments
///
/// * `secret` - The webhook secret shared with the provider
/// * `id` - Value of the `webhook-id` header
/// * `timestamp` - Value of the `webhook-timestamp` header (unix seconds)
/// * `signature_header` - Value of the `webhook-signature` header
/// * `body` - The raw request body bytes
/// * `now` - Current unix time in seconds
///
/// # Returns
///
/// `Ok(())` if the delivery is authentic and fresh;
/// `Err(IdpError::StaleWebhookTimestamp)` for an out-of-window timestamp;
/// `Err(IdpError::InvalidWebhookSignature)` otherwise.
pub fn verify_delivery(
	secret: &[u8],
	id: &str,
	timestamp: &str,
	signature_header: &str,
	body: &[u8],
	now: i64,
) -> Result<(), IdpError> {
	let ts: i64 = timestamp.parse().map_err(|_| {
		warn!("webhook timestamp is not a unix integer");
		IdpError::InvalidWebhookSignature
	})?;

	if (now - ts).abs() > TIMESTAMP_TOLERANCE_SECS {
		warn!(
			skew_secs = (now - ts).abs(),
			"webhook timestamp outside tolerance"
		);
		return Err(IdpError::StaleWebhookTimestamp);
	}

	if foyer_common_webhook::verify_event_signature(secret, id, ts, body, signature_header) {
		debug!("webhook signature verified");
		Ok(())
	} else {
		warn!("webhook signature verification failed");
		Err(IdpError::InvalidWebhookSignature)
	}
}

/// Compute the signature for a delivery.
///
/// This is useful for testing webhook signature verification.
pub fn compute_delivery_signature(secret: &[u8], id: &str, timestamp: i64, body: &[u8]) -> String {
	foyer_common_webhook::compute_event_signature(secret, id, timestamp, body)
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	const SECRET: &[u8] = b"whsec_test";
	const BODY: &[u8] = br#"{"type": "account.created"}"#;
	const NOW: i64 = 1_700_000_000;

	#[test]
	fn test_verify_valid_delivery() {
		let sig = compute_delivery_signature(SECRET, "msg_1", NOW, BODY);
		assert!(verify_delivery(SECRET, "msg_1", &NOW.to_string(), &sig, BODY, NOW).is_ok());
	}

	#[test]
	fn test_verify_invalid_signature() {
		let sig = format!("v1={}", "0".repeat(64));
		let result = verify_delivery(SECRET, "msg_1", &NOW.to_string(), &sig, BODY, NOW);
		assert!(matches!(result, Err(IdpError::InvalidWebhookSignature)));
	}

	#[test]
	fn test_verify_tampered_body() {
		let sig = compute_delivery_signature(SECRET, "msg_1", NOW, BODY);
		let result = verify_delivery(
			SECRET,
			"msg_1",
			&NOW.to_string(),
			&sig,
			br#"{"type": "account.deleted"}"#,
			NOW,
		);
		assert!(matches!(result, Err(IdpError::InvalidWebhookSignature)));
	}

	#[test]
	fn test_verify_wrong_secret() {
		let sig = compute_delivery_signature(SECRET, "msg_1", NOW, BODY);
		let result = verify_delivery(b"whsec_other", "msg_1", &NOW.to_string(), &sig, BODY, NOW);
		assert!(matches!(result, Err(IdpError::InvalidWebhookSignature)));
	}

	#[test]
	fn test_verify_non_numeric_timestamp() {
		let sig = compute_delivery_signature(SECRET, "msg_1", NOW, BODY);
		let result = verify_delivery(SECRET, "msg_1", "yesterday", &sig, BODY, NOW);
		assert!(matches!(result, Err(IdpError::InvalidWebhookSignature)));
	}

	#[test]
	fn test_verify_stale_timestamp() {
		let stale = NOW - TIMESTAMP_TOLERANCE_SECS - 1;
		let sig = compute_delivery_signature(SECRET, "msg_1", stale, BODY);
		let result = verify_delivery(SECRET, "msg_1", &stale.to_string(), &sig, BODY, NOW);
		assert!(matches!(result, Err(IdpError::StaleWebhookTimestamp)));
	}

	#[test]
	fn test_verify_future_timestamp_within_tolerance() {
		let future = NOW + TIMESTAMP_TOLERANCE_SECS - 1;
		let sig = compute_delivery_signature(SECRET, "msg_1", future, BODY);
		assert!(verify_delivery(SECRET, "msg_1", &future.to_string(), &sig, BODY, NOW).is_ok());
	}

	proptest! {
		/// Valid deliveries always verify inside the tolerance window.
		#[test]
		fn prop_valid_delivery_verifies(
			secret in proptest::collection::vec(proptest::num::u8::ANY, 1..64),
			id in "[a-zA-Z0-9_]{1,32}",
			skew in -TIMESTAMP_TOLERANCE_SECS..=TIMESTAMP_TOLERANCE_SECS,
			body in proptest::collection::vec(proptest::num::u8::ANY, 0..500)
		) {
			let ts = NOW + skew;
			let sig = compute_delivery_signature(&secret, &id, ts, &body);
			prop_assert!(verify_delivery(&secret, &id, &ts.to_string(), &sig, &body, NOW).is_ok());
		}

		/// Swapping the message id always fails verification.
		#[test]
		fn prop_swapped_id_fails(
			secret in proptest::collection::vec(proptest::num::u8::ANY, 1..64),
			id1 in "[a-z]{4,16}",
			id2 in "[A-Z]{4,16}",
			body in proptest::collection::vec(proptest::num::u8::ANY, 1..500)
		) {
			let sig = compute_delivery_signature(&secret, &id1, NOW, &body);
			let result = verify_delivery(&secret, &id2, &NOW.to_string(), &sig, &body, NOW);
			prop_assert!(result.is_err());
		}
	}
}
