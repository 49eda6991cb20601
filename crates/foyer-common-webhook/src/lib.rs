// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared HMAC-SHA256 signature utilities.
//!
//! Two layers:
//!
//! - Raw HMAC over an arbitrary payload ([`compute_hmac_sha256`] /
//!   [`verify_hmac_sha256`]), used by the claim-cookie codec.
//! - A timestamped event signature ([`compute_event_signature`] /
//!   [`verify_event_signature`]) binding a message id and a unix timestamp
//!   to the payload, used for identity-provider webhook deliveries. The
//!   signed content is `{id}.{timestamp}.{payload}` and the signature is
//!   carried as `v1=<hex>`.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Version prefix carried in event signature headers.
pub const EVENT_SIGNATURE_PREFIX: &str = "v1=";

/// Compute an HMAC-SHA256 signature for a payload.
///
/// Returns the hex-encoded signature without any prefix.
pub fn compute_hmac_sha256(secret: &[u8], payload: &[u8]) -> String {
	let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
	mac.update(payload);
	let result = mac.finalize();
	hex::encode(result.into_bytes())
}

/// Verify an HMAC-SHA256 signature for a payload.
///
/// The `signature` should be the raw hex-encoded signature (no prefix).
/// Comparison happens inside the HMAC verifier and is constant-time.
pub fn verify_hmac_sha256(secret: &[u8], payload: &[u8], signature: &str) -> bool {
	let expected_bytes = match hex::decode(signature) {
		Ok(bytes) => bytes,
		Err(_) => return false,
	};

	let mut mac = match HmacSha256::new_from_slice(secret) {
		Ok(m) => m,
		Err(_) => return false,
	};

	mac.update(payload);
	mac.verify_slice(&expected_bytes).is_ok()
}

/// Compute the signature for a timestamped event delivery.
///
/// The signed content is `{id}.{timestamp}.{payload}`, so neither the
/// message id nor the timestamp can be swapped without invalidating the
/// signature. Returns the signature in `v1=<hex>` form.
pub fn compute_event_signature(secret: &[u8], id: &str, timestamp: i64, payload: &[u8]) -> String {
	let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
	mac.update(id.as_bytes());
	mac.update(b".");
	mac.update(timestamp.to_string().as_bytes());
	mac.update(b".");
	mac.update(payload);
	let result = mac.finalize();
	format!("{EVENT_SIGNATURE_PREFIX}{}", hex::encode(result.into_bytes()))
}

/// Verify a `v1=<hex>` signature for a timestamped event delivery.
///
/// Returns `false` for a missing version prefix, malformed hex, or a
/// signature mismatch; callers are expected to enforce timestamp
/// tolerance separately.
pub fn verify_event_signature(
	secret: &[u8],
	id: &str,
	timestamp: i64,
	payload: &[u8],
	signature_header: &str,
) -> bool {
	let Some(signature) = signature_header.strip_prefix(EVENT_SIGNATURE_PREFIX) else {
		return false;
	};

	let expected_bytes = match hex::decode(signature) {
		Ok(bytes) => bytes,
		Err(_) => return false,
	};

	let mut mac = match HmacSha256::new_from_slice(secret) {
		Ok(m) => m,
		Err(_) => return false,
	};

	mac.update(id.as_bytes());
	mac.update(b".");
	mac.update(timestamp.to_string().as_bytes());
	mac.update(b".");
	mac.update(payload);
	mac.verify_slice(&expected_bytes).is_ok()
}
