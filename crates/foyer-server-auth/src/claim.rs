// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The signed claim cookie.
//!
//! The external identity provider's signup flow does not carry the
//! invitation token through to its webhook, so the acceptance handoff
//! stakes a claim in a tamper-evident cookie: `{token}.{expires}.{sig}`
//! where `sig` is an HMAC-SHA256 over `{token}.{expires}` with a dedicated
//! server secret.
//!
//! # Security Notes
//!
//! - The claim is a hint, not a credential: the webhook gate re-validates
//!   the underlying invitation and treats the email-based lookup as
//!   authoritative. A forged cookie therefore buys nothing.
//! - The cookie is `HttpOnly`, `Secure`, `SameSite=Lax` and expires with
//!   the invitation.

use chrono::{DateTime, TimeZone, Utc};
use http::header::COOKIE;
use http::HeaderMap;
use thiserror::Error;

use crate::token::is_well_formed_token;

/// Name of the claim cookie.
pub const CLAIM_COOKIE_NAME: &str = "foyer_claim";

/// Errors from claim decoding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClaimError {
	/// The cookie value does not have the `{token}.{expires}.{sig}` shape.
	#[error("malformed claim")]
	Malformed,

	/// The signature does not match the payload.
	#[error("claim signature mismatch")]
	BadSignature,

	/// The claim's validity window has passed.
	#[error("claim expired")]
	Expired,
}

/// A staked claim: which invitation token a signup in flight is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
	pub token: String,
	pub expires_at: DateTime<Utc>,
}

/// Encode and sign a claim into a cookie value.
pub fn encode_claim(secret: &[u8], claim: &Claim) -> String {
	let expires = claim.expires_at.timestamp();
	let payload = format!("{}.{expires}", claim.token);
	let sig = foyer_common_webhook::compute_hmac_sha256(secret, payload.as_bytes());
	format!("{payload}.{sig}")
}

/// Decode a cookie value into a claim, verifying signature and expiry.
pub fn decode_claim(secret: &[u8], value: &str, now: DateTime<Utc>) -> Result<Claim, ClaimError> {
	let mut parts = value.splitn(3, '.');
	let (Some(token), Some(expires_str), Some(sig)) = (parts.next(), parts.next(), parts.next())
	else {
		return Err(ClaimError::Malformed);
	};

	if !is_well_formed_token(token) {
		return Err(ClaimError::Malformed);
	}

	let expires: i64 = expires_str.parse().map_err(|_| ClaimError::Malformed)?;

	let payload = format!("{token}.{expires}");
	if !foyer_common_webhook::verify_hmac_sha256(secret, payload.as_bytes(), sig) {
		return Err(ClaimError::BadSignature);
	}

	let expires_at = Utc
		.timestamp_opt(expires, 0)
		.single()
		.ok_or(ClaimError::Malformed)?;

	if expires_at <= now {
		return Err(ClaimError::Expired);
	}

	Ok(Claim {
		token: token.to_string(),
		expires_at,
	})
}

/// Extract the claim cookie value from a request's `Cookie` header.
///
/// Parses the `Cookie` header to find the claim cookie; returns `None` if
/// the cookie is not present.
pub fn extract_claim_cookie(headers: &HeaderMap) -> Option<String> {
	let cookie_header = headers.get(COOKIE)?.to_str().ok()?;
	cookie_header.split(';').find_map(|cookie| {
		let (name, value) = cookie.trim().split_once('=')?;
		if name == CLAIM_COOKIE_NAME {
			Some(value.to_string())
		} else {
			None
		}
	})
}

/// Build the `Set-Cookie` header value staking a claim.
pub fn claim_set_cookie(value: &str, expires_at: DateTime<Utc>) -> String {
	format!(
		"{CLAIM_COOKIE_NAME}={value}; Path=/; Expires={}; HttpOnly; Secure; SameSite=Lax",
		expires_at.format("%a, %d %b %Y %H:%M:%S GMT")
	)
}

/// Build the `Set-Cookie` header value clearing the claim cookie.
pub fn claim_clear_cookie() -> String {
	format!("{CLAIM_COOKIE_NAME}=; Path=/; Max-Age=0; HttpOnly; Secure; SameSite=Lax")
}
