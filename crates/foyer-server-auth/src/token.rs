// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Invitation token codec.
//!
//! Tokens are 32 bytes of OS randomness rendered as URL-safe base64 without
//! padding (43 characters, 256 bits of entropy). Only the SHA-256 hash of a
//! token is ever persisted or used for lookup; the clear token exists in
//! the invitation email and in flight.
//!
//! # Security Notes
//!
//! - [`is_well_formed_token`] is a cheap structural gate run before any
//!   database access. It limits enumeration and junk-input load; it is not
//!   a security boundary on its own.
//! - Token values are never logged; log the hash prefix instead.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Length in characters of a well-formed token (32 bytes, base64url, no pad).
pub const TOKEN_LEN: usize = 43;

/// Generate a new invitation token.
pub fn generate_token() -> String {
	let mut bytes = [0u8; 32];
	rand::rngs::OsRng.fill_bytes(&mut bytes);
	URL_SAFE_NO_PAD.encode(bytes)
}

/// Structural check on a candidate token: exact length and URL-safe base64
/// charset. Rejecting malformed input here avoids a datastore lookup.
pub fn is_well_formed_token(candidate: &str) -> bool {
	candidate.len() == TOKEN_LEN
		&& candidate
			.bytes()
			.all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Hash a token for at-rest storage and lookup (SHA-256, hex).
pub fn hash_token(token: &str) -> String {
	let mut hasher = Sha256::new();
	hasher.update(token.as_bytes());
	hex::encode(hasher.finalize())
}

/// The first eight characters of a token's hash, safe to include in logs.
pub fn token_log_prefix(token: &str) -> String {
	let hash = hash_token(token);
	hash.chars().take(8).collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use std::collections::HashSet;

	#[test]
	fn generated_token_is_well_formed() {
		let token = generate_token();
		assert_eq!(token.len(), TOKEN_LEN);
		assert!(is_well_formed_token(&token));
	}

	#[test]
	fn generated_tokens_are_unique() {
		let mut seen = HashSet::new();
		for _ in 0..1000 {
			assert!(seen.insert(generate_token()));
		}
	}

	#[test]
	fn short_token_is_rejected() {
		assert!(!is_well_formed_token("abc"));
	}

	#[test]
	fn long_token_is_rejected() {
		let long = "a".repeat(TOKEN_LEN + 1);
		assert!(!is_well_formed_token(&long));
	}

	#[test]
	fn token_with_invalid_charset_is_rejected() {
		let mut token = generate_token();
		token.replace_range(0..1, "+");
		assert!(!is_well_formed_token(&token));
	}

	#[test]
	fn empty_token_is_rejected() {
		assert!(!is_well_formed_token(""));
	}

	#[test]
	fn hash_is_stable_and_hex() {
		let token = generate_token();
		let h1 = hash_token(&token);
		let h2 = hash_token(&token);
		assert_eq!(h1, h2);
		assert_eq!(h1.len(), 64);
		assert!(h1.chars().all(|c| c.is_ascii_hexdigit()));
	}

	#[test]
	fn log_prefix_is_the_hash_prefix() {
		let token = generate_token();
		let prefix = token_log_prefix(&token);
		assert_eq!(prefix.len(), 8);
		assert!(hash_token(&token).starts_with(&prefix));
	}

	proptest! {
		#[test]
		fn prop_arbitrary_strings_of_wrong_length_are_rejected(s in ".*") {
			if s.len() != TOKEN_LEN {
				prop_assert!(!is_well_formed_token(&s));
			}
		}

		#[test]
		fn prop_hash_differs_for_different_tokens(a in "[a-zA-Z0-9_-]{43}", b in "[a-zA-Z0-9_-]{43}") {
			if a != b {
				prop_assert_ne!(hash_token(&a), hash_token(&b));
			}
		}
	}
}
