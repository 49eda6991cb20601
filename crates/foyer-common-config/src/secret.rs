// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! A wrapper type for sensitive values.
//!
//! [`Secret<T>`] redacts its contents from `Debug` and `Display` output and
//! zeroizes the inner value on drop. Access to the real value requires an
//! explicit [`Secret::expose`] call, which keeps accidental `{:?}` logging
//! of tokens and webhook secrets from leaking them.

use std::fmt;

use zeroize::Zeroize;

/// Placeholder emitted wherever a secret would otherwise be printed.
pub const REDACTED: &str = "[REDACTED]";

/// A sensitive value that must not appear in logs.
pub struct Secret<T: Zeroize>(T);

/// A sensitive string (tokens, webhook secrets, API keys).
pub type SecretString = Secret<String>;

impl<T: Zeroize> Secret<T> {
	/// Wrap a sensitive value.
	pub fn new(value: T) -> Self {
		Self(value)
	}

	/// Access the inner value.
	///
	/// The call site makes every use of the real secret greppable.
	pub fn expose(&self) -> &T {
		&self.0
	}
}

impl<T: Zeroize + Clone> Clone for Secret<T> {
	fn clone(&self) -> Self {
		Self(self.0.clone())
	}
}

impl<T: Zeroize> Drop for Secret<T> {
	fn drop(&mut self) {
		self.0.zeroize();
	}
}

impl<T: Zeroize> fmt::Debug for Secret<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl<T: Zeroize> fmt::Display for Secret<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl From<String> for SecretString {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}

impl From<&str> for SecretString {
	fn from(value: &str) -> Self {
		Self::new(value.to_string())
	}
}

#[cfg(feature = "serde")]
impl<'de, T: Zeroize + serde::Deserialize<'de>> serde::Deserialize<'de> for Secret<T> {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		T::deserialize(deserializer).map(Secret::new)
	}
}

#[cfg(feature = "serde")]
impl<T: Zeroize> serde::Serialize for Secret<T> {
	// Serialization always emits the redaction marker; secrets leave the
	// process only via expose().
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.serialize_str(REDACTED)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn debug_is_redacted() {
		let secret = SecretString::new("hunter2".to_string());
		assert_eq!(format!("{secret:?}"), REDACTED);
	}

	#[test]
	fn display_is_redacted() {
		let secret = SecretString::new("hunter2".to_string());
		assert_eq!(format!("{secret}"), REDACTED);
	}

	#[test]
	fn expose_returns_inner() {
		let secret = SecretString::new("hunter2".to_string());
		assert_eq!(secret.expose(), "hunter2");
	}

	#[cfg(feature = "serde")]
	#[test]
	fn serialize_is_redacted() {
		let secret = SecretString::new("hunter2".to_string());
		let json = serde_json::to_string(&secret).unwrap();
		assert_eq!(json, format!("\"{REDACTED}\""));
	}

	#[cfg(feature = "serde")]
	#[test]
	fn deserialize_reads_plain_value() {
		let secret: SecretString = serde_json::from_str("\"hunter2\"").unwrap();
		assert_eq!(secret.expose(), "hunter2");
	}
}
