// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Environment variable helpers for secrets.
//!
//! Secrets can be provided either directly (`FOO=value`) or via file
//! indirection (`FOO_FILE=/run/secrets/foo`), which is how container
//! orchestrators mount secrets. When both are set the `_FILE` variant wins,
//! so a stale inline value cannot shadow the mounted secret.

use std::env;
use std::fs;

use thiserror::Error;

use crate::secret::SecretString;

/// Errors from secret environment loading.
#[derive(Debug, Error)]
pub enum SecretEnvError {
	/// The `*_FILE` variable pointed at an unreadable file.
	#[error("failed to read secret file '{path}' for {var}: {source}")]
	FileRead {
		var: String,
		path: String,
		source: std::io::Error,
	},

	/// The secret file was empty.
	#[error("secret file '{path}' for {var} is empty")]
	EmptyFile { var: String, path: String },
}

/// Load an optional secret from the environment.
///
/// Checks `{name}_FILE` first (reading and trimming the file contents),
/// then `{name}` itself. Returns `Ok(None)` if neither is set.
pub fn load_secret_env(name: &str) -> Result<Option<SecretString>, SecretEnvError> {
	let file_var = format!("{name}_FILE");
	if let Ok(path) = env::var(&file_var) {
		let contents = fs::read_to_string(&path).map_err(|source| SecretEnvError::FileRead {
			var: file_var.clone(),
			path: path.clone(),
			source,
		})?;
		let trimmed = contents.trim();
		if trimmed.is_empty() {
			return Err(SecretEnvError::EmptyFile {
				var: file_var,
				path,
			});
		}
		return Ok(Some(SecretString::new(trimmed.to_string())));
	}

	match env::var(name) {
		Ok(value) if !value.is_empty() => Ok(Some(SecretString::new(value))),
		_ => Ok(None),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	// Env-var tests share process state; each test uses a unique name.

	#[test]
	fn missing_returns_none() {
		let loaded = load_secret_env("FOYER_TEST_SECRET_MISSING").unwrap();
		assert!(loaded.is_none());
	}

	#[test]
	fn inline_value_is_loaded() {
		env::set_var("FOYER_TEST_SECRET_INLINE", "s3cret");
		let loaded = load_secret_env("FOYER_TEST_SECRET_INLINE").unwrap().unwrap();
		assert_eq!(loaded.expose(), "s3cret");
		env::remove_var("FOYER_TEST_SECRET_INLINE");
	}

	#[test]
	fn file_value_wins_over_inline() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "from-file").unwrap();

		env::set_var("FOYER_TEST_SECRET_BOTH", "inline");
		env::set_var(
			"FOYER_TEST_SECRET_BOTH_FILE",
			file.path().to_str().unwrap(),
		);

		let loaded = load_secret_env("FOYER_TEST_SECRET_BOTH").unwrap().unwrap();
		assert_eq!(loaded.expose(), "from-file");

		env::remove_var("FOYER_TEST_SECRET_BOTH");
		env::remove_var("FOYER_TEST_SECRET_BOTH_FILE");
	}

	#[test]
	fn empty_file_is_an_error() {
		let file = tempfile::NamedTempFile::new().unwrap();
		env::set_var(
			"FOYER_TEST_SECRET_EMPTY_FILE",
			file.path().to_str().unwrap(),
		);

		let result = load_secret_env("FOYER_TEST_SECRET_EMPTY");
		assert!(matches!(result, Err(SecretEnvError::EmptyFile { .. })));

		env::remove_var("FOYER_TEST_SECRET_EMPTY_FILE");
	}

	#[test]
	fn unreadable_file_is_an_error() {
		env::set_var(
			"FOYER_TEST_SECRET_NOFILE_FILE",
			"/nonexistent/path/to/secret",
		);

		let result = load_secret_env("FOYER_TEST_SECRET_NOFILE");
		assert!(matches!(result, Err(SecretEnvError::FileRead { .. })));

		env::remove_var("FOYER_TEST_SECRET_NOFILE_FILE");
	}
}
