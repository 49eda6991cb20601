// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the identity provider client.

use std::env;

use foyer_common_config::{load_secret_env, SecretString};
use foyer_common_http::RetryConfig;
use reqwest::Url;

use crate::error::IdpError;

/// Configuration for the identity provider client.
///
/// Sensitive fields (admin API key, webhook secret) are stored as
/// [`SecretString`] to prevent accidental logging. Use `.expose()` to
/// access the actual values.
#[derive(Clone)]
pub struct IdpConfig {
	/// Base URL for the provider's admin API (validated HTTPS, parsed).
	base_url: Url,

	/// URL of the provider's hosted signup flow.
	signup_url: Url,

	/// Bearer token for the admin API.
	api_key: SecretString,

	/// Secret for webhook signature verification.
	webhook_secret: SecretString,

	/// HTTP retry configuration for the compensating delete.
	pub retry_config: RetryConfig,
}

impl std::fmt::Debug for IdpConfig {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("IdpConfig")
			.field("base_url", &self.base_url.as_str())
			.field("signup_url", &self.signup_url.as_str())
			.field("api_key", &self.api_key)
			.field("webhook_secret", &self.webhook_secret)
			.field("retry_config", &self.retry_config)
			.finish()
	}
}

impl IdpConfig {
	/// Validate and normalize a base URL.
	///
	/// Requirements:
	/// - Must be a valid URL
	/// - Must use HTTPS scheme (security requirement)
	/// - Must have a host
	fn validate_url(raw: &str, what: &str) -> Result<Url, IdpError> {
		let url = Url::parse(raw)
			.map_err(|e| IdpError::Config(format!("Invalid {what} URL '{raw}': {e}")))?;

		if url.scheme() != "https" {
			return Err(IdpError::Config(format!(
				"{what} URL must use https, got '{}'",
				url.scheme()
			)));
		}

		if url.host_str().is_none() {
			return Err(IdpError::Config(format!("{what} URL must include a host")));
		}

		Ok(url)
	}

	/// Create a new configuration with explicit values.
	pub fn new(
		base_url: &str,
		signup_url: &str,
		api_key: impl Into<String>,
		webhook_secret: impl Into<String>,
	) -> Result<Self, IdpError> {
		Ok(Self {
			base_url: Self::validate_url(base_url, "identity provider base")?,
			signup_url: Self::validate_url(signup_url, "identity provider signup")?,
			api_key: SecretString::new(api_key.into()),
			webhook_secret: SecretString::new(webhook_secret.into()),
			retry_config: RetryConfig::single_retry(),
		})
	}

	/// Create configuration from environment variables.
	///
	/// Required environment variables:
	/// - `FOYER_SERVER_IDP_BASE_URL`: Admin API base URL (HTTPS)
	/// - `FOYER_SERVER_IDP_SIGNUP_URL`: Hosted signup flow URL (HTTPS)
	/// - `FOYER_SERVER_IDP_API_KEY`: Admin API bearer token (or `_FILE` suffix
	///   for file path)
	/// - `FOYER_SERVER_IDP_WEBHOOK_SECRET`: Secret for webhook verification
	///   (or `_FILE` suffix)
	pub fn from_env() -> Result<Self, IdpError> {
		let base_url = env::var("FOYER_SERVER_IDP_BASE_URL")
			.map_err(|_| IdpError::Config("FOYER_SERVER_IDP_BASE_URL not set".to_string()))?;
		let signup_url = env::var("FOYER_SERVER_IDP_SIGNUP_URL")
			.map_err(|_| IdpError::Config("FOYER_SERVER_IDP_SIGNUP_URL not set".to_string()))?;

		let api_key = load_secret_env("FOYER_SERVER_IDP_API_KEY")
			.map_err(|e| IdpError::Config(e.to_string()))?
			.ok_or_else(|| IdpError::Config("FOYER_SERVER_IDP_API_KEY not set".to_string()))?;
		let webhook_secret = load_secret_env("FOYER_SERVER_IDP_WEBHOOK_SECRET")
			.map_err(|e| IdpError::Config(e.to_string()))?
			.ok_or_else(|| {
				IdpError::Config("FOYER_SERVER_IDP_WEBHOOK_SECRET not set".to_string())
			})?;

		Ok(Self {
			base_url: Self::validate_url(&base_url, "identity provider base")?,
			signup_url: Self::validate_url(&signup_url, "identity provider signup")?,
			api_key,
			webhook_secret,
			retry_config: RetryConfig::single_retry(),
		})
	}

	/// Admin API base URL.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Admin API bearer token.
	pub fn api_key(&self) -> &SecretString {
		&self.api_key
	}

	/// Webhook signing secret.
	pub fn webhook_secret(&self) -> &SecretString {
		&self.webhook_secret
	}

	/// Build the signup redirect target with the invitee's email pre-filled.
	pub fn signup_redirect_url(&self, email: &str) -> String {
		let mut url = self.signup_url.clone();
		url.query_pairs_mut().append_pair("email", email);
		url.to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn make_config() -> IdpConfig {
		IdpConfig::new(
			"https://api.idp.example.com",
			"https://accounts.idp.example.com/signup",
			"sk_test_123",
			"whsec_test",
		)
		.unwrap()
	}

	#[test]
	fn http_base_url_is_rejected() {
		let result = IdpConfig::new(
			"http://api.idp.example.com",
			"https://accounts.idp.example.com/signup",
			"k",
			"s",
		);
		assert!(matches!(result, Err(IdpError::Config(_))));
	}

	#[test]
	fn garbage_url_is_rejected() {
		let result = IdpConfig::new(
			"not a url",
			"https://accounts.idp.example.com/signup",
			"k",
			"s",
		);
		assert!(matches!(result, Err(IdpError::Config(_))));
	}

	#[test]
	fn debug_redacts_secrets() {
		let config = make_config();
		let debug = format!("{config:?}");
		assert!(!debug.contains("sk_test_123"));
		assert!(!debug.contains("whsec_test"));
	}

	#[test]
	fn signup_redirect_prefills_email() {
		let config = make_config();
		let url = config.signup_redirect_url("invitee@example.com");
		assert!(url.starts_with("https://accounts.idp.example.com/signup"));
		assert!(url.contains("email=invitee%40example.com"));
	}
}
