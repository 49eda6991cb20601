// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP client for the identity provider's admin API.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use crate::config::IdpConfig;
use crate::error::IdpError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// The outbound surface this core uses against the identity provider.
///
/// A single operation: the compensating delete for an externally-created
/// identity that failed local authorization. Each call is one attempt;
/// retry policy belongs to the caller.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
	/// Delete an identity at the provider.
	///
	/// Deleting an already-deleted identity succeeds, so the compensating
	/// action is safe to retry.
	async fn delete_identity(&self, external_identity_id: &str) -> Result<(), IdpError>;
}

/// Typed client for the identity provider's admin API.
pub struct IdpClient {
	config: IdpConfig,
	client: reqwest::Client,
}

impl IdpClient {
	/// Create a new client from configuration.
	pub fn new(config: IdpConfig) -> Self {
		Self {
			config,
			client: foyer_common_http::new_client_with_timeout(REQUEST_TIMEOUT),
		}
	}
}

#[async_trait]
impl IdentityProvider for IdpClient {
	#[instrument(skip(self, external_identity_id))]
	async fn delete_identity(&self, external_identity_id: &str) -> Result<(), IdpError> {
		let url = self
			.config
			.base_url()
			.join(&format!("v1/accounts/{external_identity_id}"))
			.map_err(|e| IdpError::Config(format!("invalid account URL: {e}")))?;

		let response = self
			.client
			.delete(url)
			.bearer_auth(self.config.api_key().expose())
			.send()
			.await
			.map_err(|e| {
				if e.is_timeout() {
					IdpError::Timeout
				} else {
					IdpError::Network(e)
				}
			})?;

		let status = response.status();
		match status.as_u16() {
			200..=299 => {
				debug!("identity deleted at provider");
				Ok(())
			}
			// Already gone: the compensating delete is idempotent.
			404 => {
				debug!("identity already absent at provider");
				Ok(())
			}
			401 => Err(IdpError::Unauthorized),
			403 => Err(IdpError::Forbidden),
			429 => Err(IdpError::RateLimited),
			code => {
				let message = response.text().await.unwrap_or_default();
				warn!(status = code, "identity provider delete failed");
				Err(IdpError::api_error(code, message))
			}
		}
	}
}
