// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the identity provider client.

use foyer_common_http::RetryableError;
use thiserror::Error;

/// Errors that can occur when interacting with the identity provider.
#[derive(Debug, Error)]
pub enum IdpError {
	/// Network-level error during HTTP communication.
	#[error("Network error: {0}")]
	Network(#[from] reqwest::Error),

	/// Request timed out.
	#[error("Request timed out")]
	Timeout,

	/// Invalid API key or configuration.
	#[error("Unauthorized or invalid provider configuration")]
	Unauthorized,

	/// Forbidden - insufficient permissions.
	#[error("Forbidden or insufficient permissions")]
	Forbidden,

	/// Rate limit exceeded.
	#[error("Rate limit exceeded")]
	RateLimited,

	/// Provider API returned an error.
	#[error("Identity provider error: {status} - {message}")]
	ApiError { status: u16, message: String },

	/// Invalid or unparseable response.
	#[error("Invalid response from identity provider: {0}")]
	InvalidResponse(String),

	/// Configuration error.
	#[error("Configuration error: {0}")]
	Config(String),

	/// Webhook signature verification failed.
	#[error("Invalid webhook signature")]
	InvalidWebhookSignature,

	/// Webhook timestamp outside the accepted tolerance window.
	#[error("Webhook timestamp outside tolerance")]
	StaleWebhookTimestamp,
}

impl RetryableError for IdpError {
	fn is_retryable(&self) -> bool {
		match self {
			IdpError::Network(e) => e.is_retryable(),
			IdpError::Timeout => true,
			IdpError::RateLimited => true,
			IdpError::ApiError { status, .. } => *status >= 500,
			_ => false,
		}
	}
}

impl IdpError {
	/// Create an API error from status code and message.
	pub fn api_error(status: u16, message: impl Into<String>) -> Self {
		Self::ApiError {
			status,
			message: message.into(),
		}
	}
}
