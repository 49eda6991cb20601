// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Centralized configuration management for Foyer server.
//!
//! This crate provides type-safe configuration resolved from environment
//! variables with consistent naming (`FOYER_SERVER_*`) and validation
//! before the server starts.
//!
//! # Usage
//!
//! ```ignore
//! use foyer_server_config::load_config_from_env;
//!
//! let config = load_config_from_env()?;
//! println!("Server listening on {}", config.socket_addr());
//! ```

use std::env;

use foyer_common_config::{load_secret_env, SecretString};
use tracing::info;

/// Errors from configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("missing configuration: {0}")]
	Missing(String),

	#[error("invalid configuration: {0}")]
	Invalid(String),

	#[error("secret loading failed: {0}")]
	Secret(String),
}

/// HTTP listener settings.
#[derive(Debug, Clone)]
pub struct HttpConfig {
	pub host: String,
	pub port: u16,
}

impl Default for HttpConfig {
	fn default() -> Self {
		Self {
			host: "127.0.0.1".to_string(),
			port: 8080,
		}
	}
}

/// Database settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
	pub url: String,
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		Self {
			url: "sqlite:./foyer.db".to_string(),
		}
	}
}

/// Verification endpoint rate limiting.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
	/// Requests allowed per source key per window.
	pub limit: u32,
	/// Window length in seconds.
	pub window_secs: u64,
}

impl Default for RateLimitConfig {
	fn default() -> Self {
		Self {
			limit: 5,
			window_secs: 60,
		}
	}
}

/// Logging settings.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
	/// Default tracing filter when `RUST_LOG` is not set.
	pub level: String,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
		}
	}
}

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
	pub http: HttpConfig,
	pub database: DatabaseConfig,
	pub rate_limit: RateLimitConfig,
	pub logging: LoggingConfig,
	/// Signing secret for the claim cookie.
	pub claim_secret: SecretString,
}

impl Default for ServerConfig {
	// Development defaults; load_config_from_env() requires a real claim
	// secret and validates it.
	fn default() -> Self {
		Self {
			http: HttpConfig::default(),
			database: DatabaseConfig::default(),
			rate_limit: RateLimitConfig::default(),
			logging: LoggingConfig::default(),
			claim_secret: SecretString::new("insecure-dev-claim-secret".to_string()),
		}
	}
}

impl ServerConfig {
	/// Get the socket address string for binding.
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
	match env::var(name) {
		Ok(raw) => raw
			.parse()
			.map_err(|_| ConfigError::Invalid(format!("{name}='{raw}' is not valid"))),
		Err(_) => Ok(default),
	}
}

/// Load configuration from environment variables.
///
/// Environment variables (all optional unless noted):
/// - `FOYER_SERVER_HOST` (default `127.0.0.1`)
/// - `FOYER_SERVER_PORT` (default `8080`)
/// - `FOYER_SERVER_DATABASE_URL` (default `sqlite:./foyer.db`)
/// - `FOYER_SERVER_RATE_LIMIT` (default `5`)
/// - `FOYER_SERVER_RATE_LIMIT_WINDOW_SECS` (default `60`)
/// - `FOYER_SERVER_CLAIM_SECRET` (**required**, or `_FILE` suffix for a
///   mounted secret; at least 16 bytes)
/// - `FOYER_SERVER_LOG` (default `info`)
pub fn load_config_from_env() -> Result<ServerConfig, ConfigError> {
	let defaults = ServerConfig::default();

	let http = HttpConfig {
		host: env::var("FOYER_SERVER_HOST").unwrap_or(defaults.http.host),
		port: env_or("FOYER_SERVER_PORT", defaults.http.port)?,
	};

	let database = DatabaseConfig {
		url: env::var("FOYER_SERVER_DATABASE_URL").unwrap_or(defaults.database.url),
	};

	let rate_limit = RateLimitConfig {
		limit: env_or("FOYER_SERVER_RATE_LIMIT", defaults.rate_limit.limit)?,
		window_secs: env_or(
			"FOYER_SERVER_RATE_LIMIT_WINDOW_SECS",
			defaults.rate_limit.window_secs,
		)?,
	};

	let logging = LoggingConfig {
		level: env::var("FOYER_SERVER_LOG").unwrap_or(defaults.logging.level),
	};

	let claim_secret = load_secret_env("FOYER_SERVER_CLAIM_SECRET")
		.map_err(|e| ConfigError::Secret(e.to_string()))?
		.ok_or_else(|| ConfigError::Missing("FOYER_SERVER_CLAIM_SECRET".to_string()))?;

	let config = ServerConfig {
		http,
		database,
		rate_limit,
		logging,
		claim_secret,
	};

	validate_config(&config)?;

	info!(
		host = %config.http.host,
		port = config.http.port,
		database = %config.database.url,
		rate_limit = config.rate_limit.limit,
		rate_limit_window_secs = config.rate_limit.window_secs,
		"configuration loaded"
	);

	Ok(config)
}

fn validate_config(config: &ServerConfig) -> Result<(), ConfigError> {
	if config.claim_secret.expose().len() < 16 {
		return Err(ConfigError::Invalid(
			"FOYER_SERVER_CLAIM_SECRET must be at least 16 bytes".to_string(),
		));
	}
	if config.rate_limit.limit == 0 {
		return Err(ConfigError::Invalid(
			"FOYER_SERVER_RATE_LIMIT must be at least 1".to_string(),
		));
	}
	if config.rate_limit.window_secs == 0 {
		return Err(ConfigError::Invalid(
			"FOYER_SERVER_RATE_LIMIT_WINDOW_SECS must be at least 1".to_string(),
		));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_are_sane() {
		let config = ServerConfig::default();
		assert_eq!(config.socket_addr(), "127.0.0.1:8080");
		assert_eq!(config.rate_limit.limit, 5);
		assert_eq!(config.rate_limit.window_secs, 60);
	}

	#[test]
	fn validate_rejects_short_claim_secret() {
		let mut config = ServerConfig::default();
		config.claim_secret = SecretString::new("short".to_string());
		assert!(matches!(
			validate_config(&config),
			Err(ConfigError::Invalid(_))
		));
	}

	#[test]
	fn validate_rejects_zero_rate_limit() {
		let mut config = ServerConfig::default();
		config.rate_limit.limit = 0;
		assert!(matches!(
			validate_config(&config),
			Err(ConfigError::Invalid(_))
		));
	}

	#[test]
	fn validate_accepts_defaults() {
		assert!(validate_config(&ServerConfig::default()).is_ok());
	}
}
