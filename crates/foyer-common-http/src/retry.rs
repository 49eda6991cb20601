// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Retry with exponential backoff and jitter for transient failures.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

/// Classifies errors as retryable (transient) or permanent.
pub trait RetryableError {
	/// Returns true if a retry of the failed operation could succeed.
	fn is_retryable(&self) -> bool;
}

impl RetryableError for reqwest::Error {
	fn is_retryable(&self) -> bool {
		if self.is_timeout() || self.is_connect() {
			return true;
		}
		match self.status() {
			Some(status) => status.is_server_error() || status.as_u16() == 429,
			None => self.is_request(),
		}
	}
}

/// Retry policy: attempt count and backoff bounds.
#[derive(Debug, Clone)]
pub struct RetryConfig {
	/// Maximum number of retries after the initial attempt.
	pub max_retries: u32,
	/// Backoff before the first retry.
	pub initial_backoff: Duration,
	/// Upper bound on any single backoff sleep.
	pub max_backoff: Duration,
}

impl Default for RetryConfig {
	fn default() -> Self {
		Self {
			max_retries: 3,
			initial_backoff: Duration::from_millis(200),
			max_backoff: Duration::from_secs(5),
		}
	}
}

impl RetryConfig {
	/// A policy with a single retry and no long tail, for compensating
	/// actions where staying fast matters more than eventual success.
	pub fn single_retry() -> Self {
		Self {
			max_retries: 1,
			initial_backoff: Duration::from_millis(200),
			max_backoff: Duration::from_millis(500),
		}
	}

	fn backoff_for_attempt(&self, attempt: u32) -> Duration {
		let exp = self
			.initial_backoff
			.saturating_mul(2u32.saturating_pow(attempt));
		let capped = exp.min(self.max_backoff);
		// Full jitter keeps concurrent retriers from thundering in step.
		capped.mul_f64(fastrand::f64())
	}
}

/// Run `operation`, retrying transient failures per `config`.
///
/// Permanent errors (per [`RetryableError::is_retryable`]) are returned
/// immediately; transient errors are retried with exponential backoff and
/// full jitter until the retry budget is exhausted.
pub async fn retry<T, E, F, Fut>(
	config: &RetryConfig,
	operation_name: &str,
	mut operation: F,
) -> Result<T, E>
where
	E: RetryableError + std::fmt::Display,
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T, E>>,
{
	let mut attempt = 0u32;
	loop {
		match operation().await {
			Ok(value) => return Ok(value),
			Err(e) if e.is_retryable() && attempt < config.max_retries => {
				let backoff = config.backoff_for_attempt(attempt);
				warn!(
					operation = operation_name,
					attempt = attempt + 1,
					max_retries = config.max_retries,
					backoff_ms = backoff.as_millis() as u64,
					error = %e,
					"transient failure, retrying"
				);
				tokio::time::sleep(backoff).await;
				attempt += 1;
			}
			Err(e) => {
				debug!(
					operation = operation_name,
					attempts = attempt + 1,
					error = %e,
					"operation failed"
				);
				return Err(e);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicU32, Ordering};

	#[derive(Debug)]
	struct TestError {
		retryable: bool,
	}

	impl std::fmt::Display for TestError {
		fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
			write!(f, "test error (retryable: {})", self.retryable)
		}
	}

	impl RetryableError for TestError {
		fn is_retryable(&self) -> bool {
			self.retryable
		}
	}

	#[tokio::test]
	async fn succeeds_first_try() {
		let calls = AtomicU32::new(0);
		let result: Result<u32, TestError> = retry(&RetryConfig::default(), "test", || {
			calls.fetch_add(1, Ordering::SeqCst);
			async { Ok(42) }
		})
		.await;
		assert_eq!(result.unwrap(), 42);
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn retries_transient_then_succeeds() {
		let calls = AtomicU32::new(0);
		let config = RetryConfig {
			max_retries: 3,
			initial_backoff: Duration::from_millis(1),
			max_backoff: Duration::from_millis(2),
		};
		let result: Result<u32, TestError> = retry(&config, "test", || {
			let n = calls.fetch_add(1, Ordering::SeqCst);
			async move {
				if n < 2 {
					Err(TestError { retryable: true })
				} else {
					Ok(7)
				}
			}
		})
		.await;
		assert_eq!(result.unwrap(), 7);
		assert_eq!(calls.load(Ordering::SeqCst), 3);
	}

	#[tokio::test]
	async fn permanent_error_is_not_retried() {
		let calls = AtomicU32::new(0);
		let result: Result<u32, TestError> = retry(&RetryConfig::default(), "test", || {
			calls.fetch_add(1, Ordering::SeqCst);
			async { Err(TestError { retryable: false }) }
		})
		.await;
		assert!(result.is_err());
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn retry_budget_is_exhausted() {
		let calls = AtomicU32::new(0);
		let config = RetryConfig {
			max_retries: 2,
			initial_backoff: Duration::from_millis(1),
			max_backoff: Duration::from_millis(2),
		};
		let result: Result<u32, TestError> = retry(&config, "test", || {
			calls.fetch_add(1, Ordering::SeqCst);
			async { Err(TestError { retryable: true }) }
		})
		.await;
		assert!(result.is_err());
		// Initial attempt plus two retries.
		assert_eq!(calls.load(Ordering::SeqCst), 3);
	}

	#[test]
	fn single_retry_policy() {
		let config = RetryConfig::single_retry();
		assert_eq!(config.max_retries, 1);
	}
}
