// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Fixed-window rate limiting for the public verification endpoint.
//!
//! A per-source-address counter over a fixed window, kept in a mutexed map.
//! This is explicitly approximate and single-process; a deployment with
//! more than one process needs a shared counter behind the same
//! [`RateLimiter::allow`] interface.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use http::HeaderMap;

/// Entries beyond this size trigger stale-window eviction on the next call.
const EVICTION_THRESHOLD: usize = 10_000;

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
	pub allowed: bool,
	/// Requests left in the current window.
	pub remaining: u32,
	/// Seconds until the window rolls; zero when allowed.
	pub retry_after_secs: u64,
}

struct WindowState {
	window_start: Instant,
	count: u32,
}

/// Per-source-key fixed-window counter.
pub struct RateLimiter {
	limit: u32,
	window: Duration,
	windows: Mutex<HashMap<String, WindowState>>,
}

impl RateLimiter {
	/// Create a limiter allowing `limit` requests per `window` per key.
	pub fn new(limit: u32, window: Duration) -> Self {
		Self {
			limit,
			window,
			windows: Mutex::new(HashMap::new()),
		}
	}

	/// The configured per-window limit.
	pub fn limit(&self) -> u32 {
		self.limit
	}

	/// Check whether a request from `source_key` is admitted, counting it
	/// if so.
	pub fn allow(&self, source_key: &str) -> Decision {
		let now = Instant::now();
		let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());

		if windows.len() > EVICTION_THRESHOLD {
			let window = self.window;
			windows.retain(|_, state| now.duration_since(state.window_start) < window);
		}

		let state = windows
			.entry(source_key.to_string())
			.or_insert(WindowState {
				window_start: now,
				count: 0,
			});

		if now.duration_since(state.window_start) >= self.window {
			state.window_start = now;
			state.count = 0;
		}

		if state.count < self.limit {
			state.count += 1;
			Decision {
				allowed: true,
				remaining: self.limit - state.count,
				retry_after_secs: 0,
			}
		} else {
			let elapsed = now.duration_since(state.window_start);
			let retry_after = self.window.saturating_sub(elapsed);
			Decision {
				allowed: false,
				remaining: 0,
				// Round up so callers never retry a second early.
				retry_after_secs: retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0),
			}
		}
	}
}

/// Derive the rate-limit key for a request.
///
/// Uses the first address in `X-Forwarded-For` when present (the service
/// is expected to run behind a proxy), then `X-Real-Ip`, then a fixed
/// fallback for direct local calls.
pub fn source_key(headers: &HeaderMap) -> String {
	if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
		if let Some(first) = forwarded.split(',').next() {
			let first = first.trim();
			if !first.is_empty() {
				return first.to_string();
			}
		}
	}
	if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
		let real_ip = real_ip.trim();
		if !real_ip.is_empty() {
			return real_ip.to_string();
		}
	}
	"local".to_string()
}

#[cfg(test)]
mod tests {
	use super::*;
	use http::HeaderValue;

	#[test]
	fn allows_up_to_limit_then_denies() {
		let limiter = RateLimiter::new(5, Duration::from_secs(60));

		for n in 0..5 {
			let decision = limiter.allow("1.2.3.4");
			assert!(decision.allowed, "request {n} should be allowed");
			assert_eq!(decision.remaining, 4 - n);
		}

		let denied = limiter.allow("1.2.3.4");
		assert!(!denied.allowed);
		assert_eq!(denied.remaining, 0);
		assert!(denied.retry_after_secs > 0);
		assert!(denied.retry_after_secs <= 60);
	}

	#[test]
	fn keys_are_independent() {
		let limiter = RateLimiter::new(1, Duration::from_secs(60));
		assert!(limiter.allow("1.1.1.1").allowed);
		assert!(!limiter.allow("1.1.1.1").allowed);
		assert!(limiter.allow("2.2.2.2").allowed);
	}

	#[test]
	fn window_roll_readmits() {
		let limiter = RateLimiter::new(1, Duration::from_millis(50));
		assert!(limiter.allow("1.2.3.4").allowed);
		assert!(!limiter.allow("1.2.3.4").allowed);

		std::thread::sleep(Duration::from_millis(60));
		assert!(limiter.allow("1.2.3.4").allowed);
	}

	#[test]
	fn eviction_drops_stale_entries() {
		let limiter = RateLimiter::new(1, Duration::from_millis(1));
		for n in 0..(EVICTION_THRESHOLD + 2) {
			limiter.allow(&format!("key-{n}"));
		}
		std::thread::sleep(Duration::from_millis(5));
		limiter.allow("fresh");
		let windows = limiter.windows.lock().unwrap();
		assert!(windows.len() < EVICTION_THRESHOLD);
	}

	#[test]
	fn source_key_prefers_forwarded_for() {
		let mut headers = HeaderMap::new();
		headers.insert(
			"x-forwarded-for",
			HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
		);
		headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.1"));
		assert_eq!(source_key(&headers), "203.0.113.9");
	}

	#[test]
	fn source_key_falls_back_to_real_ip_then_local() {
		let mut headers = HeaderMap::new();
		headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.7"));
		assert_eq!(source_key(&headers), "198.51.100.7");

		assert_eq!(source_key(&HeaderMap::new()), "local");
	}
}
