// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity provider integration for Foyer.
//!
//! This crate provides a typed client for the external identity provider's
//! admin API (the compensating [`IdentityProvider::delete_identity`] call
//! is the only outbound operation the membership core makes) plus
//! verification of the provider's signed webhook deliveries.

pub mod client;
pub mod config;
pub mod error;
pub mod types;
pub mod webhook;

pub use client::{IdentityProvider, IdpClient};
pub use config::IdpConfig;
pub use error::IdpError;
pub use foyer_common_http::RetryConfig;
pub use types::{
	IdentityAccount, IdentityEvent, EVENT_ACCOUNT_CREATED, EVENT_ACCOUNT_DELETED,
	EVENT_ACCOUNT_UPDATED,
};
pub use webhook::{
	compute_delivery_signature, verify_delivery, HEADER_WEBHOOK_ID, HEADER_WEBHOOK_SIGNATURE,
	HEADER_WEBHOOK_TIMESTAMP, TIMESTAMP_TOLERANCE_SECS,
};
