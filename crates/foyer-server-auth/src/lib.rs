// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Membership domain types for Foyer.
//!
//! This crate defines the invitation lifecycle types, the invitation token
//! codec, and the signed claim cookie that carries an in-flight signup
//! across the external identity provider's flow.

pub mod claim;
pub mod invitation;
pub mod token;
pub mod types;

pub use claim::{
	claim_clear_cookie, claim_set_cookie, decode_claim, encode_claim, extract_claim_cookie, Claim,
	ClaimError, CLAIM_COOKIE_NAME,
};
pub use invitation::{Invitation, InvitationStatus};
pub use token::{generate_token, hash_token, is_well_formed_token, token_log_prefix, TOKEN_LEN};
pub use types::{AccountId, InvitationId, OrgId, OrgRole};
