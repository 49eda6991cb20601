// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Database layer for the Foyer membership core.
//!
//! All persistence goes through SQLite via `sqlx`. The invitation state
//! machine and the atomic accept transaction live in [`invitations`];
//! organizations and member accounts have their own repositories. Every
//! mutation of invitation or account rows happens in this crate.

pub mod accounts;
pub mod error;
pub mod invitations;
pub mod orgs;
pub mod pool;
pub mod schema;
pub mod testing;

pub use accounts::{Account, AccountRepository};
pub use error::DbError;
pub use invitations::{AcceptError, InvitationPreview, InvitationRepository, LookupOutcome};
pub use orgs::{OrgRepository, Organization};
pub use pool::create_pool;
pub use schema::run_migrations;
