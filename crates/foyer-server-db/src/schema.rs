// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Schema creation for the membership tables.
//!
//! All timestamps are RFC 3339 UTC strings. Invitation tokens are stored
//! only as SHA-256 hashes.

use sqlx::SqlitePool;

use crate::error::DbError;

/// Create all tables if they do not exist.
#[tracing::instrument(skip(pool))]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS organizations (
			id TEXT PRIMARY KEY,
			name TEXT NOT NULL,
			seat_limit INTEGER NOT NULL,
			created_at TEXT NOT NULL,
			updated_at TEXT NOT NULL,
			deleted_at TEXT
		)
		"#,
	)
	.execute(pool)
	.await?;

	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS org_invitations (
			id TEXT PRIMARY KEY,
			org_id TEXT NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
			email TEXT NOT NULL,
			role TEXT NOT NULL,
			invited_by TEXT NOT NULL,
			token_hash TEXT NOT NULL UNIQUE,
			status TEXT NOT NULL DEFAULT 'pending',
			invited_at TEXT NOT NULL,
			expires_at TEXT NOT NULL,
			accepted_at TEXT,
			accepted_by TEXT
		)
		"#,
	)
	.execute(pool)
	.await?;

	sqlx::query(
		r#"
		CREATE INDEX IF NOT EXISTS idx_org_invitations_email_status
		ON org_invitations(email, status)
		"#,
	)
	.execute(pool)
	.await?;

	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS accounts (
			id TEXT PRIMARY KEY,
			org_id TEXT NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
			external_identity_id TEXT NOT NULL UNIQUE,
			email TEXT NOT NULL,
			display_name TEXT,
			role TEXT NOT NULL,
			invitation_id TEXT NOT NULL REFERENCES org_invitations(id),
			created_at TEXT NOT NULL,
			updated_at TEXT NOT NULL,
			deactivated_at TEXT
		)
		"#,
	)
	.execute(pool)
	.await?;

	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS audit_logs (
			id TEXT PRIMARY KEY,
			timestamp TEXT NOT NULL,
			event_type TEXT NOT NULL,
			severity TEXT NOT NULL,
			actor TEXT,
			resource_type TEXT,
			resource_id TEXT,
			details TEXT NOT NULL,
			created_at TEXT NOT NULL
		)
		"#,
	)
	.execute(pool)
	.await?;

	tracing::debug!("database migrations applied");
	Ok(())
}
