// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Organization repository for database operations.
//!
//! Organizations are owned by the broader application; this core only
//! needs their display name, seat limit, and active/inactive state
//! (soft delete). A soft-deleted organization is "inactive" for every
//! invitation code path.

use chrono::{DateTime, Utc};
use foyer_server_auth::OrgId;
use sqlx::{sqlite::SqlitePool, Row};
use uuid::Uuid;

use crate::error::DbError;

/// An organization that members join by invitation.
#[derive(Debug, Clone)]
pub struct Organization {
	pub id: OrgId,
	pub name: String,
	/// Maximum number of active member accounts, enforced at accept time.
	pub seat_limit: i64,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	pub deleted_at: Option<DateTime<Utc>>,
}

impl Organization {
	/// Build a new active organization.
	pub fn new(name: impl Into<String>, seat_limit: i64) -> Self {
		let now = Utc::now();
		Self {
			id: OrgId::generate(),
			name: name.into(),
			seat_limit,
			created_at: now,
			updated_at: now,
			deleted_at: None,
		}
	}

	/// Returns true if the organization can currently admit members.
	pub fn is_active(&self) -> bool {
		self.deleted_at.is_none()
	}
}

/// Repository for organization database operations.
#[derive(Clone)]
pub struct OrgRepository {
	pool: SqlitePool,
}

impl OrgRepository {
	/// Create a new repository with the given pool.
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Create a new organization.
	///
	/// # Errors
	/// Returns `DbError::Sqlx` if insert fails.
	#[tracing::instrument(skip(self, org), fields(org_id = %org.id))]
	pub async fn create_org(&self, org: &Organization) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT INTO organizations (id, name, seat_limit, created_at, updated_at, deleted_at)
			VALUES (?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(org.id.to_string())
		.bind(&org.name)
		.bind(org.seat_limit)
		.bind(org.created_at.to_rfc3339())
		.bind(org.updated_at.to_rfc3339())
		.bind(org.deleted_at.map(|d| d.to_rfc3339()))
		.execute(&self.pool)
		.await?;

		tracing::debug!(org_id = %org.id, "organization created");
		Ok(())
	}

	/// Get an organization by ID, including soft-deleted ones.
	///
	/// # Returns
	/// `None` if no organization exists with this ID. Callers decide what
	/// a soft-deleted row means for them via [`Organization::is_active`].
	#[tracing::instrument(skip(self), fields(org_id = %id))]
	pub async fn get_org_by_id(&self, id: &OrgId) -> Result<Option<Organization>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, name, seat_limit, created_at, updated_at, deleted_at
			FROM organizations
			WHERE id = ?
			"#,
		)
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_org(&r)).transpose()
	}

	/// Soft-delete an organization, making it inactive.
	#[tracing::instrument(skip(self), fields(org_id = %id))]
	pub async fn soft_delete_org(&self, id: &OrgId) -> Result<(), DbError> {
		let now = Utc::now().to_rfc3339();
		sqlx::query(
			r#"
			UPDATE organizations
			SET deleted_at = ?, updated_at = ?
			WHERE id = ? AND deleted_at IS NULL
			"#,
		)
		.bind(&now)
		.bind(&now)
		.bind(id.to_string())
		.execute(&self.pool)
		.await?;

		tracing::debug!(org_id = %id, "organization soft-deleted");
		Ok(())
	}

	/// Restore a soft-deleted organization.
	#[tracing::instrument(skip(self), fields(org_id = %id))]
	pub async fn restore_org(&self, id: &OrgId) -> Result<(), DbError> {
		let now = Utc::now().to_rfc3339();
		sqlx::query(
			r#"
			UPDATE organizations
			SET deleted_at = NULL, updated_at = ?
			WHERE id = ?
			"#,
		)
		.bind(&now)
		.bind(id.to_string())
		.execute(&self.pool)
		.await?;

		tracing::debug!(org_id = %id, "organization restored");
		Ok(())
	}
}

pub(crate) fn row_to_org(row: &sqlx::sqlite::SqliteRow) -> Result<Organization, DbError> {
	let id_str: String = row.get("id");
	let created_at: String = row.get("created_at");
	let updated_at: String = row.get("updated_at");
	let deleted_at: Option<String> = row.get("deleted_at");

	let id =
		Uuid::parse_str(&id_str).map_err(|e| DbError::Internal(format!("Invalid org ID: {e}")))?;

	Ok(Organization {
		id: OrgId::new(id),
		name: row.get("name"),
		seat_limit: row.get("seat_limit"),
		created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
			.map_err(|e| DbError::Internal(format!("Invalid created_at: {e}")))?
			.with_timezone(&Utc),
		updated_at: chrono::DateTime::parse_from_rfc3339(&updated_at)
			.map_err(|e| DbError::Internal(format!("Invalid updated_at: {e}")))?
			.with_timezone(&Utc),
		deleted_at: deleted_at.and_then(|d| {
			chrono::DateTime::parse_from_rfc3339(&d)
				.map(|dt| dt.with_timezone(&Utc))
				.ok()
		}),
	})
}
