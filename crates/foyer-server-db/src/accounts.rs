// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Member account repository.
//!
//! Accounts are only ever created inside the atomic accept transaction in
//! [`crate::invitations`]; this repository covers the read and sync paths
//! the webhook gate needs afterwards (profile sync on "account updated",
//! deactivation on "account deleted", idempotency lookup by external
//! identity id).

use chrono::{DateTime, Utc};
use foyer_server_auth::{AccountId, InvitationId, OrgId, OrgRole};
use sqlx::{sqlite::SqlitePool, Row};
use uuid::Uuid;

use crate::error::DbError;

/// A member account bound to an external identity.
#[derive(Debug, Clone)]
pub struct Account {
	pub id: AccountId,
	pub org_id: OrgId,
	/// The identity provider's id for this account.
	pub external_identity_id: String,
	pub email: String,
	pub display_name: Option<String>,
	/// Role copied from the invitation at accept time, not re-read later.
	pub role: OrgRole,
	/// The invitation this account consumed.
	pub invitation_id: InvitationId,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	pub deactivated_at: Option<DateTime<Utc>>,
}

impl Account {
	/// Returns true if the account counts against the seat limit.
	pub fn is_active(&self) -> bool {
		self.deactivated_at.is_none()
	}
}

/// Repository for member account database operations.
#[derive(Clone)]
pub struct AccountRepository {
	pool: SqlitePool,
}

impl AccountRepository {
	/// Create a new repository with the given pool.
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Find an account by the identity provider's id.
	#[tracing::instrument(skip(self, external_identity_id))]
	pub async fn find_by_external_id(
		&self,
		external_identity_id: &str,
	) -> Result<Option<Account>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, org_id, external_identity_id, email, display_name, role,
			       invitation_id, created_at, updated_at, deactivated_at
			FROM accounts
			WHERE external_identity_id = ?
			"#,
		)
		.bind(external_identity_id)
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_account(&r)).transpose()
	}

	/// Refresh profile fields from an "account updated" event.
	///
	/// Invitation state is never touched here; this is a pass-through sync
	/// against the already-bound account.
	///
	/// # Returns
	/// `true` if an account was updated, `false` if none is bound to this
	/// external identity.
	#[tracing::instrument(skip(self, external_identity_id, email, display_name))]
	pub async fn sync_profile(
		&self,
		external_identity_id: &str,
		email: Option<&str>,
		display_name: Option<&str>,
	) -> Result<bool, DbError> {
		let now = Utc::now().to_rfc3339();
		let result = sqlx::query(
			r#"
			UPDATE accounts
			SET email = COALESCE(?, email),
			    display_name = COALESCE(?, display_name),
			    updated_at = ?
			WHERE external_identity_id = ?
			"#,
		)
		.bind(email.map(|e| e.to_lowercase()))
		.bind(display_name)
		.bind(&now)
		.bind(external_identity_id)
		.execute(&self.pool)
		.await?;

		let updated = result.rows_affected() > 0;
		if updated {
			tracing::debug!("account profile synced");
		}
		Ok(updated)
	}

	/// Deactivate the account bound to an external identity.
	///
	/// Accounts are never hard-deleted by this core; a deactivated account
	/// stops counting against the organization's seat limit.
	///
	/// # Returns
	/// `true` if an account was deactivated, `false` if none was found or
	/// it was already deactivated.
	#[tracing::instrument(skip(self, external_identity_id))]
	pub async fn deactivate(&self, external_identity_id: &str) -> Result<bool, DbError> {
		let now = Utc::now().to_rfc3339();
		let result = sqlx::query(
			r#"
			UPDATE accounts
			SET deactivated_at = ?, updated_at = ?
			WHERE external_identity_id = ? AND deactivated_at IS NULL
			"#,
		)
		.bind(&now)
		.bind(&now)
		.bind(external_identity_id)
		.execute(&self.pool)
		.await?;

		let deactivated = result.rows_affected() > 0;
		if deactivated {
			tracing::debug!("account deactivated");
		}
		Ok(deactivated)
	}

	/// Count active member accounts in an organization.
	#[tracing::instrument(skip(self), fields(org_id = %org_id))]
	pub async fn count_active_members(&self, org_id: &OrgId) -> Result<i64, DbError> {
		let row: (i64,) = sqlx::query_as(
			r#"
			SELECT COUNT(*) FROM accounts
			WHERE org_id = ? AND deactivated_at IS NULL
			"#,
		)
		.bind(org_id.to_string())
		.fetch_one(&self.pool)
		.await?;

		Ok(row.0)
	}
}

pub(crate) fn row_to_account(row: &sqlx::sqlite::SqliteRow) -> Result<Account, DbError> {
	let id_str: String = row.get("id");
	let org_id_str: String = row.get("org_id");
	let invitation_id_str: String = row.get("invitation_id");
	let role_str: String = row.get("role");
	let created_at: String = row.get("created_at");
	let updated_at: String = row.get("updated_at");
	let deactivated_at: Option<String> = row.get("deactivated_at");

	let id =
		Uuid::parse_str(&id_str).map_err(|e| DbError::Internal(format!("Invalid account ID: {e}")))?;
	let org_id = Uuid::parse_str(&org_id_str)
		.map_err(|e| DbError::Internal(format!("Invalid org_id: {e}")))?;
	let invitation_id = Uuid::parse_str(&invitation_id_str)
		.map_err(|e| DbError::Internal(format!("Invalid invitation_id: {e}")))?;

	Ok(Account {
		id: AccountId::new(id),
		org_id: OrgId::new(org_id),
		external_identity_id: row.get("external_identity_id"),
		email: row.get("email"),
		display_name: row.get("display_name"),
		role: OrgRole::from_str_or_member(&role_str),
		invitation_id: InvitationId::new(invitation_id),
		created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
			.map_err(|e| DbError::Internal(format!("Invalid created_at: {e}")))?
			.with_timezone(&Utc),
		updated_at: chrono::DateTime::parse_from_rfc3339(&updated_at)
			.map_err(|e| DbError::Internal(format!("Invalid updated_at: {e}")))?
			.with_timezone(&Utc),
		deactivated_at: deactivated_at.and_then(|d| {
			chrono::DateTime::parse_from_rfc3339(&d)
				.map(|dt| dt.with_timezone(&Utc))
				.ok()
		}),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::invitations::InvitationRepository;
	use crate::orgs::{OrgRepository, Organization};
	use crate::testing::create_test_pool;
	use chrono::Duration;
	use foyer_server_auth::hash_token;

	async fn setup_account(pool: &SqlitePool) -> Account {
		let orgs = OrgRepository::new(pool.clone());
		let invitations = InvitationRepository::new(pool.clone());

		let org = Organization::new("Acme", 5);
		orgs.create_org(&org).await.unwrap();

		invitations
			.create_invitation(
				&org.id,
				"member@example.com",
				OrgRole::Member,
				&AccountId::generate(),
				&hash_token(&foyer_server_auth::generate_token()),
				Duration::days(7),
			)
			.await
			.unwrap();

		invitations
			.accept_atomically("member@example.com", "idp_user_1", Some("Member"), None)
			.await
			.unwrap()
	}

	#[tokio::test]
	async fn test_find_by_external_id() {
		let pool = create_test_pool().await;
		let account = setup_account(&pool).await;

		let repo = AccountRepository::new(pool);
		let found = repo.find_by_external_id("idp_user_1").await.unwrap().unwrap();
		assert_eq!(found.id, account.id);
		assert_eq!(found.email, "member@example.com");
		assert!(found.is_active());

		assert!(repo.find_by_external_id("idp_user_2").await.unwrap().is_none());
	}

	#[tokio::test]
	async fn test_sync_profile_updates_fields() {
		let pool = create_test_pool().await;
		setup_account(&pool).await;

		let repo = AccountRepository::new(pool);
		let updated = repo
			.sync_profile("idp_user_1", Some("New@Example.com"), Some("New Name"))
			.await
			.unwrap();
		assert!(updated);

		let account = repo.find_by_external_id("idp_user_1").await.unwrap().unwrap();
		assert_eq!(account.email, "new@example.com");
		assert_eq!(account.display_name.as_deref(), Some("New Name"));
	}

	#[tokio::test]
	async fn test_sync_profile_unknown_identity_is_noop() {
		let pool = create_test_pool().await;
		let repo = AccountRepository::new(pool);
		let updated = repo
			.sync_profile("idp_ghost", Some("x@example.com"), None)
			.await
			.unwrap();
		assert!(!updated);
	}

	#[tokio::test]
	async fn test_deactivate_frees_a_seat() {
		let pool = create_test_pool().await;
		let account = setup_account(&pool).await;

		let repo = AccountRepository::new(pool);
		assert_eq!(repo.count_active_members(&account.org_id).await.unwrap(), 1);

		assert!(repo.deactivate("idp_user_1").await.unwrap());
		assert_eq!(repo.count_active_members(&account.org_id).await.unwrap(), 0);

		// Second deactivation is a no-op.
		assert!(!repo.deactivate("idp_user_1").await.unwrap());
	}
}
