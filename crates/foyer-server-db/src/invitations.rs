// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Invitation repository and state machine.
//!
//! Lifecycle: `pending -> accepted | expired | revoked`, with the three
//! non-pending states as sinks. Expiry is lazy: the first reader that
//! observes a pending row past its `expires_at` persists it as `expired`,
//! so correctness never depends on a background sweep.
//!
//! # Security
//!
//! - Tokens are looked up by SHA-256 hash only; the clear token never
//!   reaches this module.
//! - [`InvitationRepository::accept_atomically`] is the single operation
//!   allowed to spend an invitation and create an account. Its first write
//!   is a status-guarded `UPDATE` on the invitation row, which doubles as
//!   the row lock: of N concurrent acceptance attempts exactly one sees
//!   `rows_affected = 1`, and every loser deterministically gets
//!   [`AcceptError::NoInvitation`]. The seat-limit count runs after that
//!   serialization point, inside the same transaction, so it cannot race.

use chrono::{DateTime, Duration, Utc};
use foyer_server_auth::{
	AccountId, Invitation, InvitationId, InvitationStatus, OrgId, OrgRole,
};
use sqlx::{sqlite::SqlitePool, Row};
use uuid::Uuid;

use crate::accounts::Account;
use crate::error::DbError;
use crate::orgs::row_to_org;

/// Read-only projection of a usable invitation, safe to show an
/// unauthenticated holder of the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvitationPreview {
	pub email: String,
	pub organization_name: String,
	pub role: OrgRole,
	pub expires_at: DateTime<Utc>,
}

/// Outcome of resolving a token hash against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
	Valid(InvitationPreview),
	Expired,
	AlreadyUsed,
	Revoked,
	NotFound,
	OrganizationInactive,
}

/// Failure tags from the atomic accept transaction.
///
/// Every tag except `Db` is a policy rejection; `Db` is an infrastructure
/// failure after which the transaction has been rolled back with no
/// partial state.
#[derive(Debug, thiserror::Error)]
pub enum AcceptError {
	#[error("no usable invitation for this email")]
	NoInvitation,

	#[error("invitation expired")]
	Expired,

	#[error("organization is inactive")]
	OrganizationInactive,

	#[error("organization seat limit reached")]
	SeatLimitReached,

	#[error(transparent)]
	Db(#[from] DbError),
}

impl From<sqlx::Error> for AcceptError {
	fn from(e: sqlx::Error) -> Self {
		AcceptError::Db(DbError::Sqlx(e))
	}
}

/// Repository owning the invitation rows and their state transitions.
#[derive(Clone)]
pub struct InvitationRepository {
	pool: SqlitePool,
}

impl InvitationRepository {
	/// Create a new repository with the given pool.
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Create a pending invitation.
	///
	/// Consumed by the administrative surface. Enforces the at-most-one
	/// pending invitation per (organization, email) invariant; a pending
	/// row already past its expiry does not block re-inviting and is
	/// persisted as expired on the way.
	///
	/// # Errors
	/// `DbError::Conflict` if a usable pending invitation already exists
	/// for this organization and email.
	#[tracing::instrument(skip(self, email, token_hash), fields(org_id = %org_id, role = %role))]
	pub async fn create_invitation(
		&self,
		org_id: &OrgId,
		email: &str,
		role: OrgRole,
		invited_by: &AccountId,
		token_hash: &str,
		ttl: Duration,
	) -> Result<Invitation, DbError> {
		let email = email.trim().to_lowercase();
		let now = Utc::now();

		let rows = sqlx::query(
			r#"
			SELECT id, org_id, email, role, invited_by, token_hash, status,
			       invited_at, expires_at, accepted_at, accepted_by
			FROM org_invitations
			WHERE org_id = ? AND email = ? AND status = 'pending'
			"#,
		)
		.bind(org_id.to_string())
		.bind(&email)
		.fetch_all(&self.pool)
		.await?;

		for row in &rows {
			let existing = row_to_invitation(row)?;
			if existing.is_expired_at(now) {
				self.mark_expired(&existing.id).await?;
			} else {
				return Err(DbError::Conflict(format!(
					"a pending invitation already exists for this email in org {org_id}"
				)));
			}
		}

		let invitation = Invitation {
			id: InvitationId::generate(),
			org_id: *org_id,
			email,
			role,
			invited_by: *invited_by,
			token_hash: token_hash.to_string(),
			status: InvitationStatus::Pending,
			invited_at: now,
			expires_at: now + ttl,
			accepted_at: None,
			accepted_by: None,
		};

		sqlx::query(
			r#"
			INSERT INTO org_invitations
				(id, org_id, email, role, invited_by, token_hash, status,
				 invited_at, expires_at, accepted_at, accepted_by)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, NULL)
			"#,
		)
		.bind(invitation.id.to_string())
		.bind(invitation.org_id.to_string())
		.bind(&invitation.email)
		.bind(invitation.role.to_string())
		.bind(invitation.invited_by.to_string())
		// Note: token_hash is intentionally not logged
		.bind(&invitation.token_hash)
		.bind(invitation.status.to_string())
		.bind(invitation.invited_at.to_rfc3339())
		.bind(invitation.expires_at.to_rfc3339())
		.execute(&self.pool)
		.await?;

		tracing::debug!(invitation_id = %invitation.id, org_id = %org_id, "invitation created");
		Ok(invitation)
	}

	/// Get an invitation by token hash. Does not mutate state.
	#[tracing::instrument(skip(self, token_hash))]
	pub async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<Invitation>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, org_id, email, role, invited_by, token_hash, status,
			       invited_at, expires_at, accepted_at, accepted_by
			FROM org_invitations
			WHERE token_hash = ?
			"#,
		)
		.bind(token_hash)
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_invitation(&r)).transpose()
	}

	/// Resolve a token hash to its current usability.
	///
	/// A pending row past its expiry is persisted as `expired` here (lazy
	/// expiry), so once this returns [`LookupOutcome::Expired`] every later
	/// lookup agrees. An inactive organization yields
	/// [`LookupOutcome::OrganizationInactive`] without any persisted
	/// transition: the invitation becomes usable again if the organization
	/// is restored before it expires.
	#[tracing::instrument(skip(self, token_hash))]
	pub async fn lookup(&self, token_hash: &str) -> Result<LookupOutcome, DbError> {
		let Some(invitation) = self.find_by_token_hash(token_hash).await? else {
			return Ok(LookupOutcome::NotFound);
		};

		match invitation.status {
			InvitationStatus::Revoked => Ok(LookupOutcome::Revoked),
			InvitationStatus::Accepted => Ok(LookupOutcome::AlreadyUsed),
			InvitationStatus::Expired => Ok(LookupOutcome::Expired),
			InvitationStatus::Pending => {
				if invitation.is_expired() {
					self.mark_expired(&invitation.id).await?;
					return Ok(LookupOutcome::Expired);
				}

				let org_row = sqlx::query(
					r#"
					SELECT id, name, seat_limit, created_at, updated_at, deleted_at
					FROM organizations
					WHERE id = ?
					"#,
				)
				.bind(invitation.org_id.to_string())
				.fetch_optional(&self.pool)
				.await?;

				let org = match org_row {
					Some(row) => row_to_org(&row)?,
					None => return Ok(LookupOutcome::OrganizationInactive),
				};
				if !org.is_active() {
					return Ok(LookupOutcome::OrganizationInactive);
				}

				Ok(LookupOutcome::Valid(InvitationPreview {
					email: invitation.email,
					organization_name: org.name,
					role: invitation.role,
					expires_at: invitation.expires_at,
				}))
			}
		}
	}

	/// Atomically accept the pending invitation for `email` and create the
	/// member account bound to `external_identity_id`.
	///
	/// `claim_hint` is a token hash recovered from the claim cookie. It
	/// only disambiguates when several organizations have a pending
	/// invitation for the same email; the email match is authoritative and
	/// a hint matching nothing is ignored.
	///
	/// A second call for a now-accepted invitation deterministically
	/// returns [`AcceptError::NoInvitation`]; callers must check for an
	/// existing account before treating that as unauthorized.
	#[tracing::instrument(skip(self, email, external_identity_id, display_name, claim_hint))]
	pub async fn accept_atomically(
		&self,
		email: &str,
		external_identity_id: &str,
		display_name: Option<&str>,
		claim_hint: Option<&str>,
	) -> Result<Account, AcceptError> {
		let email = email.trim().to_lowercase();

		let rows = sqlx::query(
			r#"
			SELECT id, org_id, email, role, invited_by, token_hash, status,
			       invited_at, expires_at, accepted_at, accepted_by
			FROM org_invitations
			WHERE email = ? AND status = 'pending'
			ORDER BY invited_at DESC
			"#,
		)
		.bind(&email)
		.fetch_all(&self.pool)
		.await?;

		let candidates = rows
			.iter()
			.map(row_to_invitation)
			.collect::<Result<Vec<_>, _>>()?;

		let invitation = match claim_hint.and_then(|h| candidates.iter().find(|c| c.token_hash == h))
		{
			Some(hit) => hit.clone(),
			None => {
				if claim_hint.is_some() && !candidates.is_empty() {
					tracing::debug!("claim hint matched no pending invitation; email match is authoritative");
				}
				candidates.first().cloned().ok_or(AcceptError::NoInvitation)?
			}
		};

		let mut tx = self.pool.begin().await?;

		// Serialization point: the guarded flip is the first write of the
		// transaction, so concurrent acceptances queue here and exactly one
		// observes rows_affected = 1.
		let flipped = sqlx::query(
			r#"
			UPDATE org_invitations
			SET status = 'accepted'
			WHERE id = ? AND status = 'pending'
			"#,
		)
		.bind(invitation.id.to_string())
		.execute(&mut *tx)
		.await?;

		if flipped.rows_affected() == 0 {
			tx.rollback().await?;
			tracing::info!(invitation_id = %invitation.id, "invitation no longer pending");
			return Err(AcceptError::NoInvitation);
		}

		let row = sqlx::query(
			r#"
			SELECT id, org_id, email, role, invited_by, token_hash, status,
			       invited_at, expires_at, accepted_at, accepted_by
			FROM org_invitations
			WHERE id = ?
			"#,
		)
		.bind(invitation.id.to_string())
		.fetch_one(&mut *tx)
		.await?;
		let fresh = row_to_invitation(&row)?;

		let now = Utc::now();

		if fresh.is_expired_at(now) {
			// Persist lazy expiry instead of rolling the flip back to pending.
			sqlx::query("UPDATE org_invitations SET status = 'expired' WHERE id = ?")
				.bind(fresh.id.to_string())
				.execute(&mut *tx)
				.await?;
			tx.commit().await?;
			tracing::info!(invitation_id = %fresh.id, "invitation expired at accept time");
			return Err(AcceptError::Expired);
		}

		let org_row = sqlx::query(
			r#"
			SELECT id, name, seat_limit, created_at, updated_at, deleted_at
			FROM organizations
			WHERE id = ?
			"#,
		)
		.bind(fresh.org_id.to_string())
		.fetch_optional(&mut *tx)
		.await?;

		let org = match org_row {
			Some(row) => row_to_org(&row)?,
			None => {
				tx.rollback().await?;
				return Err(AcceptError::OrganizationInactive);
			}
		};
		if !org.is_active() {
			tx.rollback().await?;
			tracing::info!(invitation_id = %fresh.id, org_id = %org.id, "organization inactive at accept time");
			return Err(AcceptError::OrganizationInactive);
		}

		let (active_members,): (i64,) = sqlx::query_as(
			r#"
			SELECT COUNT(*) FROM accounts
			WHERE org_id = ? AND deactivated_at IS NULL
			"#,
		)
		.bind(org.id.to_string())
		.fetch_one(&mut *tx)
		.await?;

		if active_members >= org.seat_limit {
			tx.rollback().await?;
			tracing::info!(
				invitation_id = %fresh.id,
				org_id = %org.id,
				active_members,
				seat_limit = org.seat_limit,
				"seat limit reached at accept time"
			);
			return Err(AcceptError::SeatLimitReached);
		}

		let account = Account {
			id: AccountId::generate(),
			org_id: org.id,
			external_identity_id: external_identity_id.to_string(),
			email: fresh.email.clone(),
			display_name: display_name.map(|n| n.to_string()),
			role: fresh.role,
			invitation_id: fresh.id,
			created_at: now,
			updated_at: now,
			deactivated_at: None,
		};

		sqlx::query(
			r#"
			INSERT INTO accounts
				(id, org_id, external_identity_id, email, display_name, role,
				 invitation_id, created_at, updated_at, deactivated_at)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, NULL)
			"#,
		)
		.bind(account.id.to_string())
		.bind(account.org_id.to_string())
		.bind(&account.external_identity_id)
		.bind(&account.email)
		.bind(&account.display_name)
		.bind(account.role.to_string())
		.bind(account.invitation_id.to_string())
		.bind(account.created_at.to_rfc3339())
		.bind(account.updated_at.to_rfc3339())
		.execute(&mut *tx)
		.await?;

		sqlx::query(
			r#"
			UPDATE org_invitations
			SET accepted_at = ?, accepted_by = ?
			WHERE id = ?
			"#,
		)
		.bind(now.to_rfc3339())
		.bind(account.id.to_string())
		.bind(fresh.id.to_string())
		.execute(&mut *tx)
		.await?;

		tx.commit().await?;

		tracing::info!(
			invitation_id = %fresh.id,
			org_id = %org.id,
			account_id = %account.id,
			role = %account.role,
			"invitation accepted, member account created"
		);
		Ok(account)
	}

	/// Revoke a pending invitation.
	///
	/// Allowed only from `pending`; any other state is a no-op error.
	#[tracing::instrument(skip(self), fields(invitation_id = %id))]
	pub async fn revoke(&self, id: &InvitationId) -> Result<(), DbError> {
		let result = sqlx::query(
			r#"
			UPDATE org_invitations
			SET status = 'revoked'
			WHERE id = ? AND status = 'pending'
			"#,
		)
		.bind(id.to_string())
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(
				"invitation is not pending and cannot be revoked".to_string(),
			));
		}

		tracing::info!(invitation_id = %id, "invitation revoked");
		Ok(())
	}

	/// Persist lazy expiry for a pending row, guarded by status so it can
	/// never overwrite a terminal state.
	async fn mark_expired(&self, id: &InvitationId) -> Result<(), DbError> {
		sqlx::query(
			r#"
			UPDATE org_invitations
			SET status = 'expired'
			WHERE id = ? AND status = 'pending'
			"#,
		)
		.bind(id.to_string())
		.execute(&self.pool)
		.await?;

		tracing::debug!(invitation_id = %id, "lazy expiry persisted");
		Ok(())
	}
}

pub(crate) fn row_to_invitation(row: &sqlx::sqlite::SqliteRow) -> Result<Invitation, DbError> {
	let id_str: String = row.get("id");
	let org_id_str: String = row.get("org_id");
	let invited_by_str: String = row.get("invited_by");
	let role_str: String = row.get("role");
	let status_str: String = row.get("status");
	let invited_at: String = row.get("invited_at");
	let expires_at: String = row.get("expires_at");
	let accepted_at: Option<String> = row.get("accepted_at");
	let accepted_by: Option<String> = row.get("accepted_by");

	let id = Uuid::parse_str(&id_str)
		.map_err(|e| DbError::Internal(format!("Invalid invitation ID: {e}")))?;
	let org_id = Uuid::parse_str(&org_id_str)
		.map_err(|e| DbError::Internal(format!("Invalid org_id: {e}")))?;
	let invited_by = Uuid::parse_str(&invited_by_str)
		.map_err(|e| DbError::Internal(format!("Invalid invited_by: {e}")))?;
	let status = InvitationStatus::parse(&status_str)
		.ok_or_else(|| DbError::Internal(format!("Invalid status: {status_str}")))?;

	Ok(Invitation {
		id: InvitationId::new(id),
		org_id: OrgId::new(org_id),
		email: row.get("email"),
		role: OrgRole::from_str_or_member(&role_str),
		invited_by: AccountId::new(invited_by),
		token_hash: row.get("token_hash"),
		status,
		invited_at: chrono::DateTime::parse_from_rfc3339(&invited_at)
			.map_err(|e| DbError::Internal(format!("Invalid invited_at: {e}")))?
			.with_timezone(&Utc),
		expires_at: chrono::DateTime::parse_from_rfc3339(&expires_at)
			.map_err(|e| DbError::Internal(format!("Invalid expires_at: {e}")))?
			.with_timezone(&Utc),
		accepted_at: accepted_at.and_then(|d| {
			chrono::DateTime::parse_from_rfc3339(&d)
				.map(|dt| dt.with_timezone(&Utc))
				.ok()
		}),
		accepted_by: accepted_by.and_then(|a| Uuid::parse_str(&a).map(AccountId::new).ok()),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::orgs::{OrgRepository, Organization};
	use crate::testing::create_test_pool;
	use foyer_server_auth::{generate_token, hash_token};

	struct Fixture {
		pool: SqlitePool,
		orgs: OrgRepository,
		invitations: InvitationRepository,
		org: Organization,
	}

	async fn fixture_with_seats(seat_limit: i64) -> Fixture {
		let pool = create_test_pool().await;
		let orgs = OrgRepository::new(pool.clone());
		let invitations = InvitationRepository::new(pool.clone());
		let org = Organization::new("Acme GmbH", seat_limit);
		orgs.create_org(&org).await.unwrap();
		Fixture {
			pool,
			orgs,
			invitations,
			org,
		}
	}

	async fn fixture() -> Fixture {
		fixture_with_seats(5).await
	}

	/// Create a pending invitation and return the clear token.
	async fn invite(f: &Fixture, email: &str, ttl: Duration) -> String {
		let token = generate_token();
		f.invitations
			.create_invitation(
				&f.org.id,
				email,
				OrgRole::Member,
				&AccountId::generate(),
				&hash_token(&token),
				ttl,
			)
			.await
			.unwrap();
		token
	}

	#[tokio::test]
	async fn test_lookup_valid_projection() {
		let f = fixture().await;
		let token = invite(&f, "Invitee@Example.com", Duration::days(7)).await;

		let outcome = f.invitations.lookup(&hash_token(&token)).await.unwrap();
		match outcome {
			LookupOutcome::Valid(preview) => {
				assert_eq!(preview.email, "invitee@example.com");
				assert_eq!(preview.organization_name, "Acme GmbH");
				assert_eq!(preview.role, OrgRole::Member);
			}
			other => panic!("expected Valid, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn test_lookup_unknown_token_is_not_found() {
		let f = fixture().await;
		let outcome = f
			.invitations
			.lookup(&hash_token(&generate_token()))
			.await
			.unwrap();
		assert_eq!(outcome, LookupOutcome::NotFound);
	}

	#[tokio::test]
	async fn test_second_pending_invitation_conflicts() {
		let f = fixture().await;
		invite(&f, "dup@example.com", Duration::days(7)).await;

		let result = f
			.invitations
			.create_invitation(
				&f.org.id,
				"Dup@Example.com",
				OrgRole::Member,
				&AccountId::generate(),
				&hash_token(&generate_token()),
				Duration::days(7),
			)
			.await;
		assert!(matches!(result, Err(DbError::Conflict(_))));
	}

	#[tokio::test]
	async fn test_expired_pending_does_not_block_reinvite() {
		let f = fixture().await;
		let stale = invite(&f, "again@example.com", Duration::seconds(-1)).await;

		// Re-inviting succeeds and observes the stale row, expiring it.
		invite(&f, "again@example.com", Duration::days(7)).await;

		let old = f
			.invitations
			.find_by_token_hash(&hash_token(&stale))
			.await
			.unwrap()
			.unwrap();
		assert_eq!(old.status, InvitationStatus::Expired);
	}

	#[tokio::test]
	async fn test_lazy_expiry_is_persisted_and_monotonic() {
		let f = fixture().await;
		let token = invite(&f, "late@example.com", Duration::seconds(-1)).await;
		let token_hash = hash_token(&token);

		let outcome = f.invitations.lookup(&token_hash).await.unwrap();
		assert_eq!(outcome, LookupOutcome::Expired);

		// Direct re-read of the row shows the persisted transition.
		let row = f
			.invitations
			.find_by_token_hash(&token_hash)
			.await
			.unwrap()
			.unwrap();
		assert_eq!(row.status, InvitationStatus::Expired);

		// Every subsequent lookup agrees.
		let outcome = f.invitations.lookup(&token_hash).await.unwrap();
		assert_eq!(outcome, LookupOutcome::Expired);
	}

	#[tokio::test]
	async fn test_lookup_revoked() {
		let f = fixture().await;
		let token = invite(&f, "revoked@example.com", Duration::days(7)).await;

		let invitation = f
			.invitations
			.find_by_token_hash(&hash_token(&token))
			.await
			.unwrap()
			.unwrap();
		f.invitations.revoke(&invitation.id).await.unwrap();

		let outcome = f.invitations.lookup(&hash_token(&token)).await.unwrap();
		assert_eq!(outcome, LookupOutcome::Revoked);

		// Revoking a non-pending invitation is a no-op error.
		let result = f.invitations.revoke(&invitation.id).await;
		assert!(matches!(result, Err(DbError::NotFound(_))));
	}

	#[tokio::test]
	async fn test_lookup_inactive_org_is_not_persisted() {
		let f = fixture().await;
		let token = invite(&f, "inactive@example.com", Duration::days(7)).await;

		f.orgs.soft_delete_org(&f.org.id).await.unwrap();
		let outcome = f.invitations.lookup(&hash_token(&token)).await.unwrap();
		assert_eq!(outcome, LookupOutcome::OrganizationInactive);

		// No persisted transition: restoring the org makes it valid again.
		f.orgs.restore_org(&f.org.id).await.unwrap();
		let outcome = f.invitations.lookup(&hash_token(&token)).await.unwrap();
		assert!(matches!(outcome, LookupOutcome::Valid(_)));
	}

	#[tokio::test]
	async fn test_accept_creates_account_and_consumes_invitation() {
		let f = fixture().await;
		let token = invite(&f, "Member@Example.com", Duration::days(7)).await;

		let account = f
			.invitations
			.accept_atomically("member@example.com", "idp_1", Some("Member One"), None)
			.await
			.unwrap();
		assert_eq!(account.org_id, f.org.id);
		assert_eq!(account.email, "member@example.com");
		assert_eq!(account.role, OrgRole::Member);

		let invitation = f
			.invitations
			.find_by_token_hash(&hash_token(&token))
			.await
			.unwrap()
			.unwrap();
		assert_eq!(invitation.status, InvitationStatus::Accepted);
		assert!(invitation.accepted_at.is_some());
		assert_eq!(invitation.accepted_by, Some(account.id));

		let outcome = f.invitations.lookup(&hash_token(&token)).await.unwrap();
		assert_eq!(outcome, LookupOutcome::AlreadyUsed);

		// A second accept for the same email deterministically fails; there
		// is no silent success on retry.
		let result = f
			.invitations
			.accept_atomically("member@example.com", "idp_2", None, None)
			.await;
		assert!(matches!(result, Err(AcceptError::NoInvitation)));
	}

	#[tokio::test]
	async fn test_accept_unknown_email() {
		let f = fixture().await;
		let result = f
			.invitations
			.accept_atomically("stranger@example.com", "idp_1", None, None)
			.await;
		assert!(matches!(result, Err(AcceptError::NoInvitation)));
	}

	#[tokio::test]
	async fn test_accept_expired_persists_expiry() {
		let f = fixture().await;
		let token = invite(&f, "slow@example.com", Duration::seconds(-1)).await;

		let result = f
			.invitations
			.accept_atomically("slow@example.com", "idp_1", None, None)
			.await;
		assert!(matches!(result, Err(AcceptError::Expired)));

		let invitation = f
			.invitations
			.find_by_token_hash(&hash_token(&token))
			.await
			.unwrap()
			.unwrap();
		assert_eq!(invitation.status, InvitationStatus::Expired);
	}

	#[tokio::test]
	async fn test_accept_inactive_org_leaves_invitation_pending() {
		let f = fixture().await;
		let token = invite(&f, "blocked@example.com", Duration::days(7)).await;
		f.orgs.soft_delete_org(&f.org.id).await.unwrap();

		let result = f
			.invitations
			.accept_atomically("blocked@example.com", "idp_1", None, None)
			.await;
		assert!(matches!(result, Err(AcceptError::OrganizationInactive)));

		// Rolled back: the invitation was not burned.
		let invitation = f
			.invitations
			.find_by_token_hash(&hash_token(&token))
			.await
			.unwrap()
			.unwrap();
		assert_eq!(invitation.status, InvitationStatus::Pending);
	}

	#[tokio::test]
	async fn test_accept_seat_limit_leaves_invitation_pending() {
		let f = fixture_with_seats(1).await;

		invite(&f, "first@example.com", Duration::days(7)).await;
		f.invitations
			.accept_atomically("first@example.com", "idp_1", None, None)
			.await
			.unwrap();

		let token = invite(&f, "second@example.com", Duration::days(7)).await;
		let result = f
			.invitations
			.accept_atomically("second@example.com", "idp_2", None, None)
			.await;
		assert!(matches!(result, Err(AcceptError::SeatLimitReached)));

		let invitation = f
			.invitations
			.find_by_token_hash(&hash_token(&token))
			.await
			.unwrap()
			.unwrap();
		assert_eq!(invitation.status, InvitationStatus::Pending);
	}

	#[tokio::test]
	async fn test_deactivated_member_frees_a_seat() {
		let f = fixture_with_seats(1).await;

		invite(&f, "first@example.com", Duration::days(7)).await;
		f.invitations
			.accept_atomically("first@example.com", "idp_1", None, None)
			.await
			.unwrap();

		let accounts = crate::accounts::AccountRepository::new(f.pool.clone());
		accounts.deactivate("idp_1").await.unwrap();

		invite(&f, "second@example.com", Duration::days(7)).await;
		let account = f
			.invitations
			.accept_atomically("second@example.com", "idp_2", None, None)
			.await
			.unwrap();
		assert_eq!(account.email, "second@example.com");
	}

	#[tokio::test]
	async fn test_claim_hint_disambiguates_between_orgs() {
		let f = fixture().await;
		let other_org = Organization::new("Beta Inc", 5);
		f.orgs.create_org(&other_org).await.unwrap();

		// Same email invited by two organizations.
		let _first = invite(&f, "both@example.com", Duration::days(7)).await;
		let second = generate_token();
		f.invitations
			.create_invitation(
				&other_org.id,
				"both@example.com",
				OrgRole::Admin,
				&AccountId::generate(),
				&hash_token(&second),
				Duration::days(7),
			)
			.await
			.unwrap();

		let account = f
			.invitations
			.accept_atomically(
				"both@example.com",
				"idp_1",
				None,
				Some(&hash_token(&second)),
			)
			.await
			.unwrap();
		assert_eq!(account.org_id, other_org.id);
		assert_eq!(account.role, OrgRole::Admin);
	}

	#[tokio::test]
	async fn test_mismatched_claim_hint_falls_back_to_email_match() {
		let f = fixture().await;
		invite(&f, "solo@example.com", Duration::days(7)).await;

		let bogus_hint = hash_token(&generate_token());
		let account = f
			.invitations
			.accept_atomically("solo@example.com", "idp_1", None, Some(&bogus_hint))
			.await
			.unwrap();
		assert_eq!(account.org_id, f.org.id);
	}

	#[tokio::test]
	async fn test_concurrent_accepts_spend_invitation_exactly_once() {
		// File-backed pool so acceptance attempts genuinely contend for the
		// write lock instead of being serialized by a single connection.
		let dir = tempfile::tempdir().unwrap();
		let url = format!("sqlite:{}?mode=rwc", dir.path().join("race.db").display());
		let pool = crate::pool::create_pool(&url).await.unwrap();
		crate::schema::run_migrations(&pool).await.unwrap();

		let orgs = OrgRepository::new(pool.clone());
		let invitations = InvitationRepository::new(pool.clone());
		let org = Organization::new("Race Org", 1);
		orgs.create_org(&org).await.unwrap();

		let token = generate_token();
		invitations
			.create_invitation(
				&org.id,
				"raced@example.com",
				OrgRole::Member,
				&AccountId::generate(),
				&hash_token(&token),
				Duration::days(7),
			)
			.await
			.unwrap();

		let mut handles = Vec::new();
		for n in 0..8 {
			let repo = invitations.clone();
			handles.push(tokio::spawn(async move {
				repo
					.accept_atomically("raced@example.com", &format!("idp_{n}"), None, None)
					.await
			}));
		}

		let mut wins = 0;
		let mut losses = 0;
		for handle in handles {
			match handle.await.unwrap() {
				Ok(_) => wins += 1,
				Err(AcceptError::NoInvitation) => losses += 1,
				Err(other) => panic!("unexpected accept error: {other:?}"),
			}
		}
		assert_eq!(wins, 1);
		assert_eq!(losses, 7);

		let (accounts,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM accounts")
			.fetch_one(&pool)
			.await
			.unwrap();
		assert_eq!(accounts, 1);
	}
}
