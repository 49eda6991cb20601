// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit sinks.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::event::AuditLogEntry;

/// Errors from publishing to a sink.
#[derive(Debug, Error)]
pub enum AuditSinkError {
	/// The publish may succeed on retry (connection churn, lock contention).
	#[error("transient sink error: {0}")]
	Transient(String),

	/// The publish can never succeed (serialization, schema mismatch).
	#[error("permanent sink error: {0}")]
	Permanent(String),
}

/// Destination for audit events.
#[async_trait]
pub trait AuditSink: Send + Sync {
	/// Short name for log messages.
	fn name(&self) -> &str;

	/// Persist or forward one event.
	async fn publish(&self, event: Arc<AuditLogEntry>) -> Result<(), AuditSinkError>;
}

/// Sink writing events to the `audit_logs` table.
pub struct SqliteAuditSink {
	pool: SqlitePool,
}

impl SqliteAuditSink {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}
}

#[async_trait]
impl AuditSink for SqliteAuditSink {
	fn name(&self) -> &str {
		"sqlite"
	}

	async fn publish(&self, event: Arc<AuditLogEntry>) -> Result<(), AuditSinkError> {
		let details_json = serde_json::to_string(&event.details)
			.map_err(|e| AuditSinkError::Permanent(format!("failed to serialize details: {e}")))?;

		let now = chrono::Utc::now();

		sqlx::query(
			r#"
			INSERT INTO audit_logs (
				id, timestamp, event_type, severity, actor,
				resource_type, resource_id, details, created_at
			) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(event.id.to_string())
		.bind(event.timestamp.to_rfc3339())
		.bind(event.event_type.to_string())
		.bind(event.severity.to_string())
		.bind(&event.actor)
		.bind(&event.resource_type)
		.bind(&event.resource_id)
		.bind(&details_json)
		.bind(now.to_rfc3339())
		.execute(&self.pool)
		.await
		.map_err(|e| {
			if is_transient_error(&e) {
				AuditSinkError::Transient(format!("database error: {e}"))
			} else {
				AuditSinkError::Permanent(format!("database error: {e}"))
			}
		})?;

		Ok(())
	}
}

fn is_transient_error(e: &sqlx::Error) -> bool {
	match e {
		sqlx::Error::Io(_) => true,
		sqlx::Error::PoolTimedOut => true,
		sqlx::Error::PoolClosed => true,
		sqlx::Error::Database(db_err) => {
			let msg = db_err.message().to_lowercase();
			msg.contains("busy") || msg.contains("locked") || msg.contains("timeout")
		}
		_ => false,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::event::{AuditEventType, AuditLogBuilder};
	use sqlx::Row;

	async fn create_audit_pool() -> SqlitePool {
		let pool = SqlitePool::connect(":memory:").await.unwrap();
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
		.execute(&pool)
		.await
		.unwrap();
		pool
	}

	#[tokio::test]
	async fn publish_inserts_row() {
		let pool = create_audit_pool().await;
		let sink = SqliteAuditSink::new(pool.clone());

		let entry = AuditLogBuilder::new(AuditEventType::MemberAdded)
			.actor("system")
			.resource("org", "org_1")
			.details(serde_json::json!({"role": "member"}))
			.build();

		sink.publish(Arc::new(entry.clone())).await.unwrap();

		let row = sqlx::query("SELECT event_type, severity, actor, details FROM audit_logs")
			.fetch_one(&pool)
			.await
			.unwrap();
		let event_type: String = row.get("event_type");
		let severity: String = row.get("severity");
		let actor: Option<String> = row.get("actor");
		let details: String = row.get("details");
		assert_eq!(event_type, "member_added");
		assert_eq!(severity, "info");
		assert_eq!(actor.as_deref(), Some("system"));
		assert!(details.contains("member"));
	}

	#[tokio::test]
	async fn publish_without_table_is_permanent_error() {
		let pool = SqlitePool::connect(":memory:").await.unwrap();
		let sink = SqliteAuditSink::new(pool);

		let entry = AuditLogBuilder::new(AuditEventType::WebhookRejected).build();
		let result = sink.publish(Arc::new(entry)).await;
		assert!(matches!(result, Err(AuditSinkError::Permanent(_))));
	}
}
