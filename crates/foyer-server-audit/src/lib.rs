// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit logging for the membership core.
//!
//! Handlers build [`AuditLogEntry`] values with [`AuditLogBuilder`] and
//! hand them to [`AuditService::log`], which queues them on a bounded
//! channel. A background task drains the queue into the configured
//! [`AuditSink`]s; sink failures are logged and never surfaced to request
//! handlers.

pub mod event;
pub mod sink;

pub use event::{AuditEventType, AuditLogBuilder, AuditLogEntry, AuditSeverity};
pub use sink::{AuditSink, AuditSinkError, SqliteAuditSink};

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{instrument, warn};

/// Asynchronous audit pipeline.
pub struct AuditService {
	tx: mpsc::Sender<AuditLogEntry>,
}

impl AuditService {
	/// Start the pipeline with a bounded queue and a set of sinks.
	pub fn new(queue_capacity: usize, sinks: Vec<Arc<dyn AuditSink>>) -> Self {
		let (tx, rx) = mpsc::channel(queue_capacity);
		tokio::spawn(Self::background_task(rx, sinks));
		Self { tx }
	}

	async fn background_task(
		mut rx: mpsc::Receiver<AuditLogEntry>,
		sinks: Vec<Arc<dyn AuditSink>>,
	) {
		while let Some(entry) = rx.recv().await {
			let entry = Arc::new(entry);
			for sink in &sinks {
				if let Err(e) = sink.publish(Arc::clone(&entry)).await {
					warn!(sink = sink.name(), error = %e, "audit sink publish failed");
				}
			}
		}
	}

	/// Queue an audit event for processing.
	///
	/// Returns `true` if the event was successfully queued, `false` if the
	/// queue is full and the event was dropped.
	#[instrument(skip(self, entry), fields(event_type = %entry.event_type))]
	pub fn log(&self, entry: AuditLogEntry) -> bool {
		self.tx.try_send(entry).is_ok()
	}
}
