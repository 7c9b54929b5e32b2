//! Fire-and-forget audit trail and actor identity.
//!
//! The audit sink is a pure side channel: the ledger never reads it back,
//! and a failing sink must never block a ledger operation. The engine logs
//! sink failures at `warn` and carries on.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Append-only audit record. `details` is an opaque serialized payload.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub action: String,
    pub entity_type: &'static str,
    pub entity_id: String,
    pub user_id: String,
    pub details: serde_json::Value,
    pub at: DateTime<Utc>,
}

/// Destination for audit records. Best-effort by contract.
pub trait AuditSink: Send + Sync {
    fn record(&self, entry: AuditEntry) -> anyhow::Result<()>;
}

impl<T: AuditSink + ?Sized> AuditSink for Arc<T> {
    fn record(&self, entry: AuditEntry) -> anyhow::Result<()> {
        (**self).record(entry)
    }
}

/// Supplies the acting user id for audit attribution. Upstream this is
/// backed by the session layer; the default attributes to `"system"`.
pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> String;
}

/// Default sink: emits each entry as a structured log event.
#[derive(Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, entry: AuditEntry) -> anyhow::Result<()> {
        tracing::info!(
            action = %entry.action,
            entity_type = entry.entity_type,
            entity_id = %entry.entity_id,
            user_id = %entry.user_id,
            details = %entry.details,
            "audit"
        );
        Ok(())
    }
}

/// Sink that retains entries in memory, for tests and inspection.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().expect("audit sink poisoned").clone()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, entry: AuditEntry) -> anyhow::Result<()> {
        self.entries.lock().expect("audit sink poisoned").push(entry);
        Ok(())
    }
}

/// Default identity: operations run by the system itself.
#[derive(Debug, Default)]
pub struct SystemIdentity;

impl IdentityProvider for SystemIdentity {
    fn current_user(&self) -> String {
        "system".to_string()
    }
}

/// Fixed identity, for request handlers that resolved a session upfront.
#[derive(Debug)]
pub struct FixedIdentity(pub String);

impl IdentityProvider for FixedIdentity {
    fn current_user(&self) -> String {
        self.0.clone()
    }
}
