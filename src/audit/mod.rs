// Audit log
//
// Handlers and the settlement engine emit entries without waiting on the
// result. A background writer drains the channel into the audit store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::store::AuditStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    Created,
    Read,
    Update,
    Delete,
    List,
    #[serde(rename = "Charts info")]
    ChartsInfo,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Created => "Created",
            AuditAction::Read => "Read",
            AuditAction::Update => "Update",
            AuditAction::Delete => "Delete",
            AuditAction::List => "List",
            AuditAction::ChartsInfo => "Charts info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTarget {
    pub collection: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: AuditAction,
    pub target: AuditTarget,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(action: AuditAction, collection: &str, id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: None,
            action,
            target: AuditTarget {
                collection: collection.to_string(),
                id,
            },
            created_at: Utc::now(),
        }
    }

    pub fn on_record(action: AuditAction, collection: &str, id: Uuid) -> Self {
        Self::new(action, collection, Some(id.to_string()))
    }

    pub fn on_collection(action: AuditAction, collection: &str) -> Self {
        Self::new(action, collection, None)
    }
}

/// Sending half of the audit channel
#[derive(Clone)]
pub struct AuditSink {
    tx: mpsc::Sender<AuditEntry>,
}

impl AuditSink {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<AuditEntry>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Fire-and-forget. A full or closed channel drops the entry.
    pub fn emit(&self, entry: AuditEntry) {
        if let Err(e) = self.tx.try_send(entry) {
            warn!("Audit entry dropped: {}", e);
        }
    }
}

/// Drain the audit channel into the store until every sink is dropped
pub fn spawn_audit_writer(
    mut rx: mpsc::Receiver<AuditEntry>,
    store: Arc<dyn AuditStore>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(entry) = rx.recv().await {
            debug!(
                "📝 Audit: {} {}{}",
                entry.action.as_str(),
                entry.target.collection,
                entry
                    .target
                    .id
                    .as_deref()
                    .map(|id| format!("/{}", id))
                    .unwrap_or_default()
            );

            if let Err(e) = store.record(entry).await {
                error!("Failed to persist audit entry: {:?}", e);
            }
        }
        debug!("Audit writer stopped");
    })
}
