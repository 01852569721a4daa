//! The audit sink contract and an in-memory implementation.

use std::sync::Mutex;

use crate::{AuditRecord, Error, Result};

/// Append-only destination for audit records.
///
/// Implementations must tolerate concurrent appends from independent turns.
pub trait AuditSink: Send + Sync {
    /// Durably append one record.
    fn append(&self, record: &AuditRecord) -> Result<()>;
}

/// Audit sink that keeps records in memory.
///
/// Useful for tests and for running without a database.
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record appended so far, in append order.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemoryAuditLog {
    fn append(&self, record: &AuditRecord) -> Result<()> {
        self.records
            .lock()
            .map_err(|_| Error::Poisoned)?
            .push(record.clone());
        Ok(())
    }
}
