//! SQLite-backed audit log for parley tool invocations.
//!
//! Every tool call the dispatcher completes, whether the tool returned data
//! or an error-shaped result, is captured as one [`AuditRecord`]. Records are
//! append-only: nothing in this crate updates or deletes them.
//!
//! # Overview
//!
//! - [`AuditSink`] is the write-side contract the dispatcher depends on.
//! - [`AuditStore`] persists records to an SQLite `function_calls` table and
//!   offers a small read side for the CLI log viewer.
//! - [`MemoryAuditLog`] keeps records in memory for tests.
//!
//! # Example
//!
//! ```no_run
//! use storage::{AuditRecord, AuditSink, AuditStore};
//! use serde_json::json;
//!
//! let store = AuditStore::open("function_calls.db")?;
//! store.append(&AuditRecord::new(
//!     "convert_currency",
//!     json!({"amount": 500, "base": "INR", "target": "USD"}),
//!     json!({"converted": 6.01, "rate": 0.01202}),
//! ))?;
//!
//! for record in store.recent(10, None)? {
//!     println!("{} {}", record.timestamp, record.function_name);
//! }
//! # Ok::<(), storage::Error>(())
//! ```

mod error;
mod record;
mod sink;
mod store;

pub use error::{Error, Result};
pub use record::AuditRecord;
pub use sink::{AuditSink, MemoryAuditLog};
pub use store::AuditStore;
