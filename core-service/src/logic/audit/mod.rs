//! Audit Module - append-only, hash-verifiable decision log
//!
//! Log format: JSON Lines (.jsonl), one record per decision, insertion order.
//! Records are never mutated or deleted.

pub mod record;
pub mod writer;


pub use record::{feature_hash, AuditRecord};
pub use writer::AuditLog;
