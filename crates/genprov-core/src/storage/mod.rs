//! # Storage
//!
//! Persistent record sinks.

pub mod redb_records;

pub use redb_records::RedbRecordStore;
