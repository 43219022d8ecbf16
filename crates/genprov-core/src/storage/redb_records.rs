//! # redb-backed Record Store
//!
//! Persists `ObjectRecord`s in a redb embedded database, keyed by
//! `(event_id, object_id)` so that one event's records form a contiguous
//! range.
//!
//! As a `RecordSink` the store buffers writes in memory and commits them in a
//! single transaction on `flush`, which the record writer calls once per
//! event. A failed commit leaves the buffer intact so `flush` can be retried.
//! A record written twice under the same key replaces the earlier one.

use crate::writer::{ObjectRecord, RecordSink};
use crate::{GenprovError, ObjectId};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;

/// Table for records: (event_id, object_id) -> postcard bytes
const RECORDS: TableDefinition<(u64, u64), &[u8]> = TableDefinition::new("records");

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const RECORD_COUNT: &str = "record_count";

fn io_err(e: impl std::fmt::Display) -> GenprovError {
    GenprovError::IoError(e.to_string())
}

/// A disk-backed record store.
pub struct RedbRecordStore {
    db: Database,
    /// Records accepted by `write` and not yet committed.
    pending: Vec<ObjectRecord>,
}

impl std::fmt::Debug for RedbRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbRecordStore")
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl RedbRecordStore {
    /// Open or create a record database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GenprovError> {
        let db = Database::create(path.as_ref()).map_err(io_err)?;

        let write_txn = db.begin_write().map_err(io_err)?;
        {
            let _ = write_txn.open_table(RECORDS).map_err(io_err)?;
            let _ = write_txn.open_table(METADATA).map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)?;

        Ok(Self {
            db,
            pending: Vec::new(),
        })
    }

    /// Store records in one ACID transaction.
    ///
    /// Every record is encoded before the transaction opens, so an encoding
    /// failure leaves the database untouched.
    pub fn write_batch(&self, records: &[ObjectRecord]) -> Result<(), GenprovError> {
        commit_batch(&self.db, records)
    }

    /// Look up one committed record.
    pub fn get(&self, event_id: u64, object: ObjectId) -> Result<Option<ObjectRecord>, GenprovError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(RECORDS).map_err(io_err)?;

        table
            .get((event_id, object.0))
            .map_err(io_err)?
            .map(|data| decode(data.value()))
            .transpose()
    }

    /// All committed records of one event, in object id order.
    pub fn records_for_event(&self, event_id: u64) -> Result<Vec<ObjectRecord>, GenprovError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(RECORDS).map_err(io_err)?;

        let mut records = Vec::new();
        for entry in table
            .range((event_id, 0u64)..=(event_id, u64::MAX))
            .map_err(io_err)?
        {
            let (_, value) = entry.map_err(io_err)?;
            records.push(decode(value.value())?);
        }
        Ok(records)
    }

    /// Number of distinct committed records.
    pub fn record_count(&self) -> Result<u64, GenprovError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(METADATA).map_err(io_err)?;
        Ok(table
            .get(RECORD_COUNT)
            .map_err(io_err)?
            .map(|v| v.value())
            .unwrap_or(0))
    }

    /// Records accepted by `write` but not yet flushed.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

fn commit_batch(db: &Database, records: &[ObjectRecord]) -> Result<(), GenprovError> {
    if records.is_empty() {
        return Ok(());
    }
    let encoded = records
        .iter()
        .map(|r| {
            postcard::to_allocvec(r)
                .map(|bytes| ((r.event_id, r.object_id.0), bytes))
                .map_err(|e| GenprovError::SerializationError(e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let write_txn = db.begin_write().map_err(io_err)?;
    {
        let mut records_table = write_txn.open_table(RECORDS).map_err(io_err)?;
        let mut meta_table = write_txn.open_table(METADATA).map_err(io_err)?;

        let mut added = 0u64;
        for (key, bytes) in &encoded {
            let replaced = records_table
                .insert(*key, bytes.as_slice())
                .map_err(io_err)?
                .is_some();
            if !replaced {
                added += 1;
            }
        }

        let count = meta_table
            .get(RECORD_COUNT)
            .map_err(io_err)?
            .map(|v| v.value())
            .unwrap_or(0);
        meta_table
            .insert(RECORD_COUNT, count.saturating_add(added))
            .map_err(io_err)?;
    }
    write_txn.commit().map_err(io_err)
}

/// Hand the buffered records to `commit`; they are dropped only once it succeeds.
fn flush_pending<F>(pending: &mut Vec<ObjectRecord>, commit: F) -> Result<(), GenprovError>
where
    F: FnOnce(&[ObjectRecord]) -> Result<(), GenprovError>,
{
    commit(pending)?;
    pending.clear();
    Ok(())
}

fn decode(bytes: &[u8]) -> Result<ObjectRecord, GenprovError> {
    postcard::from_bytes(bytes).map_err(|e| GenprovError::DeserializationError(e.to_string()))
}

impl RecordSink for RedbRecordStore {
    fn write(&mut self, record: ObjectRecord) -> Result<(), GenprovError> {
        self.pending.push(record);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), GenprovError> {
        let db = &self.db;
        flush_pending(&mut self.pending, |batch| commit_batch(db, batch))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventBuilder;
    use crate::writer::RecordWriter;
    use crate::{FourMomentum, Node, NodeId, ObjectKind, OutputObject};
    use tempfile::tempdir;

    fn event(id: u64, objects: &[u64]) -> crate::Event {
        let mut builder = EventBuilder::new(id);
        builder
            .add_node(Node::new(NodeId(1), FourMomentum::new(2.0, 0.0, 1.0, 3.0)))
            .expect("add node");
        for &object in objects {
            builder
                .add_object(
                    OutputObject::new(
                        ObjectId(object),
                        ObjectKind::ParticleFlowCandidate,
                        FourMomentum::new(2.0, 0.0, 1.0, 3.0),
                    )
                    .with_constituents([NodeId(1)]),
                )
                .expect("add object");
        }
        builder.build()
    }

    #[test]
    fn writes_are_invisible_until_flush() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbRecordStore::open(temp.path().join("records.redb")).expect("open db");

        let event = event(1, &[4]);
        let (record, _) = RecordWriter::default().record_object(1, event.graph(), &event.objects()[0]);
        store.write(record.clone()).expect("write");
        assert_eq!(store.pending(), 1);
        assert_eq!(store.get(1, ObjectId(4)).expect("get"), None);

        store.flush().expect("flush");
        assert_eq!(store.pending(), 0);
        assert_eq!(store.get(1, ObjectId(4)).expect("get"), Some(record));
    }

    #[test]
    fn failed_commit_keeps_records_pending() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbRecordStore::open(temp.path().join("records.redb")).expect("open db");
        let writer = RecordWriter::default();
        let event = event(2, &[1, 2]);

        for object in event.objects() {
            let (record, _) = writer.record_object(2, event.graph(), object);
            store.write(record).expect("write");
        }

        let result = flush_pending(&mut store.pending, |_| {
            Err(GenprovError::IoError("commit failed".to_string()))
        });
        assert!(matches!(result, Err(GenprovError::IoError(_))));
        assert_eq!(store.pending(), 2);
        assert_eq!(store.record_count().expect("count"), 0);

        store.flush().expect("retry");
        assert_eq!(store.pending(), 0);
        assert_eq!(store.record_count().expect("count"), 2);
        assert_eq!(store.records_for_event(2).expect("range").len(), 2);
    }

    #[test]
    fn records_are_grouped_by_event() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbRecordStore::open(temp.path().join("records.redb")).expect("open db");
        let writer = RecordWriter::default();

        writer
            .process_event(&event(1, &[30, 10, 20]), &mut store)
            .expect("event 1");
        writer
            .process_event(&event(2, &[5]), &mut store)
            .expect("event 2");

        let ids: Vec<_> = store
            .records_for_event(1)
            .expect("range")
            .iter()
            .map(|r| r.object_id)
            .collect();
        assert_eq!(ids, vec![ObjectId(10), ObjectId(20), ObjectId(30)]);
        assert_eq!(store.records_for_event(2).expect("range").len(), 1);
        assert!(store.records_for_event(3).expect("range").is_empty());
        assert_eq!(store.record_count().expect("count"), 4);
    }

    #[test]
    fn rewriting_an_event_does_not_inflate_the_count() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbRecordStore::open(temp.path().join("records.redb")).expect("open db");
        let writer = RecordWriter::default();
        let event = event(1, &[1, 2]);

        writer.process_event(&event, &mut store).expect("first");
        writer.process_event(&event, &mut store).expect("second");
        assert_eq!(store.record_count().expect("count"), 2);

        let committed = store.records_for_event(1).expect("range");
        store.write_batch(&committed).expect("batch");
        assert_eq!(store.record_count().expect("count"), 2);
    }

    #[test]
    fn records_persist_after_reopen() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("records.redb");

        {
            let mut store = RedbRecordStore::open(&db_path).expect("open db");
            RecordWriter::default()
                .process_event(&event(8, &[1, 2, 3]), &mut store)
                .expect("process");
        }

        {
            let store = RedbRecordStore::open(&db_path).expect("reopen db");
            assert_eq!(store.record_count().expect("count"), 3);
            let record = store.get(8, ObjectId(2)).expect("get").expect("present");
            assert_eq!(record.particles, vec![NodeId(1)]);
            assert!(record.analysis.is_some());
        }
    }
}
