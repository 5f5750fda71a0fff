//! Hot store contract
//!
//! The hot tier holds recent records and serves the CRUD surface. The only
//! tiering-specific operation is [`HotStore::scan_older_than`], a
//! cursor-paginated walk over records created before a cutoff.
//!
//! ## Scan stability
//!
//! Records are visited in `(created_at, id)` order and the cursor is the
//! last key returned, not an offset. `created_at` never changes, and new
//! records are always created after the cutoff, so concurrent inserts and
//! deletes can neither make the scan revisit a record nor skip one that
//! was present for the whole pass.

mod memory;

pub use memory::MemoryHotStore;

use async_trait::async_trait;
use strata_tier_core::{Record, RecordId, Result, Timestamp};

/// Position after the last record returned by a scan
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScanCursor {
    /// Creation time of the last record seen
    pub created_at: Timestamp,
    /// Id of the last record seen
    pub id: RecordId,
}

impl ScanCursor {
    /// Cursor positioned just after `record`
    pub fn after(record: &Record) -> Self {
        ScanCursor {
            created_at: record.created_at,
            id: record.id.clone(),
        }
    }
}

/// One page of scan results
#[derive(Debug, Clone, Default)]
pub struct ScanPage {
    /// Records in `(created_at, id)` order
    pub records: Vec<Record>,
    /// Where the next page starts; `None` once the scan is exhausted
    pub next_cursor: Option<ScanCursor>,
}

/// Result of a conditional delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The record was removed
    Deleted,
    /// No record with that id exists
    Missing,
    /// The record changed since the expected version and was kept
    Modified,
}

/// Low-latency record store
#[async_trait]
pub trait HotStore: Send + Sync {
    /// Fetch a record by id
    async fn get(&self, id: &RecordId) -> Result<Option<Record>>;

    /// Insert or replace a record
    ///
    /// Replacing keeps the stored `created_at`; it is immutable.
    async fn put(&self, record: Record) -> Result<()>;

    /// Remove a record; returns whether it existed
    async fn delete(&self, id: &RecordId) -> Result<bool>;

    /// Remove a record only if its `updated_at` still equals `expected`
    async fn delete_if_unmodified(
        &self,
        id: &RecordId,
        expected: Timestamp,
    ) -> Result<DeleteOutcome> {
        match self.get(id).await? {
            None => Ok(DeleteOutcome::Missing),
            Some(current) if current.updated_at != expected => Ok(DeleteOutcome::Modified),
            Some(_) => Ok(if self.delete(id).await? {
                DeleteOutcome::Deleted
            } else {
                DeleteOutcome::Missing
            }),
        }
    }

    /// Records created strictly before `cutoff`, after `cursor`, at most `limit`
    async fn scan_older_than(
        &self,
        cutoff: Timestamp,
        cursor: Option<&ScanCursor>,
        limit: usize,
    ) -> Result<ScanPage>;

    /// Newest-first listing for the CRUD surface
    async fn list(&self, offset: usize, limit: usize) -> Result<Vec<Record>>;

    /// Number of records held
    async fn count(&self) -> Result<usize>;
}
