//! Ledger storage: append-only, arrival-ordered, at-most-once outcomes.

use super::types::{
    CallOutcome, Cursor, LedgerEntry, LedgerError, ObservedRequest, RequestId, ResponseRecord,
};
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

struct LedgerInner {
    /// Entries in arrival order; `seq` is strictly increasing.
    entries: Vec<LedgerEntry>,
    /// Request id -> position in `entries`.
    index: HashMap<RequestId, usize>,
    next_seq: u64,
}

/// Append-only record of observed requests and their outcomes.
///
/// Sequence numbers are assigned inside the same write section as the
/// insert, so entries preserve `record_request` arrival order even with
/// several device connections feeding the ledger concurrently.
pub struct Ledger {
    inner: RwLock<LedgerInner>,
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(LedgerInner {
                entries: Vec::new(),
                index: HashMap::new(),
                next_seq: 0,
            }),
        }
    }

    /// Record an observed request with a `Pending` outcome.
    pub fn record_request(&self, request: ObservedRequest) -> Result<(), LedgerError> {
        let mut inner = self.inner.write();
        if inner.index.contains_key(&request.id) {
            return Err(LedgerError::DuplicateId(request.id));
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        let position = inner.entries.len();
        inner.index.insert(request.id.clone(), position);
        inner.entries.push(LedgerEntry {
            seq,
            request,
            outcome: CallOutcome::Pending,
        });
        Ok(())
    }

    /// Pair a reply with its request. At most one write per request id; a
    /// failed write leaves the stored entry untouched.
    pub fn record_response(
        &self,
        id: &str,
        record: ResponseRecord,
    ) -> Result<(), LedgerError> {
        let mut inner = self.inner.write();
        let position = *inner
            .index
            .get(id)
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;
        let entry = &mut inner.entries[position];

        if entry.outcome.is_terminal() {
            return Err(LedgerError::AlreadyRecorded(id.to_string()));
        }
        entry.outcome = CallOutcome::Responded(record);
        Ok(())
    }

    /// Mark a pending call terminal after its connection dropped, so
    /// `list_since` consumers never wait on a stalled entry.
    pub fn record_abandoned(&self, id: &str) -> Result<(), LedgerError> {
        let mut inner = self.inner.write();
        let position = *inner
            .index
            .get(id)
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;
        let entry = &mut inner.entries[position];

        if entry.outcome.is_terminal() {
            return Err(LedgerError::AlreadyRecorded(id.to_string()));
        }
        entry.outcome = CallOutcome::Abandoned {
            timestamp: Utc::now(),
        };
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<LedgerEntry> {
        let inner = self.inner.read();
        inner.index.get(id).map(|&pos| inner.entries[pos].clone())
    }

    /// Entries recorded at or after `cursor`, plus the cursor to resume
    /// from. Pending entries are included; a later call with the returned
    /// cursor will NOT replay their eventual outcome, so consumers that
    /// track pending rows should re-`get` them by id.
    pub fn list_since(&self, cursor: Cursor) -> (Vec<LedgerEntry>, Cursor) {
        let inner = self.inner.read();
        let start = inner.entries.partition_point(|e| e.seq < cursor.0);
        let entries = inner.entries[start..].to_vec();
        (entries, Cursor(inner.next_seq))
    }

    /// Atomically empty the ledger (session boundary). The sequence counter
    /// is NOT reset, so cursors held across a clear stay monotonic and
    /// never skip post-clear entries.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        let dropped = inner.entries.len();
        inner.entries.clear();
        inner.index.clear();
        debug!(dropped, "ledger cleared");
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
