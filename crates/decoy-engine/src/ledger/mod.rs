//! Append-only record of observed traffic and its outcomes.

mod store;
mod types;

pub use store::Ledger;
pub use types::{
    CallOutcome, Cursor, LedgerEntry, LedgerError, ObservedRequest, RequestId, ResponseRecord,
    ResponseSource,
};
