//! Type definitions for the traffic ledger.

use crate::body::Body;
use crate::headers::Headers;
use crate::route::{RequestMethod, RouteConfig, RouteId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Transport-assigned identifier for an observed call.
pub type RequestId = String;

/// One observed live call, immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservedRequest {
    pub id: RequestId,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Method as observed on the wire, verbatim.
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: Headers,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Body>,
}

/// Where a recorded response came from.
///
/// `Mocked.route_id` is a weak reference: the route may be edited or deleted
/// afterwards, and lookup may then miss. Ledger history never mutates to
/// follow it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ResponseSource {
    Real,
    Mocked { route_id: RouteId },
}

/// The reply paired with an observed request, written at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseRecord {
    pub timestamp: DateTime<Utc>,
    pub status: u16,
    pub headers: Headers,
    pub body: Body,
    pub source: ResponseSource,
}

/// Terminal-or-pending state of one observed call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum CallOutcome {
    /// Request recorded, reply not yet seen.
    Pending,
    /// Reply recorded (mocked or real). Terminal.
    Responded(ResponseRecord),
    /// Connection dropped before a reply was seen. Terminal.
    Abandoned { timestamp: DateTime<Utc> },
}

impl CallOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CallOutcome::Pending)
    }
}

/// One ledger row: the request, its outcome, and the arrival sequence
/// number used for cursor-based reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub seq: u64,
    pub request: ObservedRequest,
    pub outcome: CallOutcome,
}

impl LedgerEntry {
    pub fn is_pending(&self) -> bool {
        !self.outcome.is_terminal()
    }

    pub fn response(&self) -> Option<&ResponseRecord> {
        match &self.outcome {
            CallOutcome::Responded(record) => Some(record),
            _ => None,
        }
    }

    /// Turn a completed observation into a route that replays its reply:
    /// the "mock this call" affordance. Methods outside the fixed set fall
    /// back to the wildcard.
    pub fn to_route_config(&self) -> Option<RouteConfig> {
        let response = self.response()?;
        Some(RouteConfig {
            request_url: self.request.url.clone(),
            request_method: RequestMethod::parse(&self.request.method)
                .unwrap_or(RequestMethod::Any),
            response_data: response.body.clone(),
            response_headers: response.headers.clone(),
            response_status: response.status,
            enabled: true,
        })
    }
}

/// Opaque, monotonic position in the ledger for incremental reads.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Cursor(pub(crate) u64);

impl Cursor {
    /// Cursor positioned before the first entry ever recorded.
    pub fn start() -> Self {
        Self(0)
    }
}

/// Error types for ledger operations
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("request {0} already recorded")]
    DuplicateId(RequestId),
    #[error("no request {0} in ledger")]
    NotFound(RequestId),
    #[error("outcome already recorded for request {0}")]
    AlreadyRecorded(RequestId),
}
