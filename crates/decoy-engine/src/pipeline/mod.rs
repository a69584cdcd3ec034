//! Interception control loop.
//!
//! One pipeline instance serves one device connection; all instances of a
//! session share the same route store and ledger. Each observed call walks
//! `OBSERVED -> MATCHING -> {MOCKING | FORWARDING} -> COMPLETED`, with
//! `ABANDONED` as the terminal state for dropped connections.
//!
//! A mocked call suppresses the upstream forward entirely: the transport is
//! told via [`Decision::Mocked`] not to complete the real call, so the real
//! backend never sees its side effects. A real reply that arrives anyway is
//! dropped with a warning.

use crate::body::Body;
use crate::headers::Headers;
use crate::ledger::{Ledger, LedgerError, ObservedRequest, ResponseRecord, ResponseSource};
use crate::matcher;
use crate::route::{Route, RouteId, RouteStore};
use async_trait::async_trait;
use chrono::Utc;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Outbound contract: emit a response back to the transport.
///
/// Used identically for mocked and real replies, so the transport stays
/// agnostic to the mocking decision.
#[async_trait]
pub trait ResponseSink: Send + Sync {
    async fn emit_response(
        &self,
        request_id: &str,
        response: &ResponseRecord,
    ) -> anyhow::Result<()>;
}

/// What the transport should do with the real call after observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// A route matched: the canned reply has been recorded and emitted.
    /// The transport must NOT complete the real call upstream.
    Mocked { route_id: RouteId },
    /// No route matched (or mocking is off): the real call proceeds and
    /// its reply is expected via `on_real_response_received`.
    Forward,
}

/// Session-wide mock kill-switch, shared by every pipeline instance.
/// When off, every call forwards and the route set is left untouched.
#[derive(Clone)]
pub struct MockSwitch(Arc<AtomicBool>);

impl MockSwitch {
    /// Starts enabled.
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn set(&self, enabled: bool) {
        self.0.store(enabled, Ordering::SeqCst);
    }

    pub fn is_on(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl Default for MockSwitch {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-connection interception pipeline.
pub struct InterceptionPipeline {
    routes: Arc<RouteStore>,
    ledger: Arc<Ledger>,
    sink: Arc<dyn ResponseSink>,
    switch: MockSwitch,
    request_count: AtomicU64,
}

impl InterceptionPipeline {
    pub fn new(
        routes: Arc<RouteStore>,
        ledger: Arc<Ledger>,
        sink: Arc<dyn ResponseSink>,
        switch: MockSwitch,
    ) -> Self {
        Self {
            routes,
            ledger,
            sink,
            switch,
            request_count: AtomicU64::new(0),
        }
    }

    /// Inbound contract: a request was observed on the wire.
    ///
    /// The ledger write happens before matching, so even a failure during
    /// matching leaves an auditable record. Matching runs against the route
    /// snapshot taken at arrival; edits landing mid-flight do not change
    /// the decision for this call.
    pub async fn on_request_observed(&self, request: ObservedRequest) -> Decision {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        let request_id = request.id.clone();

        if let Err(err) = self.ledger.record_request(request.clone()) {
            // A duplicate inbound id is a transport defect; it must not
            // corrupt the ledger or double-mock, so the call passes through.
            warn!(request = %request_id, %err, "request not recorded; passing through");
            return Decision::Forward;
        }

        if !self.switch.is_on() {
            debug!(request = %request_id, "mocking disabled; forwarding");
            return Decision::Forward;
        }

        let snapshot = self.routes.list();
        let Some(route) = self.match_snapshot(&request, &snapshot) else {
            debug!(request = %request_id, "no matching route; forwarding");
            return Decision::Forward;
        };

        let route_id = route.id;
        let record = ResponseRecord {
            timestamp: Utc::now(),
            status: route.response_status,
            headers: route.response_headers.clone(),
            body: route.response_data.clone(),
            source: ResponseSource::Mocked { route_id },
        };

        debug!(request = %request_id, route = %route_id, status = record.status, "mocking response");
        self.record_and_emit(&request_id, record).await;
        Decision::Mocked { route_id }
    }

    /// Inbound contract: the real upstream reply arrived for a forwarded
    /// call. Records it with `source: Real` and emits it unchanged.
    pub async fn on_real_response_received(
        &self,
        request_id: &str,
        status: u16,
        headers: Headers,
        body: Body,
    ) {
        let record = ResponseRecord {
            timestamp: Utc::now(),
            status,
            headers,
            body,
            source: ResponseSource::Real,
        };
        self.record_and_emit(request_id, record).await;
    }

    /// The device connection dropped while this call was in flight.
    /// Transitions a pending ledger entry to its terminal abandoned state.
    pub fn on_connection_dropped(&self, request_id: &str) {
        match self.ledger.record_abandoned(request_id) {
            Ok(()) => debug!(request = %request_id, "call abandoned"),
            Err(err) => debug!(request = %request_id, %err, "drop notification ignored"),
        }
    }

    /// Calls observed through this pipeline instance.
    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::SeqCst)
    }

    pub fn mock_switch(&self) -> &MockSwitch {
        &self.switch
    }

    /// Matching failures must never block real traffic: any panic out of
    /// the selection path degrades to pass-through forwarding.
    fn match_snapshot<'a>(
        &self,
        request: &ObservedRequest,
        snapshot: &'a [Route],
    ) -> Option<&'a Route> {
        match std::panic::catch_unwind(AssertUnwindSafe(|| matcher::select(request, snapshot))) {
            Ok(selected) => selected,
            Err(_) => {
                error!(request = %request.id, "matcher failure; falling back to forwarding");
                None
            }
        }
    }

    async fn record_and_emit(&self, request_id: &str, record: ResponseRecord) {
        match self.ledger.record_response(request_id, record.clone()) {
            Ok(()) => {
                if let Err(err) = self.sink.emit_response(request_id, &record).await {
                    error!(request = %request_id, %err, "failed to emit response");
                }
            }
            Err(err @ LedgerError::AlreadyRecorded(_)) => {
                // Duplicate upstream reply, or the real reply for a call we
                // already mocked. Dropped; history stays intact.
                warn!(request = %request_id, %err, "dropping duplicate reply");
            }
            Err(err) => {
                warn!(request = %request_id, %err, "dropping reply for unknown request");
            }
        }
    }
}
