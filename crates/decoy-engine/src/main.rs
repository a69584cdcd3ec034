//! Line-delimited JSON harness around the interception engine.
//!
//! Reads transport events from stdin (one JSON object per line), drives a
//! pipeline, and writes emitted responses and forwarding decisions to
//! stdout. Logs go to stderr so the output stream stays machine-readable.

use anyhow::Context;
use clap::Parser;
use decoy_engine::codec;
use decoy_engine::ledger::{Ledger, ObservedRequest, ResponseRecord};
use decoy_engine::pipeline::{Decision, InterceptionPipeline, MockSwitch, ResponseSink};
use decoy_engine::route::RouteStore;
use decoy_engine::{Body, Headers};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "decoy-engine", version, about = "Network mock interception engine")]
struct Args {
    /// Route document to preload (JSON, as produced by export)
    #[arg(short, long)]
    routes: Option<PathBuf>,
    /// Start with mocking disabled (observe and record only)
    #[arg(long)]
    passthrough: bool,
}

/// Inbound event contract, one JSON object per stdin line.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
enum TransportEvent {
    /// A request was observed on the wire.
    Request {
        #[serde(flatten)]
        request: ObservedRequest,
    },
    /// The real upstream reply for a forwarded call.
    Response {
        id: String,
        status: u16,
        #[serde(default)]
        headers: Headers,
        #[serde(default)]
        body: Body,
    },
    /// The device connection dropped mid-call.
    Dropped { id: String },
}

/// Outbound lines written to stdout.
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
enum EngineOutput<'a> {
    /// A response (mocked or real) emitted back to the transport.
    Emit {
        id: &'a str,
        response: &'a ResponseRecord,
    },
    /// Whether the transport should complete the real call upstream.
    Decision { id: &'a str, forward: bool },
}

struct StdoutSink;

#[async_trait::async_trait]
impl ResponseSink for StdoutSink {
    async fn emit_response(
        &self,
        request_id: &str,
        response: &ResponseRecord,
    ) -> anyhow::Result<()> {
        let line = serde_json::to_string(&EngineOutput::Emit {
            id: request_id,
            response,
        })?;
        println!("{line}");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let routes = Arc::new(RouteStore::new());
    if let Some(ref path) = args.routes {
        let configs = codec::read_routes_file(path)
            .with_context(|| format!("failed to load routes from {}", path.display()))?;
        let count = configs.len();
        routes.extend(configs).context("failed to install routes")?;
        info!(count, "routes preloaded");
    }

    let ledger = Arc::new(Ledger::new());
    let switch = MockSwitch::new();
    switch.set(!args.passthrough);

    let pipeline = InterceptionPipeline::new(
        Arc::clone(&routes),
        Arc::clone(&ledger),
        Arc::new(StdoutSink),
        switch,
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event: TransportEvent = match serde_json::from_str(line) {
            Ok(event) => event,
            Err(err) => {
                warn!(%err, "skipping malformed event");
                continue;
            }
        };
        match event {
            TransportEvent::Request { request } => {
                let id = request.id.clone();
                let decision = pipeline.on_request_observed(request).await;
                let forward = matches!(decision, Decision::Forward);
                let out = serde_json::to_string(&EngineOutput::Decision { id: &id, forward })?;
                println!("{out}");
            }
            TransportEvent::Response {
                id,
                status,
                headers,
                body,
            } => {
                pipeline
                    .on_real_response_received(&id, status, headers, body)
                    .await;
            }
            TransportEvent::Dropped { id } => pipeline.on_connection_dropped(&id),
        }
    }

    info!(
        observed = pipeline.request_count(),
        recorded = ledger.len(),
        "transport closed"
    );
    Ok(())
}
