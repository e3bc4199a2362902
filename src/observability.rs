use std::net::SocketAddr;

// ── Notification stream ─────────────────────────────────────────

/// Counter: inbound frames. Labels: status (ok, malformed, unreadable).
pub const STREAM_MESSAGES_TOTAL: &str = "staffline_stream_messages_total";

/// Counter: reconnect attempts scheduled after a close or failed open.
pub const STREAM_RECONNECTS_TOTAL: &str = "staffline_stream_reconnects_total";

/// Gauge: 1 while a connection is open, 0 otherwise.
pub const STREAM_CONNECTED: &str = "staffline_stream_connected";

/// Counter: listener callbacks that panicked during dispatch.
pub const LISTENER_PANICS_TOTAL: &str = "staffline_listener_panics_total";

// ── Layout ──────────────────────────────────────────────────────

/// Counter: input records excluded from lane placement.
pub const LAYOUT_REJECTED_TOTAL: &str = "staffline_layout_rejected_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}
