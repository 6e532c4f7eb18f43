//! Prometheus text exposition format.
//!
//! Renders the ingestion metrics for scraping by a Prometheus server or a
//! compatible agent.

use std::fmt::Write;

use crate::recorder::MetricsSnapshot;

/// Render a metrics snapshot into Prometheus text format.
pub fn render_prometheus(s: &MetricsSnapshot) -> String {
    let mut out = String::new();

    metric(
        &mut out,
        "telemagg_ingestion_success_total",
        "counter",
        "Ingestion cycles that published a snapshot.",
        s.ingestion_success_total,
    );
    metric(
        &mut out,
        "telemagg_ingestion_failure_total",
        "counter",
        "Ingestion cycles that failed after retries or validation.",
        s.ingestion_failure_total,
    );

    out.push_str("# HELP telemagg_ingestion_failures_by_kind_total Failed cycles by error kind.\n");
    out.push_str("# TYPE telemagg_ingestion_failures_by_kind_total counter\n");
    for (kind, value) in s.failures_by_kind() {
        let _ = writeln!(
            out,
            "telemagg_ingestion_failures_by_kind_total{{kind=\"{}\"}} {value}",
            kind.label()
        );
    }

    metric(
        &mut out,
        "telemagg_last_fetch_latency_ms",
        "gauge",
        "Fetch latency of the last successful cycle in milliseconds.",
        format_args!("{:.3}", s.last_fetch_latency_ms),
    );
    metric(
        &mut out,
        "telemagg_last_parse_latency_ms",
        "gauge",
        "Parse latency of the last successful cycle in milliseconds.",
        format_args!("{:.3}", s.last_parse_latency_ms),
    );
    metric(
        &mut out,
        "telemagg_last_success_timestamp_seconds",
        "gauge",
        "Unix time of the last published snapshot (0 if none).",
        s.last_success_timestamp,
    );
    metric(
        &mut out,
        "telemagg_snapshot_entities",
        "gauge",
        "Entities in the current snapshot.",
        s.snapshot_entities,
    );
    metric(
        &mut out,
        "telemagg_ready",
        "gauge",
        "1 once the first snapshot has been published.",
        u8::from(s.is_ready),
    );

    out
}

fn metric(out: &mut String, name: &str, kind: &str, help: &str, value: impl std::fmt::Display) {
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} {kind}");
    let _ = writeln!(out, "{name} {value}");
}
