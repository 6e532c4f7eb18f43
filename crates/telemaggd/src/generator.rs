//! `telemaggd generate` — synthetic upstream for local development.
//!
//! Serves `GET /counters` as a CSV matrix of switch counters, regenerated
//! on every request. A simulation mode can make the endpoint fail, stall,
//! or return a truncated payload so the aggregator's retry and validation
//! paths can be exercised by hand.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use clap::Args;
use rand::Rng;
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::{info, warn};

const SWITCH_PREFIX: &str = "SW-";
const METRICS: [&str; 4] = [
    "Bandwidth_Rx_Gbps",
    "Latency_Avg_uSec",
    "Error_CRC_Count",
    "Port_Status",
];
const SLOW_DELAY: Duration = Duration::from_secs(5);
const SPIKE_CHANCE: f64 = 0.05;
const PORT_DOWN_CHANCE: f64 = 0.02;

#[derive(Args)]
pub struct GenerateArgs {
    /// Address to serve `/counters` on.
    #[arg(long, default_value = "127.0.0.1:9001")]
    listen: String,

    /// Number of switches in each payload.
    #[arg(long, default_value_t = 50)]
    switches: usize,

    /// Sticky simulation mode: normal, error500, slow, corrupt.
    #[arg(long, default_value = "normal")]
    mode: SimulationMode,
}

/// How `/counters` misbehaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationMode {
    Normal,
    /// Respond with HTTP 500.
    Error500,
    /// Delay the response by five seconds.
    Slow,
    /// Cut 50–100 bytes off the end of the payload.
    Corrupt,
}

impl FromStr for SimulationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['_', '-'], "").as_str() {
            "normal" => Ok(Self::Normal),
            "error500" | "error" => Ok(Self::Error500),
            "slow" => Ok(Self::Slow),
            "corrupt" => Ok(Self::Corrupt),
            other => Err(format!(
                "unknown mode '{other}', expected normal, error500, slow or corrupt"
            )),
        }
    }
}

impl fmt::Display for SimulationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Normal => "normal",
            Self::Error500 => "error500",
            Self::Slow => "slow",
            Self::Corrupt => "corrupt",
        })
    }
}

#[derive(Debug, Clone)]
struct GeneratorState {
    switches: usize,
    sticky: SimulationMode,
}

#[derive(Debug, Deserialize)]
struct CountersQuery {
    mode: Option<String>,
}

pub async fn run(args: GenerateArgs) -> anyhow::Result<()> {
    let app = router(args.switches, args.mode);
    let listener = TcpListener::bind(&args.listen)
        .await
        .with_context(|| format!("failed to bind {}", args.listen))?;

    info!(
        address = %args.listen,
        switches = args.switches,
        mode = %args.mode,
        "generator listening on /counters"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(crate::serve::shutdown_signal())
        .await?;
    Ok(())
}

fn router(switches: usize, sticky: SimulationMode) -> Router {
    Router::new()
        .route("/counters", get(counters))
        .with_state(Arc::new(GeneratorState { switches, sticky }))
}

/// A query mode other than `normal` wins over the sticky one.
fn effective_mode(query: Option<&str>, sticky: SimulationMode) -> SimulationMode {
    match query.map(str::parse::<SimulationMode>) {
        Some(Ok(SimulationMode::Normal)) | None => sticky,
        Some(Ok(mode)) => mode,
        Some(Err(e)) => {
            warn!(error = %e, "ignoring mode query parameter");
            sticky
        }
    }
}

async fn counters(
    State(state): State<Arc<GeneratorState>>,
    Query(query): Query<CountersQuery>,
) -> Response {
    let mode = effective_mode(query.mode.as_deref(), state.sticky);

    match mode {
        SimulationMode::Error500 => {
            info!("simulating HTTP 500");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Simulated Internal Server Error",
            )
                .into_response();
        }
        SimulationMode::Slow => {
            info!(delay_secs = SLOW_DELAY.as_secs(), "simulating slow upstream");
            tokio::time::sleep(SLOW_DELAY).await;
        }
        SimulationMode::Normal | SimulationMode::Corrupt => {}
    }

    let mut body = render_csv(state.switches, &mut rand::rng());
    if mode == SimulationMode::Corrupt {
        let cut = rand::rng().random_range(50..=100);
        body.truncate(body.len().saturating_sub(cut));
        info!(cut, "serving truncated payload");
    }

    ([(header::CONTENT_TYPE, "text/csv")], body).into_response()
}

/// Render one fresh matrix: a `switch_id` header followed by one row per switch.
fn render_csv<R: Rng>(switches: usize, rng: &mut R) -> String {
    let mut out = format!("switch_id,{}\n", METRICS.join(","));

    for i in 0..switches {
        let bandwidth = rng.random_range(0.0..=100.0);
        let (latency, errors) = if rng.random_bool(SPIKE_CHANCE) {
            (rng.random_range(1000.0..=5000.0), rng.random_range(500..=1000))
        } else {
            (rng.random_range(1.0..=500.0), rng.random_range(0..=10))
        };
        let status = if rng.random_bool(PORT_DOWN_CHANCE) {
            "DOWN"
        } else {
            "UP"
        };

        out.push_str(&format!(
            "{SWITCH_PREFIX}{i:02},{bandwidth:.1},{latency:.1},{errors},{status}\n"
        ));
    }
    out
}
