//! Reference rider client: opens one synchronous request socket per ride request,
//! sends a single request, awaits one reply within the rider timeout, then closes.
//! `--requests-file` drives a sequence of such request/reply round trips instead of
//! a single one.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use serde_json::json;
use taxi_core::endpoints;
use taxi_sim::SimError;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug, Clone)]
#[command(name = "rider")]
struct RiderSimConfig {
    #[arg(long, env = "DISPATCHER_HOST", default_value = "127.0.0.1")]
    dispatcher_host: String,

    #[arg(long, env = "DISPATCHER_PORT", default_value_t = endpoints::PRIMARY_RIDER_PORT)]
    dispatcher_port: u16,

    /// A single request's rider id. Ignored if `--requests-file` is given.
    #[arg(long, default_value_t = 0)]
    id: u32,

    #[arg(long, default_value_t = 0)]
    x: i32,

    #[arg(long, default_value_t = 0)]
    y: i32,

    /// Lines of `id,x,y`, one ride request per line.
    #[arg(long)]
    requests_file: Option<PathBuf>,

    #[arg(long, default_value_t = endpoints::RIDER_REQUEST_TIMEOUT_SECS)]
    timeout_secs: u64,
}

struct PendingRequest {
    id: u32,
    x: i32,
    y: i32,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = RiderSimConfig::parse();
    let requests = load_requests(&cfg)?;
    let ctx = zmq::Context::new();
    let connect_addr = format!("tcp://{}:{}", cfg.dispatcher_host, cfg.dispatcher_port);
    let timeout_ms = (cfg.timeout_secs * 1_000) as i64;

    for request in requests {
        send_one(&ctx, &connect_addr, timeout_ms, request)?;
    }

    Ok(())
}

fn load_requests(cfg: &RiderSimConfig) -> anyhow::Result<Vec<PendingRequest>> {
    let Some(path) = &cfg.requests_file else {
        return Ok(vec![PendingRequest {
            id: cfg.id,
            x: cfg.x,
            y: cfg.y,
        }]);
    };

    let contents = fs::read_to_string(path)?;
    let mut requests = Vec::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = line.split(',').map(str::trim).collect();
        anyhow::ensure!(parts.len() == 3, "malformed requests-file line: {line}");
        requests.push(PendingRequest {
            id: parts[0].parse()?,
            x: parts[1].parse()?,
            y: parts[2].parse()?,
        });
    }
    Ok(requests)
}

/// One request/reply round trip over a freshly connected REQ socket.
fn send_one(
    ctx: &zmq::Context,
    connect_addr: &str,
    timeout_ms: i64,
    request: PendingRequest,
) -> Result<(), SimError> {
    let req = ctx.socket(zmq::REQ)?;
    req.set_linger(0)?;
    req.connect(connect_addr)?;

    let payload = json!({
        "tipo": "solicitud",
        "id_usuario": request.id,
        "posicion": [request.x, request.y],
        "tiempo_solicitud": now_secs(),
    });
    req.send(serde_json::to_vec(&payload)?, 0)?;

    let mut items = [req.as_poll_item(zmq::POLLIN)];
    let ready = zmq::poll(&mut items, timeout_ms)?;
    if ready == 0 || !items[0].is_readable() {
        tracing::warn!(event = "rider_sim.timeout", rider_id = request.id, "no reply within timeout");
        return Ok(());
    }

    let reply = req.recv_bytes(0)?;
    let reply: serde_json::Value = serde_json::from_slice(&reply)?;
    if reply.get("exito").and_then(|v| v.as_bool()).unwrap_or(false) {
        tracing::info!(
            event = "rider_sim.matched",
            rider_id = request.id,
            taxi_id = reply.get("taxi_id"),
            "ride request succeeded"
        );
    } else {
        tracing::info!(
            event = "rider_sim.rejected",
            rider_id = request.id,
            reason = ?reply.get("error"),
            "ride request failed"
        );
    }
    Ok(())
}

fn now_secs() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs() as i64
}
