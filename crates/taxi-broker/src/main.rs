//! Broker: accepts published messages on a frontend endpoint and fans them out to
//! subscribers on a backend endpoint, rewriting the topic frame per `tipo` and
//! forwarding subscription control frames backward so publishers learn the
//! subscription set. This is a pure proxy: no queue beyond the transport's built-in
//! buffer, and a crash is a total outage with no redundancy.

mod config;

use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use taxi_broker::{route_publish_frame, FrameOutcome, ProxyStats};
use tracing_subscriber::EnvFilter;

use config::BrokerConfig;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = BrokerConfig::parse();
    run(&cfg)
}

fn run(cfg: &BrokerConfig) -> anyhow::Result<()> {
    let ctx = zmq::Context::new();

    let frontend = ctx
        .socket(zmq::XSUB)
        .context("create frontend (XSUB) socket")?;
    frontend
        .bind(&cfg.frontend_bind())
        .with_context(|| format!("bind frontend to {}", cfg.frontend_bind()))?;

    let backend = ctx
        .socket(zmq::XPUB)
        .context("create backend (XPUB) socket")?;
    backend
        .bind(&cfg.backend_bind())
        .with_context(|| format!("bind backend to {}", cfg.backend_bind()))?;

    tracing::info!(
        event = "taxi_broker.started",
        frontend = %cfg.frontend_bind(),
        backend = %cfg.backend_bind(),
        "broker listening"
    );

    let stats_interval = Duration::from_millis(cfg.stats_interval_ms);
    let mut stats = ProxyStats::default();
    let mut last_report = Instant::now();
    let poll_timeout_ms = stats_interval.as_millis().min(1_000) as i64;

    loop {
        let mut items = [
            frontend.as_poll_item(zmq::POLLIN),
            backend.as_poll_item(zmq::POLLIN),
        ];
        let ready = zmq::poll(&mut items, poll_timeout_ms).context("poll broker sockets")?;

        if ready > 0 {
            if items[0].is_readable() {
                forward_publish(&frontend, &backend, &mut stats)?;
            }
            if items[1].is_readable() {
                forward_subscription(&backend, &frontend)?;
            }
        }

        if last_report.elapsed() >= stats_interval {
            tracing::info!(
                event = "taxi_broker.stats",
                rewritten = stats.rewritten,
                forwarded_unchanged = stats.forwarded_unchanged,
                malformed = stats.malformed,
                "broker stats"
            );
            last_report = Instant::now();
        }
    }
}

/// One frame pair off the frontend: rewrite the topic (or forward unchanged) and
/// republish on the backend. Never drops a message.
fn forward_publish(
    frontend: &zmq::Socket,
    backend: &zmq::Socket,
    stats: &mut ProxyStats,
) -> anyhow::Result<()> {
    let frames = frontend.recv_multipart(0).context("recv frontend frame")?;

    if frames.len() < 2 {
        tracing::warn!(
            event = "taxi_broker.malformed_frame",
            frame_count = frames.len(),
            "publish frame missing topic or payload; forwarding unchanged"
        );
        backend
            .send_multipart(frames, 0)
            .context("forward malformed frame to backend")?;
        return Ok(());
    }

    let outcome = route_publish_frame(&frames[1]);
    stats.record(&outcome);

    match outcome {
        FrameOutcome::Rewritten(new_topic) => {
            backend
                .send_multipart([new_topic, frames[1].clone()], 0)
                .context("forward rewritten frame to backend")?;
        }
        FrameOutcome::ForwardUnchanged => {
            backend
                .send_multipart(frames, 0)
                .context("forward frame unchanged to backend")?;
        }
        FrameOutcome::Malformed => {
            tracing::warn!(
                event = "taxi_broker.malformed_payload",
                payload = %String::from_utf8_lossy(&frames[1][..frames[1].len().min(256)]),
                "payload is not valid JSON or missing tipo; forwarding unchanged"
            );
            backend
                .send_multipart(frames, 0)
                .context("forward malformed payload to backend")?;
        }
    }
    Ok(())
}

/// Subscription control frames (subscribe/unsubscribe) arriving on the backend are
/// forwarded verbatim to the frontend, pure proxy semantics.
fn forward_subscription(backend: &zmq::Socket, frontend: &zmq::Socket) -> anyhow::Result<()> {
    let frames = backend.recv_multipart(0).context("recv backend frame")?;
    frontend
        .send_multipart(frames, 0)
        .context("forward subscription frame to frontend")?;
    Ok(())
}
