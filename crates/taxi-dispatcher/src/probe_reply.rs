//! Health-probe-reply task, primary only: answers the health monitor's `"ping"`
//! with `"OK"`. Any protocol violation just gets no reply and the monitor's timeout
//! will fire; this endpoint does no validation of its own.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::DispatchBinError;

const POLL_TIMEOUT_MS: i64 = 200;

pub fn run(
    ctx: &zmq::Context,
    bind_addr: &str,
    shutdown: Arc<AtomicBool>,
) -> Result<(), DispatchBinError> {
    let rep = ctx.socket(zmq::REP)?;
    rep.bind(bind_addr)?;

    tracing::info!(event = "taxi_dispatcher.probe_reply.started", addr = %bind_addr, "health probe endpoint bound");

    while !shutdown.load(Ordering::Relaxed) {
        let mut items = [rep.as_poll_item(zmq::POLLIN)];
        let ready = zmq::poll(&mut items, POLL_TIMEOUT_MS)?;
        if ready == 0 || !items[0].is_readable() {
            continue;
        }

        let msg = rep.recv_bytes(0)?;
        if msg == b"ping" {
            rep.send("OK", 0)?;
        } else {
            tracing::warn!(event = "taxi_dispatcher.probe_reply.unexpected", "unexpected probe payload");
            rep.send("OK", 0)?;
        }
    }

    tracing::info!(event = "taxi_dispatcher.probe_reply.stopped", "health probe endpoint stopped");
    Ok(())
}
