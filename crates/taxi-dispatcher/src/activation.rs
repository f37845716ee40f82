//! Activation task, standby only: acknowledges `"activate"`, flips `active`, and
//! wakes the rider-request task so it binds for the first time. Activation is
//! idempotent: repeated `"activate"` messages are acknowledged but the wake-up
//! notification only matters the first time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use taxi_core::DispatchState;
use tokio::sync::Notify;

use crate::error::DispatchBinError;

const POLL_TIMEOUT_MS: i64 = 200;

pub fn run(
    ctx: &zmq::Context,
    bind_addr: &str,
    state: Arc<DispatchState>,
    activated: Arc<Notify>,
    shutdown: Arc<AtomicBool>,
) -> Result<(), DispatchBinError> {
    let rep = ctx.socket(zmq::REP)?;
    rep.bind(bind_addr)?;

    tracing::info!(event = "taxi_dispatcher.activation.started", addr = %bind_addr, "activation endpoint bound");

    while !shutdown.load(Ordering::Relaxed) {
        let mut items = [rep.as_poll_item(zmq::POLLIN)];
        let ready = zmq::poll(&mut items, POLL_TIMEOUT_MS)?;
        if ready == 0 || !items[0].is_readable() {
            continue;
        }

        let msg = rep.recv_bytes(0)?;
        if msg == b"activate" {
            rep.send("OK", 0)?;
            if state.activate() {
                tracing::info!(event = "taxi_dispatcher.activation.activated", "standby activated");
                activated.notify_one();
            } else {
                tracing::debug!(event = "taxi_dispatcher.activation.repeat", "activation already applied");
            }
        } else {
            tracing::warn!(event = "taxi_dispatcher.activation.unexpected", "unexpected activation payload");
            rep.send("OK", 0)?;
        }
    }

    tracing::info!(event = "taxi_dispatcher.activation.stopped", "activation endpoint stopped");
    Ok(())
}
