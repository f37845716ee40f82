//! Drives one REQ/REP probe round-trip against the primary's health endpoint, with a
//! hard timeout; any non-reply or error counts as a failure. A fresh REQ socket is
//! used per round: ZeroMQ's REQ state machine does not tolerate a timed-out request
//! being abandoned mid-flight on a reused socket.

use crate::error::MonitorError;

pub fn probe_once(ctx: &zmq::Context, connect_addr: &str, timeout_ms: i64) -> bool {
    match try_probe(ctx, connect_addr, timeout_ms) {
        Ok(ok) => ok,
        Err(err) => {
            tracing::debug!(event = "taxi_monitor.probe.error", error = %err, "probe failed");
            false
        }
    }
}

fn try_probe(ctx: &zmq::Context, connect_addr: &str, timeout_ms: i64) -> Result<bool, MonitorError> {
    let req = ctx.socket(zmq::REQ)?;
    req.set_linger(0)?;
    req.connect(connect_addr)?;
    req.send("ping", 0)?;

    let mut items = [req.as_poll_item(zmq::POLLIN)];
    let ready = zmq::poll(&mut items, timeout_ms)?;
    if ready == 0 || !items[0].is_readable() {
        return Ok(false);
    }

    let reply = req.recv_bytes(0)?;
    Ok(reply == b"OK")
}

/// Sends `"activate"` to the standby's activation endpoint and waits for `"OK"`,
/// within `timeout_ms`. Returns whether the send was acknowledged; callers only
/// mark the standby notified once this returns true.
pub fn send_activate(ctx: &zmq::Context, connect_addr: &str, timeout_ms: i64) -> bool {
    match try_send_activate(ctx, connect_addr, timeout_ms) {
        Ok(ok) => ok,
        Err(err) => {
            tracing::warn!(event = "taxi_monitor.activate.error", error = %err, "failed to notify standby");
            false
        }
    }
}

fn try_send_activate(
    ctx: &zmq::Context,
    connect_addr: &str,
    timeout_ms: i64,
) -> Result<bool, MonitorError> {
    let req = ctx.socket(zmq::REQ)?;
    req.set_linger(0)?;
    req.connect(connect_addr)?;
    req.send("activate", 0)?;

    let mut items = [req.as_poll_item(zmq::POLLIN)];
    let ready = zmq::poll(&mut items, timeout_ms)?;
    if ready == 0 || !items[0].is_readable() {
        return Ok(false);
    }

    let reply = req.recv_bytes(0)?;
    Ok(reply == b"OK")
}
