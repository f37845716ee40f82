//! Shared plumbing for the end-to-end tests: binds a socket to an OS-assigned
//! loopback port and hands back the connect string, so tests never race over fixed
//! ports. The default ports are for real deployments, not test isolation.

use std::time::Duration;

pub fn bind_any(socket: &zmq::Socket) -> anyhow::Result<String> {
    socket.bind("tcp://127.0.0.1:*")?;
    let endpoint = socket
        .get_last_endpoint()?
        .map_err(|raw| anyhow::anyhow!("non-utf8 last_endpoint: {raw:?}"))?;
    Ok(endpoint)
}

/// zmq's pub/sub filtering is applied asynchronously once a subscription frame
/// propagates over the wire; giving the connection a moment avoids the classic
/// "slow joiner" race where a publish beats the subscriber's handshake.
pub fn let_subscription_settle() {
    std::thread::sleep(Duration::from_millis(150));
}

pub fn send_json(socket: &zmq::Socket, value: &serde_json::Value) -> anyhow::Result<()> {
    socket.send(serde_json::to_vec(value)?, 0)?;
    Ok(())
}

pub fn recv_json_with_timeout(
    socket: &zmq::Socket,
    timeout_ms: i64,
) -> anyhow::Result<Option<serde_json::Value>> {
    let mut items = [socket.as_poll_item(zmq::POLLIN)];
    let ready = zmq::poll(&mut items, timeout_ms)?;
    if ready == 0 || !items[0].is_readable() {
        return Ok(None);
    }
    let bytes = socket.recv_bytes(0)?;
    Ok(Some(serde_json::from_slice(&bytes)?))
}
