//! Rider request handler: one logical REQ/REP loop, serving requests one at a time.
//! Strict req/rep pairing: every request is read to completion and answered exactly
//! once before the next `recv` happens.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use taxi_core::protocol::{RideReplyErr, RideReplyOk, RideRequestMsg};
use taxi_core::routing::taxi_topic;
use taxi_core::{AssignError, DispatchState};

use crate::error::DispatchBinError;
use crate::time::now_secs;

const POLL_TIMEOUT_MS: i64 = 200;

pub fn run(
    ctx: &zmq::Context,
    rider_bind_addr: &str,
    broker_frontend_connect: &str,
    state: Arc<DispatchState>,
    shutdown: Arc<AtomicBool>,
) -> Result<(), DispatchBinError> {
    let rep = ctx.socket(zmq::REP)?;
    rep.bind(rider_bind_addr)?;

    // The dispatcher is itself a publisher to the broker: it publishes assignments
    // on the per-taxi topic.
    let pub_sock = ctx.socket(zmq::PUB)?;
    pub_sock.connect(broker_frontend_connect)?;

    tracing::info!(
        event = "taxi_dispatcher.request.started",
        addr = %rider_bind_addr,
        "rider request endpoint bound"
    );

    while !shutdown.load(Ordering::Relaxed) {
        let mut items = [rep.as_poll_item(zmq::POLLIN)];
        let ready = zmq::poll(&mut items, POLL_TIMEOUT_MS)?;
        if ready == 0 || !items[0].is_readable() {
            continue;
        }

        let payload = rep.recv_bytes(0)?;
        let reply = handle_request(&payload, &pub_sock, &state);
        rep.send(reply, 0)?;
    }

    tracing::info!(event = "taxi_dispatcher.request.stopped", "rider request loop stopped");
    Ok(())
}

fn handle_request(payload: &[u8], pub_sock: &zmq::Socket, state: &DispatchState) -> Vec<u8> {
    let request: RideRequestMsg = match serde_json::from_slice(payload) {
        Ok(req) => req,
        Err(err) => {
            tracing::warn!(event = "taxi_dispatcher.request.decode_error", error = %err, "malformed ride request");
            return serde_json::to_vec(&RideReplyErr::new("malformed_request")).unwrap();
        }
    };

    let now = now_secs();
    match state.try_assign(request.id_usuario, request.posicion, now) {
        Ok(assignment) => {
            publish_assignment(pub_sock, &assignment);
            tracing::info!(
                event = "taxi_dispatcher.request.assigned",
                rider_id = request.id_usuario,
                taxi_id = assignment.taxi_id,
                "rider matched"
            );
            serde_json::to_vec(&RideReplyOk::new(
                assignment.taxi_id,
                assignment.taxi_position_at_assignment,
            ))
            .unwrap()
        }
        Err(err) => {
            let reason = match err {
                AssignError::NotActive => "inactive",
                AssignError::NoTaxi => "no_taxi",
                AssignError::Race => "race",
            };
            tracing::debug!(
                event = "taxi_dispatcher.request.rejected",
                rider_id = request.id_usuario,
                reason,
                "no assignment made"
            );
            serde_json::to_vec(&RideReplyErr::new(reason)).unwrap()
        }
    }
}

fn publish_assignment(pub_sock: &zmq::Socket, assignment: &taxi_core::Assignment) {
    let topic = taxi_topic(assignment.taxi_id);
    let payload = serde_json::json!({
        "tipo": "servicio_asignado",
        "taxi_id": assignment.taxi_id,
        "pos_usuario": assignment.rider_position,
        "id_usuario": assignment.rider_id,
    });
    let payload_bytes = serde_json::to_vec(&payload).expect("assignment payload always serializes");
    if let Err(err) = pub_sock.send_multipart([topic.into_bytes(), payload_bytes], 0) {
        tracing::warn!(
            event = "taxi_dispatcher.request.publish_error",
            taxi_id = assignment.taxi_id,
            error = %err,
            "failed to publish assignment"
        );
    }
}
