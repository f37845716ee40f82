//! Ingestion loop: consumes `[topic, payload]` messages from the broker and
//! mutates the shared fleet state. Runs identically for primary and standby; it is
//! what keeps the standby's fleet mirror warm while it waits for activation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use taxi_core::protocol::Inbound;
use taxi_core::routing::{TOPIC_ACTUALIZACION, TOPIC_REGISTRO};
use taxi_core::{CoreError, DispatchState};

use crate::error::DispatchBinError;

const POLL_TIMEOUT_MS: i64 = 200;

pub fn run(
    ctx: &zmq::Context,
    connect_addr: &str,
    state: Arc<DispatchState>,
    shutdown: Arc<AtomicBool>,
) -> Result<(), DispatchBinError> {
    let sub = ctx.socket(zmq::SUB)?;
    sub.connect(connect_addr)?;
    sub.set_subscribe(TOPIC_REGISTRO.as_bytes())?;
    sub.set_subscribe(TOPIC_ACTUALIZACION.as_bytes())?;

    tracing::info!(
        event = "taxi_dispatcher.ingest.started",
        broker = %connect_addr,
        "ingest loop subscribed to REGISTRO, ACTUALIZACION"
    );

    while !shutdown.load(Ordering::Relaxed) {
        let mut items = [sub.as_poll_item(zmq::POLLIN)];
        let ready = zmq::poll(&mut items, POLL_TIMEOUT_MS)?;
        if ready == 0 || !items[0].is_readable() {
            continue;
        }

        let frames = sub.recv_multipart(0)?;
        let Some(payload) = frames.get(1) else {
            tracing::warn!(
                event = "taxi_dispatcher.ingest.malformed_frame",
                frame_count = frames.len(),
                "ingest frame missing payload; dropping"
            );
            continue;
        };

        handle_payload(&state, payload);
    }

    tracing::info!(event = "taxi_dispatcher.ingest.stopped", "ingest loop stopped");
    Ok(())
}

fn handle_payload(state: &DispatchState, payload: &[u8]) {
    match Inbound::parse(payload) {
        Ok(Inbound::Register(msg)) => {
            state.register(msg.id, msg.posicion, msg.velocidad);
            tracing::debug!(event = "taxi_dispatcher.ingest.registro", taxi_id = msg.id, "taxi registered");
        }
        Ok(Inbound::Update(msg)) => {
            match state.apply_update(msg.id, msg.posicion, msg.ocupado, msg.servicios) {
                Ok(()) => {
                    tracing::debug!(
                        event = "taxi_dispatcher.ingest.actualizacion",
                        taxi_id = msg.id,
                        "taxi position updated"
                    );
                }
                Err(CoreError::UnknownTaxi(id)) => {
                    tracing::warn!(
                        event = "taxi_dispatcher.ingest.unknown_taxi",
                        taxi_id = id,
                        "update for unknown taxi dropped, not creating a ghost record"
                    );
                }
                Err(other) => {
                    tracing::warn!(event = "taxi_dispatcher.ingest.error", error = %other, "update error");
                }
            }
        }
        Ok(Inbound::Assignment(_)) | Ok(Inbound::RideRequest(_)) => {
            tracing::debug!(
                event = "taxi_dispatcher.ingest.unexpected_tipo",
                "dispatcher is not subscribed to assignment/ride-request topics; ignoring"
            );
        }
        Ok(Inbound::Unknown { tipo, .. }) => {
            tracing::warn!(event = "taxi_dispatcher.ingest.unknown_tipo", tipo = %tipo, "dropping");
        }
        Err(err) => {
            tracing::warn!(event = "taxi_dispatcher.ingest.parse_error", error = %err, "dropping malformed message");
        }
    }
}
