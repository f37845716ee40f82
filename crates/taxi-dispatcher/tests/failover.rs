//! Failover integration test: a standby dispatcher ingests fleet state over the wire
//! while inactive, is activated, and then must serve a ride request correctly using
//! state it converged on its own — not state the test handed it directly.

mod support;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::json;
use taxi_core::DispatchState;
use taxi_dispatcher::{activation, ingest, request};
use tokio::sync::Notify;

#[tokio::test]
async fn standby_activates_and_serves_with_ingested_state() -> anyhow::Result<()> {
    let ctx = zmq::Context::new();
    let state = Arc::new(DispatchState::new(false));
    let shutdown = Arc::new(AtomicBool::new(false));

    // Broker backend stand-in: the standby's ingest task connects here.
    let fleet_publisher = ctx.socket(zmq::PUB)?;
    let ingest_addr = support::bind_any(&fleet_publisher)?;

    // Broker frontend stand-in: the standby's eventual request task publishes
    // assignments here once activated.
    let broker_frontend_catcher = ctx.socket(zmq::SUB)?;
    let frontend_addr = support::bind_any(&broker_frontend_catcher)?;
    broker_frontend_catcher.set_subscribe(b"")?;

    let ingest_task = {
        let ctx = ctx.clone();
        let state = state.clone();
        let shutdown = shutdown.clone();
        let ingest_addr = ingest_addr.clone();
        tokio::task::spawn_blocking(move || ingest::run(&ctx, &ingest_addr, state, shutdown).unwrap())
    };

    support::let_subscription_settle();

    // Fleet state arrives on the wire while the standby is still inactive: this is
    // what "the standby's fleet mirror stays warm" actually means, so the test
    // proves it instead of asserting it.
    fleet_publisher.send_multipart(
        [
            taxi_core::routing::TOPIC_REGISTRO.as_bytes().to_vec(),
            serde_json::to_vec(&json!({
                "tipo": "registro",
                "id": 1,
                "posicion": [5, 5],
                "velocidad": 2,
            }))?,
        ],
        0,
    )?;

    // Poll until ingest has actually applied it before activating, rather than
    // sleeping a guessed duration.
    wait_until(|| state.snapshot().contains_key(&1)).await?;

    // Fixed rather than OS-assigned: activation::run binds this address itself, and
    // a bind-drop-rebind trick to discover a free port first is racy (another
    // process could grab it in between).
    let activation_addr = "tcp://127.0.0.1:19105".to_owned();

    let activation_task = {
        let ctx = ctx.clone();
        let state = state.clone();
        let shutdown = shutdown.clone();
        let activated = Arc::new(Notify::new());
        let activation_addr = activation_addr.clone();
        let activated_for_request = activated.clone();

        // Mirrors main.rs's standby wiring: the request task stays unbound until
        // the activation task wakes it.
        let rider_port = 19_005;
        let rider_bind = format!("tcp://127.0.0.1:{rider_port}");
        let ctx_for_request = ctx.clone();
        let state_for_request = state.clone();
        let shutdown_for_request = shutdown.clone();
        let frontend_addr_for_request = frontend_addr.clone();
        let request_task = tokio::spawn(async move {
            activated_for_request.notified().await;
            tokio::task::spawn_blocking(move || {
                request::run(
                    &ctx_for_request,
                    &rider_bind,
                    &frontend_addr_for_request,
                    state_for_request,
                    shutdown_for_request,
                )
                .unwrap()
            })
            .await
            .unwrap();
        });

        let activation_handle = tokio::task::spawn_blocking(move || {
            activation::run(&ctx, &activation_addr, state, activated, shutdown).unwrap()
        });

        (activation_handle, request_task)
    };

    // Not yet activated: a ride request against the (not-yet-bound) standby rider
    // port must fail to connect/serve. Skipped here — zmq REQ sockets queue rather
    // than fail, and the real assertion is the positive case below; the negative
    // "standby does not reply before activation" property is exercised by
    // activation's own behavior (state.is_active() stays false) and covered at the
    // unit level in taxi-core's `try_assign_on_inactive_dispatcher_fails...` test.

    let activator = ctx.socket(zmq::REQ)?;
    activator.connect(&activation_addr)?;
    activator.send("activate", 0)?;
    let ack = support::recv_json_with_timeout(&activator, 2_000);
    // The ack is the literal string "OK", not JSON; just drain it off the wire.
    let _ = ack;

    wait_until(|| state.is_active()).await?;

    // Give the activation notification a moment to propagate to the request task
    // and for its bind to complete.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    let rider = ctx.socket(zmq::REQ)?;
    rider.connect("tcp://127.0.0.1:19005")?;
    support::send_json(
        &rider,
        &json!({
            "tipo": "solicitud",
            "id_usuario": 42,
            "posicion": [5, 7],
            "tiempo_solicitud": 0,
        }),
    )?;
    let reply = support::recv_json_with_timeout(&rider, 5_000)?
        .ok_or_else(|| anyhow::anyhow!("no reply from activated standby"))?;
    anyhow::ensure!(reply["exito"] == json!(true), "expected success, got {reply}");
    anyhow::ensure!(reply["taxi_id"] == json!(1));

    shutdown.store(true, Ordering::Relaxed);
    let _ = ingest_task.await;
    let _ = activation_task.0.await;
    let _ = activation_task.1.await;
    Ok(())
}

async fn wait_until(mut predicate: impl FnMut() -> bool) -> anyhow::Result<()> {
    for _ in 0..100 {
        if predicate() {
            return Ok(());
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    anyhow::bail!("condition never became true within timeout")
}
