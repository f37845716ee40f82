use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use taxi_core::DispatchState;
use taxi_dispatcher::{activation, config::Role, ingest, probe_reply, request, DispatcherConfig};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = DispatcherConfig::parse();
    run(cfg).await
}

async fn run(cfg: DispatcherConfig) -> anyhow::Result<()> {
    let ctx = zmq::Context::new();
    let state = Arc::new(DispatchState::new(cfg.role.born_active()));
    let shutdown = Arc::new(AtomicBool::new(false));

    tracing::info!(
        event = "taxi_dispatcher.started",
        role = ?cfg.role,
        active = state.is_active(),
        "dispatcher starting"
    );

    let mut tasks: Vec<JoinHandle<anyhow::Result<()>>> = Vec::new();

    // Ingest runs immediately regardless of role, keeping the standby's fleet
    // mirror warm while it waits for activation.
    tasks.push(spawn_blocking_task("ingest", {
        let ctx = ctx.clone();
        let state = state.clone();
        let shutdown = shutdown.clone();
        let addr = cfg.broker_backend_connect();
        move || ingest::run(&ctx, &addr, state, shutdown)
    }));

    match cfg.role {
        Role::Primary => {
            tasks.push(spawn_blocking_task("request", {
                let ctx = ctx.clone();
                let state = state.clone();
                let shutdown = shutdown.clone();
                let rider_bind = cfg.rider_bind();
                let broker_front = cfg.broker_frontend_connect();
                move || request::run(&ctx, &rider_bind, &broker_front, state, shutdown)
            }));

            tasks.push(spawn_blocking_task("probe_reply", {
                let ctx = ctx.clone();
                let shutdown = shutdown.clone();
                let health_bind = cfg.health_bind();
                move || probe_reply::run(&ctx, &health_bind, shutdown)
            }));
        }
        Role::Standby => {
            let activated = Arc::new(Notify::new());

            tasks.push(spawn_blocking_task("activation", {
                let ctx = ctx.clone();
                let state = state.clone();
                let shutdown = shutdown.clone();
                let activated = activated.clone();
                let health_bind = cfg.health_bind();
                move || activation::run(&ctx, &health_bind, state, activated, shutdown)
            }));

            // The rider-request endpoint stays unbound until activation: the
            // standby must not reply to ride requests before that point.
            let ctx_for_request = ctx.clone();
            let state_for_request = state.clone();
            let shutdown_for_request = shutdown.clone();
            let rider_bind = cfg.rider_bind();
            let broker_front = cfg.broker_frontend_connect();
            tasks.push(tokio::spawn(async move {
                activated.notified().await;
                tracing::info!(event = "taxi_dispatcher.request.activating", "binding rider endpoint after activation");
                tokio::task::spawn_blocking(move || {
                    request::run(
                        &ctx_for_request,
                        &rider_bind,
                        &broker_front,
                        state_for_request,
                        shutdown_for_request,
                    )
                    .map_err(anyhow::Error::from)
                })
                .await
                .context("join request task")?
            }));
        }
    }

    tokio::signal::ctrl_c().await.context("wait for ctrl-c")?;
    tracing::info!(event = "taxi_dispatcher.shutting_down", "ctrl-c received");
    shutdown.store(true, Ordering::Relaxed);

    for task in tasks {
        if let Err(err) = task.await {
            tracing::warn!(event = "taxi_dispatcher.task_join_error", error = %err, "task join error");
        }
    }

    Ok(())
}

fn spawn_blocking_task<F>(name: &'static str, f: F) -> JoinHandle<anyhow::Result<()>>
where
    F: FnOnce() -> Result<(), taxi_dispatcher::DispatchBinError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        f().with_context(|| format!("{name} task failed"))
    })
}
