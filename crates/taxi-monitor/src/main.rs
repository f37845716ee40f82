use clap::Parser;
use taxi_monitor::state::Action;
use taxi_monitor::{probe, MonitorConfig, MonitorState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = MonitorConfig::parse();
    run(cfg).await
}

async fn run(cfg: MonitorConfig) -> anyhow::Result<()> {
    let ctx = zmq::Context::new();
    let primary_addr = cfg.primary_connect();
    let standby_addr = cfg.standby_connect();
    let timeout_ms = cfg.probe_timeout_ms as i64;
    let mut interval = tokio::time::interval(std::time::Duration::from_millis(cfg.probe_interval_ms));
    let mut state = MonitorState::new();

    tracing::info!(
        event = "taxi_monitor.started",
        primary = %primary_addr,
        standby = %standby_addr,
        "health monitor starting"
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                probe_round(&ctx, &primary_addr, &standby_addr, timeout_ms, &mut state);
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!(event = "taxi_monitor.shutting_down", "ctrl-c received");
                break;
            }
        }
    }

    Ok(())
}

fn probe_round(
    ctx: &zmq::Context,
    primary_addr: &str,
    standby_addr: &str,
    timeout_ms: i64,
    state: &mut MonitorState,
) {
    let was_up = state.primary_up();
    let success = probe::probe_once(ctx, primary_addr, timeout_ms);
    let action = state.observe_probe(success);

    if was_up != state.primary_up() {
        tracing::info!(
            event = "taxi_monitor.primary_up.changed",
            from = was_up,
            to = state.primary_up(),
            "primary liveness changed"
        );
    } else if !success {
        tracing::debug!(event = "taxi_monitor.probe.timeout", "primary probe failed, no state change");
    }

    if action == Action::SendActivate {
        tracing::info!(event = "taxi_monitor.activate.sending", standby = %standby_addr, "notifying standby");
        if probe::send_activate(ctx, standby_addr, timeout_ms) {
            state.mark_standby_notified();
            tracing::info!(event = "taxi_monitor.activate.acked", "standby acknowledged activation");
        } else {
            tracing::warn!(
                event = "taxi_monitor.activate.unacked",
                "standby did not acknowledge activation; will retry if primary fails again"
            );
        }
    }
}
