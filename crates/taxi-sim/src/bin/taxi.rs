//! Reference taxi client: registers once, then alternates between a random walk on
//! the grid and servicing assignments it receives on its own topic. Exits once it
//! has completed `SERVICE_CAP` services.

use clap::Parser;
use rand::seq::SliceRandom;
use serde_json::json;
use taxi_core::{endpoints, routing, SERVICE_CAP, VALID_SPEEDS};
use taxi_sim::walk::{self, MOVES};
use taxi_sim::SimError;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug, Clone)]
#[command(name = "taxi")]
struct TaxiSimConfig {
    #[arg(long, env = "TAXI_ID")]
    id: u32,

    #[arg(long, env = "BROKER_HOST", default_value = "127.0.0.1")]
    broker_host: String,

    #[arg(long, env = "BROKER_FRONTEND_PORT", default_value_t = endpoints::BROKER_FRONTEND_PORT)]
    broker_frontend_port: u16,

    #[arg(long, env = "BROKER_BACKEND_PORT", default_value_t = endpoints::BROKER_BACKEND_PORT)]
    broker_backend_port: u16,

    #[arg(long, default_value_t = endpoints::GRID_N_DEFAULT)]
    grid_n: i32,

    #[arg(long, default_value_t = endpoints::GRID_M_DEFAULT)]
    grid_m: i32,

    #[arg(long, default_value_t = 2)]
    speed: u32,

    #[arg(long)]
    start_x: Option<i32>,

    #[arg(long)]
    start_y: Option<i32>,

    /// How often to take a random-walk step while idle.
    #[arg(long, default_value_t = 2_000)]
    tick_ms: i64,

    /// How long to simulate an in-progress service before reporting completion.
    #[arg(long, default_value_t = endpoints::NOMINAL_SERVICE_SECS)]
    service_secs: u64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = TaxiSimConfig::parse();
    if !VALID_SPEEDS.contains(&cfg.speed) {
        anyhow::bail!("speed {} is not one of {:?}", cfg.speed, VALID_SPEEDS);
    }

    run(cfg)
}

fn run(cfg: TaxiSimConfig) -> anyhow::Result<()> {
    let ctx = zmq::Context::new();

    let publisher = ctx.socket(zmq::PUB)?;
    publisher.connect(&format!(
        "tcp://{}:{}",
        cfg.broker_host, cfg.broker_frontend_port
    ))?;

    let subscriber = ctx.socket(zmq::SUB)?;
    subscriber.connect(&format!(
        "tcp://{}:{}",
        cfg.broker_host, cfg.broker_backend_port
    ))?;
    let own_topic = routing::taxi_topic(cfg.id);
    subscriber.set_subscribe(own_topic.as_bytes())?;

    let mut rng = rand::thread_rng();
    let mut position = (
        cfg.start_x.unwrap_or_else(|| rand_coord(&mut rng, cfg.grid_n)),
        cfg.start_y.unwrap_or_else(|| rand_coord(&mut rng, cfg.grid_m)),
    );
    let mut services_done = 0u32;

    publish(&publisher, routing::TOPIC_REGISTRO, &json!({
        "tipo": "registro",
        "id": cfg.id,
        "posicion": [position.0, position.1],
        "velocidad": cfg.speed,
    }))?;
    tracing::info!(event = "taxi_sim.registered", taxi_id = cfg.id, ?position, "taxi registered");

    loop {
        let mut items = [subscriber.as_poll_item(zmq::POLLIN)];
        let ready = zmq::poll(&mut items, cfg.tick_ms)?;

        if ready > 0 && items[0].is_readable() {
            let frames = subscriber.recv_multipart(0)?;
            if let Some(payload) = frames.get(1) {
                if let Ok(assignment) = serde_json::from_slice::<serde_json::Value>(payload) {
                    if assignment.get("taxi_id").and_then(|v| v.as_u64()) == Some(cfg.id as u64) {
                        services_done += 1;
                        tracing::info!(
                            event = "taxi_sim.servicing",
                            taxi_id = cfg.id,
                            services_done,
                            "assignment received, simulating service"
                        );
                        std::thread::sleep(std::time::Duration::from_secs(cfg.service_secs));

                        if let Some(pos) = assignment.get("pos_usuario").and_then(|v| v.as_array()) {
                            if let (Some(x), Some(y)) = (pos.first(), pos.get(1)) {
                                if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                                    position = (x as i32, y as i32);
                                }
                            }
                        }

                        publish_update(&publisher, cfg.id, position, false, services_done)?;

                        if services_done >= SERVICE_CAP {
                            tracing::info!(event = "taxi_sim.done", taxi_id = cfg.id, "service cap reached, exiting");
                            return Ok(());
                        }
                    }
                }
            }
            continue;
        }

        let delta = *MOVES.choose(&mut rng).expect("MOVES is non-empty");
        position = walk::step(position, delta, cfg.grid_n, cfg.grid_m);
        publish_update(&publisher, cfg.id, position, false, services_done)?;
    }
}

fn rand_coord(rng: &mut impl rand::Rng, max: i32) -> i32 {
    rng.gen_range(0..=max)
}

fn publish_update(
    publisher: &zmq::Socket,
    id: u32,
    position: (i32, i32),
    ocupado: bool,
    servicios: u32,
) -> Result<(), SimError> {
    publish(publisher, routing::TOPIC_ACTUALIZACION, &json!({
        "tipo": "actualizacion",
        "id": id,
        "posicion": [position.0, position.1],
        "ocupado": ocupado,
        "servicios": servicios,
        "timestamp": now_as_f64(),
    }))
}

fn publish(publisher: &zmq::Socket, topic: &str, payload: &serde_json::Value) -> Result<(), SimError> {
    let bytes = serde_json::to_vec(payload)?;
    publisher.send_multipart([topic.as_bytes(), &bytes], 0)?;
    Ok(())
}

fn now_as_f64() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs_f64()
}
