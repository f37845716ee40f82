use clap::Parser;
use taxi_core::endpoints;

/// Broker configuration. Parsed once at startup.
#[derive(Parser, Debug, Clone)]
#[command(name = "taxi-broker")]
pub struct BrokerConfig {
    /// Port publishers bind/connect to (taxis and the dispatcher's assignment publish).
    #[arg(long, env = "BROKER_FRONTEND_PORT", default_value_t = endpoints::BROKER_FRONTEND_PORT)]
    pub frontend_port: u16,

    /// Port subscribers connect to (both dispatchers).
    #[arg(long, env = "BROKER_BACKEND_PORT", default_value_t = endpoints::BROKER_BACKEND_PORT)]
    pub backend_port: u16,

    /// Interval between periodic stats log lines.
    #[arg(long, env = "BROKER_STATS_INTERVAL_MS", default_value_t = 10_000)]
    pub stats_interval_ms: u64,
}

impl BrokerConfig {
    pub fn frontend_bind(&self) -> String {
        format!("tcp://*:{}", self.frontend_port)
    }

    pub fn backend_bind(&self) -> String {
        format!("tcp://*:{}", self.backend_port)
    }
}
