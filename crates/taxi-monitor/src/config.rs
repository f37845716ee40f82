use clap::Parser;
use taxi_core::endpoints;

/// Health monitor configuration.
#[derive(Parser, Debug, Clone)]
#[command(name = "taxi-monitor")]
pub struct MonitorConfig {
    #[arg(long, env = "PRIMARY_HOST", default_value = "127.0.0.1")]
    pub primary_host: String,

    #[arg(long, env = "HEALTH_PROBE_PORT", default_value_t = endpoints::HEALTH_PROBE_PORT)]
    pub primary_health_port: u16,

    #[arg(long, env = "STANDBY_HOST", default_value = "127.0.0.1")]
    pub standby_host: String,

    #[arg(long, env = "ACTIVATION_PORT", default_value_t = endpoints::ACTIVATION_PORT)]
    pub standby_activation_port: u16,

    #[arg(long, env = "PROBE_INTERVAL_MS", default_value_t = endpoints::PROBE_INTERVAL_MS)]
    pub probe_interval_ms: u64,

    #[arg(long, env = "PROBE_TIMEOUT_MS", default_value_t = endpoints::PROBE_TIMEOUT_MS)]
    pub probe_timeout_ms: u64,
}

impl MonitorConfig {
    pub fn primary_connect(&self) -> String {
        format!("tcp://{}:{}", self.primary_host, self.primary_health_port)
    }

    pub fn standby_connect(&self) -> String {
        format!("tcp://{}:{}", self.standby_host, self.standby_activation_port)
    }
}
