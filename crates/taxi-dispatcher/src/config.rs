use clap::{Parser, ValueEnum};
use taxi_core::endpoints;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Role {
    Primary,
    Standby,
}

impl Role {
    /// The primary is born active; the standby is born inactive and waits for an
    /// `"activate"` signal.
    pub fn born_active(self) -> bool {
        matches!(self, Role::Primary)
    }
}

/// Dispatcher configuration, shared by both roles: primary and standby are the
/// same binary, selected by `--role`.
#[derive(Parser, Debug, Clone)]
#[command(name = "taxi-dispatcher")]
pub struct DispatcherConfig {
    #[arg(long, value_enum, env = "TAXI_DISPATCHER_ROLE")]
    pub role: Role,

    #[arg(long, env = "BROKER_HOST", default_value = "127.0.0.1")]
    pub broker_host: String,

    #[arg(long, env = "BROKER_FRONTEND_PORT", default_value_t = endpoints::BROKER_FRONTEND_PORT)]
    pub broker_frontend_port: u16,

    #[arg(long, env = "BROKER_BACKEND_PORT", default_value_t = endpoints::BROKER_BACKEND_PORT)]
    pub broker_backend_port: u16,

    /// Rider-request bind port. Defaults depend on role if unset.
    #[arg(long, env = "DISPATCHER_RIDER_PORT")]
    pub rider_port: Option<u16>,

    /// Health-probe-reply port (primary) or activation port (standby). Defaults
    /// depend on role if unset.
    #[arg(long, env = "DISPATCHER_HEALTH_PORT")]
    pub health_port: Option<u16>,
}

impl DispatcherConfig {
    pub fn rider_port(&self) -> u16 {
        self.rider_port.unwrap_or(match self.role {
            Role::Primary => endpoints::PRIMARY_RIDER_PORT,
            Role::Standby => endpoints::STANDBY_RIDER_PORT,
        })
    }

    pub fn health_port(&self) -> u16 {
        self.health_port.unwrap_or(match self.role {
            Role::Primary => endpoints::HEALTH_PROBE_PORT,
            Role::Standby => endpoints::ACTIVATION_PORT,
        })
    }

    pub fn broker_frontend_connect(&self) -> String {
        format!("tcp://{}:{}", self.broker_host, self.broker_frontend_port)
    }

    pub fn broker_backend_connect(&self) -> String {
        format!("tcp://{}:{}", self.broker_host, self.broker_backend_port)
    }

    pub fn rider_bind(&self) -> String {
        format!("tcp://*:{}", self.rider_port())
    }

    pub fn health_bind(&self) -> String {
        format!("tcp://*:{}", self.health_port())
    }
}
