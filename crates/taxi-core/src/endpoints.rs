//! Default endpoint ports. Centralized so every binary's `clap` config defaults
//! agree with each other without copy-pasting magic numbers.

pub const BROKER_FRONTEND_PORT: u16 = 5559;
pub const BROKER_BACKEND_PORT: u16 = 5560;
pub const PRIMARY_RIDER_PORT: u16 = 5555;
pub const STANDBY_RIDER_PORT: u16 = 5556;
pub const ACTIVATION_PORT: u16 = 5557;
pub const HEALTH_PROBE_PORT: u16 = 5558;

pub const GRID_N_DEFAULT: i32 = 100;
pub const GRID_M_DEFAULT: i32 = 100;

/// `now - last_assignment_at > COOLDOWN_SECS` is the eligibility rule; this is the
/// external collaborators' nominal service duration it guards against.
pub const NOMINAL_SERVICE_SECS: u64 = 30;

pub const PROBE_INTERVAL_MS: u64 = 1_000;
pub const PROBE_TIMEOUT_MS: u64 = 1_000;
pub const RIDER_REQUEST_TIMEOUT_SECS: u64 = 5;
