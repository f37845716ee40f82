use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("zmq error: {0}")]
    Zmq(#[from] zmq::Error),
}
