use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("zmq error: {0}")]
    Zmq(#[from] zmq::Error),
    #[error("malformed reply payload: {0}")]
    Decode(#[from] serde_json::Error),
}
