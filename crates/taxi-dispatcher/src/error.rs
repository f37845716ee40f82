use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchBinError {
    #[error("zmq error: {0}")]
    Zmq(#[from] zmq::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
