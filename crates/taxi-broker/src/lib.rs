//! Routing logic for the broker, kept separate from the `zmq` I/O loop in `main.rs`
//! so it is testable without real sockets.

use taxi_core::protocol::peek_tipo;
use taxi_core::routing::{self, Route};

/// What the broker does with one `[topic, payload]` frame pair received on its
/// frontend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Topic frame rewritten per the routing table; forward `[new_topic, payload]`.
    Rewritten(Vec<u8>),
    /// `tipo` recognized but carried no routable target (e.g. `servicio_asignado`
    /// missing `taxi_id`), or `tipo` unrecognized: forward the original frames.
    ForwardUnchanged,
    /// Not JSON, or missing `tipo`: forward the original frames and log a warning.
    Malformed,
}

/// Decide the outcome for a publisher frame pair. Never drops a message: even a
/// malformed or unroutable payload is still forwarded, just unchanged.
pub fn route_publish_frame(payload: &[u8]) -> FrameOutcome {
    let Some(tipo) = peek_tipo(payload) else {
        return FrameOutcome::Malformed;
    };
    // peek_tipo already proved this parses as JSON.
    let value: serde_json::Value =
        serde_json::from_slice(payload).expect("peek_tipo validated this payload parses");

    match routing::resolve(&tipo, &value) {
        Route::Rewrite(topic) => FrameOutcome::Rewritten(topic.into_bytes()),
        Route::ForwardUnchanged => FrameOutcome::ForwardUnchanged,
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProxyStats {
    pub rewritten: u64,
    pub forwarded_unchanged: u64,
    pub malformed: u64,
}

impl ProxyStats {
    pub fn record(&mut self, outcome: &FrameOutcome) {
        match outcome {
            FrameOutcome::Rewritten(_) => self.rewritten += 1,
            FrameOutcome::ForwardUnchanged => self.forwarded_unchanged += 1,
            FrameOutcome::Malformed => self.malformed += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registro_payload_rewrites_to_global_topic() {
        let payload = br#"{"tipo":"registro","id":1,"posicion":[1,2],"velocidad":2}"#;
        assert_eq!(
            route_publish_frame(payload),
            FrameOutcome::Rewritten(b"REGISTRO".to_vec())
        );
    }

    #[test]
    fn servicio_asignado_rewrites_to_per_taxi_topic() {
        let payload = br#"{"tipo":"servicio_asignado","taxi_id":7,"pos_usuario":[1,2],"id_usuario":3}"#;
        assert_eq!(
            route_publish_frame(payload),
            FrameOutcome::Rewritten(b"TAXI.7".to_vec())
        );
    }

    #[test]
    fn unknown_tipo_forwards_unchanged() {
        let payload = br#"{"tipo":"solicitud","id_usuario":1,"posicion":[0,0],"tiempo_solicitud":0}"#;
        assert_eq!(route_publish_frame(payload), FrameOutcome::ForwardUnchanged);
    }

    #[test]
    fn malformed_json_forwards_unchanged_with_malformed_marker() {
        assert_eq!(route_publish_frame(b"not json"), FrameOutcome::Malformed);
        assert_eq!(route_publish_frame(br#"{"no_tipo":1}"#), FrameOutcome::Malformed);
    }

    #[test]
    fn stats_tally_each_outcome_kind() {
        let mut stats = ProxyStats::default();
        stats.record(&FrameOutcome::Rewritten(b"REGISTRO".to_vec()));
        stats.record(&FrameOutcome::ForwardUnchanged);
        stats.record(&FrameOutcome::Malformed);
        assert_eq!(
            stats,
            ProxyStats {
                rewritten: 1,
                forwarded_unchanged: 1,
                malformed: 1,
            }
        );
    }
}
