//! Broker topic routing table. The broker's only semantic action is rewriting the
//! topic frame based on the payload's `tipo` field; this module holds that table so
//! `taxi-broker` stays a thin proxy around it.

use serde_json::Value;

pub const TOPIC_REGISTRO: &str = "REGISTRO";
pub const TOPIC_ACTUALIZACION: &str = "ACTUALIZACION";
pub const TOPIC_TAXI_PREFIX: &str = "TAXI";

/// Per-taxi topic: `TAXI.<id>`.
pub fn taxi_topic(taxi_id: u32) -> String {
    format!("{TOPIC_TAXI_PREFIX}.{taxi_id}")
}

/// Outcome of routing a single `[topic, payload]` frame pair through the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Rewrite the topic frame to this value.
    Rewrite(String),
    /// `tipo` unrecognized (or absent/malformed payload): forward the original
    /// frames unchanged and log a warning.
    ForwardUnchanged,
}

/// Resolve the output topic for a payload already known to carry `tipo`.
/// `servicio_asignado` additionally needs `taxi_id` out of the payload to build the
/// per-taxi topic; any other shape of that variant forwards unchanged.
pub fn resolve(tipo: &str, payload: &Value) -> Route {
    match tipo {
        "registro" => Route::Rewrite(TOPIC_REGISTRO.to_owned()),
        "actualizacion" => Route::Rewrite(TOPIC_ACTUALIZACION.to_owned()),
        "servicio_asignado" => match payload.get("taxi_id").and_then(Value::as_u64) {
            Some(id) => Route::Rewrite(taxi_topic(id as u32)),
            None => Route::ForwardUnchanged,
        },
        _ => Route::ForwardUnchanged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn registro_routes_to_global_topic() {
        assert_eq!(
            resolve("registro", &json!({"tipo":"registro"})),
            Route::Rewrite(TOPIC_REGISTRO.to_owned())
        );
    }

    #[test]
    fn actualizacion_routes_to_global_topic() {
        assert_eq!(
            resolve("actualizacion", &json!({"tipo":"actualizacion"})),
            Route::Rewrite(TOPIC_ACTUALIZACION.to_owned())
        );
    }

    #[test]
    fn servicio_asignado_routes_per_taxi() {
        let payload = json!({"tipo":"servicio_asignado","taxi_id":7});
        assert_eq!(
            resolve("servicio_asignado", &payload),
            Route::Rewrite("TAXI.7".to_owned())
        );
    }

    #[test]
    fn servicio_asignado_without_taxi_id_forwards_unchanged() {
        let payload = json!({"tipo":"servicio_asignado"});
        assert_eq!(resolve("servicio_asignado", &payload), Route::ForwardUnchanged);
    }

    #[test]
    fn unknown_tipo_forwards_unchanged() {
        assert_eq!(resolve("solicitud", &json!({})), Route::ForwardUnchanged);
        assert_eq!(resolve("anything_else", &json!({})), Route::ForwardUnchanged);
    }
}
