//! Wire schema: UTF-8 JSON payloads tagged by a `tipo` field.
//!
//! Parsing is two-phase rather than a single tagged `#[serde(derive)]` enum: the
//! broker only ever needs the `tipo` string to pick a routing topic and never
//! inspects further fields, while the dispatcher's ingestion loop needs the fully
//! typed variant. [`peek_tipo`] serves the former; [`Inbound::parse`] the latter,
//! falling back to `Unknown` for any tag it doesn't recognize instead of failing the
//! whole parse, so a broker forwarding it can still do so unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::model::{Position, TaxiId};

/// Cheap, non-validating extraction of the `tipo` field used by the broker to pick a
/// routing topic without otherwise inspecting the payload.
pub fn peek_tipo(payload: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(payload).ok()?;
    value.get("tipo")?.as_str().map(str::to_owned)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterMsg {
    pub id: TaxiId,
    pub posicion: Position,
    pub velocidad: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdateMsg {
    pub id: TaxiId,
    pub posicion: Position,
    pub ocupado: bool,
    pub servicios: u32,
    pub timestamp: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssignmentMsg {
    pub taxi_id: TaxiId,
    pub pos_usuario: Position,
    pub id_usuario: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RideRequestMsg {
    pub id_usuario: u32,
    pub posicion: Position,
    pub tiempo_solicitud: i64,
}

/// Rider reply, success case: `{"exito":true,"taxi_id":int,"pos_taxi":[x,y]}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RideReplyOk {
    pub exito: bool,
    pub taxi_id: TaxiId,
    pub pos_taxi: Position,
}

impl RideReplyOk {
    pub fn new(taxi_id: TaxiId, pos_taxi: Position) -> Self {
        Self {
            exito: true,
            taxi_id,
            pos_taxi,
        }
    }
}

/// Rider reply, failure case: `{"exito":false}` with an optional `error` string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RideReplyErr {
    pub exito: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RideReplyErr {
    pub fn new(reason: &str) -> Self {
        Self {
            exito: false,
            error: Some(reason.to_owned()),
        }
    }
}

/// Fully typed inbound message, as consumed by a dispatcher's ingestion loop.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Register(RegisterMsg),
    Update(UpdateMsg),
    Assignment(AssignmentMsg),
    RideRequest(RideRequestMsg),
    /// Any `tipo` this workspace doesn't define a schema for. Carries the raw
    /// payload so a broker forwarding it can do so unchanged.
    Unknown { tipo: String, raw: Value },
}

impl Inbound {
    pub fn parse(payload: &[u8]) -> Result<Self, CoreError> {
        let value: Value = serde_json::from_slice(payload)?;
        let tipo = value
            .get("tipo")
            .and_then(Value::as_str)
            .ok_or(CoreError::MissingTipo)?
            .to_owned();

        let inbound = match tipo.as_str() {
            "registro" => Inbound::Register(serde_json::from_value(value)?),
            "actualizacion" => Inbound::Update(serde_json::from_value(value)?),
            "servicio_asignado" => Inbound::Assignment(serde_json::from_value(value)?),
            "solicitud" => Inbound::RideRequest(serde_json::from_value(value)?),
            _ => Inbound::Unknown { tipo, raw: value },
        };
        Ok(inbound)
    }
}
