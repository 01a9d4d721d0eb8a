//! # Telecommand module
//!
//! This module provides telecommand functionality to the arm interface.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod arm_ctrl;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use serde_json::{self, Value};
use thiserror::Error;

// Internal
use arm_ctrl::ArmCmd;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A telecommand, i.e. an instruction sent to the arm by an operator or a
/// script.
#[derive(Debug, Serialize, Deserialize)]
pub struct Tc {
    /// The type of the telecommand
    pub tc_type: TcType,

    /// The payload associated with this TC
    pub payload: TcPayload,
}

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

static TYPE_HAS_NO_PAYLOAD: [TcType; 3] = [TcType::None, TcType::Heartbeat, TcType::MakeSafe];

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Telecommand types.
///
/// The type is used to identify the purpose of the telecommand, and should be
/// used by the telecommand processor to determine where to send the command.
#[derive(Debug, Serialize, Deserialize, Eq, PartialEq, Clone, Copy)]
pub enum TcType {
    None,
    Heartbeat,
    MakeSafe,
    ArmCtrl,
}

/// Telecommand payload.
///
/// The payload only indicates which serialisation format the data is in. It
/// is up to the user to properly deserialise the data contained within it.
#[derive(Debug, Serialize, Deserialize)]
pub enum TcPayload {
    None,
    Json(String),
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("TC has an invalid type ({0})")]
    InvalidType(String),

    #[error("TC of type {0:?} is expected to have a payload but it doesn't")]
    MissingPayload(TcType),

    #[error("TC payload is not a valid {0:?} payload: {1}")]
    InvalidPayload(TcType, serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tc {
    /// Parse a new TC from a JSON packet
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        // Parse the JSON string into a value
        let val: Value = serde_json::from_str(json_str).map_err(TcParseError::InvalidJson)?;

        // Get the type of the TC
        let type_str = match val["type"].as_str() {
            Some(s) => s,
            None => {
                return Err(TcParseError::InvalidType(String::from(
                    "Expected \"type\" to be a string",
                )))
            }
        };
        let tc_type = match TcType::from_str(type_str) {
            Some(t) => t,
            None => {
                return Err(TcParseError::InvalidType(format!(
                    "{} is not a recognised TC type",
                    type_str
                )))
            }
        };

        // Get the payload. If it's null and the type requires a payload then
        // an error is returned
        let payload = if val["payload"].is_null() {
            if !TYPE_HAS_NO_PAYLOAD.contains(&tc_type) {
                return Err(TcParseError::MissingPayload(tc_type));
            }
            TcPayload::None
        } else {
            TcPayload::Json(val["payload"].to_string())
        };

        Ok(Tc { tc_type, payload })
    }

    /// Decode the arm command carried by this TC.
    ///
    /// Returns `Ok(None)` if this TC is not an arm control TC.
    pub fn arm_cmd(&self) -> Result<Option<ArmCmd>, TcParseError> {
        if self.tc_type != TcType::ArmCtrl {
            return Ok(None);
        }

        match &self.payload {
            TcPayload::Json(s) => serde_json::from_str(s)
                .map(Some)
                .map_err(|e| TcParseError::InvalidPayload(self.tc_type, e)),
            TcPayload::None => Err(TcParseError::MissingPayload(self.tc_type)),
        }
    }
}

impl TcType {
    fn from_str(s: &str) -> Option<Self> {
        match s {
            "NONE" => Some(TcType::None),
            "HEARTBEAT" => Some(TcType::Heartbeat),
            "SAFE" => Some(TcType::MakeSafe),
            "ARM" => Some(TcType::ArmCtrl),
            _ => None,
        }
    }
}
