//! # Telecommand module
//!
//! This module provides telecommand functionality to the communications
//! interface. Telecommands are serialised as JSON strings on the wire, both
//! over the network and inside drive scripts.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod drive;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Serialize, Deserialize};
use thiserror::Error;

// Internal
use drive::DriveCmd;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A telecommand, i.e. an instruction sent to the robot by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Tc {
    /// Put the robot into safe mode, zeroing all drive demands.
    MakeSafe,

    /// Take the robot out of safe mode.
    MakeUnsafe,

    /// Zero the orientation sensor's yaw reading.
    ZeroYaw,

    /// A command to the drivetrain control module.
    Drive(DriveCmd),
}

/// The response sent back to the TC sender after handling a telecommand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TcResponse {
    /// The TC was accepted and will be executed.
    Ok,

    /// The TC was valid but cannot be executed, for example because the robot
    /// is in safe mode.
    CannotExecute,

    /// The TC could not be parsed or contained invalid data.
    Invalid,
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tc {
    /// Parse a new TC from a JSON packet
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        serde_json::from_str(json_str).map_err(TcParseError::InvalidJson)
    }

    /// Serialise the TC into a JSON packet
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_json_round_trip() {
        let tcs = [
            Tc::MakeSafe,
            Tc::MakeUnsafe,
            Tc::ZeroYaw,
            Tc::Drive(DriveCmd::Stop),
            Tc::Drive(DriveCmd::Chassis {
                vx_ms: 1.0,
                vy_ms: -0.5,
                omega_rads: 0.25,
            }),
        ];

        for tc in tcs.iter() {
            let json = tc.to_json().unwrap();
            let parsed = Tc::from_json(&json).unwrap();
            assert_eq!(*tc, parsed);
        }
    }

    #[test]
    fn test_invalid_json_rejected() {
        assert!(matches!(
            Tc::from_json("{\"NotATc\": 1}"),
            Err(TcParseError::InvalidJson(_))
        ));
    }
}
