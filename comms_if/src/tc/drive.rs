//! # Drivetrain control telecommands

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Serialize, Deserialize};
use structopt::StructOpt;

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// A command that can be executed by the drivetrain control module.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize, StructOpt)]
pub enum DriveCmd {
    /// Command a chassis-frame velocity.
    ///
    /// The robot frame has x pointing forwards and y pointing left, with
    /// positive rotation counter-clockwise when viewed from above (right hand
    /// rule about the upwards axis).
    #[structopt(name = "chassis")]
    Chassis {
        /// The forward velocity of the chassis in meters/second.
        ///
        /// Positive velocities are "forwards", negative are "backwards".
        #[structopt(allow_hyphen_values = true)]
        vx_ms: f64,

        /// The strafe velocity of the chassis in meters/second.
        ///
        /// Positive velocities move the robot to the left, negative to the
        /// right.
        #[structopt(allow_hyphen_values = true)]
        vy_ms: f64,

        /// The angular velocity of the chassis in radians/second.
        ///
        /// Positive rates rotate the robot counter-clockwise when viewed from
        /// above.
        #[structopt(allow_hyphen_values = true)]
        omega_rads: f64
    },

    /// Stop the robot, maintaining the current steer angles but setting all
    /// drive demands to zero.
    #[structopt(name = "stop")]
    Stop
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DriveCmd {
    /// Determine if the command is valid (i.e. contains only finite values).
    pub fn is_valid(&self) -> bool {
        match self {
            DriveCmd::Chassis { vx_ms, vy_ms, omega_rads } =>
                vx_ms.is_finite() && vy_ms.is_finite() && omega_rads.is_finite(),
            DriveCmd::Stop => true
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_is_valid() {
        assert!(DriveCmd::Stop.is_valid());
        assert!(DriveCmd::Chassis {
            vx_ms: 1.0,
            vy_ms: 0.0,
            omega_rads: 0.0
        }
        .is_valid());
        assert!(!DriveCmd::Chassis {
            vx_ms: f64::NAN,
            vy_ms: 0.0,
            omega_rads: 0.0
        }
        .is_valid());
        assert!(!DriveCmd::Chassis {
            vx_ms: 0.0,
            vy_ms: f64::INFINITY,
            omega_rads: 0.0
        }
        .is_valid());
    }
}
