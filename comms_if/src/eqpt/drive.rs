//! # Drive module equipment definitions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// The number of swerve modules on the robot.
pub const NUM_MODULES: usize = 4;

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// IDs of the swerve modules, in demand-array order.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum ModuleId {
    FrontLeft,
    FrontRight,
    BackLeft,
    BackRight,
}

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Demands that are sent from the drivetrain control module to the module
/// actuators.
///
/// All arrays are indexed in `ModuleId` order.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct DriveDems {
    /// The demanded drive voltage of each module's drive actuator in volts.
    pub drive_v: [f64; NUM_MODULES],

    /// The demanded steer angle of each module in radians, measured
    /// counter-clockwise from the robot's forward axis.
    pub steer_angle_rad: [f64; NUM_MODULES],
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl ModuleId {
    /// All module IDs in demand-array order.
    pub const ALL: [ModuleId; NUM_MODULES] = [
        ModuleId::FrontLeft,
        ModuleId::FrontRight,
        ModuleId::BackLeft,
        ModuleId::BackRight,
    ];

    /// The index of this module in the demand arrays.
    pub fn index(&self) -> usize {
        match self {
            ModuleId::FrontLeft => 0,
            ModuleId::FrontRight => 1,
            ModuleId::BackLeft => 2,
            ModuleId::BackRight => 3,
        }
    }
}

impl Default for DriveDems {
    fn default() -> Self {
        Self {
            drive_v: [0.0; NUM_MODULES],
            steer_angle_rad: [0.0; NUM_MODULES],
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_module_id_indexes_in_all_order() {
        assert_eq!(ModuleId::ALL.len(), NUM_MODULES);

        for (i, id) in ModuleId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
        }
    }
}
