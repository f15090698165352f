//! Parameters structure for the simulated equipment

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the simulated drive modules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimParams {
    /// Rate at which a simulated steer axis slews towards its target angle.
    ///
    /// Units: radians/second
    pub steer_slew_rads: f64,

    /// Time constant of the first-order lag between the demanded and
    /// achieved drive velocity.
    ///
    /// Units: seconds
    pub drive_time_constant_s: f64,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            steer_slew_rads: 8.0,
            drive_time_constant_s: 0.15,
        }
    }
}
