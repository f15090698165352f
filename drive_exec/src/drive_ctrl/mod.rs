//! Drivetrain control module
//!
//! DriveCtrl converts the last commanded chassis-frame velocity into four
//! independent swerve module (voltage, steer angle) demands, once per control
//! cycle. The kinematic decomposition itself is pure and lives in the
//! `swerve` submodule; this module wraps it in the cyclic `State` machinery,
//! command handling, and archiving.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;
mod swerve;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use state::*;
pub use swerve::*;

// External
use comms_if::tc::drive::DriveCmd;

// ---------------------------------------------------------------------------
// REEXPORTS
// ---------------------------------------------------------------------------

pub use comms_if::eqpt::drive::NUM_MODULES;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during DriveCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum DriveCtrlError {
    #[error("Failed to load the parameter file: {0}")]
    ParamLoadError(#[from] util::params::LoadError),

    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error(
        "The configured module geometry is degenerate, cannot build the \
        kinematics matrices"
    )]
    DegenerateGeometry,

    #[error("Received an invalid drive command: {0:?}")]
    InvalidCmd(DriveCmd),

    #[error("The module has not been initialised")]
    NotInitialised,
}
