//! # Data Store

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{info, warn};

use comms_if::eqpt::drive::{DriveDems, NUM_MODULES};

use crate::drive_ctrl::{self, ChassisSpeeds, ModuleState};

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Gives the reason the robot has been put into safe mode
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum SafeModeCause {
    MakeSafeTc,
    TcSenderNotConnected,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u64,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    /// Elapsed session time at the start of this cycle
    pub time_s: f64,

    // Safe mode variables
    /// Determines if the robot is in safe mode.
    pub safe: bool,

    /// Gives the reason for the robot being in safe mode.
    pub safe_cause: Option<SafeModeCause>,

    // DriveCtrl
    pub drive_ctrl: drive_ctrl::DriveCtrl,
    pub drive_ctrl_input: drive_ctrl::InputData,
    pub drive_dems: DriveDems,
    pub drive_status_rpt: drive_ctrl::StatusReport,

    // Sensing
    /// Measured state of each module, read back from the actuators
    pub measured_states: [ModuleState; NUM_MODULES],

    /// Chassis speeds estimated from the measured module states via the
    /// forward kinematic transform
    pub est_chassis_speeds: ChassisSpeeds,

    /// Current yaw from the orientation sensor
    pub yaw_rad: f64,

    /// Set when a ZeroYaw TC is received, cleared once actioned
    pub zero_yaw_requested: bool,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Puts the robot into safe mode with the given cause.
    pub fn make_safe(&mut self, cause: SafeModeCause) {
        if !self.safe {
            warn!("Make safe requested, cause: {:?}", cause);
            self.safe = true;
            self.safe_cause = Some(cause);

            // Make drive_ctrl safe
            self.drive_ctrl.make_safe();
        }
    }

    /// Attempts to disable the safe mode by clearing the given cause.
    ///
    /// Returns `Ok(())` if this cause was cleared and safe mode was disabled,
    /// or `Err(())` otherwise. To remove safe mode the provided cause must
    /// match the initial reason for safe mode being enabled.
    ///
    /// If safe mode was not enabled `Ok(())` is returned
    pub fn make_unsafe(&mut self, cause: SafeModeCause) -> Result<(), ()> {
        if !self.safe {
            return Ok(());
        }

        match self.safe_cause {
            Some(root_cause) => {
                if cause == root_cause {
                    self.safe = false;
                    self.safe_cause = None;
                    self.drive_ctrl.make_unsafe();
                    info!("Make unsafe requested, root cause match, safe mode disabled");
                    Ok(())
                } else {
                    Err(())
                }
            }
            None => Ok(()),
        }
    }

    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, and sets
    /// the 1Hz cycle flag.
    ///
    /// The drive demands are not cleared here: they hold the last good
    /// DriveCtrl output so that a failed proc leaves the previous demands
    /// going to the actuators rather than snapping the steer angles to zero.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64) {
        self.is_1_hz_cycle = self.num_cycles % (cycle_frequency_hz as u64) == 0;

        self.drive_ctrl_input = drive_ctrl::InputData::default();
        self.drive_status_rpt = drive_ctrl::StatusReport::default();

        self.time_s = util::session::get_elapsed_seconds();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_safe_mode_cause_must_match() {
        let mut ds = DataStore::default();

        ds.make_safe(SafeModeCause::TcSenderNotConnected);
        assert!(ds.safe);

        // The wrong cause does not clear safe mode
        assert!(ds.make_unsafe(SafeModeCause::MakeSafeTc).is_err());
        assert!(ds.safe);

        // The matching cause does
        assert!(ds.make_unsafe(SafeModeCause::TcSenderNotConnected).is_ok());
        assert!(!ds.safe);
    }

    #[test]
    fn test_make_unsafe_when_not_safe_is_ok() {
        let mut ds = DataStore::default();
        assert!(ds.make_unsafe(SafeModeCause::MakeSafeTc).is_ok());
    }

    #[test]
    fn test_cycle_start_keeps_last_demands() {
        use comms_if::tc::drive::DriveCmd;

        // cycle_start reads the session clock, so a session is needed
        std::env::set_var(util::host::SW_ROOT_ENV_VAR, std::env::temp_dir());
        let _session =
            util::session::Session::new("data_store_test", "sessions").unwrap();

        let mut ds = DataStore::default();
        ds.drive_dems = DriveDems {
            drive_v: [1.0; NUM_MODULES],
            steer_angle_rad: [0.5, -0.5, 1.5, -1.5],
        };
        ds.drive_ctrl_input.cmd = Some(DriveCmd::Stop);

        ds.cycle_start(50.0);

        // The input is cleared but the last demands hold, so a cycle in which
        // DriveCtrl produces no output actuates the previous demands
        assert!(ds.drive_ctrl_input.cmd.is_none());
        assert_eq!(ds.drive_dems.drive_v, [1.0; NUM_MODULES]);
        assert_eq!(ds.drive_dems.steer_angle_rad, [0.5, -0.5, 1.5, -1.5]);
    }
}
