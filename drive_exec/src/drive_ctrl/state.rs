//! Implementations for the DriveCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;

// Internal
use super::{
    desaturate, ChassisSpeeds, DriveCtrlError, ModuleState, Params,
    SwerveKinematics, NUM_MODULES,
};
use comms_if::{eqpt::drive::DriveDems, tc::drive::DriveCmd};
use util::{
    archive::{Archived, Archiver},
    module::State,
    params,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Drivetrain control module state
#[derive(Default)]
pub struct DriveCtrl {
    pub(crate) params: Params,

    /// Kinematic transforms, built once at init and immutable afterwards.
    kin: Option<SwerveKinematics>,

    /// True while the robot is in safe mode, in which all drive demands are
    /// zeroed and steer angles held.
    safe: bool,

    pub(crate) report: StatusReport,
    arch_report: Archiver,

    pub(crate) current_cmd: Option<DriveCmd>,

    pub(crate) target_speeds: Option<ChassisSpeeds>,
    arch_target_speeds: Archiver,

    pub(crate) output: Option<DriveDems>,
    arch_output: Archiver,
}

/// Input data to drivetrain control.
#[derive(Default)]
pub struct InputData {
    /// The drive command to be executed, or `None` if there is no new command
    /// on this cycle.
    pub cmd: Option<DriveCmd>,
}

/// Status report for DriveCtrl processing.
#[derive(Clone, Copy, Serialize, Debug)]
pub struct StatusReport {
    /// True if the commanded motion exceeded the maximum wheel speed and all
    /// module speeds were uniformly scaled down.
    pub desaturated: bool,

    /// The uniform scale factor applied to the module speeds. Unity when no
    /// desaturation occurred.
    pub speed_scale: f64,

    /// The target state of each module after desaturation.
    pub target_states: [ModuleState; NUM_MODULES],
}

// ---------------------------------------------------------------------------
// ARCHIVE ROWS
// ---------------------------------------------------------------------------

// The CSV writer cannot serialise nested containers so the archived structs
// are flattened into per-module columns here.

#[derive(Serialize)]
struct ReportRow {
    time_s: f64,
    desaturated: bool,
    speed_scale: f64,
    fl_speed_ms: f64,
    fl_angle_rad: f64,
    fr_speed_ms: f64,
    fr_angle_rad: f64,
    bl_speed_ms: f64,
    bl_angle_rad: f64,
    br_speed_ms: f64,
    br_angle_rad: f64,
}

#[derive(Serialize)]
struct TargetSpeedsRow {
    time_s: f64,
    vx_ms: f64,
    vy_ms: f64,
    omega_rads: f64,
}

#[derive(Serialize)]
struct OutputRow {
    time_s: f64,
    fl_drive_v: f64,
    fl_steer_angle_rad: f64,
    fr_drive_v: f64,
    fr_steer_angle_rad: f64,
    bl_drive_v: f64,
    bl_steer_angle_rad: f64,
    br_drive_v: f64,
    br_steer_angle_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for StatusReport {
    fn default() -> Self {
        Self {
            desaturated: false,
            speed_scale: 1.0,
            target_states: [ModuleState::default(); NUM_MODULES],
        }
    }
}

impl State for DriveCtrl {
    type InitData = &'static str;
    type InitError = DriveCtrlError;

    type InputData = InputData;
    type OutputData = DriveDems;
    type StatusReport = StatusReport;
    type ProcError = DriveCtrlError;

    /// Initialise the DriveCtrl module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>
    {
        // Load the parameters
        let params: Params = params::load(init_data)?;

        *self = Self::with_params(params)?;

        // Create the arch folder for drive_ctrl
        let mut arch_path = session.arch_root.clone();
        arch_path.push("drive_ctrl");
        std::fs::create_dir_all(arch_path).unwrap();

        // Initialise the archivers
        self.arch_report = Archiver::from_path(
            session, "drive_ctrl/status_report.csv"
        ).unwrap();
        self.arch_target_speeds = Archiver::from_path(
            session, "drive_ctrl/target_speeds.csv"
        ).unwrap();
        self.arch_output = Archiver::from_path(
            session, "drive_ctrl/output.csv"
        ).unwrap();

        Ok(())
    }

    /// Perform cyclic processing of drivetrain control.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        // Clear the status report
        self.report = StatusReport::default();

        // Check to see if there's a new command. Commands are rejected while
        // in safe mode.
        if let Some(cmd) = input_data.cmd {
            if !cmd.is_valid() {
                return Err(DriveCtrlError::InvalidCmd(cmd));
            }

            if !self.safe {
                self.current_cmd = Some(cmd);
            }
        }

        let output = match self.current_cmd {
            Some(DriveCmd::Chassis { vx_ms, vy_ms, omega_rads }) if !self.safe => {
                self.calc_chassis(ChassisSpeeds { vx_ms, vy_ms, omega_rads })?
            }
            // Stop, no command yet, or safe mode: hold the previous steer
            // angles and zero the drive demands.
            _ => {
                self.target_speeds = None;
                DriveDems {
                    drive_v: [0.0; NUM_MODULES],
                    steer_angle_rad: self.prev_angles_rad(),
                }
            }
        };

        trace!(
            "DriveCtrl output:\n    drive_v: {:?}\n    steer: {:?}",
            output.drive_v,
            output.steer_angle_rad
        );

        // Update the output in self
        self.output = Some(output);

        Ok((output, self.report))
    }
}

impl Archived for DriveCtrl {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let time_s = util::session::get_elapsed_seconds();
        let t = self.report.target_states;
        let out = self.output.unwrap_or_default();
        let target = self.target_speeds.unwrap_or_default();

        self.arch_report.serialise(ReportRow {
            time_s,
            desaturated: self.report.desaturated,
            speed_scale: self.report.speed_scale,
            fl_speed_ms: t[0].speed_ms,
            fl_angle_rad: t[0].angle_rad,
            fr_speed_ms: t[1].speed_ms,
            fr_angle_rad: t[1].angle_rad,
            bl_speed_ms: t[2].speed_ms,
            bl_angle_rad: t[2].angle_rad,
            br_speed_ms: t[3].speed_ms,
            br_angle_rad: t[3].angle_rad,
        })?;

        self.arch_target_speeds.serialise(TargetSpeedsRow {
            time_s,
            vx_ms: target.vx_ms,
            vy_ms: target.vy_ms,
            omega_rads: target.omega_rads,
        })?;

        self.arch_output.serialise(OutputRow {
            time_s,
            fl_drive_v: out.drive_v[0],
            fl_steer_angle_rad: out.steer_angle_rad[0],
            fr_drive_v: out.drive_v[1],
            fr_steer_angle_rad: out.steer_angle_rad[1],
            bl_drive_v: out.drive_v[2],
            bl_steer_angle_rad: out.steer_angle_rad[2],
            br_drive_v: out.drive_v[3],
            br_steer_angle_rad: out.steer_angle_rad[3],
        })?;

        Ok(())
    }
}

impl DriveCtrl {
    /// Build a DriveCtrl from an already loaded parameter set.
    ///
    /// The archivers are left unset, so this is only suitable for use by
    /// `init` (which sets them afterwards) and by tests.
    pub fn with_params(params: Params) -> Result<Self, DriveCtrlError> {
        params.validate()?;

        let kin = SwerveKinematics::new(params.track_width_m, params.wheelbase_m)?;

        Ok(Self {
            params,
            kin: Some(kin),
            ..Default::default()
        })
    }

    /// Get the kinematic transforms, or `None` if the module has not been
    /// initialised.
    pub fn kinematics(&self) -> Option<&SwerveKinematics> {
        self.kin.as_ref()
    }

    /// Get the loaded parameters.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Put the module into safe mode.
    ///
    /// While safe all drive demands are zeroed and steer angles held. The
    /// current command is cleared so that leaving safe mode does not resume
    /// the previous motion.
    pub fn make_safe(&mut self) {
        self.safe = true;
        self.current_cmd = None;
    }

    /// Take the module out of safe mode.
    pub fn make_unsafe(&mut self) {
        self.safe = false;
    }

    /// The steer angles output on the previous cycle, or the forward
    /// orientation if no output has been produced yet.
    fn prev_angles_rad(&self) -> [f64; NUM_MODULES] {
        match self.output {
            Some(ref o) => o.steer_angle_rad,
            None => [0.0; NUM_MODULES],
        }
    }

    /// Perform the chassis velocity command calculations.
    ///
    /// Decomposes the commanded chassis speeds into module states, desaturates
    /// the wheel speeds, and scales each speed into a voltage demand.
    fn calc_chassis(
        &mut self,
        speeds: ChassisSpeeds,
    ) -> Result<DriveDems, DriveCtrlError> {
        let kin = self.kin.as_ref().ok_or(DriveCtrlError::NotInitialised)?;

        let prev_angles_rad = self.prev_angles_rad();
        let mut states = kin.inverse(&speeds, &prev_angles_rad);

        let max_speed_ms = self.params.max_wheel_speed_ms();

        if let Some(scale) = desaturate(&mut states, max_speed_ms) {
            self.report.desaturated = true;
            self.report.speed_scale = scale;
        }

        self.report.target_states = states;
        self.target_speeds = Some(speeds);

        // Open loop voltage scaling, closed loop regulation happens in the
        // actuators themselves
        let mut drive_v = [0.0; NUM_MODULES];
        let mut steer_angle_rad = [0.0; NUM_MODULES];

        for (i, state) in states.iter().enumerate() {
            drive_v[i] =
                state.speed_ms / max_speed_ms * self.params.max_drive_voltage;
            steer_angle_rad[i] = state.angle_rad;
        }

        Ok(DriveDems {
            drive_v,
            steer_angle_rad,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::drive_ctrl::test_params;

    const EPSILON: f64 = 1e-9;

    fn drive_ctrl() -> DriveCtrl {
        DriveCtrl::with_params(test_params()).unwrap()
    }

    fn chassis(vx_ms: f64, vy_ms: f64, omega_rads: f64) -> InputData {
        InputData {
            cmd: Some(DriveCmd::Chassis { vx_ms, vy_ms, omega_rads }),
        }
    }

    #[test]
    fn test_voltage_linear_in_speed() {
        let mut ctrl = drive_ctrl();

        let (half, _) = ctrl.proc(&chassis(0.5, 0.0, 0.0)).unwrap();
        let (full, rpt) = ctrl.proc(&chassis(1.0, 0.0, 0.0)).unwrap();

        assert!(!rpt.desaturated);
        for i in 0..NUM_MODULES {
            assert!((full.drive_v[i] - 2.0 * half.drive_v[i]).abs() < EPSILON);
        }
    }

    #[test]
    fn test_stop_holds_angles_and_zeroes_drive() {
        let mut ctrl = drive_ctrl();

        // Drive diagonally so the steer angles are non-zero
        let (moving, _) = ctrl.proc(&chassis(1.0, 1.0, 0.0)).unwrap();
        assert!(moving.steer_angle_rad.iter().all(|a| a.abs() > 0.1));

        let (stopped, _) = ctrl
            .proc(&InputData { cmd: Some(DriveCmd::Stop) })
            .unwrap();

        assert_eq!(stopped.drive_v, [0.0; NUM_MODULES]);
        assert_eq!(stopped.steer_angle_rad, moving.steer_angle_rad);
    }

    #[test]
    fn test_no_command_re_emits_previous_angles() {
        let mut ctrl = drive_ctrl();

        // No command at all yet
        let (out, _) = ctrl.proc(&InputData::default()).unwrap();
        assert_eq!(out.drive_v, [0.0; NUM_MODULES]);
        assert_eq!(out.steer_angle_rad, [0.0; NUM_MODULES]);

        // A chassis command persists over no-command cycles
        let (first, _) = ctrl.proc(&chassis(0.4, 0.2, 0.1)).unwrap();
        let (second, _) = ctrl.proc(&InputData::default()).unwrap();
        assert_eq!(first.drive_v, second.drive_v);
        assert_eq!(first.steer_angle_rad, second.steer_angle_rad);
    }

    #[test]
    fn test_desaturation_reported() {
        let mut ctrl = drive_ctrl();
        let max_v = ctrl.params.max_drive_voltage;

        // Far beyond the ~4.5 m/s maximum wheel speed
        let (out, rpt) = ctrl.proc(&chassis(20.0, 0.0, 10.0)).unwrap();

        assert!(rpt.desaturated);
        assert!(rpt.speed_scale < 1.0);
        for v in out.drive_v.iter() {
            assert!(*v <= max_v + EPSILON);
        }
    }

    #[test]
    fn test_invalid_command_rejected() {
        let mut ctrl = drive_ctrl();
        let result = ctrl.proc(&chassis(f64::NAN, 0.0, 0.0));
        assert!(matches!(result, Err(DriveCtrlError::InvalidCmd(_))));
    }

    #[test]
    fn test_safe_mode_zeroes_drive_and_rejects_commands() {
        let mut ctrl = drive_ctrl();

        let (moving, _) = ctrl.proc(&chassis(1.0, 1.0, 0.0)).unwrap();
        assert!(moving.drive_v.iter().any(|v| *v > 0.0));

        ctrl.make_safe();

        // Commands sent while safe are dropped
        let (safe_out, _) = ctrl.proc(&chassis(1.0, 0.0, 0.0)).unwrap();
        assert_eq!(safe_out.drive_v, [0.0; NUM_MODULES]);
        assert_eq!(safe_out.steer_angle_rad, moving.steer_angle_rad);

        // Leaving safe mode does not resume the previous motion
        ctrl.make_unsafe();
        let (out, _) = ctrl.proc(&InputData::default()).unwrap();
        assert_eq!(out.drive_v, [0.0; NUM_MODULES]);
    }
}
