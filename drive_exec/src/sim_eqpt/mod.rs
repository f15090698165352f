//! # Simulated equipment
//!
//! A simple simulation rig implementing the actuator and orientation sensor
//! capabilities, used for bench runs and tests in place of the real
//! CAN-attached hardware.
//!
//! Each simulated module models a raw absolute steer encoder displaced by the
//! configured steer offset: the encoder reading is `true angle + offset`, and
//! the `ModuleActuator` readback removes the offset again, mirroring what the
//! real module driver does with its calibration. The steer axis slews towards
//! its target at a configured rate and the drive velocity follows the voltage
//! demand through a first-order lag.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

pub use params::*;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use util::maths::{clamp, get_ang_dist_2pi, lin_map};

use crate::act_driver::{ModuleActuator, OrientationSensor};
use crate::drive_ctrl;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A simulated swerve module.
pub struct SimModule {
    /// Calibration offset of the absolute encoder for this module.
    encoder_offset_rad: f64,

    max_wheel_speed_ms: f64,
    max_drive_voltage: f64,

    steer_slew_rads: f64,
    drive_time_constant_s: f64,

    /// Raw absolute encoder reading, i.e. true angle plus offset.
    raw_encoder_rad: f64,

    /// Current drive velocity.
    speed_ms: f64,

    /// Target steer angle in the calibrated (offset-removed) frame.
    target_angle_rad: f64,

    /// Target drive velocity implied by the last voltage demand.
    target_speed_ms: f64,
}

/// A simulated orientation sensor.
///
/// The executive integrates the yaw rate estimated from the measured module
/// states via the forward kinematic transform.
#[derive(Default)]
pub struct SimImu {
    yaw_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimModule {
    /// Create a simulated module for the module at the given demand-array
    /// index.
    pub fn new(
        drive_params: &drive_ctrl::Params,
        sim_params: &SimParams,
        index: usize,
    ) -> Self {
        let offset = drive_params.steer_offset_rad[index];

        Self {
            encoder_offset_rad: offset,
            max_wheel_speed_ms: drive_params.max_wheel_speed_ms(),
            max_drive_voltage: drive_params.max_drive_voltage,
            steer_slew_rads: sim_params.steer_slew_rads,
            drive_time_constant_s: sim_params.drive_time_constant_s,
            // At rest the module faces forwards, so the raw encoder shows
            // exactly the offset
            raw_encoder_rad: offset,
            speed_ms: 0.0,
            target_angle_rad: 0.0,
            target_speed_ms: 0.0,
        }
    }

    /// The raw absolute encoder reading, offset included.
    pub fn raw_encoder_rad(&self) -> f64 {
        self.raw_encoder_rad
    }

    /// Advance the simulation by one timestep.
    pub fn step(&mut self, dt_s: f64) {
        // Slew the steer axis towards its target along the shortest path
        let err_rad = get_ang_dist_2pi(self.steer_angle_rad(), self.target_angle_rad);
        let max_step_rad = self.steer_slew_rads * dt_s;
        self.raw_encoder_rad += clamp(&err_rad, &-max_step_rad, &max_step_rad);

        // First order lag on the drive velocity
        let alpha = (dt_s / self.drive_time_constant_s).min(1.0);
        self.speed_ms += (self.target_speed_ms - self.speed_ms) * alpha;
    }
}

impl ModuleActuator for SimModule {
    fn set(&mut self, drive_v: f64, steer_angle_rad: f64) {
        self.target_speed_ms = lin_map(
            (-self.max_drive_voltage, self.max_drive_voltage),
            (-self.max_wheel_speed_ms, self.max_wheel_speed_ms),
            drive_v,
        );
        self.target_angle_rad = steer_angle_rad;
    }

    fn steer_angle_rad(&self) -> f64 {
        self.raw_encoder_rad - self.encoder_offset_rad
    }

    fn drive_velocity_ms(&self) -> f64 {
        self.speed_ms
    }
}

impl SimImu {
    /// Integrate the estimated yaw rate over one timestep.
    pub fn integrate(&mut self, omega_rads: f64, dt_s: f64) {
        self.yaw_rad += omega_rads * dt_s;
    }
}

impl OrientationSensor for SimImu {
    fn yaw_rad(&self) -> f64 {
        self.yaw_rad
    }

    fn zero_yaw(&mut self) {
        self.yaw_rad = 0.0;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::drive_ctrl::test_params;

    const DT_S: f64 = 0.02;

    fn sim_module(index: usize) -> SimModule {
        SimModule::new(&test_params(), &SimParams::default(), index)
    }

    #[test]
    fn test_encoder_offset_applied_and_removed() {
        let mut module = sim_module(0);
        let offset = test_params().steer_offset_rad[0];

        // At rest the calibrated angle is forward and the raw encoder shows
        // the offset
        assert!((module.steer_angle_rad() - 0.0).abs() < 1e-12);
        assert!((module.raw_encoder_rad() - offset).abs() < 1e-12);

        // Slew to a target and check both frames stay consistent
        module.set(0.0, 0.5);
        for _ in 0..1000 {
            module.step(DT_S);
        }

        assert!((module.steer_angle_rad() - 0.5).abs() < 1e-6);
        assert!((module.raw_encoder_rad() - (0.5 + offset)).abs() < 1e-6);
    }

    #[test]
    fn test_steer_slew_rate_limited() {
        let mut module = sim_module(1);
        let max_step_rad = SimParams::default().steer_slew_rads * DT_S;

        module.set(0.0, 3.0);
        module.step(DT_S);

        assert!((module.steer_angle_rad() - max_step_rad).abs() < 1e-12);
    }

    #[test]
    fn test_drive_velocity_lags_towards_demand() {
        let params = test_params();
        let mut module = sim_module(2);

        module.set(params.max_drive_voltage, 0.0);

        let mut prev_speed = module.drive_velocity_ms();
        for _ in 0..1000 {
            module.step(DT_S);
            assert!(module.drive_velocity_ms() >= prev_speed);
            prev_speed = module.drive_velocity_ms();
        }

        assert!(
            (module.drive_velocity_ms() - params.max_wheel_speed_ms()).abs()
                < 1e-6
        );
    }

    #[test]
    fn test_imu_integration_and_zero() {
        let mut imu = SimImu::default();

        for _ in 0..50 {
            imu.integrate(1.0, DT_S);
        }
        assert!((imu.yaw_rad() - 1.0).abs() < 1e-9);

        imu.zero_yaw();
        assert_eq!(imu.yaw_rad(), 0.0);
    }
}
