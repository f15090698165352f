//! Parameters structure for DriveCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::{DriveCtrlError, NUM_MODULES};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for drivetrain control.
///
/// Loaded once at init from `drive_ctrl.toml` and passed by reference
/// afterwards; no code path mutates these at runtime. All per-module arrays
/// are ordered front-left, front-right, back-left, back-right.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Params {

    // ---- GEOMETRY ----

    /// Left-right separation of the modules.
    ///
    /// Units: meters
    pub track_width_m: f64,

    /// Front-back separation of the modules.
    ///
    /// Units: meters
    pub wheelbase_m: f64,

    /// Diameter of the drive wheels.
    ///
    /// Units: meters
    pub wheel_diameter_m: f64,

    // ---- HARDWARE IDS ----

    /// CAN ID of each module's drive motor controller.
    pub drive_motor_can_id: [u8; NUM_MODULES],

    /// CAN ID of each module's steer motor controller.
    pub steer_motor_can_id: [u8; NUM_MODULES],

    /// CAN ID of each module's absolute steer encoder.
    pub steer_encoder_can_id: [u8; NUM_MODULES],

    // ---- CALIBRATION ----

    /// Calibration angle aligning each absolute steer encoder's zero reading
    /// with the module's true forward orientation. Set once at deployment
    /// time, never mutated by software.
    ///
    /// Units: radians
    pub steer_offset_rad: [f64; NUM_MODULES],

    // ---- DRIVE TRAIN ----

    /// Free speed of the drive motor.
    ///
    /// Units: revolutions/minute
    pub drive_motor_free_speed_rpm: f64,

    /// Overall reduction from the drive motor to the wheel, as the ratio of
    /// wheel revolutions to motor revolutions.
    pub drive_reduction: f64,

    /// Maximum voltage that may be demanded from a drive actuator.
    ///
    /// Units: volts
    pub max_drive_voltage: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Maximum achievable wheel speed, derived from the drive train
    /// parameters:
    ///
    /// `free_speed / 60 * reduction * wheel_diameter * pi`
    pub fn max_wheel_speed_ms(&self) -> f64 {
        self.drive_motor_free_speed_rpm / 60.0
            * self.drive_reduction
            * self.wheel_diameter_m
            * std::f64::consts::PI
    }

    /// Validate the parameters, returning an error describing the first
    /// problem found.
    pub fn validate(&self) -> Result<(), DriveCtrlError> {
        let positives = [
            ("track_width_m", self.track_width_m),
            ("wheelbase_m", self.wheelbase_m),
            ("wheel_diameter_m", self.wheel_diameter_m),
            ("drive_motor_free_speed_rpm", self.drive_motor_free_speed_rpm),
            ("drive_reduction", self.drive_reduction),
            ("max_drive_voltage", self.max_drive_voltage),
        ];

        for (name, value) in positives.iter() {
            if !(value.is_finite() && *value > 0.0) {
                return Err(DriveCtrlError::InvalidParam(format!(
                    "{} must be positive and finite, got {}",
                    name, value
                )));
            }
        }

        for offset in self.steer_offset_rad.iter() {
            if !offset.is_finite() {
                return Err(DriveCtrlError::InvalidParam(format!(
                    "steer_offset_rad must be finite, got {:?}",
                    self.steer_offset_rad
                )));
            }
        }

        // All CAN IDs, across all three device types, must be unique
        let mut all_ids: Vec<u8> = self
            .drive_motor_can_id
            .iter()
            .chain(self.steer_motor_can_id.iter())
            .chain(self.steer_encoder_can_id.iter())
            .copied()
            .collect();
        all_ids.sort_unstable();
        let num_ids = all_ids.len();
        all_ids.dedup();

        if all_ids.len() != num_ids {
            return Err(DriveCtrlError::InvalidParam(
                "CAN IDs must be unique across all devices".into(),
            ));
        }

        Ok(())
    }
}

/// A representative parameter set used by tests across the crate.
#[cfg(test)]
pub(crate) fn test_params() -> Params {
    Params {
        track_width_m: 0.635,
        wheelbase_m: 0.635,
        wheel_diameter_m: 0.1016,
        drive_motor_can_id: [1, 2, 3, 4],
        steer_motor_can_id: [5, 6, 7, 8],
        steer_encoder_can_id: [9, 10, 11, 12],
        steer_offset_rad: [-2.38, 1.17, 3.05, -0.52],
        drive_motor_free_speed_rpm: 5676.0,
        drive_reduction: 0.1481,
        max_drive_voltage: 10.0,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn valid_params() -> Params {
        test_params()
    }

    #[test]
    fn test_valid_params_accepted() {
        assert!(valid_params().validate().is_ok());
    }

    #[test]
    fn test_max_wheel_speed_derivation() {
        let params = valid_params();
        let expected =
            5676.0 / 60.0 * 0.1481 * 0.1016 * std::f64::consts::PI;
        assert!((params.max_wheel_speed_ms() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_duplicate_can_ids_rejected() {
        let mut params = valid_params();
        params.steer_encoder_can_id = [9, 10, 11, 1];
        assert!(matches!(
            params.validate(),
            Err(DriveCtrlError::InvalidParam(_))
        ));
    }

    #[test]
    fn test_non_positive_geometry_rejected() {
        let mut params = valid_params();
        params.track_width_m = 0.0;
        assert!(params.validate().is_err());

        let mut params = valid_params();
        params.wheelbase_m = -1.0;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_non_finite_offset_rejected() {
        let mut params = valid_params();
        params.steer_offset_rad[2] = f64::NAN;
        assert!(params.validate().is_err());
    }
}
