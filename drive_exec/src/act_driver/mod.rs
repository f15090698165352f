//! # Actuator driver
//!
//! The actuation step is generic over the capabilities of the hardware:
//! DriveCtrl never instantiates a vendor driver itself, `main` supplies
//! whatever implements the traits here (real CAN-attached modules or the
//! simulated rig in `sim_eqpt`).

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::drive::{DriveDems, ModuleId, NUM_MODULES};

use crate::drive_ctrl::ModuleState;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Capabilities of a single swerve module's actuator pair.
pub trait ModuleActuator {
    /// Command the module's drive voltage and target steer angle.
    ///
    /// Closed-loop regulation of both axes happens behind this interface.
    fn set(&mut self, drive_v: f64, steer_angle_rad: f64);

    /// The module's current steer angle in radians, with the encoder
    /// calibration offset already removed.
    fn steer_angle_rad(&self) -> f64;

    /// The module's current drive velocity in meters/second.
    fn drive_velocity_ms(&self) -> f64;
}

/// Capabilities of the robot's orientation sensor.
pub trait OrientationSensor {
    /// The current yaw in radians, counter-clockwise positive.
    fn yaw_rad(&self) -> f64;

    /// Reset the yaw reading to zero.
    fn zero_yaw(&mut self);
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Forward the drive demands to each module's actuator.
pub fn exec<A: ModuleActuator>(
    actuators: &mut [A; NUM_MODULES],
    dems: &DriveDems,
) {
    for id in ModuleId::ALL.iter() {
        let i = id.index();
        actuators[i].set(dems.drive_v[i], dems.steer_angle_rad[i]);
    }
}

/// Read back the measured state of each module for telemetry.
pub fn measured_states<A: ModuleActuator>(
    actuators: &[A; NUM_MODULES],
) -> [ModuleState; NUM_MODULES] {
    let mut states = [ModuleState::default(); NUM_MODULES];

    for id in ModuleId::ALL.iter() {
        let i = id.index();
        states[i] = ModuleState {
            speed_ms: actuators[i].drive_velocity_ms(),
            angle_rad: actuators[i].steer_angle_rad(),
        };
    }

    states
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::drive_ctrl::test_params;
    use crate::sim_eqpt::{SimModule, SimParams};

    #[test]
    fn test_exec_fans_out_in_module_order() {
        let params = test_params();
        let sim_params = SimParams::default();
        let mut actuators: [SimModule; NUM_MODULES] =
            std::array::from_fn(|i| SimModule::new(&params, &sim_params, i));

        // Distinct angle per module so a mis-ordered fan-out is caught
        let dems = DriveDems {
            drive_v: [0.0; NUM_MODULES],
            steer_angle_rad: [0.1, 0.2, 0.3, 0.4],
        };

        exec(&mut actuators, &dems);
        for _ in 0..1000 {
            for act in actuators.iter_mut() {
                act.step(0.02);
            }
        }

        let states = measured_states(&actuators);
        for i in 0..NUM_MODULES {
            assert!(
                (states[i].angle_rad - dems.steer_angle_rad[i]).abs() < 1e-6
            );
        }
    }
}
