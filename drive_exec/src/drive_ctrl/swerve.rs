//! Swerve drive kinematics
//!
//! Pure rigid-body kinematics for a four-module swerve drivetrain. No side
//! effects live here so the transforms can be tested in isolation from the
//! cyclic machinery and telemetry.
//!
//! Frames: x forwards, y left, positive rotation counter-clockwise when
//! viewed from above. Modules are ordered front-left, front-right, back-left,
//! back-right.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{SMatrix, Vector2, Vector3};
use serde::{Deserialize, Serialize};

// Internal
use super::{DriveCtrlError, NUM_MODULES};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Module speeds below this magnitude are treated as zero, in which case the
/// module's previous steer angle is held rather than snapping to the
/// (undefined) direction of a zero vector.
pub const SPEED_EPSILON_MS: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A chassis-frame velocity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChassisSpeeds {
    /// Forward velocity in meters/second.
    pub vx_ms: f64,

    /// Strafe (leftward) velocity in meters/second.
    pub vy_ms: f64,

    /// Angular velocity in radians/second, counter-clockwise positive.
    pub omega_rads: f64,
}

/// The target state of a single swerve module.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleState {
    /// Wheel speed in meters/second.
    pub speed_ms: f64,

    /// Module heading in radians, counter-clockwise from the robot's forward
    /// axis.
    pub angle_rad: f64,
}

/// Kinematic transforms between chassis speeds and module states.
///
/// Built once at init from the chassis geometry and never mutated afterwards.
pub struct SwerveKinematics {
    /// Fixed position of each module relative to the rotation centre.
    ///
    /// Units: meters,
    /// Frame: robot body
    module_positions_m: [Vector2<f64>; NUM_MODULES],

    /// Inverse kinematics matrix mapping (vx, vy, omega) to the stacked
    /// per-module velocity vectors.
    inverse_matrix: SMatrix<f64, 8, 3>,

    /// Forward kinematics matrix, the least-squares pseudo-inverse of
    /// `inverse_matrix`.
    forward_matrix: SMatrix<f64, 3, 8>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ChassisSpeeds {
    /// True if the command is numerically negligible in all three components.
    pub fn is_negligible(&self) -> bool {
        self.vx_ms.abs() < SPEED_EPSILON_MS
            && self.vy_ms.abs() < SPEED_EPSILON_MS
            && self.omega_rads.abs() < SPEED_EPSILON_MS
    }
}

impl SwerveKinematics {
    /// Build the kinematics from the chassis geometry.
    ///
    /// `track_width_m` is the left-right module separation, `wheelbase_m` the
    /// front-back separation. The module position offsets are symmetric about
    /// the robot centre.
    pub fn new(track_width_m: f64, wheelbase_m: f64) -> Result<Self, DriveCtrlError> {
        let half_wb = 0.5 * wheelbase_m;
        let half_tw = 0.5 * track_width_m;

        let module_positions_m = [
            Vector2::new(half_wb, half_tw),
            Vector2::new(half_wb, -half_tw),
            Vector2::new(-half_wb, half_tw),
            Vector2::new(-half_wb, -half_tw),
        ];

        // Each module's velocity is the chassis translation plus the cross
        // product of omega with the module's position offset:
        //     v_i = (vx - omega * y_i, vy + omega * x_i)
        let mut inverse_matrix = SMatrix::<f64, 8, 3>::zeros();
        for (i, pos) in module_positions_m.iter().enumerate() {
            inverse_matrix[(2 * i, 0)] = 1.0;
            inverse_matrix[(2 * i, 2)] = -pos.y;
            inverse_matrix[(2 * i + 1, 1)] = 1.0;
            inverse_matrix[(2 * i + 1, 2)] = pos.x;
        }

        // Normal-equation pseudo-inverse for the forward transform
        let forward_matrix = (inverse_matrix.transpose() * inverse_matrix)
            .try_inverse()
            .ok_or(DriveCtrlError::DegenerateGeometry)?
            * inverse_matrix.transpose();

        Ok(Self {
            module_positions_m,
            inverse_matrix,
            forward_matrix,
        })
    }

    /// Decompose a chassis velocity into the four module states.
    ///
    /// `prev_angles_rad` gives the angle each module held on the previous
    /// cycle, which is kept for any module whose required speed is
    /// negligible.
    pub fn inverse(
        &self,
        speeds: &ChassisSpeeds,
        prev_angles_rad: &[f64; NUM_MODULES],
    ) -> [ModuleState; NUM_MODULES] {
        // A negligible command holds every module at its previous angle
        // without going through the transform at all
        if speeds.is_negligible() {
            let mut states = [ModuleState::default(); NUM_MODULES];
            for i in 0..NUM_MODULES {
                states[i].angle_rad = prev_angles_rad[i];
            }
            return states;
        }

        let cmd = Vector3::new(speeds.vx_ms, speeds.vy_ms, speeds.omega_rads);
        let module_vels = self.inverse_matrix * cmd;

        let mut states = [ModuleState::default(); NUM_MODULES];

        for i in 0..NUM_MODULES {
            let vx = module_vels[2 * i];
            let vy = module_vels[2 * i + 1];
            let speed_ms = vx.hypot(vy);

            if speed_ms < SPEED_EPSILON_MS {
                states[i] = ModuleState {
                    speed_ms: 0.0,
                    angle_rad: prev_angles_rad[i],
                };
            }
            else {
                states[i] = ModuleState {
                    speed_ms,
                    angle_rad: vy.atan2(vx),
                };
            }
        }

        states
    }

    /// Recover the chassis speeds achieved by a set of module states.
    ///
    /// This is the least-squares inverse of [`SwerveKinematics::inverse`],
    /// used for telemetry estimates and the simulated IMU's yaw integration.
    pub fn forward(&self, states: &[ModuleState; NUM_MODULES]) -> ChassisSpeeds {
        let mut module_vels = SMatrix::<f64, 8, 1>::zeros();

        for (i, state) in states.iter().enumerate() {
            module_vels[2 * i] = state.speed_ms * state.angle_rad.cos();
            module_vels[2 * i + 1] = state.speed_ms * state.angle_rad.sin();
        }

        let chassis = self.forward_matrix * module_vels;

        ChassisSpeeds {
            vx_ms: chassis[0],
            vy_ms: chassis[1],
            omega_rads: chassis[2],
        }
    }

    /// Get the fixed module position offsets.
    pub fn module_positions_m(&self) -> &[Vector2<f64>; NUM_MODULES] {
        &self.module_positions_m
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Uniformly scale the module speeds down so that none exceeds
/// `max_speed_ms`, preserving their relative ratios.
///
/// Returns the applied scale factor, or `None` if no module exceeded the
/// maximum. Scaling all modules by the same factor preserves the shape of the
/// commanded motion, whereas clipping only the fastest module would distort
/// the robot's actual trajectory.
pub fn desaturate(
    states: &mut [ModuleState; NUM_MODULES],
    max_speed_ms: f64,
) -> Option<f64> {
    let max_attained = states
        .iter()
        .map(|s| s.speed_ms.abs())
        .fold(0.0, f64::max);

    if max_attained > max_speed_ms {
        let scale = max_speed_ms / max_attained;

        for state in states.iter_mut() {
            state.speed_ms *= scale;
        }

        Some(scale)
    }
    else {
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const EPSILON: f64 = 1e-9;

    /// Geometry used throughout: track width = wheelbase = 0.635 m.
    fn kin() -> SwerveKinematics {
        SwerveKinematics::new(0.635, 0.635).unwrap()
    }

    #[test]
    fn test_pure_forward_command() {
        let states = kin().inverse(
            &ChassisSpeeds {
                vx_ms: 1.0,
                vy_ms: 0.0,
                omega_rads: 0.0,
            },
            &[0.0; NUM_MODULES],
        );

        for state in states.iter() {
            assert!((state.speed_ms - 1.0).abs() < EPSILON);
            assert!(state.angle_rad.abs() < EPSILON);
        }
    }

    #[test]
    fn test_pure_rotation_command() {
        let kin = kin();
        let states = kin.inverse(
            &ChassisSpeeds {
                vx_ms: 0.0,
                vy_ms: 0.0,
                omega_rads: 1.0,
            },
            &[0.0; NUM_MODULES],
        );

        // Each module moves at omega * radius, tangentially
        let radius_m = (2f64 * 0.3175f64.powi(2)).sqrt();

        for (state, pos) in states.iter().zip(kin.module_positions_m().iter()) {
            assert!((state.speed_ms - radius_m).abs() < EPSILON);

            // The module velocity must be perpendicular to the radius vector
            // and consistent with positive omega
            let radial_angle = pos.y.atan2(pos.x);
            let mut diff = state.angle_rad - radial_angle;
            while diff > std::f64::consts::PI {
                diff -= std::f64::consts::TAU;
            }
            while diff < -std::f64::consts::PI {
                diff += std::f64::consts::TAU;
            }
            assert!((diff - std::f64::consts::FRAC_PI_2).abs() < EPSILON);
        }
    }

    #[test]
    fn test_zero_command_holds_angles() {
        let prev_angles = [0.1, -0.7, 2.5, 3.0];
        let states = kin().inverse(&ChassisSpeeds::default(), &prev_angles);

        for (state, prev) in states.iter().zip(prev_angles.iter()) {
            assert_eq!(state.speed_ms, 0.0);
            assert_eq!(state.angle_rad, *prev);
        }
    }

    #[test]
    fn test_negligible_command_detection() {
        assert!(ChassisSpeeds::default().is_negligible());
        assert!(ChassisSpeeds {
            vx_ms: 0.5 * SPEED_EPSILON_MS,
            vy_ms: -0.5 * SPEED_EPSILON_MS,
            omega_rads: 0.0,
        }
        .is_negligible());

        assert!(!ChassisSpeeds {
            vx_ms: 0.1,
            vy_ms: 0.0,
            omega_rads: 0.0,
        }
        .is_negligible());
        assert!(!ChassisSpeeds {
            vx_ms: 0.0,
            vy_ms: 0.0,
            omega_rads: 0.1,
        }
        .is_negligible());
    }

    #[test]
    fn test_inverse_forward_round_trip() {
        let kin = kin();

        let commands = [
            ChassisSpeeds { vx_ms: 1.0, vy_ms: 0.0, omega_rads: 0.0 },
            ChassisSpeeds { vx_ms: 0.0, vy_ms: -0.5, omega_rads: 0.0 },
            ChassisSpeeds { vx_ms: 0.3, vy_ms: 0.4, omega_rads: 1.5 },
            ChassisSpeeds { vx_ms: -1.2, vy_ms: 0.8, omega_rads: -2.0 },
        ];

        for cmd in commands.iter() {
            let states = kin.inverse(cmd, &[0.0; NUM_MODULES]);
            let recovered = kin.forward(&states);

            assert!((recovered.vx_ms - cmd.vx_ms).abs() < EPSILON);
            assert!((recovered.vy_ms - cmd.vy_ms).abs() < EPSILON);
            assert!((recovered.omega_rads - cmd.omega_rads).abs() < EPSILON);
        }
    }

    #[test]
    fn test_desaturation_preserves_ratios() {
        let kin = kin();
        let cmd = ChassisSpeeds {
            vx_ms: 3.0,
            vy_ms: 1.0,
            omega_rads: 4.0,
        };

        let raw = kin.inverse(&cmd, &[0.0; NUM_MODULES]);
        let max_speed_ms = 2.0;
        assert!(raw.iter().any(|s| s.speed_ms > max_speed_ms));

        let mut desat = raw;
        let scale = desaturate(&mut desat, max_speed_ms);
        assert!(scale.is_some());

        for state in desat.iter() {
            assert!(state.speed_ms <= max_speed_ms + EPSILON);
        }

        // All pairwise ratios unchanged
        for i in 0..NUM_MODULES {
            for j in 0..NUM_MODULES {
                let raw_ratio = raw[i].speed_ms / raw[j].speed_ms;
                let desat_ratio = desat[i].speed_ms / desat[j].speed_ms;
                assert!((raw_ratio - desat_ratio).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_desaturation_noop_below_max() {
        let mut states = kin().inverse(
            &ChassisSpeeds {
                vx_ms: 0.5,
                vy_ms: 0.0,
                omega_rads: 0.0,
            },
            &[0.0; NUM_MODULES],
        );

        assert!(desaturate(&mut states, 2.0).is_none());
    }
}
