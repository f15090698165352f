//! # Drive executable library.
//!
//! This library allows other crates in the workspace (and the benches) to
//! access items defined inside the drive executable crate.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

/// Actuator driver - forwards drive demands to the module actuators
pub mod act_driver;

/// Global data store for the executable
pub mod data_store;

/// Drivetrain control module - converts chassis velocity commands into individual module commands
pub mod drive_ctrl;

/// Simulated equipment - module actuators and IMU for bench runs and tests
pub mod sim_eqpt;

/// Telecommand server - receives telecommands from the operator
pub mod tc_server;

/// Telemetry server - publishes the state of the executable
pub mod tm_server;
