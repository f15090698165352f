//! # Equipment definitions
//!
//! Command and data definitions for the equipment attached to the robot.

pub mod drive;
