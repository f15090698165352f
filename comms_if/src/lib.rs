//! # Communications interface crate.
//!
//! Provides all common communications interfaces for the software.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

/// Telecommand definitions and parsing
pub mod tc;

/// Command and data definitions for equipment (the drive modules)
pub mod eqpt;

/// Network module
pub mod net;
