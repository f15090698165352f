//! Host platform utility functions

use std::path::PathBuf;

/// Environment variable giving the root directory of the software install.
///
/// Parameter files and session directories are resolved relative to this
/// root.
pub const SW_ROOT_ENV_VAR: &str = "SWERVE_SW_ROOT";

/// Get the software root directory from the environment.
pub fn get_sw_root() -> Result<PathBuf, std::env::VarError> {
    std::env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
