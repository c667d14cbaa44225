//! Host platform utility functions

use std::env;
use std::path::PathBuf;

/// Name of the environment variable pointing at the software root directory.
pub const SW_ROOT_VAR: &str = "CARBOT_SW_ROOT";

/// Get the software root directory, which holds the `params` and `sessions`
/// directories.
pub fn get_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_VAR).map(PathBuf::from)
}
