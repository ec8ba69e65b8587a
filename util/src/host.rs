//! Host platform (linux for example) utility functions

use std::env;
use std::path::PathBuf;

/// Name of the environment variable pointing at the root of the software
/// tree, the directory containing `params/` and `sessions/`.
pub const SW_ROOT_ENV_VAR: &str = "EXO_SW_ROOT";

/// Get the software root directory from the environment.
pub fn get_exo_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
