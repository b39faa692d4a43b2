//! Reference directory resolution.

use std::path::PathBuf;

/// Environment variable for overriding the reference directory.
pub const REFERENCE_ENV_VAR: &str = "PQA_REFERENCE_DIR";

/// Get the reference table directory.
///
/// Resolution order:
/// 1. `PQA_REFERENCE_DIR` environment variable
/// 2. `help_files/` directory relative to workspace root
pub fn reference_dir() -> PathBuf {
    if let Ok(root) = std::env::var(REFERENCE_ENV_VAR) {
        return PathBuf::from(root);
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../help_files")
}
