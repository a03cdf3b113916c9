//! Small fixed constants used across the CLI layer.

/// Default configuration file name looked up in the workspace root when `--config`
/// is not given.
pub const DEFAULT_CONFIG_FILE_NAME: &str = "phpmix.yaml";

/// Environment variable read by [`crate::utils::logger::initialize_logger`].
pub const LOG_ENV_VAR: &str = "PHPMIX_LOG";
