use std::path::Path;

use tether_types::{ConfigError, TetherConfig};

/// Load and validate the configuration document at `path`.
///
/// Either a complete, validated configuration comes back or an error; a
/// failed load never leaves a partially populated config behind.
pub fn load_config(path: &Path) -> Result<TetherConfig, ConfigError> {
    let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    TetherConfig::from_yaml(&data)
}
