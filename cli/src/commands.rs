pub mod columns;
pub mod compose;
pub mod render;

use std::path::Path;

use anyhow::Result;
use papermap::MapConfig;

/// The configuration file if given, defaults otherwise.
pub(crate) fn load_config(path: Option<&Path>) -> Result<MapConfig> {
    Ok(match path {
        Some(path) => MapConfig::load(path)?,
        None => MapConfig::default(),
    })
}
