use std::{fs, path::Path};

use anyhow::{Context, Result};
use civitas_system_routing::Config;
use serde::Deserialize;

/// Contents of the optional TOML configuration file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Settings {
    /// Flood fill limits handed to the router.
    pub(crate) routing: Config,
}

impl Settings {
    pub(crate) fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read configuration at {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("failed to parse configuration at {}", path.display()))
    }

    fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse configuration toml contents")
    }
}
