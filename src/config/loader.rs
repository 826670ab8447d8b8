use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use super::types::Config;

/// Project-local config file name, checked in the working directory.
pub const LOCAL_FILE: &str = ".dockdeck.yaml";

/// Load config from `path`.
pub fn load_file(path: &Path) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(&contents)
        .with_context(|| format!("invalid config {}", path.display()))
}

/// First existing config file: `<cwd>/.dockdeck.yaml`, then
/// `<config dir>/dockdeck/config.yaml`.
pub fn discover(cwd: &Path) -> Option<PathBuf> {
    let local = cwd.join(LOCAL_FILE);
    if local.is_file() {
        return Some(local);
    }
    let user = dirs::config_dir()?.join("dockdeck").join("config.yaml");
    user.is_file().then_some(user)
}

/// Resolve and load the config.
///
/// An explicit path must exist; otherwise discovery is used and a missing
/// file yields the defaults.
pub fn load(explicit: Option<&Path>, cwd: &Path) -> anyhow::Result<(Config, Option<PathBuf>)> {
    let path = match explicit {
        Some(p) => Some(p.to_path_buf()),
        None => discover(cwd),
    };
    match path {
        Some(p) => {
            debug!(path = %p.display(), "loading config");
            let cfg = load_file(&p)?;
            Ok((cfg, Some(p)))
        }
        None => Ok((Config::default(), None)),
    }
}
