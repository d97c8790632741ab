use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{env_subst::substitute_env, schema::OnairConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["onair.toml", "onair.yaml", "onair.yml", "onair.json"];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<OnairConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Load the explicitly requested file, or discover one in standard locations.
///
/// Search order when `explicit` is `None`:
/// 1. `./onair.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/onair/onair.{toml,yaml,yml,json}` (user-global)
///
/// Unlike a UI-driven app there is nothing useful to do without credentials,
/// so a missing file is an error rather than a silent default.
pub fn discover_and_load(explicit: Option<&Path>) -> anyhow::Result<(OnairConfig, PathBuf)> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => find_config_file().ok_or_else(|| {
            anyhow::anyhow!(
                "no config file found (looked for {} in ./ and {})",
                CONFIG_FILENAMES.join(", "),
                config_dir()
                    .map(|d| d.display().to_string())
                    .unwrap_or_else(|| "~/.config/onair".into())
            )
        })?,
    };
    debug!(path = %path.display(), "loading config");
    let cfg = load_config(&path)?;
    Ok((cfg, path))
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let config_dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| config_dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/onair/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "onair").map(|d| d.config_dir().to_path_buf())
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<OnairConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}
