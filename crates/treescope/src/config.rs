use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Layered configuration: a global file plus an optional repo-local override.
#[derive(Deserialize, Serialize, Debug, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub search: SearchDefaults,
}

/// Defaults applied to searches when the caller leaves the knobs unset.
#[derive(Deserialize, Serialize, Debug, Default, Clone)]
pub struct SearchDefaults {
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub max_count: Option<u64>,
    #[serde(default)]
    pub output_format: Option<String>,
}

/// Returns the path to the global configuration file.
/// Can be overridden by TREESCOPE_TEST_CONFIG_DIR for testing.
pub fn global_config_path() -> Option<PathBuf> {
    if let Ok(dir) = env::var("TREESCOPE_TEST_CONFIG_DIR") {
        return Some(PathBuf::from(dir).join("treescope/config.toml"));
    }
    dirs::config_dir().map(|p| p.join("treescope/config.toml"))
}

/// Searches for a local `.treescope.toml` in the directory and its parents.
fn find_local_config(start_dir: &Path) -> Option<PathBuf> {
    for ancestor in start_dir.ancestors() {
        let candidate = ancestor.join(".treescope.toml");
        if candidate.exists() {
            return Some(candidate);
        }
    }
    None
}

/// Loads the configuration, with the local file overriding the global one.
pub fn load_config() -> Result<Config> {
    let mut config = Config::default();

    if let Some(global_path) = global_config_path() {
        if global_path.exists() {
            let raw = fs::read_to_string(&global_path)
                .with_context(|| format!("failed to read global config at {global_path:?}"))?;
            config = toml::from_str(&raw)
                .with_context(|| format!("failed to parse global config at {global_path:?}"))?;
        }
    }

    let cwd = env::current_dir()?;
    if let Some(local_path) = find_local_config(&cwd) {
        let raw = fs::read_to_string(&local_path)
            .with_context(|| format!("failed to read local config at {local_path:?}"))?;
        let local: Config = toml::from_str(&raw)
            .with_context(|| format!("failed to parse local config at {local_path:?}"))?;
        merge(&mut config, local);
    }

    Ok(config)
}

fn merge(base: &mut Config, local: Config) {
    if !local.search.exclude_globs.is_empty() {
        base.search.exclude_globs = local.search.exclude_globs;
    }
    if local.search.max_count.is_some() {
        base.search.max_count = local.search.max_count;
    }
    if local.search.output_format.is_some() {
        base.search.output_format = local.search.output_format;
    }
}
