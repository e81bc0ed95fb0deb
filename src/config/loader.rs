use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use super::core::JarloomConfig;

pub const CONFIG_FILE_NAME: &str = "jarloom.toml";

const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Pure function to read config file contents
pub(crate) fn read_config_file(path: &Path) -> Result<String, std::io::Error> {
    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Pure function to parse and validate config from TOML string
pub fn parse_and_validate_config(contents: &str) -> Result<JarloomConfig, String> {
    let config = toml::from_str::<JarloomConfig>(contents)
        .map_err(|e| format!("Failed to parse {}: {}", CONFIG_FILE_NAME, e))?;
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

/// Pure function to generate directory ancestors up to a depth limit
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Nearest `jarloom.toml` in `start` or its ancestors
pub fn find_config(start: &Path) -> Option<PathBuf> {
    directory_ancestors(start.to_path_buf(), MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|path| path.is_file())
}

/// Load one config file and resolve its paths against its directory
pub fn load_config_from_path(path: &Path) -> Result<JarloomConfig> {
    let contents = read_config_file(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let mut config = parse_and_validate_config(&contents).map_err(|e| anyhow!(e))?;

    let base_dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => parent.to_path_buf(),
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    config.resolve_paths(&base_dir);

    log::debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Load the explicit config, or search upward from the current directory
pub fn load_config(explicit: Option<&Path>) -> Result<JarloomConfig> {
    if let Some(path) = explicit {
        return load_config_from_path(path);
    }

    let current = std::env::current_dir().context("Failed to get current directory")?;
    let path = find_config(&current).ok_or_else(|| {
        anyhow!(
            "No {} found in {} or its {} nearest ancestors",
            CONFIG_FILE_NAME,
            current.display(),
            MAX_TRAVERSAL_DEPTH - 1
        )
    })?;
    load_config_from_path(&path)
}
