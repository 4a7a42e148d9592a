use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::Config;

/// File name looked up in the working directory
pub const LOCAL_CONFIG: &str = "nbtree.toml";

/// Error type for config loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Get the user config file path, respecting XDG_CONFIG_HOME
pub fn user_config_path() -> PathBuf {
    let config_dir = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_home().join(".config"));
    config_dir.join("nbtree").join("config.toml")
}

/// Get the user's home directory
fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/"))
}

/// Read and parse a config file.
pub fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let text = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Resolve the config to use.
///
/// An explicit path must exist. Otherwise `nbtree.toml` in `cwd` wins over
/// the user config; with neither present the defaults apply.
pub fn load_config(explicit: Option<&Path>, cwd: &Path) -> Result<Config, ConfigError> {
    if let Some(path) = explicit {
        tracing::debug!(path = %path.display(), "loading config");
        return read_config(path);
    }

    let candidates = [cwd.join(LOCAL_CONFIG), user_config_path()];
    for path in &candidates {
        if path.is_file() {
            tracing::debug!(path = %path.display(), "loading config");
            return read_config(path);
        }
    }

    tracing::debug!("no config file found, using defaults");
    Ok(Config::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::OrphanPolicy;
    use tempfile::TempDir;

    #[test]
    fn explicit_path_is_read() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("custom.toml");
        fs::write(&path, "[build]\norphans = \"promote\"\n").unwrap();

        let config = load_config(Some(&path), tmp.path()).unwrap();
        assert_eq!(config.build.orphans, OrphanPolicy::Promote);
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nope.toml");
        let err = load_config(Some(&path), tmp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn local_config_is_discovered() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(LOCAL_CONFIG),
            "[output]\nlabel = \"text\"\nchildren = \"nodes\"\n",
        )
        .unwrap();

        let config = load_config(None, tmp.path()).unwrap();
        assert_eq!(config.output.label, "text");
        assert_eq!(config.output.children, "nodes");
    }

    #[test]
    fn bad_toml_names_the_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(LOCAL_CONFIG);
        fs::write(&path, "[build]\norphans = \"sometimes\"\n").unwrap();

        let err = read_config(&path).unwrap_err();
        assert!(err.to_string().contains("nbtree.toml"));
    }
}
