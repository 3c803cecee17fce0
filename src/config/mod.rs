pub mod types;

use crate::error::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};

pub use types::Config;

pub const CONFIG_FILE_NAME: &str = ".kube-score.toml";

/// Get the global config file path (~/.kube-score.toml)
pub fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(CONFIG_FILE_NAME))
}

/// Get the local config file path (dir/.kube-score.toml)
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE_NAME)
}

/// Load configuration.
///
/// An explicit path must exist. Otherwise the current directory is tried
/// first, then the home directory, and defaults are used when neither has
/// a config file. A file that exists but does not parse is an error.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    if let Some(path) = explicit {
        return read_config(path);
    }

    let local = std::env::current_dir().ok().map(|cwd| local_config_path(&cwd));
    for candidate in local.into_iter().chain(global_config_path()) {
        if candidate.is_file() {
            return read_config(&candidate);
        }
    }

    log::debug!("No {} found, using defaults", CONFIG_FILE_NAME);
    Ok(Config::default())
}

/// Read and parse a single config file.
pub fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("Loaded configuration from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_config() {
        let dir = TempDir::new().unwrap();
        let path = local_config_path(dir.path());
        fs::write(
            &path,
            r#"
ignore_tests = ["container-image-tag"]
enable_optional_tests = ["container-seccomp-profile"]
kubernetes_version = "v1.24"
exit_one_on_warning = true
output_format = "ci"
"#,
        )
        .unwrap();

        let config = read_config(&path).unwrap();
        assert_eq!(config.ignore_tests, vec!["container-image-tag"]);
        assert_eq!(config.enable_optional_tests, vec!["container-seccomp-profile"]);
        assert_eq!(config.kubernetes_version.as_deref(), Some("v1.24"));
        assert!(config.exit_one_on_warning);
        assert!(!config.ignore_container_cpu_limit);
        assert_eq!(config.output_format.as_deref(), Some("ci"));
    }

    #[test]
    fn test_empty_file_is_default() {
        let dir = TempDir::new().unwrap();
        let path = local_config_path(dir.path());
        fs::write(&path, "").unwrap();
        assert_eq!(read_config(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = local_config_path(dir.path());
        fs::write(&path, "ignore_tests = [").unwrap();
        assert!(matches!(read_config(&path), Err(ConfigError::Parse { .. })));

        fs::write(&path, "no_such_key = true").unwrap();
        assert!(matches!(read_config(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_missing_explicit_path_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = load_config(Some(&dir.path().join("missing.toml")));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
