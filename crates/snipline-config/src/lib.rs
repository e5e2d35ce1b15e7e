use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// Indentation used when a snippet lands in a buffer that does not set
/// its own options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndentConfig {
    pub shiftwidth: usize,
    pub tabstop: usize,
    pub expandtab: bool,
}

impl Default for IndentConfig {
    fn default() -> Self {
        Self {
            shiftwidth: 4,
            tabstop: 8,
            expandtab: true,
        }
    }
}

impl IndentConfig {
    /// The settings as `(name, value)` editor options.
    pub fn as_options(&self) -> [(&'static str, String); 3] {
        [
            ("shiftwidth", self.shiftwidth.to_string()),
            ("tabstop", self.tabstop.to_string()),
            ("expandtab", self.expandtab.to_string()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the CLI writes its trace log. Nothing is logged without it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    pub shell_timeout_ms: u64,
    pub indent: IndentConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_file: None,
            shell_timeout_ms: 5000,
            indent: IndentConfig::default(),
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the log path
        config.log_file = config
            .log_file
            .map(|path| Self::expand_path(&path).unwrap_or(path));

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/snipline");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    pub fn shell_timeout(&self) -> Duration {
        Duration::from_millis(self.shell_timeout_ms)
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/snipline/config.toml"));
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.shell_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_indent_section_keeps_other_defaults() {
        let config: Config = toml::from_str("[indent]\nshiftwidth = 2\n").unwrap();

        assert_eq!(
            config.indent,
            IndentConfig {
                shiftwidth: 2,
                ..IndentConfig::default()
            }
        );
    }

    #[test]
    fn test_indent_as_options() {
        let indent = IndentConfig {
            shiftwidth: 2,
            tabstop: 4,
            expandtab: false,
        };

        assert_eq!(
            indent.as_options(),
            [
                ("shiftwidth", "2".to_string()),
                ("tabstop", "4".to_string()),
                ("expandtab", "false".to_string()),
            ]
        );
    }

    #[test]
    fn test_expand_path_with_env_var() {
        unsafe {
            env::set_var("SNIPLINE_TEST_VAR", "/test/env/path");
        }

        let path = PathBuf::from("$SNIPLINE_TEST_VAR/subdir");
        let expanded = Config::expand_path(&path);

        assert_eq!(expanded, Some(PathBuf::from("/test/env/path/subdir")));

        unsafe {
            env::remove_var("SNIPLINE_TEST_VAR");
        }
    }

    #[test]
    fn test_expand_path_with_relative_path() {
        let path = PathBuf::from("relative/path");
        let expanded = Config::expand_path(&path).unwrap();

        assert_eq!(expanded, path);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_load_invalid_config_reports_path() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "shell_timeout_ms = \"soon\"").unwrap();

        let err = Config::load_from_path(&config_file).unwrap_err();

        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested").join("config.toml");
        let test_config = Config {
            log_file: Some(PathBuf::from("/tmp/snipline.log")),
            shell_timeout_ms: 250,
            indent: IndentConfig {
                shiftwidth: 2,
                tabstop: 2,
                expandtab: false,
            },
        };

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }

    #[test]
    fn test_log_file_with_tilde_is_expanded_on_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "log_file = \"~/snipline/trace.log\"\n").unwrap();

        let config = Config::load_from_path(&config_file).unwrap().unwrap();
        let log_file = config.log_file.unwrap();

        assert!(!log_file.to_string_lossy().starts_with('~'));
        assert!(log_file.ends_with("snipline/trace.log"));
    }
}
