//! Configuration management for procexec.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cli::Args;
use crate::execution::Command;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Defaults applied to every executed command.
    pub exec: ExecSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Execution defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecSection {
    /// Fail on non-zero exit codes.
    pub check: bool,
    /// Merge stderr into stdout.
    pub redirect: bool,
    /// Working directory (defaults to the current directory).
    pub home: Option<PathBuf>,
    /// Environment variables set on top of the inherited environment.
    pub env: HashMap<String, String>,
}

impl Default for ExecSection {
    fn default() -> Self {
        Self {
            check: true,
            redirect: false,
            home: None,
            env: HashMap::new(),
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log filter (error, warn, info, debug, trace, or an `EnvFilter` directive).
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        if let Ok(home) = std::env::var("PROCEXEC_HOME") {
            if !home.is_empty() {
                self.exec.home = Some(PathBuf::from(home));
            }
        }

        if let Ok(level) = std::env::var("PROCEXEC_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if args.no_check {
            self.exec.check = false;
        }

        if args.redirect {
            self.exec.redirect = true;
        }

        if let Some(ref home) = args.home {
            self.exec.home = Some(home.clone());
        }

        for (name, value) in &args.env {
            self.exec.env.insert(name.clone(), value.clone());
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(ref path) = args.config {
            config = Config::from_file(path)?;
        }

        config.apply_env();
        config.apply_args(args);

        Ok(config)
    }

    /// Layer the execution defaults onto a command.
    pub fn apply_to(&self, command: &Command) -> crate::Result<Command> {
        let mut command = command
            .with_check(self.exec.check)
            .with_redirect(self.exec.redirect);

        if let Some(ref home) = self.exec.home {
            command = command.with_home(home)?;
        }

        for (name, value) in &self.exec.env {
            command = command.with_env(name, value)?;
        }

        Ok(command)
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.exec.check);
        assert!(!config.exec.redirect);
        assert!(config.exec.home.is_none());
        assert!(config.exec.env.is_empty());
        assert_eq!(config.log_filter(), "info");
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "exec": {
                "check": false,
                "redirect": true,
                "home": "/srv/app",
                "env": { "LANG": "C.UTF-8" }
            },
            "logging": { "level": "debug" }
        }"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert!(!config.exec.check);
        assert!(config.exec.redirect);
        assert_eq!(config.exec.home, Some(PathBuf::from("/srv/app")));
        assert_eq!(config.exec.env.get("LANG"), Some(&"C.UTF-8".to_string()));
        assert_eq!(config.log_filter(), "debug");
    }

    #[test]
    fn test_config_partial_json() {
        let json = r#"{ "exec": { "check": false } }"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert!(!config.exec.check);
        assert!(!config.exec.redirect); // Default
        assert_eq!(config.log_filter(), "info");
    }

    #[test]
    fn test_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
        assert!(err.to_string().contains("failed to parse"));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file(Path::new("/no/such/procexec.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_apply_args() {
        let mut config = Config::default();
        let args = Args {
            home: Some(PathBuf::from("/work")),
            env: vec![("KEY".to_string(), "value".to_string())],
            no_check: true,
            redirect: true,
            log_level: Some("trace".to_string()),
            ..Args::default()
        };

        config.apply_args(&args);

        assert!(!config.exec.check);
        assert!(config.exec.redirect);
        assert_eq!(config.exec.home, Some(PathBuf::from("/work")));
        assert_eq!(config.exec.env.get("KEY"), Some(&"value".to_string()));
        assert_eq!(config.log_filter(), "trace");
    }

    #[test]
    fn test_apply_to_command() {
        let mut config = Config::default();
        config.exec.check = false;
        config.exec.home = Some(PathBuf::from("/tmp"));
        config
            .exec
            .env
            .insert("GREETING".to_string(), "hi".to_string());

        let base = Command::new(["env"]).unwrap();
        let command = config.apply_to(&base).unwrap();

        assert!(!command.check());
        assert!(!command.redirect());
        assert_eq!(command.home(), Path::new("/tmp"));
        assert_eq!(command.env().get("GREETING"), Some(&"hi".to_string()));
        assert!(base.check());
    }

    #[test]
    fn test_apply_to_rejects_bad_env() {
        let mut config = Config::default();
        config.exec.env.insert(String::new(), "x".to_string());
        assert!(config.apply_to(&Command::default()).is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        assert!(json.contains("\"check\""));
        assert!(json.contains("\"level\""));
    }
}
