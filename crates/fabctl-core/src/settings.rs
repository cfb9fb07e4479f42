//! # Process Settings
//!
//! [`Settings`] is built once per invocation by the entry point and handed
//! to every command. It carries the home directory, the output streams,
//! the loaded configuration, and where shutdown notices go.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::config::Config;
use crate::error::ConfigError;
use crate::streams::Streams;

/// Environment variable overriding the home directory.
pub const HOME_ENV: &str = "FABRIC_HOME";

/// File name of the configuration inside the home directory.
pub const CONFIG_FILE: &str = "config.yaml";

/// Root directory holding the CLI configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Home(PathBuf);

impl Home {
    /// Use an explicit directory.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// `$FABRIC_HOME`, else `$HOME/.fabric`.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self(PathBuf::from(dir)));
        }
        std::env::var_os("HOME")
            .filter(|v| !v.is_empty())
            .map(|home| Self(PathBuf::from(home).join(".fabric")))
            .ok_or(ConfigError::HomeNotFound)
    }

    /// Path of the configuration file.
    pub fn config_path(&self) -> PathBuf {
        self.0.join(CONFIG_FILE)
    }

    /// Load the configuration file. A missing file is an empty configuration.
    pub fn load_config(&self) -> Result<Config, ConfigError> {
        let path = self.config_path();
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no configuration file, starting empty");
                return Ok(Config::default());
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };
        if content.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Persist the configuration, creating the home directory if needed.
    pub fn save_config(&self, config: &Config) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.0).map_err(|source| ConfigError::Io {
            path: self.0.clone(),
            source,
        })?;
        let yaml = serde_yaml::to_string(config).map_err(ConfigError::Serialize)?;
        let path = self.config_path();
        std::fs::write(&path, yaml).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }
}

impl fmt::Display for Home {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Where the shutdown coordinator reports what it is doing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NoticeTarget {
    /// Emit through `tracing`, i.e. the diagnostic stream.
    #[default]
    Log,
    /// Write to the command's output stream.
    Output,
}

impl FromStr for NoticeTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "log" => Ok(Self::Log),
            "output" => Ok(Self::Output),
            other => Err(format!(
                "unknown notice target '{other}': expected 'log' or 'output'"
            )),
        }
    }
}

impl fmt::Display for NoticeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Log => f.write_str("log"),
            Self::Output => f.write_str("output"),
        }
    }
}

/// Everything a command needs from its environment.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Configuration root.
    pub home: Home,
    /// Output streams.
    pub streams: Streams,
    /// Loaded configuration, absent when nothing has been loaded.
    pub config: Option<Config>,
    /// Destination of shutdown notices.
    pub shutdown_notices: NoticeTarget,
}

impl Settings {
    /// Settings with no configuration loaded.
    pub fn new(home: Home, streams: Streams) -> Self {
        Self {
            home,
            streams,
            config: None,
            shutdown_notices: NoticeTarget::default(),
        }
    }

    /// Settings with the configuration loaded from `home`.
    pub fn load(home: Home, streams: Streams) -> Result<Self, ConfigError> {
        let config = home.load_config()?;
        Ok(Self {
            config: Some(config),
            ..Self::new(home, streams)
        })
    }

    /// The loaded configuration.
    pub fn config(&self) -> Result<&Config, ConfigError> {
        self.config.as_ref().ok_or(ConfigError::Missing)
    }
}
