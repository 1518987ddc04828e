//! Runtime configuration for ufwblock.
//!
//! There is no config file: everything comes from command-line flags on top
//! of the defaults below.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::Level;

use crate::cli::Cli;

/// Default log file name, placed next to the executable
pub const LOG_FILE_NAME: &str = "ufwblock.log";

/// Position the deny rule is inserted at (top of the chain)
pub const RULE_POSITION: u32 = 1;

/// External programs the pipeline shells out to
#[derive(Debug, Clone)]
pub struct Tools {
    /// Executable lookup (`which <name>`)
    pub which: String,
    /// Package manager binary
    pub package_manager: String,
    /// Arguments placed before the package name
    pub install_args: Vec<String>,
    /// WHOIS client
    pub whois: String,
    /// Firewall control utility
    pub firewall: String,
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            which: "which".to_string(),
            package_manager: "apt-get".to_string(),
            install_args: vec!["install".to_string(), "-y".to_string()],
            whois: "whois".to_string(),
            firewall: "ufw".to_string(),
        }
    }
}

/// Per-call subprocess deadlines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub whois: Duration,
    pub install: Duration,
    pub command: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            whois: Duration::from_secs(15),
            install: Duration::from_secs(300),
            command: Duration::from_secs(30),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone)]
pub struct Config {
    /// Log file path
    pub log_file: PathBuf,

    /// Minimum level written to both sinks
    pub log_level: Level,

    /// Resolve and report only, leave the firewall untouched
    pub dry_run: bool,

    /// Insert even if an identical deny rule already exists
    pub force: bool,

    pub timeouts: Timeouts,

    pub tools: Tools,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_file: default_log_file(),
            log_level: Level::INFO,
            dry_run: false,
            force: false,
            timeouts: Timeouts::default(),
            tools: Tools::default(),
        }
    }
}

impl Config {
    /// Build the configuration from parsed command-line flags
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let defaults = Timeouts::default();

        let log_level = if cli.verbose {
            Level::DEBUG
        } else if cli.quiet {
            Level::ERROR
        } else {
            Level::INFO
        };

        let config = Self {
            log_file: cli.log_file.clone().unwrap_or_else(default_log_file),
            log_level,
            dry_run: cli.dry_run,
            force: cli.force,
            timeouts: Timeouts {
                whois: cli.whois_timeout.map(Duration::from_secs).unwrap_or(defaults.whois),
                install: cli
                    .install_timeout
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.install),
                command: cli
                    .command_timeout
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.command),
            },
            tools: Tools::default(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let timeouts = [
            ("whois", self.timeouts.whois),
            ("install", self.timeouts.install),
            ("command", self.timeouts.command),
        ];
        for (name, timeout) in timeouts {
            if timeout.is_zero() {
                anyhow::bail!("The {} timeout must be at least one second", name);
            }
        }

        if self.log_file.as_os_str().is_empty() {
            anyhow::bail!("Log file path cannot be empty");
        }

        Ok(())
    }
}

/// `ufwblock.log` in the executable's directory, or the working directory
/// when that cannot be determined
pub fn default_log_file() -> PathBuf {
    std::env::current_exe()
        .ok()
        .as_deref()
        .and_then(Path::parent)
        .map(|dir| dir.join(LOG_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(LOG_FILE_NAME))
}
