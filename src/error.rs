//! Error types for ufwblock.
//!
//! Every variant is terminal: the pipeline logs it once and exits with
//! status 1.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlockError {
    #[error("This tool requires root privileges. Run it with sudo.")]
    Permission,

    #[error("Usage: {program} <IP-ADDRESS>")]
    Usage { program: String },

    #[error("Invalid IPv4 address format: {0}")]
    Validation(String),

    #[error("Failed to install {package}: {reason}")]
    Dependency {
        package: String,
        ip: String,
        reason: String,
    },

    #[error("Failed to add rule deny from {cidr}: {reason}")]
    RuleInsert {
        cidr: String,
        ip: String,
        reason: String,
    },
}

impl BlockError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> u8 {
        1
    }

    /// Address to tag the log line with, if one had been validated
    pub fn ip(&self) -> Option<&str> {
        match self {
            BlockError::Dependency { ip, .. } | BlockError::RuleInsert { ip, .. } => Some(ip.as_str()),
            _ => None,
        }
    }
}
