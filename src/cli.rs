//! CLI argument parsing with clap.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ufwblock")]
#[command(author, version, about = "Block an IPv4 address's registered network range with ufw")]
pub struct Cli {
    /// IPv4 address whose range should be blocked
    ///
    /// Collected as a list so that a wrong count is reported by the blocker
    /// itself, after the privilege check.
    #[arg(value_name = "IP-ADDRESS")]
    pub targets: Vec<String>,

    /// Log file path (default: ufwblock.log next to the executable)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Quiet mode (errors only)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Verbose mode (debug output)
    #[arg(short, long)]
    pub verbose: bool,

    /// Insert the rule even if an identical deny rule already exists
    #[arg(long)]
    pub force: bool,

    /// Resolve the range and report the rule without touching the firewall
    #[arg(long)]
    pub dry_run: bool,

    /// WHOIS query timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub whois_timeout: Option<u64>,

    /// Package install timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub install_timeout: Option<u64>,

    /// Timeout in seconds for every other command (which, ufw)
    #[arg(long, value_name = "SECS")]
    pub command_timeout: Option<u64>,
}
