//! # ufwblock - block an address's network range with ufw
//!
//! Given one IPv4 address, ufwblock looks up the block it was allocated
//! from via WHOIS and inserts `deny from <cidr>` at the top of the ufw rule
//! chain.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Blocker                             │
//! ├──────────────────────────────────────────────────────────────┤
//! │  1. check_root          effective uid must be 0              │
//! │  2. validate            exactly one IPv4 dotted quad         │
//! │  3. ensure_dependency   which / apt-get install -y           │
//! │  4. resolve_range       whois, cidr:/route: field, else /32  │
//! │  5. Ufw                 duplicate check, insert 1, reload,   │
//! │                         status numbered                      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every step shells out through [`cmd_abstraction::CommandExecutor`], with a
//! deadline on each call. Fatal errors ([`error::BlockError`]) end the run
//! with exit status 1; WHOIS trouble only narrows the rule to a single host.
//!
//! ## Example Usage
//!
//! ```no_run
//! use ufwblock::blocker::Blocker;
//! use ufwblock::cmd_abstraction::RealCommandExecutor;
//! use ufwblock::config::Config;
//! use ufwblock::enforcer::ProcessPrivileges;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let config = Config::default();
//!     let _log = ufwblock::logging::init(&config.log_file, config.log_level);
//!
//!     let blocker = Blocker::new(RealCommandExecutor::new(), ProcessPrivileges, config);
//!     let code = blocker
//!         .run("ufwblock", &["203.0.113.5".to_string()], &mut std::io::stdout())
//!         .await;
//!     std::process::exit(code.into());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`blocker`] - The blocking pipeline
//! - [`cli`] - Command-line interface definitions
//! - [`cmd_abstraction`] - Subprocess execution with timeouts
//! - [`config`] - Runtime settings and defaults
//! - [`enforcer`] - Root check and the ufw wrapper
//! - [`error`] - Terminal error kinds
//! - [`installer`] - Dependency presence and installation
//! - [`logging`] - Log line format, stdout and file sinks
//! - [`validation`] - IPv4 input validation
//! - [`whois`] - WHOIS range resolution

pub mod blocker;
pub mod cli;
pub mod cmd_abstraction;
pub mod config;
pub mod enforcer;
pub mod error;
pub mod installer;
pub mod logging;
pub mod validation;
pub mod whois;

pub use blocker::{BlockOutcome, Blocker};
pub use config::Config;
pub use error::BlockError;
