//! The blocking pipeline.
//!
//! Steps run once each, in order, and the first fatal error ends the run:
//!
//! 1. privilege check
//! 2. argument count and IPv4 validation
//! 3. `whois` / `ufw` presence, installing them if needed
//! 4. range resolution via WHOIS
//! 5. duplicate check, rule insertion, reload, status listing

use std::io::Write;
use tracing::{error, info, warn};

use crate::cmd_abstraction::CommandExecutor;
use crate::config::{Config, RULE_POSITION};
use crate::enforcer::{check_root, Privileges, Ufw};
use crate::error::BlockError;
use crate::installer::ensure_dependency;
use crate::validation::{validate, TargetAddress};
use crate::whois::{resolve_range, ResolvedRange};

/// How a successful run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockOutcome {
    /// The deny rule was inserted
    Inserted,
    /// An identical deny rule was already in place
    AlreadyPresent,
    /// Dry run: nothing was changed
    DryRun,
}

pub struct Blocker<E, P> {
    executor: E,
    privileges: P,
    config: Config,
}

impl<E, P> Blocker<E, P>
where
    E: CommandExecutor,
    P: Privileges,
{
    pub fn new(executor: E, privileges: P, config: Config) -> Self {
        Self {
            executor,
            privileges,
            config,
        }
    }

    /// Run the pipeline and return the process exit status.
    ///
    /// `targets` are the positional arguments; exactly one is expected.
    /// The firewall status listing is written to `out`. A fatal error is
    /// logged once, at error level.
    pub async fn run<W: Write>(&self, program: &str, targets: &[String], out: &mut W) -> u8 {
        match self.block(program, targets, out).await {
            Ok(_) => 0,
            Err(e) => {
                match e.ip() {
                    Some(ip) => error!(ip = %ip, "{}", e),
                    None => error!("{}", e),
                }
                e.exit_code()
            }
        }
    }

    /// The pipeline itself, without the final error logging
    pub async fn block<W: Write>(
        &self,
        program: &str,
        targets: &[String],
        out: &mut W,
    ) -> Result<BlockOutcome, BlockError> {
        check_root(&self.privileges)?;

        let raw = match targets {
            [raw] => raw,
            _ => {
                return Err(BlockError::Usage {
                    program: program.to_string(),
                })
            }
        };

        let target = validate(raw)?;
        let tools = &self.config.tools;

        ensure_dependency(&self.executor, &self.config, &tools.whois, &target).await?;
        if !self.config.dry_run {
            ensure_dependency(&self.executor, &self.config, &tools.firewall, &target).await?;
        }

        let range = resolve_range(&self.executor, &self.config, &target).await;
        info!(ip = %target, "Blocking range: {}", range);

        if self.config.dry_run {
            info!(
                ip = %target,
                "Dry run: would run {} insert {} deny from {}",
                tools.firewall, RULE_POSITION, range
            );
            return Ok(BlockOutcome::DryRun);
        }

        let ufw = Ufw::new(&self.executor, &self.config);

        if !self.config.force && self.rule_already_present(&ufw, &range, &target).await {
            info!(ip = %target, "Rule deny from {} already exists. Nothing to insert.", range);
            self.report_status(&ufw, &target, out).await;
            return Ok(BlockOutcome::AlreadyPresent);
        }

        ufw.insert_deny(&range, &target).await?;
        info!(ip = %target, "Added rule at the top of the list: deny from {}", range);

        match ufw.reload().await {
            Ok(()) => info!(ip = %target, "UFW reloaded."),
            Err(e) => warn!(ip = %target, "{:#}", e),
        }

        self.report_status(&ufw, &target, out).await;
        Ok(BlockOutcome::Inserted)
    }

    /// A failed status query counts as "not present" so the insert still runs
    async fn rule_already_present(
        &self,
        ufw: &Ufw<'_, E>,
        range: &ResolvedRange,
        target: &TargetAddress,
    ) -> bool {
        match ufw.has_deny_rule(range).await {
            Ok(present) => present,
            Err(e) => {
                warn!(ip = %target, "Could not check existing UFW rules: {:#}. Inserting anyway.", e);
                false
            }
        }
    }

    async fn report_status<W: Write>(&self, ufw: &Ufw<'_, E>, target: &TargetAddress, out: &mut W) {
        info!(ip = %target, "Current UFW rules:");
        match ufw.status_numbered().await {
            Ok(status) => {
                if let Err(e) = out.write_all(status.as_bytes()).and_then(|_| out.flush()) {
                    warn!(ip = %target, "Failed to print UFW status: {}", e);
                }
            }
            Err(e) => warn!(ip = %target, "{:#}", e),
        }
    }
}
