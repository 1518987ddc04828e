//! ufw backend implementation.

use anyhow::Result;
use ipnet::Ipv4Net;
use tracing::debug;

use crate::cmd_abstraction::{args_to_strings, CommandExecutor, CommandOutput};
use crate::config::{Config, RULE_POSITION};
use crate::error::BlockError;
use crate::validation::TargetAddress;
use crate::whois::ResolvedRange;

/// Thin wrapper over the `ufw` command line
pub struct Ufw<'a, E: ?Sized> {
    executor: &'a E,
    config: &'a Config,
}

impl<'a, E> Ufw<'a, E>
where
    E: CommandExecutor + ?Sized,
{
    pub fn new(executor: &'a E, config: &'a Config) -> Self {
        Self { executor, config }
    }

    async fn run(&self, args: &[String]) -> Result<CommandOutput> {
        self.executor
            .execute(&self.config.tools.firewall, args, self.config.timeouts.command)
            .await
    }

    /// `ufw status numbered`, failing on a non-zero exit
    pub async fn status_numbered(&self) -> Result<String> {
        let output = self.run(&args_to_strings(&["status", "numbered"])).await?;
        if !output.success {
            anyhow::bail!("ufw status failed: {}", output.failure_reason());
        }
        Ok(output.stdout)
    }

    /// Whether an identical deny rule is already in the rule table
    pub async fn has_deny_rule(&self, range: &ResolvedRange) -> Result<bool> {
        let status = self.status_numbered().await?;
        Ok(rule_exists(&status, range.net()))
    }

    /// Insert `deny from <range>` at the top of the chain
    pub async fn insert_deny(&self, range: &ResolvedRange, target: &TargetAddress) -> Result<(), BlockError> {
        let insert_error = |reason: String| BlockError::RuleInsert {
            cidr: range.to_string(),
            ip: target.to_string(),
            reason,
        };

        let output = self
            .run(&insert_args(range))
            .await
            .map_err(|e| insert_error(format!("{:#}", e)))?;

        if !output.success {
            return Err(insert_error(output.failure_reason()));
        }

        debug!(ip = %target, "ufw: {}", output.stdout.trim());
        Ok(())
    }

    /// `ufw reload`, failing on a non-zero exit
    pub async fn reload(&self) -> Result<()> {
        let output = self.run(&args_to_strings(&["reload"])).await?;
        if !output.success {
            anyhow::bail!("ufw reload failed: {}", output.failure_reason());
        }
        Ok(())
    }
}

/// `insert <pos> deny from <cidr>`
pub(crate) fn insert_args(range: &ResolvedRange) -> Vec<String> {
    vec![
        "insert".to_string(),
        RULE_POSITION.to_string(),
        "deny".to_string(),
        "from".to_string(),
        range.to_string(),
    ]
}

/// Check `ufw status` output for an unrestricted deny rule from `net`.
///
/// ufw prints such a rule as `[ 1] Anywhere  DENY IN  203.0.113.0/24`
/// (numbered) or `Anywhere  DENY  203.0.113.0/24` (plain). A /32 source is
/// printed as the bare address. Only that exact shape counts: rules scoped
/// to a port or interface (`Anywhere on eth1`), routed (`DENY FWD`),
/// outbound, v6 or with a different action do not block incoming traffic
/// from `net`.
pub fn rule_exists(status: &str, net: Ipv4Net) -> bool {
    let net = net.trunc();
    let cidr = net.to_string();
    let bare = (net.prefix_len() == 32).then(|| net.addr().to_string());

    status.lines().any(|line| {
        let line = line.trim_start();
        // Drop the "[ 1]" rule number
        let line = match line.strip_prefix('[') {
            Some(rest) => rest.split_once(']').map(|(_, r)| r).unwrap_or(rest),
            None => line,
        };
        // Drop a trailing "# comment"
        let line = line.split('#').next().unwrap_or("");

        let fields: Vec<&str> = line.split_whitespace().collect();
        let (from, action) = match fields.as_slice() {
            ["Anywhere", "DENY", from] => (*from, None),
            ["Anywhere", "DENY", direction, from] => (*from, Some(*direction)),
            _ => return false,
        };

        matches!(action, None | Some("IN")) && (from == cidr || bare.as_deref() == Some(from))
    })
}
