//! WHOIS-based range resolution.
//!
//! This is a best-effort scan of the free-text WHOIS response, not a
//! structured WHOIS/RDAP client. There is no retry and no alternate server:
//! anything that goes wrong degrades to a single-host `/32` range.

use ipnet::Ipv4Net;
use std::fmt;
use tracing::{debug, info, warn};

use crate::cmd_abstraction::{args_to_strings, CommandExecutor};
use crate::config::Config;
use crate::validation::{parse_ipv4_cidr, TargetAddress};

/// Field labels that carry an allocation block, matched case-insensitively
const RANGE_LABELS: &[&str] = &["cidr:", "route:"];

/// Where a resolved range came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSource {
    /// Parsed from a `cidr:` or `route:` field
    Whois,
    /// Single-host fallback
    HostFallback,
}

/// The CIDR range that will be denied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    net: Ipv4Net,
    source: RangeSource,
}

impl ResolvedRange {
    pub fn host(target: &TargetAddress) -> Self {
        Self {
            net: target.host_range(),
            source: RangeSource::HostFallback,
        }
    }

    pub fn net(&self) -> Ipv4Net {
        self.net
    }

    pub fn source(&self) -> RangeSource {
        self.source
    }
}

impl fmt::Display for ResolvedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.net)
    }
}

/// Find the first usable `cidr:`/`route:` value in a WHOIS response.
///
/// The value is the first whitespace-delimited token after the label, cut
/// at the first comma (ARIN lists alternates as `a/24, b/23`). Lines whose
/// value is not a valid IPv4 CIDR are skipped.
pub fn parse_whois_cidr(response: &str) -> Option<Ipv4Net> {
    response.lines().find_map(|line| {
        // ASCII lowercasing keeps byte offsets aligned with `line`
        let lower = line.to_ascii_lowercase();
        let (pos, label) = RANGE_LABELS
            .iter()
            .filter_map(|label| lower.find(label).map(|pos| (pos, *label)))
            .min_by_key(|(pos, _)| *pos)?;

        let token = line[pos + label.len()..].split_whitespace().next()?;
        let candidate = token.split(',').next()?;
        parse_ipv4_cidr(candidate)
    })
}

/// Pick the range from an optional WHOIS response, falling back to `/32`.
///
/// Host bits are cleared (`203.0.113.5/24` becomes `203.0.113.0/24`), the
/// same way ufw stores the rule.
pub fn select_range(target: &TargetAddress, response: Option<&str>) -> ResolvedRange {
    match response.and_then(parse_whois_cidr) {
        Some(net) => ResolvedRange {
            net: net.trunc(),
            source: RangeSource::Whois,
        },
        None => ResolvedRange::host(target),
    }
}

/// Resolve the registration block of `target` via `whois`.
///
/// Never fails: invocation errors, timeouts, non-zero exits and responses
/// without a usable field all yield `<ip>/32` with a warning.
pub async fn resolve_range<E>(executor: &E, config: &Config, target: &TargetAddress) -> ResolvedRange
where
    E: CommandExecutor + ?Sized,
{
    let ip = target.to_string();
    let args = args_to_strings(&[&ip]);

    let response = match executor
        .execute(&config.tools.whois, &args, config.timeouts.whois)
        .await
    {
        Ok(output) if output.success => output.stdout,
        Ok(output) => {
            debug!(ip = %ip, "whois failed: {}", output.failure_reason());
            warn!(ip = %ip, "Could not run whois for {}. Using /32.", ip);
            return ResolvedRange::host(target);
        }
        Err(e) => {
            debug!(ip = %ip, "whois failed: {:#}", e);
            warn!(ip = %ip, "Could not run whois for {}. Using /32.", ip);
            return ResolvedRange::host(target);
        }
    };

    let range = select_range(target, Some(&response));
    match range.source() {
        RangeSource::Whois => info!(ip = %ip, "Found CIDR: {}", range),
        RangeSource::HostFallback => warn!(ip = %ip, "No CIDR found for {}. Using /32.", ip),
    }
    range
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd_abstraction::test_support::*;
    use crate::cmd_abstraction::MockCommandExecutor;
    use crate::validation::validate;
    use proptest::prelude::*;

    const ARIN_RESPONSE: &str = "\
#
# ARIN WHOIS data and services are subject to the Terms of Use
#

NetRange:       203.0.113.0 - 203.0.113.255
CIDR:           203.0.113.0/24
NetName:        TEST-NET-3
NetHandle:      NET-203-0-113-0-1
";

    const RIPE_RESPONSE: &str = "\
inetnum:        198.51.100.0 - 198.51.100.255
netname:        EXAMPLE-NET
country:        NL

% Information related to '198.51.100.0/24AS64500'

route:          198.51.100.0/24
origin:         AS64500
";

    fn target(ip: &str) -> TargetAddress {
        validate(ip).unwrap()
    }

    fn whois_mock(ip: &'static str, output: anyhow::Result<crate::cmd_abstraction::CommandOutput>) -> MockCommandExecutor {
        let mut mock = MockCommandExecutor::new();
        let mut output = Some(output);
        mock.expect_execute()
            .withf(move |cmd, args, _| cmd == "whois" && args_eq(args, &[ip]))
            .times(1)
            .returning(move |_, _, _| output.take().unwrap());
        mock
    }

    #[test]
    fn test_parse_arin_cidr() {
        let net = parse_whois_cidr(ARIN_RESPONSE).unwrap();
        assert_eq!(net.to_string(), "203.0.113.0/24");
    }

    #[test]
    fn test_parse_ripe_route() {
        let net = parse_whois_cidr(RIPE_RESPONSE).unwrap();
        assert_eq!(net.to_string(), "198.51.100.0/24");
    }

    #[test]
    fn test_parse_strips_comma_alternates() {
        let net = parse_whois_cidr("route: 198.51.100.0/24, extra").unwrap();
        assert_eq!(net.to_string(), "198.51.100.0/24");

        let net = parse_whois_cidr("CIDR: 192.0.2.0/25, 192.0.2.128/25").unwrap();
        assert_eq!(net.to_string(), "192.0.2.0/25");
    }

    #[test]
    fn test_parse_is_case_insensitive_and_tolerates_no_space() {
        assert!(parse_whois_cidr("Route:192.0.2.0/24").is_some());
        assert!(parse_whois_cidr("   cIdR:\t192.0.2.0/24").is_some());
    }

    #[test]
    fn test_parse_skips_malformed_candidates() {
        let response = "cidr: 999.0.0.0/8\nroute: 10.0.0.0\ncidr: not-a-range\nroute: 10.1.0.0/16\n";
        let net = parse_whois_cidr(response).unwrap();
        assert_eq!(net.to_string(), "10.1.0.0/16");
    }

    #[test]
    fn test_parse_ignores_ipv6_routes() {
        assert!(parse_whois_cidr("route6: 2001:db8::/32\n").is_none());
        assert!(parse_whois_cidr("cidr: 2001:db8::/32\n").is_none());
    }

    #[test]
    fn test_parse_no_field() {
        assert!(parse_whois_cidr("").is_none());
        assert!(parse_whois_cidr("NetRange: 1.0.0.0 - 1.0.0.255\n").is_none());
        assert!(parse_whois_cidr("cidr:\n").is_none());
    }

    #[test]
    fn test_select_range_fallback() {
        let t = target("198.51.100.7");
        let range = select_range(&t, None);
        assert_eq!(range.to_string(), "198.51.100.7/32");
        assert_eq!(range.source(), RangeSource::HostFallback);

        let range = select_range(&t, Some("no fields here"));
        assert_eq!(range.to_string(), "198.51.100.7/32");
    }

    #[test]
    fn test_select_range_clears_host_bits() {
        let range = select_range(&target("203.0.113.5"), Some("cidr: 203.0.113.5/24\n"));
        assert_eq!(range.to_string(), "203.0.113.0/24");
        assert_eq!(range.source(), RangeSource::Whois);
    }

    #[tokio::test]
    async fn test_resolve_range_whois_failure_falls_back() {
        let mock = whois_mock("198.51.100.7", Ok(failure_output("connect: Network is unreachable")));
        let range = resolve_range(&mock, &Config::default(), &target("198.51.100.7")).await;
        assert_eq!(range.to_string(), "198.51.100.7/32");
        assert_eq!(range.source(), RangeSource::HostFallback);
    }

    #[tokio::test]
    async fn test_resolve_range_spawn_error_falls_back() {
        let mock = whois_mock("198.51.100.7", Err(anyhow::anyhow!("whois timed out after 15s")));
        let range = resolve_range(&mock, &Config::default(), &target("198.51.100.7")).await;
        assert_eq!(range.to_string(), "198.51.100.7/32");
    }

    #[tokio::test]
    async fn test_resolve_range_route_field() {
        let mock = whois_mock("198.51.100.7", Ok(success_output("route: 198.51.100.0/24, extra\n")));
        let range = resolve_range(&mock, &Config::default(), &target("198.51.100.7")).await;
        assert_eq!(range.to_string(), "198.51.100.0/24");
        assert_eq!(range.source(), RangeSource::Whois);
    }

    #[tokio::test]
    async fn test_resolve_range_uses_whois_timeout() {
        let mut config = Config::default();
        config.timeouts.whois = std::time::Duration::from_secs(2);

        let mut mock = MockCommandExecutor::new();
        mock.expect_execute()
            .withf(|_, _, timeout| *timeout == std::time::Duration::from_secs(2))
            .times(1)
            .returning(|_, _, _| Ok(success_output(ARIN_RESPONSE)));

        let range = resolve_range(&mock, &config, &target("203.0.113.5")).await;
        assert_eq!(range.to_string(), "203.0.113.0/24");
    }

    proptest! {
        /// Whatever whois prints, the result is one valid address and one prefix
        #[test]
        fn prop_range_always_single_slash(
            a in 0u8..=255, b in 0u8..=255, c in 0u8..=255, d in 0u8..=255,
            response in prop::option::of("(?s).{0,200}"),
        ) {
            let t = target(&format!("{}.{}.{}.{}", a, b, c, d));
            let rendered = select_range(&t, response.as_deref()).to_string();
            prop_assert_eq!(rendered.matches('/').count(), 1);
            let (addr, prefix) = rendered.split_once('/').unwrap();
            prop_assert!(validate(addr).is_ok());
            prop_assert!(prefix.parse::<u8>().map(|p| p <= 32).unwrap_or(false));
        }

        /// Field lines built from arbitrary networks are always picked up
        #[test]
        fn prop_route_field_parsed(
            a in 0u8..=255, b in 0u8..=255, c in 0u8..=255, prefix in 0u8..=32,
            label in prop::sample::select(vec!["cidr:", "CIDR:", "route:", "Route:"]),
        ) {
            let block = format!("{}.{}.{}.0/{}", a, b, c, prefix);
            let response = format!("netname: X\n{}   {}, other\n", label, block);
            let net = parse_whois_cidr(&response);
            prop_assert_eq!(net.map(|n| n.to_string()), Some(block));
        }
    }
}
