//! ufwblock - block an IPv4 address's registered network range with ufw.

use clap::Parser;
use std::process::ExitCode;

use ufwblock::blocker::Blocker;
use ufwblock::cli::Cli;
use ufwblock::cmd_abstraction::RealCommandExecutor;
use ufwblock::config::Config;
use ufwblock::enforcer::ProcessPrivileges;
use ufwblock::logging;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version land here too, on stdout
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    let config = match Config::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::from(1);
        }
    };

    // Held for the rest of the process
    let _log = logging::init(&config.log_file, config.log_level);

    let program = std::env::args()
        .next()
        .unwrap_or_else(|| "ufwblock".to_string());

    let blocker = Blocker::new(RealCommandExecutor::new(), ProcessPrivileges, config);
    let mut stdout = std::io::stdout();
    ExitCode::from(blocker.run(&program, &cli.targets, &mut stdout).await)
}
