use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use syslog_flood::cli::Cli;
use syslog_flood::fleet::{self, Fleet};
use syslog_flood::state::AppState;
use syslog_flood::{config, runner, stats};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("syslog-flood: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let params = config::resolve(&cli)?;
    let gen_cfg = Arc::new(params.generator);

    let connection_count = fleet::resolve_connection_count(gen_cfg.connections, gen_cfg.connections < 0)?;
    fleet::raise_fd_limit_if_needed(connection_count)?;

    if !gen_cfg.silent {
        tracing::info!(connections = connection_count, transport = %gen_cfg.transport, "opening connections");
    }
    if gen_cfg.transport.is_tls() && gen_cfg.tls.cert_file.is_none() && gen_cfg.tls.ca_file.is_none() {
        tracing::warn!(transport = %gen_cfg.transport, "no -x CA file or -z client cert given; relying on the peer not requiring one");
    }
    if gen_cfg.transport.is_relp() && gen_cfg.relp.permitted_peer.is_none() {
        tracing::debug!("no -A permitted peer configured; RELP session will accept any peer identity");
    }
    let fleet = Arc::new(Fleet::open(&gen_cfg, connection_count)?);
    let state = Arc::new(AppState::new(gen_cfg.start_msg_num));

    let (run_stats, run_lines) = runner::run_tests(
        &gen_cfg,
        &fleet,
        &state,
        connection_count,
        params.runs,
        params.sleep_between_runs,
        params.csv,
    );

    if !gen_cfg.silent || params.emit_stats {
        for line in &run_lines {
            println!("{line}");
        }
    }
    if params.emit_stats {
        println!("{}", stats::format_summary(&run_stats, params.csv));
    }

    let mut fleet = Arc::try_unwrap(fleet).unwrap_or_else(|_| panic!("fleet still has outstanding references after all sender threads joined"));
    fleet.close_all();

    Ok(())
}
