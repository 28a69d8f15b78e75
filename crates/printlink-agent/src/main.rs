// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printlink resident print agent.
//
// Entry point. Parses options, initialises logging, then either lists the
// printers found on the local network or connects the configured printer to
// the print service until interrupted.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use printlink_agent::{Credentials, GrpcConnector, HttpFetcher, SessionSettings, run_forever};
use printlink_core::config::{AgentConfig, DEFAULT_SERVER_URL};
use printlink_print::{IppClient, PrinterApi, PrinterDiscovery};

const LEARN_MORE: &str = "Learn more: https://github.com/hyperpolymath/printlink/blob/main/README.md";

/// printlink - connects a local IPP printer to the print service and prints
/// the documents it sends.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None, after_help = LEARN_MORE)]
struct Cli {
    /// Printer URL. Use the "ipps" scheme to connect with TLS, add username
    /// and password to authenticate. Omit to look for printers.
    #[arg(long, env = "PRINTLINK_PRINTER", default_value = "")]
    printer: String,

    /// Print service URL.
    #[arg(long, env = "PRINTLINK_SERVER", default_value = DEFAULT_SERVER_URL)]
    server: String,

    /// Space ID where the printer is hosted.
    #[arg(long, env = "PRINTLINK_SPACE", default_value = "")]
    space: String,

    /// Token authenticating the printer with the service.
    #[arg(long, env = "PRINTLINK_TOKEN", default_value = "", hide_env_values = true)]
    token: String,

    /// Jobs older than this are cancelled instead of printed.
    #[arg(long, env = "PRINTLINK_JOB_TTL", default_value = "5m", value_parser = humantime::parse_duration)]
    job_ttl: Duration,

    /// How long to look for printers when no printer is given.
    #[arg(long, env = "PRINTLINK_LOOKUP_TIMEOUT", default_value = "1m", value_parser = humantime::parse_duration)]
    lookup_timeout: Duration,

    /// Directory for downloaded documents. Defaults to the system temp dir.
    #[arg(long, env = "PRINTLINK_SCRATCH_DIR")]
    scratch_dir: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> AgentConfig {
        let defaults = AgentConfig::default();
        AgentConfig {
            printer_url: self.printer,
            server_url: self.server,
            space_id: self.space,
            token: self.token,
            job_ttl: self.job_ttl,
            lookup_timeout: self.lookup_timeout,
            scratch_dir: self.scratch_dir.unwrap_or(defaults.scratch_dir),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = Cli::parse().into_config();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if config.discovery_mode() {
        list_printers(config.lookup_timeout).await;
        return ExitCode::SUCCESS;
    }

    if let Err(e) = config.validate() {
        eprintln!("ERROR: {e}");
        eprintln!("{LEARN_MORE}");
        return ExitCode::FAILURE;
    }

    info!(version = env!("CARGO_PKG_VERSION"), "Printlink agent starting");

    let printer = match IppClient::new(&config.printer_url) {
        Ok(printer) => printer,
        Err(e) => {
            eprintln!("ERROR: {e}");
            return ExitCode::FAILURE;
        }
    };
    probe_printer(&printer).await;

    let connector = match GrpcConnector::new(&config.server_url) {
        Ok(connector) => connector,
        Err(e) => {
            eprintln!("ERROR: failed to connect to printing server: {e}");
            return ExitCode::FAILURE;
        }
    };
    let fetcher = HttpFetcher::new(config.scratch_dir.clone());
    let settings = SessionSettings::new(
        Credentials {
            token: config.token.clone(),
            space_id: config.space_id.clone(),
        },
        config.job_ttl,
    );

    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted, shutting down");
            on_signal.cancel();
        }
    });

    run_forever(&connector, &printer, &fetcher, &settings, shutdown).await;
    ExitCode::SUCCESS
}

/// Browse the network and print what was found.
async fn list_printers(timeout: Duration) {
    println!("You should provide --printer option to connect to the printer and start printing documents.");
    println!("{LEARN_MORE}");
    println!();
    println!("Looking for available printers...");

    let found = tokio::task::spawn_blocking(move || PrinterDiscovery::new()?.discover(timeout)).await;
    let printers = match found {
        Ok(Ok(printers)) => printers,
        Ok(Err(e)) => {
            println!("Failed to find printers: {e}");
            Vec::new()
        }
        Err(e) => {
            println!("Failed to find printers: {e}");
            Vec::new()
        }
    };

    if printers.is_empty() {
        println!("No printers found.");
        return;
    }
    for printer in &printers {
        println!("- {} ({})", printer.uri, printer.state);
    }
    println!();
    println!("Please, restart this application with --printer option.");
}

/// Log what the printer reports about itself.  Failure is not fatal; the
/// printer may come up later.
async fn probe_printer(printer: &IppClient) {
    match printer.printer_attributes().await {
        Ok(attrs) => info!(
            uri = %printer.uri(),
            name = %attrs.name,
            info = %attrs.info,
            state = %attrs.state,
            queued_jobs = attrs.queued_job_count,
            "printer found"
        ),
        Err(e) => warn!(uri = %printer.uri(), error = %e, "failed to query printer attributes"),
    }
}
