//! Command line entry point.
//!
//! Packages each input file into mail-sized pieces and pushes them through
//! the configured account, printing progress along the way.

mod config;
mod console;

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use mailpack_delivery::{DeliveryConfig, DeliveryEngine, DeliveryError, RetryConfig};
use mailpack_packaging::MEGABYTE;
use mailpack_smtp::SmtpTransport;

const EXIT_DELIVERY_FAILED: i32 = 1;
const EXIT_CONFIG: i32 = 2;
const EXIT_AUTH: i32 = 3;
const EXIT_INTERRUPTED: i32 = 4;

/// Sends large files as chunked email messages.
#[derive(Debug, Parser)]
#[command(name = "mailpack", version, about)]
struct Cli {
    /// File to send (repeatable)
    #[arg(short = 'f', long = "file", required = true, value_name = "PATH", action = ArgAction::Append)]
    files: Vec<PathBuf>,

    /// Prompt for the account password even if the config has one
    #[arg(short = 'p', long = "password")]
    prompt_password: bool,

    /// Use an alternate configuration file
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase verbosity (can be repeated: -v, -vv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    /// Recipient addresses
    #[arg(required = true, value_name = "RECIPIENT")]
    recipients: Vec<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    std::process::exit(run(cli).await);
}

// Logs go to stderr so the progress line on stdout stays intact.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> i32 {
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("mailpack: {e:#}");
            return EXIT_CONFIG;
        }
    };

    if let Err(message) = check_files(&cli.files) {
        eprintln!("mailpack: {message}");
        return EXIT_CONFIG;
    }

    if config.login.is_empty() {
        eprintln!("mailpack: login is not set; edit the configuration and try again");
        return EXIT_CONFIG;
    }

    let password = if cli.prompt_password || config.password.is_empty() {
        match rpassword::prompt_password(format!("Password for {}: ", config.login)) {
            Ok(password) => password,
            Err(e) => {
                eprintln!("mailpack: cannot read password: {e}");
                return EXIT_CONFIG;
            }
        }
    } else {
        config.password.clone()
    };

    let delivery_config = DeliveryConfig {
        host: config.host.clone(),
        port: config.port,
        starttls: config.starttls,
        login: config.login.clone(),
        password,
        email_charset: config.email_charset.clone(),
        max_package_size: config.max_package_size_mb * MEGABYTE,
        retry: RetryConfig::default(),
    };

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, stopping");
                cancel.cancel();
            }
        });
    }

    let (events_tx, events_rx) = mpsc::channel(32);
    let printer = tokio::spawn(console::print_events(events_rx));

    let mut engine = DeliveryEngine::new(Box::new(SmtpTransport), delivery_config, cancel);
    let result = engine.send_files(&cli.files, &cli.recipients, &events_tx).await;

    // Closing our sender ends the printer once the queue drains.
    drop(events_tx);
    let _ = printer.await;

    match result {
        Ok(report) if report.all_delivered() => 0,
        Ok(_) => {
            eprintln!("mailpack: some files were not delivered");
            EXIT_DELIVERY_FAILED
        }
        Err(DeliveryError::Auth(reply)) => {
            eprintln!("mailpack: authentication failed: {reply}");
            EXIT_AUTH
        }
        Err(DeliveryError::Interrupted) => {
            eprintln!("mailpack: interrupted");
            EXIT_INTERRUPTED
        }
        Err(e @ DeliveryError::Packaging(_)) => {
            eprintln!("mailpack: {e}");
            EXIT_CONFIG
        }
        Err(e) => {
            eprintln!("mailpack: {e}");
            EXIT_DELIVERY_FAILED
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<config::SendConfig> {
    match &cli.config {
        Some(path) => config::SendConfig::load_from(path),
        None => config::SendConfig::load(),
    }
}

/// Checks every input up front, before the first connection is made.
fn check_files(files: &[PathBuf]) -> Result<(), String> {
    for path in files {
        let display = path.display();
        match std::fs::metadata(path) {
            Ok(meta) if !meta.is_file() => {
                return Err(format!("'{display}' is not a file"));
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(format!("file '{display}' does not exist"));
            }
            Err(e) => {
                return Err(format!("cannot read '{display}': {e}"));
            }
        }
        if let Err(e) = std::fs::File::open(path) {
            return Err(format!("cannot read '{display}': {e}"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write as _;

    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_files_and_recipients() {
        let cli = Cli::try_parse_from([
            "mailpack",
            "-f",
            "a.bin",
            "--file",
            "b.bin",
            "-p",
            "one@example.com",
            "two@example.com",
        ])
        .unwrap();
        assert_eq!(cli.files.len(), 2);
        assert_eq!(cli.recipients.len(), 2);
        assert!(cli.prompt_password);
    }

    #[test]
    fn requires_a_file_and_a_recipient() {
        assert!(Cli::try_parse_from(["mailpack", "one@example.com"]).is_err());
        assert!(Cli::try_parse_from(["mailpack", "-f", "a.bin"]).is_err());
    }

    #[test]
    fn missing_inputs_are_reported_before_connecting() {
        let tmp = tempfile::tempdir().unwrap();

        let missing = tmp.path().join("nope.bin");
        let err = check_files(&[missing]).unwrap_err();
        assert!(err.contains("does not exist"));

        let err = check_files(&[tmp.path().to_path_buf()]).unwrap_err();
        assert!(err.contains("is not a file"));

        let good = tmp.path().join("data.bin");
        let mut f = std::fs::File::create(&good).unwrap();
        f.write_all(b"payload").unwrap();
        assert!(check_files(&[good]).is_ok());
    }
}
