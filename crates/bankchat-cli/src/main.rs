//! bankchat - a terminal front end for the Bank of Anthos chat agent API.
//!
//! Log in once, then check the balance, move money and talk to the
//! assistant from the command line. The session is kept between runs.

mod app;

use std::io;

use anyhow::{bail, Result};
use bankchat_core::Config;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::{App, TransactionKind};

// ============================================================================
// Constants
// ============================================================================

/// Overrides the configured API base URL
const API_URL_ENV: &str = "BANKCHAT_API_URL";

/// When set, logs are also written to a daily file in this directory
const LOG_DIR_ENV: &str = "BANKCHAT_LOG_DIR";

const USAGE: &str = "\
Usage: bankchat <command>

Commands:
  login [username]          Log in and remember the session
  logout                    Forget the stored session
  status                    Show whether a session is stored
  balance                   Show the account balance
  send <account> <amount>   Send money to another account
  deposit <amount>          Deposit money into your account
  chat [message...]         Talk to the assistant (interactive without a message)
  help                      Show this message";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Login(Option<String>),
    Logout,
    Status,
    Balance,
    Send { to: String, amount: String },
    Deposit { amount: String },
    Chat(Option<String>),
    Help,
}

fn parse_args(args: &[String]) -> Result<Command> {
    let Some(first) = args.first() else {
        return Ok(Command::Help);
    };
    let rest = &args[1..];

    let command = match (first.as_str(), rest) {
        ("login", []) => Command::Login(None),
        ("login", [username]) => Command::Login(Some(username.clone())),
        ("logout", []) => Command::Logout,
        ("status", []) => Command::Status,
        ("balance", []) => Command::Balance,
        ("send", [to, amount]) => Command::Send {
            to: to.clone(),
            amount: amount.clone(),
        },
        ("deposit", [amount]) => Command::Deposit {
            amount: amount.clone(),
        },
        ("chat", []) => Command::Chat(None),
        ("chat", words) => Command::Chat(Some(words.join(" "))),
        ("help" | "--help" | "-h", _) => Command::Help,
        ("login" | "logout" | "status" | "balance" | "send" | "deposit", _) => {
            bail!("Wrong number of arguments for `{}`", first)
        }
        (other, _) => bail!("Unknown command: {}", other),
    };
    Ok(command)
}

/// Initialize the tracing subscriber for logging
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let stderr_layer = fmt::layer().with_writer(io::stderr);

    match std::env::var_os(LOG_DIR_ENV) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "bankchat.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(stderr_layer)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(stderr_layer)
                .with(filter)
                .init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let log_guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match parse_args(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}\n\n{}", e, USAGE);
            drop(log_guard);
            std::process::exit(2);
        }
    };
    if command == Command::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = Config::load()?;
    let base_url = std::env::var(API_URL_ENV).unwrap_or_else(|_| config.api_base_url.clone());
    info!(base_url = %base_url, "bankchat starting");

    let mut app = App::new(config, &base_url)?;
    let result = match command {
        Command::Login(username) => app.login(username).await,
        Command::Logout => app.logout().await,
        Command::Status => app.status().await,
        Command::Balance => app.balance().await,
        Command::Send { to, amount } => app.submit(TransactionKind::Send, Some(to.as_str()), &amount).await,
        Command::Deposit { amount } => app.submit(TransactionKind::Deposit, None, &amount).await,
        Command::Chat(message) => app.chat(message).await,
        Command::Help => Ok(()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        drop(log_guard);
        std::process::exit(1);
    }
    Ok(())
}
