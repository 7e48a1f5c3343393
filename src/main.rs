use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kbank::config::{default_config_path, Config};
use kbank::credentials::Credentials;
use kbank::duration::format_duration;
use kbank::models::Transaction;
use kbank::sync::KBankClient;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn parse_duration_arg(s: &str) -> Result<Duration, String> {
    kbank::duration::parse_duration(s).map_err(|e| e.to_string())
}

#[derive(Parser)]
#[command(name = "kbank")]
#[command(about = "Log in to KBank online banking and read today's statement")]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the per-request timeout (e.g. "10s")
    #[arg(long, value_parser = parse_duration_arg)]
    timeout: Option<Duration>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the resolved configuration
    Config,
    /// Log in and report whether the session is live
    Check,
    /// Log in and list today's transactions
    Transactions {
        /// Print a JSON array instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .init();
    } else {
        tracing_subscriber::registry().with(filter).with(layer).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config_path = cli.config.unwrap_or_else(default_config_path);
    let mut config = Config::load_or_default(&config_path)?;
    if let Some(timeout) = cli.timeout {
        config.request_timeout = timeout;
    }

    match cli.command {
        Command::Config => {
            println!("Config file: {}", config_path.display());
            println!("Request timeout: {}", format_duration(config.request_timeout));
            println!();
            print!(
                "{}",
                toml::to_string_pretty(&config).context("Failed to render config")?
            );
        }
        Command::Check => {
            let client = connect(&config).await?;
            let live = client.check_session().await;
            println!(
                "Logged in as account {}; session {}",
                client.account_no().grouped(),
                if live { "active" } else { "inactive" }
            );
        }
        Command::Transactions { json } => {
            let mut client = connect(&config).await?;
            let transactions = client
                .get_transactions()
                .await
                .context("Failed to fetch transactions")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&transactions)?);
            } else {
                print_table(&transactions);
            }
        }
    }

    Ok(())
}

async fn connect(config: &Config) -> Result<KBankClient> {
    let store = config.credentials.build();
    let credentials = Credentials::from_store(store.as_ref()).await?;
    let options = config.client_options()?;

    let mut client = KBankClient::new(credentials, options)?;
    client.login().await.context("Login failed")?;
    Ok(client)
}

fn print_table(transactions: &[Transaction]) {
    if transactions.is_empty() {
        println!("No transactions today.");
        return;
    }

    println!("{:<19}  {:>14}  {:<12}  Detail", "Time", "Amount", "Account");
    for txn in transactions {
        println!(
            "{:<19}  {:>14}  {:<12}  {}",
            txn.time.format("%Y-%m-%d %H:%M:%S").to_string(),
            txn.amount.to_string(),
            txn.counterparty_account,
            txn.detail.trim()
        );
    }
}
