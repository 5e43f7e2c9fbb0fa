use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bankfetch::browser::{watch_for_downloads, BrowserSession};
use bankfetch::config::Config;
use bankfetch::credentials::Credentials;
use bankfetch::drivers::create_driver;
use bankfetch::page::CdpPage;

const DOWNLOAD_TIMEOUT_SECS: u64 = 600;
const DOWNLOAD_IDLE_SECS: u64 = 30;

#[derive(Parser)]
#[command(name = "bankfetch")]
#[command(about = "Bank statement download automation")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "bankfetch.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List configured bank profiles
    Banks,
    /// Show current configuration
    Config,
    /// Log in and download a statement
    Fetch {
        /// Bank profile key (e.g. "svc")
        #[arg(long)]
        bank: String,

        /// Account number to select; full number, not a masked form
        #[arg(long)]
        account: String,

        /// Statement range start (ISO date, e.g. 2024-04-01)
        #[arg(long)]
        from: NaiveDate,

        /// Statement range end (ISO date)
        #[arg(long)]
        to: NaiveDate,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(
                "info,chromiumoxide=warn,chromiumoxide::conn=off,chromiumoxide::handler=off",
            )
        }))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config: {}", cli.config.display()))?;

    match cli.command {
        Command::Banks => {
            let mut keys: Vec<_> = config.banks.keys().collect();
            keys.sort();
            for key in keys {
                let bank = &config.banks[key];
                println!("{key:12} {} ({})", bank.name, bank.login_url);
            }
        }
        Command::Config => {
            println!("Config file: {}", cli.config.display());
            println!("Download dir: {}", config.resolved_download_dir()?.display());
            println!("Banks: {}", config.banks.len());
        }
        Command::Fetch {
            bank,
            account,
            from,
            to,
        } => {
            fetch(&config, &bank, &account, from, to).await?;
        }
    }

    Ok(())
}

async fn fetch(
    config: &Config,
    bank_key: &str,
    account: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<()> {
    let profile = config
        .bank(bank_key)
        .with_context(|| format!("Unknown bank: {bank_key}"))?;
    let driver = create_driver(profile)?;
    let credentials = Credentials::from_env().context(
        "Set BANKFETCH_USER and BANKFETCH_PASS to the portal credentials before fetching",
    )?;

    let download_dir = config.resolved_download_dir()?.join(bank_key);
    let profile_dir = config.browser_profile_dir(bank_key)?;

    let session = BrowserSession::launch(&profile_dir).await?;
    let raw_page = session.open_page(&profile.login_url, &download_dir).await?;
    let page = CdpPage::new(raw_page);

    driver.login(&page, &credentials).await?;

    // OTP and CAPTCHA stay with the human; the driver only fills what it can.
    println!("\nComplete any OTP/CAPTCHA in the browser, then press Enter to continue.");
    let mut line = String::new();
    let _ = std::io::stdin().read_line(&mut line);

    driver.navigate_to_statements(&page).await?;

    let from_str = from.format(&profile.date_format).to_string();
    let to_str = to.format(&profile.date_format).to_string();
    driver
        .download_statement(&page, account, &from_str, &to_str)
        .await?;

    println!("Waiting for downloads in: {}", download_dir.display());
    println!("Stopping after {DOWNLOAD_IDLE_SECS} seconds of inactivity.");

    let downloads = watch_for_downloads(
        &download_dir,
        Duration::from_secs(DOWNLOAD_TIMEOUT_SECS),
        Duration::from_secs(DOWNLOAD_IDLE_SECS),
    )
    .await?;

    session.close().await;

    if downloads.is_empty() {
        anyhow::bail!(
            "No statement download detected for {}. The portal layout may have changed.",
            profile.name
        );
    }

    for file in &downloads {
        println!("Downloaded: {}", file.display());
    }
    Ok(())
}
