// Rust guideline compliant 2026-10-12

//! Flood-alert entry point.
//!
//! `run` (the default) drives two schedules on one current-thread runtime:
//! the hourly alert fan-out (official warnings to every registered recipient
//! over SMS and email) and the 15-minute current-conditions log. Channels
//! without credentials fall back to logging adapters so the service still
//! starts.
//!
//! # Usage
//!
//! ```text
//! # Run the schedules -- press CTRL+C to stop
//! RUST_LOG=info cargo run --bin flood_alert
//!
//! # Register a recipient and send the welcome messages
//! cargo run --bin flood_alert -- register "Ana Souza" --phone 11987654321 --email ana@example.com
//!
//! # Remove a recipient (the "responda STOP" path)
//! cargo run --bin flood_alert -- unregister 11987654321
//! ```
//!
//! Every setting is a flag or an environment variable, optionally seeded
//! from `.env`; see `flood_alert --help`.

mod adapters;
mod commands;
mod config;

use adapters::clicksend_sms::ClickSendSms;
use adapters::log_dispatch::{LogEmail, LogSms};
use adapters::smtp_email::SmtpEmail;
use adapters::sqlite_cooldowns::SqliteCooldowns;
use adapters::sqlite_directory::SqliteDirectory;
use adapters::weather_api::WeatherApiSource;
use adapters::{EmailChannel, SmsChannel};
use anyhow::Context as _;
use clap::Parser as _;
use config::{AppConfig, Cli, Commands};
use orchestrator::{AlertConfig, AlertOrchestrator, ConditionsConfig, ConditionsMonitor};
use rate_limiter::{RateLimiter, SystemClock};
use tracing::Instrument as _;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load .env before clap reads the environment; report once logging is up.
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "main.dotenv.loaded"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "main.dotenv.unreadable"),
    }

    let config = cli.settings.app_config();
    let directory = SqliteDirectory::new(&config.database_url)
        .await
        .context("failed to open recipient database")?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(&config, &directory).await,
        Commands::Register { name, phone, email } => {
            let http = http_client(&config)?;
            let cooldowns = SqliteCooldowns::new(&config.database_url)
                .await
                .context("failed to open cooldown table")?;
            commands::register(
                &directory,
                &cooldowns,
                &sms_channel(&config, &http),
                &email_channel(&config).context("failed to configure SMTP")?,
                &name,
                phone.as_deref(),
                email.as_deref(),
            )
            .await
            .map(drop)
        }
        Commands::Unregister { contact } => commands::unregister(&directory, &contact).await,
    }
}

async fn run(config: &AppConfig, directory: &SqliteDirectory) -> anyhow::Result<()> {
    let http = http_client(config)?;
    let sms = sms_channel(config, &http);
    let email = email_channel(config).context("failed to configure SMTP")?;
    let source = WeatherApiSource::new(http, &config.weather);

    let cooldowns = SqliteCooldowns::new(&config.database_url)
        .await
        .context("failed to open cooldown table")?;
    let throttle = RateLimiter::new(
        cooldowns.load().await.context("failed to load cooldowns")?,
        SystemClock,
    );

    let alerts = AlertOrchestrator::new(
        AlertConfig::builder()
            .period(config.alert_interval)
            .location_label(config.location_label.clone())
            .build()
            .context("failed to build alert config")?,
    );
    let conditions = ConditionsMonitor::new(
        ConditionsConfig::builder()
            .period(config.conditions_interval)
            .build()
            .context("failed to build conditions config")?,
    );

    tracing::info!(
        location = %config.weather.location,
        alert_interval_secs = config.alert_interval.as_secs(),
        conditions_interval_secs = config.conditions_interval.as_secs(),
        "main.started"
    );

    let schedules = async {
        tokio::join!(
            alerts
                .run(&source, directory, &throttle, &sms, &email)
                .instrument(tracing::info_span!("alerts")),
            conditions
                .run(&source)
                .instrument(tracing::info_span!("conditions")),
        );
    };

    // Both schedules are unbounded; only CTRL+C ends the process.
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("main.shutdown: ctrl_c received");
        }
        () = schedules => {}
    }

    cooldowns
        .save(throttle.store())
        .await
        .context("failed to persist cooldowns")
}

fn http_client(config: &AppConfig) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .context("failed to build HTTP client")
}

fn sms_channel(config: &AppConfig, http: &reqwest::Client) -> SmsChannel {
    match &config.sms {
        Some(settings) => SmsChannel::ClickSend(ClickSendSms::new(http.clone(), settings)),
        None => {
            tracing::warn!("main.sms.dry_run: CLICKSEND_USER/CLICKSEND_KEY not set, logging SMS instead");
            SmsChannel::Log(LogSms::new())
        }
    }
}

fn email_channel(config: &AppConfig) -> anyhow::Result<EmailChannel> {
    match &config.email {
        Some(settings) => Ok(EmailChannel::Smtp(Box::new(SmtpEmail::new(settings)?))),
        None => {
            tracing::warn!("main.email.dry_run: EMAIL_USER/EMAIL_PASS not set, logging email instead");
            Ok(EmailChannel::Log(LogEmail::new()))
        }
    }
}
