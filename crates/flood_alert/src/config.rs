// Rust guideline compliant 2026-10-12

//! Command line and environment configuration.
//!
//! Every setting is a long flag that falls back to an environment variable,
//! then to a default. `main` loads `.env` before parsing, so real environment
//! variables win over the file and flags win over both. Channels whose
//! credentials are absent are reported as `None` and replaced by logging
//! adapters.

use clap::{Parser, Subcommand};
use std::time::Duration;

const DEFAULT_DATABASE_URL: &str = "sqlite:flood_alert.db";
const DEFAULT_WEATHER_API_URL: &str = "http://api.weatherapi.com/v1";
const DEFAULT_LOCATION: &str = "Santa Isabel,Sao Paulo,Brazil";
const DEFAULT_CLICKSEND_API_URL: &str = "https://rest.clicksend.com/v3";
const DEFAULT_EMAIL_HOST: &str = "smtp.gmail.com";

#[derive(Debug, Parser)]
#[command(name = "flood_alert", version, about = "Official flood warnings by SMS and email")]
pub struct Cli {
    #[command(flatten)]
    pub settings: Settings,

    /// What to do; defaults to `run`.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the alert and current-conditions schedules until CTRL+C.
    Run,
    /// Add a recipient and send the welcome messages.
    Register {
        /// Name used in greetings (at least 3 characters).
        name: String,
        /// Mobile number; punctuation and a +55 prefix are accepted.
        #[arg(long)]
        phone: Option<String>,
        /// Email address.
        #[arg(long)]
        email: Option<String>,
    },
    /// Remove the recipient holding a phone number or email address.
    Unregister {
        /// Phone number or email address used at registration.
        contact: String,
    },
}

#[derive(Debug, clap::Args)]
pub struct Settings {
    /// Recipient and cooldown database.
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,

    /// WeatherAPI key; without it warning polling is skipped.
    #[arg(long, env = "WEATHER_API_KEY", hide_env_values = true)]
    pub weather_api_key: Option<String>,

    #[arg(long, env = "WEATHER_API_URL", default_value = DEFAULT_WEATHER_API_URL)]
    pub weather_api_url: String,

    /// Provider query string for the monitored place.
    #[arg(long, env = "WEATHER_LOCATION", default_value = DEFAULT_LOCATION)]
    pub weather_location: String,

    #[arg(long, env = "CLICKSEND_USER")]
    pub clicksend_user: Option<String>,

    #[arg(long, env = "CLICKSEND_KEY", hide_env_values = true)]
    pub clicksend_key: Option<String>,

    #[arg(long, env = "CLICKSEND_API_URL", default_value = DEFAULT_CLICKSEND_API_URL)]
    pub clicksend_api_url: String,

    #[arg(long, env = "EMAIL_HOST", default_value = DEFAULT_EMAIL_HOST)]
    pub email_host: String,

    /// SMTP port; 465 is implicit TLS.
    #[arg(long, env = "EMAIL_PORT", default_value_t = 465)]
    pub email_port: u16,

    #[arg(long, env = "EMAIL_USER")]
    pub email_user: Option<String>,

    #[arg(long, env = "EMAIL_PASS", hide_env_values = true)]
    pub email_pass: Option<String>,

    /// Sender mailbox; defaults to the SMTP user.
    #[arg(long, env = "EMAIL_FROM")]
    pub email_from: Option<String>,

    /// Place name shown in alert email subjects; defaults to the first part
    /// of the weather location.
    #[arg(long, env = "ALERT_LOCATION_LABEL")]
    pub alert_location_label: Option<String>,

    #[arg(long, env = "ALERT_INTERVAL_SECS", default_value_t = 3600)]
    pub alert_interval_secs: u64,

    #[arg(long, env = "CONDITIONS_INTERVAL_SECS", default_value_t = 15 * 60)]
    pub conditions_interval_secs: u64,

    /// Per-request timeout for outbound HTTP calls.
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value_t = 10)]
    pub http_timeout_secs: u64,
}

/// Weather provider settings. A missing key disables polling, not startup.
#[derive(Debug, Clone)]
pub struct WeatherSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    /// Provider query string, e.g. `"Santa Isabel,Sao Paulo,Brazil"`.
    pub location: String,
}

/// SMS gateway credentials.
#[derive(Debug, Clone)]
pub struct ClickSendSettings {
    pub username: String,
    pub api_key: String,
    pub base_url: String,
}

/// SMTP relay settings.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Sender mailbox; defaults to `username`.
    pub from: String,
}

/// Everything `main` needs to wire the adapters.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub weather: WeatherSettings,
    pub sms: Option<ClickSendSettings>,
    pub email: Option<SmtpSettings>,
    pub location_label: String,
    pub alert_interval: Duration,
    pub conditions_interval: Duration,
    pub http_timeout: Duration,
}

/// Blank values count as unset.
fn present(value: Option<&String>) -> Option<String> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty()).map(str::to_owned)
}

impl Settings {
    /// Group the flat settings per adapter.
    #[must_use]
    pub fn app_config(&self) -> AppConfig {
        let weather = WeatherSettings {
            api_key: present(self.weather_api_key.as_ref()),
            base_url: self.weather_api_url.clone(),
            location: self.weather_location.clone(),
        };

        let sms = match (present(self.clicksend_user.as_ref()), present(self.clicksend_key.as_ref())) {
            (Some(username), Some(api_key)) => Some(ClickSendSettings {
                username,
                api_key,
                base_url: self.clicksend_api_url.clone(),
            }),
            _ => None,
        };

        let email = match (present(self.email_user.as_ref()), present(self.email_pass.as_ref())) {
            (Some(username), Some(password)) => Some(SmtpSettings {
                host: self.email_host.clone(),
                port: self.email_port,
                from: present(self.email_from.as_ref()).unwrap_or_else(|| username.clone()),
                username,
                password,
            }),
            _ => None,
        };

        let location_label = present(self.alert_location_label.as_ref()).unwrap_or_else(|| {
            self.weather_location
                .split(',')
                .next()
                .map_or_else(|| self.weather_location.clone(), |s| s.trim().to_owned())
        });

        AppConfig {
            database_url: self.database_url.clone(),
            weather,
            sms,
            email,
            location_label,
            alert_interval: Duration::from_secs(self.alert_interval_secs),
            conditions_interval: Duration::from_secs(self.conditions_interval_secs),
            http_timeout: Duration::from_secs(self.http_timeout_secs),
        }
    }
}
