// Rust guideline compliant 2026-10-12

//! Shared domain types for the flood-alert fan-out.
//!
//! Defines `Recipient`, `PhoneNumber`, `WarningRecord`, `ChannelClass`, the
//! per-port error enums, and the hexagonal port traits: `WarningSource`,
//! `ContactDirectory`, `SmsDispatcher`, `EmailDispatcher`, `Throttle`,
//! `CooldownStore`, and `Clock`.
//! All alerting components depend on this crate; no other workspace crate is
//! imported here.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Recipients
// ---------------------------------------------------------------------------

/// A registered citizen as read from the contact directory.
///
/// Immutable for the duration of one alert cycle (read snapshot).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    /// Directory row identifier.
    pub id: i64,
    /// Name shown in greetings and logs.
    pub display_name: String,
    /// Raw stored phone number; may be absent or malformed.
    pub phone_number: Option<String>,
    /// Raw stored email address; may be absent or blank.
    pub email_address: Option<String>,
}

impl Recipient {
    /// Return the phone number when it is present and well formed.
    #[must_use]
    pub fn phone(&self) -> Option<PhoneNumber> {
        self.phone_number
            .as_deref()
            .and_then(|raw| PhoneNumber::parse(raw).ok())
    }

    /// Return the trimmed email address when it is present and non-blank.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email_address
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }
}

/// A validated 11-digit national mobile number (area code + subscriber).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Exact number of digits a stored phone number must have.
    pub const DIGITS: usize = 11;

    /// Country prefix prepended when addressing the SMS gateway.
    pub const COUNTRY_PREFIX: &'static str = "+55";

    /// Parse a stored phone number.
    ///
    /// # Errors
    ///
    /// Returns [`PhoneError::Malformed`] unless the input is exactly
    /// [`Self::DIGITS`] ASCII digits, with no padding or punctuation.
    pub fn parse(raw: &str) -> Result<Self, PhoneError> {
        if raw.len() != Self::DIGITS || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PhoneError::Malformed { raw: raw.to_owned() });
        }
        Ok(Self(raw.to_owned()))
    }

    /// Parse user input such as `"(11) 98765-4321"` or `"+55 11 98765 4321"`.
    ///
    /// Non-digits are dropped and the last [`Self::DIGITS`] digits are kept,
    /// which also strips a leading country code.
    ///
    /// # Errors
    ///
    /// Returns [`PhoneError::Malformed`] when fewer than eleven digits remain.
    pub fn normalize(input: &str) -> Result<Self, PhoneError> {
        let digits: String = input.chars().filter(char::is_ascii_digit).collect();
        let tail = &digits[digits.len().saturating_sub(Self::DIGITS)..];
        if tail.len() != Self::DIGITS {
            return Err(PhoneError::Malformed { raw: input.to_owned() });
        }
        Ok(Self(tail.to_owned()))
    }

    /// The bare digits; also the recipient key used for rate limiting.
    #[must_use]
    pub fn digits(&self) -> &str {
        &self.0
    }

    /// Destination string in the form expected by the SMS gateway.
    #[must_use]
    pub fn destination(&self) -> String {
        format!("{}{}", Self::COUNTRY_PREFIX, self.0)
    }
}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors from phone number validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhoneError {
    /// Input is not exactly eleven digits.
    #[error("malformed phone number {raw:?}: expected {} digits", PhoneNumber::DIGITS)]
    Malformed {
        /// The rejected input.
        raw: String,
    },
}

// ---------------------------------------------------------------------------
// Weather
// ---------------------------------------------------------------------------

/// A single official hazard notice fetched for the current cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarningRecord {
    pub headline: String,
    pub description: String,
}

/// Current weather reading for the monitored location.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    /// Provider's textual condition (e.g. "Patchy rain nearby").
    pub condition_text: String,
    pub temperature_c: f64,
    /// Relative humidity in percent.
    pub humidity: u8,
    pub wind_kph: f64,
    pub feels_like_c: f64,
    /// Absolute icon URL, when the provider returns one.
    pub icon_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Channels
// ---------------------------------------------------------------------------

/// Category partitioning rate-limit cooldown windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelClass {
    /// Official weather warnings (5 h window).
    Alerta,
    /// Registration confirmations (1 h window).
    Cadastro,
}

impl ChannelClass {
    /// Fixed cooldown window for this class.
    #[must_use]
    pub const fn cooldown(self) -> Duration {
        match self {
            Self::Alerta => Duration::from_secs(5 * 3600),
            Self::Cadastro => Duration::from_secs(3600),
        }
    }

    /// Cooldown window in milliseconds, the unit cooldown stores work in.
    #[must_use]
    pub const fn cooldown_ms(self) -> u64 {
        self.cooldown().as_secs() * 1000
    }

    /// Lower-case name used in log fields and persisted cooldown rows.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Alerta => "alerta",
            Self::Cadastro => "cadastro",
        }
    }

    /// Inverse of [`as_str`](Self::as_str).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "alerta" => Some(Self::Alerta),
            "cadastro" => Some(Self::Cadastro),
            _ => None,
        }
    }
}

/// Outbound notification channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Sms,
    Email,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Sms => "sms",
            Self::Email => "email",
        })
    }
}

/// Provider acknowledgement for one SMS submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsReceipt {
    /// Per-message status string reported by the gateway, if any.
    pub status: Option<String>,
}

/// A fully composed email ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    /// Plain-text alternative. Adapters derive one from `html` when `None`.
    pub text: Option<String>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from the `WarningSource` hexagonal port.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// No API credential is configured; callers skip the poll silently.
    #[error("weather source credential not configured")]
    MissingCredential,
    /// The provider could not be reached or answered with an error status.
    #[error("weather source unavailable: {reason}")]
    Unavailable {
        /// Human-readable description.
        reason: String,
    },
    /// The provider answered with a payload that could not be interpreted.
    #[error("weather source returned malformed data: {reason}")]
    Malformed {
        /// Human-readable description.
        reason: String,
    },
}

/// Errors from the `ContactDirectory` hexagonal port.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    /// The directory store could not be queried.
    #[error("contact directory unavailable: {reason}")]
    Unavailable {
        /// Human-readable description.
        reason: String,
    },
    /// Registration input failed validation.
    #[error("invalid registration: {reason}")]
    Invalid {
        /// Human-readable description.
        reason: String,
    },
    /// Another recipient already holds this phone number or email address.
    #[error("{field} already registered")]
    Duplicate {
        /// `"phone"` or `"email"`.
        field: &'static str,
    },
    /// No recipient matches the given contact.
    #[error("no recipient registered with {contact:?}")]
    NotFound {
        /// The phone number or email address looked up.
        contact: String,
    },
}

/// Errors from the `SmsDispatcher` and `EmailDispatcher` hexagonal ports.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The provider received the request and refused it.
    #[error("rejected by provider: {reason}")]
    Rejected {
        /// Human-readable description.
        reason: String,
    },
    /// The provider could not be reached.
    #[error("provider unreachable: {reason}")]
    Unreachable {
        /// Human-readable description.
        reason: String,
    },
    /// The message could not be built (bad address, bad header).
    #[error("invalid message: {reason}")]
    InvalidMessage {
        /// Human-readable description.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Hexagonal port: external feed of official weather warnings.
#[expect(
    async_fn_in_trait,
    reason = "no dyn dispatch needed; internal workspace only"
)]
pub trait WarningSource {
    /// Fetch the warnings currently active for the monitored location.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::MissingCredential` when no API key is configured,
    /// `SourceError::Unavailable` on transport or status failures, and
    /// `SourceError::Malformed` when the payload cannot be decoded.
    async fn active_warnings(&self) -> Result<Vec<WarningRecord>, SourceError>;

    /// Fetch the current conditions for the monitored location.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`active_warnings`](Self::active_warnings).
    async fn current_conditions(&self) -> Result<CurrentConditions, SourceError>;
}

/// Hexagonal port: snapshot of all registered recipients.
#[expect(
    async_fn_in_trait,
    reason = "no dyn dispatch needed; internal workspace only"
)]
pub trait ContactDirectory {
    /// Return every registered recipient.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Unavailable` when the store cannot be queried.
    async fn recipients(&self) -> Result<Vec<Recipient>, DirectoryError>;
}

/// Hexagonal port: one-shot SMS submission. Implementations never retry.
#[expect(
    async_fn_in_trait,
    reason = "no dyn dispatch needed; internal workspace only"
)]
pub trait SmsDispatcher {
    /// Submit `body` to `destination` (country-prefixed number).
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Rejected` or `DispatchError::Unreachable`.
    async fn send(&self, destination: &str, body: &str) -> Result<SmsReceipt, DispatchError>;
}

/// Hexagonal port: one-shot email submission. Implementations never retry.
#[expect(
    async_fn_in_trait,
    reason = "no dyn dispatch needed; internal workspace only"
)]
pub trait EmailDispatcher {
    /// Submit `message` to the relay.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::InvalidMessage` when the message cannot be
    /// built, otherwise `Rejected` or `Unreachable`.
    async fn send(&self, message: &EmailMessage) -> Result<(), DispatchError>;
}

/// Hexagonal port: per-recipient, per-class send authorization.
pub trait Throttle {
    /// Check-and-set: return `true` and start a new window when the previous
    /// authorization for `(class, recipient_key)` is absent or expired.
    fn maybe_authorize(&self, recipient_key: &str, class: ChannelClass) -> bool;

    /// Drop state that can no longer deny anything. Returns the number of
    /// dropped entries; the default has nothing to drop.
    fn sweep(&self) -> usize {
        0
    }
}

/// Hexagonal port: storage behind a `Throttle`.
///
/// Keyed by `(class, recipient_key)`; values are epoch milliseconds.
pub trait CooldownStore {
    /// Atomically stamp `now_ms` and return `true` when no entry exists or
    /// `now_ms - last >= window_ms`; otherwise return `false` untouched.
    fn check_and_stamp(
        &self,
        class: ChannelClass,
        recipient_key: &str,
        now_ms: u64,
        window_ms: u64,
    ) -> bool;

    /// Evict entries whose class window has fully elapsed at `now_ms`.
    /// Returns the number of evicted entries.
    fn sweep(&self, now_ms: u64) -> usize;

    /// Number of live entries.
    fn len(&self) -> usize;

    /// `true` when the store holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Hexagonal port: wall-clock source in epoch milliseconds.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn recipient(phone: Option<&str>, email: Option<&str>) -> Recipient {
        Recipient {
            id: 1,
            display_name: "Ana".to_owned(),
            phone_number: phone.map(str::to_owned),
            email_address: email.map(str::to_owned),
        }
    }

    #[test]
    fn phone_accepts_exactly_eleven_digits() {
        let phone = PhoneNumber::parse("11987654321").unwrap();
        assert_eq!(phone.digits(), "11987654321");
        assert_eq!(phone.destination(), "+5511987654321");
    }

    #[test]
    fn phone_rejects_wrong_length_and_non_digits() {
        for raw in [
            "1198765432",
            "119876543210",
            "(11)98765-432",
            "",
            "1198765432a",
            " 11987654321",
            "11987654321 ",
        ] {
            assert!(
                matches!(PhoneNumber::parse(raw), Err(PhoneError::Malformed { .. })),
                "{raw:?} must be rejected"
            );
        }
    }

    #[test]
    fn phone_normalize_strips_formatting_and_country_code() {
        for input in ["(11) 98765-4321", "+55 11 98765-4321", " 11987654321 ", "11987654321"] {
            assert_eq!(PhoneNumber::normalize(input).unwrap().digits(), "11987654321", "{input:?}");
        }
    }

    #[test]
    fn phone_normalize_rejects_short_input() {
        assert_eq!(
            PhoneNumber::normalize("(11) 9876-5432"),
            Err(PhoneError::Malformed { raw: "(11) 9876-5432".to_owned() })
        );
        assert!(PhoneNumber::normalize("").is_err());
    }

    #[test]
    fn recipient_phone_none_when_malformed() {
        assert!(recipient(Some("12345"), None).phone().is_none());
        assert!(recipient(None, None).phone().is_none());
        assert!(recipient(Some("11987654321"), None).phone().is_some());
    }

    #[test]
    fn recipient_email_ignores_blank() {
        assert_eq!(recipient(None, Some(" a@b.com ")).email(), Some("a@b.com"));
        assert_eq!(recipient(None, Some("   ")).email(), None);
        assert_eq!(recipient(None, None).email(), None);
    }

    #[test]
    fn channel_class_windows() {
        assert_eq!(ChannelClass::Alerta.cooldown(), Duration::from_secs(18_000));
        assert_eq!(ChannelClass::Cadastro.cooldown(), Duration::from_secs(3_600));
        assert_eq!(ChannelClass::Alerta.cooldown_ms(), 18_000_000);
        assert_eq!(ChannelClass::Cadastro.as_str(), "cadastro");
        assert_eq!(ChannelClass::from_name("alerta"), Some(ChannelClass::Alerta));
        assert_eq!(ChannelClass::from_name("Alerta"), None);
    }

    #[test]
    fn error_messages() {
        let e = DispatchError::Rejected { reason: "INVALID_RECIPIENT".to_owned() };
        assert_eq!(e.to_string(), "rejected by provider: INVALID_RECIPIENT");
        assert_eq!(
            SourceError::MissingCredential.to_string(),
            "weather source credential not configured"
        );
    }

    /// Verify that minimal implementations of every async port compile and run.
    #[tokio::test]
    async fn port_trait_struct_impl() {
        struct AllPorts {
            sends: Cell<u32>,
        }

        impl WarningSource for AllPorts {
            async fn active_warnings(&self) -> Result<Vec<WarningRecord>, SourceError> {
                Ok(vec![])
            }

            async fn current_conditions(&self) -> Result<CurrentConditions, SourceError> {
                Err(SourceError::MissingCredential)
            }
        }

        impl ContactDirectory for AllPorts {
            async fn recipients(&self) -> Result<Vec<Recipient>, DirectoryError> {
                Ok(vec![])
            }
        }

        impl SmsDispatcher for AllPorts {
            async fn send(&self, _destination: &str, _body: &str) -> Result<SmsReceipt, DispatchError> {
                self.sends.set(self.sends.get() + 1);
                Ok(SmsReceipt { status: Some("SUCCESS".to_owned()) })
            }
        }

        let ports = AllPorts { sends: Cell::new(0) };
        assert!(ports.active_warnings().await.unwrap().is_empty());
        assert!(ports.recipients().await.unwrap().is_empty());
        let receipt = ports.send("+5511987654321", "hi").await.unwrap();
        assert_eq!(receipt.status.as_deref(), Some("SUCCESS"));
        assert_eq!(ports.sends.get(), 1);
    }
}
