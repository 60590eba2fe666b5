// Rust guideline compliant 2026-10-12

//! Rate limiter component -- per-recipient, per-class cooldown authorization.
//!
//! [`RateLimiter`] implements the `domain::Throttle` port on top of any
//! `domain::CooldownStore` and `domain::Clock`. The default store is
//! [`InMemoryCooldownStore`]; the default clock is [`SystemClock`].
//!
//! Entry points: [`RateLimiter::maybe_authorize`], [`RateLimiter::sweep`].

use domain::{ChannelClass, Clock, CooldownStore, Throttle};
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

// ---------------------------------------------------------------------------
// SystemClock
// ---------------------------------------------------------------------------

/// `Clock` adapter reading the OS wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        // A clock set before 1970 reads as 0, which only makes windows longer.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

// ---------------------------------------------------------------------------
// InMemoryCooldownStore
// ---------------------------------------------------------------------------

/// `CooldownStore` adapter backed by a process-local `HashMap`.
///
/// Entries live until [`sweep`](CooldownStore::sweep) evicts them. Safe on
/// `current_thread` runtimes: no borrow is held across an `.await`.
#[derive(Debug, Default)]
pub struct InMemoryCooldownStore {
    entries: RefCell<HashMap<(ChannelClass, String), u64>>,
}

impl InMemoryCooldownStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with `(class, recipient_key, stamped_at_ms)` rows.
    ///
    /// A key repeated within `entries` keeps its latest stamp.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = (ChannelClass, String, u64)>) -> Self {
        let mut map: HashMap<(ChannelClass, String), u64> = HashMap::new();
        for (class, key, stamped) in entries {
            let slot = map.entry((class, key)).or_insert(stamped);
            *slot = (*slot).max(stamped);
        }
        Self { entries: RefCell::new(map) }
    }

    /// Snapshot of every entry as `(class, recipient_key, stamped_at_ms)`.
    #[must_use]
    pub fn entries(&self) -> Vec<(ChannelClass, String, u64)> {
        self.entries
            .borrow()
            .iter()
            .map(|((class, key), &stamped)| (*class, key.clone(), stamped))
            .collect()
    }

    /// Last authorization stamp for `(class, recipient_key)`, if any.
    #[must_use]
    pub fn last_authorized(&self, class: ChannelClass, recipient_key: &str) -> Option<u64> {
        self.entries
            .borrow()
            .get(&(class, recipient_key.to_owned()))
            .copied()
    }
}

impl CooldownStore for InMemoryCooldownStore {
    fn check_and_stamp(
        &self,
        class: ChannelClass,
        recipient_key: &str,
        now_ms: u64,
        window_ms: u64,
    ) -> bool {
        // Single mutable borrow: the lookup and the stamp cannot interleave.
        let mut entries = self.entries.borrow_mut();
        let key = (class, recipient_key.to_owned());
        let permitted = entries
            .get(&key)
            .is_none_or(|&last| now_ms.saturating_sub(last) >= window_ms);
        if permitted {
            entries.insert(key, now_ms);
        }
        permitted
    }

    fn sweep(&self, now_ms: u64) -> usize {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|(class, _), last| now_ms.saturating_sub(*last) < class.cooldown_ms());
        before - entries.len()
    }

    fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

// ---------------------------------------------------------------------------
// RateLimiter
// ---------------------------------------------------------------------------

/// Cooldown gate implementing the `domain::Throttle` port.
///
/// Windows are fixed per [`ChannelClass`]; the caller cannot override them.
/// Authorization is stamped at grant time, not at delivery time.
#[derive(Debug)]
pub struct RateLimiter<S: CooldownStore, C: Clock> {
    store: S,
    clock: C,
}

impl RateLimiter<InMemoryCooldownStore, SystemClock> {
    /// Rate limiter over an empty in-memory store and the system clock.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(InMemoryCooldownStore::new(), SystemClock)
    }
}

impl<S: CooldownStore, C: Clock> RateLimiter<S, C> {
    /// Create a rate limiter from a store and a clock.
    #[must_use]
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Check-and-set authorization for `(class, recipient_key)` at the current time.
    pub fn maybe_authorize(&self, recipient_key: &str, class: ChannelClass) -> bool {
        let now = self.clock.now_ms();
        let permitted = self
            .store
            .check_and_stamp(class, recipient_key, now, class.cooldown_ms());
        // The key is a phone number; keep it out of the logs.
        tracing::debug!(class = class.as_str(), permitted, "rate_limiter.authorize");
        permitted
    }

    /// Evict every entry whose window has elapsed. Returns the eviction count.
    pub fn sweep(&self) -> usize {
        let evicted = self.store.sweep(self.clock.now_ms());
        if evicted > 0 {
            tracing::debug!(evicted, remaining = self.store.len(), "rate_limiter.sweep");
        }
        evicted
    }

    /// Borrow the underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: CooldownStore, C: Clock> Throttle for RateLimiter<S, C> {
    fn maybe_authorize(&self, recipient_key: &str, class: ChannelClass) -> bool {
        Self::maybe_authorize(self, recipient_key, class)
    }

    fn sweep(&self) -> usize {
        Self::sweep(self)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::{InMemoryCooldownStore, RateLimiter, SystemClock};
    use domain::{ChannelClass, Clock, CooldownStore as _};
    use std::cell::Cell;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    const MINUTE_MS: u64 = 60_000;
    const HOUR_MS: u64 = 60 * MINUTE_MS;
    const PHONE: &str = "11987654321";

    /// Test clock advanced by hand.
    #[derive(Debug)]
    struct ManualClock {
        now: Cell<u64>,
    }

    impl ManualClock {
        fn at(now: u64) -> Self {
            Self { now: Cell::new(now) }
        }
    }

    impl Clock for &ManualClock {
        fn now_ms(&self) -> u64 {
            self.now.get()
        }
    }

    /// In-memory log sink for asserting on formatted events.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture_subscriber(logs: &CapturedLogs) -> impl tracing::Subscriber + Send + Sync + use<> {
        tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .finish()
    }

    fn limiter(clock: &ManualClock) -> RateLimiter<InMemoryCooldownStore, &ManualClock> {
        RateLimiter::new(InMemoryCooldownStore::new(), clock)
    }

    #[test]
    fn alerta_first_call_authorizes_second_denies() {
        let clock = ManualClock::at(1_000_000);
        let limiter = limiter(&clock);

        assert!(limiter.maybe_authorize(PHONE, ChannelClass::Alerta));
        assert!(!limiter.maybe_authorize(PHONE, ChannelClass::Alerta));
    }

    #[test]
    fn alerta_reauthorizes_after_five_hours() {
        let clock = ManualClock::at(1_000_000);
        let limiter = limiter(&clock);
        assert!(limiter.maybe_authorize(PHONE, ChannelClass::Alerta));

        clock.now.set(1_000_000 + 5 * HOUR_MS - 1);
        assert!(!limiter.maybe_authorize(PHONE, ChannelClass::Alerta));

        clock.now.set(1_000_000 + 5 * HOUR_MS);
        assert!(limiter.maybe_authorize(PHONE, ChannelClass::Alerta));
    }

    #[test]
    fn denied_call_does_not_extend_window() {
        let clock = ManualClock::at(0);
        let limiter = limiter(&clock);
        assert!(limiter.maybe_authorize(PHONE, ChannelClass::Alerta));

        clock.now.set(4 * HOUR_MS);
        assert!(!limiter.maybe_authorize(PHONE, ChannelClass::Alerta));
        assert_eq!(limiter.store().last_authorized(ChannelClass::Alerta, PHONE), Some(0));

        clock.now.set(5 * HOUR_MS);
        assert!(limiter.maybe_authorize(PHONE, ChannelClass::Alerta));
    }

    #[test]
    fn cadastro_uses_one_hour_window() {
        let clock = ManualClock::at(0);
        let limiter = limiter(&clock);
        assert!(limiter.maybe_authorize(PHONE, ChannelClass::Cadastro));

        clock.now.set(59 * MINUTE_MS);
        assert!(!limiter.maybe_authorize(PHONE, ChannelClass::Cadastro));

        clock.now.set(HOUR_MS);
        assert!(limiter.maybe_authorize(PHONE, ChannelClass::Cadastro));
    }

    #[test]
    fn classes_are_independent_for_same_recipient() {
        let clock = ManualClock::at(0);
        let limiter = limiter(&clock);

        assert!(limiter.maybe_authorize(PHONE, ChannelClass::Alerta));
        assert!(limiter.maybe_authorize(PHONE, ChannelClass::Cadastro));

        clock.now.set(HOUR_MS);
        // Cadastro window elapsed, Alerta still cooling down.
        assert!(limiter.maybe_authorize(PHONE, ChannelClass::Cadastro));
        assert!(!limiter.maybe_authorize(PHONE, ChannelClass::Alerta));
    }

    #[test]
    fn recipients_are_independent() {
        let clock = ManualClock::at(0);
        let limiter = limiter(&clock);

        assert!(limiter.maybe_authorize(PHONE, ChannelClass::Alerta));
        assert!(limiter.maybe_authorize("21912345678", ChannelClass::Alerta));
    }

    #[test]
    fn sweep_evicts_only_elapsed_entries() {
        let clock = ManualClock::at(0);
        let limiter = limiter(&clock);
        assert!(limiter.maybe_authorize(PHONE, ChannelClass::Alerta));
        assert!(limiter.maybe_authorize(PHONE, ChannelClass::Cadastro));
        assert_eq!(limiter.store().len(), 2);

        clock.now.set(2 * HOUR_MS);
        assert_eq!(limiter.sweep(), 1, "only the cadastro entry has elapsed");
        assert_eq!(limiter.store().len(), 1);
        assert!(!limiter.maybe_authorize(PHONE, ChannelClass::Alerta));

        clock.now.set(5 * HOUR_MS);
        assert_eq!(limiter.sweep(), 1);
        assert!(limiter.store().is_empty());
    }

    #[test]
    fn seeded_store_keeps_windows_across_instances() {
        let clock = ManualClock::at(0);
        let first = limiter(&clock);
        assert!(first.maybe_authorize(PHONE, ChannelClass::Cadastro));

        clock.now.set(10 * MINUTE_MS);
        let second = RateLimiter::new(InMemoryCooldownStore::from_entries(first.store().entries()), &clock);
        assert!(!second.maybe_authorize(PHONE, ChannelClass::Cadastro));
        assert!(second.maybe_authorize(PHONE, ChannelClass::Alerta));
    }

    #[test]
    fn from_entries_keeps_latest_stamp_per_key() {
        let store = InMemoryCooldownStore::from_entries([
            (ChannelClass::Alerta, PHONE.to_owned(), 5),
            (ChannelClass::Alerta, PHONE.to_owned(), 9),
            (ChannelClass::Alerta, PHONE.to_owned(), 7),
        ]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.last_authorized(ChannelClass::Alerta, PHONE), Some(9));
    }

    #[test]
    fn authorize_log_omits_recipient_key() {
        let logs = CapturedLogs::default();
        let clock = ManualClock::at(0);
        let limiter = limiter(&clock);

        tracing::subscriber::with_default(capture_subscriber(&logs), || {
            assert!(limiter.maybe_authorize(PHONE, ChannelClass::Alerta));
            assert!(!limiter.maybe_authorize(PHONE, ChannelClass::Alerta));
        });

        let text = logs.text();
        assert!(text.contains("rate_limiter.authorize"), "{text}");
        assert!(!text.contains(PHONE), "{text}");
    }

    #[test]
    fn clock_going_backwards_denies() {
        let clock = ManualClock::at(10 * HOUR_MS);
        let limiter = limiter(&clock);
        assert!(limiter.maybe_authorize(PHONE, ChannelClass::Alerta));

        clock.now.set(HOUR_MS);
        assert!(!limiter.maybe_authorize(PHONE, ChannelClass::Alerta));
    }

    #[test]
    fn system_clock_is_after_2020() {
        // 2020-01-01T00:00:00Z
        assert!(SystemClock.now_ms() > 1_577_836_800_000);
    }

    #[test]
    fn in_memory_limiter_starts_empty() {
        let limiter = RateLimiter::in_memory();
        assert!(limiter.store().is_empty());
        assert!(limiter.maybe_authorize(PHONE, ChannelClass::Alerta));
    }
}
