// Rust guideline compliant 2026-10-12

//! SQLite persistence for rate-limiter cooldown stamps.
//!
//! The limiter checks and stamps synchronously in memory; this adapter
//! seeds that memory at startup ([`SqliteCooldowns::load`]) and writes it
//! back ([`SqliteCooldowns::save`]) so windows survive restarts and hold
//! across separate `register` invocations.

use domain::{ChannelClass, CooldownStore as _};
use rate_limiter::InMemoryCooldownStore;

type CooldownRow = (String, String, i64);

/// Cooldown table in the same database as the recipients.
#[derive(Debug, Clone)]
pub struct SqliteCooldowns {
    pool: sqlx::SqlitePool,
}

impl SqliteCooldowns {
    /// Open or create the database at `db_url` and ensure the table exists.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` when the connection or schema creation fails.
    pub async fn new(db_url: &str) -> Result<Self, sqlx::Error> {
        let opts = db_url
            .parse::<sqlx::sqlite::SqliteConnectOptions>()?
            .create_if_missing(true);
        let pool = sqlx::SqlitePool::connect_with(opts).await?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS cooldowns (
                class         TEXT    NOT NULL,
                recipient_key TEXT    NOT NULL,
                stamped_ms    INTEGER NOT NULL,
                PRIMARY KEY (class, recipient_key)
            )",
        )
        .execute(&pool)
        .await?;
        Ok(Self { pool })
    }

    /// Read every stamp into a fresh in-memory store.
    ///
    /// Rows with an unknown class or a negative stamp are skipped.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` when the query fails.
    pub async fn load(&self) -> Result<InMemoryCooldownStore, sqlx::Error> {
        let rows: Vec<CooldownRow> =
            sqlx::query_as("SELECT class, recipient_key, stamped_ms FROM cooldowns")
                .fetch_all(&self.pool)
                .await?;
        let total = rows.len();
        let store = InMemoryCooldownStore::from_entries(rows.into_iter().filter_map(
            |(class, key, stamped)| {
                Some((ChannelClass::from_name(&class)?, key, u64::try_from(stamped).ok()?))
            },
        ));
        if store.len() < total {
            tracing::warn!(skipped = total - store.len(), "sqlite.cooldowns.unreadable_rows");
        }
        tracing::debug!(entries = store.len(), "sqlite.cooldowns.loaded");
        Ok(store)
    }

    /// Upsert every stamp of `store`, keeping the later stamp on conflict.
    ///
    /// Entries already evicted from `store` are left in the table; the next
    /// `load` followed by a limiter sweep drops them from memory.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` when a write fails; earlier rows stay written.
    pub async fn save(&self, store: &InMemoryCooldownStore) -> Result<(), sqlx::Error> {
        let entries = store.entries();
        for (class, key, stamped) in &entries {
            sqlx::query(
                "INSERT INTO cooldowns (class, recipient_key, stamped_ms) VALUES (?, ?, ?)
                 ON CONFLICT (class, recipient_key)
                 DO UPDATE SET stamped_ms = MAX(stamped_ms, excluded.stamped_ms)",
            )
            .bind(class.as_str())
            .bind(key.as_str())
            .bind(i64::try_from(*stamped).unwrap_or(i64::MAX))
            .execute(&self.pool)
            .await?;
        }
        tracing::debug!(entries = entries.len(), "sqlite.cooldowns.saved");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
