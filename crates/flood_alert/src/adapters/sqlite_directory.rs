// Rust guideline compliant 2026-10-12

//! SQLite adapter for the `ContactDirectory` port.
//!
//! Recipients live in a single `recipients` table created on first use.
//! `register` normalizes contacts before storing them: phones keep their
//! last eleven digits, emails are trimmed and lower-cased. Both columns are
//! unique, so one person cannot receive the same alert twice.

use domain::{ContactDirectory, DirectoryError, PhoneNumber, Recipient};

type RecipientRow = (i64, String, Option<String>, Option<String>);

const MIN_NAME_CHARS: usize = 3;

fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// `local@domain.tld` with no whitespace and a single `@`.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let clean = |s: &str| !s.is_empty() && !s.contains('@') && !s.chars().any(char::is_whitespace);
    clean(local)
        && clean(domain)
        && domain
            .char_indices()
            .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// Map a write failure, turning unique-index violations into `Duplicate`.
fn write_error(e: &sqlx::Error, op: &str) -> DirectoryError {
    if let sqlx::Error::Database(db) = e
        && db.is_unique_violation()
    {
        let field = if db.message().contains("email") { "email" } else { "phone" };
        return DirectoryError::Duplicate { field };
    }
    tracing::error!(error = %e, op, "sqlite.directory.write");
    DirectoryError::Unavailable { reason: e.to_string() }
}

fn read_error(e: &sqlx::Error, op: &str) -> DirectoryError {
    tracing::error!(error = %e, op, "sqlite.directory.read");
    DirectoryError::Unavailable { reason: e.to_string() }
}

/// `ContactDirectory` adapter backed by a SQLite database via `sqlx`.
#[derive(Debug, Clone)]
pub struct SqliteDirectory {
    pool: sqlx::SqlitePool,
}

impl SqliteDirectory {
    /// Open or create the database at `db_url` and ensure the schema exists.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` when the connection or schema creation fails,
    /// including when existing rows already violate the unique indexes.
    pub async fn new(db_url: &str) -> Result<Self, sqlx::Error> {
        let opts = db_url
            .parse::<sqlx::sqlite::SqliteConnectOptions>()?
            .create_if_missing(true);
        let pool = sqlx::SqlitePool::connect_with(opts).await?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS recipients (
                id    INTEGER PRIMARY KEY AUTOINCREMENT,
                name  TEXT    NOT NULL,
                phone TEXT,
                email TEXT
            )",
        )
        .execute(&pool)
        .await?;
        // Indexes rather than column constraints so older tables gain them too.
        // NULLs never collide, so contact-less columns stay legal.
        sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS recipients_phone_key ON recipients (phone)")
            .execute(&pool)
            .await?;
        sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS recipients_email_key ON recipients (email)")
            .execute(&pool)
            .await?;
        Ok(Self { pool })
    }

    /// Validate, normalize and insert a new recipient.
    ///
    /// Blank contacts count as absent; at least one must remain.
    ///
    /// # Errors
    ///
    /// - `DirectoryError::Invalid` for a short name, a phone without eleven
    ///   digits, a malformed email, or no contact at all.
    /// - `DirectoryError::Duplicate` when the phone or email is taken.
    /// - `DirectoryError::Unavailable` when the database fails.
    pub async fn register(
        &self,
        display_name: &str,
        phone_number: Option<&str>,
        email_address: Option<&str>,
    ) -> Result<Recipient, DirectoryError> {
        let display_name = display_name.trim();
        if display_name.chars().count() < MIN_NAME_CHARS {
            return Err(DirectoryError::Invalid {
                reason: format!("name must have at least {MIN_NAME_CHARS} characters"),
            });
        }

        let phone_number = match phone_number.map(str::trim).filter(|p| !p.is_empty()) {
            Some(raw) => Some(
                PhoneNumber::normalize(raw)
                    .map_err(|e| DirectoryError::Invalid { reason: e.to_string() })?
                    .digits()
                    .to_owned(),
            ),
            None => None,
        };
        let email_address = email_address.map(normalize_email).filter(|e| !e.is_empty());
        if let Some(email) = &email_address
            && !is_valid_email(email)
        {
            return Err(DirectoryError::Invalid { reason: format!("malformed email {email:?}") });
        }
        if phone_number.is_none() && email_address.is_none() {
            return Err(DirectoryError::Invalid { reason: "a phone or an email is required".to_owned() });
        }

        let id = sqlx::query("INSERT INTO recipients (name, phone, email) VALUES (?, ?, ?)")
            .bind(display_name)
            .bind(phone_number.as_deref())
            .bind(email_address.as_deref())
            .execute(&self.pool)
            .await
            .map_err(|e| write_error(&e, "register"))?
            .last_insert_rowid();

        tracing::info!(recipient_id = id, "sqlite.directory.registered");
        Ok(Recipient { id, display_name: display_name.to_owned(), phone_number, email_address })
    }

    /// Delete the recipient whose phone number or email address is `contact`.
    ///
    /// Input containing `@` is treated as an email, anything else as a phone;
    /// both are normalized the same way as in [`register`](Self::register).
    ///
    /// # Errors
    ///
    /// - `DirectoryError::Invalid` when a phone contact lacks eleven digits.
    /// - `DirectoryError::NotFound` when nobody holds the contact.
    /// - `DirectoryError::Unavailable` when the database fails.
    pub async fn unregister(&self, contact: &str) -> Result<(), DirectoryError> {
        let (column_query, key) = if contact.contains('@') {
            ("DELETE FROM recipients WHERE email = ?", normalize_email(contact))
        } else {
            let phone = PhoneNumber::normalize(contact)
                .map_err(|e| DirectoryError::Invalid { reason: e.to_string() })?;
            ("DELETE FROM recipients WHERE phone = ?", phone.digits().to_owned())
        };

        let deleted = sqlx::query(column_query)
            .bind(key.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| write_error(&e, "unregister"))?
            .rows_affected();
        if deleted == 0 {
            return Err(DirectoryError::NotFound { contact: contact.trim().to_owned() });
        }
        tracing::info!(deleted, "sqlite.directory.unregistered");
        Ok(())
    }
}

impl ContactDirectory for SqliteDirectory {
    /// # Errors
    ///
    /// Returns `DirectoryError::Unavailable` on any `sqlx` error. The
    /// underlying error is logged at `error` level before mapping.
    async fn recipients(&self) -> Result<Vec<Recipient>, DirectoryError> {
        let rows: Vec<RecipientRow> =
            sqlx::query_as("SELECT id, name, phone, email FROM recipients ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| read_error(&e, "recipients"))?;
        Ok(rows
            .into_iter()
            .map(|(id, display_name, phone_number, email_address)| Recipient {
                id,
                display_name,
                phone_number,
                email_address,
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
