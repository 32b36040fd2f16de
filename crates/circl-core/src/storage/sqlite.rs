use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{StorageBackend, Table};
use crate::error::{CirclError, Result};
use crate::model::*;

const CONTACT_COLUMNS: &str = "id, user_id, name, circle, personal_email, work_email, \
    mobile_phone, work_phone, birthday, location, company, job_title, industry, \
    linkedin_url, twitter_handle, instagram_handle, website, university, major, \
    graduation_year, how_met, hobbies, family_details, notes, favorite, tags, \
    last_contact, created_at, updated_at";

const INTERACTION_COLUMNS: &str = "id, user_id, contact_id, kind, date, notes, created_at";

const KEYSTONE_COLUMNS: &str =
    "id, user_id, contact_id, title, category, date, recurrence, notes, created_at";

const EMAIL_LOG_COLUMNS: &str = "id, user_id, kind, recipient, status, error, created_at";

/// SQLite-backed data service for Circl.
///
/// Uses a single `Connection` behind `Arc<Mutex<>>` so it can be shared
/// across async tasks.  All blocking SQLite calls go through
/// [`with_conn`](Self::with_conn) which runs them on the Tokio blocking
/// thread-pool. Clones share the connection.
#[derive(Clone)]
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
    path: PathBuf,
}

impl SqliteStorage {
    /// Open (or create) a file-backed SQLite database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)
            .map_err(|e| CirclError::Storage(format!("failed to open SQLite database: {e}")))?;

        Self::configure_and_init(conn, path)
    }

    /// Open an in-memory SQLite database (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            CirclError::Storage(format!("failed to open in-memory SQLite database: {e}"))
        })?;

        Self::configure_and_init(conn, PathBuf::from(":memory:"))
    }

    /// Return the path this database was opened with (`:memory:` for in-memory).
    pub fn path(&self) -> &Path {
        &self.path
    }

    // ── helpers ────────────────────────────────────────────────────────

    fn configure_and_init(conn: Connection, path: PathBuf) -> Result<Self> {
        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .map_err(|e| CirclError::Storage(format!("failed to set WAL mode: {e}")))?;

        // Cascades on contact delete depend on this.
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| CirclError::Storage(format!("failed to enable foreign keys: {e}")))?;

        let storage = Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        };

        storage.create_tables()?;
        Ok(storage)
    }

    /// Create all tables and indexes (idempotent).
    fn create_tables(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| CirclError::Storage(format!("failed to acquire database lock: {e}")))?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS contacts (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                circle TEXT NOT NULL DEFAULT 'outer'
                    CHECK (circle IN ('inner', 'middle', 'outer')),
                personal_email TEXT,
                work_email TEXT,
                mobile_phone TEXT,
                work_phone TEXT,
                birthday TEXT,
                location TEXT,
                company TEXT,
                job_title TEXT,
                industry TEXT,
                linkedin_url TEXT,
                twitter_handle TEXT,
                instagram_handle TEXT,
                website TEXT,
                university TEXT,
                major TEXT,
                graduation_year INTEGER,
                how_met TEXT,
                hobbies TEXT,
                family_details TEXT,
                notes TEXT,
                favorite INTEGER NOT NULL DEFAULT 0,
                tags TEXT NOT NULL DEFAULT '[]',
                last_contact TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS interactions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                contact_id TEXT NOT NULL REFERENCES contacts(id) ON DELETE CASCADE,
                kind TEXT NOT NULL,
                date TEXT NOT NULL,
                notes TEXT,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS keystones (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                contact_id TEXT REFERENCES contacts(id) ON DELETE SET NULL,
                title TEXT NOT NULL,
                category TEXT NOT NULL,
                date TEXT NOT NULL,
                recurrence TEXT,
                notes TEXT,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS email_logs (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                recipient TEXT NOT NULL,
                status TEXT NOT NULL,
                error TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_contacts_user ON contacts(user_id);
            CREATE INDEX IF NOT EXISTS idx_interactions_user_date ON interactions(user_id, date DESC);
            CREATE INDEX IF NOT EXISTS idx_interactions_contact ON interactions(contact_id);
            CREATE INDEX IF NOT EXISTS idx_keystones_user ON keystones(user_id);
            CREATE INDEX IF NOT EXISTS idx_email_logs_user ON email_logs(user_id, created_at DESC);
            ",
        )
        .map_err(|e| CirclError::Storage(format!("failed to create tables: {e}")))?;

        Ok(())
    }

    /// Run a blocking closure against the SQLite connection on the Tokio
    /// blocking thread-pool.
    pub(crate) async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|e| {
                CirclError::Storage(format!("failed to acquire database lock: {e}"))
            })?;
            f(&conn)
        })
        .await
        .map_err(|e| CirclError::Storage(format!("task join error: {e}")))?
    }
}

// ── row encoding ────────────────────────────────────────────────────────

fn sql_err(context: &'static str) -> impl FnOnce(rusqlite::Error) -> CirclError {
    move |e| CirclError::Storage(format!("{context}: {e}"))
}

fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn fmt_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn conv_err<E>(idx: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

fn uuid_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let s: String = row.get(idx)?;
    Uuid::parse_str(&s).map_err(|e| conv_err(idx, e))
}

fn opt_uuid_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Uuid>> {
    let s: Option<String> = row.get(idx)?;
    s.map(|s| Uuid::parse_str(&s).map_err(|e| conv_err(idx, e)))
        .transpose()
}

fn ts_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let s: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| conv_err(idx, e))
}

fn opt_ts_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let s: Option<String> = row.get(idx)?;
    s.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|e| conv_err(idx, e))
    })
    .transpose()
}

fn date_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let s: String = row.get(idx)?;
    NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|e| conv_err(idx, e))
}

fn opt_date_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let s: Option<String> = row.get(idx)?;
    s.map(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|e| conv_err(idx, e)))
        .transpose()
}

fn enum_col<T: FromStr<Err = CirclError>>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let s: String = row.get(idx)?;
    s.parse().map_err(|e| conv_err(idx, e))
}

fn opt_enum_col<T: FromStr<Err = CirclError>>(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<T>> {
    let s: Option<String> = row.get(idx)?;
    s.map(|s| s.parse().map_err(|e| conv_err(idx, e)))
        .transpose()
}

fn row_to_contact(row: &Row<'_>) -> rusqlite::Result<Contact> {
    let tags: String = row.get(25)?;
    Ok(Contact {
        id: uuid_col(row, 0)?,
        user_id: uuid_col(row, 1)?,
        fields: NewContact {
            name: row.get(2)?,
            circle: enum_col(row, 3)?,
            personal_email: row.get(4)?,
            work_email: row.get(5)?,
            mobile_phone: row.get(6)?,
            work_phone: row.get(7)?,
            birthday: opt_date_col(row, 8)?,
            location: row.get(9)?,
            company: row.get(10)?,
            job_title: row.get(11)?,
            industry: row.get(12)?,
            linkedin_url: row.get(13)?,
            twitter_handle: row.get(14)?,
            instagram_handle: row.get(15)?,
            website: row.get(16)?,
            university: row.get(17)?,
            major: row.get(18)?,
            graduation_year: row.get(19)?,
            how_met: row.get(20)?,
            hobbies: row.get(21)?,
            family_details: row.get(22)?,
            notes: row.get(23)?,
            favorite: row.get(24)?,
            tags: serde_json::from_str(&tags).map_err(|e| conv_err(25, e))?,
            last_contact: opt_ts_col(row, 26)?,
        },
        created_at: ts_col(row, 27)?,
        updated_at: ts_col(row, 28)?,
    })
}

fn row_to_interaction(row: &Row<'_>) -> rusqlite::Result<Interaction> {
    Ok(Interaction {
        id: uuid_col(row, 0)?,
        user_id: uuid_col(row, 1)?,
        contact_id: uuid_col(row, 2)?,
        kind: enum_col(row, 3)?,
        date: ts_col(row, 4)?,
        notes: row.get(5)?,
        created_at: ts_col(row, 6)?,
    })
}

fn row_to_keystone(row: &Row<'_>) -> rusqlite::Result<Keystone> {
    Ok(Keystone {
        id: uuid_col(row, 0)?,
        user_id: uuid_col(row, 1)?,
        contact_id: opt_uuid_col(row, 2)?,
        title: row.get(3)?,
        category: enum_col(row, 4)?,
        date: date_col(row, 5)?,
        recurrence: opt_enum_col(row, 6)?,
        notes: row.get(7)?,
        created_at: ts_col(row, 8)?,
    })
}

fn row_to_email_log(row: &Row<'_>) -> rusqlite::Result<EmailLog> {
    Ok(EmailLog {
        id: uuid_col(row, 0)?,
        user_id: uuid_col(row, 1)?,
        kind: enum_col(row, 2)?,
        recipient: row.get(3)?,
        status: enum_col(row, 4)?,
        error: row.get(5)?,
        created_at: ts_col(row, 6)?,
    })
}

/// Execute `sql` with the 29 contact columns bound as `?1..?29` in
/// `CONTACT_COLUMNS` order.
fn write_contact(conn: &Connection, sql: &str, c: &Contact) -> Result<usize> {
    let f = &c.fields;
    let tags = serde_json::to_string(&f.tags)?;
    conn.execute(
        sql,
        params![
            c.id.to_string(),
            c.user_id.to_string(),
            f.name,
            f.circle.as_str(),
            f.personal_email,
            f.work_email,
            f.mobile_phone,
            f.work_phone,
            f.birthday.map(fmt_date),
            f.location,
            f.company,
            f.job_title,
            f.industry,
            f.linkedin_url,
            f.twitter_handle,
            f.instagram_handle,
            f.website,
            f.university,
            f.major,
            f.graduation_year,
            f.how_met,
            f.hobbies,
            f.family_details,
            f.notes,
            f.favorite,
            tags,
            f.last_contact.map(fmt_ts),
            fmt_ts(c.created_at),
            fmt_ts(c.updated_at),
        ],
    )
    .map_err(sql_err("failed to write contact"))
}

fn insert_contact_sql() -> String {
    let placeholders: Vec<String> = (1..=29).map(|i| format!("?{i}")).collect();
    format!(
        "INSERT INTO contacts ({CONTACT_COLUMNS}) VALUES ({})",
        placeholders.join(", ")
    )
}

const UPDATE_CONTACT_SQL: &str = "UPDATE contacts SET
    name = ?3, circle = ?4, personal_email = ?5, work_email = ?6, mobile_phone = ?7,
    work_phone = ?8, birthday = ?9, location = ?10, company = ?11, job_title = ?12,
    industry = ?13, linkedin_url = ?14, twitter_handle = ?15, instagram_handle = ?16,
    website = ?17, university = ?18, major = ?19, graduation_year = ?20, how_met = ?21,
    hobbies = ?22, family_details = ?23, notes = ?24, favorite = ?25, tags = ?26,
    last_contact = ?27, created_at = ?28, updated_at = ?29
    WHERE id = ?1 AND user_id = ?2";

impl StorageBackend for SqliteStorage {
    async fn list_contacts(&self, user_id: Uuid) -> Result<Vec<Contact>> {
        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {CONTACT_COLUMNS} FROM contacts WHERE user_id = ?1 \
                     ORDER BY name COLLATE NOCASE"
                ))
                .map_err(sql_err("failed to prepare contact query"))?;
            let contacts = stmt
                .query_map([user_id.to_string()], row_to_contact)
                .map_err(sql_err("failed to query contacts"))?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(sql_err("failed to read contact row"))?;
            Ok(contacts)
        })
        .await
    }

    async fn get_contact(&self, id: Uuid) -> Result<Contact> {
        self.with_conn(move |conn| {
            conn.query_row(
                &format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = ?1"),
                [id.to_string()],
                row_to_contact,
            )
            .optional()
            .map_err(sql_err("failed to load contact"))?
            .ok_or_else(|| CirclError::NotFound(format!("contact {id}")))
        })
        .await
    }

    async fn insert_contact(&self, contact: &Contact) -> Result<()> {
        let contact = contact.clone();
        self.with_conn(move |conn| {
            write_contact(conn, &insert_contact_sql(), &contact)?;
            Ok(())
        })
        .await
    }

    async fn insert_contacts(&self, contacts: &[Contact]) -> Result<usize> {
        let contacts = contacts.to_vec();
        self.with_conn(move |conn| {
            let tx = conn
                .unchecked_transaction()
                .map_err(sql_err("failed to begin transaction"))?;
            let sql = insert_contact_sql();
            for contact in &contacts {
                // Any failure drops `tx`, rolling back the whole batch.
                write_contact(&tx, &sql, contact)?;
            }
            tx.commit().map_err(sql_err("failed to commit import"))?;
            Ok(contacts.len())
        })
        .await
    }

    async fn update_contact(&self, contact: &Contact) -> Result<()> {
        let contact = contact.clone();
        self.with_conn(move |conn| {
            let n = write_contact(conn, UPDATE_CONTACT_SQL, &contact)?;
            if n == 0 {
                return Err(CirclError::NotFound(format!("contact {}", contact.id)));
            }
            Ok(())
        })
        .await
    }

    async fn delete_contact(&self, id: Uuid) -> Result<()> {
        self.with_conn(move |conn| {
            let n = conn
                .execute("DELETE FROM contacts WHERE id = ?1", [id.to_string()])
                .map_err(sql_err("failed to delete contact"))?;
            if n == 0 {
                return Err(CirclError::NotFound(format!("contact {id}")));
            }
            Ok(())
        })
        .await
    }

    async fn list_interactions(
        &self,
        user_id: Uuid,
        contact_id: Option<Uuid>,
    ) -> Result<Vec<Interaction>> {
        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {INTERACTION_COLUMNS} FROM interactions \
                     WHERE user_id = ?1 AND (?2 IS NULL OR contact_id = ?2) \
                     ORDER BY date DESC"
                ))
                .map_err(sql_err("failed to prepare interaction query"))?;
            let interactions = stmt
                .query_map(
                    params![user_id.to_string(), contact_id.map(|c| c.to_string())],
                    row_to_interaction,
                )
                .map_err(sql_err("failed to query interactions"))?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(sql_err("failed to read interaction row"))?;
            Ok(interactions)
        })
        .await
    }

    async fn insert_interaction(&self, interaction: &Interaction) -> Result<()> {
        let i = interaction.clone();
        self.with_conn(move |conn| {
            let tx = conn
                .unchecked_transaction()
                .map_err(sql_err("failed to begin transaction"))?;
            let date = fmt_ts(i.date);
            tx.execute(
                &format!(
                    "INSERT INTO interactions ({INTERACTION_COLUMNS}) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
                ),
                params![
                    i.id.to_string(),
                    i.user_id.to_string(),
                    i.contact_id.to_string(),
                    i.kind.as_str(),
                    date,
                    i.notes,
                    fmt_ts(i.created_at),
                ],
            )
            .map_err(sql_err("failed to insert interaction"))?;
            tx.execute(
                "UPDATE contacts SET last_contact = ?1, updated_at = ?2 \
                 WHERE id = ?3 AND (last_contact IS NULL OR last_contact < ?1)",
                params![date, fmt_ts(Utc::now()), i.contact_id.to_string()],
            )
            .map_err(sql_err("failed to update last contact"))?;
            tx.commit().map_err(sql_err("failed to commit interaction"))?;
            Ok(())
        })
        .await
    }

    async fn list_keystones(&self, user_id: Uuid) -> Result<Vec<Keystone>> {
        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {KEYSTONE_COLUMNS} FROM keystones WHERE user_id = ?1 ORDER BY date"
                ))
                .map_err(sql_err("failed to prepare keystone query"))?;
            let keystones = stmt
                .query_map([user_id.to_string()], row_to_keystone)
                .map_err(sql_err("failed to query keystones"))?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(sql_err("failed to read keystone row"))?;
            Ok(keystones)
        })
        .await
    }

    async fn get_keystone(&self, id: Uuid) -> Result<Keystone> {
        self.with_conn(move |conn| {
            conn.query_row(
                &format!("SELECT {KEYSTONE_COLUMNS} FROM keystones WHERE id = ?1"),
                [id.to_string()],
                row_to_keystone,
            )
            .optional()
            .map_err(sql_err("failed to load keystone"))?
            .ok_or_else(|| CirclError::NotFound(format!("keystone {id}")))
        })
        .await
    }

    async fn insert_keystone(&self, keystone: &Keystone) -> Result<()> {
        let k = keystone.clone();
        self.with_conn(move |conn| {
            conn.execute(
                &format!(
                    "INSERT INTO keystones ({KEYSTONE_COLUMNS}) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
                ),
                params![
                    k.id.to_string(),
                    k.user_id.to_string(),
                    k.contact_id.map(|c| c.to_string()),
                    k.title,
                    k.category.to_string(),
                    fmt_date(k.date),
                    k.recurrence.map(|r| r.to_string()),
                    k.notes,
                    fmt_ts(k.created_at),
                ],
            )
            .map_err(sql_err("failed to insert keystone"))?;
            Ok(())
        })
        .await
    }

    async fn update_keystone(&self, keystone: &Keystone) -> Result<()> {
        let k = keystone.clone();
        self.with_conn(move |conn| {
            let n = conn
                .execute(
                    "UPDATE keystones SET contact_id = ?3, title = ?4, category = ?5, \
                     date = ?6, recurrence = ?7, notes = ?8 \
                     WHERE id = ?1 AND user_id = ?2",
                    params![
                        k.id.to_string(),
                        k.user_id.to_string(),
                        k.contact_id.map(|c| c.to_string()),
                        k.title,
                        k.category.to_string(),
                        fmt_date(k.date),
                        k.recurrence.map(|r| r.to_string()),
                        k.notes,
                    ],
                )
                .map_err(sql_err("failed to update keystone"))?;
            if n == 0 {
                return Err(CirclError::NotFound(format!("keystone {}", k.id)));
            }
            Ok(())
        })
        .await
    }

    async fn delete_keystone(&self, id: Uuid) -> Result<()> {
        self.with_conn(move |conn| {
            let n = conn
                .execute("DELETE FROM keystones WHERE id = ?1", [id.to_string()])
                .map_err(sql_err("failed to delete keystone"))?;
            if n == 0 {
                return Err(CirclError::NotFound(format!("keystone {id}")));
            }
            Ok(())
        })
        .await
    }

    async fn insert_email_log(&self, log: &EmailLog) -> Result<()> {
        let log = log.clone();
        self.with_conn(move |conn| {
            conn.execute(
                &format!(
                    "INSERT INTO email_logs ({EMAIL_LOG_COLUMNS}) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
                ),
                params![
                    log.id.to_string(),
                    log.user_id.to_string(),
                    log.kind.as_str(),
                    log.recipient,
                    log.status.as_str(),
                    log.error,
                    fmt_ts(log.created_at),
                ],
            )
            .map_err(sql_err("failed to insert email log"))?;
            Ok(())
        })
        .await
    }

    async fn list_email_logs(&self, user_id: Uuid, limit: usize) -> Result<Vec<EmailLog>> {
        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {EMAIL_LOG_COLUMNS} FROM email_logs WHERE user_id = ?1 \
                     ORDER BY created_at DESC LIMIT ?2"
                ))
                .map_err(sql_err("failed to prepare email log query"))?;
            let logs = stmt
                .query_map(params![user_id.to_string(), limit as i64], row_to_email_log)
                .map_err(sql_err("failed to query email logs"))?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(sql_err("failed to read email log row"))?;
            Ok(logs)
        })
        .await
    }

    async fn owner_of(&self, table: Table, id: Uuid) -> Result<Option<Uuid>> {
        self.with_conn(move |conn| {
            let owner: Option<String> = conn
                .query_row(
                    &format!("SELECT user_id FROM {} WHERE id = ?1", table.as_str()),
                    [id.to_string()],
                    |row| row.get(0),
                )
                .optional()
                .map_err(sql_err("failed to look up owner"))?;
            owner
                .map(|s| {
                    Uuid::parse_str(&s)
                        .map_err(|e| CirclError::Storage(format!("corrupt user_id '{s}': {e}")))
                })
                .transpose()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn contact(user: Uuid, name: &str) -> Contact {
        Contact::new(user, NewContact::new(name))
    }

    #[test]
    fn open_in_memory_creates_tables() {
        let storage = SqliteStorage::open_in_memory().expect("should open in-memory DB");
        assert_eq!(storage.path().to_str().unwrap(), ":memory:");

        let conn = storage.conn.lock().unwrap();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        for t in ["contacts", "interactions", "keystones", "email_logs"] {
            assert!(tables.contains(&t.to_string()), "missing table {t}");
        }
    }

    #[test]
    fn create_tables_is_idempotent() {
        let storage = SqliteStorage::open_in_memory().expect("should open in-memory DB");
        storage.create_tables().expect("idempotent create_tables");
    }

    #[tokio::test]
    async fn contact_roundtrip_preserves_fields() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let user = Uuid::now_v7();
        let mut c = contact(user, "Jane Doe");
        c.fields.circle = Circle::Inner;
        c.fields.birthday = NaiveDate::from_ymd_opt(1990, 4, 12);
        c.fields.graduation_year = Some(2012);
        c.fields.favorite = true;
        c.fields.tags.insert("climbing".into());
        storage.insert_contact(&c).await.unwrap();

        let loaded = storage.get_contact(c.id).await.unwrap();
        assert_eq!(loaded.name(), "Jane Doe");
        assert_eq!(loaded.circle(), Circle::Inner);
        assert_eq!(loaded.fields.birthday, c.fields.birthday);
        assert_eq!(loaded.fields.graduation_year, Some(2012));
        assert!(loaded.fields.favorite);
        assert!(loaded.fields.tags.contains("climbing"));
    }

    #[tokio::test]
    async fn get_missing_contact_is_not_found() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let err = storage.get_contact(Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, CirclError::NotFound(_)));
    }

    #[tokio::test]
    async fn list_contacts_is_user_scoped() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let alice = Uuid::now_v7();
        let bob = Uuid::now_v7();
        storage.insert_contact(&contact(alice, "Zed")).await.unwrap();
        storage.insert_contact(&contact(alice, "amy")).await.unwrap();
        storage.insert_contact(&contact(bob, "Bob's friend")).await.unwrap();

        let names: Vec<String> = storage
            .list_contacts(alice)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.fields.name)
            .collect();
        assert_eq!(names, vec!["amy", "Zed"]);
    }

    #[tokio::test]
    async fn bulk_insert_is_all_or_nothing() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let user = Uuid::now_v7();
        let first = contact(user, "One");
        let mut dup = contact(user, "Two");
        dup.id = first.id;

        let result = storage.insert_contacts(&[first, dup]).await;
        assert!(result.is_err());
        assert!(storage.list_contacts(user).await.unwrap().is_empty());

        let ok = storage
            .insert_contacts(&[contact(user, "A"), contact(user, "B")])
            .await
            .unwrap();
        assert_eq!(ok, 2);
    }

    #[tokio::test]
    async fn update_contact_requires_same_owner() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let mut c = contact(Uuid::now_v7(), "Sam");
        storage.insert_contact(&c).await.unwrap();

        c.fields.company = Some("Acme".into());
        storage.update_contact(&c).await.unwrap();
        assert_eq!(
            storage.get_contact(c.id).await.unwrap().fields.company.as_deref(),
            Some("Acme")
        );

        c.user_id = Uuid::now_v7();
        assert!(matches!(
            storage.update_contact(&c).await,
            Err(CirclError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn interaction_bumps_last_contact_only_forward() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let user = Uuid::now_v7();
        let c = contact(user, "Kim");
        storage.insert_contact(&c).await.unwrap();

        let recent = Utc::now() - Duration::days(2);
        let older = Utc::now() - Duration::days(20);
        storage
            .insert_interaction(&Interaction::new(user, c.id, InteractionKind::Call, recent))
            .await
            .unwrap();
        storage
            .insert_interaction(&Interaction::new(user, c.id, InteractionKind::Email, older))
            .await
            .unwrap();

        let loaded = storage.get_contact(c.id).await.unwrap();
        let last = loaded.fields.last_contact.unwrap();
        assert!((last - recent).num_seconds().abs() < 1);

        let all = storage.list_interactions(user, Some(c.id)).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].kind, InteractionKind::Call);
    }

    #[tokio::test]
    async fn delete_contact_cascades() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let user = Uuid::now_v7();
        let c = contact(user, "Lee");
        storage.insert_contact(&c).await.unwrap();
        storage
            .insert_interaction(&Interaction::new(user, c.id, InteractionKind::Note, Utc::now()))
            .await
            .unwrap();
        let k = Keystone::new(
            user,
            "Lee's birthday".into(),
            KeystoneCategory::Birthday,
            NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(),
        )
        .with_contact(c.id);
        storage.insert_keystone(&k).await.unwrap();

        storage.delete_contact(c.id).await.unwrap();

        assert!(storage.list_interactions(user, None).await.unwrap().is_empty());
        let kept = storage.get_keystone(k.id).await.unwrap();
        assert!(kept.contact_id.is_none());
    }

    #[tokio::test]
    async fn owner_of_reports_user_or_none() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let user = Uuid::now_v7();
        let c = contact(user, "Owner");
        storage.insert_contact(&c).await.unwrap();

        assert_eq!(
            storage.owner_of(Table::Contacts, c.id).await.unwrap(),
            Some(user)
        );
        assert_eq!(
            storage.owner_of(Table::Keystones, c.id).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn email_logs_newest_first() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let user = Uuid::now_v7();
        let mut first = EmailLog::new(user, EmailKind::Onboarding, "a@x.com", EmailStatus::Sent);
        first.created_at = Utc::now() - Duration::hours(1);
        let second = EmailLog::new(user, EmailKind::WeeklyDigest, "a@x.com", EmailStatus::Skipped);
        storage.insert_email_log(&first).await.unwrap();
        storage.insert_email_log(&second).await.unwrap();

        let logs = storage.list_email_logs(user, 10).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].kind, EmailKind::WeeklyDigest);
    }

    #[test]
    fn open_file_based_db() {
        let dir = std::env::temp_dir().join(format!("circl-test-{}", Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let db_path = dir.join("test.db");

        let storage = SqliteStorage::open(&db_path).expect("should open file DB");
        assert_eq!(storage.path(), db_path);

        drop(storage);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
