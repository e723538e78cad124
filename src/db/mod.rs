use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;
use std::path::PathBuf;
use uuid::Uuid;

mod contacts;
mod dashboard;
mod follow_ups;
mod interactions;
mod schema;
mod search;
mod settings;
mod tags;

pub use dashboard::DEFAULT_ATTENTION_DAYS;
pub use schema::SCHEMA_VERSION;

/// Environment variable that overrides the database location
pub const ENV_DB_PATH: &str = "PCRM_DB";

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database, creating if needed, running migrations
    pub fn open() -> Result<Self> {
        let path = Self::default_path()?;
        Self::open_at(path)
    }

    pub fn open_at(path: PathBuf) -> Result<Self> {
        // Create parent directories
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path)?;
        configure(&conn)?;
        tracing::debug!(path = %path.display(), "opened database");

        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open in-memory database for testing
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        configure(&conn)?;

        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// `$PCRM_DB` if set, otherwise `<config dir>/pcrm/pcrm.db`
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(ENV_DB_PATH).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(path));
        }
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not find config directory"))?;
        Ok(config_dir.join("pcrm").join("pcrm.db"))
    }

    /// Resolve a full or abbreviated UUID against one of the record tables.
    pub fn resolve_id(&self, table: RecordTable, prefix: &str) -> Result<Option<Uuid>> {
        if let Ok(id) = Uuid::parse_str(prefix) {
            return Ok(Some(id));
        }
        let prefix = prefix.trim().to_lowercase();
        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_hexdigit() || c == '-') {
            return Ok(None);
        }

        let sql = format!(
            "SELECT id FROM {} WHERE id LIKE ?1 || '%' LIMIT 2",
            table.as_str()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let ids = stmt
            .query_map([&prefix], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        match ids.as_slice() {
            [] => Ok(None),
            [one] => Ok(Some(Uuid::parse_str(one)?)),
            _ => Err(anyhow!("Ambiguous id prefix '{}'", prefix)),
        }
    }

    fn migrate(&self) -> Result<()> {
        let version = self.get_schema_version()?;

        if version == 0 {
            // Run migration in a transaction for atomicity
            self.conn
                .execute_batch(&format!("BEGIN TRANSACTION; {} COMMIT;", schema::SCHEMA_V1))?;
            self.set_schema_version(SCHEMA_VERSION)?;
            tracing::info!(version = SCHEMA_VERSION, "database schema created");
        }

        Ok(())
    }

    fn get_schema_version(&self) -> Result<i32> {
        let result: Result<i32, _> =
            self.conn
                .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                    row.get(0)
                });

        match result {
            Ok(v) => Ok(v),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
            Err(rusqlite::Error::SqliteFailure(err, msg)) => {
                if msg.as_ref().map_or(false, |m| m.contains("no such table")) {
                    Ok(0)
                } else {
                    Err(rusqlite::Error::SqliteFailure(err, msg).into())
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    fn set_schema_version(&self, version: i32) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO schema_version (id, version) VALUES (1, ?)",
            [version],
        )?;
        Ok(())
    }
}

/// Tables whose rows are addressed by id from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordTable {
    Contacts,
    Interactions,
    FollowUps,
}

impl RecordTable {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contacts => "contacts",
            Self::Interactions => "interactions",
            Self::FollowUps => "follow_ups",
        }
    }
}

/// Per-connection setup: foreign keys and the `casefold(text)` SQL function
fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.create_scalar_function(
        "casefold",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value: Option<String> = ctx.get(0)?;
            Ok(value.map(|s| s.to_lowercase()))
        },
    )?;
    Ok(())
}

// ==================== ROW HELPERS ====================

/// Stored timestamp format: RFC 3339, UTC, whole seconds
pub(crate) fn timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(crate) fn date_string(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Escape LIKE metacharacters (% _ \) for use with `ESCAPE '\'`
pub(crate) fn escape_like(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' | '_' | '\\' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }
    result
}

fn conversion_error<E>(e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
}

/// Helper to convert UUID parse errors to rusqlite errors
pub(crate) fn parse_uuid(s: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(s).map_err(conversion_error)
}

pub(crate) fn parse_timestamp(s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(conversion_error)
}

pub(crate) fn parse_date(s: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(conversion_error)
}
