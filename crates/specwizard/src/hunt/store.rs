//! Persistent storage for hunt steps.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::migrations::{self, Migration, Schema};

/// SQL statement to create the steps table.
pub const CREATE_STEPS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS steps (
    qr_code TEXT PRIMARY KEY,
    image BLOB
)
";

/// Layout of the step store.
pub const HUNT_SCHEMA: Schema = Schema {
    name: "hunt",
    statements: &[CREATE_STEPS_TABLE],
    migrations: &[
        Migration { version: 1, sql: "" },
        Migration {
            version: 2,
            sql: "ALTER TABLE steps ADD COLUMN added_at TEXT;",
        },
    ],
};

/// One stop of the hunt: a QR code and the picture of where it is hidden.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HuntStep {
    /// Code printed on the QR label.
    pub qr_code: String,
    /// Image bytes as uploaded.
    #[serde(skip)]
    pub image: Vec<u8>,
    /// When the step was added; unknown for steps created before this was tracked.
    pub added_at: Option<DateTime<Utc>>,
}

/// Step store backed by `SQLite`.
#[derive(Debug)]
pub struct HuntStore {
    path: PathBuf,
    conn: Connection,
}

impl HuntStore {
    /// Open or create a step store at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening hunt store at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;
        migrations::initialize_schema(&conn, &HUNT_SCHEMA)?;

        info!("Hunt store opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        migrations::initialize_schema(&conn, &HUNT_SCHEMA)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Add a step, replacing the image of an existing code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn add_step(&self, qr_code: &str, image: &[u8]) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO steps (qr_code, image, added_at) VALUES (?1, ?2, ?3)",
            params![qr_code, image, Utc::now().to_rfc3339()],
        )?;
        debug!(qr_code, bytes = image.len(), "Added hunt step");
        Ok(())
    }

    /// Remove a step. Returns `true` if it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn remove_step(&self, qr_code: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM steps WHERE qr_code = ?1", [qr_code])?;
        Ok(removed > 0)
    }

    /// All steps in hunt order: numeric codes ascending, ties by text.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn steps(&self) -> Result<Vec<HuntStep>> {
        let mut stmt = self.conn.prepare(
            "SELECT qr_code, image, added_at FROM steps ORDER BY CAST(qr_code AS INTEGER), qr_code",
        )?;
        let steps = stmt
            .query_map([], |row| {
                let added_at: Option<String> = row.get(2)?;
                Ok(HuntStep {
                    qr_code: row.get(0)?,
                    image: row.get::<_, Option<Vec<u8>>>(1)?.unwrap_or_default(),
                    added_at: added_at
                        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                        .map(|dt| dt.with_timezone(&Utc)),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(steps)
    }

    /// Step codes in hunt order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn sequence(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT qr_code FROM steps ORDER BY CAST(qr_code AS INTEGER), qr_code")?;
        let codes = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(codes)
    }

    /// Image for a step, if the code exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn image_for(&self, qr_code: &str) -> Result<Option<Vec<u8>>> {
        let image = self
            .conn
            .query_row(
                "SELECT image FROM steps WHERE qr_code = ?1",
                [qr_code],
                |row| row.get::<_, Option<Vec<u8>>>(0),
            )
            .optional()?;
        Ok(image.map(Option::unwrap_or_default))
    }

    /// Number of steps.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM steps", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}
