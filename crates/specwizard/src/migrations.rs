//! Schema versioning for the databases specwizard writes.
//!
//! Both the catalog builder and the hunt step store describe their layout as a
//! [`Schema`]: base `CREATE ... IF NOT EXISTS` statements plus an ordered list
//! of [`Migration`]s. The applied version lives in a `metadata` table.

use rusqlite::Connection;

use crate::error::{Error, Result};

/// Key used to store the schema version in the metadata table.
const VERSION_KEY: &str = "schema_version";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// A single schema upgrade step.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    /// Version the database is at after this migration has run.
    pub version: i32,
    /// SQL executed to reach `version`. Empty for the base version.
    pub sql: &'static str,
}

/// A versioned database layout.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    /// Human-readable name used in errors and logs.
    pub name: &'static str,
    /// Base statements creating the version-1 layout.
    pub statements: &'static [&'static str],
    /// Ordered upgrades, starting at version 1.
    pub migrations: &'static [Migration],
}

impl Schema {
    /// The version a fully migrated database reports.
    #[must_use]
    pub fn current_version(&self) -> i32 {
        self.migrations.last().map_or(0, |m| m.version)
    }
}

/// Initialize a database schema.
///
/// Creates the metadata table and base layout if they don't exist, then runs
/// any pending migrations.
///
/// # Errors
///
/// Returns an error if schema creation fails, a migration fails, or the
/// database was written by a newer version of the schema.
pub fn initialize_schema(conn: &Connection, schema: &Schema) -> Result<()> {
    conn.execute(CREATE_METADATA_TABLE, [])?;
    for statement in schema.statements {
        conn.execute(statement, [])?;
    }

    let version = get_schema_version(conn)?;
    let current = schema.current_version();
    if version > current {
        return Err(Error::DatabaseMigration {
            message: format!(
                "{} schema version {version} is newer than supported version {current}",
                schema.name
            ),
        });
    }
    if version < current {
        run_migrations(conn, schema, version)?;
    }

    Ok(())
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (fresh database).
pub fn get_schema_version(conn: &Connection) -> Result<i32> {
    let result: std::result::Result<String, rusqlite::Error> = conn.query_row(
        "SELECT value FROM metadata WHERE key = ?1",
        [VERSION_KEY],
        |row| row.get(0),
    );

    match result {
        Ok(value) => value.parse().map_err(|_| Error::DatabaseMigration {
            message: format!("invalid schema version: {value}"),
        }),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => Err(e.into()),
    }
}

/// Set the schema version in the database.
fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        (VERSION_KEY, version.to_string()),
    )?;
    Ok(())
}

/// Run every migration newer than `from_version`.
fn run_migrations(conn: &Connection, schema: &Schema, from_version: i32) -> Result<()> {
    for migration in schema.migrations.iter().filter(|m| m.version > from_version) {
        if !migration.sql.is_empty() {
            conn.execute_batch(migration.sql)
                .map_err(|e| Error::DatabaseMigration {
                    message: format!(
                        "{} migration to version {} failed: {e}",
                        schema.name, migration.version
                    ),
                })?;
        }
        set_schema_version(conn, migration.version)?;
        tracing::debug!(schema = schema.name, version = migration.version, "Applied migration");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDGETS: Schema = Schema {
        name: "widgets",
        statements: &["CREATE TABLE IF NOT EXISTS widgets (id INTEGER PRIMARY KEY)"],
        migrations: &[
            Migration { version: 1, sql: "" },
            Migration {
                version: 2,
                sql: "ALTER TABLE widgets ADD COLUMN label TEXT",
            },
        ],
    };

    fn create_test_db() -> Connection {
        Connection::open_in_memory().expect("failed to create in-memory database")
    }

    #[test]
    fn test_initialize_schema_creates_tables() {
        let conn = create_test_db();
        initialize_schema(&conn, &WIDGETS).expect("failed to initialize schema");

        let count: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('widgets', 'metadata')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_initialize_schema_runs_migrations() {
        let conn = create_test_db();
        initialize_schema(&conn, &WIDGETS).unwrap();

        assert_eq!(get_schema_version(&conn).unwrap(), 2);
        conn.execute("INSERT INTO widgets (label) VALUES ('dial')", [])
            .expect("label column should exist after migration");
    }

    #[test]
    fn test_initialize_schema_idempotent() {
        let conn = create_test_db();
        initialize_schema(&conn, &WIDGETS).expect("first init failed");
        initialize_schema(&conn, &WIDGETS).expect("second init failed");

        assert_eq!(get_schema_version(&conn).unwrap(), WIDGETS.current_version());
    }

    #[test]
    fn test_get_schema_version_fresh_db() {
        let conn = create_test_db();
        conn.execute(CREATE_METADATA_TABLE, []).unwrap();

        assert_eq!(get_schema_version(&conn).unwrap(), 0);
    }

    #[test]
    fn test_newer_version_rejected() {
        let conn = create_test_db();
        initialize_schema(&conn, &WIDGETS).unwrap();
        set_schema_version(&conn, 42).unwrap();

        let err = initialize_schema(&conn, &WIDGETS).unwrap_err();
        assert!(err.to_string().contains("newer than supported"));
    }

    #[test]
    fn test_invalid_version_value() {
        let conn = create_test_db();
        conn.execute(CREATE_METADATA_TABLE, []).unwrap();
        conn.execute(
            "INSERT INTO metadata (key, value) VALUES ('schema_version', 'abc')",
            [],
        )
        .unwrap();

        let err = get_schema_version(&conn).unwrap_err();
        assert!(err.to_string().contains("invalid schema version"));
    }

    #[test]
    fn test_current_version_empty_schema() {
        let schema = Schema {
            name: "empty",
            statements: &[],
            migrations: &[],
        };
        assert_eq!(schema.current_version(), 0);
    }
}
