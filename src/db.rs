use crate::error::{PosError, Result};
use crate::storage::PosStorage;
use crate::types::{CampusType, Pos, PosType};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

const SCHEMA: &str = r#"
    PRAGMA journal_mode=WAL;
    CREATE TABLE IF NOT EXISTS pos (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        name          TEXT NOT NULL UNIQUE,
        description   TEXT NOT NULL,
        pos_type      TEXT NOT NULL,
        campus        TEXT NOT NULL,
        street        TEXT NOT NULL,
        house_number  TEXT NOT NULL,
        postal_code   INTEGER NOT NULL,
        city          TEXT NOT NULL,
        created_at    TEXT NOT NULL,
        updated_at    TEXT NOT NULL
    );
"#;

const SELECT_COLUMNS: &str = "SELECT id, name, description, pos_type, campus, street, house_number, \
     postal_code, city, created_at, updated_at FROM pos";

/// SQLite-backed POS storage. The `UNIQUE` constraint on `name` is what
/// surfaces as `PosError::DuplicateName`.
pub struct SqlitePosStorage {
    conn: Mutex<Connection>,
}

impl SqlitePosStorage {
    /// Open (or create) the database file and apply the schema
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        info!("Opening POS database at {}", path.display());
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| PosError::Database {
            message: format!("Connection lock poisoned: {e}"),
        })
    }

    fn find(conn: &Connection, id: i64) -> Result<Option<Pos>> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?1");
        let pos = conn.query_row(&sql, params![id], row_to_pos).optional()?;
        Ok(pos)
    }
}

fn parse_timestamp(value: String) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn row_to_pos(row: &Row<'_>) -> rusqlite::Result<Pos> {
    let pos_type: String = row.get(3)?;
    let campus: String = row.get(4)?;
    Ok(Pos {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        description: row.get(2)?,
        pos_type: PosType::parse(&pos_type).unwrap_or(PosType::Unknown),
        campus: CampusType::parse(&campus).unwrap_or(CampusType::Unknown),
        street: row.get(5)?,
        house_number: row.get(6)?,
        postal_code: row.get(7)?,
        city: row.get(8)?,
        created_at: parse_timestamp(row.get(9)?),
        updated_at: parse_timestamp(row.get(10)?),
    })
}

/// Map a write failure, turning the name constraint into a domain error
fn write_error(e: rusqlite::Error, name: &str) -> PosError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == ErrorCode::ConstraintViolation
                && err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            PosError::DuplicateName {
                name: name.to_string(),
            }
        }
        _ => e.into(),
    }
}

#[async_trait]
impl PosStorage for SqlitePosStorage {
    async fn get_all(&self) -> Result<Vec<Pos>> {
        let conn = self.conn()?;
        let sql = format!("{SELECT_COLUMNS} ORDER BY id");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_pos)?;
        let mut all = Vec::new();
        for pos in rows {
            all.push(pos?);
        }
        Ok(all)
    }

    async fn get_by_id(&self, id: i64) -> Result<Pos> {
        let conn = self.conn()?;
        Self::find(&conn, id)?.ok_or(PosError::PosNotFound { id })
    }

    async fn upsert(&self, pos: Pos) -> Result<Pos> {
        let conn = self.conn()?;
        let now = Utc::now().to_rfc3339();

        let id = match pos.id {
            None => {
                conn.execute(
                    "INSERT INTO pos (name, description, pos_type, campus, street, house_number, \
                     postal_code, city, created_at, updated_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
                    params![
                        pos.name,
                        pos.description,
                        pos.pos_type.as_str(),
                        pos.campus.as_str(),
                        pos.street,
                        pos.house_number,
                        pos.postal_code,
                        pos.city,
                        now
                    ],
                )
                .map_err(|e| write_error(e, &pos.name))?;
                conn.last_insert_rowid()
            }
            Some(id) => {
                conn.execute(
                    "INSERT INTO pos (id, name, description, pos_type, campus, street, house_number, \
                     postal_code, city, created_at, updated_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10) \
                     ON CONFLICT(id) DO UPDATE SET \
                        name = excluded.name, \
                        description = excluded.description, \
                        pos_type = excluded.pos_type, \
                        campus = excluded.campus, \
                        street = excluded.street, \
                        house_number = excluded.house_number, \
                        postal_code = excluded.postal_code, \
                        city = excluded.city, \
                        updated_at = excluded.updated_at",
                    params![
                        id,
                        pos.name,
                        pos.description,
                        pos.pos_type.as_str(),
                        pos.campus.as_str(),
                        pos.street,
                        pos.house_number,
                        pos.postal_code,
                        pos.city,
                        now
                    ],
                )
                .map_err(|e| write_error(e, &pos.name))?;
                id
            }
        };

        debug!("Stored POS: {} with id {}", pos.name, id);
        Self::find(&conn, id)?.ok_or(PosError::PosNotFound { id })
    }

    async fn clear(&self) -> Result<()> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM pos", [])?;
        info!("Deleted {} POS rows", deleted);
        Ok(())
    }
}
