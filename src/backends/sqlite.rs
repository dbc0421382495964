//! SQLite Backend
//!
//! Local snapshot of the GPL and audit exports. The database is opened
//! read-only and each statement is additionally checked with
//! `Statement::readonly` before it runs.

use std::path::Path;

use async_trait::async_trait;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::ValueRef;
use rusqlite::OpenFlags;
use serde_json::{Number, Value};

use ran_assistant_core::{BackendKind, CoreError, CoreResult, QueryBackend, Row, Rows};

use crate::utils::error::AppResult;

pub type SqlitePool = Pool<SqliteConnectionManager>;

/// SQLite executor over a shared r2d2 pool.
#[derive(Clone)]
pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    /// Open a snapshot file read-only.
    ///
    /// The pool is built without connecting, so a missing file surfaces as an
    /// execution error rather than a startup failure.
    pub fn open(path: &Path, max_connections: u32) -> AppResult<Self> {
        let manager = SqliteConnectionManager::file(path).with_flags(
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_NO_MUTEX
                | OpenFlags::SQLITE_OPEN_URI,
        );
        let pool = Pool::builder()
            .max_size(max_connections)
            .build_unchecked(manager);
        tracing::debug!(path = %path.display(), "sqlite snapshot pool created");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl std::fmt::Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend")
            .field("max_size", &self.pool.max_size())
            .finish()
    }
}

#[async_trait]
impl QueryBackend for SqliteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    async fn execute(&self, query: &str) -> CoreResult<Rows> {
        let pool = self.pool.clone();
        let query = query.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = pool
                .get()
                .map_err(|e| CoreError::unavailable(format!("sqlite pool: {}", e)))?;
            run_query(&conn, &query).map_err(|e| CoreError::backend(format!("sqlite: {}", e)))
        })
        .await
        .map_err(|e| CoreError::internal(format!("sqlite worker failed: {}", e)))?
    }
}

fn run_query(conn: &rusqlite::Connection, query: &str) -> rusqlite::Result<Rows> {
    let mut stmt = conn.prepare(query)?;
    if !stmt.readonly() {
        return Err(rusqlite::Error::InvalidQuery);
    }

    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut result = stmt.query([])?;
    let mut rows = Rows::new();
    while let Some(row) = result.next()? {
        let mut out = Row::new();
        for (i, name) in columns.iter().enumerate() {
            out.insert(name.clone(), value_to_json(row.get_ref(i)?));
        }
        rows.push(out);
    }
    Ok(rows)
}

fn value_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(n) => Value::Number(n.into()),
        ValueRef::Real(x) => Number::from_f64(x).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(b) => Value::String(format!("<blob {} bytes>", b.len())),
    }
}
