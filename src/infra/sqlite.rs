//! Blocking `QueryExecutor` over a single SQLite connection.
//!
//! sqlx is async; the executor owns a current-thread tokio runtime and
//! blocks on each call so the engine can stay synchronous. One connection
//! serves every call, which keeps `BEGIN`/`COMMIT` issued through
//! [`SqliteExecutor::transaction`] in effect for the statements in between.

use std::str::FromStr;
use std::sync::Mutex;

use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{ConnectOptions, Connection, Row as _, TypeInfo, ValueRef};
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, warn};

use crate::application::executor::{QueryExecutor, Row, StorageError};
use crate::application::statement::{SqlValue, Statement};
use crate::util::lock::mutex_lock;

use super::error::InfraError;

const SOURCE: &str = "infra::sqlite";
const IN_MEMORY_URL: &str = "sqlite::memory:";

pub struct SqliteExecutor {
    runtime: Runtime,
    conn: Mutex<SqliteConnection>,
    last_insert_id: Mutex<Option<i64>>,
}

impl SqliteExecutor {
    /// Open `url`, creating the database file when missing.
    pub fn connect(url: &str) -> Result<Self, InfraError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(InfraError::runtime)?;

        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let conn = runtime.block_on(options.connect())?;
        debug!(url, "Opened SQLite connection");

        Ok(Self {
            runtime,
            conn: Mutex::new(conn),
            last_insert_id: Mutex::new(None),
        })
    }

    /// A private in-memory database.
    pub fn in_memory() -> Result<Self, InfraError> {
        Self::connect(IN_MEMORY_URL)
    }

    /// Run a `;`-separated script without parameters, e.g. schema setup.
    pub fn execute_script(&self, script: &str) -> Result<(), StorageError> {
        let mut conn = mutex_lock(&self.conn, SOURCE, "execute_script");
        self.runtime
            .block_on(sqlx::raw_sql(script).execute(&mut *conn))
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    /// Run `f` between `BEGIN` and `COMMIT`, rolling back when it fails.
    pub fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<StorageError>,
    {
        self.execute_script("BEGIN")?;

        match f(self) {
            Ok(value) => {
                self.execute_script("COMMIT")?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = self.execute_script("ROLLBACK") {
                    warn!(error = %rollback, "Rollback failed");
                }
                Err(err)
            }
        }
    }

    fn fetch_all(&self, statement: &Statement) -> Result<Vec<SqliteRow>, StorageError> {
        let mut conn = mutex_lock(&self.conn, SOURCE, "fetch_all");
        self.runtime
            .block_on(bind_all(statement).fetch_all(&mut *conn))
            .map_err(map_sqlx_error)
    }
}

impl QueryExecutor for SqliteExecutor {
    fn scalar(&self, statement: &Statement) -> Result<Option<SqlValue>, StorageError> {
        match self.fetch_all(statement)?.first() {
            Some(row) if !row.is_empty() => decode_value(row, 0).map(Some),
            _ => Ok(None),
        }
    }

    fn column(&self, statement: &Statement) -> Result<Vec<SqlValue>, StorageError> {
        self.fetch_all(statement)?
            .iter()
            .filter(|row| !row.is_empty())
            .map(|row| decode_value(row, 0))
            .collect()
    }

    fn rows(&self, statement: &Statement) -> Result<Vec<Row>, StorageError> {
        self.fetch_all(statement)?.iter().map(decode_row).collect()
    }

    fn execute(&self, statement: &Statement) -> Result<u64, StorageError> {
        let result = {
            let mut conn = mutex_lock(&self.conn, SOURCE, "execute");
            self.runtime
                .block_on(bind_all(statement).execute(&mut *conn))
                .map_err(map_sqlx_error)?
        };

        if result.rows_affected() > 0 {
            *mutex_lock(&self.last_insert_id, SOURCE, "execute") = Some(result.last_insert_rowid());
        }
        Ok(result.rows_affected())
    }

    fn last_insert_id(&self) -> Result<i64, StorageError> {
        let id = *mutex_lock(&self.last_insert_id, SOURCE, "last_insert_id");
        id.ok_or(StorageError::MissingInsertId)
    }
}

fn bind_all(
    statement: &Statement,
) -> sqlx::query::Query<'_, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'_>> {
    let mut query = sqlx::query(&statement.sql);
    for param in &statement.params {
        query = match param {
            SqlValue::Null => query.bind(None::<i64>),
            SqlValue::Integer(value) => query.bind(*value),
            SqlValue::Real(value) => query.bind(*value),
            SqlValue::Text(value) => query.bind(value.as_str()),
        };
    }
    query
}

fn decode_row(row: &SqliteRow) -> Result<Row, StorageError> {
    let columns = row
        .columns()
        .iter()
        .enumerate()
        .map(|(index, column)| {
            decode_value(row, index).map(|value| (sqlx::Column::name(column).to_string(), value))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Row::new(columns))
}

fn decode_value(row: &SqliteRow, index: usize) -> Result<SqlValue, StorageError> {
    let type_name = {
        let raw = row.try_get_raw(index).map_err(map_sqlx_error)?;
        if raw.is_null() {
            return Ok(SqlValue::Null);
        }
        raw.type_info().name().to_ascii_uppercase()
    };

    match type_name.as_str() {
        "INTEGER" | "BOOLEAN" => row
            .try_get::<i64, _>(index)
            .map(SqlValue::Integer)
            .map_err(map_sqlx_error),
        "REAL" | "NUMERIC" => row
            .try_get::<f64, _>(index)
            .map(SqlValue::Real)
            .map_err(map_sqlx_error),
        "TEXT" | "DATE" | "TIME" | "DATETIME" => row
            .try_get::<String, _>(index)
            .map(SqlValue::Text)
            .map_err(map_sqlx_error),
        other => Err(StorageError::decode(format!(
            "unsupported SQLite type `{other}` in column {index}"
        ))),
    }
}

/// Classify a sqlx failure into the storage taxonomy.
pub fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    match err {
        sqlx::Error::Database(db)
            if db.is_unique_violation()
                || db.is_foreign_key_violation()
                || db.is_check_violation()
                || db.message().contains("constraint failed") =>
        {
            StorageError::constraint(db.message())
        }
        sqlx::Error::Database(db) => StorageError::query(db.message()),
        err @ (sqlx::Error::Io(_)
        | sqlx::Error::Configuration(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed) => StorageError::connection(err),
        err @ (sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::Decode(_)
        | sqlx::Error::TypeNotFound { .. }) => StorageError::decode(err),
        other => StorageError::query(other),
    }
}
