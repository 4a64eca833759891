use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde_json::{Number, Value};

use omnidex_core::config::EngineConfig;
use omnidex_core::error::{Error, Result};
use omnidex_core::traits::{DatabaseRegistry, IndexDatabase};
use omnidex_core::types::Row;

/// One SQLite database behind the [`IndexDatabase`] boundary.
///
/// The connection is serialized behind a mutex; concurrent callers queue
/// on it, which satisfies the engine's isolation contract.
pub struct SqliteDatabase {
    conn: Mutex<Connection>,
}

impl SqliteDatabase {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| Error::Query(e.to_string()))?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// In-memory database, used by tests and throwaway fixtures.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Query(e.to_string()))?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Run a batch of statements, for fixture schemas.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql).map_err(map_sqlite_error)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Query("connection lock poisoned".to_string()))
    }
}

impl IndexDatabase for SqliteDatabase {
    fn execute(&self, sql: &str, params: &[(&str, &str)]) -> Result<Vec<Row>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql).map_err(map_sqlite_error)?;
        let names: Vec<String> = stmt
            .column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();

        let named: Vec<(String, &str)> = params
            .iter()
            .map(|(name, value)| (format!(":{}", name), *value))
            .collect();
        let bound: Vec<(&str, &dyn rusqlite::ToSql)> = named
            .iter()
            .map(|(name, value)| (name.as_str(), value as &dyn rusqlite::ToSql))
            .collect();

        let mut rows = stmt.query(bound.as_slice()).map_err(map_sqlite_error)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(map_sqlite_error)? {
            let mut map = Row::new();
            for (i, name) in names.iter().enumerate() {
                let value = row.get_ref(i).map_err(map_sqlite_error)?;
                map.insert(name.clone(), value_to_json(value));
            }
            out.push(map);
        }
        Ok(out)
    }
}

/// An unparseable FTS5 expression surfaces as an operational error whose
/// message names fts5; that signature is the one recoverable condition.
fn map_sqlite_error(e: rusqlite::Error) -> Error {
    let message = e.to_string();
    if message.contains("fts5") {
        Error::FtsSyntax(message)
    } else {
        Error::Query(message)
    }
}

fn value_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Number(i.into()),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(format!("<{} byte blob>", b.len())),
    }
}

/// Databases by source name. The name doubles as the namespace prefix of
/// record types, which is how display lookups find their database.
#[derive(Default)]
pub struct SqliteCatalog {
    databases: HashMap<String, SqliteDatabase>,
}

impl SqliteCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open every database named in the engine config.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let mut catalog = Self::new();
        for (name, path) in &config.databases {
            let database = if path.as_os_str() == ":memory:" {
                SqliteDatabase::in_memory()?
            } else {
                SqliteDatabase::open(path)?
            };
            catalog.attach(name.clone(), database);
        }
        Ok(catalog)
    }

    pub fn attach(&mut self, name: impl Into<String>, database: SqliteDatabase) {
        self.databases.insert(name.into(), database);
    }

    pub fn get(&self, name: &str) -> Option<&SqliteDatabase> {
        self.databases.get(name)
    }
}

impl DatabaseRegistry for SqliteCatalog {
    fn database(&self, name: &str) -> Result<&dyn IndexDatabase> {
        self.databases
            .get(name)
            .map(|db| db as &dyn IndexDatabase)
            .ok_or_else(|| Error::NotFound(format!("database: {}", name)))
    }
}
