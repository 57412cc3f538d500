//! SQLite run history adapter.
//!
//! Runs are appended to a single `runs` table. Parameters and the summary
//! are stored as JSON alongside a few scalar columns for listing.

use crate::domain::error::CapsimError;
use crate::domain::history::{NewRunRecord, RunRecord};
use crate::ports::config_port::ConfigPort;
use crate::ports::history_port::RunHistoryPort;
use chrono::NaiveDateTime;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, CapsimError> {
        let db_path =
            config
                .get_string("history", "path")
                .ok_or_else(|| CapsimError::ConfigMissing {
                    section: "history".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("history", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool =
            Pool::builder()
                .max_size(pool_size)
                .build(manager)
                .map_err(|e: r2d2::Error| CapsimError::Database {
                    reason: e.to_string(),
                })?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, CapsimError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| CapsimError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    pub fn initialize_schema(&self) -> Result<(), CapsimError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| CapsimError::Database {
                reason: e.to_string(),
            })?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS runs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created_at TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                indicators TEXT NOT NULL,
                final_balance REAL NOT NULL,
                total_return_pct REAL NOT NULL,
                parameters_json TEXT NOT NULL,
                summary_json TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_runs_created_at ON runs(created_at);",
        )
        .map_err(|e: rusqlite::Error| CapsimError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        Ok(())
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, CapsimError> {
    serde_json::to_string(value).map_err(|e| CapsimError::DatabaseQuery {
        reason: format!("failed to encode run: {e}"),
    })
}

fn conversion_error(len: usize, e: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(len, rusqlite::types::Type::Text, Box::new(e))
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<RunRecord> {
    let created_str: String = row.get(1)?;
    let created_at = NaiveDateTime::parse_from_str(&created_str, TIMESTAMP_FORMAT)
        .map_err(|e| conversion_error(created_str.len(), e))?;

    let indicators_str: String = row.get(2)?;
    let indicators = indicators_str
        .split(',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    let parameters_json: String = row.get(3)?;
    let parameters = serde_json::from_str(&parameters_json)
        .map_err(|e| conversion_error(parameters_json.len(), e))?;

    let summary_json: String = row.get(4)?;
    let summary = serde_json::from_str(&summary_json)
        .map_err(|e| conversion_error(summary_json.len(), e))?;

    Ok(RunRecord {
        id: row.get(0)?,
        created_at,
        parameters,
        indicators,
        summary,
    })
}

const SELECT_RUNS: &str =
    "SELECT id, created_at, indicators, parameters_json, summary_json FROM runs";

impl RunHistoryPort for SqliteAdapter {
    fn append(&self, record: &NewRunRecord) -> Result<i64, CapsimError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| CapsimError::Database {
                reason: e.to_string(),
            })?;

        let created_at = chrono::Local::now()
            .naive_local()
            .format(TIMESTAMP_FORMAT)
            .to_string();

        conn.execute(
            "INSERT INTO runs (created_at, start_date, end_date, indicators, final_balance,
                               total_return_pct, parameters_json, summary_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                created_at,
                record.parameters.start_date.format("%Y-%m-%d").to_string(),
                record.parameters.end_date.format("%Y-%m-%d").to_string(),
                record.indicators.join(","),
                record.summary.final_balance,
                record.summary.total_return_pct,
                to_json(&record.parameters)?,
                to_json(&record.summary)?,
            ],
        )
        .map_err(|e: rusqlite::Error| CapsimError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        let id = conn.last_insert_rowid();
        tracing::info!(run_id = id, "run appended to history");
        Ok(id)
    }

    fn list(&self, limit: Option<usize>) -> Result<Vec<RunRecord>, CapsimError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| CapsimError::Database {
                reason: e.to_string(),
            })?;

        // SQLite treats a negative LIMIT as unbounded.
        let limit = limit.map(|n| n as i64).unwrap_or(-1);
        let query = format!("{SELECT_RUNS} ORDER BY id DESC LIMIT ?1");

        let mut stmt =
            conn.prepare(&query)
                .map_err(|e: rusqlite::Error| CapsimError::DatabaseQuery {
                    reason: e.to_string(),
                })?;

        let rows = stmt
            .query_map(params![limit], row_to_record)
            .map_err(|e: rusqlite::Error| CapsimError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(
                row.map_err(|e: rusqlite::Error| CapsimError::DatabaseQuery {
                    reason: e.to_string(),
                })?,
            );
        }

        Ok(records)
    }

    fn get(&self, id: i64) -> Result<Option<RunRecord>, CapsimError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| CapsimError::Database {
                reason: e.to_string(),
            })?;

        let query = format!("{SELECT_RUNS} WHERE id = ?1");
        conn.query_row(&query, params![id], row_to_record)
            .optional()
            .map_err(|e: rusqlite::Error| CapsimError::DatabaseQuery {
                reason: e.to_string(),
            })
    }
}
