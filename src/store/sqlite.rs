//! SQLite-backed observation store.

use crate::amazon::models::Observation;
use crate::error::StoreError;
use crate::store::ObservationStore;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS observations (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        asin         TEXT NOT NULL,
        title        TEXT NOT NULL,
        price        TEXT NOT NULL,
        rating       TEXT NOT NULL,
        review_count TEXT NOT NULL,
        captured_at  TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_observations_asin ON observations(asin, captured_at);
";

/// Observation store persisted in a single SQLite database file.
///
/// The connection is opened once and shared. Each append or query holds the
/// connection lock only for its own statement, on the blocking thread pool.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (or creates) the database at `path` and ensures the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        debug!("Opening observation store: {}", path.display());

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::init(conn)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    /// Runs `op` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| StoreError::Poisoned)?;
            op(&guard)
        })
        .await?
    }
}

/// Fixed-width RFC 3339 so that text order matches chronological order.
fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}

#[async_trait]
impl ObservationStore for SqliteStore {
    async fn append(&self, observation: &Observation) -> Result<(), StoreError> {
        let observation = observation.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO observations (asin, title, price, rating, review_count, captured_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    observation.asin,
                    observation.title,
                    observation.price,
                    observation.rating,
                    observation.review_count,
                    encode_timestamp(&observation.captured_at),
                ],
            )?;
            debug!("Appended observation for {}", observation.asin);
            Ok(())
        })
        .await
    }

    async fn query(&self, asin: &str) -> Result<Vec<Observation>, StoreError> {
        let asin = asin.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT asin, title, price, rating, review_count, captured_at
                 FROM observations
                 WHERE asin = ?1
                 ORDER BY captured_at ASC, id ASC",
            )?;

            let rows = stmt.query_map(params![asin], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?;

            let mut history = Vec::new();
            for row in rows {
                let (asin, title, price, rating, review_count, captured_at) = row?;
                history.push(Observation {
                    asin,
                    title,
                    price,
                    rating,
                    review_count,
                    captured_at: decode_timestamp(&captured_at)?,
                });
            }

            debug!("Loaded {} observations for {}", history.len(), asin);
            Ok(history)
        })
        .await
    }
}
