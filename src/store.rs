use crate::config::{DatabaseConfig, NAMES_TABLE};
use crate::error::PipelineError;
use crate::models::{NameRecord, Sex, StoredName};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sqlx::mysql::{MySql, MySqlConnection};
use sqlx::{Connection, QueryBuilder, Row};
use tracing::{debug, info, warn};

const CREATE_NAMES_TABLE: &str = r#"CREATE TABLE IF NOT EXISTS `BabyNames` (
    `id` INT UNSIGNED NOT NULL AUTO_INCREMENT,
    `name` VARCHAR(128) NOT NULL,
    `sex` ENUM('male', 'female', 'other') NOT NULL,
    `createdAt` DATETIME NOT NULL,
    `updatedAt` DATETIME NOT NULL,
    PRIMARY KEY (`id`)
)"#;

const INSERT_IGNORE_PREFIX: &str =
    "INSERT IGNORE INTO `BabyNames` (`name`, `sex`, `createdAt`, `updatedAt`) ";

const SELECT_SAMPLE: &str = "SELECT `id`, `name`, `sex`, `createdAt`, `updatedAt` \
     FROM `BabyNames` ORDER BY `id` LIMIT ?";

const COUNT_NAMES: &str = "SELECT COUNT(*) FROM `BabyNames`";

/// Where name records are persisted. One implementation talks to MySQL; the
/// in-memory one backs `--dry-run` and tests.
#[async_trait]
pub trait NameStore: Send {
    /// Persists one batch in a single round trip, skipping rows the store rejects
    /// as duplicates. Returns the number of rows actually inserted.
    async fn insert_ignore(&mut self, batch: &[NameRecord]) -> Result<u64>;

    /// First `limit` stored rows, ordered by id.
    async fn sample(&mut self, limit: usize) -> Result<Vec<StoredName>>;

    async fn count(&mut self) -> Result<u64>;
}

/// A single MySQL connection held for the whole run
pub struct MySqlStore {
    conn: MySqlConnection,
}

impl MySqlStore {
    pub async fn connect(cfg: &DatabaseConfig) -> Result<Self, PipelineError> {
        let target = cfg.display_target();
        debug!(config = ?cfg, "Connecting to MySQL");
        let mut conn = MySqlConnection::connect_with(&cfg.connect_options())
            .await
            .map_err(|source| PipelineError::Connection {
                target: target.clone(),
                source,
            })?;
        conn.ping()
            .await
            .map_err(|source| PipelineError::Connection { target, source })?;
        Ok(Self { conn })
    }

    /// Creates the names table when missing.
    pub async fn ensure_schema(&mut self) -> Result<()> {
        sqlx::query(CREATE_NAMES_TABLE)
            .execute(&mut self.conn)
            .await
            .with_context(|| format!("Failed to create table {NAMES_TABLE}"))?;
        Ok(())
    }

    pub async fn close(self) {
        if let Err(e) = self.conn.close().await {
            warn!(error = %e, "Failed to close database connection cleanly");
        } else {
            info!("Database connection closed");
        }
    }
}

#[async_trait]
impl NameStore for MySqlStore {
    async fn insert_ignore(&mut self, batch: &[NameRecord]) -> Result<u64> {
        if batch.is_empty() {
            return Ok(0);
        }
        let now = Utc::now().naive_utc();
        let mut qb = QueryBuilder::<MySql>::new(INSERT_IGNORE_PREFIX);
        qb.push_values(batch, |mut b, record| {
            b.push_bind(record.name.as_str())
                .push_bind(Sex::from_label(&record.sex).as_str())
                .push_bind(now)
                .push_bind(now);
        });
        let result = qb
            .build()
            .execute(&mut self.conn)
            .await
            .with_context(|| format!("Failed to insert {} rows into {NAMES_TABLE}", batch.len()))?;
        Ok(result.rows_affected())
    }

    async fn sample(&mut self, limit: usize) -> Result<Vec<StoredName>> {
        let rows = sqlx::query(SELECT_SAMPLE)
            .bind(limit as u64)
            .fetch_all(&mut self.conn)
            .await
            .with_context(|| format!("Failed to read from {NAMES_TABLE}"))?;

        rows.iter()
            .map(|row| -> Result<StoredName> {
                let sex: String = row.try_get("sex")?;
                Ok(StoredName {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                    sex: Sex::from_label(&sex),
                    created_at: row.try_get("createdAt")?,
                    updated_at: row.try_get("updatedAt")?,
                })
            })
            .collect()
    }

    async fn count(&mut self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(COUNT_NAMES)
            .fetch_one(&mut self.conn)
            .await
            .with_context(|| format!("Failed to count rows in {NAMES_TABLE}"))?;
        Ok(count.max(0) as u64)
    }
}

/// Keeps rows in a `Vec`, assigning ids the way an auto-increment column would.
/// Enforces no uniqueness, like the MySQL table.
#[derive(Default)]
pub struct MemoryStore {
    rows: Vec<StoredName>,
    round_trips: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[StoredName] {
        &self.rows
    }

    /// Number of `insert_ignore` calls made so far
    pub fn round_trips(&self) -> usize {
        self.round_trips
    }

    fn now() -> NaiveDateTime {
        Utc::now().naive_utc()
    }
}

#[async_trait]
impl NameStore for MemoryStore {
    async fn insert_ignore(&mut self, batch: &[NameRecord]) -> Result<u64> {
        self.round_trips += 1;
        let now = Self::now();
        for record in batch {
            let id = self.rows.len() as u32 + 1;
            self.rows.push(StoredName {
                id,
                name: record.name.clone(),
                sex: Sex::from_label(&record.sex),
                created_at: now,
                updated_at: now,
            });
        }
        Ok(batch.len() as u64)
    }

    async fn sample(&mut self, limit: usize) -> Result<Vec<StoredName>> {
        Ok(self.rows.iter().take(limit).cloned().collect())
    }

    async fn count(&mut self) -> Result<u64> {
        Ok(self.rows.len() as u64)
    }
}
