//! Routing database handle and schema.

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use tracing::{debug, info};

use crate::Result;
use crate::config::MailDbConfig;

/// Schema for the domain, address and alias tables.
const SCHEMA: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS domain (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        class INTEGER NOT NULL DEFAULT 0,
        transport TEXT,
        access TEXT,
        vuid INTEGER,
        vgid INTEGER,
        rclass TEXT NOT NULL DEFAULT 'DEFAULT'
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS address (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        local_part TEXT NOT NULL,
        domain_id INTEGER REFERENCES domain(id)
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS alias (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        address INTEGER NOT NULL REFERENCES address(id),
        target INTEGER REFERENCES address(id),
        extension TEXT
    )
    ",
    r"
    CREATE INDEX IF NOT EXISTS idx_address_domain ON address(domain_id, local_part)
    ",
    r"
    CREATE INDEX IF NOT EXISTS idx_alias_address ON alias(address)
    ",
];

/// Handle to the routing database.
///
/// Reads run directly on the pool. Every mutation opens exactly one
/// transaction and threads it through the storage helpers; an uncommitted
/// transaction rolls back when dropped.
#[derive(Debug, Clone)]
pub struct MailDb {
    pub(crate) pool: SqlitePool,
}

impl MailDb {
    /// Open the database described by `config`.
    ///
    /// Creates the tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the connection
    /// fails or schema creation fails.
    pub async fn open(config: &MailDbConfig) -> Result<Self> {
        config.validate()?;
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url())
            .await?;

        let db = Self { pool };
        db.initialize().await?;
        info!(path = %config.database_path.display(), "opened routing database");
        Ok(db)
    }

    /// Open the database at the given path with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails or schema creation fails.
    pub async fn new(database_path: &str) -> Result<Self> {
        Self::open(&MailDbConfig::new(database_path)).await
    }

    /// Create an in-memory database for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let db = Self { pool };
        db.initialize().await?;
        Ok(db)
    }

    /// Initialize database schema.
    async fn initialize(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(*statement).execute(&self.pool).await?;
        }
        debug!("routing schema ready");
        Ok(())
    }

    /// Begin a transaction.
    pub(crate) async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    /// Close the pool, waiting for connections to be returned.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Number of address rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count_addresses(&self) -> Result<i64> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM address")
            .fetch_one(&self.pool)
            .await?)
    }

    /// Number of domain rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count_domains(&self) -> Result<i64> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM domain")
            .fetch_one(&self.pool)
            .await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_database() {
        let db = MailDb::in_memory().await.unwrap();
        assert_eq!(db.count_addresses().await.unwrap(), 0);
        assert_eq!(db.count_domains().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let db = MailDb::in_memory().await.unwrap();
        db.initialize().await.unwrap();
        assert_eq!(db.count_domains().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let db = MailDb::in_memory().await.unwrap();
        {
            let mut tx = db.begin().await.unwrap();
            sqlx::query("INSERT INTO domain (name) VALUES ('gone.example')")
                .execute(&mut *tx)
                .await
                .unwrap();
        }
        assert_eq!(db.count_domains().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_open_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = MailDbConfig::builder()
            .database_path(dir.path().join("test.db"))
            .max_connections(2)
            .build();

        let db = MailDb::open(&config).await.unwrap();
        db.create_domain("foo").await.unwrap();
        db.close().await;

        let db = MailDb::open(&config).await.unwrap();
        assert_eq!(db.lookup_domain("foo").await.unwrap().name, "foo");
    }
}
