use std::str::FromStr;

use anyhow::Result;
use serde::de::DeserializeOwned;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::{BusinessInfo, Client, DocumentKind, Invoice, Quote};
use crate::store::Store;

/// Keys of the local storage table, one per collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKey {
    BusinessInfo,
    Clients,
    Quotes,
    Invoices,
}

impl StorageKey {
    pub const ALL: [StorageKey; 4] = [
        StorageKey::BusinessInfo,
        StorageKey::Clients,
        StorageKey::Quotes,
        StorageKey::Invoices,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StorageKey::BusinessInfo => "businessInfo",
            StorageKey::Clients => "clients",
            StorageKey::Quotes => "quotes",
            StorageKey::Invoices => "invoices",
        }
    }
}

impl From<DocumentKind> for StorageKey {
    fn from(kind: DocumentKind) -> Self {
        match kind {
            DocumentKind::Quote => StorageKey::Quotes,
            DocumentKind::Invoice => StorageKey::Invoices,
        }
    }
}

/// Key/value storage backed by SQLite. Each collection of the store is kept
/// as one JSON document under its [`StorageKey`].
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new Database instance with a connection pool
    pub async fn new(config: &Config) -> Result<Self> {
        let options =
            SqliteConnectOptions::from_str(config.database_url())?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// A private database that lives as long as this value. A single
    /// connection that is never recycled, since every in-memory connection
    /// is its own database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Get a reference to the connection pool
    pub fn get_pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS local_storage (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(self.get_pool())
        .await?;

        Ok(())
    }

    pub async fn get_item(&self, key: StorageKey) -> Result<Option<String>> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM local_storage WHERE key = ?")
            .bind(key.as_str())
            .fetch_optional(self.get_pool())
            .await?;

        Ok(value)
    }

    pub async fn set_item(&self, key: StorageKey, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO local_storage (key, value)
            VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key.as_str())
        .bind(value)
        .execute(self.get_pool())
        .await?;

        Ok(())
    }

    pub async fn remove_item(&self, key: StorageKey) -> Result<()> {
        sqlx::query("DELETE FROM local_storage WHERE key = ?")
            .bind(key.as_str())
            .execute(self.get_pool())
            .await?;

        Ok(())
    }

    /// Reads all four keys into a snapshot. A missing key is an empty
    /// collection; an unreadable one is logged and treated the same way.
    pub async fn load_store(&self) -> Result<Store> {
        let business_info: Option<BusinessInfo> = self.load_key(StorageKey::BusinessInfo).await?;
        let clients: Option<Vec<Client>> = self.load_key(StorageKey::Clients).await?;
        let quotes: Option<Vec<Quote>> = self.load_key(StorageKey::Quotes).await?;
        let invoices: Option<Vec<Invoice>> = self.load_key(StorageKey::Invoices).await?;

        Ok(Store::from_parts(
            business_info,
            clients.unwrap_or_default(),
            quotes.unwrap_or_default(),
            invoices.unwrap_or_default(),
        ))
    }

    async fn load_key<T: DeserializeOwned>(&self, key: StorageKey) -> Result<Option<T>> {
        let Some(raw) = self.get_item(key).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<Option<T>>(&raw) {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(key = key.as_str(), error = %e, "Ignoring unreadable local storage value");
                Ok(None)
            }
        }
    }

    /// Writes the given keys of the snapshot in one transaction.
    pub async fn save_keys(&self, store: &Store, keys: &[StorageKey]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for key in keys {
            match serialize_key(store, *key)? {
                Some(value) => {
                    sqlx::query(
                        r#"
                        INSERT INTO local_storage (key, value)
                        VALUES (?, ?)
                        ON CONFLICT(key) DO UPDATE SET value = excluded.value
                        "#,
                    )
                    .bind(key.as_str())
                    .bind(value)
                    .execute(&mut *tx)
                    .await?;
                }
                None => {
                    sqlx::query("DELETE FROM local_storage WHERE key = ?")
                        .bind(key.as_str())
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }

        tx.commit().await?;
        debug!(?keys, "Local storage updated");

        Ok(())
    }

    pub async fn save_store(&self, store: &Store) -> Result<()> {
        self.save_keys(store, &StorageKey::ALL).await
    }
}

/// JSON for one key, or `None` when the key should be absent.
fn serialize_key(store: &Store, key: StorageKey) -> serde_json::Result<Option<String>> {
    match key {
        StorageKey::BusinessInfo => store.business_info().map(serde_json::to_string).transpose(),
        StorageKey::Clients => serde_json::to_string(store.clients()).map(Some),
        StorageKey::Quotes => serde_json::to_string(store.quotes()).map(Some),
        StorageKey::Invoices => serde_json::to_string(store.invoices()).map(Some),
    }
}

/// Initialize the database connection pool
pub async fn init(config: &Config) -> Result<Database> {
    let db = Database::new(config).await?;

    Ok(db)
}
