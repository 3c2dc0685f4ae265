//! Database access for platebook-server
//!
//! One SQLite table per collection (`reviews`, `lists`, `ratings_pool`) plus a
//! key/value `settings` table holding the site-settings document. List-valued
//! fields are stored as JSON text.

pub mod lists;
pub mod ratings_pool;
pub mod reviews;
pub mod settings;

use anyhow::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
///
/// Creates the database file if missing and ensures all tables exist.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    init_tables(&pool).await?;

    Ok(pool)
}

/// Single-connection in-memory database with all tables created
///
/// One connection only: every SQLite in-memory connection is its own
/// database, so a wider pool would see empty tables.
pub async fn connect_in_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create all Platebook tables if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ratings_pool (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            rating REAL NOT NULL DEFAULT 0,
            price TEXT NOT NULL DEFAULT '',
            cuisine TEXT NOT NULL DEFAULT '[]',
            location TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reviews (
            slug TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            headline TEXT NOT NULL DEFAULT '',
            rating REAL NOT NULL DEFAULT 0,
            price TEXT NOT NULL DEFAULT '',
            cuisine TEXT NOT NULL DEFAULT '[]',
            location TEXT NOT NULL DEFAULT '[]',
            date TEXT NOT NULL DEFAULT '',
            image TEXT NOT NULL DEFAULT '',
            gallery TEXT NOT NULL DEFAULT '[]',
            content TEXT NOT NULL DEFAULT '[]',
            order_highlights TEXT NOT NULL DEFAULT '[]'
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS lists (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            cover_image TEXT NOT NULL DEFAULT '',
            items TEXT NOT NULL DEFAULT '[]',
            review_ids TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (settings, ratings_pool, reviews, lists)");

    Ok(())
}

/// Encode a list-valued field for a JSON text column
pub(crate) fn to_json<T: serde::Serialize>(value: &T) -> platebook_common::Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Decode a JSON text column
pub(crate) fn from_json<T: serde::de::DeserializeOwned>(text: &str) -> platebook_common::Result<T> {
    Ok(serde_json::from_str(text)?)
}
