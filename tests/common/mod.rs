#![allow(dead_code)]

use sea_migrate::migration::{DbConn, Marker, SchemaManager, VersionTable};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestDb {
    pub conn: DbConn,
    _dir: TempDir,
}

/// Fresh file-backed SQLite database, removed when dropped
pub async fn setup() -> TestDb {
    let dir = tempfile::tempdir().unwrap();
    let options = SqliteConnectOptions::new()
        .filename(dir.path().join("test.db"))
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    TestDb {
        conn: DbConn::Sqlite(pool),
        _dir: dir,
    }
}

pub fn testdata(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("testdata")
        .join(name)
}

pub async fn marker(conn: &DbConn, table: &str) -> Option<Marker> {
    VersionTable::new(conn, table).read().await.unwrap()
}

pub async fn assert_version(conn: &DbConn, table: &str, expected: u64) {
    let marker = marker(conn, table).await.unwrap_or_default();
    assert_eq!(marker, Marker::clean(expected), "version of '{}'", table);
}

pub async fn assert_table_exist(conn: &DbConn, table: &str) {
    let exists = SchemaManager::new(conn).has_table(table).await.unwrap();
    assert!(exists, "Table {} should exist", table);
}

pub async fn assert_table_not_exist(conn: &DbConn, table: &str) {
    let exists = SchemaManager::new(conn).has_table(table).await.unwrap();
    assert!(!exists, "Table {} should not exist", table);
}

pub async fn assert_rows_count(conn: &DbConn, table: &str, expected: i64) {
    let pool = match conn {
        DbConn::Sqlite(pool) => pool,
        DbConn::Postgres(_) => unreachable!(),
    };
    let count: i64 = sqlx::query_scalar(&format!("SELECT count(*) FROM \"{}\"", table))
        .fetch_one(pool)
        .await
        .unwrap();
    assert_eq!(count, expected, "rows in {}", table);
}
