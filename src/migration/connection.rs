use super::{DbErr, MigrationStatementBuilder};
use sqlx::{
    postgres::{PgPool, PgPoolOptions, PgRow},
    sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow},
    Executor, Row,
};

/// The type of database backend for real world databases.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MigrationDbBackend {
    /// A PostgreSQL backend
    Postgres,
    /// A SQLite backend
    Sqlite,
}

/// Outcome of a statement run through [`MigrationConnection::exec_stmt`]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
}

#[async_trait::async_trait]
pub trait MigrationConnection: Sync {
    type QueryResult: MigrationQueryResult + Send;

    async fn query_one<S>(&self, stmt: &S) -> Result<Option<Self::QueryResult>, DbErr>
    where
        S: MigrationStatementBuilder + Sync;

    /// Execute a statement, or a whole script of `;`-separated statements
    async fn exec_stmt<S>(&self, stmt: &S) -> Result<ExecResult, DbErr>
    where
        S: MigrationStatementBuilder + Sync;

    fn get_database_backend(&self) -> MigrationDbBackend;
}

pub trait MigrationQueryResult: Sized {
    fn try_get_i64(&self, col: &str) -> Result<i64, DbErr>;

    fn try_get_bool(&self, col: &str) -> Result<bool, DbErr>;
}

/// A pooled connection to one of the supported backends
#[derive(Debug, Clone)]
pub enum DbConn {
    Postgres(PgPool),
    Sqlite(SqlitePool),
}

pub enum QueryResult {
    Postgres(PgRow),
    Sqlite(SqliteRow),
}

impl DbConn {
    /// Open a pool with default settings, picking the backend from the url scheme
    pub async fn connect(url: &str) -> Result<Self, DbErr> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            let pool = PgPoolOptions::new().connect(url).await.map_err(DbErr::Conn)?;
            Ok(DbConn::Postgres(pool))
        } else if url.starts_with("sqlite:") {
            let pool = SqlitePoolOptions::new()
                .connect(url)
                .await
                .map_err(DbErr::Conn)?;
            Ok(DbConn::Sqlite(pool))
        } else {
            Err(DbErr::Custom(format!(
                "unsupported database url '{}', expected postgres:// or sqlite:",
                url
            )))
        }
    }

    pub async fn close(&self) {
        match self {
            DbConn::Postgres(pool) => pool.close().await,
            DbConn::Sqlite(pool) => pool.close().await,
        }
    }
}

#[async_trait::async_trait]
impl MigrationConnection for DbConn {
    type QueryResult = QueryResult;

    async fn query_one<S>(&self, stmt: &S) -> Result<Option<QueryResult>, DbErr>
    where
        S: MigrationStatementBuilder + Sync,
    {
        let sql = stmt.build(&self.get_database_backend());
        tracing::debug!("{}", sql);
        let row = match self {
            DbConn::Postgres(pool) => pool
                .fetch_optional(sql.as_str())
                .await
                .map_err(DbErr::Query)?
                .map(QueryResult::Postgres),
            DbConn::Sqlite(pool) => pool
                .fetch_optional(sql.as_str())
                .await
                .map_err(DbErr::Query)?
                .map(QueryResult::Sqlite),
        };
        Ok(row)
    }

    async fn exec_stmt<S>(&self, stmt: &S) -> Result<ExecResult, DbErr>
    where
        S: MigrationStatementBuilder + Sync,
    {
        let sql = stmt.build(&self.get_database_backend());
        tracing::debug!("{}", sql);
        let rows_affected = match self {
            DbConn::Postgres(pool) => pool
                .execute(sql.as_str())
                .await
                .map_err(DbErr::Exec)?
                .rows_affected(),
            DbConn::Sqlite(pool) => pool
                .execute(sql.as_str())
                .await
                .map_err(DbErr::Exec)?
                .rows_affected(),
        };
        Ok(ExecResult { rows_affected })
    }

    fn get_database_backend(&self) -> MigrationDbBackend {
        match self {
            DbConn::Postgres(_) => MigrationDbBackend::Postgres,
            DbConn::Sqlite(_) => MigrationDbBackend::Sqlite,
        }
    }
}

impl MigrationQueryResult for QueryResult {
    fn try_get_i64(&self, col: &str) -> Result<i64, DbErr> {
        let value = match self {
            QueryResult::Postgres(row) => row.try_get(col),
            QueryResult::Sqlite(row) => row.try_get(col),
        };
        value.map_err(DbErr::Query)
    }

    fn try_get_bool(&self, col: &str) -> Result<bool, DbErr> {
        let value = match self {
            QueryResult::Postgres(row) => row.try_get(col),
            QueryResult::Sqlite(row) => row.try_get(col),
        };
        value.map_err(DbErr::Query)
    }
}
