use super::MigrationDbBackend;
use sea_query::{PostgresQueryBuilder, SqliteQueryBuilder};

pub trait MigrationStatementBuilder {
    fn build(&self, db_backend: &MigrationDbBackend) -> String;
}

macro_rules! build_any_stmt {
    ($stmt: expr, $db_backend: expr) => {
        match $db_backend {
            MigrationDbBackend::Postgres => $stmt.to_string(PostgresQueryBuilder),
            MigrationDbBackend::Sqlite => $stmt.to_string(SqliteQueryBuilder),
        }
    };
}

macro_rules! build_stmt {
    ($stmt: ty) => {
        impl MigrationStatementBuilder for $stmt {
            fn build(&self, db_backend: &MigrationDbBackend) -> String {
                build_any_stmt!(self, db_backend)
            }
        }
    };
}

build_stmt!(sea_query::InsertStatement);
build_stmt!(sea_query::SelectStatement);
build_stmt!(sea_query::UpdateStatement);
build_stmt!(sea_query::TableCreateStatement);

/// Raw SQL, such as the body of a script, runs as written on every backend
impl MigrationStatementBuilder for String {
    fn build(&self, _: &MigrationDbBackend) -> String {
        self.to_owned()
    }
}
