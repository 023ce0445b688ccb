use super::{DbErr, MigrationConnection, MigrationDbBackend, MigrationQueryResult};
use sea_query::{Alias, Condition, Expr, IntoTableRef, Query, SelectStatement};

/// Schema inspection helpers shared by the version table and callers
pub struct SchemaManager<'c, C>
where
    C: MigrationConnection,
{
    conn: &'c C,
}

impl<'c, C> SchemaManager<'c, C>
where
    C: MigrationConnection,
{
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub fn get_database_backend(&self) -> MigrationDbBackend {
        self.conn.get_database_backend()
    }

    pub async fn has_table<T>(&self, table: T) -> Result<bool, DbErr>
    where
        T: AsRef<str>,
    {
        let mut stmt = Query::select();
        let mut subquery = query_tables(self.get_database_backend());
        subquery.cond_where(Expr::col(Alias::new("table_name")).eq(table.as_ref()));
        stmt.expr_as(Expr::cust("COUNT(*)"), Alias::new("rows"))
            .from_subquery(subquery, Alias::new("subquery"));

        let res = self
            .conn
            .query_one(&stmt)
            .await?
            .ok_or_else(|| DbErr::Custom("Fail to check table exists".to_owned()))?;
        let rows = res.try_get_i64("rows")?;

        Ok(rows > 0)
    }
}

pub(crate) fn query_tables(backend: MigrationDbBackend) -> SelectStatement {
    let mut stmt = Query::select();
    let (expr, tbl_ref, condition) = match backend {
        MigrationDbBackend::Postgres => (
            Expr::col(Alias::new("table_name")),
            (Alias::new("information_schema"), Alias::new("tables")).into_table_ref(),
            Condition::all()
                .add(
                    Expr::expr(Expr::cust("CURRENT_SCHEMA()"))
                        .equals(Alias::new("tables"), Alias::new("table_schema")),
                )
                .add(Expr::col(Alias::new("table_type")).eq("BASE TABLE")),
        ),
        MigrationDbBackend::Sqlite => (
            Expr::col(Alias::new("name")),
            Alias::new("sqlite_master").into_table_ref(),
            Condition::all()
                .add(Expr::col(Alias::new("type")).eq("table"))
                .add(Expr::col(Alias::new("name")).ne("sqlite_sequence")),
        ),
    };
    stmt.expr_as(expr, Alias::new("table_name"))
        .from(tbl_ref)
        .cond_where(condition);
    stmt
}
