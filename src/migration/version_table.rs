use super::{DbErr, MigrationConnection, MigrationQueryResult, SchemaManager, StoreError};
use sea_query::{Alias, ColumnDef, Iden, Query, Table};
use std::convert::TryFrom;

#[derive(Iden)]
pub enum Column {
    Version,
    Dirty,
}

/// The recorded progress of one tracked concern
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Marker {
    /// Last applied version, 0 when nothing is applied
    pub version: u64,
    /// Set while a script is running, cleared once it completes
    pub dirty: bool,
}

impl Marker {
    pub fn clean(version: u64) -> Self {
        Self {
            version,
            dirty: false,
        }
    }

    pub fn try_from_query_result<R>(res: R) -> Result<Self, DbErr>
    where
        R: MigrationQueryResult,
    {
        let version = res.try_get_i64("version")?;
        Ok(Self {
            version: u64::try_from(version)
                .map_err(|_| DbErr::Custom(format!("invalid stored version {}", version)))?,
            dirty: res.try_get_bool("dirty")?,
        })
    }
}

/// Single-row table holding the [`Marker`] of one tracked concern
pub struct VersionTable<'c, C>
where
    C: MigrationConnection,
{
    conn: &'c C,
    name: String,
}

impl<'c, C> VersionTable<'c, C>
where
    C: MigrationConnection,
{
    pub fn new<N>(conn: &'c C, name: N) -> Self
    where
        N: Into<String>,
    {
        Self {
            conn,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn table(&self) -> Alias {
        Alias::new(self.name.as_str())
    }

    /// Create the table if it does not exist yet
    pub async fn install(&self) -> Result<(), DbErr> {
        let stmt = Table::create()
            .if_not_exists()
            .table(self.table())
            .col(ColumnDef::new(Column::Version).big_integer().not_null())
            .col(ColumnDef::new(Column::Dirty).boolean().not_null())
            .to_owned();
        self.conn.exec_stmt(&stmt).await?;
        Ok(())
    }

    /// Read the marker, `None` when the table or its row does not exist
    pub async fn read(&self) -> Result<Option<Marker>, StoreError> {
        self.try_read().await.map_err(|source| StoreError::Read {
            table: self.name.clone(),
            source,
        })
    }

    async fn try_read(&self) -> Result<Option<Marker>, DbErr> {
        if !SchemaManager::new(self.conn).has_table(&self.name).await? {
            return Ok(None);
        }
        let stmt = Query::select()
            .columns([Column::Version, Column::Dirty])
            .from(self.table())
            .limit(1)
            .to_owned();
        self.conn
            .query_one(&stmt)
            .await?
            .map(Marker::try_from_query_result)
            .transpose()
    }

    /// Overwrite the marker, creating the table and row when missing
    pub async fn write(&self, version: u64, dirty: bool) -> Result<(), StoreError> {
        self.try_write(version, dirty)
            .await
            .map_err(|source| StoreError::Write {
                table: self.name.clone(),
                version,
                source,
            })
    }

    async fn try_write(&self, version: u64, dirty: bool) -> Result<(), DbErr> {
        let stored = i64::try_from(version)
            .map_err(|_| DbErr::Custom(format!("version {} out of range", version)))?;
        self.install().await?;

        let stmt = Query::update()
            .table(self.table())
            .values([
                (Column::Version, stored.into()),
                (Column::Dirty, dirty.into()),
            ])
            .to_owned();
        if self.conn.exec_stmt(&stmt).await?.rows_affected == 0 {
            let stmt = Query::insert()
                .into_table(self.table())
                .columns([Column::Version, Column::Dirty])
                .values_panic([stored.into(), dirty.into()])
                .to_owned();
            self.conn.exec_stmt(&stmt).await?;
        }
        Ok(())
    }
}
