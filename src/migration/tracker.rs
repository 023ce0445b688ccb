use super::{
    migration_status, transition, Marker, MigrateError, Migration, MigrationConnection,
    ScriptSet, Transition, VersionTable,
};
use crate::provision::{self, Options};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Version table of structural migrations
pub const MIGRATIONS_TABLE: &str = "schema_migrations";
/// Version table of data seeds
pub const SEEDS_TABLE: &str = "schema_seeds";

/// A tracked concern: one script directory and the table recording its version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tracker {
    table: String,
    location: PathBuf,
}

impl Tracker {
    pub fn new<T, P>(table: T, location: P) -> Self
    where
        T: Into<String>,
        P: Into<PathBuf>,
    {
        Self {
            table: table.into(),
            location: location.into(),
        }
    }

    pub fn migrations<P>(location: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self::new(MIGRATIONS_TABLE, location)
    }

    pub fn seeds<P>(location: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self::new(SEEDS_TABLE, location)
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub async fn run<C>(&self, conn: &C, request: Transition) -> Result<u64, MigrateError>
    where
        C: MigrationConnection,
    {
        transition(&self.location, conn, &self.table, request).await
    }

    pub async fn up<C>(&self, conn: &C) -> Result<u64, MigrateError>
    where
        C: MigrationConnection,
    {
        self.run(conn, Transition::Up).await
    }

    pub async fn down<C>(&self, conn: &C) -> Result<u64, MigrateError>
    where
        C: MigrationConnection,
    {
        self.run(conn, Transition::Down).await
    }

    pub async fn to<C>(&self, conn: &C, version: u64) -> Result<u64, MigrateError>
    where
        C: MigrationConnection,
    {
        self.run(conn, Transition::ToVersion(version)).await
    }

    /// Current marker, `None` when nothing was ever recorded
    pub async fn version<C>(&self, conn: &C) -> Result<Option<Marker>, MigrateError>
    where
        C: MigrationConnection,
    {
        VersionTable::new(conn, self.table.as_str())
            .read()
            .await
            .map_err(MigrateError::VersionRead)
    }

    /// Check the status of all scripts against the marker
    pub async fn status<C>(&self, conn: &C) -> Result<Vec<Migration>, MigrateError>
    where
        C: MigrationConnection,
    {
        let scripts = ScriptSet::open(&self.location)?;
        let version = self.version(conn).await?.map_or(0, |marker| marker.version);
        Ok(migration_status(&scripts, version))
    }

    /// Overwrite the marker with a clean `version`, without running any script
    pub async fn force<C>(&self, conn: &C, version: u64) -> Result<(), MigrateError>
    where
        C: MigrationConnection,
    {
        warn!("Forcing '{}' to version {}", self.table, version);
        VersionTable::new(conn, self.table.as_str())
            .write(version, false)
            .await
            .map_err(MigrateError::Force)
    }
}

async fn run_with_options(
    opts: &Options,
    tracker: Tracker,
    request: Transition,
) -> Result<u64, MigrateError> {
    let conn = provision::connect(opts)
        .await
        .map_err(MigrateError::Connect)?;
    let result = tracker.run(&conn, request).await;
    conn.close().await;
    if let Ok(version) = &result {
        info!("'{}' is at version {}", tracker.table(), version);
    }
    result
}

/// Apply all pending migrations of `path` to the database of `opts`
pub async fn migrate_up<P>(opts: &Options, path: P) -> Result<u64, MigrateError>
where
    P: Into<PathBuf>,
{
    run_with_options(opts, Tracker::migrations(path), Transition::Up).await
}

/// Roll back all applied migrations of `path`
pub async fn migrate_down<P>(opts: &Options, path: P) -> Result<u64, MigrateError>
where
    P: Into<PathBuf>,
{
    run_with_options(opts, Tracker::migrations(path), Transition::Down).await
}

/// Migrate up or down to `version`
pub async fn migrate_to<P>(opts: &Options, path: P, version: u64) -> Result<u64, MigrateError>
where
    P: Into<PathBuf>,
{
    let request = Transition::ToVersion(version);
    run_with_options(opts, Tracker::migrations(path), request).await
}

pub async fn seed_up<P>(opts: &Options, path: P) -> Result<u64, MigrateError>
where
    P: Into<PathBuf>,
{
    run_with_options(opts, Tracker::seeds(path), Transition::Up).await
}

pub async fn seed_down<P>(opts: &Options, path: P) -> Result<u64, MigrateError>
where
    P: Into<PathBuf>,
{
    run_with_options(opts, Tracker::seeds(path), Transition::Down).await
}

pub async fn seed_to<P>(opts: &Options, path: P, version: u64) -> Result<u64, MigrateError>
where
    P: Into<PathBuf>,
{
    let request = Transition::ToVersion(version);
    run_with_options(opts, Tracker::seeds(path), request).await
}
