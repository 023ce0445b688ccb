use super::Direction;
use crate::provision::ProvisionError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a [`MigrationConnection`](super::MigrationConnection)
#[derive(Error, Debug)]
pub enum DbErr {
    #[error("connection error")]
    Conn(#[source] sqlx::Error),
    #[error("execution error")]
    Exec(#[source] sqlx::Error),
    #[error("query error")]
    Query(#[source] sqlx::Error),
    #[error("{0}")]
    Custom(String),
}

/// The script set location could not be enumerated
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("could not read script directory '{}'", path.display())]
    Unreachable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("'{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("script '{}' uses version 0, versions start at 1", .0.display())]
    ZeroVersion(PathBuf),
    #[error(
        "duplicate {direction} script for version {version}: '{}' and '{}'",
        first.display(),
        second.display()
    )]
    Duplicate {
        version: u64,
        direction: Direction,
        first: PathBuf,
        second: PathBuf,
    },
}

/// Failure of the version table itself
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("could not read version from '{table}'")]
    Read {
        table: String,
        #[source]
        source: DbErr,
    },
    #[error("could not write version {version} to '{table}'")]
    Write {
        table: String,
        version: u64,
        #[source]
        source: DbErr,
    },
}

/// A transition stopped partway
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("schema is dirty at version {0}, an earlier run did not complete")]
    Dirty(u64),
    #[error("no script with version {0}")]
    UnknownVersion(u64),
    #[error("could not read script '{}'", path.display())]
    ReadScript {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{direction} script of version {version} failed")]
    Script {
        version: u64,
        direction: Direction,
        #[source]
        source: DbErr,
    },
    #[error(transparent)]
    Marker(#[from] StoreError),
}

#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("could not connect to database")]
    Connect(#[source] ProvisionError),
    #[error("could not open migration")]
    ScriptSet(#[from] SourceError),
    #[error("could not get schema version")]
    VersionRead(#[source] StoreError),
    #[error("could not migrate")]
    Execution(#[source] ExecutionError),
    /// The marker could not be repaired and may still be dirty
    #[error("could not recover schema: {recovery}")]
    RecoveryFailed {
        #[source]
        cause: ExecutionError,
        recovery: StoreError,
    },
    #[error("could not force version")]
    Force(#[source] StoreError),
}

impl MigrateError {
    /// Whether the schema needs a manual `force` before it can be migrated again
    pub fn is_fatal(&self) -> bool {
        matches!(self, MigrateError::RecoveryFailed { .. })
    }
}
