pub use super::connection::{DbConn, MigrationConnection, MigrationDbBackend};
pub use super::error::MigrateError;
pub use super::migrator::{MigrationStatus, Transition};
pub use super::tracker::{
    migrate_down, migrate_to, migrate_up, seed_down, seed_to, seed_up, Tracker,
};
pub use super::version_table::Marker;
pub use crate::provision::Options;
pub use async_std;
pub use async_trait;
