//! Versioned migrations with dirty-state recovery
//!
//! A [`Tracker`] pairs a directory of scripts with the table that records how
//! far they were applied. Structural migrations and data seeds are two trackers
//! over the same engine, see [`Tracker::migrations`] and [`Tracker::seeds`].

pub mod connection;
pub mod driver;
pub mod error;
pub mod manager;
pub mod migrator;
pub mod prelude;
pub mod source;
pub mod statement;
pub mod tracker;
pub mod version_table;

pub use async_trait;
pub use connection::*;
pub use driver::*;
pub use error::*;
pub use manager::*;
pub use migrator::*;
pub use source::*;
pub use statement::*;
pub use tracker::*;
pub use version_table::{Marker, VersionTable};
