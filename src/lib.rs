#![cfg_attr(docsrs, feature(doc_cfg))]

//! # SeaMigrate
//!
//! Apply ordered up/down SQL scripts to PostgreSQL or SQLite, track the
//! applied version per concern, and leave a clean version behind when a
//! script fails halfway.
//!
//! ```no_run
//! use sea_migrate::prelude::*;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let options = Options::from_yaml_file("config/config.yaml")?;
//! migrate_up(&options, "db/migrations").await?;
//! seed_up(&options, "db/seeds").await?;
//! # Ok(())
//! # }
//! ```

pub mod migration;
pub mod provision;

#[cfg(feature = "cli")]
#[cfg_attr(docsrs, doc(cfg(feature = "cli")))]
pub mod cli;

pub use migration::prelude;
