use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read config '{}'", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config '{}'", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// PostgreSQL connection parameters and pool sizing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Options {
    pub db_name: String,
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    /// `disable`, `allow`, `prefer`, `require`, `verify-ca` or `verify-full`
    pub ssl_mode: String,
    /// Seconds, 0 waits for the pool default
    pub connect_timeout: u64,
    pub ssl_cert: String,
    pub ssl_key: String,
    pub ssl_root_cert: String,

    /// Seconds a connection may be reused, 0 for no limit
    pub conn_max_lifetime: u64,
    /// Maximum number of open connections in the pool, 0 for the sqlx default
    pub max_open_conns: u32,
    /// Connections the pool keeps open while idle
    pub min_idle_conns: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            db_name: String::new(),
            user: String::new(),
            password: String::new(),
            host: "localhost".to_owned(),
            port: 5432,
            ssl_mode: String::new(),
            connect_timeout: 0,
            ssl_cert: String::new(),
            ssl_key: String::new(),
            ssl_root_cert: String::new(),
            conn_max_lifetime: 0,
            max_open_conns: 1,
            min_idle_conns: 0,
        }
    }
}

impl Options {
    pub fn from_yaml_file<P>(path: P) -> Result<Self, ConfigError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }
}
