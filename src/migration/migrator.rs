use super::{
    ExecutionError, Marker, MigrateError, MigrationConnection, Script, ScriptExecutor, ScriptSet,
    SqlDriver, VersionStore,
};
use std::cmp::Ordering;
use std::fmt::Display;
use std::path::Path;
use tracing::{error, info, warn};

/// Requested move of the marker
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Apply all pending scripts
    Up,
    /// Revert all applied scripts
    Down,
    /// Apply or revert scripts until the marker equals the version
    ToVersion(u64),
}

impl Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transition::Up => write!(f, "up"),
            Transition::Down => write!(f, "down"),
            Transition::ToVersion(version) => write!(f, "to version {}", version),
        }
    }
}

#[derive(Debug, PartialEq)]
/// Status of migration
pub enum MigrationStatus {
    /// Not yet applied
    Pending,
    /// Applied
    Applied,
}

impl Display for MigrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            MigrationStatus::Pending => "Pending",
            MigrationStatus::Applied => "Applied",
        };
        write!(f, "{}", status)
    }
}

#[derive(Debug)]
pub struct Migration {
    pub script: Script,
    pub status: MigrationStatus,
}

/// Pair every script of `scripts` with its status relative to `version`
pub fn migration_status(scripts: &ScriptSet, version: u64) -> Vec<Migration> {
    scripts
        .scripts()
        .iter()
        .map(|script| Migration {
            script: script.clone(),
            status: if script.version <= version {
                MigrationStatus::Applied
            } else {
                MigrationStatus::Pending
            },
        })
        .collect()
}

/// Run `request` with the scripts at `location`, recording progress in `table`.
///
/// Returns the version reached. An unreadable `location` fails before the
/// database is touched.
pub async fn transition<C, P>(
    location: P,
    conn: &C,
    table: &str,
    request: Transition,
) -> Result<u64, MigrateError>
where
    C: MigrationConnection,
    P: AsRef<Path>,
{
    let location = location.as_ref();
    info!("Opening scripts at '{}'", location.display());
    let scripts = ScriptSet::open(location)?;
    let driver = SqlDriver::new(conn, scripts, table);
    run(&driver, request).await
}

/// Drive one transition, repairing the marker when it fails.
///
/// Either the transition completes with a clean marker, or the marker is
/// forced clean before the error is returned. [`MigrateError::RecoveryFailed`]
/// is the only outcome that may leave it dirty.
pub async fn run<D>(driver: &D, request: Transition) -> Result<u64, MigrateError>
where
    D: VersionStore + ScriptExecutor,
{
    let prior = driver
        .current_version()
        .await
        .map_err(MigrateError::VersionRead)?;
    let prior_version = prior.map_or(0, |marker| marker.version);
    info!("Migrating {} from version {}", request, prior_version);

    let applied = match prior {
        Some(Marker {
            version,
            dirty: true,
        }) => Err(ExecutionError::Dirty(version)),
        _ => match request {
            Transition::Up => driver.apply_forward(prior_version).await,
            Transition::Down => driver.apply_backward(prior_version).await,
            Transition::ToVersion(target) => {
                driver.apply_to_target(prior_version, target).await
            }
        },
    };

    match applied {
        Ok(version) => {
            info!("Schema is at version {}", version);
            Ok(version)
        }
        Err(cause) => {
            error!("Migration failed: {}", cause);
            Err(recover(driver, prior_version, cause).await)
        }
    }
}

async fn recover<D>(driver: &D, prior: u64, cause: ExecutionError) -> MigrateError
where
    D: VersionStore,
{
    let broken = match driver.current_version().await {
        Ok(marker) => marker.map_or(0, |marker| marker.version),
        Err(recovery) => return MigrateError::RecoveryFailed { cause, recovery },
    };
    let actual = recovered_version(prior, broken);
    warn!(
        "Recovering schema: started at {}, stopped at {}, forcing version {}",
        prior, broken, actual
    );
    match driver.force_version(actual, false).await {
        Ok(()) => MigrateError::Execution(cause),
        Err(recovery) => MigrateError::RecoveryFailed { cause, recovery },
    }
}

/// Clean version to record after a transition from `prior` stopped at `broken`.
///
/// The marker holds the version of the step being attempted, so the step
/// nearest to it is taken as not done. Assumes contiguous versions and a
/// marker write before every script.
pub fn recovered_version(prior: u64, broken: u64) -> u64 {
    match broken.cmp(&prior) {
        Ordering::Equal => broken,
        Ordering::Less => broken + 1,
        Ordering::Greater => broken - 1,
    }
}
