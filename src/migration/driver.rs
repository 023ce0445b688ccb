use super::{
    Direction, ExecutionError, Marker, MigrationConnection, Script, ScriptSet, StoreError,
    VersionTable,
};
use tracing::{info, warn};

/// Where the [`Marker`] of one tracked concern is kept
#[async_trait::async_trait]
pub trait VersionStore: Sync {
    /// `None` when nothing was ever recorded
    async fn current_version(&self) -> Result<Option<Marker>, StoreError>;

    async fn force_version(&self, version: u64, dirty: bool) -> Result<(), StoreError>;
}

/// Applies scripts and persists the marker around each one of them.
///
/// Every method returns the version reached. On error the marker holds the
/// version of the step being attempted, still flagged dirty.
#[async_trait::async_trait]
pub trait ScriptExecutor: Sync {
    /// Apply every script above `from`
    async fn apply_forward(&self, from: u64) -> Result<u64, ExecutionError>;

    /// Revert every script at or below `from`
    async fn apply_backward(&self, from: u64) -> Result<u64, ExecutionError>;

    /// Apply or revert scripts until `target` is reached
    async fn apply_to_target(&self, from: u64, target: u64) -> Result<u64, ExecutionError>;
}

/// Runs a [`ScriptSet`] over a [`MigrationConnection`]
pub struct SqlDriver<'c, C>
where
    C: MigrationConnection,
{
    conn: &'c C,
    scripts: ScriptSet,
    table: VersionTable<'c, C>,
}

impl<'c, C> SqlDriver<'c, C>
where
    C: MigrationConnection,
{
    pub fn new<N>(conn: &'c C, scripts: ScriptSet, table: N) -> Self
    where
        N: Into<String>,
    {
        Self {
            conn,
            scripts,
            table: VersionTable::new(conn, table),
        }
    }

    pub fn scripts(&self) -> &ScriptSet {
        &self.scripts
    }

    async fn step_up(&self, script: &Script) -> Result<(), ExecutionError> {
        info!("Applying migration '{}'", script);
        self.table.write(script.version, true).await?;
        self.exec(script, Direction::Up).await?;
        self.table.write(script.version, false).await?;
        info!("Migration '{}' has been applied", script);
        Ok(())
    }

    async fn step_down(&self, script: &Script) -> Result<u64, ExecutionError> {
        let prev = self.scripts.prev(script.version);
        info!("Rolling back migration '{}'", script);
        self.table.write(prev, true).await?;
        self.exec(script, Direction::Down).await?;
        self.table.write(prev, false).await?;
        info!("Migration '{}' has been rollbacked", script);
        Ok(prev)
    }

    async fn exec(&self, script: &Script, direction: Direction) -> Result<(), ExecutionError> {
        let body = match script.read(direction)? {
            Some(body) => body,
            None => {
                warn!("Migration '{}' has no {} script", script, direction);
                return Ok(());
            }
        };
        self.conn
            .exec_stmt(&body)
            .await
            .map_err(|source| ExecutionError::Script {
                version: script.version,
                direction,
                source,
            })?;
        Ok(())
    }

    async fn forward_to(&self, from: u64, target: u64) -> Result<u64, ExecutionError> {
        let mut current = from;
        let scripts = self.scripts.pending(from).take_while(|s| s.version <= target);
        for script in scripts {
            self.step_up(script).await?;
            current = script.version;
        }
        Ok(current)
    }

    async fn backward_to(&self, from: u64, target: u64) -> Result<u64, ExecutionError> {
        let mut current = from;
        let scripts = self.scripts.applied(from).take_while(|s| s.version > target);
        for script in scripts {
            current = self.step_down(script).await?;
        }
        Ok(current)
    }
}

#[async_trait::async_trait]
impl<'c, C> VersionStore for SqlDriver<'c, C>
where
    C: MigrationConnection,
{
    async fn current_version(&self) -> Result<Option<Marker>, StoreError> {
        self.table.read().await
    }

    async fn force_version(&self, version: u64, dirty: bool) -> Result<(), StoreError> {
        self.table.write(version, dirty).await
    }
}

#[async_trait::async_trait]
impl<'c, C> ScriptExecutor for SqlDriver<'c, C>
where
    C: MigrationConnection,
{
    async fn apply_forward(&self, from: u64) -> Result<u64, ExecutionError> {
        if self.scripts.pending(from).next().is_none() {
            info!("No pending migrations");
        }
        self.forward_to(from, u64::MAX).await
    }

    async fn apply_backward(&self, from: u64) -> Result<u64, ExecutionError> {
        if self.scripts.applied(from).next().is_none() {
            info!("No applied migrations");
        }
        self.backward_to(from, 0).await
    }

    async fn apply_to_target(&self, from: u64, target: u64) -> Result<u64, ExecutionError> {
        if target == from {
            info!("Already at version {}", target);
            return Ok(from);
        }
        if target != 0 && self.scripts.get(target).is_none() {
            return Err(ExecutionError::UnknownVersion(target));
        }
        if target > from {
            self.forward_to(from, target).await
        } else {
            self.backward_to(from, target).await
        }
    }
}
