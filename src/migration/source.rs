use super::{ExecutionError, SourceError};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    /// Forward, applies a script
    Up,
    /// Backward, reverts a script
    Down,
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let direction = match self {
            Direction::Up => "up",
            Direction::Down => "down",
        };
        write!(f, "{}", direction)
    }
}

/// One versioned change-unit of a [`ScriptSet`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub version: u64,
    pub name: String,
    pub up: Option<PathBuf>,
    pub down: Option<PathBuf>,
}

impl Display for Script {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.version, self.name)
    }
}

impl Script {
    pub fn path(&self, direction: Direction) -> Option<&Path> {
        match direction {
            Direction::Up => self.up.as_deref(),
            Direction::Down => self.down.as_deref(),
        }
    }

    /// Load the body for `direction`, `None` when the script has no such file
    pub fn read(&self, direction: Direction) -> Result<Option<String>, ExecutionError> {
        self.path(direction)
            .map(|path| {
                fs::read_to_string(path).map_err(|source| ExecutionError::ReadScript {
                    path: path.to_owned(),
                    source,
                })
            })
            .transpose()
    }
}

/// Scripts found in a directory, named `{version}_{name}.{up|down}.{ext}`
#[derive(Debug, Clone)]
pub struct ScriptSet {
    location: PathBuf,
    scripts: Vec<Script>,
}

impl ScriptSet {
    /// Enumerate the directory without reading any script body
    pub fn open<P>(location: P) -> Result<Self, SourceError>
    where
        P: AsRef<Path>,
    {
        let location = location.as_ref().to_owned();
        let unreachable = |source| SourceError::Unreachable {
            path: location.clone(),
            source,
        };
        if !fs::metadata(&location).map_err(unreachable)?.is_dir() {
            return Err(SourceError::NotADirectory(location));
        }

        let mut scripts: BTreeMap<u64, Script> = BTreeMap::new();
        for entry in fs::read_dir(&location).map_err(unreachable)? {
            let entry = entry.map_err(unreachable)?;
            if !entry.file_type().map_err(unreachable)?.is_file() {
                continue;
            }
            let path = entry.path();
            let parsed = entry
                .file_name()
                .to_str()
                .and_then(parse_file_name)
                .map(|(version, name, direction)| (version, name.to_owned(), direction));
            let (version, name, direction) = match parsed {
                Some(parsed) => parsed,
                None => {
                    debug!("Skipping '{}'", path.display());
                    continue;
                }
            };
            if version == 0 {
                return Err(SourceError::ZeroVersion(path));
            }

            let script = scripts.entry(version).or_insert_with(|| Script {
                version,
                name,
                up: None,
                down: None,
            });
            let slot = match direction {
                Direction::Up => &mut script.up,
                Direction::Down => &mut script.down,
            };
            if let Some(first) = slot.take() {
                return Err(SourceError::Duplicate {
                    version,
                    direction,
                    first,
                    second: path,
                });
            }
            *slot = Some(path);
        }

        Ok(Self {
            location,
            scripts: scripts.into_values().collect(),
        })
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    /// All scripts in ascending version order
    pub fn scripts(&self) -> &[Script] {
        &self.scripts
    }

    pub fn get(&self, version: u64) -> Option<&Script> {
        self.scripts
            .binary_search_by_key(&version, |script| script.version)
            .ok()
            .map(|index| &self.scripts[index])
    }

    /// Highest version in the set, 0 when empty
    pub fn latest(&self) -> u64 {
        self.scripts.last().map_or(0, |script| script.version)
    }

    /// Version that precedes `version`, 0 when there is none
    pub fn prev(&self, version: u64) -> u64 {
        self.scripts
            .iter()
            .rev()
            .map(|script| script.version)
            .find(|v| *v < version)
            .unwrap_or(0)
    }

    /// Scripts above `version`, ascending
    pub fn pending(&self, version: u64) -> impl Iterator<Item = &Script> {
        self.scripts.iter().filter(move |s| s.version > version)
    }

    /// Scripts at or below `version`, descending
    pub fn applied(&self, version: u64) -> impl Iterator<Item = &Script> {
        self.scripts.iter().rev().filter(move |s| s.version <= version)
    }
}

fn parse_file_name(file_name: &str) -> Option<(u64, &str, Direction)> {
    let (version, rest) = file_name.split_once('_')?;
    if version.is_empty() || !version.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let version = version.parse().ok()?;

    let mut parts = rest.rsplitn(3, '.');
    parts.next()?;
    let direction = match parts.next()? {
        "up" => Direction::Up,
        "down" => Direction::Down,
        _ => return None,
    };
    let name = parts.next()?;
    Some((version, name, direction))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), "SELECT 1;").unwrap();
    }

    #[test]
    fn parses_file_names() {
        assert_eq!(
            parse_file_name("1_create_samples.up.sql"),
            Some((1, "create_samples", Direction::Up))
        );
        assert_eq!(
            parse_file_name("20220118_seed.users.down.sql"),
            Some((20220118, "seed.users", Direction::Down))
        );
        assert_eq!(parse_file_name("README.md"), None);
        assert_eq!(parse_file_name("1_samples.sql"), None);
        assert_eq!(parse_file_name("v1_samples.up.sql"), None);
        assert_eq!(parse_file_name("+1_samples.up.sql"), None);
    }

    #[test]
    fn orders_scripts_by_version() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "10_users.up.sql");
        touch(dir.path(), "10_users.down.sql");
        touch(dir.path(), "2_samples.up.sql");
        touch(dir.path(), "notes.txt");
        fs::create_dir(dir.path().join("3_nested.up.sql")).unwrap();

        let set = ScriptSet::open(dir.path()).unwrap();
        let versions: Vec<_> = set.scripts().iter().map(|s| s.version).collect();
        assert_eq!(versions, vec![2, 10]);
        assert_eq!(set.latest(), 10);
        assert_eq!(set.prev(10), 2);
        assert_eq!(set.prev(2), 0);
        assert_eq!(set.get(2).unwrap().name, "samples");
        assert!(set.get(2).unwrap().down.is_none());
        assert!(set.get(3).is_none());

        let pending: Vec<_> = set.pending(2).map(|s| s.version).collect();
        assert_eq!(pending, vec![10]);
        let applied: Vec<_> = set.applied(10).map(|s| s.version).collect();
        assert_eq!(applied, vec![10, 2]);
    }

    #[test]
    fn empty_directory_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let set = ScriptSet::open(dir.path()).unwrap();
        assert!(set.scripts().is_empty());
        assert_eq!(set.latest(), 0);
    }

    #[test]
    fn rejects_duplicate_versions() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "1_samples.up.sql");
        touch(dir.path(), "1_other.up.sql");
        assert!(matches!(
            ScriptSet::open(dir.path()),
            Err(SourceError::Duplicate {
                version: 1,
                direction: Direction::Up,
                ..
            })
        ));
    }

    #[test]
    fn rejects_version_zero() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "0_init.up.sql");
        assert!(matches!(
            ScriptSet::open(dir.path()),
            Err(SourceError::ZeroVersion(_))
        ));
    }

    #[test]
    fn rejects_missing_location() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ScriptSet::open(dir.path().join("brokenpath")),
            Err(SourceError::Unreachable { .. })
        ));

        touch(dir.path(), "1_samples.up.sql");
        assert!(matches!(
            ScriptSet::open(dir.path().join("1_samples.up.sql")),
            Err(SourceError::NotADirectory(_))
        ));
    }

    #[test]
    fn reads_script_bodies_lazily() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "1_samples.up.sql");
        let set = ScriptSet::open(dir.path()).unwrap();
        let script = set.get(1).unwrap();
        assert_eq!(script.read(Direction::Up).unwrap().as_deref(), Some("SELECT 1;"));
        assert!(script.read(Direction::Down).unwrap().is_none());

        fs::remove_file(dir.path().join("1_samples.up.sql")).unwrap();
        assert!(matches!(
            script.read(Direction::Up),
            Err(ExecutionError::ReadScript { .. })
        ));
    }
}
