use std::{
    fs,
    path::{Component, Path, PathBuf},
    time::Duration,
};

use itertools::Itertools;
use tracing::info;

use super::{connection::Connection, error::ConnectionError};

const SNAPSHOT_EXTENSION: &str = "db";

/// A directory of pre-seeded datasets, one `<name>.db` file per stage.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        SnapshotStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where snapshot `name` lives, whether or not it exists yet.
    pub fn path_of(&self, name: &str) -> Result<PathBuf, ConnectionError> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) if !name.contains(['/', '\\']) => {
                Ok(self.dir.join(format!("{name}.{SNAPSHOT_EXTENSION}")))
            }
            _ => Err(ConnectionError::InvalidSnapshotName(name.to_owned())),
        }
    }

    pub fn locate(&self, name: &str) -> Result<PathBuf, ConnectionError> {
        let path = self.path_of(name)?;
        if !path.is_file() {
            return Err(ConnectionError::SnapshotNotFound {
                name: name.to_owned(),
                path,
            });
        }
        Ok(path)
    }

    /// Names of every snapshot in the directory, sorted.
    pub fn list(&self) -> Result<Vec<String>, ConnectionError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| {
            ConnectionError::SnapshotDirectory {
                path: self.dir.clone(),
                source,
            }
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|source| ConnectionError::SnapshotDirectory {
                    path: self.dir.clone(),
                    source,
                })?
                .path();
            if path.is_file() && path.extension().is_some_and(|e| e == SNAPSHOT_EXTENSION) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_owned());
                }
            }
        }
        Ok(names.into_iter().sorted().collect_vec())
    }

    /// Copies stage `from` over stage `to`, so later stages never touch the
    /// dataset an earlier stage was seeded with.
    pub fn restore(&self, from: &str, to: &str) -> Result<PathBuf, ConnectionError> {
        let source = self.locate(from)?;
        let destination = self.path_of(to)?;
        if source == destination {
            return Ok(destination);
        }

        fs::copy(&source, &destination).map_err(|e| ConnectionError::Restore {
            from: from.to_owned(),
            to: to.to_owned(),
            source: e,
        })?;
        info!(from, to, "restored snapshot");
        Ok(destination)
    }

    pub fn open(&self, name: &str, timeout: Option<Duration>) -> Result<Connection, ConnectionError> {
        Connection::new(self.locate(name)?, timeout)
    }

    pub fn open_from_snapshot(&self, name: &str) -> Result<Connection, ConnectionError> {
        self.open(name, None)
    }

    /// Restores `from` into `to` and opens the copy.
    pub fn from_existing(
        &self,
        from: &str,
        to: &str,
        timeout: Option<Duration>,
    ) -> Result<Connection, ConnectionError> {
        self.restore(from, to)?;
        self.open(to, timeout)
    }

    /// Lends a connection on snapshot `name` to `f`, closing it when `f` returns.
    pub fn with_connection<T>(
        &self,
        name: &str,
        timeout: Option<Duration>,
        f: impl FnOnce(&Connection) -> T,
    ) -> Result<T, ConnectionError> {
        let conn = self.open(name, timeout)?;
        Ok(f(&conn))
    }
}
