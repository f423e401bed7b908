//! JSON file session store
//!
//! One pretty-printed `{id}.json` file per session. Writes go to a temporary
//! file that is renamed into place while holding an exclusive lock on
//! `.lock` in the sessions directory.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, warn};

use super::{SessionStore, StoreError, sort_recent_first};
use crate::domain::{TripSession, is_valid_session_id};

const LOCK_FILE: &str = ".lock";

pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    /// Open (creating if needed) a store rooted at `dir`
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        debug!(dir = %dir.display(), "FileSessionStore::open: called");
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, StoreError> {
        if !is_valid_session_id(id) {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", id)))
    }

    fn lock(&self, exclusive: bool) -> Result<File, StoreError> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.dir.join(LOCK_FILE))?;
        if exclusive {
            FileExt::lock_exclusive(&file)?;
        } else {
            FileExt::lock_shared(&file)?;
        }
        Ok(file)
    }

    fn read(path: &Path) -> Result<Option<TripSession>, StoreError> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, id: &str) -> Result<Option<TripSession>, StoreError> {
        let path = self.path_for(id)?;
        let lock = self.lock(false)?;
        let result = Self::read(&path);
        FileExt::unlock(&lock)?;
        result
    }

    fn put(&mut self, session: &TripSession) -> Result<(), StoreError> {
        let path = self.path_for(&session.id)?;
        let tmp = self.dir.join(format!(".{}.json.tmp", session.id));
        let json = serde_json::to_string_pretty(session)?;

        let lock = self.lock(true)?;
        let result = (|| -> Result<(), StoreError> {
            let mut file = File::create(&tmp)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp, &path)?;
            Ok(())
        })();
        FileExt::unlock(&lock)?;

        debug!(id = %session.id, step = %session.step, "put: session written");
        result
    }

    fn clear(&mut self, id: &str) -> Result<bool, StoreError> {
        let path = self.path_for(id)?;
        let lock = self.lock(true)?;
        let result = match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        };
        FileExt::unlock(&lock)?;
        result
    }

    fn list(&self) -> Result<Vec<TripSession>, StoreError> {
        let lock = self.lock(false)?;
        let mut sessions = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_session = path.extension().is_some_and(|ext| ext == "json")
                && !path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with('.'));
            if !is_session {
                continue;
            }
            match Self::read(&path) {
                Ok(Some(session)) => sessions.push(session),
                Ok(None) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "list: skipping unreadable session file"),
            }
        }
        FileExt::unlock(&lock)?;
        sort_recent_first(&mut sessions);
        Ok(sessions)
    }
}
