//! # File-Backed Ledger
//!
//! A [`MemoryLedger`] persisted as a single JSON document. One process owns
//! the file for the length of a transaction: it opens the document, runs one
//! operation, and calls [`FileLedger::commit()`]. A ledger dropped without
//! committing leaves the file untouched, so a failed operation has no
//! observable effect.
//!
//! ## Concurrent Writers
//!
//! Commit is optimistic. The document bytes seen at open are kept, and
//! commit takes the `<path>.lock` file with `create_new`, re-reads the
//! document, and aborts with [`LedgerError::Conflict`] if it changed or if
//! another writer holds the lock. The lock is removed when commit returns.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::{HistoryEntry, Ledger, LedgerError, MemoryLedger, TxMeta};

/// Ledger state loaded from, and committed back to, a JSON file.
#[derive(Debug)]
pub struct FileLedger {
    path: PathBuf,
    state: MemoryLedger,
    /// Document bytes at open; `None` if the file did not exist.
    base: Option<Vec<u8>>,
}

impl FileLedger {
    /// Open the ledger at `path`, starting empty if the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        let base = read_document(&path)?;
        let state = match &base {
            Some(bytes) => serde_json::from_slice(bytes)?,
            None => {
                tracing::info!(path = %path.display(), "ledger file not found; starting empty");
                MemoryLedger::new()
            }
        };
        Ok(Self { path, state, base })
    }

    /// Location of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a transaction.
    pub fn begin(&mut self, meta: TxMeta) {
        self.state.begin(meta);
    }

    /// Persist every write made since the ledger was opened.
    ///
    /// Writes a uniquely named sibling temp file and renames it over the
    /// document, so a crash mid-write leaves the previous version intact.
    /// Fails with [`LedgerError::Conflict`] if the document changed since
    /// open.
    pub fn commit(self) -> Result<(), LedgerError> {
        let parent = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => parent.to_path_buf(),
            None => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;
        let bytes = serde_json::to_vec_pretty(&self.state)?;

        let _lock = CommitLock::acquire(&self.path)?;
        if read_document(&self.path)? != self.base {
            tracing::warn!(path = %self.path.display(), "ledger changed since open");
            return Err(self.conflict());
        }

        let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| LedgerError::Io(e.error))?;
        tracing::debug!(path = %self.path.display(), "ledger committed");
        Ok(())
    }

    fn conflict(&self) -> LedgerError {
        LedgerError::Conflict {
            key: self.path.display().to_string(),
        }
    }
}

fn read_document(path: &Path) -> Result<Option<Vec<u8>>, LedgerError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Exclusive `<path>.lock` held for the duration of a commit.
struct CommitLock {
    path: PathBuf,
}

impl CommitLock {
    fn acquire(document: &Path) -> Result<Self, LedgerError> {
        let mut name = document.as_os_str().to_owned();
        name.push(".lock");
        let path = PathBuf::from(name);
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(_) => Ok(Self { path }),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                tracing::warn!(lock = %path.display(), "ledger locked by another writer");
                Err(LedgerError::Conflict {
                    key: document.display().to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for CommitLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!(lock = %self.path.display(), error = %e, "failed to remove ledger lock");
        }
    }
}

impl Ledger for FileLedger {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        self.state.get_state(key)
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), LedgerError> {
        self.state.put_state(key, value)
    }

    fn del_state(&mut self, key: &str) -> Result<(), LedgerError> {
        self.state.del_state(key)
    }

    fn state_by_range(
        &self,
        start: &str,
        end: &str,
    ) -> Result<Vec<(String, Vec<u8>)>, LedgerError> {
        self.state.state_by_range(start, end)
    }

    fn history_for_key(&self, key: &str) -> Result<Vec<HistoryEntry>, LedgerError> {
        self.state.history_for_key(key)
    }

    fn tx_meta(&self) -> Result<&TxMeta, LedgerError> {
        self.state.tx_meta()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_then_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");

        let mut ledger = FileLedger::open(&path).unwrap();
        ledger.begin(TxMeta::generate());
        ledger.put_state("A", br#"{"id":"A"}"#.to_vec()).unwrap();
        ledger.commit().unwrap();

        let reopened = FileLedger::open(&path).unwrap();
        assert_eq!(
            reopened.get_state("A").unwrap(),
            Some(br#"{"id":"A"}"#.to_vec())
        );
        assert_eq!(reopened.history_for_key("A").unwrap().len(), 1);
    }

    #[test]
    fn test_drop_without_commit_discards() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");

        let mut ledger = FileLedger::open(&path).unwrap();
        ledger.begin(TxMeta::generate());
        ledger.put_state("A", b"{}".to_vec()).unwrap();
        drop(ledger);

        assert!(!path.exists());
        let reopened = FileLedger::open(&path).unwrap();
        assert_eq!(reopened.get_state("A").unwrap(), None);
    }

    #[test]
    fn test_commit_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ledger.json");
        let mut ledger = FileLedger::open(&path).unwrap();
        ledger.begin(TxMeta::generate());
        ledger.put_state("A", b"{}".to_vec()).unwrap();
        ledger.commit().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_open_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, b"not a ledger").unwrap();
        assert!(matches!(
            FileLedger::open(&path),
            Err(LedgerError::Encoding(_))
        ));
    }

    #[test]
    fn test_concurrent_commit_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");

        let mut first = FileLedger::open(&path).unwrap();
        let mut second = FileLedger::open(&path).unwrap();
        first.begin(TxMeta::generate());
        second.begin(TxMeta::generate());
        first.put_state("A", b"{}".to_vec()).unwrap();
        second.put_state("B", b"{}".to_vec()).unwrap();

        first.commit().unwrap();
        assert!(matches!(
            second.commit(),
            Err(LedgerError::Conflict { .. })
        ));

        let reopened = FileLedger::open(&path).unwrap();
        assert!(reopened.get_state("A").unwrap().is_some());
        assert!(reopened.get_state("B").unwrap().is_none());
    }

    #[test]
    fn test_commit_after_reopen_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        for key in ["A", "B"] {
            let mut ledger = FileLedger::open(&path).unwrap();
            ledger.begin(TxMeta::generate());
            ledger.put_state(key, b"{}".to_vec()).unwrap();
            ledger.commit().unwrap();
        }
        let reopened = FileLedger::open(&path).unwrap();
        assert_eq!(reopened.state_by_range("", "").unwrap().len(), 2);
        assert!(!dir.path().join("ledger.json.lock").exists());
    }

    #[test]
    fn test_held_lock_is_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(dir.path().join("ledger.json.lock"), b"").unwrap();

        let mut ledger = FileLedger::open(&path).unwrap();
        ledger.begin(TxMeta::generate());
        ledger.put_state("A", b"{}".to_vec()).unwrap();
        assert!(matches!(ledger.commit(), Err(LedgerError::Conflict { .. })));
        assert!(!path.exists());
        assert!(dir.path().join("ledger.json.lock").exists());
    }

    #[test]
    fn test_transactions_do_not_persist_open_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let mut ledger = FileLedger::open(&path).unwrap();
        ledger.begin(TxMeta::generate());
        ledger.put_state("A", b"{}".to_vec()).unwrap();
        ledger.commit().unwrap();

        let mut reopened = FileLedger::open(&path).unwrap();
        assert!(matches!(
            reopened.put_state("B", b"{}".to_vec()),
            Err(LedgerError::NoTransaction)
        ));
    }
}
