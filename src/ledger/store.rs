use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use log::{debug, warn};
use crate::error::{LedgerError, ParseError};

/// Set of transaction hashes that have already been notified.
///
/// Hashes are only ever added. The ledger is owned by the poll loop and
/// written back through [`LedgerStore::save`] once per cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    hashes: HashSet<String>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.hashes.contains(hash)
    }

    /// Returns false if the hash was already recorded
    pub fn insert(&mut self, hash: impl Into<String>) -> bool {
        self.hashes.insert(hash.into())
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.hashes.iter()
    }

    fn sorted(&self) -> Vec<&String> {
        let mut hashes: Vec<&String> = self.hashes.iter().collect();
        hashes.sort();
        hashes
    }
}

impl FromIterator<String> for Ledger {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self { hashes: iter.into_iter().collect() }
    }
}

/// JSON file holding the ledger as an array of hash strings
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the ledger, treating a missing, unreadable or corrupt file as empty history.
    ///
    /// Losing history can only cause duplicate notifications, never missed
    /// ones, so the failure is logged and startup continues.
    pub fn load(&self) -> Ledger {
        match self.try_load() {
            Ok(ledger) => {
                debug!("Loaded {} processed transactions from {}", ledger.len(), self.path.display());
                ledger
            }
            Err(e) => {
                warn!("Starting with empty ledger: {}", e);
                Ledger::new()
            }
        }
    }

    /// Strict variant of [`load`](Self::load). A missing file is still an empty ledger.
    pub fn try_load(&self) -> Result<Ledger, LedgerError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Ledger::new()),
            Err(source) => {
                return Err(LedgerError::Io {
                    path: self.path.display().to_string(),
                    source,
                })
            }
        };

        let hashes: Vec<String> = serde_json::from_str(&content).map_err(|source| ParseError::Ledger {
            path: self.path.display().to_string(),
            source,
        })?;

        Ok(hashes.into_iter().collect())
    }

    /// Overwrite the store with the full ledger.
    ///
    /// Writes a sibling temp file and renames it over the target so a crash
    /// mid-write leaves the previous ledger intact.
    pub fn save(&self, ledger: &Ledger) -> Result<(), LedgerError> {
        let content = serde_json::to_string(&ledger.sorted()).map_err(LedgerError::Serialize)?;

        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, content).map_err(|source| LedgerError::Io {
            path: tmp_path.display().to_string(),
            source,
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|source| LedgerError::Io {
            path: self.path.display().to_string(),
            source,
        })?;

        debug!("Saved {} processed transactions to {}", ledger.len(), self.path.display());
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
