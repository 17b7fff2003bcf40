//! Seen-articles ledger for cross-run deduplication.
//!
//! The ledger maps a source key to the URLs already delivered for that
//! source, persisted as a JSON object:
//!
//! ```json
//! {
//!   "netflixvandaag": ["https://www.netflixvandaag.nl/nieuws/..."],
//!   "streamwijzer": ["https://www.streamwijzer.nl/nieuws/..."]
//! }
//! ```
//!
//! The older single-source format, a flat list of `{url, title, date}`
//! entries, is still read and is filed under Streamwijzer. It is written back
//! in the mapping format on the next save.
//!
//! A file that cannot be parsed is moved aside to
//! `<name>.backup.<unix_timestamp>` and the run continues with an empty
//! ledger.

use crate::models::Source;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{error, info, instrument, warn};

/// Previously delivered article URLs, per source. Append-only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeenLedger {
    sources: BTreeMap<String, Vec<String>>,
}

impl SeenLedger {
    /// Whether `url` has not been delivered for `source` yet.
    pub fn is_new(&self, source: Source, url: &str) -> bool {
        !self.urls(source).iter().any(|seen| seen == url)
    }

    /// Mark `url` as delivered for `source`.
    pub fn record(&mut self, source: Source, url: &str) {
        self.sources
            .entry(source.key().to_string())
            .or_default()
            .push(url.to_string());
    }

    /// URLs recorded for `source`, oldest first.
    pub fn urls(&self, source: Source) -> &[String] {
        self.sources
            .get(source.key())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Total number of recorded URLs across all sources.
    pub fn len(&self) -> usize {
        self.sources.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Accepted on-disk shapes.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PersistedLedger {
    Sources(BTreeMap<String, Vec<String>>),
    Legacy(Vec<LegacyEntry>),
}

/// Entry of the single-source format; `title` and `date` are not needed.
#[derive(Debug, Deserialize)]
struct LegacyEntry {
    url: String,
}

impl From<PersistedLedger> for SeenLedger {
    fn from(persisted: PersistedLedger) -> Self {
        match persisted {
            PersistedLedger::Sources(sources) => SeenLedger { sources },
            PersistedLedger::Legacy(entries) => {
                let mut ledger = SeenLedger::default();
                for entry in entries {
                    ledger.record(Source::Streamwijzer, &entry.url);
                }
                ledger
            }
        }
    }
}

/// Reads and writes the ledger file.
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

    /// Load the ledger; never fails.
    ///
    /// Missing or empty file: empty ledger. Unparseable file (including
    /// invalid UTF-8): moved to a timestamped backup, empty ledger.
    /// Unreadable file: logged, empty ledger.
    #[instrument(level = "info", skip(self), fields(path = %self.path.display()))]
    pub fn load(&self) -> SeenLedger {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No ledger file yet; starting empty");
                return SeenLedger::default();
            }
            Err(e) => {
                warn!(error = %e, "Could not read ledger; starting empty");
                return SeenLedger::default();
            }
        };

        if content.trim_ascii().is_empty() {
            return SeenLedger::default();
        }

        match serde_json::from_slice::<PersistedLedger>(&content) {
            Ok(persisted) => {
                let ledger = SeenLedger::from(persisted);
                info!(count = ledger.len(), "Loaded seen articles");
                ledger
            }
            Err(e) => {
                warn!(error = %e, "Ledger file is corrupt; starting empty");
                self.quarantine();
                SeenLedger::default()
            }
        }
    }

    /// Write the whole ledger back to disk.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display(), count = ledger.len()))]
    pub fn save(&self, ledger: &SeenLedger) -> Result<(), Box<dyn Error>> {
        let json = serde_json::to_string_pretty(ledger)?;
        fs::write(&self.path, json)?;
        info!("Saved seen articles");
        Ok(())
    }

    /// Backup location for a corrupt ledger moved aside at `timestamp`.
    pub fn backup_path(&self, timestamp: i64) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(format!(".backup.{timestamp}"));
        PathBuf::from(name)
    }

    /// First backup path for `timestamp` that is not taken yet; later
    /// collisions within the same second get a `.1`, `.2`, ... suffix.
    fn free_backup_path(&self, timestamp: i64) -> PathBuf {
        let base = self.backup_path(timestamp);
        let mut candidate = base.clone();
        let mut n = 0u32;
        while candidate.exists() {
            n += 1;
            let mut name = base.as_os_str().to_os_string();
            name.push(format!(".{n}"));
            candidate = PathBuf::from(name);
        }
        candidate
    }

    fn quarantine(&self) {
        let backup = self.free_backup_path(Utc::now().timestamp());
        match fs::rename(&self.path, &backup) {
            Ok(()) => warn!(backup = %backup.display(), "Moved corrupt ledger aside"),
            Err(e) => error!(backup = %backup.display(), error = %e, "Failed to back up corrupt ledger"),
        }
    }
}
