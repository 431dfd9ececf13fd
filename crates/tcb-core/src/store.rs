//! Persistent lifetime counters.
//!
//! The record is a flat JSON object (`{"deaths": 12, "wz_wins": 3, ...}`),
//! read whole and written whole. Each mutation is a read-modify-write that
//! replaces the file atomically via a sibling `.new` file.

use std::{
    collections::BTreeMap,
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{errors::Error, Result};

/// Statistic kinds tracked by the bot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stat {
    Deaths,
    Chalked,
    WzWins,
    /// Squad kill personal record. Set via `dmzpr`, never incremented.
    DmzSquadPrKills,
}

impl Stat {
    pub const ALL: [Stat; 4] = [
        Stat::Deaths,
        Stat::Chalked,
        Stat::WzWins,
        Stat::DmzSquadPrKills,
    ];

    /// Key in the counter file.
    pub fn key(self) -> &'static str {
        match self {
            Stat::Deaths => "deaths",
            Stat::Chalked => "chalked",
            Stat::WzWins => "wz_wins",
            Stat::DmzSquadPrKills => "dmz_squad_pr_kills",
        }
    }

    /// Overlay file name and line label for the session count, if any.
    pub fn companion(self) -> Option<(&'static str, &'static str)> {
        match self {
            Stat::Deaths => Some(("session_deaths.txt", "deaths")),
            Stat::Chalked => Some(("session_chalked.txt", "chalked")),
            Stat::WzWins => Some(("session_wins.txt", "wins")),
            Stat::DmzSquadPrKills => None,
        }
    }
}

/// Lifetime counters as stored on disk.
///
/// Unknown keys are kept so a rewrite never drops data another tool put there.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CounterRecord(BTreeMap<String, u64>);

impl CounterRecord {
    pub fn get(&self, stat: Stat) -> u64 {
        self.0.get(stat.key()).copied().unwrap_or(0)
    }

    pub fn set(&mut self, stat: Stat, value: u64) {
        self.0.insert(stat.key().to_string(), value);
    }

    pub fn contains(&self, stat: Stat) -> bool {
        self.0.contains_key(stat.key())
    }

    /// A record with every known stat at zero.
    pub fn zeroed() -> Self {
        let mut record = Self::default();
        for stat in Stat::ALL {
            record.set(stat, 0);
        }
        record
    }
}

/// JSON-backed counter store plus the companion overlay files.
#[derive(Clone, Debug)]
pub struct CounterStore {
    path: PathBuf,
    overlay_dir: PathBuf,
}

impl CounterStore {
    pub fn new(path: impl Into<PathBuf>, overlay_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            overlay_dir: overlay_dir.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full record. Missing file, bad JSON and missing keys are all errors.
    pub fn load(&self) -> Result<CounterRecord> {
        let raw = fs::read_to_string(&self.path).map_err(|e| Error::InvalidCounterFile {
            path: self.path.clone(),
            reason: format!("cannot read: {e}"),
        })?;

        let record: CounterRecord =
            serde_json::from_str(&raw).map_err(|e| Error::InvalidCounterFile {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        if let Some(missing) = Stat::ALL.iter().find(|s| !record.contains(**s)) {
            return Err(Error::MissingCounter {
                path: self.path.clone(),
                key: missing.key().to_string(),
            });
        }

        Ok(record)
    }

    /// Add `delta` to `stat` and persist. Returns the new lifetime value.
    pub fn increment(&self, stat: Stat, delta: u64) -> Result<u64> {
        let mut record = self.load()?;
        let next = record.get(stat).saturating_add(delta);
        record.set(stat, next);
        self.save(&record)?;
        Ok(next)
    }

    /// Overwrite `stat` and persist.
    pub fn set(&self, stat: Stat, value: u64) -> Result<()> {
        let mut record = self.load()?;
        record.set(stat, value);
        self.save(&record)
    }

    /// Replace the record on disk.
    pub fn save(&self, record: &CounterRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let body = serde_json::to_string_pretty(record)?;
        let tmp = sibling_tmp(&self.path);
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Rewrite the overlay file for `stat`. Best effort: failures are logged only.
    pub fn write_companion(&self, stat: Stat, session_value: u64) {
        let Some((file, label)) = stat.companion() else {
            return;
        };

        let path = self.overlay_dir.join(file);
        let result = fs::create_dir_all(&self.overlay_dir)
            .and_then(|_| fs::write(&path, format!("{label}: {session_value}")));
        if let Err(e) = result {
            tracing::warn!("failed to update overlay file {}: {e}", path.display());
        }
    }
}

fn sibling_tmp(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".new");
    PathBuf::from(name)
}
