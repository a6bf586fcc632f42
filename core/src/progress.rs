use chrono::{DateTime, Utc};
use core::time::Duration;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::{AchievementId, AchievementRecord, Difficulty, StoreError, ThemeId};

/// Everything that outlives a session: per-difficulty best winning times,
/// the achievement ledger, and the themes the player has tried. This is the
/// unit exchanged with a [`ProgressStore`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub best_times: BTreeMap<Difficulty, Duration>,
    pub achievements: BTreeMap<AchievementId, AchievementRecord>,
    pub themes_tried: BTreeSet<ThemeId>,
}

impl ProgressSnapshot {
    pub fn achievement(&self, id: AchievementId) -> AchievementRecord {
        self.achievements.get(&id).copied().unwrap_or_default()
    }

    /// Flips a record to unlocked. Already-unlocked records keep their
    /// original timestamp.
    pub fn unlock(&mut self, id: AchievementId, at: DateTime<Utc>) {
        let record = self.achievements.entry(id).or_default();
        if !record.unlocked {
            record.unlocked = true;
            record.unlocked_at = Some(at);
        }
    }

    pub fn best_time(&self, difficulty: Difficulty) -> Option<Duration> {
        self.best_times.get(&difficulty).copied()
    }

    /// Records a winning time, keeping the lower of the two. Returns whether
    /// the record improved.
    pub fn record_win(&mut self, difficulty: Difficulty, elapsed: Duration) -> bool {
        match self.best_times.get(&difficulty) {
            Some(&best) if best <= elapsed => false,
            _ => {
                self.best_times.insert(difficulty, elapsed);
                true
            }
        }
    }
}

/// Load/save boundary owned by the host. The engine never sees the storage
/// medium, only this contract.
pub trait ProgressStore {
    /// Absence is not an error: implementations hand back the default
    /// snapshot when nothing usable is stored.
    fn load(&mut self) -> ProgressSnapshot;

    fn save(&mut self, snapshot: &ProgressSnapshot) -> Result<(), StoreError>;
}

/// Snapshot store backed by a JSON string in memory. Hosts wrap their real
/// medium (a file, browser storage) around the same shape; tests use it
/// directly.
#[derive(Clone, Debug, Default)]
pub struct JsonMemoryStore {
    slot: Option<String>,
}

impl JsonMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(json: impl Into<String>) -> Self {
        Self {
            slot: Some(json.into()),
        }
    }

    pub fn contents(&self) -> Option<&str> {
        self.slot.as_deref()
    }
}

impl ProgressStore for JsonMemoryStore {
    fn load(&mut self) -> ProgressSnapshot {
        let Some(json) = self.slot.as_deref() else {
            return ProgressSnapshot::default();
        };
        match serde_json::from_str(json) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                log::warn!("discarding malformed progress snapshot: {}", err);
                ProgressSnapshot::default()
            }
        }
    }

    fn save(&mut self, snapshot: &ProgressSnapshot) -> Result<(), StoreError> {
        let json =
            serde_json::to_string(snapshot).map_err(|err| StoreError(err.to_string()))?;
        self.slot = Some(json);
        Ok(())
    }
}
