//! Persistent per-season counters. One JSON record per seasonal variant under
//! a fixed storage key; persistence is strictly best-effort. A missing or
//! corrupt record loads as all zeros and a failed save is logged and
//! swallowed, so the engine never depends on storage working.

use serde::{Deserialize, Serialize};

/// Key-value backend boundary. The browser build uses `localStorage`; native
/// tests use an in-memory map.
pub trait KvStorage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), String>;
}

/// Wire shape of the persisted record. Unknown fields are ignored on load and
/// the named ones all default to zero, so older or foreign records still load.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatsRecord {
    pub primary_count: u64,
    pub current_streak: u64,
    pub best_streak: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_played: Option<String>,
}

pub struct StatsStore<B: KvStorage> {
    key: &'static str,
    backend: B,
    record: StatsRecord,
}

impl<B: KvStorage> StatsStore<B> {
    /// Load-or-default: storage and parse failures both yield the zero record
    /// and never abort initialization.
    pub fn load(key: &'static str, backend: B) -> Self {
        let record = backend
            .get(key)
            .and_then(|raw| match serde_json::from_str::<StatsRecord>(&raw) {
                Ok(rec) => Some(rec),
                Err(err) => {
                    log::warn!("stats record at {key} is unreadable, starting fresh: {err}");
                    None
                }
            })
            .unwrap_or_default();
        Self {
            key,
            backend,
            record,
        }
    }

    pub fn record(&self) -> &StatsRecord {
        &self.record
    }

    /// One successful elimination: count and streak go up, best streak tracks
    /// the high-water mark, and the record is written through.
    pub fn record_hit(&mut self, stamp: Option<&str>) {
        self.record.primary_count += 1;
        self.record.current_streak += 1;
        if let Some(stamp) = stamp {
            self.record.last_played = Some(stamp.to_owned());
        }
        self.save();
    }

    /// External miss/timeout signal: the streak starts over. The best streak
    /// is untouched.
    pub fn reset_streak(&mut self) {
        self.record.current_streak = 0;
        self.save();
    }

    /// Explicit full reset, the only path that lowers `primary_count`.
    pub fn reset_all(&mut self) {
        self.record = StatsRecord::default();
        self.save();
    }

    /// Write-through after every mutation. Repairs a stale `best_streak`
    /// (loaded data may predate the invariant) before serializing.
    fn save(&mut self) {
        self.record.best_streak = self.record.best_streak.max(self.record.current_streak);
        match serde_json::to_string(&self.record) {
            Ok(raw) => {
                if let Err(err) = self.backend.set(self.key, &raw) {
                    log::warn!("failed to persist stats at {}: {err}", self.key);
                }
            }
            Err(err) => log::warn!("failed to serialize stats at {}: {err}", self.key),
        }
    }
}
