//! # Document Store
//! Per-user partitions of [`EntryRecord`]s keyed by date, plus user profiles.
//!
//! - `MemoryStore`: process-local maps behind an `RwLock`.
//! - `FileStore`: a `MemoryStore` mirrored to a JSON snapshot file (temp file + rename),
//!   loaded back on startup. A write reaches memory only after its snapshot is on disk.
//!
//! The store keeps whatever score bundle it is handed; it never re-scores.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::entry::EntryRecord;
use crate::error::StoreError;
use crate::profile::UserProfile;

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_profile(&self, user_id: &str) -> StoreResult<Option<UserProfile>>;

    async fn put_profile(&self, profile: UserProfile) -> StoreResult<()>;

    /// All registered profiles, ordered by user id.
    async fn list_profiles(&self) -> StoreResult<Vec<UserProfile>>;

    async fn get_entry(&self, user_id: &str, date: NaiveDate) -> StoreResult<Option<EntryRecord>>;

    /// Whole-record replace keyed by `(record.user_id, record.date)`.
    async fn upsert_entry(&self, record: EntryRecord) -> StoreResult<()>;

    /// Most recent `limit` records, date descending.
    async fn recent_entries(&self, user_id: &str, limit: usize) -> StoreResult<Vec<EntryRecord>>;

    /// Records with `from <= date <= to`, date descending.
    async fn entries_between(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<EntryRecord>>;
}

#[derive(Debug, Default, Clone)]
struct Partitions {
    profiles: BTreeMap<String, UserProfile>,
    entries: HashMap<String, BTreeMap<NaiveDate, EntryRecord>>,
}

impl Partitions {
    fn put_profile(&mut self, profile: UserProfile) {
        self.profiles.insert(profile.user_id.clone(), profile);
    }

    fn upsert_entry(&mut self, record: EntryRecord) {
        self.entries
            .entry(record.user_id.clone())
            .or_default()
            .insert(record.date, record);
    }

    fn to_snapshot(&self) -> Snapshot {
        let mut users: Vec<&String> = self.entries.keys().collect();
        users.sort();
        Snapshot {
            profiles: self.profiles.values().cloned().collect(),
            entries: users
                .into_iter()
                .flat_map(|u| self.entries[u].values().cloned())
                .collect(),
        }
    }
}

/// On-disk shape of a [`FileStore`] snapshot.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    profiles: Vec<UserProfile>,
    #[serde(default)]
    entries: Vec<EntryRecord>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Partitions>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn from_snapshot(snap: Snapshot) -> Self {
        let mut parts = Partitions::default();
        for p in snap.profiles {
            parts.put_profile(p);
        }
        for rec in snap.entries {
            parts.upsert_entry(rec);
        }
        Self {
            inner: RwLock::new(parts),
        }
    }

    /// Snapshot of the state `change` would produce; the live maps are left untouched.
    fn snapshot_after(&self, change: impl FnOnce(&mut Partitions)) -> Snapshot {
        let mut next = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        change(&mut next);
        next.to_snapshot()
    }

    fn read_user<T>(
        &self,
        user_id: &str,
        f: impl FnOnce(&BTreeMap<NaiveDate, EntryRecord>) -> T,
    ) -> Option<T> {
        let g = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        g.entries.get(user_id).map(f)
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn get_profile(&self, user_id: &str) -> StoreResult<Option<UserProfile>> {
        let g = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(g.profiles.get(user_id).cloned())
    }

    async fn put_profile(&self, profile: UserProfile) -> StoreResult<()> {
        let mut g = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        g.put_profile(profile);
        Ok(())
    }

    async fn list_profiles(&self) -> StoreResult<Vec<UserProfile>> {
        let g = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(g.profiles.values().cloned().collect())
    }

    async fn get_entry(&self, user_id: &str, date: NaiveDate) -> StoreResult<Option<EntryRecord>> {
        Ok(self
            .read_user(user_id, |m| m.get(&date).cloned())
            .flatten())
    }

    async fn upsert_entry(&self, record: EntryRecord) -> StoreResult<()> {
        let mut g = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        g.upsert_entry(record);
        Ok(())
    }

    async fn recent_entries(&self, user_id: &str, limit: usize) -> StoreResult<Vec<EntryRecord>> {
        Ok(self
            .read_user(user_id, |m| m.values().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn entries_between(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<EntryRecord>> {
        if from > to {
            return Ok(Vec::new());
        }
        Ok(self
            .read_user(user_id, |m| {
                m.range(from..=to).rev().map(|(_, r)| r.clone()).collect()
            })
            .unwrap_or_default())
    }
}

/// `MemoryStore` persisted to a single JSON snapshot.
#[derive(Debug)]
pub struct FileStore {
    memory: MemoryStore,
    path: PathBuf,
    /// Serializes write + flush so snapshots land in write order.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Load the snapshot at `path`; a missing file starts an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let snap = match tokio::fs::read_to_string(&path).await {
            Ok(s) if s.trim().is_empty() => Snapshot::default(),
            Ok(s) => serde_json::from_str(&s)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Snapshot::default(),
            Err(e) => return Err(e.into()),
        };
        tracing::info!(
            path = %path.display(),
            profiles = snap.profiles.len(),
            entries = snap.entries.len(),
            "file store loaded"
        );
        Ok(Self {
            memory: MemoryStore::from_snapshot(snap),
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn flush(&self, snap: &Snapshot) -> StoreResult<()> {
        let json = serde_json::to_vec_pretty(snap)?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl DocumentStore for FileStore {
    async fn get_profile(&self, user_id: &str) -> StoreResult<Option<UserProfile>> {
        self.memory.get_profile(user_id).await
    }

    async fn put_profile(&self, profile: UserProfile) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let snap = self.memory.snapshot_after(|p| p.put_profile(profile.clone()));
        self.flush(&snap).await?;
        self.memory.put_profile(profile).await
    }

    async fn list_profiles(&self) -> StoreResult<Vec<UserProfile>> {
        self.memory.list_profiles().await
    }

    async fn get_entry(&self, user_id: &str, date: NaiveDate) -> StoreResult<Option<EntryRecord>> {
        self.memory.get_entry(user_id, date).await
    }

    async fn upsert_entry(&self, record: EntryRecord) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let snap = self.memory.snapshot_after(|p| p.upsert_entry(record.clone()));
        self.flush(&snap).await?;
        self.memory.upsert_entry(record).await
    }

    async fn recent_entries(&self, user_id: &str, limit: usize) -> StoreResult<Vec<EntryRecord>> {
        self.memory.recent_entries(user_id, limit).await
    }

    async fn entries_between(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<EntryRecord>> {
        self.memory.entries_between(user_id, from, to).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::RawEntry;
    use crate::profile::Role;
    use chrono::Utc;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    fn rec(user: &str, day: u32, read_mins: u32) -> EntryRecord {
        let raw = RawEntry::new().with("readSpMins", read_mins.to_string());
        EntryRecord::from_submission(user, d(day), raw, Utc::now())
    }

    #[tokio::test]
    async fn upsert_replaces_the_whole_record() {
        let s = MemoryStore::new();
        s.upsert_entry(rec("a", 1, 20)).await.unwrap();
        s.upsert_entry(rec("a", 1, 0)).await.unwrap();

        let got = s.get_entry("a", d(1)).await.unwrap().unwrap();
        assert_eq!(got.entry.scripture_reading_minutes, 0);
        assert_eq!(s.recent_entries("a", 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn recent_entries_are_date_descending_and_limited() {
        let s = MemoryStore::new();
        for day in [3, 1, 7, 5] {
            s.upsert_entry(rec("a", day, 5)).await.unwrap();
        }
        s.upsert_entry(rec("b", 9, 5)).await.unwrap();

        let dates: Vec<_> = s
            .recent_entries("a", 3)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.date)
            .collect();
        assert_eq!(dates, vec![d(7), d(5), d(3)]);
        assert!(s.recent_entries("nobody", 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn entries_between_is_inclusive() {
        let s = MemoryStore::new();
        for day in 1..=6 {
            s.upsert_entry(rec("a", day, 5)).await.unwrap();
        }
        let dates: Vec<_> = s
            .entries_between("a", d(2), d(4))
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.date)
            .collect();
        assert_eq!(dates, vec![d(4), d(3), d(2)]);
        assert!(s.entries_between("a", d(4), d(2)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn partitions_are_per_user() {
        let s = MemoryStore::new();
        s.upsert_entry(rec("a", 1, 5)).await.unwrap();
        assert!(s.get_entry("b", d(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn profiles_list_in_user_id_order() {
        let s = MemoryStore::new();
        for id in ["zed", "amy", "kim"] {
            s.put_profile(UserProfile {
                user_id: id.into(),
                email: None,
                display_name: None,
                photo_url: None,
                role: Role::Standard,
            })
            .await
            .unwrap();
        }
        let ids: Vec<_> = s
            .list_profiles()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.user_id)
            .collect();
        assert_eq!(ids, vec!["amy", "kim", "zed"]);
    }
}
