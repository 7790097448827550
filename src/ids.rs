use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::domain::FileId;

/// Maps a derived record id to a stable numeric file id. Calling it again with
/// the same id must return the same file id.
pub trait FileIdAllocator: Send + Sync {
    fn ensure_file_id(&self, id: &str) -> FileId;
}

#[derive(Debug, Default)]
pub struct MemoryFileIds {
    inner: Mutex<Allocations>,
}

#[derive(Debug, Default)]
struct Allocations {
    ids: HashMap<String, FileId>,
    last: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileIdSnapshot {
    pub ids: BTreeMap<String, u64>,
}

impl MemoryFileIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: FileIdSnapshot) -> Self {
        let last = snapshot.ids.values().copied().max().unwrap_or(0);
        let ids = snapshot
            .ids
            .into_iter()
            .map(|(id, value)| (id, FileId::new(value)))
            .collect();
        Self {
            inner: Mutex::new(Allocations { ids, last }),
        }
    }

    pub fn snapshot(&self) -> FileIdSnapshot {
        let guard = self.lock();
        FileIdSnapshot {
            ids: guard
                .ids
                .iter()
                .map(|(id, file_id)| (id.clone(), file_id.value()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Allocations> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl FileIdAllocator for MemoryFileIds {
    fn ensure_file_id(&self, id: &str) -> FileId {
        let mut guard = self.lock();
        if let Some(existing) = guard.ids.get(id) {
            return *existing;
        }
        guard.last += 1;
        let file_id = FileId::new(guard.last);
        guard.ids.insert(id.to_string(), file_id);
        file_id
    }
}
