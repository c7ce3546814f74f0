use crate::error::{PosError, Result};
use crate::types::Pos;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Storage trait for persisting POS records.
///
/// Implementations own name uniqueness: `upsert` must reject a record whose
/// name is already held by a different id with `PosError::DuplicateName`.
#[async_trait]
pub trait PosStorage: Send + Sync {
    /// All records, ordered by id
    async fn get_all(&self) -> Result<Vec<Pos>>;

    /// Fails with `PosError::PosNotFound` if no record has this id
    async fn get_by_id(&self, id: i64) -> Result<Pos>;

    /// Insert or overwrite a record. Assigns an id when absent, sets
    /// `created_at` on insert and refreshes `updated_at` on every write.
    async fn upsert(&self, pos: Pos) -> Result<Pos>;

    /// Delete every record
    async fn clear(&self) -> Result<()>;
}

#[derive(Default)]
struct InMemoryState {
    records: HashMap<i64, Pos>,
    next_id: i64,
}

/// In-memory storage implementation for development/testing
#[derive(Clone, Default)]
pub struct InMemoryPosStorage {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryPosStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, InMemoryState>> {
        self.state.lock().map_err(|e| PosError::Database {
            message: format!("In-memory storage lock poisoned: {e}"),
        })
    }
}

#[async_trait]
impl PosStorage for InMemoryPosStorage {
    async fn get_all(&self) -> Result<Vec<Pos>> {
        let state = self.lock()?;
        let mut all: Vec<Pos> = state.records.values().cloned().collect();
        all.sort_by_key(|p| p.id);
        Ok(all)
    }

    async fn get_by_id(&self, id: i64) -> Result<Pos> {
        let state = self.lock()?;
        state
            .records
            .get(&id)
            .cloned()
            .ok_or(PosError::PosNotFound { id })
    }

    async fn upsert(&self, mut pos: Pos) -> Result<Pos> {
        let mut state = self.lock()?;

        let clash = state
            .records
            .values()
            .any(|existing| existing.name == pos.name && existing.id != pos.id);
        if clash {
            return Err(PosError::DuplicateName { name: pos.name });
        }

        let now = Utc::now();
        let id = match pos.id {
            Some(id) => id,
            None => {
                state.next_id += 1;
                state.next_id
            }
        };
        // Keep the sequence ahead of ids handed in by callers
        state.next_id = state.next_id.max(id);

        pos.id = Some(id);
        pos.created_at = state
            .records
            .get(&id)
            .and_then(|existing| existing.created_at)
            .or(Some(now));
        pos.updated_at = Some(now);

        state.records.insert(id, pos.clone());
        debug!("Stored POS: {} with id {}", pos.name, id);
        Ok(pos)
    }

    async fn clear(&self) -> Result<()> {
        let mut state = self.lock()?;
        state.records.clear();
        debug!("Cleared in-memory POS storage");
        Ok(())
    }
}
