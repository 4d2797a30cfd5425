use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use thiserror::Error;
use verdict_logging::{verdict_debug, verdict_trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("mutation was superseded or already resolved")]
pub struct StaleMutation;

/// Proof of one tentative write; resolves through `commit` or `rollback`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationHandle<K> {
    key: K,
    generation: u64,
}

impl<K> MutationHandle<K> {
    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Issued before a read of confirmed state; its result is dropped if the slot moved on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket<K> {
    key: K,
    generation: u64,
}

impl<K> FetchTicket<K> {
    pub fn key(&self) -> &K {
        &self.key
    }
}

#[derive(Debug, Clone, Default)]
struct Slot<V> {
    value: V,
    generation: u64,
    // Last confirmed value while a mutation is in flight.
    snapshot: Option<V>,
}

/// Keyed slots that accept tentative writes and later reconcile them.
///
/// Each slot holds at most one live mutation. Applying a second one before the
/// first resolves supersedes it: the first handle goes stale and the
/// confirmed snapshot is carried over, so a rollback never resurrects the
/// superseded tentative value.
#[derive(Debug, Clone)]
pub struct OptimisticStore<K, V> {
    slots: HashMap<K, Slot<V>>,
}

impl<K, V> Default for OptimisticStore<K, V> {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }
}

impl<K, V> OptimisticStore<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone + Default,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.slots.get(key).map(|slot| &slot.value)
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.slots
            .get(key)
            .is_some_and(|slot| slot.snapshot.is_some())
    }

    pub fn apply(&mut self, key: K, tentative: V) -> MutationHandle<K> {
        let slot = self.slots.entry(key.clone()).or_default();
        slot.generation = slot.generation.wrapping_add(1);
        let previous = std::mem::replace(&mut slot.value, tentative);
        if slot.snapshot.is_none() {
            slot.snapshot = Some(previous);
        } else {
            verdict_debug!("Superseding in-flight mutation on {:?}", key);
        }
        verdict_trace!("Applied tentative value on {:?} gen={}", key, slot.generation);
        MutationHandle {
            key,
            generation: slot.generation,
        }
    }

    pub fn commit(&mut self, handle: &MutationHandle<K>, final_value: V) -> Result<(), StaleMutation> {
        let slot = self.live_slot(handle)?;
        slot.snapshot = None;
        slot.value = final_value;
        slot.generation = slot.generation.wrapping_add(1);
        verdict_trace!("Committed mutation on {:?}", handle.key);
        Ok(())
    }

    pub fn rollback(&mut self, handle: &MutationHandle<K>) -> Result<(), StaleMutation> {
        let slot = self.live_slot(handle)?;
        let snapshot = slot.snapshot.take().ok_or(StaleMutation)?;
        slot.value = snapshot;
        slot.generation = slot.generation.wrapping_add(1);
        verdict_debug!("Rolled back mutation on {:?}", handle.key);
        Ok(())
    }

    pub fn begin_fetch(&self, key: K) -> FetchTicket<K> {
        let generation = self.slots.get(&key).map_or(0, |slot| slot.generation);
        FetchTicket { key, generation }
    }

    /// Stores fetched confirmed state; returns `false` when the result is stale.
    pub fn finish_fetch(&mut self, ticket: FetchTicket<K>, value: V) -> bool {
        let slot = self.slots.entry(ticket.key.clone()).or_default();
        if slot.generation != ticket.generation || slot.snapshot.is_some() {
            verdict_debug!("Dropping stale fetch for {:?}", ticket.key);
            return false;
        }
        slot.value = value;
        true
    }

    fn live_slot(&mut self, handle: &MutationHandle<K>) -> Result<&mut Slot<V>, StaleMutation> {
        match self.slots.get_mut(&handle.key) {
            Some(slot) if slot.generation == handle.generation && slot.snapshot.is_some() => {
                Ok(slot)
            }
            _ => Err(StaleMutation),
        }
    }
}
