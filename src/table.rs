use std::mem;

use crate::config::ElasticHashParams;
use crate::error::{ElasticHashError, Result};
use crate::hash::{hash_pair, probe_index};
use crate::iter::Iter;
use crate::layout::build_layout;
use crate::slot::Slot;
use crate::stats::LevelStats;
use crate::subarray::SubArray;

/// Smaller requests are floored to this capacity (§6).
const MIN_TOTAL_CAPACITY: usize = 64;

/// An in-memory hash table implementing elastic hashing: a geometric
/// sequence of open-addressed sub-arrays, probed with a load-dependent
/// budget, grown by doubling and compacted by tombstone-triggered rebuilds.
///
/// Keys and values are opaque byte strings; the table owns copies of both
/// and never reorders a key once inserted.
pub struct ElasticHashTable {
    levels: Vec<SubArray>,
    total_capacity: usize,
    count: usize,
    params: ElasticHashParams,
}

impl ElasticHashTable {
    /// Creates a table with default parameters and at least `requested_capacity`
    /// slots (floored to 64).
    pub fn new(requested_capacity: usize) -> Result<Self> {
        Self::with_params(requested_capacity, ElasticHashParams::default())
    }

    /// Creates a table with explicit rebuild/layout parameters.
    pub fn with_params(requested_capacity: usize, params: ElasticHashParams) -> Result<Self> {
        let total_capacity = requested_capacity.max(MIN_TOTAL_CAPACITY);
        let levels = Self::build_levels(total_capacity, params.min_level_size)?;
        Ok(Self {
            levels,
            total_capacity,
            count: 0,
            params,
        })
    }

    fn build_levels(total_capacity: usize, min_level_size: usize) -> Result<Vec<SubArray>> {
        let capacities = build_layout(total_capacity, min_level_size);
        let mut levels = Vec::with_capacity(capacities.len());
        for (level, capacity) in capacities.into_iter().enumerate() {
            levels.push(SubArray::new(level, capacity)?);
        }
        Ok(levels)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Total slot count across all sub-arrays.
    pub fn capacity(&self) -> usize {
        self.total_capacity
    }

    /// Number of sub-arrays (levels) currently in the layout.
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// Per-level occupancy snapshot, in construction order (level 0 first).
    pub fn level_stats(&self) -> Vec<LevelStats> {
        self.levels
            .iter()
            .map(|sub| LevelStats {
                level: sub.level,
                capacity: sub.capacity,
                live: sub.live,
                tombstones: sub.tombstones,
            })
            .collect()
    }

    fn total_tombstones(&self) -> usize {
        self.levels.iter().map(|sub| sub.tombstones).sum()
    }

    /// Runs Find (§4.4): locates `key`, returning its (level, slot) if present.
    fn find(&self, key: &[u8]) -> Option<(usize, usize)> {
        for (level_idx, sub) in self.levels.iter().enumerate() {
            let (h1, h2) = hash_pair(key, level_idx);
            let budget = sub.probe_budget();
            for attempt in 0..budget {
                let idx = probe_index(h1, h2, attempt, sub.capacity);
                match &sub.slots[idx] {
                    Slot::Occupied { key: k, .. } if k.as_slice() == key => {
                        return Some((level_idx, idx));
                    }
                    Slot::Empty => break,
                    _ => continue,
                }
            }
        }
        None
    }

    /// Looks up `key`, returning a borrow of its value tied to `&self`.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        let (level, idx) = self.find(key)?;
        match &self.levels[level].slots[idx] {
            Slot::Occupied { value, .. } => Some(value.as_slice()),
            _ => unreachable!("find returned a non-occupied slot"),
        }
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.find(key).is_some()
    }

    /// Inserts `key` → `value`, replacing and returning any previous value.
    pub fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<Option<Vec<u8>>> {
        if let Some((level, idx)) = self.find(key) {
            match &mut self.levels[level].slots[idx] {
                Slot::Occupied { value: slot_value, .. } => {
                    return Ok(Some(mem::replace(slot_value, value.to_vec())));
                }
                _ => unreachable!("find returned a non-occupied slot"),
            }
        }

        let load_threshold = (self.total_capacity as f64 * self.params.max_load).floor() as usize;
        if self.count >= load_threshold {
            log::debug!(
                "rebuild triggered by load ({}/{} entries): doubling capacity {} -> {}",
                self.count,
                self.total_capacity,
                self.total_capacity,
                self.total_capacity * 2
            );
            self.rebuild(self.total_capacity * 2)?;
        }

        let tombstone_threshold =
            (self.total_capacity as f64 * self.params.tombstone_ratio).floor() as usize;
        if self.total_tombstones() >= tombstone_threshold {
            log::debug!(
                "rebuild triggered by tombstone ratio ({} tombstones / {} capacity): compacting at capacity {}",
                self.total_tombstones(),
                self.total_capacity,
                self.total_capacity
            );
            self.rebuild(self.total_capacity)?;
        }

        if self.try_place(key, value) {
            return Ok(None);
        }

        log::debug!(
            "rebuild triggered by cascade exhaustion: doubling capacity {} -> {}",
            self.total_capacity,
            self.total_capacity * 2
        );
        self.rebuild(self.total_capacity * 2)?;
        let placed = self.try_place(key, value);
        debug_assert!(placed, "cascade insert failed immediately after rebuild");
        Ok(None)
    }

    /// Cascades `key`/`value` through the levels, placing it in the first
    /// empty or tombstone slot its probe budget reaches (§4.5 step 5).
    fn try_place(&mut self, key: &[u8], value: &[u8]) -> bool {
        for level_idx in 0..self.levels.len() {
            let (h1, h2) = hash_pair(key, level_idx);
            let sub = &mut self.levels[level_idx];
            let budget = sub.probe_budget();
            for attempt in 0..budget {
                let idx = probe_index(h1, h2, attempt, sub.capacity);
                match &sub.slots[idx] {
                    Slot::Empty => {
                        sub.slots[idx] = Slot::Occupied {
                            key: key.to_vec(),
                            value: value.to_vec(),
                        };
                        sub.live += 1;
                        self.count += 1;
                        return true;
                    }
                    Slot::Tombstone => {
                        sub.slots[idx] = Slot::Occupied {
                            key: key.to_vec(),
                            value: value.to_vec(),
                        };
                        sub.tombstones -= 1;
                        sub.live += 1;
                        self.count += 1;
                        return true;
                    }
                    Slot::Occupied { .. } => continue,
                }
            }
        }
        false
    }

    /// Removes `key`, tombstoning its slot. Returns whether it was present.
    pub fn remove(&mut self, key: &[u8]) -> bool {
        let Some((level, idx)) = self.find(key) else {
            return false;
        };
        let sub = &mut self.levels[level];
        sub.slots[idx] = Slot::Tombstone;
        sub.live -= 1;
        sub.tombstones += 1;
        self.count -= 1;
        true
    }

    /// Iterates every live `(key, value)` pair, in (level, slot) order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            levels: &self.levels,
            level_idx: 0,
            slot_idx: 0,
        }
    }

    /// Atomically replaces the level layout with one sized for
    /// `new_capacity`, moving every live entry's owned buffers across
    /// without copying (§4.8).
    fn rebuild(&mut self, new_capacity: usize) -> Result<()> {
        let mut drained: Vec<(Vec<u8>, Vec<u8>)> = Vec::new();
        drained
            .try_reserve_exact(self.count)
            .map_err(|_| ElasticHashError::AllocationFailure)?;

        for sub in &mut self.levels {
            for slot in &mut sub.slots {
                if slot.is_empty() {
                    continue;
                }
                if let Slot::Occupied { .. } = slot {
                    if let Slot::Occupied { key, value } = mem::replace(slot, Slot::Empty) {
                        drained.push((key, value));
                    }
                }
            }
        }

        let new_levels = match Self::build_levels(new_capacity, self.params.min_level_size) {
            Ok(levels) => levels,
            Err(err) => {
                // Step 4 failed after step 3 drained the old levels: the
                // table must be left empty but valid, so the drained
                // payloads are simply dropped here.
                self.levels = Vec::new();
                self.total_capacity = 0;
                self.count = 0;
                return Err(err);
            }
        };

        self.levels = new_levels;
        self.total_capacity = new_capacity;
        self.count = 0;

        let drained_len = drained.len();
        for (key, value) in drained {
            let placed = self.try_place(&key, &value);
            debug_assert!(placed, "rebuild failed to reinsert a drained entry");
        }

        log::debug!(
            "rebuild complete: {} levels, {} entries reinserted",
            self.levels.len(),
            drained_len
        );

        Ok(())
    }
}

impl<'a> IntoIterator for &'a ElasticHashTable {
    type Item = (&'a [u8], &'a [u8]);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
