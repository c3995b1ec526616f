/*
    orrery, satellite trajectory propagation
    Copyright (C) 2018-onwards Christopher Rabotin <christopher.rabotin@gmail.com>

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use super::BodyId;
use crate::linalg::Vector3;
use crate::time::Epoch;
use std::collections::{HashMap, VecDeque};

type CacheKey = (BodyId, i128);

/// Caller-owned, bounded memoization of the state of bodies relative to their parent, keyed by (body, epoch).
///
/// When full, the entry inserted first is evicted.
#[derive(Clone, Debug)]
pub struct EphemerisCache {
    capacity: usize,
    entries: HashMap<CacheKey, (Vector3<f64>, Vector3<f64>)>,
    order: VecDeque<CacheKey>,
    hits: usize,
    misses: usize,
}

impl EphemerisCache {
    /// Builds a cache holding at most `capacity` states (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            hits: 0,
            misses: 0,
        }
    }

    fn key(id: BodyId, epoch: Epoch) -> CacheKey {
        (id, epoch.to_tdb_duration().total_nanoseconds())
    }

    /// Returns the cached position and velocity of this body at this exact epoch, if any.
    pub fn get(&mut self, id: BodyId, epoch: Epoch) -> Option<(Vector3<f64>, Vector3<f64>)> {
        let found = self.entries.get(&Self::key(id, epoch)).copied();
        if found.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        found
    }

    pub fn insert(
        &mut self,
        id: BodyId,
        epoch: Epoch,
        position_km: Vector3<f64>,
        velocity_km_s: Vector3<f64>,
    ) {
        let key = Self::key(id, epoch);
        if self
            .entries
            .insert(key, (position_km, velocity_km_s))
            .is_none()
        {
            self.order.push_back(key);
            while self.order.len() > self.capacity {
                if let Some(oldest) = self.order.pop_front() {
                    self.entries.remove(&oldest);
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of lookups which found (resp. did not find) a state.
    pub fn stats(&self) -> (usize, usize) {
        (self.hits, self.misses)
    }
}

impl Default for EphemerisCache {
    fn default() -> Self {
        Self::new(1024)
    }
}
