// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Per-node update flags with one generation of history.
//!
//! Mutations raise flags on a pending set. Each call to
//! [`UpdateTracker::advance`] turns the pending set into a new immutable
//! snapshot, pushes it into a two-slot ring (current and previous) and
//! starts an empty pending set. Older generations are dropped.

use bitflags::bitflags;

use crate::time::{Time, TimeRange};

bitflags! {
    /// Edge-triggered per-node state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct UpdateFlags: u32 {
        /// The sample differs from the previously resolved one.
        const SAMPLE_UPDATED = 1 << 0;
        /// Polygon topology was recomputed and differs from before.
        const TOPOLOGY_CHANGED = 1 << 1;
        /// Import settings changed since the last sample.
        const IMPORT_SETTINGS_UPDATED = 1 << 2;
        /// The active variant selection changed.
        const VARIANT_SET_CHANGED = 1 << 3;
        /// The node's payload was loaded.
        const PAYLOAD_LOADED = 1 << 4;
        /// The node's payload was unloaded.
        const PAYLOAD_UNLOADED = 1 << 5;
        /// Resample even if the time did not change.
        const FORCE_UPDATE = 1 << 6;
    }
}

/// Tracks update flags and the last resolved time for one node.
#[derive(Debug, Clone, Default)]
pub struct UpdateTracker {
    pending: UpdateFlags,
    ring: [UpdateFlags; 2],
    head: usize,
    time_prev: Option<Time>,
}

impl UpdateTracker {
    /// Creates a tracker that has never resolved a sample.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises flags for the next [`advance`](Self::advance).
    pub fn raise(&mut self, flags: UpdateFlags) {
        self.pending |= flags;
    }

    /// Flags waiting for the next advance.
    pub fn pending(&self) -> UpdateFlags {
        self.pending
    }

    /// Snapshot of the most recent advance.
    pub fn current(&self) -> UpdateFlags {
        self.ring[self.head]
    }

    /// Snapshot of the advance before that.
    pub fn previous(&self) -> UpdateFlags {
        self.ring[self.head ^ 1]
    }

    /// The time of the most recent advance.
    pub fn last_time(&self) -> Option<Time> {
        self.time_prev
    }

    /// Adds derived flags to the current snapshot while its sample is
    /// still being built.
    pub fn annotate(&mut self, flags: UpdateFlags) {
        self.ring[self.head] |= flags;
    }

    /// Starts a new generation for time `t` and returns its flags.
    ///
    /// `SAMPLE_UPDATED` is set unless the time resolves to the same held
    /// value as the previous one: the same time, no authored range at all,
    /// or both times clamped against the same end of `range`. The first
    /// advance always updates.
    pub fn advance(&mut self, t: Time, range: Option<TimeRange>) -> UpdateFlags {
        let mut flags = std::mem::take(&mut self.pending);

        if !flags.intersects(UpdateFlags::SAMPLE_UPDATED | UpdateFlags::FORCE_UPDATE) {
            let unchanged = match self.time_prev {
                None => false,
                Some(prev) => {
                    t == prev || range.map_or(true, |r| r.clamps_together(t, prev))
                }
            };
            flags.set(UpdateFlags::SAMPLE_UPDATED, !unchanged);
        } else {
            flags.insert(UpdateFlags::SAMPLE_UPDATED);
        }

        self.head ^= 1;
        self.ring[self.head] = flags;
        self.time_prev = Some(t);
        flags
    }
}
