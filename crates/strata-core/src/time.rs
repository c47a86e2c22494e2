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

//! Sample times.

/// A sample time, in the provider's time code units.
pub type Time = f64;

/// Time used when a node has no authored samples.
pub const DEFAULT_TIME: Time = 0.0;

/// The closed range of authored sample times.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    /// First authored time.
    pub start: Time,
    /// Last authored time.
    pub end: Time,
}

impl TimeRange {
    /// Creates a range, swapping the bounds if needed.
    pub fn new(a: Time, b: Time) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    /// The range spanned by `times`, or `None` when empty.
    pub fn spanning(times: impl IntoIterator<Item = Time>) -> Option<Self> {
        times.into_iter().fold(None, |range, t| {
            Some(match range {
                None => Self::new(t, t),
                Some(r) => Self::new(r.start.min(t), r.end.max(t)),
            })
        })
    }

    /// Whether two times resolve to the same held value because both lie
    /// at or beyond the same end of the range.
    pub fn clamps_together(&self, a: Time, b: Time) -> bool {
        (a <= self.start && b <= self.start) || (a >= self.end && b >= self.end)
    }

    /// Merges two optional ranges.
    pub fn union(a: Option<Self>, b: Option<Self>) -> Option<Self> {
        match (a, b) {
            (Some(a), Some(b)) => Some(Self::new(a.start.min(b.start), a.end.max(b.end))),
            (a, None) => a,
            (None, b) => b,
        }
    }
}
