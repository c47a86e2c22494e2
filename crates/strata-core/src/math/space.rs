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

//! Coordinate-space conversions applied to whole attribute streams.
//!
//! Converting between right- and left-handed conventions negates X. Both
//! helpers work in place so the resampling pipelines can run them over
//! freshly fetched buffers without extra allocations.

use super::{Vec3, Vec4};

/// Types whose X component flips sign under a handedness change.
pub trait InvertX {
    /// Negates the X component.
    fn invert_x(&mut self);
}

impl InvertX for Vec3 {
    #[inline]
    fn invert_x(&mut self) {
        self.x = -self.x;
    }
}

impl InvertX for Vec4 {
    #[inline]
    fn invert_x(&mut self) {
        self.x = -self.x;
    }
}

/// Negates X on every element. Applying it twice restores the input.
pub fn invert_x<T: InvertX>(values: &mut [T]) {
    values.iter_mut().for_each(InvertX::invert_x);
}

/// Multiplies every vector by `factor`.
pub fn scale_uniform(values: &mut [Vec3], factor: f32) {
    for v in values.iter_mut() {
        *v = *v * factor;
    }
}
