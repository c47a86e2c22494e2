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

//! Vertex-budgeted partitioning of a triangulated mesh.
//!
//! A submesh owns a contiguous run of at most `split_unit` triangle corners.
//! Its vertex streams are fully flattened (one value per triangle corner)
//! and its index buffer is the identity over them. Each stream is gathered
//! through the corner map when the source stream is already stored per
//! polygon corner, and through the vertex map otherwise.

use std::ops::Range;

use bitflags::bitflags;
use strata_core::math::{Aabb, Vec2, Vec3, Vec4};

use super::sample::{copy_stream, MeshSample};
use super::skin::{Weights4, Weights8};

bitflags! {
    /// Vertex streams stored per polygon corner instead of per point.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FlattenedAttributes: u32 {
        /// Positions.
        const POINTS = 1 << 0;
        /// Normals.
        const NORMALS = 1 << 1;
        /// Colors.
        const COLORS = 1 << 2;
        /// Texture coordinates.
        const UVS = 1 << 3;
        /// Tangents.
        const TANGENTS = 1 << 4;
        /// Velocities.
        const VELOCITIES = 1 << 5;
        /// Skin records.
        const WEIGHTS = 1 << 6;
    }
}

impl FlattenedAttributes {
    /// Classifies every stream of `sample` by comparing its length with the
    /// polygon corner count.
    pub fn of(sample: &MeshSample) -> Self {
        let n = sample.num_indices;
        let mut flags = Self::empty();
        if n == 0 {
            return flags;
        }
        flags.set(Self::POINTS, sample.points.len() == n);
        flags.set(Self::NORMALS, sample.normals.len() == n);
        flags.set(Self::COLORS, sample.colors.len() == n);
        flags.set(Self::UVS, sample.uvs.len() == n);
        flags.set(Self::TANGENTS, sample.tangents.len() == n);
        flags.set(Self::VELOCITIES, sample.velocities.len() == n);
        flags.set(
            Self::WEIGHTS,
            sample.weights4.len() == n || sample.weights8.len() == n,
        );
        flags
    }
}

/// A self-contained slice of triangulated geometry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Submesh {
    /// Local triangle indices, `0..len`.
    pub indices: Vec<u32>,
    /// Positions.
    pub points: Vec<Vec3>,
    /// Normals.
    pub normals: Vec<Vec3>,
    /// Colors.
    pub colors: Vec<Vec4>,
    /// Texture coordinates.
    pub uvs: Vec<Vec2>,
    /// Tangents.
    pub tangents: Vec<Vec4>,
    /// Velocities.
    pub velocities: Vec<Vec3>,
    /// Four-wide skin records.
    pub weights4: Vec<Weights4>,
    /// Eight-wide skin records.
    pub weights8: Vec<Weights8>,
    /// Bounds of `points`.
    pub bounds: Aabb,
}

impl Submesh {
    /// Number of (flattened) vertices.
    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    /// Center of the bounds.
    pub fn center(&self) -> Vec3 {
        self.bounds.center()
    }

    /// Half-size of the bounds.
    pub fn extents(&self) -> Vec3 {
        self.bounds.half_extents()
    }

    /// Copies `src` into this submesh, reusing its allocations.
    pub fn copy_from(&mut self, src: &Submesh) {
        copy_stream(&mut self.indices, &src.indices);
        copy_stream(&mut self.points, &src.points);
        copy_stream(&mut self.normals, &src.normals);
        copy_stream(&mut self.colors, &src.colors);
        copy_stream(&mut self.uvs, &src.uvs);
        copy_stream(&mut self.tangents, &src.tangents);
        copy_stream(&mut self.velocities, &src.velocities);
        copy_stream(&mut self.weights4, &src.weights4);
        copy_stream(&mut self.weights8, &src.weights8);
        self.bounds = src.bounds;
    }
}

/// Copies `src[map[i]]` for every `i` in `range`; empty sources stay empty.
fn gather<T: Copy + Default>(dst: &mut Vec<T>, src: &[T], map: &[u32], range: Range<usize>) {
    dst.clear();
    if src.is_empty() {
        return;
    }
    dst.extend(
        map[range]
            .iter()
            .map(|&i| src.get(i as usize).copied().unwrap_or_default()),
    );
}

/// Owns a node's submeshes across samples.
///
/// Backing storage only grows, so a node that once needed `k` submeshes
/// never reallocates them again; the live count is tracked separately.
#[derive(Debug, Default)]
pub struct SubmeshSplitter {
    submeshes: Vec<Submesh>,
    live: usize,
}

impl SubmeshSplitter {
    /// A splitter with no submeshes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `sample` must be split: some stream is stored per corner,
    /// or the point count reaches `split_unit`.
    pub fn needs_split(
        sample: &MeshSample,
        flattened: FlattenedAttributes,
        split_unit: usize,
    ) -> bool {
        split_unit > 0 && (!flattened.is_empty() || sample.points.len() >= split_unit)
    }

    /// Number of submeshes covering `num_corners` triangle corners.
    pub fn submesh_count(num_corners: usize, split_unit: usize) -> usize {
        if split_unit == 0 {
            0
        } else {
            num_corners.div_ceil(split_unit)
        }
    }

    /// The live submeshes.
    pub fn submeshes(&self) -> &[Submesh] {
        &self.submeshes[..self.live]
    }

    /// Allocated submeshes, live or not.
    pub fn capacity(&self) -> usize {
        self.submeshes.len()
    }

    /// Marks every submesh dead without freeing it.
    pub fn clear(&mut self) {
        self.live = 0;
    }

    /// Partitions the triangle corners of `sample` into submeshes of at most
    /// `split_unit` corners and returns how many are live.
    ///
    /// `sample.indices_triangulated` must be current, and so must
    /// `sample.indices_flattened_triangulated` when `flattened` is not empty.
    pub fn split(
        &mut self,
        sample: &MeshSample,
        flattened: FlattenedAttributes,
        split_unit: usize,
    ) -> usize {
        let total = sample
            .num_indices_triangulated
            .min(sample.indices_triangulated.len());
        self.live = Self::submesh_count(total, split_unit);
        if self.live > self.submeshes.len() {
            self.submeshes.resize_with(self.live, Submesh::default);
        }

        let vertex_map = &sample.indices_triangulated[..];
        let corner_map = &sample.indices_flattened_triangulated[..];
        let select = |flag: FlattenedAttributes| {
            if flattened.contains(flag) && corner_map.len() >= total {
                corner_map
            } else {
                vertex_map
            }
        };

        for (nth, sms) in self.submeshes[..self.live].iter_mut().enumerate() {
            let begin = split_unit * nth;
            let end = (split_unit * (nth + 1)).min(total);
            let range = begin..end;

            sms.indices.clear();
            sms.indices.extend(0..(end - begin) as u32);

            use FlattenedAttributes as F;
            gather(&mut sms.points, &sample.points, select(F::POINTS), range.clone());
            gather(&mut sms.normals, &sample.normals, select(F::NORMALS), range.clone());
            gather(&mut sms.colors, &sample.colors, select(F::COLORS), range.clone());
            gather(&mut sms.uvs, &sample.uvs, select(F::UVS), range.clone());
            gather(&mut sms.tangents, &sample.tangents, select(F::TANGENTS), range.clone());
            gather(&mut sms.velocities, &sample.velocities, select(F::VELOCITIES), range.clone());
            gather(&mut sms.weights4, &sample.weights4, select(F::WEIGHTS), range.clone());
            gather(&mut sms.weights8, &sample.weights8, select(F::WEIGHTS), range);

            sms.bounds = Aabb::from_points(&sms.points).unwrap_or_default();
        }

        log::trace!("split {total} triangle corners into {} submeshes", self.live);
        self.live
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::triangulate::{count_indices, triangulate};

    /// A strip of `n` quads along X, with per-point colors.
    fn strip(n: usize) -> MeshSample {
        let mut sample = MeshSample::default();
        for i in 0..=n {
            sample.points.push(Vec3::new(i as f32, 0.0, 0.0));
            sample.points.push(Vec3::new(i as f32, 1.0, 0.0));
        }
        for i in 0..n as u32 {
            sample.counts.push(4);
            sample
                .indices
                .extend_from_slice(&[2 * i, 2 * i + 2, 2 * i + 3, 2 * i + 1]);
        }
        sample.colors = (0..sample.points.len())
            .map(|i| Vec4::new(i as f32, 0.0, 0.0, 1.0))
            .collect();
        let (corners, triangulated) = count_indices(&sample.counts);
        sample.num_indices = corners;
        sample.num_indices_triangulated = triangulated;
        triangulate(
            &sample.counts,
            Some(&sample.indices),
            false,
            &mut sample.indices_triangulated,
        )
        .unwrap();
        sample
    }

    #[test]
    fn test_partition_covers_every_corner_once() {
        let sample = strip(10);
        let total = sample.num_indices_triangulated;
        for split_unit in [1, 3, 7, 12, 59, 60, 61, 1000] {
            let mut splitter = SubmeshSplitter::new();
            let count = splitter.split(&sample, FlattenedAttributes::empty(), split_unit);
            assert_eq!(count, total.div_ceil(split_unit), "split_unit {split_unit}");

            let sizes: Vec<usize> = splitter.submeshes().iter().map(|s| s.indices.len()).collect();
            assert_eq!(sizes.iter().sum::<usize>(), total);
            assert!(sizes.iter().all(|&n| n <= split_unit));

            let gathered: Vec<Vec3> = splitter
                .submeshes()
                .iter()
                .flat_map(|s| s.points.iter().copied())
                .collect();
            let expected: Vec<Vec3> = sample
                .indices_triangulated
                .iter()
                .map(|&i| sample.points[i as usize])
                .collect();
            assert_eq!(gathered, expected);

            for s in splitter.submeshes() {
                let identity: Vec<u32> = (0..s.indices.len() as u32).collect();
                assert_eq!(s.indices, identity);
            }
        }
    }

    #[test]
    fn test_flattened_stream_uses_corner_map() {
        let mut sample = strip(2);
        // Per-corner colors: corner c gets red = 100 + c.
        sample.colors = (0..sample.num_indices)
            .map(|c| Vec4::new(100.0 + c as f32, 0.0, 0.0, 1.0))
            .collect();
        triangulate(
            &sample.counts,
            None,
            false,
            &mut sample.indices_flattened_triangulated,
        )
        .unwrap();

        let flattened = FlattenedAttributes::of(&sample);
        assert_eq!(flattened, FlattenedAttributes::COLORS);
        assert!(SubmeshSplitter::needs_split(&sample, flattened, 1000));

        let mut splitter = SubmeshSplitter::new();
        assert_eq!(splitter.split(&sample, flattened, 1000), 1);
        let sms = &splitter.submeshes()[0];
        // First quad's second triangle is corners (0, 2, 3).
        let reds: Vec<f32> = sms.colors.iter().map(|c| c.x).collect();
        assert_eq!(&reds[..6], &[100.0, 101.0, 102.0, 100.0, 102.0, 103.0]);
        // Points stay vertex-indexed.
        assert_eq!(sms.points[1], sample.points[2]);
    }

    #[test]
    fn test_small_mesh_without_flattening_is_not_split() {
        let sample = strip(2);
        let flattened = FlattenedAttributes::of(&sample);
        assert!(flattened.is_empty());
        assert!(!SubmeshSplitter::needs_split(&sample, flattened, 1000));
        assert!(SubmeshSplitter::needs_split(&sample, flattened, sample.points.len()));
        assert!(!SubmeshSplitter::needs_split(&sample, flattened, 0));
    }

    #[test]
    fn test_capacity_never_shrinks() {
        let sample = strip(10);
        let mut splitter = SubmeshSplitter::new();
        splitter.split(&sample, FlattenedAttributes::empty(), 6);
        assert_eq!(splitter.capacity(), 10);

        splitter.split(&sample, FlattenedAttributes::empty(), 30);
        assert_eq!(splitter.submeshes().len(), 2);
        assert_eq!(splitter.capacity(), 10);

        splitter.clear();
        assert!(splitter.submeshes().is_empty());
        assert_eq!(splitter.capacity(), 10);
    }

    #[test]
    fn test_submesh_bounds_cover_own_points() {
        let sample = strip(4);
        let mut splitter = SubmeshSplitter::new();
        splitter.split(&sample, FlattenedAttributes::empty(), 6);
        let first = &splitter.submeshes()[0];
        assert_eq!(first.bounds.min, Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(first.bounds.max, Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(first.center(), Vec3::new(0.5, 0.5, 0.0));
    }
}
