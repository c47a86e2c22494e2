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

//! Resampled mesh buffers and the read-side views over them.

use strata_core::math::{Aabb, Mat4, Vec2, Vec3, Vec4};
use strata_core::TimeRange;

use super::skin::{Weights4, Weights8};
use super::submesh::Submesh;

/// Replaces the contents of `dst` with `src`, keeping its allocation.
#[inline]
pub(crate) fn copy_stream<T: Clone>(dst: &mut Vec<T>, src: &[T]) {
    dst.clear();
    dst.extend_from_slice(src);
}

/// Every buffer a mesh node produces for one time sample.
///
/// Vertex streams are indexed by point unless their length equals
/// `num_indices`, in which case they are stored per polygon corner.
#[derive(Debug, Clone, Default)]
pub struct MeshSample {
    /// Vertex positions.
    pub points: Vec<Vec3>,
    /// Vertex velocities.
    pub velocities: Vec<Vec3>,
    /// Normals, authored or synthesized.
    pub normals: Vec<Vec3>,
    /// Tangents with the bitangent sign in `w`.
    pub tangents: Vec<Vec4>,
    /// Vertex colors.
    pub colors: Vec<Vec4>,
    /// Texture coordinates.
    pub uvs: Vec<Vec2>,
    /// Corners per polygon.
    pub counts: Vec<u32>,
    /// First corner of each polygon.
    pub offsets: Vec<u32>,
    /// Vertex index of each polygon corner.
    pub indices: Vec<u32>,
    /// Vertex index of each triangle corner.
    pub indices_triangulated: Vec<u32>,
    /// Polygon corner of each triangle corner.
    pub indices_flattened_triangulated: Vec<u32>,
    /// Four-wide skin records.
    pub weights4: Vec<Weights4>,
    /// Eight-wide skin records.
    pub weights8: Vec<Weights8>,
    /// Influences per vertex of the authoritative skin stream: 0, 4 or 8.
    pub max_bone_weights: i32,
    /// Bone names.
    pub bones: Vec<String>,
    /// Inverse bind matrices.
    pub bindposes: Vec<Mat4>,
    /// Skeleton root.
    pub root_bone: Option<String>,
    /// Bounds of `points`.
    pub bounds: Aabb,
    /// Polygon corner count.
    pub num_indices: usize,
    /// Triangle corner count.
    pub num_indices_triangulated: usize,
}

impl MeshSample {
    /// Center of the bounds.
    pub fn center(&self) -> Vec3 {
        self.bounds.center()
    }

    /// Half-size of the bounds.
    pub fn extents(&self) -> Vec3 {
        self.bounds.half_extents()
    }
}

/// Borrowed view of a node's current sample.
///
/// The borrow checker keeps the view alive only until the node is next
/// mutated, which is when the buffers may change.
#[derive(Debug, Clone, Copy)]
pub struct MeshView<'a> {
    /// The sample buffers.
    pub sample: &'a MeshSample,
    /// Live submeshes; empty when the whole mesh fits one draw.
    pub submeshes: &'a [Submesh],
}

impl MeshView<'_> {
    /// Number of points.
    pub fn num_points(&self) -> usize {
        self.sample.points.len()
    }

    /// The authoritative skin stream width, 0 when unskinned.
    pub fn max_bone_weights(&self) -> i32 {
        self.sample.max_bone_weights
    }
}

/// Caller-owned mesh buffers.
///
/// Used both as the destination of a copying read and as the source of a
/// write. Reading into the same `MeshData` every frame reuses its
/// allocations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Vertex positions.
    pub points: Vec<Vec3>,
    /// Vertex velocities.
    pub velocities: Vec<Vec3>,
    /// Normals.
    pub normals: Vec<Vec3>,
    /// Tangents.
    pub tangents: Vec<Vec4>,
    /// Colors.
    pub colors: Vec<Vec4>,
    /// Texture coordinates.
    pub uvs: Vec<Vec2>,
    /// Corners per polygon; empty on write means all triangles.
    pub counts: Vec<u32>,
    /// Vertex index of each polygon corner.
    pub indices: Vec<u32>,
    /// Vertex index of each triangle corner.
    pub indices_triangulated: Vec<u32>,
    /// Four-wide skin records.
    pub weights4: Vec<Weights4>,
    /// Eight-wide skin records.
    pub weights8: Vec<Weights8>,
    /// Influences per vertex.
    pub max_bone_weights: i32,
    /// Bone names.
    pub bones: Vec<String>,
    /// Skeleton root.
    pub root_bone: Option<String>,
    /// Inverse bind matrices.
    pub bindposes: Vec<Mat4>,
    /// Bounds of the points.
    pub bounds: Aabb,
    /// Per-submesh buffers.
    pub submeshes: Vec<Submesh>,
}

impl MeshData {
    /// Copies every buffer of `view`, sized from the view's counts.
    ///
    /// Only the authoritative skin stream is copied; the other one is
    /// cleared.
    pub fn fill_from(&mut self, view: &MeshView<'_>) {
        let s = view.sample;
        copy_stream(&mut self.points, &s.points);
        copy_stream(&mut self.velocities, &s.velocities);
        copy_stream(&mut self.normals, &s.normals);
        copy_stream(&mut self.tangents, &s.tangents);
        copy_stream(&mut self.colors, &s.colors);
        copy_stream(&mut self.uvs, &s.uvs);
        copy_stream(&mut self.counts, &s.counts);
        copy_stream(&mut self.indices, &s.indices);
        copy_stream(
            &mut self.indices_triangulated,
            &s.indices_triangulated[..s.num_indices_triangulated.min(s.indices_triangulated.len())],
        );

        self.weights4.clear();
        self.weights8.clear();
        match s.max_bone_weights {
            4 => copy_stream(&mut self.weights4, &s.weights4),
            8 => copy_stream(&mut self.weights8, &s.weights8),
            _ => {}
        }
        self.max_bone_weights = s.max_bone_weights;
        copy_stream(&mut self.bones, &s.bones);
        self.root_bone.clone_from(&s.root_bone);
        copy_stream(&mut self.bindposes, &s.bindposes);
        self.bounds = s.bounds;

        self.submeshes.truncate(view.submeshes.len());
        let reused = self.submeshes.len();
        for (dst, src) in self.submeshes.iter_mut().zip(view.submeshes) {
            dst.copy_from(src);
        }
        self.submeshes.extend(view.submeshes[reused..].iter().cloned());
    }
}

/// How much of a mesh may change between samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TopologyVariance {
    /// Nothing is time-sampled.
    #[default]
    Constant,
    /// Points move; counts and indices are fixed.
    Homogeneous,
    /// Counts or indices change over time.
    Heterogeneous,
}

/// What a mesh node provides, independent of the sampled time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshSummary {
    /// Authored time range.
    pub time_range: Option<TimeRange>,
    /// Normals are authored or will be synthesized.
    pub has_normals: bool,
    /// Colors are authored.
    pub has_colors: bool,
    /// UVs are authored.
    pub has_uvs: bool,
    /// Tangents will be synthesized.
    pub has_tangents: bool,
    /// Velocities are authored.
    pub has_velocities: bool,
    /// Number of skeleton bones.
    pub num_bones: usize,
    /// Skin width a read will deliver.
    pub max_bone_weights: i32,
    /// Topology variance.
    pub topology_variance: TopologyVariance,
}
