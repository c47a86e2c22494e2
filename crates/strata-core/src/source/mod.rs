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

//! Contracts between the resampling pipelines and a scene-graph provider.
//!
//! Providers own storage, file formats and composition. The pipelines only
//! pull already-resolved arrays at a given time through [`MeshSource`] and
//! [`XformSource`], and push authored samples back through [`MeshSink`]
//! and [`XformSink`]. Every fetch leaves the destination empty when the
//! attribute is not authored.

mod memory;

pub use memory::{MemoryMesh, MemoryXform, MeshFrame};

use std::error::Error;

use crate::math::{Mat4, Quaternion, RotationOrder, Vec2, Vec3, Vec4};
use crate::time::{Time, TimeRange};

/// Error type returned by sinks.
pub type SinkError = Box<dyn Error + Send + Sync>;

/// Polygon topology: corner counts per face and the corner-to-vertex map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    /// Corners per polygon.
    pub counts: Vec<u32>,
    /// Vertex index of each polygon corner.
    pub indices: Vec<u32>,
}

/// Flat skin arrays as authored, `max_bone_weights` entries per vertex.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkinAttributes {
    /// Influence weights.
    pub bone_weights: Vec<f32>,
    /// Influence bone indices.
    pub bone_indices: Vec<i32>,
    /// Influences per vertex.
    pub max_bone_weights: i32,
}

/// Mesh attributes a provider may author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshAttribute {
    /// Vertex positions.
    Points,
    /// Vertex velocities.
    Velocities,
    /// Normals.
    Normals,
    /// Vertex colors.
    Colors,
    /// Primary texture coordinates.
    Uvs,
    /// Bone weights and indices.
    Skin,
    /// Skeleton bone names.
    Bones,
}

/// Read access to one mesh node.
pub trait MeshSource: Send {
    /// Vertex positions at `t`.
    fn read_points(&self, t: Time, dst: &mut Vec<Vec3>);
    /// Vertex velocities at `t`.
    fn read_velocities(&self, t: Time, dst: &mut Vec<Vec3>);
    /// Normals at `t`, per vertex or per polygon corner.
    fn read_normals(&self, t: Time, dst: &mut Vec<Vec3>);
    /// Colors at `t`, per vertex or per polygon corner.
    fn read_colors(&self, t: Time, dst: &mut Vec<Vec4>);
    /// Texture coordinates at `t`, per vertex or per polygon corner.
    fn read_uvs(&self, t: Time, dst: &mut Vec<Vec2>);
    /// Polygon topology at `t`.
    fn read_topology(&self, t: Time, dst: &mut Topology);
    /// Skin arrays; skin is not time-sampled.
    fn skin(&self) -> Option<SkinAttributes>;
    /// Inverse bind matrices, one per bone.
    fn bindposes(&self) -> Vec<Mat4>;
    /// Bone names.
    fn bones(&self) -> Vec<String>;
    /// Name of the skeleton root.
    fn root_bone(&self) -> Option<String>;
    /// Whether `attr` has any authored value.
    fn has_attribute(&self, attr: MeshAttribute) -> bool;
    /// Whether counts or indices may change between samples.
    fn topology_might_vary(&self) -> bool;
    /// Whether points may change between samples.
    fn points_might_vary(&self) -> bool;
    /// The range of authored sample times, `None` when nothing is time-sampled.
    fn authored_time_range(&self) -> Option<TimeRange>;
    /// Every authored sample time, sorted and deduplicated.
    fn sample_times(&self) -> Vec<Time>;
}

/// A mesh sample ready to be authored, already in the provider's space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthoredMesh {
    /// Vertex positions.
    pub points: Vec<Vec3>,
    /// Vertex velocities.
    pub velocities: Vec<Vec3>,
    /// Normals.
    pub normals: Vec<Vec3>,
    /// Vertex colors.
    pub colors: Vec<Vec4>,
    /// Texture coordinates.
    pub uvs: Vec<Vec2>,
    /// Polygon topology.
    pub topology: Topology,
    /// Skin arrays, when authored.
    pub skin: Option<SkinAttributes>,
    /// Inverse bind matrices.
    pub bindposes: Vec<Mat4>,
    /// Bone names.
    pub bones: Vec<String>,
    /// Skeleton root name.
    pub root_bone: Option<String>,
}

/// Write access to one mesh node.
pub trait MeshSink {
    /// Authors `mesh` at time `t`. Empty streams are left untouched.
    fn store_mesh(&mut self, t: Time, mesh: AuthoredMesh) -> Result<(), SinkError>;
}

/// One operation of a transform stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XformOpKind {
    /// Translation by a vector.
    Translate,
    /// Non-uniform scale by a vector.
    Scale,
    /// Rotation about X, in degrees.
    RotateX,
    /// Rotation about Y, in degrees.
    RotateY,
    /// Rotation about Z, in degrees.
    RotateZ,
    /// Three-angle rotation, in degrees.
    RotateEuler(RotationOrder),
    /// Rotation by a quaternion.
    Orient,
    /// Arbitrary 4x4 matrix.
    Transform,
}

/// The value of a transform operation at some time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OpValue {
    /// A single angle in degrees.
    Scalar(f32),
    /// A translation, scale or Euler-angle triple.
    Vector(Vec3),
    /// A quaternion.
    Rotation(Quaternion),
    /// A matrix.
    Matrix(Mat4),
}

/// Read access to one transform node.
pub trait XformSource: Send {
    /// Operation kinds in stack order; the first op is outermost.
    fn ordered_ops(&self) -> Vec<XformOpKind>;
    /// Value of op `index` at `t`, `None` if it is not authored.
    fn op_value(&self, index: usize, t: Time) -> Option<OpValue>;
    /// Authored sample times of op `index`; empty for static values.
    fn op_sample_times(&self, index: usize) -> Vec<Time>;
    /// The range of authored sample times over every op.
    fn authored_time_range(&self) -> Option<TimeRange>;
}

/// Write access to one transform node.
pub trait XformSink {
    /// Authors a translate, orient, scale stack at time `t`.
    fn store_trs(
        &mut self,
        t: Time,
        translation: Vec3,
        rotation: Quaternion,
        scale: Vec3,
    ) -> Result<(), SinkError>;
}

impl<T: MeshSource + ?Sized> MeshSource for Box<T> {
    fn read_points(&self, t: Time, dst: &mut Vec<Vec3>) {
        (**self).read_points(t, dst)
    }
    fn read_velocities(&self, t: Time, dst: &mut Vec<Vec3>) {
        (**self).read_velocities(t, dst)
    }
    fn read_normals(&self, t: Time, dst: &mut Vec<Vec3>) {
        (**self).read_normals(t, dst)
    }
    fn read_colors(&self, t: Time, dst: &mut Vec<Vec4>) {
        (**self).read_colors(t, dst)
    }
    fn read_uvs(&self, t: Time, dst: &mut Vec<Vec2>) {
        (**self).read_uvs(t, dst)
    }
    fn read_topology(&self, t: Time, dst: &mut Topology) {
        (**self).read_topology(t, dst)
    }
    fn skin(&self) -> Option<SkinAttributes> {
        (**self).skin()
    }
    fn bindposes(&self) -> Vec<Mat4> {
        (**self).bindposes()
    }
    fn bones(&self) -> Vec<String> {
        (**self).bones()
    }
    fn root_bone(&self) -> Option<String> {
        (**self).root_bone()
    }
    fn has_attribute(&self, attr: MeshAttribute) -> bool {
        (**self).has_attribute(attr)
    }
    fn topology_might_vary(&self) -> bool {
        (**self).topology_might_vary()
    }
    fn points_might_vary(&self) -> bool {
        (**self).points_might_vary()
    }
    fn authored_time_range(&self) -> Option<TimeRange> {
        (**self).authored_time_range()
    }
    fn sample_times(&self) -> Vec<Time> {
        (**self).sample_times()
    }
}

impl<T: XformSource + ?Sized> XformSource for Box<T> {
    fn ordered_ops(&self) -> Vec<XformOpKind> {
        (**self).ordered_ops()
    }
    fn op_value(&self, index: usize, t: Time) -> Option<OpValue> {
        (**self).op_value(index, t)
    }
    fn op_sample_times(&self, index: usize) -> Vec<Time> {
        (**self).op_sample_times(index)
    }
    fn authored_time_range(&self) -> Option<TimeRange> {
        (**self).authored_time_range()
    }
}
