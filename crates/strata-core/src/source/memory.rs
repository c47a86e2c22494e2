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

//! In-memory providers backed by sorted time samples.
//!
//! A fetch at time `t` resolves to the latest sample at or before `t`, or
//! to the first sample when `t` precedes all of them.

use super::{
    AuthoredMesh, MeshAttribute, MeshSink, MeshSource, OpValue, SinkError, SkinAttributes,
    Topology, XformOpKind, XformSink, XformSource,
};
use crate::math::{Mat4, Quaternion, Vec2, Vec3, Vec4};
use crate::time::{Time, TimeRange};

/// Index of the sample held at `t`.
fn held_index<T>(samples: &[(Time, T)], t: Time) -> Option<usize> {
    if samples.is_empty() {
        return None;
    }
    Some(samples.partition_point(|(st, _)| *st <= t).saturating_sub(1))
}

/// Inserts or replaces the sample at `t`, keeping `samples` sorted.
fn insert_sample<T>(samples: &mut Vec<(Time, T)>, t: Time, value: T) {
    match samples.binary_search_by(|(st, _)| st.total_cmp(&t)) {
        Ok(i) => samples[i].1 = value,
        Err(i) => samples.insert(i, (t, value)),
    }
}

fn copy_into<T: Copy>(dst: &mut Vec<T>, src: &[T]) {
    dst.clear();
    dst.extend_from_slice(src);
}

/// Every time-varying stream of a mesh at one sample time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshFrame {
    /// Vertex positions.
    pub points: Vec<Vec3>,
    /// Vertex velocities.
    pub velocities: Vec<Vec3>,
    /// Normals.
    pub normals: Vec<Vec3>,
    /// Colors.
    pub colors: Vec<Vec4>,
    /// Texture coordinates.
    pub uvs: Vec<Vec2>,
    /// Polygon topology.
    pub topology: Topology,
}

/// A mesh provider holding its samples in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryMesh {
    frames: Vec<(Time, MeshFrame)>,
    skin: Option<SkinAttributes>,
    bindposes: Vec<Mat4>,
    bones: Vec<String>,
    root_bone: Option<String>,
}

impl MemoryMesh {
    /// An empty mesh with no samples.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert_frame`](Self::insert_frame).
    pub fn with_frame(mut self, t: Time, frame: MeshFrame) -> Self {
        self.insert_frame(t, frame);
        self
    }

    /// Adds or replaces the frame at `t`.
    pub fn insert_frame(&mut self, t: Time, frame: MeshFrame) {
        insert_sample(&mut self.frames, t, frame);
    }

    /// Sets the skin arrays.
    pub fn set_skin(&mut self, skin: SkinAttributes) {
        self.skin = Some(skin);
    }

    /// Sets bone names, root bone and bind poses.
    pub fn set_skeleton(
        &mut self,
        bones: Vec<String>,
        root_bone: Option<String>,
        bindposes: Vec<Mat4>,
    ) {
        self.bones = bones;
        self.root_bone = root_bone;
        self.bindposes = bindposes;
    }

    /// The frame held at `t`.
    pub fn frame_at(&self, t: Time) -> Option<&MeshFrame> {
        held_index(&self.frames, t).map(|i| &self.frames[i].1)
    }

    /// All frames in time order.
    pub fn frames(&self) -> &[(Time, MeshFrame)] {
        &self.frames
    }

    fn varies<T: PartialEq>(&self, field: impl Fn(&MeshFrame) -> &T) -> bool {
        match self.frames.split_first() {
            Some(((_, first), rest)) => rest.iter().any(|(_, f)| field(f) != field(first)),
            None => false,
        }
    }

    fn any_frame(&self, pred: impl Fn(&MeshFrame) -> bool) -> bool {
        self.frames.iter().any(|(_, f)| pred(f))
    }
}

impl MeshSource for MemoryMesh {
    fn read_points(&self, t: Time, dst: &mut Vec<Vec3>) {
        copy_into(dst, self.frame_at(t).map_or(&[][..], |f| f.points.as_slice()));
    }

    fn read_velocities(&self, t: Time, dst: &mut Vec<Vec3>) {
        copy_into(dst, self.frame_at(t).map_or(&[][..], |f| f.velocities.as_slice()));
    }

    fn read_normals(&self, t: Time, dst: &mut Vec<Vec3>) {
        copy_into(dst, self.frame_at(t).map_or(&[][..], |f| f.normals.as_slice()));
    }

    fn read_colors(&self, t: Time, dst: &mut Vec<Vec4>) {
        copy_into(dst, self.frame_at(t).map_or(&[][..], |f| f.colors.as_slice()));
    }

    fn read_uvs(&self, t: Time, dst: &mut Vec<Vec2>) {
        copy_into(dst, self.frame_at(t).map_or(&[][..], |f| f.uvs.as_slice()));
    }

    fn read_topology(&self, t: Time, dst: &mut Topology) {
        match self.frame_at(t) {
            Some(frame) => {
                copy_into(&mut dst.counts, &frame.topology.counts);
                copy_into(&mut dst.indices, &frame.topology.indices);
            }
            None => {
                dst.counts.clear();
                dst.indices.clear();
            }
        }
    }

    fn skin(&self) -> Option<SkinAttributes> {
        self.skin.clone()
    }

    fn bindposes(&self) -> Vec<Mat4> {
        self.bindposes.clone()
    }

    fn bones(&self) -> Vec<String> {
        self.bones.clone()
    }

    fn root_bone(&self) -> Option<String> {
        self.root_bone.clone()
    }

    fn has_attribute(&self, attr: MeshAttribute) -> bool {
        match attr {
            MeshAttribute::Points => self.any_frame(|f| !f.points.is_empty()),
            MeshAttribute::Velocities => self.any_frame(|f| !f.velocities.is_empty()),
            MeshAttribute::Normals => self.any_frame(|f| !f.normals.is_empty()),
            MeshAttribute::Colors => self.any_frame(|f| !f.colors.is_empty()),
            MeshAttribute::Uvs => self.any_frame(|f| !f.uvs.is_empty()),
            MeshAttribute::Skin => self.skin.is_some(),
            MeshAttribute::Bones => !self.bones.is_empty(),
        }
    }

    fn topology_might_vary(&self) -> bool {
        self.varies(|f| &f.topology)
    }

    fn points_might_vary(&self) -> bool {
        self.varies(|f| &f.points)
    }

    fn authored_time_range(&self) -> Option<TimeRange> {
        TimeRange::spanning(self.frames.iter().map(|(t, _)| *t))
    }

    fn sample_times(&self) -> Vec<Time> {
        self.frames.iter().map(|(t, _)| *t).collect()
    }
}

impl MeshSink for MemoryMesh {
    fn store_mesh(&mut self, t: Time, mesh: AuthoredMesh) -> Result<(), SinkError> {
        let mut frame = self.frame_at(t).cloned().unwrap_or_default();
        macro_rules! overwrite {
            ($($field:ident),+) => {
                $(if !mesh.$field.is_empty() { frame.$field = mesh.$field; })+
            };
        }
        overwrite!(points, velocities, normals, colors, uvs);
        if !mesh.topology.counts.is_empty() {
            frame.topology = mesh.topology;
        }
        self.insert_frame(t, frame);

        if let Some(skin) = mesh.skin {
            self.skin = Some(skin);
        }
        if !mesh.bones.is_empty() {
            self.bones = mesh.bones;
        }
        if !mesh.bindposes.is_empty() {
            self.bindposes = mesh.bindposes;
        }
        if mesh.root_bone.is_some() {
            self.root_bone = mesh.root_bone;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct MemoryOp {
    kind: XformOpKind,
    default: Option<OpValue>,
    samples: Vec<(Time, OpValue)>,
}

/// A transform provider holding its op stack in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryXform {
    ops: Vec<MemoryOp>,
    write_ops: Option<[usize; 3]>,
}

impl MemoryXform {
    /// An empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an op with a static value and returns its index.
    pub fn push_op(&mut self, kind: XformOpKind, value: OpValue) -> usize {
        self.ops.push(MemoryOp {
            kind,
            default: Some(value),
            samples: Vec::new(),
        });
        self.ops.len() - 1
    }

    /// Appends an op with time samples and returns its index.
    pub fn push_animated_op(&mut self, kind: XformOpKind, samples: Vec<(Time, OpValue)>) -> usize {
        let mut op = MemoryOp {
            kind,
            default: None,
            samples: Vec::with_capacity(samples.len()),
        };
        for (t, value) in samples {
            insert_sample(&mut op.samples, t, value);
        }
        self.ops.push(op);
        self.ops.len() - 1
    }

    /// Adds or replaces a sample of op `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn set_sample(&mut self, index: usize, t: Time, value: OpValue) {
        insert_sample(&mut self.ops[index].samples, t, value);
    }
}

impl XformSource for MemoryXform {
    fn ordered_ops(&self) -> Vec<XformOpKind> {
        self.ops.iter().map(|op| op.kind).collect()
    }

    fn op_value(&self, index: usize, t: Time) -> Option<OpValue> {
        let op = self.ops.get(index)?;
        match held_index(&op.samples, t) {
            Some(i) => Some(op.samples[i].1),
            None => op.default,
        }
    }

    fn op_sample_times(&self, index: usize) -> Vec<Time> {
        self.ops
            .get(index)
            .map(|op| op.samples.iter().map(|(t, _)| *t).collect())
            .unwrap_or_default()
    }

    fn authored_time_range(&self) -> Option<TimeRange> {
        TimeRange::spanning(
            self.ops
                .iter()
                .flat_map(|op| op.samples.iter().map(|(t, _)| *t)),
        )
    }
}

impl XformSink for MemoryXform {
    fn store_trs(
        &mut self,
        t: Time,
        translation: Vec3,
        rotation: Quaternion,
        scale: Vec3,
    ) -> Result<(), SinkError> {
        let [ti, ri, si] = match self.write_ops {
            Some(ops) => ops,
            None => {
                let ops = [
                    self.push_animated_op(XformOpKind::Translate, Vec::new()),
                    self.push_animated_op(XformOpKind::Orient, Vec::new()),
                    self.push_animated_op(XformOpKind::Scale, Vec::new()),
                ];
                self.write_ops = Some(ops);
                ops
            }
        };
        self.set_sample(ti, t, OpValue::Vector(translation));
        self.set_sample(ri, t, OpValue::Rotation(rotation));
        self.set_sample(si, t, OpValue::Vector(scale));
        Ok(())
    }
}
