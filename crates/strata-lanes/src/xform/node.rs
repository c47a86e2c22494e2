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

//! The per-node transform resampling controller.

use bitflags::bitflags;
use strata_core::math::{Mat4, Quaternion, Vec3, EPSILON};
use strata_core::source::{XformOpKind, XformSink, XformSource};
use strata_core::{
    ExportSettings, ImportSettings, StrataError, Time, TimeRange, UpdateFlags, UpdateTracker,
    DEFAULT_TIME,
};

use super::classify::{
    classify, op_matrix, op_rotation, op_scale, op_translation, OpCategory, XformKind,
};

bitflags! {
    /// Channels that changed since the previous sample.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TransformFlags: u8 {
        /// The position changed.
        const UPDATED_POSITION = 1 << 0;
        /// The rotation changed.
        const UPDATED_ROTATION = 1 << 1;
        /// The scale changed.
        const UPDATED_SCALE = 1 << 2;
    }
}

impl TransformFlags {
    fn of_category(category: OpCategory) -> Self {
        match category {
            OpCategory::Translate => Self::UPDATED_POSITION,
            OpCategory::Rotate => Self::UPDATED_ROTATION,
            OpCategory::Scale => Self::UPDATED_SCALE,
            OpCategory::Other => Self::all(),
        }
    }
}

/// A resolved transform sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformData {
    /// Translation.
    pub position: Vec3,
    /// Unit rotation.
    pub rotation: Quaternion,
    /// Per-axis scale.
    pub scale: Vec3,
    /// The full matrix, present only for stacks that are not TRS.
    pub matrix: Option<Mat4>,
    /// Channels that changed with this sample.
    pub flags: TransformFlags,
}

impl Default for TransformData {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quaternion::IDENTITY,
            scale: Vec3::ONE,
            matrix: None,
            flags: TransformFlags::empty(),
        }
    }
}

impl TransformData {
    /// The transform as a single matrix.
    pub fn to_matrix(&self) -> Mat4 {
        self.matrix
            .unwrap_or_else(|| Mat4::from_trs(self.position, self.rotation, self.scale))
    }
}

/// Time-independent description of a transform node.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct XformSummary {
    /// How the stack is evaluated.
    pub kind: XformKind,
    /// Range of authored samples, `None` when nothing is time-sampled.
    pub time_range: Option<TimeRange>,
}

/// Resamples one transform from its op stack.
#[derive(Debug)]
pub struct XformNode<S> {
    path: String,
    source: S,
    import: ImportSettings,
    export: ExportSettings,
    tracker: UpdateTracker,
    ops: Vec<XformOpKind>,
    kind: XformKind,
    sample: TransformData,
    sampled: bool,
    summary: XformSummary,
    summary_dirty: bool,
}

impl<S: XformSource> XformNode<S> {
    /// Creates a node and classifies its op stack.
    pub fn new(
        path: impl Into<String>,
        source: S,
        import: ImportSettings,
        export: ExportSettings,
    ) -> Self {
        let path = path.into();
        let ops = source.ordered_ops();
        let kind = classify(&ops);
        log::trace!("XformNode::new(): {path} ({kind:?}, {} ops)", ops.len());
        Self {
            path,
            source,
            import,
            export,
            tracker: UpdateTracker::new(),
            ops,
            kind,
            sample: TransformData::default(),
            sampled: false,
            summary: XformSummary::default(),
            summary_dirty: true,
        }
    }

    /// The node's scene path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The provider.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Mutable access to the provider. Notify the node with
    /// [`UpdateFlags::VARIANT_SET_CHANGED`] after changing its op stack.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// How the stack is evaluated.
    pub fn kind(&self) -> XformKind {
        self.kind
    }

    /// Active import settings.
    pub fn import_settings(&self) -> &ImportSettings {
        &self.import
    }

    /// Replaces the import settings; the next read recomputes.
    pub fn set_import_settings(&mut self, settings: ImportSettings) {
        if settings != self.import {
            self.import = settings;
            self.tracker.raise(UpdateFlags::IMPORT_SETTINGS_UPDATED);
        }
    }

    /// Active export settings.
    pub fn export_settings(&self) -> &ExportSettings {
        &self.export
    }

    /// Replaces the export settings.
    pub fn set_export_settings(&mut self, settings: ExportSettings) {
        self.export = settings;
    }

    /// Raises externally observed changes.
    pub fn notify(&mut self, flags: UpdateFlags) {
        self.tracker.raise(flags);
    }

    /// Flags of the most recent update.
    pub fn flags(&self) -> UpdateFlags {
        self.tracker.current()
    }

    /// Time-independent description of the node, refreshed when stale.
    pub fn summary(&mut self) -> &XformSummary {
        if self.summary_dirty {
            self.summary = XformSummary {
                kind: self.kind,
                time_range: self.source.authored_time_range(),
            };
            self.summary_dirty = false;
        }
        &self.summary
    }

    fn refresh_ops(&mut self) {
        self.ops = self.source.ordered_ops();
        let kind = classify(&self.ops);
        if kind != self.kind {
            log::debug!("{}: reclassified as {kind:?}", self.path);
        }
        self.kind = kind;
        self.summary_dirty = true;
    }

    fn evaluate_trs(&self, t: Time) -> (Vec3, Quaternion, Vec3) {
        let mut translation = Vec3::ZERO;
        let mut rotation = Quaternion::IDENTITY;
        let mut scale = Vec3::ONE;
        for (index, &kind) in self.ops.iter().enumerate() {
            let Some(value) = self.source.op_value(index, t) else {
                continue;
            };
            match OpCategory::of(kind) {
                OpCategory::Translate => translation += op_translation(kind, value),
                OpCategory::Rotate => rotation *= op_rotation(kind, value),
                OpCategory::Scale => scale = scale.mul_elements(op_scale(kind, value)),
                OpCategory::Other => {}
            }
        }
        (translation, rotation, scale)
    }

    fn evaluate_matrix(&self, t: Time) -> Mat4 {
        let mut result = Mat4::IDENTITY;
        for (index, &kind) in self.ops.iter().enumerate() {
            if let Some(value) = self.source.op_value(index, t) {
                result = result * op_matrix(kind, value);
            }
        }
        result
    }

    /// Resamples the transform at `t` and returns the flags of this update.
    ///
    /// When nothing changed the channel flags of the sample are cleared and
    /// its values are kept.
    pub fn update_sample(&mut self, t: Time) -> UpdateFlags {
        let flags = self.tracker.advance(t, self.source.authored_time_range());
        if flags.intersects(UpdateFlags::VARIANT_SET_CHANGED | UpdateFlags::PAYLOAD_LOADED) {
            self.refresh_ops();
        }
        if flags.is_empty() {
            self.sample.flags = TransformFlags::empty();
            return flags;
        }

        let (mut position, mut rotation, scale, mut matrix) = match self.kind {
            XformKind::Trs => {
                let (p, r, s) = self.evaluate_trs(t);
                (p, r, s, None)
            }
            XformKind::Matrix => {
                let m = self.evaluate_matrix(t);
                let (p, r, s) = m.to_translation_rotation_scale();
                (p, r, s, Some(m))
            }
        };

        if self.import.swap_handedness {
            position.x = -position.x;
            rotation = rotation.swap_handedness();
            matrix = matrix.map(|m| m.swap_handedness());
        }

        let prev = &self.sample;
        let mut changed = TransformFlags::empty();
        changed.set(
            TransformFlags::UPDATED_POSITION,
            !self.sampled || !position.near_equal(prev.position, EPSILON),
        );
        changed.set(
            TransformFlags::UPDATED_ROTATION,
            !self.sampled || !rotation.near_equal(prev.rotation, EPSILON),
        );
        changed.set(
            TransformFlags::UPDATED_SCALE,
            !self.sampled || !scale.near_equal(prev.scale, EPSILON),
        );

        self.sample = TransformData {
            position,
            rotation,
            scale,
            matrix,
            flags: changed,
        };
        self.sampled = true;
        flags
    }

    /// Resamples if `t` differs from the last resolved time (or a change is
    /// pending) and returns the sample.
    pub fn read_sample(&mut self, t: Time) -> &TransformData {
        if self.tracker.last_time() != Some(t) || !self.tracker.pending().is_empty() {
            self.update_sample(t);
        }
        &self.sample
    }

    /// Times at which each channel is authored, merged and sorted.
    fn channel_times(&self) -> Vec<(Time, TransformFlags)> {
        let mut times: Vec<(Time, TransformFlags)> = Vec::new();
        for (index, &kind) in self.ops.iter().enumerate() {
            let channel = TransformFlags::of_category(OpCategory::of(kind));
            let samples = self.source.op_sample_times(index);
            if samples.is_empty() {
                times.push((DEFAULT_TIME, channel));
            } else {
                times.extend(samples.into_iter().map(|t| (t, channel)));
            }
        }
        times.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut merged: Vec<(Time, TransformFlags)> = Vec::with_capacity(times.len());
        for (t, channel) in times {
            match merged.last_mut() {
                Some(last) if last.0 == t => last.1 |= channel,
                _ => merged.push((t, channel)),
            }
        }
        merged
    }

    /// Reads every authored sample in time order and returns how many were
    /// visited.
    ///
    /// In TRS mode the flags handed to `callback` name the channels authored
    /// at that time; static ops count as authored at the default time. In
    /// matrix mode every op time is visited with the flags of the read.
    pub fn each_sample(&mut self, mut callback: impl FnMut(&TransformData, Time)) -> usize {
        let mut times = self.channel_times();
        if times.is_empty() {
            times.push((DEFAULT_TIME, TransformFlags::all()));
        }
        for &(t, channels) in &times {
            let mut data = *self.read_sample(t);
            if self.kind == XformKind::Trs {
                data.flags = channels;
            }
            callback(&data, t);
        }
        times.len()
    }
}

impl<S: XformSource + XformSink> XformNode<S> {
    /// Authors `data` as translate, orient and scale at time `t`.
    pub fn write_sample(&mut self, data: &TransformData, t: Time) -> Result<(), StrataError> {
        let mut position = data.position;
        let mut rotation = data.rotation;
        if self.export.swap_handedness {
            position.x = -position.x;
            rotation = rotation.swap_handedness();
        }
        self.source
            .store_trs(t, position, rotation, data.scale)
            .map_err(StrataError::Sink)?;
        self.refresh_ops();
        self.tracker.raise(UpdateFlags::FORCE_UPDATE);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use strata_core::source::{MemoryXform, OpValue};

    fn plain() -> ImportSettings {
        ImportSettings {
            swap_handedness: false,
            ..Default::default()
        }
    }

    fn node(xf: MemoryXform, import: ImportSettings) -> XformNode<MemoryXform> {
        XformNode::new("/xf", xf, import, ExportSettings::default())
    }

    fn trs_stack() -> MemoryXform {
        let mut xf = MemoryXform::new();
        xf.push_op(XformOpKind::Translate, OpValue::Vector(Vec3::new(1.0, 2.0, 3.0)));
        xf.push_op(XformOpKind::RotateZ, OpValue::Scalar(90.0));
        xf.push_op(XformOpKind::Scale, OpValue::Vector(Vec3::new(2.0, 2.0, 2.0)));
        xf
    }

    #[test]
    fn test_trs_accumulation() {
        let mut node = node(trs_stack(), plain());
        assert_eq!(node.kind(), XformKind::Trs);
        let data = *node.read_sample(0.0);
        assert_eq!(data.position, Vec3::new(1.0, 2.0, 3.0));
        assert!(data.rotation.near_equal(Quaternion::rotate_z_degrees(90.0), 1e-6));
        assert_eq!(data.scale, Vec3::new(2.0, 2.0, 2.0));
        assert!(data.matrix.is_none());
        assert_eq!(data.flags, TransformFlags::all());
    }

    #[test]
    fn test_handedness_flip() {
        let mut node = node(trs_stack(), ImportSettings::default());
        let data = *node.read_sample(0.0);
        let q = Quaternion::rotate_z_degrees(90.0);
        assert_eq!(data.position, Vec3::new(-1.0, 2.0, 3.0));
        assert!(data.rotation.near_equal(Quaternion::new(q.x, -q.y, -q.z, q.w), 1e-6));
    }

    #[test]
    fn test_matrix_stack_is_decomposed() {
        let mut xf = MemoryXform::new();
        xf.push_op(XformOpKind::Scale, OpValue::Vector(Vec3::new(2.0, 2.0, 2.0)));
        xf.push_op(XformOpKind::Translate, OpValue::Vector(Vec3::new(1.0, 0.0, 0.0)));
        let mut node = node(xf, plain());
        assert_eq!(node.kind(), XformKind::Matrix);

        let data = *node.read_sample(0.0);
        assert_relative_eq!(data.position.x, 2.0);
        assert_relative_eq!(data.scale.y, 2.0, epsilon = 1e-6);
        assert!(data.rotation.near_equal(Quaternion::IDENTITY, 1e-6));
        let m = data.matrix.unwrap();
        assert_eq!(m.transform_point(Vec3::ZERO), Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_matrix_handedness_mirrors_matrix() {
        let mut xf = MemoryXform::new();
        xf.push_op(
            XformOpKind::Transform,
            OpValue::Matrix(Mat4::from_translation(Vec3::new(3.0, 1.0, 0.0))),
        );
        let mut node = node(xf, ImportSettings::default());
        let data = *node.read_sample(0.0);
        assert_eq!(data.matrix.unwrap().translation(), Vec3::new(-3.0, 1.0, 0.0));
        assert_eq!(data.position, Vec3::new(-3.0, 1.0, 0.0));
    }

    #[test]
    fn test_channel_flags_track_changes() {
        let mut xf = MemoryXform::new();
        xf.push_animated_op(
            XformOpKind::Translate,
            vec![
                (0.0, OpValue::Vector(Vec3::ZERO)),
                (1.0, OpValue::Vector(Vec3::X)),
            ],
        );
        xf.push_op(XformOpKind::RotateY, OpValue::Scalar(45.0));
        let mut node = node(xf, plain());

        node.read_sample(0.0);
        let data = *node.read_sample(1.0);
        assert_eq!(data.flags, TransformFlags::UPDATED_POSITION);

        node.update_sample(1.0);
        assert!(node.read_sample(1.0).flags.is_empty());
    }

    #[test]
    fn test_each_sample_reports_authored_channels() {
        let mut xf = MemoryXform::new();
        xf.push_animated_op(
            XformOpKind::Translate,
            vec![
                (0.0, OpValue::Vector(Vec3::ZERO)),
                (1.0, OpValue::Vector(Vec3::X)),
            ],
        );
        xf.push_op(XformOpKind::Orient, OpValue::Rotation(Quaternion::IDENTITY));
        let mut node = node(xf, plain());

        let mut seen = Vec::new();
        let n = node.each_sample(|data, t| seen.push((t, data.flags)));
        assert_eq!(n, 2);
        assert_eq!(
            seen,
            vec![
                (0.0, TransformFlags::UPDATED_POSITION | TransformFlags::UPDATED_ROTATION),
                (1.0, TransformFlags::UPDATED_POSITION),
            ]
        );
    }

    #[test]
    fn test_write_then_read_round_trips() {
        let mut node = node(MemoryXform::new(), ImportSettings::default());
        let written = TransformData {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quaternion::rotate_y_degrees(30.0),
            scale: Vec3::new(1.0, 2.0, 1.0),
            ..Default::default()
        };
        node.write_sample(&written, 0.0).unwrap();
        assert_eq!(node.kind(), XformKind::Trs);
        assert_eq!(node.summary().kind, XformKind::Trs);

        let read = *node.read_sample(0.0);
        assert!(read.position.near_equal(written.position, 1e-6));
        assert!(read.rotation.near_equal(written.rotation, 1e-6));
        assert_eq!(read.scale, written.scale);
    }
}
