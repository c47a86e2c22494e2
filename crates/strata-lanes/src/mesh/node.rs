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

//! The per-node mesh resampling controller.
//!
//! A [`MeshNode`] pulls raw arrays from its [`MeshSource`] once per time
//! sample and turns them into renderer-ready buffers. Work is skipped
//! according to the node's update flags:
//!
//! - nothing runs when the resolved time did not change;
//! - topology is re-fetched and re-triangulated only on the first sample,
//!   for heterogeneous meshes, or after a settings or variant change;
//! - skin data is imported once, then again after a settings or variant
//!   change;
//! - submeshes are rebuilt whenever splitting is required.

use strata_core::math::{invert_x, scale_uniform, Aabb, Mat4, Vec3};
use strata_core::source::{
    AuthoredMesh, MeshAttribute, MeshSink, MeshSource, SkinAttributes, Topology,
};
use strata_core::{
    ExportSettings, ImportSettings, NormalCalculation, StrataError, TangentCalculation, Time,
    UpdateFlags, UpdateTracker, DEFAULT_TIME,
};

use super::normals::{generate_normals, generate_tangents};
use super::sample::{MeshData, MeshSample, MeshSummary, MeshView, TopologyVariance};
use super::skin::{narrow_all, pack, unpack, widen_all, Weights4, Weights8};
use super::submesh::{FlattenedAttributes, SubmeshSplitter};
use super::triangulate::{
    compute_offsets, count_indices, reverse_winding, sanitize_topology, triangulate,
    validate_counts,
};

/// Flags that force the triangulation to be rebuilt.
const TOPOLOGY_TRIGGERS: UpdateFlags = UpdateFlags::IMPORT_SETTINGS_UPDATED
    .union(UpdateFlags::VARIANT_SET_CHANGED)
    .union(UpdateFlags::PAYLOAD_LOADED);

/// Flags that invalidate the summary.
const SUMMARY_TRIGGERS: UpdateFlags = UpdateFlags::VARIANT_SET_CHANGED
    .union(UpdateFlags::PAYLOAD_LOADED)
    .union(UpdateFlags::PAYLOAD_UNLOADED);

/// Converts bind poses between spaces that differ by handedness and scale.
fn convert_bindposes(bindposes: &mut [Mat4], swap_handedness: bool, scale: f32) {
    for m in bindposes.iter_mut() {
        if swap_handedness {
            *m = m.swap_handedness();
        }
        if scale != 1.0 {
            m.cols[3].x *= scale;
            m.cols[3].y *= scale;
            m.cols[3].z *= scale;
        }
    }
}

/// Unpacks authored skin arrays into `sample`, converting to `requested`
/// influences per vertex when that is 4 or 8.
fn import_skin(
    sample: &mut MeshSample,
    skin: &SkinAttributes,
    requested: i32,
) -> Result<(), StrataError> {
    let num_points = sample.points.len();
    match skin.max_bone_weights {
        0 => Ok(()),
        4 => {
            unpack::<Weights4>(skin, num_points, &mut sample.weights4)?;
            sample.max_bone_weights = 4;
            if requested == 8 {
                widen_all(&sample.weights4, &mut sample.weights8);
                sample.max_bone_weights = 8;
            }
            Ok(())
        }
        8 => {
            unpack::<Weights8>(skin, num_points, &mut sample.weights8)?;
            sample.max_bone_weights = 8;
            if requested == 4 {
                narrow_all(&sample.weights8, &mut sample.weights4);
                sample.max_bone_weights = 4;
            }
            Ok(())
        }
        width => Err(StrataError::UnsupportedBoneWidth(width)),
    }
}

/// Resamples one mesh from its provider.
///
/// Calls on one node must be serialized; distinct nodes are independent
/// and may be resampled on different threads.
#[derive(Debug)]
pub struct MeshNode<S> {
    path: String,
    source: S,
    import: ImportSettings,
    export: ExportSettings,
    tracker: UpdateTracker,
    sample: MeshSample,
    topology: Topology,
    splitter: SubmeshSplitter,
    summary: MeshSummary,
    summary_dirty: bool,
}

impl<S: MeshSource> MeshNode<S> {
    /// Creates a node that has not sampled anything yet.
    pub fn new(
        path: impl Into<String>,
        source: S,
        import: ImportSettings,
        export: ExportSettings,
    ) -> Self {
        let path = path.into();
        log::trace!("MeshNode::new(): {path}");
        Self {
            path,
            source,
            import,
            export,
            tracker: UpdateTracker::new(),
            sample: MeshSample::default(),
            topology: Topology::default(),
            splitter: SubmeshSplitter::new(),
            summary: MeshSummary::default(),
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

    /// Mutable access to the provider. Raise [`UpdateFlags::FORCE_UPDATE`]
    /// through [`notify`](Self::notify) after changing its data.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Active import settings.
    pub fn import_settings(&self) -> &ImportSettings {
        &self.import
    }

    /// Active export settings.
    pub fn export_settings(&self) -> &ExportSettings {
        &self.export
    }

    /// Replaces the import settings; the next read recomputes everything.
    pub fn set_import_settings(&mut self, settings: ImportSettings) {
        if settings != self.import {
            self.import = settings;
            self.tracker.raise(UpdateFlags::IMPORT_SETTINGS_UPDATED);
            self.summary_dirty = true;
        }
    }

    /// Replaces the export settings.
    pub fn set_export_settings(&mut self, settings: ExportSettings) {
        self.export = settings;
    }

    /// Raises externally observed changes (variant switches, payload loads).
    pub fn notify(&mut self, flags: UpdateFlags) {
        if flags.intersects(SUMMARY_TRIGGERS) {
            self.summary_dirty = true;
        }
        self.tracker.raise(flags);
    }

    /// Flags of the most recent update.
    pub fn flags(&self) -> UpdateFlags {
        self.tracker.current()
    }

    /// Flags of the update before that.
    pub fn previous_flags(&self) -> UpdateFlags {
        self.tracker.previous()
    }

    /// Time-independent description of the mesh, refreshed when stale.
    pub fn summary(&mut self) -> &MeshSummary {
        if self.summary_dirty {
            self.summary = self.compute_summary();
            self.summary_dirty = false;
        }
        &self.summary
    }

    fn compute_summary(&self) -> MeshSummary {
        let src = &self.source;
        let conf = &self.import;

        let has_normals = src.has_attribute(MeshAttribute::Normals)
            || conf.normal_calculation != NormalCalculation::Never;
        let has_uvs = src.has_attribute(MeshAttribute::Uvs);

        let mut max_bone_weights = src.skin().map_or(0, |s| s.max_bone_weights);
        if matches!(max_bone_weights, 4 | 8) && matches!(conf.max_bone_weights, 4 | 8) {
            max_bone_weights = conf.max_bone_weights;
        }

        let topology_variance = if src.topology_might_vary() {
            TopologyVariance::Heterogeneous
        } else if src.points_might_vary() {
            TopologyVariance::Homogeneous
        } else {
            TopologyVariance::Constant
        };

        MeshSummary {
            time_range: src.authored_time_range(),
            has_normals,
            has_colors: src.has_attribute(MeshAttribute::Colors),
            has_uvs,
            has_tangents: has_normals
                && has_uvs
                && conf.tangent_calculation != TangentCalculation::Never,
            has_velocities: src.has_attribute(MeshAttribute::Velocities),
            num_bones: src.bones().len(),
            max_bone_weights,
            topology_variance,
        }
    }

    /// Resamples the mesh at `t` and returns the flags of this update.
    ///
    /// Returns empty flags, leaving every buffer untouched, when `t`
    /// resolves to the same data as the previous call.
    pub fn update_sample(&mut self, t: Time) -> UpdateFlags {
        let flags = self.tracker.advance(t, self.source.authored_time_range());
        if flags.is_empty() {
            return flags;
        }
        if flags.intersects(SUMMARY_TRIGGERS) {
            self.summary_dirty = true;
        }

        let Self {
            path,
            source,
            import: conf,
            tracker,
            sample,
            topology,
            splitter,
            ..
        } = self;

        // Vertex streams.
        source.read_points(t, &mut sample.points);
        source.read_velocities(t, &mut sample.velocities);
        source.read_colors(t, &mut sample.colors);
        source.read_uvs(t, &mut sample.uvs);
        if conf.swap_handedness {
            invert_x(&mut sample.points);
            invert_x(&mut sample.velocities);
        }
        if conf.scale_factor != 1.0 {
            scale_uniform(&mut sample.points, conf.scale_factor);
            scale_uniform(&mut sample.velocities, conf.scale_factor);
        }

        // Authored normals.
        let gen_normals = match conf.normal_calculation {
            NormalCalculation::Always => true,
            NormalCalculation::WhenMissing | NormalCalculation::Never => {
                source.read_normals(t, &mut sample.normals);
                if sample.normals.is_empty() {
                    if conf.normal_calculation == NormalCalculation::Never {
                        sample.normals.resize(sample.points.len(), Vec3::ZERO);
                    }
                    conf.normal_calculation == NormalCalculation::WhenMissing
                } else {
                    if conf.swap_handedness {
                        invert_x(&mut sample.normals);
                    }
                    false
                }
            }
        };
        let gen_tangents = conf.tangent_calculation != TangentCalculation::Never;

        // Topology.
        let update_indices = sample.num_indices_triangulated == 0
            || source.topology_might_vary()
            || flags.intersects(TOPOLOGY_TRIGGERS);
        if update_indices {
            source.read_topology(t, topology);
            match sanitize_topology(topology, sample.points.len()) {
                Ok(0) => {}
                Ok(dropped) => {
                    log::warn!("{path}: dropped {dropped} polygons with fewer than 3 corners")
                }
                Err(err) => {
                    log::warn!("{path}: {err}; topology rejected");
                    topology.counts.clear();
                    topology.indices.clear();
                }
            }

            if topology.counts != sample.counts || topology.indices != sample.indices {
                sample.counts.clone_from(&topology.counts);
                sample.indices.clone_from(&topology.indices);
                tracker.annotate(UpdateFlags::TOPOLOGY_CHANGED);
            }
            compute_offsets(&sample.counts, &mut sample.offsets);
            let (num_indices, num_triangulated) = count_indices(&sample.counts);
            sample.num_indices = num_indices;
            sample.num_indices_triangulated = num_triangulated;

            if conf.triangulate || gen_normals || gen_tangents {
                if let Err(err) = triangulate(
                    &sample.counts,
                    Some(&sample.indices),
                    conf.swap_faces,
                    &mut sample.indices_triangulated,
                ) {
                    log::warn!("{path}: {err}");
                    sample.indices_triangulated.clear();
                }
            } else {
                sample.indices_triangulated.clear();
            }
            log::debug!(
                "{path}: topology updated, {} polygons, {num_triangulated} triangle corners",
                sample.counts.len()
            );
        }

        if gen_normals {
            generate_normals(
                &mut sample.normals,
                &sample.points,
                &sample.counts,
                &sample.indices,
                conf.swap_faces,
                conf.normal_weighting,
            );
        }
        if gen_tangents {
            generate_tangents(
                &mut sample.tangents,
                &sample.points,
                &sample.normals,
                &sample.uvs,
                &sample.counts,
                &sample.indices,
            );
        } else {
            sample.tangents.clear();
        }

        // Skin and skeleton are not time-sampled, but their conversion
        // depends on the settings and the active variant.
        if flags.intersects(TOPOLOGY_TRIGGERS) {
            sample.weights4.clear();
            sample.weights8.clear();
            sample.max_bone_weights = 0;
            sample.bones.clear();
            sample.root_bone = None;
            sample.bindposes.clear();
        }
        if sample.weights4.is_empty() && sample.weights8.is_empty() {
            if let Some(skin) = source.skin() {
                if let Err(err) = import_skin(sample, &skin, conf.max_bone_weights) {
                    log::warn!("{path}: {err}; skin skipped");
                    sample.weights4.clear();
                    sample.weights8.clear();
                    sample.max_bone_weights = 0;
                }
            }
        }
        if sample.bones.is_empty() {
            sample.bones = source.bones();
        }
        if sample.root_bone.is_none() {
            sample.root_bone = source.root_bone();
        }
        if sample.bindposes.is_empty() {
            sample.bindposes = source.bindposes();
            convert_bindposes(&mut sample.bindposes, conf.swap_handedness, conf.scale_factor);
        }

        sample.bounds = Aabb::from_points(&sample.points).unwrap_or_default();

        // Submeshes.
        let flattened = FlattenedAttributes::of(sample);
        if SubmeshSplitter::needs_split(sample, flattened, conf.split_unit) {
            if sample.indices_triangulated.len() != sample.num_indices_triangulated {
                if let Err(err) = triangulate(
                    &sample.counts,
                    Some(&sample.indices),
                    conf.swap_faces,
                    &mut sample.indices_triangulated,
                ) {
                    log::warn!("{path}: {err}");
                    sample.indices_triangulated.clear();
                }
            }
            if !flattened.is_empty()
                && (update_indices
                    || sample.indices_flattened_triangulated.len()
                        != sample.num_indices_triangulated)
            {
                if let Err(err) = triangulate(
                    &sample.counts,
                    None,
                    conf.swap_faces,
                    &mut sample.indices_flattened_triangulated,
                ) {
                    log::warn!("{path}: {err}");
                    sample.indices_flattened_triangulated.clear();
                }
            }
            let before = splitter.submeshes().len();
            let live = splitter.split(sample, flattened, conf.split_unit);
            if live != before {
                log::debug!("{path}: {live} submeshes (was {before})");
            }
        } else {
            splitter.clear();
        }

        tracker.current()
    }

    /// Borrowed view of the current sample.
    pub fn view(&self) -> MeshView<'_> {
        MeshView {
            sample: &self.sample,
            submeshes: self.splitter.submeshes(),
        }
    }

    /// Resamples if `t` differs from the last resolved time (or a change is
    /// pending) and returns a view of the result.
    pub fn read_sample(&mut self, t: Time) -> MeshView<'_> {
        if self.tracker.last_time() != Some(t) || !self.tracker.pending().is_empty() {
            self.update_sample(t);
        }
        self.view()
    }

    /// Like [`read_sample`](Self::read_sample), copying into caller-owned
    /// buffers. Returns whether the sample has any points.
    pub fn read_sample_into(&mut self, t: Time, dst: &mut MeshData) -> bool {
        let view = self.read_sample(t);
        dst.fill_from(&view);
        !dst.points.is_empty()
    }

    /// Reads every authored sample in time order, or the default time when
    /// nothing is time-sampled, and returns how many were visited.
    pub fn each_sample(&mut self, mut callback: impl FnMut(&MeshView<'_>, Time)) -> usize {
        let mut times = self.source.sample_times();
        if times.is_empty() {
            times.push(DEFAULT_TIME);
        }
        for &t in &times {
            let view = self.read_sample(t);
            callback(&view, t);
        }
        times.len()
    }
}

impl<S: MeshSource + MeshSink> MeshNode<S> {
    /// Authors `src` at time `t` using the export settings.
    ///
    /// Polygons are written as given; without `counts` every face is taken
    /// to be a triangle. The next read resamples.
    pub fn write_sample(&mut self, src: &MeshData, t: Time) -> Result<(), StrataError> {
        let conf = &self.export;
        let mut out = AuthoredMesh {
            points: src.points.clone(),
            velocities: src.velocities.clone(),
            normals: src.normals.clone(),
            colors: src.colors.clone(),
            uvs: src.uvs.clone(),
            bones: src.bones.clone(),
            root_bone: src.root_bone.clone(),
            bindposes: src.bindposes.clone(),
            ..Default::default()
        };

        if conf.swap_handedness {
            invert_x(&mut out.points);
            invert_x(&mut out.velocities);
            invert_x(&mut out.normals);
        }
        if conf.scale_factor != 1.0 {
            scale_uniform(&mut out.points, conf.scale_factor);
            scale_uniform(&mut out.velocities, conf.scale_factor);
        }
        convert_bindposes(&mut out.bindposes, conf.swap_handedness, conf.scale_factor);

        if !src.indices.is_empty() {
            let counts = if src.counts.is_empty() {
                vec![3; src.indices.len() / 3]
            } else {
                src.counts.clone()
            };
            validate_counts(&counts, Some(&src.indices))?;
            let mut indices = src.indices.clone();
            if conf.swap_faces {
                reverse_winding(&counts, &mut indices);
            }
            out.topology = Topology { counts, indices };
        }

        out.skin = match src.max_bone_weights {
            4 if !src.weights4.is_empty() => Some(pack(&src.weights4)),
            8 if !src.weights8.is_empty() => Some(pack(&src.weights8)),
            _ if !src.weights4.is_empty() => Some(pack(&src.weights4)),
            _ if !src.weights8.is_empty() => Some(pack(&src.weights8)),
            _ => None,
        };

        self.source.store_mesh(t, out).map_err(StrataError::Sink)?;
        self.summary_dirty = true;
        self.tracker.raise(UpdateFlags::FORCE_UPDATE);
        Ok(())
    }
}
