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

mod common;

use common::{init_logging, wave_frame, wave_mesh};
use strata_core::math::{invert_x, Vec3};
use strata_core::source::MemoryMesh;
use strata_core::{ExportSettings, ImportSettings, UpdateFlags};
use strata_lanes::mesh::{MeshData, MeshNode, TopologyVariance};

fn mesh_node(mesh: MemoryMesh, import: ImportSettings) -> MeshNode<MemoryMesh> {
    init_logging();
    MeshNode::new("/wave", mesh, import, ExportSettings::default())
}

#[test]
fn test_wave_mesh_is_fully_triangulated() {
    let mut node = mesh_node(wave_mesh(8, &[0.0]), ImportSettings::default());
    let view = node.read_sample(0.0);

    assert_eq!(view.num_points(), 81);
    assert_eq!(view.sample.num_indices, 64 * 4);
    assert_eq!(view.sample.indices_triangulated.len(), 64 * 6);
    assert_eq!(view.sample.normals.len(), 81);
    // The wave stays close to the XZ plane, so normals lean up.
    assert!(view.sample.normals.iter().all(|n| n.y > 0.0));
}

#[test]
fn test_unchanged_sample_short_circuit() {
    let mut node = mesh_node(wave_mesh(4, &[0.0, 10.0]), ImportSettings::default());

    let first = node.update_sample(5.0);
    assert!(first.contains(UpdateFlags::SAMPLE_UPDATED));
    let mut before = MeshData::default();
    before.fill_from(&node.view());

    let second = node.update_sample(5.0);
    assert!(!second.contains(UpdateFlags::SAMPLE_UPDATED));
    let mut after = MeshData::default();
    after.fill_from(&node.view());
    assert_eq!(before, after);
}

#[test]
fn test_times_clamped_to_same_end_do_not_update() {
    let mut node = mesh_node(wave_mesh(2, &[0.0, 10.0]), ImportSettings::default());
    node.update_sample(12.0);
    assert!(node.update_sample(20.0).is_empty());
    assert!(node.update_sample(3.0).contains(UpdateFlags::SAMPLE_UPDATED));
}

#[test]
fn test_homogeneous_topology_is_reused() {
    let mut node = mesh_node(wave_mesh(4, &[0.0, 1.0]), ImportSettings::default());
    assert_eq!(node.summary().topology_variance, TopologyVariance::Homogeneous);

    node.read_sample(0.0);
    assert!(node.flags().contains(UpdateFlags::TOPOLOGY_CHANGED));
    let heights_before: Vec<f32> = node.view().sample.points.iter().map(|p| p.y).collect();

    node.read_sample(1.0);
    let flags = node.flags();
    assert!(flags.contains(UpdateFlags::SAMPLE_UPDATED));
    assert!(!flags.contains(UpdateFlags::TOPOLOGY_CHANGED));
    let heights_after: Vec<f32> = node.view().sample.points.iter().map(|p| p.y).collect();
    assert_ne!(heights_before, heights_after);
}

#[test]
fn test_heterogeneous_topology_is_retriangulated() {
    let mesh = MemoryMesh::new()
        .with_frame(0.0, wave_frame(2, 0.0))
        .with_frame(1.0, wave_frame(3, 1.0));
    let mut node = mesh_node(mesh, ImportSettings::default());
    assert_eq!(node.summary().topology_variance, TopologyVariance::Heterogeneous);

    assert_eq!(node.read_sample(0.0).sample.num_indices_triangulated, 4 * 6);
    assert_eq!(node.read_sample(1.0).sample.num_indices_triangulated, 9 * 6);
    assert!(node.flags().contains(UpdateFlags::TOPOLOGY_CHANGED));
}

#[test]
fn test_submesh_partition_is_complete() {
    let settings = ImportSettings {
        split_unit: 90,
        ..Default::default()
    };
    let mut node = mesh_node(wave_mesh(10, &[0.0]), settings);
    let view = node.read_sample(0.0);
    let sample = view.sample;

    assert_eq!(sample.num_indices_triangulated, 600);
    assert_eq!(view.submeshes.len(), 7);

    let mut gathered = Vec::new();
    for submesh in view.submeshes {
        let expected: Vec<u32> = (0..submesh.indices.len() as u32).collect();
        assert_eq!(submesh.indices, expected);
        assert!(submesh.indices.len() <= 90);
        gathered.extend_from_slice(&submesh.points);
    }
    assert_eq!(view.submeshes[6].indices.len(), 60);

    let expected: Vec<Vec3> = sample
        .indices_triangulated
        .iter()
        .map(|&i| sample.points[i as usize])
        .collect();
    assert_eq!(gathered, expected);
}

#[test]
fn test_submesh_buffers_are_retained_when_shrinking() {
    let mesh = MemoryMesh::new()
        .with_frame(0.0, wave_frame(6, 0.0))
        .with_frame(1.0, wave_frame(2, 1.0));
    let settings = ImportSettings {
        split_unit: 24,
        ..Default::default()
    };
    let mut node = mesh_node(mesh, settings);
    assert_eq!(node.read_sample(0.0).submeshes.len(), 9);
    // Nine points fall under the unit, so the small frame is not split.
    assert!(node.read_sample(1.0).submeshes.is_empty());
}

#[test]
fn test_copy_mode_fills_caller_buffers() {
    let mut node = mesh_node(wave_mesh(3, &[0.0]), ImportSettings::default());
    let mut data = MeshData::default();
    assert!(node.read_sample_into(0.0, &mut data));
    assert_eq!(data.points.len(), 16);
    assert_eq!(data.indices_triangulated.len(), 54);
    assert_eq!(data.uvs.len(), 16);

    let mut empty = mesh_node(MemoryMesh::new(), ImportSettings::default());
    assert!(!empty.read_sample_into(0.0, &mut data));
    assert!(data.points.is_empty());
}

#[test]
fn test_each_sample_visits_authored_times() {
    let mut node = mesh_node(wave_mesh(2, &[0.0, 0.5, 1.0]), ImportSettings::default());
    let mut visited = Vec::new();
    let n = node.each_sample(|view, t| visited.push((t, view.num_points())));
    assert_eq!(n, 3);
    assert_eq!(visited, vec![(0.0, 9), (0.5, 9), (1.0, 9)]);
}

#[test]
fn test_each_sample_without_samples_uses_default_time() {
    let mut node = mesh_node(MemoryMesh::new(), ImportSettings::default());
    let mut times = Vec::new();
    assert_eq!(node.each_sample(|_, t| times.push(t)), 1);
    assert_eq!(times, vec![0.0]);
}

#[test]
fn test_handedness_inversion_is_idempotent() {
    let original = wave_frame(5, 0.3).points;
    let mut points = original.clone();
    invert_x(&mut points);
    assert_ne!(points, original);
    invert_x(&mut points);
    assert_eq!(points, original);
}

#[test]
fn test_written_mesh_reads_back() {
    let mut node = mesh_node(MemoryMesh::new(), ImportSettings::default());
    let mut data = MeshData::default();
    let mut source = mesh_node(wave_mesh(2, &[0.0]), ImportSettings::default());
    source.read_sample_into(0.0, &mut data);

    node.write_sample(&data, 0.0).unwrap();
    let view = node.read_sample(0.0);
    assert_eq!(view.sample.points, data.points);
    assert_eq!(view.sample.normals, data.normals);
    assert_eq!(view.sample.counts, data.counts);
    assert_eq!(
        view.sample.indices_triangulated.len(),
        data.indices_triangulated.len()
    );
}
