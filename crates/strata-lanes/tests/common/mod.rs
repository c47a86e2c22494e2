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

//! Procedural meshes shared by the integration tests.

#![allow(dead_code)]

use strata_core::math::{Vec2, Vec3};
use strata_core::source::{MemoryMesh, MeshFrame, Topology};
use strata_core::Time;

/// Routes `log` output through the test harness.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .is_test(true)
        .try_init();
}

/// A `resolution` x `resolution` grid of quads on XZ, its heights
/// displaced by a sine wave advanced by `t`.
pub fn wave_frame(resolution: u32, t: Time) -> MeshFrame {
    let side = resolution + 1;
    let step = 1.0 / resolution as f32;
    let phase = t as f32;

    let mut points = Vec::with_capacity((side * side) as usize);
    let mut uvs = Vec::with_capacity((side * side) as usize);
    for row in 0..side {
        for col in 0..side {
            let (u, v) = (col as f32 * step, row as f32 * step);
            let height = 0.25 * (u * 6.0 + phase).sin() * (v * 4.0).cos();
            points.push(Vec3::new(u, height, v));
            uvs.push(Vec2::new(u, v));
        }
    }

    let mut topology = Topology::default();
    for row in 0..resolution {
        for col in 0..resolution {
            let i = row * side + col;
            topology.counts.push(4);
            topology.indices.extend_from_slice(&[i, i + side, i + side + 1, i + 1]);
        }
    }

    MeshFrame {
        points,
        uvs,
        topology,
        ..Default::default()
    }
}

/// A wave mesh sampled at every time in `times`.
pub fn wave_mesh(resolution: u32, times: &[Time]) -> MemoryMesh {
    times.iter().fold(MemoryMesh::new(), |mesh, &t| {
        mesh.with_frame(t, wave_frame(resolution, t))
    })
}
