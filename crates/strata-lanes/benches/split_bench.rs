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

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use strata_core::{ExportSettings, ImportSettings};
use strata_lanes::mesh::triangulate::triangulate;
use strata_lanes::mesh::MeshNode;

#[path = "../tests/common/mod.rs"]
mod common;

use common::{wave_frame, wave_mesh};

fn bench_split(c: &mut Criterion) {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error"))
        .try_init();

    // 512 x 512 quads, about 1.5M triangle corners.
    let frame = wave_frame(512, 0.0);
    let mut group = c.benchmark_group("Mesh Resampling");

    group.bench_function("Triangulate 512x512", |b| {
        let mut dst = Vec::new();
        b.iter(|| {
            triangulate(&frame.topology.counts, Some(&frame.topology.indices), true, &mut dst)
                .unwrap();
            black_box(dst.len());
        });
    });

    group.bench_function("Full sample with split 512x512", |b| {
        b.iter_batched(
            || {
                let mesh = wave_mesh(512, &[0.0]);
                MeshNode::new("/bench", mesh, ImportSettings::default(), ExportSettings::default())
            },
            |mut node| {
                let view = node.read_sample(0.0);
                black_box(view.submeshes.len());
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_split);
criterion_main!(benches);
