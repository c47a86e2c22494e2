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

//! Parallel resampling of a whole scene.

use rayon::prelude::*;
use strata_core::Time;

use crate::arena::Scene;

impl Scene {
    /// Resamples every node at `t`, one node per rayon task, and returns
    /// how many nodes did any work.
    ///
    /// Nodes share no mutable state, so no locking is involved.
    pub fn update_all(&mut self, t: Time) -> usize {
        let updated = self
            .nodes
            .par_iter_mut()
            .filter_map(Option::as_mut)
            .map(|node| node.update(t))
            .filter(|flags| !flags.is_empty())
            .count();
        log::trace!("update_all({t}): {updated} nodes resampled");
        updated
    }
}

#[cfg(test)]
mod tests {
    use crate::{NodeKind, PrimDesc, Scene};
    use strata_core::math::Vec3;
    use strata_core::source::{MemoryMesh, MemoryXform, MeshFrame, OpValue, Topology, XformOpKind};

    fn triangle(z: f32) -> MeshFrame {
        MeshFrame {
            points: vec![Vec3::new(0.0, 0.0, z), Vec3::X, Vec3::Y],
            topology: Topology {
                counts: vec![3],
                indices: vec![0, 1, 2],
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_update_all_resamples_every_node() {
        let mut scene = Scene::new();
        let root = scene.add_prim(None, PrimDesc::group("root"));
        for i in 0..32 {
            let mesh = MemoryMesh::new()
                .with_frame(0.0, triangle(0.0))
                .with_frame(1.0, triangle(i as f32));
            scene.add_prim(Some(root), PrimDesc::mesh(format!("m{i}"), mesh));
        }
        let mut xf = MemoryXform::new();
        xf.push_op(XformOpKind::Translate, OpValue::Vector(Vec3::ONE));
        scene.add_prim(Some(root), PrimDesc::xform("xf", xf));

        // Groups never resample.
        assert_eq!(scene.update_all(0.0), 33);
        assert_eq!(scene.update_all(0.0), 0);
        // The static transform holds its single value.
        assert_eq!(scene.update_all(1.0), 32);

        for node in scene.iter() {
            if let NodeKind::Mesh(mesh) = node.kind() {
                assert_eq!(mesh.view().sample.num_indices_triangulated, 3);
            }
        }
    }
}
