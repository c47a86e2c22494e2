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

//! Per-vertex normal and tangent synthesis for polygon meshes.
//!
//! Both passes walk the same fan triangles the triangulator emits, so the
//! synthesized frames agree with the rendered winding.

use strata_core::math::{Vec2, Vec3, Vec4};
use strata_core::NormalWeighting;

use super::triangulate::fan_triangles;

/// Smallest UV-space determinant that still yields a usable tangent.
const MIN_UV_AREA: f32 = 1e-12;

/// Vertex indices of a fan triangle, skipping triangles that reference
/// vertices outside `0..num_points`.
#[inline]
fn triangle_vertices(tri: [usize; 3], indices: &[u32], num_points: usize) -> Option<[usize; 3]> {
    let v = [
        *indices.get(tri[0])? as usize,
        *indices.get(tri[1])? as usize,
        *indices.get(tri[2])? as usize,
    ];
    v.iter().all(|&i| i < num_points).then_some(v)
}

/// Computes one normal per point into `dst`.
///
/// Each fan triangle adds its face normal to its three vertices; with
/// [`NormalWeighting::Area`] the unnormalized cross product is used, so
/// larger faces weigh more. Zero-area triangles contribute nothing and a
/// vertex with no contribution gets a zero normal.
pub fn generate_normals(
    dst: &mut Vec<Vec3>,
    points: &[Vec3],
    counts: &[u32],
    indices: &[u32],
    swap_face: bool,
    weighting: NormalWeighting,
) {
    dst.clear();
    dst.resize(points.len(), Vec3::ZERO);

    for tri in fan_triangles(counts, swap_face) {
        let Some([a, b, c]) = triangle_vertices(tri, indices, points.len()) else {
            continue;
        };
        let face = (points[b] - points[a]).cross(points[c] - points[a]);
        let face = match weighting {
            NormalWeighting::Area => face,
            NormalWeighting::Uniform => face.normalize_or_zero(0.0),
        };
        if face.length_squared() == 0.0 || !face.length_squared().is_finite() {
            continue;
        }
        dst[a] += face;
        dst[b] += face;
        dst[c] += face;
    }

    for n in dst.iter_mut() {
        *n = n.normalize_or_zero(0.0);
    }
}

/// Computes one tangent per point into `dst`; `w` holds the bitangent sign.
///
/// UVs may be stored per vertex or per polygon corner. Tangents are
/// orthogonalized against `normals` when those are per vertex. Without UVs
/// every tangent is zero.
pub fn generate_tangents(
    dst: &mut Vec<Vec4>,
    points: &[Vec3],
    normals: &[Vec3],
    uvs: &[Vec2],
    counts: &[u32],
    indices: &[u32],
) {
    dst.clear();
    dst.resize(points.len(), Vec4::ZERO);
    if uvs.is_empty() {
        return;
    }

    let uv_per_corner = uvs.len() == indices.len() && uvs.len() != points.len();
    let mut tangents = vec![Vec3::ZERO; points.len()];
    let mut bitangents = vec![Vec3::ZERO; points.len()];

    for tri in fan_triangles(counts, false) {
        let Some(v) = triangle_vertices(tri, indices, points.len()) else {
            continue;
        };
        let uv_slot = |k: usize| if uv_per_corner { tri[k] } else { v[k] };
        let (Some(&uv0), Some(&uv1), Some(&uv2)) =
            (uvs.get(uv_slot(0)), uvs.get(uv_slot(1)), uvs.get(uv_slot(2)))
        else {
            continue;
        };

        let e1 = points[v[1]] - points[v[0]];
        let e2 = points[v[2]] - points[v[0]];
        let d1 = uv1 - uv0;
        let d2 = uv2 - uv0;
        let det = d1.x * d2.y - d2.x * d1.y;
        if det.abs() < MIN_UV_AREA || !det.is_finite() {
            continue;
        }
        let r = 1.0 / det;
        let t = (e1 * d2.y - e2 * d1.y) * r;
        let b = (e2 * d1.x - e1 * d2.x) * r;
        for &i in &v {
            tangents[i] += t;
            bitangents[i] += b;
        }
    }

    let has_vertex_normals = normals.len() == points.len();
    for (i, out) in dst.iter_mut().enumerate() {
        let n = if has_vertex_normals { normals[i] } else { Vec3::ZERO };
        // Gram-Schmidt against the normal.
        let t = (tangents[i] - n * n.dot(tangents[i])).normalize_or_zero(0.0);
        if t == Vec3::ZERO {
            continue;
        }
        let w = if n.cross(t).dot(bitangents[i]) < 0.0 { -1.0 } else { 1.0 };
        *out = Vec4::from_vec3(t, w);
    }
}
