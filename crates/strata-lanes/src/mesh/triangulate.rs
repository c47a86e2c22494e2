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

//! Polygon fan triangulation.
//!
//! Every polygon `[c0, c1, .., cn-1]` is split into the fan
//! `(c0, c[i+1], c[i+2])` for `i` in `0..n-2`. With `swap_face` the last two
//! corners of each triangle trade places, which reverses the winding.
//! Non-convex polygons may produce overlapping triangles.

use strata_core::source::Topology;
use strata_core::StrataError;

/// Corner offsets of each triangle of the fan over `counts`, in corner
/// stream order. Polygons with fewer than three corners yield nothing.
pub fn fan_triangles(counts: &[u32], swap_face: bool) -> impl Iterator<Item = [usize; 3]> + '_ {
    let (i1, i2) = if swap_face { (2, 1) } else { (1, 2) };
    counts
        .iter()
        .scan(0usize, |offset, &n| {
            let start = *offset;
            *offset += n as usize;
            Some((start, n as usize))
        })
        .flat_map(move |(start, n)| {
            (0..n.saturating_sub(2)).map(move |i| [start, start + i + i1, start + i + i2])
        })
}

/// Returns `(corner count, triangulated corner count)` of a polygon stream.
pub fn count_indices(counts: &[u32]) -> (usize, usize) {
    counts.iter().fold((0, 0), |(corners, tri), &n| {
        let n = n as usize;
        (corners + n, tri + n.saturating_sub(2) * 3)
    })
}

/// Writes the running sum of `counts` (the first corner of each polygon).
pub fn compute_offsets(counts: &[u32], dst: &mut Vec<u32>) {
    dst.clear();
    dst.reserve(counts.len());
    let mut offset = 0u32;
    for &n in counts {
        dst.push(offset);
        offset += n;
    }
}

/// Checks that every polygon has at least three corners and that
/// `indices`, when given, covers exactly the corner stream.
pub fn validate_counts(counts: &[u32], indices: Option<&[u32]>) -> Result<(), StrataError> {
    if let Some(face) = counts.iter().position(|&n| n < 3) {
        return Err(StrataError::malformed_topology(format!(
            "polygon {face} has {} corners",
            counts[face]
        )));
    }
    if let Some(indices) = indices {
        let (corners, _) = count_indices(counts);
        if corners != indices.len() {
            return Err(StrataError::malformed_topology(format!(
                "counts describe {corners} corners but {} indices were given",
                indices.len()
            )));
        }
    }
    Ok(())
}

/// Builds the triangle index stream of a polygon mesh into `dst`.
///
/// Without `indices` the output refers to corner positions directly, which
/// is the map used for attributes stored per corner. The output holds
/// exactly `3 * Σ(count - 2)` entries.
pub fn triangulate(
    counts: &[u32],
    indices: Option<&[u32]>,
    swap_face: bool,
    dst: &mut Vec<u32>,
) -> Result<(), StrataError> {
    validate_counts(counts, indices)?;

    let (_, num_triangulated) = count_indices(counts);
    dst.clear();
    dst.reserve(num_triangulated);
    for tri in fan_triangles(counts, swap_face) {
        match indices {
            Some(indices) => dst.extend(tri.iter().map(|&c| indices[c])),
            None => dst.extend(tri.iter().map(|&c| c as u32)),
        }
    }
    Ok(())
}

/// Prepares fetched topology for triangulation against `num_points` vertices.
///
/// Polygons with fewer than three corners are dropped together with their
/// indices, and their count is returned. A length mismatch or an index out
/// of range rejects the whole topology.
pub fn sanitize_topology(topology: &mut Topology, num_points: usize) -> Result<usize, StrataError> {
    let (corners, _) = count_indices(&topology.counts);
    if corners != topology.indices.len() {
        return Err(StrataError::malformed_topology(format!(
            "counts describe {corners} corners but {} indices were fetched",
            topology.indices.len()
        )));
    }
    if let Some(bad) = topology.indices.iter().find(|&&i| i as usize >= num_points) {
        return Err(StrataError::malformed_topology(format!(
            "index {bad} out of range for {num_points} points"
        )));
    }

    let degenerate = topology.counts.iter().filter(|&&n| n < 3).count();
    if degenerate > 0 {
        let mut kept_indices = Vec::with_capacity(topology.indices.len());
        let mut offset = 0usize;
        for &n in &topology.counts {
            let end = offset + n as usize;
            if n >= 3 {
                kept_indices.extend_from_slice(&topology.indices[offset..end]);
            }
            offset = end;
        }
        topology.counts.retain(|&n| n >= 3);
        topology.indices = kept_indices;
    }
    Ok(degenerate)
}

/// Reverses the corner order of every polygon.
pub fn reverse_winding(counts: &[u32], indices: &mut [u32]) {
    let mut offset = 0usize;
    for &n in counts {
        let end = (offset + n as usize).min(indices.len());
        indices[offset..end].reverse();
        offset = end;
    }
}
