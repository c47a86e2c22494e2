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

//! Fixed-width skin influence records and conversions between widths.
//!
//! Narrowing from 8 to 4 influences keeps the first four slots as stored
//! and renormalizes them. Influences are not re-ranked by weight first, so
//! a dominant influence stored in slots 5..8 is dropped.

use bytemuck::{Pod, Zeroable};
use strata_core::source::SkinAttributes;
use strata_core::StrataError;

/// Up to four bone influences of one vertex.
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct Weights4 {
    /// Influence weights.
    pub weights: [f32; 4],
    /// Bone index of each influence.
    pub indices: [i32; 4],
}

/// Up to eight bone influences of one vertex.
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct Weights8 {
    /// Influence weights.
    pub weights: [f32; 8],
    /// Bone index of each influence.
    pub indices: [i32; 8],
}

/// A fixed-width influence record.
pub trait InfluenceRecord: Copy + Default {
    /// Influences per record.
    const WIDTH: usize;

    /// Builds a record from `WIDTH` weights and indices.
    fn from_slices(weights: &[f32], indices: &[i32]) -> Self;
    /// The weights.
    fn weights(&self) -> &[f32];
    /// The bone indices.
    fn indices(&self) -> &[i32];
}

macro_rules! impl_influence_record {
    ($ty:ident, $width:literal) => {
        impl InfluenceRecord for $ty {
            const WIDTH: usize = $width;

            fn from_slices(weights: &[f32], indices: &[i32]) -> Self {
                let mut out = Self::default();
                out.weights.copy_from_slice(&weights[..$width]);
                out.indices.copy_from_slice(&indices[..$width]);
                out
            }

            fn weights(&self) -> &[f32] {
                &self.weights
            }

            fn indices(&self) -> &[i32] {
                &self.indices
            }
        }
    };
}

impl_influence_record!(Weights4, 4);
impl_influence_record!(Weights8, 8);

impl Weights4 {
    /// Narrows `src` to its first four influences, renormalized to sum to one.
    ///
    /// Returns `None` alongside the raw copy when those four weights sum to
    /// zero and renormalization was skipped.
    pub fn narrow(src: &Weights8) -> (Self, Option<f32>) {
        let mut out = Self::default();
        out.weights.copy_from_slice(&src.weights[..4]);
        out.indices.copy_from_slice(&src.indices[..4]);

        let sum: f32 = out.weights.iter().sum();
        if sum.abs() <= f32::EPSILON {
            return (out, None);
        }
        let inv = 1.0 / sum;
        out.weights.iter_mut().for_each(|w| *w *= inv);
        (out, Some(sum))
    }
}

impl From<&Weights8> for Weights4 {
    fn from(src: &Weights8) -> Self {
        Weights4::narrow(src).0
    }
}

impl From<&Weights4> for Weights8 {
    /// Widens into slots 0..4; slots 4..8 get weight 0 and bone 0.
    fn from(src: &Weights4) -> Self {
        let mut out = Self::default();
        out.weights[..4].copy_from_slice(&src.weights);
        out.indices[..4].copy_from_slice(&src.indices);
        out
    }
}

/// Narrows a whole stream; returns how many records had a zero weight sum.
pub fn narrow_all(src: &[Weights8], dst: &mut Vec<Weights4>) -> usize {
    dst.clear();
    dst.reserve(src.len());
    let mut unnormalized = 0;
    for w in src {
        let (narrowed, sum) = Weights4::narrow(w);
        if sum.is_none() {
            unnormalized += 1;
        }
        dst.push(narrowed);
    }
    if unnormalized > 0 {
        log::debug!("{unnormalized} skin records have zero weight; renormalization skipped");
    }
    unnormalized
}

/// Widens a whole stream.
pub fn widen_all(src: &[Weights4], dst: &mut Vec<Weights8>) {
    dst.clear();
    dst.extend(src.iter().map(Weights8::from));
}

/// Splits flat authored arrays into one record per point.
pub fn unpack<R: InfluenceRecord>(
    skin: &SkinAttributes,
    num_points: usize,
    dst: &mut Vec<R>,
) -> Result<(), StrataError> {
    if skin.max_bone_weights as usize != R::WIDTH {
        return Err(StrataError::skin_mismatch(format!(
            "expected {} influences per vertex, found {}",
            R::WIDTH,
            skin.max_bone_weights
        )));
    }
    if skin.bone_weights.len() != skin.bone_indices.len() {
        return Err(StrataError::skin_mismatch(format!(
            "{} weights but {} indices",
            skin.bone_weights.len(),
            skin.bone_indices.len()
        )));
    }
    if skin.bone_weights.len() != num_points * R::WIDTH {
        return Err(StrataError::skin_mismatch(format!(
            "{} weights for {num_points} points of width {}",
            skin.bone_weights.len(),
            R::WIDTH
        )));
    }

    dst.clear();
    dst.extend(
        skin.bone_weights
            .chunks_exact(R::WIDTH)
            .zip(skin.bone_indices.chunks_exact(R::WIDTH))
            .map(|(w, i)| R::from_slices(w, i)),
    );
    Ok(())
}

/// Flattens records back into authored arrays.
pub fn pack<R: InfluenceRecord>(records: &[R]) -> SkinAttributes {
    SkinAttributes {
        bone_weights: records.iter().flat_map(|r| r.weights().iter().copied()).collect(),
        bone_indices: records.iter().flat_map(|r| r.indices().iter().copied()).collect(),
        max_bone_weights: R::WIDTH as i32,
    }
}
