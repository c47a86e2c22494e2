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

//! Column-major 3x3 and 4x4 matrices.

use super::{Quaternion, Vec3, Vec4, EPSILON};
use std::ops::Mul;

// --- Mat3 ---

/// A 3x3 column-major matrix, used for the rotational part of transforms.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct Mat3 {
    /// The columns of the matrix.
    pub cols: [Vec3; 3],
}

impl Mat3 {
    /// The identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [Vec3::X, Vec3::Y, Vec3::Z],
    };

    /// Creates a matrix from three columns.
    #[inline]
    pub const fn from_cols(c0: Vec3, c1: Vec3, c2: Vec3) -> Self {
        Self { cols: [c0, c1, c2] }
    }

    /// Rotation matrix of a unit quaternion.
    pub fn from_quat(q: Quaternion) -> Self {
        let (x2, y2, z2) = (q.x + q.x, q.y + q.y, q.z + q.z);
        let (xx, xy, xz) = (q.x * x2, q.x * y2, q.x * z2);
        let (yy, yz, zz) = (q.y * y2, q.y * z2, q.z * z2);
        let (wx, wy, wz) = (q.w * x2, q.w * y2, q.w * z2);

        Self::from_cols(
            Vec3::new(1.0 - (yy + zz), xy + wz, xz - wy),
            Vec3::new(xy - wz, 1.0 - (xx + zz), yz + wx),
            Vec3::new(xz + wy, yz - wx, 1.0 - (xx + yy)),
        )
    }

    /// Determinant.
    #[inline]
    pub fn determinant(&self) -> f32 {
        self.cols[0].dot(self.cols[1].cross(self.cols[2]))
    }
}

// --- Mat4 ---

/// A 4x4 column-major matrix.
///
/// A point `p` is transformed as `M * p`; the translation lives in the
/// fourth column.
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Mat4 {
    /// The columns of the matrix.
    pub cols: [Vec4; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    /// The identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [
            Vec4::new(1.0, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 1.0, 0.0, 0.0),
            Vec4::new(0.0, 0.0, 1.0, 0.0),
            Vec4::new(0.0, 0.0, 0.0, 1.0),
        ],
    };

    /// Creates a matrix from four columns.
    #[inline]
    pub const fn from_cols(c0: Vec4, c1: Vec4, c2: Vec4, c3: Vec4) -> Self {
        Self {
            cols: [c0, c1, c2, c3],
        }
    }

    /// Translation matrix.
    #[inline]
    pub fn from_translation(t: Vec3) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[3] = Vec4::from_vec3(t, 1.0);
        m
    }

    /// Non-uniform scale matrix.
    #[inline]
    pub fn from_scale(s: Vec3) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[0].x = s.x;
        m.cols[1].y = s.y;
        m.cols[2].z = s.z;
        m
    }

    /// Rotation matrix of a unit quaternion.
    #[inline]
    pub fn from_quat(q: Quaternion) -> Self {
        let r = Mat3::from_quat(q);
        Self::from_cols(
            Vec4::from_vec3(r.cols[0], 0.0),
            Vec4::from_vec3(r.cols[1], 0.0),
            Vec4::from_vec3(r.cols[2], 0.0),
            Vec4::new(0.0, 0.0, 0.0, 1.0),
        )
    }

    /// Composes `T * R * S`.
    pub fn from_trs(translation: Vec3, rotation: Quaternion, scale: Vec3) -> Self {
        Self::from_translation(translation) * Self::from_quat(rotation) * Self::from_scale(scale)
    }

    /// The element in `row` of column `col`.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        let c = self.cols[col];
        match row {
            0 => c.x,
            1 => c.y,
            2 => c.z,
            _ => c.w,
        }
    }

    /// Row `i` as a vector.
    #[inline]
    fn row(&self, i: usize) -> Vec4 {
        Vec4::new(self.get(i, 0), self.get(i, 1), self.get(i, 2), self.get(i, 3))
    }

    /// Transforms a point, applying translation.
    #[inline]
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        (*self * Vec4::from_vec3(p, 1.0)).truncate()
    }

    /// The translation column.
    #[inline]
    pub fn translation(&self) -> Vec3 {
        self.cols[3].truncate()
    }

    /// Splits the matrix into translation, rotation and scale.
    ///
    /// Scale is the length of each basis column and rotation comes from the
    /// orthonormalized basis. A negative determinant is folded into the X
    /// scale. Shear is not representable and is lost.
    pub fn to_translation_rotation_scale(&self) -> (Vec3, Quaternion, Vec3) {
        let translation = self.translation();
        let mut basis = [
            self.cols[0].truncate(),
            self.cols[1].truncate(),
            self.cols[2].truncate(),
        ];
        let mut scale = Vec3::new(basis[0].length(), basis[1].length(), basis[2].length());

        if Mat3::from_cols(basis[0], basis[1], basis[2]).determinant() < 0.0 {
            scale.x = -scale.x;
            basis[0] = -basis[0];
        }

        if scale.x.abs() < EPSILON || scale.y.abs() < EPSILON || scale.z.abs() < EPSILON {
            return (translation, Quaternion::IDENTITY, scale);
        }

        let x = basis[0].normalize();
        let y = (basis[1] - x * x.dot(basis[1])).normalize();
        let z = x.cross(y);
        let rotation = Quaternion::from_rotation_matrix(&Mat3::from_cols(x, y, z));
        (translation, rotation, scale)
    }

    /// The same transform expressed in a space mirrored across the YZ plane
    /// (`S * M * S` with `S = diag(-1, 1, 1, 1)`).
    pub fn swap_handedness(&self) -> Self {
        let mirror = Self::from_scale(Vec3::new(-1.0, 1.0, 1.0));
        mirror * *self * mirror
    }

    /// Element-wise comparison with an absolute tolerance.
    pub fn near_equal(&self, other: &Self, epsilon: f32) -> bool {
        self.cols
            .iter()
            .zip(other.cols.iter())
            .all(|(a, b)| a.near_equal(*b, epsilon))
    }
}

impl Mul<Mat4> for Mat4 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let rows = [self.row(0), self.row(1), self.row(2), self.row(3)];
        let mut out = Self::IDENTITY;
        for (c, col) in rhs.cols.iter().enumerate() {
            out.cols[c] = Vec4::new(
                rows[0].dot(*col),
                rows[1].dot(*col),
                rows[2].dot(*col),
                rows[3].dot(*col),
            );
        }
        out
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;

    #[inline]
    fn mul(self, v: Vec4) -> Vec4 {
        self.cols[0] * v.x + self.cols[1] * v.y + self.cols[2] * v.z + self.cols[3] * v.w
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::quaternion::RotationOrder;
    use approx::assert_relative_eq;

    fn assert_vec3_approx_eq(a: Vec3, b: Vec3) {
        assert!(a.near_equal(b, 1e-4), "{a:?} != {b:?}");
    }

    #[test]
    fn test_trs_composition_applies_scale_first() {
        let m = Mat4::from_trs(
            Vec3::new(10.0, 0.0, 0.0),
            Quaternion::rotate_z_degrees(90.0),
            Vec3::new(2.0, 2.0, 2.0),
        );
        assert_vec3_approx_eq(m.transform_point(Vec3::X), Vec3::new(10.0, 2.0, 0.0));
    }

    #[test]
    fn test_decompose_trs() {
        let t = Vec3::new(1.0, -2.0, 3.0);
        let r = Quaternion::from_euler_degrees(RotationOrder::Xyz, Vec3::new(10.0, 20.0, 30.0));
        let s = Vec3::new(2.0, 3.0, 4.0);
        let (t2, r2, s2) = Mat4::from_trs(t, r, s).to_translation_rotation_scale();
        assert_vec3_approx_eq(t2, t);
        assert_vec3_approx_eq(s2, s);
        assert!(r2.near_equal(r, 1e-4) || r2.near_equal(-r, 1e-4));
    }

    #[test]
    fn test_decompose_negative_determinant_folds_into_x() {
        let m = Mat4::from_scale(Vec3::new(-2.0, 1.0, 1.0));
        let (_, r, s) = m.to_translation_rotation_scale();
        assert_relative_eq!(s.x, -2.0);
        assert!(r.near_equal(Quaternion::IDENTITY, 1e-5));
    }

    #[test]
    fn test_decompose_zero_scale_keeps_identity_rotation() {
        let m = Mat4::from_scale(Vec3::new(0.0, 1.0, 1.0));
        let (_, r, _) = m.to_translation_rotation_scale();
        assert_eq!(r, Quaternion::IDENTITY);
    }

    #[test]
    fn test_swap_handedness_is_involution() {
        let m = Mat4::from_trs(
            Vec3::new(1.0, 2.0, 3.0),
            Quaternion::rotate_y_degrees(30.0),
            Vec3::ONE,
        );
        assert!(m.swap_handedness().swap_handedness().near_equal(&m, 1e-6));
        assert_relative_eq!(m.swap_handedness().translation().x, -1.0);
    }
}
