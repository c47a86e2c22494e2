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

//! Unit quaternions and Euler-angle reconstruction.

use serde::{Deserialize, Serialize};

use super::{Mat3, Vec3, DEG_TO_RAD, EPSILON, RAD_TO_DEG};
use std::ops::{Mul, MulAssign, Neg};

/// The axis order of a three-angle Euler rotation.
///
/// The name lists the axes in the order they are applied: `Xyz` rotates
/// about X first, then Y, then Z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RotationOrder {
    /// X, then Y, then Z.
    Xyz,
    /// X, then Z, then Y.
    Xzy,
    /// Y, then X, then Z.
    Yxz,
    /// Y, then Z, then X.
    Yzx,
    /// Z, then X, then Y.
    Zxy,
    /// Z, then Y, then X.
    Zyx,
}

impl RotationOrder {
    /// All six orders.
    pub const ALL: [RotationOrder; 6] = [
        RotationOrder::Xyz,
        RotationOrder::Xzy,
        RotationOrder::Yxz,
        RotationOrder::Yzx,
        RotationOrder::Zxy,
        RotationOrder::Zyx,
    ];
}

/// A rotation stored as `(x, y, z, w)`, where `w` is the scalar part.
///
/// Multiplication follows the Hamilton product: `a * b` applies `b` first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(C)]
pub struct Quaternion {
    /// The x component of the vector part.
    pub x: f32,
    /// The y component of the vector part.
    pub y: f32,
    /// The z component of the vector part.
    pub z: f32,
    /// The scalar (real) part.
    pub w: f32,
}

impl Quaternion {
    /// The identity quaternion, representing no rotation.
    pub const IDENTITY: Quaternion = Quaternion {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    /// Creates a new quaternion from its raw components.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Creates a rotation of `angle_radians` around `axis`.
    #[inline]
    pub fn from_axis_angle(axis: Vec3, angle_radians: f32) -> Self {
        let axis = axis.normalize();
        let (s, c) = (angle_radians * 0.5).sin_cos();
        Self::new(axis.x * s, axis.y * s, axis.z * s, c)
    }

    /// Rotation about the X axis by an angle in degrees.
    #[inline]
    pub fn rotate_x_degrees(angle: f32) -> Self {
        Self::from_axis_angle(Vec3::X, angle * DEG_TO_RAD)
    }

    /// Rotation about the Y axis by an angle in degrees.
    #[inline]
    pub fn rotate_y_degrees(angle: f32) -> Self {
        Self::from_axis_angle(Vec3::Y, angle * DEG_TO_RAD)
    }

    /// Rotation about the Z axis by an angle in degrees.
    #[inline]
    pub fn rotate_z_degrees(angle: f32) -> Self {
        Self::from_axis_angle(Vec3::Z, angle * DEG_TO_RAD)
    }

    /// Composes three per-axis rotations, given in degrees, in `order`.
    ///
    /// `Xyz` yields `(qZ * qY) * qX`, so the X rotation is applied first;
    /// every other order follows the same pattern.
    pub fn from_euler_degrees(order: RotationOrder, euler: Vec3) -> Self {
        let qx = Self::rotate_x_degrees(euler.x);
        let qy = Self::rotate_y_degrees(euler.y);
        let qz = Self::rotate_z_degrees(euler.z);
        match order {
            RotationOrder::Xyz => (qz * qy) * qx,
            RotationOrder::Xzy => (qy * qz) * qx,
            RotationOrder::Yxz => (qz * qx) * qy,
            RotationOrder::Yzx => (qx * qz) * qy,
            RotationOrder::Zxy => (qy * qx) * qz,
            RotationOrder::Zyx => (qx * qy) * qz,
        }
    }

    /// Recovers `Zxy` Euler angles, in degrees, from this rotation.
    ///
    /// Near the poles (`|pitch| ≈ 90°`) the Z angle is folded into Y and
    /// reported as zero.
    pub fn to_euler_zxy_degrees(&self) -> Vec3 {
        const SINGULARITY_CUTOFF: f32 = 0.499_999;

        let (x, y, z, w) = (self.x, self.y, self.z, self.w);
        let (xx, xy, xz, xw) = (x * x, x * y, x * z, x * w);
        let (yy, yz, yw) = (y * y, y * z, y * w);
        let (zz, zw) = (z * z, z * w);
        let ww = w * w;

        let pole = yz - xw;
        let pitch = -(2.0 * pole).clamp(-1.0, 1.0).asin();

        let euler = if pole.abs() < SINGULARITY_CUTOFF {
            Vec3::new(
                pitch,
                (2.0 * (xz + yw)).atan2(zz - xx - yy + ww),
                (2.0 * (xy + zw)).atan2(yy - zz - xx + ww),
            )
        } else {
            let a = xy + zw;
            let b = xw - yz;
            let c = xy - zw;
            let e = yz + xw;
            Vec3::new(pitch, (a * e + b * c).atan2(b * e - a * c), 0.0)
        };
        euler * RAD_TO_DEG
    }

    /// Builds a rotation from an orthonormal 3x3 matrix.
    pub fn from_rotation_matrix(m: &Mat3) -> Self {
        let (m00, m10, m20) = (m.cols[0].x, m.cols[0].y, m.cols[0].z);
        let (m01, m11, m21) = (m.cols[1].x, m.cols[1].y, m.cols[1].z);
        let (m02, m12, m22) = (m.cols[2].x, m.cols[2].y, m.cols[2].z);

        let trace = m00 + m11 + m22;
        let q = if trace > 0.0 {
            let s = 2.0 * (trace + 1.0).sqrt();
            Self::new((m21 - m12) / s, (m02 - m20) / s, (m10 - m01) / s, 0.25 * s)
        } else if m00 > m11 && m00 > m22 {
            let s = 2.0 * (1.0 + m00 - m11 - m22).sqrt();
            Self::new(0.25 * s, (m01 + m10) / s, (m02 + m20) / s, (m21 - m12) / s)
        } else if m11 > m22 {
            let s = 2.0 * (1.0 + m11 - m00 - m22).sqrt();
            Self::new((m01 + m10) / s, 0.25 * s, (m12 + m21) / s, (m02 - m20) / s)
        } else {
            let s = 2.0 * (1.0 + m22 - m00 - m11).sqrt();
            Self::new((m02 + m20) / s, (m12 + m21) / s, 0.25 * s, (m10 - m01) / s)
        };
        q.normalize()
    }

    /// Squared magnitude.
    #[inline]
    pub fn magnitude_squared(&self) -> f32 {
        self.dot(*self)
    }

    /// Returns the quaternion scaled to unit length, or identity if it is degenerate.
    #[inline]
    pub fn normalize(&self) -> Self {
        let mag = self.magnitude_squared().sqrt();
        if mag > EPSILON && mag.is_finite() {
            let inv = 1.0 / mag;
            Self::new(self.x * inv, self.y * inv, self.z * inv, self.w * inv)
        } else {
            Self::IDENTITY
        }
    }

    /// The conjugate, which is the inverse for unit quaternions.
    #[inline]
    pub fn conjugate(&self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    /// 4D dot product.
    #[inline]
    pub fn dot(&self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    /// Rotates a vector.
    #[inline]
    pub fn rotate_vec3(&self, v: Vec3) -> Vec3 {
        let u = Vec3::new(self.x, self.y, self.z);
        let t = u.cross(v) * 2.0;
        v + t * self.w + u.cross(t)
    }

    /// The same rotation expressed in a space mirrored across the YZ plane.
    ///
    /// Mirroring X keeps the rotation about X and reverses the rotations
    /// about Y and Z.
    #[inline]
    pub fn swap_handedness(&self) -> Self {
        Self::new(self.x, -self.y, -self.z, self.w)
    }

    /// Component-wise comparison with an absolute tolerance.
    #[inline]
    pub fn near_equal(&self, other: Self, epsilon: f32) -> bool {
        (self.x - other.x).abs() <= epsilon
            && (self.y - other.y).abs() <= epsilon
            && (self.z - other.z).abs() <= epsilon
            && (self.w - other.w).abs() <= epsilon
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul<Quaternion> for Quaternion {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        )
    }
}

impl MulAssign<Quaternion> for Quaternion {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl Mul<Vec3> for Quaternion {
    type Output = Vec3;

    #[inline]
    fn mul(self, rhs: Vec3) -> Vec3 {
        self.rotate_vec3(rhs)
    }
}

impl Neg for Quaternion {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, -self.w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Mat4;
    use approx::assert_relative_eq;

    fn vec3_approx_eq(a: Vec3, b: Vec3) -> bool {
        a.near_equal(b, 1e-4)
    }

    #[test]
    fn test_rotate_z_quarter_turn() {
        let q = Quaternion::rotate_z_degrees(90.0);
        assert!(vec3_approx_eq(q * Vec3::X, Vec3::Y));
    }

    #[test]
    fn test_xyz_applies_x_first() {
        let euler = Vec3::new(90.0, 90.0, 0.0);
        let q = Quaternion::from_euler_degrees(RotationOrder::Xyz, euler);
        // X first takes Z to -Y, then Y leaves -Y alone.
        assert!(vec3_approx_eq(q * Vec3::Z, -Vec3::Y));
        let expected = Quaternion::rotate_y_degrees(90.0) * Quaternion::rotate_x_degrees(90.0);
        assert!(q.near_equal(expected, 1e-6));
    }

    #[test]
    fn test_euler_orders_match_matrix_products() {
        let euler = Vec3::new(15.0, -40.0, 70.0);
        let rx = Mat4::from_quat(Quaternion::rotate_x_degrees(euler.x));
        let ry = Mat4::from_quat(Quaternion::rotate_y_degrees(euler.y));
        let rz = Mat4::from_quat(Quaternion::rotate_z_degrees(euler.z));
        let cases = [
            (RotationOrder::Xyz, rz * ry * rx),
            (RotationOrder::Xzy, ry * rz * rx),
            (RotationOrder::Yxz, rz * rx * ry),
            (RotationOrder::Yzx, rx * rz * ry),
            (RotationOrder::Zxy, ry * rx * rz),
            (RotationOrder::Zyx, rx * ry * rz),
        ];
        let probe = Vec3::new(0.3, -1.2, 2.0);
        for (order, m) in cases {
            let q = Quaternion::from_euler_degrees(order, euler);
            assert!(
                vec3_approx_eq(q * probe, m.transform_point(probe)),
                "order {order:?}"
            );
        }
    }

    #[test]
    fn test_to_euler_zxy_roundtrip() {
        let euler = Vec3::new(10.0, 20.0, 30.0);
        let q = Quaternion::from_euler_degrees(RotationOrder::Zxy, euler);
        let back = q.to_euler_zxy_degrees();
        assert_relative_eq!(back.x, 10.0, epsilon = 1e-3);
        assert_relative_eq!(back.y, 20.0, epsilon = 1e-3);
        assert_relative_eq!(back.z, 30.0, epsilon = 1e-3);
    }

    #[test]
    fn test_from_rotation_matrix_recovers_quaternion() {
        let q = Quaternion::from_euler_degrees(RotationOrder::Zyx, Vec3::new(30.0, 45.0, -60.0));
        let m = Mat3::from_quat(q);
        let back = Quaternion::from_rotation_matrix(&m);
        // q and -q encode the same rotation.
        assert!(back.near_equal(q, 1e-5) || back.near_equal(-q, 1e-5));
    }

    #[test]
    fn test_swap_handedness_matches_mirrored_matrix() {
        let q = Quaternion::from_euler_degrees(RotationOrder::Xyz, Vec3::new(25.0, -35.0, 80.0));
        let mirror = Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0));
        let mirrored = mirror * Mat4::from_quat(q) * mirror;
        let probe = Vec3::new(1.0, 2.0, 3.0);
        assert!(vec3_approx_eq(
            q.swap_handedness() * probe,
            mirrored.transform_point(probe)
        ));
    }

    #[test]
    fn test_degenerate_normalize_is_identity() {
        let q = Quaternion::new(0.0, 0.0, 0.0, 0.0);
        assert_eq!(q.normalize(), Quaternion::IDENTITY);
    }
}
