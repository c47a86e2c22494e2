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

//! Classification of transform op stacks and per-op evaluation.

use strata_core::math::{Mat4, Quaternion, Vec3};
use strata_core::source::{OpValue, XformOpKind};

/// The category an op contributes to when collapsing a stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCategory {
    /// A translation.
    Translate,
    /// Any rotation, including quaternion orients.
    Rotate,
    /// A scale.
    Scale,
    /// Anything that is not a plain translation, rotation or scale.
    Other,
}

impl OpCategory {
    /// The category of `kind`.
    pub fn of(kind: XformOpKind) -> Self {
        match kind {
            XformOpKind::Translate => Self::Translate,
            XformOpKind::RotateX
            | XformOpKind::RotateY
            | XformOpKind::RotateZ
            | XformOpKind::RotateEuler(_)
            | XformOpKind::Orient => Self::Rotate,
            XformOpKind::Scale => Self::Scale,
            XformOpKind::Transform => Self::Other,
        }
    }

    fn rank(self) -> Option<u8> {
        match self {
            Self::Translate => Some(0),
            Self::Rotate => Some(1),
            Self::Scale => Some(2),
            Self::Other => None,
        }
    }
}

/// How a transform node is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XformKind {
    /// Translation, rotation and scale accumulate independently.
    #[default]
    Trs,
    /// Op matrices are multiplied and the product decomposed.
    Matrix,
}

/// Categories of `ops` with runs of the same category merged.
pub fn collapse(ops: &[XformOpKind]) -> Vec<OpCategory> {
    let mut out: Vec<OpCategory> = ops.iter().map(|&k| OpCategory::of(k)).collect();
    out.dedup();
    out
}

/// Classifies an op stack.
///
/// A stack is TRS when its collapsed categories read as translate, then
/// rotate, then scale, each at most once and any of them missing.
pub fn classify(ops: &[XformOpKind]) -> XformKind {
    let mut last = None;
    for category in collapse(ops) {
        match category.rank() {
            Some(rank) if last.map_or(true, |l| rank > l) => last = Some(rank),
            _ => return XformKind::Matrix,
        }
    }
    XformKind::Trs
}

/// Rotation of an Euler op whose angles are `degrees`.
///
/// Non-Euler kinds yield the identity and a warning.
pub fn euler_to_quaternion(kind: XformOpKind, degrees: Vec3) -> Quaternion {
    match kind {
        XformOpKind::RotateEuler(order) => Quaternion::from_euler_degrees(order, degrees),
        other => {
            log::warn!("{other:?} is not an Euler rotation; using identity");
            Quaternion::IDENTITY
        }
    }
}

fn unexpected(kind: XformOpKind, value: OpValue) {
    log::warn!("ignoring {value:?} authored on a {kind:?} op");
}

/// Translation contributed by an op value.
pub fn op_translation(kind: XformOpKind, value: OpValue) -> Vec3 {
    match value {
        OpValue::Vector(v) => v,
        _ => {
            unexpected(kind, value);
            Vec3::ZERO
        }
    }
}

/// Scale contributed by an op value; scalars scale uniformly.
pub fn op_scale(kind: XformOpKind, value: OpValue) -> Vec3 {
    match value {
        OpValue::Vector(v) => v,
        OpValue::Scalar(s) => Vec3::new(s, s, s),
        _ => {
            unexpected(kind, value);
            Vec3::ONE
        }
    }
}

/// Rotation contributed by a rotate or orient op.
pub fn op_rotation(kind: XformOpKind, value: OpValue) -> Quaternion {
    match (kind, value) {
        (XformOpKind::RotateX, OpValue::Scalar(a)) => Quaternion::rotate_x_degrees(a),
        (XformOpKind::RotateY, OpValue::Scalar(a)) => Quaternion::rotate_y_degrees(a),
        (XformOpKind::RotateZ, OpValue::Scalar(a)) => Quaternion::rotate_z_degrees(a),
        (XformOpKind::RotateEuler(_), OpValue::Vector(v)) => euler_to_quaternion(kind, v),
        (XformOpKind::Orient, OpValue::Rotation(q)) => q.normalize(),
        _ => {
            unexpected(kind, value);
            Quaternion::IDENTITY
        }
    }
}

/// The matrix of a single op.
pub fn op_matrix(kind: XformOpKind, value: OpValue) -> Mat4 {
    match OpCategory::of(kind) {
        OpCategory::Translate => Mat4::from_translation(op_translation(kind, value)),
        OpCategory::Rotate => Mat4::from_quat(op_rotation(kind, value)),
        OpCategory::Scale => Mat4::from_scale(op_scale(kind, value)),
        OpCategory::Other => match value {
            OpValue::Matrix(m) => m,
            _ => {
                unexpected(kind, value);
                Mat4::IDENTITY
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::math::RotationOrder;
    use XformOpKind::*;

    #[test]
    fn test_trs_stacks() {
        for ops in [
            &[][..],
            &[Translate],
            &[Translate, RotateY],
            &[Translate, Scale],
            &[Translate, RotateZ, RotateX, RotateY, Scale],
            &[Orient],
            &[RotateEuler(RotationOrder::Zxy), Scale, Scale],
            &[Scale],
        ] {
            assert_eq!(classify(ops), XformKind::Trs, "{ops:?}");
        }
    }

    #[test]
    fn test_matrix_stacks() {
        for ops in [
            &[Scale, Translate][..],
            &[Translate, RotateX, Translate],
            &[RotateZ, Translate],
            &[Transform],
            &[Translate, Transform],
        ] {
            assert_eq!(classify(ops), XformKind::Matrix, "{ops:?}");
        }
    }

    #[test]
    fn test_collapse_merges_runs() {
        assert_eq!(
            collapse(&[Translate, RotateZ, RotateX, Orient, Scale]),
            vec![OpCategory::Translate, OpCategory::Rotate, OpCategory::Scale]
        );
    }

    #[test]
    fn test_non_euler_kind_is_identity() {
        let q = euler_to_quaternion(RotateX, Vec3::new(10.0, 20.0, 30.0));
        assert_eq!(q, Quaternion::IDENTITY);
    }

    #[test]
    fn test_euler_matches_single_axis_matrices() {
        let euler = Vec3::new(15.0, -40.0, 70.0);
        let q = euler_to_quaternion(RotateEuler(RotationOrder::Xyz), euler);
        let expected = Mat4::from_quat(Quaternion::rotate_z_degrees(70.0))
            * Mat4::from_quat(Quaternion::rotate_y_degrees(-40.0))
            * Mat4::from_quat(Quaternion::rotate_x_degrees(15.0));
        assert!(Mat4::from_quat(q).near_equal(&expected, 1e-5));
    }

    #[test]
    fn test_op_matrix_kinds() {
        let t = op_matrix(Translate, OpValue::Vector(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(t.translation(), Vec3::new(1.0, 2.0, 3.0));

        let s = op_matrix(Scale, OpValue::Scalar(2.0));
        assert_eq!(s.transform_point(Vec3::ONE), Vec3::new(2.0, 2.0, 2.0));

        // Mismatched values fall back to identity.
        assert_eq!(op_matrix(Transform, OpValue::Scalar(1.0)), Mat4::IDENTITY);
    }
}
