// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transform helpers shared by composition, tessellation and sections
//!
//! Transforms are plain `Matrix4<f64>` in column-vector convention:
//! `outer * inner` applies `inner` first.

use nalgebra::{Matrix4, Point3, Vector3};

const IDENTITY_EPSILON: f64 = 1e-12;

/// Combine an element transform with an item's local transform.
/// The local transform is applied first.
#[inline]
pub fn concatenate(
    outer: Option<&Matrix4<f64>>,
    inner: Option<&Matrix4<f64>>,
) -> Option<Matrix4<f64>> {
    match (outer, inner) {
        (Some(outer), Some(inner)) => Some(outer * inner),
        (Some(outer), None) => Some(*outer),
        (None, Some(inner)) => Some(*inner),
        (None, None) => None,
    }
}

/// True for `None` or a matrix indistinguishable from identity
#[inline]
pub fn is_identity(transform: Option<&Matrix4<f64>>) -> bool {
    match transform {
        None => true,
        Some(m) => (m - Matrix4::identity()).amax() < IDENTITY_EPSILON,
    }
}

/// Transform a point, passing it through untouched when there is no transform
#[inline]
pub fn transform_point(transform: Option<&Matrix4<f64>>, point: &Point3<f64>) -> Point3<f64> {
    match transform {
        Some(m) => m.transform_point(point),
        None => *point,
    }
}

/// Inverse-transpose matrix for transforming normals
#[inline]
pub fn normal_matrix(transform: &Matrix4<f64>) -> Matrix4<f64> {
    transform.try_inverse().unwrap_or(*transform).transpose()
}

/// Transform a normal with a precomputed normal matrix, renormalizing the result
#[inline]
pub fn transform_normal(normal_matrix: &Matrix4<f64>, normal: &Vector3<f64>) -> Vector3<f64> {
    let transformed = (normal_matrix * normal.to_homogeneous()).xyz();
    transformed.try_normalize(1e-12).unwrap_or(*normal)
}

/// Rotation about the Z axis, angle in degrees
pub fn rotation_z_degrees(degrees: f64) -> Matrix4<f64> {
    Matrix4::new_rotation(Vector3::z() * degrees.to_radians())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concatenate_applies_inner_first() {
        let outer = Matrix4::new_translation(&Vector3::new(10.0, 0.0, 0.0));
        let inner = Matrix4::new_nonuniform_scaling(&Vector3::new(2.0, 2.0, 2.0));
        let combined = concatenate(Some(&outer), Some(&inner)).unwrap();

        let p = combined.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert!((p.x - 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_is_identity() {
        assert!(is_identity(None));
        assert!(is_identity(Some(&Matrix4::identity())));
        let moved = Matrix4::new_translation(&Vector3::new(0.0, 0.0, 1.0));
        assert!(!is_identity(Some(&moved)));
    }

    #[test]
    fn test_transform_normal_under_rotation() {
        let rotation = rotation_z_degrees(90.0);
        let n = transform_normal(&normal_matrix(&rotation), &Vector3::x());
        assert!((n - Vector3::y()).norm() < 1e-9);
    }
}
