// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Axis-aligned bounding boxes

use nalgebra::{Point3, Vector3};

/// Axis-aligned bounding box in f64 precision
///
/// The default box is empty: min at `f64::MAX`, max at `f64::MIN`, so that
/// extending it with any point yields that point's box. An empty box is not
/// valid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox3 {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl Default for BBox3 {
    fn default() -> Self {
        Self {
            min: Point3::new(f64::MAX, f64::MAX, f64::MAX),
            max: Point3::new(f64::MIN, f64::MIN, f64::MIN),
        }
    }
}

impl BBox3 {
    /// Create a box from two corners, sorting each axis
    pub fn new(a: Point3<f64>, b: Point3<f64>) -> Self {
        Self {
            min: Point3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Point3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Box enclosing all points (empty box for an empty iterator)
    pub fn from_points<'a, I>(points: I) -> Self
    where
        I: IntoIterator<Item = &'a Point3<f64>>,
    {
        let mut bounds = Self::default();
        for p in points {
            bounds.extend(p);
        }
        bounds
    }

    /// Grow the box to contain a point
    #[inline]
    pub fn extend(&mut self, p: &Point3<f64>) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Finite corners with min <= max on every axis
    pub fn is_valid(&self) -> bool {
        let finite = self.min.iter().chain(self.max.iter()).all(|c| c.is_finite());
        finite && self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Zero extent along at least one axis
    pub fn is_degenerate(&self) -> bool {
        const EPSILON: f64 = 1e-5;
        let size = self.size();
        size.x.abs() < EPSILON || size.y.abs() < EPSILON || size.z.abs() < EPSILON
    }

    #[inline]
    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }
}
