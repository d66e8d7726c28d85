// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D Profile definitions used by extrusions and sweeps

use crate::error::{Error, Result};
use nalgebra::Point2;

/// 2D Profile with optional holes
#[derive(Debug, Clone, PartialEq)]
pub struct Profile2D {
    /// Outer boundary (counter-clockwise)
    pub outer: Vec<Point2<f64>>,
    /// Holes (clockwise)
    pub holes: Vec<Vec<Point2<f64>>>,
}

impl Profile2D {
    /// Create a new profile
    pub fn new(outer: Vec<Point2<f64>>) -> Self {
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    /// Create a profile with holes
    pub fn with_holes(outer: Vec<Point2<f64>>, holes: Vec<Vec<Point2<f64>>>) -> Self {
        Self { outer, holes }
    }

    /// Add a hole to the profile
    pub fn add_hole(&mut self, hole: Vec<Point2<f64>>) {
        self.holes.push(hole);
    }

    /// Check the profile can bound a face
    pub fn validate(&self) -> Result<()> {
        if self.outer.len() < 3 {
            return Err(Error::InvalidProfile(
                "Profile must have at least 3 vertices".to_string(),
            ));
        }
        if signed_area(&self.outer).abs() < 1e-12 {
            return Err(Error::InvalidProfile("Profile has zero area".to_string()));
        }
        if let Some(hole) = self.holes.iter().find(|h| h.len() < 3) {
            return Err(Error::InvalidProfile(format!(
                "Profile hole has {} vertices, need at least 3",
                hole.len()
            )));
        }
        Ok(())
    }

    /// Copy with the outer boundary counter-clockwise and holes clockwise
    pub fn normalized(&self) -> Self {
        let mut outer = self.outer.clone();
        if signed_area(&outer) < 0.0 {
            outer.reverse();
        }
        let holes = self
            .holes
            .iter()
            .map(|hole| {
                let mut hole = hole.clone();
                if signed_area(&hole) > 0.0 {
                    hole.reverse();
                }
                hole
            })
            .collect();
        Self { outer, holes }
    }

    /// Copy rotated about the profile origin, angle in degrees
    pub fn rotated(&self, degrees: f64) -> Self {
        if degrees == 0.0 {
            return self.clone();
        }
        let (sin, cos) = degrees.to_radians().sin_cos();
        let rotate = |p: &Point2<f64>| Point2::new(p.x * cos - p.y * sin, p.x * sin + p.y * cos);
        Self {
            outer: self.outer.iter().map(rotate).collect(),
            holes: self
                .holes
                .iter()
                .map(|h| h.iter().map(rotate).collect())
                .collect(),
        }
    }
}

/// Signed area of a 2D loop (positive when counter-clockwise)
pub fn signed_area(points: &[Point2<f64>]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let a = &points[i];
        let b = &points[(i + 1) % n];
        sum += a.x * b.y - b.x * a.y;
    }
    sum * 0.5
}

/// Create a rectangular profile centered on the origin
#[inline]
pub fn create_rectangle(width: f64, height: f64) -> Profile2D {
    let half_w = width / 2.0;
    let half_h = height / 2.0;

    Profile2D::new(vec![
        Point2::new(-half_w, -half_h),
        Point2::new(half_w, -half_h),
        Point2::new(half_w, half_h),
        Point2::new(-half_w, half_h),
    ])
}

/// Create a rectangular profile spanning two corners
pub fn create_rectangle_from_corners(min: Point2<f64>, max: Point2<f64>) -> Profile2D {
    Profile2D::new(vec![
        Point2::new(min.x, min.y),
        Point2::new(max.x, min.y),
        Point2::new(max.x, max.y),
        Point2::new(min.x, max.y),
    ])
}

/// Create a circular profile (with optional hole)
/// The segment count is derived from the radius.
pub fn create_circle(radius: f64, hole_radius: Option<f64>) -> Profile2D {
    let segments = calculate_circle_segments(radius);

    let mut outer = Vec::with_capacity(segments);

    for i in 0..segments {
        let angle = 2.0 * std::f64::consts::PI * (i as f64) / (segments as f64);
        outer.push(Point2::new(radius * angle.cos(), radius * angle.sin()));
    }

    let mut profile = Profile2D::new(outer);

    if let Some(hole_r) = hole_radius {
        let hole_segments = calculate_circle_segments(hole_r);
        let mut hole = Vec::with_capacity(hole_segments);

        for i in 0..hole_segments {
            let angle = 2.0 * std::f64::consts::PI * (i as f64) / (hole_segments as f64);
            hole.push(Point2::new(hole_r * angle.cos(), hole_r * angle.sin()));
        }
        hole.reverse(); // Make clockwise

        profile.add_hole(hole);
    }

    profile
}

/// Calculate adaptive number of segments for a circle
/// Based on radius to maintain good visual quality
#[inline]
pub fn calculate_circle_segments(radius: f64) -> usize {
    // Smaller circles need fewer segments
    let segments = (radius.abs().sqrt() * 8.0).ceil() as usize;

    segments.clamp(8, 32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_profile() {
        let profile = create_rectangle(10.0, 5.0);
        assert_eq!(profile.outer.len(), 4);
        assert_eq!(profile.holes.len(), 0);
        assert!((signed_area(&profile.outer) - 50.0).abs() < 1e-9);
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_circle_with_hole() {
        let profile = create_circle(10.0, Some(5.0));
        assert!(profile.outer.len() >= 8);
        assert_eq!(profile.holes.len(), 1);
        assert!(signed_area(&profile.outer) > 0.0);
        assert!(signed_area(&profile.holes[0]) < 0.0);
    }

    #[test]
    fn test_normalized_fixes_winding() {
        let mut outer = create_rectangle(2.0, 2.0).outer;
        outer.reverse();
        let mut hole = create_rectangle(1.0, 1.0).outer;
        let profile = Profile2D::with_holes(outer, vec![hole.clone()]).normalized();

        assert!(signed_area(&profile.outer) > 0.0);
        hole.reverse();
        assert_eq!(profile.holes[0], hole);
    }

    #[test]
    fn test_rotated_quarter_turn() {
        let profile = create_rectangle_from_corners(Point2::new(0.0, 0.0), Point2::new(2.0, 1.0));
        let rotated = profile.rotated(90.0);
        assert!((rotated.outer[1].x - 0.0).abs() < 1e-9);
        assert!((rotated.outer[1].y - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_profile() {
        let profile = Profile2D::new(vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]);
        assert!(profile.validate().is_err());

        let collinear = Profile2D::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
        ]);
        assert!(collinear.validate().is_err());
    }

    #[test]
    fn test_circle_segments_clamped() {
        assert_eq!(calculate_circle_segments(0.01), 8);
        assert_eq!(calculate_circle_segments(1000.0), 32);
    }
}
