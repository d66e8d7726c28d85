// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bounded curves used as sweep paths and curve representations

use crate::error::{Error, Result};
use crate::profile::calculate_circle_segments;
use nalgebra::{Point3, Vector3};

const LENGTH_EPSILON: f64 = 1e-9;

/// A curve with a start and an end (or a closed loop)
#[derive(Debug, Clone, PartialEq)]
pub enum BoundedCurve {
    Line {
        start: Point3<f64>,
        end: Point3<f64>,
    },
    /// Open chain of vertices
    Polyline(Vec<Point3<f64>>),
    /// Closed chain; the start vertex is not repeated at the end
    Polygon(Vec<Point3<f64>>),
    /// Circular arc in the XY plane of `center`, angles in degrees
    Arc {
        center: Point3<f64>,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    },
}

impl BoundedCurve {
    pub fn line(start: Point3<f64>, end: Point3<f64>) -> Self {
        BoundedCurve::Line { start, end }
    }

    pub fn is_closed(&self) -> bool {
        match self {
            BoundedCurve::Polygon(_) => true,
            BoundedCurve::Arc {
                start_angle,
                end_angle,
                ..
            } => (end_angle - start_angle).abs() >= 360.0 - LENGTH_EPSILON,
            _ => false,
        }
    }

    /// Vertices that approximate the curve. Closed curves do not repeat
    /// their first vertex.
    pub fn render_vertices(&self) -> Vec<Point3<f64>> {
        match self {
            BoundedCurve::Line { start, end } => vec![*start, *end],
            BoundedCurve::Polyline(points) | BoundedCurve::Polygon(points) => points.clone(),
            BoundedCurve::Arc {
                center,
                radius,
                start_angle,
                end_angle,
            } => {
                let sweep = end_angle - start_angle;
                let closed = self.is_closed();
                let full = calculate_circle_segments(*radius);
                let segments = ((full as f64) * sweep.abs() / 360.0).ceil().max(1.0) as usize;
                let count = if closed { segments } else { segments + 1 };
                (0..count)
                    .map(|i| {
                        let t = (start_angle + sweep * i as f64 / segments as f64).to_radians();
                        Point3::new(
                            center.x + radius * t.cos(),
                            center.y + radius * t.sin(),
                            center.z,
                        )
                    })
                    .collect()
            }
        }
    }

    /// Length along the curve
    pub fn length(&self) -> f64 {
        match self {
            BoundedCurve::Line { start, end } => (end - start).norm(),
            BoundedCurve::Arc {
                radius,
                start_angle,
                end_angle,
                ..
            } => radius.abs() * (end_angle - start_angle).abs().to_radians(),
            _ => {
                let points = self.render_vertices();
                let mut length: f64 = points.windows(2).map(|w| (w[1] - w[0]).norm()).sum();
                if self.is_closed() && points.len() > 1 {
                    length += (points[0] - points[points.len() - 1]).norm();
                }
                length
            }
        }
    }

    /// Path vertices for sweeping, trimmed by the setbacks on open curves.
    /// Consecutive duplicates are dropped.
    pub fn sweep_path(&self, start_setback: f64, end_setback: f64) -> Result<Vec<Point3<f64>>> {
        let mut points = self.render_vertices();
        points.dedup_by(|a, b| (*a - *b).norm() < LENGTH_EPSILON);
        if self.is_closed() && points.len() > 1 {
            let last = points.len() - 1;
            if (points[last] - points[0]).norm() < LENGTH_EPSILON {
                points.pop();
            }
        }

        let required = if self.is_closed() { 3 } else { 2 };
        if points.len() < required {
            return Err(Error::InvalidSweep(format!(
                "Sweep path needs at least {} distinct vertices, got {}",
                required,
                points.len()
            )));
        }

        if self.is_closed() || (start_setback <= 0.0 && end_setback <= 0.0) {
            return Ok(points);
        }

        let trimmed = trim_start(&points, start_setback);
        let mut reversed = trim_start(&trimmed.into_iter().rev().collect::<Vec<_>>(), end_setback);
        reversed.reverse();
        Ok(reversed)
    }
}

/// Drop `distance` of length from the start of a chain
fn trim_start(points: &[Point3<f64>], distance: f64) -> Vec<Point3<f64>> {
    if distance <= 0.0 {
        return points.to_vec();
    }
    let mut remaining = distance;
    for (i, w) in points.windows(2).enumerate() {
        let segment = w[1] - w[0];
        let len = segment.norm();
        if remaining < len - LENGTH_EPSILON {
            let mut out = Vec::with_capacity(points.len() - i);
            out.push(w[0] + segment * (remaining / len));
            out.extend_from_slice(&points[i + 1..]);
            return out;
        }
        remaining -= len;
    }
    // Setbacks are reset before reaching here when they consume the curve
    points[points.len().saturating_sub(2)..].to_vec()
}

/// Orthonormal frame perpendicular to a sweep direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub origin: Point3<f64>,
    pub x_axis: Vector3<f64>,
    pub y_axis: Vector3<f64>,
    /// Sweep direction
    pub z_axis: Vector3<f64>,
}

impl Frame {
    /// Frame whose Z axis follows `direction`. The X axis is horizontal
    /// unless the direction is vertical.
    pub fn along(origin: Point3<f64>, direction: &Vector3<f64>) -> Option<Self> {
        let z_axis = direction.try_normalize(LENGTH_EPSILON)?;
        let up = if z_axis.cross(&Vector3::z()).norm() < 1e-6 {
            Vector3::x()
        } else {
            Vector3::z()
        };
        let x_axis = up.cross(&z_axis).try_normalize(LENGTH_EPSILON)?;
        let y_axis = z_axis.cross(&x_axis);
        Some(Self {
            origin,
            x_axis,
            y_axis,
            z_axis,
        })
    }

    /// Map a profile coordinate into the frame
    #[inline]
    pub fn point(&self, x: f64, y: f64) -> Point3<f64> {
        self.origin + self.x_axis * x + self.y_axis * y
    }
}
