// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Boundary representation solids
//!
//! A [`Solid`] owns its vertex positions and an ordered list of planar
//! [`Face`]s that index into them. Faces are added in a fixed order by the
//! builders below, which keeps downstream output deterministic.

use crate::curve::{BoundedCurve, Frame};
use crate::error::{Error, Result};
use crate::profile::Profile2D;
use crate::triangulation::{polygon_normal, ContourSet};
use nalgebra::{Matrix4, Point3, Vector3};

/// Planar face: an outer loop and zero or more hole loops
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    pub id: u32,
    /// Indices into the owning solid's vertices, counter-clockwise seen from outside
    pub outer: Vec<usize>,
    pub inner: Vec<Vec<usize>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Solid {
    vertices: Vec<Point3<f64>>,
    faces: Vec<Face>,
}

/// Vertex indices of one swept profile instance
struct ProfileLoop {
    outer: Vec<usize>,
    holes: Vec<Vec<usize>>,
}

impl Solid {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    #[inline]
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Add a vertex and return its index
    pub fn add_vertex(&mut self, position: Point3<f64>) -> usize {
        self.vertices.push(position);
        self.vertices.len() - 1
    }

    /// Add a face over existing vertices
    pub fn add_face_indices(&mut self, outer: Vec<usize>, inner: Vec<Vec<usize>>) -> Result<u32> {
        if outer.len() < 3 {
            return Err(Error::geometry(format!(
                "Face outer loop needs at least 3 vertices, got {}",
                outer.len()
            )));
        }
        let count = self.vertices.len();
        if let Some(&bad) = outer.iter().chain(inner.iter().flatten()).find(|&&i| i >= count) {
            return Err(Error::geometry(format!(
                "Face references vertex {} of {}",
                bad, count
            )));
        }
        let id = self.faces.len() as u32;
        self.faces.push(Face { id, outer, inner });
        Ok(id)
    }

    /// Add a face from positions, appending new vertices
    pub fn add_face(&mut self, outer: &[Point3<f64>], inner: &[Vec<Point3<f64>>]) -> Result<u32> {
        if outer.len() < 3 {
            return Err(Error::geometry(format!(
                "Face outer loop needs at least 3 vertices, got {}",
                outer.len()
            )));
        }
        let outer_indices = outer.iter().map(|p| self.add_vertex(*p)).collect();
        let inner_indices = inner
            .iter()
            .map(|hole| hole.iter().map(|p| self.add_vertex(*p)).collect())
            .collect();
        self.add_face_indices(outer_indices, inner_indices)
    }

    /// Positions of a face's loops
    pub fn face_contours(&self, face: &Face) -> ContourSet {
        let resolve = |loop_: &Vec<usize>| loop_.iter().map(|&i| self.vertices[i]).collect();
        ContourSet::new(resolve(&face.outer), face.inner.iter().map(resolve).collect())
    }

    /// Unit normal of a face's outer loop
    pub fn face_normal(&self, face: &Face) -> Option<Vector3<f64>> {
        let outer: Vec<Point3<f64>> = face.outer.iter().map(|&i| self.vertices[i]).collect();
        polygon_normal(&outer)
    }

    /// Copy with every vertex transformed. Mirroring transforms reverse the
    /// loops so faces keep pointing outward.
    pub fn transformed(&self, transform: &Matrix4<f64>) -> Solid {
        let vertices = self
            .vertices
            .iter()
            .map(|p| transform.transform_point(p))
            .collect();
        let mirrored = transform.fixed_view::<3, 3>(0, 0).determinant() < 0.0;
        let faces = if mirrored {
            self.faces
                .iter()
                .map(|f| Face {
                    id: f.id,
                    outer: reversed(&f.outer),
                    inner: f.inner.iter().map(|h| reversed(h)).collect(),
                })
                .collect()
        } else {
            self.faces.clone()
        };
        Solid { vertices, faces }
    }

    /// Zero-thickness solid: the perimeter face and its reverse
    pub fn lamina(perimeter: &[Point3<f64>], voids: &[Vec<Point3<f64>>]) -> Result<Solid> {
        let mut solid = Solid::new();
        let outer: Vec<usize> = perimeter.iter().map(|p| solid.add_vertex(*p)).collect();
        let holes: Vec<Vec<usize>> = voids
            .iter()
            .map(|v| v.iter().map(|p| solid.add_vertex(*p)).collect())
            .collect();

        solid.add_face_indices(outer.clone(), holes.clone())?;
        solid.add_face_indices(reversed(&outer), holes.iter().map(|h| reversed(h)).collect())?;
        Ok(solid)
    }

    /// Sweep a profile on the XY plane along a straight direction.
    /// `both_sides` centres the result on the profile plane.
    pub fn sweep_face(
        profile: &Profile2D,
        direction: &Vector3<f64>,
        distance: f64,
        both_sides: bool,
        rotation_degrees: f64,
    ) -> Result<Solid> {
        if distance <= 0.0 || !distance.is_finite() {
            return Err(Error::InvalidExtrusion(format!(
                "Extrusion height must be positive, got {}",
                distance
            )));
        }
        let direction = direction
            .try_normalize(1e-12)
            .ok_or_else(|| Error::InvalidExtrusion("Zero extrusion direction".to_string()))?;
        if direction.z.abs() < 1e-9 {
            return Err(Error::InvalidExtrusion(
                "Extrusion direction lies in the profile plane".to_string(),
            ));
        }
        profile.validate()?;
        let profile = profile.rotated(rotation_degrees).normalized();

        let offset = if both_sides {
            -direction * (distance / 2.0)
        } else {
            Vector3::zeros()
        };
        let step = direction * distance;

        let mut solid = Solid::new();
        let lift = |p: &nalgebra::Point2<f64>| Point3::new(p.x, p.y, 0.0) + offset;

        let bottom = solid.add_profile_loop(&profile, |p| lift(p));
        let top = solid.add_profile_loop(&profile, |p| lift(p) + step);

        // Profile normal is +Z; a downward sweep turns the solid inside out
        let downward = direction.z < 0.0;
        let (start, end) = if downward { (&top, &bottom) } else { (&bottom, &top) };

        solid.add_cap(start, true)?;
        solid.add_cap(end, false)?;
        solid.add_side_walls(start, end)?;
        Ok(solid)
    }

    /// Sweep a profile along a curve. Interior corners are mitred on the
    /// bisector plane; closed curves get no caps.
    pub fn sweep_along_curve(
        profile: &Profile2D,
        curve: &BoundedCurve,
        start_setback: f64,
        end_setback: f64,
        rotation_degrees: f64,
    ) -> Result<Solid> {
        profile.validate()?;
        let profile = profile.rotated(rotation_degrees).normalized();

        let (mut start_setback, mut end_setback) = (start_setback.max(0.0), end_setback.max(0.0));
        if start_setback + end_setback >= curve.length() {
            start_setback = 0.0;
            end_setback = 0.0;
        }

        let closed = curve.is_closed();
        let path = curve.sweep_path(start_setback, end_setback)?;
        let n = path.len();
        let segment_count = if closed { n } else { n - 1 };

        let frames = (0..segment_count)
            .map(|i| {
                let next = path[(i + 1) % n];
                Frame::along(path[i], &(next - path[i]))
                    .ok_or_else(|| Error::InvalidSweep("Degenerate sweep segment".to_string()))
            })
            .collect::<Result<Vec<Frame>>>()?;

        let mut solid = Solid::new();
        let mut loops = Vec::with_capacity(n);
        for k in 0..n {
            let mitre = if closed {
                mitre_normal(&frames[(k + n - 1) % n].z_axis, &frames[k].z_axis)
            } else if k == 0 {
                Some(frames[0].z_axis)
            } else if k == n - 1 {
                Some(frames[k - 1].z_axis)
            } else {
                mitre_normal(&frames[k - 1].z_axis, &frames[k].z_axis)
            };
            let plane_normal = mitre
                .ok_or_else(|| Error::InvalidSweep("Sweep path folds back on itself".to_string()))?;

            let frame = frames[k.min(segment_count - 1)];
            let denom = frame.z_axis.dot(&plane_normal);
            if denom.abs() < 1e-6 {
                return Err(Error::InvalidSweep(
                    "Sweep path folds back on itself".to_string(),
                ));
            }
            let origin = path[k];
            loops.push(solid.add_profile_loop(&profile, |p| {
                let q = frame.point(p.x, p.y);
                let t = (origin - q).dot(&plane_normal) / denom;
                q + frame.z_axis * t
            }));
        }

        if !closed {
            solid.add_cap(&loops[0], true)?;
            solid.add_cap(&loops[n - 1], false)?;
        }
        for k in 0..segment_count {
            let (from, to) = (&loops[k], &loops[(k + 1) % n]);
            solid.add_side_walls(from, to)?;
        }
        Ok(solid)
    }

    fn add_profile_loop<F>(&mut self, profile: &Profile2D, place: F) -> ProfileLoop
    where
        F: Fn(&nalgebra::Point2<f64>) -> Point3<f64>,
    {
        let outer = profile.outer.iter().map(|p| self.add_vertex(place(p))).collect();
        let holes = profile
            .holes
            .iter()
            .map(|h| h.iter().map(|p| self.add_vertex(place(p))).collect())
            .collect();
        ProfileLoop { outer, holes }
    }

    fn add_cap(&mut self, profile_loop: &ProfileLoop, facing_back: bool) -> Result<u32> {
        if facing_back {
            self.add_face_indices(
                reversed(&profile_loop.outer),
                profile_loop.holes.iter().map(|h| reversed(h)).collect(),
            )
        } else {
            self.add_face_indices(profile_loop.outer.clone(), profile_loop.holes.clone())
        }
    }

    fn add_side_walls(&mut self, from: &ProfileLoop, to: &ProfileLoop) -> Result<()> {
        let contours = std::iter::once((&from.outer, &to.outer))
            .chain(from.holes.iter().zip(to.holes.iter()));
        for (a, b) in contours {
            let len = a.len();
            for i in 0..len {
                let j = (i + 1) % len;
                self.add_face_indices(vec![a[i], a[j], b[j], b[i]], Vec::new())?;
            }
        }
        Ok(())
    }
}

fn reversed(indices: &[usize]) -> Vec<usize> {
    indices.iter().rev().copied().collect()
}

/// Normal of the plane bisecting two consecutive sweep directions
fn mitre_normal(incoming: &Vector3<f64>, outgoing: &Vector3<f64>) -> Option<Vector3<f64>> {
    (incoming + outgoing).try_normalize(1e-9)
}
