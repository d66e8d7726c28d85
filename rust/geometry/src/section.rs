// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Plane sections of composed solids
//!
//! [`intersect`] cuts every face of a composed solid with a plane and
//! reports the ordered crossing points per face, along with "beyond"
//! polygons: faces behind the plane that face the same way as its normal,
//! projected onto it. [`PlaneSection::loops`] stitches the per-face
//! segments into section outlines.

use crate::compose::ComposedSolid;
use crate::csg::Plane;
use crate::transform;
use nalgebra::{Matrix4, Point3};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::borrow::Cow;

const EPSILON: f64 = 1e-6;

/// Quantization step used to weld segment endpoints
const WELD_STEP: f64 = 1e-5;

/// Result of a plane intersection
#[derive(Debug, Clone, Default)]
pub struct PlaneSection {
    /// Crossing points per intersected face, sorted along the face/plane line
    pub face_points: Vec<Vec<Point3<f64>>>,
    /// Faces behind the plane facing along its normal, projected onto it
    pub beyond: Vec<Vec<Point3<f64>>>,
}

/// Stitched section outline
#[derive(Debug, Clone, PartialEq)]
pub struct SectionLoop {
    pub points: Vec<Point3<f64>>,
    pub closed: bool,
}

/// Intersect a composed solid, placed by `transform`, with a plane
pub fn intersect(
    composed: &ComposedSolid,
    transform: Option<&Matrix4<f64>>,
    plane: &Plane,
) -> PlaneSection {
    let world = match transform {
        Some(m) if !transform::is_identity(Some(m)) => Cow::Owned(composed.transformed(m)),
        _ => Cow::Borrowed(composed),
    };

    let mut section = PlaneSection::default();

    for face in world.faces() {
        let normal = face.normal;

        if normal.cross(&plane.normal).norm() < EPSILON {
            let behind = face
                .contours
                .outer
                .iter()
                .all(|p| plane.signed_distance(p) < -EPSILON);
            if normal.dot(&plane.normal) > 0.0 && behind {
                section
                    .beyond
                    .push(face.contours.outer.iter().map(|p| plane.project(p)).collect());
            }
            continue;
        }

        let mut points: SmallVec<[Point3<f64>; 4]> = SmallVec::new();
        let loops = std::iter::once(&face.contours.outer).chain(face.contours.holes.iter());
        for loop_ in loops {
            let n = loop_.len();
            for i in 0..n {
                let a = &loop_[i];
                let b = &loop_[(i + 1) % n];
                let da = plane.signed_distance(a);
                let db = plane.signed_distance(b);

                let hit = if da.abs() < EPSILON {
                    Some(*a)
                } else if db.abs() >= EPSILON && (da < 0.0) != (db < 0.0) {
                    let t = da / (da - db);
                    Some(a + (b - a) * t)
                } else {
                    None
                };

                if let Some(p) = hit {
                    if !points.iter().any(|q| (q - p).norm() < EPSILON) {
                        points.push(p);
                    }
                }
            }
        }

        if points.len() < 2 {
            continue;
        }

        let direction = normal.cross(&plane.normal);
        points.sort_by(|a, b| {
            direction
                .dot(&a.coords)
                .partial_cmp(&direction.dot(&b.coords))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        section.face_points.push(points.into_vec());
    }

    section
}

impl PlaneSection {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.face_points.is_empty() && self.beyond.is_empty()
    }

    /// Segments formed by consecutive point pairs of every face
    pub fn segments(&self) -> Vec<(Point3<f64>, Point3<f64>)> {
        self.face_points
            .iter()
            .flat_map(|points| points.chunks_exact(2).map(|pair| (pair[0], pair[1])))
            .collect()
    }

    /// Stitch face segments into outlines. Open chains come first, then
    /// closed loops.
    pub fn loops(&self) -> Vec<SectionLoop> {
        let mut nodes: Vec<Point3<f64>> = Vec::new();
        let mut lookup: FxHashMap<(i64, i64, i64), usize> = FxHashMap::default();
        let mut node = |p: Point3<f64>| -> usize {
            let key = (
                (p.x / WELD_STEP).round() as i64,
                (p.y / WELD_STEP).round() as i64,
                (p.z / WELD_STEP).round() as i64,
            );
            *lookup.entry(key).or_insert_with(|| {
                nodes.push(p);
                nodes.len() - 1
            })
        };

        let mut edges: Vec<(usize, usize)> = Vec::new();
        for (a, b) in self.segments() {
            let (ia, ib) = (node(a), node(b));
            if ia != ib {
                edges.push((ia, ib));
            }
        }

        let mut adjacency: Vec<SmallVec<[usize; 2]>> = vec![SmallVec::new(); nodes.len()];
        for (e, &(a, b)) in edges.iter().enumerate() {
            adjacency[a].push(e);
            adjacency[b].push(e);
        }

        let mut used = vec![false; edges.len()];
        let walk = |start: usize, used: &mut Vec<bool>| -> SectionLoop {
            let mut chain = vec![nodes[start]];
            let mut current = start;
            let mut closed = false;
            while let Some(&e) = adjacency[current].iter().find(|&&e| !used[e]) {
                used[e] = true;
                let (a, b) = edges[e];
                let next = if a == current { b } else { a };
                if next == start {
                    closed = true;
                    break;
                }
                chain.push(nodes[next]);
                current = next;
            }
            SectionLoop {
                points: chain,
                closed,
            }
        };

        let mut result = Vec::new();
        for start in 0..adjacency.len() {
            if adjacency[start].len() % 2 == 1 && adjacency[start].iter().any(|&e| !used[e]) {
                result.push(walk(start, &mut used));
            }
        }
        for e in 0..edges.len() {
            if !used[e] {
                result.push(walk(edges[e].0, &mut used));
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::create_rectangle_from_corners;
    use crate::solid::Solid;
    use nalgebra::{Point2, Vector3};

    fn unit_cube() -> ComposedSolid {
        let profile = create_rectangle_from_corners(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0));
        ComposedSolid::Solid(Solid::sweep_face(&profile, &Vector3::z(), 1.0, false, 0.0).unwrap())
    }

    #[test]
    fn test_cube_mid_section() {
        let plane = Plane::new(Point3::new(0.0, 0.0, 0.5), Vector3::z());
        let section = intersect(&unit_cube(), None, &plane);

        assert_eq!(section.face_points.len(), 4);
        assert!(section.face_points.iter().all(|f| f.len() == 2));
        assert!(section.beyond.is_empty());

        let loops = section.loops();
        assert_eq!(loops.len(), 1);
        assert!(loops[0].closed);
        assert_eq!(loops[0].points.len(), 4);
        assert!(loops[0].points.iter().all(|p| (p.z - 0.5).abs() < 1e-9));
    }

    #[test]
    fn test_beyond_polygon_below_plane() {
        // the top face lies under the plane and faces along its normal
        let plane = Plane::new(Point3::new(0.0, 0.0, 1.5), Vector3::z());
        let section = intersect(&unit_cube(), None, &plane);

        assert!(section.face_points.is_empty());
        assert_eq!(section.beyond.len(), 1);
        assert_eq!(section.beyond[0].len(), 4);
        assert!(section.beyond[0].iter().all(|p| (p.z - 1.5).abs() < 1e-9));
    }

    #[test]
    fn test_faces_pointing_away_are_not_beyond() {
        let plane = Plane::new(Point3::new(0.0, 0.0, 1.5), -Vector3::z());
        let section = intersect(&unit_cube(), None, &plane);
        assert!(section.is_empty());
    }

    #[test]
    fn test_transform_applied_before_cut() {
        let plane = Plane::new(Point3::new(0.0, 0.0, 0.5), Vector3::z());
        let lifted = Matrix4::new_translation(&Vector3::new(0.0, 0.0, 10.0));
        let section = intersect(&unit_cube(), Some(&lifted), &plane);
        assert!(section.is_empty());
    }

    #[test]
    fn test_missed_plane() {
        let plane = Plane::new(Point3::new(0.0, 0.0, 5.0), Vector3::x());
        let section = intersect(&unit_cube(), None, &plane);
        assert!(section.face_points.is_empty());
        assert!(section.loops().is_empty());
    }

    #[test]
    fn test_points_sorted_along_face() {
        let plane = Plane::new(Point3::new(0.0, 0.0, 0.5), Vector3::z());
        let section = intersect(&unit_cube(), None, &plane);
        for points in &section.face_points {
            let a = points[0];
            let b = points[1];
            assert!((a - b).norm() > 0.5);
        }
    }
}
