// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CSG (Constructive Solid Geometry) Operations
//!
//! Solids are handed to the boolean engine as tagged polygon soups. The
//! [`BooleanEngine`] trait is the seam composition depends on;
//! [`CsgrsEngine`] implements it with csgrs.

use crate::error::{Error, Result};
use crate::solid::Solid;
use crate::triangulation::{polygon_normal, ContourSet, EarcutTriangulator, Triangulator};
use csgrs::mesh::{polygon::Polygon, vertex::Vertex, Mesh as CSGMesh};
use nalgebra::{Matrix4, Point3, Vector3};
use std::sync::OnceLock;
use tracing::debug;

/// Plane definition for sections and clipping
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    /// Point on the plane
    pub point: Point3<f64>,
    /// Normal vector (normalized)
    pub normal: Vector3<f64>,
}

impl Plane {
    /// Create a new plane
    pub fn new(point: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self {
            point,
            normal: normal.normalize(),
        }
    }

    /// Calculate signed distance from point to plane
    /// Positive = in front, Negative = behind
    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        (point - self.point).dot(&self.normal)
    }

    /// Check if point is in front of plane
    pub fn is_front(&self, point: &Point3<f64>) -> bool {
        self.signed_distance(point) >= 0.0
    }

    /// Orthogonal projection of a point onto the plane
    pub fn project(&self, point: &Point3<f64>) -> Point3<f64> {
        point - self.normal * self.signed_distance(point)
    }
}

/// Identifies the source face of a polygon through boolean operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceTag {
    pub face_id: u32,
    /// Index of the source solid in the composition's solids-then-voids list
    pub solid_id: u32,
}

/// Simple planar polygon of a boolean soup
#[derive(Debug, Clone, PartialEq)]
pub struct CsgPolygon {
    pub vertices: Vec<Point3<f64>>,
    pub normal: Vector3<f64>,
    pub tag: FaceTag,
}

/// Polygon soup exchanged with the boolean engine
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsgSolid {
    pub polygons: Vec<CsgPolygon>,
}

impl CsgSolid {
    /// Convert a solid into a soup of simple polygons. Faces with holes are
    /// triangulated, since the engine only accepts simple polygons.
    pub fn from_solid(solid: &Solid, solid_id: u32) -> Result<CsgSolid> {
        let mut polygons = Vec::with_capacity(solid.faces().len());
        for face in solid.faces() {
            let tag = FaceTag {
                face_id: face.id,
                solid_id,
            };
            let contours = solid.face_contours(face);
            let normal = match polygon_normal(&contours.outer) {
                Some(n) => n,
                None => continue,
            };

            if contours.holes.is_empty() {
                polygons.push(CsgPolygon {
                    vertices: contours.outer,
                    normal,
                    tag,
                });
                continue;
            }

            let triangles = EarcutTriangulator.triangulate(&contours)?;
            for i in 0..triangles.triangle_count() {
                polygons.push(CsgPolygon {
                    vertices: triangles.triangle(i).to_vec(),
                    normal,
                    tag,
                });
            }
        }
        Ok(CsgSolid { polygons })
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Every polygon vertex, duplicates included
    pub fn positions(&self) -> impl Iterator<Item = &Point3<f64>> + '_ {
        self.polygons.iter().flat_map(|p| p.vertices.iter())
    }

    /// Copy with every polygon transformed
    pub fn transformed(&self, transform: &Matrix4<f64>) -> CsgSolid {
        let normal_matrix = crate::transform::normal_matrix(transform);
        let mirrored = transform.fixed_view::<3, 3>(0, 0).determinant() < 0.0;
        let polygons = self
            .polygons
            .iter()
            .map(|p| {
                let mut vertices: Vec<Point3<f64>> =
                    p.vertices.iter().map(|v| transform.transform_point(v)).collect();
                if mirrored {
                    vertices.reverse();
                }
                CsgPolygon {
                    vertices,
                    normal: crate::transform::transform_normal(&normal_matrix, &p.normal),
                    tag: p.tag,
                }
            })
            .collect();
        CsgSolid { polygons }
    }

    /// Polygon as a triangulator input
    pub fn contours(polygon: &CsgPolygon) -> ContourSet {
        ContourSet::new(polygon.vertices.clone(), Vec::new())
    }
}

/// Boolean mesh engine contract. Polygon tags survive both operations.
pub trait BooleanEngine: Send + Sync {
    /// Union of all solids, in list order
    fn union(&self, solids: &[CsgSolid]) -> Result<CsgSolid>;

    /// Union the voids and subtract them from `target`
    fn subtract(&self, target: &CsgSolid, voids: &[CsgSolid]) -> Result<CsgSolid>;
}

/// [`BooleanEngine`] backed by csgrs BSP booleans
#[derive(Debug, Clone, Copy, Default)]
pub struct CsgrsEngine;

impl CsgrsEngine {
    pub fn new() -> Self {
        Self
    }

    /// Convert our polygon soup to a csgrs mesh
    fn to_csgrs(solid: &CsgSolid) -> CSGMesh<FaceTag> {
        if solid.is_empty() {
            return CSGMesh {
                polygons: Vec::new(),
                bounding_box: OnceLock::new(),
                metadata: None,
            };
        }

        let polygons: Vec<Polygon<FaceTag>> = solid
            .polygons
            .iter()
            .filter(|p| p.vertices.len() >= 3)
            .map(|p| {
                let vertices = p
                    .vertices
                    .iter()
                    .map(|v| Vertex::new(*v, p.normal))
                    .collect();
                Polygon::new(vertices, Some(p.tag))
            })
            .collect();

        CSGMesh::from_polygons(&polygons, None)
    }

    /// Convert a csgrs mesh back to a polygon soup
    fn from_csgrs(mesh: &CSGMesh<FaceTag>) -> Result<CsgSolid> {
        let mut polygons = Vec::with_capacity(mesh.polygons.len());

        for polygon in &mesh.polygons {
            if polygon.vertices.len() < 3 {
                continue;
            }
            let tag = polygon.metadata.ok_or_else(|| {
                Error::BooleanError("Boolean result lost its face tag".to_string())
            })?;

            let vertices: Vec<Point3<f64>> = polygon
                .vertices
                .iter()
                .map(|v| Point3::new(v.pos[0], v.pos[1], v.pos[2]))
                .collect();

            // The engine's intended normal comes from the first vertex
            let raw_normal = Vector3::new(
                polygon.vertices[0].normal[0],
                polygon.vertices[0].normal[1],
                polygon.vertices[0].normal[2],
            );
            let normal = match raw_normal.try_normalize(1e-10) {
                Some(n) if n.iter().all(|c| c.is_finite()) => n,
                _ => match polygon_normal(&vertices) {
                    Some(n) => n,
                    None => continue,
                },
            };

            polygons.push(CsgPolygon {
                vertices,
                normal,
                tag,
            });
        }

        Ok(CsgSolid { polygons })
    }
}

impl BooleanEngine for CsgrsEngine {
    fn union(&self, solids: &[CsgSolid]) -> Result<CsgSolid> {
        use csgrs::traits::CSG;

        let mut iter = solids.iter();
        let first = match iter.next() {
            Some(first) => first,
            None => return Ok(CsgSolid::default()),
        };

        let mut result = Self::to_csgrs(first);
        for solid in iter {
            result = result.union(&Self::to_csgrs(solid));
        }

        let out = Self::from_csgrs(&result)?;
        debug!(inputs = solids.len(), polygons = out.polygons.len(), "csg union");
        Ok(out)
    }

    fn subtract(&self, target: &CsgSolid, voids: &[CsgSolid]) -> Result<CsgSolid> {
        use csgrs::traits::CSG;

        if voids.is_empty() || target.is_empty() {
            return Ok(target.clone());
        }

        let cutter = if voids.len() == 1 {
            Self::to_csgrs(&voids[0])
        } else {
            Self::to_csgrs(&self.union(voids)?)
        };

        let result = Self::to_csgrs(target).difference(&cutter);
        let out = Self::from_csgrs(&result)?;
        debug!(voids = voids.len(), polygons = out.polygons.len(), "csg subtract");
        Ok(out)
    }
}
