// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polygon triangulation
//!
//! Face contours are projected onto their own plane and handed to earcutr.
//! The [`Triangulator`] trait is the seam the tessellator depends on.

use crate::{Error, Point2, Point3, Result, Vector3};

/// Outer contour plus hole contours of one planar face
#[derive(Debug, Clone, Default)]
pub struct ContourSet {
    pub outer: Vec<Point3<f64>>,
    pub holes: Vec<Vec<Point3<f64>>>,
}

impl ContourSet {
    pub fn new(outer: Vec<Point3<f64>>, holes: Vec<Vec<Point3<f64>>>) -> Self {
        Self { outer, holes }
    }

    /// Number of contour vertices, holes included
    pub fn vertex_count(&self) -> usize {
        self.outer.len() + self.holes.iter().map(|h| h.len()).sum::<usize>()
    }
}

/// Triangulator output: a vertex array and triangle indices into it
#[derive(Debug, Clone, Default)]
pub struct TriangleSet {
    pub vertices: Vec<Point3<f64>>,
    pub indices: Vec<usize>,
}

impl TriangleSet {
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Corner positions of the triangle at `index`
    pub fn triangle(&self, index: usize) -> [Point3<f64>; 3] {
        let base = index * 3;
        [
            self.vertices[self.indices[base]],
            self.vertices[self.indices[base + 1]],
            self.vertices[self.indices[base + 2]],
        ]
    }
}

/// Hole-aware polygon triangulation
pub trait Triangulator: Send + Sync {
    /// Triangulate a contour set. Triangles are wound to agree with the
    /// outer contour's normal. An empty result is not an error.
    fn triangulate(&self, contours: &ContourSet) -> Result<TriangleSet>;
}

/// [`Triangulator`] backed by earcutr
#[derive(Debug, Clone, Copy, Default)]
pub struct EarcutTriangulator;

impl Triangulator for EarcutTriangulator {
    fn triangulate(&self, contours: &ContourSet) -> Result<TriangleSet> {
        if contours.outer.len() < 3 {
            return Err(Error::TriangulationError(format!(
                "Need at least 3 points in outer boundary, got {}",
                contours.outer.len()
            )));
        }

        // Collinear or collapsed outline: nothing to emit
        let normal = match polygon_normal(&contours.outer) {
            Some(n) => n,
            None => return Ok(TriangleSet::default()),
        };

        let holes: Vec<&Vec<Point3<f64>>> =
            contours.holes.iter().filter(|h| h.len() >= 3).collect();

        let (outer_2d, u_axis, v_axis, origin) = project_to_2d(&contours.outer, &normal);
        let holes_2d: Vec<Vec<Point2<f64>>> = holes
            .iter()
            .map(|h| project_to_2d_with_basis(h, &u_axis, &v_axis, &origin))
            .collect();

        let raw = triangulate_polygon_with_holes(&outer_2d, &holes_2d)?;

        let mut vertices = Vec::with_capacity(contours.vertex_count());
        vertices.extend_from_slice(&contours.outer);
        for hole in &holes {
            vertices.extend_from_slice(hole);
        }

        let mut indices = Vec::with_capacity(raw.len());
        for tri in raw.chunks_exact(3) {
            let (a, b, c) = (tri[0], tri[1], tri[2]);
            let cross = (vertices[b] - vertices[a]).cross(&(vertices[c] - vertices[a]));
            if cross.norm_squared() < 1e-24 {
                continue;
            }
            if cross.dot(&normal) < 0.0 {
                indices.extend_from_slice(&[a, c, b]);
            } else {
                indices.extend_from_slice(&[a, b, c]);
            }
        }

        Ok(TriangleSet { vertices, indices })
    }
}

/// Check if a polygon is convex (all cross products have same sign)
#[inline]
fn is_convex(points: &[Point2<f64>]) -> bool {
    if points.len() < 3 {
        return false;
    }

    let n = points.len();
    let mut sign = 0i8;

    for i in 0..n {
        let p0 = &points[i];
        let p1 = &points[(i + 1) % n];
        let p2 = &points[(i + 2) % n];

        let cross = (p1.x - p0.x) * (p2.y - p1.y) - (p1.y - p0.y) * (p2.x - p1.x);

        if cross.abs() > 1e-10 {
            let current_sign = if cross > 0.0 { 1i8 } else { -1i8 };
            if sign == 0 {
                sign = current_sign;
            } else if sign != current_sign {
                return false;
            }
        }
    }

    true
}

/// Simple fan triangulation for convex polygons
#[inline]
fn fan_triangulate(n: usize) -> Vec<usize> {
    let mut indices = Vec::with_capacity((n - 2) * 3);
    for i in 1..n - 1 {
        indices.push(0);
        indices.push(i);
        indices.push(i + 1);
    }
    indices
}

/// Triangulate a simple 2D polygon (no holes)
/// Returns triangle indices into the input points
pub fn triangulate_polygon(points: &[Point2<f64>]) -> Result<Vec<usize>> {
    let n = points.len();

    if n < 3 {
        return Err(Error::TriangulationError(
            "Need at least 3 points to triangulate".to_string(),
        ));
    }

    if n == 3 {
        return Ok(vec![0, 1, 2]);
    }

    // Small convex outlines are fanned, earcut handles the rest
    if n <= 8 && is_convex(points) {
        return Ok(fan_triangulate(n));
    }

    let mut flat = Vec::with_capacity(n * 2);
    for p in points {
        flat.push(p.x);
        flat.push(p.y);
    }

    earcutr::earcut(&flat, &[], 2).map_err(|e| Error::TriangulationError(format!("{:?}", e)))
}

/// Triangulate a 2D polygon with holes
/// Returns triangle indices into the combined vertex array (outer + all holes)
pub fn triangulate_polygon_with_holes(
    outer: &[Point2<f64>],
    holes: &[Vec<Point2<f64>>],
) -> Result<Vec<usize>> {
    if outer.len() < 3 {
        return Err(Error::TriangulationError(
            "Need at least 3 points in outer boundary".to_string(),
        ));
    }

    if holes.is_empty() {
        return triangulate_polygon(outer);
    }

    let total_points: usize = outer.len() + holes.iter().map(|h| h.len()).sum::<usize>();
    let mut flat = Vec::with_capacity(total_points * 2);

    for p in outer {
        flat.push(p.x);
        flat.push(p.y);
    }

    let mut hole_indices = Vec::with_capacity(holes.len());
    for hole in holes {
        hole_indices.push(flat.len() / 2);
        for p in hole {
            flat.push(p.x);
            flat.push(p.y);
        }
    }

    earcutr::earcut(&flat, &hole_indices, 2)
        .map_err(|e| Error::TriangulationError(format!("{:?}", e)))
}

/// Project 3D points onto a 2D plane defined by a normal
/// Returns 2D points and the coordinate system (u_axis, v_axis, origin)
pub fn project_to_2d(
    points_3d: &[Point3<f64>],
    normal: &Vector3<f64>,
) -> (Vec<Point2<f64>>, Vector3<f64>, Vector3<f64>, Point3<f64>) {
    if points_3d.is_empty() {
        return (
            Vec::new(),
            Vector3::zeros(),
            Vector3::zeros(),
            Point3::origin(),
        );
    }

    let origin = points_3d[0];

    // Axis least parallel to the normal gives a stable cross product
    let abs_x = normal.x.abs();
    let abs_y = normal.y.abs();
    let abs_z = normal.z.abs();

    let reference = if abs_x <= abs_y && abs_x <= abs_z {
        Vector3::x()
    } else if abs_y <= abs_z {
        Vector3::y()
    } else {
        Vector3::z()
    };

    let u_axis = normal.cross(&reference).normalize();
    let v_axis = normal.cross(&u_axis).normalize();

    let points_2d = project_to_2d_with_basis(points_3d, &u_axis, &v_axis, &origin);

    (points_2d, u_axis, v_axis, origin)
}

/// Project 3D points using an existing coordinate system
/// so holes share the outer contour's 2D space
pub fn project_to_2d_with_basis(
    points_3d: &[Point3<f64>],
    u_axis: &Vector3<f64>,
    v_axis: &Vector3<f64>,
    origin: &Point3<f64>,
) -> Vec<Point2<f64>> {
    points_3d
        .iter()
        .map(|p| {
            let v = p - origin;
            Point2::new(v.dot(u_axis), v.dot(v_axis))
        })
        .collect()
}

/// Unit normal of a polygon by Newell's method, `None` when degenerate
pub fn polygon_normal(points: &[Point3<f64>]) -> Option<Vector3<f64>> {
    let n = points.len();
    if n < 3 {
        return None;
    }

    let mut normal = Vector3::<f64>::zeros();

    for i in 0..n {
        let current = &points[i];
        let next = &points[(i + 1) % n];

        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
    }

    normal.try_normalize(1e-10)
}
