// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tessellation of solid faces into graphics buffers
//!
//! Providers yield one [`TessellationTarget`] per face. The [`Tessellator`]
//! triangulates each target, derives a texture basis from its first
//! triangle and accumulates vertices into a [`VertexAccumulator`], which is
//! written out to [`GraphicsBuffers`] once all targets are processed.

use crate::buffers::{GraphicsBuffers, Uv, VertexAttributes, MAX_VERTICES};
use crate::csg::{CsgSolid, FaceTag};
use crate::error::{Error, Result};
use crate::solid::Solid;
use crate::transform;
use crate::triangulation::{ContourSet, EarcutTriangulator, TriangleSet, Triangulator};
use nalgebra::{Matrix4, Point3, Vector3};
use std::sync::Arc;
use tracing::{debug, trace};

/// Rewrites vertex attributes just before they are written
pub type VertexModifier = Arc<dyn Fn(VertexAttributes) -> VertexAttributes + Send + Sync>;

/// Tessellation tolerances and limits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TessellationOptions {
    /// Reuse nearby vertices with similar normals
    pub merge_vertices: bool,
    /// Maximum distance between merged positions
    pub merge_tolerance: f64,
    /// Merged normals must differ by less than this angle
    pub merge_angle_degrees: f64,
    /// Vertex limit of one buffer set
    pub max_vertices: usize,
}

impl Default for TessellationOptions {
    fn default() -> Self {
        Self {
            merge_vertices: false,
            merge_tolerance: 1e-5,
            merge_angle_degrees: 45.0,
            max_vertices: MAX_VERTICES,
        }
    }
}

/// One face to triangulate
#[derive(Debug, Clone)]
pub struct TessellationTarget {
    pub contours: ContourSet,
    pub tag: FaceTag,
}

/// Source of tessellation targets
pub trait TargetProvider {
    fn targets(&self) -> Vec<TessellationTarget>;
}

/// Faces of a [`Solid`], optionally moved by a transform
pub struct SolidTargetProvider<'a> {
    solid: &'a Solid,
    solid_id: u32,
    transform: Option<Matrix4<f64>>,
}

impl<'a> SolidTargetProvider<'a> {
    pub fn new(solid: &'a Solid, solid_id: u32, transform: Option<Matrix4<f64>>) -> Self {
        Self {
            solid,
            solid_id,
            transform,
        }
    }
}

impl TargetProvider for SolidTargetProvider<'_> {
    fn targets(&self) -> Vec<TessellationTarget> {
        let placement = self
            .transform
            .as_ref()
            .filter(|m| !transform::is_identity(Some(*m)));
        let mirrored = placement
            .map(|m| m.fixed_view::<3, 3>(0, 0).determinant() < 0.0)
            .unwrap_or(false);
        let place = |points: Vec<Point3<f64>>| -> Vec<Point3<f64>> {
            let mut placed: Vec<Point3<f64>> = points
                .iter()
                .map(|p| transform::transform_point(placement, p))
                .collect();
            if mirrored {
                placed.reverse();
            }
            placed
        };

        self.solid
            .faces()
            .iter()
            .map(|face| {
                let contours = self.solid.face_contours(face);
                TessellationTarget {
                    contours: ContourSet::new(
                        place(contours.outer),
                        contours.holes.into_iter().map(place).collect(),
                    ),
                    tag: FaceTag {
                        face_id: face.id,
                        solid_id: self.solid_id,
                    },
                }
            })
            .collect()
    }
}

/// Polygons of a boolean result
pub struct CsgTargetProvider<'a> {
    solid: &'a CsgSolid,
}

impl<'a> CsgTargetProvider<'a> {
    pub fn new(solid: &'a CsgSolid) -> Self {
        Self { solid }
    }
}

impl TargetProvider for CsgTargetProvider<'_> {
    fn targets(&self) -> Vec<TessellationTarget> {
        self.solid
            .polygons
            .iter()
            .map(|p| TessellationTarget {
                contours: CsgSolid::contours(p),
                tag: p.tag,
            })
            .collect()
    }
}

/// Texture basis and normal of a triangle.
///
/// Returns `(u, v, n)` with `n = unit(b - a) x unit(c - a)` normalized,
/// `u = unit(ref x n)` where `ref` is +Y for normals along Z and +Z
/// otherwise, and `v = unit(n x u)`. Only meaningful for planar faces.
pub fn compute_basis(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
) -> Option<(Vector3<f64>, Vector3<f64>, Vector3<f64>)> {
    let ab = (b - a).try_normalize(1e-12)?;
    let ac = (c - a).try_normalize(1e-12)?;
    let n = ab.cross(&ac).try_normalize(1e-12)?;

    let reference = if n.cross(&Vector3::z()).norm() < 1e-9 {
        Vector3::y()
    } else {
        Vector3::z()
    };
    let u = reference.cross(&n).try_normalize(1e-12)?;
    let v = n.cross(&u).try_normalize(1e-12)?;
    Some((u, v, n))
}

/// Shared vertex list plus triangle indices built up over many targets
#[derive(Debug, Clone)]
pub struct VertexAccumulator {
    vertices: Vec<VertexAttributes>,
    indices: Vec<usize>,
    merge: bool,
    tolerance_squared: f64,
    max_angle: f64,
}

impl VertexAccumulator {
    pub fn new(options: &TessellationOptions) -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            merge: options.merge_vertices,
            tolerance_squared: options.merge_tolerance * options.merge_tolerance,
            max_angle: options.merge_angle_degrees.to_radians(),
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Index of the vertex for these attributes. With merging on, the first
    /// existing vertex within tolerance and angle is reused.
    pub fn insert(&mut self, position: Point3<f64>, normal: Vector3<f64>, uv: Uv) -> usize {
        if self.merge {
            let found = self.vertices.iter().position(|v| {
                (v.position - position).norm_squared() < self.tolerance_squared
                    && v.normal.angle(&normal) < self.max_angle
            });
            if let Some(index) = found {
                return index;
            }
        }
        self.vertices.push(VertexAttributes {
            position,
            normal,
            uv,
            color: None,
        });
        self.vertices.len() - 1
    }

    pub fn push_index(&mut self, index: usize) {
        self.indices.push(index);
    }

    /// Write everything out, applying the modifier once per vertex
    pub fn into_buffers(
        self,
        max_vertices: usize,
        modifier: Option<&VertexModifier>,
    ) -> Result<GraphicsBuffers> {
        let limit = max_vertices.min(MAX_VERTICES);
        if self.vertices.len() > limit {
            return Err(Error::VertexLimitExceeded {
                count: self.vertices.len(),
                limit,
            });
        }

        let mut buffers = GraphicsBuffers::with_capacity(self.vertices.len(), self.indices.len());
        for vertex in self.vertices {
            let vertex = match modifier {
                Some(modify) => modify(vertex),
                None => vertex,
            };
            buffers.add_vertex_attributes(&vertex)?;
        }

        let indices: Vec<u16> = self.indices.iter().map(|&i| i as u16).collect();
        buffers.add_indices(&indices)?;
        Ok(buffers)
    }
}

/// Tessellation orchestrator
pub struct Tessellator {
    triangulator: Box<dyn Triangulator>,
    options: TessellationOptions,
}

impl Default for Tessellator {
    fn default() -> Self {
        Self::new()
    }
}

impl Tessellator {
    /// Earcut triangulation with default options
    pub fn new() -> Self {
        Self::with_options(TessellationOptions::default())
    }

    pub fn with_options(options: TessellationOptions) -> Self {
        Self {
            triangulator: Box::new(EarcutTriangulator),
            options,
        }
    }

    pub fn with_triangulator(
        triangulator: Box<dyn Triangulator>,
        options: TessellationOptions,
    ) -> Self {
        Self {
            triangulator,
            options,
        }
    }

    pub fn options(&self) -> &TessellationOptions {
        &self.options
    }

    /// Tessellate every target of every provider into one buffer set.
    /// Fails with [`Error::VertexLimitExceeded`] when the result does not
    /// fit the vertex limit.
    pub fn tessellate(
        &self,
        providers: &[&dyn TargetProvider],
        modifier: Option<&VertexModifier>,
    ) -> Result<GraphicsBuffers> {
        let mut accumulator = VertexAccumulator::new(&self.options);
        for provider in providers {
            for target in provider.targets() {
                if let Some(triangles) = self.triangulate(&target)? {
                    accumulate(&mut accumulator, &triangles);
                }
            }
        }

        debug!(
            vertices = accumulator.vertex_count(),
            indices = accumulator.index_count(),
            "tessellated"
        );
        accumulator.into_buffers(self.options.max_vertices, modifier)
    }

    /// Like [`Tessellator::tessellate`], but starts a new buffer set whenever
    /// the next target could overflow the vertex limit.
    pub fn tessellate_chunked(
        &self,
        providers: &[&dyn TargetProvider],
        modifier: Option<&VertexModifier>,
    ) -> Result<Vec<GraphicsBuffers>> {
        let limit = self.options.max_vertices.min(MAX_VERTICES);
        let mut chunks = Vec::new();
        let mut accumulator = VertexAccumulator::new(&self.options);

        for provider in providers {
            for target in provider.targets() {
                let triangles = match self.triangulate(&target)? {
                    Some(triangles) => triangles,
                    None => continue,
                };
                if triangles.vertices.len() > limit {
                    return Err(Error::VertexLimitExceeded {
                        count: triangles.vertices.len(),
                        limit,
                    });
                }
                if accumulator.vertex_count() + triangles.vertices.len() > limit {
                    let full =
                        std::mem::replace(&mut accumulator, VertexAccumulator::new(&self.options));
                    chunks.push(full.into_buffers(limit, modifier)?);
                }
                accumulate(&mut accumulator, &triangles);
            }
        }

        if !accumulator.is_empty() {
            chunks.push(accumulator.into_buffers(limit, modifier)?);
        }

        debug!(chunks = chunks.len(), "tessellated in chunks");
        Ok(chunks)
    }

    /// Triangulate one target, `None` when it yields no triangles
    fn triangulate(&self, target: &TessellationTarget) -> Result<Option<TriangleSet>> {
        let triangles = self.triangulator.triangulate(&target.contours)?;
        if triangles.is_empty() {
            trace!(
                face_id = target.tag.face_id,
                solid_id = target.tag.solid_id,
                "skipping target without triangles"
            );
            return Ok(None);
        }
        Ok(Some(triangles))
    }
}

/// Add a triangulated target to the accumulator. The texture basis and
/// normal come from the first triangle.
fn accumulate(accumulator: &mut VertexAccumulator, triangles: &TriangleSet) {
    let [a, b, c] = triangles.triangle(0);
    let (u_axis, v_axis, normal) = match compute_basis(&a, &b, &c) {
        Some(basis) => basis,
        None => {
            trace!("skipping target with degenerate first triangle");
            return;
        }
    };

    let mut remap: Vec<Option<usize>> = vec![None; triangles.vertices.len()];
    for &local in &triangles.indices {
        let global = match remap[local] {
            Some(global) => global,
            None => {
                let p = triangles.vertices[local];
                let uv = Uv::new(u_axis.dot(&p.coords), v_axis.dot(&p.coords));
                let global = accumulator.insert(p, normal, uv);
                remap[local] = Some(global);
                global
            }
        };
        accumulator.push_index(global);
    }
}
