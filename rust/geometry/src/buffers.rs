// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! GPU-ready vertex and index buffers

use crate::error::{Error, Result};
use nalgebra::{Point3, Vector3};

/// Maximum number of vertices addressable by `u16` indices
pub const MAX_VERTICES: usize = u16::MAX as usize + 1;

/// Texture coordinate
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Uv {
    pub u: f64,
    pub v: f64,
}

impl Uv {
    #[inline]
    pub fn new(u: f64, v: f64) -> Self {
        Self { u, v }
    }
}

/// Linear RGBA color, components in 0..=1. The default is transparent black.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

impl Color {
    pub fn new(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    #[inline]
    fn components(&self) -> [f64; 4] {
        [self.red, self.green, self.blue, self.alpha]
    }
}

/// Per-vertex attributes as seen by vertex modifiers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexAttributes {
    pub position: Point3<f64>,
    pub normal: Vector3<f64>,
    pub uv: Uv,
    pub color: Option<Color>,
}

/// Flat vertex attribute and index arrays with accessor bounds
#[derive(Debug, Clone)]
pub struct GraphicsBuffers {
    /// Vertex positions (x, y, z)
    pub positions: Vec<f32>,
    /// Vertex normals (nx, ny, nz)
    pub normals: Vec<f32>,
    /// Texture coordinates (u, v)
    pub uvs: Vec<f32>,
    /// Vertex colors (r, g, b, a), only for vertices that carry a color
    pub colors: Vec<f32>,
    pub indices: Vec<u16>,

    pub position_min: [f64; 3],
    pub position_max: [f64; 3],
    pub normal_min: [f64; 3],
    pub normal_max: [f64; 3],
    pub uv_min: [f64; 2],
    pub uv_max: [f64; 2],
    pub color_min: [f64; 4],
    pub color_max: [f64; 4],
    pub index_min: u16,
    pub index_max: u16,
}

impl Default for GraphicsBuffers {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsBuffers {
    pub fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    pub fn with_capacity(vertex_count: usize, index_count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertex_count * 3),
            normals: Vec::with_capacity(vertex_count * 3),
            uvs: Vec::with_capacity(vertex_count * 2),
            colors: Vec::new(),
            indices: Vec::with_capacity(index_count),
            position_min: [f64::MAX; 3],
            position_max: [f64::MIN; 3],
            normal_min: [f64::MAX; 3],
            normal_max: [f64::MIN; 3],
            uv_min: [f64::MAX; 2],
            uv_max: [f64::MIN; 2],
            color_min: [f64::MAX; 4],
            color_max: [f64::MIN; 4],
            index_min: u16::MAX,
            index_max: u16::MIN,
        }
    }

    /// Line or point buffers: one vertex and one index per point
    pub fn from_points(points: &[Point3<f64>]) -> Result<Self> {
        let mut buffers = Self::with_capacity(points.len(), points.len());
        for p in points {
            buffers.add_vertex(p, &Vector3::zeros(), &Uv::default(), None)?;
        }
        let indices: Vec<u16> = (0..points.len()).map(|i| i as u16).collect();
        buffers.add_indices(&indices)?;
        Ok(buffers)
    }

    /// Append a vertex. A color is only stored when it differs from the default.
    pub fn add_vertex(
        &mut self,
        position: &Point3<f64>,
        normal: &Vector3<f64>,
        uv: &Uv,
        color: Option<&Color>,
    ) -> Result<()> {
        let count = self.vertex_count();
        if count >= MAX_VERTICES {
            return Err(Error::VertexLimitExceeded {
                count: count + 1,
                limit: MAX_VERTICES,
            });
        }

        for i in 0..3 {
            self.positions.push(position[i] as f32);
            self.normals.push(normal[i] as f32);
            self.position_min[i] = self.position_min[i].min(position[i]);
            self.position_max[i] = self.position_max[i].max(position[i]);
            self.normal_min[i] = self.normal_min[i].min(normal[i]);
            self.normal_max[i] = self.normal_max[i].max(normal[i]);
        }

        for (i, c) in [uv.u, uv.v].into_iter().enumerate() {
            self.uvs.push(c as f32);
            self.uv_min[i] = self.uv_min[i].min(c);
            self.uv_max[i] = self.uv_max[i].max(c);
        }

        if let Some(color) = color.filter(|c| **c != Color::default()) {
            for (i, c) in color.components().into_iter().enumerate() {
                self.colors.push(c as f32);
                self.color_min[i] = self.color_min[i].min(c);
                self.color_max[i] = self.color_max[i].max(c);
            }
        }

        Ok(())
    }

    #[inline]
    pub fn add_vertex_attributes(&mut self, attributes: &VertexAttributes) -> Result<()> {
        self.add_vertex(
            &attributes.position,
            &attributes.normal,
            &attributes.uv,
            attributes.color.as_ref(),
        )
    }

    /// Append indices; every index must refer to an existing vertex
    pub fn add_indices(&mut self, indices: &[u16]) -> Result<()> {
        let vertex_count = self.vertex_count();
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(Error::IndexOutOfRange {
                index,
                vertex_count,
            });
        }
        for &i in indices {
            self.index_min = self.index_min.min(i);
            self.index_max = self.index_max.max(i);
        }
        self.indices.extend_from_slice(indices);
        Ok(())
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    #[inline]
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[inline]
    pub fn has_colors(&self) -> bool {
        !self.colors.is_empty()
    }

    /// Position at vertex `index` widened back to f64
    pub fn position(&self, index: usize) -> Point3<f64> {
        let base = index * 3;
        Point3::new(
            self.positions[base] as f64,
            self.positions[base + 1] as f64,
            self.positions[base + 2] as f64,
        )
    }

    pub fn positions_bytes(&self) -> Vec<u8> {
        f32_bytes(&self.positions)
    }

    pub fn normals_bytes(&self) -> Vec<u8> {
        f32_bytes(&self.normals)
    }

    pub fn uvs_bytes(&self) -> Vec<u8> {
        f32_bytes(&self.uvs)
    }

    pub fn colors_bytes(&self) -> Vec<u8> {
        f32_bytes(&self.colors)
    }

    pub fn indices_bytes(&self) -> Vec<u8> {
        self.indices.iter().flat_map(|i| i.to_le_bytes()).collect()
    }
}

fn f32_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_vertex_tracks_bounds() {
        let mut buffers = GraphicsBuffers::new();
        buffers
            .add_vertex(&Point3::new(1.0, -2.0, 3.0), &Vector3::z(), &Uv::new(0.5, 1.0), None)
            .unwrap();
        buffers
            .add_vertex(&Point3::new(-1.0, 4.0, 0.0), &Vector3::x(), &Uv::new(-0.5, 2.0), None)
            .unwrap();

        assert_eq!(buffers.vertex_count(), 2);
        assert_eq!(buffers.position_min, [-1.0, -2.0, 0.0]);
        assert_eq!(buffers.position_max, [1.0, 4.0, 3.0]);
        assert_eq!(buffers.uv_min, [-0.5, 1.0]);
        assert!(!buffers.has_colors());
    }

    #[test]
    fn test_default_color_not_recorded() {
        let mut buffers = GraphicsBuffers::new();
        buffers
            .add_vertex(&Point3::origin(), &Vector3::z(), &Uv::default(), Some(&Color::default()))
            .unwrap();
        assert!(!buffers.has_colors());

        let red = Color::new(1.0, 0.0, 0.0, 1.0);
        buffers
            .add_vertex(&Point3::origin(), &Vector3::z(), &Uv::default(), Some(&red))
            .unwrap();
        assert_eq!(buffers.colors, vec![1.0, 0.0, 0.0, 1.0]);
        assert_eq!(buffers.color_max, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_vertex_limit() {
        let mut buffers = GraphicsBuffers::new();
        for i in 0..MAX_VERTICES {
            buffers
                .add_vertex(&Point3::new(i as f64, 0.0, 0.0), &Vector3::z(), &Uv::default(), None)
                .unwrap();
        }
        let err = buffers
            .add_vertex(&Point3::origin(), &Vector3::z(), &Uv::default(), None)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::VertexLimitExceeded { count: 65_537, limit: 65_536 }
        ));
    }

    #[test]
    fn test_index_out_of_range() {
        let mut buffers =
            GraphicsBuffers::from_points(&[Point3::origin(), Point3::new(1.0, 0.0, 0.0)]).unwrap();
        assert_eq!(buffers.indices, vec![0, 1]);
        assert_eq!((buffers.index_min, buffers.index_max), (0, 1));
        assert!(matches!(
            buffers.add_indices(&[2]),
            Err(Error::IndexOutOfRange { index: 2, vertex_count: 2 })
        ));
    }

    #[test]
    fn test_byte_views_are_little_endian() {
        let buffers = GraphicsBuffers::from_points(&[Point3::new(1.0, 0.0, 0.0)]).unwrap();
        let bytes = buffers.positions_bytes();
        assert_eq!(bytes.len(), 12);
        assert_eq!(&bytes[0..4], &1.0f32.to_le_bytes());
        assert_eq!(buffers.indices_bytes(), vec![0, 0]);
    }
}
