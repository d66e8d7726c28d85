// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Serializable output of batch processing.

use elements_lite_geometry::{GraphicsBuffers, ResolvedPrimitive};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One buffer chunk of a resolved primitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimitiveData {
    /// Owning element.
    pub element_id: Uuid,
    /// Primitive id: `{element}_mesh` for solids and content,
    /// `{element}_curve` for curves, with an `unselectable_` prefix on
    /// curves that cannot be picked.
    pub primitive_id: String,
    /// Chunk index within the primitive.
    pub chunk: usize,
    /// Primitive mode name (`triangles`, `line_strip`, ...).
    pub mode: String,
    /// Vertex positions (flattened [x,y,z,...]).
    pub positions: Vec<f32>,
    /// Vertex normals (flattened [nx,ny,nz,...]).
    pub normals: Vec<f32>,
    /// Texture coordinates (flattened [u,v,...]).
    pub uvs: Vec<f32>,
    /// Vertex colors (flattened [r,g,b,a,...]), empty when uncolored.
    pub colors: Vec<f32>,
    /// Index buffer.
    pub indices: Vec<u16>,
    pub position_min: [f64; 3],
    pub position_max: [f64; 3],
}

impl PrimitiveData {
    pub fn new(
        element_id: Uuid,
        primitive: &ResolvedPrimitive,
        chunk: usize,
        buffers: &GraphicsBuffers,
    ) -> Self {
        Self {
            element_id,
            primitive_id: primitive.primitive_id.clone(),
            chunk,
            mode: primitive.mode.as_str().to_string(),
            positions: buffers.positions.clone(),
            normals: buffers.normals.clone(),
            uvs: buffers.uvs.clone(),
            colors: buffers.colors.clone(),
            indices: buffers.indices.clone(),
            position_min: buffers.position_min,
            position_max: buffers.position_max,
        }
    }

    /// Number of vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Number of triangles, meaningful for triangle primitives.
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Element that failed to resolve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementFailure {
    pub element_id: Uuid,
    pub message: String,
}

/// Processing statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingStats {
    /// Number of elements submitted.
    pub total_elements: usize,
    /// Number of primitive chunks emitted.
    pub total_primitives: usize,
    /// Total number of vertices.
    pub total_vertices: usize,
    /// Total number of triangles.
    pub total_triangles: usize,
    /// Elements without geometry or with only empty output.
    pub skipped_elements: usize,
    /// Elements that failed to resolve.
    pub failed_elements: usize,
    /// Total processing time (ms).
    pub processing_time_ms: u64,
}

/// Result of a batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingResult {
    /// Primitive chunks in element input order.
    pub primitives: Vec<PrimitiveData>,
    pub stats: ProcessingStats,
    pub failures: Vec<ElementFailure>,
}

impl ProcessingResult {
    /// Serialize to a JSON string.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
