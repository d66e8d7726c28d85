// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during geometry processing
#[derive(Error, Debug)]
pub enum Error {
    #[error("Element is missing")]
    MissingElement,

    #[error("Triangulation failed: {0}")]
    TriangulationError(String),

    #[error("Boolean operation failed: {0}")]
    BooleanError(String),

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Invalid extrusion parameters: {0}")]
    InvalidExtrusion(String),

    #[error("Invalid sweep: {0}")]
    InvalidSweep(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Vertex limit exceeded: {count} vertices, limit is {limit}")]
    VertexLimitExceeded { count: usize, limit: usize },

    #[error("Index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u16, vertex_count: usize },
}

impl Error {
    /// Shorthand for an [`Error::InvalidGeometry`] with a message
    pub fn geometry(msg: impl Into<String>) -> Self {
        Error::InvalidGeometry(msg.into())
    }
}
