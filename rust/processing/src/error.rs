// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for batch processing.

use thiserror::Error;
use uuid::Uuid;

/// Batch processing error types.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Element {element_id}: {source}")]
    Geometry {
        element_id: Uuid,
        #[source]
        source: elements_lite_geometry::Error,
    },

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl ProcessingError {
    /// Id of the failing element, if the error belongs to one.
    pub fn element_id(&self) -> Option<Uuid> {
        match self {
            ProcessingError::Geometry { element_id, .. } => Some(*element_id),
            ProcessingError::ThreadPool(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProcessingError>;
