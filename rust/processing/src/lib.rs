// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Elements-Lite Processing
//!
//! Resolves batches of geometric elements in parallel with rayon and
//! flattens the resulting graphics buffers into serializable primitives.
//! A failing element is reported and does not stop the batch.

pub mod config;
pub mod error;
pub mod types;

pub use config::ProcessingConfig;
pub use error::{ProcessingError, Result};
pub use types::{ElementFailure, PrimitiveData, ProcessingResult, ProcessingStats};

use elements_lite_geometry::{GeometricElement, RepresentationRouter};
use rayon::prelude::*;
use std::time::Instant;

/// Resolve one element into primitive chunks.
///
/// Elements without geometry yield an empty list. With `skip_empty`, chunks
/// without vertices are dropped.
pub fn process_element(
    router: &RepresentationRouter,
    element: &GeometricElement,
    skip_empty: bool,
) -> Result<Vec<PrimitiveData>> {
    let primitive = router
        .resolve(Some(element))
        .map_err(|source| ProcessingError::Geometry {
            element_id: element.id,
            source,
        })?;

    let Some(primitive) = primitive else {
        return Ok(Vec::new());
    };

    Ok(primitive
        .buffers
        .iter()
        .enumerate()
        .filter(|(_, buffers)| !(skip_empty && buffers.is_empty()))
        .map(|(chunk, buffers)| PrimitiveData::new(element.id, &primitive, chunk, buffers))
        .collect())
}

/// Resolve a batch of elements with the default router. Output keeps
/// element input order.
pub fn process_elements(
    elements: &[GeometricElement],
    config: &ProcessingConfig,
) -> Result<ProcessingResult> {
    let router = RepresentationRouter::with_options(config.tessellation_options());
    process_elements_with(&router, elements, config)
}

/// Resolve a batch of elements with a caller-supplied router.
pub fn process_elements_with(
    router: &RepresentationRouter,
    elements: &[GeometricElement],
    config: &ProcessingConfig,
) -> Result<ProcessingResult> {
    let start = Instant::now();
    tracing::info!(
        elements = elements.len(),
        worker_threads = config.worker_threads,
        "Starting element processing"
    );

    let resolve_all = || -> Vec<Result<Vec<PrimitiveData>>> {
        elements
            .par_iter()
            .map(|element| process_element(router, element, config.skip_empty))
            .collect()
    };

    let outcomes = if config.worker_threads > 0 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.worker_threads)
            .build()?;
        pool.install(resolve_all)
    } else {
        resolve_all()
    };

    let mut result = ProcessingResult::default();
    result.stats.total_elements = elements.len();

    for outcome in outcomes {
        match outcome {
            Ok(primitives) if primitives.is_empty() => result.stats.skipped_elements += 1,
            Ok(primitives) => {
                for primitive in &primitives {
                    result.stats.total_vertices += primitive.vertex_count();
                    if primitive.mode == "triangles" {
                        result.stats.total_triangles += primitive.triangle_count();
                    }
                }
                result.stats.total_primitives += primitives.len();
                result.primitives.extend(primitives);
            }
            Err(error) => {
                tracing::warn!(error = %error, "Element failed to resolve");
                result.stats.failed_elements += 1;
                if let Some(element_id) = error.element_id() {
                    result.failures.push(ElementFailure {
                        element_id,
                        message: error.to_string(),
                    });
                }
            }
        }
    }

    result.stats.processing_time_ms = start.elapsed().as_millis() as u64;
    tracing::info!(
        primitives = result.stats.total_primitives,
        vertices = result.stats.total_vertices,
        triangles = result.stats.total_triangles,
        failed = result.stats.failed_elements,
        time_ms = result.stats.processing_time_ms,
        "Element processing complete"
    );

    Ok(result)
}
