// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Processing configuration loaded from environment variables.

use elements_lite_geometry::TessellationOptions;

/// Batch processing configuration.
#[derive(Debug, Clone)]
pub struct ProcessingConfig {
    /// Number of worker threads. Zero runs on the global rayon pool.
    pub worker_threads: usize,
    /// Weld coincident vertices with compatible normals during tessellation.
    pub merge_vertices: bool,
    /// Drop primitives that produced no vertices.
    pub skip_empty: bool,
}

impl ProcessingConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            worker_threads: std::env::var("ELEMENTS_WORKER_THREADS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(num_cpus::get),
            merge_vertices: std::env::var("ELEMENTS_MERGE_VERTICES")
                .unwrap_or_else(|_| "false".into())
                .parse()
                .unwrap_or(false),
            skip_empty: std::env::var("ELEMENTS_SKIP_EMPTY")
                .unwrap_or_else(|_| "true".into())
                .parse()
                .unwrap_or(true),
        }
    }

    /// Tessellation options derived from this configuration.
    pub fn tessellation_options(&self) -> TessellationOptions {
        TessellationOptions {
            merge_vertices: self.merge_vertices,
            ..Default::default()
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            merge_vertices: false,
            skip_empty: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_uses_global_pool() {
        let config = ProcessingConfig::default();
        assert_eq!(config.worker_threads, 0);
        assert!(!config.merge_vertices);
        assert!(config.skip_empty);
    }

    #[test]
    fn test_tessellation_options_follow_merge_flag() {
        let config = ProcessingConfig {
            merge_vertices: true,
            ..Default::default()
        };
        let options = config.tessellation_options();
        assert!(options.merge_vertices);
        assert_eq!(options.max_vertices, elements_lite_geometry::MAX_VERTICES);
    }
}
