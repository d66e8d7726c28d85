// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Solid composition
//!
//! Combines an element's solid operations and its openings' voids into one
//! solid. A single solid without voids is passed through untouched; anything
//! else goes through the boolean engine.

use crate::csg::{BooleanEngine, CsgSolid};
use crate::error::Result;
use crate::operations::SolidOperation;
use crate::representation::Opening;
use crate::solid::Solid;
use crate::tessellation::{CsgTargetProvider, SolidTargetProvider, TargetProvider};
use crate::transform;
use crate::triangulation::{polygon_normal, ContourSet};
use nalgebra::{Matrix4, Point3, Vector3};
use tracing::debug;

/// Result of composition
#[derive(Debug, Clone, PartialEq)]
pub enum ComposedSolid {
    /// Single solid, no boolean involved
    Solid(Solid),
    /// Output of the boolean engine
    Boolean(CsgSolid),
}

/// A face of a composed solid with its outward normal
#[derive(Debug, Clone)]
pub struct ComposedFace {
    pub contours: ContourSet,
    pub normal: Vector3<f64>,
}

impl ComposedSolid {
    /// All vertex positions
    pub fn positions(&self) -> Vec<Point3<f64>> {
        match self {
            ComposedSolid::Solid(solid) => solid.vertices().to_vec(),
            ComposedSolid::Boolean(csg) => csg.positions().copied().collect(),
        }
    }

    /// Face loops, skipping faces without a defined normal
    pub fn faces(&self) -> Vec<ComposedFace> {
        match self {
            ComposedSolid::Solid(solid) => solid
                .faces()
                .iter()
                .filter_map(|face| {
                    Some(ComposedFace {
                        contours: solid.face_contours(face),
                        normal: solid.face_normal(face)?,
                    })
                })
                .collect(),
            ComposedSolid::Boolean(csg) => csg
                .polygons
                .iter()
                .filter_map(|p| {
                    let normal = polygon_normal(&p.vertices).unwrap_or(p.normal);
                    Some(ComposedFace {
                        contours: CsgSolid::contours(p),
                        normal: normal.try_normalize(1e-12)?,
                    })
                })
                .collect(),
        }
    }

    pub fn transformed(&self, transform: &Matrix4<f64>) -> ComposedSolid {
        match self {
            ComposedSolid::Solid(solid) => ComposedSolid::Solid(solid.transformed(transform)),
            ComposedSolid::Boolean(csg) => ComposedSolid::Boolean(csg.transformed(transform)),
        }
    }

    /// Tessellation targets of the composed faces
    pub fn target_provider(&self) -> Box<dyn TargetProvider + '_> {
        match self {
            ComposedSolid::Solid(solid) => Box::new(SolidTargetProvider::new(solid, 0, None)),
            ComposedSolid::Boolean(csg) => Box::new(CsgTargetProvider::new(csg)),
        }
    }
}

/// Compose solid operations and opening voids into one solid.
///
/// Operation solids are placed by their local transform. With
/// `bake_world_transform` the host transform is applied as well, otherwise
/// the result stays in host-local space. Opening voids are additionally
/// placed by the opening's transform. Returns `Ok(None)` when there is no
/// non-void operation.
pub fn compose(
    operations: &[SolidOperation],
    host_transform: Option<&Matrix4<f64>>,
    openings: &[Opening],
    bake_world_transform: bool,
    engine: &dyn BooleanEngine,
) -> Result<Option<ComposedSolid>> {
    let host = if bake_world_transform {
        host_transform.filter(|m| !transform::is_identity(Some(*m)))
    } else {
        None
    };

    let mut solids = Vec::new();
    let mut voids = Vec::new();
    for op in operations {
        let placed = op.placed_solid(host);
        if op.is_void {
            voids.push(placed);
        } else {
            solids.push(placed);
        }
    }

    for opening in openings {
        let outer = transform::concatenate(host, opening.transform.as_ref());
        for op in opening.representation.operations.iter().filter(|op| op.is_void) {
            voids.push(op.placed_solid(outer.as_ref()));
        }
    }

    debug!(solids = solids.len(), voids = voids.len(), "composing");

    if solids.is_empty() {
        return Ok(None);
    }

    if solids.len() == 1 && voids.is_empty() {
        return Ok(solids.pop().map(ComposedSolid::Solid));
    }

    let mut solid_id = 0u32;
    let mut to_soup = |solid: &Solid| -> Result<CsgSolid> {
        let soup = CsgSolid::from_solid(solid, solid_id)?;
        solid_id += 1;
        Ok(soup)
    };
    let solid_soups = solids.iter().map(&mut to_soup).collect::<Result<Vec<_>>>()?;
    let void_soups = voids.iter().map(&mut to_soup).collect::<Result<Vec<_>>>()?;

    let mut result = if solid_soups.len() > 1 {
        engine.union(&solid_soups)?
    } else {
        solid_soups.into_iter().next().unwrap_or_default()
    };

    if !void_soups.is_empty() {
        result = engine.subtract(&result, &void_soups)?;
    }

    Ok(Some(ComposedSolid::Boolean(result)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::BBox3;
    use crate::csg::CsgrsEngine;
    use crate::error::Error;
    use crate::profile::create_rectangle;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingEngine {
        unions: AtomicUsize,
        subtracts: AtomicUsize,
    }

    impl BooleanEngine for CountingEngine {
        fn union(&self, solids: &[CsgSolid]) -> Result<CsgSolid> {
            self.unions.fetch_add(1, Ordering::SeqCst);
            Ok(CsgSolid {
                polygons: solids.iter().flat_map(|s| s.polygons.clone()).collect(),
            })
        }

        fn subtract(&self, target: &CsgSolid, _voids: &[CsgSolid]) -> Result<CsgSolid> {
            self.subtracts.fetch_add(1, Ordering::SeqCst);
            Ok(target.clone())
        }
    }

    struct FailingEngine;

    impl BooleanEngine for FailingEngine {
        fn union(&self, _solids: &[CsgSolid]) -> Result<CsgSolid> {
            Err(Error::BooleanError("union refused".to_string()))
        }

        fn subtract(&self, _target: &CsgSolid, _voids: &[CsgSolid]) -> Result<CsgSolid> {
            Err(Error::BooleanError("subtract refused".to_string()))
        }
    }

    fn block(size: f64, is_void: bool) -> SolidOperation {
        SolidOperation::extrude(create_rectangle(size, size), size, Vector3::z(), is_void).unwrap()
    }

    #[test]
    fn test_no_solids_yields_none() {
        let engine = CountingEngine::default();
        assert!(compose(&[], None, &[], false, &engine).unwrap().is_none());
        assert!(compose(&[block(1.0, true)], None, &[], false, &engine).unwrap().is_none());
    }

    #[test]
    fn test_single_solid_skips_engine() {
        let engine = CountingEngine::default();
        let op = block(1.0, false);
        let composed = compose(std::slice::from_ref(&op), None, &[], false, &engine)
            .unwrap()
            .unwrap();

        assert_eq!(composed, ComposedSolid::Solid(op.solid().clone()));
        assert_eq!(engine.unions.load(Ordering::SeqCst), 0);
        assert_eq!(engine.subtracts.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_solid_ids_follow_solids_then_voids() {
        let engine = CountingEngine::default();
        let ops = [block(1.0, true), block(1.0, false), block(2.0, false)];
        let composed = compose(&ops, None, &[], false, &engine).unwrap().unwrap();

        assert_eq!(engine.unions.load(Ordering::SeqCst), 1);
        assert_eq!(engine.subtracts.load(Ordering::SeqCst), 1);
        match composed {
            ComposedSolid::Boolean(csg) => {
                let ids: Vec<u32> = csg.polygons.iter().map(|p| p.tag.solid_id).collect();
                assert!(ids[..6].iter().all(|&id| id == 0));
                assert!(ids[6..].iter().all(|&id| id == 1));
            }
            other => panic!("expected boolean result, got {:?}", other),
        }
    }

    #[test]
    fn test_bake_applies_host_transform() {
        let engine = CountingEngine::default();
        let host = Matrix4::new_translation(&Vector3::new(5.0, 0.0, 0.0));
        let ops = [block(1.0, false)];

        let local = compose(&ops, Some(&host), &[], false, &engine).unwrap().unwrap();
        let world = compose(&ops, Some(&host), &[], true, &engine).unwrap().unwrap();

        let local_bounds = BBox3::from_points(&local.positions());
        let world_bounds = BBox3::from_points(&world.positions());
        assert!((local_bounds.min.x + 0.5).abs() < 1e-9);
        assert!((world_bounds.min.x - 4.5).abs() < 1e-9);
    }

    #[test]
    fn test_opening_voids_are_subtracted() {
        let engine = CountingEngine::default();
        let opening = Opening::from_profile(create_rectangle(0.5, 0.5), 1.0, 1.0, None).unwrap();
        compose(&[block(2.0, false)], None, &[opening], false, &engine)
            .unwrap()
            .unwrap();

        assert_eq!(engine.unions.load(Ordering::SeqCst), 0);
        assert_eq!(engine.subtracts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_engine_errors_propagate() {
        let ops = [block(1.0, false), block(2.0, false)];
        assert!(matches!(
            compose(&ops, None, &[], false, &FailingEngine),
            Err(Error::BooleanError(_))
        ));
    }

    #[test]
    fn test_disjoint_void_leaves_bounds() {
        let solid = block(1.0, false);
        let void = block(1.0, true)
            .with_local_transform(Matrix4::new_translation(&Vector3::new(20.0, 0.0, 0.0)));
        let composed = compose(&[solid.clone(), void], None, &[], false, &CsgrsEngine)
            .unwrap()
            .unwrap();

        let expected = BBox3::from_points(solid.solid().vertices());
        let actual = BBox3::from_points(&composed.positions());
        assert!((expected.min - actual.min).norm() < 1e-6);
        assert!((expected.max - actual.max).norm() < 1e-6);
    }
}
