// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use elements_lite_geometry::{
    create_rectangle, BooleanEngine, BoundedCurve, ContentRepresentation, CsgSolid,
    CurveRepresentation, Error, GeometricElement, Point3, Representation, RepresentationRouter,
    SolidOperation, SolidRepresentation, Tessellator, Vector3,
};
use elements_lite_processing::{
    process_element, process_elements, process_elements_with, ProcessingConfig, ProcessingResult,
};

fn block(size: f64) -> GeometricElement {
    let op =
        SolidOperation::extrude(create_rectangle(size, size), size, Vector3::z(), false).unwrap();
    GeometricElement::new(Some(Representation::Solid(SolidRepresentation::new(vec![op]))))
}

fn polyline() -> GeometricElement {
    let curve = BoundedCurve::Polyline(vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
    ]);
    GeometricElement::new(Some(Representation::Curve(CurveRepresentation {
        curve,
        is_selectable: true,
    })))
}

fn two_blocks() -> GeometricElement {
    let ops = (1..=2)
        .map(|i| {
            SolidOperation::extrude(create_rectangle(1.0, 1.0), i as f64, Vector3::z(), false)
                .unwrap()
        })
        .collect();
    GeometricElement::new(Some(Representation::Solid(SolidRepresentation::new(ops))))
}

/// Refuses every boolean
struct RefusingEngine;

impl BooleanEngine for RefusingEngine {
    fn union(&self, _solids: &[CsgSolid]) -> elements_lite_geometry::Result<CsgSolid> {
        Err(Error::BooleanError("union refused".to_string()))
    }

    fn subtract(
        &self,
        _target: &CsgSolid,
        _voids: &[CsgSolid],
    ) -> elements_lite_geometry::Result<CsgSolid> {
        Err(Error::BooleanError("subtract refused".to_string()))
    }
}

#[test]
fn batch_keeps_input_order() {
    let elements: Vec<_> = (1..=8).map(|i| block(i as f64)).collect();
    let config = ProcessingConfig {
        worker_threads: 4,
        ..Default::default()
    };
    let result = process_elements(&elements, &config).unwrap();

    assert_eq!(result.primitives.len(), elements.len());
    for (primitive, element) in result.primitives.iter().zip(&elements) {
        assert_eq!(primitive.element_id, element.id);
        assert_eq!(primitive.primitive_id, format!("{}_mesh", element.id));
        assert_eq!(primitive.mode, "triangles");
    }
    assert_eq!(result.stats.total_elements, 8);
    assert_eq!(result.stats.total_vertices, 8 * 24);
    assert_eq!(result.stats.total_triangles, 8 * 12);
    assert_eq!(result.stats.failed_elements, 0);
}

#[test]
fn empty_elements_are_skipped() {
    let empty = GeometricElement::new(None);
    let degenerate = GeometricElement::new(Some(Representation::Content(
        ContentRepresentation::default(),
    )));
    let elements = vec![empty, degenerate, block(1.0)];

    let result = process_elements(&elements, &ProcessingConfig::default()).unwrap();
    assert_eq!(result.primitives.len(), 1);
    assert_eq!(result.stats.skipped_elements, 2);
}

#[test]
fn curves_count_vertices_but_not_triangles() {
    let result = process_elements(&[polyline()], &ProcessingConfig::default()).unwrap();
    assert_eq!(result.primitives.len(), 1);
    assert_eq!(result.primitives[0].mode, "line_strip");
    assert!(result.primitives[0].primitive_id.ends_with("_curve"));
    assert_eq!(result.stats.total_vertices, 3);
    assert_eq!(result.stats.total_triangles, 0);
}

#[test]
fn failures_do_not_stop_the_batch() {
    let elements = vec![block(1.0), two_blocks(), block(2.0)];
    let router = RepresentationRouter::with_engine(Box::new(RefusingEngine), Tessellator::new());
    let result = process_elements_with(&router, &elements, &ProcessingConfig::default()).unwrap();

    assert_eq!(result.primitives.len(), 2);
    assert_eq!(result.stats.failed_elements, 1);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].element_id, elements[1].id);
    assert!(result.failures[0].message.contains("union refused"));
}

#[test]
fn merge_setting_reaches_tessellator() {
    let element = block(1.0);
    let merged = RepresentationRouter::with_options(
        ProcessingConfig {
            merge_vertices: true,
            ..Default::default()
        }
        .tessellation_options(),
    );
    let primitives = process_element(&merged, &element, true).unwrap();
    // hard box edges never weld
    assert_eq!(primitives[0].vertex_count(), 24);
}

#[test]
fn result_serializes_to_json() {
    let result = process_elements(&[block(1.0)], &ProcessingConfig::default()).unwrap();
    let json = result.to_json().unwrap();
    let back: ProcessingResult = serde_json::from_str(&json).unwrap();

    assert_eq!(back.primitives.len(), 1);
    assert_eq!(back.primitives[0].indices, result.primitives[0].indices);
    assert_eq!(back.stats.total_vertices, 24);
}
