// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Element representations and their resolution into graphics buffers

use crate::bounds::BBox3;
use crate::buffers::GraphicsBuffers;
use crate::compose::{compose, ComposedSolid};
use crate::csg::{BooleanEngine, CsgrsEngine};
use crate::curve::BoundedCurve;
use crate::error::{Error, Result};
use crate::operations::SolidOperation;
use crate::profile::{create_rectangle_from_corners, Profile2D};
use crate::tessellation::{
    SolidTargetProvider, TargetProvider, TessellationOptions, Tessellator, VertexModifier,
};
use crate::transform;
use nalgebra::{Matrix4, Point2, Vector3};
use std::fmt;
use tracing::{debug, warn};
use uuid::Uuid;

/// Geometry built from solid operations
#[derive(Clone, Default)]
pub struct SolidRepresentation {
    pub operations: Vec<SolidOperation>,
    /// Tessellate each non-void operation on its own, without booleans
    pub skip_csg_union: bool,
    pub vertex_modifier: Option<VertexModifier>,
}

impl fmt::Debug for SolidRepresentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolidRepresentation")
            .field("operations", &self.operations)
            .field("skip_csg_union", &self.skip_csg_union)
            .field("vertex_modifier", &self.vertex_modifier.is_some())
            .finish()
    }
}

impl SolidRepresentation {
    pub fn new(operations: Vec<SolidOperation>) -> Self {
        Self {
            operations,
            skip_csg_union: false,
            vertex_modifier: None,
        }
    }

    pub fn with_skip_csg_union(mut self, skip: bool) -> Self {
        self.skip_csg_union = skip;
        self
    }

    pub fn with_vertex_modifier(mut self, modifier: VertexModifier) -> Self {
        self.vertex_modifier = Some(modifier);
        self
    }
}

/// External content (a glb) displayed as its bounding box
#[derive(Debug, Clone, Default)]
pub struct ContentRepresentation {
    pub glb_location: String,
    pub bounding_box: Option<BBox3>,
}

/// A curve drawn as lines
#[derive(Debug, Clone)]
pub struct CurveRepresentation {
    pub curve: BoundedCurve,
    pub is_selectable: bool,
}

#[derive(Debug, Clone)]
pub enum Representation {
    Solid(SolidRepresentation),
    Content(ContentRepresentation),
    Curve(CurveRepresentation),
}

/// Host-relative element whose void operations cut its host
#[derive(Debug, Clone)]
pub struct Opening {
    pub id: Uuid,
    /// Placement relative to the host
    pub transform: Option<Matrix4<f64>>,
    pub representation: SolidRepresentation,
}

impl Opening {
    pub fn new(representation: SolidRepresentation, transform: Option<Matrix4<f64>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            transform,
            representation,
        }
    }

    /// Void extrusion of a profile reaching `depth_front` along +Z and
    /// `depth_back` along -Z from the profile plane
    pub fn from_profile(
        profile: Profile2D,
        depth_front: f64,
        depth_back: f64,
        transform: Option<Matrix4<f64>>,
    ) -> Result<Self> {
        let void = SolidOperation::extrude(profile, depth_front + depth_back, Vector3::z(), true)?
            .with_local_transform(Matrix4::new_translation(&Vector3::new(0.0, 0.0, -depth_back)));
        Ok(Self::new(SolidRepresentation::new(vec![void]), transform))
    }
}

/// An element with geometry
#[derive(Debug, Clone)]
pub struct GeometricElement {
    pub id: Uuid,
    pub name: Option<String>,
    pub transform: Option<Matrix4<f64>>,
    pub representation: Option<Representation>,
    pub openings: Vec<Opening>,
}

impl GeometricElement {
    pub fn new(representation: Option<Representation>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: None,
            transform: None,
            representation,
            openings: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_transform(mut self, transform: Matrix4<f64>) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn with_opening(mut self, opening: Opening) -> Self {
        self.openings.push(opening);
        self
    }
}

/// How a primitive's indices are assembled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveMode {
    Triangles,
    Lines,
    LineStrip,
    LineLoop,
    Points,
}

impl PrimitiveMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveMode::Triangles => "triangles",
            PrimitiveMode::Lines => "lines",
            PrimitiveMode::LineStrip => "line_strip",
            PrimitiveMode::LineLoop => "line_loop",
            PrimitiveMode::Points => "points",
        }
    }
}

/// Renderable output of one element
#[derive(Debug, Clone)]
pub struct ResolvedPrimitive {
    pub buffers: Vec<GraphicsBuffers>,
    pub primitive_id: String,
    pub mode: PrimitiveMode,
}

impl ResolvedPrimitive {
    pub fn vertex_count(&self) -> usize {
        self.buffers.iter().map(|b| b.vertex_count()).sum()
    }

    pub fn index_count(&self) -> usize {
        self.buffers.iter().map(|b| b.index_count()).sum()
    }
}

/// Resolves element representations into buffers
pub struct RepresentationRouter {
    engine: Box<dyn BooleanEngine>,
    tessellator: Tessellator,
}

impl Default for RepresentationRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl RepresentationRouter {
    /// csgrs booleans, earcut triangulation, default tolerances
    pub fn new() -> Self {
        Self::with_options(TessellationOptions::default())
    }

    pub fn with_options(options: TessellationOptions) -> Self {
        Self {
            engine: Box::new(CsgrsEngine::new()),
            tessellator: Tessellator::with_options(options),
        }
    }

    pub fn with_engine(engine: Box<dyn BooleanEngine>, tessellator: Tessellator) -> Self {
        Self {
            engine,
            tessellator,
        }
    }

    pub fn tessellator(&self) -> &Tessellator {
        &self.tessellator
    }

    /// Resolve an element. `Ok(None)` means there is nothing to draw.
    pub fn resolve(
        &self,
        element: Option<&GeometricElement>,
    ) -> Result<Option<ResolvedPrimitive>> {
        let element = element.ok_or(Error::MissingElement)?;
        let representation = match &element.representation {
            Some(r) => r,
            None => return Ok(None),
        };

        match representation {
            Representation::Solid(rep) => self.resolve_solid(element, rep),
            Representation::Content(rep) => self.resolve_content(element, rep),
            Representation::Curve(rep) => self.resolve_curve(element, rep),
        }
    }

    /// World-space bounds of an element's composed geometry. Empty when
    /// there is nothing to compose.
    pub fn compute_bounds(&self, element: &GeometricElement) -> Result<BBox3> {
        let transform = element.transform.as_ref();
        let engine = self.engine.as_ref();
        let composed = match &element.representation {
            None => None,
            Some(Representation::Solid(rep)) => {
                compose(&rep.operations, transform, &element.openings, true, engine)?
            }
            Some(Representation::Content(rep)) => match usable_box(rep) {
                Some(bbox) => {
                    compose(&[content_box(&bbox)?], transform, &element.openings, true, engine)?
                }
                None => None,
            },
            Some(Representation::Curve(rep)) => {
                let points: Vec<_> = rep
                    .curve
                    .render_vertices()
                    .iter()
                    .map(|p| transform::transform_point(transform, p))
                    .collect();
                return Ok(BBox3::from_points(&points));
            }
        };
        Ok(composed.map_or_else(BBox3::default, |c| BBox3::from_points(&c.positions())))
    }

    fn resolve_solid(
        &self,
        element: &GeometricElement,
        rep: &SolidRepresentation,
    ) -> Result<Option<ResolvedPrimitive>> {
        let primitive_id = format!("{}_mesh", element.id);

        let buffers = if rep.skip_csg_union {
            let mut providers = Vec::new();
            let mut solid_id = 0u32;
            for op in rep.operations.iter().filter(|op| !op.is_void) {
                providers.push(SolidTargetProvider::new(
                    op.solid(),
                    solid_id,
                    op.local_transform,
                ));
                solid_id += 1;
            }
            if providers.is_empty() {
                return Ok(None);
            }
            let refs: Vec<&dyn TargetProvider> =
                providers.iter().map(|p| p as &dyn TargetProvider).collect();
            self.tessellator
                .tessellate_chunked(&refs, rep.vertex_modifier.as_ref())?
        } else {
            let composed = match compose(
                &rep.operations,
                element.transform.as_ref(),
                &element.openings,
                false,
                self.engine.as_ref(),
            )? {
                Some(composed) => composed,
                None => return Ok(None),
            };
            self.tessellate_composed(&composed, rep.vertex_modifier.as_ref())?
        };

        Ok(triangles(primitive_id, buffers))
    }

    fn resolve_content(
        &self,
        element: &GeometricElement,
        rep: &ContentRepresentation,
    ) -> Result<Option<ResolvedPrimitive>> {
        let primitive_id = format!("{}_mesh", element.id);

        let bbox = match usable_box(rep) {
            Some(bbox) => bbox,
            None => {
                warn!(
                    element = %element.id,
                    glb = %rep.glb_location,
                    "content without a usable bounding box"
                );
                return Ok(Some(ResolvedPrimitive {
                    buffers: Vec::new(),
                    primitive_id,
                    mode: PrimitiveMode::Triangles,
                }));
            }
        };

        let operations = [content_box(&bbox)?];
        let composed = match compose(
            &operations,
            element.transform.as_ref(),
            &element.openings,
            false,
            self.engine.as_ref(),
        )? {
            Some(composed) => composed,
            None => return Ok(None),
        };
        let buffers = self.tessellate_composed(&composed, None)?;
        Ok(triangles(primitive_id, buffers))
    }

    fn resolve_curve(
        &self,
        element: &GeometricElement,
        rep: &CurveRepresentation,
    ) -> Result<Option<ResolvedPrimitive>> {
        let vertices = rep.curve.render_vertices();
        if vertices.len() < 2 {
            return Ok(None);
        }

        let mut primitive_id = format!("{}_curve", element.id);
        if !rep.is_selectable {
            primitive_id = format!("unselectable_{}", primitive_id);
        }
        let mode = if rep.curve.is_closed() {
            PrimitiveMode::LineLoop
        } else {
            PrimitiveMode::LineStrip
        };

        Ok(Some(ResolvedPrimitive {
            buffers: vec![GraphicsBuffers::from_points(&vertices)?],
            primitive_id,
            mode,
        }))
    }

    fn tessellate_composed(
        &self,
        composed: &ComposedSolid,
        modifier: Option<&VertexModifier>,
    ) -> Result<Vec<GraphicsBuffers>> {
        let provider = composed.target_provider();
        self.tessellator.tessellate_chunked(&[provider.as_ref()], modifier)
    }
}

/// The content's bounding box, if it can be drawn
fn usable_box(rep: &ContentRepresentation) -> Option<BBox3> {
    rep.bounding_box.filter(|b| b.is_valid() && !b.is_degenerate())
}

/// Box extrusion covering a bounding box
fn content_box(bbox: &BBox3) -> Result<SolidOperation> {
    let profile = create_rectangle_from_corners(
        Point2::new(bbox.min.x, bbox.min.y),
        Point2::new(bbox.max.x, bbox.max.y),
    );
    let lift = Matrix4::new_translation(&Vector3::new(0.0, 0.0, bbox.min.z));
    SolidOperation::extrude(profile, bbox.size().z, Vector3::z(), false)
        .map(|op| op.with_local_transform(lift))
}

/// Triangle primitive, or `None` when nothing was tessellated
fn triangles(primitive_id: String, buffers: Vec<GraphicsBuffers>) -> Option<ResolvedPrimitive> {
    let vertex_count: usize = buffers.iter().map(|b| b.vertex_count()).sum();
    if vertex_count == 0 {
        debug!(primitive = %primitive_id, "no vertices after tessellation");
        return None;
    }
    Some(ResolvedPrimitive {
        buffers,
        primitive_id,
        mode: PrimitiveMode::Triangles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::create_rectangle;
    use nalgebra::Point3;

    fn extrude(width: f64, depth: f64, height: f64, is_void: bool) -> SolidOperation {
        SolidOperation::extrude(create_rectangle(width, depth), height, Vector3::z(), is_void)
            .unwrap()
    }

    fn wall() -> GeometricElement {
        let op = extrude(4.0, 0.2, 3.0, false);
        GeometricElement::new(Some(Representation::Solid(SolidRepresentation::new(vec![op]))))
    }

    fn content(min: Point3<f64>, max: Point3<f64>) -> GeometricElement {
        let rep = ContentRepresentation {
            glb_location: "chair.glb".to_string(),
            bounding_box: Some(BBox3::new(min, max)),
        };
        GeometricElement::new(Some(Representation::Content(rep)))
    }

    #[test]
    fn test_missing_element_is_error() {
        let router = RepresentationRouter::new();
        assert!(matches!(router.resolve(None), Err(Error::MissingElement)));
    }

    #[test]
    fn test_element_without_representation() {
        let router = RepresentationRouter::new();
        let element = GeometricElement::new(None);
        assert!(router.resolve(Some(&element)).unwrap().is_none());
        assert!(!router.compute_bounds(&element).unwrap().is_valid());
    }

    #[test]
    fn test_solid_primitive_id_and_mode() {
        let router = RepresentationRouter::new();
        let element = wall();
        let primitive = router.resolve(Some(&element)).unwrap().unwrap();

        assert_eq!(primitive.primitive_id, format!("{}_mesh", element.id));
        assert_eq!(primitive.mode, PrimitiveMode::Triangles);
        assert_eq!(primitive.buffers.len(), 1);
        assert_eq!(primitive.vertex_count(), 24);
    }

    #[test]
    fn test_skip_csg_union_tessellates_each_solid() {
        let a = extrude(1.0, 1.0, 1.0, false);
        let b = a
            .clone()
            .with_local_transform(Matrix4::new_translation(&Vector3::new(0.5, 0.0, 0.0)));
        let void = extrude(0.2, 0.2, 1.0, true);
        let rep = SolidRepresentation::new(vec![a, b, void]).with_skip_csg_union(true);
        let element = GeometricElement::new(Some(Representation::Solid(rep)));

        let primitive = RepresentationRouter::new().resolve(Some(&element)).unwrap().unwrap();
        assert_eq!(primitive.vertex_count(), 48);
    }

    #[test]
    fn test_skip_csg_union_with_only_voids() {
        let void = extrude(1.0, 1.0, 1.0, true);
        let rep = SolidRepresentation::new(vec![void]).with_skip_csg_union(true);
        let element = GeometricElement::new(Some(Representation::Solid(rep)));
        assert!(RepresentationRouter::new().resolve(Some(&element)).unwrap().is_none());
    }

    #[test]
    fn test_bounds_compose_even_when_skipping_union() {
        // the void removes everything above z = 1
        let block = extrude(1.0, 1.0, 2.0, false);
        let upper = extrude(2.0, 2.0, 2.0, true)
            .with_local_transform(Matrix4::new_translation(&Vector3::new(0.0, 0.0, 1.0)));
        let rep = SolidRepresentation::new(vec![block, upper]).with_skip_csg_union(true);
        let element = GeometricElement::new(Some(Representation::Solid(rep)));
        let router = RepresentationRouter::new();

        let primitive = router.resolve(Some(&element)).unwrap().unwrap();
        assert_eq!(primitive.vertex_count(), 24);
        assert!((primitive.buffers[0].position_max[2] - 2.0).abs() < 1e-6);

        let bounds = router.compute_bounds(&element).unwrap();
        assert!(bounds.min.z.abs() < 1e-6);
        assert!((bounds.max.z - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_skip_csg_union_ignores_openings() {
        let opening = Opening::from_profile(create_rectangle(0.5, 0.5), 1.0, 1.0, None).unwrap();
        let rep = SolidRepresentation::new(vec![extrude(1.0, 1.0, 2.0, false)]);
        let router = RepresentationRouter::new();

        let skipped = GeometricElement::new(Some(Representation::Solid(
            rep.clone().with_skip_csg_union(true),
        )))
        .with_opening(opening.clone());
        let primitive = router.resolve(Some(&skipped)).unwrap().unwrap();
        assert_eq!(primitive.vertex_count(), 24);

        let composed =
            GeometricElement::new(Some(Representation::Solid(rep))).with_opening(opening);
        let primitive = router.resolve(Some(&composed)).unwrap().unwrap();
        assert_ne!(primitive.vertex_count(), 24);
    }

    #[test]
    fn test_bounds_are_in_world_space() {
        let router = RepresentationRouter::new();
        let moved = Matrix4::new_translation(&Vector3::new(10.0, 0.0, 1.0));
        let element = wall().with_transform(moved);
        let bounds = router.compute_bounds(&element).unwrap();

        assert!((bounds.min - Point3::new(8.0, -0.1, 1.0)).norm() < 1e-9);
        assert!((bounds.max - Point3::new(12.0, 0.1, 4.0)).norm() < 1e-9);
    }

    #[test]
    fn test_degenerate_content_has_empty_buffers() {
        let element = content(Point3::origin(), Point3::new(1.0, 1.0, 0.0));
        let primitive = RepresentationRouter::new().resolve(Some(&element)).unwrap().unwrap();

        assert!(primitive.buffers.is_empty());
        assert_eq!(primitive.primitive_id, format!("{}_mesh", element.id));
    }

    #[test]
    fn test_content_box() {
        let element = content(Point3::new(0.0, 0.0, 1.0), Point3::new(1.0, 2.0, 3.0));
        let router = RepresentationRouter::new();

        let primitive = router.resolve(Some(&element)).unwrap().unwrap();
        assert_eq!(primitive.vertex_count(), 24);

        let bounds = router.compute_bounds(&element).unwrap();
        assert!((bounds.min - Point3::new(0.0, 0.0, 1.0)).norm() < 1e-9);
        assert!((bounds.max - Point3::new(1.0, 2.0, 3.0)).norm() < 1e-9);
    }

    #[test]
    fn test_content_box_is_cut_by_openings() {
        let router = RepresentationRouter::new();
        let plain = content(Point3::origin(), Point3::new(1.0, 1.0, 2.0));
        let through = Matrix4::new_translation(&Vector3::new(0.5, 0.5, 1.0));
        let opening =
            Opening::from_profile(create_rectangle(0.4, 0.4), 1.5, 1.5, Some(through)).unwrap();
        let pierced = content(Point3::origin(), Point3::new(1.0, 1.0, 2.0)).with_opening(opening);

        let before = router.resolve(Some(&plain)).unwrap().unwrap();
        let after = router.resolve(Some(&pierced)).unwrap().unwrap();
        assert!(after.index_count() > before.index_count());

        let bounds = router.compute_bounds(&pierced).unwrap();
        assert!(bounds.min.coords.norm() < 1e-6);
        assert!((bounds.max - Point3::new(1.0, 1.0, 2.0)).norm() < 1e-6);
    }

    #[test]
    fn test_curve_primitive() {
        let polygon = BoundedCurve::Polygon(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ]);
        let element = GeometricElement::new(Some(Representation::Curve(CurveRepresentation {
            curve: polygon,
            is_selectable: false,
        })));

        let primitive = RepresentationRouter::new().resolve(Some(&element)).unwrap().unwrap();
        assert_eq!(primitive.primitive_id, format!("unselectable_{}_curve", element.id));
        assert_eq!(primitive.mode, PrimitiveMode::LineLoop);
        assert_eq!(primitive.buffers[0].indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_short_curve_is_omitted() {
        let element = GeometricElement::new(Some(Representation::Curve(CurveRepresentation {
            curve: BoundedCurve::Polyline(vec![Point3::origin()]),
            is_selectable: true,
        })));
        assert!(RepresentationRouter::new().resolve(Some(&element)).unwrap().is_none());
    }
}
