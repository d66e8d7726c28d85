// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Elements-Lite Geometry
//!
//! Solid composition and tessellation for building elements: solid
//! operations are combined with csgrs booleans, triangulated with earcutr
//! and packed into GPU-ready buffers. Plane sections support drawing
//! generation.

pub mod bounds;
pub mod buffers;
pub mod compose;
pub mod csg;
pub mod curve;
pub mod error;
pub mod operations;
pub mod profile;
pub mod representation;
pub mod section;
pub mod solid;
pub mod tessellation;
pub mod transform;
pub mod triangulation;

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix4, Point2, Point3, Vector2, Vector3};

pub use bounds::BBox3;
pub use buffers::{Color, GraphicsBuffers, Uv, VertexAttributes, MAX_VERTICES};
pub use compose::{compose, ComposedFace, ComposedSolid};
pub use csg::{BooleanEngine, CsgPolygon, CsgSolid, CsgrsEngine, FaceTag, Plane};
pub use curve::BoundedCurve;
pub use error::{Error, Result};
pub use operations::{Extrude, Lamina, OperationKind, SolidOperation, Sweep};
pub use profile::{create_circle, create_rectangle, Profile2D};
pub use representation::{
    ContentRepresentation, CurveRepresentation, GeometricElement, Opening, PrimitiveMode,
    Representation, RepresentationRouter, ResolvedPrimitive, SolidRepresentation,
};
pub use section::{intersect, PlaneSection, SectionLoop};
pub use solid::{Face, Solid};
pub use tessellation::{
    CsgTargetProvider, SolidTargetProvider, TargetProvider, TessellationOptions,
    TessellationTarget, Tessellator, VertexModifier,
};
pub use triangulation::{ContourSet, EarcutTriangulator, TriangleSet, Triangulator};
