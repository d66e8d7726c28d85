// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Solid operations
//!
//! Declarative descriptions of how an element's solids are generated. Each
//! operation builds its [`Solid`] once at construction and is immutable
//! afterwards.

use crate::curve::BoundedCurve;
use crate::error::Result;
use crate::profile::Profile2D;
use crate::solid::Solid;
use crate::transform;
use nalgebra::{Matrix4, Point3, Vector3};

/// Straight extrusion of a profile
#[derive(Debug, Clone)]
pub struct Extrude {
    pub profile: Profile2D,
    pub height: f64,
    pub direction: Vector3<f64>,
    /// Centre the extrusion on the profile plane
    pub both_sides: bool,
    solid: Solid,
}

impl Extrude {
    pub fn new(
        profile: Profile2D,
        height: f64,
        direction: Vector3<f64>,
        both_sides: bool,
    ) -> Result<Self> {
        let solid = Solid::sweep_face(&profile, &direction, height, both_sides, 0.0)?;
        Ok(Self {
            profile,
            height,
            direction,
            both_sides,
            solid,
        })
    }

    pub fn solid(&self) -> &Solid {
        &self.solid
    }
}

/// Profile swept along a curve
#[derive(Debug, Clone)]
pub struct Sweep {
    pub profile: Profile2D,
    pub curve: BoundedCurve,
    pub start_setback: f64,
    pub end_setback: f64,
    /// Profile rotation about the curve tangent, in degrees
    pub profile_rotation: f64,
    solid: Solid,
}

impl Sweep {
    pub fn new(
        profile: Profile2D,
        curve: BoundedCurve,
        start_setback: f64,
        end_setback: f64,
        profile_rotation: f64,
    ) -> Result<Self> {
        let solid = Solid::sweep_along_curve(
            &profile,
            &curve,
            start_setback,
            end_setback,
            profile_rotation,
        )?;
        Ok(Self {
            profile,
            curve,
            start_setback,
            end_setback,
            profile_rotation,
            solid,
        })
    }

    pub fn solid(&self) -> &Solid {
        &self.solid
    }
}

/// Planar zero-thickness surface
#[derive(Debug, Clone)]
pub struct Lamina {
    pub perimeter: Vec<Point3<f64>>,
    pub voids: Vec<Vec<Point3<f64>>>,
    solid: Solid,
}

impl Lamina {
    pub fn new(perimeter: Vec<Point3<f64>>, voids: Vec<Vec<Point3<f64>>>) -> Result<Self> {
        let solid = Solid::lamina(&perimeter, &voids)?;
        Ok(Self {
            perimeter,
            voids,
            solid,
        })
    }

    pub fn solid(&self) -> &Solid {
        &self.solid
    }
}

#[derive(Debug, Clone)]
pub enum OperationKind {
    Extrude(Extrude),
    Sweep(Sweep),
    Lamina(Lamina),
}

/// A solid-generating operation with its void flag and placement
#[derive(Debug, Clone)]
pub struct SolidOperation {
    pub kind: OperationKind,
    pub is_void: bool,
    /// Applied before the owning element's transform
    pub local_transform: Option<Matrix4<f64>>,
}

impl SolidOperation {
    pub fn new(kind: OperationKind, is_void: bool) -> Self {
        Self {
            kind,
            is_void,
            local_transform: None,
        }
    }

    pub fn extrude(
        profile: Profile2D,
        height: f64,
        direction: Vector3<f64>,
        is_void: bool,
    ) -> Result<Self> {
        let extrude = Extrude::new(profile, height, direction, false)?;
        Ok(Self::new(OperationKind::Extrude(extrude), is_void))
    }

    pub fn sweep(
        profile: Profile2D,
        curve: BoundedCurve,
        start_setback: f64,
        end_setback: f64,
        profile_rotation: f64,
        is_void: bool,
    ) -> Result<Self> {
        let sweep = Sweep::new(profile, curve, start_setback, end_setback, profile_rotation)?;
        Ok(Self::new(OperationKind::Sweep(sweep), is_void))
    }

    pub fn lamina(
        perimeter: Vec<Point3<f64>>,
        voids: Vec<Vec<Point3<f64>>>,
        is_void: bool,
    ) -> Result<Self> {
        let lamina = Lamina::new(perimeter, voids)?;
        Ok(Self::new(OperationKind::Lamina(lamina), is_void))
    }

    pub fn with_local_transform(mut self, transform: Matrix4<f64>) -> Self {
        self.local_transform = Some(transform);
        self
    }

    /// The generated solid in the operation's own coordinates
    pub fn solid(&self) -> &Solid {
        match &self.kind {
            OperationKind::Extrude(op) => op.solid(),
            OperationKind::Sweep(op) => op.solid(),
            OperationKind::Lamina(op) => op.solid(),
        }
    }

    /// The solid moved by the local transform, then by `outer` when given
    pub fn placed_solid(&self, outer: Option<&Matrix4<f64>>) -> Solid {
        match transform::concatenate(outer, self.local_transform.as_ref()) {
            Some(m) if !transform::is_identity(Some(&m)) => self.solid().transformed(&m),
            _ => self.solid().clone(),
        }
    }
}

impl From<Extrude> for SolidOperation {
    fn from(op: Extrude) -> Self {
        SolidOperation::new(OperationKind::Extrude(op), false)
    }
}

impl From<Sweep> for SolidOperation {
    fn from(op: Sweep) -> Self {
        SolidOperation::new(OperationKind::Sweep(op), false)
    }
}

impl From<Lamina> for SolidOperation {
    fn from(op: Lamina) -> Self {
        SolidOperation::new(OperationKind::Lamina(op), false)
    }
}
