// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Tetrahedral meshes for the finite element charge-simplex map
//!
//! The mesher owns vertices and simplices, generates box meshes, and refines selected
//! simplices by longest-edge bisection. Refinement never mutates a simplex in place: the
//! refined simplex is retired and two children are appended with fresh identities, so
//! simplex ids are stable and never reused.
//!
//! Consumers talk to a mesh through the [`GridManager`] trait, which exposes exactly what
//! point-location needs: the number of simplices ever issued, whether a simplex is still a
//! leaf of the refinement tree, its geometry, and the children it was replaced by.

mod connectivity;
mod error;
mod generate;
mod mesh;
mod primitives;
mod refine;

pub use connectivity::*;
pub use error::MeshError;
pub use generate::*;
pub use mesh::*;
pub use primitives::*;
pub use refine::{RefinementPass, Replacement};

use nalgebra::{Point3, RealField};

/// The interface a mesh presents to the charge-simplex map
///
/// Simplex ids run over `0..number_of_simplices()` and include retired simplices, which
/// are never reused. Only active simplices take part in point location.
pub trait GridManager<T: RealField> {
    /// The number of simplex identities issued so far, active or retired
    fn number_of_simplices(&self) -> usize;
    /// Whether `simplex` is a leaf of the refinement tree
    fn is_active(&self, simplex: usize) -> bool;
    /// The geometry of `simplex`
    fn simplex(&self, simplex: usize) -> Tetrahedron<T>;
    /// The simplices which replaced `simplex` when it was refined, empty if it never was
    fn children_of(&self, simplex: usize) -> &[usize];
    /// Closed point-in-simplex predicate
    fn contains_point(&self, simplex: usize, point: &Point3<T>) -> bool
    where
        T: Copy,
    {
        self.simplex(simplex).contains(point)
    }
}

impl<T> GridManager<T> for Mesh3d<T>
where
    T: Copy + RealField,
{
    fn number_of_simplices(&self) -> usize {
        self.num_elements()
    }
    fn is_active(&self, simplex: usize) -> bool {
        self.is_element_active(simplex)
    }
    fn simplex(&self, simplex: usize) -> Tetrahedron<T> {
        self.element(simplex)
    }
    fn children_of(&self, simplex: usize) -> &[usize] {
        self.children(simplex)
    }
}
