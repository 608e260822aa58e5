// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The charge-simplex map of a finite element Poisson-Boltzmann solver
//!
//! # Overview
//! Finite element electrostatics integrates the charge density of a molecule against the
//! basis functions of a tetrahedral mesh. The charges are point charges, so each
//! integration kernel needs to enumerate the atoms lying inside one simplex. The
//! [`csm::ChargeSimplexMap`] answers that query in time proportional to the number of
//! charges returned, and keeps its answer current as the mesh is adaptively refined by
//! moving only the charges of the refined simplices.
//!
//! # Usage
//! The binary reads a structure from a `.toml` file:
//!
//! ```toml
//! [[atoms]]
//! position = [0.0, 0.0, 0.1173]
//! charge = -0.834
//! radius = 1.52
//! ```
//!
//! meshes the bounding box of the structure, maps the charges and refines every simplex
//! holding too many of them, updating the map after each refinement pass.

#![warn(missing_docs)]
#![allow(clippy::type_complexity)]

/// The command line application, configuration and tracing
pub mod app;

/// Atom lists and structure files
pub mod atoms;

/// The charge-simplex map and its node pool
pub mod csm;

/// Error handling
mod error;

pub use error::CsmError;
