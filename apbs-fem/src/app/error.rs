// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! # Error
//! The error type for the binary

use miette::Diagnostic;

#[derive(thiserror::Error, Debug, Diagnostic)]
pub(crate) enum FemError {
    #[error(transparent)]
    #[diagnostic(code(apbs_fem::config_error))]
    ConfigError(#[from] anyhow::Error),
    #[error("the structure holds no atoms to mesh")]
    #[diagnostic(code(apbs_fem::empty_structure))]
    EmptyStructure,
    #[error(transparent)]
    Mesh(#[from] apbs_mesher::MeshError),
    #[error(transparent)]
    Map(#[from] crate::error::CsmError),
}
