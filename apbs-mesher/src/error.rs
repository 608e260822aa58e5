use miette::Diagnostic;

#[derive(thiserror::Error, Debug, Diagnostic)]
/// Errors raised while generating or refining a mesh
pub enum MeshError {
    #[error("element {element} does not exist in a mesh of {num_elements} elements")]
    UnknownElement { element: usize, num_elements: usize },
    #[error("element {0} has already been refined")]
    AlreadyRefined(usize),
    #[error("element {0} appears more than once in a single refinement pass")]
    DuplicateElement(usize),
    #[error("{0}")]
    InvalidExtent(String),
}
