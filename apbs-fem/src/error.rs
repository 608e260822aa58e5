use miette::Diagnostic;

#[derive(thiserror::Error, Debug, Diagnostic)]
/// Errors raised by the charge-simplex map
pub enum CsmError {
    /// The map cannot be bound to the supplied collaborators
    #[error("cannot construct a charge-simplex map: {0}")]
    #[diagnostic(code(apbs_fem::csm::construction))]
    Construction(String),
    /// An update referenced a simplex the map never built, or the grid reported a
    /// refinement which does not match the map's state. A full rebuild recovers.
    #[error("inconsistent topology at simplex {simplex}: {reason}")]
    #[diagnostic(
        code(apbs_fem::csm::topology),
        help("rebuild the map from scratch with `build`")
    )]
    InconsistentTopology {
        /// The simplex id at which the inconsistency was detected
        simplex: usize,
        /// What was wrong with it
        reason: &'static str,
    },
    /// A charge was requested past the end of a simplex's chain
    #[error("charge {index} requested from simplex {simplex}, which holds {count} charges")]
    #[diagnostic(code(apbs_fem::csm::range))]
    ChargeIndexOutOfRange {
        /// The requested position in the chain
        index: usize,
        /// The simplex queried
        simplex: usize,
        /// How many charges the simplex holds
        count: usize,
    },
}
