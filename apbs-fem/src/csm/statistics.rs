use std::fmt;

/// The outcome of a full build
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Charges placed into a simplex chain
    pub associated: usize,
    /// Charges lying outside every active simplex
    pub unassociated: usize,
}

/// The outcome of an incremental update
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Simplices whose chains were redistributed
    pub refined: usize,
    /// Charges found in a child of the simplex that held them
    pub relocated: usize,
    /// Charges only found in the child of another simplex refined in the same batch
    pub recovered_at_seams: usize,
    /// Charges found in no child of the batch and dropped from the map
    pub unassociated: usize,
}

/// A snapshot of the map for diagnostic reporting
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MapStatistics {
    /// Length of the atom list
    pub number_of_atoms: usize,
    /// Charges held by some chain
    pub associated: usize,
    /// Charges held by no chain
    pub unassociated: usize,
    /// Simplices which are leaves of the refinement tree
    pub active_simplices: usize,
    /// Simplices holding at least one charge
    pub occupied_simplices: usize,
    /// The most charges held by one simplex
    pub longest_chain: usize,
    /// Allocated simplex slots
    pub capacity: usize,
    /// Link nodes checked out of the pool
    pub pool_in_use: usize,
    /// Link nodes available without allocating
    pub pool_free: usize,
    /// Blocks allocated by the pool
    pub pool_blocks: usize,
}

impl fmt::Display for MapStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} charges mapped ({} unassociated) into {} of {} simplices, longest chain {}; \
             {} slots allocated; pool {} in use, {} free over {} blocks",
            self.associated,
            self.number_of_atoms,
            self.unassociated,
            self.occupied_simplices,
            self.active_simplices,
            self.longest_chain,
            self.capacity,
            self.pool_in_use,
            self.pool_free,
            self.pool_blocks,
        )
    }
}
