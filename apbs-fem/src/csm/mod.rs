//! # Charge-simplex map
//!
//! Associates each point charge of an atom list with the simplex of a finite element mesh
//! which contains it. The map is built once by point location, then kept current through
//! mesh refinement by redistributing only the charges of the simplices that were refined.
//!
//! Each simplex id owns a slot holding the head of a singly linked chain of charge indices.
//! Chain nodes are checked out of a [`LinkPool`], a block arena addressed by index, so
//! moving a charge between simplices relinks a node rather than allocating one.

mod chain;
mod locate;
mod map;
mod pool;
mod statistics;

pub use chain::ChainIter;
pub use locate::{LocatorKind, MAXIMUM_BUCKETS_PER_AXIS};
pub use map::{ChargeSimplexMap, ChargeSimplexMapBuilder, MapSettings};
pub use pool::{LinkNode, LinkPool, NodeIndex, DEFAULT_BLOCK_SIZE};
pub use statistics::{BuildReport, MapStatistics, UpdateReport};
