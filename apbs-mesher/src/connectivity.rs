/// The vertex indices of a single tetrahedral element
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TetrahedronConnectivity(pub [usize; 4]);

impl TetrahedronConnectivity {
    /// Returns a copy with the vertex in local slot `slot` swapped for `vertex`
    pub(crate) fn with_vertex(&self, slot: usize, vertex: usize) -> Self {
        let mut indices = self.0;
        indices[slot] = vertex;
        Self(indices)
    }
}
