use crate::{Tetrahedron, TetrahedronConnectivity};
use nalgebra::{allocator::Allocator, DefaultAllocator, DimName, OPoint, Point3, RealField, U3};
use std::collections::HashMap;

/// Where an element sits in the refinement tree
#[derive(Clone, Debug, Default)]
pub(crate) struct Lineage {
    pub(crate) parent: Option<usize>,
    pub(crate) children: Vec<usize>,
}

/// A generic `Mesh` object valid in all dimensions
///
/// Elements are never removed. Refining an element records its children in the lineage
/// table, after which the element is retired and only its children are active.
#[derive(Clone)]
pub struct Mesh<T: RealField, D, Connectivity>
where
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    vertices: Vec<OPoint<T, D>>,
    connectivity: Vec<Connectivity>,
    pub(crate) lineage: Vec<Lineage>,
    /// Vertices inserted at edge midpoints, keyed by the sorted vertex pair
    pub(crate) edge_midpoints: HashMap<[usize; 2], usize>,
}

impl<T, D, Connectivity> Mesh<T, D, Connectivity>
where
    T: RealField,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    pub fn num_nodes(&self) -> usize {
        self.vertices.len()
    }

    /// The number of elements ever created, including retired ones
    pub fn num_elements(&self) -> usize {
        self.connectivity.len()
    }

    pub fn is_element_active(&self, element: usize) -> bool {
        self.lineage[element].children.is_empty()
    }

    pub fn number_of_active_elements(&self) -> usize {
        self.lineage
            .iter()
            .filter(|lineage| lineage.children.is_empty())
            .count()
    }

    pub fn active_elements(&self) -> impl Iterator<Item = usize> + '_ {
        self.lineage
            .iter()
            .enumerate()
            .filter(|(_, lineage)| lineage.children.is_empty())
            .map(|(index, _)| index)
    }

    pub fn children(&self, element: usize) -> &[usize] {
        &self.lineage[element].children
    }

    pub fn parent(&self, element: usize) -> Option<usize> {
        self.lineage[element].parent
    }
}

/// Type aliases for implemented mesh dimensionalitys and discretisations
pub type Mesh3d<T> = Mesh<T, U3, TetrahedronConnectivity>;

impl<T, D, C> Mesh<T, D, C>
where
    T: RealField,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    pub fn vertices(&self) -> &[OPoint<T, D>] {
        &self.vertices
    }

    pub fn from_vertices_and_connectivity(
        vertices: Vec<OPoint<T, D>>,
        connectivity: Vec<C>,
    ) -> Self {
        let lineage = vec![Lineage::default(); connectivity.len()];
        Self {
            vertices,
            connectivity,
            lineage,
            edge_midpoints: HashMap::new(),
        }
    }

    pub(crate) fn push_vertex(&mut self, vertex: OPoint<T, D>) -> usize {
        self.vertices.push(vertex);
        self.vertices.len() - 1
    }

    pub(crate) fn push_element(&mut self, element: C, parent: Option<usize>) -> usize {
        self.connectivity.push(element);
        self.lineage.push(Lineage {
            parent,
            children: Vec::new(),
        });
        self.connectivity.len() - 1
    }

    pub(crate) fn element_connectivity(&self, element: usize) -> &C {
        &self.connectivity[element]
    }
}

impl<T> Mesh3d<T>
where
    T: Copy + RealField,
{
    pub fn element(&self, element: usize) -> Tetrahedron<T> {
        let indices = self.connectivity[element].0;
        let vertices: [Point3<T>; 4] = indices.map(|index| self.vertices[index]);
        Tetrahedron::from_vertices(&vertices, &indices)
    }

    /// The total volume of the active elements
    pub fn active_volume(&self) -> T {
        self.active_elements()
            .fold(T::zero(), |volume, element| {
                volume + self.element(element).volume()
            })
    }
}
