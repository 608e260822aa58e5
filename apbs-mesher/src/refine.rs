//! Longest-edge bisection
//!
//! A refined tetrahedron is split through the midpoint of its longest edge into two
//! children, each keeping one end of that edge. The parent is retired and the children are
//! appended, so every pass issues new simplex ids and leaves existing ids untouched.
//! Midpoints are shared between elements that bisect the same edge.

use crate::{Mesh3d, MeshError};
use nalgebra::{Point3, RealField};
use std::collections::HashSet;

/// One refined simplex and the children which replace it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Replacement {
    pub parent: usize,
    pub children: Vec<usize>,
}

/// The record of a single refinement pass, in the order the simplices were refined
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RefinementPass {
    replacements: Vec<Replacement>,
}

impl RefinementPass {
    pub fn replacements(&self) -> &[Replacement] {
        &self.replacements
    }

    /// The refined simplices, suitable for handing to a charge-simplex map update
    pub fn refined(&self) -> Vec<usize> {
        self.replacements.iter().map(|r| r.parent).collect()
    }

    pub fn number_of_new_simplices(&self) -> usize {
        self.replacements.iter().map(|r| r.children.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.replacements.is_empty()
    }
}

impl<T> Mesh3d<T>
where
    T: Copy + RealField,
{
    /// Bisects every element in `elements`
    ///
    /// The request is validated in full before the mesh is touched: unknown, retired or
    /// repeated elements fail the whole pass.
    #[tracing::instrument(name = "Mesh refinement", level = "debug", skip_all, fields(requested = elements.len()))]
    pub fn refine(&mut self, elements: &[usize]) -> Result<RefinementPass, MeshError> {
        let mut seen = HashSet::with_capacity(elements.len());
        for &element in elements {
            if element >= self.num_elements() {
                return Err(MeshError::UnknownElement {
                    element,
                    num_elements: self.num_elements(),
                });
            }
            if !self.is_element_active(element) {
                return Err(MeshError::AlreadyRefined(element));
            }
            if !seen.insert(element) {
                return Err(MeshError::DuplicateElement(element));
            }
        }

        let replacements = elements
            .iter()
            .map(|&element| self.bisect(element))
            .collect();
        let pass = RefinementPass { replacements };
        tracing::debug!(
            "Refined {} elements into {} children",
            elements.len(),
            pass.number_of_new_simplices()
        );
        Ok(pass)
    }

    fn bisect(&mut self, element: usize) -> Replacement {
        let (first, second) = self.element(element).longest_edge();
        let connectivity = *self.element_connectivity(element);
        let midpoint = self.edge_midpoint(connectivity.0[first], connectivity.0[second]);

        let children = vec![
            self.push_element(connectivity.with_vertex(second, midpoint), Some(element)),
            self.push_element(connectivity.with_vertex(first, midpoint), Some(element)),
        ];
        self.lineage[element].children = children.clone();
        Replacement {
            parent: element,
            children,
        }
    }

    fn edge_midpoint(&mut self, a: usize, b: usize) -> usize {
        let key = if a < b { [a, b] } else { [b, a] };
        if let Some(&vertex) = self.edge_midpoints.get(&key) {
            return vertex;
        }
        let midpoint = Point3::from(
            (self.vertices()[a].coords + self.vertices()[b].coords)
                / nalgebra::convert::<f64, T>(2.0),
        );
        let vertex = self.push_vertex(midpoint);
        self.edge_midpoints.insert(key, vertex);
        vertex
    }
}

#[cfg(test)]
mod test {
    use crate::{create_unit_cube_mesh_3d, GridManager, Mesh3d, MeshError, Tetrahedron};
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    fn single_tetrahedron() -> Mesh3d<f64> {
        let reference: Tetrahedron<f64> = Tetrahedron::reference();
        Mesh3d::from_vertices_and_connectivity(
            reference.vertices().to_vec(),
            vec![crate::TetrahedronConnectivity([0, 1, 2, 3])],
        )
    }

    #[test]
    fn bisection_retires_parent_and_appends_two_children() {
        let mut mesh = single_tetrahedron();
        let pass = mesh.refine(&[0]).unwrap();
        assert_eq!(pass.refined(), vec![0]);
        assert_eq!(pass.replacements()[0].children, vec![1, 2]);
        assert!(!mesh.is_active(0));
        assert!(mesh.is_active(1) && mesh.is_active(2));
        assert_eq!(mesh.children_of(0), &[1, 2]);
        assert_eq!(mesh.parent(2), Some(0));
        assert_eq!(mesh.number_of_simplices(), 3);
    }

    #[test]
    fn children_volumes_sum_to_parent_volume() {
        let mut mesh: Mesh3d<f64> = create_unit_cube_mesh_3d(2);
        let targets: Vec<usize> = (0..mesh.num_elements()).step_by(3).collect();
        mesh.refine(&targets).unwrap();
        for &parent in targets.iter() {
            let children_volume: f64 = mesh
                .children(parent)
                .iter()
                .map(|&child| mesh.element(child).volume())
                .sum();
            assert_relative_eq!(children_volume, mesh.element(parent).volume(), epsilon = 1e-12);
        }
        assert_relative_eq!(mesh.active_volume(), 1., epsilon = 1e-12);
    }

    #[test]
    fn children_cover_the_parent() {
        let mut mesh = single_tetrahedron();
        mesh.refine(&[0]).unwrap();
        let point = Point3::new(0.1, 0.2, 0.3);
        assert!(mesh.contains_point(1, &point) || mesh.contains_point(2, &point));
    }

    #[test]
    fn shared_edges_share_midpoints() {
        // The six Kuhn tetrahedra of a single cell all bisect the cube diagonal
        let mut mesh: Mesh3d<f64> = create_unit_cube_mesh_3d(1);
        let vertices_before = mesh.num_nodes();
        mesh.refine(&[0, 1, 2, 3, 4, 5]).unwrap();
        assert_eq!(mesh.num_nodes(), vertices_before + 1);
        assert_eq!(mesh.number_of_active_elements(), 12);
    }

    #[test]
    fn cloned_meshes_refine_independently() {
        let original: Mesh3d<f64> = create_unit_cube_mesh_3d(1);
        let mut refined = original.clone();
        refined.refine(&[0, 3]).unwrap();
        assert_eq!(original.num_elements(), 6);
        assert!(original.is_active(0) && original.children(0).is_empty());
        assert_eq!(refined.num_elements(), 10);
        assert!(!refined.is_active(0));
    }

    #[test]
    fn invalid_requests_leave_the_mesh_untouched() {
        let mut mesh = single_tetrahedron();
        assert!(matches!(
            mesh.refine(&[3]),
            Err(MeshError::UnknownElement { element: 3, .. })
        ));
        assert!(matches!(
            mesh.refine(&[0, 0]),
            Err(MeshError::DuplicateElement(0))
        ));
        assert_eq!(mesh.num_elements(), 1);
        mesh.refine(&[0]).unwrap();
        assert!(matches!(mesh.refine(&[0]), Err(MeshError::AlreadyRefined(0))));
    }
}
