use crate::connectivity::TetrahedronConnectivity;
use crate::mesh::Mesh3d;
use crate::{BoundingBox, MeshError};
use nalgebra::{Point3, RealField, Vector3};

/// The six axis orderings of the Kuhn subdivision of a cube. Each ordering walks from the
/// lowest corner to the highest one, one axis at a time, and the corners visited form a
/// tetrahedron. All six share the main diagonal of the cube.
const KUHN_PATHS: [[usize; 3]; 6] = [
    [0, 1, 2],
    [0, 2, 1],
    [1, 0, 2],
    [1, 2, 0],
    [2, 0, 1],
    [2, 1, 0],
];

pub fn create_unit_cube_mesh_3d<T>(cells_per_dim: usize) -> Mesh3d<T>
where
    T: Copy + RealField,
{
    let bounds = BoundingBox::new(Point3::origin(), Point3::new(T::one(), T::one(), T::one()));
    create_box_mesh_3d(&bounds, cells_per_dim).unwrap_or_else(|_| {
        Mesh3d::from_vertices_and_connectivity(Vec::new(), Vec::new())
    })
}

/// Fills `bounds` with `cells_per_dim`^3 cubes, each split into six tetrahedra
pub fn create_box_mesh_3d<T>(
    bounds: &BoundingBox<T>,
    cells_per_dim: usize,
) -> Result<Mesh3d<T>, MeshError>
where
    T: Copy + RealField,
{
    let extent = bounds.extent();
    if extent.iter().any(|&length| length <= T::zero()) {
        return Err(MeshError::InvalidExtent(format!(
            "the mesh bounds must have positive extent along every axis, found {:?}",
            extent
        )));
    }
    if cells_per_dim == 0 {
        return Ok(Mesh3d::from_vertices_and_connectivity(Vec::new(), Vec::new()));
    }

    let num_vertices_per_dim = cells_per_dim + 1;
    let cell_size = extent / nalgebra::convert::<f64, T>(cells_per_dim as f64);
    let to_global_vertex_index =
        |i: usize, j: usize, k: usize| i + num_vertices_per_dim * (j + num_vertices_per_dim * k);

    let mut vertices = Vec::with_capacity(num_vertices_per_dim.pow(3));
    for k in 0..num_vertices_per_dim {
        for j in 0..num_vertices_per_dim {
            for i in 0..num_vertices_per_dim {
                let steps = Vector3::new(i, j, k).map(|n| nalgebra::convert::<f64, T>(n as f64));
                vertices.push(bounds.lower + steps.component_mul(&cell_size));
            }
        }
    }

    let mut cells = Vec::with_capacity(6 * cells_per_dim.pow(3));
    for k in 0..cells_per_dim {
        for j in 0..cells_per_dim {
            for i in 0..cells_per_dim {
                for path in KUHN_PATHS.iter() {
                    let mut corner = [i, j, k];
                    let mut indices = [to_global_vertex_index(i, j, k); 4];
                    for (slot, &axis) in path.iter().enumerate() {
                        corner[axis] += 1;
                        indices[slot + 1] = to_global_vertex_index(corner[0], corner[1], corner[2]);
                    }
                    cells.push(TetrahedronConnectivity(indices));
                }
            }
        }
    }

    tracing::debug!(
        "Generated box mesh with {} vertices and {} elements",
        vertices.len(),
        cells.len()
    );
    Ok(Mesh3d::from_vertices_and_connectivity(vertices, cells))
}

#[cfg(test)]
mod test {
    use super::{create_box_mesh_3d, create_unit_cube_mesh_3d};
    use crate::{BoundingBox, ElementMethods, GridManager, Mesh3d};
    use approx::assert_relative_eq;
    use nalgebra::Point3;
    use rand::Rng;

    #[test]
    fn unit_cube_is_filled_by_six_tetrahedra_per_cell() {
        let mesh: Mesh3d<f64> = create_unit_cube_mesh_3d(3);
        assert_eq!(mesh.num_elements(), 6 * 27);
        assert_eq!(mesh.num_nodes(), 64);
        assert_relative_eq!(mesh.active_volume(), 1., epsilon = 1e-12);
    }

    #[test]
    fn no_element_is_degenerate() {
        let mesh: Mesh3d<f64> = create_unit_cube_mesh_3d(2);
        for element in mesh.active_elements() {
            let tetrahedron = mesh.element(element);
            assert_relative_eq!(tetrahedron.volume(), 1. / 48., epsilon = 1e-12);
            let mut indices = tetrahedron.vertex_indices().to_vec();
            indices.sort_unstable();
            indices.dedup();
            assert_eq!(indices.len(), 4);
            assert!(indices.iter().all(|&index| index < mesh.num_nodes()));
        }
    }

    #[test]
    fn every_interior_point_is_located() {
        let mut rng = rand::thread_rng();
        let bounds = BoundingBox::new(Point3::new(-2., 0., 1.), Point3::new(2., 3., 2.));
        let mesh = create_box_mesh_3d(&bounds, 4).unwrap();
        for _ in 0..100 {
            let point = Point3::new(
                rng.gen_range(-2.0..2.0),
                rng.gen_range(0.0..3.0),
                rng.gen_range(1.0..2.0),
            );
            assert!((0..mesh.number_of_simplices()).any(|s| mesh.contains_point(s, &point)));
        }
    }

    #[test]
    fn zero_extent_is_rejected() {
        let bounds = BoundingBox::new(Point3::new(0., 0., 0.), Point3::new(1., 0., 1.));
        assert!(create_box_mesh_3d::<f64>(&bounds, 2).is_err());
    }
}
