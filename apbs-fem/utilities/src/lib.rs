//! Fixtures shared by the benchmarks: random atom clouds and refined box meshes

use apbs_fem::atoms::{Atom, AtomicStructure};
use apbs_mesher::{create_unit_cube_mesh_3d, Mesh3d};
use nalgebra::{Point3, Vector3};
use rand::{thread_rng, Rng};

/// `number` unit-magnitude charges of random sign, uniformly placed in the unit cube
pub fn construct_random_structure(number: usize) -> AtomicStructure<f64> {
    let mut rng = thread_rng();
    AtomicStructure::from_atoms(
        (0..number)
            .map(|_| {
                let position = Point3::new(rng.gen(), rng.gen(), rng.gen());
                let charge = if rng.gen::<bool>() { 1.0 } else { -1.0 };
                Atom::new(position, charge)
            })
            .collect(),
    )
}

/// Charges gathered in tight clusters around `number_of_clusters` random centres, which
/// loads a few simplices heavily in the way a molecule loads a solvent box mesh
pub fn construct_clustered_structure(
    number_of_clusters: usize,
    atoms_per_cluster: usize,
) -> AtomicStructure<f64> {
    let mut rng = thread_rng();
    let mut atoms = Vec::with_capacity(number_of_clusters * atoms_per_cluster);
    for _ in 0..number_of_clusters {
        let centre = Point3::new(
            rng.gen_range(0.2..0.8),
            rng.gen_range(0.2..0.8),
            rng.gen_range(0.2..0.8),
        );
        for _ in 0..atoms_per_cluster {
            let offset = Vector3::new(
                rng.gen_range(-0.05..0.05),
                rng.gen_range(-0.05..0.05),
                rng.gen_range(-0.05..0.05),
            );
            atoms.push(Atom::new(centre + offset, rng.gen_range(-1.0..1.0)));
        }
    }
    AtomicStructure::from_atoms(atoms)
}

/// A unit cube mesh with every `stride`th active simplex bisected, `passes` times over
pub fn construct_refined_mesh(cells_per_dim: usize, stride: usize, passes: usize) -> Mesh3d<f64> {
    let mut mesh = create_unit_cube_mesh_3d(cells_per_dim);
    for _ in 0..passes {
        let targets: Vec<usize> = mesh.active_elements().step_by(stride.max(1)).collect();
        mesh.refine(&targets).expect("active simplices can always be refined");
    }
    mesh
}
