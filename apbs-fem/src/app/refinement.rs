//! Adaptive refinement driven by charge density
//!
//! The structure is enclosed in a padded box mesh and the charges are mapped once. Each
//! pass then bisects every simplex holding more charges than allowed and hands the
//! refined simplices to the map, which moves only their charges.

use super::{Configuration, FemError, MeshConfiguration, RefinementConfiguration};
use crate::{
    atoms::{AtomList, AtomicStructure},
    csm::{ChargeSimplexMap, ChargeSimplexMapBuilder, MapStatistics, UpdateReport},
};
use apbs_mesher::{create_box_mesh_3d, Mesh3d};
use nalgebra::RealField;
use num_traits::ToPrimitive;

/// The refined map at the end of a run
#[derive(Debug)]
pub(crate) struct Outcome {
    pub(crate) updates: Vec<UpdateReport>,
    pub(crate) statistics: MapStatistics,
}

/// Encloses the structure in a box mesh, padded on every side
pub(crate) fn build_mesh<T>(
    config: &MeshConfiguration<T>,
    atoms: &AtomicStructure<T>,
) -> Result<Mesh3d<T>, FemError>
where
    T: Copy + RealField,
{
    let bounds = atoms
        .bounding_box()
        .ok_or(FemError::EmptyStructure)?
        .padded(config.padding);
    Ok(create_box_mesh_3d(&bounds, config.cells_per_dim)?)
}

#[tracing::instrument(name = "Charge mapping", level = "info", skip_all)]
pub(crate) fn map_charges<T>(
    config: &Configuration<T>,
    atoms: &AtomicStructure<T>,
) -> Result<Outcome, FemError>
where
    T: Copy + RealField + ToPrimitive + Send + Sync,
{
    let mut mesh = build_mesh(&config.mesh, atoms)?;
    tracing::info!("Initial mesh has {} simplices", mesh.num_elements());

    let mut map = ChargeSimplexMapBuilder::new()
        .with_atoms(atoms)
        .with_grid(&mesh)
        .with_settings(config.map.clone())
        .build()?;
    let report = map.build(&mesh);
    tracing::info!(
        "Built the map with {} charges associated and {} outside the mesh",
        report.associated,
        report.unassociated
    );

    let updates = refine_overloaded_simplices(&mut mesh, &mut map, &config.refinement)?;
    let statistics = map.statistics();
    tracing::debug!(
        "Total charge by simplex sums to {}",
        map.simplex_charges()
            .into_iter()
            .fold(T::zero(), |total, charge| total + charge)
    );
    Ok(Outcome {
        updates,
        statistics,
    })
}

/// Bisects every simplex holding more than the allowed number of charges and updates the
/// map, until no simplex is overloaded or the pass limit is reached
pub(crate) fn refine_overloaded_simplices<T, Atoms>(
    mesh: &mut Mesh3d<T>,
    map: &mut ChargeSimplexMap<'_, T, Atoms>,
    settings: &RefinementConfiguration,
) -> Result<Vec<UpdateReport>, FemError>
where
    T: Copy + RealField,
    Atoms: AtomList<T>,
{
    let mut updates = Vec::new();
    for iteration in 0..settings.maximum_passes {
        let overloaded: Vec<usize> = mesh
            .active_elements()
            .filter(|&simplex| map.charge_count(simplex) > settings.maximum_charges_per_simplex)
            .collect();
        if overloaded.is_empty() {
            tracing::info!("No overloaded simplices remain after {iteration} passes");
            break;
        }
        let pass = mesh.refine(&overloaded)?;
        let report = map.update(&*mesh, &pass.refined())?;
        tracing::info!(
            "Pass {}: refined {} simplices into {}, {} active",
            iteration + 1,
            report.refined,
            pass.number_of_new_simplices(),
            mesh.number_of_active_elements()
        );
        updates.push(report);
    }
    Ok(updates)
}

#[cfg(test)]
mod test {
    use super::{build_mesh, map_charges, refine_overloaded_simplices};
    use crate::{
        app::{Configuration, FemError, MeshConfiguration, RefinementConfiguration},
        atoms::{Atom, AtomicStructure},
        csm::{ChargeSimplexMap, MapSettings},
    };
    use apbs_mesher::{create_unit_cube_mesh_3d, Mesh3d};
    use nalgebra::Point3;
    use rand::Rng;

    fn random_structure(number: usize) -> AtomicStructure<f64> {
        let mut rng = rand::thread_rng();
        AtomicStructure::from_atoms(
            (0..number)
                .map(|_| {
                    let position = Point3::new(
                        rng.gen_range(0.0..1.0),
                        rng.gen_range(0.0..1.0),
                        rng.gen_range(0.0..1.0),
                    );
                    Atom::new(position, rng.gen_range(-1.0..1.0))
                })
                .collect(),
        )
    }

    #[test]
    fn padded_mesh_encloses_every_atom() {
        let atoms = random_structure(50);
        let config = MeshConfiguration {
            padding: 0.5,
            cells_per_dim: 2,
        };
        let mesh = build_mesh(&config, &atoms).unwrap();
        assert_eq!(mesh.num_elements(), 48);
        let bounds = atoms.bounding_box().unwrap();
        let expected = (bounds.extent() + nalgebra::Vector3::repeat(1.0)).product();
        approx::assert_relative_eq!(mesh.active_volume(), expected, epsilon = 1e-10);
    }

    #[test]
    fn empty_structures_cannot_be_meshed() {
        let atoms: AtomicStructure<f64> = AtomicStructure::from_atoms(Vec::new());
        let config = MeshConfiguration {
            padding: 1.0,
            cells_per_dim: 2,
        };
        assert!(matches!(
            build_mesh(&config, &atoms),
            Err(FemError::EmptyStructure)
        ));
    }

    #[test]
    fn refinement_stops_once_no_simplex_is_overloaded() {
        let atoms = random_structure(60);
        let mut mesh: Mesh3d<f64> = create_unit_cube_mesh_3d(1);
        let mut map = ChargeSimplexMap::construct(&atoms, &mesh, MapSettings::default()).unwrap();
        map.build(&mesh);
        let settings = RefinementConfiguration {
            maximum_passes: 40,
            maximum_charges_per_simplex: 5,
        };

        let updates = refine_overloaded_simplices(&mut mesh, &mut map, &settings).unwrap();
        assert!(!updates.is_empty());
        assert!(updates.len() < settings.maximum_passes);
        assert!(mesh.active_elements().all(|simplex| map.charge_count(simplex) <= 5));
        assert_eq!(map.statistics().associated, 60);
        assert_eq!(
            updates.iter().map(|update| update.unassociated).sum::<usize>(),
            0
        );
    }

    #[test]
    fn refinement_respects_the_pass_limit() {
        // Coincident charges can never be separated
        let atoms = AtomicStructure::from_atoms(vec![
            Atom::new(Point3::new(0.3, 0.4, 0.2), 1.0),
            Atom::new(Point3::new(0.3, 0.4, 0.2), 1.0),
        ]);
        let mut mesh: Mesh3d<f64> = create_unit_cube_mesh_3d(1);
        let mut map = ChargeSimplexMap::construct(&atoms, &mesh, MapSettings::default()).unwrap();
        map.build(&mesh);
        let settings = RefinementConfiguration {
            maximum_passes: 3,
            maximum_charges_per_simplex: 1,
        };

        let updates = refine_overloaded_simplices(&mut mesh, &mut map, &settings).unwrap();
        assert_eq!(updates.len(), 3);
        assert!(updates.iter().all(|update| update.refined == 1));
        assert_eq!(map.statistics().longest_chain, 2);
    }

    #[test]
    fn charges_are_mapped_end_to_end() {
        let atoms = random_structure(200);
        let config = Configuration {
            mesh: MeshConfiguration {
                padding: 0.25,
                cells_per_dim: 2,
            },
            refinement: RefinementConfiguration {
                maximum_passes: 6,
                maximum_charges_per_simplex: 10,
            },
            map: MapSettings::default(),
        };
        let outcome = map_charges(&config, &atoms).unwrap();
        assert_eq!(outcome.statistics.associated, 200);
        assert_eq!(outcome.statistics.unassociated, 0);
        assert!(outcome.updates.len() <= 6);
        assert_eq!(outcome.statistics.pool_in_use, 200);
    }
}
