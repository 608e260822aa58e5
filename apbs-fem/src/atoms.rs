//! # Atoms
//!
//! The point charges placed into the finite element mesh. The charge-simplex map only
//! reads an atom list through [`AtomList`], so any molecular representation can be used
//! without conversion; [`AtomicStructure`] is the owned representation read from disk.

use apbs_mesher::BoundingBox;
use color_eyre::eyre::eyre;
use config::{Config, File};
use nalgebra::{Point3, RealField};
use serde::{de::DeserializeOwned, Deserialize};
use std::{ops::Deref, path::PathBuf};

/// Read access to an ordered, immutable collection of point charges
pub trait AtomList<T: RealField> {
    /// The record handed back to callers resolving a charge through the map
    type Atom;
    /// The length of the list
    fn number_of_atoms(&self) -> usize;
    /// The record at `index`
    fn atom(&self, index: usize) -> &Self::Atom;
    /// The centre of the atom at `index`
    fn position(&self, index: usize) -> Point3<T>;
    /// The charge carried by the atom at `index`
    fn charge(&self, index: usize) -> T;
}

/// A point charge
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Atom<T: RealField> {
    /// The atom centre
    pub position: Point3<T>,
    /// The partial charge in units of the elementary charge
    pub charge: T,
    /// The atomic radius, absent for atoms read without one
    pub radius: Option<T>,
}

impl<T: Copy + RealField> Atom<T> {
    /// An atom without a radius
    pub fn new(position: Point3<T>, charge: T) -> Self {
        Self {
            position,
            charge,
            radius: None,
        }
    }
}

/// An owned list of atoms, deserialized from a `.toml` structure file of the form
///
/// ```toml
/// [[atoms]]
/// position = [0.0, 1.2, -0.4]
/// charge = -0.834
/// radius = 1.52
/// ```
#[derive(Clone, Debug, Deserialize)]
pub struct AtomicStructure<T: RealField> {
    atoms: Vec<Atom<T>>,
}

impl<T: RealField> Deref for AtomicStructure<T> {
    type Target = [Atom<T>];

    fn deref(&self) -> &Self::Target {
        &self.atoms
    }
}

impl<T: Copy + RealField> AtomicStructure<T> {
    /// Wraps an already assembled list
    pub fn from_atoms(atoms: Vec<Atom<T>>) -> Self {
        Self { atoms }
    }

    /// The smallest box containing every atom centre, `None` for an empty structure
    pub fn bounding_box(&self) -> Option<BoundingBox<T>> {
        BoundingBox::from_points(self.atoms.iter().map(|atom| &atom.position))
    }

    /// The sum of all charges in the structure
    pub fn net_charge(&self) -> T {
        self.atoms
            .iter()
            .fold(T::zero(), |total, atom| total + atom.charge)
    }
}

impl<T: Copy + RealField + DeserializeOwned> AtomicStructure<T> {
    /// Reads a structure file, the format is taken from the extension
    pub fn build(path: PathBuf) -> color_eyre::Result<Self> {
        let s = Config::builder().add_source(File::from(path)).build()?;
        s.try_deserialize()
            .map_err(|e| eyre!("Failed to deserialize atomic structure: {:?}", e))
    }
}

impl<T: Copy + RealField> AtomList<T> for AtomicStructure<T> {
    type Atom = Atom<T>;

    fn number_of_atoms(&self) -> usize {
        self.atoms.len()
    }
    fn atom(&self, index: usize) -> &Atom<T> {
        &self.atoms[index]
    }
    fn position(&self, index: usize) -> Point3<T> {
        self.atoms[index].position
    }
    fn charge(&self, index: usize) -> T {
        self.atoms[index].charge
    }
}

impl<T: Copy + RealField> AtomList<T> for Vec<Atom<T>> {
    type Atom = Atom<T>;

    fn number_of_atoms(&self) -> usize {
        self.len()
    }
    fn atom(&self, index: usize) -> &Atom<T> {
        &self[index]
    }
    fn position(&self, index: usize) -> Point3<T> {
        self[index].position
    }
    fn charge(&self, index: usize) -> T {
        self[index].charge
    }
}

#[cfg(test)]
mod test {
    use super::{Atom, AtomList, AtomicStructure};
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    #[test]
    fn structure_is_deserialized_from_toml() {
        let directory = std::env::temp_dir().join("apbs-fem-atoms-test");
        std::fs::create_dir_all(&directory).unwrap();
        let path = directory.join("water.toml");
        std::fs::write(
            &path,
            r#"
            [[atoms]]
            position = [0.0, 0.0, 0.0]
            charge = -0.834
            radius = 1.52

            [[atoms]]
            position = [0.9572, 0.0, 0.0]
            charge = 0.417

            [[atoms]]
            position = [-0.2400, 0.9266, 0.0]
            charge = 0.417
            "#,
        )
        .unwrap();

        let structure: AtomicStructure<f64> = AtomicStructure::build(path).unwrap();
        assert_eq!(structure.number_of_atoms(), 3);
        assert_eq!(structure[0].radius, Some(1.52));
        assert_eq!(structure[1].radius, None);
        assert_eq!(structure.position(2), Point3::new(-0.24, 0.9266, 0.));
        assert_relative_eq!(structure.net_charge(), 0., epsilon = 1e-12);
    }

    #[test]
    fn bounding_box_spans_all_atoms() {
        let structure = AtomicStructure::from_atoms(vec![
            Atom::new(Point3::new(1., -1., 0.), 1.),
            Atom::new(Point3::new(-2., 3., 0.5), -1.),
        ]);
        let bounds = structure.bounding_box().unwrap();
        assert_eq!(bounds.lower, Point3::new(-2., -1., 0.));
        assert_eq!(bounds.upper, Point3::new(1., 3., 0.5));
        assert!(AtomicStructure::<f64>::from_atoms(Vec::new())
            .bounding_box()
            .is_none());
    }
}
