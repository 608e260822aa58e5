use super::{
    chain::ChainIter,
    locate::{LocatorKind, PointLocator},
    pool::{LinkPool, NodeIndex, DEFAULT_BLOCK_SIZE},
    statistics::{BuildReport, MapStatistics, UpdateReport},
};
use crate::{atoms::AtomList, error::CsmError};
use apbs_mesher::GridManager;
use nalgebra::RealField;
use num_traits::ToPrimitive;
use rayon::prelude::*;
use serde::Deserialize;
use std::{collections::HashSet, marker::PhantomData};

/// The smallest number of simplex slots a map allocates
const MINIMUM_CAPACITY: usize = 16;

/// Tunables for a `ChargeSimplexMap`, deserialized from the `map` configuration table
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct MapSettings {
    /// Number of link nodes allocated whenever the pool runs dry
    #[serde(default = "default_block_size")]
    pub pool_block_size: usize,
    /// Point location strategy used by full builds
    #[serde(default)]
    pub locator: LocatorKind,
    /// Resolution of the bucketed locator, chosen from the mesh size when absent
    #[serde(default)]
    pub buckets_per_axis: Option<usize>,
}

fn default_block_size() -> usize {
    DEFAULT_BLOCK_SIZE
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            pool_block_size: DEFAULT_BLOCK_SIZE,
            locator: LocatorKind::default(),
            buckets_per_axis: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SlotStatus {
    /// Never populated by a build or update
    Vacant,
    /// Populated, the chain holds the charges inside the simplex (possibly none)
    Live,
    /// Refined away, the chain is empty and the slot is never reused
    Retired,
}

#[derive(Clone, Copy, Debug)]
struct SimplexSlot {
    head: Option<NodeIndex>,
    length: usize,
    status: SlotStatus,
}

impl SimplexSlot {
    const VACANT: Self = Self {
        head: None,
        length: 0,
        status: SlotStatus::Vacant,
    };
}

/// The map from simplices of a finite element mesh to the charges they contain
///
/// The map borrows its atom list for its whole lifetime. The grid manager is passed to
/// each `build` and `update` instead, so the caller is free to refine it in between. Both
/// mutating operations take `&mut self` and complete before returning, while the read
/// accessors take `&self`, so any number of readers may query the map between mutations.
///
/// The map keeps no reference to the grid manager, so there is no grid accessor to mirror
/// [`ChargeSimplexMap::atoms`]. A held grid reference would freeze the mesh for the map's
/// lifetime and rule out refining it between updates.
pub struct ChargeSimplexMap<'a, T, Atoms>
where
    T: RealField,
    Atoms: AtomList<T>,
{
    atoms: &'a Atoms,
    pool: LinkPool,
    /// One slot per simplex id, its length is the capacity of the map
    simplex_heads: Vec<SimplexSlot>,
    active_simplex_count: usize,
    initialized: bool,
    settings: MapSettings,
    marker: PhantomData<T>,
}

/// Builder for a `ChargeSimplexMap` from an atom list and a grid manager
pub struct ChargeSimplexMapBuilder<T, RefAtoms, RefGrid> {
    atoms: RefAtoms,
    grid: RefGrid,
    settings: MapSettings,
    marker: PhantomData<T>,
}

impl<T> Default for ChargeSimplexMapBuilder<T, (), ()> {
    fn default() -> Self {
        Self {
            atoms: (),
            grid: (),
            settings: MapSettings::default(),
            marker: PhantomData,
        }
    }
}

impl<T> ChargeSimplexMapBuilder<T, (), ()> {
    /// An empty builder carrying the default `MapSettings`
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T, RefAtoms, RefGrid> ChargeSimplexMapBuilder<T, RefAtoms, RefGrid> {
    /// Attach the atom list
    pub fn with_atoms<Atoms>(self, atoms: &Atoms) -> ChargeSimplexMapBuilder<T, &Atoms, RefGrid> {
        ChargeSimplexMapBuilder {
            atoms,
            grid: self.grid,
            settings: self.settings,
            marker: PhantomData,
        }
    }

    /// Attach the grid manager the map is sized from
    pub fn with_grid<Grid>(self, grid: &Grid) -> ChargeSimplexMapBuilder<T, RefAtoms, &Grid> {
        ChargeSimplexMapBuilder {
            atoms: self.atoms,
            grid,
            settings: self.settings,
            marker: PhantomData,
        }
    }

    /// Replace the default settings
    pub fn with_settings(self, settings: MapSettings) -> Self {
        Self { settings, ..self }
    }
}

impl<'a, T, Atoms, Grid> ChargeSimplexMapBuilder<T, &'a Atoms, &Grid>
where
    T: Copy + RealField,
    Atoms: AtomList<T>,
    Grid: GridManager<T>,
{
    /// Construct the (unpopulated) map, call `ChargeSimplexMap::build` to fill it
    pub fn build(self) -> Result<ChargeSimplexMap<'a, T, Atoms>, CsmError> {
        ChargeSimplexMap::construct(self.atoms, self.grid, self.settings)
    }
}

impl<'a, T, Atoms> ChargeSimplexMap<'a, T, Atoms>
where
    T: Copy + RealField,
    Atoms: AtomList<T>,
{
    /// Allocates a cleared slot for every simplex of `grid`, plus slack for refinement
    pub fn construct<Grid: GridManager<T>>(
        atoms: &'a Atoms,
        grid: &Grid,
        settings: MapSettings,
    ) -> Result<Self, CsmError> {
        let number_of_simplices = grid.number_of_simplices();
        if number_of_simplices == 0 {
            return Err(CsmError::Construction(
                "the grid manager holds no simplices".into(),
            ));
        }
        let capacity = (number_of_simplices + number_of_simplices / 2).max(MINIMUM_CAPACITY);
        tracing::debug!(
            "Constructing charge-simplex map for {} atoms with {} slots",
            atoms.number_of_atoms(),
            capacity
        );
        Ok(Self {
            atoms,
            pool: LinkPool::with_block_size(settings.pool_block_size),
            simplex_heads: vec![SimplexSlot::VACANT; capacity],
            active_simplex_count: number_of_simplices,
            initialized: false,
            settings,
            marker: PhantomData,
        })
    }

    /// Returns every node to the pool and clears every slot, leaving the map unbuilt
    pub fn release(&mut self) {
        self.pool.release_all();
        self.simplex_heads.fill(SimplexSlot::VACANT);
        self.initialized = false;
    }

    /// Grows the slot array by doubling until it holds `required` slots
    fn ensure_capacity(&mut self, required: usize) {
        if required <= self.simplex_heads.len() {
            return;
        }
        let mut capacity = self.simplex_heads.len().max(MINIMUM_CAPACITY);
        while capacity < required {
            capacity *= 2;
        }
        tracing::debug!(
            "Growing simplex slots from {} to {}",
            self.simplex_heads.len(),
            capacity
        );
        self.simplex_heads.resize(capacity, SimplexSlot::VACANT);
    }

    /// Advances the active count to `count`, clearing the newly exposed slots
    fn expose_slots(&mut self, count: usize) {
        self.ensure_capacity(count);
        if count > self.active_simplex_count {
            self.simplex_heads[self.active_simplex_count..count].fill(SimplexSlot::VACANT);
        }
        self.active_simplex_count = count;
    }

    fn push(&mut self, simplex: usize, charge: usize) {
        let slot = &mut self.simplex_heads[simplex];
        self.pool.push_front(&mut slot.head, charge);
        slot.length += 1;
    }

    fn splice(&mut self, simplex: usize, node: NodeIndex) {
        let slot = &mut self.simplex_heads[simplex];
        self.pool.splice_front(&mut slot.head, node);
        slot.length += 1;
    }

    /// Retires `simplex` and hands back the head of its former chain
    fn retire(&mut self, simplex: usize) -> Option<NodeIndex> {
        let slot = &mut self.simplex_heads[simplex];
        slot.length = 0;
        slot.status = SlotStatus::Retired;
        slot.head.take()
    }
}

impl<'a, T, Atoms> ChargeSimplexMap<'a, T, Atoms>
where
    T: Copy + RealField + ToPrimitive,
    Atoms: AtomList<T>,
{
    /// Places every charge into the active simplex containing it
    ///
    /// Any previous content is released first. Charges outside every active simplex are
    /// counted in the report and left out of the map. On shared faces the lowest simplex id
    /// wins.
    #[tracing::instrument(
        name = "Charge-simplex map build",
        level = "info",
        skip_all,
        fields(atoms = self.atoms.number_of_atoms(), simplices = grid.number_of_simplices())
    )]
    pub fn build<Grid: GridManager<T>>(&mut self, grid: &Grid) -> BuildReport {
        self.release();
        let number_of_simplices = grid.number_of_simplices();
        self.expose_slots(number_of_simplices);
        for (simplex, slot) in self.simplex_heads[..number_of_simplices]
            .iter_mut()
            .enumerate()
        {
            slot.status = if grid.is_active(simplex) {
                SlotStatus::Live
            } else {
                SlotStatus::Retired
            };
        }

        let locator =
            PointLocator::new(self.settings.locator, grid, self.settings.buckets_per_axis);
        let mut report = BuildReport::default();
        for charge in 0..self.atoms.number_of_atoms() {
            let position = self.atoms.position(charge);
            match locator.locate(grid, &position) {
                Some(simplex) => {
                    self.push(simplex, charge);
                    report.associated += 1;
                }
                None => {
                    tracing::trace!("Charge {charge} at {:?} lies outside the mesh", position);
                    report.unassociated += 1;
                }
            }
        }
        if report.unassociated > 0 {
            tracing::warn!(
                "{} of {} charges lie outside the mesh and were not mapped",
                report.unassociated,
                self.atoms.number_of_atoms()
            );
        }
        self.initialized = true;
        tracing::info!("Mapped {} charges", report.associated);
        report
    }
}

impl<'a, T, Atoms> ChargeSimplexMap<'a, T, Atoms>
where
    T: Copy + RealField,
    Atoms: AtomList<T>,
{
    /// Redistributes the charges of refined simplices among their children
    ///
    /// Each charge is first sought among the children of the simplex that held it, then
    /// among the children of every simplex in `changed`, in batch order. Charges found in
    /// neither are dropped from the map and counted as unassociated. No other chain is
    /// touched. The batch is validated against the grid before anything is modified, so a
    /// failed update leaves the map as it was.
    #[tracing::instrument(
        name = "Charge-simplex map update",
        level = "info",
        skip_all,
        fields(refined = changed.len())
    )]
    pub fn update<Grid: GridManager<T>>(
        &mut self,
        grid: &Grid,
        changed: &[usize],
    ) -> Result<UpdateReport, CsmError> {
        if changed.is_empty() {
            return Ok(UpdateReport::default());
        }
        self.validate_refinement(grid, changed)?;

        self.expose_slots(grid.number_of_simplices());
        for &parent in changed {
            for &child in grid.children_of(parent) {
                self.simplex_heads[child].status = SlotStatus::Live;
            }
        }

        let mut report = UpdateReport {
            refined: changed.len(),
            ..UpdateReport::default()
        };
        let mut stranded = Vec::new();
        for &parent in changed {
            let children = grid.children_of(parent);
            let mut cursor = self.retire(parent);
            while let Some(node) = cursor {
                let charge = self.pool.node(node).charge_index;
                cursor = self.pool.node(node).next;
                let position = self.atoms.position(charge);
                match children
                    .iter()
                    .copied()
                    .find(|&child| grid.contains_point(child, &position))
                {
                    Some(child) => {
                        self.splice(child, node);
                        report.relocated += 1;
                    }
                    None => stranded.push(node),
                }
            }
        }

        if !stranded.is_empty() {
            let batch_children: Vec<usize> = changed
                .iter()
                .flat_map(|&parent| grid.children_of(parent).iter().copied())
                .collect();
            for node in stranded {
                let charge = self.pool.node(node).charge_index;
                let position = self.atoms.position(charge);
                match batch_children
                    .iter()
                    .copied()
                    .find(|&child| grid.contains_point(child, &position))
                {
                    Some(child) => {
                        tracing::debug!("Charge {charge} recovered in simplex {child}");
                        self.splice(child, node);
                        report.recovered_at_seams += 1;
                    }
                    None => {
                        tracing::warn!(
                            "Charge {charge} lies in no child of the refined simplices and was unmapped"
                        );
                        self.pool.release(node);
                        report.unassociated += 1;
                    }
                }
            }
        }

        tracing::info!(
            "Relocated {} charges from {} refined simplices",
            report.relocated + report.recovered_at_seams,
            report.refined
        );
        Ok(report)
    }

    fn validate_refinement<Grid: GridManager<T>>(
        &self,
        grid: &Grid,
        changed: &[usize],
    ) -> Result<(), CsmError> {
        let inconsistent = |simplex, reason| CsmError::InconsistentTopology { simplex, reason };
        if !self.initialized {
            return Err(inconsistent(changed[0], "the map has not been built"));
        }
        let number_of_simplices = grid.number_of_simplices();
        if number_of_simplices < self.active_simplex_count {
            return Err(inconsistent(
                number_of_simplices,
                "the grid manager holds fewer simplices than the map was built against",
            ));
        }

        let mut parents = HashSet::with_capacity(changed.len());
        let mut children = HashSet::new();
        for &parent in changed {
            if parent >= self.active_simplex_count {
                return Err(inconsistent(parent, "the simplex was never built by this map"));
            }
            match self.simplex_heads[parent].status {
                SlotStatus::Vacant => {
                    return Err(inconsistent(parent, "the simplex was never built by this map"))
                }
                SlotStatus::Retired => {
                    return Err(inconsistent(parent, "the simplex has already been refined"))
                }
                SlotStatus::Live => {}
            }
            if !parents.insert(parent) {
                return Err(inconsistent(parent, "the simplex appears twice in one update"));
            }
            let replacements = grid.children_of(parent);
            if replacements.is_empty() {
                return Err(inconsistent(
                    parent,
                    "the grid manager reports no children for the simplex",
                ));
            }
            for &child in replacements {
                if child >= number_of_simplices {
                    return Err(inconsistent(
                        child,
                        "the child lies outside the grid manager's simplices",
                    ));
                }
                let populated = child < self.active_simplex_count
                    && self.simplex_heads[child].status != SlotStatus::Vacant;
                if populated || !children.insert(child) {
                    return Err(inconsistent(child, "the child has already been populated"));
                }
            }
        }
        Ok(())
    }

    /// The number of charges in `simplex`, zero when empty or out of range
    pub fn charge_count(&self, simplex: usize) -> usize {
        if simplex < self.active_simplex_count {
            self.simplex_heads[simplex].length
        } else {
            0
        }
    }

    /// The `index`th charge of `simplex`, counting from the most recently inserted
    pub fn charge_at(&self, index: usize, simplex: usize) -> Result<&Atoms::Atom, CsmError> {
        self.charge_indices(simplex)
            .nth(index)
            .map(|charge| self.atoms.atom(charge))
            .ok_or_else(|| CsmError::ChargeIndexOutOfRange {
                index,
                simplex,
                count: self.charge_count(simplex),
            })
    }

    /// The atom-list indices of the charges in `simplex`
    pub fn charge_indices(&self, simplex: usize) -> ChainIter<'_> {
        let head = if simplex < self.active_simplex_count {
            self.simplex_heads[simplex].head
        } else {
            None
        };
        self.pool.chain(head)
    }

    /// The simplex holding `charge`, found by scanning every chain
    pub fn simplex_of(&self, charge: usize) -> Option<usize> {
        (0..self.active_simplex_count)
            .find(|&simplex| self.charge_indices(simplex).any(|held| held == charge))
    }

    /// The atom list the map was constructed over
    pub fn atoms(&self) -> &'a Atoms {
        self.atoms
    }

    /// The number of charges in the atom list, mapped or not
    pub fn number_of_atoms(&self) -> usize {
        self.atoms.number_of_atoms()
    }

    /// The number of allocated simplex slots
    pub fn capacity(&self) -> usize {
        self.simplex_heads.len()
    }

    /// The number of simplex ids the map currently tracks
    pub fn active_simplex_count(&self) -> usize {
        self.active_simplex_count
    }

    /// Whether a build has completed since construction or the last `release`
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// The settings the map was constructed with
    pub fn settings(&self) -> &MapSettings {
        &self.settings
    }

    /// A snapshot of occupancy and pool usage
    pub fn statistics(&self) -> MapStatistics {
        let slots = &self.simplex_heads[..self.active_simplex_count];
        let associated = slots.iter().map(|slot| slot.length).sum::<usize>();
        MapStatistics {
            number_of_atoms: self.number_of_atoms(),
            associated,
            unassociated: self.number_of_atoms() - associated,
            active_simplices: slots
                .iter()
                .filter(|slot| slot.status == SlotStatus::Live)
                .count(),
            occupied_simplices: slots.iter().filter(|slot| slot.length > 0).count(),
            longest_chain: slots.iter().map(|slot| slot.length).max().unwrap_or(0),
            capacity: self.capacity(),
            pool_in_use: self.pool.number_in_use(),
            pool_free: self.pool.number_free(),
            pool_blocks: self.pool.number_of_blocks(),
        }
    }
}

impl<'a, T, Atoms> ChargeSimplexMap<'a, T, Atoms>
where
    T: Copy + RealField + Send + Sync,
    Atoms: AtomList<T> + Sync,
{
    /// The total charge held by each simplex, evaluated over the rayon pool
    pub fn simplex_charges(&self) -> Vec<T> {
        (0..self.active_simplex_count)
            .into_par_iter()
            .map(|simplex| {
                self.charge_indices(simplex)
                    .fold(T::zero(), |total, charge| total + self.atoms.charge(charge))
            })
            .collect()
    }
}
