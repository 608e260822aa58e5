//! Point location against the active simplices of a grid
//!
//! Both strategies return the lowest-numbered active simplex whose closed containment test
//! accepts the point. The bucketed locator only narrows the candidate set: each bucket
//! lists, in ascending order, the simplices whose padded bounding box overlaps it.

use apbs_mesher::{BoundingBox, ElementMethods, GridManager};
use itertools::iproduct;
use nalgebra::{Point3, RealField, Vector3};
use num_traits::ToPrimitive;
use serde::Deserialize;

/// Relative padding applied to bounding boxes so a point accepted by the tolerant
/// containment test always falls in a bucket its simplex is registered in
const BOUNDS_PADDING: f64 = 1e-8;

/// The largest number of buckets along one axis, whether configured or chosen automatically
pub const MAXIMUM_BUCKETS_PER_AXIS: usize = 64;

/// How `build` finds the simplex containing each charge
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Deserialize, clap::ArgEnum)]
#[serde(rename_all = "lowercase")]
pub enum LocatorKind {
    /// Scan every active simplex, O(charges x simplices)
    Naive,
    /// Scan the simplices registered in the bucket containing the charge
    Bucketed,
}

impl Default for LocatorKind {
    fn default() -> Self {
        Self::Bucketed
    }
}

pub(crate) enum PointLocator<T: RealField> {
    Naive(Vec<usize>),
    Bucketed(BucketGrid<T>),
}

impl<T> PointLocator<T>
where
    T: Copy + RealField + ToPrimitive,
{
    pub(crate) fn new<Grid: GridManager<T>>(
        kind: LocatorKind,
        grid: &Grid,
        buckets_per_axis: Option<usize>,
    ) -> Self {
        let active: Vec<usize> = (0..grid.number_of_simplices())
            .filter(|&simplex| grid.is_active(simplex))
            .collect();
        match kind {
            LocatorKind::Naive => Self::Naive(active),
            LocatorKind::Bucketed => {
                let buckets_per_axis =
                    buckets_per_axis.unwrap_or_else(|| automatic_resolution(active.len()));
                Self::Bucketed(BucketGrid::new(grid, active, buckets_per_axis))
            }
        }
    }

    pub(crate) fn locate<Grid: GridManager<T>>(
        &self,
        grid: &Grid,
        point: &Point3<T>,
    ) -> Option<usize> {
        let candidates = match self {
            Self::Naive(active) => active.as_slice(),
            Self::Bucketed(buckets) => buckets.candidates(point)?,
        };
        candidates
            .iter()
            .copied()
            .find(|&simplex| grid.contains_point(simplex, point))
    }
}

/// Aim for a handful of simplices per bucket
fn automatic_resolution(number_of_simplices: usize) -> usize {
    let resolution = (number_of_simplices as f64 / 8.0).cbrt().ceil() as usize;
    resolution.clamp(1, MAXIMUM_BUCKETS_PER_AXIS)
}

pub(crate) struct BucketGrid<T: RealField> {
    bounds: BoundingBox<T>,
    bucket_size: Vector3<T>,
    buckets_per_axis: usize,
    buckets: Vec<Vec<usize>>,
}

impl<T> BucketGrid<T>
where
    T: Copy + RealField + ToPrimitive,
{
    fn new<Grid: GridManager<T>>(grid: &Grid, active: Vec<usize>, buckets_per_axis: usize) -> Self {
        let buckets_per_axis = buckets_per_axis.clamp(1, MAXIMUM_BUCKETS_PER_AXIS);
        let padding: T = nalgebra::convert(BOUNDS_PADDING);

        let boxes: Vec<(usize, BoundingBox<T>)> = active
            .into_iter()
            .map(|simplex| {
                let tetrahedron = grid.simplex(simplex);
                let pad = tetrahedron.diameter() * padding;
                (simplex, tetrahedron.bounding_box().padded(pad))
            })
            .collect();

        let bounds = boxes
            .iter()
            .map(|(_, bounds)| bounds.clone())
            .reduce(|total, bounds| total.union(&bounds))
            .unwrap_or_else(|| BoundingBox::new(Point3::origin(), Point3::origin()));
        let extent = bounds.extent();
        let bucket_size = extent.map(|length| {
            if length > T::zero() {
                length / nalgebra::convert::<f64, T>(buckets_per_axis as f64)
            } else {
                T::one()
            }
        });

        let mut grid_of_buckets = Self {
            bounds,
            bucket_size,
            buckets_per_axis,
            buckets: vec![Vec::new(); buckets_per_axis.pow(3)],
        };
        for (simplex, simplex_bounds) in boxes {
            let lower = grid_of_buckets.bucket_coordinates(&simplex_bounds.lower);
            let upper = grid_of_buckets.bucket_coordinates(&simplex_bounds.upper);
            for (i, j, k) in iproduct!(lower[0]..=upper[0], lower[1]..=upper[1], lower[2]..=upper[2])
            {
                let bucket = grid_of_buckets.flatten([i, j, k]);
                grid_of_buckets.buckets[bucket].push(simplex);
            }
        }
        tracing::debug!(
            "Bucketed {} simplices into {}^3 buckets",
            grid_of_buckets.buckets.iter().map(Vec::len).sum::<usize>(),
            buckets_per_axis
        );
        grid_of_buckets
    }

    /// The bucket along each axis holding `point`, clamped into the grid
    fn bucket_coordinates(&self, point: &Point3<T>) -> [usize; 3] {
        let last = self.buckets_per_axis - 1;
        let mut coordinates = [0; 3];
        for (axis, coordinate) in coordinates.iter_mut().enumerate() {
            let offset = ((point[axis] - self.bounds.lower[axis]) / self.bucket_size[axis]).floor();
            *coordinate = offset.to_usize().unwrap_or(0).min(last);
        }
        coordinates
    }

    fn flatten(&self, [i, j, k]: [usize; 3]) -> usize {
        i + self.buckets_per_axis * (j + self.buckets_per_axis * k)
    }

    fn candidates(&self, point: &Point3<T>) -> Option<&[usize]> {
        if !self.bounds.contains(point) {
            return None;
        }
        Some(&self.buckets[self.flatten(self.bucket_coordinates(point))])
    }
}
