use nalgebra::{Matrix3, Point3, RealField, Vector3};

/// Tolerance on the barycentric coordinates used by the closed containment test
///
/// Barycentric coordinates are dimensionless, so this is relative to the element size.
pub const CONTAINMENT_TOLERANCE: f64 = 1e-10;

/// The local vertex pairs forming the six edges of a tetrahedron
pub const TETRAHEDRON_EDGES: [(usize, usize); 6] = [(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)];

pub trait ElementMethods<T: RealField> {
    fn vertex_indices(&self) -> &[usize];
    fn diameter(&self) -> T;
}

/// An axis-aligned bounding box
#[derive(Clone, Debug, PartialEq)]
pub struct BoundingBox<T: RealField> {
    pub lower: Point3<T>,
    pub upper: Point3<T>,
}

impl<T: Copy + RealField> BoundingBox<T> {
    pub fn new(lower: Point3<T>, upper: Point3<T>) -> Self {
        Self { lower, upper }
    }

    /// The smallest box containing every point, `None` for an empty iterator
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<T>>) -> Option<Self>
    where
        T: 'a,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self::new(*first, *first), |bounds, point| {
            bounds.union_point(point)
        }))
    }

    pub fn union_point(self, point: &Point3<T>) -> Self {
        Self {
            lower: Point3::from(self.lower.coords.inf(&point.coords)),
            upper: Point3::from(self.upper.coords.sup(&point.coords)),
        }
    }

    pub fn union(self, other: &Self) -> Self {
        self.union_point(&other.lower).union_point(&other.upper)
    }

    /// Grows the box by `padding` on every face
    pub fn padded(&self, padding: T) -> Self {
        let padding = Vector3::from_element(padding);
        Self {
            lower: self.lower - padding,
            upper: self.upper + padding,
        }
    }

    pub fn extent(&self) -> Vector3<T> {
        self.upper - self.lower
    }

    pub fn contains(&self, point: &Point3<T>) -> bool {
        (0..3).all(|axis| point[axis] >= self.lower[axis] && point[axis] <= self.upper[axis])
    }
}

#[derive(Clone, Debug)]
pub struct Tetrahedron<T>
where
    T: RealField,
{
    vertices: [Point3<T>; 4],
    vertex_indices: [usize; 4],
}

impl<T> Tetrahedron<T>
where
    T: Copy + RealField,
{
    pub fn from_vertices(vertices: &[Point3<T>; 4], vertex_indices: &[usize; 4]) -> Self {
        Self {
            vertices: vertices.to_owned(),
            vertex_indices: vertex_indices.to_owned(),
        }
    }

    /// The unit right-angled tetrahedron with a vertex at the origin
    pub fn reference() -> Self {
        Self::from_vertices(
            &[
                Point3::origin(),
                Point3::new(T::one(), T::zero(), T::zero()),
                Point3::new(T::zero(), T::one(), T::zero()),
                Point3::new(T::zero(), T::zero(), T::one()),
            ],
            &[0, 1, 2, 3],
        )
    }

    pub fn vertices(&self) -> &[Point3<T>; 4] {
        &self.vertices
    }

    fn edge_matrix(&self) -> Matrix3<T> {
        let origin = self.vertices[0];
        Matrix3::from_columns(&[
            self.vertices[1] - origin,
            self.vertices[2] - origin,
            self.vertices[3] - origin,
        ])
    }

    /// The oriented volume, positive for a right-handed vertex ordering
    pub fn signed_volume(&self) -> T {
        self.edge_matrix().determinant() / nalgebra::convert::<f64, T>(6.0)
    }

    pub fn volume(&self) -> T {
        self.signed_volume().abs()
    }

    pub fn centroid(&self) -> Point3<T> {
        let sum = self
            .vertices
            .iter()
            .fold(Vector3::zeros(), |acc, vertex| acc + vertex.coords);
        Point3::from(sum / nalgebra::convert::<f64, T>(4.0))
    }

    /// Barycentric coordinates of `point`, `None` when the element is degenerate
    pub fn barycentric_coordinates(&self, point: &Point3<T>) -> Option<[T; 4]> {
        let inverse = self.edge_matrix().try_inverse()?;
        let local = inverse * (point - self.vertices[0]);
        Some([
            T::one() - local.x - local.y - local.z,
            local.x,
            local.y,
            local.z,
        ])
    }

    /// Closed containment: points on faces, edges and vertices are inside
    pub fn contains(&self, point: &Point3<T>) -> bool {
        self.contains_with_tolerance(point, nalgebra::convert::<f64, T>(CONTAINMENT_TOLERANCE))
    }

    pub fn contains_with_tolerance(&self, point: &Point3<T>, tolerance: T) -> bool {
        match self.barycentric_coordinates(point) {
            Some(coordinates) => coordinates.iter().all(|&lambda| lambda >= -tolerance),
            None => false,
        }
    }

    pub fn bounding_box(&self) -> BoundingBox<T> {
        let bounds = BoundingBox::new(self.vertices[0], self.vertices[0]);
        self.vertices[1..]
            .iter()
            .fold(bounds, |bounds, vertex| bounds.union_point(vertex))
    }

    /// The local vertex pair of the longest edge, the first in `TETRAHEDRON_EDGES` order on ties
    pub fn longest_edge(&self) -> (usize, usize) {
        let mut longest = TETRAHEDRON_EDGES[0];
        let mut longest_length = T::zero();
        for &(i, j) in TETRAHEDRON_EDGES.iter() {
            let length = (self.vertices[i] - self.vertices[j]).norm_squared();
            if length > longest_length {
                longest = (i, j);
                longest_length = length;
            }
        }
        longest
    }
}

impl<T: Copy + RealField> ElementMethods<T> for Tetrahedron<T> {
    fn vertex_indices(&self) -> &[usize] {
        &self.vertex_indices
    }
    fn diameter(&self) -> T {
        let (i, j) = self.longest_edge();
        (self.vertices[i] - self.vertices[j]).norm()
    }
}

#[cfg(test)]
mod test {
    use super::{BoundingBox, ElementMethods, Tetrahedron};
    use approx::assert_relative_eq;
    use nalgebra::Point3;
    use rand::Rng;

    #[test]
    fn reference_tetrahedron_has_volume_of_one_sixth() {
        let tetrahedron: Tetrahedron<f64> = Tetrahedron::reference();
        assert_relative_eq!(tetrahedron.volume(), 1. / 6.);
    }

    #[test]
    fn vertices_and_faces_are_contained() {
        let tetrahedron: Tetrahedron<f64> = Tetrahedron::reference();
        for vertex in tetrahedron.vertices() {
            assert!(tetrahedron.contains(vertex));
        }
        assert!(tetrahedron.contains(&Point3::new(0.25, 0.25, 0.)));
        assert!(tetrahedron.contains(&Point3::new(0.5, 0.5, 0.)));
        assert!(tetrahedron.contains(&tetrahedron.centroid()));
    }

    #[test]
    fn points_outside_are_rejected() {
        let tetrahedron: Tetrahedron<f64> = Tetrahedron::reference();
        assert!(!tetrahedron.contains(&Point3::new(0.5, 0.5, 0.5)));
        assert!(!tetrahedron.contains(&Point3::new(-0.01, 0.1, 0.1)));
        assert!(!tetrahedron.contains(&Point3::new(2., 0., 0.)));
    }

    #[test]
    fn barycentric_coordinates_sum_to_one() {
        let mut rng = rand::thread_rng();
        let tetrahedron: Tetrahedron<f64> = Tetrahedron::reference();
        let point = Point3::new(rng.gen(), rng.gen(), rng.gen());
        let coordinates = tetrahedron.barycentric_coordinates(&point).unwrap();
        assert_relative_eq!(coordinates.iter().sum::<f64>(), 1., epsilon = 1e-12);
    }

    #[test]
    fn degenerate_tetrahedron_contains_nothing() {
        let flat = Tetrahedron::from_vertices(
            &[
                Point3::new(0., 0., 0.),
                Point3::new(1., 0., 0.),
                Point3::new(0., 1., 0.),
                Point3::new(1., 1., 0.),
            ],
            &[0, 1, 2, 3],
        );
        assert!(!flat.contains(&Point3::new(0.1, 0.1, 0.)));
    }

    #[test]
    fn longest_edge_of_reference_is_the_first_hypotenuse() {
        let tetrahedron: Tetrahedron<f64> = Tetrahedron::reference();
        assert_eq!(tetrahedron.longest_edge(), (1, 2));
        assert_relative_eq!(tetrahedron.diameter(), 2f64.sqrt());
    }

    #[test]
    fn bounding_box_encloses_all_vertices() {
        let tetrahedron: Tetrahedron<f64> = Tetrahedron::reference();
        let bounds = tetrahedron.bounding_box();
        assert_eq!(
            bounds,
            BoundingBox::new(Point3::new(0., 0., 0.), Point3::new(1., 1., 1.))
        );
        assert!(bounds.padded(0.5).contains(&Point3::new(1.4, -0.4, 0.)));
    }
}
