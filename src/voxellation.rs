use std::fmt;
use std::f64::consts::PI;

use crate::error::{ OpticsError, Result };
use crate::tuple::Tuple4D;
use crate::matrix::Matrix4D;
use crate::shape::Shape;

/// The voxel a point lies in: one integer per voxellation family, in the
/// order the families were given to the volume.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct VoxelIndex(pub Vec<i64>);

impl VoxelIndex {
    /// The index along family `family`.
    pub fn along(&self, family: usize) -> Option<i64> {
        self.0.get(family).copied()
    }

    /// Sum of all components; the parity of this drives checker patterns.
    pub fn sum(&self) -> i64 {
        self.0.iter().sum()
    }
}

impl fmt::Display for VoxelIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|i| i.to_string()).collect();
        write!(f, "({})", parts.join(", "))
    }
}

impl From<Vec<i64>> for VoxelIndex {
    fn from(v: Vec<i64>) -> VoxelIndex {
        VoxelIndex(v)
    }
}

/// A family of ordered dividing surfaces.
///
/// Surface `k` and surface `k + 1` bound voxel `k`. `index_of` is defined for
/// every point in space, not just inside some boundary, and a point with
/// `index_of(p) == k` lies between the two bounding surfaces of `k`.
///
/// Implementations are immutable and shared by every ray of a render, so they
/// must be `Send + Sync` and must not keep per-call state.
pub trait Voxellation: fmt::Debug + Send + Sync {
    /// The index of the slab of this family containing `point`.
    fn index_of(&self, point: Tuple4D) -> i64;

    /// Dividing surface number `k`.
    fn surface(&self, k: i64) -> Result<Shape>;

    /// The two surfaces bounding voxel `index`, lower one first.
    fn bounding_surfaces_of(&self, index: i64) -> Result<(Shape, Shape)> {
        Ok((self.surface(index)?, self.surface(index + 1)?))
    }

    /// The number naming surface `k`. Families that close on themselves
    /// give every surface a single number, however many times it recurs.
    fn surface_id(&self, k: i64) -> i64 {
        k
    }
}

/// Asks every family for its index at `point`.
pub fn voxel_index_at(voxellations: &[Box<dyn Voxellation>], point: Tuple4D)
    -> VoxelIndex {
    VoxelIndex(voxellations.iter().map(|v| v.index_of(point)).collect())
}

fn check_spacing(spacing: f64) -> Result<f64> {
    if spacing.is_finite() && spacing > 0.0 {
        Ok(spacing)
    } else {
        Err(OpticsError::InvalidVoxellation(
            format!("spacing must be positive, got {}", spacing)
        ))
    }
}

fn check_direction(v: Tuple4D, what: &str) -> Result<Tuple4D> {
    let n = v.as_vector().normalize();
    if n.is_finite() {
        Ok(n)
    } else {
        Err(OpticsError::InvalidVoxellation(format!("{} must be non-zero", what)))
    }
}

/// Equidistant parallel planes.
///
/// Plane `k` passes through `point + k * spacing * normal`.
#[derive(Clone, Debug, PartialEq)]
pub struct ParallelPlanes {
    point: Tuple4D,
    normal: Tuple4D,
    spacing: f64,
}

impl ParallelPlanes {
    pub fn new(point: Tuple4D, normal: Tuple4D, spacing: f64)
        -> Result<ParallelPlanes> {
        Ok(ParallelPlanes {
            point: point.as_point(),
            normal: check_direction(normal, "plane normal")?,
            spacing: check_spacing(spacing)?,
        })
    }
}

impl Voxellation for ParallelPlanes {
    fn index_of(&self, point: Tuple4D) -> i64 {
        let d = (point.as_point() - self.point).dot(&self.normal);
        (d / self.spacing).floor() as i64
    }

    fn surface(&self, k: i64) -> Result<Shape> {
        let p = self.point + self.normal * (k as f64 * self.spacing);
        Shape::plane_through(p, self.normal)
    }
}

/// Concentric spheres with radii `k * spacing`.
///
/// Voxel 0 is the solid innermost ball; its inner surface is empty.
#[derive(Clone, Debug, PartialEq)]
pub struct ConcentricSpheres {
    centre: Tuple4D,
    spacing: f64,
}

impl ConcentricSpheres {
    pub fn new(centre: Tuple4D, spacing: f64) -> Result<ConcentricSpheres> {
        Ok(ConcentricSpheres {
            centre: centre.as_point(),
            spacing: check_spacing(spacing)?,
        })
    }
}

impl Voxellation for ConcentricSpheres {
    fn index_of(&self, point: Tuple4D) -> i64 {
        let r = (point.as_point() - self.centre).magnitude();
        (r / self.spacing).floor() as i64
    }

    fn surface(&self, k: i64) -> Result<Shape> {
        if k <= 0 {
            return Ok(Shape::empty());
        }

        Shape::sphere_at(self.centre, k as f64 * self.spacing)
    }
}

/// Infinite coaxial cylinders with radii `k * spacing`.
#[derive(Clone, Debug, PartialEq)]
pub struct CoaxialCylinders {
    point: Tuple4D,
    axis: Tuple4D,
    spacing: f64,
}

impl CoaxialCylinders {
    pub fn new(point: Tuple4D, axis: Tuple4D, spacing: f64)
        -> Result<CoaxialCylinders> {
        Ok(CoaxialCylinders {
            point: point.as_point(),
            axis: check_direction(axis, "cylinder axis")?,
            spacing: check_spacing(spacing)?,
        })
    }
}

impl Voxellation for CoaxialCylinders {
    fn index_of(&self, point: Tuple4D) -> i64 {
        let r = (point.as_point() - self.point).reject(&self.axis).magnitude();
        (r / self.spacing).floor() as i64
    }

    fn surface(&self, k: i64) -> Result<Shape> {
        if k <= 0 {
            return Ok(Shape::empty());
        }

        let r = k as f64 * self.spacing;
        Shape::cylinder().with_transform(
            Matrix4D::translation_to(self.point)
                * Matrix4D::orient_y(self.axis)
                * Matrix4D::scaling(r, 1.0, r)
        )
    }
}

/// Half-planes fanning out from a common axis, splitting space into
/// `sectors` equal wedges.
///
/// The azimuth is measured around `axis`, starting from `zero_direction`.
/// Surface `k` is the plane at azimuth `k * 2pi / sectors`; indices wrap, so
/// surface `sectors` coincides with surface 0. Wedges must be convex (narrower
/// than pi), hence at least three sectors.
#[derive(Clone, Debug, PartialEq)]
pub struct RadialPlanes {
    point: Tuple4D,
    axis: Tuple4D,
    e1: Tuple4D,
    e2: Tuple4D,
    sectors: u32,
}

impl RadialPlanes {
    pub fn new(point: Tuple4D, axis: Tuple4D, zero_direction: Tuple4D,
        sectors: u32) -> Result<RadialPlanes> {
        if sectors < 3 {
            return Err(OpticsError::InvalidVoxellation(
                format!("need at least 3 sectors, got {}", sectors)
            ));
        }

        let axis = check_direction(axis, "radial axis")?;
        let e1 = check_direction(
            zero_direction.reject(&axis), "zero direction off the axis"
        )?;
        let e2 = axis.cross(&e1);

        Ok(RadialPlanes { point: point.as_point(), axis, e1, e2, sectors })
    }

    fn sector_angle(&self) -> f64 {
        2.0 * PI / self.sectors as f64
    }
}

impl Voxellation for RadialPlanes {
    fn index_of(&self, point: Tuple4D) -> i64 {
        let v = point.as_point() - self.point;
        let phi = v.dot(&self.e2).atan2(v.dot(&self.e1)).rem_euclid(2.0 * PI);

        // rem_euclid can round up to exactly 2pi.
        ((phi / self.sector_angle()).floor() as i64)
            .min(self.sectors as i64 - 1)
    }

    fn surface(&self, k: i64) -> Result<Shape> {
        let phi = k as f64 * self.sector_angle();
        let normal = self.e2 * phi.cos() - self.e1 * phi.sin();

        Shape::plane_through(self.point, normal)
    }

    fn surface_id(&self, k: i64) -> i64 {
        k.rem_euclid(self.sectors as i64)
    }
}

#[cfg(test)]
fn signed_distance(plane: &Shape, p: Tuple4D) -> f64 {
    // Planes pass through the transformed origin with the transformed normal.
    let origin = *plane.transform() * Tuple4D::origin();
    (p - origin).dot(&plane.normal_at(origin))
}

#[test]
fn parallel_planes_index_points() {
    let v = ParallelPlanes::new(
        Tuple4D::point(0.0, 0.0, 1.0), Tuple4D::vector(0.0, 0.0, 2.0), 0.5
    ).unwrap();

    assert_eq!(v.index_of(Tuple4D::point(3.0, -2.0, 1.1)), 0);
    assert_eq!(v.index_of(Tuple4D::point(0.0, 0.0, 1.75)), 1);
    assert_eq!(v.index_of(Tuple4D::point(0.0, 0.0, 0.9)), -1);
}

#[test]
fn point_lies_between_its_parallel_planes() {
    let v = ParallelPlanes::new(
        Tuple4D::origin(), Tuple4D::vector(1.0, 1.0, 0.0), 0.3
    ).unwrap();

    for p in vec![
        Tuple4D::point(0.1, 0.2, 0.0),
        Tuple4D::point(-2.0, 0.7, 4.0),
        Tuple4D::point(5.0, 5.0, -1.0),
    ] {
        let (lower, upper) = v.bounding_surfaces_of(v.index_of(p)).unwrap();
        assert!(signed_distance(&lower, p) >= -1.0e-9);
        assert!(signed_distance(&upper, p) <= 1.0e-9);
    }
}

#[test]
fn zero_spacing_is_invalid() {
    let v = ParallelPlanes::new(Tuple4D::origin(), Tuple4D::vector(0.0, 0.0, 1.0), 0.0);

    assert!(v.is_err());
}

#[test]
fn innermost_sphere_has_empty_inner_surface() {
    let v = ConcentricSpheres::new(Tuple4D::origin(), 1.0).unwrap();
    let (inner, outer) = v.bounding_surfaces_of(0).unwrap();

    assert_eq!(v.index_of(Tuple4D::point(0.2, 0.1, 0.0)), 0);
    assert_eq!(v.index_of(Tuple4D::point(0.0, 2.5, 0.0)), 2);
    assert_eq!(inner, Shape::empty());
    assert_eq!(outer, Shape::sphere());
}

#[test]
fn cylinders_measure_distance_from_axis() {
    let v = CoaxialCylinders::new(
        Tuple4D::point(1.0, 0.0, 0.0), Tuple4D::vector(0.0, 0.0, 1.0), 0.5
    ).unwrap();

    assert_eq!(v.index_of(Tuple4D::point(1.0, 0.2, 100.0)), 0);
    assert_eq!(v.index_of(Tuple4D::point(2.2, 0.0, -3.0)), 2);

    let (_, outer) = v.bounding_surfaces_of(2).unwrap();
    let p = Tuple4D::point(2.5, 0.0, 7.0);
    assert_eq!(outer.normal_at(p), Tuple4D::vector(1.0, 0.0, 0.0));
}

#[test]
fn radial_planes_index_by_azimuth() {
    let v = RadialPlanes::new(
        Tuple4D::origin(),
        Tuple4D::vector(0.0, 0.0, 1.0),
        Tuple4D::vector(1.0, 0.0, 0.0),
        4
    ).unwrap();

    assert_eq!(v.index_of(Tuple4D::point(1.0, 0.5, 0.0)), 0);
    assert_eq!(v.index_of(Tuple4D::point(-1.0, 0.5, 3.0)), 1);
    assert_eq!(v.index_of(Tuple4D::point(-1.0, -0.5, 0.0)), 2);
    assert_eq!(v.index_of(Tuple4D::point(1.0, -0.5, 0.0)), 3);
}

#[test]
fn radial_surfaces_contain_the_axis() {
    let v = RadialPlanes::new(
        Tuple4D::origin(),
        Tuple4D::vector(0.0, 0.0, 1.0),
        Tuple4D::vector(1.0, 0.0, 0.0),
        6
    ).unwrap();
    let s = v.surface(1).unwrap();

    let axis_point = Tuple4D::point(0.0, 0.0, 3.0);
    let spoke = Tuple4D::point((PI / 3.0).cos(), (PI / 3.0).sin(), 0.0);
    assert!(signed_distance(&s, axis_point).abs() < 1.0e-9);
    assert!(signed_distance(&s, spoke).abs() < 1.0e-9);
}

#[test]
fn radial_planes_need_three_sectors() {
    let v = RadialPlanes::new(
        Tuple4D::origin(),
        Tuple4D::vector(0.0, 0.0, 1.0),
        Tuple4D::vector(1.0, 0.0, 0.0),
        2
    );

    assert!(v.is_err());
}

#[test]
fn voxel_index_combines_families() {
    let families: Vec<Box<dyn Voxellation>> = vec![
        Box::new(ParallelPlanes::new(
            Tuple4D::origin(), Tuple4D::vector(1.0, 0.0, 0.0), 1.0).unwrap()),
        Box::new(ConcentricSpheres::new(Tuple4D::origin(), 1.0).unwrap()),
    ];

    let index = voxel_index_at(&families, Tuple4D::point(2.5, 0.0, 0.0));
    assert_eq!(index, VoxelIndex(vec![2, 2]));
    assert_eq!(index.to_string(), "(2, 2)");
}

#[test]
fn radial_surface_ids_wrap_around() {
    let v = RadialPlanes::new(
        Tuple4D::origin(),
        Tuple4D::vector(0.0, 0.0, 1.0),
        Tuple4D::vector(1.0, 0.0, 0.0),
        6
    ).unwrap();
    let planes = ParallelPlanes::new(
        Tuple4D::origin(), Tuple4D::vector(0.0, 0.0, 1.0), 0.5
    ).unwrap();

    assert_eq!(v.surface_id(6), 0);
    assert_eq!(v.surface_id(-1), 5);
    assert_eq!(v.surface_id(3), 3);
    assert_eq!(planes.surface_id(6), 6);
}
