use crate::consts::FEQ_EPSILON;
use crate::error::{ OpticsError, Result };
use crate::tuple::Tuple4D;
use crate::ray::Ray4D;
use crate::matrix::Matrix4D;
use crate::intersect::{ Intersection, Intersections };

/// Below this, a ray counts as parallel to a flat surface.
const PARALLEL_EPSILON: f64 = 1.0e-12;

#[derive(Debug, Clone, PartialEq)]
pub enum ShapeType {
    /// A shape which is never hit. Stands in for degenerate surfaces, like
    /// the inner sphere of the innermost spherical shell.
    Empty,

    /// A unit sphere with its center at the object-space origin.
    Sphere,

    /// A cube spanning -1 to 1 along each object-space axis.
    Cube,

    /// The object-space XZ plane, with its normal along +Y.
    Plane,

    /// A unit-radius cylinder around the object-space Y axis. Minimum Y,
    /// maximum Y and whether the cylinder is closed with caps.
    Cylinder(f64, f64, bool),
}

/// A surface placed in the world by a transform.
///
/// Every shape is a unit primitive (see `ShapeType`) mapped into the world by
/// `transform`. The inverse is computed once, when the transform is set, so
/// that shapes rebuilt on every traversal step stay cheap to intersect.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub ty: ShapeType,
    transform: Matrix4D,
    inverse: Matrix4D,
}

impl Default for Shape {
    fn default() -> Shape {
        Shape {
            ty: ShapeType::Empty,
            transform: Matrix4D::identity(),
            inverse: Matrix4D::identity(),
        }
    }
}

impl Shape {
    fn of_type(ty: ShapeType) -> Shape {
        Shape { ty, ..Default::default() }
    }

    pub fn empty() -> Shape {
        Shape::of_type(ShapeType::Empty)
    }

    pub fn sphere() -> Shape {
        Shape::of_type(ShapeType::Sphere)
    }

    pub fn cube() -> Shape {
        Shape::of_type(ShapeType::Cube)
    }

    pub fn plane() -> Shape {
        Shape::of_type(ShapeType::Plane)
    }

    /// An infinitely long cylinder with no end caps.
    pub fn cylinder() -> Shape {
        Shape::of_type(
            ShapeType::Cylinder(std::f64::NEG_INFINITY, std::f64::INFINITY, false)
        )
    }

    /// A bounded cylinder closed by caps at `minimum` and `maximum`.
    pub fn capped_cylinder(minimum: f64, maximum: f64) -> Shape {
        Shape::of_type(ShapeType::Cylinder(minimum, maximum, true))
    }

    /// A sphere of radius `radius` around `centre`.
    pub fn sphere_at(centre: Tuple4D, radius: f64) -> Result<Shape> {
        Shape::sphere().with_transform(
            Matrix4D::translation_to(centre)
                * Matrix4D::scaling(radius, radius, radius)
        )
    }

    /// The plane through `point` with unit normal `normal`.
    pub fn plane_through(point: Tuple4D, normal: Tuple4D) -> Result<Shape> {
        Shape::plane().with_transform(
            Matrix4D::translation_to(point) * Matrix4D::orient_y(normal)
        )
    }

    /// An axis-aligned box between two corners.
    pub fn cuboid(minimum: Tuple4D, maximum: Tuple4D) -> Result<Shape> {
        let half = (maximum - minimum) * 0.5;
        let centre = minimum.as_point() + half;

        Shape::cube().with_transform(
            Matrix4D::translation_to(centre)
                * Matrix4D::scaling(half.x, half.y, half.z)
        )
    }

    /// Sets the transform, failing if it cannot be inverted.
    pub fn with_transform(mut self, transform: Matrix4D) -> Result<Shape> {
        self.inverse = transform.inverse()
            .ok_or(OpticsError::SingularTransform)?;
        self.transform = transform;

        Ok(self)
    }

    pub fn transform(&self) -> &Matrix4D {
        &self.transform
    }

    /// Intersects a world-space ray with this shape.
    ///
    /// All intersections are returned, including those behind the ray origin;
    /// see `Intersections::hit` for picking the visible one.
    pub fn intersect(&self, ray: &Ray4D) -> Intersections {
        let local = ray.transform(self.inverse);
        self.local_intersect(&local)
    }

    /// The outward unit normal at a world-space point on the surface.
    pub fn normal_at(&self, world_point: Tuple4D) -> Tuple4D {
        let local_point = self.inverse * world_point;
        let local_normal = self.local_normal_at(&local_point);

        (self.inverse.transposition() * local_normal).as_vector().normalize()
    }

    fn local_intersect(&self, ray: &Ray4D) -> Intersections {
        match self.ty {
            ShapeType::Empty => Intersections::new(),
            ShapeType::Sphere => self.intersect_sphere(ray),
            ShapeType::Plane => self.intersect_plane(ray),
            ShapeType::Cube => self.intersect_cube(ray),
            ShapeType::Cylinder(minimum, maximum, closed)
                => self.intersect_cylinder(ray, minimum, maximum, closed),
        }
    }

    fn local_normal_at(&self, at: &Tuple4D) -> Tuple4D {
        match self.ty {
            ShapeType::Empty => at.as_vector(),
            ShapeType::Sphere => at.as_vector(),
            ShapeType::Plane => Tuple4D::vector(0.0, 1.0, 0.0),
            ShapeType::Cube => Self::normal_at_cube(at),
            ShapeType::Cylinder(minimum, maximum, _)
                => Self::normal_at_cylinder(at, minimum, maximum),
        }
    }

    fn intersect_sphere(&self, ray: &Ray4D) -> Intersections {
        // Note that subtracting a point removes the 'w' part of the origin.
        let sphere_to_ray = ray.origin - Tuple4D::origin();

        let a = ray.direction.dot(&ray.direction);
        let b = 2.0 * ray.direction.dot(&sphere_to_ray);
        let c = sphere_to_ray.dot(&sphere_to_ray) - 1.0;

        let discriminant = b.powi(2) - (4.0 * a * c);
        if discriminant < 0.0 {
            return Intersections::new();
        }

        let t1 = (-b - discriminant.sqrt()) / (2.0 * a);
        let t2 = (-b + discriminant.sqrt()) / (2.0 * a);

        Intersections::from(vec![
            Intersection::new(t1, self),
            Intersection::new(t2, self),
        ])
    }

    fn intersect_plane(&self, ray: &Ray4D) -> Intersections {
        if ray.direction.y.abs() <= PARALLEL_EPSILON {
            return Intersections::new();
        }

        let t = -ray.origin.y / ray.direction.y;
        Intersections::from(vec![Intersection::new(t, self)])
    }

    fn intersect_cube(&self, ray: &Ray4D) -> Intersections {
        let (xtmin, xtmax) = Self::check_axis(ray.origin.x, ray.direction.x);
        let (ytmin, ytmax) = Self::check_axis(ray.origin.y, ray.direction.y);
        let (ztmin, ztmax) = Self::check_axis(ray.origin.z, ray.direction.z);

        let tmin = xtmin.max(ytmin).max(ztmin);
        let tmax = xtmax.min(ytmax).min(ztmax);

        if tmin > tmax {
            return Intersections::new();
        }

        Intersections::from(vec![
            Intersection::new(tmin, self),
            Intersection::new(tmax, self),
        ])
    }

    /// Where a ray enters and leaves the slab `-1..=1` of one cube axis.
    fn check_axis(origin: f64, direction: f64) -> (f64, f64) {
        let tmin_numerator = -1.0 - origin;
        let tmax_numerator =  1.0 - origin;

        let (tmin, tmax) = if direction.abs() >= PARALLEL_EPSILON {
            (tmin_numerator / direction, tmax_numerator / direction)
        } else {
            (tmin_numerator * std::f64::INFINITY,
             tmax_numerator * std::f64::INFINITY)
        };

        if tmin > tmax { (tmax, tmin) } else { (tmin, tmax) }
    }

    fn normal_at_cube(p: &Tuple4D) -> Tuple4D {
        let xa = p.x.abs();
        let ya = p.y.abs();
        let za = p.z.abs();

        let max_component = xa.max(ya).max(za);
        if max_component == xa {
            Tuple4D::vector(p.x.signum(), 0.0, 0.0)
        } else if max_component == ya {
            Tuple4D::vector(0.0, p.y.signum(), 0.0)
        } else {
            Tuple4D::vector(0.0, 0.0, p.z.signum())
        }
    }

    fn intersect_cylinder(&self, ray: &Ray4D, minimum: f64, maximum: f64,
        closed: bool) -> Intersections {
        let mut is = Intersections::new();
        let a = ray.direction.x.powi(2) + ray.direction.z.powi(2);

        // A ray parallel to the axis can only hit the caps.
        if a >= PARALLEL_EPSILON {
            let b = 2.0 * ray.origin.x * ray.direction.x
                  + 2.0 * ray.origin.z * ray.direction.z;
            let c = ray.origin.x.powi(2) + ray.origin.z.powi(2) - 1.0;

            let disc = b.powi(2) - 4.0 * a * c;
            if disc >= 0.0 {
                for t in [(-b - disc.sqrt()) / (2.0 * a),
                          (-b + disc.sqrt()) / (2.0 * a)].iter() {
                    let y = ray.origin.y + t * ray.direction.y;
                    if minimum < y && y < maximum {
                        is.intersections.push(Intersection::new(*t, self));
                    }
                }
            }
        }

        if closed && ray.direction.y.abs() >= PARALLEL_EPSILON {
            for cap in [minimum, maximum].iter() {
                let t = (cap - ray.origin.y) / ray.direction.y;
                let x = ray.origin.x + t * ray.direction.x;
                let z = ray.origin.z + t * ray.direction.z;

                if x.powi(2) + z.powi(2) <= 1.0 {
                    is.intersections.push(Intersection::new(t, self));
                }
            }
        }

        is.sort();
        is
    }

    fn normal_at_cylinder(at: &Tuple4D, minimum: f64, maximum: f64)
        -> Tuple4D {
        let dist = at.x.powi(2) + at.z.powi(2);

        if dist < 1.0 && at.y >= maximum - FEQ_EPSILON {
            Tuple4D::vector(0.0, 1.0, 0.0)
        } else if dist < 1.0 && at.y <= minimum + FEQ_EPSILON {
            Tuple4D::vector(0.0, -1.0, 0.0)
        } else {
            Tuple4D::vector(at.x, 0.0, at.z)
        }
    }
}

#[test]
fn ray_pierces_sphere() {
    let r = Ray4D::new(Tuple4D::point(0.0, 0.0, -5.0),
                       Tuple4D::vector(0.0, 0.0, 1.0));
    let s = Shape::sphere();
    let xs = s.intersect(&r);

    assert_eq!(xs.intersections.len(), 2);
    assert_eq!(xs.intersections[0].t, 4.0);
    assert_eq!(xs.intersections[1].t, 6.0);
}

#[test]
fn ray_hits_scaled_sphere() {
    let r = Ray4D::new(Tuple4D::point(0.0, 0.0, -5.0),
                       Tuple4D::vector(0.0, 0.0, 1.0));
    let s = Shape::sphere_at(Tuple4D::origin(), 2.0).unwrap();
    let xs = s.intersect(&r);

    assert_eq!(xs.intersections.len(), 2);
    assert!(crate::feq(xs.intersections[0].t, 3.0));
    assert!(crate::feq(xs.intersections[1].t, 7.0));
}

#[test]
fn singular_transform_is_rejected() {
    let s = Shape::sphere().with_transform(Matrix4D::scaling(0.0, 1.0, 1.0));

    assert_eq!(s, Err(OpticsError::SingularTransform));
}

#[test]
fn normal_on_translated_sphere() {
    let s = Shape::sphere().with_transform(
        Matrix4D::translation(0.0, 1.0, 0.0)
    ).unwrap();
    let n = s.normal_at(Tuple4D::point(0.0, 1.70711, -0.70711));

    assert_eq!(n, Tuple4D::vector(0.0, 0.70711, -0.70711));
}

#[test]
fn tilted_plane_is_hit_along_its_normal() {
    let n = Tuple4D::vector(1.0, 1.0, 0.0).normalize();
    let p = Shape::plane_through(Tuple4D::point(1.0, 1.0, 0.0), n).unwrap();
    let r = Ray4D::new(Tuple4D::origin(), n);

    let xs = p.intersect(&r);
    assert_eq!(xs.intersections.len(), 1);
    assert!(crate::feq(xs.intersections[0].t, 2.0f64.sqrt()));
    assert_eq!(p.normal_at(r.position(2.0f64.sqrt())), n);
}

#[test]
fn ray_parallel_to_plane_misses() {
    let r = Ray4D::new(Tuple4D::point(0.0, 10.0, 0.0),
                       Tuple4D::vector(0.0, 0.0, 1.0));

    assert!(Shape::plane().intersect(&r).intersections.is_empty());
}

#[test]
fn ray_inside_cuboid_hits_far_face() {
    let b = Shape::cuboid(
        Tuple4D::point(-1.0, -1.0, 0.0),
        Tuple4D::point(1.0, 1.0, 2.0)
    ).unwrap();
    let r = Ray4D::new(Tuple4D::point(0.0, 0.0, 0.5),
                       Tuple4D::vector(0.0, 0.0, 1.0));

    let mut xs = b.intersect(&r);
    let hit = xs.hit(0.0).expect("Ray should leave the box.");
    assert!(crate::feq(hit.t, 1.5));
    assert_eq!(b.normal_at(r.position(hit.t)), Tuple4D::vector(0.0, 0.0, 1.0));
}

#[test]
fn capped_cylinder_is_closed() {
    let c = Shape::capped_cylinder(-1.0, 1.0);
    let r = Ray4D::new(Tuple4D::point(0.0, -5.0, 0.0),
                       Tuple4D::vector(0.0, 1.0, 0.0));

    let xs = c.intersect(&r);
    assert_eq!(xs.intersections.len(), 2);
    assert_eq!(c.normal_at(Tuple4D::point(0.2, 1.0, 0.1)),
        Tuple4D::vector(0.0, 1.0, 0.0));
}

#[test]
fn empty_shape_is_never_hit() {
    let r = Ray4D::new(Tuple4D::origin(), Tuple4D::vector(0.0, 0.0, 1.0));

    assert!(Shape::empty().intersect(&r).intersections.is_empty());
}
