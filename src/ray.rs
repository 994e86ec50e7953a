use crate::tuple::Tuple4D;
use crate::matrix::Matrix4D;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Ray4D {
    pub origin: Tuple4D,
    pub direction: Tuple4D,
}

impl Ray4D {
    /// Creates a ray, coercing `origin` to a point and `direction` to a
    /// vector.
    pub fn new(origin: Tuple4D, direction: Tuple4D) -> Ray4D {
        Ray4D { origin: origin.as_point(), direction: direction.as_vector() }
    }

    pub fn position(&self, t: f64) -> Tuple4D {
        self.origin + (t * self.direction)
    }

    pub fn transform(&self, m: Matrix4D) -> Ray4D {
        Ray4D {
            origin: m * self.origin,
            direction: m * self.direction,
        }
    }

    /// The same ray with its origin moved `epsilon` along its direction.
    pub fn nudged(&self, epsilon: f64) -> Ray4D {
        Ray4D { origin: self.position(epsilon), direction: self.direction }
    }
}

/// The state of a ray while it travels through a volume.
///
/// `path_length` only ever grows; it is the geometric distance travelled since
/// the ray entered. If a trajectory is being recorded, every position the ray
/// visits is appended to it.
#[derive(Clone, Debug, PartialEq)]
pub struct RayState {
    pub position: Tuple4D,
    pub direction: Tuple4D,
    pub path_length: f64,
    pub trajectory: Option<Vec<Tuple4D>>,
}

impl RayState {
    pub fn new(position: Tuple4D, direction: Tuple4D, record: bool)
        -> RayState {
        let trajectory = if record { Some(vec![position]) } else { None };

        RayState {
            position: position.as_point(),
            direction: direction.normalize(),
            path_length: 0.0,
            trajectory,
        }
    }

    pub fn ray(&self) -> Ray4D {
        Ray4D::new(self.position, self.direction)
    }

    /// Moves the ray `distance` along its current direction.
    pub fn advance(&mut self, distance: f64) {
        self.position = self.position + self.direction * distance;
        self.path_length += distance.max(0.0);

        if let Some(ref mut trajectory) = self.trajectory {
            trajectory.push(self.position);
        }
    }

    /// Changes direction in place (refraction or reflection).
    pub fn redirect(&mut self, direction: Tuple4D) {
        self.direction = direction.normalize();
    }
}

#[test]
fn ray_position() {
    let r = Ray4D::new(
        Tuple4D::point(2.0, 3.0, 4.0),
        Tuple4D::vector(1.0, 0.0, 0.0)
    );

    assert_eq!(r.position(0.0), Tuple4D::point(2.0, 3.0, 4.0));
    assert_eq!(r.position(-1.0), Tuple4D::point(1.0, 3.0, 4.0));
    assert_eq!(r.position(2.5), Tuple4D::point(4.5, 3.0, 4.0));
}

#[test]
fn ray_scaling() {
    let r = Ray4D::new(
        Tuple4D::point(1.0, 2.0, 3.0),
        Tuple4D::vector(0.0, 1.0, 0.0)
    );
    let t = r.transform(Matrix4D::scaling(2.0, 3.0, 4.0));

    assert_eq!(t.origin, Tuple4D::point(2.0, 6.0, 12.0));
    assert_eq!(t.direction, Tuple4D::vector(0.0, 3.0, 0.0));
}

#[test]
fn state_accumulates_path_length_and_trajectory() {
    let mut s = RayState::new(
        Tuple4D::origin(),
        Tuple4D::vector(0.0, 0.0, 2.0),
        true
    );

    s.advance(1.5);
    s.redirect(Tuple4D::vector(1.0, 0.0, 0.0));
    s.advance(0.5);

    assert_eq!(s.position, Tuple4D::point(0.5, 0.0, 1.5));
    assert!(crate::feq(s.path_length, 2.0));
    assert_eq!(s.trajectory.map(|t| t.len()), Some(3));
}
