use std::ops::{ Add, Sub, Neg, Mul };

use crate::feq;

/// A homogeneous 3D coordinate.
///
/// Points carry `w == 1.0` and vectors carry `w == 0.0`, so that translations
/// in a `Matrix4D` move points but leave directions and normals untouched.
/// Subtracting two points yields a vector, adding a vector to a point yields
/// a point.
#[derive(Debug, Default, Copy, Clone, PartialOrd)]
pub struct Tuple4D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64
}

impl PartialEq for Tuple4D {
    fn eq(&self, other: &Tuple4D) -> bool {
        feq(self.x, other.x) &&
            feq(self.y, other.y) &&
            feq(self.z, other.z) &&
            feq(self.w, other.w)
    }
}

impl From<[f64; 3]> for Tuple4D {
    /// Interprets three components as a vector.
    fn from(v: [f64; 3]) -> Tuple4D {
        Tuple4D::vector(v[0], v[1], v[2])
    }
}

impl Tuple4D {
    pub fn point(x: f64, y: f64, z: f64) -> Tuple4D {
        Tuple4D { x, y, z, w: 1.0 }
    }

    pub fn vector(x: f64, y: f64, z: f64) -> Tuple4D {
        Tuple4D { x, y, z, w: 0.0 }
    }

    /// The origin of the coordinate system.
    pub fn origin() -> Tuple4D {
        Tuple4D::point(0.0, 0.0, 0.0)
    }

    pub fn is_point(&self) -> bool {
        self.w == 1.0
    }

    /// Reinterprets this tuple as a point.
    pub fn as_point(&self) -> Tuple4D {
        Tuple4D { w: 1.0, ..*self }
    }

    /// Reinterprets this tuple as a vector.
    pub fn as_vector(&self) -> Tuple4D {
        Tuple4D { w: 0.0, ..*self }
    }

    /// Euclidean length of the spatial part.
    pub fn magnitude(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2) + self.z.powi(2)).sqrt()
    }

    /// Returns a unit vector pointing along this tuple.
    ///
    /// The zero vector has no direction; it normalizes to a vector of NaNs,
    /// which `is_finite` reports.
    pub fn normalize(&self) -> Tuple4D {
        let inv = 1.0 / self.magnitude();
        Tuple4D::vector(self.x * inv, self.y * inv, self.z * inv)
    }

    /// Dot product of the spatial parts.
    pub fn dot(&self, other: &Tuple4D) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Tuple4D) -> Tuple4D {
        Tuple4D::vector(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Reflects a vector across a normal.
    pub fn reflect(&self, normal: &Tuple4D) -> Tuple4D {
        *self - (*normal * 2.0 * self.dot(normal))
    }

    /// Removes the component along `axis` (assumed normalized).
    pub fn reject(&self, axis: &Tuple4D) -> Tuple4D {
        (*self - *axis * self.dot(axis)).as_vector()
    }

    /// Any unit vector perpendicular to this one.
    pub fn perpendicular(&self) -> Tuple4D {
        // Cross with whichever axis is least aligned.
        let ax = self.x.abs();
        let ay = self.y.abs();
        let az = self.z.abs();

        let other = if ax <= ay && ax <= az {
            Tuple4D::vector(1.0, 0.0, 0.0)
        } else if ay <= az {
            Tuple4D::vector(0.0, 1.0, 0.0)
        } else {
            Tuple4D::vector(0.0, 0.0, 1.0)
        };

        self.cross(&other).normalize()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
            && self.w.is_finite()
    }
}

impl Add for Tuple4D {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
            w: self.w + other.w
        }
    }
}

impl Sub for Tuple4D {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
            w: self.w - other.w
        }
    }
}

impl Neg for Tuple4D {
    type Output = Self;

    fn neg(self) -> Self {
        Self { x: -self.x, y: -self.y, z: -self.z, w: -self.w }
    }
}

impl Mul<f64> for Tuple4D {
    type Output = Self;

    fn mul(self, other: f64) -> Self {
        Self {
            x: self.x * other,
            y: self.y * other,
            z: self.z * other,
            w: self.w * other
        }
    }
}

impl Mul<Tuple4D> for f64 {
    type Output = Tuple4D;

    fn mul(self, other: Tuple4D) -> Tuple4D {
        other * self
    }
}

/* Tests */

#[test]
fn point_minus_point_is_vector() {
    let p1 = Tuple4D::point(3.0, 2.0, 1.0);
    let p2 = Tuple4D::point(5.0, 6.0, 7.0);

    assert_eq!(p1 - p2, Tuple4D::vector(-2.0, -4.0, -6.0));
}

#[test]
fn point_plus_vector_is_point() {
    let p = Tuple4D::point(1.0, 1.0, 1.0);
    let v = Tuple4D::vector(0.5, 0.0, -1.0);

    assert!((p + v).is_point());
}

#[test]
fn magnitude_ignores_w() {
    let p = Tuple4D::point(1.0, 2.0, 2.0);

    assert_eq!(p.magnitude(), 3.0);
}

#[test]
fn normalize_dirty() {
    let v = Tuple4D::vector(1.0, 2.0, 3.0);
    let e = Tuple4D::vector(
        1.0 / f64::sqrt(14.0),
        2.0 / f64::sqrt(14.0),
        3.0 / f64::sqrt(14.0)
    );

    assert_eq!(v.normalize(), e);
}

#[test]
fn normalizing_zero_is_not_finite() {
    let v = Tuple4D::vector(0.0, 0.0, 0.0);

    assert!(!v.normalize().is_finite());
}

#[test]
fn cross_vectors() {
    let a = Tuple4D::vector(1.0, 2.0, 3.0);
    let b = Tuple4D::vector(2.0, 3.0, 4.0);

    assert_eq!(a.cross(&b), Tuple4D::vector(-1.0, 2.0, -1.0));
    assert_eq!(b.cross(&a), Tuple4D::vector(1.0, -2.0, 1.0));
}

#[test]
fn reflect_45() {
    let v = Tuple4D::vector(1.0, -1.0, 0.0);
    let n = Tuple4D::vector(0.0, 1.0, 0.0);

    assert_eq!(v.reflect(&n), Tuple4D::vector(1.0, 1.0, 0.0));
}

#[test]
fn reject_removes_axis_component() {
    let v = Tuple4D::vector(1.0, 2.0, 3.0);
    let axis = Tuple4D::vector(0.0, 0.0, 1.0);

    assert_eq!(v.reject(&axis), Tuple4D::vector(1.0, 2.0, 0.0));
}

#[test]
fn perpendicular_is_unit_and_orthogonal() {
    for v in vec![
        Tuple4D::vector(0.0, 0.0, 1.0),
        Tuple4D::vector(1.0, 1.0, 0.0).normalize(),
        Tuple4D::vector(-3.0, 0.2, 0.1).normalize(),
    ] {
        let p = v.perpendicular();
        assert!(crate::feq(p.magnitude(), 1.0));
        assert!(crate::feq(p.dot(&v), 0.0));
    }
}
