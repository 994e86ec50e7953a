use std::ops::{ Index, IndexMut, Mul };

use crate::feq;
use crate::tuple::Tuple4D;

/// A 3x3 matrix.
///
/// Besides serving as the submatrix of a `Matrix4D` when computing cofactors,
/// this is the type of the per-voxel metric tensor used by metric media. For
/// a medium with scalar refractive index `n`, the metric is `n^2 * I` (see
/// `Matrix3D::isotropic`).
#[derive(Copy, Clone, Debug, Default, PartialOrd)]
pub struct Matrix3D {
    data: [f64; 9],
}

/// A 4x4 matrix.
///
/// Encodes affine transformations of homogeneous points and vectors. Shapes
/// carry one of these to place a unit primitive in the world; voxellations
/// build them for every dividing surface they hand out.
#[derive(Copy, Clone, Debug, Default, PartialOrd)]
pub struct Matrix4D {
    data: [f64; 16],
}

impl PartialEq for Matrix3D {
    fn eq(&self, other: &Matrix3D) -> bool {
        self.data.iter().zip(other.data.iter()).all(|(x, y)| feq(*x, *y))
    }
}

impl PartialEq for Matrix4D {
    fn eq(&self, other: &Matrix4D) -> bool {
        self.data.iter().zip(other.data.iter()).all(|(x, y)| feq(*x, *y))
    }
}

impl From<[f64; 9]> for Matrix3D {
    /// Builds a matrix from row-major elements.
    fn from(data: [f64; 9]) -> Matrix3D {
        Matrix3D { data }
    }
}

impl From<[f64; 16]> for Matrix4D {
    /// Builds a matrix from row-major elements.
    fn from(data: [f64; 16]) -> Matrix4D {
        Matrix4D { data }
    }
}

impl Index<(usize, usize)> for Matrix3D {
    type Output = f64;

    fn index(&self, index: (usize, usize)) -> &f64 {
        &self.data[(index.0 * 3) + index.1]
    }
}

impl IndexMut<(usize, usize)> for Matrix3D {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut f64 {
        &mut self.data[(index.0 * 3) + index.1]
    }
}

impl Index<(usize, usize)> for Matrix4D {
    type Output = f64;

    fn index(&self, index: (usize, usize)) -> &f64 {
        &self.data[(index.0 * 4) + index.1]
    }
}

impl IndexMut<(usize, usize)> for Matrix4D {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut f64 {
        &mut self.data[(index.0 * 4) + index.1]
    }
}

impl Matrix3D {
    pub fn zero() -> Matrix3D {
        Matrix3D { data: [0.0; 9] }
    }

    pub fn identity() -> Matrix3D {
        Matrix3D::diagonal(1.0, 1.0, 1.0)
    }

    pub fn diagonal(a: f64, b: f64, c: f64) -> Matrix3D {
        let mut m = Matrix3D::zero();
        m[(0, 0)] = a;
        m[(1, 1)] = b;
        m[(2, 2)] = c;

        m
    }

    /// The metric of an isotropic medium with refractive index `n`.
    pub fn isotropic(n: f64) -> Matrix3D {
        let n2 = n * n;
        Matrix3D::diagonal(n2, n2, n2)
    }

    pub fn transposition(&self) -> Matrix3D {
        let mut t = Matrix3D::zero();
        for r in 0..3 {
            for c in 0..3 {
                t[(c, r)] = self[(r, c)];
            }
        }

        t
    }

    /// Determinant of the 2x2 matrix left after removing `row` and `col`.
    fn minor(&self, row: usize, col: usize) -> f64 {
        let rows: Vec<usize> = (0..3).filter(|&r| r != row).collect();
        let cols: Vec<usize> = (0..3).filter(|&c| c != col).collect();

        self[(rows[0], cols[0])] * self[(rows[1], cols[1])]
            - self[(rows[0], cols[1])] * self[(rows[1], cols[0])]
    }

    fn cofactor(&self, row: usize, col: usize) -> f64 {
        let m = self.minor(row, col);
        if (row + col) % 2 == 0 { m } else { -m }
    }

    pub fn determinant(&self) -> f64 {
        (0..3).map(|c| self[(0, c)] * self.cofactor(0, c)).sum()
    }

    /// Calculates the inverse, if the matrix is not (numerically) singular.
    pub fn inverse(&self) -> Option<Matrix3D> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < 1.0e-12 {
            return None;
        }

        let mut inv = Matrix3D::zero();
        for r in 0..3 {
            for c in 0..3 {
                inv[(c, r)] = self.cofactor(r, c) / det;
            }
        }

        Some(inv)
    }

    pub fn is_symmetric(&self) -> bool {
        *self == self.transposition()
    }

    /// Sylvester's criterion: all leading principal minors are positive.
    pub fn is_positive_definite(&self) -> bool {
        let m1 = self[(0, 0)];
        let m2 = self[(0, 0)] * self[(1, 1)] - self[(0, 1)] * self[(1, 0)];
        let m3 = self.determinant();

        m1 > 0.0 && m2 > 0.0 && m3 > 0.0
    }

    /// Evaluates `a^T M b` on the spatial parts of two tuples.
    pub fn bilinear(&self, a: &Tuple4D, b: &Tuple4D) -> f64 {
        a.dot(&(*self * *b))
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|x| x.is_finite())
    }
}

impl Mul<Tuple4D> for Matrix3D {
    type Output = Tuple4D;

    /// Applies the matrix to the spatial part of a tuple; the result is a
    /// vector.
    fn mul(self, t: Tuple4D) -> Tuple4D {
        Tuple4D::vector(
            self[(0, 0)] * t.x + self[(0, 1)] * t.y + self[(0, 2)] * t.z,
            self[(1, 0)] * t.x + self[(1, 1)] * t.y + self[(1, 2)] * t.z,
            self[(2, 0)] * t.x + self[(2, 1)] * t.y + self[(2, 2)] * t.z,
        )
    }
}

impl Matrix4D {
    /// Creates a matrix with all elements set to `0.0`.
    pub fn new() -> Matrix4D {
        Matrix4D { data: [0.0; 16] }
    }

    pub fn identity() -> Matrix4D {
        let mut buf = [0.0; 16];
        buf[0] = 1.0; buf[5] = 1.0; buf[10] = 1.0; buf[15] = 1.0;

        Matrix4D { data: buf }
    }

    pub fn translation(x: f64, y: f64, z: f64) -> Matrix4D {
        let mut trans = Self::identity();
        trans[(0, 3)] = x;
        trans[(1, 3)] = y;
        trans[(2, 3)] = z;

        trans
    }

    /// Translation moving the origin onto `p`.
    pub fn translation_to(p: Tuple4D) -> Matrix4D {
        Self::translation(p.x, p.y, p.z)
    }

    pub fn scaling(x: f64, y: f64, z: f64) -> Matrix4D {
        let mut scale = Self::identity();
        scale[(0, 0)] = x;
        scale[(1, 1)] = y;
        scale[(2, 2)] = z;

        scale
    }

    /// Rotation about the X axis by `r` radians.
    pub fn rotation_x(r: f64) -> Matrix4D {
        let mut rotate = Self::identity();
        rotate[(1, 1)] =  r.cos();
        rotate[(1, 2)] = -r.sin();
        rotate[(2, 1)] =  r.sin();
        rotate[(2, 2)] =  r.cos();

        rotate
    }

    /// Rotation about the Y axis by `r` radians.
    pub fn rotation_y(r: f64) -> Matrix4D {
        let mut rotate = Self::identity();
        rotate[(0, 0)] =  r.cos();
        rotate[(0, 2)] =  r.sin();
        rotate[(2, 0)] = -r.sin();
        rotate[(2, 2)] =  r.cos();

        rotate
    }

    /// Rotation about the Z axis by `r` radians.
    pub fn rotation_z(r: f64) -> Matrix4D {
        let mut rotate = Self::identity();
        rotate[(0, 0)] =  r.cos();
        rotate[(0, 1)] = -r.sin();
        rotate[(1, 0)] =  r.sin();
        rotate[(1, 1)] =  r.cos();

        rotate
    }

    /// A matrix whose first three columns are the given vectors.
    pub fn from_columns(x: Tuple4D, y: Tuple4D, z: Tuple4D) -> Matrix4D {
        let mut m = Self::identity();
        for (c, v) in [x, y, z].iter().enumerate() {
            m[(0, c)] = v.x;
            m[(1, c)] = v.y;
            m[(2, c)] = v.z;
        }

        m
    }

    /// A rotation taking the +Y axis onto `direction`.
    ///
    /// Unit primitives in `Shape` are built around the Y axis (the plane's
    /// normal, the cylinder's axis), so this is how they get oriented.
    pub fn orient_y(direction: Tuple4D) -> Matrix4D {
        let y = direction.normalize();
        let x = y.perpendicular();
        let z = x.cross(&y);

        Self::from_columns(x, y, z)
    }

    /// The transform of a camera at `from` looking towards `to`.
    pub fn view_transform(from: Tuple4D, to: Tuple4D, up: Tuple4D) -> Matrix4D {
        let forward = (to - from).normalize();
        let left = forward.cross(&up.normalize());
        let true_up = left.cross(&forward);

        let mut orientation = Matrix4D::identity();
        for (c, (l, u, f)) in [(left.x, true_up.x, forward.x),
                               (left.y, true_up.y, forward.y),
                               (left.z, true_up.z, forward.z)].iter().enumerate() {
            orientation[(0, c)] = *l;
            orientation[(1, c)] = *u;
            orientation[(2, c)] = -*f;
        }

        orientation * Matrix4D::translation(-from.x, -from.y, -from.z)
    }

    pub fn transposition(&self) -> Matrix4D {
        let mut t = Matrix4D::new();
        for r in 0..4 {
            for c in 0..4 {
                t[(c, r)] = self[(r, c)];
            }
        }

        t
    }

    /// The 3x3 matrix left after removing `row` and `col`.
    fn submatrix(&self, row: usize, col: usize) -> Matrix3D {
        let mut buf = [0.0; 9];
        let mut count = 0;

        for r in 0..4 {
            for c in 0..4 {
                if !(r == row || c == col) {
                    buf[count] = self[(r, c)];
                    count += 1;
                }
            }
        }

        Matrix3D::from(buf)
    }

    fn cofactor(&self, row: usize, col: usize) -> f64 {
        let m = self.submatrix(row, col).determinant();
        if (row + col) % 2 == 0 { m } else { -m }
    }

    pub fn determinant(&self) -> f64 {
        (0..4).map(|c| self[(0, c)] * self.cofactor(0, c)).sum()
    }

    /// Calculates the inverse of a `Matrix4D`, if it exists.
    pub fn inverse(&self) -> Option<Matrix4D> {
        let det = self.determinant();
        if !det.is_finite() || det == 0.0 {
            return None;
        }

        let mut inv = Matrix4D::new();
        for r in 0..4 {
            for c in 0..4 {
                inv[(c, r)] = self.cofactor(r, c) / det;
            }
        }

        Some(inv)
    }
}

impl Mul<Matrix4D> for Matrix4D {
    type Output = Matrix4D;

    fn mul(self, other: Matrix4D) -> Matrix4D {
        let mut res = Matrix4D::new();

        for r in 0..4 {
            for c in 0..4 {
                res[(r, c)] = (0..4).map(|k| self[(r, k)] * other[(k, c)]).sum();
            }
        }

        res
    }
}

impl Mul<Tuple4D> for Matrix4D {
    type Output = Tuple4D;

    fn mul(self, t: Tuple4D) -> Tuple4D {
        let row = |r: usize| {
            self[(r, 0)] * t.x + self[(r, 1)] * t.y
                + self[(r, 2)] * t.z + self[(r, 3)] * t.w
        };

        Tuple4D { x: row(0), y: row(1), z: row(2), w: row(3) }
    }
}

#[test]
fn multiply_by_inverse() {
    let a = Matrix4D::translation(1.0, -2.0, 3.0)
        * Matrix4D::rotation_x(0.3)
        * Matrix4D::scaling(2.0, 0.5, 4.0);
    let inv = a.inverse().expect("Transform should be invertible.");

    assert_eq!(a * inv, Matrix4D::identity());
}

#[test]
fn singular_matrix_has_no_inverse() {
    let m = Matrix4D::scaling(1.0, 0.0, 1.0);

    assert!(m.inverse().is_none());
}

#[test]
fn translation_leaves_vectors_alone() {
    let m = Matrix4D::translation(5.0, -3.0, 2.0);
    let v = Tuple4D::vector(-3.0, 4.0, 5.0);

    assert_eq!(m * v, v);
    assert_eq!(m * Tuple4D::point(-3.0, 4.0, 5.0), Tuple4D::point(2.0, 1.0, 7.0));
}

#[test]
fn rotate_point_about_z() {
    let point = Tuple4D::point(0.0, 1.0, 0.0);
    let m = Matrix4D::rotation_z(std::f64::consts::PI / 2.0);

    assert_eq!(m * point, Tuple4D::point(-1.0, 0.0, 0.0));
}

#[test]
fn orient_y_maps_y_axis_onto_direction() {
    let d = Tuple4D::vector(1.0, 2.0, -2.0).normalize();
    let m = Matrix4D::orient_y(d);

    assert_eq!(m * Tuple4D::vector(0.0, 1.0, 0.0), d);
    assert!(feq(m.determinant(), 1.0));
}

#[test]
fn metric_inverse() {
    let g = Matrix3D::from([
        2.0, 0.5, 0.0,
        0.5, 1.0, 0.0,
        0.0, 0.0, 3.0,
    ]);
    let inv = g.inverse().expect("Metric should be invertible.");
    let v = Tuple4D::vector(1.0, -2.0, 0.5);

    assert_eq!(inv * (g * v), v);
}

#[test]
fn isotropic_metric_is_positive_definite() {
    let g = Matrix3D::isotropic(1.5);

    assert!(g.is_symmetric());
    assert!(g.is_positive_definite());
    assert!(feq(g.determinant(), 1.5f64.powi(6)));
}

#[test]
fn indefinite_metric_is_rejected() {
    let g = Matrix3D::diagonal(1.0, -1.0, 1.0);

    assert!(!g.is_positive_definite());
}

#[test]
fn view_along_positive_z_mirrors() {
    let from = Tuple4D::point(0.0, 0.0, 0.0);
    let to = Tuple4D::point(0.0, 0.0, 1.0);
    let up = Tuple4D::vector(0.0, 1.0, 0.0);

    assert_eq!(Matrix4D::view_transform(from, to, up),
        Matrix4D::scaling(-1.0, 1.0, -1.0));
}
