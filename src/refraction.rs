//! Interface laws shared by the voxel physics.
//!
//! Every function here takes the surface normal oriented *along* the
//! direction of travel, i.e. pointing from the medium being left into the
//! medium being entered (`direction.dot(normal) > 0`). A `None` result means
//! the refracted wave is evanescent: the caller reflects instead.

use serde::{ Serialize, Deserialize };

use crate::feq;
use crate::tuple::Tuple4D;
use crate::matrix::Matrix3D;

/// Vector form of Snell's law for scalar indices `n1` (left) and `n2`
/// (entered).
pub fn snell(direction: Tuple4D, normal: Tuple4D, n1: f64, n2: f64)
    -> Option<Tuple4D> {
    let ratio = n1 / n2;
    let cos_i = direction.dot(&normal);
    let sin2_t = ratio.powi(2) * (1.0 - cos_i.powi(2));

    if sin2_t > 1.0 {
        return None;
    }

    let cos_t = (1.0 - sin2_t).sqrt();
    let refracted = direction * ratio + normal * (cos_t - ratio * cos_i);

    Some(refracted.normalize())
}

/// Generalized Snell's law between two media described by metric tensors.
///
/// The ray's momentum `p = g d / sqrt(d^T g d)` keeps its components
/// tangential to the interface; the normal component `kappa` is chosen so that
/// the new momentum satisfies the dispersion relation `p^T g2^-1 p = 1` of
/// the entered medium, on the root whose ray direction `g2^-1 p` continues
/// across the interface. For `g = n^2 I` this is exactly `snell`.
///
/// `g2_inverse` is the inverse metric of the entered medium.
pub fn metric_snell(direction: Tuple4D, normal: Tuple4D, g1: &Matrix3D,
    g2_inverse: &Matrix3D) -> Option<Tuple4D> {
    let norm = g1.bilinear(&direction, &direction);
    if !(norm > 0.0) {
        return None;
    }

    let p1 = (*g1 * direction) * (1.0 / norm.sqrt());

    let a = g2_inverse.bilinear(&normal, &normal);
    let b = 2.0 * g2_inverse.bilinear(&normal, &p1);
    let c = g2_inverse.bilinear(&p1, &p1) - 1.0;

    let discriminant = b.powi(2) - 4.0 * a * c;
    if discriminant < 0.0 || !(a > 0.0) {
        return None;
    }

    let kappa = (-b + discriminant.sqrt()) / (2.0 * a);
    let p2 = p1 + normal * kappa;

    let refracted = (*g2_inverse * p2).normalize();
    if refracted.is_finite() { Some(refracted) } else { None }
}

/// Mirror reflection of `direction` about the surface.
pub fn mirror(direction: Tuple4D, normal: Tuple4D) -> Tuple4D {
    direction.reflect(&normal).normalize()
}

/// Fraction of light reflected at an interface, Schlick's approximation.
pub fn schlick(direction: Tuple4D, normal: Tuple4D, n1: f64, n2: f64) -> f64 {
    let mut cos = direction.dot(&normal).abs();

    // Total internal reflection can only occur if n1 > n2.
    if n1 > n2 {
        let n = n1 / n2;
        let sin2_t = n.powi(2) * (1.0 - cos.powi(2));
        if sin2_t > 1.0 {
            return 1.0;
        }

        cos = (1.0 - sin2_t).sqrt();
    }

    let r0 = ((n1 - n2) / (n1 + n2)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cos).powi(5)
}

/// How much light an interface lets through.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transmission {
    /// A fixed coefficient, applied wherever the index actually changes.
    Constant(f64),

    /// Fresnel transmission `1 - R`, with `R` from `schlick`.
    Schlick,
}

impl Default for Transmission {
    fn default() -> Transmission {
        Transmission::Constant(1.0)
    }
}

impl Transmission {
    pub fn coefficient(&self, direction: Tuple4D, normal: Tuple4D, n1: f64,
        n2: f64) -> f64 {
        if feq(n1, n2) {
            return 1.0;
        }

        match *self {
            Transmission::Constant(t) => t,
            Transmission::Schlick => 1.0 - schlick(direction, normal, n1, n2),
        }
    }
}

#[test]
fn normal_incidence_is_undeviated() {
    let d = Tuple4D::vector(0.0, 0.0, 1.0);

    assert_eq!(snell(d, d, 1.0, 1.5), Some(d));
    assert_eq!(snell(d, d, 1.5, 1.0), Some(d));
}

#[test]
fn snell_preserves_tangential_momentum() {
    let d = Tuple4D::vector(1.0, 0.0, 1.0).normalize();
    let n = Tuple4D::vector(0.0, 0.0, 1.0);
    let t = snell(d, n, 1.0, 1.5).expect("Entering glass never reflects.");

    assert!(feq(1.0 * d.x, 1.5 * t.x));
    assert!(t.z > 0.0);
    assert!(feq(t.magnitude(), 1.0));
}

#[test]
fn beyond_critical_angle_is_evanescent() {
    let d = Tuple4D::vector(1.0, 0.0, 1.0).normalize();
    let n = Tuple4D::vector(0.0, 0.0, 1.0);

    // Critical angle for 1.5 -> 1.0 is about 41.8 degrees.
    assert_eq!(snell(d, n, 1.5, 1.0), None);
}

#[test]
fn isotropic_metric_matches_snell() {
    let d = Tuple4D::vector(0.3, -0.4, 1.0).normalize();
    let n = Tuple4D::vector(0.0, 0.0, 1.0);
    let g1 = Matrix3D::isotropic(1.2);
    let g2_inv = Matrix3D::isotropic(1.7).inverse().unwrap();

    assert_eq!(metric_snell(d, n, &g1, &g2_inv), snell(d, n, 1.2, 1.7));
}

#[test]
fn isotropic_metric_detects_evanescence() {
    let d = Tuple4D::vector(1.0, 0.0, 1.0).normalize();
    let n = Tuple4D::vector(0.0, 0.0, 1.0);
    let g1 = Matrix3D::isotropic(1.5);
    let g2_inv = Matrix3D::isotropic(1.0).inverse().unwrap();

    assert_eq!(metric_snell(d, n, &g1, &g2_inv), None);
}

#[test]
fn anisotropic_metric_bends_normal_incidence() {
    // A metric with off-diagonal terms turns a normally incident ray.
    let d = Tuple4D::vector(0.0, 0.0, 1.0);
    let g1 = Matrix3D::identity();
    let g2 = Matrix3D::from([
        2.0, 0.0, 0.5,
        0.0, 2.0, 0.0,
        0.5, 0.0, 2.0,
    ]);
    let t = metric_snell(d, d, &g1, &g2.inverse().unwrap()).unwrap();

    assert!(t.is_finite());
    assert!(t.z > 0.0);
    assert!(t.x.abs() > 1.0e-3);
}

#[test]
fn mirror_flips_normal_component() {
    let d = Tuple4D::vector(1.0, 0.0, 1.0).normalize();
    let n = Tuple4D::vector(0.0, 0.0, 1.0);

    assert_eq!(mirror(d, n), Tuple4D::vector(1.0, 0.0, -1.0).normalize());
}

#[test]
fn schlick_under_total_internal_reflection() {
    let d = Tuple4D::vector(1.0, 0.0, 1.0).normalize();
    let n = Tuple4D::vector(0.0, 0.0, 1.0);

    assert_eq!(schlick(d, n, 1.5, 1.0), 1.0);
}

#[test]
fn schlick_at_normal_incidence() {
    let d = Tuple4D::vector(0.0, 0.0, 1.0);

    assert!(feq(schlick(d, d, 1.0, 1.5), 0.04));
    assert!(feq(Transmission::Schlick.coefficient(d, d, 1.0, 1.5), 0.96));
}

#[test]
fn constant_transmission_skips_index_matched_interfaces() {
    let d = Tuple4D::vector(0.0, 0.0, 1.0);
    let t = Transmission::Constant(0.9);

    assert_eq!(t.coefficient(d, d, 1.33, 1.33), 1.0);
    assert_eq!(t.coefficient(d, d, 1.0, 1.33), 0.9);
}
