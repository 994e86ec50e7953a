use crate::error::{ OpticsError, Result };
use crate::matrix::Matrix3D;
use crate::physics::{ VoxelPhysics, Medium, Crossing };
use crate::refraction::{ metric_snell, Transmission };
use crate::tuple::Tuple4D;
use crate::voxellation::VoxelIndex;

/// A validated metric tensor together with its inverse.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Metric {
    pub tensor: Matrix3D,
    pub inverse: Matrix3D,
}

impl Metric {
    /// Checks that `tensor` describes a physical medium: finite, symmetric
    /// and positive definite.
    pub fn new(tensor: Matrix3D) -> Result<Metric> {
        if !tensor.is_finite() {
            return Err(OpticsError::DegenerateTensor(
                format!("non-finite entries in {:?}", tensor)
            ));
        }

        if !tensor.is_symmetric() {
            return Err(OpticsError::DegenerateTensor(
                format!("{:?} is not symmetric", tensor)
            ));
        }

        if !tensor.is_positive_definite() {
            return Err(OpticsError::DegenerateTensor(
                format!("{:?} is not positive definite", tensor)
            ));
        }

        let inverse = tensor.inverse().ok_or_else(||
            OpticsError::DegenerateTensor(format!("{:?} is singular", tensor))
        )?;

        Ok(Metric { tensor, inverse })
    }

    /// The metric of an isotropic medium with refractive index `n`.
    pub fn isotropic(n: f64) -> Result<Metric> {
        Metric::new(Matrix3D::isotropic(n))
    }

    /// The refractive index seen by a ray travelling along `direction`.
    pub fn index_along(&self, direction: &Tuple4D) -> f64 {
        self.tensor.bilinear(direction, direction).sqrt()
    }
}

/// A medium whose optics are given by a 3x3 metric tensor per voxel.
///
/// The isotropic tensor `n^2 I` behaves exactly like a `Refractor` voxel of
/// index `n`; anything else is direction dependent.
pub struct MetricMedium<F> {
    tensor: F,
    surrounding: Metric,
    pub transmission: Transmission,
}

impl<F> MetricMedium<F>
    where F: Fn(&VoxelIndex) -> Result<Matrix3D> + Send + Sync {
    /// Fails if the surrounding tensor is degenerate.
    pub fn new(tensor: F, surrounding: Matrix3D) -> Result<MetricMedium<F>> {
        Ok(MetricMedium {
            tensor,
            surrounding: Metric::new(surrounding)?,
            transmission: Default::default(),
        })
    }

    pub fn with_transmission(mut self, transmission: Transmission)
        -> MetricMedium<F> {
        self.transmission = transmission;
        self
    }

    fn metric_of<'p>(&'p self, medium: Medium<'p, Metric>) -> &'p Metric {
        match medium {
            Medium::Surroundings => &self.surrounding,
            Medium::Voxel(m) => m,
        }
    }
}

impl<F> VoxelPhysics for MetricMedium<F>
    where F: Fn(&VoxelIndex) -> Result<Matrix3D> + Send + Sync {
    type Parameters = Metric;

    fn parameters_for(&self, index: &VoxelIndex) -> Result<Metric> {
        Metric::new((self.tensor)(index)?)
    }

    fn on_crossing(&self, direction: Tuple4D, normal: Tuple4D,
        before: Medium<Metric>, after: Medium<Metric>) -> Crossing {
        let g1 = self.metric_of(before);
        let g2 = self.metric_of(after);

        let refracted = metric_snell(direction, normal, &g1.tensor, &g2.inverse);

        let n1 = g1.index_along(&direction);
        let n2 = g2.index_along(&refracted.unwrap_or(direction));
        let transmission = self.transmission.coefficient(direction, normal, n1, n2);

        Crossing::resolve(refracted, direction, normal, transmission)
    }
}

#[test]
fn asymmetric_tensor_is_degenerate() {
    let g = Matrix3D::from([
        1.0, 0.2, 0.0,
        0.0, 1.0, 0.0,
        0.0, 0.0, 1.0,
    ]);

    match Metric::new(g) {
        Err(OpticsError::DegenerateTensor(_)) => (),
        other => panic!("Expected a degenerate tensor, got {:?}", other),
    }
}

#[test]
fn indefinite_tensor_is_degenerate() {
    let m = MetricMedium::new(
        crate::physics::uniform(Matrix3D::diagonal(1.0, -1.0, 1.0)),
        Matrix3D::identity()
    ).unwrap();

    assert!(m.parameters_for(&VoxelIndex(vec![0])).is_err());
    assert!(MetricMedium::new(
        crate::physics::uniform(Matrix3D::identity()), Matrix3D::zero()
    ).is_err());
}

#[test]
fn isotropic_metric_index_is_direction_independent() {
    let m = Metric::isotropic(1.5).unwrap();

    assert!(crate::feq(m.index_along(&Tuple4D::vector(1.0, 0.0, 0.0)), 1.5));
    assert!(crate::feq(
        m.index_along(&Tuple4D::vector(1.0, 1.0, 1.0).normalize()), 1.5
    ));
}

#[test]
fn metric_crossing_reflects_beyond_critical_angle() {
    let m = MetricMedium::new(
        crate::physics::uniform(Matrix3D::isotropic(1.5)),
        Matrix3D::identity()
    ).unwrap();
    let inside = Metric::isotropic(1.5).unwrap();
    let d = Tuple4D::vector(1.0, 0.0, 1.0).normalize();
    let n = Tuple4D::vector(0.0, 0.0, 1.0);

    assert_eq!(
        m.on_exit(d, n, &inside),
        Crossing::TotalInternalReflection(
            Tuple4D::vector(1.0, 0.0, -1.0).normalize()
        )
    );
}

#[test]
fn metric_crossing_matches_scalar_snell() {
    let m = MetricMedium::new(
        crate::physics::uniform(Matrix3D::isotropic(1.3)),
        Matrix3D::identity()
    ).unwrap()
        .with_transmission(Transmission::Schlick);
    let inside = Metric::isotropic(1.3).unwrap();
    let d = Tuple4D::vector(0.4, 0.1, 1.0).normalize();
    let n = Tuple4D::vector(0.0, 0.0, 1.0);

    let expected = crate::refraction::snell(d, n, 1.0, 1.3).unwrap();
    let expected_t = Transmission::Schlick.coefficient(d, n, 1.0, 1.3);

    match m.on_crossing(d, n, Medium::Surroundings, Medium::Voxel(&inside)) {
        Crossing::Refracted { direction, transmission } => {
            assert_eq!(direction, expected);
            assert!(crate::feq(transmission, expected_t));
        },
        other => panic!("Expected refraction, got {:?}", other),
    }
}
