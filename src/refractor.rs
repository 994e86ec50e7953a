use crate::error::{ OpticsError, Result };
use crate::physics::{ VoxelPhysics, Medium, Crossing };
use crate::refraction::{ snell, Transmission };
use crate::tuple::Tuple4D;
use crate::voxellation::VoxelIndex;

/// A piecewise-homogeneous medium with a scalar refractive index per voxel.
///
/// Every crossing, including the boundary, applies Snell's law with the
/// indices on either side. Beyond the critical angle the ray is mirrored and
/// stays where it is.
pub struct Refractor<F> {
    index: F,

    /// The refractive index outside the boundary.
    pub surrounding_index: f64,

    pub transmission: Transmission,
}

impl<F> Refractor<F>
    where F: Fn(&VoxelIndex) -> Result<f64> + Send + Sync {
    pub fn new(index: F, surrounding_index: f64) -> Refractor<F> {
        Refractor {
            index,
            surrounding_index,
            transmission: Default::default(),
        }
    }

    pub fn with_transmission(mut self, transmission: Transmission)
        -> Refractor<F> {
        self.transmission = transmission;
        self
    }

    fn index_of(&self, medium: Medium<f64>) -> f64 {
        match medium {
            Medium::Surroundings => self.surrounding_index,
            Medium::Voxel(n) => *n,
        }
    }
}

impl<F> VoxelPhysics for Refractor<F>
    where F: Fn(&VoxelIndex) -> Result<f64> + Send + Sync {
    type Parameters = f64;

    fn parameters_for(&self, index: &VoxelIndex) -> Result<f64> {
        let n = (self.index)(index)?;
        if !(n.is_finite() && n > 0.0) {
            return Err(OpticsError::InvalidParameter(
                format!("refractive index {} in voxel {}", n, index)
            ));
        }

        Ok(n)
    }

    fn on_crossing(&self, direction: Tuple4D, normal: Tuple4D,
        before: Medium<f64>, after: Medium<f64>) -> Crossing {
        let n1 = self.index_of(before);
        let n2 = self.index_of(after);

        let refracted = snell(direction, normal, n1, n2);
        let transmission = self.transmission.coefficient(direction, normal, n1, n2);

        Crossing::resolve(refracted, direction, normal, transmission)
    }
}

#[test]
fn matched_indices_pass_straight() {
    let r = Refractor::new(crate::physics::uniform(1.33), 1.33)
        .with_transmission(Transmission::Constant(0.5));
    let d = Tuple4D::vector(0.5, 0.0, 1.0).normalize();
    let n = Tuple4D::vector(0.0, 0.0, 1.0);

    assert_eq!(
        r.on_crossing(d, n, Medium::Surroundings, Medium::Voxel(&1.33)),
        Crossing::straight(d)
    );
}

#[test]
fn grazing_exit_from_dense_voxel_reflects() {
    let r = Refractor::new(crate::physics::uniform(2.0), 1.0);
    let d = Tuple4D::vector(1.0, 0.0, 1.0).normalize();
    let n = Tuple4D::vector(0.0, 0.0, 1.0);

    match r.on_exit(d, n, &2.0) {
        Crossing::TotalInternalReflection(reflected) => {
            assert!(reflected.is_finite());
            assert_eq!(reflected, Tuple4D::vector(1.0, 0.0, -1.0).normalize());
        },
        other => panic!("Expected total internal reflection, got {:?}", other),
    }
}

#[test]
fn crossing_between_voxels_uses_both_indices() {
    let r = Refractor::new(crate::physics::uniform(1.0), 1.0)
        .with_transmission(Transmission::Constant(0.9));
    let d = Tuple4D::vector(1.0, 0.0, 1.0).normalize();
    let n = Tuple4D::vector(0.0, 0.0, 1.0);

    match r.on_crossing(d, n, Medium::Voxel(&1.0), Medium::Voxel(&1.5)) {
        Crossing::Refracted { direction, transmission } => {
            assert!(crate::feq(d.x, 1.5 * direction.x));
            assert_eq!(transmission, 0.9);
        },
        other => panic!("Expected refraction, got {:?}", other),
    }
}

#[test]
fn non_positive_index_is_rejected() {
    let r = Refractor::new(|_: &VoxelIndex| Ok(-1.0), 1.0);

    assert!(r.parameters_for(&VoxelIndex(vec![0])).is_err());
}
