use crate::color::Color;
use crate::error::{ OpticsError, Result };
use crate::physics::{ VoxelPhysics, Medium, Crossing };
use crate::tuple::Tuple4D;
use crate::voxellation::VoxelIndex;

/// Beer-Lambert absorption.
///
/// Every voxel has one absorption coefficient per color channel (stored in a
/// `Color`); light crossing a voxel over a distance `d` is multiplied by
/// `exp(-alpha * d)` channel by channel. Rays are never deflected, and the
/// attenuation over a path is the same however finely it is subdivided.
pub struct Absorber<F> {
    coefficients: F,
}

impl<F> Absorber<F>
    where F: Fn(&VoxelIndex) -> Result<Color> + Send + Sync {
    pub fn new(coefficients: F) -> Absorber<F> {
        Absorber { coefficients }
    }
}

impl<F> VoxelPhysics for Absorber<F>
    where F: Fn(&VoxelIndex) -> Result<Color> + Send + Sync {
    type Parameters = Color;

    fn parameters_for(&self, index: &VoxelIndex) -> Result<Color> {
        let alpha = (self.coefficients)(index)?;

        // Negative absorption would amplify light without bound.
        if !alpha.is_finite() || alpha.r < 0.0 || alpha.g < 0.0 || alpha.b < 0.0 {
            return Err(OpticsError::InvalidParameter(
                format!("absorption coefficients {:?} in voxel {}", alpha, index)
            ));
        }

        Ok(alpha)
    }

    fn on_crossing(&self, direction: Tuple4D, _normal: Tuple4D,
        _before: Medium<Color>, _after: Medium<Color>) -> Crossing {
        Crossing::straight(direction)
    }

    fn on_traverse(&self, alpha: &Color, distance: f64) -> Color {
        alpha.beer_lambert(distance)
    }
}

#[test]
fn absorber_never_deflects() {
    let a = Absorber::new(crate::physics::uniform(Color::rgb(1.0, 2.0, 3.0)));
    let d = Tuple4D::vector(0.2, 0.3, 1.0).normalize();
    let n = Tuple4D::vector(0.0, 0.0, 1.0);
    let alpha = Color::rgb(1.0, 2.0, 3.0);

    assert_eq!(
        a.on_crossing(d, n, Medium::Surroundings, Medium::Voxel(&alpha)),
        Crossing::straight(d)
    );
    assert_eq!(a.on_exit(d, n, &alpha), Crossing::straight(d));
}

#[test]
fn absorber_attenuates_per_channel() {
    let a = Absorber::new(crate::physics::uniform(Color::black()));
    let alpha = Color::rgb(0.0, 1.0, 2.0);

    assert_eq!(
        a.on_traverse(&alpha, 0.5),
        Color::rgb(1.0, (-0.5f64).exp(), (-1.0f64).exp())
    );
}

#[test]
fn negative_absorption_is_rejected() {
    let a = Absorber::new(|index: &VoxelIndex| {
        if index.sum() > 0 {
            Ok(Color::rgb(0.1, -0.1, 0.1))
        } else {
            Ok(Color::black())
        }
    });

    assert!(a.parameters_for(&VoxelIndex(vec![0])).is_ok());
    assert!(a.parameters_for(&VoxelIndex(vec![1])).is_err());
}
