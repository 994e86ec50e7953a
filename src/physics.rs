//! The capability a voxellated volume is parametrized over.
//!
//! A `VoxelPhysics` implementation decides what a ray does inside a voxel and
//! at every surface it crosses; the traversal itself lives in `volume`. The
//! four implementations are `Absorber`, `Refractor`, `MetricMedium` and
//! `ComponentArray`.

use std::convert::TryFrom;

use serde::{ Serialize, Deserialize };

use crate::color::Color;
use crate::component::Component;
use crate::error::{ OpticsError, Result };
use crate::refraction::mirror;
use crate::tuple::Tuple4D;
use crate::voxellation::VoxelIndex;

/// Which side of a crossing a medium is on.
#[derive(Debug, PartialEq)]
pub enum Medium<'p, P> {
    /// Whatever is outside the volume's boundary.
    Surroundings,

    /// A voxel, by its optical parameters.
    Voxel(&'p P),
}

// Derived impls would demand `P: Clone`/`P: Copy`.
impl<'p, P> Clone for Medium<'p, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'p, P> Copy for Medium<'p, P> { }

/// What happens to a ray at a surface.
#[derive(Clone, Debug, PartialEq)]
pub enum Crossing {
    /// The ray continues into the next medium with a new direction, losing
    /// all but `transmission` of its light.
    Refracted { direction: Tuple4D, transmission: f64 },

    /// No refracted solution exists; the ray stays on its side with the
    /// mirrored direction.
    TotalInternalReflection(Tuple4D),

    /// The law could not be evaluated; the ray is abandoned.
    Failure(OpticsError),
}

impl Crossing {
    /// Passes straight through without loss.
    pub fn straight(direction: Tuple4D) -> Crossing {
        Crossing::Refracted { direction, transmission: 1.0 }
    }

    /// Wraps the result of an interface law, reflecting when it has no
    /// refracted solution.
    pub fn resolve(refracted: Option<Tuple4D>, direction: Tuple4D,
        normal: Tuple4D, transmission: f64) -> Crossing {
        match refracted {
            Some(d) => Crossing::Refracted { direction: d, transmission },
            None => Crossing::TotalInternalReflection(mirror(direction, normal)),
        }
    }
}

/// Per-voxel optical behaviour.
///
/// Implementations are shared by every ray of a render and must not keep
/// per-call state; any per-voxel data comes out of `parameters_for`, which
/// has to return the same parameters for the same index for the whole trace.
///
/// All methods taking a `normal` expect it oriented along the direction of
/// travel (from `before` into `after`).
pub trait VoxelPhysics: Send + Sync {
    type Parameters;

    /// The optical parameters of voxel `index`.
    fn parameters_for(&self, index: &VoxelIndex) -> Result<Self::Parameters>;

    /// The law applied where a ray crosses from `before` into `after`.
    fn on_crossing(&self, direction: Tuple4D, normal: Tuple4D,
        before: Medium<Self::Parameters>, after: Medium<Self::Parameters>)
        -> Crossing;

    /// The law applied where the ray reaches the boundary from inside the
    /// voxel with parameters `inside`.
    fn on_exit(&self, direction: Tuple4D, normal: Tuple4D,
        inside: &Self::Parameters) -> Crossing {
        self.on_crossing(direction, normal, Medium::Voxel(inside),
            Medium::Surroundings)
    }

    /// The per-channel transmission of a straight path of length `distance`
    /// through a voxel.
    fn on_traverse(&self, _parameters: &Self::Parameters, _distance: f64)
        -> Color {
        Color::white()
    }

    /// An optical component embedded in the voxel, if there is one.
    fn component<'p>(&self, _parameters: &'p Self::Parameters)
        -> Option<&'p Component> {
        None
    }
}

/// A parameter function which gives every voxel the same value.
///
/// Uniform media have to be asked for explicitly; no strategy falls back to
/// a default on its own.
pub fn uniform<P>(value: P) -> impl Fn(&VoxelIndex) -> Result<P> + Send + Sync
    where P: Clone + Send + Sync {
    move |_: &VoxelIndex| Ok(value.clone())
}

/// Per-voxel parameters as data, for volumes described in scene files.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterRule<T> {
    /// The same value everywhere.
    Uniform(T),

    /// Alternates with the parity of the sum of the index components.
    Checker { even: T, odd: T },

    /// A table along one family: voxel `first + i` of that family gets
    /// `values[i]`. Voxels outside the table are not configured.
    Layered { family: usize, first: i64, values: Vec<T> },
}

impl<T: Clone> ParameterRule<T> {
    pub fn evaluate(&self, index: &VoxelIndex) -> Result<T> {
        match self {
            ParameterRule::Uniform(value) => Ok(value.clone()),
            ParameterRule::Checker { even, odd } => {
                if index.sum().rem_euclid(2) == 0 {
                    Ok(even.clone())
                } else {
                    Ok(odd.clone())
                }
            },
            ParameterRule::Layered { family, first, values } => {
                index.along(*family)
                    .and_then(|k| usize::try_from(k - first).ok())
                    .and_then(|i| values.get(i))
                    .cloned()
                    .ok_or_else(|| OpticsError::NotConfigured(index.clone()))
            },
        }
    }
}

impl<T: Clone + Send + Sync> ParameterRule<T> {
    /// The rule as a parameter function.
    pub fn into_fn(self) -> impl Fn(&VoxelIndex) -> Result<T> + Send + Sync {
        move |index: &VoxelIndex| self.evaluate(index)
    }
}

#[test]
fn resolve_reflects_missing_solutions() {
    let d = Tuple4D::vector(0.0, 1.0, 1.0).normalize();
    let n = Tuple4D::vector(0.0, 0.0, 1.0);

    assert_eq!(
        Crossing::resolve(None, d, n, 0.5),
        Crossing::TotalInternalReflection(
            Tuple4D::vector(0.0, 1.0, -1.0).normalize()
        )
    );
    assert_eq!(
        Crossing::resolve(Some(d), d, n, 0.5),
        Crossing::Refracted { direction: d, transmission: 0.5 }
    );
}

#[test]
fn uniform_parameters_ignore_the_index() {
    let f = uniform(1.5);

    assert_eq!(f(&VoxelIndex(vec![0, 3])), Ok(1.5));
    assert_eq!(f(&VoxelIndex(vec![-7])), Ok(1.5));
}

#[test]
fn checker_alternates_with_parity() {
    let rule = ParameterRule::Checker { even: 1.0, odd: 2.0 };

    assert_eq!(rule.evaluate(&VoxelIndex(vec![0, 0])), Ok(1.0));
    assert_eq!(rule.evaluate(&VoxelIndex(vec![1, 0])), Ok(2.0));
    assert_eq!(rule.evaluate(&VoxelIndex(vec![-1, 0])), Ok(2.0));
    assert_eq!(rule.evaluate(&VoxelIndex(vec![-1, 3])), Ok(1.0));
}

#[test]
fn layers_outside_the_table_are_not_configured() {
    let rule = ParameterRule::Layered { family: 1, first: -1, values: vec![1.0, 1.5] }
        .into_fn();

    assert_eq!(rule(&VoxelIndex(vec![7, -1])), Ok(1.0));
    assert_eq!(rule(&VoxelIndex(vec![7, 0])), Ok(1.5));
    assert_eq!(
        rule(&VoxelIndex(vec![7, 1])),
        Err(OpticsError::NotConfigured(VoxelIndex(vec![7, 1])))
    );
    assert_eq!(
        rule(&VoxelIndex(vec![7, -2])),
        Err(OpticsError::NotConfigured(VoxelIndex(vec![7, -2])))
    );
}

#[test]
fn rules_read_from_json() {
    let rule: ParameterRule<f64> = serde_json::from_str(
        r#"{ "checker": { "even": 1.0, "odd": 1.5 } }"#
    ).unwrap();

    assert_eq!(rule, ParameterRule::Checker { even: 1.0, odd: 1.5 });
}
