pub mod consts;
pub mod error;

pub mod tuple;
pub mod matrix;
pub mod ray;
pub mod color;

pub mod shape;
pub mod intersect;

pub mod voxellation;
pub mod local_scene;
pub mod refraction;

pub mod physics;
pub mod absorber;
pub mod refractor;
pub mod metric;
pub mod component;
pub mod volume;

pub mod world;
pub mod camera;
pub mod canvas;
pub mod parallel;
pub mod scene;

use consts::FEQ_EPSILON;

/// Approximate equality for floating point values.
pub fn feq(left: f64, right: f64) -> bool {
    (left - right).abs() < FEQ_EPSILON
}
