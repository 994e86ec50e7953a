// Runtime parameters
pub const NUM_THREADS: usize = 4;
pub const OUT_FILE: &'static str = "./out.ppm";

// Floating point comparisons
pub const FEQ_EPSILON: f64 = 0.0001;

// Rays are nudged by this much along their direction before asking the
// voxellations where they are.
pub const NUDGE_EPSILON: f64 = 1.0e-6;

// Intersections closer than this to the ray origin are ignored.
pub const HIT_EPSILON: f64 = 1.0e-7;

// Intersections with the surface just departed are ignored up to this offset.
pub const DEPARTED_EPSILON: f64 = 1.0e-5;

// Budgets
pub const RECURSION_DEPTH: usize = 10;
pub const STEP_BUDGET: usize = 1000;
