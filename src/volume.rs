//! Voxellated volumes: a boundary surface whose inside is divided into voxels
//! by one or more voxellations, with a `VoxelPhysics` deciding what happens in
//! each voxel.
//!
//! Tracing is an explicit loop over steps. Every step asks the voxellations
//! which voxel lies ahead of the ray, builds the small `LocalScene` of surfaces
//! it can hit next, and moves the ray to the closest one. Crossing a dividing
//! surface moves the ray to the neighbouring voxel; hitting the boundary ends
//! the trace. Each step spends one unit of the step budget, so a trace always
//! ends after at most `step_budget` steps.

use log::{ trace, debug, warn };
use serde::{ Serialize, Deserialize };

use crate::color::{ Color, Sentinels };
use crate::component::Component;
use crate::consts::{ STEP_BUDGET, NUDGE_EPSILON, HIT_EPSILON };
use crate::error::{ OpticsError, Result };
use crate::local_scene::{ LocalScene, SurfaceId };
use crate::physics::{ VoxelPhysics, Medium, Crossing };
use crate::ray::{ Ray4D, RayState };
use crate::shape::Shape;
use crate::tuple::Tuple4D;
use crate::voxellation::{ Voxellation, VoxelIndex, voxel_index_at };
use crate::world::Renderer;

/// Per-volume tracing parameters.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeConfig {
    /// Maximum number of steps of one pass through the volume.
    pub step_budget: usize,

    /// Transmission of the boundary as a window, applied on entry and again
    /// on exit.
    pub window_transmission: f64,

    /// How far ahead of the ray the voxellations are asked for the voxel
    /// index, and how far exiting rays are moved off the boundary.
    pub nudge: f64,

    /// Keep every position a ray visits in its `Traversal`.
    pub record_trajectory: bool,

    /// Colors returned for rays abandoned inside the volume.
    pub sentinels: Sentinels,
}

impl Default for VolumeConfig {
    fn default() -> VolumeConfig {
        VolumeConfig {
            step_budget: STEP_BUDGET,
            window_transmission: 1.0,
            nudge: NUDGE_EPSILON,
            record_trajectory: false,
            sentinels: Default::default(),
        }
    }
}

/// How a trace ended.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// The ray left the volume (or was reflected away on entry) and carries
    /// on from the boundary.
    Exited(Ray4D),

    /// The step budget ran out.
    Exhausted,

    /// Nothing was hit from inside the volume.
    Lost,

    /// Parameters or a crossing law could not be evaluated.
    Failed(OpticsError),
}

/// The record of one pass through a volume.
#[derive(Clone, Debug, PartialEq)]
pub struct Traversal {
    pub outcome: Outcome,

    /// What the volume does to the light coming back along the exit ray.
    pub filter: Color,

    pub steps: usize,
    pub path_length: f64,

    /// Every position visited, if the volume records trajectories.
    pub trajectory: Option<Vec<Tuple4D>>,
}

/// The running state of a trace.
struct Walk {
    state: RayState,
    filter: Color,
    steps: usize,
}

/// A volume as seen by a renderer: something with a boundary which, once hit,
/// determines the color coming back along the ray.
pub trait OpticalVolume: Send + Sync {
    fn boundary(&self) -> &Shape;

    /// Follows `ray` through the volume, starting from its hit with the
    /// boundary at offset `boundary_t`.
    fn trace(&self, ray: &Ray4D, boundary_t: f64) -> Traversal;

    /// The color seen along `ray`, recursing into `renderer` once the ray has
    /// left the volume. Never fails: abandoned rays get a sentinel color.
    fn color_at(&self, ray: &Ray4D, boundary_t: f64, renderer: &dyn Renderer,
        depth: usize) -> Color;
}

pub struct VoxellatedVolume<P> {
    boundary: Shape,
    voxellations: Vec<Box<dyn Voxellation>>,
    physics: P,
    pub config: VolumeConfig,
}

impl<P: VoxelPhysics> VoxellatedVolume<P> {
    /// Fails if there is no voxellation; a volume needs at least one family
    /// of dividing surfaces.
    pub fn new(boundary: Shape, voxellations: Vec<Box<dyn Voxellation>>,
        physics: P) -> Result<VoxellatedVolume<P>> {
        if voxellations.is_empty() {
            return Err(OpticsError::InvalidVoxellation(
                "a volume needs at least one voxellation".to_string()
            ));
        }

        Ok(VoxellatedVolume {
            boundary,
            voxellations,
            physics,
            config: Default::default(),
        })
    }

    pub fn with_config(mut self, config: VolumeConfig) -> VoxellatedVolume<P> {
        self.config = config;
        self
    }

    pub fn physics(&self) -> &P {
        &self.physics
    }

    /// The voxel containing `point`.
    pub fn voxel_index_at(&self, point: Tuple4D) -> VoxelIndex {
        voxel_index_at(&self.voxellations, point)
    }

    /// The voxel a ray at `position` travelling along `direction` is about to
    /// enter; a ray sitting on a dividing surface is in the voxel ahead.
    fn index_ahead(&self, position: Tuple4D, direction: Tuple4D) -> VoxelIndex {
        self.voxel_index_at(position + direction * self.config.nudge)
    }

    /// Refracts a ray sitting on the surface of the voxel's component into
    /// it. Components filling their voxel have faces on the boundary and the
    /// dividers, so entering the voxel there also enters the component.
    ///
    /// Returns true if the component reflected the ray.
    fn enter_touching_component(&self, walk: &mut Walk, params: &P::Parameters,
        departed: &mut Vec<SurfaceId>) -> Result<bool> {
        let component = match self.physics.component(params) {
            Some(c) => c,
            None => return Ok(false),
        };

        let touching = component.solid.intersect(&walk.state.ray())
            .intersections
            .iter()
            .any(|i| i.t.abs() < HIT_EPSILON);
        let outward = component.solid.normal_at(walk.state.position);

        if !touching || walk.state.direction.dot(&outward) >= 0.0 {
            return Ok(false);
        }

        trace!("Entering a component face at {:?}", walk.state.position);
        departed.push(SurfaceId::Component);
        cross_component(walk, component, outward)
    }

    /// Runs the traversal loop, leaving the final ray, filter and step count
    /// in `walk`.
    fn walk(&self, ray: &Ray4D, boundary_t: f64, walk: &mut Walk)
        -> Result<Outcome> {
        let window = self.config.window_transmission;

        let start = ray.position(boundary_t);
        let outward = self.boundary.normal_at(start);

        // A ray meeting the boundary on its way out started inside; it is
        // traced from its origin instead.
        let entering = walk.state.direction.dot(&outward) < 0.0;
        if entering {
            walk.state = RayState::new(
                start, walk.state.direction, self.config.record_trajectory
            );
        }

        let mut departed = if entering { vec![SurfaceId::Boundary] } else { Vec::new() };
        let mut index = self.index_ahead(walk.state.position, walk.state.direction);
        let mut params = self.physics.parameters_for(&index)?;

        if entering {
            let d = walk.state.direction;
            match self.physics.on_crossing(d, -outward, Medium::Surroundings, Medium::Voxel(&params)) {
                Crossing::Refracted { direction, transmission } => {
                    walk.filter = walk.filter * (window * transmission);
                    walk.state.redirect(direction);
                },
                Crossing::TotalInternalReflection(reflected) => {
                    debug!("Reflected off the boundary on entry at {:?}", start);
                    return Ok(Outcome::Exited(Ray4D::new(start, reflected)));
                },
                Crossing::Failure(e) => return Err(e),
            }

            if self.enter_touching_component(walk, &params, &mut departed)? {
                debug!("Reflected off a component on entry at {:?}", start);
                return Ok(Outcome::Exited(Ray4D::new(start, walk.state.direction)));
            }
        }

        let mut budget = self.config.step_budget;
        loop {
            if budget == 0 {
                debug!("Step budget of {} exhausted in voxel {}",
                    self.config.step_budget, index);
                return Ok(Outcome::Exhausted);
            }
            budget -= 1;
            walk.steps += 1;

            let ahead = self.index_ahead(walk.state.position, walk.state.direction);
            if ahead != index {
                params = self.physics.parameters_for(&ahead)?;
                index = ahead;
            }

            let hit = {
                let scene = LocalScene::assemble(
                    &self.boundary,
                    &self.voxellations,
                    &index,
                    self.physics.component(&params)
                )?;

                match scene.closest_hit(&walk.state.ray(), &departed) {
                    Some(hit) => hit,
                    None => return Ok(Outcome::Lost),
                }
            };

            trace!("Step {} in voxel {}: {:?} at t = {}",
                walk.steps, index, hit.surface, hit.t);

            walk.filter = walk.filter * self.physics.on_traverse(&params, hit.t);
            walk.state.advance(hit.t);
            departed = vec![hit.surface];

            // A component face lying on the boundary or a divider is left
            // before the surface itself is crossed.
            if let (Some(outward), Some(c)) = (hit.coincident_component, self.physics.component(&params)) {
                if walk.state.direction.dot(&outward) > 0.0 {
                    departed.push(SurfaceId::Component);

                    if cross_component(walk, c, outward)? {
                        trace!("Total internal reflection at a component face on {:?}",
                            hit.surface);
                        continue;
                    }
                }
            }

            let d = walk.state.direction;
            let normal = if d.dot(&hit.normal) < 0.0 { -hit.normal } else { hit.normal };

            match hit.surface {
                SurfaceId::Boundary => {
                    match self.physics.on_exit(d, normal, &params) {
                        Crossing::Refracted { direction, transmission } => {
                            walk.filter = walk.filter * (transmission * window);
                            return Ok(Outcome::Exited(
                                Ray4D::new(walk.state.position, direction)
                            ));
                        },
                        Crossing::TotalInternalReflection(reflected) => {
                            debug!("Total internal reflection at the boundary, {:?}",
                                walk.state.position);
                            walk.state.redirect(reflected);
                            self.enter_touching_component(walk, &params, &mut departed)?;
                        },
                        Crossing::Failure(e) => return Err(e),
                    }
                },
                SurfaceId::Divider { .. } => {
                    let next = self.voxel_index_at(
                        walk.state.position + normal * self.config.nudge
                    );

                    // Coincident dividers from different families can leave
                    // the index unchanged; there is nothing to cross then.
                    if next == index {
                        continue;
                    }

                    let next_params = self.physics.parameters_for(&next)?;
                    let crossing = self.physics.on_crossing(
                        d, normal, Medium::Voxel(&params), Medium::Voxel(&next_params)
                    );

                    match crossing {
                        Crossing::Refracted { direction, transmission } => {
                            walk.filter = walk.filter * transmission;
                            walk.state.redirect(direction);
                            index = next;
                            params = next_params;
                        },
                        Crossing::TotalInternalReflection(reflected) => {
                            debug!("Total internal reflection between {} and {}",
                                index, next);
                            walk.state.redirect(reflected);
                        },
                        Crossing::Failure(e) => return Err(e),
                    }

                    self.enter_touching_component(walk, &params, &mut departed)?;
                },
                SurfaceId::Component => {
                    match self.physics.component(&params) {
                        Some(c) => { cross_component(walk, c, hit.normal)?; },
                        None => return Err(OpticsError::InvalidParameter(
                            format!("voxel {} has no component", index)
                        )),
                    }
                },
            }
        }
    }
}

/// Refracts or reflects the ray at the surface of `component`, `outward`
/// being its outward normal there. Returns true if the ray was reflected.
fn cross_component(walk: &mut Walk, component: &Component, outward: Tuple4D)
    -> Result<bool> {
    match component.refract(walk.state.direction, outward) {
        Crossing::Refracted { direction, transmission } => {
            walk.filter = walk.filter * transmission;
            walk.state.redirect(direction);
            Ok(false)
        },
        Crossing::TotalInternalReflection(reflected) => {
            walk.state.redirect(reflected);
            Ok(true)
        },
        Crossing::Failure(e) => Err(e),
    }
}

impl<P: VoxelPhysics> OpticalVolume for VoxellatedVolume<P> {
    fn boundary(&self) -> &Shape {
        &self.boundary
    }

    fn trace(&self, ray: &Ray4D, boundary_t: f64) -> Traversal {
        let mut walk = Walk {
            state: RayState::new(ray.origin, ray.direction, self.config.record_trajectory),
            filter: Color::white(),
            steps: 0,
        };

        let outcome = self.walk(ray, boundary_t, &mut walk)
            .unwrap_or_else(Outcome::Failed);

        match outcome {
            Outcome::Lost => warn!(
                "Ray lost inside volume at {:?} after {} steps",
                walk.state.position, walk.steps
            ),
            Outcome::Failed(ref e) => warn!(
                "Ray abandoned at {:?}: {}", walk.state.position, e
            ),
            _ => (),
        }

        Traversal {
            outcome,
            filter: walk.filter,
            steps: walk.steps,
            path_length: walk.state.path_length,
            trajectory: walk.state.trajectory,
        }
    }

    fn color_at(&self, ray: &Ray4D, boundary_t: f64, renderer: &dyn Renderer,
        depth: usize) -> Color {
        let traversal = self.trace(ray, boundary_t);
        let sentinels = &self.config.sentinels;

        match traversal.outcome {
            Outcome::Exited(out) => {
                let beyond = renderer.color_at(
                    out.nudged(self.config.nudge),
                    depth.saturating_sub(1)
                );

                traversal.filter * beyond
            },
            Outcome::Exhausted => sentinels.exhausted,
            Outcome::Lost => sentinels.lost,
            Outcome::Failed(_) => sentinels.parameter_failure,
        }
    }
}

#[cfg(test)]
use crate::absorber::Absorber;

#[cfg(test)]
use crate::refractor::Refractor;

#[cfg(test)]
use crate::voxellation::ParallelPlanes;

#[cfg(test)]
fn slab_volume<P: VoxelPhysics>(physics: P) -> VoxellatedVolume<P> {
    let boundary = Shape::cuboid(
        Tuple4D::point(-1.0, -1.0, 0.0),
        Tuple4D::point(1.0, 1.0, 2.0)
    ).unwrap();
    let planes: Vec<Box<dyn Voxellation>> = vec![Box::new(ParallelPlanes::new(
        Tuple4D::origin(), Tuple4D::vector(0.0, 0.0, 1.0), 0.5
    ).unwrap())];

    VoxellatedVolume::new(boundary, planes, physics).unwrap()
}

#[cfg(test)]
fn down_the_z_axis() -> Ray4D {
    Ray4D::new(Tuple4D::point(0.0, 0.0, -1.0), Tuple4D::vector(0.0, 0.0, 1.0))
}

#[test]
fn volume_without_voxellations_is_rejected() {
    let r = VoxellatedVolume::new(
        Shape::cube(), Vec::new(), Absorber::new(crate::physics::uniform(Color::black()))
    );

    assert!(r.is_err());
}

#[test]
fn trace_crosses_every_slab() {
    let v = slab_volume(Absorber::new(crate::physics::uniform(Color::black())))
        .with_config(VolumeConfig { record_trajectory: true, ..Default::default() });

    let t = v.trace(&down_the_z_axis(), 1.0);

    // Four slabs of 0.5: three dividers and the far boundary.
    assert_eq!(t.outcome, Outcome::Exited(Ray4D::new(
        Tuple4D::point(0.0, 0.0, 2.0), Tuple4D::vector(0.0, 0.0, 1.0)
    )));
    assert_eq!(t.steps, 4);
    assert!(crate::feq(t.path_length, 2.0));
    assert_eq!(t.trajectory.map(|p| p.len()), Some(5));
}

#[test]
fn trace_attenuates_by_depth() {
    let v = slab_volume(Absorber::new(|i: &VoxelIndex| {
        Ok(Color::grey(0.1 * (i.sum() + 1) as f64))
    }));

    let t = v.trace(&down_the_z_axis(), 1.0);
    let optical_depth: f64 = 0.5 * (0.1 + 0.2 + 0.3 + 0.4);

    assert_eq!(t.filter, Color::grey((-optical_depth).exp()));
}

#[test]
fn tiny_budget_is_exhausted() {
    let v = slab_volume(Absorber::new(crate::physics::uniform(Color::black())))
        .with_config(VolumeConfig { step_budget: 2, ..Default::default() });

    let t = v.trace(&down_the_z_axis(), 1.0);
    assert_eq!(t.outcome, Outcome::Exhausted);
    assert_eq!(t.steps, 2);
}

#[test]
fn unconfigured_voxel_fails_the_ray() {
    let v = slab_volume(Refractor::new(|i: &VoxelIndex| {
        if i.sum() < 2 { Ok(1.2) } else { Err(OpticsError::NotConfigured(i.clone())) }
    }, 1.0));

    let t = v.trace(&down_the_z_axis(), 1.0);
    assert_eq!(t.outcome, Outcome::Failed(
        OpticsError::NotConfigured(VoxelIndex(vec![2]))
    ));
}

#[test]
fn ray_starting_inside_is_traced_from_its_origin() {
    let v = slab_volume(Absorber::new(crate::physics::uniform(Color::grey(1.0))));
    let r = Ray4D::new(Tuple4D::point(0.0, 0.0, 1.25), Tuple4D::vector(0.0, 0.0, 1.0));

    let t = v.trace(&r, 0.75);
    assert!(crate::feq(t.path_length, 0.75));
    assert_eq!(t.filter, Color::grey((-0.75f64).exp()));
}

#[cfg(test)]
fn layered_slabs() -> VoxellatedVolume<Absorber<impl Fn(&VoxelIndex) -> Result<Color> + Send + Sync>> {
    slab_volume(Absorber::new(crate::physics::ParameterRule::Layered {
        family: 0,
        first: 0,
        values: vec![Color::grey(0.5), Color::grey(1.0), Color::grey(2.0), Color::grey(4.0)],
    }.into_fn()))
}

#[test]
fn ray_along_a_divider_stays_in_the_slab_ahead() {
    let v = layered_slabs();
    let r = Ray4D::new(Tuple4D::point(-3.0, 0.0, 0.5), Tuple4D::vector(1.0, 0.0, 0.0));

    let t = v.trace(&r, 2.0);
    assert_eq!(t.outcome, Outcome::Exited(Ray4D::new(
        Tuple4D::point(1.0, 0.0, 0.5), Tuple4D::vector(1.0, 0.0, 0.0)
    )));
    assert_eq!(t.steps, 1);
    assert_eq!(t.filter, Color::grey((-2.0f64).exp()));
}

#[test]
fn grazing_entry_where_a_divider_meets_the_boundary() {
    // The floor of the box is also divider 0.
    let v = layered_slabs();
    let d = Tuple4D::vector(1.0, 0.0, 0.001).normalize();
    let r = Ray4D::new(Tuple4D::point(-2.0, 0.0, -0.0015), d);
    let boundary_t = v.boundary().intersect(&r).hit(0.0).unwrap().t;

    assert_eq!(r.position(boundary_t), Tuple4D::point(-0.5, 0.0, 0.0));

    let t = v.trace(&r, boundary_t);
    assert_eq!(t.outcome, Outcome::Exited(Ray4D::new(
        Tuple4D::point(1.0, 0.0, 0.0015), d
    )));
    assert_eq!(t.steps, 1);
    assert!(crate::feq(t.path_length, 1.5 / d.x));
    assert_eq!(t.filter, Color::grey((-0.5 * t.path_length).exp()));
}

#[test]
fn trajectories_are_off_by_default() {
    let config = VolumeConfig::default();

    assert!(!config.record_trajectory);
    assert_eq!(config.sentinels, Sentinels::default());
}
