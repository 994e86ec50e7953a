use std::f64::consts::FRAC_PI_2;

use serde::{ Serialize, Deserialize };

use crate::error::{ OpticsError, Result };
use crate::matrix::Matrix4D;
use crate::physics::{ VoxelPhysics, Medium, Crossing };
use crate::refraction::{ snell, Transmission };
use crate::shape::Shape;
use crate::tuple::Tuple4D;
use crate::voxellation::{ VoxelIndex, Voxellation, ParallelPlanes };

/// A closed refracting solid embedded in one voxel.
#[derive(Clone, Debug, PartialEq)]
pub struct Component {
    pub solid: Shape,
    pub refractive_index: f64,

    /// The index of the medium around the solid.
    pub ambient_index: f64,

    pub transmission: Transmission,
}

impl Component {
    pub fn new(solid: Shape, refractive_index: f64, ambient_index: f64)
        -> Component {
        Component {
            solid,
            refractive_index,
            ambient_index,
            transmission: Default::default(),
        }
    }

    pub fn with_transmission(mut self, transmission: Transmission)
        -> Component {
        self.transmission = transmission;
        self
    }

    /// Refracts a ray hitting the solid, `outward` being the solid's outward
    /// normal at the hit.
    ///
    /// Whether the ray enters or leaves follows from the sign of
    /// `direction . outward`, so a ray may cross the solid any number of
    /// times without anyone tracking which side it is on.
    pub fn refract(&self, direction: Tuple4D, outward: Tuple4D) -> Crossing {
        let (normal, n1, n2) = if direction.dot(&outward) < 0.0 {
            (-outward, self.ambient_index, self.refractive_index)
        } else {
            (outward, self.refractive_index, self.ambient_index)
        };

        Crossing::resolve(
            snell(direction, normal, n1, n2),
            direction,
            normal,
            self.transmission.coefficient(direction, normal, n1, n2)
        )
    }
}

/// Builds the component of a voxel, if it has one.
pub trait ComponentFactory: Send + Sync {
    fn component_for(&self, index: &VoxelIndex) -> Result<Option<Component>>;
}

impl<F> ComponentFactory for F
    where F: Fn(&VoxelIndex) -> Result<Option<Component>> + Send + Sync {
    fn component_for(&self, index: &VoxelIndex) -> Result<Option<Component>> {
        self(index)
    }
}

/// An array of refracting components in a homogeneous ambient medium.
///
/// Voxels have no optics of their own: crossings between voxels are
/// transparent and only the boundary refracts between the surroundings and
/// the ambient medium. All the work is done by the components.
pub struct ComponentArray<F> {
    factory: F,
    pub surrounding_index: f64,
    pub ambient_index: f64,
    pub transmission: Transmission,
}

impl<F: ComponentFactory> ComponentArray<F> {
    pub fn new(factory: F, surrounding_index: f64, ambient_index: f64)
        -> ComponentArray<F> {
        ComponentArray {
            factory,
            surrounding_index,
            ambient_index,
            transmission: Default::default(),
        }
    }

    pub fn with_transmission(mut self, transmission: Transmission)
        -> ComponentArray<F> {
        self.transmission = transmission;
        self
    }

    fn index_of(&self, medium: Medium<Option<Component>>) -> f64 {
        match medium {
            Medium::Surroundings => self.surrounding_index,
            Medium::Voxel(_) => self.ambient_index,
        }
    }
}

impl<F: ComponentFactory> VoxelPhysics for ComponentArray<F> {
    type Parameters = Option<Component>;

    fn parameters_for(&self, index: &VoxelIndex) -> Result<Option<Component>> {
        self.factory.component_for(index)
    }

    fn on_crossing(&self, direction: Tuple4D, normal: Tuple4D,
        before: Medium<Option<Component>>, after: Medium<Option<Component>>)
        -> Crossing {
        let n1 = self.index_of(before);
        let n2 = self.index_of(after);

        Crossing::resolve(
            snell(direction, normal, n1, n2),
            direction,
            normal,
            self.transmission.coefficient(direction, normal, n1, n2)
        )
    }

    fn component<'p>(&self, parameters: &'p Option<Component>)
        -> Option<&'p Component> {
        parameters.as_ref()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LensletShape {
    /// A ball inscribed in the cell.
    Ball,

    /// A capped rod along z, inscribed in the cell's xy cross section.
    Rod,

    /// A box filling the cell.
    Block,
}

/// Identical lenslets tiled over an axis-aligned grid.
///
/// Cell `(i, j, k)` spans `origin + (i, j, k) * pitch` to
/// `origin + (i + 1, j + 1, k + 1) * pitch`; its lenslet sits at the cell
/// centre, scaled down by `fill`. The grid expects the voxel index produced by
/// the three families of `voxellations()`, in that order.
#[derive(Clone, Debug, PartialEq)]
pub struct LensletGrid {
    origin: Tuple4D,
    pitch: Tuple4D,
    shape: LensletShape,
    fill: f64,
    pub refractive_index: f64,
    pub ambient_index: f64,
    pub transmission: Transmission,
}

impl LensletGrid {
    pub fn new(origin: Tuple4D, pitch: Tuple4D, shape: LensletShape, fill: f64,
        refractive_index: f64, ambient_index: f64) -> Result<LensletGrid> {
        if !(pitch.x > 0.0 && pitch.y > 0.0 && pitch.z > 0.0) || !pitch.is_finite() {
            return Err(OpticsError::InvalidParameter(
                format!("lenslet pitch must be positive, got {:?}", pitch)
            ));
        }

        if !(fill > 0.0 && fill <= 1.0) {
            return Err(OpticsError::InvalidParameter(
                format!("lenslet fill must be in (0, 1], got {}", fill)
            ));
        }

        Ok(LensletGrid {
            origin: origin.as_point(),
            pitch: pitch.as_vector(),
            shape,
            fill,
            refractive_index,
            ambient_index,
            transmission: Default::default(),
        })
    }

    pub fn with_transmission(mut self, transmission: Transmission)
        -> LensletGrid {
        self.transmission = transmission;
        self
    }

    /// The x, y and z families of planes delimiting the cells.
    pub fn voxellations(&self) -> Result<Vec<Box<dyn Voxellation>>> {
        let axes = [
            (Tuple4D::vector(1.0, 0.0, 0.0), self.pitch.x),
            (Tuple4D::vector(0.0, 1.0, 0.0), self.pitch.y),
            (Tuple4D::vector(0.0, 0.0, 1.0), self.pitch.z),
        ];

        let mut families: Vec<Box<dyn Voxellation>> = Vec::new();
        for (normal, spacing) in axes.iter() {
            families.push(Box::new(ParallelPlanes::new(self.origin, *normal, *spacing)?));
        }

        Ok(families)
    }

    fn centre_of(&self, i: i64, j: i64, k: i64) -> Tuple4D {
        self.origin + Tuple4D::vector(
            (i as f64 + 0.5) * self.pitch.x,
            (j as f64 + 0.5) * self.pitch.y,
            (k as f64 + 0.5) * self.pitch.z,
        )
    }

    fn solid_at(&self, centre: Tuple4D) -> Result<Shape> {
        let half = self.pitch * (0.5 * self.fill);

        match self.shape {
            LensletShape::Ball => {
                let radius = half.x.min(half.y).min(half.z);
                Shape::sphere_at(centre, radius)
            },
            LensletShape::Rod => {
                let radius = half.x.min(half.y);
                Shape::capped_cylinder(-1.0, 1.0).with_transform(
                    Matrix4D::translation_to(centre)
                        * Matrix4D::rotation_x(FRAC_PI_2)
                        * Matrix4D::scaling(radius, half.z, radius)
                )
            },
            LensletShape::Block => Shape::cuboid(centre - half, centre + half),
        }
    }
}

impl ComponentFactory for LensletGrid {
    fn component_for(&self, index: &VoxelIndex) -> Result<Option<Component>> {
        let (i, j, k) = match (index.along(0), index.along(1), index.along(2)) {
            (Some(i), Some(j), Some(k)) => (i, j, k),
            _ => return Err(OpticsError::InvalidParameter(
                format!("lenslet grids need a 3-family index, got {}", index)
            )),
        };

        let solid = self.solid_at(self.centre_of(i, j, k))?;

        Ok(Some(
            Component::new(solid, self.refractive_index, self.ambient_index)
                .with_transmission(self.transmission)
        ))
    }
}

#[cfg(test)]
use crate::ray::Ray4D;

#[test]
fn component_refracts_on_entry_and_exit() {
    let c = Component::new(Shape::sphere(), 1.5, 1.0);
    let d = Tuple4D::vector(1.0, 0.0, 1.0).normalize();
    let outward = Tuple4D::vector(0.0, 0.0, -1.0);

    // Entering: bends towards the normal.
    match c.refract(d, outward) {
        Crossing::Refracted { direction, .. } => {
            assert!(direction.x < d.x);
            assert!(crate::feq(d.x, 1.5 * direction.x));
        },
        other => panic!("Expected refraction, got {:?}", other),
    }

    // Leaving at 45 degrees from glass: beyond the critical angle.
    match c.refract(d, -outward) {
        Crossing::TotalInternalReflection(reflected) => {
            assert_eq!(reflected, Tuple4D::vector(1.0, 0.0, -1.0).normalize());
        },
        other => panic!("Expected total internal reflection, got {:?}", other),
    }
}

#[test]
fn component_array_crossings_between_voxels_are_transparent() {
    let grid = LensletGrid::new(
        Tuple4D::origin(), Tuple4D::vector(1.0, 1.0, 1.0),
        LensletShape::Ball, 0.8, 1.5, 1.2
    ).unwrap();
    let a = ComponentArray::new(grid, 1.0, 1.2)
        .with_transmission(Transmission::Constant(0.5));
    let d = Tuple4D::vector(0.3, 0.0, 1.0).normalize();
    let n = Tuple4D::vector(0.0, 0.0, 1.0);

    assert_eq!(
        a.on_crossing(d, n, Medium::Voxel(&None), Medium::Voxel(&None)),
        Crossing::straight(d)
    );
}

#[test]
fn lenslet_ball_sits_in_its_cell() {
    let grid = LensletGrid::new(
        Tuple4D::point(-1.0, -1.0, 0.0), Tuple4D::vector(0.5, 0.5, 2.0),
        LensletShape::Ball, 1.0, 1.5, 1.0
    ).unwrap();

    let c = grid.component_for(&VoxelIndex(vec![1, 2, 0])).unwrap().unwrap();

    // Centre (-0.25, 0.25, 1.0), radius 0.25.
    let r = Ray4D::new(
        Tuple4D::point(-0.25, 0.25, -5.0), Tuple4D::vector(0.0, 0.0, 1.0)
    );
    let mut xs = c.solid.intersect(&r);
    let hit = xs.hit(0.0).unwrap();

    assert!(crate::feq(hit.t, 5.75));
}

#[test]
fn lenslet_rod_runs_along_z() {
    let grid = LensletGrid::new(
        Tuple4D::origin(), Tuple4D::vector(2.0, 2.0, 4.0),
        LensletShape::Rod, 0.5, 1.5, 1.0
    ).unwrap();

    let c = grid.component_for(&VoxelIndex(vec![0, 0, 0])).unwrap().unwrap();

    // Centre (1, 1, 2), radius 0.5, half length 1.
    let along = Ray4D::new(
        Tuple4D::point(1.0, 1.0, -3.0), Tuple4D::vector(0.0, 0.0, 1.0)
    );
    let across = Ray4D::new(
        Tuple4D::point(-3.0, 1.0, 2.0), Tuple4D::vector(1.0, 0.0, 0.0)
    );

    assert!(crate::feq(c.solid.intersect(&along).hit(0.0).unwrap().t, 4.0));
    assert!(crate::feq(c.solid.intersect(&across).hit(0.0).unwrap().t, 3.5));
}

#[test]
fn lenslet_grid_voxellations_match_cells() {
    let grid = LensletGrid::new(
        Tuple4D::origin(), Tuple4D::vector(1.0, 2.0, 3.0),
        LensletShape::Block, 0.5, 1.5, 1.0
    ).unwrap();
    let families = grid.voxellations().unwrap();
    let index = crate::voxellation::voxel_index_at(
        &families, Tuple4D::point(1.5, -0.5, 7.0)
    );

    assert_eq!(index, VoxelIndex(vec![1, -1, 2]));
}

#[test]
fn lenslet_grid_rejects_short_indices() {
    let grid = LensletGrid::new(
        Tuple4D::origin(), Tuple4D::vector(1.0, 1.0, 1.0),
        LensletShape::Block, 0.5, 1.5, 1.0
    ).unwrap();

    assert!(grid.component_for(&VoxelIndex(vec![0, 0])).is_err());
    assert!(LensletGrid::new(
        Tuple4D::origin(), Tuple4D::vector(1.0, 0.0, 1.0),
        LensletShape::Block, 0.5, 1.5, 1.0
    ).is_err());
}
