//! Scene descriptions in JSON.
//!
//! A scene is a camera, a background and a list of objects, each either a
//! matte shape or a voxellated volume:
//!
//! ```json
//! {
//!   "canvas_width": 160, "canvas_height": 120, "field_of_view": 1.0,
//!   "camera_from": [0, 0, -6], "camera_to": [0, 0, 0], "camera_up": [0, 1, 0],
//!   "background": [0.9, 0.9, 0.9],
//!   "objects": [
//!     { "volume": {
//!         "boundary": { "type": "cube" },
//!         "voxellations": [
//!           { "type": "parallel_planes", "point": [0, 0, 0],
//!             "normal": [0, 0, 1], "spacing": 0.5 }
//!         ],
//!         "physics": { "type": "absorber",
//!                      "coefficients": { "uniform": [0.1, 0.4, 0.8] } }
//!     } }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{ Serialize, Deserialize };

use crate::absorber::Absorber;
use crate::camera::Camera;
use crate::color::{ Color, Sentinels };
use crate::component::{ ComponentArray, LensletGrid, LensletShape };
use crate::consts::RECURSION_DEPTH;
use crate::error::SceneError;
use crate::matrix::{ Matrix3D, Matrix4D };
use crate::metric::MetricMedium;
use crate::physics::{ ParameterRule, VoxelPhysics };
use crate::refraction::Transmission;
use crate::refractor::Refractor;
use crate::shape::Shape;
use crate::tuple::Tuple4D;
use crate::volume::{ OpticalVolume, VolumeConfig, VoxellatedVolume };
use crate::voxellation::{ Voxellation, VoxelIndex, ParallelPlanes, ConcentricSpheres,
    CoaxialCylinders, RadialPlanes };
use crate::world::{ World, WorldObject };

/// A loaded scene, ready to render.
pub struct Scene {
    pub world: World,
    pub camera: Camera,
    pub recursion_depth: usize,
}

/// Settings given on the command line, taking precedence over the scene file.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Overrides {
    pub recursion_depth: Option<usize>,

    /// Replaces the step budget of every volume.
    pub step_budget: Option<usize>,
}

impl Scene {
    pub fn from_json(text: &str) -> Result<Scene, SceneError> {
        Scene::from_json_with(text, &Default::default())
    }

    pub fn from_json_with(text: &str, overrides: &Overrides)
        -> Result<Scene, SceneError> {
        let scene_json: SceneJson = serde_json::from_str(text)?;
        Scene::try_from_json(scene_json, overrides)
    }

    pub fn load(path: &Path, overrides: &Overrides) -> Result<Scene, SceneError> {
        Scene::from_json_with(&fs::read_to_string(path)?, overrides)
    }

    fn try_from_json(scene_json: SceneJson, overrides: &Overrides)
        -> Result<Scene, SceneError> {
        // Create the camera transform from the view parameters.
        let camera_transform = Matrix4D::view_transform(
            Tuple4D::from(scene_json.camera_from).as_point(),
            Tuple4D::from(scene_json.camera_to).as_point(),
            Tuple4D::from(scene_json.camera_up)
        );

        if scene_json.canvas_width == 0 || scene_json.canvas_height == 0 {
            return Err(SceneError::Invalid("canvas must not be empty".to_string()));
        }

        let camera = Camera::new(
            scene_json.canvas_width,
            scene_json.canvas_height,
            scene_json.field_of_view,
            camera_transform
        )?;

        let mut world = World::with_background(scene_json.background);
        world.sentinels = scene_json.sentinels;

        for object in scene_json.objects {
            match object {
                ObjectJson::Matte { shape, color } => {
                    world.add_matte(shape.build()?, color);
                },
                ObjectJson::Volume(volume) => {
                    world.objects.push(WorldObject::Volume(
                        volume.build(scene_json.sentinels, overrides.step_budget)?
                    ));
                },
            }
        }

        let recursion_depth = overrides.recursion_depth
            .unwrap_or(scene_json.recursion_depth);

        Ok(Scene { world, camera, recursion_depth })
    }
}

fn default_recursion_depth() -> usize {
    RECURSION_DEPTH
}

fn default_up() -> [f64; 3] {
    [0.0, 1.0, 0.0]
}

#[derive(Serialize, Deserialize)]
pub struct SceneJson {
    canvas_width: usize,
    canvas_height: usize,
    field_of_view: f64,

    camera_from: [f64; 3],
    camera_to: [f64; 3],
    #[serde(default = "default_up")]
    camera_up: [f64; 3],

    #[serde(default)]
    background: Color,

    #[serde(default = "default_recursion_depth")]
    recursion_depth: usize,

    #[serde(default)]
    sentinels: Sentinels,

    objects: Vec<ObjectJson>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ObjectJson {
    Matte { shape: ShapeJson, color: Color },
    Volume(VolumeJson),
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum PrimitiveJson {
    Sphere,
    Cube,
    Plane,
    Cylinder,
    CappedCylinder { minimum: f64, maximum: f64 },
}

/// Transforms are applied in the order they are listed.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum TransformJson {
    Translate([f64; 3]),
    Scale([f64; 3]),
    RotateX(f64),
    RotateY(f64),
    RotateZ(f64),
}

impl From<&TransformJson> for Matrix4D {
    fn from(t: &TransformJson) -> Matrix4D {
        match *t {
            TransformJson::Translate([x, y, z]) => Matrix4D::translation(x, y, z),
            TransformJson::Scale([x, y, z]) => Matrix4D::scaling(x, y, z),
            TransformJson::RotateX(r) => Matrix4D::rotation_x(r),
            TransformJson::RotateY(r) => Matrix4D::rotation_y(r),
            TransformJson::RotateZ(r) => Matrix4D::rotation_z(r),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
struct ShapeJson {
    #[serde(flatten)]
    primitive: PrimitiveJson,

    #[serde(default)]
    transforms: Vec<TransformJson>,
}

impl ShapeJson {
    fn build(&self) -> Result<Shape, SceneError> {
        let shape = match self.primitive {
            PrimitiveJson::Sphere => Shape::sphere(),
            PrimitiveJson::Cube => Shape::cube(),
            PrimitiveJson::Plane => Shape::plane(),
            PrimitiveJson::Cylinder => Shape::cylinder(),
            PrimitiveJson::CappedCylinder { minimum, maximum } =>
                Shape::capped_cylinder(minimum, maximum),
        };

        let transform = self.transforms.iter()
            .fold(Matrix4D::identity(), |m, t| Matrix4D::from(t) * m);

        Ok(shape.with_transform(transform)?)
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum VoxellationJson {
    ParallelPlanes { point: [f64; 3], normal: [f64; 3], spacing: f64 },
    ConcentricSpheres { centre: [f64; 3], spacing: f64 },
    CoaxialCylinders { point: [f64; 3], axis: [f64; 3], spacing: f64 },
    RadialPlanes {
        point: [f64; 3],
        axis: [f64; 3],
        zero_direction: [f64; 3],
        sectors: u32,
    },
}

impl VoxellationJson {
    fn build(&self) -> Result<Box<dyn Voxellation>, SceneError> {
        let p = |a: [f64; 3]| Tuple4D::from(a).as_point();
        let v = |a: [f64; 3]| Tuple4D::from(a);

        let voxellation: Box<dyn Voxellation> = match *self {
            VoxellationJson::ParallelPlanes { point, normal, spacing } =>
                Box::new(ParallelPlanes::new(p(point), v(normal), spacing)?),
            VoxellationJson::ConcentricSpheres { centre, spacing } =>
                Box::new(ConcentricSpheres::new(p(centre), spacing)?),
            VoxellationJson::CoaxialCylinders { point, axis, spacing } =>
                Box::new(CoaxialCylinders::new(p(point), v(axis), spacing)?),
            VoxellationJson::RadialPlanes { point, axis, zero_direction, sectors } =>
                Box::new(RadialPlanes::new(
                    p(point), v(axis), v(zero_direction), sectors
                )?),
        };

        Ok(voxellation)
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum PhysicsJson {
    Absorber {
        coefficients: ParameterRule<Color>,
    },
    Refractor {
        index: ParameterRule<f64>,
        surrounding_index: f64,
        #[serde(default)]
        transmission: Transmission,
    },
    Metric {
        tensor: ParameterRule<[f64; 9]>,

        /// Tensor of the surroundings; required like `surrounding_index`.
        surrounding: [f64; 9],
        #[serde(default)]
        transmission: Transmission,
    },
    /// Brings its own voxellations; the volume must not list any.
    LensletArray {
        origin: [f64; 3],
        pitch: [f64; 3],
        shape: LensletShape,
        fill: f64,
        index: f64,
        ambient_index: f64,
        surrounding_index: f64,
        #[serde(default)]
        transmission: Transmission,
    },
}

#[derive(Clone, Serialize, Deserialize)]
struct VolumeJson {
    boundary: ShapeJson,

    #[serde(default)]
    voxellations: Vec<VoxellationJson>,

    physics: PhysicsJson,

    #[serde(default)]
    config: VolumeConfig,
}

/// Boxes a volume over any physics.
fn boxed<P>(volume: crate::error::Result<VoxellatedVolume<P>>, config: VolumeConfig)
    -> Result<Box<dyn OpticalVolume>, SceneError>
    where P: VoxelPhysics + 'static {
    Ok(Box::new(volume?.with_config(config)))
}

impl VolumeJson {
    /// Builds the volume, with the scene's sentinel colors.
    fn build(self, sentinels: Sentinels, step_budget: Option<usize>)
        -> Result<Box<dyn OpticalVolume>, SceneError> {
        let boundary = self.boundary.build()?;
        let config = VolumeConfig {
            sentinels,
            step_budget: step_budget.unwrap_or(self.config.step_budget),
            ..self.config
        };

        let mut voxellations = Vec::with_capacity(self.voxellations.len());
        for v in self.voxellations.iter() {
            voxellations.push(v.build()?);
        }

        match self.physics {
            PhysicsJson::Absorber { coefficients } => boxed(VoxellatedVolume::new(
                boundary, voxellations, Absorber::new(coefficients.into_fn())
            ), config),
            PhysicsJson::Refractor { index, surrounding_index, transmission } => {
                let physics = Refractor::new(index.into_fn(), surrounding_index)
                    .with_transmission(transmission);

                boxed(VoxellatedVolume::new(boundary, voxellations, physics), config)
            },
            PhysicsJson::Metric { tensor, surrounding, transmission } => {
                let tensor = tensor.into_fn();
                let physics = MetricMedium::new(
                    move |i: &VoxelIndex| tensor(i).map(Matrix3D::from),
                    Matrix3D::from(surrounding)
                )?.with_transmission(transmission);

                boxed(VoxellatedVolume::new(boundary, voxellations, physics), config)
            },
            PhysicsJson::LensletArray {
                origin, pitch, shape, fill, index, ambient_index,
                surrounding_index, transmission
            } => {
                if !voxellations.is_empty() {
                    return Err(SceneError::Invalid(
                        "lenslet arrays bring their own voxellations".to_string()
                    ));
                }

                let grid = LensletGrid::new(
                    Tuple4D::from(origin).as_point(), Tuple4D::from(pitch),
                    shape, fill, index, ambient_index
                )?.with_transmission(transmission);
                let voxellations = grid.voxellations()?;
                let physics = ComponentArray::new(grid, surrounding_index, ambient_index)
                    .with_transmission(transmission);

                boxed(VoxellatedVolume::new(boundary, voxellations, physics), config)
            },
        }
    }
}

#[cfg(test)]
use crate::world::Renderer;

#[cfg(test)]
use crate::ray::Ray4D;

#[test]
fn scene_with_matte_and_absorber() {
    let scene = Scene::from_json(r#"{
        "canvas_width": 4, "canvas_height": 3, "field_of_view": 1.0,
        "camera_from": [0, 0, -6], "camera_to": [0, 0, 0],
        "background": [0.0, 0.0, 1.0],
        "objects": [
            { "matte": { "shape": { "type": "plane",
                                    "transforms": [{ "rotate_x": 1.5707963267948966 },
                                                   { "translate": [0, 0, 5] }] },
                         "color": [1.0, 1.0, 1.0] } },
            { "volume": {
                "boundary": { "type": "cube" },
                "voxellations": [
                    { "type": "parallel_planes", "point": [0, 0, 0],
                      "normal": [0, 0, 1], "spacing": 0.5 }
                ],
                "physics": { "type": "absorber",
                             "coefficients": { "uniform": [0.0, 0.5, 1.0] } }
            } }
        ]
    }"#).unwrap();

    assert_eq!(scene.recursion_depth, RECURSION_DEPTH);
    assert_eq!(scene.world.objects.len(), 2);

    // Two units of absorber in front of a white wall.
    let r = Ray4D::new(Tuple4D::point(0.0, 0.0, -6.0), Tuple4D::vector(0.0, 0.0, 1.0));
    assert_eq!(
        scene.world.color_at(r, scene.recursion_depth),
        Color::rgb(1.0, (-1.0f64).exp(), (-2.0f64).exp())
    );
}

#[test]
fn scene_with_lenslet_array() {
    let scene = Scene::from_json(r#"{
        "canvas_width": 2, "canvas_height": 2, "field_of_view": 1.0,
        "camera_from": [0, 0, -6], "camera_to": [0, 0, 0],
        "objects": [
            { "volume": {
                "boundary": { "type": "cube" },
                "physics": { "type": "lenslet_array", "origin": [-1, -1, -1],
                             "pitch": [0.5, 0.5, 2.0], "shape": "rod", "fill": 0.8,
                             "index": 1.5, "ambient_index": 1.0,
                             "surrounding_index": 1.0 }
            } }
        ]
    }"#);

    assert!(scene.is_ok());
}

#[test]
fn degenerate_scenes_are_rejected() {
    let singular = Scene::from_json(r#"{
        "canvas_width": 2, "canvas_height": 2, "field_of_view": 1.0,
        "camera_from": [0, 0, -6], "camera_to": [0, 0, 0],
        "objects": [
            { "matte": { "shape": { "type": "sphere", "transforms": [{ "scale": [1, 0, 1] }] },
                         "color": [1, 1, 1] } }
        ]
    }"#);
    let too_few_sectors = Scene::from_json(r#"{
        "canvas_width": 2, "canvas_height": 2, "field_of_view": 1.0,
        "camera_from": [0, 0, -6], "camera_to": [0, 0, 0],
        "objects": [
            { "volume": {
                "boundary": { "type": "cube" },
                "voxellations": [
                    { "type": "radial_planes", "point": [0, 0, 0], "axis": [0, 0, 1],
                      "zero_direction": [1, 0, 0], "sectors": 2 }
                ],
                "physics": { "type": "refractor",
                             "index": { "uniform": 1.5 }, "surrounding_index": 1.0 }
            } }
        ]
    }"#);

    assert!(matches!(singular, Err(SceneError::Optics(_))));
    assert!(matches!(too_few_sectors, Err(SceneError::Optics(_))));
    assert!(matches!(Scene::from_json("{"), Err(SceneError::Json(_))));
}

#[test]
fn overrides_replace_scene_settings() {
    let text = r#"{
        "canvas_width": 2, "canvas_height": 2, "field_of_view": 1.0,
        "camera_from": [0, 0, -6], "camera_to": [0, 0, 0],
        "recursion_depth": 3,
        "objects": [
            { "volume": {
                "boundary": { "type": "cube" },
                "voxellations": [
                    { "type": "parallel_planes", "point": [0, 0, 0],
                      "normal": [0, 0, 1], "spacing": 0.25 }
                ],
                "physics": { "type": "absorber", "coefficients": { "uniform": [0, 0, 0] } },
                "config": { "step_budget": 100 }
            } }
        ]
    }"#;

    let scene = Scene::from_json(text).unwrap();
    assert_eq!(scene.recursion_depth, 3);

    let overrides = Overrides { recursion_depth: Some(7), step_budget: Some(2) };
    let scene = Scene::from_json_with(text, &overrides).unwrap();
    assert_eq!(scene.recursion_depth, 7);

    // Eight slabs do not fit into two steps.
    let r = Ray4D::new(Tuple4D::point(0.0, 0.0, -6.0), Tuple4D::vector(0.0, 0.0, 1.0));
    assert_eq!(scene.world.color_at(r, 7), Sentinels::default().exhausted);
}

#[test]
fn metric_volumes_name_their_surroundings() {
    let with = |surrounding: &str| format!(r#"{{
        "canvas_width": 2, "canvas_height": 2, "field_of_view": 1.0,
        "camera_from": [0, 0, -6], "camera_to": [0, 0, 0],
        "objects": [
            {{ "volume": {{
                "boundary": {{ "type": "cube" }},
                "voxellations": [
                    {{ "type": "parallel_planes", "point": [0, 0, 0],
                      "normal": [0, 0, 1], "spacing": 0.5 }}
                ],
                "physics": {{ "type": "metric",
                             "tensor": {{ "uniform": [2.25, 0, 0, 0, 2.25, 0, 0, 0, 2.25] }}
                             {} }}
            }} }}
        ]
    }}"#, surrounding);

    assert!(Scene::from_json(&with(r#", "surrounding": [1, 0, 0, 0, 1, 0, 0, 0, 1]"#)).is_ok());
    assert!(matches!(Scene::from_json(&with("")), Err(SceneError::Json(_))));
}
