use crate::ray::Ray4D;
use crate::color::{ Color, Sentinels };
use crate::consts::HIT_EPSILON;
use crate::shape::Shape;
use crate::volume::OpticalVolume;

/// Anything that can tell the color seen along a ray.
///
/// `depth` is the remaining recursion budget. Every bounce anywhere in the
/// scene (including leaving a volume) spends one unit; at zero the renderer
/// has to stop recursing.
pub trait Renderer: Send + Sync {
    fn color_at(&self, ray: Ray4D, depth: usize) -> Color;
}

/// An object in a world.
pub enum WorldObject {
    /// An opaque shape with a flat color.
    Matte { shape: Shape, color: Color },

    /// A voxellated volume; rays hitting its boundary are handed over to it.
    Volume(Box<dyn OpticalVolume>),
}

impl WorldObject {
    pub fn shape(&self) -> &Shape {
        match self {
            WorldObject::Matte { shape, .. } => shape,
            WorldObject::Volume(v) => v.boundary(),
        }
    }
}

/// A world with objects and a background.
///
/// Worlds are the `Renderer` volumes recurse into once a ray has left them.
pub struct World {
    pub objects: Vec<WorldObject>,

    /// The color of rays that hit nothing.
    pub background: Color,

    pub sentinels: Sentinels,
}

impl Default for World {
    fn default() -> World {
        World {
            objects: Vec::new(),
            background: Color::black(),
            sentinels: Default::default(),
        }
    }
}

impl World {
    /// Creates an empty world with a black background.
    pub fn empty() -> World {
        Default::default()
    }

    pub fn with_background(background: Color) -> World {
        World { background, ..Default::default() }
    }

    pub fn add_matte(&mut self, shape: Shape, color: Color) {
        self.objects.push(WorldObject::Matte { shape, color });
    }

    pub fn add_volume<V: OpticalVolume + 'static>(&mut self, volume: V) {
        self.objects.push(WorldObject::Volume(Box::new(volume)));
    }

    /// The closest object in front of a ray, and the offset of the hit.
    pub fn intersect(&self, r: &Ray4D) -> Option<(f64, &WorldObject)> {
        let mut closest: Option<(f64, &WorldObject)> = None;

        for obj in self.objects.iter() {
            let t = match obj.shape().intersect(r).hit(HIT_EPSILON) {
                Some(i) => i.t,
                None => continue,
            };

            match closest {
                Some((best, _)) if best <= t => (),
                _ => closest = Some((t, obj)),
            }
        }

        closest
    }
}

impl Renderer for World {
    /// Determines a color based on the intersection of a ray and the objects.
    fn color_at(&self, r: Ray4D, depth: usize) -> Color {
        if depth == 0 {
            return self.sentinels.recursion_limit;
        }

        match self.intersect(&r) {
            None => self.background,
            Some((_, WorldObject::Matte { color, .. })) => *color,
            Some((t, WorldObject::Volume(v))) => v.color_at(&r, t, self, depth),
        }
    }
}

#[cfg(test)]
use crate::tuple::Tuple4D;

#[cfg(test)]
use crate::matrix::Matrix4D;

#[test]
fn color_ray_miss() {
    let w = World::with_background(Color::blue());
    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, -5.0),
        Tuple4D::vector(0.0, 1.0, 0.0),
    );

    assert_eq!(w.color_at(r, 5), Color::blue());
}

#[test]
fn color_ray_hits_nearest_matte() {
    let mut w = World::empty();
    w.add_matte(
        Shape::sphere().with_transform(Matrix4D::translation(0.0, 0.0, 3.0)).unwrap(),
        Color::red()
    );
    w.add_matte(Shape::sphere(), Color::green());

    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, -5.0),
        Tuple4D::vector(0.0, 0.0, 1.0),
    );

    assert_eq!(w.intersect(&r).map(|(t, _)| t), Some(4.0));
    assert_eq!(w.color_at(r, 5), Color::green());
}

#[test]
fn color_behind_ray_origin_is_ignored() {
    let mut w = World::with_background(Color::white());
    w.add_matte(Shape::sphere(), Color::red());

    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, 5.0),
        Tuple4D::vector(0.0, 0.0, 1.0),
    );

    assert_eq!(w.color_at(r, 5), Color::white());
}

#[test]
fn exhausted_recursion_gives_sentinel() {
    let w = World::with_background(Color::white());
    let r = Ray4D::new(Tuple4D::origin(), Tuple4D::vector(0.0, 0.0, 1.0));

    assert_eq!(w.color_at(r, 0), Sentinels::default().recursion_limit);
}
