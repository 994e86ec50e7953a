use log::info;

use crate::ray::Ray4D;
use crate::tuple::Tuple4D;
use crate::matrix::Matrix4D;
use crate::world::Renderer;
use crate::canvas::Canvas;
use crate::error::{ OpticsError, Result };

/// A pinhole camera looking down its own -z axis.
///
/// The image plane sits one unit in front of the eye; `transform` maps world
/// space into camera space, usually a `Matrix4D::view_transform`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Camera {
    /// Canvas width, in pixels.
    pub hsize: usize,

    /// Canvas height, in pixels.
    pub vsize: usize,

    /// Horizontal opening angle, in radians.
    pub field_of_view: f64,

    half_width: f64,
    half_height: f64,
    pixel_size: f64,

    transform: Matrix4D,
    inverse: Matrix4D,
}

impl Camera {
    /// Fails if `transform` cannot be inverted.
    pub fn new(hsize: usize, vsize: usize, field_of_view: f64,
        transform: Matrix4D) -> Result<Camera> {
        let inverse = transform.inverse().ok_or(OpticsError::SingularTransform)?;

        // The longer side of the canvas spans the whole field of view.
        let half_view = (field_of_view / 2.0).tan();
        let aspect = hsize as f64 / vsize as f64;
        let (half_width, half_height) = if aspect >= 1.0 {
            (half_view, half_view / aspect)
        } else {
            (half_view * aspect, half_view)
        };

        Ok(Camera {
            hsize,
            vsize,
            field_of_view,
            half_width,
            half_height,
            pixel_size: 2.0 * half_width / hsize as f64,
            transform,
            inverse,
        })
    }

    pub fn transform(&self) -> &Matrix4D {
        &self.transform
    }

    /// Size of one (square) pixel on the image plane.
    pub fn pixel_size(&self) -> f64 {
        self.pixel_size
    }

    /// The centre of pixel `(px, py)` on the image plane, in camera space.
    fn image_point(&self, px: usize, py: usize) -> Tuple4D {
        let x = self.half_width - (px as f64 + 0.5) * self.pixel_size;
        let y = self.half_height - (py as f64 + 0.5) * self.pixel_size;

        Tuple4D::point(x, y, -1.0)
    }

    /// The primary ray through the centre of pixel `(px, py)`.
    pub fn ray_for_pixel(&self, px: usize, py: usize) -> Ray4D {
        let eye = self.inverse * Tuple4D::origin();
        let target = self.inverse * self.image_point(px, py);

        Ray4D::new(eye, (target - eye).normalize())
    }

    /// Renders every pixel on the calling thread.
    pub fn render(&self, renderer: &dyn Renderer, depth: usize) -> Canvas {
        let mut image = Canvas::new(self.hsize, self.vsize);

        for y in 0..self.vsize {
            for x in 0..self.hsize {
                let ray = self.ray_for_pixel(x, y);
                image.write_pixel(x, y, &renderer.color_at(ray, depth));
            }
        }

        info!("Rendered {}x{} pixels", self.hsize, self.vsize);
        image
    }
}

#[test]
fn ray_through_center() {
    let c = Camera::new(201, 101, std::f64::consts::PI / 2.0,
        Matrix4D::identity()).unwrap();
    let r = c.ray_for_pixel(100, 50);

    assert_eq!(r.origin, Tuple4D::point(0.0, 0.0, 0.0));
    assert_eq!(r.direction, Tuple4D::vector(0.0, 0.0, -1.0));
}

#[test]
fn ray_through_corner() {
    let c = Camera::new(201, 101, std::f64::consts::PI / 2.0,
        Matrix4D::identity()).unwrap();
    let r = c.ray_for_pixel(0, 0);

    assert_eq!(r.origin, Tuple4D::point(0.0, 0.0, 0.0));
    assert_eq!(r.direction, Tuple4D::vector(0.66519, 0.33259, -0.66851));
}

#[test]
fn ray_when_camera_transformed() {
    let c = Camera::new(201, 101, std::f64::consts::PI / 2.0,
        Matrix4D::rotation_y(std::f64::consts::PI / 4.0)
            * Matrix4D::translation(0.0, -2.0, 5.0)).unwrap();
    let r = c.ray_for_pixel(100, 50);

    assert_eq!(r.origin, Tuple4D::point(0.0, 2.0, -5.0));
    assert_eq!(r.direction,
        Tuple4D::vector(2.0f64.sqrt() / 2.0, 0.0, -(2.0f64.sqrt() / 2.0)));
}

#[test]
fn pixel_size_follows_longer_side() {
    let wide = Camera::new(200, 125, std::f64::consts::PI / 2.0,
        Matrix4D::identity()).unwrap();
    let tall = Camera::new(125, 200, std::f64::consts::PI / 2.0,
        Matrix4D::identity()).unwrap();

    assert!(crate::feq(wide.pixel_size(), 0.01));
    assert!(crate::feq(tall.pixel_size(), 0.01));
}

#[test]
fn singular_camera_is_rejected() {
    assert!(Camera::new(10, 10, 1.0, Matrix4D::scaling(1.0, 0.0, 1.0)).is_err());
}

#[test]
fn render_world_with_camera() {
    use crate::color::Color;
    use crate::shape::Shape;
    use crate::world::World;

    let mut w = World::with_background(Color::blue());
    w.add_matte(Shape::sphere(), Color::green());

    let c = Camera::new(11, 11, std::f64::consts::PI / 2.0,
        Matrix4D::view_transform(
            Tuple4D::point(0.0, 0.0, -5.0),
            Tuple4D::point(0.0, 0.0, 0.0),
            Tuple4D::vector(0.0, 1.0, 0.0)
        )).unwrap();

    let image = c.render(&w, 5);
    assert_eq!(image.read_pixel(5, 5).unwrap(), Color::green());
    assert_eq!(image.read_pixel(0, 0).unwrap(), Color::blue());
}
