use voxel_optics::color::Color;
use voxel_optics::component::{ ComponentArray, LensletGrid, LensletShape };
use voxel_optics::ray::Ray4D;
use voxel_optics::refraction::Transmission;
use voxel_optics::shape::Shape;
use voxel_optics::tuple::Tuple4D;
use voxel_optics::volume::{ OpticalVolume, Outcome, VolumeConfig, VoxellatedVolume };
use voxel_optics::voxellation::VoxelIndex;

/// Glass lenslets of index 1.5 in air, on a grid of 2 x 2 x 1 cells of
/// `1 x 1 x 2` filling the box `-1..1 x -1..1 x 0..2`. Every glass surface
/// transmits 0.9.
fn lenslets(shape: LensletShape, fill: f64) -> VoxellatedVolume<ComponentArray<LensletGrid>> {
    let grid = LensletGrid::new(
        Tuple4D::point(-1.0, -1.0, 0.0), Tuple4D::vector(1.0, 1.0, 2.0),
        shape, fill, 1.5, 1.0
    ).unwrap().with_transmission(Transmission::Constant(0.9));
    let families = grid.voxellations().unwrap();
    let boundary = Shape::cuboid(
        Tuple4D::point(-1.0, -1.0, 0.0),
        Tuple4D::point(1.0, 1.0, 2.0)
    ).unwrap();

    VoxellatedVolume::new(boundary, families, ComponentArray::new(grid, 1.0, 1.0)).unwrap()
}

/// A ray in the plane `y = -0.5` meeting the floor of the box at `x`.
fn up_through_floor(x: f64, direction: Tuple4D) -> Ray4D {
    let d = direction.normalize();
    Ray4D::new(Tuple4D::point(x - d.x / d.z, -0.5, -1.0), d)
}

fn boundary_t(volume: &dyn OpticalVolume, ray: &Ray4D) -> f64 {
    volume.boundary().intersect(ray).hit(0.0).expect("Ray should hit the volume.").t
}

fn oblique() -> Tuple4D {
    Tuple4D::vector(0.5, 0.0, 1.0).normalize()
}

#[test]
fn block_filling_its_cell_refracts_at_normal_incidence() {
    let v = lenslets(LensletShape::Block, 1.0);
    let ray = up_through_floor(-0.5, Tuple4D::vector(0.0, 0.0, 1.0));
    let t = v.trace(&ray, boundary_t(&v, &ray));

    assert_eq!(t.outcome, Outcome::Exited(Ray4D::new(
        Tuple4D::point(-0.5, -0.5, 2.0), Tuple4D::vector(0.0, 0.0, 1.0)
    )));
    assert_eq!(t.filter, Color::grey(0.81));
    assert_eq!(t.steps, 1);
}

#[test]
fn block_filling_its_cell_bends_oblique_rays() {
    let v = lenslets(LensletShape::Block, 1.0);
    let ray = up_through_floor(-0.9, oblique());
    let t = v.trace(&ray, boundary_t(&v, &ray));

    // Undeviated, the ray would leave at x = 0.1.
    assert_eq!(t.outcome, Outcome::Exited(Ray4D::new(
        Tuple4D::point(-0.27530495, -0.5, 2.0), oblique()
    )));
    assert_eq!(t.filter, Color::grey(0.81));
    assert_eq!(t.steps, 1);
}

#[test]
fn block_face_on_a_divider_reflects_totally() {
    let v = lenslets(LensletShape::Block, 1.0);
    let ray = up_through_floor(-0.3, oblique());
    let t = v.trace(&ray, boundary_t(&v, &ray));

    // Glass meets the x = 0 divider beyond the critical angle and the ray
    // stays in the first cell.
    assert_eq!(t.outcome, Outcome::Exited(Ray4D::new(
        Tuple4D::point(-0.32469505, -0.5, 2.0),
        Tuple4D::vector(-0.5, 0.0, 1.0).normalize()
    )));
    assert_eq!(t.filter, Color::grey(0.81));
    assert_eq!(t.steps, 2);
}

#[test]
fn rod_caps_on_the_boundary_refract() {
    let v = lenslets(LensletShape::Rod, 1.0);

    let along = up_through_floor(-0.5, Tuple4D::vector(0.0, 0.0, 1.0));
    let t = v.trace(&along, boundary_t(&v, &along));
    assert_eq!(t.outcome, Outcome::Exited(Ray4D::new(
        Tuple4D::point(-0.5, -0.5, 2.0), Tuple4D::vector(0.0, 0.0, 1.0)
    )));
    assert_eq!(t.filter, Color::grey(0.81));

    let slanted = up_through_floor(-0.8, oblique());
    let t = v.trace(&slanted, boundary_t(&v, &slanted));
    assert_eq!(t.outcome, Outcome::Exited(Ray4D::new(
        Tuple4D::point(-0.17530495, -0.5, 2.0), oblique()
    )));
    assert_eq!(t.filter, Color::grey(0.81));
    assert_eq!(t.steps, 1);
}

#[test]
fn ray_through_ball_centre_is_undeviated() {
    let v = lenslets(LensletShape::Ball, 0.8)
        .with_config(VolumeConfig { record_trajectory: true, ..Default::default() });
    let ray = up_through_floor(-0.5, Tuple4D::vector(0.0, 0.0, 1.0));
    let t = v.trace(&ray, boundary_t(&v, &ray));

    assert_eq!(t.outcome, Outcome::Exited(Ray4D::new(
        Tuple4D::point(-0.5, -0.5, 2.0), Tuple4D::vector(0.0, 0.0, 1.0)
    )));
    assert_eq!(t.filter, Color::grey(0.81));

    // Into the ball, out of it, out of the volume.
    assert_eq!(t.steps, 3);

    let trajectory = t.trajectory.unwrap();
    let heights: Vec<f64> = trajectory.iter().map(|p| p.z).collect();
    assert_eq!(trajectory.len(), 4);
    assert!(voxel_optics::feq(heights[1], 0.6));
    assert!(voxel_optics::feq(heights[2], 1.4));

    // Hitting the ball never moves the ray to another cell.
    for p in &trajectory[..3] {
        assert_eq!(v.voxel_index_at(*p), VoxelIndex(vec![0, 0, 0]));
    }
}

#[test]
fn ball_deflects_rays_off_its_axis() {
    let v = lenslets(LensletShape::Ball, 0.8);

    // Half a radius off axis: 30 degrees incidence, bent by 2 (i - r).
    let ray = up_through_floor(-0.3, Tuple4D::vector(0.0, 0.0, 1.0));
    let t = v.trace(&ray, boundary_t(&v, &ray));

    assert_eq!(t.outcome, Outcome::Exited(Ray4D::new(
        Tuple4D::point(-0.67070535, -0.5, 2.0),
        Tuple4D::vector(-0.35930563, 0.0, 0.93321994)
    )));
    assert_eq!(t.filter, Color::grey(0.81));
    assert_eq!(t.steps, 3);
}
