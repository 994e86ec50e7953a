use voxel_optics::absorber::Absorber;
use voxel_optics::color::{ Color, Sentinels };
use voxel_optics::matrix::{ Matrix3D, Matrix4D };
use voxel_optics::metric::MetricMedium;
use voxel_optics::physics::{ uniform, ParameterRule, VoxelPhysics };
use voxel_optics::ray::Ray4D;
use voxel_optics::refraction::Transmission;
use voxel_optics::refractor::Refractor;
use voxel_optics::shape::Shape;
use voxel_optics::tuple::Tuple4D;
use voxel_optics::volume::{ OpticalVolume, Outcome, VolumeConfig, VoxellatedVolume };
use voxel_optics::voxellation::{ ConcentricSpheres, ParallelPlanes, RadialPlanes, VoxelIndex, Voxellation };
use voxel_optics::world::{ Renderer, World };
use voxel_optics::feq;

/// The box `-1..1 x -1..1 x 0..2`, cut into slabs of `spacing` along z.
fn slab_stack<P: VoxelPhysics>(spacing: f64, physics: P) -> VoxellatedVolume<P> {
    let boundary = Shape::cuboid(
        Tuple4D::point(-1.0, -1.0, 0.0),
        Tuple4D::point(1.0, 1.0, 2.0)
    ).unwrap();
    let planes: Vec<Box<dyn Voxellation>> = vec![Box::new(ParallelPlanes::new(
        Tuple4D::origin(), Tuple4D::vector(0.0, 0.0, 1.0), spacing
    ).unwrap())];

    VoxellatedVolume::new(boundary, planes, physics).unwrap()
}

/// Where `ray` first meets the volume's boundary.
fn boundary_t(volume: &dyn OpticalVolume, ray: &Ray4D) -> f64 {
    volume.boundary().intersect(ray).hit(0.0).expect("Ray should hit the volume.").t
}

fn oblique_rays() -> Vec<Ray4D> {
    vec![
        Ray4D::new(Tuple4D::point(0.0, 0.0, -1.0), Tuple4D::vector(0.0, 0.0, 1.0)),
        Ray4D::new(Tuple4D::point(-0.5, 0.2, -1.0), Tuple4D::vector(0.3, 0.1, 1.0).normalize()),
        Ray4D::new(Tuple4D::point(0.4, -0.3, -0.5), Tuple4D::vector(-0.2, 0.35, 1.0).normalize()),
    ]
}

fn backdrop() -> World {
    let mut w = World::with_background(Color::rgb(0.2, 0.3, 0.9));
    w.add_matte(
        Shape::sphere().with_transform(
            Matrix4D::translation(0.5, 0.0, 6.0) * Matrix4D::scaling(1.5, 1.5, 1.5)
        ).unwrap(),
        Color::rgb(0.9, 0.6, 0.1)
    );

    w
}

#[test]
fn transparent_absorber_is_invisible() {
    let empty = backdrop();
    let mut with_volume = backdrop();
    with_volume.add_volume(slab_stack(0.3, Absorber::new(uniform(Color::black()))));

    for ray in oblique_rays() {
        assert_eq!(with_volume.color_at(ray, 5), empty.color_at(ray, 5));
    }
}

#[test]
fn attenuation_does_not_depend_on_subdivision() {
    let alpha = Color::rgb(0.2, 0.7, 1.3);
    let coarse = slab_stack(1.0, Absorber::new(uniform(alpha)));
    let fine = slab_stack(0.125, Absorber::new(uniform(alpha)));
    let shells = {
        let boundary = Shape::cuboid(
            Tuple4D::point(-1.0, -1.0, 0.0),
            Tuple4D::point(1.0, 1.0, 2.0)
        ).unwrap();
        let spheres: Vec<Box<dyn Voxellation>> = vec![Box::new(ConcentricSpheres::new(
            Tuple4D::point(0.0, 0.0, 1.0), 0.2
        ).unwrap())];

        VoxellatedVolume::new(boundary, spheres, Absorber::new(uniform(alpha))).unwrap()
    };

    for ray in oblique_rays() {
        let a = coarse.trace(&ray, boundary_t(&coarse, &ray));
        let b = fine.trace(&ray, boundary_t(&fine, &ray));
        let c = shells.trace(&ray, boundary_t(&shells, &ray));

        assert!(feq(a.path_length, b.path_length));
        assert!(feq(a.path_length, c.path_length));
        assert_eq!(a.filter, alpha.beer_lambert(a.path_length));
        assert_eq!(a.filter, b.filter);
        assert_eq!(a.filter, c.filter);
        assert!(b.steps > a.steps);
    }
}

#[test]
fn layered_attenuation_sums_optical_depths() {
    let rule = ParameterRule::Layered {
        family: 0,
        first: 0,
        values: vec![Color::grey(0.5), Color::grey(1.0), Color::grey(2.0), Color::grey(4.0)],
    };
    let v = slab_stack(0.5, Absorber::new(rule.into_fn()));

    // At this slope every slab of 0.5 is crossed over the same length.
    let d = Tuple4D::vector(0.3, 0.0, 1.0).normalize();
    let ray = Ray4D::new(Tuple4D::point(-0.5, 0.0, -1.0), d);
    let t = v.trace(&ray, boundary_t(&v, &ray));

    let per_slab = 0.5 / d.z;
    let depth = (0.5 + 1.0 + 2.0 + 4.0) * per_slab;

    assert_eq!(t.filter, Color::grey((-depth).exp()));
    assert!(feq(t.path_length, 4.0 * per_slab));
}

#[test]
fn index_matched_refractor_passes_rays_straight() {
    let v = slab_stack(0.4, Refractor::new(uniform(1.33), 1.33)
        .with_transmission(Transmission::Schlick));

    for ray in oblique_rays() {
        let t = v.trace(&ray, boundary_t(&v, &ray));

        match t.outcome {
            Outcome::Exited(out) => {
                assert_eq!(out.direction, ray.direction.normalize());

                // Still on the incoming line.
                let offset = out.origin - ray.origin;
                assert!(feq(offset.cross(&ray.direction).magnitude(), 0.0));
            },
            other => panic!("Expected the ray to exit, got {:?}", other),
        }

        assert_eq!(t.filter, Color::white());
    }
}

#[test]
fn beyond_critical_angle_reflects_back() {
    // Dense lower slab under a thin upper slab, seen from dense surroundings.
    let v = slab_stack(0.5, Refractor::new(
        ParameterRule::Layered { family: 0, first: 0, values: vec![2.0, 1.0] }.into_fn(),
        2.0
    ));
    let d = Tuple4D::vector(1.0, 0.0, 1.0).normalize();
    let ray = Ray4D::new(Tuple4D::point(-1.0, 0.0, -0.25), d);

    let t = v.trace(&ray, boundary_t(&v, &ray));

    match t.outcome {
        Outcome::Exited(out) => {
            assert!(out.direction.is_finite());
            assert_eq!(out.direction, Tuple4D::vector(1.0, 0.0, -1.0).normalize());
            assert_eq!(out.origin, Tuple4D::point(0.25, 0.0, 0.0));
        },
        other => panic!("Expected a reflected exit, got {:?}", other),
    }
}

#[test]
fn isotropic_metric_matches_refractor() {
    let indices = vec![1.0, 1.3, 1.7, 1.2];
    let tensors: Vec<[f64; 9]> = indices.iter().map(|n| {
        let n2 = n * n;
        [n2, 0.0, 0.0, 0.0, n2, 0.0, 0.0, 0.0, n2]
    }).collect();

    let refractor = slab_stack(0.5, Refractor::new(
        ParameterRule::Layered { family: 0, first: 0, values: indices }.into_fn(),
        1.1
    ).with_transmission(Transmission::Schlick));

    let tensor = ParameterRule::Layered { family: 0, first: 0, values: tensors }.into_fn();
    let metric = slab_stack(0.5, MetricMedium::new(
        move |i: &VoxelIndex| tensor(i).map(Matrix3D::from),
        Matrix3D::isotropic(1.1)
    ).unwrap().with_transmission(Transmission::Schlick));

    for ray in oblique_rays() {
        let a = refractor.trace(&ray, boundary_t(&refractor, &ray));
        let b = metric.trace(&ray, boundary_t(&metric, &ray));

        assert_eq!(a.outcome, b.outcome);
        assert_eq!(a.filter, b.filter);
        assert_eq!(a.steps, b.steps);
    }
}

#[test]
fn trapped_ray_exhausts_its_budget() {
    // Every face of a diamond-like cube is hit beyond the critical angle.
    let budget = 50;
    let boundary = Shape::cube();
    let planes: Vec<Box<dyn Voxellation>> = vec![Box::new(ParallelPlanes::new(
        Tuple4D::origin(), Tuple4D::vector(1.0, 0.0, 0.0), 0.5
    ).unwrap())];
    let v = VoxellatedVolume::new(boundary, planes, Refractor::new(uniform(2.4), 1.0))
        .unwrap()
        .with_config(VolumeConfig { step_budget: budget, ..Default::default() });

    let ray = Ray4D::new(
        Tuple4D::point(0.1, 0.2, 0.3),
        Tuple4D::vector(1.0, 1.0, 1.0).normalize()
    );
    let t = v.trace(&ray, boundary_t(&v, &ray));

    assert_eq!(t.outcome, Outcome::Exhausted);
    assert!(t.steps <= budget);

    let mut w = World::with_background(Color::white());
    w.add_volume(v);
    assert_eq!(w.color_at(ray, 5), Sentinels::default().exhausted);
}

#[test]
fn two_voxel_stack_at_normal_incidence() {
    let window = 0.9;
    let interface = 0.95;

    let v = slab_stack(1.0, Refractor::new(
        ParameterRule::Layered { family: 0, first: 0, values: vec![1.0, 1.5] }.into_fn(),
        1.0
    ).with_transmission(Transmission::Constant(interface)))
        .with_config(VolumeConfig { window_transmission: window, ..Default::default() });

    let ray = Ray4D::new(Tuple4D::point(0.3, -0.2, -1.0), Tuple4D::vector(0.0, 0.0, 1.0));
    let t = v.trace(&ray, boundary_t(&v, &ray));

    assert_eq!(t.outcome, Outcome::Exited(Ray4D::new(
        Tuple4D::point(0.3, -0.2, 2.0), Tuple4D::vector(0.0, 0.0, 1.0)
    )));

    // Air to A is index matched; A to B and B to air are not.
    let expected = window * window * interface * interface;
    assert_eq!(t.filter, Color::grey(expected));

    // One divider and the far boundary; nothing reflected.
    assert_eq!(t.steps, 2);
    assert!(feq(t.path_length, 2.0));

    let mut w = World::with_background(Color::white());
    w.add_volume(v);
    assert_eq!(w.color_at(ray, 5), Color::grey(expected));
}

#[test]
fn crossing_the_radial_seam_is_one_step() {
    let alphas = vec![0.1, 0.2, 0.4, 0.8, 1.6, 3.2];
    let sectors: Vec<Box<dyn Voxellation>> = vec![Box::new(RadialPlanes::new(
        Tuple4D::origin(), Tuple4D::vector(0.0, 0.0, 1.0), Tuple4D::vector(1.0, 0.0, 0.0), 6
    ).unwrap())];
    let rule = ParameterRule::Layered {
        family: 0,
        first: 0,
        values: alphas.iter().map(|a| Color::grey(*a)).collect(),
    };
    let v = VoxellatedVolume::new(Shape::cube(), sectors, Absorber::new(rule.into_fn()))
        .unwrap()
        .with_config(VolumeConfig { record_trajectory: true, ..Default::default() });

    // Sectors 4, 5, 0 and 1 in turn, across the seam at y = 0.
    let ray = Ray4D::new(Tuple4D::point(0.5, -3.0, 0.3), Tuple4D::vector(0.0, 1.0, 0.0));
    let t = v.trace(&ray, boundary_t(&v, &ray));

    let s = 0.5 * 3f64.sqrt();
    let depth = alphas[4] * (1.0 - s) + alphas[5] * s + alphas[0] * s + alphas[1] * (1.0 - s);

    assert_eq!(t.outcome, Outcome::Exited(Ray4D::new(
        Tuple4D::point(0.5, 1.0, 0.3), Tuple4D::vector(0.0, 1.0, 0.0)
    )));
    assert_eq!(t.steps, 4);
    assert_eq!(t.trajectory.map(|p| p.len()), Some(5));
    assert!(feq(t.path_length, 2.0));
    assert_eq!(t.filter, Color::grey((-depth).exp()));
}
