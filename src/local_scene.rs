use crate::component::Component;
use crate::consts::{ HIT_EPSILON, DEPARTED_EPSILON };
use crate::error::{ OpticsError, Result };
use crate::ray::Ray4D;
use crate::shape::Shape;
use crate::tuple::Tuple4D;
use crate::voxellation::{ Voxellation, VoxelIndex };

/// Names a surface of a local scene.
///
/// Dividing surfaces are named by family and surface number rather than by
/// the shape itself, since their shapes are rebuilt on every step.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceId {
    Boundary,
    Divider { family: usize, surface: i64 },
    Component,
}

/// The closest hit in a local scene.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SceneHit {
    pub t: f64,
    pub surface: SurfaceId,
    pub point: Tuple4D,

    /// Outward normal of the surface that was hit, not oriented to the ray.
    pub normal: Tuple4D,

    /// The component's outward normal, when the hit surface is the boundary
    /// or a divider and the component's surface passes through the same
    /// point. A lenslet filling its cell shares its faces with the dividers.
    pub coincident_component: Option<Tuple4D>,
}

/// The handful of surfaces a ray inside one voxel can possibly hit next: the
/// boundary, the two bounding surfaces of the voxel in every family, and the
/// voxel's component, if it has one.
#[derive(Debug)]
pub struct LocalScene<'a> {
    boundary: &'a Shape,
    dividers: Vec<(SurfaceId, Shape)>,
    component: Option<&'a Component>,
}

impl<'a> LocalScene<'a> {
    pub fn assemble(boundary: &'a Shape, voxellations: &[Box<dyn Voxellation>],
        index: &VoxelIndex, component: Option<&'a Component>)
        -> Result<LocalScene<'a>> {
        if index.0.len() != voxellations.len() {
            return Err(OpticsError::InvalidVoxellation(format!(
                "voxel index {} does not match {} families",
                index, voxellations.len()
            )));
        }

        let mut dividers = Vec::with_capacity(2 * voxellations.len());
        for (family, (v, &k)) in voxellations.iter().zip(index.0.iter()).enumerate() {
            let (lower, upper) = v.bounding_surfaces_of(k)?;

            dividers.push((SurfaceId::Divider { family, surface: v.surface_id(k) }, lower));
            dividers.push((SurfaceId::Divider { family, surface: v.surface_id(k + 1) }, upper));
        }

        Ok(LocalScene { boundary, dividers, component })
    }

    /// The nearest surface in front of `ray`.
    ///
    /// Hits closer than `HIT_EPSILON` are ignored; hits on the `departed`
    /// surfaces are ignored closer than `DEPARTED_EPSILON`, so a ray that has
    /// just crossed or reflected off a surface does not find it again. When
    /// the boundary and a dividing surface coincide, the boundary wins; when
    /// either coincides with the component, the hit reports the component in
    /// `coincident_component`.
    pub fn closest_hit(&self, ray: &Ray4D, departed: &[SurfaceId])
        -> Option<SceneHit> {
        let mut surfaces: Vec<(SurfaceId, &Shape)> = vec![(SurfaceId::Boundary, self.boundary)];
        surfaces.extend(self.dividers.iter().map(|(id, s)| (*id, s)));
        if let Some(c) = self.component {
            surfaces.push((SurfaceId::Component, &c.solid));
        }

        let mut closest: Option<(f64, SurfaceId, &Shape)> = None;
        for (id, shape) in surfaces {
            let t_min = if departed.contains(&id) { DEPARTED_EPSILON } else { HIT_EPSILON };

            let t = match shape.intersect(ray).hit(t_min) {
                Some(i) => i.t,
                None => continue,
            };

            match closest {
                Some((best, _, _)) if t >= best - HIT_EPSILON => (),
                _ => closest = Some((t, id, shape)),
            }
        }

        closest.map(|(t, surface, shape)| {
            let point = ray.position(t);
            let coincident_component = match self.component {
                Some(c) if surface != SurfaceId::Component => c.solid.intersect(ray)
                    .intersections
                    .iter()
                    .any(|i| (i.t - t).abs() < HIT_EPSILON)
                    .then(|| c.solid.normal_at(point)),
                _ => None,
            };

            SceneHit {
                t,
                surface,
                point,
                normal: shape.normal_at(point),
                coincident_component,
            }
        })
    }
}

#[cfg(test)]
use crate::voxellation::{ ParallelPlanes, RadialPlanes };

#[cfg(test)]
fn slab_scene_parts() -> (Shape, Vec<Box<dyn Voxellation>>) {
    let boundary = Shape::cuboid(
        Tuple4D::point(-1.0, -1.0, 0.0),
        Tuple4D::point(1.0, 1.0, 2.0)
    ).unwrap();
    let planes: Vec<Box<dyn Voxellation>> = vec![Box::new(ParallelPlanes::new(
        Tuple4D::origin(), Tuple4D::vector(0.0, 0.0, 1.0), 1.0
    ).unwrap())];

    (boundary, planes)
}

#[test]
fn closest_hit_finds_next_divider() {
    let (boundary, planes) = slab_scene_parts();
    let scene = LocalScene::assemble(
        &boundary, &planes, &VoxelIndex(vec![0]), None
    ).unwrap();
    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, 0.25), Tuple4D::vector(0.0, 0.0, 1.0)
    );

    let hit = scene.closest_hit(&r, &[]).unwrap();
    assert_eq!(hit.surface, SurfaceId::Divider { family: 0, surface: 1 });
    assert!(crate::feq(hit.t, 0.75));
    assert_eq!(hit.normal, Tuple4D::vector(0.0, 0.0, 1.0));
}

#[test]
fn boundary_wins_over_coincident_divider() {
    let (boundary, planes) = slab_scene_parts();
    let scene = LocalScene::assemble(
        &boundary, &planes, &VoxelIndex(vec![1]), None
    ).unwrap();
    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, 1.5), Tuple4D::vector(0.0, 0.0, 1.0)
    );

    let hit = scene.closest_hit(&r, &[]).unwrap();
    assert_eq!(hit.surface, SurfaceId::Boundary);
    assert!(crate::feq(hit.t, 0.5));
}

#[test]
fn departed_surface_is_skipped() {
    let (boundary, planes) = slab_scene_parts();
    let scene = LocalScene::assemble(
        &boundary, &planes, &VoxelIndex(vec![1]), None
    ).unwrap();

    // Sitting on plane 1, a hair behind it numerically.
    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, 1.0 - 1.0e-7), Tuple4D::vector(0.0, 0.0, 1.0)
    );
    let departed = SurfaceId::Divider { family: 0, surface: 1 };

    let hit = scene.closest_hit(&r, &[departed]).unwrap();
    assert_eq!(hit.surface, SurfaceId::Boundary);
}

#[test]
fn component_joins_the_scene() {
    let (boundary, planes) = slab_scene_parts();
    let lens = Component::new(
        Shape::sphere_at(Tuple4D::point(0.0, 0.0, 0.5), 0.25).unwrap(), 1.5, 1.0
    );
    let scene = LocalScene::assemble(
        &boundary, &planes, &VoxelIndex(vec![0]), Some(&lens)
    ).unwrap();
    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, 0.0), Tuple4D::vector(0.0, 0.0, 1.0)
    );

    let hit = scene.closest_hit(&r, &[SurfaceId::Boundary]).unwrap();
    assert_eq!(hit.surface, SurfaceId::Component);
    assert!(crate::feq(hit.t, 0.25));
    assert_eq!(hit.normal, Tuple4D::vector(0.0, 0.0, -1.0));
    assert_eq!(hit.coincident_component, None);
}

#[test]
fn divider_reports_a_component_face_lying_on_it() {
    let (boundary, planes) = slab_scene_parts();
    let block = Component::new(
        Shape::cuboid(Tuple4D::point(-0.5, -0.5, 0.0), Tuple4D::point(0.5, 0.5, 1.0)).unwrap(),
        1.5, 1.0
    );
    let scene = LocalScene::assemble(
        &boundary, &planes, &VoxelIndex(vec![0]), Some(&block)
    ).unwrap();
    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, 0.25), Tuple4D::vector(0.0, 0.0, 1.0)
    );

    let hit = scene.closest_hit(&r, &[]).unwrap();
    assert_eq!(hit.surface, SurfaceId::Divider { family: 0, surface: 1 });
    assert_eq!(hit.coincident_component, Some(Tuple4D::vector(0.0, 0.0, 1.0)));
}

#[test]
fn radial_seam_has_one_name() {
    let boundary = Shape::cube();
    let spokes: Vec<Box<dyn Voxellation>> = vec![Box::new(RadialPlanes::new(
        Tuple4D::origin(), Tuple4D::vector(0.0, 0.0, 1.0), Tuple4D::vector(1.0, 0.0, 0.0), 6
    ).unwrap())];
    let last = LocalScene::assemble(&boundary, &spokes, &VoxelIndex(vec![5]), None).unwrap();
    let first = LocalScene::assemble(&boundary, &spokes, &VoxelIndex(vec![0]), None).unwrap();

    // Leaving sector 5 through the seam at y = 0 ...
    let r = Ray4D::new(Tuple4D::point(0.5, -0.5, 0.0), Tuple4D::vector(0.0, 1.0, 0.0));
    let hit = last.closest_hit(&r, &[]).unwrap();
    assert_eq!(hit.surface, SurfaceId::Divider { family: 0, surface: 0 });

    // ... and, once departed, is skipped from sector 0 too.
    let behind_seam = Ray4D::new(Tuple4D::point(0.5, -1.0e-6, 0.0), Tuple4D::vector(0.0, 1.0, 0.0));
    let next = first.closest_hit(&behind_seam, &[hit.surface]).unwrap();
    assert_eq!(next.surface, SurfaceId::Divider { family: 0, surface: 1 });
}

#[test]
fn mismatched_index_is_rejected() {
    let (boundary, planes) = slab_scene_parts();

    assert!(LocalScene::assemble(
        &boundary, &planes, &VoxelIndex(vec![0, 0]), None
    ).is_err());
}
