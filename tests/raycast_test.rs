use cgmath::{Deg, Matrix4, Point3, Rad, Vector2, Vector3};
use kleczewsky_world::{
    camera::{Camera, Projection},
    raycast::{Aabb, PickTarget, Ray, intersect, nearest},
};

fn unit_box() -> Aabb {
    Aabb::new(Point3::new(-0.5, -0.5, -0.5), Point3::new(0.5, 0.5, 0.5))
}

fn target_at(id: u32, x: f32, y: f32, z: f32) -> PickTarget {
    PickTarget {
        id,
        world: Matrix4::from_translation(Vector3::new(x, y, z)),
        bounds: unit_box(),
    }
}

fn forward_ray() -> Ray {
    Ray::new(Point3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, -1.0))
}

#[test]
fn should_return_hits_nearest_first() {
    let targets = [target_at(1, 0.0, 0.0, -10.0), target_at(2, 0.0, 0.0, -5.0)];

    let hits = intersect(&forward_ray(), &targets);
    assert_eq!(hits.iter().map(|h| h.id).collect::<Vec<_>>(), vec![2, 1]);
    assert!((hits[0].distance - 4.5).abs() < 1e-5);
    assert!((hits[0].point.z + 4.5).abs() < 1e-5);
}

#[test]
fn should_skip_targets_behind_or_beside_the_ray() {
    let targets = [target_at(1, 0.0, 0.0, 5.0), target_at(2, 3.0, 0.0, -5.0)];
    assert_eq!(nearest(&forward_ray(), &targets), None);
}

#[test]
fn should_hit_scaled_targets_in_model_space() {
    let ray = Ray::new(Point3::new(1.5, 0.0, 0.0), Vector3::new(0.0, 0.0, -1.0));
    let narrow = target_at(1, 3.0, 0.0, -5.0);
    let wide = PickTarget {
        world: Matrix4::from_translation(Vector3::new(3.0, 0.0, -5.0))
            * Matrix4::from_nonuniform_scale(4.0, 1.0, 1.0),
        ..narrow
    };

    assert_eq!(nearest(&ray, &[narrow]), None);
    let hit = nearest(&ray, &[wide]).expect("the stretched box is in the way");
    assert!((hit.distance - 4.5).abs() < 1e-4);
}

#[test]
fn should_report_zero_from_inside_a_box() {
    let hit = nearest(&forward_ray(), &[target_at(7, 0.0, 0.0, 0.0)]).expect("inside the box");
    assert_eq!(hit.id, 7);
    assert_eq!(hit.distance, 0.0);
}

#[test]
fn should_ignore_degenerate_transforms() {
    let flat = PickTarget {
        world: Matrix4::from_nonuniform_scale(1.0, 0.0, 1.0),
        ..target_at(1, 0.0, 0.0, 0.0)
    };
    assert!(intersect(&forward_ray(), &[flat]).is_empty());
}

#[test]
fn should_cast_through_the_screen_centre() {
    let camera = Camera::new((0.0, 0.0, 10.0), Rad::from(Deg(-90.0f32)), Rad(0.0));
    let projection = Projection::new(800, 600, Deg(75.0f32), 0.1, 100.0);
    let targets = [target_at(3, 0.0, 0.0, 0.0)];

    let ray = camera
        .ray_through(Vector2::new(0.0, 0.0), &projection)
        .expect("invertible view projection");
    assert!(ray.direction.z < -0.999);
    let hit = nearest(&ray, &targets).expect("box in the centre of the view");
    assert_eq!(hit.id, 3);
    assert!((hit.point.z - 0.5).abs() < 1e-2, "{:?}", hit.point);

    let corner = camera
        .ray_through(Vector2::new(0.9, 0.9), &projection)
        .expect("invertible view projection");
    assert_eq!(nearest(&corner, &targets), None);
}

#[test]
fn should_bound_transformed_boxes() {
    let moved = unit_box().transformed(&Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0)));
    assert_eq!(moved.center(), Point3::new(1.0, 2.0, 3.0));
    let both = unit_box().union(&moved);
    assert_eq!(both.min, Point3::new(-0.5, -0.5, -0.5));
    assert_eq!(both.max, Point3::new(1.5, 2.5, 3.5));
    assert_eq!(Aabb::from_points(Vec::<[f32; 3]>::new()), None);
}
