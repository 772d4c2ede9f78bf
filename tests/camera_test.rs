use std::f32::consts::FRAC_PI_2;

use cgmath::{Deg, InnerSpace, Point3, Rad};
use kleczewsky_world::camera::Camera;

fn camera() -> Camera {
    Camera::new((0.0, 2.0, 10.0), Rad::from(Deg(-90.0f32)), Rad(0.0))
}

#[test]
fn should_face_the_target() {
    let mut camera = camera();
    camera.look_at(Point3::new(10.0, 2.0, 10.0));
    assert!(camera.yaw.0.abs() < 1e-5, "{:?}", camera.yaw);
    assert!(camera.pitch.0.abs() < 1e-5, "{:?}", camera.pitch);

    camera.look_at(Point3::new(0.0, 0.0, 0.0));
    let direction = (Point3::new(0.0, 0.0, 0.0) - camera.position).normalize();
    assert!(camera.forward().dot(direction) > 0.9999);
}

#[test]
fn should_keep_the_heading_when_looking_straight_up_or_down() {
    let mut camera = camera();
    let yaw = camera.yaw;

    camera.look_at(Point3::new(0.0, 50.0, 10.0));
    assert_eq!(camera.yaw, yaw);
    assert!(camera.pitch.0 > 0.0 && camera.pitch.0 < FRAC_PI_2, "{:?}", camera.pitch);

    camera.look_at(Point3::new(0.0, -50.0, 10.0));
    assert_eq!(camera.yaw, yaw);
    assert!(camera.pitch.0 < 0.0 && camera.pitch.0 > -FRAC_PI_2, "{:?}", camera.pitch);
}
