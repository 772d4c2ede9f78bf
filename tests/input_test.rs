use cgmath::{Deg, Matrix4, Point3, Rad, Vector3};
use kleczewsky_world::{
    camera::{Camera, Projection},
    config::{ParallaxOptions, TimingOptions},
    input::{InputAction, InputController, LetterMeshes, PickKind},
    raycast::{Aabb, PickTarget},
    tween::NodeRef,
    world::Section,
};

const WIDTH: f32 = 800.0;
const HEIGHT: f32 = 600.0;
// window x of the boxes at x = ±2 seen from (0, 0, 10)
const LEFT: f32 = 322.0;
const RIGHT: f32 = 478.0;

fn camera() -> Camera {
    Camera::new((0.0, 0.0, 10.0), Rad::from(Deg(-90.0f32)), Rad(0.0))
}

fn projection() -> Projection {
    Projection::new(WIDTH as u32, HEIGHT as u32, Deg(75.0f32), 0.1, 100.0)
}

fn target(id: u32, x: f32) -> PickTarget {
    PickTarget {
        id,
        world: Matrix4::from_translation(Vector3::new(x, 0.0, 0.0)),
        bounds: Aabb::new(Point3::new(-0.5, -0.5, -0.5), Point3::new(0.5, 0.5, 0.5)),
    }
}

/// `A` sits at the centre, `B` on the right and the contact trigger on the left.
fn controller(parallax: ParallaxOptions) -> (InputController, Vec<PickTarget>) {
    let mut letters = LetterMeshes::new();
    letters.insert("AGroup".to_owned(), vec![NodeRef::new(0, vec![0])]);
    letters.insert("BGroup".to_owned(), vec![NodeRef::new(0, vec![1])]);
    let mut input = InputController::new(&parallax, &TimingOptions::default());
    input.setup_raycaster_objects(
        &letters,
        [(
            PickKind::Trigger {
                section: Section::Contact,
            },
            NodeRef::new(0, vec![2]),
        )],
    );
    (input, vec![target(1, 0.0), target(2, 2.0), target(3, -2.0)])
}

fn still() -> ParallaxOptions {
    ParallaxOptions {
        factor_x: 0.0,
        factor_y: 0.0,
        lerp: 0.1,
    }
}

#[test]
fn should_register_letters_before_extras() {
    let (input, _) = controller(still());
    let kinds: Vec<_> = input.pickables().iter().map(|p| (p.id, p.kind.clone())).collect();
    assert_eq!(
        kinds,
        vec![
            (1, PickKind::Letter { group: "AGroup".to_owned() }),
            (2, PickKind::Letter { group: "BGroup".to_owned() }),
            (3, PickKind::Trigger { section: Section::Contact }),
        ]
    );
}

#[test]
fn should_ignore_the_pointer_while_controls_are_disabled() {
    let (mut input, targets) = controller(ParallaxOptions::default());
    let mut camera = camera();
    input.on_pointer_move(WIDTH / 2.0, HEIGHT / 2.0, WIDTH, HEIGHT);

    assert!(input.on_click(&camera, &projection(), &targets).is_empty());
    assert!(input.update(0.1, &mut camera, &projection(), &targets).is_empty());
    assert_eq!(camera, self::camera());
}

#[test]
fn should_explode_a_hovered_letter_once() {
    let (mut input, targets) = controller(still());
    let mut camera = camera();
    input.set_controls_enabled(true);
    input.on_pointer_move(WIDTH / 2.0, HEIGHT / 2.0, WIDTH, HEIGHT);

    assert_eq!(
        input.update(0.25, &mut camera, &projection(), &targets),
        vec![
            InputAction::Enter(1),
            InputAction::StopIdle,
            InputAction::Explode("AGroup".to_owned()),
        ]
    );
    assert_eq!(
        input.update(0.25, &mut camera, &projection(), &targets),
        vec![InputAction::StopIdle]
    );
    assert_eq!(input.hovered(), Some(1));
    assert_eq!(input.exploded(), ["AGroup".to_owned()]);
}

#[test]
fn should_implode_after_the_pointer_rests_elsewhere() {
    let (mut input, targets) = controller(still());
    let mut camera = camera();
    input.set_controls_enabled(true);
    input.on_pointer_move(WIDTH / 2.0, HEIGHT / 2.0, WIDTH, HEIGHT);
    input.update(0.25, &mut camera, &projection(), &targets);

    input.on_pointer_move(WIDTH / 2.0, 20.0, WIDTH, HEIGHT);
    assert_eq!(
        input.update(0.25, &mut camera, &projection(), &targets),
        vec![InputAction::Exit(1)]
    );
    for _ in 0..2 {
        assert!(input.update(0.25, &mut camera, &projection(), &targets).is_empty());
    }
    assert_eq!(
        input.update(0.25, &mut camera, &projection(), &targets),
        vec![
            InputAction::Implode("AGroup".to_owned()),
            InputAction::ResumeIdle,
        ]
    );
    assert!(input.exploded().is_empty());
}

#[test]
fn should_wait_the_full_debounce_after_the_last_hover() {
    let mut timings = TimingOptions::default();
    timings.implode_debounce = 1.0;
    let mut letters = LetterMeshes::new();
    letters.insert("AGroup".to_owned(), vec![NodeRef::new(0, vec![0])]);
    let mut input = InputController::new(&still(), &timings);
    input.setup_raycaster_objects(&letters, Vec::<(PickKind, NodeRef)>::new());
    let targets = vec![target(1, 0.0)];
    let mut camera = camera();
    input.set_controls_enabled(true);

    input.on_pointer_move(WIDTH / 2.0, HEIGHT / 2.0, WIDTH, HEIGHT);
    // a long frame right before the hover must not eat into the wait
    input.update(0.5, &mut camera, &projection(), &targets);
    input.on_pointer_move(WIDTH / 2.0, 20.0, WIDTH, HEIGHT);

    let mut elapsed = 0.0;
    loop {
        let actions = input.update(0.1, &mut camera, &projection(), &targets);
        elapsed += 0.1;
        if actions.contains(&InputAction::Implode("AGroup".to_owned())) {
            break;
        }
        assert!(elapsed < 2.0, "no implode within 2s");
    }
    assert!(elapsed >= 1.0 - 1e-4, "imploded after {}s", elapsed);
}

#[test]
fn should_stagger_implosions_in_explode_order() {
    let (mut input, targets) = controller(still());
    let mut camera = camera();
    input.set_controls_enabled(true);

    input.on_pointer_move(WIDTH / 2.0, HEIGHT / 2.0, WIDTH, HEIGHT);
    input.on_click(&camera, &projection(), &targets);
    input.on_pointer_move(RIGHT, HEIGHT / 2.0, WIDTH, HEIGHT);
    assert_eq!(
        input.on_click(&camera, &projection(), &targets),
        vec![
            InputAction::Click(2),
            InputAction::StopIdle,
            InputAction::Explode("BGroup".to_owned()),
        ]
    );

    input.on_pointer_move(WIDTH / 2.0, 20.0, WIDTH, HEIGHT);
    for _ in 0..3 {
        assert!(input.update(0.25, &mut camera, &projection(), &targets).is_empty());
    }
    assert_eq!(
        input.update(0.25, &mut camera, &projection(), &targets),
        vec![InputAction::Implode("AGroup".to_owned())]
    );
    assert_eq!(
        input.update(0.25, &mut camera, &projection(), &targets),
        vec![
            InputAction::Implode("BGroup".to_owned()),
            InputAction::ResumeIdle,
        ]
    );
}

#[test]
fn should_navigate_through_triggers() {
    let (mut input, targets) = controller(still());
    input.set_controls_enabled(true);
    input.on_pointer_move(LEFT, HEIGHT / 2.0, WIDTH, HEIGHT);

    assert_eq!(
        input.on_click(&camera(), &projection(), &targets),
        vec![InputAction::Click(3), InputAction::Navigate(Section::Contact)]
    );
}

#[test]
fn should_leave_hovered_targets_when_controls_turn_off() {
    let (mut input, targets) = controller(still());
    let mut camera = camera();
    input.set_controls_enabled(true);
    input.on_pointer_move(LEFT, HEIGHT / 2.0, WIDTH, HEIGHT);
    assert_eq!(
        input.update(0.1, &mut camera, &projection(), &targets),
        vec![InputAction::Enter(3)]
    );

    assert_eq!(input.set_controls_enabled(false), vec![InputAction::Exit(3)]);
    assert_eq!(input.hovered(), None);
    assert!(!input.controls_enabled());
}

#[test]
fn should_drift_the_camera_with_the_pointer() {
    let (mut input, _) = controller(ParallaxOptions::default());
    let mut camera = camera();
    input.set_controls_enabled(true);
    input.on_pointer_move(WIDTH, HEIGHT / 2.0, WIDTH, HEIGHT);
    input.update(0.016, &mut camera, &projection(), &[]);

    // factor_x is negative: moving right pushes the camera left
    assert!(camera.position.x < 0.0, "{:?}", camera.position);
    let towards_origin = Point3::new(0.0, 0.0, 0.0) - camera.position;
    let forward = camera.forward();
    let alignment = cgmath::InnerSpace::dot(forward, cgmath::InnerSpace::normalize(towards_origin));
    assert!(alignment > 0.999);
}
