mod common;

use std::f32::consts::TAU;

use common::scene::{MockScene, assert_close};
use kleczewsky_world::{
    animation::{AnimationController, CameraPose, Cue, IntroPlan},
    config::{PaletteOptions, TimingOptions},
    input::LetterMeshes,
    tween::{NodeRef, Property, Target},
    world::Section,
};

fn controller() -> AnimationController {
    AnimationController::with_seed(&PaletteOptions::default(), &TimingOptions::default(), 7)
}

fn mesh(i: usize) -> NodeRef {
    NodeRef::new(0, vec![0, i])
}

fn node(r: &NodeRef) -> Target {
    Target::Node(r.clone())
}

fn assert_vec_close(actual: [f32; 3], expected: [f32; 3]) {
    for (a, e) in actual.iter().zip(expected) {
        assert_close(*a, e);
    }
}

fn distance(a: [f32; 3], b: [f32; 3]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(a, b)| (a - b) * (a - b))
        .sum::<f32>()
        .sqrt()
}

/// Two meshes spelling `AGroup`, resting at x = 0 and x = 1.
fn letters() -> (LetterMeshes, MockScene) {
    let mut meshes = LetterMeshes::new();
    meshes.insert("AGroup".to_owned(), vec![mesh(0), mesh(1)]);
    let scene = (0..2).fold(MockScene::default(), |scene, i| {
        let target = node(&mesh(i));
        scene
            .with(target.clone(), Property::Position, [i as f32, 0.0, 0.0])
            .with(target.clone(), Property::Rotation, [0.0f32; 3])
            .with(target, Property::Emissive, [0.0f32; 3])
    });
    (meshes, scene)
}

fn position(scene: &MockScene, r: &NodeRef) -> [f32; 3] {
    scene.get(&node(r), Property::Position).unwrap().xyz()
}

#[test]
fn should_float_every_letter_mesh_with_a_transform() {
    let (mut meshes, scene) = letters();
    meshes.get_mut("AGroup").unwrap().push(mesh(9));
    let mut animation = controller();

    animation.init_letter_animations(&meshes, &scene);
    assert_eq!(animation.tweens().len(), 2);
    assert!(animation.tweens().is_target_active(&node(&mesh(0))));
    assert!(!animation.tweens().is_target_active(&node(&mesh(9))));
}

#[test]
fn should_explode_away_and_implode_back_to_rest() {
    let (meshes, mut scene) = letters();
    let mut animation = controller();
    animation.init_letter_animations(&meshes, &scene);

    animation.explode_group("AGroup");
    assert!(animation.animate(2.0, &mut scene).is_empty());
    for i in 0..2 {
        let moved = distance(position(&scene, &mesh(i)), [i as f32, 0.0, 0.0]);
        assert!((moved - 1.5).abs() < 1e-3, "mesh {} moved {}", i, moved);
    }
    let flash = scene.get(&node(&mesh(1)), Property::Emissive).unwrap().xyz();
    assert_vec_close(flash, animation.letter_colors()[1]);

    animation.implode_group("AGroup");
    assert!(animation.animate(1.5, &mut scene).is_empty());
    for i in 0..2 {
        assert_vec_close(position(&scene, &mesh(i)), [i as f32, 0.0, 0.0]);
    }
    // back to floating
    assert_eq!(animation.tweens().len(), 2);
}

#[test]
fn should_ignore_unknown_groups() {
    let (meshes, scene) = letters();
    let mut animation = controller();
    animation.init_letter_animations(&meshes, &scene);

    animation.explode_group("ZGroup");
    assert_eq!(animation.tweens().len(), 2);
}

#[test]
fn should_hop_letters_while_idle() {
    let (meshes, mut scene) = letters();
    let mut animation = controller();
    animation.init_letter_animations(&meshes, &scene);
    animation.start_idle_loop();
    assert!(animation.is_idle_running());

    assert!(animation.animate(6.0, &mut scene).is_empty());
    assert_eq!(animation.tweens().len(), 2);
    // hops peak above the rest pose
    animation.animate(0.3, &mut scene);
    assert_vec_close(position(&scene, &mesh(0)), [0.0, 0.6, 0.0]);

    assert!(animation.animate(1.0, &mut scene).is_empty());
    // landed and floating again
    assert_eq!(animation.tweens().len(), 2);
}

#[test]
fn should_stop_idling_until_resumed() {
    let (meshes, mut scene) = letters();
    let mut animation = controller();
    animation.init_letter_animations(&meshes, &scene);
    animation.start_idle_loop();
    animation.animate(6.1, &mut scene);

    animation.stop_idle_animation();
    animation.stop_idle_animation();
    assert!(!animation.is_idle_running());
    assert_eq!(animation.tweens().len(), 2);

    // no further bursts
    animation.animate(12.0, &mut scene);
    assert_eq!(animation.tweens().len(), 2);

    animation.resume_idle();
    assert!(animation.is_idle_running());
}

fn intro_scene(orbs: &[NodeRef], wall: &NodeRef) -> MockScene {
    let scene = MockScene::default()
        .with(Target::Camera, Property::Position, [0.0f32; 3])
        .with(Target::Camera, Property::Orientation, [0.0f32; 2])
        .with(Target::Renderer, Property::Exposure, 0.0f32)
        .with(node(wall), Property::Scale, [0.0f32; 3]);
    orbs.iter().fold(scene, |scene, orb| {
        scene
            .with(node(orb), Property::EmissiveIntensity, 0.0f32)
            .with(node(orb), Property::Emissive, [0.0f32; 3])
            .with(node(orb), Property::Tint, [0.0f32; 3])
    })
}

#[test]
fn should_fly_in_and_light_the_scene() {
    let orbs = vec![NodeRef::new(2, vec![]), NodeRef { instance: 1, ..NodeRef::new(2, vec![]) }];
    let wall = NodeRef::new(1, vec![0]);
    let mut scene = intro_scene(&orbs, &wall);
    let plan = IntroPlan {
        from: CameraPose {
            position: [0.0, 2.0, 90.0],
            yaw: -TAU / 4.0,
            pitch: -TAU / 4.0,
        },
        to: CameraPose {
            position: [0.0, 2.0, 22.0],
            yaw: -TAU / 4.0,
            pitch: 0.0,
        },
        exposure: 1.2,
        wall: Some((wall.clone(), [2.0, 2.0, 2.0])),
        orbs: orbs.clone(),
    };
    let mut animation = controller();

    animation.init_intro_animation(&plan);
    assert!(animation.animate(4.9, &mut scene).is_empty());
    assert_eq!(animation.animate(0.2, &mut scene), vec![Cue::IntroFinished]);

    let camera = scene.get(&Target::Camera, Property::Position).unwrap().xyz();
    assert_vec_close(camera, [0.0, 2.0, 22.0]);
    assert_close(scene.scalar(&Target::Renderer, Property::Exposure), 1.2);
    assert_vec_close(scene.get(&node(&wall), Property::Scale).unwrap().xyz(), [2.0; 3]);
    for (i, orb) in orbs.iter().enumerate() {
        assert_close(scene.scalar(&node(orb), Property::EmissiveIntensity), 1.0);
        let colour = animation.letter_colors()[i];
        assert_vec_close(scene.get(&node(orb), Property::Tint).unwrap().xyz(), colour);
    }
    assert!(animation.tweens().is_empty());
}

#[test]
fn should_turn_the_short_way_to_a_section() {
    let mut scene = MockScene::default()
        .with(Target::Camera, Property::Position, [0.0f32; 3])
        .with(Target::Camera, Property::Orientation, [3.0f32, 0.0]);
    let mut animation = controller();
    let checkpoint = CameraPose {
        position: [5.0, 1.0, -4.0],
        yaw: -3.0,
        pitch: 0.25,
    };

    animation.navigate_to(Section::Contact, checkpoint, &scene);
    assert!(animation.animate(1.0, &mut scene).is_empty());
    let [yaw, _] = scene.get(&Target::Camera, Property::Orientation).unwrap().xy();
    assert!(yaw > 3.0, "turned the long way: {}", yaw);

    assert_eq!(
        animation.animate(1.0, &mut scene),
        vec![Cue::SectionShown(Section::Contact)]
    );
    let [yaw, pitch] = scene.get(&Target::Camera, Property::Orientation).unwrap().xy();
    assert_close(yaw, TAU - 3.0);
    assert_close(pitch, 0.25);
    assert_vec_close(
        scene.get(&Target::Camera, Property::Position).unwrap().xyz(),
        [5.0, 1.0, -4.0],
    );
}

#[test]
fn should_replace_a_running_flight() {
    let mut scene = MockScene::default()
        .with(Target::Camera, Property::Position, [0.0f32; 3])
        .with(Target::Camera, Property::Orientation, [0.0f32, 0.0]);
    let mut animation = controller();
    let pose = |x: f32| CameraPose {
        position: [x, 0.0, 0.0],
        yaw: 0.0,
        pitch: 0.0,
    };

    animation.navigate_to(Section::Contact, pose(10.0), &scene);
    animation.animate(1.0, &mut scene);
    animation.navigate_to(Section::Projects, pose(-10.0), &scene);
    assert_eq!(animation.tweens().len(), 2);
    assert_eq!(
        animation.animate(2.0, &mut scene),
        vec![Cue::SectionShown(Section::Projects)]
    );
}

#[test]
fn should_cycle_decoration_colours() {
    let decoration = NodeRef::new(1, vec![3]);
    let mut scene = MockScene::default()
        .with(node(&decoration), Property::Emissive, [0.0f32; 3])
        .with(node(&decoration), Property::EmissiveIntensity, 0.0f32);
    let mut animation = controller();
    let [a, b, c] = *animation.letter_colors();

    animation.init_emissive_color_animation(&decoration);
    assert!(animation.animate(1.0, &mut scene).is_empty());
    assert_close(scene.scalar(&node(&decoration), Property::EmissiveIntensity), 1.0);
    assert_vec_close(scene.get(&node(&decoration), Property::Emissive).unwrap().xyz(), a);

    animation.animate(1.5, &mut scene);
    assert_vec_close(scene.get(&node(&decoration), Property::Emissive).unwrap().xyz(), b);
    animation.animate(1.5, &mut scene);
    assert_vec_close(scene.get(&node(&decoration), Property::Emissive).unwrap().xyz(), c);

    animation.animate(6.0, &mut scene);
    assert!(!animation.tweens().is_empty());
}

#[test]
fn should_queue_poster_cues_for_the_next_frame() {
    let mut scene = MockScene::default();
    let mut animation = controller();
    animation.show_poster_section("poster-1");
    assert_eq!(
        animation.animate(0.0, &mut scene),
        vec![Cue::PosterShown("poster-1".to_owned())]
    );
    assert!(animation.animate(0.0, &mut scene).is_empty());
}
