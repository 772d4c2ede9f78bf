mod common;

use common::scene::{MockScene, assert_close, node};
use kleczewsky_world::tween::{Ease, Position, Property, Repeat, Timeline, Tween, TweenManager};

#[derive(Debug, Clone, PartialEq)]
enum Cue {
    Started,
    Repeated,
    Done,
    Called(u32),
}

#[test]
fn should_interpolate_from_the_current_value() {
    let target = node(1);
    let mut scene = MockScene::default().with(target.clone(), Property::EmissiveIntensity, 2.0f32);
    let mut tweens: TweenManager<Cue> = TweenManager::new();
    tweens.add(
        Tween::to(target.clone(), Property::EmissiveIntensity, 4.0f32)
            .duration(1.0)
            .ease(Ease::Linear),
    );

    tweens.update(0.5, &mut scene);
    assert_close(scene.scalar(&target, Property::EmissiveIntensity), 3.0);
    tweens.update(0.5, &mut scene);
    assert_close(scene.scalar(&target, Property::EmissiveIntensity), 4.0);
    assert!(tweens.is_empty());
}

#[test]
fn should_read_the_start_value_once_the_delay_elapsed() {
    let target = node(1);
    let mut scene = MockScene::default().with(target.clone(), Property::Position, [0.0f32; 3]);
    let mut tweens: TweenManager<Cue> = TweenManager::new();
    tweens.add(Tween::to(target.clone(), Property::Position, [4.0f32, 0.0, 0.0]).duration(1.0));
    tweens.add(
        Tween::to(target.clone(), Property::Position, [4.0f32, 8.0, 0.0])
            .duration(1.0)
            .delay(1.0),
    );

    tweens.update(1.0, &mut scene);
    assert_close(scene.get(&target, Property::Position).unwrap().xyz()[0], 4.0);
    tweens.update(0.5, &mut scene);
    let [x, y, _] = scene.get(&target, Property::Position).unwrap().xyz();
    assert_close(x, 4.0);
    assert_close(y, 4.0);
}

#[test]
fn should_yoyo_back_and_fire_cues_in_order() {
    let target = node(2);
    let mut scene = MockScene::default().with(target.clone(), Property::Scale, 0.0f32);
    let mut tweens: TweenManager<Cue> = TweenManager::new();
    tweens.add(
        Tween::to(target.clone(), Property::Scale, 10.0f32)
            .duration(1.0)
            .repeat(Repeat::Times(1))
            .yoyo(true)
            .on_start(Cue::Started)
            .on_repeat(Cue::Repeated)
            .on_complete(Cue::Done),
    );

    assert_eq!(tweens.update(0.25, &mut scene), vec![Cue::Started]);
    assert_eq!(tweens.update(1.25, &mut scene), vec![Cue::Repeated]);
    assert_close(scene.scalar(&target, Property::Scale), 5.0);
    assert_eq!(tweens.update(0.5, &mut scene), vec![Cue::Done]);
    assert_close(scene.scalar(&target, Property::Scale), 0.0);
    assert!(tweens.is_empty());
}

#[test]
fn should_drop_tweens_of_unreadable_properties() {
    let mut scene = MockScene::default();
    let mut tweens: TweenManager<Cue> = TweenManager::new();
    tweens.add(
        Tween::to(node(9), Property::Tint, [1.0f32; 3])
            .duration(1.0)
            .on_complete(Cue::Done),
    );

    assert!(tweens.update(0.1, &mut scene).is_empty());
    assert!(tweens.is_empty());
    assert_eq!(scene.writes, 0);
}

#[test]
fn should_stop_killed_properties_only() {
    let target = node(3);
    let mut scene = MockScene::default()
        .with(target.clone(), Property::Position, [0.0f32; 3])
        .with(target.clone(), Property::Scale, 1.0f32);
    let mut tweens: TweenManager<Cue> = TweenManager::new();
    tweens.add(Tween::to(target.clone(), Property::Position, [2.0f32; 3]).duration(1.0));
    let scale = tweens.add(Tween::to(target.clone(), Property::Scale, 3.0f32).duration(1.0));

    tweens.update(0.5, &mut scene);
    assert_eq!(tweens.kill_property(&target, Property::Position), 1);
    tweens.update(0.5, &mut scene);

    assert_close(scene.get(&target, Property::Position).unwrap().xyz()[0], 1.0);
    assert_close(scene.scalar(&target, Property::Scale), 3.0);
    assert!(!tweens.is_active(scale));
}

#[test]
fn should_repeat_infinitely_until_killed() {
    let target = node(4);
    let mut scene = MockScene::default().with(target.clone(), Property::Exposure, 0.0f32);
    let mut tweens: TweenManager<Cue> = TweenManager::new();
    let id = tweens.add(
        Tween::to(target.clone(), Property::Exposure, 1.0f32)
            .duration(0.5)
            .repeat(Repeat::Infinite)
            .on_repeat(Cue::Repeated),
    );

    let repeats = (0..8)
        .flat_map(|_| tweens.update(0.5, &mut scene))
        .filter(|cue| *cue == Cue::Repeated)
        .count();
    assert_eq!(repeats, 8);
    assert!(tweens.kill(id));
    assert!(tweens.is_empty());
}

#[test]
fn should_sequence_timeline_entries() {
    let a = node(1);
    let b = node(2);
    let mut scene = MockScene::default()
        .with(a.clone(), Property::Scale, 0.0f32)
        .with(b.clone(), Property::Scale, 0.0f32);

    let mut timeline = Timeline::new();
    timeline
        .add(Tween::to(a.clone(), Property::Scale, 1.0f32).duration(1.0))
        .label("second", Position::End)
        .add(Tween::to(b.clone(), Property::Scale, 1.0f32).duration(1.0))
        .call(Cue::Called(1), Position::Label("second".to_owned()))
        .call(Cue::Called(2), Position::End);
    assert_close(timeline.duration(), 2.0);
    assert_eq!(timeline.label_time("second"), Some(1.0));
    assert_eq!(timeline.len(), 4);

    let mut tweens = TweenManager::new();
    let group = timeline.play(&mut tweens);

    assert!(tweens.update(0.5, &mut scene).is_empty());
    assert_close(scene.scalar(&a, Property::Scale), 0.5);
    assert_close(scene.scalar(&b, Property::Scale), 0.0);

    assert_eq!(tweens.update(1.0, &mut scene), vec![Cue::Called(1)]);
    assert_close(scene.scalar(&a, Property::Scale), 1.0);
    assert_close(scene.scalar(&b, Property::Scale), 0.5);

    assert_eq!(tweens.update(0.5, &mut scene), vec![Cue::Called(2)]);
    assert!(!tweens.is_group_active(group));
}

#[test]
fn should_stagger_and_kill_a_timeline_group() {
    let targets = [node(1), node(2), node(3)];
    let mut scene = targets.iter().fold(MockScene::default(), |scene, t| {
        scene.with(t.clone(), Property::EmissiveIntensity, 0.0f32)
    });

    let mut timeline = Timeline::new();
    timeline.stagger(
        targets
            .iter()
            .map(|t| Tween::to(t.clone(), Property::EmissiveIntensity, 1.0f32).duration(1.0)),
        0.5,
        Position::Start,
    );
    assert_close(timeline.duration(), 2.0);

    let mut tweens: TweenManager<Cue> = TweenManager::new();
    let group = timeline.play(&mut tweens);
    tweens.update(0.5, &mut scene);
    assert_close(scene.scalar(&targets[0], Property::EmissiveIntensity), 0.5);
    assert_close(scene.scalar(&targets[1], Property::EmissiveIntensity), 0.0);

    assert_eq!(tweens.kill_group(group), 3);
    tweens.update(1.0, &mut scene);
    assert_close(scene.scalar(&targets[0], Property::EmissiveIntensity), 0.5);
    assert!(!tweens.is_target_active(&targets[2]));
}
