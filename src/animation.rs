//! Scene choreography.
//!
//! The [`AnimationController`] turns high-level requests (explode a letter
//! group, fly to a section, run the intro) into tweens, timelines and timers.
//! Everything is advanced by [`AnimationController::animate`] with the frame's
//! `dt`; the cues the world has to react to are handed back from there.

use std::{
    collections::HashMap,
    f32::consts::{PI, TAU},
};

use rand::{Rng, SeedableRng, rngs::StdRng, seq::IndexedRandom};

use crate::{
    config::{PaletteOptions, TimingOptions},
    input::LetterMeshes,
    schedule::Timers,
    tween::{
        Animatable, Ease, GroupId, NodeRef, Position, Property, Repeat, Target, Timeline, Tween,
        TweenManager, Value,
    },
    world::Section,
};

const FLOAT_AMPLITUDE: f32 = 1.0;
const FLOAT_DURATION: f32 = 0.8;
const FLOAT_DELAY: f32 = 0.5;

const EXPLODE_RADIUS: f32 = 1.5;
const EXPLODE_DURATION: f32 = 1.2;
const EXPLODE_STAGGER: f32 = 0.03;
const IMPLODE_DURATION: f32 = 1.5;

const HOP_HEIGHT: f32 = 0.6;
const HOP_DURATION: f32 = 0.3;
const HOP_STAGGER: f32 = 0.06;

const FLICKER_STEPS: [f32; 7] = [1.0, 0.0, 1.0, 0.0, 0.6, 0.0, 1.0];
const FLICKER_ORB_STAGGER: f32 = 0.15;
const COLOR_CYCLE_STEP: f32 = 1.5;

const INTRO_FLIGHT: f32 = 4.0;
const INTRO_PITCH: f32 = 3.0;
const INTRO_EXPOSURE: f32 = 2.0;
const INTRO_FLICKER_AT: f32 = 2.5;
const INTRO_WALL_AT: f32 = 3.5;
const INTRO_WALL_DURATION: f32 = 1.5;

#[derive(Debug, Clone, PartialEq)]
pub enum Cue {
    IntroFinished,
    SectionShown(Section),
    PosterShown(String),
    IdleBurst,
    HopLanded(NodeRef),
    Imploded(NodeRef),
    ColorCycle(NodeRef),
}

impl Cue {
    /// Cues the controller consumes itself.
    fn is_internal(&self) -> bool {
        matches!(
            self,
            Cue::IdleBurst | Cue::HopLanded(_) | Cue::Imploded(_) | Cue::ColorCycle(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: [f32; 3],
    /// Radians.
    pub yaw: f32,
    /// Radians.
    pub pitch: f32,
}

/// Everything the intro touches.
#[derive(Debug, Clone)]
pub struct IntroPlan {
    pub from: CameraPose,
    pub to: CameraPose,
    pub exposure: f32,
    /// The wall and the scale it grows to.
    pub wall: Option<(NodeRef, [f32; 3])>,
    pub orbs: Vec<NodeRef>,
}

#[derive(Debug, Clone, Copy)]
struct RestPose {
    position: Value,
    rotation: Value,
    emissive: Value,
}

pub struct AnimationController {
    tweens: TweenManager<Cue>,
    timers: Timers<Cue>,
    rng: StdRng,
    palette: [[f32; 3]; 3],
    letters: LetterMeshes,
    rest: HashMap<NodeRef, RestPose>,
    idle_running: bool,
    idle_interval: f32,
    /// The running idle burst and the meshes it lifted.
    burst: Option<(GroupId, Vec<NodeRef>)>,
    section_flight: f32,
    pending: Vec<Cue>,
}

impl AnimationController {
    pub fn new(palette: &PaletteOptions, timings: &TimingOptions) -> Self {
        Self::with_rng(palette, timings, StdRng::from_os_rng())
    }

    /// A controller with reproducible randomness.
    pub fn with_seed(palette: &PaletteOptions, timings: &TimingOptions, seed: u64) -> Self {
        Self::with_rng(palette, timings, StdRng::seed_from_u64(seed))
    }

    fn with_rng(palette: &PaletteOptions, timings: &TimingOptions, rng: StdRng) -> Self {
        Self {
            tweens: TweenManager::new(),
            timers: Timers::new(),
            rng,
            palette: palette.letter_colors,
            letters: LetterMeshes::new(),
            rest: HashMap::new(),
            idle_running: false,
            idle_interval: timings.idle_interval,
            burst: None,
            section_flight: timings.section_flight,
            pending: Vec::new(),
        }
    }

    pub fn letter_colors(&self) -> &[[f32; 3]; 3] {
        &self.palette
    }

    pub fn tweens(&self) -> &TweenManager<Cue> {
        &self.tweens
    }

    pub fn is_idle_running(&self) -> bool {
        self.idle_running
    }

    /// Records the rest pose of every letter mesh and starts its float.
    pub fn init_letter_animations<A: Animatable + ?Sized>(
        &mut self,
        letter_meshes: &LetterMeshes,
        scene: &A,
    ) {
        self.letters = letter_meshes.clone();
        for mesh in letter_meshes.values().flatten() {
            let target = Target::Node(mesh.clone());
            let (Some(position), Some(rotation)) = (
                scene.read(&target, Property::Position),
                scene.read(&target, Property::Rotation),
            ) else {
                log::warn!("letter mesh {:?} has no transform; not animating it", mesh);
                continue;
            };
            let emissive = scene
                .read(&target, Property::Emissive)
                .unwrap_or_default();
            self.rest.insert(
                mesh.clone(),
                RestPose {
                    position,
                    rotation,
                    emissive,
                },
            );
            self.start_float(mesh);
        }
        log::debug!("{} letter meshes floating", self.rest.len());
    }

    fn start_float(&mut self, mesh: &NodeRef) {
        let Some(rest) = self.rest.get(mesh) else {
            return;
        };
        let [x, y, z] = rest.position.xyz();
        let offset = [
            self.rng.random::<f32>() - 0.5,
            self.rng.random::<f32>() - 0.5,
            self.rng.random::<f32>(),
        ];
        let to = [
            x + offset[0] * FLOAT_AMPLITUDE,
            y + offset[1] * FLOAT_AMPLITUDE,
            z + offset[2] * FLOAT_AMPLITUDE,
        ];
        self.tweens.add(
            Tween::to(Target::Node(mesh.clone()), Property::Position, to)
                .duration(FLOAT_DURATION)
                .ease(Ease::InOutBack)
                .delay(FLOAT_DELAY)
                .yoyo(true)
                .repeat(Repeat::Infinite),
        );
    }

    fn random_direction(&mut self) -> [f32; 3] {
        let z: f32 = self.rng.random_range(-1.0..=1.0);
        let theta: f32 = self.rng.random_range(0.0..TAU);
        let r = (1.0 - z * z).max(0.0).sqrt();
        [r * theta.cos(), r * theta.sin(), z]
    }

    pub fn explode_letter(&mut self, meshes: &[NodeRef]) {
        for (i, mesh) in meshes.iter().enumerate() {
            let target = Target::Node(mesh.clone());
            self.tweens.kill_target(&target);
            let Some(rest) = self.rest.get(mesh).copied() else {
                continue;
            };
            let direction = self.random_direction();
            let [x, y, z] = rest.position.xyz();
            let position = [
                x + direction[0] * EXPLODE_RADIUS,
                y + direction[1] * EXPLODE_RADIUS,
                z + direction[2] * EXPLODE_RADIUS,
            ];
            let rotation = [
                self.rng.random_range(-PI..PI),
                self.rng.random_range(-PI..PI),
                self.rng.random_range(-PI..PI),
            ];
            let delay = EXPLODE_STAGGER * i as f32;
            let flash = self.palette[i % self.palette.len()];
            self.tweens.add(
                Tween::to(target.clone(), Property::Position, position)
                    .duration(EXPLODE_DURATION)
                    .ease(Ease::OutExpo)
                    .delay(delay),
            );
            self.tweens.add(
                Tween::to(target.clone(), Property::Rotation, rotation)
                    .duration(EXPLODE_DURATION)
                    .ease(Ease::OutExpo)
                    .delay(delay),
            );
            self.tweens.add(
                Tween::to(target, Property::Emissive, flash)
                    .duration(EXPLODE_DURATION / 2.0)
                    .ease(Ease::OutExpo)
                    .delay(delay),
            );
        }
    }

    pub fn implode_letter(&mut self, meshes: &[NodeRef]) {
        for mesh in meshes {
            let target = Target::Node(mesh.clone());
            self.tweens.kill_target(&target);
            let Some(rest) = self.rest.get(mesh).copied() else {
                continue;
            };
            self.tweens.add(
                Tween::to(target.clone(), Property::Position, rest.position)
                    .duration(IMPLODE_DURATION)
                    .ease(Ease::OutElastic)
                    .on_complete(Cue::Imploded(mesh.clone())),
            );
            self.tweens.add(
                Tween::to(target.clone(), Property::Rotation, rest.rotation)
                    .duration(IMPLODE_DURATION)
                    .ease(Ease::OutElastic),
            );
            self.tweens.add(
                Tween::to(target, Property::Emissive, rest.emissive)
                    .duration(IMPLODE_DURATION / 2.0)
                    .ease(Ease::OutQuad),
            );
        }
    }

    pub fn explode_group(&mut self, group: &str) {
        match self.letters.get(group).cloned() {
            Some(meshes) => self.explode_letter(&meshes),
            None => log::warn!("no letter group called {}", group),
        }
    }

    pub fn implode_group(&mut self, group: &str) {
        match self.letters.get(group).cloned() {
            Some(meshes) => self.implode_letter(&meshes),
            None => log::warn!("no letter group called {}", group),
        }
    }

    /// Schedules the next idle burst. Restarting an already running loop only
    /// pushes the next burst back.
    pub fn start_idle_loop(&mut self) {
        self.timers.cancel_where(|cue| *cue == Cue::IdleBurst);
        self.timers.schedule(self.idle_interval, Cue::IdleBurst);
        self.idle_running = true;
    }

    pub fn stop_idle_animation(&mut self) {
        if !self.idle_running {
            return;
        }
        self.idle_running = false;
        self.timers.cancel_where(|cue| *cue == Cue::IdleBurst);
        if let Some((group, meshes)) = self.burst.take() {
            self.tweens.kill_group(group);
            // hops cut short never land
            for mesh in &meshes {
                if !self.tweens.is_target_active(&Target::Node(mesh.clone())) {
                    self.start_float(mesh);
                }
            }
        }
        log::debug!("idle animation stopped");
    }

    pub fn resume_idle(&mut self) {
        if !self.idle_running {
            self.start_idle_loop();
        }
    }

    fn idle_burst(&mut self) {
        if !self.idle_running {
            return;
        }
        let groups: Vec<String> = self.letters.keys().cloned().collect();
        if let Some(group) = groups.choose(&mut self.rng) {
            let meshes = self.letters.get(group).cloned().unwrap_or_default();
            let mut timeline = Timeline::new();
            let hops = meshes
                .iter()
                .filter_map(|mesh| Some((mesh, self.rest.get(mesh)?.position.xyz())))
                .map(|(mesh, [x, y, z])| {
                    self.tweens.kill_target(&Target::Node(mesh.clone()));
                    Tween::to(
                        Target::Node(mesh.clone()),
                        Property::Position,
                        [x, y + HOP_HEIGHT, z],
                    )
                    .duration(HOP_DURATION)
                    .ease(Ease::OutQuad)
                    .yoyo(true)
                    .repeat(Repeat::Times(1))
                    .repeat_delay(0.0)
                    .on_complete(Cue::HopLanded(mesh.clone()))
                })
                .collect::<Vec<_>>();
            timeline.stagger(hops, HOP_STAGGER, Position::Start);
            log::debug!("idle burst on {}", group);
            self.burst = Some((timeline.play(&mut self.tweens), meshes));
        }
        self.timers.schedule(self.idle_interval, Cue::IdleBurst);
    }

    /// Flickers every orb on, then holds it lit in its palette colour.
    pub fn flicker_lights(&mut self, orbs: &[NodeRef], start: f32) {
        let mut timeline = Timeline::new();
        for (i, orb) in orbs.iter().enumerate() {
            let target = Target::Node(orb.clone());
            let colour = self.palette[i % self.palette.len()];
            let mut at = start + i as f32 * FLICKER_ORB_STAGGER + self.rng.random::<f32>() * 0.3;
            for step in FLICKER_STEPS {
                let spacing = self.rng.random_range(0.05..0.15);
                timeline.add_at(
                    Tween::to(target.clone(), Property::EmissiveIntensity, step).duration(spacing),
                    Position::At(at),
                );
                at += spacing;
            }
            timeline.add_at(
                Tween::to(target.clone(), Property::Emissive, colour).duration(0.5),
                Position::At(at),
            );
            timeline.add_at(
                Tween::to(target, Property::Tint, colour).duration(0.5),
                Position::At(at),
            );
        }
        timeline.play(&mut self.tweens);
    }

    /// Fades the node's emission in, then cycles its colour through the
    /// palette and back, forever.
    pub fn init_emissive_color_animation(&mut self, node: &NodeRef) {
        let target = Target::Node(node.clone());
        let mut timeline = Timeline::new();
        timeline
            .add(Tween::from_to(target.clone(), Property::Emissive, self.palette[0], self.palette[0]))
            .add(
                Tween::from_to(target, Property::EmissiveIntensity, 0.0f32, 1.0f32)
                    .duration(1.0)
                    .ease(Ease::InOutSine),
            )
            .call(Cue::ColorCycle(node.clone()), Position::End);
        timeline.play(&mut self.tweens);
    }

    fn color_cycle(&mut self, node: &NodeRef) {
        let target = Target::Node(node.clone());
        let [a, b, c] = self.palette;
        let mut timeline = Timeline::new();
        for colour in [b, c, b, a] {
            timeline.add(
                Tween::to(target.clone(), Property::Emissive, colour)
                    .duration(COLOR_CYCLE_STEP)
                    .ease(Ease::InOutSine),
            );
        }
        timeline.call(Cue::ColorCycle(node.clone()), Position::End);
        timeline.play(&mut self.tweens);
    }

    /// Camera flight from the intro pose, exposure fade-in, light flicker and
    /// the wall growing in. Ends with [`Cue::IntroFinished`].
    pub fn init_intro_animation(&mut self, plan: &IntroPlan) -> GroupId {
        let mut timeline = Timeline::new();
        timeline
            .add_at(
                Tween::from_to(Target::Camera, Property::Position, plan.from.position, plan.to.position)
                    .duration(INTRO_FLIGHT)
                    .ease(Ease::InOutCubic),
                Position::Start,
            )
            .add_at(
                Tween::from_to(
                    Target::Camera,
                    Property::Orientation,
                    [plan.from.yaw, plan.from.pitch],
                    [plan.to.yaw, plan.to.pitch],
                )
                .duration(INTRO_PITCH)
                .ease(Ease::InOutQuad),
                Position::Start,
            )
            .add_at(
                Tween::from_to(Target::Renderer, Property::Exposure, 0.0f32, plan.exposure)
                    .duration(INTRO_EXPOSURE)
                    .ease(Ease::InOutSine),
                Position::Start,
            );
        if let Some((wall, scale)) = &plan.wall {
            timeline.add_at(
                Tween::from_to(Target::Node(wall.clone()), Property::Scale, [0.0f32; 3], *scale)
                    .duration(INTRO_WALL_DURATION)
                    .ease(Ease::OutBack),
                Position::At(INTRO_WALL_AT),
            );
        }
        timeline.call(Cue::IntroFinished, Position::End);
        log::debug!("intro runs for {:.1}s", timeline.duration());
        let group = timeline.play(&mut self.tweens);
        self.flicker_lights(&plan.orbs, INTRO_FLICKER_AT);
        group
    }

    /// Flies the camera to `checkpoint`; [`Cue::SectionShown`] fires on arrival.
    pub fn navigate_to<A: Animatable + ?Sized>(
        &mut self,
        section: Section,
        checkpoint: CameraPose,
        scene: &A,
    ) {
        self.tweens.kill_target(&Target::Camera);
        let yaw = match scene.read(&Target::Camera, Property::Orientation) {
            Some(current) => nearest_angle(current.scalar(), checkpoint.yaw),
            None => checkpoint.yaw,
        };
        self.tweens.add(
            Tween::to(Target::Camera, Property::Position, checkpoint.position)
                .duration(self.section_flight)
                .ease(Ease::InOutCubic),
        );
        self.tweens.add(
            Tween::to(Target::Camera, Property::Orientation, [yaw, checkpoint.pitch])
                .duration(self.section_flight)
                .ease(Ease::InOutCubic)
                .on_complete(Cue::SectionShown(section)),
        );
        log::info!("navigating to {}", section);
    }

    pub fn show_poster_section(&mut self, name: &str) {
        self.pending.push(Cue::PosterShown(name.to_owned()));
    }

    /// Advances timers and tweens by `dt` seconds.
    pub fn animate<A: Animatable + ?Sized>(&mut self, dt: f32, scene: &mut A) -> Vec<Cue> {
        let mut cues = std::mem::take(&mut self.pending);
        cues.extend(self.timers.advance(dt));
        cues.extend(self.tweens.update(dt, scene));

        let (internal, external): (Vec<Cue>, Vec<Cue>) =
            cues.into_iter().partition(Cue::is_internal);
        for cue in internal {
            match cue {
                Cue::IdleBurst => self.idle_burst(),
                Cue::HopLanded(mesh) | Cue::Imploded(mesh) => self.start_float(&mesh),
                Cue::ColorCycle(node) => self.color_cycle(&node),
                _ => (),
            }
        }
        external
    }
}

/// `to`, shifted by whole turns to lie within half a turn of `from`.
fn nearest_angle(from: f32, to: f32) -> f32 {
    let delta = (to - from).rem_euclid(TAU);
    if delta > PI {
        from + delta - TAU
    } else {
        from + delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_angle_takes_the_short_way_round() {
        assert!((nearest_angle(0.0, 1.5 * PI) - (-0.5 * PI)).abs() < 1e-5);
        assert!((nearest_angle(3.0, -3.0) - (TAU - 3.0)).abs() < 1e-5);
        assert!((nearest_angle(0.2, 0.4) - 0.4).abs() < 1e-5);
    }
}
