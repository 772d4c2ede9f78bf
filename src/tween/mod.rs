//! Property tweening for the scene graph, the camera and the renderer.
//!
//! A [`Tween`] describes how one property of one [`Target`] moves towards a
//! value over time. The [`TweenManager`] advances every running tween by an
//! explicit `dt` and writes the interpolated values through the [`Animatable`]
//! trait, which the world implements for its stage. Tweens can carry cues of an
//! arbitrary type `C`; cues that fire during a step are returned from
//! [`TweenManager::update`] in the order they fired.
//!
//! # Key types
//!
//! - [`Tween<C>`] is the builder describing a single animation
//! - [`TweenManager<C>`] owns and advances the running tweens
//! - [`Timeline<C>`] sequences tweens relative to each other
//! - [`Ease`] maps normalized time onto progress
//!
//! Start values are read lazily once a tween's delay has elapsed, so tweens
//! queued behind each other pick up where the previous one left off.

mod ease;
mod timeline;

pub use ease::Ease;
pub use timeline::{Position, Timeline};

/// Up to four animated components; unused components are ignored on write.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Value(pub [f32; 4]);

impl Value {
    pub fn lerp(self, to: Value, t: f32) -> Value {
        let mut out = [0.0; 4];
        for (i, o) in out.iter_mut().enumerate() {
            *o = self.0[i] + (to.0[i] - self.0[i]) * t;
        }
        Value(out)
    }

    pub fn scalar(&self) -> f32 {
        self.0[0]
    }

    pub fn xy(&self) -> [f32; 2] {
        [self.0[0], self.0[1]]
    }

    pub fn xyz(&self) -> [f32; 3] {
        [self.0[0], self.0[1], self.0[2]]
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value([v, 0.0, 0.0, 0.0])
    }
}

impl From<[f32; 2]> for Value {
    fn from(v: [f32; 2]) -> Self {
        Value([v[0], v[1], 0.0, 0.0])
    }
}

impl From<[f32; 3]> for Value {
    fn from(v: [f32; 3]) -> Self {
        Value([v[0], v[1], v[2], 0.0])
    }
}

impl From<[f32; 4]> for Value {
    fn from(v: [f32; 4]) -> Self {
        Value(v)
    }
}

impl From<cgmath::Vector3<f32>> for Value {
    fn from(v: cgmath::Vector3<f32>) -> Self {
        Value([v.x, v.y, v.z, 0.0])
    }
}

/// Addresses one instance of one node in the scene graph: the scene root, the
/// child-index path below it and the instance slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub root: usize,
    pub path: Vec<usize>,
    pub instance: usize,
}

impl NodeRef {
    pub fn new(root: usize, path: Vec<usize>) -> Self {
        Self {
            root,
            path,
            instance: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    Node(NodeRef),
    Camera,
    Renderer,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Property {
    Position,
    /// Euler angles (XYZ order, radians).
    Rotation,
    Scale,
    Tint,
    Emissive,
    EmissiveIntensity,
    /// Camera yaw and pitch in radians.
    Orientation,
    Exposure,
    BloomStrength,
}

/// Anything the tween engine can read from and write to.
pub trait Animatable {
    fn read(&self, target: &Target, property: Property) -> Option<Value>;

    /// Returns `false` if the target or property does not exist.
    fn write(&mut self, target: &Target, property: Property, value: Value) -> bool;
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Repeat {
    #[default]
    Once,
    Times(u32),
    Infinite,
}

#[derive(Debug, Clone)]
enum Action<C> {
    Motion {
        target: Target,
        property: Property,
        from: Option<Value>,
        to: Value,
    },
    Call(Option<C>),
}

/// Describes a single animation. Built with the chained setters and handed to
/// a [`TweenManager`] or a [`Timeline`].
#[derive(Debug, Clone)]
pub struct Tween<C> {
    action: Action<C>,
    duration: f32,
    delay: f32,
    ease: Ease,
    repeat: Repeat,
    repeat_delay: Option<f32>,
    yoyo: bool,
    on_start: Option<C>,
    on_repeat: Option<C>,
    on_complete: Option<C>,
}

impl<C> Tween<C> {
    fn with_action(action: Action<C>) -> Self {
        Self {
            action,
            duration: 0.0,
            delay: 0.0,
            ease: Ease::Linear,
            repeat: Repeat::Once,
            repeat_delay: None,
            yoyo: false,
            on_start: None,
            on_repeat: None,
            on_complete: None,
        }
    }

    /// Animate from whatever the property holds when the tween starts.
    pub fn to(target: Target, property: Property, value: impl Into<Value>) -> Self {
        Self::with_action(Action::Motion {
            target,
            property,
            from: None,
            to: value.into(),
        })
    }

    pub fn from_to(
        target: Target,
        property: Property,
        from: impl Into<Value>,
        to: impl Into<Value>,
    ) -> Self {
        Self::with_action(Action::Motion {
            target,
            property,
            from: Some(from.into()),
            to: to.into(),
        })
    }

    /// Fires `cue` once when the delay has elapsed.
    pub fn call(cue: C) -> Self {
        Self::with_action(Action::Call(Some(cue)))
    }

    pub fn duration(mut self, secs: f32) -> Self {
        self.duration = secs.max(0.0);
        self
    }

    pub fn delay(mut self, secs: f32) -> Self {
        self.delay = secs.max(0.0);
        self
    }

    pub fn ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    pub fn repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    /// Pause before each repeat. Defaults to the delay.
    pub fn repeat_delay(mut self, secs: f32) -> Self {
        self.repeat_delay = Some(secs.max(0.0));
        self
    }

    pub fn yoyo(mut self, yoyo: bool) -> Self {
        self.yoyo = yoyo;
        self
    }

    pub fn on_start(mut self, cue: C) -> Self {
        self.on_start = Some(cue);
        self
    }

    pub fn on_repeat(mut self, cue: C) -> Self {
        self.on_repeat = Some(cue);
        self
    }

    pub fn on_complete(mut self, cue: C) -> Self {
        self.on_complete = Some(cue);
        self
    }

    pub fn target(&self) -> Option<(&Target, Property)> {
        match &self.action {
            Action::Motion {
                target, property, ..
            } => Some((target, *property)),
            Action::Call(_) => None,
        }
    }

    /// Seconds from the start of the delay until the last cycle ends. Infinite
    /// tweens report a single cycle.
    pub fn span(&self) -> f32 {
        let cycles = match self.repeat {
            Repeat::Once | Repeat::Infinite => 0,
            Repeat::Times(n) => n,
        };
        self.delay
            + self.duration
            + cycles as f32 * (self.duration + self.repeat_delay.unwrap_or(self.delay))
    }

    /// Pushes the start back by `secs` without changing the pause between repeats.
    pub(crate) fn shifted(mut self, secs: f32) -> Self {
        if self.repeat_delay.is_none() {
            self.repeat_delay = Some(self.delay);
        }
        self.delay += secs.max(0.0);
        self
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TweenId(u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(u64);

#[derive(Debug, Copy, Clone, PartialEq)]
enum Phase {
    Waiting(f32),
    Running,
    Done,
}

struct Running<C> {
    id: TweenId,
    group: Option<GroupId>,
    tween: Tween<C>,
    phase: Phase,
    clock: f32,
    cycle: u32,
    reversed: bool,
    started: bool,
}

impl<C: Clone> Running<C> {
    fn step<A: Animatable + ?Sized>(&mut self, dt: f32, scene: &mut A, fired: &mut Vec<C>) {
        self.clock += dt;
        loop {
            match self.phase {
                Phase::Waiting(wait) => {
                    if self.clock < wait {
                        return;
                    }
                    self.clock -= wait;
                    if !self.started && !self.begin(scene, fired) {
                        self.phase = Phase::Done;
                        return;
                    }
                    if matches!(self.tween.action, Action::Call(_)) {
                        self.finish(fired);
                        return;
                    }
                    self.phase = Phase::Running;
                }
                Phase::Running => {
                    let duration = self.tween.duration;
                    if self.clock < duration {
                        self.apply(scene, self.clock / duration);
                        return;
                    }
                    self.clock -= duration;
                    self.apply(scene, 1.0);
                    if !self.has_more_cycles() {
                        self.finish(fired);
                        return;
                    }
                    self.cycle += 1;
                    if self.tween.yoyo {
                        self.reversed = !self.reversed;
                    }
                    if let Some(cue) = &self.tween.on_repeat {
                        fired.push(cue.clone());
                    }
                    let wait = self.tween.repeat_delay.unwrap_or(self.tween.delay);
                    self.phase = Phase::Waiting(wait);
                    if duration + wait <= f32::EPSILON {
                        // zero-length cycles advance once per step
                        self.clock = 0.0;
                        return;
                    }
                }
                Phase::Done => return,
            }
        }
    }

    fn begin<A: Animatable + ?Sized>(&mut self, scene: &mut A, fired: &mut Vec<C>) -> bool {
        self.started = true;
        match &mut self.tween.action {
            Action::Motion {
                target,
                property,
                from,
                ..
            } => {
                if from.is_none() {
                    match scene.read(target, *property) {
                        Some(value) => *from = Some(value),
                        None => {
                            log::warn!(
                                "Dropping tween of {:?} on {:?}: the property can't be read.",
                                property,
                                target
                            );
                            return false;
                        }
                    }
                }
            }
            Action::Call(cue) => {
                if let Some(cue) = cue.take() {
                    fired.push(cue);
                }
            }
        }
        if let Some(cue) = self.tween.on_start.take() {
            fired.push(cue);
        }
        true
    }

    fn apply<A: Animatable + ?Sized>(&self, scene: &mut A, progress: f32) {
        if let Action::Motion {
            target,
            property,
            from: Some(from),
            to,
        } = &self.tween.action
        {
            let eased = self.tween.ease.sample(progress);
            let value = if self.reversed {
                to.lerp(*from, eased)
            } else {
                from.lerp(*to, eased)
            };
            if !scene.write(target, *property, value) {
                log::debug!("{:?} of {:?} is not writable", property, target);
            }
        }
    }

    fn has_more_cycles(&self) -> bool {
        match self.tween.repeat {
            Repeat::Once => false,
            Repeat::Times(n) => self.cycle < n,
            Repeat::Infinite => true,
        }
    }

    fn finish(&mut self, fired: &mut Vec<C>) {
        self.phase = Phase::Done;
        if let Some(cue) = self.tween.on_complete.take() {
            fired.push(cue);
        }
    }

    fn animates(&self, target: &Target) -> bool {
        matches!(&self.tween.action, Action::Motion { target: t, .. } if t == target)
    }
}

/// Owns and advances running tweens.
pub struct TweenManager<C> {
    running: Vec<Running<C>>,
    next_id: u64,
    next_group: u64,
}

impl<C> Default for TweenManager<C> {
    fn default() -> Self {
        Self {
            running: Vec::new(),
            next_id: 0,
            next_group: 0,
        }
    }
}

impl<C: Clone> TweenManager<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, tween: Tween<C>) -> TweenId {
        self.insert(tween, None)
    }

    pub fn add_grouped(&mut self, tween: Tween<C>, group: GroupId) -> TweenId {
        self.insert(tween, Some(group))
    }

    pub fn new_group(&mut self) -> GroupId {
        self.next_group += 1;
        GroupId(self.next_group)
    }

    fn insert(&mut self, tween: Tween<C>, group: Option<GroupId>) -> TweenId {
        self.next_id += 1;
        let id = TweenId(self.next_id);
        self.running.push(Running {
            id,
            group,
            phase: Phase::Waiting(tween.delay),
            tween,
            clock: 0.0,
            cycle: 0,
            reversed: false,
            started: false,
        });
        id
    }

    /// Advances every tween by `dt` seconds and returns the cues fired meanwhile.
    pub fn update<A: Animatable + ?Sized>(&mut self, dt: f32, scene: &mut A) -> Vec<C> {
        let mut fired = Vec::new();
        for running in self.running.iter_mut() {
            running.step(dt, scene, &mut fired);
        }
        self.running.retain(|r| r.phase != Phase::Done);
        fired
    }

    pub fn kill(&mut self, id: TweenId) -> bool {
        let before = self.running.len();
        self.running.retain(|r| r.id != id);
        before != self.running.len()
    }

    pub fn kill_group(&mut self, group: GroupId) -> usize {
        self.kill_where(|r| r.group == Some(group))
    }

    pub fn kill_target(&mut self, target: &Target) -> usize {
        self.kill_where(|r| r.animates(target))
    }

    pub fn kill_property(&mut self, target: &Target, property: Property) -> usize {
        self.kill_where(|r| r.tween.target() == Some((target, property)))
    }

    fn kill_where(&mut self, predicate: impl Fn(&Running<C>) -> bool) -> usize {
        let before = self.running.len();
        self.running.retain(|r| !predicate(r));
        before - self.running.len()
    }

    pub fn is_active(&self, id: TweenId) -> bool {
        self.running.iter().any(|r| r.id == id)
    }

    pub fn is_group_active(&self, group: GroupId) -> bool {
        self.running.iter().any(|r| r.group == Some(group))
    }

    pub fn is_target_active(&self, target: &Target) -> bool {
        self.running.iter().any(|r| r.animates(target))
    }

    pub fn len(&self) -> usize {
        self.running.len()
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_empty()
    }

    pub fn clear(&mut self) {
        self.running.clear();
    }
}
