//! Pointer tracking and raycast dispatch.
//!
//! The [`InputController`] owns everything the pointer does to the scene: the
//! camera parallax, hover tracking over the registered pickables and the
//! debounced explode/implode cycle of the letter groups. It never touches the
//! scene graph directly; instead it hands [`InputAction`]s back to the world
//! which forwards them to the animation controller.

use std::collections::BTreeMap;

use cgmath::{Point3, Vector2};

use crate::{
    camera::{Camera, Projection},
    config::{ParallaxOptions, TimingOptions},
    raycast::{self, PickId, PickTarget},
    schedule::{Debounce, Timers},
    tween::NodeRef,
    world::Section,
};

/// Letter group name → the meshes spelling it.
pub type LetterMeshes = BTreeMap<String, Vec<NodeRef>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickKind {
    Letter { group: String },
    Trigger { section: Section },
    Poster { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pickable {
    pub id: PickId,
    pub kind: PickKind,
    pub node: NodeRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    Click(PickId),
    Enter(PickId),
    Exit(PickId),
    Explode(String),
    Implode(String),
    StopIdle,
    ResumeIdle,
    Navigate(Section),
    OpenPoster(String),
}

pub struct InputController {
    pointer: Vector2<f32>,
    pointer_previous: Vector2<f32>,
    exploded: Vec<String>,
    target_offset: Vector2<f32>,
    offset: Vector2<f32>,
    enable_controls: bool,
    hovered: Option<PickId>,
    pickables: Vec<Pickable>,
    implode: Debounce,
    implode_stagger: f32,
    staggered: Timers<InputAction>,
    parallax: ParallaxOptions,
}

impl InputController {
    pub fn new(parallax: &ParallaxOptions, timings: &TimingOptions) -> Self {
        Self {
            pointer: Vector2::new(0.0, 0.0),
            pointer_previous: Vector2::new(0.0, 0.0),
            exploded: Vec::new(),
            target_offset: Vector2::new(0.0, 0.0),
            offset: Vector2::new(0.0, 0.0),
            enable_controls: false,
            hovered: None,
            pickables: Vec::new(),
            implode: Debounce::new(timings.implode_debounce),
            implode_stagger: timings.implode_stagger,
            staggered: Timers::new(),
            parallax: parallax.clone(),
        }
    }

    /// Maps a window position to normalized device coordinates.
    pub fn on_pointer_move(&mut self, x: f32, y: f32, width: f32, height: f32) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        self.pointer.x = (x / width) * 2.0 - 1.0;
        self.pointer.y = -(y / height) * 2.0 + 1.0;
    }

    pub fn pointer(&self) -> Vector2<f32> {
        self.pointer
    }

    /// Rebuilds the pickable registry: every mesh of every letter group, then
    /// the `extras` (triggers and posters). Ids are handed out in that order.
    pub fn setup_raycaster_objects(
        &mut self,
        letter_meshes: &LetterMeshes,
        extras: impl IntoIterator<Item = (PickKind, NodeRef)>,
    ) {
        let letters = letter_meshes.iter().flat_map(|(group, meshes)| {
            meshes.iter().map(move |node| {
                (
                    PickKind::Letter {
                        group: group.clone(),
                    },
                    node.clone(),
                )
            })
        });
        self.pickables = letters
            .chain(extras)
            .enumerate()
            .map(|(i, (kind, node))| Pickable {
                id: i as PickId + 1,
                kind,
                node,
            })
            .collect();
        self.hovered = None;
        log::debug!("{} raycaster objects registered", self.pickables.len());
    }

    pub fn pickables(&self) -> &[Pickable] {
        &self.pickables
    }

    pub fn kind(&self, id: PickId) -> Option<&PickKind> {
        self.pickables.iter().find(|p| p.id == id).map(|p| &p.kind)
    }

    pub fn hovered(&self) -> Option<PickId> {
        self.hovered
    }

    pub fn exploded(&self) -> &[String] {
        &self.exploded
    }

    pub fn controls_enabled(&self) -> bool {
        self.enable_controls
    }

    pub fn set_controls_enabled(&mut self, enabled: bool) -> Vec<InputAction> {
        self.enable_controls = enabled;
        let mut actions = Vec::new();
        if !enabled {
            self.set_hovered(None, &mut actions);
        }
        actions
    }

    /// Picks whatever is under the pointer.
    pub fn on_click(
        &mut self,
        camera: &Camera,
        projection: &Projection,
        targets: &[PickTarget],
    ) -> Vec<InputAction> {
        let mut actions = Vec::new();
        if !self.enable_controls {
            return actions;
        }
        let Some(hit) = camera
            .ray_through(self.pointer, projection)
            .and_then(|ray| raycast::nearest(&ray, targets))
        else {
            return actions;
        };
        actions.push(InputAction::Click(hit.id));
        match self.kind(hit.id).cloned() {
            Some(PickKind::Letter { group }) => self.debounced_explode(group, &mut actions),
            Some(PickKind::Trigger { section }) => actions.push(InputAction::Navigate(section)),
            Some(PickKind::Poster { name }) => actions.push(InputAction::OpenPoster(name)),
            None => log::warn!("clicked unregistered pick id {}", hit.id),
        }
        actions
    }

    /// Per-frame step: the implode schedule, then parallax and hover tracking.
    pub fn update(
        &mut self,
        dt: f32,
        camera: &mut Camera,
        projection: &Projection,
        targets: &[PickTarget],
    ) -> Vec<InputAction> {
        let mut actions = Vec::new();

        // advance before this frame's hover restarts the wait
        actions.extend(self.staggered.advance(dt));
        if self.implode.advance(dt) {
            self.schedule_implode();
            actions.extend(self.staggered.advance(0.0));
        }

        if self.enable_controls {
            self.target_offset = Vector2::new(
                (self.pointer.x - self.pointer_previous.x) * self.parallax.factor_x,
                (self.pointer.y - self.pointer_previous.y) * self.parallax.factor_y,
            );
            self.offset += (self.target_offset - self.offset) * self.parallax.lerp;

            camera.translate_local_x(self.offset.x);
            camera.translate_local_y(self.offset.y);
            camera.look_at(Point3::new(0.0, 0.0, 0.0));

            let nearest = camera
                .ray_through(self.pointer, projection)
                .and_then(|ray| raycast::nearest(&ray, targets));
            self.set_hovered(nearest.map(|hit| hit.id), &mut actions);

            if let Some(PickKind::Letter { group }) =
                nearest.and_then(|hit| self.kind(hit.id)).cloned()
            {
                self.debounced_explode(group, &mut actions);
            }
        }

        self.pointer_previous = self.pointer;
        actions
    }

    fn set_hovered(&mut self, hovered: Option<PickId>, actions: &mut Vec<InputAction>) {
        if self.hovered == hovered {
            return;
        }
        if let Some(old) = self.hovered {
            actions.push(InputAction::Exit(old));
        }
        if let Some(new) = hovered {
            actions.push(InputAction::Enter(new));
        }
        self.hovered = hovered;
    }

    fn debounced_explode(&mut self, group: String, actions: &mut Vec<InputAction>) {
        actions.push(InputAction::StopIdle);
        if !self.exploded.contains(&group) {
            actions.push(InputAction::Explode(group.clone()));
            self.exploded.push(group);
        }
        self.implode.call();
    }

    fn schedule_implode(&mut self) {
        let groups = std::mem::take(&mut self.exploded);
        let last = groups.len().saturating_sub(1);
        for (i, group) in groups.into_iter().enumerate() {
            self.staggered
                .schedule(self.implode_stagger * i as f32, InputAction::Implode(group));
        }
        self.staggered
            .schedule(self.implode_stagger * last as f32, InputAction::ResumeIdle);
    }
}
