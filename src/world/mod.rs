//! The landing page scene.
//!
//! [`World`] is the application's [`GraphicsFlow`]. It loads the letters and
//! the wall models, scatters the light orbs, and wires the loader, input and
//! animation controllers together: input actions become animations, animation
//! cues switch input on and off, and the loader starts the intro once every
//! asset is ready.
//!
//! Per frame the world animates, raycasts, uploads its instance buffers and
//! pushes the camera and renderer values into the [`Context`]. Once per tick it
//! checks the frame rate and trades bloom (or, as a last resort, rendering
//! altogether) for speed.

pub mod lights;
mod section;
pub mod stage;

use std::{collections::HashMap, f32::consts::FRAC_PI_2};

use cgmath::{Deg, InnerSpace, Rad, Vector3};
use instant::Duration;
use winit::{
    event::{DeviceEvent, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

pub use section::Section;
pub use stage::Stage;

use crate::{
    animation::{AnimationController, CameraPose, Cue, IntroPlan},
    camera::Camera,
    config::WorldConfig,
    context::{Context, InitContext},
    data_structures::{
        instance::Instance,
        scene_graph::{ContainerNode, SceneNode, find_path, node_at, node_at_mut, set_bloom_recursive},
    },
    flow::{FlowConsturctor, GraphicsFlow, Out},
    input::{InputAction, InputController, LetterMeshes, PickKind},
    loader::{LoaderController, LoaderEvent},
    perf::{PerformanceMonitor, Verdict},
    postprocess::BloomSettings,
    render::Render,
    tween::{Animatable, NodeRef, Property, Target},
};

pub const LETTERS_ROOT: &str = "Kleczewsky";
pub const WORLD_ROOT: &str = "Main";

const LETTERS_ID: u32 = 1;
const WORLD_ID: u32 = 2;
const ORBS_ID: u32 = 3;

/// State shared with other flows.
#[derive(Debug, Clone, Default)]
pub struct WorldState {
    pub section: Section,
    pub loaded: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorldEvent {
    Navigate(Section),
    OpenPoster(String),
}

pub struct World {
    config: WorldConfig,
    stage: Stage,
    loader: LoaderController,
    input: InputController,
    animation: AnimationController,
    perf: PerformanceMonitor,
    letters: LetterMeshes,
    /// Triggers and posters.
    pickable_extras: Vec<(PickKind, NodeRef)>,
    checkpoints: HashMap<Section, CameraPose>,
    intro: IntroPlan,
    world_root: usize,
    clip_time: f64,
    started: bool,
    intro_done: bool,
    bloom_enabled: bool,
    rendering: bool,
}

fn degrees(value: f32) -> f32 {
    Rad::from(Deg(value)).0
}

/// Paths of the letter groups: nodes named `…Group`, not looking inside them.
fn letter_groups(node: &dyn SceneNode, prefix: &[usize], out: &mut Vec<(String, Vec<usize>)>) {
    for (i, child) in node.get_children().iter().enumerate() {
        let mut path = prefix.to_vec();
        path.push(i);
        if child.name().ends_with("Group") {
            out.push((child.name().to_owned(), path));
        } else {
            letter_groups(child.as_ref(), &path, out);
        }
    }
}

/// Paths of `node` and its descendants that carry geometry.
fn mesh_paths(node: &dyn SceneNode, path: &[usize], out: &mut Vec<Vec<usize>>) {
    if node.local_bounds().is_some() {
        out.push(path.to_vec());
    }
    for (i, child) in node.get_children().iter().enumerate() {
        let mut child_path = path.to_vec();
        child_path.push(i);
        mesh_paths(child.as_ref(), &child_path, out);
    }
}

fn child_path(parent: &[usize], index: usize) -> Vec<usize> {
    let mut path = parent.to_vec();
    path.push(index);
    path
}

/// A camera pose looking down the node's local `-Z` axis.
fn checkpoint_pose(transform: &Instance) -> CameraPose {
    let forward = (transform.rotation * -Vector3::unit_z()).normalize();
    CameraPose {
        position: transform.position.into(),
        yaw: forward.z.atan2(forward.x),
        pitch: forward.y.clamp(-1.0, 1.0).asin(),
    }
}

impl World {
    pub fn constructor() -> FlowConsturctor<WorldState, WorldEvent> {
        Box::new(|init: InitContext| {
            Box::pin(async move {
                let world: Box<dyn GraphicsFlow<WorldState, WorldEvent>> =
                    Box::new(World::load(init).await);
                world
            })
        })
    }

    /// Loads every asset and assembles the scene. Models that fail to load
    /// are logged and left out.
    pub async fn load(init: InitContext) -> Self {
        let config = WorldConfig::load().await;
        let mut loader = LoaderController::new(&config.timings);
        loader.expect_asset(&config.assets.letters);
        loader.expect_asset(&config.assets.wall);

        let letters = loader
            .load_gltf(LETTERS_ID, &config.assets.letters, &init.device, &init.queue)
            .await;
        let world_model = loader
            .load_gltf(WORLD_ID, &config.assets.wall, &init.device, &init.queue)
            .await;

        let from = CameraPose {
            position: config.camera.intro_position,
            yaw: -FRAC_PI_2,
            pitch: degrees(config.camera.intro_pitch_degrees),
        };
        let home = CameraPose {
            position: config.camera.home_position,
            yaw: -FRAC_PI_2,
            pitch: degrees(config.camera.home_pitch_degrees),
        };
        let camera = Camera::new(from.position, Rad(from.yaw), Rad(from.pitch));
        let mut stage = Stage::new(camera, 0.0, config.bloom.strength);

        let mut letters_root = ContainerNode::new(LETTERS_ROOT, 1, vec![]);
        letters_root.set_local_transform(
            0,
            Instance {
                position: Vector3::new(2.0, 0.0, 0.0),
                scale: Vector3::new(5.0, 5.0, 5.0),
                ..Default::default()
            },
        );
        if let Ok(node) = letters {
            letters_root.add_child(node);
        }
        let letters_index = stage.add_root(Box::new(letters_root));

        let mut world_root = ContainerNode::new(WORLD_ROOT, 1, vec![]);
        if let Ok(node) = world_model {
            world_root.add_child(node);
        }
        let world_index = stage.add_root(Box::new(world_root));

        let mut rng = rand::rng();
        let orbs = lights::orb_node(
            ORBS_ID,
            &config.orbs,
            &config.palette,
            &init.device,
            &init.queue,
            &mut rng,
        );
        let orb_count = orbs.instance_count();
        let orbs_index = stage.add_root(Box::new(orbs));
        let orb_refs = (0..orb_count)
            .map(|instance| NodeRef {
                root: orbs_index,
                path: vec![],
                instance,
            })
            .collect();

        let mut world = Self {
            input: InputController::new(&config.parallax, &config.timings),
            animation: AnimationController::new(&config.palette, &config.timings),
            perf: PerformanceMonitor::new(&config.performance),
            bloom_enabled: config.bloom.enabled,
            intro: IntroPlan {
                from,
                to: home,
                exposure: config.bloom.exposure,
                wall: None,
                orbs: orb_refs,
            },
            config,
            stage,
            loader,
            letters: LetterMeshes::new(),
            pickable_extras: Vec::new(),
            checkpoints: HashMap::new(),
            world_root: world_index,
            clip_time: 0.0,
            started: false,
            intro_done: false,
            rendering: true,
        };
        world.assemble_letters(letters_index);
        world.assemble_world(world_index);
        world
            .animation
            .init_letter_animations(&world.letters, &world.stage);
        world
    }

    /// Hides the triggers and collects the letter groups into the bloom layer.
    fn assemble_letters(&mut self, root_index: usize) {
        let Some(root) = self.stage.roots.get_mut(root_index) else {
            return;
        };

        match find_path(root.as_ref(), "Triggers") {
            Some(path) => {
                if let Some(triggers) = node_at_mut(root.as_mut(), &path) {
                    for (i, trigger) in triggers.get_children_mut().iter_mut().enumerate() {
                        trigger.set_visible(false);
                        match Section::from_node_name(trigger.name()) {
                            Some(section) => self.pickable_extras.push((
                                PickKind::Trigger { section },
                                NodeRef::new(root_index, child_path(&path, i)),
                            )),
                            None => log::warn!("trigger {} names no section", trigger.name()),
                        }
                    }
                }
            }
            None => log::warn!("{} has no Triggers", LETTERS_ROOT),
        }

        let mut groups = Vec::new();
        letter_groups(root.as_ref(), &[], &mut groups);
        for (name, path) in groups {
            let Some(group) = node_at_mut(root.as_mut(), &path) else {
                continue;
            };
            set_bloom_recursive(group, true);
            let mut meshes = Vec::new();
            mesh_paths(group, &path, &mut meshes);
            let meshes = meshes
                .into_iter()
                .map(|path| NodeRef::new(root_index, path))
                .collect::<Vec<_>>();
            log::debug!("letter group {} has {} meshes", name, meshes.len());
            self.letters.insert(name, meshes);
        }
    }

    /// Prepares the wall for the intro and reads the camera checkpoints.
    fn assemble_world(&mut self, root_index: usize) {
        let Some(root) = self.stage.roots.get(root_index) else {
            return;
        };
        let wall_path = find_path(root.as_ref(), "Wall");
        let checkpoints_path = find_path(root.as_ref(), "Camera-checkpoints");

        if let Some(wall_path) = wall_path {
            self.assemble_wall(root_index, wall_path);
        } else {
            log::warn!("{} has no Wall", WORLD_ROOT);
        }

        self.stage.update_world_transforms();
        if let Some(path) = checkpoints_path {
            let count = self
                .stage
                .node(&NodeRef::new(root_index, path.clone()))
                .map(|node| node.get_children().len())
                .unwrap_or(0);
            for i in 0..count {
                let node = NodeRef::new(root_index, child_path(&path, i));
                let Some(name) = self.stage.node(&node).map(|n| n.name().to_owned()) else {
                    continue;
                };
                let (Some(section), Some(transform)) =
                    (Section::from_node_name(&name), self.stage.world_transform(&node))
                else {
                    log::warn!("camera checkpoint {} is not a section", name);
                    continue;
                };
                self.checkpoints.insert(section, checkpoint_pose(&transform));
            }
        }
        if let Some(home) = self.checkpoints.get(&Section::Home) {
            self.intro.to = *home;
        }
        log::debug!("{} camera checkpoints", self.checkpoints.len());
    }

    fn assemble_wall(&mut self, root_index: usize, wall_path: Vec<usize>) {
        let wall = NodeRef::new(root_index, wall_path.clone());
        let language = self.config.language.clone();
        let mut decorations = Vec::new();

        if let Some(wall_node) = self.stage.node_mut(&wall) {
            if let Some(posters) = find_path(wall_node, "posters") {
                if let Some(node) = node_at(wall_node, &posters) {
                    let parent = [wall_path.clone(), posters].concat();
                    for (i, poster) in node.get_children().iter().enumerate() {
                        let path = child_path(&parent, i);
                        self.pickable_extras.push((
                            PickKind::Poster {
                                name: poster.name().to_owned(),
                            },
                            NodeRef::new(root_index, path),
                        ));
                    }
                }
            }

            if let Some(path) = find_path(wall_node, "text") {
                if let Some(text) = node_at_mut(wall_node, &path) {
                    for translation in text.get_children_mut() {
                        let visible = translation.name() == language;
                        translation.set_visible(visible);
                    }
                }
            }

            if let Some(path) = find_path(wall_node, "floating-decorations") {
                let parent = [wall_path.clone(), path.clone()].concat();
                if let Some(node) = node_at_mut(wall_node, &path) {
                    for (i, decoration) in node.get_children_mut().iter_mut().enumerate() {
                        decoration.set_local_transform_all(&mut |instance| {
                            instance.emissive_intensity = 0.0
                        });
                        if decoration.extras().animate_color {
                            decorations.push(NodeRef::new(root_index, child_path(&parent, i)));
                        }
                    }
                }
            }
        }

        for decoration in decorations {
            self.animation.init_emissive_color_animation(&decoration);
        }

        let scale = self
            .stage
            .read(&Target::Node(wall.clone()), Property::Scale)
            .map(|v| v.xyz())
            .unwrap_or([1.0; 3]);
        self.stage
            .write(&Target::Node(wall.clone()), Property::Scale, [0.0f32; 3].into());
        self.intro.wall = Some((wall, scale));
    }

    fn on_load(&mut self, state: &mut WorldState) {
        self.input
            .setup_raycaster_objects(&self.letters, self.pickable_extras.iter().cloned());
        self.animation.init_intro_animation(&self.intro);
        self.started = true;
        state.loaded = true;
        log::info!("world loaded; intro started");
    }

    fn on_loader_event(&mut self, event: LoaderEvent, state: &mut WorldState) {
        if let Some(text) = event.text() {
            log::info!("loader: {}", text);
        }
        match event {
            LoaderEvent::FadeOut { duration } => log::debug!("loader fades out over {}s", duration),
            LoaderEvent::Hidden => self.on_load(state),
            LoaderEvent::Progress(_) | LoaderEvent::Ready => (),
        }
    }

    fn on_cue(&mut self, cue: Cue, state: &mut WorldState) {
        match cue {
            Cue::IntroFinished => {
                self.intro_done = true;
                self.input.set_controls_enabled(true);
                self.animation.start_idle_loop();
                log::info!("intro finished");
            }
            Cue::SectionShown(section) => {
                state.section = section;
                if section == Section::Home {
                    self.input.set_controls_enabled(true);
                }
                log::info!("showing {}", section.element_id());
            }
            Cue::PosterShown(name) => log::info!("showing poster {}", name),
            other => log::debug!("unhandled cue {:?}", other),
        }
    }

    fn checkpoint(&self, section: Section) -> Option<CameraPose> {
        match self.checkpoints.get(&section) {
            Some(pose) => Some(*pose),
            None if section == Section::Home => Some(self.intro.to),
            None => None,
        }
    }

    fn navigate(&mut self, section: Section) {
        if !self.intro_done {
            log::debug!("ignoring navigation to {} during the intro", section);
            return;
        }
        let Some(pose) = self.checkpoint(section) else {
            log::warn!("no camera checkpoint for {}", section);
            return;
        };
        for action in self.input.set_controls_enabled(false) {
            log::debug!("{:?}", action);
        }
        self.animation.navigate_to(section, pose, &self.stage);
    }

    fn dispatch(&mut self, actions: Vec<InputAction>) {
        for action in actions {
            match action {
                InputAction::Click(id) | InputAction::Enter(id) | InputAction::Exit(id) => {
                    log::debug!("{:?} on {:?}", action, self.input.kind(id))
                }
                InputAction::Explode(group) => self.animation.explode_group(&group),
                InputAction::Implode(group) => self.animation.implode_group(&group),
                InputAction::StopIdle => self.animation.stop_idle_animation(),
                InputAction::ResumeIdle => self.animation.resume_idle(),
                InputAction::Navigate(section) => self.navigate(section),
                InputAction::OpenPoster(name) => self.animation.show_poster_section(&name),
            }
        }
    }

    fn push_to_context(&self) -> Out<WorldState, WorldEvent> {
        let camera = self.stage.camera;
        let exposure = self.stage.exposure;
        let strength = self.stage.bloom_strength;
        Out::Configure(Box::new(move |ctx: &mut Context| {
            ctx.camera.camera = camera;
            ctx.post.settings.exposure = exposure;
            ctx.post.settings.strength = strength;
        }))
    }
}

impl GraphicsFlow<WorldState, WorldEvent> for World {
    fn on_init(&mut self, ctx: &mut Context, state: &mut WorldState) -> Out<WorldState, WorldEvent> {
        let camera = &self.config.camera;
        ctx.clear_colour = wgpu::Color::BLACK;
        ctx.tick_duration_millis = self.config.performance.sample_interval_millis;
        ctx.projection.set_fovy(Deg(camera.fov_degrees));
        ctx.projection.set_clip(camera.znear, camera.zfar);
        ctx.light.uniform = lights::scene_light();
        ctx.post.settings = BloomSettings::from(&self.config.bloom);
        ctx.post.settings.exposure = self.stage.exposure;
        ctx.camera.camera = self.stage.camera;
        state.section = Section::Home;
        Out::Empty
    }

    fn on_click(&mut self, ctx: &Context, _: &mut WorldState) -> Out<WorldState, WorldEvent> {
        let targets = self.stage.pick_targets(self.input.pickables());
        let actions = self
            .input
            .on_click(&self.stage.camera, &ctx.projection, &targets);
        self.dispatch(actions);
        Out::Empty
    }

    fn on_update(
        &mut self,
        ctx: &Context,
        state: &mut WorldState,
        dt: Duration,
    ) -> Out<WorldState, WorldEvent> {
        let secs = dt.as_secs_f32();

        for event in self.loader.advance(secs) {
            self.on_loader_event(event, state);
        }
        for cue in self.animation.animate(secs, &mut self.stage) {
            self.on_cue(cue, state);
        }

        self.clip_time += dt.as_secs_f64();
        if let Some(root) = self.stage.roots.get_mut(self.world_root) {
            root.animate(self.clip_time);
        }
        self.stage.update_world_transforms();

        let targets = self.stage.pick_targets(self.input.pickables());
        let actions = self
            .input
            .update(secs, &mut self.stage.camera, &ctx.projection, &targets);
        self.dispatch(actions);

        self.stage.write_to_buffers(&ctx.queue, &ctx.device);
        if self.started {
            self.perf.record_frame(dt);
        }
        self.push_to_context()
    }

    fn on_tick(&mut self, _: &Context, _: &mut WorldState) -> Out<WorldState, WorldEvent> {
        if !self.started || !self.rendering {
            return Out::Empty;
        }
        match self.perf.sample(self.bloom_enabled) {
            Verdict::Collecting | Verdict::Healthy => Out::Empty,
            Verdict::Degrade => {
                log::warn!("Low average framerate detected: {:.1}", self.perf.fps());
                self.bloom_enabled = false;
                log::info!("Disabled bloom");
                Out::Configure(Box::new(|ctx: &mut Context| ctx.post.settings.enabled = false))
            }
            Verdict::Abort => {
                log::warn!("Low average framerate detected: {:.1}", self.perf.fps());
                self.animation
                    .show_poster_section(&Section::Error.element_id());
                self.rendering = false;
                log::error!("Rendering stopped; the device is too slow for this scene");
                Out::Configure(Box::new(|ctx: &mut Context| ctx.should_render = false))
            }
        }
    }

    fn on_device_events(
        &mut self,
        _: &Context,
        _: &mut WorldState,
        _: &DeviceEvent,
    ) -> Out<WorldState, WorldEvent> {
        Out::Empty
    }

    fn on_window_events(
        &mut self,
        ctx: &Context,
        _: &mut WorldState,
        event: &WindowEvent,
    ) -> Out<WorldState, WorldEvent> {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                let [width, height] = ctx.size();
                self.input.on_pointer_move(
                    position.x as f32,
                    position.y as f32,
                    width as f32,
                    height as f32,
                );
                Out::Empty
            }
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() => {
                let section = match event.physical_key {
                    PhysicalKey::Code(KeyCode::Escape) => Section::Home,
                    PhysicalKey::Code(KeyCode::Digit1) => Section::Home,
                    PhysicalKey::Code(KeyCode::Digit2) => Section::Contact,
                    PhysicalKey::Code(KeyCode::Digit3) => Section::Projects,
                    _ => return Out::Empty,
                };
                Out::FutEvent(vec![Box::new(std::future::ready(WorldEvent::Navigate(section)))])
            }
            _ => Out::Empty,
        }
    }

    fn on_custom_events(
        &mut self,
        _: &Context,
        _: &mut WorldState,
        event: WorldEvent,
    ) -> Option<WorldEvent> {
        match event {
            WorldEvent::Navigate(section) => self.navigate(section),
            WorldEvent::OpenPoster(name) => self.animation.show_poster_section(&name),
        }
        None
    }

    fn on_render(&self) -> Render<'_> {
        Render::Composed(self.stage.roots.iter().map(Render::from).collect())
    }

    #[cfg(feature = "integration-tests")]
    fn render_to_texture(
        &self,
        _: &Context,
        _: &mut WorldState,
        _: &mut image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>,
    ) -> Result<crate::flow::ImageTestResult, anyhow::Error> {
        Ok(crate::flow::ImageTestResult::Passed)
    }
}
