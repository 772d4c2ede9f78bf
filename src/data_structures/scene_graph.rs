//! Scene graph and hierarchical scene organization.
//!
//! Provides the [`SceneNode`] trait and its two implementations: a transform-only
//! [`ContainerNode`] and a [`ModelNode`] that owns GPU geometry. Nodes carry the
//! glTF name, a visibility switch, their bloom-layer membership and the flags
//! authored as glTF `extras`. Clips imported from glTF are played back with
//! [`SceneNode::animate`].
//!
//! Every node stores `(local, world)` instance pairs; world transforms are
//! recomputed from the root with [`SceneNode::update_world_transform_all`].

use std::collections::HashMap;

use serde::{Deserialize, Deserializer};
use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        instance::{Instance, InstanceRaw},
        model,
    },
    raycast::Aabb,
    render::Instanced,
    resources::animation::Keyframes,
};

/// An animation clip: a named animation with keyframes and timing.
#[derive(Clone, Debug)]
pub struct AnimationClip {
    pub name: String,
    pub keyframes: Keyframes,
    pub timestamps: Vec<f32>,
}

/// The transform components a clip has tracks for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Channels {
    pub translation: bool,
    pub rotation: bool,
    pub scale: bool,
}

#[derive(Clone, Debug, Default)]
pub struct ModelAnimation {
    pub name: String,
    pub instances: Vec<Instance>,
    pub timestamps: Vec<f32>,
    pub channels: Channels,
}

impl ModelAnimation {
    pub fn duration(&self) -> f32 {
        self.timestamps.last().copied().unwrap_or(0.0)
    }

    /// The interpolated transform at `time` seconds, looping over the clip.
    pub fn sample(&self, time: f64) -> Option<Instance> {
        let frames = self.instances.len().min(self.timestamps.len());
        match frames {
            0 => return None,
            1 => return self.instances.first().copied(),
            _ => (),
        }
        let timestamps = &self.timestamps[..frames];
        let duration = timestamps[frames - 1];
        let t = if duration > 0.0 {
            time.rem_euclid(f64::from(duration)) as f32
        } else {
            0.0
        };
        let next = timestamps
            .iter()
            .position(|&ts| ts > t)
            .unwrap_or(frames - 1)
            .max(1);
        let prev = next - 1;
        let span = timestamps[next] - timestamps[prev];
        let u = if span > 0.0 {
            ((t - timestamps[prev]) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let (a, b) = (&self.instances[prev], &self.instances[next]);
        Some(Instance {
            position: a.position + (b.position - a.position) * u,
            rotation: a.rotation.slerp(b.rotation, u),
            scale: a.scale + (b.scale - a.scale) * u,
            ..*a
        })
    }
}

/// Flags authored on glTF nodes as `extras`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeExtras {
    #[serde(deserialize_with = "truthy")]
    pub bloom: bool,
    #[serde(deserialize_with = "truthy")]
    pub animate_color: bool,
}

impl NodeExtras {
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str(raw) {
            Ok(extras) => extras,
            Err(e) => {
                log::debug!("ignoring node extras {}: {}", raw, e);
                Self::default()
            }
        }
    }
}

/// Exporters write custom properties as bools, numbers or strings.
fn truthy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        serde_json::Value::String(s) => !(s.is_empty() || s == "0" || s == "false"),
        serde_json::Value::Null => false,
        _ => true,
    })
}

/**
 * Intermediate state when converting between `AnimationClip` and `ModelAnimation`
 */
#[derive(Default)]
struct ModelState {
    animations: Vec<ModelAnimation>,
    trans: Vec<cgmath::Vector3<f32>>,
    rots: Vec<cgmath::Quaternion<f32>>,
    scals: Vec<cgmath::Vector3<f32>>,
    timestamps: Vec<f32>,
    current_clip: String,
}
impl ModelState {
    fn reset(&mut self, clip: &AnimationClip) {
        self.timestamps = vec![];
        self.trans = vec![];
        self.rots = vec![];
        self.scals = vec![];
        self.current_clip = clip.name.clone();
    }
}

/// Everything a glTF node needs from its file while being converted.
pub struct GltfSource<'a> {
    pub id: u32,
    pub buffers: &'a [Vec<u8>],
    pub device: &'a wgpu::Device,
    pub materials: &'a [model::Material],
    /// Emissive factor per material index.
    pub emissive: &'a [[f32; 3]],
    pub animations: &'a HashMap<usize, Vec<AnimationClip>>,
}

pub fn to_scene_node(node: gltf::scene::Node, src: &GltfSource) -> Box<dyn SceneNode> {
    let clips = src.animations.get(&node.index()).cloned().unwrap_or_default();
    let animations = merge(clips);
    let name = node.name().unwrap_or_default().to_string();
    let mut emissive = [0.0; 3];
    let mut scene_node: Box<dyn SceneNode> = match node.mesh() {
        Some(mesh) => {
            let mut meshes = Vec::new();
            let materials = mesh.primitives().map(|p| p.material().index().unwrap_or(0));
            emissive = node_emissive(materials, src.emissive);

            for primitive in mesh.primitives() {
                let reader = primitive.reader(|buffer| src.buffers.get(buffer.index()).map(|b| b.as_slice()));

                let mut vertices = Vec::new();
                if let Some(vertex_attribute) = reader.read_positions() {
                    vertex_attribute.for_each(|vertex| {
                        vertices.push(model::ModelVertex {
                            position: vertex,
                            ..Default::default()
                        })
                    });
                }
                if let Some(normal_attribute) = reader.read_normals() {
                    vertices
                        .iter_mut()
                        .zip(normal_attribute)
                        .for_each(|(v, normal)| v.normal = normal);
                }
                if let Some(tex_coord_attribute) = reader.read_tex_coords(0).map(|v| v.into_f32()) {
                    vertices
                        .iter_mut()
                        .zip(tex_coord_attribute)
                        .for_each(|(v, tex_coord)| v.tex_coords = tex_coord);
                }
                if let Some(tangent_attribute) = reader.read_tangents() {
                    vertices.iter_mut().zip(tangent_attribute).for_each(|(v, tangent)| {
                        // GLTF represents tangents as vec4 where the 4th elem can be used to calculate the bitangent
                        let tangent: cgmath::Vector4<f32> = tangent.into();
                        v.tangent = tangent.truncate().into();
                        let normal: cgmath::Vector3<f32> = v.normal.into();
                        v.bitangent = (normal.cross(tangent.truncate()) * tangent[3]).into();
                    });
                };

                let indices: Vec<u32> = match reader.read_indices() {
                    Some(indices_raw) => indices_raw.into_u32().collect(),
                    None => (0..vertices.len() as u32).collect(),
                };
                if vertices.is_empty() || indices.is_empty() {
                    log::warn!("Skipping empty primitive of mesh {:?}", mesh.name());
                    continue;
                }
                let bounds = Aabb::from_points(vertices.iter().map(|v| v.position));
                let vertex_buffer = src.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{:?} Vertex Buffer", mesh.name())),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });

                let index_buffer = src.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{:?} Index Buffer", mesh.name())),
                    contents: bytemuck::cast_slice(&indices),
                    usage: wgpu::BufferUsages::INDEX,
                });
                let mat_idx = primitive.material().index().unwrap_or(0);

                meshes.push(model::Mesh {
                    name: mesh.name().unwrap_or("unknown_mesh").to_string(),
                    vertex_buffer,
                    index_buffer,
                    num_elements: indices.len() as u32,
                    material: mat_idx,
                    bounds,
                });
            }
            let model = model::Model {
                meshes,
                materials: src.materials.to_vec(),
            };
            Box::new(ModelNode::from_model(&name, 1, src.id, src.device, model, animations))
        }
        None => Box::new(ContainerNode::new(&name, 1, animations)),
    };
    let extras = node
        .extras()
        .as_ref()
        .map(|raw| NodeExtras::parse(raw.get()))
        .unwrap_or_default();
    scene_node.set_bloom(extras.bloom);
    scene_node.set_extras(extras);
    let decomp_pos = node.transform().decomposed();
    let instance = Instance {
        position: decomp_pos.0.into(),
        rotation: decomp_pos.1.into(),
        scale: decomp_pos.2.into(),
        emissive: emissive.into(),
        ..Default::default()
    };
    scene_node.set_local_transform(0, instance);
    for child in node.children() {
        let child_node = to_scene_node(child, src);
        scene_node.add_child(child_node);
    }

    scene_node
}

/// A node has one emissive term: the first primitive's material decides it.
fn node_emissive(materials: impl IntoIterator<Item = usize>, factors: &[[f32; 3]]) -> [f32; 3] {
    materials
        .into_iter()
        .next()
        .and_then(|material| factors.get(material).copied())
        .unwrap_or([0.0; 3])
}

fn save_current_anim(state: &mut ModelState, clip: &AnimationClip) -> ModelAnimation {
    let t_len = state.trans.len();
    let r_len = state.rots.len();
    let s_len = state.scals.len();
    let max_len = t_len.max(r_len.max(s_len));
    if t_len != r_len || r_len != s_len {
        log::debug!(
            "animation track lengths differ and are padded with their first frame. previous animation: {}, current: {}",
            state.current_clip,
            clip.name
        );
    }
    // only the flagged channels are played back; the rest is filler
    let rest = Instance::default();
    let pad = |i: usize| Instance {
        position: state
            .trans
            .get(i)
            .or(state.trans.first())
            .copied()
            .unwrap_or(rest.position),
        rotation: state
            .rots
            .get(i)
            .or(state.rots.first())
            .copied()
            .unwrap_or(rest.rotation),
        scale: state
            .scals
            .get(i)
            .or(state.scals.first())
            .copied()
            .unwrap_or(rest.scale),
        ..rest
    };
    ModelAnimation {
        name: state.current_clip.clone(),
        instances: (0..max_len).map(pad).collect(),
        timestamps: state.timestamps.clone(),
        channels: Channels {
            translation: t_len > 0,
            rotation: r_len > 0,
            scale: s_len > 0,
        },
    }
}

/**
 * Merges keyframes with the same name to have all transformations in one place.
 *
 * GLTF stores one channel per transformed property:
 *
 * AnimationClip { name: anim1, keyframes: Scale([[data]]) }
 * AnimationClip { name: anim1, keyframes: Rotation([[data]]) }
 *
 * which becomes
 *
 * ModelAnimation { name: anim1, instances: [TRS per keyframe] }
 */
fn merge(clips: Vec<AnimationClip>) -> Vec<ModelAnimation> {
    let Some(first) = clips.first() else {
        return Vec::new();
    };
    let mut state = ModelState {
        current_clip: first.name.clone(),
        ..Default::default()
    };
    for clip in clips.iter() {
        if clip.name != state.current_clip {
            let animation = save_current_anim(&mut state, clip);
            state.animations.push(animation);
            state.reset(clip);
        }
        match &clip.keyframes {
            Keyframes::Translation(translations) => state.trans.extend(translations),
            Keyframes::Rotation(rotations) => state.rots.extend(rotations),
            Keyframes::Scale(scalations) => state.scals.extend(scalations),
            Keyframes::Other => (),
        }
        // in case some tracks have fewer steps than others we want to have the largest set of timestamps for smooth animations
        if clip.timestamps.len() > state.timestamps.len() {
            state.timestamps = clip.timestamps.clone();
        }
    }
    if let Some(clip) = clips.last() {
        let animation = save_current_anim(&mut state, clip);
        state.animations.push(animation);
    }
    state.animations
}

pub trait SceneNode {
    fn name(&self) -> &str;

    fn is_visible(&self) -> bool;

    /// Hidden nodes (and their children) are skipped when rendering but still
    /// take part in transform updates.
    fn set_visible(&mut self, visible: bool);

    fn in_bloom_layer(&self) -> bool;

    fn set_bloom(&mut self, bloom: bool);

    fn extras(&self) -> &NodeExtras;

    fn set_extras(&mut self, extras: NodeExtras);

    fn get_world_transforms(&self) -> Vec<Instance>;

    fn get_local_transform(&self, idx: usize) -> Option<Instance>;

    fn local_transform_mut(&mut self, idx: usize) -> Option<&mut Instance>;

    fn instance_count(&self) -> usize;

    /// Model-space bounds of the node's own geometry.
    fn local_bounds(&self) -> Option<Aabb>;

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>>;

    fn add_child(&mut self, child: Box<dyn SceneNode>);

    fn set_local_transform(&mut self, idx: usize, instance: Instance);

    fn set_local_transform_all(&mut self, mutation: &mut dyn FnMut(&mut Instance));

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>>;

    fn write_to_buffers(&mut self, queue: &wgpu::Queue, device: &wgpu::Device);

    /**
     * Each instance is placed by the parent instance with the same index; a
     * single parent instance places all of them.
     */
    fn update_world_transforms(&mut self, parents_world_transform: &[Instance]);

    fn update_world_transform_all(&mut self) {
        self.update_world_transforms(&[Instance::default()]);
    }

    fn add_instance(&mut self, instance: Instance) -> usize;

    fn add_instances(&mut self, instances: Vec<Instance>) -> usize;

    fn get_animation(&self) -> &Vec<ModelAnimation>;

    /// Plays the first clip of this node and its children at `time` seconds.
    fn animate(&mut self, time: f64);

    fn get_render(&self) -> Vec<Instanced<'_>>;
}

/// Depth-first search for a descendant called `name`; returns its child-index path.
pub fn find_path(node: &dyn SceneNode, name: &str) -> Option<Vec<usize>> {
    for (i, child) in node.get_children().iter().enumerate() {
        if child.name() == name {
            return Some(vec![i]);
        }
        if let Some(mut path) = find_path(child.as_ref(), name) {
            path.insert(0, i);
            return Some(path);
        }
    }
    None
}

pub fn node_at<'a>(node: &'a dyn SceneNode, path: &[usize]) -> Option<&'a dyn SceneNode> {
    match path.split_first() {
        None => Some(node),
        Some((i, rest)) => node_at(node.get_children().get(*i)?.as_ref(), rest),
    }
}

pub fn node_at_mut<'a>(node: &'a mut dyn SceneNode, path: &[usize]) -> Option<&'a mut dyn SceneNode> {
    match path.split_first() {
        None => Some(node),
        Some((i, rest)) => node_at_mut(node.get_children_mut().get_mut(*i)?.as_mut(), rest),
    }
}

/// Toggles bloom on a node and all of its descendants.
pub fn set_bloom_recursive(node: &mut dyn SceneNode, bloom: bool) {
    node.set_bloom(bloom);
    for child in node.get_children_mut() {
        set_bloom_recursive(child.as_mut(), bloom);
    }
}

fn compose(instances: &mut [(Instance, Instance)], parents: &[Instance]) -> Vec<Instance> {
    instances
        .iter_mut()
        .enumerate()
        .map(|(i, (local, world))| {
            let parent = parents.get(i).or(parents.last()).copied().unwrap_or_default();
            *world = &parent * local;
            *world
        })
        .collect()
}

/// Writes the channels the first clip animates; the others keep their pose.
fn play(animations: &[ModelAnimation], instances: &mut [(Instance, Instance)], time: f64) {
    let Some(clip) = animations.first() else {
        return;
    };
    let Some(sampled) = clip.sample(time) else {
        return;
    };
    for (local, _) in instances.iter_mut() {
        if clip.channels.translation {
            local.position = sampled.position;
        }
        if clip.channels.rotation {
            local.rotation = sampled.rotation;
        }
        if clip.channels.scale {
            local.scale = sampled.scale;
        }
    }
}

pub struct ContainerNode {
    pub children: Vec<Box<dyn SceneNode>>,
    pub instances: Vec<(Instance, Instance)>,
    name: String,
    visible: bool,
    bloom: bool,
    extras: NodeExtras,
    animations: Vec<ModelAnimation>,
}

impl ContainerNode {
    pub fn new(name: &str, amount: usize, animations: Vec<ModelAnimation>) -> Self {
        let instances = (0..amount)
            .map(|_| (Instance::default(), Instance::default()))
            .collect();
        Self {
            instances,
            children: vec![],
            name: name.to_string(),
            visible: true,
            bloom: false,
            extras: NodeExtras::default(),
            animations,
        }
    }
}

impl SceneNode for ContainerNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn in_bloom_layer(&self) -> bool {
        self.bloom
    }

    fn set_bloom(&mut self, bloom: bool) {
        self.bloom = bloom;
    }

    fn extras(&self) -> &NodeExtras {
        &self.extras
    }

    fn set_extras(&mut self, extras: NodeExtras) {
        self.extras = extras;
    }

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }

    fn set_local_transform(&mut self, idx: usize, instance: Instance) {
        if let Some((local, _)) = self.instances.get_mut(idx) {
            *local = instance;
        }
    }

    fn set_local_transform_all(&mut self, mutation: &mut dyn FnMut(&mut Instance)) {
        self.instances.iter_mut().for_each(|(local, _)| {
            mutation(local);
        });
    }

    fn get_world_transforms(&self) -> Vec<Instance> {
        self.instances.iter().map(|(_, world)| *world).collect()
    }

    fn update_world_transforms(&mut self, parents_world_transform: &[Instance]) {
        let world_transforms = compose(&mut self.instances, parents_world_transform);
        for child in self.children.iter_mut() {
            child.update_world_transforms(&world_transforms);
        }
    }

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    fn get_local_transform(&self, idx: usize) -> Option<Instance> {
        self.instances.get(idx).map(|(local, _)| *local)
    }

    fn local_transform_mut(&mut self, idx: usize) -> Option<&mut Instance> {
        self.instances.get_mut(idx).map(|(local, _)| local)
    }

    fn instance_count(&self) -> usize {
        self.instances.len()
    }

    fn local_bounds(&self) -> Option<Aabb> {
        None
    }

    fn write_to_buffers(&mut self, queue: &wgpu::Queue, device: &wgpu::Device) {
        self.get_children_mut()
            .iter_mut()
            .for_each(|child| child.write_to_buffers(queue, device));
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn add_instance(&mut self, instance: Instance) -> usize {
        self.instances.push((instance, instance));
        for child in &mut self.children {
            child.add_instance(Instance::default());
        }
        self.instances.len()
    }

    fn add_instances(&mut self, instances: Vec<Instance>) -> usize {
        let len = instances.len();
        self.instances.extend(instances.into_iter().map(|i| (i, i)));
        for child in &mut self.children {
            child.add_instances((0..len).map(|_| Instance::default()).collect());
        }
        self.instances.len()
    }

    fn get_animation(&self) -> &Vec<ModelAnimation> {
        &self.animations
    }

    fn animate(&mut self, time: f64) {
        play(&self.animations, &mut self.instances, time);
        for child in &mut self.children {
            child.animate(time);
        }
    }

    fn get_render(&self) -> Vec<Instanced<'_>> {
        if !self.visible {
            return Vec::new();
        }
        self.children
            .iter()
            .flat_map(|child| child.get_render())
            .collect()
    }
}

pub struct ModelNode {
    children: Vec<Box<dyn SceneNode>>,
    instance_buffer: wgpu::Buffer,
    instances: Vec<(Instance, Instance)>,
    animations: Vec<ModelAnimation>,
    buffer_size_needs_change: bool,
    model: model::Model,
    id: u32,
    name: String,
    visible: bool,
    bloom: bool,
    extras: NodeExtras,
}

impl ModelNode {
    pub fn from_model(
        name: &str,
        amount: usize,
        id: u32,
        device: &wgpu::Device,
        obj_model: model::Model,
        animations: Vec<ModelAnimation>,
    ) -> Self {
        let instances = (0..amount)
            .map(|_| (Instance::default(), Instance::default()))
            .collect::<Vec<_>>();

        let instance_data = instances
            .iter()
            .map(|(_, world)| world.to_raw())
            .collect::<Vec<_>>();

        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Instance Buffer"),
            contents: bytemuck::cast_slice(&instance_data),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        Self {
            children: vec![],
            instance_buffer,
            instances,
            model: obj_model,
            buffer_size_needs_change: false,
            animations,
            id,
            name: name.to_string(),
            visible: true,
            bloom: false,
            extras: NodeExtras::default(),
        }
    }

    pub fn model(&self) -> &model::Model {
        &self.model
    }
}

impl SceneNode for ModelNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn in_bloom_layer(&self) -> bool {
        self.bloom
    }

    fn set_bloom(&mut self, bloom: bool) {
        self.bloom = bloom;
    }

    fn extras(&self) -> &NodeExtras {
        &self.extras
    }

    fn set_extras(&mut self, extras: NodeExtras) {
        self.extras = extras;
    }

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }

    fn set_local_transform(&mut self, idx: usize, instance: Instance) {
        if let Some((local, _)) = self.instances.get_mut(idx) {
            *local = instance;
        }
    }

    fn set_local_transform_all(&mut self, mutation: &mut dyn FnMut(&mut Instance)) {
        self.instances
            .iter_mut()
            .for_each(|(local, _)| mutation(local));
    }

    fn get_world_transforms(&self) -> Vec<Instance> {
        self.instances.iter().map(|(_, world)| *world).collect()
    }

    fn update_world_transforms(&mut self, parents_world_transform: &[Instance]) {
        let world_transforms = compose(&mut self.instances, parents_world_transform);
        for child in self.children.iter_mut() {
            child.update_world_transforms(&world_transforms);
        }
    }

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    fn get_local_transform(&self, idx: usize) -> Option<Instance> {
        self.instances.get(idx).map(|(local, _)| *local)
    }

    fn local_transform_mut(&mut self, idx: usize) -> Option<&mut Instance> {
        self.instances.get_mut(idx).map(|(local, _)| local)
    }

    fn instance_count(&self) -> usize {
        self.instances.len()
    }

    fn local_bounds(&self) -> Option<Aabb> {
        self.model.bounds()
    }

    fn write_to_buffers(&mut self, queue: &wgpu::Queue, device: &wgpu::Device) {
        let raw_instances: Vec<InstanceRaw> = self
            .instances
            .iter()
            .map(|(_, world)| world.to_raw())
            .collect();
        if self.buffer_size_needs_change {
            self.instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Instance Buffer"),
                contents: bytemuck::cast_slice(&raw_instances),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });
            self.buffer_size_needs_change = false;
        } else {
            queue.write_buffer(
                &self.instance_buffer,
                0,
                bytemuck::cast_slice(&raw_instances),
            );
        }
        self.get_children_mut()
            .iter_mut()
            .for_each(|child| child.write_to_buffers(queue, device));
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn add_instance(&mut self, instance: Instance) -> usize {
        self.instances.push((instance, instance));
        for child in &mut self.children {
            child.add_instance(Instance::default());
        }
        self.buffer_size_needs_change = true;
        self.instances.len()
    }

    fn add_instances(&mut self, instances: Vec<Instance>) -> usize {
        let len = instances.len();
        self.instances.extend(instances.into_iter().map(|i| (i, i)));
        for child in &mut self.children {
            child.add_instances((0..len).map(|_| Instance::default()).collect());
        }
        self.buffer_size_needs_change = true;
        self.instances.len()
    }

    fn get_animation(&self) -> &Vec<ModelAnimation> {
        &self.animations
    }

    fn animate(&mut self, time: f64) {
        play(&self.animations, &mut self.instances, time);
        for child in &mut self.children {
            child.animate(time);
        }
    }

    fn get_render(&self) -> Vec<Instanced<'_>> {
        if !self.visible {
            return Vec::new();
        }
        self.children
            .iter()
            .flat_map(|child| child.get_render())
            .chain([Instanced {
                instance: &self.instance_buffer,
                model: &self.model,
                amount: self.instances.len(),
                id: self.id,
                bloom: self.bloom,
            }])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{Quaternion, Vector3};

    use super::*;

    fn clip(name: &str, keyframes: Keyframes, timestamps: Vec<f32>) -> AnimationClip {
        AnimationClip {
            name: name.to_string(),
            keyframes,
            timestamps,
        }
    }

    #[test]
    fn merges_channels_of_one_clip() {
        let merged = merge(vec![
            clip(
                "float",
                Keyframes::Translation(vec![Vector3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 2.0, 0.0)]),
                vec![0.0, 1.0],
            ),
            clip(
                "float",
                Keyframes::Rotation(vec![Quaternion::new(1.0, 0.0, 0.0, 0.0); 2]),
                vec![0.0, 1.0],
            ),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].instances.len(), 2);
        assert_eq!(merged[0].instances[1].position.y, 2.0);
    }

    #[test]
    fn empty_clip_list_is_fine() {
        assert!(merge(Vec::new()).is_empty());
    }

    #[test]
    fn sample_interpolates_and_loops() {
        let animation = ModelAnimation {
            name: "float".to_string(),
            instances: vec![
                Instance::from(Vector3::new(0.0, 0.0, 0.0)),
                Instance::from(Vector3::new(0.0, 2.0, 0.0)),
            ],
            timestamps: vec![0.0, 2.0],
            channels: Channels {
                translation: true,
                ..Default::default()
            },
        };
        let half = animation.sample(1.0).map(|i| i.position.y);
        assert!(half.is_some_and(|y| (y - 1.0).abs() < 1e-5));
        let looped = animation.sample(3.0).map(|i| i.position.y);
        assert!(looped.is_some_and(|y| (y - 1.0).abs() < 1e-5));
    }

    #[test]
    fn emissive_comes_from_the_first_primitive() {
        let factors = [[0.0, 0.0, 0.0], [1.0, 0.5, 0.0]];
        assert_eq!(node_emissive([1, 0], &factors), [1.0, 0.5, 0.0]);
        assert_eq!(node_emissive([0, 1], &factors), [0.0, 0.0, 0.0]);
        assert_eq!(node_emissive([7], &factors), [0.0; 3]);
        assert_eq!(node_emissive(Vec::new(), &factors), [0.0; 3]);
    }

    #[test]
    fn merge_flags_only_the_tracks_present() {
        let merged = merge(vec![clip(
            "spin",
            Keyframes::Rotation(vec![Quaternion::new(1.0, 0.0, 0.0, 0.0); 2]),
            vec![0.0, 1.0],
        )]);
        assert_eq!(
            merged[0].channels,
            Channels {
                rotation: true,
                ..Default::default()
            }
        );
    }

    #[test]
    fn rotation_clip_keeps_the_rest_position() {
        let half_turn = Quaternion::from(cgmath::Euler::new(
            cgmath::Rad(0.0),
            cgmath::Rad(std::f32::consts::PI),
            cgmath::Rad(0.0),
        ));
        let spin = merge(vec![clip(
            "spin",
            Keyframes::Rotation(vec![Quaternion::new(1.0, 0.0, 0.0, 0.0), half_turn]),
            vec![0.0, 2.0],
        )]);
        let mut node = ContainerNode::new("Spinner", 1, spin);
        node.set_local_transform(
            0,
            Instance {
                position: Vector3::new(3.0, 1.0, 0.0),
                scale: Vector3::new(2.0, 2.0, 2.0),
                ..Default::default()
            },
        );

        node.animate(1.0);

        let local = node.get_local_transform(0).unwrap();
        assert_eq!(local.position, Vector3::new(3.0, 1.0, 0.0));
        assert_eq!(local.scale, Vector3::new(2.0, 2.0, 2.0));
        assert!(local.rotation.s < 0.99, "{:?}", local.rotation);
    }

    #[test]
    fn sample_stays_precise_after_long_uptimes() {
        let animation = ModelAnimation {
            name: "float".to_string(),
            instances: vec![
                Instance::from(Vector3::new(0.0, 0.0, 0.0)),
                Instance::from(Vector3::new(0.0, 2.0, 0.0)),
            ],
            timestamps: vec![0.0, 2.0],
            channels: Channels {
                translation: true,
                ..Default::default()
            },
        };
        // about eleven days in, half a second into a cycle
        let y = animation.sample(1_000_000.5).map(|i| i.position.y);
        assert!(y.is_some_and(|y| (y - 0.5).abs() < 1e-3), "{:?}", y);
    }

    #[test]
    fn extras_accept_numbers_and_bools() {
        let extras = NodeExtras::parse(r#"{"bloom": 1, "animateColor": true, "other": "x"}"#);
        assert!(extras.bloom);
        assert!(extras.animate_color);
        assert_eq!(NodeExtras::parse("not json"), NodeExtras::default());
        assert!(!NodeExtras::parse(r#"{"bloom": 0}"#).bloom);
    }
}
