//! The animatable side of the world: scene roots, the camera and the renderer
//! parameters the tweens drive.

use cgmath::{Euler, InnerSpace, Quaternion, Rad, Vector3};

use crate::{
    camera::Camera,
    data_structures::{
        instance::Instance,
        scene_graph::{SceneNode, node_at, node_at_mut},
    },
    input::Pickable,
    raycast::PickTarget,
    tween::{Animatable, NodeRef, Property, Target, Value},
};

/// Scene roots plus the camera and renderer values the world pushes into the
/// context every frame.
pub struct Stage {
    pub roots: Vec<Box<dyn SceneNode>>,
    pub camera: Camera,
    pub exposure: f32,
    pub bloom_strength: f32,
}

impl Stage {
    pub fn new(camera: Camera, exposure: f32, bloom_strength: f32) -> Self {
        Self {
            roots: Vec::new(),
            camera,
            exposure,
            bloom_strength,
        }
    }

    /// Adds a root and returns its index.
    pub fn add_root(&mut self, root: Box<dyn SceneNode>) -> usize {
        self.roots.push(root);
        self.roots.len() - 1
    }

    pub fn node(&self, node: &NodeRef) -> Option<&dyn SceneNode> {
        node_at(self.roots.get(node.root)?.as_ref(), &node.path)
    }

    pub fn node_mut(&mut self, node: &NodeRef) -> Option<&mut dyn SceneNode> {
        node_at_mut(self.roots.get_mut(node.root)?.as_mut(), &node.path)
    }

    fn instance(&self, node: &NodeRef) -> Option<Instance> {
        self.node(node)?.get_local_transform(node.instance)
    }

    fn instance_mut(&mut self, node: &NodeRef) -> Option<&mut Instance> {
        let instance = node.instance;
        self.node_mut(node)?.local_transform_mut(instance)
    }

    /// The world-space placement of a node instance.
    pub fn world_transform(&self, node: &NodeRef) -> Option<Instance> {
        self.node(node)?
            .get_world_transforms()
            .get(node.instance)
            .copied()
    }

    /// Raycast targets for the registered pickables. Nodes without geometry
    /// are skipped.
    pub fn pick_targets(&self, pickables: &[Pickable]) -> Vec<PickTarget> {
        pickables
            .iter()
            .filter_map(|pickable| {
                let node = self.node(&pickable.node)?;
                let bounds = node.local_bounds()?;
                let world = node.get_world_transforms().get(pickable.node.instance)?.to_matrix();
                Some(PickTarget {
                    id: pickable.id,
                    world,
                    bounds,
                })
            })
            .collect()
    }

    /// Propagates transforms down every root and uploads the instance buffers.
    pub fn write_to_buffers(&mut self, queue: &wgpu::Queue, device: &wgpu::Device) {
        for root in self.roots.iter_mut() {
            root.update_world_transform_all();
            root.write_to_buffers(queue, device);
        }
    }

    pub fn update_world_transforms(&mut self) {
        for root in self.roots.iter_mut() {
            root.update_world_transform_all();
        }
    }
}

fn euler(rotation: Quaternion<f32>) -> [f32; 3] {
    let euler = Euler::from(rotation);
    [euler.x.0, euler.y.0, euler.z.0]
}

fn quaternion([x, y, z]: [f32; 3]) -> Quaternion<f32> {
    Quaternion::from(Euler::new(Rad(x), Rad(y), Rad(z))).normalize()
}

fn read_instance(instance: &Instance, property: Property) -> Option<Value> {
    let value = match property {
        Property::Position => instance.position.into(),
        Property::Rotation => euler(instance.rotation).into(),
        Property::Scale => instance.scale.into(),
        Property::Tint => instance.tint.into(),
        Property::Emissive => instance.emissive.into(),
        Property::EmissiveIntensity => instance.emissive_intensity.into(),
        Property::Orientation | Property::Exposure | Property::BloomStrength => return None,
    };
    Some(value)
}

fn write_instance(instance: &mut Instance, property: Property, value: Value) -> bool {
    let vector = || Vector3::from(value.xyz());
    match property {
        Property::Position => instance.position = vector(),
        Property::Rotation => instance.rotation = quaternion(value.xyz()),
        Property::Scale => instance.scale = vector(),
        Property::Tint => instance.tint = vector(),
        Property::Emissive => instance.emissive = vector(),
        Property::EmissiveIntensity => instance.emissive_intensity = value.scalar().max(0.0),
        Property::Orientation | Property::Exposure | Property::BloomStrength => return false,
    }
    true
}

impl Animatable for Stage {
    fn read(&self, target: &Target, property: Property) -> Option<Value> {
        match (target, property) {
            (Target::Node(node), _) => read_instance(&self.instance(node)?, property),
            (Target::Camera, Property::Position) => {
                let p = self.camera.position;
                Some([p.x, p.y, p.z].into())
            }
            (Target::Camera, Property::Orientation) => {
                Some([self.camera.yaw.0, self.camera.pitch.0].into())
            }
            (Target::Renderer, Property::Exposure) => Some(self.exposure.into()),
            (Target::Renderer, Property::BloomStrength) => Some(self.bloom_strength.into()),
            _ => None,
        }
    }

    fn write(&mut self, target: &Target, property: Property, value: Value) -> bool {
        match (target, property) {
            (Target::Node(node), _) => match self.instance_mut(node) {
                Some(instance) => write_instance(instance, property, value),
                None => false,
            },
            (Target::Camera, Property::Position) => {
                self.camera.position = value.xyz().into();
                true
            }
            (Target::Camera, Property::Orientation) => {
                let [yaw, pitch] = value.xy();
                self.camera.yaw = Rad(yaw);
                self.camera.pitch = Rad(pitch);
                true
            }
            (Target::Renderer, Property::Exposure) => {
                self.exposure = value.scalar().max(0.0);
                true
            }
            (Target::Renderer, Property::BloomStrength) => {
                self.bloom_strength = value.scalar().max(0.0);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_and_renderer_are_animatable() {
        let mut stage = Stage::new(Camera::new((0.0, 0.0, 0.0), Rad(0.0), Rad(0.0)), 0.0, 1.0);
        assert!(stage.write(&Target::Camera, Property::Orientation, [1.0f32, -0.5].into()));
        assert!(stage.write(&Target::Renderer, Property::Exposure, 0.7f32.into()));
        assert_eq!(stage.read(&Target::Camera, Property::Orientation), Some([1.0f32, -0.5].into()));
        assert_eq!(stage.read(&Target::Renderer, Property::Exposure), Some(0.7f32.into()));
        assert!(!stage.write(&Target::Camera, Property::Tint, [1.0f32; 3].into()));
        assert_eq!(stage.read(&Target::Node(NodeRef::new(3, vec![])), Property::Position), None);
    }
}
