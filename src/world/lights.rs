//! Scene lights and the glowing orbs scattered on the ground.

use cgmath::Vector3;
use rand::{Rng, seq::SliceRandom};

use crate::{
    config::{OrbOptions, PaletteOptions},
    data_structures::{
        instance::Instance,
        scene_graph::{ModelNode, SceneNode},
    },
    pipelines::light::LightUniform,
    resources::orb_model,
};

pub const ORBS_NAME: &str = "Orbs";
const ORB_DETAIL: u32 = 1;

/// Global ambient light plus one directional light shining from above and behind.
pub fn scene_light() -> LightUniform {
    LightUniform::directional_from(Vector3::new(0.0, 50.0, -50.0), 0.3)
}

/// Ground positions for the orbs: the shuffled base spots jittered by
/// `scatter / 6`, then random spots outside the clear range.
pub fn orb_positions(options: &OrbOptions, rng: &mut impl Rng) -> Vec<[f32; 3]> {
    let mut spots = options.spots.clone();
    spots.shuffle(rng);
    let jitter = options.scatter / 3.0;
    let mut jittered = spots
        .into_iter()
        .map(|[x, z]| {
            [
                x + (rng.random::<f32>() - 0.5) * jitter,
                z + (rng.random::<f32>() - 0.5) * jitter,
            ]
        })
        .collect::<Vec<_>>()
        .into_iter();
    let low = options.clear_range.min(options.scatter);
    let high = options.clear_range.max(options.scatter);
    (0..options.count)
        .map(|_| {
            let [x, z] = jittered.next().unwrap_or_else(|| {
                let mut away = || {
                    let distance = if high > low {
                        rng.random_range(low..high)
                    } else {
                        low
                    };
                    if rng.random_bool(0.5) { distance } else { -distance }
                };
                [away(), away()]
            });
            [x, options.height, z]
        })
        .collect()
}

/// One instanced node for all orbs. Orbs start dark: black tint and an
/// unlit emission in their palette colour.
pub fn orb_node(
    id: u32,
    options: &OrbOptions,
    palette: &PaletteOptions,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    rng: &mut impl Rng,
) -> ModelNode {
    let positions = orb_positions(options, rng);
    let model = orb_model(options.radius, ORB_DETAIL, device, queue);
    let mut node = ModelNode::from_model(ORBS_NAME, positions.len(), id, device, model, vec![]);
    for (i, position) in positions.into_iter().enumerate() {
        node.set_local_transform(
            i,
            Instance {
                position: position.into(),
                tint: Vector3::new(0.0, 0.0, 0.0),
                emissive: palette.letter_colors[i % palette.letter_colors.len()].into(),
                emissive_intensity: 0.0,
                ..Default::default()
            },
        );
    }
    node.set_bloom(true);
    node
}
