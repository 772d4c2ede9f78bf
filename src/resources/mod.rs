use std::collections::HashMap;

use crate::{
    data_structures::{
        model,
        scene_graph::{AnimationClip, ContainerNode, GltfSource, SceneNode, to_scene_node},
        texture::Texture,
    },
    error::WorldError,
    resources::animation::Keyframes,
};

pub use texture::{
    diffuse_normal_layout, load_binary, load_binary_with_progress, load_string, load_texture,
};

/**
 * This module contains all logic for loading mesh/textures/etc. from external files.
 */
pub mod animation;
pub mod mesh;
pub mod texture;

/// Bytes of an embedded image, looked up through its buffer view.
fn view_bytes<'a>(buffers: &'a [Vec<u8>], view: &gltf::buffer::View) -> Option<&'a [u8]> {
    let buffer = buffers.get(view.buffer().index())?;
    buffer.get(view.offset()..view.offset() + view.length())
}

async fn load_image(
    file_name: &str,
    source: gltf::image::Source<'_>,
    buffers: &[Vec<u8>],
    is_normal_map: bool,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<Texture> {
    match source {
        gltf::image::Source::View { view, mime_type } => {
            let bytes = view_bytes(buffers, &view).ok_or_else(|| WorldError::AssetLoad {
                path: file_name.to_string(),
                reason: format!("image view {} is out of bounds", view.index()),
            })?;
            Ok(Texture::from_bytes(
                device,
                queue,
                bytes,
                file_name,
                mime_type.split('/').next_back(),
                is_normal_map,
            )?)
        }
        gltf::image::Source::Uri { uri, mime_type } => {
            load_texture(
                uri,
                is_normal_map,
                device,
                queue,
                mime_type.and_then(|mt| mt.split('/').next_back()),
            )
            .await
        }
    }
}

fn read_clips(
    gltf: &gltf::Gltf,
    buffer_data: &[Vec<u8>],
) -> HashMap<usize, Vec<AnimationClip>> {
    let mut animations: HashMap<usize, Vec<AnimationClip>> = HashMap::new();
    for animation in gltf.animations() {
        for channel in animation.channels() {
            let reader = channel.reader(|buffer| buffer_data.get(buffer.index()).map(|b| b.as_slice()));
            let timestamps: Vec<f32> = match reader.read_inputs() {
                Some(gltf::accessor::Iter::Standard(times)) => times.collect(),
                Some(gltf::accessor::Iter::Sparse(_)) => {
                    log::warn!("Sparse animation inputs are not supported (channel {})", channel.index());
                    Vec::new()
                }
                None => {
                    log::debug!("No animation found in channel {}", channel.index());
                    Vec::new()
                }
            };
            let keyframes = match reader.read_outputs() {
                Some(gltf::animation::util::ReadOutputs::Translations(translation)) => {
                    Keyframes::Translation(translation.map(Into::into).collect())
                }
                Some(gltf::animation::util::ReadOutputs::Rotations(rotation)) => {
                    Keyframes::Rotation(
                        rotation
                            .into_f32()
                            .map(|[x, y, z, w]| cgmath::Quaternion::new(w, x, y, z))
                            .collect(),
                    )
                }
                Some(gltf::animation::util::ReadOutputs::Scales(scales)) => {
                    Keyframes::Scale(scales.map(Into::into).collect())
                }
                Some(gltf::animation::util::ReadOutputs::MorphTargetWeights(_)) => Keyframes::Other,
                None => {
                    log::debug!("No Keyframes found in channel {}", channel.index());
                    Keyframes::Other
                }
            };
            if keyframes.is_empty() || timestamps.is_empty() {
                continue;
            }
            let clip = AnimationClip {
                name: animation.name().unwrap_or("Default").to_string(),
                keyframes,
                timestamps,
            };
            animations
                .entry(channel.target().node().index())
                .or_default()
                .push(clip);
        }
    }
    animations
}

/// Loads a `.glb`/`.gltf` file into a scene graph.
///
/// Every node keeps its name and `extras`; materials without a base colour
/// texture get a 1x1 texture of their base colour factor. `on_progress`
/// follows the download of the file itself.
pub async fn load_model_gltf(
    id: u32,
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    on_progress: &mut dyn FnMut(u64, Option<u64>),
) -> anyhow::Result<Box<dyn SceneNode>> {
    let gltf_bytes = load_binary_with_progress(file_name, on_progress).await?;
    let gltf = gltf::Gltf::from_slice(&gltf_bytes).map_err(|source| WorldError::Gltf {
        path: file_name.to_string(),
        source,
    })?;

    // Load buffers
    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => match gltf.blob.as_deref() {
                Some(blob) => buffer_data.push(blob.to_vec()),
                None => {
                    return Err(WorldError::AssetLoad {
                        path: file_name.to_string(),
                        reason: "binary chunk missing".to_string(),
                    }
                    .into());
                }
            },
            gltf::buffer::Source::Uri(uri) => {
                let bin = load_binary(uri).await?;
                buffer_data.push(bin);
            }
        }
    }
    let animations = read_clips(&gltf, &buffer_data);

    // Load materials
    let layout = diffuse_normal_layout(device);
    let mut materials = Vec::new();
    let mut emissive = Vec::new();
    for material in gltf.materials() {
        let pbr = material.pbr_metallic_roughness();
        let name = material.name().unwrap_or(file_name);
        let diffuse_texture = match pbr.base_color_texture() {
            Some(info) => {
                load_image(
                    file_name,
                    info.texture().source().source(),
                    &buffer_data,
                    false,
                    device,
                    queue,
                )
                .await?
            }
            None => Texture::from_color(device, queue, pbr.base_color_factor(), name),
        };
        let normal_texture = match material.normal_texture() {
            Some(info) => {
                load_image(
                    file_name,
                    info.texture().source().source(),
                    &buffer_data,
                    true,
                    device,
                    queue,
                )
                .await?
            }
            None => Texture::create_default_normal_map(2, 2, device, queue),
        };
        emissive.push(material.emissive_factor());
        materials.push(model::Material::new(
            device,
            name,
            diffuse_texture,
            normal_texture,
            &layout,
        ));
    }
    if materials.is_empty() {
        let white = Texture::from_color(device, queue, [1.0; 4], "default material");
        let normal = Texture::create_default_normal_map(2, 2, device, queue);
        materials.push(model::Material::new(device, "default", white, normal, &layout));
        emissive.push([0.0; 3]);
    }

    let source = GltfSource {
        id,
        buffers: &buffer_data,
        device,
        materials: &materials,
        emissive: &emissive,
        animations: &animations,
    };
    let mut models: Vec<Box<dyn SceneNode>> = gltf
        .scenes()
        .flat_map(|scene| scene.nodes().collect::<Vec<_>>())
        .map(|node| to_scene_node(node, &source))
        .collect();
    log::info!("Loaded {} with {} root nodes", file_name, models.len());

    let root_node: Box<dyn SceneNode> = match models.len() {
        1 => models.remove(0),
        _ => {
            let mut root_node = ContainerNode::new(file_name, 1, Vec::new());
            root_node.children = models;
            Box::new(root_node)
        }
    };

    Ok(root_node)
}

/// The light-orb model: a white icosphere the instances tint and light up.
pub fn orb_model(
    radius: f32,
    detail: u32,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> model::Model {
    let layout = diffuse_normal_layout(device);
    let white = Texture::from_color(device, queue, [1.0; 4], "orb");
    let normal = Texture::create_default_normal_map(2, 2, device, queue);
    let material = model::Material::new(device, "orb", white, normal, &layout);
    let (vertices, indices) = mesh::icosphere(radius, detail);
    model::Model {
        meshes: vec![mesh::upload_mesh("orb", &vertices, &indices, 0, device)],
        materials: vec![material],
    }
}
