//! Render composition and pipeline batching.
//!
//! This module defines the [`Render`] enum, which flows return every frame to
//! describe what should be drawn. The engine flattens it into one list of
//! instanced draws; each draw knows whether it belongs to the bloom layer, which
//! decides how it is drawn during the bloom mask pass.
//!
//! # Key types
//!
//! - [`Render<'a>`] is the enum describing render operations
//! - [`Instanced<'a>`] contains data for instanced rendering (model + instance buffer)
//!

use crate::data_structures::{model::Model, scene_graph::SceneNode};

/// Data for instanced object rendering: a model, instance buffer and id.
///
/// Used for 3D objects rendered with GPU instancing. The instance buffer contains
/// per-instance transformation data and other per-instance attributes.
pub struct Instanced<'a> {
    pub instance: &'a wgpu::Buffer,
    pub model: &'a Model,
    pub amount: usize,
    pub id: u32,
    /// Drawn lit into the bloom mask instead of as a black occluder.
    pub bloom: bool,
}

/// Specifies how a scene object should be rendered.
///
/// # Variants
///
/// - `None` renders nothing
/// - `Default(Instanced)` renders a single instanced object
/// - `Defaults(Vec<Instanced>)` renders a batch of instanced objects
/// - `Composed(Vec<Render>)` recursively renders composition of multiple renders
///
pub enum Render<'a> {
    None,
    Default(Instanced<'a>),
    Defaults(Vec<Instanced<'a>>),
    Composed(Vec<Render<'a>>),
}

impl<'a> Render<'a> {
    /// Flattens the render tree into `out`, skipping draws with nothing to draw.
    pub(crate) fn collect(self, out: &mut Vec<Instanced<'a>>) {
        match self {
            Render::Default(instanced) => push_drawable(out, instanced),
            Render::Defaults(vec) => vec
                .into_iter()
                .for_each(|instanced| push_drawable(out, instanced)),
            Render::Composed(renders) => renders.into_iter().for_each(|render| render.collect(out)),
            Render::None => (),
        }
    }
}

fn push_drawable<'a>(out: &mut Vec<Instanced<'a>>, instanced: Instanced<'a>) {
    if instanced.amount == 0 || instanced.instance.size() == 0 {
        log::warn!("you attemted to render something with zero instances");
        return;
    }
    out.push(instanced);
}

impl<'a> From<&'a dyn SceneNode> for Render<'a> {
    fn from(sn: &'a dyn SceneNode) -> Self {
        Render::Defaults(sn.get_render())
    }
}

impl<'a> From<&'a Box<dyn SceneNode>> for Render<'a> {
    fn from(sn: &'a Box<dyn SceneNode>) -> Self {
        Render::Defaults(sn.get_render())
    }
}
