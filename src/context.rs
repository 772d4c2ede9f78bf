//! The GPU and window context shared by every flow.

use std::sync::Arc;

use anyhow::Context as _;
use winit::{dpi::PhysicalPosition, window::Window};

use crate::{
    camera::{Camera, CameraResources, Projection},
    data_structures::texture,
    error::WorldError,
    pipelines::{
        basic::{mk_basic_pipeline, mk_occluder_pipeline},
        light::{LightResources, LightUniform},
    },
    postprocess::{BloomSettings, PostProcessing},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MouseButtonState {
    Left,
    Right,
    #[default]
    None,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MouseState {
    pub coords: PhysicalPosition<f64>,
    pub pressed: MouseButtonState,
}

pub struct Pipelines {
    pub basic: wgpu::RenderPipeline,
    pub occluder: wgpu::RenderPipeline,
}

pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: texture::Texture,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    pub projection: Projection,
    pub light: LightResources,
    pub pipelines: Pipelines,
    pub post: PostProcessing,
    pub clear_colour: wgpu::Color,
    pub tick_duration_millis: u64,
    /// Cleared when the scene can't keep up; the frame loop then stops drawing.
    pub should_render: bool,
    pub mouse: MouseState,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("camera", &self.camera.camera)
            .field("post", &self.post.settings)
            .field("tick_duration_millis", &self.tick_duration_millis)
            .field("should_render", &self.should_render)
            .finish()
    }
}

impl Context {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let size = window.inner_size();

        // The instance is a handle to our GPU
        // BackendBit::PRIMARY => Vulkan + Metal + DX12 + Browser WebGPU
        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .map_err(WorldError::from)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| WorldError::Adapter(e.to_string()))?;
        log::info!("device and queue");
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features, so if
                // we're building for the web we'll have to disable some.
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                ..Default::default()
            })
            .await
            .map_err(WorldError::from)?;

        log::info!("Surface");
        let surface_caps = surface.get_capabilities(&adapter);
        // The composite pass encodes sRGB itself when the surface doesn't
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or(surface_caps.formats.first().copied())
            .context("surface reports no texture formats")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        // right/left, height, forward/backward - y axis rotation (turn head left/right) - x axis rotation (head up/down)
        let camera = Camera::new((0.0, 2.0, 22.0), cgmath::Deg(-90.0), cgmath::Deg(0.0));
        let projection = Projection::new(config.width, config.height, cgmath::Deg(75.0), 1.0, 10000.0);
        let camera = CameraResources::new(&device, camera, &projection);

        let depth_texture = texture::Texture::create_depth_texture(
            &device,
            [config.width, config.height],
            "depth_texture",
        );

        let light = LightResources::new(&device, LightUniform::default());

        let pipelines = Pipelines {
            basic: mk_basic_pipeline(&device, &light.bind_group_layout, &camera.bind_group_layout),
            occluder: mk_occluder_pipeline(
                &device,
                &light.bind_group_layout,
                &camera.bind_group_layout,
            ),
        };

        let post = PostProcessing::new(
            &device,
            config.format,
            [config.width, config.height],
            BloomSettings::default(),
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            camera,
            projection,
            light,
            pipelines,
            post,
            window,
            depth_texture,
            clear_colour: wgpu::Color::BLACK,
            tick_duration_millis: 1000,
            should_render: true,
            mouse: MouseState::default(),
        })
    }

    pub fn size(&self) -> [u32; 2] {
        [self.config.width, self.config.height]
    }

    pub fn window(&self) -> &Window {
        &self.window
    }
}

/// The parts of the [`Context`] flow constructors need to create GPU resources.
///
/// Device and queue are internally reference counted, so cloning them only
/// clones the handles.
#[derive(Debug, Clone)]
pub struct InitContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl From<&Context> for InitContext {
    fn from(ctx: &Context) -> Self {
        Self {
            device: ctx.device.clone(),
            queue: ctx.queue.clone(),
        }
    }
}
