//! Selective bloom and the final composite.
//!
//! Frame layout:
//!
//! 1. bloom mask pass: bloom-layer objects lit, everything else black (see
//!    [`crate::pipelines::basic::mk_occluder_pipeline`])
//! 2. scene pass: everything lit into the HDR scene target
//! 3. [`bloom::BloomPass`]: separable Gaussian blur of the mask
//! 4. [`composite::CompositePass`]: `scene + bloom * strength`, exposure,
//!    Reinhard tone mapping and optional FXAA into the surface
//!
//! Steps 1 and 3 are skipped while bloom is disabled.

pub mod bloom;
pub mod composite;

use crate::{config::BloomOptions, data_structures::texture::Texture};

/// Runtime bloom/tone-mapping parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloomSettings {
    pub enabled: bool,
    pub threshold: f32,
    pub strength: f32,
    pub radius: f32,
    pub exposure: f32,
    pub fxaa: bool,
}

impl From<&BloomOptions> for BloomSettings {
    fn from(options: &BloomOptions) -> Self {
        Self {
            enabled: options.enabled,
            threshold: options.threshold,
            strength: options.strength,
            radius: options.radius,
            exposure: options.exposure,
            fxaa: options.fxaa,
        }
    }
}

impl Default for BloomSettings {
    fn default() -> Self {
        (&BloomOptions::default()).into()
    }
}

pub struct PostProcessing {
    pub settings: BloomSettings,
    scene: Texture,
    bloom: bloom::BloomPass,
    composite: composite::CompositePass,
    size: [u32; 2],
}

impl PostProcessing {
    pub fn new(
        device: &wgpu::Device,
        output_format: wgpu::TextureFormat,
        size: [u32; 2],
        settings: BloomSettings,
    ) -> Self {
        let scene = Texture::create_render_target(device, size, Texture::HDR_FORMAT, "scene target");
        let bloom = bloom::BloomPass::new(device, size);
        let composite =
            composite::CompositePass::new(device, output_format, &scene.view, bloom.output_view());
        Self {
            settings,
            scene,
            bloom,
            composite,
            size,
        }
    }

    pub fn scene_view(&self) -> &wgpu::TextureView {
        &self.scene.view
    }

    pub fn bloom_mask_view(&self) -> &wgpu::TextureView {
        self.bloom.output_view()
    }

    pub fn size(&self) -> [u32; 2] {
        self.size
    }

    pub fn resize(&mut self, device: &wgpu::Device, size: [u32; 2]) {
        if size == self.size {
            return;
        }
        self.size = size;
        self.scene = Texture::create_render_target(device, size, Texture::HDR_FORMAT, "scene target");
        self.bloom.resize(device, size);
        self.composite
            .rebind(device, &self.scene.view, self.bloom.output_view());
    }

    /// Uploads the current settings; call once per frame before [`Self::render`].
    pub fn write(&self, queue: &wgpu::Queue) {
        self.bloom.write(queue, &self.settings, self.size);
        self.composite.write(queue, &self.settings, self.size);
    }

    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, output: &wgpu::TextureView) {
        if self.settings.enabled {
            self.bloom.render(encoder);
        }
        self.composite.render(encoder, output);
    }
}

/// Fragment-visible, filterable float 2D texture binding.
pub(crate) fn texture_2d(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

pub(crate) fn filtering_sampler(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

pub(crate) fn uniform_buffer(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

pub(crate) fn linear_sampler(device: &wgpu::Device, label: &str) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

/// Fullscreen-triangle pipeline with `vs_main`/`fs_main` and one colour target.
pub(crate) fn create_screen_space_pipeline(
    device: &wgpu::Device,
    label: &str,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    bind_group_layouts: &[&wgpu::BindGroupLayout],
) -> wgpu::RenderPipeline {
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{label} Pipeline Layout")),
        bind_group_layouts,
        immediate_size: 0,
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("{label} Pipeline")),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}
