//! Final fullscreen pass: bloom add, exposure, tone mapping and FXAA.

use wgpu::util::DeviceExt;

use super::{BloomSettings, create_screen_space_pipeline, filtering_sampler, linear_sampler, texture_2d, uniform_buffer};

/// Must match `composite.wgsl`
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CompositeParams {
    pub texel_size: [f32; 2],
    pub exposure: f32,
    pub bloom_strength: f32,
    pub bloom_enabled: u32,
    pub fxaa: u32,
    /// Set when the output view does not apply the sRGB curve on write.
    pub encode_srgb: u32,
    pub _pad: u32,
}

impl CompositeParams {
    pub fn new(settings: &BloomSettings, size: [u32; 2], encode_srgb: bool) -> Self {
        Self {
            texel_size: [1.0 / size[0].max(1) as f32, 1.0 / size[1].max(1) as f32],
            exposure: settings.exposure.max(0.0),
            bloom_strength: settings.strength.max(0.0),
            bloom_enabled: settings.enabled as u32,
            fxaa: settings.fxaa as u32,
            encode_srgb: encode_srgb as u32,
            _pad: 0,
        }
    }
}

pub struct CompositePass {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    params: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    encode_srgb: bool,
}

impl CompositePass {
    pub fn new(
        device: &wgpu::Device,
        output_format: wgpu::TextureFormat,
        scene: &wgpu::TextureView,
        bloom: &wgpu::TextureView,
    ) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Composite Bind Group Layout"),
            entries: &[
                texture_2d(0),
                texture_2d(1),
                filtering_sampler(2),
                uniform_buffer(3),
            ],
        });
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Composite Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("composite.wgsl").into()),
        });
        let pipeline = create_screen_space_pipeline(device, "Composite", &shader, output_format, &[&layout]);
        let sampler = linear_sampler(device, "Composite Sampler");
        let encode_srgb = !output_format.is_srgb();
        let params = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Composite Params"),
            contents: bytemuck::cast_slice(&[CompositeParams::new(
                &BloomSettings::default(),
                [1, 1],
                encode_srgb,
            )]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = Self::create_bind_group(device, &layout, &sampler, &params, scene, bloom);
        Self {
            pipeline,
            layout,
            sampler,
            params,
            bind_group,
            encode_srgb,
        }
    }

    fn create_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        params: &wgpu::Buffer,
        scene: &wgpu::TextureView,
        bloom: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Composite Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(scene),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(bloom),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: params.as_entire_binding(),
                },
            ],
        })
    }

    /// Points the pass at new scene/bloom targets after a resize.
    pub fn rebind(&mut self, device: &wgpu::Device, scene: &wgpu::TextureView, bloom: &wgpu::TextureView) {
        self.bind_group =
            Self::create_bind_group(device, &self.layout, &self.sampler, &self.params, scene, bloom);
    }

    pub fn write(&self, queue: &wgpu::Queue, settings: &BloomSettings, size: [u32; 2]) {
        let params = CompositeParams::new(settings, size, self.encode_srgb);
        queue.write_buffer(&self.params, 0, bytemuck::cast_slice(&[params]));
    }

    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, output: &wgpu::TextureView) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Composite Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: output,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            ..Default::default()
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}
