//! Separable Gaussian blur of the bloom mask.
//!
//! The mask is rendered by the frame loop; this pass blurs it horizontally into
//! a ping texture and vertically back into the mask, which the composite pass
//! then adds on top of the scene.

use wgpu::util::DeviceExt;

use super::{BloomSettings, create_screen_space_pipeline, filtering_sampler, linear_sampler, texture_2d, uniform_buffer};
use crate::data_structures::texture::Texture;

/// Blur direction params, must match `blur.wgsl`
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BlurParams {
    pub texel_size: [f32; 2],
    pub direction: [f32; 2],
    pub spread: f32,
    pub threshold: f32,
    pub _pad: [f32; 2],
}

impl BlurParams {
    pub fn new(settings: &BloomSettings, size: [u32; 2], horizontal: bool) -> Self {
        Self {
            texel_size: [1.0 / size[0].max(1) as f32, 1.0 / size[1].max(1) as f32],
            direction: if horizontal { [1.0, 0.0] } else { [0.0, 1.0] },
            // radius 0 blurs by single texels, radius 1 spreads the kernel ten times wider
            spread: 1.0 + settings.radius.max(0.0) * 9.0,
            // only the first pass extracts
            threshold: if horizontal {
                settings.threshold.max(0.0)
            } else {
                0.0
            },
            _pad: [0.0; 2],
        }
    }
}

pub struct BloomPass {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    mask: Texture,
    ping: Texture,
    // [0 = horizontal (mask -> ping), 1 = vertical (ping -> mask)]
    params: [wgpu::Buffer; 2],
    bind_groups: [wgpu::BindGroup; 2],
}

impl BloomPass {
    pub fn new(device: &wgpu::Device, size: [u32; 2]) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Bloom Blur Layout"),
            entries: &[texture_2d(0), filtering_sampler(1), uniform_buffer(2)],
        });
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Bloom Blur Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("blur.wgsl").into()),
        });
        let pipeline =
            create_screen_space_pipeline(device, "Bloom Blur", &shader, Texture::HDR_FORMAT, &[&layout]);
        let sampler = linear_sampler(device, "Bloom Sampler");
        let params = [true, false].map(|horizontal| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(if horizontal {
                    "Bloom Blur H Params"
                } else {
                    "Bloom Blur V Params"
                }),
                contents: bytemuck::cast_slice(&[BlurParams::new(
                    &BloomSettings::default(),
                    size,
                    horizontal,
                )]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
        });
        let (mask, ping) = Self::create_targets(device, size);
        let bind_groups = Self::create_bind_groups(device, &layout, &sampler, &mask, &ping, &params);
        Self {
            pipeline,
            layout,
            sampler,
            mask,
            ping,
            params,
            bind_groups,
        }
    }

    fn create_targets(device: &wgpu::Device, size: [u32; 2]) -> (Texture, Texture) {
        (
            Texture::create_render_target(device, size, Texture::HDR_FORMAT, "bloom mask"),
            Texture::create_render_target(device, size, Texture::HDR_FORMAT, "bloom ping"),
        )
    }

    fn create_bind_groups(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        mask: &Texture,
        ping: &Texture,
        params: &[wgpu::Buffer; 2],
    ) -> [wgpu::BindGroup; 2] {
        let bind = |source: &Texture, params: &wgpu::Buffer, label: &str| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&source.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: params.as_entire_binding(),
                    },
                ],
            })
        };
        [
            bind(mask, &params[0], "Bloom Blur H"),
            bind(ping, &params[1], "Bloom Blur V"),
        ]
    }

    /// The mask the frame loop renders into, blurred after [`Self::render`].
    pub fn output_view(&self) -> &wgpu::TextureView {
        &self.mask.view
    }

    pub fn resize(&mut self, device: &wgpu::Device, size: [u32; 2]) {
        let (mask, ping) = Self::create_targets(device, size);
        self.mask = mask;
        self.ping = ping;
        self.bind_groups = Self::create_bind_groups(
            device,
            &self.layout,
            &self.sampler,
            &self.mask,
            &self.ping,
            &self.params,
        );
    }

    pub fn write(&self, queue: &wgpu::Queue, settings: &BloomSettings, size: [u32; 2]) {
        for (buffer, horizontal) in self.params.iter().zip([true, false]) {
            let params = BlurParams::new(settings, size, horizontal);
            queue.write_buffer(buffer, 0, bytemuck::cast_slice(&[params]));
        }
    }

    pub fn render(&self, encoder: &mut wgpu::CommandEncoder) {
        for (target, bind_group, label) in [
            (&self.ping, &self.bind_groups[0], "Bloom Blur H Pass"),
            (&self.mask, &self.bind_groups[1], "Bloom Blur V Pass"),
        ] {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(label),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
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
            pass.set_bind_group(0, bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_horizontal_pass_extracts() {
        let settings = BloomSettings {
            threshold: 0.4,
            ..Default::default()
        };
        let h = BlurParams::new(&settings, [200, 100], true);
        let v = BlurParams::new(&settings, [200, 100], false);
        assert_eq!(h.threshold, 0.4);
        assert_eq!(v.threshold, 0.0);
        assert_eq!(h.direction, [1.0, 0.0]);
        assert_eq!(v.direction, [0.0, 1.0]);
        assert_eq!(h.texel_size, [0.005, 0.01]);
    }
}
