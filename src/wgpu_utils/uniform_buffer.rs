// src/wgpu_utils/uniform_buffer.rs - dynamic-offset uniform array
use std::marker::PhantomData;

use super::binding_types;

/// Uniform buffer holding one `Content` per draw call, bound with a dynamic
/// offset so each draw in a render pass can select its own slot
pub struct DynamicUniformBuffer<Content> {
    buffer: wgpu::Buffer,
    layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    content_type: PhantomData<Content>,
    stride: u64,
    capacity: usize,
    staging: Vec<u8>,
}

impl<Content: bytemuck::Pod> DynamicUniformBuffer<Content> {
    fn name() -> &'static str {
        let type_name = std::any::type_name::<Content>();
        let pos = type_name.rfind(':').unwrap_or(0);
        if pos > 0 {
            &type_name[(pos + 1)..]
        } else {
            type_name
        }
    }

    /// Creates a buffer with room for `capacity` slots
    pub fn new(device: &wgpu::Device, capacity: usize) -> Self {
        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let stride = aligned_stride(std::mem::size_of::<Content>() as u64, alignment);
        let capacity = capacity.max(1);

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("DynamicUniformBuffer Layout: {}", Self::name())),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: binding_types::uniform_dynamic(std::mem::size_of::<Content>() as u64),
                count: None,
            }],
        });
        let buffer = Self::create_buffer(device, stride, capacity);
        let bind_group = Self::create_bind_group(device, &layout, &buffer);

        DynamicUniformBuffer {
            buffer,
            layout,
            bind_group,
            content_type: PhantomData,
            stride,
            capacity,
            staging: Vec::new(),
        }
    }

    fn create_buffer(device: &wgpu::Device, stride: u64, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("DynamicUniformBuffer: {}", Self::name())),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("DynamicUniformBuffer BindGroup: {}", Self::name())),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<Content>() as u64),
                }),
            }],
        })
    }

    /// Writes `contents` into consecutive slots, growing the buffer (and
    /// rebuilding its bind group) when they do not fit
    ///
    /// Growth stops at the device's buffer size limit; contents beyond it are
    /// dropped with an error log. Returns the number of slots written.
    pub fn write_all(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        contents: &[Content],
    ) -> usize {
        if contents.is_empty() {
            return 0;
        }

        let slot_limit = max_slots(self.stride, device.limits().max_buffer_size);
        let contents = if contents.len() > slot_limit {
            log::error!(
                "{} {} slots exceed the device limit of {}, dropping the rest",
                contents.len(),
                Self::name(),
                slot_limit
            );
            &contents[..slot_limit]
        } else {
            contents
        };

        if contents.len() > self.capacity {
            let capacity = contents.len().next_power_of_two().min(slot_limit);
            log::debug!(
                "Growing {} uniform slots from {} to {}",
                Self::name(),
                self.capacity,
                capacity
            );
            self.buffer = Self::create_buffer(device, self.stride, capacity);
            self.bind_group = Self::create_bind_group(device, &self.layout, &self.buffer);
            self.capacity = capacity;
        }

        self.staging.clear();
        self.staging.resize(self.stride as usize * contents.len(), 0);
        for (slot, content) in self.staging.chunks_mut(self.stride as usize).zip(contents) {
            let bytes = bytemuck::bytes_of(content);
            slot[..bytes.len()].copy_from_slice(bytes);
        }
        queue.write_buffer(&self.buffer, 0, &self.staging);
        contents.len()
    }

    /// Dynamic offset selecting `slot`
    pub fn offset(&self, slot: usize) -> wgpu::DynamicOffset {
        (self.stride * slot as u64) as wgpu::DynamicOffset
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    /// Frees the GPU allocation
    pub fn destroy(&self) {
        self.buffer.destroy();
    }
}

/// Number of `stride`-sized slots that fit in `max_buffer_size` bytes
fn max_slots(stride: u64, max_buffer_size: u64) -> usize {
    usize::try_from(max_buffer_size / stride.max(1)).unwrap_or(usize::MAX)
}

/// Rounds `size` up to a multiple of `alignment`
pub fn aligned_stride(size: u64, alignment: u64) -> u64 {
    size.div_ceil(alignment.max(1)) * alignment.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_stride() {
        assert_eq!(aligned_stride(32, 256), 256);
        assert_eq!(aligned_stride(256, 256), 256);
        assert_eq!(aligned_stride(257, 256), 512);
        assert_eq!(aligned_stride(32, 0), 32);
    }

    #[test]
    fn test_max_slots_respects_buffer_limit() {
        let limit = wgpu::Limits::downlevel_defaults().max_buffer_size;
        let slots = max_slots(256, limit);
        assert_eq!(slots, 1 << 20);
        assert!(slots as u64 * 256 <= limit);

        // Per-particle draws for the largest accepted population still fit
        let draws = crate::simulation::params::MAX_PARTICLES + 2;
        assert!(draws.next_power_of_two() <= slots);
    }
}
