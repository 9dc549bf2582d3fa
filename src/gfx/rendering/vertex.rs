//! # Vertex Layouts
//!
//! The two GPU-compatible vertex formats uploaded by the frame driver. Each
//! vertex is a point sprite centre, consumed per instance so that the
//! vertex shader can expand it into a quad.

use std::mem;

/// A point: world position [x, y]
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointVertex {
    pub position: [f32; 2],
}

/// A trail point: world position [x, y] and fade factor
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TrailVertex {
    pub position: [f32; 2],
    /// 0 for the oldest point, approaching 1 for the newest
    pub alpha: f32,
}

/// Attribute layout of a vertex buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VertexLayout {
    Point,
    Trail,
}

impl VertexLayout {
    /// Number of f32 values per vertex
    pub fn floats_per_vertex(self) -> usize {
        self.stride() as usize / mem::size_of::<f32>()
    }

    pub fn stride(self) -> wgpu::BufferAddress {
        match self {
            VertexLayout::Point => mem::size_of::<PointVertex>() as wgpu::BufferAddress,
            VertexLayout::Trail => mem::size_of::<TrailVertex>() as wgpu::BufferAddress,
        }
    }

    /// Returns the vertex buffer layout for wgpu rendering.
    ///
    /// Both layouts step per instance:
    /// - Attribute 0: Position (Float32x2) at shader location 0
    /// - Attribute 1: Alpha (Float32) at shader location 1, trails only
    pub fn desc(self) -> wgpu::VertexBufferLayout<'static> {
        const POINT_ATTRIBUTES: [wgpu::VertexAttribute; 1] =
            wgpu::vertex_attr_array![0 => Float32x2];
        const TRAIL_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
            wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32];

        let attributes: &'static [wgpu::VertexAttribute] = match self {
            VertexLayout::Point => &POINT_ATTRIBUTES,
            VertexLayout::Trail => &TRAIL_ATTRIBUTES,
        };

        wgpu::VertexBufferLayout {
            array_stride: self.stride(),
            step_mode: wgpu::VertexStepMode::Instance,
            attributes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floats_per_vertex() {
        assert_eq!(VertexLayout::Point.floats_per_vertex(), 2);
        assert_eq!(VertexLayout::Trail.floats_per_vertex(), 3);
    }

    #[test]
    fn test_trail_alpha_follows_position() {
        let layout = VertexLayout::Trail.desc();
        assert_eq!(layout.array_stride, 12);
        assert_eq!(layout.attributes[1].offset, 8);
        assert_eq!(layout.attributes[1].shader_location, 1);
    }

    #[test]
    fn test_vertices_cast_from_flat_floats() {
        let flat = [1.0f32, 2.0, 0.5, 3.0, 4.0, 1.0];
        let vertices: &[TrailVertex] = bytemuck::cast_slice(&flat);
        assert_eq!(vertices[1], TrailVertex { position: [3.0, 4.0], alpha: 1.0 });
    }
}
