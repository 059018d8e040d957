/// Vertex layout for the turning page mesh
///
/// Must match the shader's vertex input: position @ location 0,
/// normal @ location 1, uv @ location 2, tightly packed.

use std::mem::size_of;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PageVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl PageVertex {
    /// Bytes between consecutive vertices
    pub const STRIDE: usize = size_of::<PageVertex>();

    /// (shader location, byte offset, f32 component count)
    pub const ATTRIBUTES: [(u32, usize, usize); 3] = [
        (0, 0, 3),
        (1, size_of::<[f32; 3]>(), 3),
        (2, size_of::<[f32; 6]>(), 2),
    ];
}

/// Raw bytes of a vertex slice, ready for a buffer upload
pub fn vertex_bytes(vertices: &[PageVertex]) -> &[u8] {
    bytemuck::cast_slice(vertices)
}

/// Raw bytes of an index slice
pub fn index_bytes(indices: &[u32]) -> &[u8] {
    bytemuck::cast_slice(indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_packed() {
        assert_eq!(PageVertex::STRIDE, 32);
        let (_, uv_offset, uv_len) = PageVertex::ATTRIBUTES[2];
        assert_eq!(uv_offset + uv_len * 4, PageVertex::STRIDE);
    }

    #[test]
    fn test_bytes_view() {
        let vertex = PageVertex {
            position: [1.0, 2.0, 3.0],
            normal: [0.0, 1.0, 0.0],
            uv: [0.5, 0.25],
        };
        let pair = [vertex, vertex];
        let bytes = vertex_bytes(&pair);
        assert_eq!(bytes.len(), 64);
        assert_eq!(&bytes[0..4], &1.0f32.to_ne_bytes());
        assert_eq!(index_bytes(&[0, 1, 2]).len(), 12);
    }
}
