use bytemuck::{Pod, Zeroable};

use super::api::{BufferTarget, GlApi};

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct QuadVertex {
    position: [f32; 3],
}

const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex { position: [-1.0, -1.0, 0.0] },
    QuadVertex { position: [-1.0, 1.0, 0.0] },
    QuadVertex { position: [1.0, 1.0, 0.0] },
    QuadVertex { position: [1.0, -1.0, 0.0] },
];

/// Strip order covering the quad with two triangles.
const QUAD_INDICES: [u16; 4] = [0, 1, 3, 2];

/// Full-screen quad uploaded once per context.
pub struct GeometryBuffers<G: GlApi> {
    vertex: G::Buffer,
    index: G::Buffer,
}

impl<G: GlApi> GeometryBuffers<G> {
    pub fn new(gl: &G) -> Result<Self, String> {
        let vertex = gl.create_buffer()?;
        let index = match gl.create_buffer() {
            Ok(index) => index,
            Err(err) => {
                gl.delete_buffer(vertex);
                return Err(err);
            }
        };
        gl.bind_buffer(BufferTarget::Vertex, Some(vertex));
        gl.upload_buffer(BufferTarget::Vertex, bytemuck::cast_slice(&QUAD_VERTICES));
        gl.bind_buffer(BufferTarget::Index, Some(index));
        gl.upload_buffer(BufferTarget::Index, bytemuck::cast_slice(&QUAD_INDICES));
        Ok(Self { vertex, index })
    }

    /// Binds both buffers and feeds `position` from the vertex buffer.
    pub fn bind(&self, gl: &G, position: u32) {
        gl.bind_buffer(BufferTarget::Vertex, Some(self.vertex));
        gl.vertex_attrib_f32(position, 3);
        gl.bind_buffer(BufferTarget::Index, Some(self.index));
    }

    pub fn draw(&self, gl: &G) {
        gl.draw_index_strip(QUAD_INDICES.len() as i32);
    }

    pub fn release(self, gl: &G) {
        gl.delete_buffer(self.vertex);
        gl.delete_buffer(self.index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::testing::{FakeGl, Kind};

    #[test]
    fn quad_layout_matches_strip_order() {
        let bytes: &[u8] = bytemuck::cast_slice(&QUAD_VERTICES);
        assert_eq!(bytes.len(), 4 * 3 * std::mem::size_of::<f32>());
        let floats: &[f32] = bytemuck::cast_slice(&QUAD_VERTICES);
        assert_eq!(
            floats,
            &[-1.0, -1.0, 0.0, -1.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0, -1.0, 0.0]
        );
        assert_eq!(QUAD_INDICES, [0, 1, 3, 2]);
    }

    #[test]
    fn release_frees_both_buffers() {
        let gl = FakeGl::new();
        let geometry = GeometryBuffers::new(&gl).expect("buffers");
        assert_eq!(gl.live_count(Kind::Buffer), 2);
        geometry.release(&gl);
        assert_eq!(gl.live_count(Kind::Buffer), 0);
    }
}
