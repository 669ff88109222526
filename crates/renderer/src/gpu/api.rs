use std::fmt::Debug;

/// Shader stages the pipeline creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// Buffer binding points used by the quad geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferTarget {
    Vertex,
    Index,
}

/// Values written through [`GlApi::set_uniform`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Int(i32),
}

/// The slice of OpenGL the shader pad needs.
///
/// Handles are plain copyable names; ownership is tracked by the structures
/// holding them (`ShaderProgramState`, `RenderTarget`, `GeometryBuffers`),
/// each of which frees its handles exactly once through `release`.
///
/// Object creation reports driver failures as strings, matching `glow`.
pub trait GlApi {
    type Shader: Copy + PartialEq + Debug;
    type Program: Copy + PartialEq + Debug;
    type Buffer: Copy + PartialEq + Debug;
    type Texture: Copy + PartialEq + Debug;
    type Framebuffer: Copy + PartialEq + Debug;
    type Renderbuffer: Copy + PartialEq + Debug;
    type UniformLocation: Clone + Debug;

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String>;
    /// Uploads `source` and compiles it, returning the compile status.
    fn compile_shader(&self, shader: Self::Shader, source: &str) -> bool;
    fn shader_info_log(&self, shader: Self::Shader) -> String;
    fn delete_shader(&self, shader: Self::Shader);

    fn create_program(&self) -> Result<Self::Program, String>;
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn detach_shader(&self, program: Self::Program, shader: Self::Shader);
    /// Links the program, returning the link status.
    fn link_program(&self, program: Self::Program) -> bool;
    fn program_info_log(&self, program: Self::Program) -> String;
    fn delete_program(&self, program: Self::Program);
    fn use_program(&self, program: Option<Self::Program>);
    fn uniform_location(&self, program: Self::Program, name: &str)
        -> Option<Self::UniformLocation>;
    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32>;
    fn set_uniform(&self, location: &Self::UniformLocation, value: UniformValue);

    fn create_buffer(&self) -> Result<Self::Buffer, String>;
    fn bind_buffer(&self, target: BufferTarget, buffer: Option<Self::Buffer>);
    /// Uploads static data into the buffer currently bound to `target`.
    fn upload_buffer(&self, target: BufferTarget, data: &[u8]);
    fn delete_buffer(&self, buffer: Self::Buffer);
    /// Enables `index` and points it at tightly packed `f32` components of
    /// the bound vertex buffer.
    fn vertex_attrib_f32(&self, index: u32, components: i32);

    fn create_texture(&self) -> Result<Self::Texture, String>;
    /// Allocates RGBA8 storage for the texture with LINEAR min filter,
    /// NEAREST mag filter and clamp-to-edge wrapping on both axes.
    fn allocate_color_texture(&self, texture: Self::Texture, width: i32, height: i32);
    /// Binds `texture` to the given texture unit.
    fn bind_texture(&self, unit: u32, texture: Option<Self::Texture>);
    fn delete_texture(&self, texture: Self::Texture);

    fn create_renderbuffer(&self) -> Result<Self::Renderbuffer, String>;
    /// Allocates 16-bit depth storage for the renderbuffer.
    fn allocate_depth_storage(&self, renderbuffer: Self::Renderbuffer, width: i32, height: i32);
    fn delete_renderbuffer(&self, renderbuffer: Self::Renderbuffer);

    fn create_framebuffer(&self) -> Result<Self::Framebuffer, String>;
    /// `None` binds the default (window) framebuffer.
    fn bind_framebuffer(&self, framebuffer: Option<Self::Framebuffer>);
    /// Attaches color and optional depth to the bound framebuffer.
    fn attach_targets(&self, texture: Self::Texture, depth: Option<Self::Renderbuffer>);
    /// Completeness check of the bound framebuffer; `Err` holds the status.
    fn framebuffer_status(&self) -> Result<(), u32>;
    fn delete_framebuffer(&self, framebuffer: Self::Framebuffer);

    fn viewport(&self, width: i32, height: i32);
    fn clear(&self, depth: bool);
    /// Draws `count` `u16` indices from the bound index buffer as a
    /// triangle strip.
    fn draw_index_strip(&self, count: i32);
}
