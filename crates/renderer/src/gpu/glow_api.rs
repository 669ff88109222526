//! [`GlApi`] backed by `glow`.
//!
//! Every method issues raw GL calls. They are sound because a
//! [`GlowBackend`] can only be built while its context is current on the
//! calling thread, and the window host never moves it to another thread.

use std::ffi::c_void;

use glow::HasContext;

use super::api::{BufferTarget, GlApi, ShaderStage, UniformValue};

/// OpenGL function table for the current context.
pub struct GlowBackend {
    gl: glow::Context,
}

impl GlowBackend {
    /// Loads GL entry points through `loader`.
    ///
    /// # Safety
    ///
    /// The context the loader belongs to must be current on this thread and
    /// stay current for as long as the backend is used.
    pub unsafe fn from_loader_function<F>(loader: F) -> Self
    where
        F: FnMut(&str) -> *const c_void,
    {
        let gl = unsafe { glow::Context::from_loader_function(loader) };
        Self { gl }
    }

    /// Version string reported by the driver.
    pub fn version_string(&self) -> String {
        unsafe { self.gl.get_parameter_string(glow::VERSION) }
    }
}

fn buffer_target(target: BufferTarget) -> u32 {
    match target {
        BufferTarget::Vertex => glow::ARRAY_BUFFER,
        BufferTarget::Index => glow::ELEMENT_ARRAY_BUFFER,
    }
}

impl GlApi for GlowBackend {
    type Shader = glow::Shader;
    type Program = glow::Program;
    type Buffer = glow::Buffer;
    type Texture = glow::Texture;
    type Framebuffer = glow::Framebuffer;
    type Renderbuffer = glow::Renderbuffer;
    type UniformLocation = glow::UniformLocation;

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String> {
        let ty = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        unsafe { self.gl.create_shader(ty) }
    }

    fn compile_shader(&self, shader: Self::Shader, source: &str) -> bool {
        unsafe {
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            self.gl.get_shader_compile_status(shader)
        }
    }

    fn shader_info_log(&self, shader: Self::Shader) -> String {
        unsafe { self.gl.get_shader_info_log(shader) }
    }

    fn delete_shader(&self, shader: Self::Shader) {
        unsafe { self.gl.delete_shader(shader) }
    }

    fn create_program(&self) -> Result<Self::Program, String> {
        unsafe { self.gl.create_program() }
    }

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { self.gl.attach_shader(program, shader) }
    }

    fn detach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { self.gl.detach_shader(program, shader) }
    }

    fn link_program(&self, program: Self::Program) -> bool {
        unsafe {
            self.gl.link_program(program);
            self.gl.get_program_link_status(program)
        }
    }

    fn program_info_log(&self, program: Self::Program) -> String {
        unsafe { self.gl.get_program_info_log(program) }
    }

    fn delete_program(&self, program: Self::Program) {
        unsafe { self.gl.delete_program(program) }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        unsafe { self.gl.use_program(program) }
    }

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { self.gl.get_uniform_location(program, name) }
    }

    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32> {
        unsafe { self.gl.get_attrib_location(program, name) }
    }

    fn set_uniform(&self, location: &Self::UniformLocation, value: UniformValue) {
        unsafe {
            match value {
                UniformValue::Float(x) => self.gl.uniform_1_f32(Some(location), x),
                UniformValue::Vec2([x, y]) => self.gl.uniform_2_f32(Some(location), x, y),
                UniformValue::Int(x) => self.gl.uniform_1_i32(Some(location), x),
            }
        }
    }

    fn create_buffer(&self) -> Result<Self::Buffer, String> {
        unsafe { self.gl.create_buffer() }
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<Self::Buffer>) {
        unsafe { self.gl.bind_buffer(buffer_target(target), buffer) }
    }

    fn upload_buffer(&self, target: BufferTarget, data: &[u8]) {
        unsafe {
            self.gl
                .buffer_data_u8_slice(buffer_target(target), data, glow::STATIC_DRAW);
        }
    }

    fn delete_buffer(&self, buffer: Self::Buffer) {
        unsafe { self.gl.delete_buffer(buffer) }
    }

    fn vertex_attrib_f32(&self, index: u32, components: i32) {
        unsafe {
            self.gl.enable_vertex_attrib_array(index);
            self.gl
                .vertex_attrib_pointer_f32(index, components, glow::FLOAT, false, 0, 0);
        }
    }

    fn create_texture(&self) -> Result<Self::Texture, String> {
        unsafe { self.gl.create_texture() }
    }

    fn allocate_color_texture(&self, texture: Self::Texture, width: i32, height: i32) {
        unsafe {
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::NEAREST as i32);
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_S,
                glow::CLAMP_TO_EDGE as i32,
            );
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_T,
                glow::CLAMP_TO_EDGE as i32,
            );
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA as i32,
                width,
                height,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(None),
            );
            self.gl.bind_texture(glow::TEXTURE_2D, None);
        }
    }

    fn bind_texture(&self, unit: u32, texture: Option<Self::Texture>) {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(glow::TEXTURE_2D, texture);
        }
    }

    fn delete_texture(&self, texture: Self::Texture) {
        unsafe { self.gl.delete_texture(texture) }
    }

    fn create_renderbuffer(&self) -> Result<Self::Renderbuffer, String> {
        unsafe { self.gl.create_renderbuffer() }
    }

    fn allocate_depth_storage(&self, renderbuffer: Self::Renderbuffer, width: i32, height: i32) {
        unsafe {
            self.gl.bind_renderbuffer(glow::RENDERBUFFER, Some(renderbuffer));
            self.gl
                .renderbuffer_storage(glow::RENDERBUFFER, glow::DEPTH_COMPONENT16, width, height);
            self.gl.bind_renderbuffer(glow::RENDERBUFFER, None);
        }
    }

    fn delete_renderbuffer(&self, renderbuffer: Self::Renderbuffer) {
        unsafe { self.gl.delete_renderbuffer(renderbuffer) }
    }

    fn create_framebuffer(&self) -> Result<Self::Framebuffer, String> {
        unsafe { self.gl.create_framebuffer() }
    }

    fn bind_framebuffer(&self, framebuffer: Option<Self::Framebuffer>) {
        unsafe { self.gl.bind_framebuffer(glow::FRAMEBUFFER, framebuffer) }
    }

    fn attach_targets(&self, texture: Self::Texture, depth: Option<Self::Renderbuffer>) {
        unsafe {
            self.gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D,
                Some(texture),
                0,
            );
            if let Some(depth) = depth {
                self.gl.framebuffer_renderbuffer(
                    glow::FRAMEBUFFER,
                    glow::DEPTH_ATTACHMENT,
                    glow::RENDERBUFFER,
                    Some(depth),
                );
            }
        }
    }

    fn framebuffer_status(&self) -> Result<(), u32> {
        let status = unsafe { self.gl.check_framebuffer_status(glow::FRAMEBUFFER) };
        if status == glow::FRAMEBUFFER_COMPLETE {
            Ok(())
        } else {
            Err(status)
        }
    }

    fn delete_framebuffer(&self, framebuffer: Self::Framebuffer) {
        unsafe { self.gl.delete_framebuffer(framebuffer) }
    }

    fn viewport(&self, width: i32, height: i32) {
        unsafe { self.gl.viewport(0, 0, width, height) }
    }

    fn clear(&self, depth: bool) {
        let mut mask = glow::COLOR_BUFFER_BIT;
        if depth {
            mask |= glow::DEPTH_BUFFER_BIT;
        }
        unsafe {
            self.gl.clear_color(0.0, 0.0, 0.0, 1.0);
            self.gl.clear(mask);
        }
    }

    fn draw_index_strip(&self, count: i32) {
        unsafe {
            self.gl
                .draw_elements(glow::TRIANGLE_STRIP, count, glow::UNSIGNED_SHORT, 0);
        }
    }
}
