//! Recording [`GlApi`] used by unit tests.
//!
//! Handles are integers from one shared counter. The fake tracks which
//! objects are alive so tests can assert that every handle is freed exactly
//! once. Compile and link outcomes are steered by markers in the source text:
//! `COMPILE_FAIL` fails compilation, `LINK_FAIL` fails linking.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use super::api::{BufferTarget, GlApi, ShaderStage, UniformValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Kind {
    Shader,
    Program,
    Buffer,
    Texture,
    Renderbuffer,
    Framebuffer,
}

/// One `draw_index_strip` call and the state it observed.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DrawCall {
    pub framebuffer: Option<u32>,
    pub texture: Option<u32>,
    pub program: Option<u32>,
    pub pass: Option<i32>,
    pub viewport: (i32, i32),
}

#[derive(Default)]
pub(crate) struct FakeGl {
    next: Cell<u32>,
    live: RefCell<HashSet<(Kind, u32)>>,
    deleted: RefCell<Vec<(Kind, u32)>>,
    double_frees: RefCell<Vec<(Kind, u32)>>,
    sources: RefCell<HashMap<u32, (ShaderStage, String)>>,
    attached: RefCell<HashMap<u32, Vec<u32>>>,
    current_program: Cell<Option<u32>>,
    current_framebuffer: Cell<Option<u32>>,
    current_texture: Cell<Option<u32>>,
    current_viewport: Cell<(i32, i32)>,
    last_pass: Cell<Option<i32>>,
    uniforms: RefCell<Vec<(String, UniformValue)>>,
    draws: RefCell<Vec<DrawCall>>,
    pub fail_vertex: Cell<bool>,
    pub incomplete_framebuffers: Cell<bool>,
    pub hide_position: Cell<bool>,
    texture_sizes: RefCell<HashMap<u32, (i32, i32)>>,
}

impl FakeGl {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn allocate(&self, kind: Kind) -> u32 {
        let id = self.next.get() + 1;
        self.next.set(id);
        self.live.borrow_mut().insert((kind, id));
        id
    }

    fn free(&self, kind: Kind, id: u32) {
        if self.live.borrow_mut().remove(&(kind, id)) {
            self.deleted.borrow_mut().push((kind, id));
        } else {
            self.double_frees.borrow_mut().push((kind, id));
        }
    }

    pub(crate) fn live_count(&self, kind: Kind) -> usize {
        self.live.borrow().iter().filter(|(k, _)| *k == kind).count()
    }

    pub(crate) fn is_live(&self, kind: Kind, id: u32) -> bool {
        self.live.borrow().contains(&(kind, id))
    }

    pub(crate) fn deleted_count(&self, kind: Kind, id: u32) -> usize {
        self.deleted
            .borrow()
            .iter()
            .filter(|entry| **entry == (kind, id))
            .count()
    }

    pub(crate) fn double_frees(&self) -> Vec<(Kind, u32)> {
        self.double_frees.borrow().clone()
    }

    pub(crate) fn draws(&self) -> Vec<DrawCall> {
        self.draws.borrow().clone()
    }

    pub(crate) fn uniform_writes(&self) -> Vec<(String, UniformValue)> {
        self.uniforms.borrow().clone()
    }

    pub(crate) fn texture_size(&self, id: u32) -> Option<(i32, i32)> {
        self.texture_sizes.borrow().get(&id).copied()
    }

    fn program_source_contains(&self, program: u32, needle: &str) -> bool {
        let attached = self.attached.borrow();
        let sources = self.sources.borrow();
        attached.get(&program).is_some_and(|shaders| {
            shaders.iter().any(|shader| {
                sources
                    .get(shader)
                    .is_some_and(|(_, text)| text.contains(needle))
            })
        })
    }
}

impl GlApi for FakeGl {
    type Shader = u32;
    type Program = u32;
    type Buffer = u32;
    type Texture = u32;
    type Framebuffer = u32;
    type Renderbuffer = u32;
    type UniformLocation = String;

    fn create_shader(&self, stage: ShaderStage) -> Result<u32, String> {
        let id = self.allocate(Kind::Shader);
        self.sources
            .borrow_mut()
            .insert(id, (stage, String::new()));
        Ok(id)
    }

    fn compile_shader(&self, shader: u32, source: &str) -> bool {
        let stage = self
            .sources
            .borrow()
            .get(&shader)
            .map(|(stage, _)| *stage);
        self.sources
            .borrow_mut()
            .insert(shader, (stage.unwrap_or(ShaderStage::Fragment), source.to_string()));
        if stage == Some(ShaderStage::Vertex) && self.fail_vertex.get() {
            return false;
        }
        !source.contains("COMPILE_FAIL")
    }

    fn shader_info_log(&self, _shader: u32) -> String {
        "ERROR: 0:3: 'foo' : undeclared identifier\nERROR: 1 compilation errors.".to_string()
    }

    fn delete_shader(&self, shader: u32) {
        self.free(Kind::Shader, shader);
    }

    fn create_program(&self) -> Result<u32, String> {
        Ok(self.allocate(Kind::Program))
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        self.attached
            .borrow_mut()
            .entry(program)
            .or_default()
            .push(shader);
    }

    fn detach_shader(&self, program: u32, shader: u32) {
        if let Some(shaders) = self.attached.borrow_mut().get_mut(&program) {
            shaders.retain(|id| *id != shader);
        }
    }

    fn link_program(&self, program: u32) -> bool {
        !self.program_source_contains(program, "LINK_FAIL")
    }

    fn program_info_log(&self, _program: u32) -> String {
        "error: linking failed".to_string()
    }

    fn delete_program(&self, program: u32) {
        self.free(Kind::Program, program);
    }

    fn use_program(&self, program: Option<u32>) {
        self.current_program.set(program);
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<String> {
        self.program_source_contains(program, name)
            .then(|| name.to_string())
    }

    fn attrib_location(&self, _program: u32, name: &str) -> Option<u32> {
        (name == "position" && !self.hide_position.get()).then_some(0)
    }

    fn set_uniform(&self, location: &String, value: UniformValue) {
        if location == "iPass" {
            if let UniformValue::Int(pass) = value {
                self.last_pass.set(Some(pass));
            }
        }
        self.uniforms
            .borrow_mut()
            .push((location.clone(), value));
    }

    fn create_buffer(&self) -> Result<u32, String> {
        Ok(self.allocate(Kind::Buffer))
    }

    fn bind_buffer(&self, _target: BufferTarget, _buffer: Option<u32>) {}

    fn upload_buffer(&self, _target: BufferTarget, _data: &[u8]) {}

    fn delete_buffer(&self, buffer: u32) {
        self.free(Kind::Buffer, buffer);
    }

    fn vertex_attrib_f32(&self, _index: u32, _components: i32) {}

    fn create_texture(&self) -> Result<u32, String> {
        Ok(self.allocate(Kind::Texture))
    }

    fn allocate_color_texture(&self, texture: u32, width: i32, height: i32) {
        self.texture_sizes
            .borrow_mut()
            .insert(texture, (width, height));
    }

    fn bind_texture(&self, _unit: u32, texture: Option<u32>) {
        self.current_texture.set(texture);
    }

    fn delete_texture(&self, texture: u32) {
        self.free(Kind::Texture, texture);
    }

    fn create_renderbuffer(&self) -> Result<u32, String> {
        Ok(self.allocate(Kind::Renderbuffer))
    }

    fn allocate_depth_storage(&self, _renderbuffer: u32, _width: i32, _height: i32) {}

    fn delete_renderbuffer(&self, renderbuffer: u32) {
        self.free(Kind::Renderbuffer, renderbuffer);
    }

    fn create_framebuffer(&self) -> Result<u32, String> {
        Ok(self.allocate(Kind::Framebuffer))
    }

    fn bind_framebuffer(&self, framebuffer: Option<u32>) {
        self.current_framebuffer.set(framebuffer);
    }

    fn attach_targets(&self, _texture: u32, _depth: Option<u32>) {}

    fn framebuffer_status(&self) -> Result<(), u32> {
        if self.incomplete_framebuffers.get() {
            Err(0x8CD6)
        } else {
            Ok(())
        }
    }

    fn delete_framebuffer(&self, framebuffer: u32) {
        self.free(Kind::Framebuffer, framebuffer);
    }

    fn viewport(&self, width: i32, height: i32) {
        self.current_viewport.set((width, height));
    }

    fn clear(&self, _depth: bool) {}

    fn draw_index_strip(&self, _count: i32) {
        self.draws.borrow_mut().push(DrawCall {
            framebuffer: self.current_framebuffer.get(),
            texture: self.current_texture.get(),
            program: self.current_program.get(),
            pass: self.last_pass.get(),
            viewport: self.current_viewport.get(),
        });
    }
}
