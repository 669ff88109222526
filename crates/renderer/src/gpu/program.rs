use chrono::{DateTime, Utc};

use super::api::{GlApi, ShaderStage};
use super::context::ShaderDialect;
use super::uniforms::UniformCache;
use crate::compile::{detect_max_pass_index, vertex_shader_source, CompileError};

/// Lifecycle of the fixed vertex stage within one context.
#[derive(Debug)]
enum VertexStage<S> {
    Pending,
    Ready(S),
    /// Compilation failed once; never retried for this context.
    Failed(String),
}

/// Everything the builder owns for the active shader program.
///
/// Handles held here are released exactly once: replaced fragment shaders
/// and programs by [`compile`], everything else by [`ShaderProgramState::release`].
pub struct ShaderProgramState<G: GlApi> {
    dialect: ShaderDialect,
    vertex: VertexStage<G::Shader>,
    fragment: Option<G::Shader>,
    program: Option<G::Program>,
    fragment_source: Option<String>,
    uniforms: UniformCache<G>,
    compiled_at: Option<DateTime<Utc>>,
    max_pass_index: u32,
    frame: u64,
}

impl<G: GlApi> ShaderProgramState<G> {
    /// Empty state for a freshly acquired context.
    pub fn new(dialect: ShaderDialect) -> Self {
        Self {
            dialect,
            vertex: VertexStage::Pending,
            fragment: None,
            program: None,
            fragment_source: None,
            uniforms: UniformCache::default(),
            compiled_at: None,
            max_pass_index: 0,
            frame: 0,
        }
    }

    pub fn dialect(&self) -> ShaderDialect {
        self.dialect
    }

    pub fn vertex_source(&self) -> &'static str {
        vertex_shader_source(self.dialect)
    }

    /// Source of the currently linked program.
    pub fn fragment_source(&self) -> Option<&str> {
        self.fragment_source.as_deref()
    }

    pub fn program(&self) -> Option<G::Program> {
        self.program
    }

    pub fn vertex_shader(&self) -> Option<G::Shader> {
        match self.vertex {
            VertexStage::Ready(shader) => Some(shader),
            _ => None,
        }
    }

    pub fn fragment_shader(&self) -> Option<G::Shader> {
        self.fragment
    }

    pub fn compiled_at(&self) -> Option<DateTime<Utc>> {
        self.compiled_at
    }

    pub fn max_pass_index(&self) -> u32 {
        self.max_pass_index
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub(crate) fn advance_frame(&mut self) {
        self.frame = self.frame.wrapping_add(1);
    }

    pub(crate) fn uniforms_mut(&mut self) -> &mut UniformCache<G> {
        &mut self.uniforms
    }

    /// Whether setup failed in a way no recompile can fix.
    pub fn is_faulted(&self) -> bool {
        matches!(self.vertex, VertexStage::Failed(_))
    }

    /// Frees every handle, including the cached vertex shader.
    pub fn release(self, gl: &G) {
        if let Some(program) = self.program {
            gl.delete_program(program);
        }
        if let Some(fragment) = self.fragment {
            gl.delete_shader(fragment);
        }
        if let VertexStage::Ready(vertex) = self.vertex {
            gl.delete_shader(vertex);
        }
    }

    fn ensure_vertex(&mut self, gl: &G) -> Result<G::Shader, CompileError> {
        match &self.vertex {
            VertexStage::Ready(shader) => return Ok(*shader),
            VertexStage::Failed(log) => return Err(CompileError::Vertex { log: log.clone() }),
            VertexStage::Pending => {}
        }
        let shader = gl
            .create_shader(ShaderStage::Vertex)
            .map_err(|log| CompileError::Vertex { log })?;
        if gl.compile_shader(shader, self.vertex_source()) {
            self.vertex = VertexStage::Ready(shader);
            return Ok(shader);
        }
        let log = gl.shader_info_log(shader);
        gl.delete_shader(shader);
        tracing::error!(%log, "vertex shader failed to compile");
        self.vertex = VertexStage::Failed(log.clone());
        Err(CompileError::Vertex { log })
    }
}

/// Compiles `source` as the new fragment stage and relinks.
///
/// Returns the state to keep and the error of this attempt, if any:
///
/// * vertex failure: no program, the state is marked faulted;
/// * fragment failure: `previous` unchanged, its program keeps rendering;
/// * link failure: the old program is gone and none replaces it;
/// * success: a new program with an empty uniform cache.
pub fn compile<G: GlApi>(
    gl: &G,
    source: &str,
    mut previous: ShaderProgramState<G>,
) -> (ShaderProgramState<G>, Option<CompileError>) {
    let vertex = match previous.ensure_vertex(gl) {
        Ok(vertex) => vertex,
        Err(err) => return (previous, Some(err)),
    };

    let fragment = match gl.create_shader(ShaderStage::Fragment) {
        Ok(shader) => shader,
        Err(log) => return (previous, Some(CompileError::fragment(log))),
    };
    if !gl.compile_shader(fragment, source) {
        let log = gl.shader_info_log(fragment);
        gl.delete_shader(fragment);
        tracing::warn!("fragment shader failed to compile; keeping previous program");
        return (previous, Some(CompileError::fragment(log)));
    }

    if let Some(program) = previous.program.take() {
        if let Some(old) = previous.fragment.take() {
            gl.detach_shader(program, old);
            gl.delete_shader(old);
        }
        gl.delete_program(program);
    }
    if let Some(orphan) = previous.fragment.take() {
        gl.delete_shader(orphan);
    }

    let mut next = ShaderProgramState {
        dialect: previous.dialect,
        vertex: VertexStage::Ready(vertex),
        fragment: None,
        program: None,
        fragment_source: None,
        uniforms: UniformCache::default(),
        compiled_at: previous.compiled_at,
        max_pass_index: previous.max_pass_index,
        frame: 0,
    };

    let program = match gl.create_program() {
        Ok(program) => program,
        Err(log) => {
            gl.delete_shader(fragment);
            return (next, Some(CompileError::Link { log }));
        }
    };
    gl.attach_shader(program, vertex);
    gl.attach_shader(program, fragment);
    if !gl.link_program(program) {
        let log = gl.program_info_log(program);
        gl.detach_shader(program, fragment);
        gl.delete_program(program);
        gl.delete_shader(fragment);
        tracing::warn!(%log, "shader program failed to link; rendering paused");
        return (next, Some(CompileError::Link { log }));
    }

    next.fragment = Some(fragment);
    next.program = Some(program);
    next.fragment_source = Some(source.to_string());
    next.compiled_at = Some(Utc::now());
    next.max_pass_index = detect_max_pass_index(source);
    tracing::debug!(max_pass_index = next.max_pass_index, "shader program linked");
    (next, None)
}
