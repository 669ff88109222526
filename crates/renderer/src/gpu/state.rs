use tracing::{debug, warn};

use crate::compile::CompileError;

use super::api::GlApi;
use super::context::ShaderDialect;
use super::geometry::GeometryBuffers;
use super::passes::{draw_frame, FrameError, PingPong, TargetOptions};
use super::program::{compile, ShaderProgramState};
use super::uniforms::ResolvedUniforms;

/// All GPU resources of one context: program, quad, offscreen targets.
///
/// Resources are freed by [`GpuState::release`], or on drop, which must
/// happen while the context is still current.
pub struct GpuState<G: GlApi> {
    gl: G,
    program: ShaderProgramState<G>,
    geometry: Option<GeometryBuffers<G>>,
    targets: Option<PingPong<G>>,
    options: TargetOptions,
    size: (u32, u32),
}

impl<G: GlApi> GpuState<G> {
    pub fn new(
        gl: G,
        dialect: ShaderDialect,
        size: (u32, u32),
        options: TargetOptions,
    ) -> Result<Self, FrameError> {
        let geometry = GeometryBuffers::new(&gl).map_err(|message| FrameError::Allocation {
            what: "quad buffers",
            message,
        })?;
        let targets = match PingPong::allocate(&gl, size.0, size.1, options) {
            Ok(targets) => targets,
            Err(err) => {
                geometry.release(&gl);
                return Err(err);
            }
        };
        Ok(Self {
            gl,
            program: ShaderProgramState::new(dialect),
            geometry: Some(geometry),
            targets: Some(targets),
            options,
            size: (size.0.max(1), size.1.max(1)),
        })
    }

    pub fn gl(&self) -> &G {
        &self.gl
    }

    pub fn program(&self) -> &ShaderProgramState<G> {
        &self.program
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Swaps in a new fragment stage; see [`compile`] for what is kept on
    /// each kind of failure.
    pub fn compile(&mut self, source: &str) -> Option<CompileError> {
        let dialect = self.dialect();
        let previous = std::mem::replace(&mut self.program, ShaderProgramState::new(dialect));
        let (next, error) = compile(&self.gl, source, previous);
        self.program = next;
        error
    }

    fn dialect(&self) -> ShaderDialect {
        self.program.dialect()
    }

    /// Reallocates the offscreen targets for a new surface size.
    pub fn resize(&mut self, width: u32, height: u32) {
        let size = (width.max(1), height.max(1));
        if size == self.size && self.targets.is_some() {
            return;
        }
        self.size = size;
        let resized = match self.targets.take() {
            Some(targets) => targets.resize(&self.gl, size.0, size.1),
            None => PingPong::allocate(&self.gl, size.0, size.1, self.options),
        };
        match resized {
            Ok(targets) => {
                debug!(width = size.0, height = size.1, "resized offscreen targets");
                self.targets = Some(targets);
            }
            Err(err) => warn!(error = %err, "failed to reallocate offscreen targets"),
        }
    }

    /// Draws one frame. `Ok(false)` means nothing was linked to draw.
    pub fn draw(&mut self, time: f32) -> Result<bool, FrameError> {
        let (Some(geometry), Some(targets)) = (self.geometry.as_ref(), self.targets.as_ref())
        else {
            return Err(FrameError::TargetsUnavailable);
        };
        let uniforms = self.uniforms(time);
        draw_frame(&self.gl, &mut self.program, geometry, targets, &uniforms)
    }

    pub fn uniforms(&self, time: f32) -> ResolvedUniforms {
        ResolvedUniforms::new(time, self.size.0, self.size.1)
    }

    /// Frees every GPU resource.
    pub fn release(mut self) {
        self.release_resources();
    }

    fn release_resources(&mut self) {
        let dialect = self.dialect();
        std::mem::replace(&mut self.program, ShaderProgramState::new(dialect)).release(&self.gl);
        if let Some(geometry) = self.geometry.take() {
            geometry.release(&self.gl);
        }
        if let Some(targets) = self.targets.take() {
            targets.release(&self.gl);
        }
    }
}

impl<G: GlApi> Drop for GpuState<G> {
    fn drop(&mut self) {
        self.release_resources();
    }
}
