use thiserror::Error;

use super::api::{GlApi, UniformValue};
use super::geometry::GeometryBuffers;
use super::program::ShaderProgramState;
use super::uniforms::{ResolvedUniforms, PREVIOUS_FRAME};
use crate::compile::POSITION_ATTRIBUTE;

/// Per-frame draw failure. Logged by the caller; never stops the loop.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("failed to create {what}: {message}")]
    Allocation { what: &'static str, message: String },
    #[error("program has no `{0}` attribute")]
    MissingAttribute(&'static str),
    #[error("offscreen targets are unavailable")]
    TargetsUnavailable,
}

fn allocation(what: &'static str) -> impl FnOnce(String) -> FrameError {
    move |message| FrameError::Allocation { what, message }
}

/// Allocation options shared by both ping-pong targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TargetOptions {
    /// Attach a depth renderbuffer to each target.
    pub depth: bool,
}

/// An offscreen framebuffer with its color texture.
pub struct RenderTarget<G: GlApi> {
    framebuffer: G::Framebuffer,
    texture: G::Texture,
    depth: Option<G::Renderbuffer>,
    width: u32,
    height: u32,
}

impl<G: GlApi> RenderTarget<G> {
    pub fn allocate(
        gl: &G,
        width: u32,
        height: u32,
        options: TargetOptions,
    ) -> Result<Self, FrameError> {
        let (w, h) = (width as i32, height as i32);
        let texture = gl.create_texture().map_err(allocation("texture"))?;
        gl.allocate_color_texture(texture, w, h);

        let depth = if options.depth {
            match gl.create_renderbuffer() {
                Ok(renderbuffer) => {
                    gl.allocate_depth_storage(renderbuffer, w, h);
                    Some(renderbuffer)
                }
                Err(message) => {
                    gl.delete_texture(texture);
                    return Err(allocation("depth renderbuffer")(message));
                }
            }
        } else {
            None
        };

        let framebuffer = match gl.create_framebuffer() {
            Ok(framebuffer) => framebuffer,
            Err(message) => {
                gl.delete_texture(texture);
                if let Some(depth) = depth {
                    gl.delete_renderbuffer(depth);
                }
                return Err(allocation("framebuffer")(message));
            }
        };
        gl.bind_framebuffer(Some(framebuffer));
        gl.attach_targets(texture, depth);
        if let Err(status) = gl.framebuffer_status() {
            tracing::error!(status, width, height, "offscreen framebuffer incomplete");
        }
        gl.bind_framebuffer(None);

        Ok(Self {
            framebuffer,
            texture,
            depth,
            width,
            height,
        })
    }

    pub fn framebuffer(&self) -> G::Framebuffer {
        self.framebuffer
    }

    pub fn texture(&self) -> G::Texture {
        self.texture
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn has_depth(&self) -> bool {
        self.depth.is_some()
    }

    pub fn release(self, gl: &G) {
        gl.delete_framebuffer(self.framebuffer);
        gl.delete_texture(self.texture);
        if let Some(depth) = self.depth {
            gl.delete_renderbuffer(depth);
        }
    }
}

/// Two offscreen targets swapped every frame.
pub struct PingPong<G: GlApi> {
    ping: RenderTarget<G>,
    pong: RenderTarget<G>,
    options: TargetOptions,
}

impl<G: GlApi> PingPong<G> {
    /// Allocates both targets; zero dimensions are clamped to one pixel.
    pub fn allocate(
        gl: &G,
        width: u32,
        height: u32,
        options: TargetOptions,
    ) -> Result<Self, FrameError> {
        let (width, height) = (width.max(1), height.max(1));
        let ping = RenderTarget::allocate(gl, width, height, options)?;
        let pong = match RenderTarget::allocate(gl, width, height, options) {
            Ok(pong) => pong,
            Err(err) => {
                ping.release(gl);
                return Err(err);
            }
        };
        tracing::debug!(width, height, depth = options.depth, "allocated ping-pong targets");
        Ok(Self { ping, pong, options })
    }

    pub fn size(&self) -> (u32, u32) {
        self.ping.size()
    }

    /// Replaces both targets at the new size, freeing the old pair first.
    pub fn resize(self, gl: &G, width: u32, height: u32) -> Result<Self, FrameError> {
        if self.size() == (width.max(1), height.max(1)) {
            return Ok(self);
        }
        let options = self.options;
        self.release(gl);
        Self::allocate(gl, width, height, options)
    }

    /// Target written this frame and the one holding the previous frame.
    pub fn write_read(&self, frame: u64) -> (&RenderTarget<G>, &RenderTarget<G>) {
        if frame % 2 == 0 {
            (&self.ping, &self.pong)
        } else {
            (&self.pong, &self.ping)
        }
    }

    pub fn release(self, gl: &G) {
        self.ping.release(gl);
        self.pong.release(gl);
    }
}

/// Index of the offscreen pass.
pub const OFFSCREEN_PASS: i32 = 0;
/// Index of the pass drawn to the window.
pub const PRESENT_PASS: i32 = 1;

/// Runs both passes of one frame.
///
/// Returns `Ok(false)` without drawing when no program is linked.
pub fn draw_frame<G: GlApi>(
    gl: &G,
    program: &mut ShaderProgramState<G>,
    geometry: &GeometryBuffers<G>,
    targets: &PingPong<G>,
    frame: &ResolvedUniforms,
) -> Result<bool, FrameError> {
    let Some(handle) = program.program() else {
        return Ok(false);
    };
    let position = gl
        .attrib_location(handle, POSITION_ATTRIBUTE)
        .ok_or(FrameError::MissingAttribute(POSITION_ATTRIBUTE))?;
    let (write, read) = targets.write_read(program.frame());
    let (target_width, target_height) = write.size();
    let [surface_width, surface_height] = frame.resolution;
    let depth = write.has_depth();

    gl.use_program(Some(handle));
    geometry.bind(gl, position);
    let uniforms = program.uniforms_mut();
    let samples_previous = uniforms.has(gl, handle, PREVIOUS_FRAME);

    gl.bind_framebuffer(Some(write.framebuffer()));
    gl.viewport(target_width as i32, target_height as i32);
    gl.clear(depth);
    if samples_previous {
        gl.bind_texture(0, Some(read.texture()));
        uniforms.set(gl, handle, PREVIOUS_FRAME, UniformValue::Int(0));
    }
    uniforms.apply_frame(gl, handle, frame, OFFSCREEN_PASS);
    geometry.draw(gl);

    gl.bind_framebuffer(None);
    gl.viewport(surface_width as i32, surface_height as i32);
    gl.clear(false);
    gl.bind_texture(0, Some(write.texture()));
    if samples_previous {
        uniforms.set(gl, handle, PREVIOUS_FRAME, UniformValue::Int(0));
    }
    uniforms.apply_frame(gl, handle, frame, PRESENT_PASS);
    geometry.draw(gl);

    program.advance_frame();
    Ok(true)
}
