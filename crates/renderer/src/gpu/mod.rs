//! OpenGL resource management for the live shader pad.
//!
//! Everything here is generic over [`GlApi`] so resource lifetimes can be
//! checked without a driver:
//! - `api` is the narrow GL surface the pipeline needs; `glow_api` implements
//!   it on top of `glow`.
//! - `context` walks the context fallback chain (modern, legacy, legacy
//!   alias) over any [`ContextSurface`].
//! - `program` compiles the fixed vertex stage once and the fragment stage on
//!   every edit, releasing replaced handles exactly once.
//! - `geometry` owns the full-screen quad.
//! - `passes` owns the ping-pong render targets and draws the two passes.
//! - `uniforms` names the uniforms and caches their locations per program.
//! - `state` glues everything together as [`GpuState`], used by the session.

mod api;
mod context;
mod geometry;
mod glow_api;
mod passes;
mod program;
mod state;
mod uniforms;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{BufferTarget, GlApi, ShaderStage, UniformValue};
pub use context::{
    acquire_context, AcquiredContext, ApiFamily, ContextAcquisitionError, ContextRequest,
    ContextSurface, ContextTier, FailedAttempt, ShaderDialect, CONTEXT_FALLBACK_CHAIN,
};
pub use geometry::GeometryBuffers;
pub use glow_api::GlowBackend;
pub use passes::{
    draw_frame, FrameError, PingPong, RenderTarget, TargetOptions, OFFSCREEN_PASS, PRESENT_PASS,
};
pub use program::{compile, ShaderProgramState};
pub use state::GpuState;
pub use uniforms::{
    ResolvedUniforms, UniformCache, ASPECT_RATIO, PASS, PASS_INDEX, PREVIOUS_FRAME, RESOLUTION,
    TIME,
};
