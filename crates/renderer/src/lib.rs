//! Renderer crate for shaderpad, a live GLSL fragment shader pad.
//!
//! The crate compiles fragment shaders as the user edits them, runs them over
//! a full-screen quad with two ping-pong passes, and reports compiler output
//! in a structured form. The overall flow is:
//!
//! ```text
//!   CLI / shaderpad
//!          │ RendererConfig
//!          ▼
//!   Renderer::run ──▶ window host ──▶ winit event loop ──▶ ShaderSession::frame()
//!                          │                                     │
//!                          └─▶ compile_fragment_shader()         └─▶ GpuState::draw() ─▶ GL
//! ```
//!
//! `ShaderSession` is the editor-facing interface: it owns the GPU state, the
//! render loop and the last compile outcome. The GPU layer is generic over
//! [`GlApi`] so it runs against a real `glow` context in the window and
//! against a recording fake in tests. [`scan`] outlines the function
//! definitions of a source for editor navigation.

mod compile;
pub mod gpu;
mod outline;
mod runtime;
mod session;
mod types;
mod window;

use anyhow::Result;

pub use compile::{
    default_fragment_shader, detect_max_pass_index, parse_info_log, vertex_shader_source,
    CompileError, ErrorLine, POSITION_ATTRIBUTE,
};
pub use gpu::{GlApi, GlowBackend, GpuState, ResolvedUniforms, ShaderDialect, TargetOptions};
pub use outline::{
    enclosing, scan, scanner_state, FunctionBoundary, OutlineScanner, ScannerFault, ScannerState,
};
pub use runtime::{LoopClock, LoopState, PerfSampler, RenderLoop, TimeSample};
pub use session::{SessionOptions, ShaderSession, WorkingShader};
pub use types::{RendererConfig, ShaderSource};

/// High-level entry point that owns the chosen configuration.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Opens the preview window and blocks until it is closed.
    ///
    /// Fails when no window or GL context can be created, for example when
    /// the driver offers none of the context fallbacks.
    pub fn run(self) -> Result<()> {
        window::run_window(self.config)
    }
}
