use std::path::PathBuf;

/// Where the preview window gets its initial fragment shader from.
///
/// A file that cannot be read falls back to [`ShaderSource::Bundled`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShaderSource {
    /// Read from disk on a worker thread; reloadable with Ctrl+Enter.
    File(PathBuf),
    /// Inline source with nothing to reload from.
    Inline(String),
    /// The built-in shader for whichever GLSL dialect the context speaks.
    Bundled,
}

/// Configuration consumed by the preview window.
#[derive(Clone, Debug)]
pub struct RendererConfig {
    /// Window size in physical pixels.
    pub surface_size: (u32, u32),
    /// Title shown by the window manager.
    pub title: String,
    /// Shader to load at startup.
    pub shader: ShaderSource,
    /// Wrap period for `iTime`; `Some(0.0)` freezes time.
    pub loop_period: Option<f32>,
    /// Frames per timing sample; `0` disables sampling.
    pub perf_cycle: u32,
    /// Attach depth buffers to the offscreen targets.
    pub depth_buffer: bool,
}

impl Default for RendererConfig {
    /// A 1280x720 window running the bundled shader with unbounded time.
    fn default() -> Self {
        Self {
            surface_size: (1280, 720),
            title: "shaderpad".to_string(),
            shader: ShaderSource::Bundled,
            loop_period: None,
            perf_cycle: 0,
            depth_buffer: false,
        }
    }
}
