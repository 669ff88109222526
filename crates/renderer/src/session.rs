use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::compile::CompileError;
use crate::gpu::{GlApi, GpuState, ResolvedUniforms};
use crate::outline::{self, FunctionBoundary};
use crate::runtime::{LoopState, PerfSampler, RenderLoop};

/// Loop settings a session starts with.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SessionOptions {
    /// Wrap period for `iTime` in seconds; see [`crate::LoopClock`].
    pub loop_period: Option<f32>,
    /// Frames per timing sample; `0` disables sampling.
    pub perf_cycle: u32,
}

/// The last fragment source that compiled and linked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkingShader<'a> {
    pub source: &'a str,
    pub compiled_at: DateTime<Utc>,
}

/// Interface the editor side talks to.
///
/// Owns the GPU state and the render loop. Every operation runs on the
/// thread that owns the GL context, between frames.
pub struct ShaderSession<G: GlApi> {
    gpu: GpuState<G>,
    render_loop: RenderLoop,
    perf: PerfSampler,
    error: Option<CompileError>,
    /// Survives link failures, which drop the live program.
    last_working: Option<(String, DateTime<Utc>)>,
}

impl<G: GlApi> ShaderSession<G> {
    pub fn new(gpu: GpuState<G>, options: SessionOptions) -> Self {
        Self {
            gpu,
            render_loop: RenderLoop::new(options.loop_period),
            perf: PerfSampler::new(options.perf_cycle),
            error: None,
            last_working: None,
        }
    }

    /// Compiles `source` as the new fragment stage.
    ///
    /// The outcome is observable through [`Self::error`] and
    /// [`Self::working`]. A fragment error leaves the previous program
    /// drawing. Link and vertex errors leave nothing to draw and stop the
    /// loop. A successful compile restarts it from time zero.
    pub fn compile_fragment_shader(&mut self, source: &str) {
        let error = self.gpu.compile(source);
        match &error {
            Some(err) => {
                warn!(
                    title = err.title(),
                    lines = err.lines().len(),
                    "shader compilation failed"
                );
                for line in err.lines() {
                    debug!(row = line.row, column = line.column, message = %line.message);
                }
                if !matches!(err, CompileError::Fragment { .. }) {
                    self.render_loop.stop();
                }
            }
            None => {
                if let Some(compiled_at) = self.gpu.program().compiled_at() {
                    self.last_working = Some((source.to_string(), compiled_at));
                }
                info!(
                    max_pass_index = self.gpu.program().max_pass_index(),
                    "shader compiled"
                );
                self.restart();
            }
        }
        self.error = error;
    }

    /// Begins ticking if the loop has never run.
    pub fn start(&mut self) {
        if self.render_loop.start() {
            debug!("render loop started");
        }
    }

    pub fn stop(&mut self) {
        self.render_loop.stop();
    }

    pub fn restart(&mut self) {
        self.render_loop.restart();
        self.perf.reset();
    }

    pub fn state(&self) -> LoopState {
        self.render_loop.state()
    }

    pub fn is_running(&self) -> bool {
        self.render_loop.is_running()
    }

    /// Elapsed time published by the last frame.
    pub fn time(&self) -> f32 {
        self.render_loop.time()
    }

    /// Diagnostics of the last compile attempt, if it failed.
    pub fn error(&self) -> Option<&CompileError> {
        self.error.as_ref()
    }

    /// The last source that compiled and linked, even if a later link
    /// failure left no program running.
    pub fn working(&self) -> Option<WorkingShader<'_>> {
        self.last_working
            .as_ref()
            .map(|(source, compiled_at)| WorkingShader {
                source,
                compiled_at: *compiled_at,
            })
    }

    pub fn uniforms(&self) -> ResolvedUniforms {
        self.gpu.uniforms(self.time())
    }

    pub fn max_pass_index(&self) -> u32 {
        self.gpu.program().max_pass_index()
    }

    pub fn loop_period(&self) -> Option<f32> {
        self.render_loop.period()
    }

    pub fn set_loop_period(&mut self, period: Option<f32>) {
        self.render_loop.set_period(period);
        debug!(period = ?self.render_loop.period(), "loop period changed");
    }

    /// Function boundaries of the working source.
    pub fn outline(&self) -> Vec<FunctionBoundary> {
        outline::scan(self.working().map(|working| working.source))
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
    }

    /// Advances the loop and draws; `true` when a frame should be presented.
    ///
    /// Draw failures are logged and the loop keeps running.
    pub fn frame(&mut self, now: Instant) -> bool {
        let Some(sample) = self.render_loop.tick(now) else {
            return false;
        };
        if self.gpu.program().is_faulted() {
            return false;
        }
        match self.gpu.draw(sample.seconds) {
            Ok(drawn) => {
                self.perf.record(now);
                drawn
            }
            Err(err) => {
                error!(error = %err, frame = sample.frame_index, "frame draw failed");
                false
            }
        }
    }

    pub fn gpu(&self) -> &GpuState<G> {
        &self.gpu
    }

    /// Stops the loop and frees all GPU resources.
    pub fn teardown(mut self) {
        self.render_loop.teardown();
        let Self { gpu, .. } = self;
        gpu.release();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::gpu::testing::FakeGl;
    use crate::gpu::{ShaderDialect, TargetOptions};

    const GOOD: &str = "uniform float iTime;\n\nvoid main() {\n  if(iTime > 1.0){}\n}\n";

    fn session(period: Option<f32>) -> ShaderSession<FakeGl> {
        let gpu = GpuState::new(FakeGl::new(), ShaderDialect::Es300, (64, 32), TargetOptions::default())
            .expect("gpu");
        ShaderSession::new(
            gpu,
            SessionOptions {
                loop_period: period,
                perf_cycle: 0,
            },
        )
    }

    #[test]
    fn successful_compile_runs_the_loop() {
        let mut session = session(None);
        assert_eq!(session.state(), LoopState::Idle);
        session.compile_fragment_shader(GOOD);
        assert!(session.error().is_none());
        assert!(session.is_running());
        let working = session.working().expect("working shader");
        assert_eq!(working.source, GOOD);

        let now = Instant::now();
        assert!(session.frame(now));
        assert!(session.frame(now + Duration::from_millis(500)));
        assert!((session.time() - 0.5).abs() < 1e-3);
        assert_eq!(session.gpu().gl().draws().len(), 4);
    }

    #[test]
    fn fragment_error_keeps_previous_program_drawing() {
        let mut session = session(None);
        session.compile_fragment_shader(GOOD);
        let now = Instant::now();
        assert!(session.frame(now));
        let draws_before = session.gpu().gl().draws().len();

        session.compile_fragment_shader("COMPILE_FAIL");
        let error = session.error().expect("error");
        assert_eq!(error.title(), "Fragment Shader Compiler Error");
        assert_eq!(error.lines()[0].row, 3);
        assert!(session.is_running());
        assert!(session.frame(now + Duration::from_millis(16)));
        assert!(session.gpu().gl().draws().len() > draws_before);
        assert_eq!(session.working().map(|w| w.source), Some(GOOD));
        assert_eq!(session.outline().len(), 1);

        session.compile_fragment_shader(GOOD);
        assert!(session.error().is_none());
        assert!(session.is_running());
    }

    #[test]
    fn link_failure_pauses_rendering() {
        let mut session = session(None);
        session.compile_fragment_shader("LINK_FAIL");
        assert!(matches!(session.error(), Some(CompileError::Link { .. })));
        assert!(session.working().is_none());
        assert!(session.outline().is_empty());
        session.restart();
        assert!(!session.frame(Instant::now()));
        assert!(session.gpu().gl().draws().is_empty());
    }

    #[test]
    fn link_failure_keeps_last_working_source() {
        let mut session = session(None);
        session.compile_fragment_shader(GOOD);
        let compiled_at = session.working().expect("working").compiled_at;

        session.compile_fragment_shader("LINK_FAIL");
        assert!(matches!(session.error(), Some(CompileError::Link { .. })));
        assert_eq!(session.state(), LoopState::Stopped);
        assert!(session.gpu().program().program().is_none());
        let working = session.working().expect("last working shader");
        assert_eq!(working.source, GOOD);
        assert_eq!(working.compiled_at, compiled_at);
        assert_eq!(session.outline().len(), 1);
    }

    #[test]
    fn start_runs_an_idle_loop_once() {
        let mut session = session(None);
        session.start();
        assert!(session.is_running());
        session.stop();
        session.start();
        assert_eq!(session.state(), LoopState::Stopped);
    }

    #[test]
    fn draw_errors_do_not_stop_the_loop() {
        let mut session = session(None);
        session.compile_fragment_shader(GOOD);
        session.gpu().gl().hide_position.set(true);
        let now = Instant::now();
        assert!(!session.frame(now));
        assert!(session.is_running());
        session.gpu().gl().hide_position.set(false);
        assert!(session.frame(now + Duration::from_millis(16)));
    }

    #[test]
    fn loop_period_wraps_published_time() {
        let mut session = session(Some(2.0));
        session.compile_fragment_shader(GOOD);
        let now = Instant::now();
        session.frame(now);
        session.frame(now + Duration::from_millis(2500));
        assert!((session.time() - 0.5).abs() < 1e-3);
        assert_eq!(session.uniforms().time, session.time());

        session.set_loop_period(Some(0.0));
        session.frame(now + Duration::from_millis(3000));
        assert_eq!(session.time(), 0.0);
        assert_eq!(session.loop_period(), Some(0.0));
    }

    #[test]
    fn uniforms_follow_surface_size() {
        let mut session = session(None);
        session.resize(200, 100);
        let uniforms = session.uniforms();
        assert_eq!(uniforms.resolution, [200.0, 100.0]);
        assert!((uniforms.aspect_ratio - 0.5).abs() < f32::EPSILON);
    }
}
