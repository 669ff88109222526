use std::collections::HashMap;

use super::api::{GlApi, UniformValue};

pub const TIME: &str = "iTime";
pub const RESOLUTION: &str = "iResolution";
pub const ASPECT_RATIO: &str = "iAspectRatio";
pub const PASS: &str = "iPass";
/// Alias of [`PASS`] kept for shaders written against the older name.
pub const PASS_INDEX: &str = "passIndex";
/// Previous frame's offscreen target, bound on texture unit 0.
pub const PREVIOUS_FRAME: &str = "iPrevFrame";

/// Uniform values for one frame, as seen by collaborators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedUniforms {
    pub time: f32,
    pub resolution: [f32; 2],
    /// Height divided by width.
    pub aspect_ratio: f32,
}

impl ResolvedUniforms {
    pub fn new(time: f32, width: u32, height: u32) -> Self {
        let width = width.max(1) as f32;
        let height = height.max(1) as f32;
        Self {
            time,
            resolution: [width, height],
            aspect_ratio: height / width,
        }
    }
}

/// Lazily resolved uniform locations of one linked program.
///
/// A fresh cache is created for every link so locations from a replaced
/// program are never reused.
#[derive(Debug)]
pub struct UniformCache<G: GlApi> {
    locations: HashMap<&'static str, Option<G::UniformLocation>>,
}

impl<G: GlApi> Default for UniformCache<G> {
    fn default() -> Self {
        Self {
            locations: HashMap::new(),
        }
    }
}

impl<G: GlApi> UniformCache<G> {
    pub fn location(
        &mut self,
        gl: &G,
        program: G::Program,
        name: &'static str,
    ) -> Option<&G::UniformLocation> {
        self.locations
            .entry(name)
            .or_insert_with(|| gl.uniform_location(program, name))
            .as_ref()
    }

    /// Writes `value` if the program declares `name`; unused uniforms are
    /// silently skipped.
    pub fn set(&mut self, gl: &G, program: G::Program, name: &'static str, value: UniformValue) {
        if let Some(location) = self.location(gl, program, name) {
            gl.set_uniform(location, value);
        }
    }

    pub fn has(&mut self, gl: &G, program: G::Program, name: &'static str) -> bool {
        self.location(gl, program, name).is_some()
    }

    /// Writes the per-frame uniforms for one pass.
    pub fn apply_frame(
        &mut self,
        gl: &G,
        program: G::Program,
        frame: &ResolvedUniforms,
        pass: i32,
    ) {
        self.set(gl, program, TIME, UniformValue::Float(frame.time));
        self.set(gl, program, RESOLUTION, UniformValue::Vec2(frame.resolution));
        self.set(gl, program, ASPECT_RATIO, UniformValue::Float(frame.aspect_ratio));
        self.set(gl, program, PASS, UniformValue::Int(pass));
        self.set(gl, program, PASS_INDEX, UniformValue::Int(pass));
    }
}
