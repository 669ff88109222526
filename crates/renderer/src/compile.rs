use thiserror::Error;

use crate::gpu::ShaderDialect;

/// Name of the vertex attribute fed by the full-screen quad.
pub const POSITION_ATTRIBUTE: &str = "position";

/// Returns the fixed vertex stage for the given GLSL dialect.
///
/// Every dialect does the same thing: forward the quad corner to
/// `gl_Position`. Only the version line and the attribute qualifier differ.
pub fn vertex_shader_source(dialect: ShaderDialect) -> &'static str {
    match dialect {
        ShaderDialect::Es300 => VERTEX_SHADER_ES300,
        ShaderDialect::Es100 => VERTEX_SHADER_ES100,
        ShaderDialect::Gl120 => VERTEX_SHADER_GL120,
    }
}

/// Bundled fragment shader that compiles against [`vertex_shader_source`]
/// for the same dialect. Used when no user shader can be loaded.
pub fn default_fragment_shader(dialect: ShaderDialect) -> &'static str {
    match dialect {
        ShaderDialect::Es300 => DEFAULT_FRAGMENT_MODERN,
        ShaderDialect::Es100 | ShaderDialect::Gl120 => DEFAULT_FRAGMENT_LEGACY,
    }
}

const DEFAULT_FRAGMENT_MODERN: &str = include_str!("../shaders/default.glsl");
const DEFAULT_FRAGMENT_LEGACY: &str = include_str!("../shaders/default_legacy.glsl");

const VERTEX_SHADER_ES300: &str = r"#version 300 es

in vec3 position;

void main(void) {
    gl_Position = vec4(position, 1.0);
}
";

const VERTEX_SHADER_ES100: &str = r"#version 100

attribute vec3 position;

void main(void) {
    gl_Position = vec4(position, 1.0);
}
";

const VERTEX_SHADER_GL120: &str = r"#version 120

attribute vec3 position;

void main(void) {
    gl_Position = vec4(position, 1.0);
}
";

/// Failure of one compile attempt, carrying the driver's diagnostics.
///
/// These are returned as data by the program builder: the caller decides
/// whether rendering continues with the previous program (fragment errors)
/// or pauses (link errors).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("Vertex Shader Compiler Error: {log}")]
    Vertex { log: String },
    #[error("Fragment Shader Compiler Error: {log}")]
    Fragment { log: String, lines: Vec<ErrorLine> },
    #[error("Shader Linking Error: {log}")]
    Link { log: String },
}

const VERTEX_TITLE: &str = "Vertex Shader Compiler Error";
const FRAGMENT_TITLE: &str = "Fragment Shader Compiler Error";
const LINK_TITLE: &str = "Shader Linking Error";

impl CompileError {
    /// Builds a fragment error, parsing the raw log into per-line records.
    pub fn fragment(log: impl Into<String>) -> Self {
        let log = log.into();
        let lines = parse_info_log(&log);
        Self::Fragment { log, lines }
    }

    /// Heading shown above the diagnostics.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Vertex { .. } => VERTEX_TITLE,
            Self::Fragment { .. } => FRAGMENT_TITLE,
            Self::Link { .. } => LINK_TITLE,
        }
    }

    /// Unparsed driver log.
    pub fn raw_log(&self) -> &str {
        match self {
            Self::Vertex { log } | Self::Fragment { log, .. } | Self::Link { log } => log,
        }
    }

    /// Per-line records; only fragment errors carry any.
    pub fn lines(&self) -> &[ErrorLine] {
        match self {
            Self::Fragment { lines, .. } => lines,
            _ => &[],
        }
    }
}

/// One `ERROR: <column>:<row>: <message>` diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorLine {
    pub row: u32,
    pub column: u32,
    pub message: String,
    /// The log line the record was parsed from.
    pub line: String,
}

const ERROR_MARKER: &str = "ERROR: ";

/// Extracts structured records from a compiler info log.
///
/// Lines that do not carry the `ERROR: <column>:<row>: <message>` shape are
/// skipped. The marker may appear anywhere in the line.
pub fn parse_info_log(log: &str) -> Vec<ErrorLine> {
    log.lines().filter_map(parse_error_line).collect()
}

fn parse_error_line(line: &str) -> Option<ErrorLine> {
    line.match_indices(ERROR_MARKER).find_map(|(offset, _)| {
        let rest = &line[offset + ERROR_MARKER.len()..];
        let (column, rest) = split_number(rest)?;
        let rest = rest.strip_prefix(':')?;
        let (row, rest) = split_number(rest)?;
        let message = rest.strip_prefix(": ")?;
        Some(ErrorLine {
            row,
            column,
            message: message.to_string(),
            line: line.to_string(),
        })
    })
}

fn split_number(text: &str) -> Option<(u32, &str)> {
    let end = text
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(text.len());
    if end == 0 {
        return None;
    }
    let value = text[..end].parse().ok()?;
    Some((value, &text[end..]))
}

/// Name of the uniform carrying the current pass index.
const PASS_UNIFORM: &str = "iPass";

/// Finds the highest pass index the shader compares `iPass` against.
///
/// Purely informational: the renderer always runs exactly two passes.
/// `iPass < 3` counts as 2 and `iPass > 1` as 2; other comparisons count
/// as the literal itself.
pub fn detect_max_pass_index(source: &str) -> u32 {
    source
        .match_indices(PASS_UNIFORM)
        .filter(|(offset, _)| !is_word_char_before(source, *offset))
        .filter_map(|(offset, _)| pass_comparison(&source[offset + PASS_UNIFORM.len()..]))
        .max()
        .unwrap_or(0)
}

fn is_word_char_before(source: &str, offset: usize) -> bool {
    source[..offset]
        .chars()
        .next_back()
        .is_some_and(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

fn pass_comparison(rest: &str) -> Option<u32> {
    if rest
        .chars()
        .next()
        .is_some_and(|ch| ch.is_ascii_alphanumeric() || ch == '_')
    {
        return None;
    }
    let rest = rest.trim_start();
    let (operator, rest) = ["==", "!=", "<=", ">=", "<", ">"]
        .iter()
        .find_map(|op| rest.strip_prefix(op).map(|tail| (*op, tail)))?;
    let (value, _) = split_number(rest.trim_start())?;
    Some(match operator {
        "<" => value.saturating_sub(1),
        ">" => value.saturating_add(1),
        _ => value,
    })
}
