use std::path::PathBuf;

use clap::{Parser, Subcommand};
use padconfig::SurfaceSize;

#[derive(Parser, Debug)]
#[command(
    name = "shaderpad",
    author,
    version,
    about = "Live GLSL fragment shader pad",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Shader name under a shader root (e.g. `plasma`) or a path to a `.glsl` file.
    #[arg(value_name = "SHADER")]
    pub shader: Option<String>,

    /// Wrap `iTime` every SECONDS; `0` freezes time at zero.
    #[arg(long = "loop", value_name = "SECONDS", value_parser = parse_loop_seconds)]
    pub loop_period: Option<f32>,

    /// Window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<SurfaceSize>,

    /// Log the average frame time every N frames (0 disables).
    #[arg(long, value_name = "N")]
    pub perf_cycle: Option<u32>,

    /// Attach depth buffers to the offscreen render targets.
    #[arg(long)]
    pub depth: bool,

    /// Settings file; defaults to `shaderpad.toml` in the config directory.
    #[arg(long, value_name = "FILE", env = "SHADERPAD_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the function definitions of a shader with their line ranges.
    Outline(OutlineArgs),
    /// Print resolved directories, settings file, and shader roots.
    Where(WhereArgs),
}

#[derive(Parser, Debug)]
pub struct OutlineArgs {
    /// Shader file to scan.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Emit JSON instead of one line per function.
    #[arg(long)]
    pub json: bool,

    /// Only report the function enclosing this one-based line.
    #[arg(long, value_name = "LINE", value_parser = clap::value_parser!(u32).range(1..))]
    pub at: Option<u32>,
}

#[derive(Parser, Debug)]
pub struct WhereArgs {
    /// Settings file to report instead of the default location.
    #[arg(long, value_name = "FILE", env = "SHADERPAD_CONFIG")]
    pub config: Option<PathBuf>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_loop_seconds(value: &str) -> Result<f32, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("loop period must not be empty".to_string());
    }
    let seconds: f32 = trimmed
        .parse()
        .map_err(|_| format!("invalid loop period '{trimmed}'; expected seconds"))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(format!(
            "invalid loop period '{trimmed}'; must be zero or a positive number of seconds"
        ));
    }
    Ok(seconds)
}

pub fn parse_size(value: &str) -> Result<SurfaceSize, String> {
    value.parse()
}
