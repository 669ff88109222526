use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use padconfig::PadConfig;
use renderer::{enclosing, scan, scanner_state, FunctionBoundary, Renderer, RendererConfig, ScannerState};
use tracing_subscriber::EnvFilter;

use crate::cli::{OutlineArgs, RunArgs, WhereArgs};
use crate::library::{Selection, ShaderLibrary};
use crate::paths::AppPaths;

const TITLE_PREFIX: &str = "shaderpad";

pub fn run(args: RunArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    let config = load_settings(args.config.as_deref(), &paths)?;
    let library = ShaderLibrary::new(paths.shader_roots(&config.shaders.roots));
    tracing::debug!(
        config = %paths.config_dir().display(),
        data = %paths.data_dir().display(),
        roots = ?library.roots(),
        "resolved shaderpad paths"
    );

    let requested = args.shader.as_deref().or(config.default_shader());
    let selection = library.select(requested);
    let renderer_config = build_renderer_config(&args, &config, selection);
    tracing::info!(
        shader = ?renderer_config.shader,
        size = ?renderer_config.surface_size,
        loop_period = ?renderer_config.loop_period,
        "starting shaderpad"
    );
    Renderer::new(renderer_config).run()
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Reads the settings file. An explicitly named file must exist; the default
/// location is optional.
pub fn load_settings(explicit: Option<&Path>, paths: &AppPaths) -> Result<PadConfig> {
    match explicit {
        Some(path) => PadConfig::from_path(path)
            .with_context(|| format!("failed to load settings from {}", path.display())),
        None => {
            let path = paths.config_file();
            PadConfig::load_or_default(&path)
                .with_context(|| format!("failed to load settings from {}", path.display()))
        }
    }
}

/// Merges command-line flags over the settings file.
pub fn build_renderer_config(
    args: &RunArgs,
    config: &PadConfig,
    selection: Selection,
) -> RendererConfig {
    let size = args.size.unwrap_or_else(|| config.size());
    RendererConfig {
        surface_size: size.as_tuple(),
        title: format!("{TITLE_PREFIX}: {}", selection.label),
        shader: selection.source,
        loop_period: args.loop_period.or_else(|| config.loop_period_secs()),
        perf_cycle: args.perf_cycle.unwrap_or_else(|| config.perf_cycle()),
        depth_buffer: args.depth || config.depth_buffer(),
    }
}

pub fn outline(args: OutlineArgs) -> Result<()> {
    let source = fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read shader {}", args.file.display()))?;
    let boundaries = scan(Some(&source));
    if scanner_state() == ScannerState::Disabled {
        tracing::warn!("function outline is disabled after an internal fault");
    }

    let selected: Vec<&FunctionBoundary> = match args.at {
        Some(line) => enclosing(&boundaries, line as usize - 1).into_iter().collect(),
        None => boundaries.iter().collect(),
    };

    if args.json {
        let rendered =
            serde_json::to_string_pretty(&selected).context("failed to encode outline")?;
        println!("{rendered}");
    } else {
        for boundary in selected {
            println!("{}", format_boundary(boundary));
        }
    }
    Ok(())
}

/// One line per function with one-based, inclusive line numbers.
pub fn format_boundary(boundary: &FunctionBoundary) -> String {
    let start = boundary.start_line + 1;
    let end = boundary
        .end_line
        .map(|end| (end + 1).to_string())
        .unwrap_or_else(|| "?".to_string());
    format!("{start}-{end}  {}", boundary.short_signature())
}

pub fn show_paths(args: WhereArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    let config_file = args.config.clone().unwrap_or_else(|| paths.config_file());
    let config = load_settings(args.config.as_deref(), &paths)?;
    let library = ShaderLibrary::new(paths.shader_roots(&config.shaders.roots));

    println!("Configuration directories:");
    println!("  config:     {}", paths.config_dir().display());
    println!("  data:       {}", paths.data_dir().display());
    println!(
        "  settings:   {}{}",
        config_file.display(),
        if config_file.is_file() { "" } else { " (missing)" }
    );
    println!("Shader search roots:");
    for root in library.roots() {
        println!("  {}", root.display());
    }
    let names = library.names();
    if !names.is_empty() {
        println!("Shaders:");
        for (name, path) in names {
            println!("  {name:<24} {}", path.display());
        }
    }
    let rendered = toml::to_string(&config).context("failed to render settings")?;
    println!("Effective settings:");
    for line in rendered.lines() {
        println!("  {line}");
    }
    Ok(())
}
