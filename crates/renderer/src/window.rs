use std::ffi::CString;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::thread;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use glutin::config::{Config, ConfigTemplateBuilder};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, GlProfile, PossiblyCurrentContext, Version,
};
use glutin::display::{Display, GetGlDisplay};
use glutin::prelude::*;
use glutin::surface::{Surface, SurfaceAttributesBuilder, SwapInterval, WindowSurface};
use glutin_winit::DisplayBuilder;
use raw_window_handle::{HasRawWindowHandle, RawWindowHandle};
use tracing::{debug, error, info, warn};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy};
use winit::keyboard::{Key, ModifiersState, NamedKey};
use winit::window::{Window, WindowBuilder};

use crate::compile::default_fragment_shader;
use crate::gpu::{
    acquire_context, ApiFamily, ContextRequest, ContextSurface, GlowBackend, GpuState,
    TargetOptions,
};
use crate::session::{SessionOptions, ShaderSession};
use crate::types::{RendererConfig, ShaderSource};

#[derive(Debug)]
enum WindowCommand {
    ShaderLoaded(Result<String, String>),
}

/// Key bindings of the preview window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyAction {
    Recompile,
    ToggleRunning,
    Exit,
}

fn key_action(event: &KeyEvent, modifiers: ModifiersState) -> Option<KeyAction> {
    if event.state != ElementState::Pressed || event.repeat {
        return None;
    }
    match &event.logical_key {
        Key::Named(NamedKey::Enter) if modifiers.control_key() => Some(KeyAction::Recompile),
        Key::Named(NamedKey::F5) => Some(KeyAction::Recompile),
        Key::Named(NamedKey::Space) => Some(KeyAction::ToggleRunning),
        Key::Named(NamedKey::Escape) => Some(KeyAction::Exit),
        _ => None,
    }
}

/// Context creation on a glutin display for an existing window surface.
struct GlutinSurface<'a> {
    display: &'a Display,
    config: &'a Config,
    surface: &'a Surface<WindowSurface>,
    window: RawWindowHandle,
}

impl ContextSurface for GlutinSurface<'_> {
    type Context = PossiblyCurrentContext;
    type Error = glutin::error::Error;

    fn try_create(&mut self, request: &ContextRequest) -> Result<Self::Context, Self::Error> {
        let version = Version::new(request.major, request.minor);
        let builder = match request.family {
            ApiFamily::Gles => {
                ContextAttributesBuilder::new().with_context_api(ContextApi::Gles(Some(version)))
            }
            ApiFamily::Desktop => ContextAttributesBuilder::new()
                .with_context_api(ContextApi::OpenGl(Some(version)))
                .with_profile(GlProfile::Compatibility),
        };
        let attributes = builder.build(Some(self.window));
        let context = unsafe { self.display.create_context(self.config, &attributes)? };
        context.make_current(self.surface)
    }
}

fn non_zero(value: u32) -> NonZeroU32 {
    NonZeroU32::new(value).unwrap_or(NonZeroU32::MIN)
}

fn spawn_loader(path: PathBuf, proxy: EventLoopProxy<WindowCommand>) -> Result<()> {
    thread::Builder::new()
        .name("shaderpad-loader".into())
        .spawn(move || {
            let loaded = std::fs::read_to_string(&path)
                .map_err(|err| format!("failed to read {}: {err}", path.display()));
            if proxy.send_event(WindowCommand::ShaderLoaded(loaded)).is_err() {
                debug!("event loop closed before shader finished loading");
            }
        })
        .context("failed to spawn shader loader thread")?;
    Ok(())
}

fn report_compile(session: &ShaderSession<GlowBackend>, window: &Window, title: &str) {
    match session.error() {
        Some(err) => {
            error!("{err}");
            window.set_title(&format!("{title} (compile error)"));
        }
        None => {
            let functions = session.outline().len();
            info!(functions, "preview updated");
            window.set_title(title);
        }
    }
}

/// Opens the preview window and drives the session until it closes.
pub(crate) fn run_window(config: RendererConfig) -> Result<()> {
    let event_loop = EventLoopBuilder::<WindowCommand>::with_user_event()
        .build()
        .map_err(|err| anyhow!("failed to create event loop: {err}"))?;
    let proxy = event_loop.create_proxy();

    let (width, height) = config.surface_size;
    let window_builder = WindowBuilder::new()
        .with_title(&config.title)
        .with_inner_size(PhysicalSize::new(width, height));
    let template = ConfigTemplateBuilder::new()
        .with_alpha_size(8)
        .with_depth_size(0);
    let (window, gl_config) = DisplayBuilder::new()
        .with_window_builder(Some(window_builder))
        .build(&event_loop, template, |configs| {
            configs
                .reduce(|a, b| if a.num_samples() > b.num_samples() { a } else { b })
                .expect("glutin reports at least one matching config")
        })
        .map_err(|err| anyhow!("failed to build GL display: {err}"))?;
    let window = window.context("display builder did not create a window")?;

    let raw_window = window.raw_window_handle();
    let gl_display = gl_config.display();
    let size = window.inner_size();
    let surface_attributes = SurfaceAttributesBuilder::<WindowSurface>::new().build(
        raw_window,
        non_zero(size.width),
        non_zero(size.height),
    );
    let gl_surface = unsafe { gl_display.create_window_surface(&gl_config, &surface_attributes) }
        .context("failed to create window surface")?;

    let acquired = acquire_context(&mut GlutinSurface {
        display: &gl_display,
        config: &gl_config,
        surface: &gl_surface,
        window: raw_window,
    })?;
    let gl_context = acquired.context;
    if let Err(err) = gl_surface.set_swap_interval(&gl_context, SwapInterval::Wait(NonZeroU32::MIN))
    {
        warn!(error = %err, "vsync unavailable; frames are not paced by the display");
    }

    let gl = unsafe {
        GlowBackend::from_loader_function(|symbol| match CString::new(symbol) {
            Ok(name) => gl_display.get_proc_address(&name),
            Err(_) => std::ptr::null(),
        })
    };
    info!(version = %gl.version_string(), api = acquired.request.name, "OpenGL ready");

    let dialect = acquired.request.dialect;
    let gpu = GpuState::new(
        gl,
        dialect,
        (size.width, size.height),
        TargetOptions {
            depth: config.depth_buffer,
        },
    )
    .context("failed to allocate GPU resources")?;
    let mut session = Some(ShaderSession::new(
        gpu,
        SessionOptions {
            loop_period: config.loop_period,
            perf_cycle: config.perf_cycle,
        },
    ));

    let (reload_path, initial_source) = match &config.shader {
        ShaderSource::File(path) => {
            spawn_loader(path.clone(), proxy.clone())?;
            (Some(path.clone()), None)
        }
        ShaderSource::Inline(source) => (None, Some(source.as_str())),
        ShaderSource::Bundled => (None, Some(default_fragment_shader(dialect))),
    };
    if let Some(session) = session.as_mut() {
        session.start();
        if let Some(source) = initial_source {
            session.compile_fragment_shader(source);
            report_compile(session, &window, &config.title);
        }
    }

    let mut modifiers = ModifiersState::empty();
    let run_result = event_loop.run(move |event, elwt| {
        let Some(active) = session.as_mut() else {
            elwt.exit();
            return;
        };
        match event {
            Event::UserEvent(WindowCommand::ShaderLoaded(loaded)) => {
                let source = match loaded {
                    Ok(source) => source,
                    Err(err) => {
                        error!("{err}; falling back to the default shader");
                        default_fragment_shader(dialect).to_string()
                    }
                };
                active.compile_fragment_shader(&source);
                report_compile(active, &window, &config.title);
            }
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => elwt.exit(),
                WindowEvent::ModifiersChanged(state) => modifiers = state.state(),
                WindowEvent::KeyboardInput { event, .. } => match key_action(&event, modifiers) {
                    Some(KeyAction::Recompile) => match &reload_path {
                        Some(path) => match std::fs::read_to_string(path) {
                            Ok(source) => {
                                active.compile_fragment_shader(&source);
                                report_compile(active, &window, &config.title);
                            }
                            Err(err) => error!(path = %path.display(), error = %err, "failed to reload shader"),
                        },
                        None => debug!("shader has no file to reload"),
                    },
                    Some(KeyAction::ToggleRunning) => {
                        if active.is_running() {
                            active.stop();
                            info!(time = active.time(), "stopped");
                        } else {
                            active.restart();
                            info!("restarted");
                        }
                    }
                    Some(KeyAction::Exit) => elwt.exit(),
                    None => {}
                },
                WindowEvent::Resized(new_size) => {
                    gl_surface.resize(
                        &gl_context,
                        non_zero(new_size.width),
                        non_zero(new_size.height),
                    );
                    active.resize(new_size.width, new_size.height);
                    window.request_redraw();
                }
                WindowEvent::RedrawRequested => {
                    if active.frame(Instant::now()) {
                        if let Err(err) = gl_surface.swap_buffers(&gl_context) {
                            error!(error = %err, "failed to present frame");
                        }
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                if active.is_running() {
                    window.request_redraw();
                }
                elwt.set_control_flow(ControlFlow::Wait);
            }
            Event::LoopExiting => {
                if let Some(finished) = session.take() {
                    finished.teardown();
                }
            }
            _ => {}
        }
    });

    run_result.map_err(|err| anyhow!("window event loop error: {err}"))
}
