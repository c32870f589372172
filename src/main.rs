use std::error::Error;
use std::fmt::Display;
use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use glam::{Mat4, Vec3};
use sdl2::event::{Event, WindowEvent};
use sdl2::keyboard::Keycode;
use sdl2::video::{GLProfile, Window};
use sdl2::{EventPump, VideoSubsystem};

mod camera;
mod cli;
mod input;
mod renderer;

use camera::{ActiveController, Camera, CameraController, ControllerKind};
use input::InputState;
use renderer::gltf::bounds::{compute_scene_bounds, Bounds};
use renderer::gltf::{load_gltf_file, Document};
use renderer::{Renderer, ShaderSources};

const FIELD_OF_VIEW_DEGREES: f32 = 70.0;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = cli::parse(std::env::args().skip(1))?;

    let sdl_context = sdl2::init().map_err(SdlErr)?;
    let video_subsystem = sdl_context.video().map_err(SdlErr)?;
    let gl_attr = video_subsystem.gl_attr();
    gl_attr.set_context_profile(GLProfile::GLES);
    gl_attr.set_context_version(3, 0);
    gl_attr.set_depth_size(24);
    let mut window_builder =
        video_subsystem.window(env!("CARGO_PKG_NAME"), args.width, args.height);
    window_builder.opengl();
    if args.output.is_some() {
        window_builder.hidden();
    } else {
        window_builder.resizable();
    }
    let window = window_builder.build()?;
    let _gl_context = window.gl_create_context().map_err(SdlErr)?;
    let event_pump = sdl_context.event_pump().map_err(SdlErr)?;

    let document = match &args.gltf_file {
        Some(path) => load_gltf_file(path).unwrap_or_else(|err| {
            log::error!("Could not load {}: {err:#}", path.display());
            Document::default()
        }),
        None => {
            log::info!("No glTF file given, rendering an empty scene");
            Document::default()
        }
    };

    let mut shaders = ShaderSources::default();
    if let Some(path) = &args.vertex_shader {
        shaders.vertex = read_shader(path)?;
    }
    if let Some(path) = &args.fragment_shader {
        shaders.fragment = read_shader(path)?;
    }

    let renderer = Renderer::new(&video_subsystem, &window, document, &shaders)?;
    let mut state = State::new(video_subsystem, window, event_pump, renderer, args.lookat);

    if let Some(output) = &args.output {
        state.render();
        let (width, height, pixels) = state.renderer.read_frame();
        return renderer::snapshot::write_png(output, width, height, &pixels);
    }

    let mut last_frame = Instant::now();
    while state.handle_events() {
        state.render();
        state.window.gl_swap_window();

        let now = Instant::now();
        let elapsed_time = (now - last_frame).as_secs_f32();
        last_frame = now;
        let input = InputState::sample(&state.event_pump);
        state.controller.update(&input, elapsed_time);
    }
    Ok(())
}

fn read_shader(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read shader {}", path.display()))
}

struct State {
    video: VideoSubsystem,
    window: Window,
    event_pump: EventPump,
    renderer: Renderer,
    controller: ActiveController,
    /// Largest extent of the scene, scales the clip planes and movement speed.
    max_distance: f32,
    projection: Mat4,
}

impl State {
    pub fn new(
        video: VideoSubsystem,
        window: Window,
        event_pump: EventPump,
        renderer: Renderer,
        lookat: Option<Camera>,
    ) -> State {
        let bounds = compute_scene_bounds(renderer.document());
        let max_distance = Bounds::max_distance(bounds);
        let camera = lookat
            .or_else(|| bounds.map(|bounds| bounds.default_camera()))
            .unwrap_or_else(|| Camera::new(Vec3::ZERO, -Vec3::Z, Vec3::Y));
        log::debug!("Initial camera: {}", camera.to_lookat_arg());
        let controller =
            ActiveController::new(ControllerKind::FirstPerson, 0.5 * max_distance, camera);
        let (width, height) = window.drawable_size();
        State {
            video,
            window,
            event_pump,
            renderer,
            controller,
            max_distance,
            projection: projection(width as i32, height as i32, max_distance),
        }
    }

    /// Handles pending window events. Returns false once the viewer should
    /// quit.
    fn handle_events(&mut self) -> bool {
        let events = self.event_pump.poll_iter().collect::<Vec<_>>();
        for event in events {
            match event {
                Event::Quit { .. }
                | Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                } => return false,
                Event::Window {
                    win_event: WindowEvent::Resized(w, h),
                    ..
                } => {
                    self.renderer.resize(w, h);
                    self.projection = projection(w, h, self.max_distance);
                }
                Event::KeyDown {
                    keycode: Some(keycode),
                    repeat: false,
                    ..
                } => self.handle_key(keycode),
                _ => {}
            }
        }
        true
    }

    fn handle_key(&mut self, keycode: Keycode) {
        let channels = &mut self.renderer.channels;
        let (name, enabled) = match keycode {
            Keycode::Tab => {
                self.controller.toggle(0.5 * self.max_distance);
                log::info!("Switched to {:?} camera", self.controller.kind());
                return;
            }
            Keycode::L => {
                let lookat = self.controller.camera().to_lookat_arg();
                if let Err(err) = self.video.clipboard().set_clipboard_text(&lookat) {
                    log::warn!("Could not copy the camera to the clipboard: {err}");
                }
                log::info!("{lookat}");
                return;
            }
            Keycode::Num1 => ("base color", &mut channels.base_color),
            Keycode::Num2 => ("metallic-roughness", &mut channels.metallic_roughness),
            Keycode::Num3 => ("emissive", &mut channels.emissive),
            Keycode::Num4 => ("occlusion", &mut channels.occlusion),
            Keycode::Num5 => ("normal map", &mut channels.normal_map),
            _ => return,
        };
        *enabled = !*enabled;
        log::info!("{name} {}", if *enabled { "enabled" } else { "disabled" });
    }

    fn render(&mut self) {
        let camera = self.controller.camera();
        self.renderer.render(&camera, self.projection);
    }
}

fn projection(width: i32, height: i32, max_distance: f32) -> Mat4 {
    let aspect_ratio = width.max(1) as f32 / height.max(1) as f32;
    Mat4::perspective_rh_gl(
        FIELD_OF_VIEW_DEGREES.to_radians(),
        aspect_ratio,
        0.001 * max_distance,
        1.5 * max_distance,
    )
}

#[derive(Debug)]
pub struct SdlErr(String);
impl Display for SdlErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sdl error: {}", self.0)
    }
}
impl Error for SdlErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}
