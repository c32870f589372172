use anyhow::Context;
use glam::Mat4;
use sdl2::video::Window;
use sdl2::VideoSubsystem;

use crate::camera::Camera;
use crate::SdlErr;

pub mod device;
mod gl;
mod gl_device;
pub mod gltf;
pub mod snapshot;
#[cfg(test)]
pub mod testing;

use gl_device::GlDevice;
use gltf::material::MaterialChannels;
use gltf::resources::GpuResources;
use gltf::traversal::{draw_scene, Frame};
use gltf::Document;

pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

impl Default for ShaderSources {
    fn default() -> ShaderSources {
        ShaderSources {
            vertex: gltf::program::DEFAULT_VERTEX_SHADER.to_string(),
            fragment: gltf::program::DEFAULT_FRAGMENT_SHADER.to_string(),
        }
    }
}

/// Draws one glTF document into the window's GL context.
pub struct Renderer {
    device: GlDevice,
    document: Document,
    resources: Option<GpuResources>,
    width: u32,
    height: u32,
    pub channels: MaterialChannels,
}

impl Renderer {
    pub fn new(
        video: &VideoSubsystem,
        window: &Window,
        document: Document,
        shaders: &ShaderSources,
    ) -> anyhow::Result<Renderer> {
        gl::load_with(|s| video.gl_get_proc_address(s) as *const core::ffi::c_void);
        if let Err(err) = video.gl_set_swap_interval(1).map_err(SdlErr) {
            log::warn!("Could not enable vsync: {err}");
        }
        let program = gltf::program::create_program(&shaders.vertex, &shaders.fragment)
            .context("failed to create the glTF shader program")?;
        let mut device = GlDevice::new(program);
        let (width, height) = window.drawable_size();
        device.viewport(width as i32, height as i32);

        let resources = GpuResources::new(&mut device, &document);
        Ok(Renderer {
            device,
            document,
            resources: Some(resources),
            width,
            height,
            channels: MaterialChannels::default(),
        })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn resize(&mut self, width: i32, height: i32) {
        self.width = width.max(0) as u32;
        self.height = height.max(0) as u32;
        self.device.viewport(width, height);
    }

    pub fn render(&mut self, camera: &Camera, projection: Mat4) {
        self.device.begin_frame();
        let Some(resources) = &self.resources else {
            return;
        };
        let frame = Frame {
            document: &self.document,
            resources,
            channels: &self.channels,
            view: camera.view_matrix(),
            projection,
        };
        draw_scene(&mut self.device, &frame);
    }

    /// Reads back the last rendered frame as RGB8, top row first.
    pub fn read_frame(&mut self) -> (u32, u32, Vec<u8>) {
        let mut pixels = self.device.read_pixels_rgb(self.width, self.height);
        snapshot::flip_rows(&mut pixels, self.width as usize * 3);
        (self.width, self.height, pixels)
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        if let Some(resources) = self.resources.take() {
            resources.release(&mut self.device);
        }
    }
}
