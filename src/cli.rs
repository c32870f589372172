use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use glam::Vec3;

use crate::camera::Camera;

pub const USAGE: &str = "usage: gltf-viewer [gltf-file] [--width N] [--height N] \
[--lookat ex,ey,ez,cx,cy,cz,ux,uy,uz] [--vertex-shader PATH] [--fragment-shader PATH] \
[--output PATH]";

#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    pub gltf_file: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
    pub lookat: Option<Camera>,
    pub vertex_shader: Option<PathBuf>,
    pub fragment_shader: Option<PathBuf>,
    /// Render one frame into this PNG file and exit instead of opening an
    /// interactive window.
    pub output: Option<PathBuf>,
}

impl Default for Args {
    fn default() -> Args {
        Args {
            gltf_file: None,
            width: 1280,
            height: 720,
            lookat: None,
            vertex_shader: None,
            fragment_shader: None,
            output: None,
        }
    }
}

/// Parses the arguments following the program name.
pub fn parse(args: impl IntoIterator<Item = String>) -> anyhow::Result<Args> {
    let mut parsed = Args::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        let mut value = |flag: &str| {
            args.next()
                .ok_or_else(|| anyhow!("{flag} needs a value\n{USAGE}"))
        };
        match arg.as_str() {
            "--width" => parsed.width = parse_dimension(&value("--width")?)?,
            "--height" => parsed.height = parse_dimension(&value("--height")?)?,
            "--lookat" => parsed.lookat = Some(parse_lookat(&value("--lookat")?)?),
            "--vertex-shader" => parsed.vertex_shader = Some(value("--vertex-shader")?.into()),
            "--fragment-shader" => {
                parsed.fragment_shader = Some(value("--fragment-shader")?.into())
            }
            "--output" => parsed.output = Some(value("--output")?.into()),
            flag if flag.starts_with("--") => bail!("unknown option {flag}\n{USAGE}"),
            _ if parsed.gltf_file.is_none() => parsed.gltf_file = Some(PathBuf::from(&arg)),
            _ => bail!("unexpected argument {arg}\n{USAGE}"),
        }
    }
    Ok(parsed)
}

fn parse_dimension(value: &str) -> anyhow::Result<u32> {
    match value.parse::<u32>() {
        Ok(dimension) if dimension > 0 => Ok(dimension),
        _ => bail!("\"{value}\" is not a positive integer\n{USAGE}"),
    }
}

fn parse_lookat(value: &str) -> anyhow::Result<Camera> {
    let numbers = value
        .split(',')
        .map(|number| number.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("--lookat \"{value}\" contains a non-number\n{USAGE}"))?;
    if numbers.len() != 9 {
        bail!("--lookat takes 9 numbers, got {}\n{USAGE}", numbers.len());
    }
    Ok(Camera::new(
        Vec3::from_slice(&numbers[0..3]),
        Vec3::from_slice(&numbers[3..6]),
        Vec3::from_slice(&numbers[6..9]),
    ))
}
