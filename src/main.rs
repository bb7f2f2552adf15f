//! tinyrender viewer
//!
//! Renders a mesh in software from a RON config and shows the result in a
//! window. R reloads the config, Escape quits.
//!
//! Usage: tinyrender [CONFIG.ron] [--output OUT.png] [--scale N]

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use macroquad::prelude::*;
use tinyrender::codec::TgaImage;
use tinyrender::config::{load_config, RenderConfig, RenderMode};
use tinyrender::{mesh, rasterizer, VERSION};

#[derive(Debug, Clone, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    scale: f32,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            config: None,
            output: None,
            scale: 1.0,
        }
    }
}

impl Args {
    fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self> {
        let mut parsed = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--output" | "-o" => {
                    let path = args.next().context("--output needs a path")?;
                    parsed.output = Some(PathBuf::from(path));
                }
                "--scale" | "-s" => {
                    let value = args.next().context("--scale needs a number")?;
                    let scale: f32 = value.parse().with_context(|| format!("bad scale '{}'", value))?;
                    if !(scale.is_finite() && scale > 0.0) {
                        bail!("scale must be positive, got {}", scale);
                    }
                    parsed.scale = scale;
                }
                flag if flag.starts_with('-') => bail!("unknown option '{}'", flag),
                _ if parsed.config.is_none() => parsed.config = Some(PathBuf::from(&arg)),
                _ => bail!("unexpected argument '{}'", arg),
            }
        }
        Ok(parsed)
    }

    fn load_config(&self) -> Result<RenderConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path).with_context(|| format!("loading config {}", path.display()))?,
            None => RenderConfig::default(),
        };
        if self.output.is_some() {
            config.output = self.output.clone();
        }
        Ok(config)
    }
}

fn window_conf() -> Conf {
    // Errors surface again in main, after logging is up
    let args = Args::parse(std::env::args().skip(1)).unwrap_or_default();
    let config = args.load_config().unwrap_or_default();
    Conf {
        window_title: format!("tinyrender v{}", VERSION),
        window_width: (config.width as f32 * args.scale) as i32,
        window_height: (config.height as f32 * args.scale) as i32,
        window_resizable: true,
        ..Default::default()
    }
}

fn load_mesh(path: Option<&Path>) -> Result<mesh::Mesh> {
    let Some(path) = path else {
        return Ok(mesh::Mesh::cube());
    };
    let contents = fs::read_to_string(path).with_context(|| format!("reading mesh {}", path.display()))?;
    let mesh: mesh::Mesh = ron::from_str(&contents).with_context(|| format!("parsing mesh {}", path.display()))?;
    log::info!("Loaded mesh {}: {} faces", path.display(), mesh.face_count());
    Ok(mesh)
}

fn load_texture(path: Option<&Path>) -> Result<rasterizer::Texture> {
    let Some(path) = path else {
        return Ok(rasterizer::Texture::checkerboard(
            64,
            64,
            rasterizer::Color::WHITE,
            rasterizer::Color::new(96, 96, 96),
        ));
    };
    let bytes = fs::read(path).with_context(|| format!("reading texture {}", path.display()))?;
    let image = TgaImage::decode(&bytes).with_context(|| format!("decoding texture {}", path.display()))?;
    let name = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    Ok(image.to_texture(name))
}

/// Render one frame as described by `config`
fn render_frame(config: &RenderConfig) -> Result<rasterizer::Renderer> {
    let scene = config.scene().context("building scene")?;
    let mesh = load_mesh(config.mesh.as_deref())?;

    let mut renderer = rasterizer::Renderer::new(config.width, config.height)?;
    renderer.clear(config.background);

    match config.mode {
        RenderMode::Wireframe => renderer.render_wireframe(&mesh, &scene, config.wire_color)?,
        RenderMode::Flat => {
            renderer.render_mesh(&mesh, &scene, rasterizer::MeshFill::Shaded(config.color))?;
        }
        RenderMode::Textured => {
            let texture = load_texture(config.texture.as_deref())?;
            renderer.render_mesh(&mesh, &scene, rasterizer::MeshFill::Textured(&texture))?;
        }
    }

    if let Some(output) = &config.output {
        renderer
            .snapshot()
            .save_png(output)
            .with_context(|| format!("writing {}", output.display()))?;
        log::info!("Saved {}", output.display());
    }

    Ok(renderer)
}

fn upload(renderer: &rasterizer::Renderer) -> Result<Texture2D> {
    let snapshot = renderer.snapshot();
    let width = u16::try_from(snapshot.width).context("frame too wide for a texture")?;
    let height = u16::try_from(snapshot.height).context("frame too tall for a texture")?;
    let texture = Texture2D::from_rgba8(width, height, snapshot.pixels);
    texture.set_filter(FilterMode::Nearest);
    Ok(texture)
}

async fn run() -> Result<()> {
    let args = Args::parse(std::env::args().skip(1))?;
    let config = args.load_config()?;
    let mut frame = upload(&render_frame(&config)?)?;

    loop {
        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        if is_key_pressed(KeyCode::R) {
            match args.load_config().and_then(|config| upload(&render_frame(&config)?)) {
                Ok(texture) => {
                    frame = texture;
                    log::info!("Reloaded");
                }
                Err(e) => log::error!("Reload failed: {:#}", e),
            }
        }

        clear_background(BLACK);

        // Fit the frame into the window, keeping its aspect ratio
        let fit = (screen_width() / frame.width()).min(screen_height() / frame.height());
        let (draw_w, draw_h) = (frame.width() * fit, frame.height() * fit);
        draw_texture_ex(
            &frame,
            (screen_width() - draw_w) / 2.0,
            (screen_height() - draw_h) / 2.0,
            WHITE,
            DrawTextureParams {
                dest_size: Some(macroquad::math::Vec2::new(draw_w, draw_h)),
                ..Default::default()
            },
        );

        next_frame().await
    }

    Ok(())
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();

    if let Err(e) = run().await {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}
