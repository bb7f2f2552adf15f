//! Renderer: owns the render target and drives meshes through the pipeline

use thiserror::Error;

use super::framebuffer::{DepthBuffer, PixelSurface, Snapshot, SurfaceError};
use super::line::draw_line;
use super::math::{cross, dot, normalize, subtract, transform_point, Matrix, MathError, Vec3};
use super::triangle::{draw_triangle, Fill};
use super::types::{Color, Texture};
use crate::mesh::Mesh;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error(transparent)]
    Math(#[from] MathError),
}

/// Per-pass parameters, passed explicitly instead of living in globals
#[derive(Debug, Clone)]
pub struct Scene {
    /// World space to screen space (x, y in pixels, z = depth)
    pub transform: Matrix,
    /// Direction the light travels in, normalized
    pub light_dir: Vec3,
}

/// Surface treatment for a whole mesh
#[derive(Debug, Clone, Copy)]
pub enum MeshFill<'a> {
    /// Flat color shaded by the face intensity
    Shaded(Color),
    /// Mesh texture coordinates into `texture`, shaded by the face intensity
    Textured(&'a Texture),
}

/// Software renderer: a pixel surface plus its depth buffer
pub struct Renderer {
    surface: PixelSurface,
    depth: DepthBuffer,
}

impl Renderer {
    /// Opaque black surface with depth at -infinity
    pub fn new(width: usize, height: usize) -> Result<Self, SurfaceError> {
        Ok(Self {
            surface: PixelSurface::new(width, height)?,
            depth: DepthBuffer::new(width, height)?,
        })
    }

    pub fn width(&self) -> usize {
        self.surface.width()
    }

    pub fn height(&self) -> usize {
        self.surface.height()
    }

    pub fn surface(&self) -> &PixelSurface {
        &self.surface
    }

    pub fn depth(&self) -> &DepthBuffer {
        &self.depth
    }

    /// Fill the surface and start a new depth pass
    pub fn clear(&mut self, color: Color) {
        self.surface.clear(color);
        self.depth.clear();
    }

    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Color) {
        draw_line(&mut self.surface, x0, y0, x1, y1, color);
    }

    /// Depth-tested triangle in screen space. Returns pixels written.
    pub fn draw_triangle(&mut self, vertices: [Vec3; 3], fill: Fill<'_>) -> usize {
        draw_triangle(&mut self.surface, &mut self.depth, vertices, fill)
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        self.surface.snapshot()
    }

    /// Rasterize every face of `mesh` facing the light.
    ///
    /// Faces whose intensity is not positive are skipped, so fills never see
    /// a negative intensity. Returns the number of faces drawn.
    pub fn render_mesh(&mut self, mesh: &Mesh, scene: &Scene, fill: MeshFill<'_>) -> Result<usize, RenderError> {
        let mut drawn = 0;
        let mut culled = 0;

        for face in mesh.faces() {
            let world = face.map(|i| mesh.vertex(i));
            let screen = [
                transform_point(&scene.transform, world[0])?,
                transform_point(&scene.transform, world[1])?,
                transform_point(&scene.transform, world[2])?,
            ];

            let n = normalize(cross(subtract(world[2], world[0]), subtract(world[1], world[0])));
            let intensity = dot(n, scene.light_dir);
            // NaN comes from zero-area faces
            if intensity.is_nan() || intensity <= 0.0 {
                culled += 1;
                continue;
            }

            let face_fill = match fill {
                MeshFill::Shaded(color) => Fill::Solid(color.shade(intensity)),
                MeshFill::Textured(texture) => {
                    // Mesh v points up, texture rows go down
                    let uvs = face.map(|i| {
                        let [u, v] = mesh.texcoord(i).unwrap_or([0.0, 0.0]);
                        [u, 1.0 - v]
                    });
                    Fill::Textured { texture, uvs, intensity }
                }
            };
            self.draw_triangle(screen, face_fill);
            drawn += 1;
        }

        log::debug!("render_mesh: {} faces drawn, {} culled", drawn, culled);
        Ok(drawn)
    }

    /// Draw the edges of every face, ignoring depth.
    ///
    /// Edges with a non-finite endpoint (a point on the camera plane) are
    /// skipped.
    pub fn render_wireframe(&mut self, mesh: &Mesh, scene: &Scene, color: Color) -> Result<(), RenderError> {
        for face in mesh.faces() {
            for j in 0..3 {
                let a = transform_point(&scene.transform, mesh.vertex(face[j]))?;
                let b = transform_point(&scene.transform, mesh.vertex(face[(j + 1) % 3]))?;
                if !(a[0].is_finite() && a[1].is_finite() && b[0].is_finite() && b[1].is_finite()) {
                    log::trace!("render_wireframe: skipping edge {:?} -> {:?}", a, b);
                    continue;
                }
                self.draw_line(a[0] as i32, a[1] as i32, b[0] as i32, b[1] as i32, color);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Orthographic scene mapping [-1, 1] onto a `size` square, y down
    fn ortho_scene(size: f32) -> Scene {
        Scene {
            transform: Matrix::viewport(0.0, size, size, -size, 255.0),
            light_dir: [0.0, 0.0, -1.0],
        }
    }

    fn quad() -> Mesh {
        Mesh::new(
            vec![-1.0, -1.0, 0.0, 1.0, -1.0, 0.0, 1.0, 1.0, 0.0, -1.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0],
            vec![0, 1, 2, 0, 2, 3],
        )
        .unwrap()
    }

    #[test]
    fn test_new_renderer() {
        let r = Renderer::new(4, 3).unwrap();
        assert_eq!((r.width(), r.height()), (4, 3));
        assert_eq!(r.depth().get(3, 2), Some(f32::NEG_INFINITY));
        assert!(Renderer::new(0, 3).is_err());
    }

    #[test]
    fn test_clear_resets_depth() {
        let mut r = Renderer::new(4, 4).unwrap();
        r.draw_triangle([[0.0, 0.0, 1.0], [3.0, 0.0, 1.0], [0.0, 3.0, 1.0]], Fill::Solid(Color::RED));
        assert_eq!(r.depth().get(0, 0), Some(1.0));
        r.clear(Color::WHITE);
        assert_eq!(r.depth().get(0, 0), Some(f32::NEG_INFINITY));
        assert_eq!(r.surface().get_pixel(0, 0), Some(Color::WHITE));
    }

    #[test]
    fn test_render_mesh_facing_light() {
        let mut r = Renderer::new(16, 16).unwrap();
        let drawn = r.render_mesh(&quad(), &ortho_scene(16.0), MeshFill::Shaded(Color::WHITE)).unwrap();
        assert_eq!(drawn, 2);
        assert_eq!(r.surface().get_pixel(8, 8), Some(Color::WHITE));
    }

    #[test]
    fn test_render_mesh_culls_back_faces() {
        let mut r = Renderer::new(16, 16).unwrap();
        let mut scene = ortho_scene(16.0);
        scene.light_dir = [0.0, 0.0, 1.0];
        let drawn = r.render_mesh(&quad(), &scene, MeshFill::Shaded(Color::WHITE)).unwrap();
        assert_eq!(drawn, 0);
        assert_eq!(r.surface().get_pixel(8, 8), Some(Color::BLACK));
    }

    #[test]
    fn test_render_mesh_textured_flips_v() {
        let mut tex = Texture::new(2, 2);
        tex.pixels = vec![Color::RED, Color::RED, Color::BLUE, Color::BLUE];
        let mut r = Renderer::new(16, 16).unwrap();
        r.render_mesh(&quad(), &ortho_scene(16.0), MeshFill::Textured(&tex)).unwrap();
        // World y = +1 is the top of the screen and v = 1 the top texel row
        assert_eq!(r.surface().get_pixel(8, 3), Some(Color::RED));
        assert_eq!(r.surface().get_pixel(8, 12), Some(Color::BLUE));
    }

    #[test]
    fn test_render_mesh_textured_right_edge() {
        // u = 1.0 on the right edge must stay on the last texel column
        let mut tex = Texture::new(2, 1);
        tex.pixels = vec![Color::RED, Color::BLUE];
        let mut r = Renderer::new(17, 17).unwrap();
        r.render_mesh(&quad(), &ortho_scene(16.0), MeshFill::Textured(&tex)).unwrap();
        assert_eq!(r.surface().get_pixel(16, 8), Some(Color::BLUE));
        assert_eq!(r.surface().get_pixel(0, 8), Some(Color::RED));
    }

    #[test]
    fn test_render_mesh_length_mismatch() {
        let mut r = Renderer::new(8, 8).unwrap();
        let scene = Scene {
            transform: Matrix::identity(2),
            light_dir: [0.0, 0.0, -1.0],
        };
        let err = r.render_mesh(&quad(), &scene, MeshFill::Shaded(Color::WHITE)).unwrap_err();
        assert_eq!(err, RenderError::Math(MathError::LengthMismatch { expected: 2, actual: 3 }));
    }

    #[test]
    fn test_render_wireframe_skips_non_finite_edges() {
        let mut r = Renderer::new(8, 8).unwrap();
        let mut transform = Matrix::identity(4);
        for c in 0..4 {
            transform.set(3, c, 0.0);
        }
        let scene = Scene {
            transform,
            light_dir: [0.0, 0.0, -1.0],
        };
        r.render_wireframe(&quad(), &scene, Color::GREEN).unwrap();
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(r.surface().get_pixel(x, y), Some(Color::BLACK));
            }
        }
    }

    #[test]
    fn test_render_wireframe_far_edge() {
        // A huge but finite projection still draws the visible part
        let mut r = Renderer::new(8, 8).unwrap();
        let scene = Scene {
            transform: Matrix::from_rows([
                [1.0e9, 0.0, 0.0, 0.0],
                [0.0, 0.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ]),
            light_dir: [0.0, 0.0, -1.0],
        };
        r.render_wireframe(&quad(), &scene, Color::GREEN).unwrap();
        assert_eq!(r.surface().get_pixel(0, 0), Some(Color::GREEN));
        assert_eq!(r.surface().get_pixel(7, 0), Some(Color::GREEN));
        assert_eq!(r.surface().get_pixel(0, 1), Some(Color::BLACK));
    }

    #[test]
    fn test_render_wireframe_outlines() {
        let mut r = Renderer::new(17, 17).unwrap();
        r.render_wireframe(&quad(), &ortho_scene(16.0), Color::GREEN).unwrap();
        assert_eq!(r.surface().get_pixel(0, 16), Some(Color::GREEN));
        assert_eq!(r.surface().get_pixel(8, 8), Some(Color::GREEN));
        assert_eq!(r.surface().get_pixel(16, 0), Some(Color::GREEN));
        assert_eq!(r.surface().get_pixel(4, 10), Some(Color::BLACK));
    }
}
