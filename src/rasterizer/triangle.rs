//! Triangle rasterization with barycentric coverage and depth testing

use super::framebuffer::{DepthBuffer, PixelSurface};
use super::math::{cross, Vec2, Vec3};
use super::types::{Color, Texture};

/// How covered pixels get their color
#[derive(Debug, Clone, Copy)]
pub enum Fill<'a> {
    /// One flat color, written as is
    Solid(Color),
    /// Nearest texel at the interpolated uv, RGB scaled by `intensity`.
    /// `uvs` are in texture space ((0, 0) = top-left texel).
    Textured {
        texture: &'a Texture,
        uvs: [Vec2; 3],
        intensity: f32,
    },
}

/// Barycentric coordinates of `p` in triangle (v0, v1, v2).
///
/// Only x and y of the vertices are used. For a degenerate triangle the
/// sentinel (-1, 1, 1) is returned, which fails the inside test.
pub fn barycentric(v0: Vec3, v1: Vec3, v2: Vec3, p: Vec2) -> Vec3 {
    let [x0, y0, _] = v0;
    let [x1, y1, _] = v1;
    let [x2, y2, _] = v2;
    let [x, y] = p;

    // Solution of [u, v, 1] in homogeneous form
    let hc = cross([x1 - x0, x2 - x0, x0 - x], [y1 - y0, y2 - y0, y0 - y]);

    if hc[2] == 0.0 {
        return [-1.0, 1.0, 1.0];
    }

    let u = hc[0] / hc[2];
    let v = hc[1] / hc[2];
    [1.0 - u - v, u, v]
}

/// Inclusive test: points on an edge count as inside
pub fn is_inside(bc: Vec3) -> bool {
    bc[0] >= 0.0 && bc[1] >= 0.0 && bc[2] >= 0.0
}

/// Rasterize one screen-space triangle (x, y, depth per vertex).
///
/// Pixels pass when all barycentric weights are >= 0 and the interpolated
/// depth is strictly greater than the stored one. Both sides of a shared
/// edge pass the coverage test, so neighbouring triangles may both write
/// their common edge. Returns the number of pixels written.
pub fn draw_triangle(
    surface: &mut PixelSurface,
    depth: &mut DepthBuffer,
    vertices: [Vec3; 3],
    fill: Fill<'_>,
) -> usize {
    let [v0, v1, v2] = vertices;

    // Bounding box, truncated and clipped to the surface
    let min_x = (v0[0].min(v1[0]).min(v2[0]) as i32).max(0);
    let max_x = (v0[0].max(v1[0]).max(v2[0]) as i32).min(surface.width() as i32 - 1);
    let min_y = (v0[1].min(v1[1]).min(v2[1]) as i32).max(0);
    let max_y = (v0[1].max(v1[1]).max(v2[1]) as i32).min(surface.height() as i32 - 1);

    let mut written = 0;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let bc = barycentric(v0, v1, v2, [x as f32, y as f32]);
            if !is_inside(bc) {
                continue;
            }

            let z = bc[0] * v0[2] + bc[1] * v1[2] + bc[2] * v2[2];
            if !depth.test_and_set(x as usize, y as usize, z) {
                continue;
            }

            let color = match fill {
                Fill::Solid(color) => color,
                Fill::Textured { texture, uvs, intensity } => {
                    let u = bc[0] * uvs[0][0] + bc[1] * uvs[1][0] + bc[2] * uvs[2][0];
                    let v = bc[0] * uvs[0][1] + bc[1] * uvs[1][1] + bc[2] * uvs[2][1];
                    texture.sample(u, v).shade(intensity)
                }
            };
            surface.set_pixel(x, y, color);
            written += 1;
        }
    }

    if written == 0 {
        log::trace!("triangle {:?} covered no pixels", vertices);
    }
    written
}
