//! Bresenham line drawing

use super::framebuffer::PixelSurface;
use super::types::Color;

/// Draw a line from (x0, y0) to (x1, y1) using Bresenham's algorithm.
///
/// Walks one pixel per step along the dominant axis, both endpoints
/// included. A zero-length segment plots a single pixel. The walk is
/// clipped to the surface: steps before the surface are skipped in one
/// jump and the walk stops once it has left, so the cost depends on the
/// surface size, not the segment length.
pub fn draw_line(surface: &mut PixelSurface, x0: i32, y0: i32, x1: i32, y1: i32, color: Color) {
    // i64 so deltas between any two i32 coordinates fit
    let (mut x0, mut y0, mut x1, mut y1) = (x0 as i64, y0 as i64, x1 as i64, y1 as i64);

    // Walk along y instead when the line is steep
    let steep = (y1 - y0).abs() > (x1 - x0).abs();
    if steep {
        std::mem::swap(&mut x0, &mut y0);
        std::mem::swap(&mut x1, &mut y1);
    }

    if x0 > x1 {
        std::mem::swap(&mut x0, &mut x1);
        std::mem::swap(&mut y0, &mut y1);
    }

    let (major_len, minor_len) = if steep {
        (surface.height() as i64, surface.width() as i64)
    } else {
        (surface.width() as i64, surface.height() as i64)
    };

    let first = x0.max(0);
    let last = x1.min(major_len - 1);
    if first > last {
        return;
    }

    let dx = x1 - x0;
    let dy = y1 - y0;
    let y_step = if dy > 0 { 1 } else { -1 };
    // Slope scaled by 2 * dx so the walk stays in integers
    let slope = dy.abs() * 2;

    // State after the skipped steps. Each step adds `slope` to the error
    // and a minor step takes 2 * dx off, leaving the error in (-dx, dx].
    let skipped = (first - x0) as i128;
    let total = skipped * slope as i128;
    let minor_steps = if dx == 0 || total <= dx as i128 {
        0
    } else {
        let twice_dx = 2 * dx as i128;
        (total - dx as i128 + twice_dx - 1) / twice_dx
    };
    let mut err = (total - minor_steps * 2 * dx as i128) as i64;
    let mut y = y0 + y_step * minor_steps as i64;

    for x in first..=last {
        if (0..minor_len).contains(&y) {
            if steep {
                surface.set_pixel(y as i32, x as i32, color);
            } else {
                surface.set_pixel(x as i32, y as i32, color);
            }
        } else if (y_step > 0 && y >= minor_len) || (y_step < 0 && y < 0) {
            // Past the surface edge and moving away from it
            break;
        }

        err += slope;
        if err > dx {
            y += y_step;
            err -= dx * 2;
        }
    }
}
