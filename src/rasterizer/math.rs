//! Vector and matrix math for the transform pipeline
//!
//! Vectors are plain fixed-size arrays; every operation returns a new value.
//! Matrices are rectangular so the same `transform` call handles both plain
//! multiplies and homogeneous points with a perspective divide.

use thiserror::Error;

/// 2D vector (texture coordinates, screen points)
pub type Vec2 = [f32; 2];

/// 3D vector (positions, normals, screen-space x/y/depth)
pub type Vec3 = [f32; 3];

/// Error type for matrix/vector operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MathError {
    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

pub fn add<const N: usize>(v: [f32; N], w: [f32; N]) -> [f32; N] {
    std::array::from_fn(|i| v[i] + w[i])
}

pub fn subtract<const N: usize>(v: [f32; N], w: [f32; N]) -> [f32; N] {
    std::array::from_fn(|i| v[i] - w[i])
}

pub fn scale<const N: usize>(v: [f32; N], n: f32) -> [f32; N] {
    v.map(|x| x * n)
}

pub fn dot<const N: usize>(v: [f32; N], w: [f32; N]) -> f32 {
    v.iter().zip(w.iter()).map(|(a, b)| a * b).sum()
}

pub fn length<const N: usize>(v: [f32; N]) -> f32 {
    dot(v, v).sqrt()
}

/// Scale `v` to unit length.
///
/// A zero vector is not special-cased: the result is NaN in every component.
pub fn normalize<const N: usize>(v: [f32; N]) -> [f32; N] {
    scale(v, 1.0 / length(v))
}

pub fn cross(v: Vec3, w: Vec3) -> Vec3 {
    [
        v[1] * w[2] - v[2] * w[1],
        v[2] * w[0] - v[0] * w[2],
        v[0] * w[1] - v[1] * w[0],
    ]
}

/// Rectangular row-major matrix
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl Matrix {
    /// Build a matrix from nested rows. Every row must have the same,
    /// non-zero length.
    pub fn new(rows: Vec<Vec<f32>>) -> Result<Self, MathError> {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        if cols == 0 {
            return Err(MathError::LengthMismatch { expected: 1, actual: 0 });
        }
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in &rows {
            if row.len() != cols {
                return Err(MathError::LengthMismatch {
                    expected: cols,
                    actual: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    pub fn from_rows<const R: usize, const C: usize>(rows: [[f32; C]; R]) -> Self {
        Self {
            rows: R,
            cols: C,
            data: rows.iter().flatten().copied().collect(),
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut data = vec![0.0; n * n];
        for i in 0..n {
            data[i * n + i] = 1.0;
        }
        Self { rows: n, cols: n, data }
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.cols
    }

    /// Number of rows
    pub fn height(&self) -> usize {
        self.rows
    }

    pub fn row(&self, r: usize) -> &[f32] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    pub fn get(&self, r: usize, c: usize) -> f32 {
        self.data[r * self.cols + c]
    }

    pub fn set(&mut self, r: usize, c: usize, value: f32) {
        self.data[r * self.cols + c] = value;
    }

    /// Matrix product `self * other`
    pub fn mul(&self, other: &Matrix) -> Result<Matrix, MathError> {
        if self.cols != other.rows {
            return Err(MathError::LengthMismatch {
                expected: self.cols,
                actual: other.rows,
            });
        }
        let mut data = vec![0.0; self.rows * other.cols];
        for i in 0..self.rows {
            for j in 0..other.cols {
                data[i * other.cols + j] =
                    (0..self.cols).map(|k| self.get(i, k) * other.get(k, j)).sum();
            }
        }
        Ok(Matrix {
            rows: self.rows,
            cols: other.cols,
            data,
        })
    }

    /// Map the [-1, 1] cube onto the screen rectangle at (x, y) of size
    /// w*h, with depth mapped onto [0, depth].
    pub fn viewport(x: f32, y: f32, w: f32, h: f32, depth: f32) -> Self {
        Self::from_rows([
            [w / 2.0, 0.0, 0.0, x + w / 2.0],
            [0.0, h / 2.0, 0.0, y + h / 2.0],
            [0.0, 0.0, depth / 2.0, depth / 2.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Central projection with the camera `camera_distance` units from the
    /// origin along +z.
    pub fn projection(camera_distance: f32) -> Self {
        let mut m = Self::identity(4);
        m.set(3, 2, -1.0 / camera_distance);
        m
    }

    /// Camera basis change so `eye` looks at `center` with `up` pointing up
    pub fn look_at(eye: Vec3, center: Vec3, up: Vec3) -> Self {
        let z = normalize(subtract(eye, center));
        let x = normalize(cross(up, z));
        let y = normalize(cross(z, x));
        Self::from_rows([
            [x[0], x[1], x[2], -center[0] * x[0] - center[1] * x[1] - center[2] * x[2]],
            [y[0], y[1], y[2], -center[0] * y[0] - center[1] * y[1] - center[2] * y[2]],
            [z[0], z[1], z[2], -center[0] * z[0] - center[1] * z[1] - center[2] * z[2]],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }
}

/// Plain matrix-vector product. `v` must be exactly as long as the matrix
/// is wide.
pub fn multiply(m: &Matrix, v: &[f32]) -> Result<Vec<f32>, MathError> {
    if v.len() != m.width() {
        return Err(MathError::LengthMismatch {
            expected: m.width(),
            actual: v.len(),
        });
    }
    Ok((0..m.height())
        .map(|r| m.row(r).iter().zip(v).map(|(a, b)| a * b).sum())
        .collect())
}

/// Transform `v` by `m`.
///
/// When `v` is one shorter than the matrix width it is treated as a point:
/// a 1 is appended, the product is divided by its last component and cut
/// back to `v.len()`. A zero homogeneous component yields non-finite
/// values, which are returned as is. Any other length goes through
/// [`multiply`].
pub fn transform(m: &Matrix, v: &[f32]) -> Result<Vec<f32>, MathError> {
    if v.len() + 1 == m.width() {
        let mut homogeneous = Vec::with_capacity(m.width());
        homogeneous.extend_from_slice(v);
        homogeneous.push(1.0);
        let w = multiply(m, &homogeneous)?;
        let last = w.last().copied().unwrap_or(0.0);
        Ok(w.iter().take(v.len()).map(|x| x * (1.0 / last)).collect())
    } else {
        multiply(m, v)
    }
}

/// [`transform`] specialised to 3D points
pub fn transform_point(m: &Matrix, v: Vec3) -> Result<Vec3, MathError> {
    let out = transform(m, &v)?;
    if out.len() != 3 {
        return Err(MathError::LengthMismatch {
            expected: 3,
            actual: out.len(),
        });
    }
    Ok([out[0], out[1], out[2]])
}
