use crate::{
    error::{CoverError, CoverResult},
    mesh::TriMesh,
    sample::Bounds,
};

/// Dense scalar field sampled on a regular grid spanning the bounds.
///
/// Row-major, row 0 at the top of the domain (`y_max`) so the grid maps
/// directly into image space.
#[derive(Clone, Debug)]
pub struct ScalarGrid {
    pub width: usize,
    pub height: usize,
    pub values: Vec<f64>,
    pub min: f64,
    pub max: f64,
}

impl ScalarGrid {
    pub fn get(&self, col: usize, row: usize) -> f64 {
        self.values[row * self.width + col]
    }

    /// Value mapped into [0, 1] against the grid's own range.
    pub fn normalized(&self, v: f64) -> f64 {
        if self.max > self.min {
            ((v - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Piecewise-linear interpolation of a triangulated field onto a
/// `resolution x resolution` grid.
///
/// Each triangle is rasterized over the grid cells inside its bounding box
/// with barycentric weights; cells the rasterization misses (numeric gaps
/// along shared edges, or cells outside a non-rectangular hull) are filled
/// from the nearest computed neighbor afterwards.
#[tracing::instrument(skip(mesh, bounds))]
pub fn interpolate_on_grid(
    mesh: &TriMesh,
    bounds: &Bounds,
    resolution: usize,
) -> CoverResult<ScalarGrid> {
    if resolution < 2 {
        return Err(CoverError::validation(
            "interpolation resolution must be at least 2",
        ));
    }
    if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
        return Err(CoverError::data("bounds have zero extent"));
    }

    let (w, h) = (resolution, resolution);
    let mut values = vec![f64::NAN; w * h];

    // Vertex positions in grid space (row 0 = y_max).
    let to_grid = |p: [f64; 2]| -> (f64, f64) {
        let gx = (p[0] - bounds.x_min) / bounds.width() * (w - 1) as f64;
        let gy = (bounds.y_max - p[1]) / bounds.height() * (h - 1) as f64;
        (gx, gy)
    };

    for &[ia, ib, ic] in &mesh.triangles {
        let (ax, ay) = to_grid(mesh.points[ia]);
        let (bx, by) = to_grid(mesh.points[ib]);
        let (cx, cy) = to_grid(mesh.points[ic]);
        let (va, vb, vc) = (mesh.values[ia], mesh.values[ib], mesh.values[ic]);

        let denom = (by - cy) * (ax - cx) + (cx - bx) * (ay - cy);
        if denom.abs() < f64::EPSILON {
            continue;
        }

        let col0 = ax.min(bx).min(cx).floor().max(0.0) as usize;
        let col1 = (ax.max(bx).max(cx).ceil() as usize).min(w - 1);
        let row0 = ay.min(by).min(cy).floor().max(0.0) as usize;
        let row1 = (ay.max(by).max(cy).ceil() as usize).min(h - 1);

        for row in row0..=row1 {
            let py = row as f64;
            for col in col0..=col1 {
                let px = col as f64;
                let w0 = ((by - cy) * (px - cx) + (cx - bx) * (py - cy)) / denom;
                let w1 = ((cy - ay) * (px - cx) + (ax - cx) * (py - cy)) / denom;
                let w2 = 1.0 - w0 - w1;
                const TOL: f64 = 1e-9;
                if w0 >= -TOL && w1 >= -TOL && w2 >= -TOL {
                    values[row * w + col] = w0 * va + w1 * vb + w2 * vc;
                }
            }
        }
    }

    fill_gaps(&mut values, w, h)?;

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in &values {
        min = min.min(v);
        max = max.max(v);
    }

    Ok(ScalarGrid {
        width: w,
        height: h,
        values,
        min,
        max,
    })
}

/// Nearest-neighbor fill of NaN cells: sweep each row left-to-right and
/// right-to-left, then each column top-to-bottom and bottom-to-top.
fn fill_gaps(values: &mut [f64], w: usize, h: usize) -> CoverResult<()> {
    for row in 0..h {
        let line = &mut values[row * w..(row + 1) * w];
        let mut last = f64::NAN;
        for v in line.iter_mut() {
            if v.is_nan() {
                *v = last;
            } else {
                last = *v;
            }
        }
        let mut last = f64::NAN;
        for v in line.iter_mut().rev() {
            if v.is_nan() {
                *v = last;
            } else {
                last = *v;
            }
        }
    }
    for col in 0..w {
        let mut last = f64::NAN;
        for row in 0..h {
            let v = &mut values[row * w + col];
            if v.is_nan() {
                *v = last;
            } else {
                last = *v;
            }
        }
        let mut last = f64::NAN;
        for row in (0..h).rev() {
            let v = &mut values[row * w + col];
            if v.is_nan() {
                *v = last;
            } else {
                last = *v;
            }
        }
    }
    if values.iter().any(|v| v.is_nan()) {
        return Err(CoverError::data(
            "interpolated grid is empty (no triangle covered any cell)",
        ));
    }
    Ok(())
}
