use crate::{colormap::Colormap, error::CoverResult, field::ScalarGrid};

/// Axis along which the reveal opacity falls off.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradientAxis {
    Horizontal,
    Vertical,
}

/// Directional opacity mask for the smooth layer: a logistic (Fermi-Dirac
/// style) falloff that leaves the layer opaque on one side and lets the
/// coarse mesh show through on the other.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct RevealGradient {
    pub axis: GradientAxis,
    /// Transition sharpness. 20 gives a band roughly 1/10 of the axis.
    pub spread: f64,
    /// Midpoint of the transition in [0, 1] along the axis.
    pub mid: f64,
}

impl Default for RevealGradient {
    fn default() -> Self {
        Self {
            axis: GradientAxis::Vertical,
            spread: 20.0,
            mid: 0.5,
        }
    }
}

/// The reveal falloff: `x` runs linearly from 1 to 0 over `n` steps and the
/// opacity is `1 / (exp((x - mid) * spread) + 1)`.
///
/// Index 0 comes out near 0 (fully revealed mesh), index `n - 1` near 1
/// (fully opaque smooth field).
pub fn opacity_profile(n: usize, spread: f64, mid: f64) -> Vec<f32> {
    (0..n)
        .map(|i| {
            let x = if n > 1 {
                1.0 - i as f64 / (n - 1) as f64
            } else {
                1.0
            };
            (1.0 / (((x - mid) * spread).exp() + 1.0)) as f32
        })
        .collect()
}

impl RevealGradient {
    /// Colorize a grid and write the directional profile into the alpha
    /// channel, returning premultiplied RGBA8 ready for compositing.
    pub fn apply(&self, grid: &ScalarGrid, cmap: &Colormap) -> CoverResult<Vec<u8>> {
        if grid.values.len() != grid.width * grid.height {
            return Err(crate::error::CoverError::render(
                "grid value buffer does not match its dimensions",
            ));
        }
        let profile_len = match self.axis {
            GradientAxis::Vertical => grid.height,
            GradientAxis::Horizontal => grid.width,
        };
        let profile = opacity_profile(profile_len, self.spread, self.mid);

        let mut out = Vec::with_capacity(grid.width * grid.height * 4);
        for row in 0..grid.height {
            for col in 0..grid.width {
                let alpha = match self.axis {
                    GradientAxis::Vertical => profile[row],
                    GradientAxis::Horizontal => profile[col],
                };
                let t = grid.normalized(grid.get(col, row));
                let rgba = cmap.sample(t);
                let a = (f64::from(alpha) * 255.0).round().clamp(0.0, 255.0) as u8;
                let premul = |c: u8| -> u8 {
                    ((u16::from(c) * (u16::from(a) + 1)) >> 8) as u8
                };
                out.push(premul(rgba[0]));
                out.push(premul(rgba[1]));
                out.push(premul(rgba[2]));
                out.push(a);
            }
        }
        Ok(out)
    }
}
