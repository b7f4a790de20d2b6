use crate::error::{CoverError, CoverResult};

/// Inferno control points at 0.0, 0.1, .. 1.0, linearly interpolated in
/// between. Good enough for print work without hauling in a 256-entry table.
const INFERNO_ANCHORS: [[f64; 3]; 11] = [
    [0.001462, 0.000466, 0.013866],
    [0.087411, 0.044556, 0.224813],
    [0.258234, 0.038571, 0.406485],
    [0.416331, 0.090203, 0.432943],
    [0.578304, 0.148039, 0.404411],
    [0.735683, 0.215906, 0.330245],
    [0.865006, 0.316822, 0.226055],
    [0.954506, 0.468744, 0.099874],
    [0.987622, 0.645320, 0.039886],
    [0.964394, 0.843848, 0.273391],
    [0.988362, 0.998364, 0.644924],
];

const LUT_LEN: usize = 256;

/// Color lookup table mapping a normalized scalar to RGB.
///
/// Built by resampling the base map at `linspace(min_clip, max_clip, 256)`
/// raised to `exp`, which clips the dark/bright extremes and biases the ramp.
#[derive(Clone, Debug)]
pub struct Colormap {
    lut: Vec<[f64; 3]>,
}

impl Colormap {
    /// The full inferno ramp, unclipped.
    pub fn inferno() -> Self {
        let lut = (0..LUT_LEN)
            .map(|i| base_sample(i as f64 / (LUT_LEN - 1) as f64))
            .collect();
        Self { lut }
    }

    /// Resampled inferno ramp. The cover's default is `(0.15, 0.95, 1.15)`:
    /// skip the near-black foot, stop short of the washed-out tip, and bias
    /// slightly toward the dark end.
    pub fn with_range(min_clip: f64, max_clip: f64, exp: f64) -> CoverResult<Self> {
        if !(0.0..=1.0).contains(&min_clip) || !(0.0..=1.0).contains(&max_clip) {
            return Err(CoverError::validation(
                "colormap clip values must lie in [0, 1]",
            ));
        }
        if min_clip >= max_clip {
            return Err(CoverError::validation(
                "colormap min_clip must be below max_clip",
            ));
        }
        if !exp.is_finite() || exp <= 0.0 {
            return Err(CoverError::validation(
                "colormap exponent must be finite and > 0",
            ));
        }

        let lut = (0..LUT_LEN)
            .map(|i| {
                let u = i as f64 / (LUT_LEN - 1) as f64;
                let pos = (min_clip + (max_clip - min_clip) * u).powf(exp);
                base_sample(pos)
            })
            .collect();
        Ok(Self { lut })
    }

    /// Map a normalized value to an opaque RGBA8 color. `t` is clamped to
    /// `[0, 1]`.
    pub fn sample(&self, t: f64) -> [u8; 4] {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let pos = t * (self.lut.len() - 1) as f64;
        let i0 = pos.floor() as usize;
        let i1 = (i0 + 1).min(self.lut.len() - 1);
        let frac = pos - i0 as f64;
        let mut out = [0u8; 4];
        for c in 0..3 {
            let v = self.lut[i0][c] * (1.0 - frac) + self.lut[i1][c] * frac;
            out[c] = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        }
        out[3] = 255;
        out
    }
}

fn base_sample(t: f64) -> [f64; 3] {
    let t = t.clamp(0.0, 1.0);
    let pos = t * (INFERNO_ANCHORS.len() - 1) as f64;
    let i0 = pos.floor() as usize;
    let i1 = (i0 + 1).min(INFERNO_ANCHORS.len() - 1);
    let frac = pos - i0 as f64;
    let mut out = [0.0; 3];
    for c in 0..3 {
        out[c] = INFERNO_ANCHORS[i0][c] * (1.0 - frac) + INFERNO_ANCHORS[i1][c] * frac;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn luma(px: [u8; 4]) -> f64 {
        0.2126 * px[0] as f64 + 0.7152 * px[1] as f64 + 0.0722 * px[2] as f64
    }

    #[test]
    fn full_range_runs_dark_to_bright() {
        let cmap = Colormap::inferno();
        let lo = cmap.sample(0.0);
        let hi = cmap.sample(1.0);
        assert!(luma(lo) < 10.0, "low end should be near-black: {lo:?}");
        assert!(luma(hi) > 200.0, "high end should be bright: {hi:?}");
        assert_eq!(lo[3], 255);
        assert_eq!(hi[3], 255);
    }

    #[test]
    fn brightness_is_monotone() {
        let cmap = Colormap::inferno();
        let mut prev = luma(cmap.sample(0.0));
        for i in 1..=20 {
            let cur = luma(cmap.sample(i as f64 / 20.0));
            assert!(cur >= prev - 1.0, "luma dipped at step {i}");
            prev = cur;
        }
    }

    #[test]
    fn clipping_narrows_the_ramp() {
        let full = Colormap::inferno();
        let clipped = Colormap::with_range(0.15, 0.95, 1.0).unwrap();
        assert!(luma(clipped.sample(0.0)) > luma(full.sample(0.0)));
        assert!(luma(clipped.sample(1.0)) < luma(full.sample(1.0)));
    }

    #[test]
    fn exponent_biases_toward_dark() {
        let neutral = Colormap::with_range(0.15, 0.95, 1.0).unwrap();
        let biased = Colormap::with_range(0.15, 0.95, 1.15).unwrap();
        // pos^1.15 < pos for pos in (0, 1), so mid-ramp colors sit lower.
        assert!(luma(biased.sample(0.5)) < luma(neutral.sample(0.5)));
    }

    #[test]
    fn sample_clamps_out_of_range_input() {
        let cmap = Colormap::inferno();
        assert_eq!(cmap.sample(-3.0), cmap.sample(0.0));
        assert_eq!(cmap.sample(42.0), cmap.sample(1.0));
        assert_eq!(cmap.sample(f64::NAN), cmap.sample(0.0));
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(Colormap::with_range(0.9, 0.1, 1.0).is_err());
        assert!(Colormap::with_range(-0.1, 0.5, 1.0).is_err());
        assert!(Colormap::with_range(0.1, 0.5, 0.0).is_err());
    }
}
