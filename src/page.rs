use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::{
    error::{CoverError, CoverResult},
    gradient::RevealGradient,
    sample::default_reveal_cutoff,
};

const CM_PER_INCH: f64 = 2.54;

/// Physical page geometry in centimeters: the full wrap-around sheet
/// (back + spine + front) plus the bleed margin added on each side.
///
/// The defaults were measured from the print shop's proof; treat them as
/// job configuration, not logic.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PageSpec {
    pub width_cm: f64,
    pub height_cm: f64,
    pub margin_cm: f64,
    pub spine_cm: f64,
}

impl Default for PageSpec {
    fn default() -> Self {
        Self {
            width_cm: 34.95,
            height_cm: 24.0,
            margin_cm: 0.5,
            spine_cm: 1.1,
        }
    }
}

impl PageSpec {
    pub fn validate(&self) -> CoverResult<()> {
        for (name, v) in [
            ("width_cm", self.width_cm),
            ("height_cm", self.height_cm),
            ("spine_cm", self.spine_cm),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(CoverError::validation(format!(
                    "page {name} must be finite and > 0"
                )));
            }
        }
        if !self.margin_cm.is_finite() || self.margin_cm < 0.0 {
            return Err(CoverError::validation("page margin_cm must be >= 0"));
        }
        Ok(())
    }

    /// Canvas size in inches, margin included.
    pub fn size_in(&self) -> (f64, f64) {
        (
            (self.width_cm + self.margin_cm) / CM_PER_INCH,
            (self.height_cm + self.margin_cm) / CM_PER_INCH,
        )
    }

    pub fn margin_in(&self) -> f64 {
        self.margin_cm / CM_PER_INCH
    }

    pub fn spine_in(&self) -> f64 {
        self.spine_cm / CM_PER_INCH
    }

    pub fn aspect(&self) -> f64 {
        let (w, h) = self.size_in();
        w / h
    }

    /// Canvas size in pixels at the given dpi. The CPU rasterizer addresses
    /// surfaces with u16 coordinates, so oversized canvases are rejected
    /// here instead of deep inside the render.
    pub fn pixel_size(&self, dpi: u32) -> CoverResult<(u32, u32)> {
        if dpi == 0 {
            return Err(CoverError::validation("dpi must be > 0"));
        }
        let (w_in, h_in) = self.size_in();
        let w = (w_in * f64::from(dpi)).round() as u32;
        let h = (h_in * f64::from(dpi)).round() as u32;
        if w == 0 || h == 0 {
            return Err(CoverError::validation("canvas collapses to zero pixels"));
        }
        if w > u32::from(u16::MAX) || h > u32::from(u16::MAX) {
            return Err(CoverError::validation(format!(
                "canvas {w}x{h} exceeds the rasterizer's u16 surface limit"
            )));
        }
        Ok((w, h))
    }
}

/// Colormap clipping and bias, mirroring the ramp resampling parameters.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ColormapSpec {
    pub min_clip: f64,
    pub max_clip: f64,
    pub exp: f64,
}

impl Default for ColormapSpec {
    fn default() -> Self {
        Self {
            min_clip: 0.15,
            max_clip: 0.95,
            exp: 1.15,
        }
    }
}

/// Everything one invocation needs besides the sample data. All fields have
/// defaults reproducing the original print job; a JSON config file can
/// override any subset.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CoverConfig {
    pub page: PageSpec,
    pub dpi: u32,
    /// Grid resolution for the smooth full-resolution layer.
    pub interp_resolution: usize,
    pub colormap: ColormapSpec,
    pub gradient: RevealGradient,
    /// Reveal cutoff override; `None` applies the quarter-of-the-set rule.
    pub cutoff: Option<usize>,
    pub title: String,
    /// Single-line variant used on the spine.
    pub spine_title: String,
    pub author: String,
    pub imprint: String,
    pub isbn: String,
    pub dedication: Option<String>,
    pub edition: Option<u32>,
    pub edition_total: u32,
    pub with_text: bool,
    pub with_guides: bool,
    /// Font file for the typography layer. Required when `with_text` is on.
    pub font_path: Option<PathBuf>,
}

impl Default for CoverConfig {
    fn default() -> Self {
        Self {
            page: PageSpec::default(),
            dpi: 300,
            interp_resolution: 1000,
            colormap: ColormapSpec::default(),
            gradient: RevealGradient::default(),
            cutoff: None,
            title: "Towards realistic numerical simulations\nof Majorana devices".to_string(),
            spine_title: "Towards realistic numerical simulations of Majorana devices"
                .to_string(),
            author: "Bas Nijholt".to_string(),
            imprint: "Casimir PhD series 2020-11".to_string(),
            isbn: "ISBN 978-90-8593-438-7".to_string(),
            dedication: None,
            edition: None,
            edition_total: 120,
            with_text: true,
            with_guides: false,
            font_path: None,
        }
    }
}

impl CoverConfig {
    pub fn load(path: &Path) -> CoverResult<Self> {
        let f = File::open(path)
            .map_err(|e| CoverError::data(format!("open config '{}': {e}", path.display())))?;
        let cfg: CoverConfig = serde_json::from_reader(BufReader::new(f))
            .map_err(|e| CoverError::serde(format!("parse config '{}': {e}", path.display())))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> CoverResult<()> {
        self.page.validate()?;
        self.page.pixel_size(self.dpi)?;
        if self.interp_resolution < 2 {
            return Err(CoverError::validation(
                "interp_resolution must be at least 2",
            ));
        }
        if self.with_text && (self.title.trim().is_empty() || self.author.trim().is_empty()) {
            return Err(CoverError::validation(
                "with_text requires a non-empty title and author",
            ));
        }
        if let Some(edition) = self.edition {
            if edition == 0 || edition > self.edition_total {
                return Err(CoverError::validation(format!(
                    "edition {edition} is outside 1..={}",
                    self.edition_total
                )));
            }
        }
        Ok(())
    }

    /// Cutoff for the partial reveal of a set with `n` samples.
    pub fn reveal_cutoff(&self, n: usize) -> usize {
        self.cutoff.unwrap_or_else(|| default_reveal_cutoff(n))
    }

    /// The "edition K of N" line, when an edition number is set.
    pub fn edition_line(&self) -> Option<String> {
        self.edition
            .map(|k| format!("edition {k} of {}", self.edition_total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let cfg = CoverConfig::default();
        cfg.validate().unwrap();
    }

    #[test]
    fn aspect_is_invariant_to_dpi_and_colormap() {
        let mut cfg = CoverConfig::default();
        let aspect = cfg.page.aspect();

        for dpi in [72, 150, 300, 600] {
            let (w, h) = cfg.page.pixel_size(dpi).unwrap();
            let pixel_aspect = f64::from(w) / f64::from(h);
            assert!(
                (pixel_aspect - aspect).abs() < 2e-3,
                "dpi {dpi}: {pixel_aspect} vs {aspect}"
            );
        }

        cfg.colormap = ColormapSpec {
            min_clip: 0.0,
            max_clip: 1.0,
            exp: 2.0,
        };
        assert_eq!(cfg.page.aspect(), aspect);
    }

    #[test]
    fn pixel_size_matches_physical_dims() {
        let page = PageSpec::default();
        let (w, h) = page.pixel_size(300).unwrap();
        // (34.95 + 0.5) cm / 2.54 * 300 ~= 4187 px, (24 + 0.5) cm -> ~2894 px.
        assert_eq!(w, 4187);
        assert_eq!(h, 2894);
    }

    #[test]
    fn rejects_oversized_canvas() {
        let page = PageSpec::default();
        assert!(page.pixel_size(6000).is_err());
        assert!(page.pixel_size(0).is_err());
    }

    #[test]
    fn edition_line_formats() {
        let mut cfg = CoverConfig::default();
        assert_eq!(cfg.edition_line(), None);
        cfg.edition = Some(7);
        assert_eq!(cfg.edition_line().as_deref(), Some("edition 7 of 120"));
    }

    #[test]
    fn rejects_out_of_range_edition() {
        let mut cfg = CoverConfig::default();
        cfg.edition = Some(121);
        assert!(cfg.validate().is_err());
        cfg.edition = Some(0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn config_json_roundtrip_with_partial_overrides() {
        let json = r#"{ "dpi": 150, "cutoff": 500, "with_text": false }"#;
        let cfg: CoverConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.dpi, 150);
        assert_eq!(cfg.cutoff, Some(500));
        assert!(!cfg.with_text);
        // Untouched fields keep their defaults.
        assert_eq!(cfg.page, PageSpec::default());

        let back: CoverConfig =
            serde_json::from_str(&serde_json::to_string(&cfg).unwrap()).unwrap();
        assert_eq!(back.dpi, 150);
        assert_eq!(back.reveal_cutoff(10_000), 500);
    }

    #[test]
    fn cutoff_override_beats_default_rule() {
        let mut cfg = CoverConfig::default();
        assert_eq!(cfg.reveal_cutoff(100), 25);
        cfg.cutoff = Some(10);
        assert_eq!(cfg.reveal_cutoff(100), 10);
    }
}
