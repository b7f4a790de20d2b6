use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::{CoverError, CoverResult};

/// One observation of the sampled scalar field: a 2D coordinate and its value.
///
/// Serialized as a `[x, y, value]` triple so a whole set round-trips as a JSON
/// array that preserves insertion order.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "(f64, f64, f64)", into = "(f64, f64, f64)")]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

impl From<(f64, f64, f64)> for Sample {
    fn from((x, y, value): (f64, f64, f64)) -> Self {
        Self { x, y, value }
    }
}

impl From<Sample> for (f64, f64, f64) {
    fn from(s: Sample) -> Self {
        (s.x, s.y, s.value)
    }
}

/// Insertion-ordered set of samples produced by an external adaptive-sampling
/// run. The order is meaningful: it is the order in which the sampler chose
/// points, and the reveal cutoff is a prefix of it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampleSet {
    samples: Vec<Sample>,
}

impl SampleSet {
    /// Validate and wrap a list of samples. Coordinates must be unique and all
    /// fields finite.
    pub fn new(samples: Vec<Sample>) -> CoverResult<Self> {
        let mut seen = HashSet::with_capacity(samples.len());
        for (i, s) in samples.iter().enumerate() {
            if !(s.x.is_finite() && s.y.is_finite() && s.value.is_finite()) {
                return Err(CoverError::validation(format!(
                    "sample {i} has a non-finite component"
                )));
            }
            if !seen.insert((s.x.to_bits(), s.y.to_bits())) {
                return Err(CoverError::validation(format!(
                    "duplicate sample coordinate ({}, {}) at index {i}",
                    s.x, s.y
                )));
            }
        }
        Ok(Self { samples })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Reduced set for the partial-reveal effect: the first `cutoff` samples
    /// in insertion order, plus every later sample whose coordinate lies
    /// exactly on the bounds rectangle. Forcing the boundary samples in keeps
    /// the triangulation's convex hull equal to the full domain for any
    /// cutoff. The source set is left untouched.
    pub fn reveal_till(&self, cutoff: usize, bounds: &Bounds) -> SampleSet {
        let cutoff = cutoff.min(self.samples.len());
        let mut out = self.samples[..cutoff].to_vec();
        for s in &self.samples[cutoff..] {
            if bounds.on_boundary(s.x, s.y) {
                out.push(*s);
            }
        }
        SampleSet { samples: out }
    }
}

/// Reveal cutoff used when the config does not override it: a quarter of the
/// set, but never fewer than 4000 points once the set is large enough to
/// afford them.
pub fn default_reveal_cutoff(n: usize) -> usize {
    let mut cutoff = n / 4;
    if n > 4000 {
        cutoff = cutoff.max(4000);
    }
    cutoff
}

/// Axis-aligned extent of the observed coordinates. Derived once from the
/// full set and reused for every reduced reconstruction.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Bounds {
    pub fn from_samples(set: &SampleSet) -> CoverResult<Self> {
        let mut it = set.iter();
        let first = it
            .next()
            .ok_or_else(|| CoverError::data("cannot derive bounds from an empty sample set"))?;
        let mut b = Bounds {
            x_min: first.x,
            x_max: first.x,
            y_min: first.y,
            y_max: first.y,
        };
        for s in it {
            b.x_min = b.x_min.min(s.x);
            b.x_max = b.x_max.max(s.x);
            b.y_min = b.y_min.min(s.y);
            b.y_max = b.y_max.max(s.y);
        }
        Ok(b)
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Exact-equality edge membership. The reveal construction depends on
    /// this being exact, not tolerance-based: bounds are derived from the
    /// same float values the samples carry.
    pub fn on_boundary(&self, x: f64, y: f64) -> bool {
        x == self.x_min || x == self.x_max || y == self.y_min || y == self.y_max
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }

    pub fn as_rect(&self) -> kurbo::Rect {
        kurbo::Rect::new(self.x_min, self.y_min, self.x_max, self.y_max)
    }
}

/// Load a serialized sample set and derive its bounds. Failures are whatever
/// the filesystem or the deserializer reports.
pub fn load_sample_set(path: &Path) -> CoverResult<(SampleSet, Bounds)> {
    let f = File::open(path)
        .map_err(|e| CoverError::data(format!("open sample set '{}': {e}", path.display())))?;
    let raw: Vec<Sample> = serde_json::from_reader(BufReader::new(f))
        .map_err(|e| CoverError::serde(format!("parse sample set '{}': {e}", path.display())))?;
    let set = SampleSet::new(raw)?;
    let bounds = Bounds::from_samples(&set)?;
    tracing::debug!(samples = set.len(), "loaded sample set");
    Ok((set, bounds))
}
