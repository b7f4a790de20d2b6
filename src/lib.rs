#![forbid(unsafe_code)]

pub mod colormap;
pub mod compose;
pub mod discover;
pub mod error;
pub mod export;
pub mod field;
pub mod gradient;
pub mod mesh;
pub mod page;
pub mod sample;
pub mod text;

pub use colormap::Colormap;
pub use compose::{FrameRgba, render_cover};
pub use discover::{discover_inputs, relative_input, select_input};
pub use error::{CoverError, CoverResult};
pub use export::{already_exported, export_frame, output_path};
pub use field::{ScalarGrid, interpolate_on_grid};
pub use gradient::{GradientAxis, RevealGradient, opacity_profile};
pub use mesh::{TriMesh, triangulate_samples};
pub use page::{ColormapSpec, CoverConfig, PageSpec};
pub use sample::{Bounds, Sample, SampleSet, default_reveal_cutoff, load_sample_set};
