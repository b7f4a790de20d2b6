use std::path::{Component, Path, PathBuf};

use crate::{
    compose::FrameRgba,
    error::{CoverError, CoverResult},
};

/// Map an input's root-relative path to its output file name: path
/// separators flatten to `__`, the input extension is dropped, and `ext`
/// is appended. Keeps one flat output directory resumable across batch
/// runs over a nested input tree.
pub fn output_path(out_dir: &Path, input_rel: &Path, ext: &str) -> PathBuf {
    let flat = input_rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("__");
    let stem = Path::new(&flat)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or(flat);
    out_dir.join(format!("{stem}.{ext}"))
}

/// The idempotent resume guard: an existing output means the whole
/// invocation is a successful no-op.
pub fn already_exported(path: &Path) -> bool {
    path.exists()
}

/// Encode the composed frame to `path`, format inferred from the extension.
/// Parent directories are created; encoding failures propagate.
#[tracing::instrument(skip(frame))]
pub fn export_frame(frame: &FrameRgba, path: &Path) -> CoverResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            CoverError::data(format!("create output dir '{}': {e}", parent.display()))
        })?;
    }

    let format = image::ImageFormat::from_path(path).map_err(|e| {
        CoverError::validation(format!(
            "cannot infer image format for '{}': {e}",
            path.display()
        ))
    })?;

    image::save_buffer_with_format(
        path,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        format,
    )
    .map_err(|e| CoverError::render(format!("write '{}': {e}", path.display())))?;

    tracing::info!(path = %path.display(), "exported cover");
    Ok(())
}
