use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{CoverError, CoverResult};

/// Collect serialized sample-set files under `root`, sorted for a stable
/// index. Batch traversal happens by invoking the binary once per index,
/// so the ordering here is the whole batch contract.
pub fn discover_inputs(root: &Path) -> CoverResult<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry =
            entry.map_err(|e| CoverError::data(format!("scan '{}': {e}", root.display())))?;
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == "json")
        {
            out.push(entry.into_path());
        }
    }
    out.sort();
    tracing::debug!(count = out.len(), root = %root.display(), "discovered inputs");
    Ok(out)
}

/// Pick one input by positional index.
pub fn select_input(inputs: &[PathBuf], index: usize) -> CoverResult<&Path> {
    inputs.get(index).map(PathBuf::as_path).ok_or_else(|| {
        CoverError::validation(format!(
            "index {index} out of range, {} input files discovered",
            inputs.len()
        ))
    })
}

/// Root-relative form of an input path, used for output naming. Falls back
/// to the full path when the input is not under `root`.
pub fn relative_input<'a>(root: &Path, input: &'a Path) -> &'a Path {
    input.strip_prefix(root).unwrap_or(input)
}
