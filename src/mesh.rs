use delaunator::{Point, triangulate};

use crate::{
    error::{CoverError, CoverResult},
    sample::SampleSet,
};

/// Planar triangulation of a sample set: mesh connectivity plus the scalar
/// value carried by each vertex.
#[derive(Clone, Debug, PartialEq)]
pub struct TriMesh {
    /// Vertex coordinates, in the sample set's insertion order.
    pub points: Vec<[f64; 2]>,
    /// Scalar value per vertex, parallel to `points`.
    pub values: Vec<f64>,
    /// Triangles as index triples into `points`.
    pub triangles: Vec<[usize; 3]>,
    /// Convex hull vertex indices, counter-clockwise.
    pub hull: Vec<usize>,
}

impl TriMesh {
    /// Min/max of the vertex values, used to normalize mesh colors.
    pub fn value_range(&self) -> (f64, f64) {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &v in &self.values {
            min = min.min(v);
            max = max.max(v);
        }
        (min, max)
    }
}

/// Delaunay-triangulate a sample set. Fails for fewer than three points or a
/// degenerate (collinear) configuration.
pub fn triangulate_samples(set: &SampleSet) -> CoverResult<TriMesh> {
    if set.len() < 3 {
        return Err(CoverError::data(format!(
            "triangulation needs at least 3 samples, got {}",
            set.len()
        )));
    }

    let mut points = Vec::with_capacity(set.len());
    let mut values = Vec::with_capacity(set.len());
    let mut input = Vec::with_capacity(set.len());
    for s in set.iter() {
        points.push([s.x, s.y]);
        values.push(s.value);
        input.push(Point { x: s.x, y: s.y });
    }

    let tri = triangulate(&input);
    if tri.triangles.is_empty() {
        return Err(CoverError::data(
            "triangulation is degenerate (all samples collinear?)",
        ));
    }

    let triangles = tri
        .triangles
        .chunks_exact(3)
        .map(|t| [t[0], t[1], t[2]])
        .collect();

    tracing::debug!(
        vertices = points.len(),
        triangles = tri.triangles.len() / 3,
        "triangulated sample set"
    );

    Ok(TriMesh {
        points,
        values,
        triangles,
        hull: tri.hull,
    })
}
