use covergen::{
    Bounds, CoverConfig, PageSpec, Sample, SampleSet, interpolate_on_grid, render_cover,
    triangulate_samples,
};

fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn digest_u64(bytes: &[u8]) -> u64 {
    let mut state = 0x9E37_79B9_7F4A_7C15u64;
    for chunk in bytes.chunks(8) {
        let mut v = 0u64;
        for (i, &b) in chunk.iter().enumerate() {
            v |= (b as u64) << (i * 8);
        }
        state = mix64(state ^ v);
    }
    state
}

fn wavy_set(n: usize) -> (SampleSet, Bounds) {
    let mut samples = Vec::new();
    for j in 0..n {
        for i in 0..n {
            let x = -1.0 + 2.0 * i as f64 / (n - 1) as f64;
            let y = -1.0 + 2.0 * j as f64 / (n - 1) as f64;
            samples.push(Sample {
                x,
                y,
                value: (4.0 * x).sin() * (3.0 * y).cos() + 0.5 * x,
            });
        }
    }
    let set = SampleSet::new(samples).unwrap();
    let bounds = Bounds::from_samples(&set).unwrap();
    (set, bounds)
}

fn tiny_config() -> CoverConfig {
    CoverConfig {
        page: PageSpec {
            width_cm: 3.5,
            height_cm: 2.4,
            margin_cm: 0.05,
            spine_cm: 0.11,
        },
        dpi: 50,
        interp_resolution: 40,
        with_text: false,
        ..CoverConfig::default()
    }
}

#[test]
fn end_to_end_render_is_deterministic_and_nonempty() {
    let (set, bounds) = wavy_set(10);
    let config = tiny_config();

    let a = render_cover(&set, &bounds, &config).unwrap();
    let b = render_cover(&set, &bounds, &config).unwrap();

    assert!(a.premultiplied);
    assert_eq!(digest_u64(&a.data), digest_u64(&b.data));
    assert!(a.data.iter().any(|&x| x != 0));
}

#[test]
fn reveal_cutoff_25_of_100_spans_domain() {
    // 100 samples in [(-1,1),(-1,1)], cutoff 25: the reduced set is the
    // 25-entry prefix plus the boundary-exact entries beyond it, and the
    // triangulation hull still spans the full domain.
    let (set, bounds) = wavy_set(10);
    assert_eq!(set.len(), 100);

    let reduced = set.reveal_till(25, &bounds);
    assert!(reduced.len() >= 25);
    assert_eq!(&reduced.samples()[..25], &set.samples()[..25]);
    for s in &reduced.samples()[25..] {
        assert!(bounds.on_boundary(s.x, s.y));
    }

    let mesh = triangulate_samples(&reduced).unwrap();
    let hull_pts: Vec<[f64; 2]> = mesh.hull.iter().map(|&i| mesh.points[i]).collect();
    for corner in [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]] {
        assert!(hull_pts.contains(&corner), "hull misses corner {corner:?}");
    }
}

#[test]
fn smooth_layer_ignores_the_cutoff() {
    // The dense grid comes from the full set: two configs that differ only
    // in cutoff interpolate identical grids.
    let (set, bounds) = wavy_set(8);
    let mesh = triangulate_samples(&set).unwrap();
    let a = interpolate_on_grid(&mesh, &bounds, 32).unwrap();
    let b = interpolate_on_grid(&mesh, &bounds, 32).unwrap();
    assert_eq!(a.values, b.values);

    let coarse = render_cover(
        &set,
        &bounds,
        &CoverConfig {
            cutoff: Some(5),
            ..tiny_config()
        },
    )
    .unwrap();
    let fine = render_cover(
        &set,
        &bounds,
        &CoverConfig {
            cutoff: Some(60),
            ..tiny_config()
        },
    )
    .unwrap();
    // The mesh layer differs, but both rendered at the same canvas size.
    assert_eq!((coarse.width, coarse.height), (fine.width, fine.height));
    assert_ne!(coarse.data, fine.data);
}

#[test]
fn sample_set_round_trips_through_json() {
    let (set, bounds) = wavy_set(6);
    let json = serde_json::to_string(set.samples()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.json");
    std::fs::write(&path, json).unwrap();

    let (loaded, loaded_bounds) = covergen::load_sample_set(&path).unwrap();
    assert_eq!(loaded, set);
    assert_eq!(loaded_bounds, bounds);
}

#[test]
fn malformed_sample_file_fails_to_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, "{not json").unwrap();
    assert!(covergen::load_sample_set(&path).is_err());
    assert!(covergen::load_sample_set(&dir.path().join("missing.json")).is_err());
}
