use std::path::{Path, PathBuf};
use std::process::Command;

use covergen::{CoverConfig, PageSpec, Sample};

fn bin_path() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_covergen")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "covergen.exe"
            } else {
                "covergen"
            });
            p
        })
}

fn write_fixture(root: &Path) -> (PathBuf, PathBuf, PathBuf) {
    let data_dir = root.join("data");
    let out_dir = root.join("covers");
    std::fs::create_dir_all(data_dir.join("sweep")).unwrap();

    let n = 8;
    let mut samples = Vec::new();
    for j in 0..n {
        for i in 0..n {
            let x = -1.0 + 2.0 * f64::from(i) / f64::from(n - 1);
            let y = -1.0 + 2.0 * f64::from(j) / f64::from(n - 1);
            samples.push(Sample {
                x,
                y,
                value: x * y + 0.3 * x,
            });
        }
    }
    let input = data_dir.join("sweep").join("run_0001.json");
    std::fs::write(&input, serde_json::to_string(&samples).unwrap()).unwrap();

    let config = CoverConfig {
        page: PageSpec {
            width_cm: 3.0,
            height_cm: 2.0,
            margin_cm: 0.0,
            spine_cm: 0.3,
        },
        dpi: 40,
        interp_resolution: 24,
        with_text: false,
        ..CoverConfig::default()
    };
    let config_path = root.join("config.json");
    std::fs::write(&config_path, serde_json::to_string(&config).unwrap()).unwrap();

    (data_dir, out_dir, config_path)
}

fn run(data_dir: &Path, out_dir: &Path, config: &Path, index: &str) -> std::process::Output {
    Command::new(bin_path())
        .arg(index)
        .arg("--data-dir")
        .arg(data_dir)
        .arg("--out-dir")
        .arg(out_dir)
        .arg("--config")
        .arg(config)
        .output()
        .unwrap()
}

#[test]
fn cli_renders_flattened_output_name() {
    let dir = tempfile::tempdir().unwrap();
    let (data_dir, out_dir, config) = write_fixture(dir.path());

    let out = run(&data_dir, &out_dir, &config, "0");
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let expected = out_dir.join("sweep__run_0001.png");
    assert!(expected.exists());
    let img = image::open(&expected).unwrap();
    assert!(img.width() > 0 && img.height() > 0);
}

#[test]
fn cli_skips_when_output_exists() {
    let dir = tempfile::tempdir().unwrap();
    let (data_dir, out_dir, config) = write_fixture(dir.path());

    let expected = out_dir.join("sweep__run_0001.png");
    std::fs::create_dir_all(&out_dir).unwrap();
    std::fs::write(&expected, b"sentinel, not a png").unwrap();

    let out = run(&data_dir, &out_dir, &config, "0");
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("skipping"));

    // The guard must leave the existing file untouched.
    assert_eq!(
        std::fs::read(&expected).unwrap(),
        b"sentinel, not a png".to_vec()
    );
}

#[test]
fn cli_rejects_out_of_range_index() {
    let dir = tempfile::tempdir().unwrap();
    let (data_dir, out_dir, config) = write_fixture(dir.path());

    let out = run(&data_dir, &out_dir, &config, "5");
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("out of range"));
}
