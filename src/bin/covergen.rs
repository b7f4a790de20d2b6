use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;

/// Render one book cover from a directory of serialized sample sets.
///
/// The input is selected by positional index into the sorted list of
/// discovered files, so a shell loop over indices resumes cleanly: runs
/// whose output already exists exit immediately without rendering.
#[derive(Parser, Debug)]
#[command(name = "covergen", version)]
struct Cli {
    /// Index into the discovered input file list (0-based).
    index: usize,

    /// Directory tree containing serialized sample sets (*.json).
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Directory the rendered covers are written to.
    #[arg(long, default_value = "covers")]
    out_dir: PathBuf,

    /// Output file extension (determines the encoded format).
    #[arg(long, default_value = "png")]
    format: String,

    /// Cover configuration JSON; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the reveal cutoff (number of earliest samples in the mesh).
    #[arg(long)]
    cutoff: Option<usize>,

    /// Numbered-edition line ("edition K of N") on the back cover.
    #[arg(long)]
    edition: Option<u32>,

    /// Personal dedication line on the back cover.
    #[arg(long)]
    dedication: Option<String>,

    /// Draw dashed spine/trim guide lines for print-shop alignment.
    #[arg(long)]
    with_guides: bool,

    /// Skip the typography layer entirely.
    #[arg(long)]
    no_text: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => covergen::CoverConfig::load(path)
            .with_context(|| format!("load config '{}'", path.display()))?,
        None => covergen::CoverConfig::default(),
    };
    if cli.cutoff.is_some() {
        config.cutoff = cli.cutoff;
    }
    if cli.edition.is_some() {
        config.edition = cli.edition;
    }
    if cli.dedication.is_some() {
        config.dedication = cli.dedication.clone();
    }
    if cli.with_guides {
        config.with_guides = true;
    }
    if cli.no_text {
        config.with_text = false;
    }

    let inputs = covergen::discover_inputs(&cli.data_dir)
        .with_context(|| format!("discover inputs under '{}'", cli.data_dir.display()))?;
    let input = covergen::select_input(&inputs, cli.index)?;

    let rel = covergen::relative_input(&cli.data_dir, input);
    let out = covergen::output_path(&cli.out_dir, rel, &cli.format);
    if covergen::already_exported(&out) {
        eprintln!("{} exists, skipping", out.display());
        return Ok(());
    }

    let (set, bounds) = covergen::load_sample_set(input)
        .with_context(|| format!("load sample set '{}'", input.display()))?;

    let frame = covergen::render_cover(&set, &bounds, &config)?;
    covergen::export_frame(&frame, &out)?;

    eprintln!("wrote {}", out.display());
    Ok(())
}
