use std::collections::HashSet;
use std::f64::consts::FRAC_PI_2;
use std::sync::Arc;

use crate::{
    colormap::Colormap,
    error::{CoverError, CoverResult},
    field::interpolate_on_grid,
    mesh::{TriMesh, triangulate_samples},
    page::CoverConfig,
    sample::{Bounds, SampleSet},
    text::{TextBrush, TextLayoutEngine},
};

/// Composed cover pixels: premultiplied RGBA8, row-major.
#[derive(Clone, Debug)]
pub struct FrameRgba {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

/// Mesh wireframe line width, in points (matches the original render).
const MESH_LINE_PT: f64 = 0.3;
/// Text outline stroke width, in points.
const TEXT_STROKE_PT: f64 = 0.7;
/// Guide line width, in points.
const GUIDE_LINE_PT: f64 = 1.0;

/// Compose the full cover: partially-revealed mesh layer, smooth gradient
/// layer, typography, optional guide lines.
#[tracing::instrument(skip_all, fields(samples = set.len()))]
pub fn render_cover(
    set: &SampleSet,
    bounds: &Bounds,
    config: &CoverConfig,
) -> CoverResult<FrameRgba> {
    config.validate()?;
    let (w, h) = config.page.pixel_size(config.dpi)?;
    let w16: u16 = w
        .try_into()
        .map_err(|_| CoverError::render("canvas width exceeds u16"))?;
    let h16: u16 = h
        .try_into()
        .map_err(|_| CoverError::render("canvas height exceeds u16"))?;

    let cmap = Colormap::with_range(
        config.colormap.min_clip,
        config.colormap.max_clip,
        config.colormap.exp,
    )?;

    let cutoff = config.reveal_cutoff(set.len());
    let reduced = set.reveal_till(cutoff, bounds);
    tracing::info!(cutoff, reduced = reduced.len(), "constructed reveal set");
    let reduced_mesh = triangulate_samples(&reduced)?;

    // The smooth layer always comes from the complete set, regardless of the
    // cutoff.
    let full_mesh = triangulate_samples(set)?;
    let grid = interpolate_on_grid(&full_mesh, bounds, config.interp_resolution)?;
    let smooth_rgba = config.gradient.apply(&grid, &cmap)?;

    let map = CanvasMap::new(config, w, h);
    let world = map.world_to_canvas(bounds);

    let mut ctx = vello_cpu::RenderContext::new(w16, h16);

    // Opaque base under everything; antialiased triangle edges would
    // otherwise bleed transparency into the export.
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(color_from_rgba8(cmap.sample(0.0)));
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
        0.0,
        0.0,
        f64::from(w),
        f64::from(h),
    ));

    draw_mesh_fills(&mut ctx, &reduced_mesh, &cmap, world);
    draw_mesh_wires(&mut ctx, &reduced_mesh, world, map.pt_to_px(MESH_LINE_PT));
    draw_smooth_layer(&mut ctx, &smooth_rgba, grid.width, grid.height, w, h)?;

    if config.with_text {
        draw_typography(&mut ctx, &map, config)?;
    }
    if config.with_guides {
        draw_guides(&mut ctx, &map);
    }

    ctx.flush();
    let mut pixmap = vello_cpu::Pixmap::new(w16, h16);
    ctx.render_to_pixmap(&mut pixmap);

    Ok(FrameRgba {
        width: w,
        height: h,
        data: pixmap.data_as_u8_slice().to_vec(),
        premultiplied: true,
    })
}

/// Physical canvas bookkeeping: pixel size plus the inch-based coordinate
/// frame the annotations are placed in (origin at the canvas center, y up,
/// like the original plot axes).
struct CanvasMap {
    w: u32,
    h: u32,
    dpi: f64,
    x_size_in: f64,
    y_size_in: f64,
    margin_in: f64,
    spine_in: f64,
}

impl CanvasMap {
    fn new(config: &CoverConfig, w: u32, h: u32) -> Self {
        let (x_size_in, y_size_in) = config.page.size_in();
        Self {
            w,
            h,
            dpi: f64::from(config.dpi),
            x_size_in,
            y_size_in,
            margin_in: config.page.margin_in(),
            spine_in: config.page.spine_in(),
        }
    }

    /// Inches from the canvas center (y up) to pixels (y down).
    fn place(&self, x_in: f64, y_in: f64) -> kurbo::Point {
        kurbo::Point::new(
            f64::from(self.w) / 2.0 + x_in * self.dpi,
            f64::from(self.h) / 2.0 - y_in * self.dpi,
        )
    }

    fn pt_to_px(&self, pt: f64) -> f64 {
        pt / 72.0 * self.dpi
    }

    /// Affine taking sample-space coordinates onto the full pixel canvas,
    /// flipping y so the domain top lands on row 0.
    fn world_to_canvas(&self, bounds: &Bounds) -> kurbo::Affine {
        let sx = f64::from(self.w) / bounds.width();
        let sy = f64::from(self.h) / bounds.height();
        kurbo::Affine::new([
            sx,
            0.0,
            0.0,
            -sy,
            -bounds.x_min * sx,
            bounds.y_max * sy,
        ])
    }
}

fn color_from_rgba8(c: [u8; 4]) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c[0], c[1], c[2], c[3])
}

fn affine_to_cpu(a: kurbo::Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: kurbo::Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

/// Flat-shaded triangles, colored by the mean vertex value normalized over
/// the reduced mesh's range.
fn draw_mesh_fills(
    ctx: &mut vello_cpu::RenderContext,
    mesh: &TriMesh,
    cmap: &Colormap,
    world: kurbo::Affine,
) {
    let (vmin, vmax) = mesh.value_range();
    let norm = |v: f64| {
        if vmax > vmin {
            (v - vmin) / (vmax - vmin)
        } else {
            0.0
        }
    };
    let px: Vec<kurbo::Point> = mesh
        .points
        .iter()
        .map(|p| world * kurbo::Point::new(p[0], p[1]))
        .collect();

    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    for &[a, b, c] in &mesh.triangles {
        let mean = (mesh.values[a] + mesh.values[b] + mesh.values[c]) / 3.0;
        ctx.set_paint(color_from_rgba8(cmap.sample(norm(mean))));

        let mut path = vello_cpu::kurbo::BezPath::new();
        path.move_to(point_to_cpu(px[a]));
        path.line_to(point_to_cpu(px[b]));
        path.line_to(point_to_cpu(px[c]));
        path.close_path();
        ctx.fill_path(&path);
    }
}

/// Black hairline wireframe over the filled mesh. Shared edges are stroked
/// once.
fn draw_mesh_wires(
    ctx: &mut vello_cpu::RenderContext,
    mesh: &TriMesh,
    world: kurbo::Affine,
    width_px: f64,
) {
    let px: Vec<kurbo::Point> = mesh
        .points
        .iter()
        .map(|p| world * kurbo::Point::new(p[0], p[1]))
        .collect();

    let mut seen = HashSet::new();
    let mut path = vello_cpu::kurbo::BezPath::new();
    for &[a, b, c] in &mesh.triangles {
        for (i, j) in [(a, b), (b, c), (c, a)] {
            let key = (i.min(j), i.max(j));
            if seen.insert(key) {
                path.move_to(point_to_cpu(px[i]));
                path.line_to(point_to_cpu(px[j]));
            }
        }
    }

    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(color_from_rgba8([0, 0, 0, 255]));
    ctx.set_stroke(vello_cpu::kurbo::Stroke::new(width_px));
    ctx.stroke_path(&path);
}

/// The interpolated full-resolution field with its reveal gradient, scaled
/// over the whole canvas.
fn draw_smooth_layer(
    ctx: &mut vello_cpu::RenderContext,
    rgba8_premul: &[u8],
    grid_w: usize,
    grid_h: usize,
    canvas_w: u32,
    canvas_h: u32,
) -> CoverResult<()> {
    let pixmap = premul_bytes_to_pixmap(rgba8_premul, grid_w, grid_h)?;
    let paint = vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    };

    let scale = kurbo::Affine::scale_non_uniform(
        f64::from(canvas_w) / grid_w as f64,
        f64::from(canvas_h) / grid_h as f64,
    );
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_transform(affine_to_cpu(scale));
    ctx.set_paint(paint);
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
        0.0,
        0.0,
        grid_w as f64,
        grid_h as f64,
    ));
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    Ok(())
}

fn premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: usize,
    height: usize,
) -> CoverResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| CoverError::render("raster width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| CoverError::render("raster height exceeds u16"))?;
    if rgba8_premul.len() != width * height * 4 {
        return Err(CoverError::render("raster byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width * height);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

/// One placed block of outlined text.
struct TextBlock<'a> {
    text: &'a str,
    /// Anchor in inches from the canvas center, y up.
    anchor_in: (f64, f64),
    size_pt: f64,
    /// Rotate a quarter turn so the text runs down the spine.
    rotated: bool,
    /// Center on the anchor horizontally; spine lines hang from the anchor
    /// instead.
    centered: bool,
}

fn draw_typography(
    ctx: &mut vello_cpu::RenderContext,
    map: &CanvasMap,
    config: &CoverConfig,
) -> CoverResult<()> {
    let font_path = config.font_path.as_ref().ok_or_else(|| {
        CoverError::validation("with_text requires font_path (or disable text)")
    })?;
    let font_bytes = std::fs::read(font_path).map_err(|e| {
        CoverError::data(format!("read font '{}': {e}", font_path.display()))
    })?;
    let font_data = vello_cpu::peniko::FontData::new(
        vello_cpu::peniko::Blob::from(font_bytes.clone()),
        0,
    );
    let mut engine = TextLayoutEngine::from_font_bytes(&font_bytes)?;

    let title_upper = config.title.to_uppercase();
    let author_upper = config.author.to_uppercase();

    let half_y = (map.y_size_in - map.margin_in) / 2.0;
    let quarter_x = map.x_size_in / 4.0;

    let mut back_block = format!("{}\n{}", config.imprint, config.isbn);
    if let Some(line) = config.edition_line() {
        back_block.push('\n');
        back_block.push_str(&line);
    }

    let mut blocks = vec![
        // Front cover, title above center and author below.
        TextBlock {
            text: &title_upper,
            anchor_in: (quarter_x, 0.7 * half_y),
            size_pt: 18.0,
            rotated: false,
            centered: true,
        },
        TextBlock {
            text: &author_upper,
            anchor_in: (quarter_x, -0.8 * half_y),
            size_pt: 18.0,
            rotated: false,
            centered: true,
        },
        // Spine, reading top to bottom.
        TextBlock {
            text: &config.spine_title,
            anchor_in: (-0.09, map.y_size_in / 4.0 - 0.9),
            size_pt: 12.0,
            rotated: true,
            centered: false,
        },
        TextBlock {
            text: &config.author,
            anchor_in: (-0.09, -map.y_size_in / 4.0 - 1.0),
            size_pt: 12.0,
            rotated: true,
            centered: false,
        },
        // Back cover imprint block.
        TextBlock {
            text: &back_block,
            anchor_in: (-quarter_x, -0.8 * half_y),
            size_pt: 11.0,
            rotated: false,
            centered: true,
        },
    ];
    if let Some(dedication) = &config.dedication {
        blocks.push(TextBlock {
            text: dedication,
            anchor_in: (-quarter_x, 0.4 * half_y),
            size_pt: 16.0,
            rotated: false,
            centered: true,
        });
    }

    for block in &blocks {
        draw_text_block(ctx, map, &mut engine, &font_data, block)?;
    }
    Ok(())
}

fn draw_text_block(
    ctx: &mut vello_cpu::RenderContext,
    map: &CanvasMap,
    engine: &mut TextLayoutEngine,
    font_data: &vello_cpu::peniko::FontData,
    block: &TextBlock<'_>,
) -> CoverResult<()> {
    let size_px = map.pt_to_px(block.size_pt) as f32;
    let align = if block.centered {
        parley::Alignment::Center
    } else {
        parley::Alignment::Start
    };
    let layout = engine.layout_plain(block.text, size_px, TextBrush::WHITE, align)?;

    let (lw, lh) = (f64::from(layout.width()), f64::from(layout.height()));
    let anchor = map.place(block.anchor_in.0, block.anchor_in.1);

    let mut transform = kurbo::Affine::translate(anchor.to_vec2());
    if block.rotated {
        // Quarter turn clockwise in screen space: the text runs down the
        // spine, hanging from the anchor like the original's left-aligned
        // rotated labels.
        transform = transform * kurbo::Affine::rotate(FRAC_PI_2);
    }
    let offset = if block.centered {
        kurbo::Vec2::new(-lw / 2.0, -lh / 2.0)
    } else {
        kurbo::Vec2::new(0.0, -lh / 2.0)
    };
    transform = transform * kurbo::Affine::translate(offset);

    // Collect the positioned glyphs once; they are drawn twice (outline,
    // then fill).
    let mut runs: Vec<(f32, Vec<vello_cpu::Glyph>)> = Vec::new();
    for line in layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let glyphs = run
                .glyphs()
                .map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                })
                .collect();
            runs.push((run.run().font_size(), glyphs));
        }
    }

    ctx.set_transform(affine_to_cpu(transform));

    // Outline pass keeps the text legible over the busy field.
    ctx.set_stroke(vello_cpu::kurbo::Stroke::new(map.pt_to_px(TEXT_STROKE_PT)));
    ctx.set_paint(color_from_rgba8([0, 0, 0, 255]));
    for (font_size, glyphs) in &runs {
        ctx.glyph_run(font_data)
            .font_size(*font_size)
            .stroke_glyphs(glyphs.iter().cloned());
    }

    ctx.set_paint(color_from_rgba8([255, 255, 255, 255]));
    for (font_size, glyphs) in &runs {
        ctx.glyph_run(font_data)
            .font_size(*font_size)
            .fill_glyphs(glyphs.iter().cloned());
    }

    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    Ok(())
}

/// Dashed cyan alignment lines for the print shop: spine folds and trim
/// edges. Omitted from the final render path.
fn draw_guides(ctx: &mut vello_cpu::RenderContext, map: &CanvasMap) {
    let half_x = map.x_size_in / 2.0;
    let half_y = map.y_size_in / 2.0;

    let mut path = vello_cpu::kurbo::BezPath::new();
    let vline = |path: &mut vello_cpu::kurbo::BezPath, x_in: f64| {
        path.move_to(point_to_cpu(map.place(x_in, -half_y)));
        path.line_to(point_to_cpu(map.place(x_in, half_y)));
    };
    let hline = |path: &mut vello_cpu::kurbo::BezPath, y_in: f64| {
        path.move_to(point_to_cpu(map.place(-half_x, y_in)));
        path.line_to(point_to_cpu(map.place(half_x, y_in)));
    };

    for i in [-1.0, 1.0] {
        vline(&mut path, i * map.spine_in / 2.0);
        vline(&mut path, -i * half_x + i * map.margin_in);
        hline(&mut path, -i * half_y + i * map.margin_in);
    }

    let width = map.pt_to_px(GUIDE_LINE_PT);
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(color_from_rgba8([0, 255, 255, 255]));
    ctx.set_stroke(
        vello_cpu::kurbo::Stroke::new(width).with_dashes(0.0, [3.0 * width, 3.0 * width]),
    );
    ctx.stroke_path(&path);
}
