mod assets;
mod error;
mod fonts;
mod model;
mod pdf;

pub use assets::{ImageRole, PreparedImage, RenderAssets, prepare_image};
pub use error::Error;
pub use fonts::text_width;
pub use model::{
    ContentBlock, FIELDS, Field, FieldValues, Placement, Point, ProjectRowSizing, Rect, Rgb,
    StampStyle, TextAlign,
};
pub use pdf::{
    LayoutPlan, LopdfPage, PageSurface, PlacedLine, PlannedRow, ResourceRegistry, RowKind,
    Stroke, TextStyle, layout_textbox, logo_rect, plan_layout, reflow_overlapping, render_table,
    signature_rect, stamp, stamp_page, wrap_text, wrap_text_with_safety,
};

use std::path::Path;
use std::time::Instant;

/// Stamp the PDF at `input` with the title block and write the result to `output`.
pub fn stamp_pdf(
    input: &Path,
    logo: &Path,
    signature: &Path,
    output: &Path,
    fields: &FieldValues,
    placement: Placement,
    style: &StampStyle,
) -> Result<(), Error> {
    let t0 = Instant::now();

    let assets = RenderAssets::from_paths(logo, signature)?;
    let t_assets = t0.elapsed();

    let data = std::fs::read(input).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", e, input.display()),
        ))
    })?;
    let bytes = pdf::stamp(&data, fields, &assets, placement, style)?;
    let t_stamp = t0.elapsed();

    std::fs::write(output, &bytes).map_err(Error::Io)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: assets={:.1}ms, stamp={:.1}ms, write={:.1}ms, total={:.1}ms (output {} bytes)",
        t_assets.as_secs_f64() * 1000.0,
        (t_stamp - t_assets).as_secs_f64() * 1000.0,
        (t_total - t_stamp).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        bytes.len(),
    );

    Ok(())
}

/// In-memory variant of [`stamp_pdf`]: images and document as bytes.
pub fn stamp_pdf_bytes(
    input: &[u8],
    logo: &[u8],
    signature: &[u8],
    fields: &FieldValues,
    placement: Placement,
    style: &StampStyle,
) -> Result<Vec<u8>, Error> {
    let t0 = Instant::now();

    let assets = RenderAssets::load(logo, signature)?;
    let t_assets = t0.elapsed();

    let bytes = pdf::stamp(input, fields, &assets, placement, style)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: assets={:.1}ms, stamp={:.1}ms, total={:.1}ms (output {} bytes)",
        t_assets.as_secs_f64() * 1000.0,
        (t_total - t_assets).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        bytes.len(),
    );

    Ok(bytes)
}
