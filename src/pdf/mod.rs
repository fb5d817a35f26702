mod extract;
mod layout;
mod plan;
mod reflow;
mod resources;
mod surface;
mod table;

use lopdf::Document;

use crate::assets::RenderAssets;
use crate::error::Error;
use crate::model::{FieldValues, Placement, StampStyle};

pub use layout::{wrap_text, wrap_text_with_safety};
pub use plan::{LayoutPlan, PlannedRow, RowKind, plan_layout};
pub use reflow::reflow_overlapping;
pub use surface::{
    LopdfPage, PageSurface, PlacedLine, ResourceRegistry, Stroke, TextStyle, layout_textbox,
};
pub use table::{logo_rect, render_table, signature_rect};

/// Plan, reflow (bottom anchors only) and render the title block on one page.
pub fn stamp_page(
    surface: &mut dyn PageSurface,
    fields: &FieldValues,
    assets: &RenderAssets,
    placement: Placement,
    style: &StampStyle,
) -> Result<LayoutPlan, Error> {
    let (page_w, page_h) = surface.size();
    let blocks = surface.content_blocks();
    let plan = plan_layout(fields, placement, page_w, page_h, &blocks, style);

    if placement.reflows() {
        let moved = reflow_overlapping(surface, plan.rect, plan.reflow_shift(), style);
        if moved > 0 {
            log::debug!("moved {moved} overlapping block(s) up by {:.1}", plan.reflow_shift());
        }
    }

    render_table(surface, &plan, fields, assets, style)?;
    Ok(plan)
}

/// Stamp every page of `input` and return the serialized result.
pub fn stamp(
    input: &[u8],
    fields: &FieldValues,
    assets: &RenderAssets,
    placement: Placement,
    style: &StampStyle,
) -> Result<Vec<u8>, Error> {
    let mut doc = Document::load_mem(input).map_err(|e| Error::DocumentOpen(e.to_string()))?;
    if doc.is_encrypted() {
        return Err(Error::DocumentOpen("document is encrypted".into()));
    }
    let pages = doc.get_pages();
    if pages.is_empty() {
        return Err(Error::DocumentOpen("document has no pages".into()));
    }

    let mut registry = ResourceRegistry::new();
    for (page_no, page_id) in pages {
        let mut page = LopdfPage::open(&mut doc, &mut registry, page_id);
        let plan = stamp_page(&mut page, fields, assets, placement, style)?;
        page.commit()?;
        log::debug!(
            "page {page_no}: {} rows, table {:.1}x{:.1}",
            plan.rows.len(),
            plan.rect.width(),
            plan.rect.height()
        );
    }

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| Error::Pdf(format!("failed to save PDF: {e}")))?;
    Ok(out)
}
