use crate::assets::RenderAssets;
use crate::error::Error;
use crate::model::{Field, FieldValues, Point, Rect, StampStyle, TextAlign};

use super::plan::{LayoutPlan, RowKind};
use super::surface::{PageSurface, Stroke, TextStyle};

/// Inset of label/value text from the cell's left and top edges.
const TEXT_INSET_X: f32 = 3.0;
const TEXT_INSET_Y: f32 = 2.0;
/// Gap between the images and their cell borders.
const IMAGE_INSET: f32 = 2.0;
const SIGNATURE_RIGHT_INSET: f32 = 4.0;
const SIGNATURE_V_INSET: f32 = 6.0;

/// Where the signature goes in a row of height `row_h` starting at `row_top`:
/// scaled uniformly to `row_h - 6`, right-aligned, vertically centered.
pub fn signature_rect(
    col_split: f32,
    row_top: f32,
    row_h: f32,
    img_w: u32,
    img_h: u32,
    style: &StampStyle,
) -> Rect {
    let scale = (row_h - SIGNATURE_V_INSET).max(0.0) / img_h.max(1) as f32;
    let target_w = img_w as f32 * scale;
    let target_h = img_h as f32 * scale;
    let x1 = col_split + style.signature_col_width - SIGNATURE_RIGHT_INSET;
    let y0 = row_top + (row_h - target_h) / 2.0;
    Rect::new(x1 - target_w, y0, x1, y0 + target_h)
}

/// Cell of the trailing logo row, inset on every side.
pub fn logo_rect(plan: &LayoutPlan, style: &StampStyle) -> Rect {
    let r = plan.rect;
    let logo_h = plan.rows.last().map_or(style.row_height, |row| row.height);
    Rect::new(
        r.x0 + IMAGE_INSET,
        r.y1 - logo_h + IMAGE_INSET,
        r.x1 - IMAGE_INSET,
        r.y1 - IMAGE_INSET,
    )
}

/// Draws the table frame, separators, texts, signature and logo described by `plan`.
pub fn render_table(
    surface: &mut dyn PageSurface,
    plan: &LayoutPlan,
    fields: &FieldValues,
    assets: &RenderAssets,
    style: &StampStyle,
) -> Result<(), Error> {
    let r = plan.rect;
    let accent = Stroke {
        color: style.accent_color,
        width: style.separator_width,
    };
    let border = Stroke {
        color: style.accent_color,
        width: style.border_width,
    };
    let text = TextStyle {
        font_size: style.font_size,
        color: style.text_color,
        align: TextAlign::Left,
    };

    surface.draw_filled_rect(r, style.background, Some(border));

    let row_tops = plan.row_tops();
    for &y in &row_tops {
        surface.draw_line(Point::new(r.x0, y), Point::new(r.x1, y), accent);
    }
    let split = plan.col_split;
    surface.draw_line(Point::new(split, r.y0), Point::new(split, r.y1), accent);
    surface.draw_line(Point::new(r.x1, r.y0), Point::new(r.x1, r.y1), accent);

    for (row, &y) in plan.rows.iter().zip(&row_tops) {
        let RowKind::Field(field) = row.kind else {
            continue;
        };
        let h = row.height;
        log::debug!(
            "TABLE row={} row_h={:.2} width={:.2} top={:.2}",
            field.key(),
            h,
            row.content_width,
            y
        );

        let label_rect = Rect::new(r.x0 + TEXT_INSET_X, y + TEXT_INSET_Y, split - TEXT_INSET_Y, y + h);
        surface.insert_text(label_rect, row.label, text);

        let value = fields.get(field);
        match field {
            Field::Submitted => {
                let name_rect = Rect::new(
                    split + TEXT_INSET_X,
                    y + TEXT_INSET_Y,
                    split + style.signature_col_width - style.signature_reserve,
                    y + h,
                );
                surface.insert_text(name_rect, value, text);

                let sig = &assets.signature;
                let sig_rect = signature_rect(split, y, h, sig.width(), sig.height(), style);
                surface.insert_image(sig_rect, sig)?;
            }
            _ => {
                let content_rect = Rect::new(
                    split + TEXT_INSET_X,
                    y + TEXT_INSET_Y,
                    split + row.content_width - TEXT_INSET_X,
                    y + h,
                );
                match (field, &plan.project_lines) {
                    (Field::Project, Some(lines)) => {
                        surface.insert_text(content_rect, &lines.join("\n"), text);
                    }
                    _ => {
                        surface.insert_text(content_rect, value, text);
                    }
                }
            }
        }
    }

    let cell = logo_rect(plan, style);
    if !cell.is_empty() {
        let logo = assets
            .logo
            .resized(cell.width() as u32, cell.height() as u32);
        surface.insert_image(cell, &logo)?;
    }
    Ok(())
}
