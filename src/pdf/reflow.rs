use crate::model::{Rect, StampStyle, TextAlign};

use super::surface::{PageSurface, Stroke, TextStyle};

/// Moves every content block that overlaps `table` up by `shift`.
///
/// Blocks are collected once; all of them are erased before any is redrawn, so
/// a redrawn block is never painted over by a later erase. Text that no longer
/// fits its translated box is clipped. Returns the number of blocks moved.
pub fn reflow_overlapping(
    surface: &mut dyn PageSurface,
    table: Rect,
    shift: f32,
    style: &StampStyle,
) -> usize {
    let overlapping: Vec<_> = surface
        .content_blocks()
        .into_iter()
        .filter(|b| b.rect.intersects(&table))
        .collect();
    if overlapping.is_empty() {
        return 0;
    }

    let erase = Stroke {
        color: style.background,
        width: style.border_width,
    };
    for block in &overlapping {
        surface.draw_filled_rect(block.rect, style.background, Some(erase));
    }

    let text_style = TextStyle {
        font_size: style.font_size,
        color: style.text_color,
        align: TextAlign::Left,
    };
    for block in &overlapping {
        let moved = block.rect.translated(0.0, -shift);
        log::debug!(
            "REFLOW block ({:.1},{:.1},{:.1},{:.1}) -> top {:.1}: {:?}",
            block.rect.x0,
            block.rect.y0,
            block.rect.x1,
            block.rect.y1,
            moved.y0,
            block.text
        );
        surface.insert_text(moved, &block.text, text_style);
    }

    overlapping.len()
}
