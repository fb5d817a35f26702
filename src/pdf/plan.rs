use crate::model::{
    ContentBlock, Field, FieldValues, Placement, ProjectRowSizing, Rect, StampStyle,
};

use super::layout::wrap_text_with_safety;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RowKind {
    Field(Field),
    Logo,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlannedRow {
    pub kind: RowKind,
    pub label: &'static str,
    pub height: f32,
    pub content_width: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LayoutPlan {
    pub rows: Vec<PlannedRow>,
    pub rect: Rect,
    /// x of the separator between label and content columns.
    pub col_split: f32,
    /// Pre-wrapped project lines, present under [`ProjectRowSizing::WrappedLines`].
    pub project_lines: Option<Vec<String>>,
    margin: f32,
}

impl LayoutPlan {
    pub fn table_height(&self) -> f32 {
        self.rows.iter().map(|r| r.height).sum()
    }

    /// Sum of the label column and the widest content column.
    pub fn natural_width(&self) -> f32 {
        (self.col_split - self.rect.x0)
            + self
                .rows
                .iter()
                .map(|r| r.content_width)
                .fold(0.0f32, f32::max)
    }

    /// Distance overlapped content is moved up when the table is anchored at the bottom.
    pub fn reflow_shift(&self) -> f32 {
        self.table_height() + self.margin
    }

    /// Top edge of each row, in order.
    pub fn row_tops(&self) -> Vec<f32> {
        let mut y = self.rect.y0;
        self.rows
            .iter()
            .map(|r| {
                let top = y;
                y += r.height;
                top
            })
            .collect()
    }
}

fn size_rows(fields: &FieldValues, style: &StampStyle) -> (Vec<PlannedRow>, Option<Vec<String>>) {
    let mut rows = Vec::new();
    let mut project_lines = None;

    for field in fields.visible_fields() {
        let (height, content_width) = match field {
            Field::Project => match style.project_rows {
                ProjectRowSizing::Fixed(h) => (h, style.project_col_width),
                ProjectRowSizing::WrappedLines => {
                    let lines = wrap_text_with_safety(
                        fields.get(field),
                        style.project_col_width,
                        style.font_size,
                        style.wrap_safety,
                    );
                    let h = style.row_height * lines.len().max(1) as f32;
                    project_lines = Some(lines);
                    (h, style.project_col_width)
                }
            },
            Field::Submitted => (style.signature_row_height, style.signature_col_width),
            _ => (style.row_height, style.content_col_width),
        };
        rows.push(PlannedRow {
            kind: RowKind::Field(field),
            label: field.label(),
            height,
            content_width,
        });
    }

    rows.push(PlannedRow {
        kind: RowKind::Logo,
        label: "",
        height: style.row_height,
        content_width: style.project_col_width,
    });

    (rows, project_lines)
}

/// Lowest bottom edge among blocks starting in the upper half of the page.
fn top_content_floor(blocks: &[ContentBlock], page_height: f32, style: &StampStyle) -> f32 {
    blocks
        .iter()
        .filter(|b| b.rect.y0 < page_height / 2.0)
        .map(|b| b.rect.y1)
        .fold(None, |acc: Option<f32>, y| Some(acc.map_or(y, |a| a.max(y))))
        .unwrap_or(style.margin + style.top_gap)
}

/// Row geometry and table rectangle for one page.
pub fn plan_layout(
    fields: &FieldValues,
    placement: Placement,
    page_width: f32,
    page_height: f32,
    blocks: &[ContentBlock],
    style: &StampStyle,
) -> LayoutPlan {
    let (rows, project_lines) = size_rows(fields, style);
    let table_width = style.label_col_width
        + rows
            .iter()
            .map(|r| r.content_width)
            .fold(0.0f32, f32::max);
    let total_height: f32 = rows.iter().map(|r| r.height).sum();
    let margin = style.margin;

    let (left, top, right, bottom) = match placement {
        Placement::Footer => {
            let bottom = page_height - margin;
            (margin, bottom - total_height, page_width - margin, bottom)
        }
        Placement::BottomLeft => {
            let bottom = page_height - margin;
            (margin, bottom - total_height, margin + table_width, bottom)
        }
        Placement::BottomRight => {
            let bottom = page_height - margin;
            let right = page_width - margin;
            (right - table_width, bottom - total_height, right, bottom)
        }
        Placement::TopLeft | Placement::TopRight => {
            let top = top_content_floor(blocks, page_height, style) + style.top_gap;
            let bottom = top + total_height;
            if placement == Placement::TopLeft {
                (margin, top, margin + table_width, bottom)
            } else {
                let right = page_width - margin;
                (right - table_width, top, right, bottom)
            }
        }
    };

    let rect = Rect::new(left, top, right.max(left), bottom.max(top));
    log::debug!(
        "PLAN placement={placement} rows={} rect=({:.1},{:.1},{:.1},{:.1})",
        rows.len(),
        rect.x0,
        rect.y0,
        rect.x1,
        rect.y1
    );

    LayoutPlan {
        rows,
        rect,
        col_split: rect.x0 + style.label_col_width,
        project_lines,
        margin,
    }
}
