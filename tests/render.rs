mod common;

use common::{Op, RecordingSurface, all_fields, assert_close, assets};
use titleblock_pdf::{
    Field, FieldValues, ImageRole, Placement, Rect, StampStyle, logo_rect, plan_layout,
    render_table, signature_rect,
};

fn render(fields: &FieldValues, placement: Placement, style: &StampStyle) -> RecordingSurface {
    let mut surface = RecordingSurface::letter(Vec::new());
    let plan = plan_layout(fields, placement, 612.0, 792.0, &[], style);
    render_table(&mut surface, &plan, fields, &assets(), style).expect("render");
    surface
}

#[test]
fn frame_and_separators_per_row() {
    let style = StampStyle::default();
    let fields = all_fields();
    let surface = render(&fields, Placement::BottomRight, &style);
    let rows = fields.visible_fields().count() + 1;

    // one line at every row top, plus the column split and right edge
    assert_eq!(surface.lines(), rows + 2);

    match &surface.ops[0] {
        Op::Rect { fill, stroke, .. } => {
            assert_eq!(*fill, style.background);
            let stroke = stroke.expect("table border");
            assert_eq!(stroke.color, style.accent_color);
            assert_close(stroke.width, 1.0);
        }
        other => panic!("table frame should be drawn first, got {other:?}"),
    }
    for op in &surface.ops {
        if let Op::Line { stroke, .. } = op {
            assert_close(stroke.width, 0.8);
        }
    }
}

#[test]
fn label_and_value_per_visible_row() {
    let fields = FieldValues::new()
        .with(Field::DrawingNumber, "D-7")
        .with(Field::Client, "Port of Oslo")
        .with(Field::Checked, "K. L.");
    let surface = render(&fields, Placement::BottomLeft, &StampStyle::default());

    let texts: Vec<String> = surface.texts().into_iter().map(|(_, t)| t).collect();
    assert_eq!(
        texts,
        vec!["DR. NO.", "D-7", "CLIENT", "Port of Oslo", "CHECKED BY", "K. L."]
    );
}

#[test]
fn text_is_inset_from_cell_edges() {
    let style = StampStyle::default();
    let fields = FieldValues::new().with(Field::Title, "Site plan");
    let surface = render(&fields, Placement::BottomRight, &style);
    let plan = plan_layout(&fields, Placement::BottomRight, 612.0, 792.0, &[], &style);

    let texts = surface.texts();
    let (label, _) = &texts[0];
    let (value, _) = &texts[1];
    assert_close(label.x0, plan.rect.x0 + 3.0);
    assert_close(label.y0, plan.rect.y0 + 2.0);
    assert_close(value.x0, plan.col_split + 3.0);
    assert_close(value.x1, plan.col_split + 180.0 - 3.0);
    assert_close(value.y1, plan.rect.y0 + 18.0);
}

#[test]
fn project_value_is_drawn_from_wrapped_lines() {
    let project = (1..=50).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ");
    let fields = FieldValues::new().with(Field::Project, project);
    let style = StampStyle::default();
    let plan = plan_layout(&fields, Placement::BottomRight, 612.0, 792.0, &[], &style);
    let surface = render(&fields, Placement::BottomRight, &style);

    let expected = plan.project_lines.expect("wrapped").join("\n");
    assert!(surface.texts().iter().any(|(_, t)| *t == expected));
}

#[test]
fn signature_scaled_right_aligned_and_centered() {
    let style = StampStyle::default();
    let rect = signature_rect(300.0, 500.0, 50.0, 200, 100, &style);

    assert_close(rect.height(), 44.0);
    assert_close(rect.width(), 88.0);
    assert_close(rect.x1, 300.0 + 260.0 - 4.0);
    assert_close(rect.y0, 503.0);
    assert_close(rect.y1, 547.0);
}

#[test]
fn submitted_row_carries_name_and_signature() {
    let style = StampStyle::default();
    let fields = FieldValues::new().with(Field::Submitted, "A. Engineer");
    let plan = plan_layout(&fields, Placement::BottomRight, 612.0, 792.0, &[], &style);
    let surface = render(&fields, Placement::BottomRight, &style);

    let (name_rect, _) = surface
        .texts()
        .into_iter()
        .find(|(_, t)| t == "A. Engineer")
        .expect("name drawn");
    assert_close(name_rect.x1, plan.col_split + 260.0 - 60.0);

    let images = surface.images();
    let (sig_rect, role, w, h) = images[0];
    assert_eq!(role, ImageRole::Signature);
    assert_eq!((w, h), (200, 100));
    assert_eq!(sig_rect, signature_rect(plan.col_split, plan.rect.y0, 50.0, 200, 100, &style));
}

#[test]
fn logo_fills_last_row_and_is_resampled_to_cell() {
    let style = StampStyle::default();
    let fields = FieldValues::new().with(Field::DrawingNumber, "D-100");
    let plan = plan_layout(&fields, Placement::BottomRight, 612.0, 792.0, &[], &style);
    let cell = logo_rect(&plan, &style);

    assert_eq!(cell, Rect::new(254.0, 766.0, 600.0, 780.0));

    let surface = render(&fields, Placement::BottomRight, &style);
    let images = surface.images();
    assert_eq!(images.len(), 1);
    let (rect, role, w, h) = images[0];
    assert_eq!(role, ImageRole::Logo);
    assert_eq!(rect, cell);
    assert_eq!((w, h), (346, 14));
}

#[test]
fn only_logo_when_nothing_is_filled() {
    let surface = render(&FieldValues::new(), Placement::Footer, &StampStyle::default());
    assert!(surface.texts().is_empty());
    assert_eq!(surface.images().len(), 1);
    assert_eq!(surface.lines(), 3);
}
