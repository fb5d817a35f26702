mod common;

use common::{Op, RecordingSurface, all_fields, assert_close, assets};
use titleblock_pdf::{
    ContentBlock, Placement, Rect, StampStyle, plan_layout, reflow_overlapping, stamp_page,
};

fn block(x0: f32, y0: f32, x1: f32, y1: f32, text: &str) -> ContentBlock {
    ContentBlock {
        rect: Rect::new(x0, y0, x1, y1),
        text: text.to_string(),
    }
}

#[test]
fn nothing_overlapping_leaves_the_page_alone() {
    let mut surface = RecordingSurface::letter(vec![block(50.0, 50.0, 200.0, 62.0, "Heading")]);
    let table = Rect::new(252.0, 746.0, 602.0, 782.0);
    let moved = reflow_overlapping(&mut surface, table, 46.0, &StampStyle::default());
    assert_eq!(moved, 0);
    assert!(surface.ops.is_empty());
}

#[test]
fn touching_edges_do_not_count_as_overlap() {
    let table = Rect::new(252.0, 746.0, 602.0, 782.0);
    let mut surface = RecordingSurface::letter(vec![
        block(100.0, 734.0, 252.0, 760.0, "left neighbour"),
        block(300.0, 700.0, 500.0, 746.0, "sits on top edge"),
    ]);
    assert_eq!(reflow_overlapping(&mut surface, table, 46.0, &StampStyle::default()), 0);
}

#[test]
fn all_blocks_are_erased_before_any_is_redrawn() {
    let table = Rect::new(10.0, 552.0, 602.0, 782.0);
    let mut surface = RecordingSurface::letter(vec![
        block(50.0, 560.0, 300.0, 572.0, "first"),
        block(50.0, 600.0, 300.0, 612.0, "second"),
        block(50.0, 100.0, 300.0, 112.0, "untouched"),
    ]);
    let style = StampStyle::default();
    let moved = reflow_overlapping(&mut surface, table, 240.0, &style);

    assert_eq!(moved, 2);
    let kinds: Vec<&str> = surface
        .ops
        .iter()
        .map(|op| match op {
            Op::Rect { .. } => "rect",
            Op::Text { .. } => "text",
            Op::Line { .. } => "line",
            Op::Image { .. } => "image",
        })
        .collect();
    assert_eq!(kinds, vec!["rect", "rect", "text", "text"]);

    match &surface.ops[0] {
        Op::Rect { rect, fill, stroke } => {
            assert_eq!(*rect, Rect::new(50.0, 560.0, 300.0, 572.0));
            assert_eq!(*fill, style.background);
            assert_eq!(stroke.map(|s| s.color), Some(style.background));
        }
        other => panic!("expected erase rect, got {other:?}"),
    }

    let texts = surface.texts();
    assert_eq!(texts[0].1, "first");
    assert_eq!(texts[1].1, "second");
    assert!(texts.iter().all(|(_, t)| t != "untouched"));
}

#[test]
fn footer_moves_overlapped_block_up_by_table_height_plus_margin() {
    let style = StampStyle::default();
    let fields = all_fields();
    let plan = plan_layout(&fields, Placement::Footer, 612.0, 792.0, &[], &style);

    assert_close(plan.table_height(), 230.0);
    assert_close(plan.reflow_shift(), 240.0);
    assert_eq!(plan.rect, Rect::new(10.0, 552.0, 602.0, 782.0));

    let mut surface = RecordingSurface::letter(vec![block(72.0, 600.0, 400.0, 612.0, "Body text")]);
    let stamped = stamp_page(&mut surface, &fields, &assets(), Placement::Footer, &style)
        .expect("stamp page");
    assert_eq!(stamped.rect, plan.rect);

    let (rect, _) = surface
        .texts()
        .into_iter()
        .find(|(_, t)| t == "Body text")
        .expect("block redrawn");
    assert_close(rect.y0, 360.0);
    assert_close(rect.y1, 372.0);
    assert_close(rect.x0, 72.0);
}

#[test]
fn top_placements_never_reflow() {
    let style = StampStyle::default();
    let blocks = vec![block(50.0, 30.0, 400.0, 80.0, "Heading")];
    for placement in [Placement::TopLeft, Placement::TopRight] {
        let mut surface = RecordingSurface::letter(blocks.clone());
        let plan = stamp_page(&mut surface, &all_fields(), &assets(), placement, &style)
            .expect("stamp page");
        assert!(plan.rect.y0 >= 80.0);
        assert!(surface.texts().iter().all(|(_, t)| t != "Heading"));
    }
}

#[test]
fn moved_block_keeps_its_size() {
    let table = Rect::new(252.0, 700.0, 602.0, 782.0);
    let original = Rect::new(300.0, 710.0, 580.0, 740.0);
    let mut surface = RecordingSurface::letter(vec![ContentBlock {
        rect: original,
        text: "Notes:\nsee sheet 2".into(),
    }]);
    reflow_overlapping(&mut surface, table, 92.0, &StampStyle::default());

    let (rect, text) = surface.texts().remove(0);
    assert_eq!(text, "Notes:\nsee sheet 2");
    assert_close(rect.width(), original.width());
    assert_close(rect.height(), original.height());
    assert_close(rect.y0, 618.0);
}
