//! Visual checks: the exported document is rasterized with `hayro` and
//! pixels are sampled to verify draw order and the transparency policy.

use std::collections::BTreeMap;
use std::sync::Arc;

use hayro::RenderSettings;
use hayro::hayro_interpret::InterpreterSettings;
use scrawl::{CanvasItem, FontBook, ItemStyle, PageDraft, PageGeometry, ShapeItem, compose};

const PAGE: f32 = 200.0;

/// A blank single-page PDF with a small square page.
fn create_blank_pdf() -> Vec<u8> {
    use pdf_writer::{Finish, Pdf, Rect, Ref};

    let catalog_id = Ref::new(1);
    let page_tree_id = Ref::new(2);
    let page_id = Ref::new(3);

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id).kids([page_id]).count(1);

    let mut page = pdf.page(page_id);
    page.parent(page_tree_id);
    page.media_box(Rect::new(0.0, 0.0, PAGE, PAGE));
    page.resources();
    page.finish();

    pdf.finish()
}

fn identity_draft(items: Vec<CanvasItem>) -> BTreeMap<usize, PageDraft> {
    BTreeMap::from([(
        0,
        PageDraft {
            geometry: PageGeometry::new(PAGE, PAGE, PAGE, PAGE),
            items,
        },
    )])
}

fn filled_rect(left: f32, top: f32, size: f32, fill: &str) -> CanvasItem {
    CanvasItem::Rect(ShapeItem {
        style: ItemStyle {
            // The transparency sentinel disables the border so fills can
            // be sampled without stroke interference.
            stroke: Some("#00000000".to_string()),
            stroke_width: 2.0,
            fill: Some(fill.to_string()),
        },
        left,
        top,
        width: size,
        height: size,
    })
}

/// Render page 0 of a document at scale 1 and return its RGBA pixels.
fn render(bytes: Vec<u8>) -> (u32, u32, Vec<u8>) {
    let pdf = hayro_syntax::Pdf::new(Arc::new(bytes)).expect("exported PDF should parse");
    let page = &pdf.pages()[0];

    let settings = RenderSettings {
        x_scale: 1.0,
        y_scale: 1.0,
        ..Default::default()
    };
    let pixmap = hayro::render(page, &InterpreterSettings::default(), &settings);
    let width: u32 = pixmap.width().into();
    let height: u32 = pixmap.height().into();
    let rgba: Vec<u8> = bytemuck::cast_vec(pixmap.take_unpremultiplied());

    (width, height, rgba)
}

/// Sample one pixel; x/y use the preview's top-left origin.
fn pixel(rgba: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
    let idx = ((y * width + x) * 4) as usize;
    [rgba[idx], rgba[idx + 1], rgba[idx + 2], rgba[idx + 3]]
}

fn export(items: Vec<CanvasItem>) -> Vec<u8> {
    let input = create_blank_pdf();
    let outcome = compose(&input, &identity_draft(items), &FontBook::empty())
        .expect("export should succeed");
    outcome.bytes
}

#[test]
fn filled_rect_paints_its_interior() {
    let bytes = export(vec![filled_rect(50.0, 50.0, 100.0, "#ff0000")]);
    let (width, _, rgba) = render(bytes);

    let [r, g, b, a] = pixel(&rgba, width, 100, 100);
    assert!(a > 200, "interior should be opaque, got alpha {a}");
    assert!(r > 200 && g < 60 && b < 60, "expected red, got {r},{g},{b}");

    // Outside the rect nothing red was painted.
    let [r, g, b, _] = pixel(&rgba, width, 10, 10);
    assert!(
        !(r > 200 && g < 60 && b < 60),
        "corner should not be red, got {r},{g},{b}"
    );
}

#[test]
fn later_shapes_paint_over_earlier_ones() {
    // Three overlapping squares, drawn red then green then blue. All three
    // cover the sample point; the last one drawn must win.
    let bytes = export(vec![
        filled_rect(10.0, 10.0, 100.0, "#ff0000"),
        filled_rect(30.0, 30.0, 100.0, "#00ff00"),
        filled_rect(50.0, 50.0, 100.0, "#0000ff"),
    ]);
    let (width, _, rgba) = render(bytes);

    let [r, g, b, a] = pixel(&rgba, width, 80, 80);
    assert!(a > 200, "overlap should be opaque, got alpha {a}");
    assert!(
        b > 200 && r < 60 && g < 60,
        "expected the last-drawn blue on top, got {r},{g},{b}"
    );

    // A spot only the first square covers stays red.
    let [r, g, b, _] = pixel(&rgba, width, 20, 20);
    assert!(r > 200 && g < 60 && b < 60, "expected red, got {r},{g},{b}");
}

#[test]
fn transparent_sentinel_fill_paints_nothing() {
    // RGB channels of the sentinel are black; if alpha were ignored this
    // square would render solid black.
    let bytes = export(vec![filled_rect(50.0, 50.0, 100.0, "#00000000")]);
    let (width, _, rgba) = render(bytes);

    let [r, g, b, a] = pixel(&rgba, width, 100, 100);
    assert!(
        !(a > 200 && r < 60 && g < 60 && b < 60),
        "sentinel fill must not paint black pixels, got {r},{g},{b},{a}"
    );
}

#[test]
fn stroked_line_renders_along_its_geometry() {
    use scrawl::LineItem;

    let line = CanvasItem::Line(LineItem {
        style: ItemStyle {
            stroke: Some("#000000".to_string()),
            stroke_width: 6.0,
            fill: None,
        },
        x1: 20.0,
        y1: 150.0,
        x2: 180.0,
        y2: 150.0,
    });
    let bytes = export(vec![line]);
    let (width, _, rgba) = render(bytes);

    // On the line (top-left origin y = 150).
    let [r, g, b, a] = pixel(&rgba, width, 100, 150);
    assert!(
        a > 200 && r < 60 && g < 60 && b < 60,
        "expected black line pixel, got {r},{g},{b},{a}"
    );

    // Well away from it, nothing black.
    let [r, g, b, a] = pixel(&rgba, width, 100, 60);
    assert!(
        !(a > 200 && r < 60 && g < 60 && b < 60),
        "off-line pixel should not be black, got {r},{g},{b},{a}"
    );
}
