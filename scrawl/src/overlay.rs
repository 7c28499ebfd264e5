//! Point-space drawing primitives and their PDF content operators.
//!
//! Primitives are the normalized counterparts of canvas items: geometry in
//! PDF points, colors already parsed. Coordinates keep the annotation
//! space's top-left origin; the vertical flip into the PDF's bottom-left
//! space happens here, at draw time, so text is not mirrored by a flip
//! matrix.
//!
//! All primitives of one page are appended to a single content stream in
//! insertion order, so later shapes paint over earlier ones. Every
//! primitive is bracketed in save/restore so stroke state never leaks
//! between items.

use pdf_writer::types::{LineCapStyle, LineJoinStyle};
use pdf_writer::{Content, Name, Str};

use crate::color::Rgb;
use crate::geom::flip_y;

/// A rectangle or ellipse in point space, top-left origin.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapePrim {
    /// Left edge in points.
    pub left: f32,
    /// Top edge in points (top-left origin).
    pub top: f32,
    /// Width in points.
    pub width: f32,
    /// Height in points.
    pub height: f32,
    /// Border color; `None` draws no border.
    pub stroke: Option<Rgb>,
    /// Interior color; `None` leaves the interior unpainted.
    pub fill: Option<Rgb>,
    /// Border width in points.
    pub line_width: f32,
}

/// A straight line segment in point space.
#[derive(Debug, Clone, PartialEq)]
pub struct LinePrim {
    /// Start point `[x, y]`.
    pub from: [f32; 2],
    /// End point `[x, y]`.
    pub to: [f32; 2],
    /// Stroke color; `None` draws nothing.
    pub stroke: Option<Rgb>,
    /// Stroke width in points.
    pub line_width: f32,
}

/// A freehand polyline in point space.
#[derive(Debug, Clone, PartialEq)]
pub struct PolylinePrim {
    /// Vertices in draw order; always at least 2.
    pub points: Vec<[f32; 2]>,
    /// Stroke color; `None` draws nothing.
    pub stroke: Option<Rgb>,
    /// Stroke width in points.
    pub line_width: f32,
}

/// A single line of text in point space.
#[derive(Debug, Clone, PartialEq)]
pub struct TextPrim {
    /// Left edge in points.
    pub left: f32,
    /// Top edge in points (top-left origin).
    pub top: f32,
    /// The text content.
    pub text: String,
    /// Font size in points.
    pub size: f32,
    /// Requested font name, resolved against the font book at export time.
    pub font: Option<String>,
    /// Text color.
    pub color: Rgb,
}

/// A normalized annotation, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// An axis-aligned rectangle.
    Rect(ShapePrim),
    /// An ellipse inscribed in its bounding box.
    Ellipse(ShapePrim),
    /// A straight line segment.
    Line(LinePrim),
    /// A stroked polyline (no smoothing, straight segments only).
    Polyline(PolylinePrim),
    /// A text label.
    Text(TextPrim),
}

/// Draw a rectangle, filled first and stroked on top.
pub fn draw_rect(content: &mut Content, shape: &ShapePrim, page_height: f32) {
    let x = shape.left;
    let y = flip_y(shape.top + shape.height, page_height);

    content.save_state();

    if let Some(fill) = shape.fill {
        content
            .set_fill_rgb(fill.r, fill.g, fill.b)
            .rect(x, y, shape.width, shape.height)
            .fill_nonzero();
    }

    if let Some(stroke) = shape.stroke {
        content
            .set_stroke_rgb(stroke.r, stroke.g, stroke.b)
            .set_line_width(shape.line_width)
            .rect(x, y, shape.width, shape.height)
            .stroke();
    }

    content.restore_state();
}

/// Draw an ellipse inscribed in the shape's bounding box.
///
/// Approximated with four cubic Bézier curves.
pub fn draw_ellipse(content: &mut Content, shape: &ShapePrim, page_height: f32) {
    let cx = shape.left + shape.width / 2.0;
    let cy = flip_y(shape.top + shape.height / 2.0, page_height);
    let rx = shape.width / 2.0;
    let ry = shape.height / 2.0;

    // Magic number for Bézier circle approximation: 4/3 * (sqrt(2) - 1) ≈ 0.5523
    let kappa = 0.5523_f32;
    let kx = rx * kappa;
    let ky = ry * kappa;

    let draw_path = |content: &mut Content| {
        content.move_to(cx + rx, cy);
        content.cubic_to(cx + rx, cy + ky, cx + kx, cy + ry, cx, cy + ry);
        content.cubic_to(cx - kx, cy + ry, cx - rx, cy + ky, cx - rx, cy);
        content.cubic_to(cx - rx, cy - ky, cx - kx, cy - ry, cx, cy - ry);
        content.cubic_to(cx + kx, cy - ry, cx + rx, cy - ky, cx + rx, cy);
        content.close_path();
    };

    content.save_state();

    if let Some(fill) = shape.fill {
        content.set_fill_rgb(fill.r, fill.g, fill.b);
        draw_path(content);
        content.fill_nonzero();
    }

    if let Some(stroke) = shape.stroke {
        content
            .set_stroke_rgb(stroke.r, stroke.g, stroke.b)
            .set_line_width(shape.line_width);
        draw_path(content);
        content.stroke();
    }

    content.restore_state();
}

/// Draw a single stroked line segment.
pub fn draw_line(content: &mut Content, line: &LinePrim, page_height: f32) {
    let Some(stroke) = line.stroke else {
        return;
    };

    content.save_state();
    content
        .set_stroke_rgb(stroke.r, stroke.g, stroke.b)
        .set_line_width(line.line_width)
        .set_line_cap(LineCapStyle::RoundCap)
        .move_to(line.from[0], flip_y(line.from[1], page_height))
        .line_to(line.to[0], flip_y(line.to[1], page_height))
        .stroke();
    content.restore_state();
}

/// Draw a stroked polyline through all vertices in order.
pub fn draw_polyline(content: &mut Content, path: &PolylinePrim, page_height: f32) {
    let Some(stroke) = path.stroke else {
        return;
    };
    let Some(first) = path.points.first() else {
        return;
    };

    content.save_state();
    content
        .set_stroke_rgb(stroke.r, stroke.g, stroke.b)
        .set_line_width(path.line_width)
        .set_line_cap(LineCapStyle::RoundCap)
        .set_line_join(LineJoinStyle::RoundJoin);

    content.move_to(first[0], flip_y(first[1], page_height));
    for point in path.points.iter().skip(1) {
        content.line_to(point[0], flip_y(point[1], page_height));
    }
    content.stroke();
    content.restore_state();
}

/// Draw a single line of text.
///
/// The baseline sits at `top + size`: text operators anchor at the
/// baseline while the annotation space anchors at the top-left of the
/// label, and this offset keeps the export visually aligned with the
/// preview. `font_resource` must name a font in the page's resources and
/// `encoded_text` must already be encoded for that font.
pub fn draw_text(
    content: &mut Content,
    text: &TextPrim,
    page_height: f32,
    font_resource: Name<'_>,
    encoded_text: &[u8],
) {
    let baseline = flip_y(text.top + text.size, page_height);

    content.save_state();
    content.begin_text();
    content.set_font(font_resource, text.size);
    content.set_fill_rgb(text.color.r, text.color.g, text.color.b);
    content.next_line(text.left, baseline);
    content.show(Str(encoded_text));
    content.end_text();
    content.restore_state();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ops(content: Content) -> String {
        String::from_utf8_lossy(&content.finish().into_vec()).into_owned()
    }

    #[test]
    fn rect_fills_then_strokes() {
        let mut content = Content::new();
        draw_rect(
            &mut content,
            &ShapePrim {
                left: 100.0,
                top: 100.0,
                width: 50.0,
                height: 50.0,
                stroke: Some(Rgb::black()),
                fill: Some(Rgb::new(1.0, 0.0, 0.0)),
                line_width: 2.0,
            },
            842.0,
        );

        let s = ops(content);
        assert!(s.contains("rg"), "should set fill color: {s}");
        assert!(s.contains("re"), "should draw rectangle: {s}");
        assert!(s.contains("f"), "should fill: {s}");
        assert!(s.contains("RG"), "should set stroke color: {s}");
        assert!(s.contains("S"), "should stroke: {s}");
        // Fill comes before stroke so the border paints on top.
        assert!(s.find('f').unwrap() < s.rfind('S').unwrap());
        // top=100 h=50 on an 842pt page puts the lower edge at y=692.
        assert!(s.contains("692"), "should flip y: {s}");
    }

    #[test]
    fn rect_without_fill_only_strokes() {
        let mut content = Content::new();
        draw_rect(
            &mut content,
            &ShapePrim {
                left: 0.0,
                top: 0.0,
                width: 10.0,
                height: 10.0,
                stroke: Some(Rgb::black()),
                fill: None,
                line_width: 1.0,
            },
            100.0,
        );

        let s = ops(content);
        assert!(!s.contains("rg "), "no fill color expected: {s}");
        assert!(s.contains("S"), "should stroke: {s}");
    }

    #[test]
    fn ellipse_uses_cubic_curves() {
        let mut content = Content::new();
        draw_ellipse(
            &mut content,
            &ShapePrim {
                left: 100.0,
                top: 100.0,
                width: 80.0,
                height: 40.0,
                stroke: Some(Rgb::black()),
                fill: None,
                line_width: 1.0,
            },
            842.0,
        );

        let s = ops(content);
        assert!(s.contains("c"), "should have cubic curves: {s}");
        assert!(s.contains("S"), "should stroke: {s}");
    }

    #[test]
    fn polyline_strokes_all_vertices() {
        let mut content = Content::new();
        draw_polyline(
            &mut content,
            &PolylinePrim {
                points: vec![[10.0, 10.0], [20.0, 30.0], [40.0, 15.0]],
                stroke: Some(Rgb::new(1.0, 0.0, 0.0)),
                line_width: 2.0,
            },
            100.0,
        );

        let s = ops(content);
        assert!(s.contains("m"), "should have moveto: {s}");
        assert!(s.contains("l"), "should have lineto: {s}");
        assert!(s.contains("S"), "should stroke: {s}");
    }

    #[test]
    fn strokeless_primitives_emit_nothing() {
        let mut content = Content::new();
        draw_line(
            &mut content,
            &LinePrim {
                from: [0.0, 0.0],
                to: [10.0, 10.0],
                stroke: None,
                line_width: 1.0,
            },
            100.0,
        );
        assert!(ops(content).is_empty());
    }

    #[test]
    fn text_anchors_at_baseline() {
        let mut content = Content::new();
        draw_text(
            &mut content,
            &TextPrim {
                left: 50.0,
                top: 100.0,
                text: "hello".to_string(),
                size: 20.0,
                font: None,
                color: Rgb::black(),
            },
            842.0,
            Name(b"Helv"),
            b"hello",
        );

        let s = ops(content);
        assert!(s.contains("BT"), "should begin text: {s}");
        assert!(s.contains("Tf"), "should set font: {s}");
        assert!(s.contains("Tj"), "should show text: {s}");
        // Baseline at top + size = 120, flipped: 842 - 120 = 722.
        assert!(s.contains("722"), "baseline should be offset by size: {s}");
    }
}
