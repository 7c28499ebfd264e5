//! The pixel-space annotation model.
//!
//! These types mirror the JSON objects produced by the browser-side drawing
//! surface and are the stable wire contract between it and the export
//! operation: a `kind` tag, camelCase geometry fields in display-pixel
//! space, and optional stroke/fill color strings.

use serde::{Deserialize, Serialize};

use crate::geom::PageGeometry;

fn default_stroke_width() -> f32 {
    2.0
}

fn default_font_size() -> f32 {
    14.0
}

/// Style fields shared by every annotation kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemStyle {
    /// Stroke color string; absent means the default black stroke.
    #[serde(default)]
    pub stroke: Option<String>,
    /// Stroke width in display pixels.
    #[serde(rename = "strokeWidth", default = "default_stroke_width")]
    pub stroke_width: f32,
    /// Fill color string; absent means no fill.
    #[serde(default)]
    pub fill: Option<String>,
}

impl Default for ItemStyle {
    fn default() -> Self {
        Self {
            stroke: None,
            stroke_width: default_stroke_width(),
            fill: None,
        }
    }
}

/// A rectangle or ellipse bounding box, top-left origin, y-down.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeItem {
    /// Common style fields.
    #[serde(flatten)]
    pub style: ItemStyle,
    /// Left edge in display pixels.
    pub left: f32,
    /// Top edge in display pixels.
    pub top: f32,
    /// Width in display pixels.
    pub width: f32,
    /// Height in display pixels.
    pub height: f32,
}

/// A straight line segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    /// Common style fields.
    #[serde(flatten)]
    pub style: ItemStyle,
    /// First endpoint x.
    pub x1: f32,
    /// First endpoint y.
    pub y1: f32,
    /// Second endpoint x.
    pub x2: f32,
    /// Second endpoint y.
    pub y2: f32,
}

/// A freehand path: ordered vertices joined by straight segments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathItem {
    /// Common style fields.
    #[serde(flatten)]
    pub style: ItemStyle,
    /// Path vertices as `[x, y]` pairs; at least 2 to be renderable.
    pub points: Vec<[f32; 2]>,
}

/// A single-line text label anchored at its top-left corner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextItem {
    /// Common style fields (the stroke color doubles as the text color).
    #[serde(flatten)]
    pub style: ItemStyle,
    /// Left edge in display pixels.
    pub left: f32,
    /// Top edge in display pixels.
    pub top: f32,
    /// The text content.
    pub text: String,
    /// Font size in display pixels.
    #[serde(rename = "fontSize", default = "default_font_size")]
    pub font_size: f32,
    /// Font file name to resolve through the font book, if any.
    #[serde(rename = "fontFamily", default)]
    pub font_family: Option<String>,
}

/// A canvas annotation in display-pixel space.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CanvasItem {
    /// An axis-aligned rectangle.
    Rect(ShapeItem),
    /// An ellipse inscribed in its bounding box.
    Ellipse(ShapeItem),
    /// A straight line segment.
    Line(LineItem),
    /// A freehand polyline.
    Path(PathItem),
    /// A text label.
    Text(TextItem),
}

impl CanvasItem {
    /// Get the common style fields.
    pub fn style(&self) -> &ItemStyle {
        match self {
            Self::Rect(s) | Self::Ellipse(s) => &s.style,
            Self::Line(l) => &l.style,
            Self::Path(p) => &p.style,
            Self::Text(t) => &t.style,
        }
    }
}

/// Everything the export needs for one page: the geometry of the preview
/// the user annotated against and the items in the order they were drawn.
#[derive(Debug, Clone)]
pub struct PageDraft {
    /// Geometry of the displayed preview bitmap.
    pub geometry: PageGeometry,
    /// Annotations in insertion order (later items draw on top).
    pub items: Vec<CanvasItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format_roundtrips() {
        let json = r##"[
            {"kind": "rect", "left": 10.0, "top": 20.0, "width": 30.0, "height": 40.0,
             "stroke": "#111827", "strokeWidth": 3.0, "fill": "#00000000"},
            {"kind": "path", "points": [[0.0, 0.0], [5.0, 5.0], [10.0, 0.0]]},
            {"kind": "line", "x1": 1.0, "y1": 2.0, "x2": 3.0, "y2": 4.0},
            {"kind": "text", "left": 5.0, "top": 6.0, "text": "hi",
             "fontSize": 20.0, "fontFamily": "Sarabun-Regular.ttf"}
        ]"##;

        let items: Vec<CanvasItem> = serde_json::from_str(json).unwrap();
        assert_eq!(items.len(), 4);

        let CanvasItem::Rect(rect) = &items[0] else {
            panic!("expected rect, got {:?}", items[0]);
        };
        assert_eq!(rect.left, 10.0);
        assert_eq!(rect.style.stroke_width, 3.0);
        assert_eq!(rect.style.fill.as_deref(), Some("#00000000"));

        let CanvasItem::Path(path) = &items[1] else {
            panic!("expected path");
        };
        assert_eq!(path.points.len(), 3);
        // Unspecified style fields take their defaults.
        assert_eq!(path.style.stroke_width, 2.0);
        assert!(path.style.stroke.is_none());

        let CanvasItem::Text(text) = &items[3] else {
            panic!("expected text");
        };
        assert_eq!(text.font_size, 20.0);
        assert_eq!(text.font_family.as_deref(), Some("Sarabun-Regular.ttf"));
    }

    #[test]
    fn serialized_items_keep_wire_names() {
        let item = CanvasItem::Text(TextItem {
            style: ItemStyle::default(),
            left: 1.0,
            top: 2.0,
            text: "x".to_string(),
            font_size: 12.0,
            font_family: None,
        });

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["kind"], "text");
        assert_eq!(value["fontSize"], 12.0);
        assert_eq!(value["strokeWidth"], 2.0);
    }

    #[test]
    fn page_map_uses_numeric_keys() {
        use std::collections::BTreeMap;

        let json = r##"{"0": [{"kind": "line", "x1": 0.0, "y1": 0.0, "x2": 1.0, "y2": 1.0}],
                        "2": []}"##;
        let pages: BTreeMap<usize, Vec<CanvasItem>> = serde_json::from_str(json).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[&0].len(), 1);
        assert!(pages[&2].is_empty());
    }
}
