//! Normalization of canvas items into point-space primitives.
//!
//! This is a pure per-item transform: geometry fields are scaled from
//! display pixels into PDF points with the page's per-axis factors, and
//! color strings are resolved to RGB. Items that cannot produce a drawable
//! primitive are reported with a [`SkipReason`] so the caller can drop them
//! without aborting the rest of the export.

use crate::color::{ParsedColor, Rgb, parse_hex_color};
use crate::geom::Scale;
use crate::model::{CanvasItem, ItemStyle};
use crate::overlay::{LinePrim, PolylinePrim, Primitive, ShapePrim, TextPrim};

/// Why a single canvas item was skipped.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// A path with fewer than 2 vertices — nothing to draw.
    DegeneratePath {
        /// How many vertices the path had.
        vertices: usize,
    },
    /// A text label with no content.
    EmptyText,
}

impl core::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::DegeneratePath { vertices } => {
                write!(f, "path with {vertices} vertices has nothing to draw")
            }
            Self::EmptyText => write!(f, "text label is empty"),
        }
    }
}

/// Resolve a stroke color string.
///
/// An absent stroke means the default black. The `#00000000` transparency
/// sentinel (any zero-alpha color) disables the stroke. A malformed string
/// degrades to black rather than dropping the item.
fn resolve_stroke(style: &ItemStyle) -> Option<Rgb> {
    match style.stroke.as_deref() {
        None => Some(Rgb::black()),
        Some(value) => match parse_hex_color(value) {
            Ok(ParsedColor::Opaque(rgb)) => Some(rgb),
            Ok(ParsedColor::Transparent) => None,
            Err(err) => {
                log::warn!("invalid stroke color {value:?} ({err}); using black");
                Some(Rgb::black())
            }
        },
    }
}

/// Resolve a fill color string. Absent, transparent, and malformed fills
/// all leave the interior unpainted.
fn resolve_fill(style: &ItemStyle) -> Option<Rgb> {
    match style.fill.as_deref() {
        None => None,
        Some(value) => match parse_hex_color(value) {
            Ok(ParsedColor::Opaque(rgb)) => Some(rgb),
            Ok(ParsedColor::Transparent) => None,
            Err(err) => {
                log::warn!("invalid fill color {value:?} ({err}); leaving unfilled");
                None
            }
        },
    }
}

/// Map one canvas item from display-pixel space into a point-space
/// primitive.
///
/// Geometry scales per axis; stroke widths scale by the smaller factor so
/// line thickness stays uniform; font sizes scale by the vertical factor,
/// treating type size as a vertical measurement (with non-uniform factors
/// this preserves line height rather than glyph width).
pub fn normalize(item: &CanvasItem, scale: Scale) -> Result<Primitive, SkipReason> {
    let line_width = item.style().stroke_width.max(0.0) * scale.uniform();

    match item {
        CanvasItem::Rect(shape) | CanvasItem::Ellipse(shape) => {
            let (left, top) = scale.map_point(shape.left, shape.top);
            let (width, height) = scale.map_point(shape.width, shape.height);
            let prim = ShapePrim {
                left,
                top,
                width,
                height,
                stroke: resolve_stroke(&shape.style),
                fill: resolve_fill(&shape.style),
                line_width,
            };

            Ok(match item {
                CanvasItem::Rect(_) => Primitive::Rect(prim),
                _ => Primitive::Ellipse(prim),
            })
        }
        CanvasItem::Line(line) => {
            let (x1, y1) = scale.map_point(line.x1, line.y1);
            let (x2, y2) = scale.map_point(line.x2, line.y2);
            Ok(Primitive::Line(LinePrim {
                from: [x1, y1],
                to: [x2, y2],
                stroke: resolve_stroke(&line.style),
                line_width,
            }))
        }
        CanvasItem::Path(path) => {
            if path.points.len() < 2 {
                return Err(SkipReason::DegeneratePath {
                    vertices: path.points.len(),
                });
            }

            let points = path
                .points
                .iter()
                .map(|p| {
                    let (x, y) = scale.map_point(p[0], p[1]);
                    [x, y]
                })
                .collect();

            Ok(Primitive::Polyline(PolylinePrim {
                points,
                stroke: resolve_stroke(&path.style),
                line_width,
            }))
        }
        CanvasItem::Text(text) => {
            if text.text.is_empty() {
                return Err(SkipReason::EmptyText);
            }

            let (left, top) = scale.map_point(text.left, text.top);
            Ok(Primitive::Text(TextPrim {
                left,
                top,
                text: text.text.clone(),
                size: text.font_size * scale.sy,
                font: text.font_family.clone(),
                // Text takes its color from the stroke channel; a bad or
                // transparent stroke still produces readable black text.
                color: resolve_stroke(&text.style).unwrap_or(Rgb::black()),
            }))
        }
    }
}
