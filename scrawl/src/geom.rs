//! Coordinate space mapping between raster previews and PDF pages.
//!
//! The preview shown to a user is a raster image of the full page: no crop,
//! no rotation of its own, top-left origin, y-down, measured in pixels. PDF
//! pages are measured in points (1/72 inch) with a bottom-left origin. The
//! two spaces are related by independent per-axis scale factors and a
//! vertical flip — nothing else.
//!
//! The horizontal and vertical factors are computed separately because the
//! displayed bitmap may be stretched by a zoom percentage distinct from the
//! render DPI; uniform scale is never assumed.

/// The geometry of one page as displayed and as stored.
///
/// `pixel_*` are the dimensions of the preview bitmap the user actually
/// annotated against (after any zoom). `point_*` are the page's native size
/// in PDF points, fixed for the life of the document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// Width of the displayed bitmap in pixels.
    pub pixel_width: f32,
    /// Height of the displayed bitmap in pixels.
    pub pixel_height: f32,
    /// Native page width in PDF points.
    pub point_width: f32,
    /// Native page height in PDF points.
    pub point_height: f32,
}

impl PageGeometry {
    /// Create a page geometry from displayed pixel and native point sizes.
    pub fn new(pixel_width: f32, pixel_height: f32, point_width: f32, point_height: f32) -> Self {
        Self {
            pixel_width,
            pixel_height,
            point_width,
            point_height,
        }
    }

    /// Derive the geometry of the same bitmap displayed at a zoom
    /// percentage (100.0 = unchanged). Only the pixel dimensions change.
    pub fn with_zoom(self, percent: f32) -> Self {
        let factor = percent / 100.0;
        Self {
            pixel_width: self.pixel_width * factor,
            pixel_height: self.pixel_height * factor,
            ..self
        }
    }
}

/// A page geometry that cannot be mapped (zero, negative, or non-finite
/// dimensions — e.g. a page rendered at zero size).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidGeometry {
    /// The rejected geometry.
    pub geometry: PageGeometry,
}

impl core::fmt::Display for InvalidGeometry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let g = &self.geometry;
        write!(
            f,
            "unmappable page geometry: {}x{} px against {}x{} pt",
            g.pixel_width, g.pixel_height, g.point_width, g.point_height
        )
    }
}

/// The per-axis factors converting display pixels to PDF points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    /// Horizontal factor (points per pixel).
    pub sx: f32,
    /// Vertical factor (points per pixel).
    pub sy: f32,
}

impl Scale {
    /// Compute the scale factors for one page.
    ///
    /// Both factors are strictly positive and finite. This is computed once
    /// per page per export so that every annotation on the page maps with
    /// identical factors.
    pub fn for_page(geometry: &PageGeometry) -> Result<Self, InvalidGeometry> {
        let dims = [
            geometry.pixel_width,
            geometry.pixel_height,
            geometry.point_width,
            geometry.point_height,
        ];

        if dims.iter().any(|d| !d.is_finite() || *d <= 0.0) {
            return Err(InvalidGeometry {
                geometry: *geometry,
            });
        }

        Ok(Self {
            sx: geometry.point_width / geometry.pixel_width,
            sy: geometry.point_height / geometry.pixel_height,
        })
    }

    /// Map a display-pixel point into PDF points (top-left origin kept).
    pub fn map_point(&self, x: f32, y: f32) -> (f32, f32) {
        (x * self.sx, y * self.sy)
    }

    /// Inverse of [`Self::map_point`]: PDF points back to display pixels.
    pub fn unmap_point(&self, x: f32, y: f32) -> (f32, f32) {
        (x / self.sx, y / self.sy)
    }

    /// The single factor used for axis-free lengths such as stroke widths.
    pub fn uniform(&self) -> f32 {
        self.sx.min(self.sy)
    }
}

/// Flip a top-left-origin y coordinate into the PDF's bottom-left space.
pub fn flip_y(y: f32, page_height: f32) -> f32 {
    page_height - y
}
