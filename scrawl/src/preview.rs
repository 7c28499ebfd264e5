//! Page rasterization for annotatable previews.
//!
//! The preview a user draws on is produced here, together with the
//! [`PageGeometry`] the export will later map against — both derived from
//! the same render, so the coordinates a canvas reports line up with the
//! factors used at export time.

use hayro::RenderSettings;
use hayro::hayro_interpret::InterpreterSettings;
use hayro_syntax::Pdf;

use crate::geom::PageGeometry;

/// A rasterized page preview.
#[derive(Debug, Clone)]
pub struct Preview {
    /// Bitmap width in pixels.
    pub pixel_width: u32,
    /// Bitmap height in pixels.
    pub pixel_height: u32,
    /// RGBA pixel data, row-major from the top-left, unpremultiplied.
    pub rgba: Vec<u8>,
    /// The geometry tying this bitmap to the page's point space.
    pub geometry: PageGeometry,
}

/// An error producing a preview.
#[derive(Debug, Clone, PartialEq)]
pub enum PreviewError {
    /// The page index is outside the document.
    PageOutOfRange {
        /// The requested page index.
        page: usize,
        /// The document's page count.
        page_count: usize,
    },
    /// DPI and zoom do not combine to a usable scale factor.
    InvalidScale {
        /// Requested render resolution.
        dpi: f32,
        /// Requested zoom percentage.
        zoom: f32,
    },
}

impl core::fmt::Display for PreviewError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::PageOutOfRange { page, page_count } => {
                write!(f, "page {page} is outside the document ({page_count} pages)")
            }
            Self::InvalidScale { dpi, zoom } => {
                write!(f, "dpi {dpi} at zoom {zoom}% is not a usable scale")
            }
        }
    }
}

fn combined_scale(dpi: f32, zoom_percent: f32) -> Option<f32> {
    // 72 dpi is scale 1.0; the zoom percentage stretches the display size
    // on top of the render resolution.
    let scale = dpi / 72.0 * (zoom_percent / 100.0);
    (scale.is_finite() && scale > 0.0).then_some(scale)
}

/// The display geometry a preview of this page would have, without
/// rendering it.
///
/// Useful when the bitmap was produced earlier (or by another process) and
/// only the mapping factors are needed at export time.
pub fn page_geometry(
    pdf: &Pdf,
    page_index: usize,
    dpi: f32,
    zoom_percent: f32,
) -> Result<PageGeometry, PreviewError> {
    let pages = pdf.pages();
    let page = pages.get(page_index).ok_or(PreviewError::PageOutOfRange {
        page: page_index,
        page_count: pages.len(),
    })?;
    let scale = combined_scale(dpi, zoom_percent).ok_or(PreviewError::InvalidScale {
        dpi,
        zoom: zoom_percent,
    })?;

    let (point_width, point_height) = page.render_dimensions();
    Ok(PageGeometry::new(
        point_width * scale,
        point_height * scale,
        point_width,
        point_height,
    ))
}

/// Rasterize one page at a render resolution and zoom percentage.
pub fn render_preview(
    pdf: &Pdf,
    page_index: usize,
    dpi: f32,
    zoom_percent: f32,
) -> Result<Preview, PreviewError> {
    let pages = pdf.pages();
    let page = pages.get(page_index).ok_or(PreviewError::PageOutOfRange {
        page: page_index,
        page_count: pages.len(),
    })?;
    let scale = combined_scale(dpi, zoom_percent).ok_or(PreviewError::InvalidScale {
        dpi,
        zoom: zoom_percent,
    })?;

    let (point_width, point_height) = page.render_dimensions();
    let render_settings = RenderSettings {
        x_scale: scale,
        y_scale: scale,
        ..Default::default()
    };

    let pixmap = hayro::render(page, &InterpreterSettings::default(), &render_settings);
    let pixel_width: u32 = pixmap.width().into();
    let pixel_height: u32 = pixmap.height().into();
    let rgba: Vec<u8> = bytemuck::cast_vec(pixmap.take_unpremultiplied());

    Ok(Preview {
        pixel_width,
        pixel_height,
        rgba,
        // Geometry reflects the bitmap actually produced, so annotations
        // drawn on it map back exactly.
        geometry: PageGeometry::new(
            pixel_width as f32,
            pixel_height as f32,
            point_width,
            point_height,
        ),
    })
}
