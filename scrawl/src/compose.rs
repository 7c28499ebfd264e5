//! Overlay composition: draws normalized annotations into page content.
//!
//! This module implements the export pipeline. The original document is
//! parsed with `hayro-syntax`, its pages are carried into a new document
//! with `hayro-write`, and pages that carry annotations get a fresh content
//! stream that paints the original page graphics first and the overlay
//! primitives after, in insertion order. The drawing lands in the page's
//! content layer — no `/Annots` objects are created.
//!
//! Problems scoped to one annotation or one page never abort the export:
//! they are skipped and surfaced as warnings, and a readable source
//! document always yields a complete output document.

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use hayro_syntax::Pdf;
use pdf_writer::{Chunk, Content, Filter, Finish, Name, Rect, Ref};

use crate::fonts::{ExportFonts, FontBook, encode_win_ansi};
use crate::geom::Scale;
use crate::model::PageDraft;
use crate::normalize::{SkipReason, normalize};
use crate::overlay::{Primitive, draw_ellipse, draw_line, draw_polyline, draw_rect, draw_text};

/// Resource name of the form XObject holding a page's original graphics.
const BACKDROP: &[u8] = b"Bg";

/// An error that aborts the whole export.
#[derive(Debug)]
pub enum ExportError {
    /// The original PDF could not be parsed. No partial output exists.
    UnreadablePdf,
    /// A page of the original could not be carried into the output.
    Extraction(usize),
}

impl core::fmt::Display for ExportError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnreadablePdf => write!(f, "unreadable PDF"),
            Self::Extraction(page) => write!(f, "page {page} could not be extracted"),
        }
    }
}

/// A non-fatal problem encountered during an export.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportWarning {
    /// A draft referenced a page beyond the document.
    PageOutOfRange {
        /// The requested page index.
        page: usize,
        /// The document's page count.
        page_count: usize,
    },
    /// A page's geometry could not be mapped; the page passed through.
    BadGeometry {
        /// The affected page index.
        page: usize,
    },
    /// A single annotation was skipped.
    SkippedItem {
        /// The affected page index.
        page: usize,
        /// The annotation's position in the page's draw order.
        index: usize,
        /// Why it was skipped.
        reason: SkipReason,
    },
    /// A requested font was substituted with the built-in fallback.
    FontFallback {
        /// The font name that could not be used.
        requested: String,
    },
}

impl core::fmt::Display for ExportWarning {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::PageOutOfRange { page, page_count } => {
                write!(f, "page {page} is outside the document ({page_count} pages)")
            }
            Self::BadGeometry { page } => {
                write!(f, "page {page} has unmappable geometry; passed through")
            }
            Self::SkippedItem {
                page,
                index,
                reason,
            } => write!(f, "item {index} on page {page} skipped: {reason}"),
            Self::FontFallback { requested } => {
                write!(f, "font {requested:?} not available; used Helvetica")
            }
        }
    }
}

/// The product of a successful export.
#[derive(Debug, Clone)]
pub struct ExportOutcome {
    /// Complete bytes of the new document.
    pub bytes: Vec<u8>,
    /// Non-fatal problems, in the order they were encountered.
    pub warnings: Vec<ExportWarning>,
}

/// Deflate-compress data.
pub(crate) fn deflate_encode(data: &[u8]) -> Vec<u8> {
    let mut e = ZlibEncoder::new(Vec::new(), Compression::new(6));
    e.write_all(data).unwrap();
    e.finish().unwrap()
}

/// A reference allocator that tracks the next available object number.
pub(crate) struct RefAllocator {
    next: i32,
}

impl RefAllocator {
    pub(crate) fn new(start: i32) -> Self {
        Self { next: start }
    }

    pub(crate) fn alloc(&mut self) -> Ref {
        let r = Ref::new(self.next);
        self.next += 1;
        r
    }
}

/// Normalize every draft up front so extraction knows which pages carry
/// overlays. Pages that end up with no drawable primitives are left out.
fn normalized_overlays(
    drafts: &BTreeMap<usize, PageDraft>,
    page_count: usize,
    warnings: &mut Vec<ExportWarning>,
) -> BTreeMap<usize, Vec<Primitive>> {
    let mut overlays = BTreeMap::new();

    for (&page, draft) in drafts {
        if draft.items.is_empty() {
            continue;
        }

        if page >= page_count {
            log::warn!("draft for page {page} is outside the {page_count}-page document");
            warnings.push(ExportWarning::PageOutOfRange { page, page_count });
            continue;
        }

        let scale = match Scale::for_page(&draft.geometry) {
            Ok(scale) => scale,
            Err(err) => {
                log::warn!("page {page}: {err}");
                warnings.push(ExportWarning::BadGeometry { page });
                continue;
            }
        };

        let mut primitives = Vec::with_capacity(draft.items.len());
        for (index, item) in draft.items.iter().enumerate() {
            match normalize(item, scale) {
                Ok(primitive) => primitives.push(primitive),
                Err(reason) => {
                    log::debug!("page {page} item {index} skipped: {reason}");
                    warnings.push(ExportWarning::SkippedItem {
                        page,
                        index,
                        reason,
                    });
                }
            }
        }

        if !primitives.is_empty() {
            overlays.insert(page, primitives);
        }
    }

    overlays
}

/// Draw canvas annotations into a document and return the new bytes.
///
/// `drafts` maps zero-based page indices to the page's preview geometry and
/// its annotations in draw order. Pages without drafts (and pages whose
/// draft produces nothing drawable) pass through unchanged; if nothing at
/// all is drawable the original bytes are returned as-is.
pub fn compose(
    original: &[u8],
    drafts: &BTreeMap<usize, PageDraft>,
    fonts: &FontBook,
) -> Result<ExportOutcome, ExportError> {
    let mut warnings = Vec::new();

    if drafts.values().all(|draft| draft.items.is_empty()) {
        return Ok(ExportOutcome {
            bytes: original.to_vec(),
            warnings,
        });
    }

    let pdf = Pdf::new(Arc::new(original.to_vec())).map_err(|_| ExportError::UnreadablePdf)?;
    let pages = pdf.pages();
    let page_count = pages.len();

    let overlays = normalized_overlays(drafts, page_count, &mut warnings);
    if overlays.is_empty() {
        return Ok(ExportOutcome {
            bytes: original.to_vec(),
            warnings,
        });
    }

    let mut alloc = RefAllocator::new(1);
    let catalog_ref = alloc.alloc();
    let page_tree_ref = alloc.alloc();

    // Untouched pages are carried over whole; annotated pages come along as
    // form XObjects so a fresh content stream can paint them first.
    let queries: Vec<hayro_write::ExtractionQuery> = (0..page_count)
        .map(|i| {
            if overlays.contains_key(&i) {
                hayro_write::ExtractionQuery::new_xobject(i)
            } else {
                hayro_write::ExtractionQuery::new_page(i)
            }
        })
        .collect();

    let extracted = hayro_write::extract(&pdf, Box::new(|| alloc.alloc()), &queries)
        .map_err(|_| ExportError::UnreadablePdf)?;

    let root_refs: Vec<Ref> = extracted
        .root_refs
        .iter()
        .enumerate()
        .map(|(i, r)| r.as_ref().map_err(|_| ExportError::Extraction(i)).copied())
        .collect::<Result<Vec<_>, _>>()?;

    let mut out_pdf = pdf_writer::Pdf::new();
    out_pdf.catalog(catalog_ref).pages(page_tree_ref);

    let mut overlay_chunk = Chunk::new();
    let mut export_fonts = ExportFonts::new(fonts);
    let mut kids: Vec<Ref> = Vec::with_capacity(page_count);

    for (page_index, page) in pages.iter().enumerate() {
        let extracted_ref = root_refs[page_index];

        let Some(primitives) = overlays.get(&page_index) else {
            kids.push(extracted_ref);
            continue;
        };

        let (page_width, page_height) = page.render_dimensions();
        let content_ref = alloc.alloc();
        let page_ref = alloc.alloc();

        let mut content = Content::new();
        content.save_state();
        content.x_object(Name(BACKDROP));
        content.restore_state();

        // Resource name → font object, for this page's resource dictionary.
        let mut page_fonts: BTreeMap<Vec<u8>, Ref> = BTreeMap::new();

        for primitive in primitives {
            match primitive {
                Primitive::Rect(shape) => draw_rect(&mut content, shape, page_height),
                Primitive::Ellipse(shape) => draw_ellipse(&mut content, shape, page_height),
                Primitive::Line(line) => draw_line(&mut content, line, page_height),
                Primitive::Polyline(path) => draw_polyline(&mut content, path, page_height),
                Primitive::Text(text) => {
                    let font = export_fonts.font_for(
                        text.font.as_deref(),
                        &mut overlay_chunk,
                        &mut alloc,
                        &mut warnings,
                    );
                    page_fonts.insert(font.resource.clone(), font.object);

                    let encoded = encode_win_ansi(&text.text);
                    draw_text(
                        &mut content,
                        text,
                        page_height,
                        Name(&font.resource),
                        &encoded,
                    );
                }
            }
        }

        let ops = content.finish().into_vec();
        let encoded = deflate_encode(&ops);
        let mut stream = overlay_chunk.stream(content_ref, &encoded);
        stream.filter(Filter::FlateDecode);
        stream.finish();

        let mut page_obj = overlay_chunk.page(page_ref);
        page_obj.parent(page_tree_ref);
        page_obj.media_box(Rect::new(0.0, 0.0, page_width, page_height));
        page_obj.contents(content_ref);

        let mut resources = page_obj.resources();
        resources.x_objects().pair(Name(BACKDROP), extracted_ref);
        if !page_fonts.is_empty() {
            let mut font_dict = resources.fonts();
            for (resource, font_ref) in &page_fonts {
                font_dict.pair(Name(resource), *font_ref);
            }
            font_dict.finish();
        }
        resources.finish();
        page_obj.finish();

        kids.push(page_ref);
    }

    out_pdf
        .pages(page_tree_ref)
        .kids(kids.iter().copied())
        .count(page_count as i32);

    out_pdf.extend(&extracted.chunk);
    out_pdf.extend(&overlay_chunk);

    Ok(ExportOutcome {
        bytes: out_pdf.finish(),
        warnings,
    })
}
