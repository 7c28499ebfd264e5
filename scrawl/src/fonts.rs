//! Font resolution and embedding.
//!
//! A [`FontBook`] maps font display names to embeddable `.ttf`/`.otf`
//! files, typically scanned from a fonts directory. During one export, each
//! resolved font is loaded and embedded into the output document exactly
//! once and shared by every text annotation that references it; a font that
//! cannot be resolved or parsed falls back to the built-in Helvetica with a
//! warning, never a hard failure.
//!
//! Embedded fonts use WinAnsi encoding; text is encoded to those single
//! bytes before showing, with unmappable characters replaced by `?`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use pdf_writer::{Chunk, Filter, Finish, Name, Ref};
use skrifa::instance::{LocationRef, Size};
use skrifa::{FontRef, MetadataProvider};

use crate::compose::{ExportWarning, RefAllocator, deflate_encode};

/// A lookup from font display names to embeddable font files.
#[derive(Debug, Clone, Default)]
pub struct FontBook {
    entries: BTreeMap<String, PathBuf>,
}

impl FontBook {
    /// An empty book: every lookup falls back to the built-in font.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Scan a directory for `.ttf`/`.otf` files, keyed by file name.
    ///
    /// A missing or unreadable directory yields an empty book.
    pub fn scan_dir(dir: &Path) -> Self {
        let mut book = Self::empty();

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                log::debug!("font directory {} not read: {err}", dir.display());
                return book;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let is_font = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("ttf") || ext.eq_ignore_ascii_case("otf"));

            if is_font {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    book.entries.insert(name.to_string(), path.clone());
                }
            }
        }

        book
    }

    /// Register a font file under a display name.
    pub fn insert(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) {
        self.entries.insert(name.into(), path.into());
    }

    /// The registered display names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Whether the book has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a font file by display name (exact file name first, then by
    /// file stem, so `Sarabun-Regular` finds `Sarabun-Regular.ttf`).
    pub fn resolve(&self, name: &str) -> Option<&Path> {
        if let Some(path) = self.entries.get(name) {
            return Some(path);
        }

        self.entries
            .iter()
            .find(|(key, _)| {
                Path::new(key)
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .is_some_and(|stem| stem == name)
            })
            .map(|(_, path)| path.as_path())
    }
}

/// An error loading a font file for embedding.
#[derive(Debug)]
pub enum FontError {
    /// The name is not in the font book.
    Unresolved,
    /// The font file could not be read.
    Unreadable(String),
    /// The font data was rejected by the parser.
    Unparsable(String),
}

impl core::fmt::Display for FontError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Unresolved => write!(f, "no matching font file"),
            Self::Unreadable(err) => write!(f, "font file not readable: {err}"),
            Self::Unparsable(err) => write!(f, "font data not parsable: {err}"),
        }
    }
}

/// WinAnsi code points above the ASCII range that differ from Latin-1.
const WIN_ANSI_EXTRA: &[(u8, char)] = &[
    (0x80, '€'),
    (0x82, '‚'),
    (0x83, 'ƒ'),
    (0x84, '„'),
    (0x85, '…'),
    (0x86, '†'),
    (0x87, '‡'),
    (0x88, 'ˆ'),
    (0x89, '‰'),
    (0x8A, 'Š'),
    (0x8B, '‹'),
    (0x8C, 'Œ'),
    (0x8E, 'Ž'),
    (0x91, '‘'),
    (0x92, '’'),
    (0x93, '“'),
    (0x94, '”'),
    (0x95, '•'),
    (0x96, '–'),
    (0x97, '—'),
    (0x98, '˜'),
    (0x99, '™'),
    (0x9A, 'š'),
    (0x9B, '›'),
    (0x9C, 'œ'),
    (0x9E, 'ž'),
    (0x9F, 'Ÿ'),
];

/// The character a WinAnsi code represents, if any.
fn win_ansi_char(code: u8) -> Option<char> {
    match code {
        0x20..=0x7E => Some(code as char),
        0xA0..=0xFF => char::from_u32(u32::from(code)),
        _ => WIN_ANSI_EXTRA
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, ch)| *ch),
    }
}

/// Encode text as WinAnsi bytes; unmappable characters become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch {
            ' '..='~' => ch as u8,
            '\u{A0}'..='\u{FF}' => ch as u8,
            _ => WIN_ANSI_EXTRA
                .iter()
                .find(|(_, c)| *c == ch)
                .map(|(code, _)| *code)
                .unwrap_or(b'?'),
        })
        .collect()
}

/// A PDF name usable as `/BaseFont`, derived from a display name.
fn sanitize_base_name(name: &str) -> String {
    let cleaned: String = Path::new(name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(name)
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '-'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "Embedded".to_string()
    } else {
        cleaned
    }
}

/// Write a TrueType font (dictionary, descriptor, and font program) into
/// the chunk and return the font dictionary reference.
fn embed_truetype(
    chunk: &mut Chunk,
    alloc: &mut RefAllocator,
    data: &[u8],
    display_name: &str,
) -> Result<Ref, FontError> {
    let font = FontRef::new(data).map_err(|err| FontError::Unparsable(err.to_string()))?;

    // All metrics scaled to the PDF glyph space of 1000 units per em.
    let size = Size::new(1000.0);
    let location = LocationRef::default();
    let metrics = font.metrics(size, location);
    let glyph_metrics = font.glyph_metrics(size, location);
    let charmap = font.charmap();

    let mut widths = [0.0_f32; 224];
    for code in 32..=255_u16 {
        let Some(ch) = win_ansi_char(code as u8) else {
            continue;
        };
        if let Some(gid) = charmap.map(ch) {
            widths[usize::from(code - 32)] = glyph_metrics.advance_width(gid).unwrap_or(0.0);
        }
    }

    let base_name = sanitize_base_name(display_name);
    let font_ref = alloc.alloc();
    let descriptor_ref = alloc.alloc();
    let file_ref = alloc.alloc();

    let mut font_dict = chunk.indirect(font_ref).dict();
    font_dict.pair(Name(b"Type"), Name(b"Font"));
    font_dict.pair(Name(b"Subtype"), Name(b"TrueType"));
    font_dict.pair(Name(b"BaseFont"), Name(base_name.as_bytes()));
    font_dict.pair(Name(b"FirstChar"), 32);
    font_dict.pair(Name(b"LastChar"), 255);
    font_dict
        .insert(Name(b"Widths"))
        .array()
        .items(widths.iter().copied());
    font_dict.pair(Name(b"Encoding"), Name(b"WinAnsiEncoding"));
    font_dict.pair(Name(b"FontDescriptor"), descriptor_ref);
    font_dict.finish();

    let bbox = metrics.bounds.map_or([0.0, -200.0, 1000.0, 1000.0], |b| {
        [b.x_min, b.y_min, b.x_max, b.y_max]
    });

    let mut descriptor = chunk.indirect(descriptor_ref).dict();
    descriptor.pair(Name(b"Type"), Name(b"FontDescriptor"));
    descriptor.pair(Name(b"FontName"), Name(base_name.as_bytes()));
    // Bit 6: nonsymbolic (uses a standard character set).
    descriptor.pair(Name(b"Flags"), 32);
    descriptor.insert(Name(b"FontBBox")).array().items(bbox);
    descriptor.pair(Name(b"ItalicAngle"), 0);
    descriptor.pair(Name(b"Ascent"), metrics.ascent);
    descriptor.pair(Name(b"Descent"), metrics.descent);
    descriptor.pair(
        Name(b"CapHeight"),
        metrics.cap_height.unwrap_or(metrics.ascent),
    );
    descriptor.pair(Name(b"StemV"), 80);
    descriptor.pair(Name(b"FontFile2"), file_ref);
    descriptor.finish();

    let compressed = deflate_encode(data);
    let mut stream = chunk.stream(file_ref, &compressed);
    stream.filter(Filter::FlateDecode);
    stream.pair(Name(b"Length1"), data.len() as i32);
    stream.finish();

    Ok(font_ref)
}

/// A font embedded into the output document.
#[derive(Debug, Clone)]
pub(crate) struct EmbeddedFont {
    /// The resource name the content stream selects the font by.
    pub(crate) resource: Vec<u8>,
    /// The font dictionary object.
    pub(crate) object: Ref,
}

/// The per-export font cache.
///
/// Lives for one export call: each requested name is resolved and embedded
/// at most once, fallbacks are memoized so a missing font warns once, and
/// the whole cache is discarded when the export completes.
pub(crate) struct ExportFonts<'a> {
    book: &'a FontBook,
    by_request: BTreeMap<Option<String>, usize>,
    entries: Vec<EmbeddedFont>,
    fallback: Option<usize>,
}

impl<'a> ExportFonts<'a> {
    pub(crate) fn new(book: &'a FontBook) -> Self {
        Self {
            book,
            by_request: BTreeMap::new(),
            entries: Vec::new(),
            fallback: None,
        }
    }

    /// The embedded font for a text annotation's requested name.
    ///
    /// `None` selects the built-in fallback directly; unknown or broken
    /// fonts select it with a warning.
    pub(crate) fn font_for(
        &mut self,
        request: Option<&str>,
        chunk: &mut Chunk,
        alloc: &mut RefAllocator,
        warnings: &mut Vec<ExportWarning>,
    ) -> &EmbeddedFont {
        let key = request.map(str::to_string);
        if let Some(&idx) = self.by_request.get(&key) {
            return &self.entries[idx];
        }

        let idx = match request {
            Some(name) => match self.try_embed(name, chunk, alloc) {
                Ok(idx) => idx,
                Err(err) => {
                    log::warn!("font {name:?} unavailable ({err}); using Helvetica");
                    warnings.push(ExportWarning::FontFallback {
                        requested: name.to_string(),
                    });
                    self.fallback_font(chunk, alloc)
                }
            },
            None => self.fallback_font(chunk, alloc),
        };

        self.by_request.insert(key, idx);
        &self.entries[idx]
    }

    fn try_embed(
        &mut self,
        name: &str,
        chunk: &mut Chunk,
        alloc: &mut RefAllocator,
    ) -> Result<usize, FontError> {
        let path = self.book.resolve(name).ok_or(FontError::Unresolved)?;
        let data = std::fs::read(path).map_err(|err| FontError::Unreadable(err.to_string()))?;
        let object = embed_truetype(chunk, alloc, &data, name)?;

        let resource = format!("F{}", self.entries.len()).into_bytes();
        self.entries.push(EmbeddedFont { resource, object });
        Ok(self.entries.len() - 1)
    }

    /// The built-in Helvetica base font, written at most once per export.
    fn fallback_font(&mut self, chunk: &mut Chunk, alloc: &mut RefAllocator) -> usize {
        if let Some(idx) = self.fallback {
            return idx;
        }

        let font_ref = alloc.alloc();
        let mut font_dict = chunk.indirect(font_ref).dict();
        font_dict.pair(Name(b"Type"), Name(b"Font"));
        font_dict.pair(Name(b"Subtype"), Name(b"Type1"));
        font_dict.pair(Name(b"BaseFont"), Name(b"Helvetica"));
        font_dict.pair(Name(b"Encoding"), Name(b"WinAnsiEncoding"));
        font_dict.finish();

        self.entries.push(EmbeddedFont {
            resource: b"Helv".to_vec(),
            object: font_ref,
        });
        let idx = self.entries.len() - 1;
        self.fallback = Some(idx);
        idx
    }
}
