/*!
A crate for drawing canvas annotations into PDF pages.

Annotations are drawn by a user on a raster preview of a PDF page and arrive
as a JSON-friendly list of shapes in display-pixel space (top-left origin,
y-down). This crate maps them into the page's native point space, draws them
as vector content directly on top of the existing page graphics, and
produces a complete new PDF.

It is built on the `hayro` ecosystem of PDF crates: `hayro-syntax` for
reading existing PDF structure, `hayro-write` for carrying original pages
into the output, `pdf-writer` for generating new PDF objects, and `hayro`
itself for rasterizing the previews users annotate against.
*/

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod color;
mod compose;
mod fonts;
mod geom;
mod model;
mod normalize;
mod overlay;
mod preview;
mod session;

pub use color::*;
pub use compose::*;
pub use fonts::*;
pub use geom::*;
pub use model::*;
pub use normalize::*;
pub use overlay::*;
pub use preview::*;
pub use session::*;
