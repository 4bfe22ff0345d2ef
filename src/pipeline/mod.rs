//! Pipeline stages for notebook-to-PDF conversion.
//!
//! Each submodule implements exactly one transformation step, so each is
//! testable on its own and the renderer can be swapped without touching
//! the rest.
//!
//! ## Data Flow
//!
//! ```text
//! notebook ──▶ export ──▶ style ──▶ render
//!  (.ipynb)    (HTML)     (A4 CSS)  (wkhtmltopdf)
//! ```
//!
//! 1. [`notebook`] — read the `.ipynb` JSON, upgrading nbformat 3 to 4
//! 2. [`export`]   — serialise cells and outputs to self-contained HTML
//! 3. [`style`]    — prepend the fixed A4 print stylesheet
//! 4. [`render`]   — run wkhtmltopdf on the intermediate HTML file

pub mod export;
pub mod notebook;
pub mod render;
pub mod style;
