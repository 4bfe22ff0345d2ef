//! # ipynb2pdf
//!
//! Convert Jupyter notebooks (`.ipynb`) to A4 PDF files.
//!
//! The notebook is exported to a single self-contained HTML page (code,
//! narrative and outputs, with images inlined), a fixed print stylesheet is
//! prepended, and [wkhtmltopdf](https://wkhtmltopdf.org/) lays the page out
//! as A4 with equal margins on every side.
//!
//! ## Pipeline Overview
//!
//! ```text
//! .ipynb
//!  │
//!  ├─ 0. Check   input exists, wkhtmltopdf runs
//!  ├─ 1. Read    parse notebook JSON (nbformat 3 upgraded to 4)
//!  ├─ 2. Export  cells + outputs → HTML, images inlined as data: URIs
//!  ├─ 3. Style   prepend the A4 print stylesheet
//!  ├─ 4. Render  wkhtmltopdf <temp>_temp.html <output>.pdf
//!  └─ 5. Clean   remove the temporary HTML on every exit path
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ipynb2pdf::{convert, ConversionConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder().margin_mm(15).build()?;
//!     let pdf = convert("analysis.ipynb", None, &config)?;
//!     eprintln!("wrote {}", pdf.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Testing without wkhtmltopdf
//!
//! [`convert_with`] accepts any [`Renderer`]. Implement the trait with a
//! fake that records the argument list to exercise the whole pipeline
//! without spawning a process.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ipynb2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, DEFAULT_MARGIN_MM};
pub use convert::{convert, convert_with, default_output_path, export_html, inspect};
pub use error::Ipynb2PdfError;
pub use output::NotebookSummary;
pub use pipeline::export::HtmlExporter;
pub use pipeline::notebook::Notebook;
pub use pipeline::render::{render_args, RenderOutput, Renderer, WkhtmltopdfRenderer};
pub use progress::{ConversionProgressCallback, ConversionStage, NoopProgressCallback, ProgressCallback};
