//! Conversion entry points.
//!
//! [`convert`] is the whole pipeline with the real wkhtmltopdf renderer;
//! [`convert_with`] takes any [`Renderer`] so the pipeline can run against
//! a fake. [`export_html`] and [`inspect`] stop before the renderer and
//! therefore work without wkhtmltopdf installed.
//!
//! The intermediate HTML lives in a [`tempfile::NamedTempFile`] created next
//! to the input notebook, named `<stem>_<random>_temp.html`. Dropping the
//! handle deletes the file, so every exit path after its creation cleans up,
//! and two conversions of the same notebook never share a temp file.

use crate::config::ConversionConfig;
use crate::error::Ipynb2PdfError;
use crate::output::NotebookSummary;
use crate::pipeline::export::HtmlExporter;
use crate::pipeline::notebook::{self, Notebook};
use crate::pipeline::render::{self, Renderer, WkhtmltopdfRenderer};
use crate::pipeline::style;
use crate::progress::ConversionStage;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, error, info, warn};

/// Suffix of the intermediate HTML file.
pub const TEMP_HTML_SUFFIX: &str = "_temp.html";

/// Convert a notebook to an A4 PDF using wkhtmltopdf.
///
/// # Arguments
/// * `input`  — path to the `.ipynb` file
/// * `output` — PDF path; `None` means `input` with a `.pdf` extension
/// * `config` — conversion configuration
///
/// # Returns
/// The path the PDF was written to.
///
/// # Errors
/// - [`Ipynb2PdfError::InputNotFound`] before anything else happens
/// - [`Ipynb2PdfError::RendererMissing`] when wkhtmltopdf does not run
/// - [`Ipynb2PdfError::MalformedNotebook`] for unparseable input
/// - [`Ipynb2PdfError::RendererFailed`] when wkhtmltopdf exits non-zero
pub fn convert(
    input: impl AsRef<Path>,
    output: Option<&Path>,
    config: &ConversionConfig,
) -> Result<PathBuf, Ipynb2PdfError> {
    let renderer = WkhtmltopdfRenderer::from_config(config);
    convert_with(&renderer, input, output, config)
}

/// Convert a notebook to PDF with an explicit [`Renderer`].
pub fn convert_with<R: Renderer + ?Sized>(
    renderer: &R,
    input: impl AsRef<Path>,
    output: Option<&Path>,
    config: &ConversionConfig,
) -> Result<PathBuf, Ipynb2PdfError> {
    let input = input.as_ref();
    let result = run_pipeline(renderer, input, output, config);

    if let Some(ref cb) = config.progress_callback {
        match &result {
            Ok(path) => cb.on_conversion_complete(path),
            Err(e) => cb.on_conversion_error(&e.to_string()),
        }
    }
    result
}

/// Read a notebook and return the styled HTML that would be handed to the
/// renderer. Does not need wkhtmltopdf.
pub fn export_html(input: impl AsRef<Path>, config: &ConversionConfig) -> Result<String, Ipynb2PdfError> {
    let input = input.as_ref();
    require_input(input)?;
    let notebook = notebook::read_notebook(input)?;
    Ok(styled_html(input, &notebook, config))
}

/// Summarise a notebook without converting it. Does not need wkhtmltopdf.
pub fn inspect(input: impl AsRef<Path>) -> Result<NotebookSummary, Ipynb2PdfError> {
    let input = input.as_ref();
    require_input(input)?;
    let notebook = notebook::read_notebook(input)?;
    Ok(NotebookSummary::from_notebook(input, &notebook))
}

/// The PDF path used when none is given: `input` with its extension
/// replaced by `pdf` (or added, if it has none).
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("pdf")
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn run_pipeline<R: Renderer + ?Sized>(
    renderer: &R,
    input: &Path,
    output: Option<&Path>,
    config: &ConversionConfig,
) -> Result<PathBuf, Ipynb2PdfError> {
    let stage = |s: ConversionStage| {
        debug!("Stage: {}", s);
        if let Some(ref cb) = config.progress_callback {
            cb.on_stage(s);
        }
    };

    // ── Preconditions ────────────────────────────────────────────────────
    require_input(input)?;
    if !renderer.is_available() {
        return Err(Ipynb2PdfError::RendererMissing {
            hint: wkhtmltopdf_locate::install_hint(),
        });
    }

    // ── Step 1: Resolve output path ──────────────────────────────────────
    let output_path = resolve_output_path(input, output)?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(input);
    }

    // ── Step 2: Parse notebook ───────────────────────────────────────────
    info!("Reading notebook: {}", input.display());
    let notebook = notebook::read_notebook(input)?;
    stage(ConversionStage::Parsed);

    // ── Step 3-4: Export and style HTML ──────────────────────────────────
    info!("Converting to HTML...");
    let html = styled_html(input, &notebook, config);
    stage(ConversionStage::RenderedHtml);

    // ── Step 5: Write intermediate HTML ──────────────────────────────────
    ensure_parent_dir(&output_path)?;
    let temp = write_temp_html(input, &html)?;
    debug!("Wrote {} bytes to {}", html.len(), temp.path().display());

    // ── Step 6: Invoke renderer ──────────────────────────────────────────
    info!("Converting to A4 PDF: {}", output_path.display());
    let args = render::render_args(temp.path(), &output_path, config.margin_mm);
    debug!("Renderer args: {:?}", args);
    let outcome = renderer.run(&args);

    // ── Step 8: Remove intermediate HTML (before inspecting the outcome) ─
    remove_temp(temp);

    // ── Step 7: Check renderer result ────────────────────────────────────
    let rendered = outcome.map_err(|source| Ipynb2PdfError::RendererSpawn {
        program: renderer.program().to_path_buf(),
        source,
    })?;
    if !rendered.success() {
        error!("Error during PDF conversion: {}", rendered.stderr.trim());
        return Err(Ipynb2PdfError::RendererFailed {
            code: rendered.code,
            stderr: rendered.stderr.trim().to_string(),
        });
    }
    stage(ConversionStage::PdfInvoked);

    // ── Step 9: Done ─────────────────────────────────────────────────────
    stage(ConversionStage::Done);
    info!("PDF generated successfully: {}", output_path.display());
    Ok(output_path)
}

fn require_input(input: &Path) -> Result<(), Ipynb2PdfError> {
    if input.exists() {
        Ok(())
    } else {
        Err(Ipynb2PdfError::InputNotFound {
            path: input.to_path_buf(),
        })
    }
}

fn resolve_output_path(input: &Path, output: Option<&Path>) -> Result<PathBuf, Ipynb2PdfError> {
    let path = match output {
        Some(p) => p.to_path_buf(),
        None => default_output_path(input),
    };
    if path == input {
        return Err(Ipynb2PdfError::OutputIsInput { path });
    }
    Ok(path)
}

/// Export + print CSS, titled from notebook metadata or the file stem.
fn styled_html(input: &Path, notebook: &Notebook, config: &ConversionConfig) -> String {
    let title = notebook
        .title()
        .map(str::to_string)
        .unwrap_or_else(|| file_stem(input));
    let exporter = HtmlExporter {
        exclude_input: config.exclude_input,
        embed_images: config.embed_images,
        base_dir: input_dir(input).to_path_buf(),
    };
    style::with_print_css(&exporter.from_notebook(notebook, &title))
}

fn file_stem(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Notebook".to_string())
}

/// Directory containing `input`; `.` for bare file names.
fn input_dir(input: &Path) -> &Path {
    match input.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

fn ensure_parent_dir(output: &Path) -> Result<(), Ipynb2PdfError> {
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            std::fs::create_dir_all(parent).map_err(|e| Ipynb2PdfError::OutputWriteFailed {
                path: output.to_path_buf(),
                source: e,
            })
        }
        _ => Ok(()),
    }
}

/// Create the intermediate HTML next to the input, so relative resources
/// the renderer may still need resolve the same way they do for the
/// notebook.
fn write_temp_html(input: &Path, html: &str) -> Result<NamedTempFile, Ipynb2PdfError> {
    let prefix = format!("{}_", file_stem(input));
    let mut temp = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(TEMP_HTML_SUFFIX)
        .tempfile_in(input_dir(input))
        .map_err(|source| Ipynb2PdfError::TempFile { source })?;

    temp.write_all(html.as_bytes())
        .and_then(|()| temp.flush())
        .map_err(|source| Ipynb2PdfError::TempFile { source })?;
    Ok(temp)
}

fn remove_temp(temp: NamedTempFile) {
    let path = temp.path().to_path_buf();
    match temp.close() {
        Ok(()) => debug!("Removed {}", path.display()),
        Err(e) => warn!("Failed to remove temporary file {}: {}", path.display(), e),
    }
}
