//! Error types for the ipynb2pdf library.
//!
//! Every failure is fatal: the pipeline has no partial-success mode, so a
//! single [`Ipynb2PdfError`] is returned from the top-level `convert*`
//! functions and the caller receives the first error encountered.
//!
//! The variants are grouped by the stage that raises them so callers can
//! tell "nothing happened" failures (input, dependency, config) from
//! failures that occurred after the intermediate HTML was written.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the ipynb2pdf library.
#[derive(Debug, Error)]
pub enum Ipynb2PdfError {
    // ── Precondition errors ───────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'")]
    InputNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The wkhtmltopdf executable is missing or does not run.
    #[error("wkhtmltopdf is not installed. {hint}")]
    RendererMissing { hint: String },

    /// The resolved output path would overwrite the input notebook.
    #[error("Output path '{path}' is the same as the input; pass --output explicitly")]
    OutputIsInput { path: PathBuf },

    // ── Notebook errors ───────────────────────────────────────────────────
    /// The file is not valid notebook JSON.
    #[error("Notebook '{path}' is malformed: {detail}")]
    MalformedNotebook { path: PathBuf, detail: String },

    /// The notebook declares an nbformat major version we cannot read.
    #[error("Notebook '{path}' uses nbformat {version}; only versions 3 and 4 are supported")]
    UnsupportedNbformat { path: PathBuf, version: u64 },

    /// Reading the notebook failed after the file was found.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Renderer errors ───────────────────────────────────────────────────
    /// wkhtmltopdf could not be spawned.
    #[error("Failed to start '{program}': {source}")]
    RendererSpawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// wkhtmltopdf exited non-zero.
    #[error("Error during PDF conversion (exit code {}): {stderr}", display_code(.code))]
    RendererFailed { code: Option<i32>, stderr: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the intermediate HTML file.
    #[error("Failed to write temporary HTML file: {source}")]
    TempFile {
        #[source]
        source: std::io::Error,
    },

    /// Could not create the output location or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Ipynb2PdfError {
    /// Classify an I/O error raised while opening the input notebook.
    pub(crate) fn from_input_io(path: PathBuf, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => Ipynb2PdfError::InputNotFound { path },
            std::io::ErrorKind::PermissionDenied => Ipynb2PdfError::PermissionDenied { path },
            _ => Ipynb2PdfError::ReadFailed { path, source },
        }
    }
}

fn display_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "none".to_string(), |c| c.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_not_found_display() {
        let e = Ipynb2PdfError::InputNotFound {
            path: PathBuf::from("missing.ipynb"),
        };
        assert_eq!(e.to_string(), "Input file not found: 'missing.ipynb'");
    }

    #[test]
    fn renderer_missing_includes_hint() {
        let e = Ipynb2PdfError::RendererMissing {
            hint: "Please install it:\n  macOS: brew install wkhtmltopdf".into(),
        };
        let msg = e.to_string();
        assert!(msg.starts_with("wkhtmltopdf is not installed."), "got: {msg}");
        assert!(msg.contains("brew install wkhtmltopdf"));
    }

    #[test]
    fn renderer_failed_display_with_code() {
        let e = Ipynb2PdfError::RendererFailed {
            code: Some(1),
            stderr: "Exit with code 1 due to network error".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("exit code 1"), "got: {msg}");
        assert!(msg.contains("network error"));
    }

    #[test]
    fn renderer_failed_display_without_code() {
        let e = Ipynb2PdfError::RendererFailed {
            code: None,
            stderr: String::new(),
        };
        assert!(e.to_string().contains("exit code none"));
    }

    #[test]
    fn input_io_classification() {
        let nf = Ipynb2PdfError::from_input_io(
            PathBuf::from("a.ipynb"),
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(matches!(nf, Ipynb2PdfError::InputNotFound { .. }));

        let pd = Ipynb2PdfError::from_input_io(
            PathBuf::from("a.ipynb"),
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(pd, Ipynb2PdfError::PermissionDenied { .. }));

        let other = Ipynb2PdfError::from_input_io(
            PathBuf::from("a.ipynb"),
            std::io::Error::from(std::io::ErrorKind::InvalidData),
        );
        assert!(matches!(other, Ipynb2PdfError::ReadFailed { .. }));
    }
}
