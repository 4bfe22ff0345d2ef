//! Result types returned by [`crate::convert::inspect`].

use crate::pipeline::notebook::{Cell, Notebook, Output};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Summary of a notebook, produced without converting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotebookSummary {
    pub path: PathBuf,
    /// Schema version after upgrading, always 4.
    pub nbformat: u64,
    pub nbformat_minor: u64,
    pub title: Option<String>,
    pub kernel: Option<String>,
    pub language: Option<String>,
    pub code_cells: usize,
    pub markdown_cells: usize,
    pub raw_cells: usize,
    /// Outputs of every kind across all code cells.
    pub outputs: usize,
    /// Rich outputs carrying a PNG, JPEG, GIF or SVG image.
    pub image_outputs: usize,
    pub error_outputs: usize,
}

impl NotebookSummary {
    pub fn from_notebook(path: &Path, nb: &Notebook) -> Self {
        let mut summary = NotebookSummary {
            path: path.to_path_buf(),
            nbformat: nb.nbformat,
            nbformat_minor: nb.nbformat_minor,
            title: nb.title().map(str::to_string),
            kernel: nb.kernel_name().map(str::to_string),
            language: nb.language().map(str::to_string),
            code_cells: 0,
            markdown_cells: 0,
            raw_cells: 0,
            outputs: 0,
            image_outputs: 0,
            error_outputs: 0,
        };

        for cell in &nb.cells {
            match cell {
                Cell::Code { outputs, .. } => {
                    summary.code_cells += 1;
                    summary.outputs += outputs.len();
                    for output in outputs {
                        if matches!(output, Output::Error { .. }) {
                            summary.error_outputs += 1;
                        }
                        if output
                            .data()
                            .is_some_and(|d| d.keys().any(|k| k.starts_with("image/")))
                        {
                            summary.image_outputs += 1;
                        }
                    }
                }
                Cell::Markdown { .. } => summary.markdown_cells += 1,
                Cell::Raw { .. } => summary.raw_cells += 1,
            }
        }

        summary
    }
}
