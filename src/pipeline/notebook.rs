//! Notebook reading: deserialise an `.ipynb` file into a [`Notebook`].
//!
//! Only nbformat 4 is modelled. Version 3 documents (worksheets, `heading`
//! cells, `pyout`/`pyerr` outputs, short mime keys) are upgraded to the v4
//! shape on the raw JSON before deserialisation, so the exporter only ever
//! sees one schema. Unknown fields are ignored; structural validation goes
//! no further than what deserialisation needs.

use crate::error::Ipynb2PdfError;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// The schema version every document is upgraded to.
pub const CURRENT_NBFORMAT: u64 = 4;

/// A mime-type → payload map, as found in outputs and attachments.
///
/// Payloads are kept as raw JSON because their shape depends on the mime
/// type: text is a string or a list of lines, `application/json` is an
/// object. Use [`mime_text`] to flatten one.
pub type MimeBundle = BTreeMap<String, Value>;

/// A parsed nbformat 4 notebook.
#[derive(Debug, Clone, Deserialize)]
pub struct Notebook {
    pub cells: Vec<Cell>,
    #[serde(default)]
    pub metadata: NotebookMetadata,
    pub nbformat: u64,
    #[serde(default)]
    pub nbformat_minor: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotebookMetadata {
    #[serde(default)]
    pub kernelspec: Option<KernelSpec>,
    #[serde(default)]
    pub language_info: Option<LanguageInfo>,
    /// Metadata is free-form; a title that is not a string is dropped.
    #[serde(default, deserialize_with = "string_or_none")]
    pub title: Option<String>,
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KernelSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LanguageInfo {
    #[serde(default)]
    pub name: Option<String>,
}

/// A notebook string field: either one string or a list of lines that are
/// concatenated verbatim (each line keeps its own trailing `\n`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "MultilineRepr")]
pub struct MultilineString(pub String);

#[derive(Deserialize)]
#[serde(untagged)]
enum MultilineRepr {
    One(String),
    Many(Vec<String>),
}

impl From<MultilineRepr> for MultilineString {
    fn from(r: MultilineRepr) -> Self {
        match r {
            MultilineRepr::One(s) => MultilineString(s),
            MultilineRepr::Many(v) => MultilineString(v.concat()),
        }
    }
}

impl MultilineString {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "cell_type", rename_all = "lowercase")]
pub enum Cell {
    Code {
        #[serde(default)]
        source: MultilineString,
        #[serde(default)]
        execution_count: Option<u64>,
        #[serde(default)]
        outputs: Vec<Output>,
    },
    Markdown {
        #[serde(default)]
        source: MultilineString,
        #[serde(default)]
        attachments: BTreeMap<String, MimeBundle>,
    },
    Raw {
        #[serde(default)]
        source: MultilineString,
        #[serde(default)]
        metadata: Map<String, Value>,
    },
}

impl Cell {
    pub fn source(&self) -> &str {
        match self {
            Cell::Code { source, .. } | Cell::Markdown { source, .. } | Cell::Raw { source, .. } => {
                source.as_str()
            }
        }
    }

    /// Target format of a raw cell (`raw_mimetype`, or the newer `format`).
    pub fn raw_mimetype(&self) -> Option<&str> {
        match self {
            Cell::Raw { metadata, .. } => metadata
                .get("raw_mimetype")
                .or_else(|| metadata.get("format"))
                .and_then(Value::as_str),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "output_type", rename_all = "snake_case")]
pub enum Output {
    Stream {
        #[serde(default)]
        name: String,
        #[serde(default)]
        text: MultilineString,
    },
    DisplayData {
        #[serde(default)]
        data: MimeBundle,
    },
    ExecuteResult {
        #[serde(default)]
        data: MimeBundle,
        #[serde(default)]
        execution_count: Option<u64>,
    },
    Error {
        #[serde(default)]
        ename: String,
        #[serde(default)]
        evalue: String,
        #[serde(default)]
        traceback: Vec<String>,
    },
}

impl Output {
    /// The mime bundle of a rich output, if this output has one.
    pub fn data(&self) -> Option<&MimeBundle> {
        match self {
            Output::DisplayData { data } | Output::ExecuteResult { data, .. } => Some(data),
            _ => None,
        }
    }
}

impl Notebook {
    /// Parse notebook JSON, upgrading nbformat 3 documents to version 4.
    ///
    /// `origin` is only used in error messages.
    pub fn from_json_str(json: &str, origin: &Path) -> Result<Notebook, Ipynb2PdfError> {
        let malformed = |detail: String| Ipynb2PdfError::MalformedNotebook {
            path: origin.to_path_buf(),
            detail,
        };

        let raw: Value = serde_json::from_str(json).map_err(|e| malformed(e.to_string()))?;
        let version = raw
            .get("nbformat")
            .and_then(Value::as_u64)
            .ok_or_else(|| malformed("missing or non-integer 'nbformat' field".into()))?;

        let v4 = match version {
            CURRENT_NBFORMAT => raw,
            3 => {
                debug!("Upgrading nbformat 3 notebook to version 4");
                upgrade_v3(&raw).map_err(malformed)?
            }
            other => {
                return Err(Ipynb2PdfError::UnsupportedNbformat {
                    path: origin.to_path_buf(),
                    version: other,
                })
            }
        };

        serde_json::from_value(v4).map_err(|e| malformed(e.to_string()))
    }

    /// Title from `metadata.title`, if the notebook declares one.
    pub fn title(&self) -> Option<&str> {
        self.metadata.title.as_deref().filter(|t| !t.trim().is_empty())
    }

    pub fn kernel_name(&self) -> Option<&str> {
        let ks = self.metadata.kernelspec.as_ref()?;
        ks.display_name.as_deref().or(ks.name.as_deref())
    }

    /// Programming language, from `language_info` or the kernelspec.
    pub fn language(&self) -> Option<&str> {
        self.metadata
            .language_info
            .as_ref()
            .and_then(|l| l.name.as_deref())
            .or_else(|| {
                self.metadata
                    .kernelspec
                    .as_ref()
                    .and_then(|k| k.language.as_deref())
            })
    }
}

/// Read and parse the notebook at `path`.
pub fn read_notebook(path: &Path) -> Result<Notebook, Ipynb2PdfError> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| Ipynb2PdfError::from_input_io(path.to_path_buf(), e))?;
    let notebook = Notebook::from_json_str(&json, path)?;
    debug!(
        "Parsed {} cells (nbformat {}.{})",
        notebook.cells.len(),
        notebook.nbformat,
        notebook.nbformat_minor
    );
    Ok(notebook)
}

/// Flatten a mime payload to text: strings pass through, lists of strings
/// are concatenated, anything else is pretty-printed JSON.
pub fn mime_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) if items.iter().all(Value::is_string) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .concat(),
        other => serde_json::to_string_pretty(other).unwrap_or_default(),
    }
}

// ── nbformat 3 → 4 ───────────────────────────────────────────────────────────

fn upgrade_v3(v3: &Value) -> Result<Value, String> {
    let mut cells = Vec::new();
    if let Some(worksheets) = v3.get("worksheets").and_then(Value::as_array) {
        for ws in worksheets {
            for cell in ws.get("cells").and_then(Value::as_array).into_iter().flatten() {
                cells.push(upgrade_cell_v3(cell)?);
            }
        }
    }

    let mut metadata = v3.get("metadata").cloned().unwrap_or_else(|| json!({}));
    // v3 kept the notebook name in metadata; v4 dropped the field.
    if let Some(m) = metadata.as_object_mut() {
        m.remove("name");
    }

    Ok(json!({
        "cells": cells,
        "metadata": metadata,
        "nbformat": CURRENT_NBFORMAT,
        "nbformat_minor": 0,
    }))
}

fn upgrade_cell_v3(cell: &Value) -> Result<Value, String> {
    let kind = cell
        .get("cell_type")
        .and_then(Value::as_str)
        .ok_or("v3 cell without 'cell_type'")?;
    let text = |key: &str| cell.get(key).map(mime_text).unwrap_or_default();

    match kind {
        "code" => {
            let outputs: Vec<Value> = cell
                .get("outputs")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .map(upgrade_output_v3)
                .collect::<Result<_, _>>()?;
            Ok(json!({
                "cell_type": "code",
                "source": text("input"),
                "execution_count": cell.get("prompt_number").and_then(Value::as_u64),
                "outputs": outputs,
            }))
        }
        "heading" => {
            let level = cell
                .get("level")
                .and_then(Value::as_u64)
                .unwrap_or(1)
                .clamp(1, 6) as usize;
            let title = text("source").lines().collect::<Vec<_>>().join(" ");
            Ok(json!({
                "cell_type": "markdown",
                "source": format!("{} {}", "#".repeat(level), title),
            }))
        }
        "markdown" | "html" => Ok(json!({ "cell_type": "markdown", "source": text("source") })),
        "raw" => Ok(json!({
            "cell_type": "raw",
            "source": text("source"),
            "metadata": cell.get("metadata").cloned().unwrap_or_else(|| json!({})),
        })),
        other => Err(format!("unknown v3 cell_type '{other}'")),
    }
}

fn upgrade_output_v3(out: &Value) -> Result<Value, String> {
    let kind = out
        .get("output_type")
        .and_then(Value::as_str)
        .ok_or("v3 output without 'output_type'")?;

    match kind {
        "pyout" => Ok(json!({
            "output_type": "execute_result",
            "execution_count": out.get("prompt_number").and_then(Value::as_u64),
            "data": v3_mime_bundle(out),
        })),
        "display_data" => Ok(json!({
            "output_type": "display_data",
            "data": v3_mime_bundle(out),
        })),
        "pyerr" => Ok(json!({
            "output_type": "error",
            "ename": out.get("ename").cloned().unwrap_or_else(|| json!("")),
            "evalue": out.get("evalue").cloned().unwrap_or_else(|| json!("")),
            "traceback": out.get("traceback").cloned().unwrap_or_else(|| json!([])),
        })),
        "stream" => Ok(json!({
            "output_type": "stream",
            "name": out.get("stream").and_then(Value::as_str).unwrap_or("stdout"),
            "text": out.get("text").map(mime_text).unwrap_or_default(),
        })),
        other => Err(format!("unknown v3 output_type '{other}'")),
    }
}

/// v3 stored each representation as a top-level key with a short name.
fn v3_mime_bundle(out: &Value) -> Value {
    let mut data = Map::new();
    if let Some(obj) = out.as_object() {
        for (key, value) in obj {
            let mime = match key.as_str() {
                "text" => "text/plain",
                "html" => "text/html",
                "png" => "image/png",
                "jpeg" => "image/jpeg",
                "svg" => "image/svg+xml",
                "latex" => "text/latex",
                "json" => "application/json",
                "javascript" => "application/javascript",
                _ => continue,
            };
            data.insert(mime.to_string(), value.clone());
        }
    }
    Value::Object(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Notebook, Ipynb2PdfError> {
        Notebook::from_json_str(json, Path::new("test.ipynb"))
    }

    const V4: &str = r##"{
        "cells": [
            {"cell_type": "markdown", "metadata": {}, "source": ["# Title\n", "Some *text*"]},
            {"cell_type": "code", "execution_count": 3, "metadata": {}, "source": "print(\"hi\")",
             "outputs": [
                {"output_type": "stream", "name": "stdout", "text": ["hi\n"]},
                {"output_type": "execute_result", "execution_count": 3,
                 "data": {"text/plain": ["42"]}, "metadata": {}}
             ]},
            {"cell_type": "raw", "metadata": {"raw_mimetype": "text/html"}, "source": "<b>raw</b>"}
        ],
        "metadata": {
            "kernelspec": {"name": "python3", "display_name": "Python 3", "language": "python"},
            "language_info": {"name": "python", "version": "3.11.4"}
        },
        "nbformat": 4,
        "nbformat_minor": 5
    }"##;

    #[test]
    fn parses_v4_notebook() {
        let nb = parse(V4).unwrap();
        assert_eq!(nb.nbformat, 4);
        assert_eq!(nb.nbformat_minor, 5);
        assert_eq!(nb.cells.len(), 3);
        assert_eq!(nb.cells[0].source(), "# Title\nSome *text*");
        assert_eq!(nb.kernel_name(), Some("Python 3"));
        assert_eq!(nb.language(), Some("python"));
        assert_eq!(nb.cells[2].raw_mimetype(), Some("text/html"));

        match &nb.cells[1] {
            Cell::Code {
                execution_count,
                outputs,
                ..
            } => {
                assert_eq!(*execution_count, Some(3));
                assert_eq!(outputs.len(), 2);
                assert!(matches!(&outputs[0], Output::Stream { name, text } if name == "stdout" && text.as_str() == "hi\n"));
                let data = outputs[1].data().unwrap();
                assert_eq!(mime_text(&data["text/plain"]), "42");
            }
            other => panic!("expected code cell, got {other:?}"),
        }
    }

    #[test]
    fn rejects_invalid_json() {
        let err = parse("{ not json").unwrap_err();
        assert!(matches!(err, Ipynb2PdfError::MalformedNotebook { .. }), "got: {err}");
    }

    #[test]
    fn rejects_missing_nbformat() {
        let err = parse(r#"{"cells": []}"#).unwrap_err();
        assert!(err.to_string().contains("nbformat"), "got: {err}");
    }

    #[test]
    fn rejects_unsupported_version() {
        let err = parse(r#"{"cells": [], "nbformat": 2}"#).unwrap_err();
        assert!(matches!(
            err,
            Ipynb2PdfError::UnsupportedNbformat { version: 2, .. }
        ));
    }

    #[test]
    fn rejects_unknown_cell_type() {
        let err = parse(r#"{"cells": [{"cell_type": "widget", "source": ""}], "nbformat": 4}"#)
            .unwrap_err();
        assert!(matches!(err, Ipynb2PdfError::MalformedNotebook { .. }));
    }

    #[test]
    fn upgrades_v3_notebook() {
        let v3 = r#"{
            "metadata": {"name": "old"},
            "nbformat": 3,
            "nbformat_minor": 0,
            "worksheets": [{"cells": [
                {"cell_type": "heading", "level": 2, "source": ["Results"]},
                {"cell_type": "code", "input": ["x = 1\n", "x"], "language": "python",
                 "prompt_number": 7,
                 "outputs": [
                    {"output_type": "pyout", "prompt_number": 7, "text": ["1"], "png": "iVBORw0KGgo="},
                    {"output_type": "stream", "stream": "stderr", "text": "warn\n"},
                    {"output_type": "pyerr", "ename": "ValueError", "evalue": "bad", "traceback": ["tb"]}
                 ]},
                {"cell_type": "markdown", "source": "plain"}
            ]}]
        }"#;
        let nb = parse(v3).unwrap();
        assert_eq!(nb.nbformat, 4);
        assert_eq!(nb.cells.len(), 3);
        assert_eq!(nb.cells[0].source(), "## Results");

        let Cell::Code {
            source,
            execution_count,
            outputs,
        } = &nb.cells[1]
        else {
            panic!("expected code cell");
        };
        assert_eq!(source.as_str(), "x = 1\nx");
        assert_eq!(*execution_count, Some(7));

        let data = outputs[0].data().unwrap();
        assert!(data.contains_key("text/plain"));
        assert!(data.contains_key("image/png"));
        assert!(matches!(&outputs[1], Output::Stream { name, .. } if name == "stderr"));
        assert!(matches!(&outputs[2], Output::Error { ename, .. } if ename == "ValueError"));
    }

    #[test]
    fn mime_text_flattens_payloads() {
        assert_eq!(mime_text(&json!("a")), "a");
        assert_eq!(mime_text(&json!(["a\n", "b"])), "a\nb");
        assert!(mime_text(&json!({"k": 1})).contains("\"k\": 1"));
    }

    #[test]
    fn non_string_title_is_ignored() {
        let nb = parse(r#"{"cells": [], "metadata": {"title": {"x": 1}}, "nbformat": 4}"#).unwrap();
        assert_eq!(nb.title(), None);

        let nb = parse(r#"{"cells": [], "metadata": {"title": null}, "nbformat": 4}"#).unwrap();
        assert_eq!(nb.title(), None);

        let nb = parse(r#"{"cells": [], "metadata": {"title": "Report"}, "nbformat": 4}"#).unwrap();
        assert_eq!(nb.title(), Some("Report"));
    }

    #[test]
    fn blank_title_is_ignored() {
        let nb = parse(r#"{"cells": [], "metadata": {"title": "  "}, "nbformat": 4}"#).unwrap();
        assert_eq!(nb.title(), None);
    }
}
