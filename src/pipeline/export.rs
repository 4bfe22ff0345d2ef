//! HTML export: serialise a [`Notebook`] into one self-contained HTML page.
//!
//! The markup follows the classic notebook class names (`cell`, `input`,
//! `input_area`, `output`, `output_area`, …) so that the print stylesheet
//! in [`crate::pipeline::style`] applies to it unchanged.
//!
//! With `embed_images` set, every local image a markdown cell refers to is
//! read and inlined as a base64 `data:` URI. wkhtmltopdf renders the
//! intermediate file from a temporary location, and inlining makes the page
//! independent of where that file lives. Attachment references
//! (`attachment:name`) are always resolved from the cell itself.

use crate::pipeline::notebook::{mime_text, Cell, MimeBundle, Notebook, Output};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use pulldown_cmark::{html, Event, Options, Parser, Tag};
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Representations an output may carry, most preferred first.
///
/// `application/javascript` is deliberately absent: the renderer runs with
/// JavaScript disabled.
pub const DISPLAY_PRIORITY: &[&str] = &[
    "text/html",
    "text/markdown",
    "image/svg+xml",
    "image/png",
    "image/jpeg",
    "image/gif",
    "text/latex",
    "text/plain",
];

/// Serialises notebooks to HTML.
#[derive(Debug, Clone)]
pub struct HtmlExporter {
    /// Omit code cell sources and prompts.
    pub exclude_input: bool,
    /// Inline local images referenced from markdown as `data:` URIs.
    pub embed_images: bool,
    /// Directory relative image paths are resolved against.
    pub base_dir: PathBuf,
}

impl Default for HtmlExporter {
    fn default() -> Self {
        Self {
            exclude_input: false,
            embed_images: true,
            base_dir: PathBuf::from("."),
        }
    }
}

impl HtmlExporter {
    /// Render `notebook` to a complete HTML5 document titled `title`.
    pub fn from_notebook(&self, notebook: &Notebook, title: &str) -> String {
        let language = notebook.language().unwrap_or("python");
        let mut body = String::new();
        for cell in &notebook.cells {
            self.render_cell(&mut body, cell, language);
        }
        debug!(
            "Exported {} cells to {} bytes of HTML",
            notebook.cells.len(),
            body.len()
        );

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
{css}
</style>
</head>
<body>
<div id="notebook" class="border-box-sizing">
<div class="container" id="notebook-container">
{body}</div>
</div>
</body>
</html>
"#,
            title = escape_html(title),
            css = BASE_CSS,
            body = body
        )
    }

    fn render_cell(&self, out: &mut String, cell: &Cell, language: &str) {
        match cell {
            Cell::Code {
                source,
                execution_count,
                outputs,
            } => {
                if self.exclude_input && outputs.is_empty() {
                    return;
                }
                out.push_str("<div class=\"cell code_cell\">\n");
                if !self.exclude_input {
                    let _ = write!(
                        out,
                        "<div class=\"input\">\n\
                         <div class=\"prompt input_prompt\">In&nbsp;[{}]:</div>\n\
                         <div class=\"inner_cell\"><div class=\"input_area\">\
                         <pre><code class=\"language-{}\">{}</code></pre>\
                         </div></div>\n</div>\n",
                        prompt_number(*execution_count),
                        escape_html(language),
                        escape_html(source.as_str())
                    );
                }
                if !outputs.is_empty() {
                    out.push_str("<div class=\"output_wrapper\"><div class=\"output\">\n");
                    for output in outputs {
                        self.render_output(out, output);
                    }
                    out.push_str("</div></div>\n");
                }
                out.push_str("</div>\n");
            }
            Cell::Markdown {
                source,
                attachments,
            } => {
                let _ = write!(
                    out,
                    "<div class=\"cell text_cell\"><div class=\"inner_cell\">\
                     <div class=\"text_cell_render\">\n{}</div></div></div>\n",
                    self.render_markdown(source.as_str(), Some(attachments))
                );
            }
            Cell::Raw { source, .. } => match cell.raw_mimetype() {
                Some("text/html") => {
                    let _ = write!(out, "<div class=\"cell raw_cell\">\n{}\n</div>\n", source.as_str());
                }
                other => debug!("Skipping raw cell with format {:?}", other),
            },
        }
    }

    fn render_output(&self, out: &mut String, output: &Output) {
        match output {
            Output::Stream { name, text } => {
                let _ = write!(
                    out,
                    "<div class=\"output_area\"><div class=\"prompt\"></div>\
                     <div class=\"output_subarea output_stream output_{}\"><pre>{}</pre></div></div>\n",
                    escape_html(name),
                    escape_html(&strip_ansi(text.as_str()))
                );
            }
            Output::Error {
                ename,
                evalue,
                traceback,
            } => {
                let text = if traceback.is_empty() {
                    format!("{ename}: {evalue}")
                } else {
                    traceback.join("\n")
                };
                let _ = write!(
                    out,
                    "<div class=\"output_area\"><div class=\"prompt\"></div>\
                     <div class=\"output_subarea output_error\"><pre>{}</pre></div></div>\n",
                    escape_html(&strip_ansi(&text))
                );
            }
            Output::DisplayData { data } => self.render_mime(out, data, None),
            Output::ExecuteResult {
                data,
                execution_count,
            } => self.render_mime(out, data, Some(*execution_count)),
        }
    }

    /// Render the highest-priority representation in `data`.
    ///
    /// `execution_count` is `Some` for execute results, which get an
    /// `Out[n]:` prompt.
    fn render_mime(&self, out: &mut String, data: &MimeBundle, execution_count: Option<Option<u64>>) {
        let Some((mime, value)) = DISPLAY_PRIORITY
            .iter()
            .find_map(|m| data.get_key_value(*m))
        else {
            debug!("No displayable representation among {:?}", data.keys());
            return;
        };

        let (class, inner) = match mime.as_str() {
            "text/html" => ("output_html rendered_html", mime_text(value)),
            "text/markdown" => (
                "output_markdown rendered_html",
                self.render_markdown(&mime_text(value), None),
            ),
            "image/svg+xml" => ("output_svg", mime_text(value)),
            "image/png" | "image/jpeg" | "image/gif" => (
                "output_png",
                format!("<img src=\"{}\">", data_uri(mime, &compact_base64(&mime_text(value)))),
            ),
            "text/latex" => ("output_latex", format!("<pre>{}</pre>", escape_html(&mime_text(value)))),
            _ => (
                "output_text",
                format!("<pre>{}</pre>", escape_html(&strip_ansi(&mime_text(value)))),
            ),
        };

        let prompt = match execution_count {
            Some(n) => format!("Out[{}]:", prompt_number(n)),
            None => String::new(),
        };
        let _ = write!(
            out,
            "<div class=\"output_area\"><div class=\"prompt output_prompt\">{prompt}</div>\
             <div class=\"output_subarea {class}\">\n{inner}\n</div></div>\n"
        );
    }

    /// Markdown → HTML, rewriting image sources on the way through.
    fn render_markdown(&self, source: &str, attachments: Option<&BTreeMap<String, MimeBundle>>) -> String {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS;

        let parser = Parser::new_ext(source, options).map(|event| match event {
            Event::Start(Tag::Image(link_type, dest, title)) => {
                match self.resolve_image(&dest, attachments) {
                    Some(uri) => Event::Start(Tag::Image(link_type, uri.into(), title)),
                    None => Event::Start(Tag::Image(link_type, dest, title)),
                }
            }
            Event::Html(raw) => Event::Html(self.rewrite_img_tags(&raw, attachments).into()),
            other => other,
        });

        let mut rendered = String::new();
        html::push_html(&mut rendered, parser);
        rendered
    }

    /// Rewrite the `src` of raw `<img>` tags embedded in markdown.
    fn rewrite_img_tags(&self, raw: &str, attachments: Option<&BTreeMap<String, MimeBundle>>) -> String {
        RE_IMG_SRC
            .replace_all(raw, |caps: &Captures| {
                match self.resolve_image(&caps[3], attachments) {
                    Some(uri) => format!("{}{}{}{}", &caps[1], &caps[2], uri, &caps[4]),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    /// Turn an image reference into a `data:` URI, or `None` to keep it.
    fn resolve_image(
        &self,
        dest: &str,
        attachments: Option<&BTreeMap<String, MimeBundle>>,
    ) -> Option<String> {
        if let Some(name) = dest.strip_prefix("attachment:") {
            let bundle = attachments.and_then(|a| a.get(name));
            let found = bundle.and_then(|b| {
                b.iter()
                    .find(|(mime, _)| mime.starts_with("image/"))
                    .map(|(mime, value)| data_uri(mime, &compact_base64(&mime_text(value))))
            });
            if found.is_none() {
                warn!("Attachment '{}' not found in cell", name);
            }
            return found;
        }

        if !self.embed_images || is_remote_or_inline(dest) {
            return None;
        }

        // Markdown destinations are URLs: `my%20plot.png` names `my plot.png`.
        let relative = dest.split(['?', '#']).next().unwrap_or(dest);
        let relative = percent_decode_str(relative)
            .decode_utf8()
            .unwrap_or(Cow::Borrowed(relative));
        let path = self.base_dir.join(&*relative);
        let Some(mime) = image_mime_for(&path) else {
            warn!("Not embedding '{}': unrecognised image type", dest);
            return None;
        };
        match std::fs::read(&path) {
            Ok(bytes) => {
                debug!("Embedded {} ({} bytes)", path.display(), bytes.len());
                Some(data_uri(mime, &STANDARD.encode(bytes)))
            }
            Err(e) => {
                warn!("Not embedding '{}': {}", path.display(), e);
                None
            }
        }
    }
}

/// Minimal screen styling for the exported page; the print layout is
/// layered on top by [`crate::pipeline::style::with_print_css`].
const BASE_CSS: &str = r#"body { font-family: Arial, sans-serif; color: #000; }
pre { white-space: pre-wrap; word-wrap: break-word; margin: 0; font-family: monospace; }
.prompt { color: #303f9f; font-family: monospace; font-size: 11px; }
.output_prompt { color: #d84315; }
.output_error pre, .output_stderr pre { background-color: #fdd; }
.rendered_html table { border-collapse: collapse; }
.rendered_html th, .rendered_html td { border: 1px solid #ccc; padding: 2px 6px; }
.text_cell_render { padding: 5px; }"#;

static RE_IMG_SRC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)(<img\b[^>]*?\bsrc\s*=\s*)(["'])([^"']*)(["'])"#).unwrap());

static RE_ANSI: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").unwrap());

fn prompt_number(n: Option<u64>) -> String {
    n.map_or_else(|| "&nbsp;".to_string(), |n| n.to_string())
}

fn is_remote_or_inline(dest: &str) -> bool {
    let lower = dest.trim_start().to_ascii_lowercase();
    lower.is_empty()
        || lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("//")
        || lower.starts_with("data:")
        || lower.starts_with("file:")
}

fn image_mime_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "svg" => Some("image/svg+xml"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

fn data_uri(mime: &str, base64: &str) -> String {
    format!("data:{mime};base64,{base64}")
}

/// Notebook base64 payloads are often wrapped at 76 columns.
fn compact_base64(s: &str) -> String {
    s.chars().filter(|c| !c.is_ascii_whitespace()).collect()
}

/// Remove terminal colour codes from tracebacks and streams.
pub fn strip_ansi(s: &str) -> String {
    RE_ANSI.replace_all(s, "").into_owned()
}

/// Escape HTML special characters.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
