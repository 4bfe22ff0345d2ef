//! PDF rendering: drive the external wkhtmltopdf executable.
//!
//! The pipeline never spawns processes directly. It talks to a [`Renderer`],
//! which answers two questions: is the executable usable, and what happened
//! when it was run with a given argument list. [`WkhtmltopdfRenderer`] is the
//! real implementation; tests substitute a recording fake.

use crate::config::ConversionConfig;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// Page size passed to the renderer.
pub const PAGE_SIZE: &str = "A4";

/// Result of one renderer invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutput {
    /// Exit code; `None` if the process was killed by a signal.
    pub code: Option<i32>,
    /// Everything the renderer wrote to standard error.
    pub stderr: String,
}

impl RenderOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// An external HTML-to-PDF renderer.
pub trait Renderer {
    /// Program name used in error messages.
    fn program(&self) -> &Path {
        Path::new(wkhtmltopdf_locate::PROGRAM_NAME)
    }

    /// Whether the renderer can be run at all. Never fails.
    fn is_available(&self) -> bool;

    /// Run the renderer to completion with `args`, capturing stderr.
    ///
    /// `Err` means the process could not be started; a non-zero exit is an
    /// `Ok` with a non-zero [`RenderOutput::code`].
    fn run(&self, args: &[OsString]) -> std::io::Result<RenderOutput>;
}

/// [`Renderer`] backed by a wkhtmltopdf executable.
#[derive(Debug, Clone)]
pub struct WkhtmltopdfRenderer {
    program: PathBuf,
}

impl WkhtmltopdfRenderer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Use `config.renderer_path`, else whatever [`wkhtmltopdf_locate::locate`]
    /// finds, else the bare program name.
    pub fn from_config(config: &ConversionConfig) -> Self {
        let program = config
            .renderer_path
            .clone()
            .or_else(wkhtmltopdf_locate::locate)
            .unwrap_or_else(|| PathBuf::from(wkhtmltopdf_locate::PROGRAM_NAME));
        debug!("Using renderer: {}", program.display());
        Self::new(program)
    }

    /// `wkhtmltopdf --version` output, if the program runs.
    pub fn version(&self) -> Result<String, wkhtmltopdf_locate::LocateError> {
        wkhtmltopdf_locate::version(&self.program)
    }
}

impl Renderer for WkhtmltopdfRenderer {
    fn program(&self) -> &Path {
        &self.program
    }

    fn is_available(&self) -> bool {
        let available = wkhtmltopdf_locate::probe(&self.program);
        debug!("Renderer {} available: {}", self.program.display(), available);
        available
    }

    fn run(&self, args: &[OsString]) -> std::io::Result<RenderOutput> {
        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .output()?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            debug!("Renderer stdout: {}", stdout.trim());
        }

        Ok(RenderOutput {
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Build the wkhtmltopdf argument list for one conversion.
///
/// Layout flags first (equal margins, A4, UTF-8), then the behaviour flags
/// (local files allowed, no external links, no JavaScript, no slow-script
/// abort), then input and output paths.
pub fn render_args(html_path: &Path, output_path: &Path, margin_mm: u32) -> Vec<OsString> {
    let margin = format!("{margin_mm}mm");
    let mut args: Vec<OsString> = Vec::with_capacity(18);
    for side in ["--margin-top", "--margin-bottom", "--margin-left", "--margin-right"] {
        args.push(side.into());
        args.push(margin.clone().into());
    }
    for flag in [
        "--page-size",
        PAGE_SIZE,
        "--encoding",
        "UTF-8",
        "--enable-local-file-access",
        "--disable-external-links",
        "--disable-javascript",
        "--no-stop-slow-scripts",
    ] {
        args.push(flag.into());
    }
    args.push(html_path.as_os_str().to_owned());
    args.push(output_path.as_os_str().to_owned());
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn args_in_expected_order() {
        let args = strings(&render_args(Path::new("in_temp.html"), Path::new("out.pdf"), 25));
        assert_eq!(
            args,
            vec![
                "--margin-top",
                "25mm",
                "--margin-bottom",
                "25mm",
                "--margin-left",
                "25mm",
                "--margin-right",
                "25mm",
                "--page-size",
                "A4",
                "--encoding",
                "UTF-8",
                "--enable-local-file-access",
                "--disable-external-links",
                "--disable-javascript",
                "--no-stop-slow-scripts",
                "in_temp.html",
                "out.pdf",
            ]
        );
    }

    #[test]
    fn margin_applies_to_all_sides() {
        let args = strings(&render_args(Path::new("a.html"), Path::new("a.pdf"), 10));
        assert_eq!(args.iter().filter(|a| *a == "10mm").count(), 4);
        assert!(!args.iter().any(|a| a == "25mm"));
    }

    #[test]
    fn render_output_success() {
        let ok = RenderOutput {
            code: Some(0),
            stderr: String::new(),
        };
        let failed = RenderOutput {
            code: Some(1),
            stderr: "boom".into(),
        };
        let killed = RenderOutput {
            code: None,
            stderr: String::new(),
        };
        assert!(ok.success());
        assert!(!failed.success());
        assert!(!killed.success());
    }

    #[test]
    fn missing_program_is_unavailable() {
        let r = WkhtmltopdfRenderer::new("/definitely/not/a/real/wkhtmltopdf");
        assert!(!r.is_available());
        assert!(r.run(&[]).is_err());
    }

    #[test]
    fn config_path_takes_priority() {
        let config = ConversionConfig::builder()
            .renderer_path("/opt/custom/wkhtmltopdf")
            .build()
            .unwrap();
        let r = WkhtmltopdfRenderer::from_config(&config);
        assert_eq!(r.program(), Path::new("/opt/custom/wkhtmltopdf"));
    }
}
