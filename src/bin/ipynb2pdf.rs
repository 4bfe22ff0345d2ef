//! CLI binary for ipynb2pdf.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and reports the result.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use ipynb2pdf::{
    convert, export_html, inspect, ConversionConfig, ConversionProgressCallback, ConversionStage,
    ProgressCallback, WkhtmltopdfRenderer,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal spinner that follows the pipeline stages.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, input: &Path) {
        self.bar.set_prefix("Reading");
        self.bar.set_message(input.display().to_string());
    }

    fn on_stage(&self, stage: ConversionStage) {
        let (prefix, msg) = match stage {
            ConversionStage::NotStarted => return,
            ConversionStage::Parsed => ("Exporting", "notebook → HTML"),
            ConversionStage::RenderedHtml => ("Rendering", "HTML → A4 PDF (wkhtmltopdf)"),
            ConversionStage::PdfInvoked => ("Finishing", "cleaning up"),
            ConversionStage::Done => ("Done", ""),
        };
        self.bar.println(format!("  {} {}", green("✓"), dim(&stage.to_string())));
        self.bar.set_prefix(prefix);
        self.bar.set_message(msg);
    }

    fn on_conversion_complete(&self, _output: &Path) {
        self.bar.finish_and_clear();
    }

    fn on_conversion_error(&self, _error: &str) {
        self.bar.abandon_with_message(red("failed"));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic conversion (writes notebook.pdf next to the input)
  ipynb2pdf notebook.ipynb

  # Explicit output and narrower margins
  ipynb2pdf analysis.ipynb -o reports/analysis.pdf -m 15

  # Outputs only, no code
  ipynb2pdf --no-input report.ipynb

  # Write the intermediate HTML instead of a PDF
  ipynb2pdf notebook.ipynb --html notebook.html

  # Summarise the notebook (no wkhtmltopdf needed)
  ipynb2pdf --inspect-only --json notebook.ipynb

  # Check which wkhtmltopdf will be used
  ipynb2pdf --check-renderer

ENVIRONMENT VARIABLES:
  WKHTMLTOPDF_PATH   Path to the wkhtmltopdf executable
  IPYNB2PDF_OUTPUT   Default for --output
  IPYNB2PDF_MARGIN   Default for --margin
  RUST_LOG           Log filter (e.g. ipynb2pdf=debug)

SETUP:
  wkhtmltopdf must be installed:
    Ubuntu/Debian: sudo apt-get install -y wkhtmltopdf
    macOS:         brew install wkhtmltopdf
    Windows:       https://wkhtmltopdf.org/downloads.html
"#;

/// Convert Jupyter notebooks (.ipynb) to A4 PDF.
#[derive(Parser, Debug)]
#[command(
    name = "ipynb2pdf",
    version,
    about = "Convert Jupyter notebook (.ipynb) to A4 PDF",
    long_about = "Convert a Jupyter notebook to an A4 PDF: the notebook is exported to \
self-contained HTML (code, markdown and outputs, images inlined), a print stylesheet is \
added, and wkhtmltopdf lays it out with equal margins on every side.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input .ipynb file path.
    #[arg(required_unless_present = "check_renderer")]
    input: Option<PathBuf>,

    /// Output .pdf file path (default: same name as input with .pdf extension).
    #[arg(short, long, env = "IPYNB2PDF_OUTPUT")]
    output: Option<PathBuf>,

    /// Page margin in millimeters.
    #[arg(short, long, env = "IPYNB2PDF_MARGIN", default_value_t = 25,
          value_parser = clap::value_parser!(u32).range(0..=100))]
    margin: u32,

    /// Leave code cells out; keep outputs and markdown.
    #[arg(long)]
    no_input: bool,

    /// Keep local images referenced from markdown as links instead of inlining them.
    #[arg(long)]
    no_embed_images: bool,

    /// Path to the wkhtmltopdf executable.
    #[arg(long, env = "WKHTMLTOPDF_PATH")]
    renderer: Option<PathBuf>,

    /// Write the styled HTML to this path instead of producing a PDF.
    /// `--output` is ignored in this mode.
    #[arg(long)]
    html: Option<PathBuf>,

    /// Print a notebook summary only, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// With --inspect-only, print the summary as JSON.
    #[arg(long, requires = "inspect_only")]
    json: bool,

    /// Report which wkhtmltopdf would be used and its version, then exit.
    #[arg(long)]
    check_renderer: bool,

    /// Disable the progress spinner.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner covers the stage messages, so library INFO logs are only
    // shown when it is off.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.verbose;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli, None)?;

    // ── Renderer check ───────────────────────────────────────────────────
    if cli.check_renderer {
        let renderer = WkhtmltopdfRenderer::from_config(&config);
        let version = renderer
            .version()
            .with_context(|| format!("wkhtmltopdf is not usable.\n{}", wkhtmltopdf_locate::install_hint()))?;
        println!("Renderer:  {}", ipynb2pdf::Renderer::program(&renderer).display());
        println!("Version:   {version}");
        return Ok(());
    }

    let input = cli.input.as_deref().context("An input notebook is required")?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let summary = inspect(input).context("Failed to inspect notebook")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?
            );
        } else {
            println!("File:           {}", summary.path.display());
            if let Some(ref t) = summary.title {
                println!("Title:          {}", t);
            }
            println!("nbformat:       {}.{}", summary.nbformat, summary.nbformat_minor);
            if let Some(ref k) = summary.kernel {
                println!("Kernel:         {}", k);
            }
            if let Some(ref l) = summary.language {
                println!("Language:       {}", l);
            }
            println!(
                "Cells:          {} code, {} markdown, {} raw",
                summary.code_cells, summary.markdown_cells, summary.raw_cells
            );
            println!(
                "Outputs:        {} ({} images, {} errors)",
                summary.outputs, summary.image_outputs, summary.error_outputs
            );
        }
        return Ok(());
    }

    // ── HTML-only mode ───────────────────────────────────────────────────
    if let Some(ref html_path) = cli.html {
        let html = export_html(input, &config).context("HTML export failed")?;
        std::fs::write(html_path, html)
            .with_context(|| format!("Failed to write HTML to {}", html_path.display()))?;
        if !cli.quiet {
            eprintln!("{} HTML written: {}", green("✓"), bold(&html_path.display().to_string()));
        }
        return Ok(());
    }

    // ── Run conversion ───────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    let output = convert(input, cli.output.as_deref(), &config).context("Conversion failed")?;

    if !cli.quiet {
        eprintln!(
            "{} PDF generated successfully: {}",
            green("✓"),
            bold(&output.display().to_string())
        );
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .margin_mm(cli.margin)
        .exclude_input(cli.no_input)
        .embed_images(!cli.no_embed_images);

    if let Some(ref path) = cli.renderer {
        builder = builder.renderer_path(path);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_match_library() {
        let cli = Cli::try_parse_from(["ipynb2pdf", "notes.ipynb"]).unwrap();
        assert_eq!(cli.margin, ipynb2pdf::DEFAULT_MARGIN_MM);
        assert!(cli.output.is_none());

        let config = build_config(&cli, None).unwrap();
        assert_eq!(config.margin_mm, 25);
        assert!(!config.exclude_input);
        assert!(config.embed_images);
    }

    #[test]
    fn short_flags() {
        let cli = Cli::try_parse_from(["ipynb2pdf", "in.ipynb", "-o", "out.pdf", "-m", "10"]).unwrap();
        assert_eq!(cli.output, Some(PathBuf::from("out.pdf")));
        assert_eq!(cli.margin, 10);
    }

    #[test]
    fn margin_out_of_range_is_rejected() {
        assert!(Cli::try_parse_from(["ipynb2pdf", "in.ipynb", "-m", "500"]).is_err());
        assert!(Cli::try_parse_from(["ipynb2pdf", "in.ipynb", "-m", "-5"]).is_err());
    }

    #[test]
    fn check_renderer_needs_no_input() {
        let cli = Cli::try_parse_from(["ipynb2pdf", "--check-renderer"]).unwrap();
        assert!(cli.check_renderer);
        assert!(cli.input.is_none());

        assert!(Cli::try_parse_from(["ipynb2pdf", "--no-progress"]).is_err());
    }

    #[test]
    fn html_mode_accepts_an_output_value() {
        // IPYNB2PDF_OUTPUT counts as an explicit --output for clap.
        let cli = Cli::try_parse_from(["ipynb2pdf", "in.ipynb", "-o", "out.pdf", "--html", "out.html"])
            .unwrap();
        assert_eq!(cli.html, Some(PathBuf::from("out.html")));
    }

    #[test]
    fn json_requires_inspect_only() {
        assert!(Cli::try_parse_from(["ipynb2pdf", "in.ipynb", "--json"]).is_err());
        assert!(Cli::try_parse_from(["ipynb2pdf", "in.ipynb", "--inspect-only", "--json"]).is_ok());
    }
}
