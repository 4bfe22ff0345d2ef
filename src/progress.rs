//! Progress-callback trait for conversion stage events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to be told
//! when the pipeline moves from one stage to the next. The CLI uses it to
//! drive a spinner; library callers can forward events wherever they like.
//!
//! # Example
//!
//! ```rust
//! use ipynb2pdf::{ConversionConfig, ConversionProgressCallback, ConversionStage};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl ConversionProgressCallback for Printer {
//!     fn on_stage(&self, stage: ConversionStage) {
//!         eprintln!("reached {stage}");
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(Printer))
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// The linear states of one conversion.
///
/// A conversion starts in `NotStarted` and advances one step at a time; any
/// stage may instead end in failure, reported via
/// [`ConversionProgressCallback::on_conversion_error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConversionStage {
    NotStarted,
    /// The notebook was read and upgraded to nbformat 4.
    Parsed,
    /// Styled HTML was produced.
    RenderedHtml,
    /// wkhtmltopdf returned.
    PdfInvoked,
    /// The temporary HTML is gone and the output path is final.
    Done,
}

impl fmt::Display for ConversionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConversionStage::NotStarted => "not started",
            ConversionStage::Parsed => "parsed",
            ConversionStage::RenderedHtml => "rendered to HTML",
            ConversionStage::PdfInvoked => "PDF renderer invoked",
            ConversionStage::Done => "done",
        };
        f.write_str(s)
    }
}

/// Called by the conversion pipeline as it advances.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync` so a config
/// can be shared across threads.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once, after the preconditions passed and before parsing.
    fn on_conversion_start(&self, input: &Path) {
        let _ = input;
    }

    /// Called each time the pipeline reaches a new stage.
    fn on_stage(&self, stage: ConversionStage) {
        let _ = stage;
    }

    /// Called once on success with the final output path.
    fn on_conversion_complete(&self, output: &Path) {
        let _ = output;
    }

    /// Called once when the conversion fails.
    fn on_conversion_error(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingCallback {
        stages: Mutex<Vec<ConversionStage>>,
        errors: Mutex<Vec<String>>,
    }

    impl ConversionProgressCallback for RecordingCallback {
        fn on_stage(&self, stage: ConversionStage) {
            self.stages.lock().unwrap().push(stage);
        }

        fn on_conversion_error(&self, error: &str) {
            self.errors.lock().unwrap().push(error.to_string());
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_conversion_start(Path::new("a.ipynb"));
        cb.on_stage(ConversionStage::Parsed);
        cb.on_conversion_complete(Path::new("a.pdf"));
        cb.on_conversion_error("boom");
    }

    #[test]
    fn recording_callback_receives_events() {
        let cb = RecordingCallback::default();
        cb.on_stage(ConversionStage::Parsed);
        cb.on_stage(ConversionStage::RenderedHtml);
        cb.on_conversion_error("renderer failed");

        assert_eq!(
            *cb.stages.lock().unwrap(),
            vec![ConversionStage::Parsed, ConversionStage::RenderedHtml]
        );
        assert_eq!(cb.errors.lock().unwrap().len(), 1);
    }

    #[test]
    fn stages_are_ordered() {
        assert!(ConversionStage::NotStarted < ConversionStage::Parsed);
        assert!(ConversionStage::Parsed < ConversionStage::RenderedHtml);
        assert!(ConversionStage::RenderedHtml < ConversionStage::PdfInvoked);
        assert!(ConversionStage::PdfInvoked < ConversionStage::Done);
    }

    #[test]
    fn stage_display() {
        assert_eq!(ConversionStage::RenderedHtml.to_string(), "rendered to HTML");
    }
}
