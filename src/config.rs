//! Configuration types for notebook-to-PDF conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The page size (A4) and the renderer's
//! security flags are fixed; only the knobs below vary between runs.

use crate::error::Ipynb2PdfError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;

/// Default page margin, in millimetres, applied to all four sides.
pub const DEFAULT_MARGIN_MM: u32 = 25;

/// Largest accepted margin. A4 is 210 mm wide, so two margins above this
/// would leave almost no printable area.
pub const MAX_MARGIN_MM: u32 = 100;

/// Configuration for a notebook-to-PDF conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use ipynb2pdf::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .margin_mm(10)
///     .exclude_input(true)
///     .build()
///     .unwrap();
/// assert_eq!(config.margin_mm, 10);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Margin in millimetres on every side of the A4 page. Default: 25.
    pub margin_mm: u32,

    /// Omit code cells from the output, keeping only their outputs and the
    /// narrative cells. Default: false.
    pub exclude_input: bool,

    /// Inline images referenced by markdown cells as base64 `data:` URIs so
    /// the intermediate HTML is self-contained. Default: true.
    pub embed_images: bool,

    /// Explicit wkhtmltopdf executable. If None, it is located via
    /// `WKHTMLTOPDF_PATH`, `PATH`, then well-known install directories.
    pub renderer_path: Option<PathBuf>,

    /// Optional stage-event callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            margin_mm: DEFAULT_MARGIN_MM,
            exclude_input: false,
            embed_images: true,
            renderer_path: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("margin_mm", &self.margin_mm)
            .field("exclude_input", &self.exclude_input)
            .field("embed_images", &self.embed_images)
            .field("renderer_path", &self.renderer_path)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn margin_mm(mut self, mm: u32) -> Self {
        self.config.margin_mm = mm;
        self
    }

    pub fn exclude_input(mut self, v: bool) -> Self {
        self.config.exclude_input = v;
        self
    }

    pub fn embed_images(mut self, v: bool) -> Self {
        self.config.embed_images = v;
        self
    }

    pub fn renderer_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.renderer_path = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Ipynb2PdfError> {
        let c = &self.config;
        if c.margin_mm > MAX_MARGIN_MM {
            return Err(Ipynb2PdfError::InvalidConfig(format!(
                "Margin must be 0–{MAX_MARGIN_MM} mm, got {}",
                c.margin_mm
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ConversionConfig::default();
        assert_eq!(c.margin_mm, 25);
        assert!(!c.exclude_input);
        assert!(c.embed_images);
        assert!(c.renderer_path.is_none());
        assert!(c.progress_callback.is_none());
    }

    #[test]
    fn builder_sets_fields() {
        let c = ConversionConfig::builder()
            .margin_mm(10)
            .exclude_input(true)
            .embed_images(false)
            .renderer_path("/opt/wk/bin/wkhtmltopdf")
            .build()
            .unwrap();
        assert_eq!(c.margin_mm, 10);
        assert!(c.exclude_input);
        assert!(!c.embed_images);
        assert_eq!(
            c.renderer_path.as_deref(),
            Some(std::path::Path::new("/opt/wk/bin/wkhtmltopdf"))
        );
    }

    #[test]
    fn builder_rejects_oversized_margin() {
        let err = ConversionConfig::builder().margin_mm(101).build().unwrap_err();
        assert!(matches!(err, Ipynb2PdfError::InvalidConfig(_)));
        assert!(err.to_string().contains("101"));
    }

    #[test]
    fn zero_margin_is_valid() {
        assert!(ConversionConfig::builder().margin_mm(0).build().is_ok());
    }

    #[test]
    fn debug_hides_callback() {
        let c = ConversionConfig::builder()
            .progress_callback(std::sync::Arc::new(crate::progress::NoopProgressCallback))
            .build()
            .unwrap();
        assert!(format!("{c:?}").contains("<dyn ConversionProgressCallback>"));
    }
}
