//! Fixed print stylesheet for A4 output.
//!
//! Prepended verbatim to the exported HTML. The selectors target the class
//! names emitted by [`crate::pipeline::export`].

/// A4 print layout rules.
pub const PRINT_CSS: &str = r#"
<style>
    /* Page margins and layout */
    body {
        margin: 0;
        padding: 10px;
        font-family: Arial, sans-serif;
    }

    /* Ensure images fit on A4 page */
    img, .output {
        max-width: 90%;
        height: auto;
    }

    /* Compact cell spacing */
    .input, .output {
        margin: 5px 0;
        padding: 5px;
        font-size: 12px;
    }

    /* Code block styling */
    .input_area {
        background-color: #f5f5f5;
        border-left: 3px solid #3b7ea1;
        padding: 10px;
        overflow-x: auto;
    }

    /* Output area styling */
    .output_area {
        padding: 5px;
    }

    /* Prevent page breaks inside code blocks */
    .cell {
        page-break-inside: avoid;
    }
</style>
"#;

/// Prepend [`PRINT_CSS`] to `html`.
pub fn with_print_css(html: &str) -> String {
    let mut styled = String::with_capacity(PRINT_CSS.len() + html.len());
    styled.push_str(PRINT_CSS);
    styled.push_str(html);
    styled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_comes_first() {
        let styled = with_print_css("<html></html>");
        assert!(styled.starts_with("\n<style>"));
        assert!(styled.ends_with("<html></html>"));
    }

    #[test]
    fn css_covers_print_rules() {
        assert!(PRINT_CSS.contains("margin: 0;"));
        assert!(PRINT_CSS.contains("max-width: 90%;"));
        assert!(PRINT_CSS.contains("font-size: 12px;"));
        assert!(PRINT_CSS.contains("border-left: 3px solid #3b7ea1;"));
        assert!(PRINT_CSS.contains("background-color: #f5f5f5;"));
        assert!(PRINT_CSS.contains("page-break-inside: avoid;"));
    }
}
