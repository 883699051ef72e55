//! Parser configuration.
//!
//! # Beispiel
//!
//! ```
//! use safesax::ParseOptions;
//!
//! let opts = ParseOptions::default()
//!     .with_max_depth(64)
//!     .with_trim_text(false);
//!
//! assert_eq!(opts.max_depth(), Some(64));
//! assert!(opts.check_end_names());
//! ```

/// Options controlling how the driver configures the XML parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    pub(crate) check_end_names: bool,
    pub(crate) trim_text: bool,
    pub(crate) max_depth: Option<usize>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            check_end_names: true,
            trim_text: false,
            max_depth: None,
        }
    }
}

impl ParseOptions {
    // --- Getter ---

    /// The parser rejects end tags that do not match their start tag.
    pub fn check_end_names(&self) -> bool { self.check_end_names }
    /// Leading and trailing whitespace of each text-element body is removed.
    pub fn trim_text(&self) -> bool { self.trim_text }
    /// Maximum element nesting depth, `None` for unlimited.
    pub fn max_depth(&self) -> Option<usize> { self.max_depth }

    // --- Builder ---

    /// Sets end-tag name checking (default: on).
    ///
    /// Mit `false` wird jedes End-Tag dem zuletzt geöffneten Element zugeordnet.
    pub fn with_check_end_names(mut self, check: bool) -> Self {
        self.check_end_names = check;
        self
    }

    /// Sets text trimming (default: off).
    ///
    /// The whole body of a text element is trimmed once, when it closes;
    /// whitespace inside the body (around entities, CDATA, comments) stays.
    /// [`ContentHandler`](crate::ContentHandler)s driven directly see untrimmed text.
    pub fn with_trim_text(mut self, trim: bool) -> Self {
        self.trim_text = trim;
        self
    }

    /// Limits element nesting depth. The document element has depth 1.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opts = ParseOptions::default();
        assert!(opts.check_end_names());
        assert!(!opts.trim_text());
        assert_eq!(opts.max_depth(), None);
    }

    #[test]
    fn builders() {
        let opts = ParseOptions::default()
            .with_check_end_names(false)
            .with_trim_text(true)
            .with_max_depth(3);
        assert!(!opts.check_end_names());
        assert!(opts.trim_text());
        assert_eq!(opts.max_depth(), Some(3));
        assert_ne!(opts, ParseOptions::default());
    }
}
