//! Reader options and configuration.

/// Options controlling how a PDF is read and analysed.
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Error handling mode for individual pages
    pub error_mode: ErrorMode,

    /// Analyse page layouts in parallel (rayon)
    pub parallel: bool,

    /// Only read the first `n` pages
    pub max_pages: Option<u32>,

    /// Run table detection on every page layout
    pub detect_tables: bool,
}

impl ReaderOptions {
    /// Create new reader options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Enable lenient mode (unreadable pages become empty).
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Limit the number of pages read.
    pub fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Enable or disable table detection.
    pub fn with_tables(mut self, detect: bool) -> Self {
        self.detect_tables = detect;
        self
    }
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Lenient,
            parallel: true,
            max_pages: None,
            detect_tables: false,
        }
    }
}

/// Error handling mode during page analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on any page error
    Strict,
    /// Log the error and treat the page as empty
    #[default]
    Lenient,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_options_builder() {
        let options = ReaderOptions::new()
            .with_error_mode(ErrorMode::Strict)
            .with_max_pages(Some(5))
            .with_tables(true)
            .sequential();

        assert_eq!(options.error_mode, ErrorMode::Strict);
        assert_eq!(options.max_pages, Some(5));
        assert!(options.detect_tables);
        assert!(!options.parallel);
    }

    #[test]
    fn test_reader_options_default() {
        let options = ReaderOptions::default();
        assert_eq!(options.error_mode, ErrorMode::Lenient);
        assert!(options.parallel);
        assert!(options.max_pages.is_none());
        assert!(!options.detect_tables);
    }
}
