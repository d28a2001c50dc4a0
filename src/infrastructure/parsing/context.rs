//! Parsing context for one extraction pass

/// Context information for parsing operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseContext {
    /// 1-based page number of the document being parsed
    pub page_number: u32,

    /// Maximum number of listing candidates to examine
    pub limit: usize,
}

impl ParseContext {
    pub const DEFAULT_LIMIT: usize = 20;

    pub const fn new(page_number: u32) -> Self {
        Self {
            page_number,
            limit: Self::DEFAULT_LIMIT,
        }
    }

    /// Set candidate limit
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

impl Default for ParseContext {
    fn default() -> Self {
        Self::new(1)
    }
}
