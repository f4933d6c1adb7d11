//! Editing surface the document is read from and written back to.

use crate::error::Result;

/// Host document access.
pub trait Editor {
    /// Current document text, or `None` without an active document.
    fn text(&self) -> Option<String>;

    /// Replace the whole document.
    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// Editor holding the document in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryEditor {
    content: Option<String>,
    writes: usize,
}

impl MemoryEditor {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            writes: 0,
        }
    }

    /// Editor without an active document.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Number of `set_text` calls so far.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl Editor for MemoryEditor {
    fn text(&self) -> Option<String> {
        self.content.clone()
    }

    fn set_text(&mut self, text: &str) -> Result<()> {
        self.content = Some(text.to_string());
        self.writes += 1;
        Ok(())
    }
}
