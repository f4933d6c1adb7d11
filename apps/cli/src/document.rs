//! File-backed editor.

use std::io::Write;
use std::path::{Path, PathBuf};

use ankimark_core::{Editor, Result, SyncError};

/// Editor over a markdown file on disk.
///
/// Writes go to a sibling temporary file that is renamed over the document,
/// so a reader never sees a half-written file.
#[derive(Debug, Clone)]
pub struct FileEditor {
    path: PathBuf,
}

impl FileEditor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.path
            .with_file_name(format!(".{name}.ankimark-{}.tmp", std::process::id()))
    }
}

impl Editor for FileEditor {
    fn text(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "cannot read document");
                None
            }
        }
    }

    fn set_text(&mut self, text: &str) -> Result<()> {
        let temp = self.temp_path();
        let write = || -> std::io::Result<()> {
            let mut file = std::fs::File::create(&temp)?;
            file.write_all(text.as_bytes())?;
            file.sync_all()?;
            std::fs::rename(&temp, &self.path)
        };

        write().map_err(|e| {
            let _ = std::fs::remove_file(&temp);
            SyncError::DocumentWrite(format!("{}: {e}", self.path.display()))
        })?;
        tracing::debug!(path = %self.path.display(), bytes = text.len(), "document written");
        Ok(())
    }
}
