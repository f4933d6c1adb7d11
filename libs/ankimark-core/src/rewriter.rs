//! Document rewriter.
//!
//! Builds the replacement document from assembler steps and their outcomes.
//! The input text is never touched; the caller swaps in [`DocumentRewriter::finish`].
//!
//! Steps consume input lines in order, so every emitted line keeps the line
//! ending it had in the input. Mixed `\n`/`\r\n` documents stay mixed.

use crate::assembler::CardBlock;
use crate::types::{CardOutcome, Intent};

#[derive(Debug)]
pub struct DocumentRewriter {
    out: String,
    endings: Vec<&'static str>,
    cursor: usize,
    open_last_line: bool,
}

impl DocumentRewriter {
    /// Rewriter for a document whose lines will be fed back in order.
    pub fn for_document(content: &str) -> Self {
        let endings = content
            .split_inclusive('\n')
            .map(|line| {
                if line.ends_with("\r\n") {
                    "\r\n"
                } else if line.ends_with('\n') {
                    "\n"
                } else {
                    ""
                }
            })
            .collect();

        Self {
            out: String::with_capacity(content.len() + 64),
            endings,
            cursor: 0,
            open_last_line: !content.is_empty() && !content.ends_with('\n'),
        }
    }

    /// Copy a line unchanged.
    pub fn keep(&mut self, line: &str) {
        self.out.push_str(line);
        self.end_line();
    }

    /// Emit a card's lines, appending the back-reference of a newly added note.
    pub fn card(&mut self, block: &CardBlock, outcome: &CardOutcome) {
        let mut lines = block.lines.iter();
        if let Some(first) = lines.next() {
            match (outcome.intent, outcome.remote_id) {
                (Intent::Add, Some(id)) => {
                    self.out.push_str(&with_back_reference(first, id));
                    self.end_line();
                }
                _ => self.keep(first),
            }
        }
        for line in lines {
            self.keep(line);
        }
    }

    /// Emit a delete-marker line unless the deletion succeeded.
    pub fn delete_marker(&mut self, line: &str, outcome: &CardOutcome) {
        if outcome.intent == Intent::Delete {
            self.cursor += 1;
        } else {
            self.keep(line);
        }
    }

    pub fn finish(mut self) -> String {
        // A dropped last line must not leave the new last line terminated.
        if self.open_last_line {
            if let Some(stripped) = self.out.strip_suffix('\n') {
                let len = stripped.strip_suffix('\r').unwrap_or(stripped).len();
                self.out.truncate(len);
            }
        }
        self.out
    }

    fn end_line(&mut self) {
        let ending = self.endings.get(self.cursor).copied().unwrap_or("\n");
        self.out.push_str(ending);
        self.cursor += 1;
    }
}

/// Append `\t^<id>` to a line.
pub fn with_back_reference(line: &str, id: i64) -> String {
    format!("{}\t^{id}", line.trim_end())
}
