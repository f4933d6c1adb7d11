//! Line classifier.
//!
//! Six token classes are searched for in every line. The class whose token
//! starts leftmost wins; on an exact tie the earlier class in declaration
//! order wins:
//!
//! 1. cloze span `{{...}}`
//! 2. inverted inline separator `:::`
//! 3. basic inline separator `::`
//! 4. basic block marker `#<basic keyword>`
//! 5. inverted block marker `#<inverted keyword>`
//! 6. delete marker `^<digits>` at end of line

use crate::fields::{back_reference_regex, cloze_regex};
use serde::Serialize;
use std::ops::Range;

/// Classification of a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineClass {
    ClozeToken,
    InlineInverted,
    InlineBasic,
    BlockBasicStart,
    BlockInvertedStart,
    DeleteMarker,
    None,
}

impl LineClass {
    /// Classes in tie-break order.
    const DECLARED: [LineClass; 6] = [
        Self::ClozeToken,
        Self::InlineInverted,
        Self::InlineBasic,
        Self::BlockBasicStart,
        Self::BlockInvertedStart,
        Self::DeleteMarker,
    ];
}

/// The winning token of a line and its byte span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMatch {
    pub class: LineClass,
    pub span: Range<usize>,
}

/// Classifier configured with the block-card keywords.
#[derive(Debug, Clone)]
pub struct Classifier {
    basic_marker: String,
    inverted_marker: String,
}

impl Classifier {
    pub fn new(basic_keyword: &str, inverted_keyword: &str) -> Self {
        Self {
            basic_marker: format!("#{}", basic_keyword.trim_start_matches('#')),
            inverted_marker: format!("#{}", inverted_keyword.trim_start_matches('#')),
        }
    }

    /// Classify a line.
    pub fn classify(&self, line: &str) -> LineClass {
        self.locate(line).map_or(LineClass::None, |m| m.class)
    }

    /// Find the leftmost token of a line, if any.
    pub fn locate(&self, line: &str) -> Option<TokenMatch> {
        let mut best: Option<TokenMatch> = None;

        for class in LineClass::DECLARED {
            let Some(span) = self.find(class, line) else {
                continue;
            };
            // Strict comparison keeps the first-declared class on ties.
            if best.as_ref().map_or(true, |b| span.start < b.span.start) {
                best = Some(TokenMatch { class, span });
            }
        }

        best
    }

    fn find(&self, class: LineClass, line: &str) -> Option<Range<usize>> {
        match class {
            LineClass::ClozeToken => cloze_regex().find(line).map(|m| m.range()),
            LineClass::InlineInverted => find_literal(line, ":::"),
            LineClass::InlineBasic => find_literal(line, "::"),
            LineClass::BlockBasicStart => find_keyword(line, &self.basic_marker),
            LineClass::BlockInvertedStart => find_keyword(line, &self.inverted_marker),
            LineClass::DeleteMarker => back_reference_regex().find(line).map(|m| m.range()),
            LineClass::None => None,
        }
    }
}

fn find_literal(line: &str, needle: &str) -> Option<Range<usize>> {
    line.find(needle).map(|start| start..start + needle.len())
}

/// Find `marker` where it is not merely the prefix of a longer word.
fn find_keyword(line: &str, marker: &str) -> Option<Range<usize>> {
    line.match_indices(marker)
        .map(|(start, _)| start..start + marker.len())
        .find(|span| {
            line[span.end..]
                .chars()
                .next()
                .map_or(true, |c| !(c.is_alphanumeric() || c == '_'))
        })
}
