//! Front matter reader.
//!
//! # Format
//! ```markdown
//! ---
//! Deck-Anki: Spanish
//! Origen-Anki: Textbook
//! Nivel-Anki: A1
//! Lección-Anki: 3
//! tags:
//!   - vocabulary
//!   - verbs
//! ---
//! ```

use crate::fields::push_unique;
use serde::Serialize;

const DELIMITER: &str = "---";

/// Defaults supplied by the leading metadata block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FrontMatterDefaults {
    pub deck: String,
    pub origin: String,
    pub level: String,
    pub lesson: String,
    pub tags: Vec<String>,
}

impl FrontMatterDefaults {
    /// Read the block at the top of `lines`.
    ///
    /// Returns the defaults and the number of lines consumed, delimiters
    /// included. Without an opening delimiter on the first line, or without a
    /// closing one, nothing is consumed and the defaults are empty.
    pub fn read(lines: &[&str]) -> (Self, usize) {
        let mut reader = Reader::default();

        match lines.first() {
            Some(first) if first.trim_end() == DELIMITER => {}
            _ => return (Self::default(), 0),
        }

        for (idx, line) in lines.iter().enumerate().skip(1) {
            if line.trim_end() == DELIMITER {
                return (reader.defaults, idx + 1);
            }
            reader.process_line(line);
        }

        (Self::default(), 0)
    }
}

enum LineType<'a> {
    Deck(&'a str),
    Origin(&'a str),
    Level(&'a str),
    Lesson(&'a str),
    Tags(&'a str),
    /// `- value` at any indentation, not only the two-space form.
    ListItem(&'a str),
    Empty,
    Other,
}

#[derive(Default)]
struct Reader {
    defaults: FrontMatterDefaults,
    in_tag_list: bool,
}

impl Reader {
    fn process_line(&mut self, line: &str) {
        let line_type = Self::parse_line(line);

        if self.in_tag_list {
            match line_type {
                LineType::ListItem(value) => {
                    self.push_tag(value);
                    return;
                }
                LineType::Empty => return,
                _ => self.in_tag_list = false,
            }
        }

        match line_type {
            LineType::Deck(value) => self.defaults.deck = value.to_string(),
            LineType::Origin(value) => self.defaults.origin = value.to_string(),
            LineType::Level(value) => self.defaults.level = value.to_string(),
            LineType::Lesson(value) => self.defaults.lesson = value.to_string(),
            LineType::Tags(inline) => {
                if inline.is_empty() {
                    self.in_tag_list = true;
                } else {
                    let inline = inline.trim_start_matches('[').trim_end_matches(']');
                    for value in inline.split(',') {
                        self.push_tag(value);
                    }
                }
            }
            LineType::ListItem(_) | LineType::Empty | LineType::Other => {}
        }
    }

    fn parse_line(line: &str) -> LineType<'_> {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            LineType::Empty
        } else if let Some(rest) = trimmed.strip_prefix("Deck-Anki:") {
            LineType::Deck(rest.trim())
        } else if let Some(rest) = trimmed.strip_prefix("Origen-Anki:") {
            LineType::Origin(rest.trim())
        } else if let Some(rest) = trimmed.strip_prefix("Nivel-Anki:") {
            LineType::Level(rest.trim())
        } else if let Some(rest) = trimmed
            .strip_prefix("Lección-Anki:")
            .or_else(|| trimmed.strip_prefix("Leccion-Anki:"))
        {
            LineType::Lesson(rest.trim())
        } else if let Some(rest) = trimmed
            .strip_prefix("tags:")
            .or_else(|| trimmed.strip_prefix("Tags:"))
        {
            LineType::Tags(rest.trim())
        } else if let Some(rest) = trimmed.strip_prefix('-') {
            LineType::ListItem(rest.trim())
        } else {
            LineType::Other
        }
    }

    fn push_tag(&mut self, raw: &str) {
        let tag = raw
            .trim()
            .trim_matches(|c| c == '"' || c == '\'')
            .trim_start_matches('#');
        if !tag.is_empty() {
            push_unique(&mut self.defaults.tags, tag);
        }
    }
}
