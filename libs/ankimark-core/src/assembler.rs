//! Card assembler.
//!
//! Consumes the document one line at a time and turns card markup into
//! [`CardDraft`]s. Every input line ends up in exactly one [`Step`], so the
//! rewriter can rebuild the document from the steps alone.
//!
//! # Format
//! ```markdown
//! What does *perro* mean? #CAnki
//! Dog, the animal.
//!
//! perro :: dog #animals
//! perro ::: dog ||Spanish::Animals||
//! The {{sun}} is a star.
//! ^1712345678
//! ```

use crate::classifier::{Classifier, LineClass, TokenMatch};
use crate::error::SyncError;
use crate::fields::{
    extract_back_reference, extract_deck, extract_tags, normalize_cloze, push_unique,
};
use crate::front_matter::FrontMatterDefaults;
use crate::types::{CardDraft, CardModel, SyncSettings};
use serde::Serialize;

/// One unit of assembler output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
    /// Line copied to the output unchanged.
    Passthrough(String),
    /// A complete card and the raw lines it was read from.
    Card(CardBlock),
    /// A bare back-reference asking for the note to be removed.
    Delete { id: i64, line: usize, text: String },
}

/// A card together with its source lines; the first line is the marker line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardBlock {
    pub draft: CardDraft,
    pub lines: Vec<String>,
}

/// Result of assembling a whole document without contacting the store.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedDocument {
    pub front_matter: FrontMatterDefaults,
    pub steps: Vec<Step>,
}

impl ParsedDocument {
    /// Drafts in document order.
    pub fn cards(&self) -> impl Iterator<Item = &CardDraft> {
        self.steps.iter().filter_map(|step| match step {
            Step::Card(block) => Some(&block.draft),
            _ => None,
        })
    }
}

/// Assemble a whole document.
pub fn parse_document(content: &str, settings: &SyncSettings) -> ParsedDocument {
    let lines: Vec<&str> = content.lines().collect();
    let (front_matter, consumed) = FrontMatterDefaults::read(&lines);

    let mut steps: Vec<Step> = lines[..consumed]
        .iter()
        .map(|line| Step::Passthrough((*line).to_string()))
        .collect();

    let mut assembler = Assembler::new(settings);
    for (idx, line) in lines.iter().enumerate().skip(consumed) {
        assembler.feed(idx + 1, line, &mut steps);
    }
    assembler.finish(&mut steps);

    ParsedDocument {
        front_matter,
        steps,
    }
}

/// Multi-line card being accumulated.
struct BlockCard {
    model: CardModel,
    line: usize,
    front: String,
    back: String,
    lines: Vec<String>,
}

impl BlockCard {
    fn into_block(self) -> Option<CardBlock> {
        let (front, front_deck, front_tags) = strip_overrides(&self.front);
        let (back, back_deck, back_tags) = strip_overrides(&self.back);
        let (back, existing_id) = extract_block_reference(&back);

        let draft = build_draft(
            trim_line_ends(&front),
            trim_line_ends(&back),
            front_deck.or(back_deck),
            front_tags,
            back_tags,
            existing_id,
            self.model,
            self.line,
        )?;

        Some(CardBlock {
            draft,
            lines: self.lines,
        })
    }
}

enum State {
    Scanning,
    InBlockCard(BlockCard),
}

/// Line-driven card state machine.
pub struct Assembler {
    classifier: Classifier,
    pending_front: Vec<String>,
    state: State,
}

impl Assembler {
    pub fn new(settings: &SyncSettings) -> Self {
        Self {
            classifier: Classifier::new(&settings.basic_keyword, &settings.inverted_keyword),
            pending_front: Vec::new(),
            state: State::Scanning,
        }
    }

    /// Whether a block card is open.
    pub fn in_block_card(&self) -> bool {
        matches!(self.state, State::InBlockCard(_))
    }

    /// Process one line (1-indexed `line_num`), appending produced steps to `out`.
    pub fn feed(&mut self, line_num: usize, line: &str, out: &mut Vec<Step>) {
        let blank = line.trim().is_empty();

        if let State::InBlockCard(block) = &mut self.state {
            if !blank {
                block.back.push('\n');
                block.back.push_str(line);
                block.lines.push(line.to_string());
                return;
            }
            self.close_block(out);
        }

        if blank {
            self.pending_front.clear();
            out.push(Step::Passthrough(line.to_string()));
            return;
        }

        match self.classifier.locate(line) {
            None => self.push_prose(line, out),
            Some(token) => self.dispatch(line_num, line, token, out),
        }
    }

    /// Flush an open block card at end of input.
    pub fn finish(&mut self, out: &mut Vec<Step>) {
        self.close_block(out);
    }

    fn dispatch(&mut self, line_num: usize, line: &str, token: TokenMatch, out: &mut Vec<Step>) {
        let before = &line[..token.span.start];
        let after = &line[token.span.end..];

        match token.class {
            LineClass::BlockBasicStart | LineClass::BlockInvertedStart => {
                let model = if token.class == LineClass::BlockBasicStart {
                    CardModel::Basic
                } else {
                    CardModel::Inverted
                };
                let mut front = self.pending_front.join("\n");
                if !before.trim().is_empty() {
                    if !front.is_empty() {
                        front.push('\n');
                    }
                    front.push_str(before);
                }
                self.pending_front.clear();
                self.state = State::InBlockCard(BlockCard {
                    model,
                    line: line_num,
                    front,
                    back: after.to_string(),
                    lines: vec![line.to_string()],
                });
            }
            LineClass::InlineBasic | LineClass::InlineInverted => {
                let model = if token.class == LineClass::InlineBasic {
                    CardModel::Basic
                } else {
                    CardModel::Inverted
                };
                match inline_draft(before, after, model, line_num) {
                    Some(draft) => self.push_card(draft, line, out),
                    None => self.push_malformed(line_num, line, out),
                }
            }
            LineClass::ClozeToken => match cloze_draft(line, line_num) {
                Some(draft) => self.push_card(draft, line, out),
                None => self.push_malformed(line_num, line, out),
            },
            LineClass::DeleteMarker => match extract_back_reference(line).1 {
                Some(id) => {
                    self.pending_front.clear();
                    out.push(Step::Delete {
                        id,
                        line: line_num,
                        text: line.to_string(),
                    });
                }
                None => self.push_prose(line, out),
            },
            LineClass::None => self.push_prose(line, out),
        }
    }

    fn close_block(&mut self, out: &mut Vec<Step>) {
        let State::InBlockCard(block) = std::mem::replace(&mut self.state, State::Scanning) else {
            return;
        };
        let line_num = block.line;
        let lines = block.lines.clone();

        match block.into_block() {
            Some(card) => {
                tracing::debug!(line = line_num, model = card.draft.model.as_str(), "block card");
                out.push(Step::Card(card));
            }
            None => {
                tracing::debug!(line = line_num, "malformed block card passed through");
                out.extend(lines.into_iter().map(Step::Passthrough));
            }
        }
        self.pending_front.clear();
    }

    fn push_card(&mut self, draft: CardDraft, line: &str, out: &mut Vec<Step>) {
        tracing::debug!(line = draft.line, model = draft.model.as_str(), "inline card");
        self.pending_front.clear();
        out.push(Step::Card(CardBlock {
            draft,
            lines: vec![line.to_string()],
        }));
    }

    fn push_malformed(&mut self, line_num: usize, line: &str, out: &mut Vec<Step>) {
        let error = SyncError::MalformedCardBody { line: line_num };
        tracing::debug!(error = %error, "passed through as prose");
        self.push_prose(line, out);
    }

    fn push_prose(&mut self, line: &str, out: &mut Vec<Step>) {
        self.pending_front.push(line.to_string());
        out.push(Step::Passthrough(line.to_string()));
    }
}

fn inline_draft(front: &str, back: &str, model: CardModel, line: usize) -> Option<CardDraft> {
    let (front, front_deck, front_tags) = strip_overrides(front);
    let (back, back_deck, back_tags) = strip_overrides(back);
    let (back, existing_id) = extract_back_reference(&back);

    build_draft(
        front,
        back,
        front_deck.or(back_deck),
        front_tags,
        back_tags,
        existing_id,
        model,
        line,
    )
}

fn cloze_draft(line: &str, line_num: usize) -> Option<CardDraft> {
    let normalized = normalize_cloze(line);
    let (text, deck) = extract_deck(&normalized);
    let (text, tags) = extract_tags(&text);
    let (text, existing_id) = extract_back_reference(&text);
    let front = text.trim();

    if front.is_empty() {
        return None;
    }

    Some(CardDraft {
        front: front.to_string(),
        back: String::new(),
        deck_override: deck,
        tags,
        existing_id,
        model: CardModel::Cloze,
        line: line_num,
    })
}

/// Strip the deck override and tags from a fragment.
fn strip_overrides(text: &str) -> (String, Option<String>, Vec<String>) {
    let (text, deck) = extract_deck(text);
    let (text, tags) = extract_tags(&text);
    (text, deck, tags)
}

/// Back-references of block cards sit on the marker line; fall back to the end of the body.
fn extract_block_reference(back: &str) -> (String, Option<i64>) {
    if let Some((first, rest)) = back.split_once('\n') {
        if let (first, Some(id)) = extract_back_reference(first) {
            return (format!("{first}\n{rest}"), Some(id));
        }
    }
    extract_back_reference(back)
}

/// Drop trailing whitespace from every line of a multi-line fragment.
///
/// The rewriter trims the marker line before appending a back-reference, so
/// the same card reads back identically once its id has been written.
fn trim_line_ends(text: &str) -> String {
    text.split('\n')
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

#[allow(clippy::too_many_arguments)]
fn build_draft(
    front: String,
    back: String,
    deck_override: Option<String>,
    front_tags: Vec<String>,
    back_tags: Vec<String>,
    existing_id: Option<i64>,
    model: CardModel,
    line: usize,
) -> Option<CardDraft> {
    let front = front.trim();
    let back = back.trim();
    if front.is_empty() || back.is_empty() {
        return None;
    }

    let mut tags = front_tags;
    for tag in &back_tags {
        push_unique(&mut tags, tag);
    }

    Some(CardDraft {
        front: front.to_string(),
        back: back.to_string(),
        deck_override,
        tags,
        existing_id,
        model,
        line,
    })
}
