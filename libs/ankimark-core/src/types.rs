//! Core types for the synchronization pass.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Note model a card is created under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardModel {
    Basic,
    Inverted,
    Cloze,
}

impl CardModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Inverted => "inverted",
            Self::Cloze => "cloze",
        }
    }
}

/// A card recognised in the document, not yet resolved against the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDraft {
    pub front: String,
    pub back: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deck_override: Option<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_id: Option<i64>,
    pub model: CardModel,
    /// 1-indexed line carrying the card marker (and its back-reference).
    pub line: usize,
}

/// What the synchronizer did with a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Add,
    Update,
    Delete,
    Skip,
}

/// Resolution of one card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardOutcome {
    pub intent: Intent,
    pub remote_id: Option<i64>,
}

impl CardOutcome {
    pub fn add(id: i64) -> Self {
        Self {
            intent: Intent::Add,
            remote_id: Some(id),
        }
    }

    pub fn update(id: i64) -> Self {
        Self {
            intent: Intent::Update,
            remote_id: Some(id),
        }
    }

    pub fn delete() -> Self {
        Self {
            intent: Intent::Delete,
            remote_id: None,
        }
    }

    pub fn skip(id: Option<i64>) -> Self {
        Self {
            intent: Intent::Skip,
            remote_id: id,
        }
    }
}

/// A failure confined to a single card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardError {
    pub line: usize,
    pub note_id: Option<i64>,
    pub message: String,
}

/// Summary of one synchronization pass.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub added: usize,
    pub updated: usize,
    pub deleted: usize,
    pub skipped: usize,
    pub errors: Vec<CardError>,
    pub document_changed: bool,
    pub finished_at: DateTime<Utc>,
}

impl Default for SyncReport {
    fn default() -> Self {
        Self {
            added: 0,
            updated: 0,
            deleted: 0,
            skipped: 0,
            errors: Vec::new(),
            document_changed: false,
            finished_at: Utc::now(),
        }
    }
}

impl SyncReport {
    /// Count an outcome.
    pub fn record(&mut self, outcome: &CardOutcome) {
        match outcome.intent {
            Intent::Add => self.added += 1,
            Intent::Update => self.updated += 1,
            Intent::Delete => self.deleted += 1,
            Intent::Skip => self.skipped += 1,
        }
    }

    /// Whether the pass made any remote write.
    pub fn has_changes(&self) -> bool {
        self.added + self.updated + self.deleted > 0
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} added, {} updated, {} deleted, {} unchanged",
            self.added, self.updated, self.deleted, self.skipped
        )?;
        if !self.errors.is_empty() {
            write!(f, ", {} errors", self.errors.len())?;
        }
        Ok(())
    }
}

/// Remote model names per card model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelNames {
    pub basic: String,
    pub inverted: String,
    pub cloze: String,
}

impl Default for ModelNames {
    fn default() -> Self {
        Self {
            basic: "Basic".to_string(),
            inverted: "Basic (and reversed card)".to_string(),
            cloze: "Cloze".to_string(),
        }
    }
}

impl ModelNames {
    pub fn name_for(&self, model: CardModel) -> &str {
        match model {
            CardModel::Basic => &self.basic,
            CardModel::Inverted => &self.inverted,
            CardModel::Cloze => &self.cloze,
        }
    }
}

/// Remote field names the card content is mapped onto.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldNames {
    pub front: String,
    pub back: String,
    pub text: String,
    pub origin: String,
    pub level: String,
    pub lesson: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            front: "Front".to_string(),
            back: "Back".to_string(),
            text: "Text".to_string(),
            origin: "Origen".to_string(),
            level: "Nivel".to_string(),
            lesson: "Lección".to_string(),
        }
    }
}

/// Settings injected into a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub anki_endpoint: String,
    pub basic_keyword: String,
    pub inverted_keyword: String,
    pub default_deck: String,
    pub models: ModelNames,
    pub fields: FieldNames,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            anki_endpoint: "http://127.0.0.1:8765".to_string(),
            basic_keyword: "CAnki".to_string(),
            inverted_keyword: "CIAnki".to_string(),
            default_deck: "Default".to_string(),
            models: ModelNames::default(),
            fields: FieldNames::default(),
        }
    }
}
