//! Core library for synchronizing markdown flashcard notes with Anki.
//!
//! Provides:
//! - Front matter reader for per-document defaults
//! - Line classifier and card assembler for the inline card markup
//! - Field extraction (deck overrides, tags, back-references, cloze groups)
//! - Synchronizer deciding add / update / skip / delete against a note store
//! - Document rewriter writing back-references into the source text

pub mod assembler;
pub mod classifier;
pub mod editor;
pub mod engine;
pub mod error;
pub mod fields;
pub mod front_matter;
pub mod render;
pub mod rewriter;
pub mod sync;
pub mod types;

pub use assembler::{parse_document, Assembler, CardBlock, ParsedDocument, Step};
pub use classifier::{Classifier, LineClass, TokenMatch};
pub use editor::{Editor, MemoryEditor};
pub use engine::sync_document;
pub use error::{Result, SyncError};
pub use front_matter::FrontMatterDefaults;
pub use render::{compact_html, Renderer};
pub use rewriter::DocumentRewriter;
pub use sync::{DeckCatalog, NewNote, NoteInfo, NoteStore, NoteUpdate, Synchronizer};
pub use types::{
    CardDraft, CardError, CardModel, CardOutcome, FieldNames, Intent, ModelNames, SyncReport,
    SyncSettings,
};
