//! Synchronizer deciding what each card means for the note store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::error::Result;
use crate::fields::push_unique;
use crate::front_matter::FrontMatterDefaults;
use crate::render::{compact_html, Renderer};
use crate::types::{CardDraft, CardModel, CardOutcome, SyncSettings};

/// Note to be created remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNote {
    pub deck: String,
    pub model: String,
    pub fields: BTreeMap<String, String>,
    pub tags: Vec<String>,
}

/// Current remote state of a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteInfo {
    pub id: i64,
    pub model: String,
    pub fields: BTreeMap<String, String>,
    pub tags: Vec<String>,
}

/// Changes to apply to an existing note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteUpdate {
    pub id: i64,
    pub model: String,
    pub model_changed: bool,
    pub fields: BTreeMap<String, String>,
    /// Tags the note already carries remotely.
    pub existing_tags: Vec<String>,
    /// Tags missing remotely.
    pub added_tags: Vec<String>,
}

/// Remote flashcard store.
#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn deck_names(&self) -> Result<Vec<String>>;
    async fn create_deck(&self, name: &str) -> Result<()>;
    async fn add_note(&self, note: &NewNote) -> Result<i64>;
    async fn note_info(&self, id: i64) -> Result<NoteInfo>;
    async fn update_note(&self, update: &NoteUpdate) -> Result<()>;
    async fn delete_notes(&self, ids: &[i64]) -> Result<()>;
}

/// Deck names known to exist remotely during one pass.
#[derive(Debug, Clone, Default)]
pub struct DeckCatalog {
    names: HashSet<String>,
}

impl DeckCatalog {
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        Self {
            names: names.into_iter().collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn insert(&mut self, name: &str) {
        self.names.insert(name.to_string());
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Resolves drafts against a [`NoteStore`].
///
/// The synchronizer is the only writer of its [`DeckCatalog`]; a deck created
/// for one card is visible to every later card of the pass.
pub struct Synchronizer<'a, S, R> {
    store: &'a S,
    renderer: &'a R,
    settings: &'a SyncSettings,
    catalog: DeckCatalog,
}

impl<'a, S: NoteStore, R: Renderer> Synchronizer<'a, S, R> {
    pub fn new(store: &'a S, renderer: &'a R, settings: &'a SyncSettings) -> Self {
        Self {
            store,
            renderer,
            settings,
            catalog: DeckCatalog::default(),
        }
    }

    /// Load the remote deck names; a failure leaves the catalog empty.
    pub async fn load_catalog(&mut self) {
        match self.store.deck_names().await {
            Ok(names) => {
                self.catalog = DeckCatalog::new(names);
                tracing::debug!(decks = self.catalog.len(), "loaded deck catalog");
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not list decks, starting with an empty catalog");
                self.catalog = DeckCatalog::default();
            }
        }
    }

    pub fn catalog(&self) -> &DeckCatalog {
        &self.catalog
    }

    /// Resolve a draft to add, update or skip.
    pub async fn resolve(
        &mut self,
        draft: &CardDraft,
        defaults: &FrontMatterDefaults,
    ) -> Result<CardOutcome> {
        let model = self.settings.models.name_for(draft.model).to_string();
        let fields = self.note_fields(draft, defaults);
        let tags = merged_tags(draft, defaults);

        match draft.existing_id {
            Some(id) => self.update(id, model, fields, tags).await,
            None => {
                let deck = self.effective_deck(draft, defaults);
                self.ensure_deck(&deck).await?;
                let id = self
                    .store
                    .add_note(&NewNote {
                        deck,
                        model,
                        fields,
                        tags,
                    })
                    .await?;
                tracing::debug!(line = draft.line, id, "added note");
                Ok(CardOutcome::add(id))
            }
        }
    }

    /// Remove a note by id.
    pub async fn delete(&mut self, id: i64) -> Result<CardOutcome> {
        self.store.delete_notes(&[id]).await?;
        tracing::debug!(id, "deleted note");
        Ok(CardOutcome::delete())
    }

    async fn update(
        &mut self,
        id: i64,
        model: String,
        fields: BTreeMap<String, String>,
        tags: Vec<String>,
    ) -> Result<CardOutcome> {
        let info = self.store.note_info(id).await?;

        let model_changed = info.model != model;
        // Fields the remote model lacks cannot differ.
        let fields_changed = fields
            .iter()
            .any(|(name, value)| info.fields.get(name).is_some_and(|remote| remote != value));
        let added_tags: Vec<String> = tags
            .into_iter()
            .filter(|tag| {
                let lowered = tag.to_lowercase();
                !info.tags.iter().any(|t| t.to_lowercase() == lowered)
            })
            .collect();

        if !model_changed && !fields_changed && added_tags.is_empty() {
            return Ok(CardOutcome::skip(Some(id)));
        }

        self.store
            .update_note(&NoteUpdate {
                id,
                model,
                model_changed,
                fields,
                existing_tags: info.tags,
                added_tags,
            })
            .await?;
        tracing::debug!(id, model_changed, fields_changed, "updated note");
        Ok(CardOutcome::update(id))
    }

    async fn ensure_deck(&mut self, deck: &str) -> Result<()> {
        if self.catalog.contains(deck) {
            return Ok(());
        }
        self.store.create_deck(deck).await?;
        self.catalog.insert(deck);
        tracing::info!(deck, "created deck");
        Ok(())
    }

    fn effective_deck(&self, draft: &CardDraft, defaults: &FrontMatterDefaults) -> String {
        draft
            .deck_override
            .clone()
            .or_else(|| Some(defaults.deck.clone()).filter(|deck| !deck.is_empty()))
            .unwrap_or_else(|| self.settings.default_deck.clone())
    }

    fn note_fields(
        &self,
        draft: &CardDraft,
        defaults: &FrontMatterDefaults,
    ) -> BTreeMap<String, String> {
        let names = &self.settings.fields;
        let mut fields = BTreeMap::new();

        match draft.model {
            CardModel::Cloze => {
                fields.insert(names.text.clone(), self.render(&draft.front));
            }
            CardModel::Basic | CardModel::Inverted => {
                fields.insert(names.front.clone(), self.render(&draft.front));
                fields.insert(names.back.clone(), self.render(&draft.back));
            }
        }

        for (name, value) in [
            (&names.origin, &defaults.origin),
            (&names.level, &defaults.level),
            (&names.lesson, &defaults.lesson),
        ] {
            if !value.is_empty() {
                fields.insert(name.clone(), value.clone());
            }
        }

        fields
    }

    fn render(&self, markdown: &str) -> String {
        compact_html(&self.renderer.render(markdown))
    }
}

fn merged_tags(draft: &CardDraft, defaults: &FrontMatterDefaults) -> Vec<String> {
    let mut tags = defaults.tags.clone();
    for tag in &draft.tags {
        push_unique(&mut tags, tag);
    }
    tags
}
