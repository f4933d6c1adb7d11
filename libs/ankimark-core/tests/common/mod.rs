//! Shared fakes for synchronization pass tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use ankimark_core::{NewNote, NoteInfo, NoteStore, NoteUpdate, Renderer, Result, SyncError};
use async_trait::async_trait;

/// Renderer wrapping text in a paragraph, like a markdown renderer would.
pub struct ParagraphRenderer;

impl Renderer for ParagraphRenderer {
    fn render(&self, markdown: &str) -> String {
        format!("<p>{}</p>\n", markdown.replace('\n', "<br />\n"))
    }
}

#[derive(Default)]
struct StoreState {
    next_id: i64,
    decks: Vec<String>,
    notes: BTreeMap<i64, NoteInfo>,
    note_decks: BTreeMap<i64, String>,
    writes: Vec<String>,
}

/// In-memory note store that records every write.
#[derive(Default)]
pub struct MemoryStore {
    pub(crate) state: Mutex<StoreState>,
    /// Adds whose front field contains this text fail.
    pub fail_adds_containing: Option<String>,
    /// Every call fails as if the store were down.
    pub unreachable: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        let store = Self::default();
        store.state.lock().unwrap().next_id = 1000;
        store
    }

    pub fn with_note(self, note: NoteInfo) -> Self {
        self.state.lock().unwrap().notes.insert(note.id, note);
        self
    }

    pub fn with_deck(self, deck: &str) -> Self {
        self.state.lock().unwrap().decks.push(deck.to_string());
        self
    }

    pub fn note(&self, id: i64) -> Option<NoteInfo> {
        self.state.lock().unwrap().notes.get(&id).cloned()
    }

    pub fn deck_of(&self, id: i64) -> Option<String> {
        self.state.lock().unwrap().note_decks.get(&id).cloned()
    }

    pub fn note_count(&self) -> usize {
        self.state.lock().unwrap().notes.len()
    }

    pub fn decks(&self) -> Vec<String> {
        self.state.lock().unwrap().decks.clone()
    }

    /// Write calls in order, e.g. `addNote 1000`.
    pub fn writes(&self) -> Vec<String> {
        self.state.lock().unwrap().writes.clone()
    }

    fn check_reachable(&self) -> Result<()> {
        if self.unreachable {
            return Err(SyncError::RemoteUnreachable("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl NoteStore for MemoryStore {
    async fn deck_names(&self) -> Result<Vec<String>> {
        self.check_reachable()?;
        Ok(self.decks())
    }

    async fn create_deck(&self, name: &str) -> Result<()> {
        self.check_reachable()?;
        let mut state = self.state.lock().unwrap();
        state.writes.push(format!("createDeck {name}"));
        if !state.decks.iter().any(|d| d == name) {
            state.decks.push(name.to_string());
        }
        Ok(())
    }

    async fn add_note(&self, note: &NewNote) -> Result<i64> {
        self.check_reachable()?;
        if let Some(needle) = &self.fail_adds_containing {
            if note.fields.values().any(|v| v.contains(needle.as_str())) {
                return Err(SyncError::RemoteProtocol(
                    "cannot create note because it is a duplicate".to_string(),
                ));
            }
        }
        let mut state = self.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        state.writes.push(format!("addNote {id}"));
        state.note_decks.insert(id, note.deck.clone());
        state.notes.insert(
            id,
            NoteInfo {
                id,
                model: note.model.clone(),
                fields: note.fields.clone(),
                tags: note.tags.clone(),
            },
        );
        Ok(id)
    }

    async fn note_info(&self, id: i64) -> Result<NoteInfo> {
        self.check_reachable()?;
        self.note(id)
            .ok_or_else(|| SyncError::RemoteProtocol(format!("note {id} not found")))
    }

    async fn update_note(&self, update: &NoteUpdate) -> Result<()> {
        self.check_reachable()?;
        let mut state = self.state.lock().unwrap();
        state.writes.push(format!("updateNote {}", update.id));
        let note = state
            .notes
            .get_mut(&update.id)
            .ok_or_else(|| SyncError::RemoteProtocol(format!("note {} not found", update.id)))?;
        note.model = update.model.clone();
        for (name, value) in &update.fields {
            note.fields.insert(name.clone(), value.clone());
        }
        note.tags.extend(update.added_tags.iter().cloned());
        Ok(())
    }

    async fn delete_notes(&self, ids: &[i64]) -> Result<()> {
        self.check_reachable()?;
        let mut state = self.state.lock().unwrap();
        for id in ids {
            state.writes.push(format!("deleteNotes {id}"));
            state.notes.remove(id);
        }
        Ok(())
    }
}

/// A basic note as the synchronizer would have written it.
pub fn basic_note(id: i64, front: &str, back: &str) -> NoteInfo {
    NoteInfo {
        id,
        model: "Basic".to_string(),
        fields: BTreeMap::from([
            ("Front".to_string(), format!("<p>{front}</p>")),
            ("Back".to_string(), format!("<p>{back}</p>")),
        ]),
        tags: Vec::new(),
    }
}
