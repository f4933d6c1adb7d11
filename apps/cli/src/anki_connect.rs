//! AnkiConnect HTTP client.
//!
//! Every call is a JSON `POST` of `{action, version, params}` to a single
//! endpoint. Replies are an envelope with exactly two keys, `error` and
//! `result`; anything else is a protocol error.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use ankimark_core::{NewNote, NoteInfo, NoteStore, NoteUpdate, Result, SyncError};

/// AnkiConnect API version spoken by this client.
pub const API_VERSION: u32 = 6;

#[derive(Debug, Serialize)]
struct Request<'a> {
    action: &'a str,
    version: u32,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct FieldValue {
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNoteInfo {
    note_id: i64,
    model_name: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    fields: BTreeMap<String, FieldValue>,
}

/// Client for a running AnkiConnect add-on.
#[derive(Debug, Clone)]
pub struct AnkiConnect {
    client: Client,
    endpoint: String,
}

impl AnkiConnect {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Version reported by the add-on.
    pub async fn check_connectivity(&self) -> Result<u32> {
        self.invoke("version", json!({})).await
    }

    async fn invoke<T: DeserializeOwned>(&self, action: &str, params: Value) -> Result<T> {
        tracing::debug!(action, "invoking AnkiConnect");
        let request = Request {
            action,
            version: API_VERSION,
            params,
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| SyncError::RemoteUnreachable(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(protocol(action, &format!("HTTP {status} {message}")));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| protocol(action, &e.to_string()))?;
        let result = open_envelope(action, body)?;
        serde_json::from_value(result).map_err(|e| protocol(action, &e.to_string()))
    }
}

/// Unwrap the `{error, result}` envelope.
fn open_envelope(action: &str, body: Value) -> Result<Value> {
    let Value::Object(mut body) = body else {
        return Err(protocol(action, "response is not an object"));
    };
    check_field_count(action, &body)?;

    let error = body
        .remove("error")
        .ok_or_else(|| protocol(action, "response is missing required error field"))?;
    let result = body
        .remove("result")
        .ok_or_else(|| protocol(action, "response is missing required result field"))?;

    match error {
        Value::Null => Ok(result),
        Value::String(message) => Err(protocol(action, &message)),
        other => Err(protocol(action, &other.to_string())),
    }
}

fn check_field_count(action: &str, body: &Map<String, Value>) -> Result<()> {
    if body.len() != 2 {
        return Err(protocol(action, "response has an unexpected number of fields"));
    }
    Ok(())
}

fn protocol(action: &str, message: &str) -> SyncError {
    SyncError::RemoteProtocol(format!("{action}: {message}"))
}

#[async_trait]
impl NoteStore for AnkiConnect {
    async fn deck_names(&self) -> Result<Vec<String>> {
        self.invoke("deckNames", json!({})).await
    }

    async fn create_deck(&self, name: &str) -> Result<()> {
        let _: Value = self.invoke("createDeck", json!({ "deck": name })).await?;
        Ok(())
    }

    async fn add_note(&self, note: &NewNote) -> Result<i64> {
        let params = json!({
            "note": {
                "deckName": note.deck,
                "modelName": note.model,
                "fields": note.fields,
                "tags": note.tags,
                "options": { "allowDuplicate": false },
            }
        });
        let id: Option<i64> = self.invoke("addNote", params).await?;
        id.ok_or_else(|| protocol("addNote", "note was not created"))
    }

    async fn note_info(&self, id: i64) -> Result<NoteInfo> {
        // Unknown ids come back as empty objects.
        let infos: Vec<Value> = self.invoke("notesInfo", json!({ "notes": [id] })).await?;
        let raw = infos
            .into_iter()
            .next()
            .filter(|info| info.as_object().is_some_and(|o| !o.is_empty()))
            .ok_or_else(|| protocol("notesInfo", &format!("note {id} not found")))?;
        let raw: RawNoteInfo =
            serde_json::from_value(raw).map_err(|e| protocol("notesInfo", &e.to_string()))?;

        Ok(NoteInfo {
            id: raw.note_id,
            model: raw.model_name,
            fields: raw
                .fields
                .into_iter()
                .map(|(name, field)| (name, field.value))
                .collect(),
            tags: raw.tags,
        })
    }

    async fn update_note(&self, update: &NoteUpdate) -> Result<()> {
        if update.model_changed {
            let mut tags = update.existing_tags.clone();
            tags.extend(update.added_tags.iter().cloned());
            let params = json!({
                "note": {
                    "id": update.id,
                    "modelName": update.model,
                    "fields": update.fields,
                    "tags": tags,
                }
            });
            let _: Value = self.invoke("updateNoteModel", params).await?;
            return Ok(());
        }

        let params = json!({ "note": { "id": update.id, "fields": update.fields } });
        let _: Value = self.invoke("updateNoteFields", params).await?;

        if !update.added_tags.is_empty() {
            let params = json!({ "notes": [update.id], "tags": update.added_tags.join(" ") });
            let _: Value = self.invoke("addTags", params).await?;
        }
        Ok(())
    }

    async fn delete_notes(&self, ids: &[i64]) -> Result<()> {
        let _: Value = self.invoke("deleteNotes", json!({ "notes": ids })).await?;
        Ok(())
    }
}
