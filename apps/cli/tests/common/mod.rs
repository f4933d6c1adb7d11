//! Fake AnkiConnect endpoint for client tests.
//!
//! The fake is an axum router bound to an ephemeral local port. Every request
//! body is recorded; replies come from a responder closure keyed on the action.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::{extract::State, routing::post, Json, Router};
use serde_json::{json, Value};

type Responder = Arc<dyn Fn(&str, &Value) -> Value + Send + Sync>;

#[derive(Clone)]
struct MockState {
    respond: Responder,
    requests: Arc<Mutex<Vec<Value>>>,
}

/// Running fake endpoint.
pub struct MockAnki {
    pub url: String,
    requests: Arc<Mutex<Vec<Value>>>,
}

impl MockAnki {
    /// Serve replies produced by `respond(action, params)`.
    pub async fn start<F>(respond: F) -> Self
    where
        F: Fn(&str, &Value) -> Value + Send + Sync + 'static,
    {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            respond: Arc::new(respond),
            requests: requests.clone(),
        };
        let app = Router::new().route("/", post(handle)).with_state(state);
        Self {
            url: serve(app).await,
            requests,
        }
    }

    /// Request bodies received so far.
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    /// Actions received so far, in order.
    pub fn actions(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| r["action"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

async fn handle(State(state): State<MockState>, Json(body): Json<Value>) -> Json<Value> {
    state.requests.lock().unwrap().push(body.clone());
    let action = body["action"].as_str().unwrap_or_default().to_string();
    Json((state.respond)(&action, &body["params"]))
}

/// Bind a router to `127.0.0.1:0` and return its base URL.
pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// URL of a local port nothing listens on.
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub fn ok(result: Value) -> Value {
    json!({ "error": null, "result": result })
}

pub fn err(message: &str) -> Value {
    json!({ "error": message, "result": null })
}

/// In-memory Anki collection answering the actions the client uses.
#[derive(Default)]
pub struct Collection {
    next_id: i64,
    pub decks: Vec<String>,
    pub notes: BTreeMap<i64, Value>,
    pub note_decks: BTreeMap<i64, String>,
}

impl Collection {
    pub fn shared() -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(Self {
            next_id: 1_700_000_000_000,
            decks: vec!["Default".to_string()],
            ..Default::default()
        }))
    }

    fn reply(&mut self, action: &str, params: &Value) -> Value {
        match action {
            "version" => ok(json!(6)),
            "deckNames" => ok(json!(self.decks)),
            "createDeck" => {
                let deck = params["deck"].as_str().unwrap_or_default().to_string();
                if !self.decks.contains(&deck) {
                    self.decks.push(deck);
                }
                ok(json!(1))
            }
            "addNote" => {
                let note = &params["note"];
                let id = self.next_id;
                self.next_id += 1;
                let fields: serde_json::Map<String, Value> = note["fields"]
                    .as_object()
                    .cloned()
                    .unwrap_or_default()
                    .into_iter()
                    .enumerate()
                    .map(|(order, (name, value))| (name, json!({ "value": value, "order": order })))
                    .collect();
                self.notes.insert(
                    id,
                    json!({
                        "noteId": id,
                        "modelName": note["modelName"],
                        "tags": note["tags"],
                        "fields": fields,
                        "cards": [id + 1],
                    }),
                );
                self.note_decks
                    .insert(id, note["deckName"].as_str().unwrap_or_default().to_string());
                ok(json!(id))
            }
            "notesInfo" => {
                let infos: Vec<Value> = params["notes"]
                    .as_array()
                    .cloned()
                    .unwrap_or_default()
                    .iter()
                    .map(|id| {
                        id.as_i64()
                            .and_then(|id| self.notes.get(&id).cloned())
                            .unwrap_or_else(|| json!({}))
                    })
                    .collect();
                ok(json!(infos))
            }
            "updateNoteFields" => {
                let id = params["note"]["id"].as_i64().unwrap_or_default();
                let Some(stored) = self.notes.get_mut(&id) else {
                    return err("Note was not found");
                };
                if let Some(fields) = params["note"]["fields"].as_object() {
                    for (name, value) in fields {
                        stored["fields"][name]["value"] = value.clone();
                    }
                }
                ok(Value::Null)
            }
            "addTags" => {
                let tags = params["tags"].as_str().unwrap_or_default().to_string();
                for id in params["notes"].as_array().cloned().unwrap_or_default() {
                    if let Some(stored) = id.as_i64().and_then(|id| self.notes.get_mut(&id)) {
                        if let Some(list) = stored["tags"].as_array_mut() {
                            list.extend(tags.split_whitespace().map(|t| json!(t)));
                        }
                    }
                }
                ok(Value::Null)
            }
            "deleteNotes" => {
                for id in params["notes"].as_array().cloned().unwrap_or_default() {
                    if let Some(id) = id.as_i64() {
                        self.notes.remove(&id);
                    }
                }
                ok(Value::Null)
            }
            other => err(&format!("unsupported action {other}")),
        }
    }
}

/// Fake endpoint backed by a shared collection.
pub async fn start_collection(collection: Arc<Mutex<Collection>>) -> MockAnki {
    MockAnki::start(move |action, params| collection.lock().unwrap().reply(action, params)).await
}
