//! Recording mock transport shared by the pipeline tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use jsonapi_store::{
    Config, FetchReference, Headers, HttpResponse, Method, NetworkError, RequestInit, Store,
};
use parking_lot::Mutex;
use serde_json::{json, Value};

pub const BASE_URL: &str = "http://api/";

/// One request seen by the mock.
#[derive(Debug, Clone)]
pub struct Call {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
    pub headers: Headers,
}

/// Canned responses keyed by method and URL. Unknown routes answer 404.
#[derive(Default)]
pub struct MockFetch {
    routes: Mutex<HashMap<(Method, String), (u16, Vec<u8>)>>,
    calls: Mutex<Vec<Call>>,
}

impl MockFetch {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, method: Method, url: &str, status: u16, body: Value) {
        let bytes = serde_json::to_vec(&body).unwrap();
        self.routes.lock().insert((method, url.to_string()), (status, bytes));
    }

    /// Respond with no body at all.
    pub fn on_empty(&self, method: Method, url: &str, status: u16) {
        self.routes
            .lock()
            .insert((method, url.to_string()), (status, Vec::new()));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn last_call(&self) -> Call {
        self.calls.lock().last().cloned().unwrap()
    }
}

#[async_trait]
impl FetchReference for MockFetch {
    async fn fetch(&self, url: &str, init: RequestInit) -> Result<HttpResponse, NetworkError> {
        self.calls.lock().push(Call {
            method: init.method,
            url: url.to_string(),
            body: init
                .body
                .as_deref()
                .map(|body| serde_json::from_str(body).unwrap()),
            headers: init.headers.clone(),
        });

        let route = self
            .routes
            .lock()
            .get(&(init.method, url.to_string()))
            .cloned();
        Ok(match route {
            Some((status, body)) => HttpResponse::new(status, body),
            None => HttpResponse::new(
                404,
                serde_json::to_vec(&json!({ "errors": [{ "status": "404" }] })).unwrap(),
            ),
        })
    }
}

pub fn store(mock: &Arc<MockFetch>) -> Store {
    Store::new(
        Config::new()
            .with_base_url(BASE_URL)
            .with_fetch_reference(mock.clone()),
    )
}

/// A persisted `event` with a `self` link and an `organizer` relationship.
pub fn event_document() -> Value {
    json!({
        "data": {
            "id": "1",
            "type": "event",
            "attributes": { "name": "Meetup" },
            "relationships": {
                "organizer": {
                    "data": { "id": "9", "type": "user" },
                    "links": {
                        "self": "http://api/event/1/relationships/organizer",
                        "related": "http://api/event/1/organizer"
                    }
                }
            },
            "links": { "self": "http://api/event/1" }
        }
    })
}
