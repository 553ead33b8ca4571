//! HTTP transport integration tests.
//!
//! Starts an axum server and exercises it through the reqwest fetch primitive.

use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use jsonapi_store::{Config, Error, Method, RequestOptions, Store};
use serde_json::{json, Value};

fn event(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "type": "event",
        "attributes": { "name": name }
    })
}

fn router() -> Router {
    Router::new()
        .route(
            "/event",
            get(|headers: HeaderMap| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Json(json!({
                    "data": [event("1", "Meetup"), event("2", "Conf")],
                    "meta": { "auth": auth }
                }))
            })
            .post(|Json(body): Json<Value>| async move {
                let name = body["data"]["attributes"]["name"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string();
                (
                    StatusCode::CREATED,
                    Json(json!({ "data": {
                        "id": "3",
                        "type": "event",
                        "attributes": { "name": name }
                    }})),
                )
            }),
        )
        .route(
            "/event/:id",
            get(|Path(id): Path<String>| async move {
                if id == "1" {
                    (StatusCode::OK, Json(json!({ "data": event("1", "Meetup") })))
                } else {
                    (
                        StatusCode::NOT_FOUND,
                        Json(json!({ "errors": [{ "status": "404" }] })),
                    )
                }
            })
            .delete(|| async { StatusCode::NO_CONTENT }),
        )
}

/// Bind to port 0 and return the actual address.
async fn start_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router()).await.unwrap();
    });
    format!("http://{addr}/")
}

async fn test_store() -> Store {
    let base = start_server().await;
    Store::new(Config::new().with_base_url(base))
}

#[tokio::test]
async fn fetch_all_over_http() {
    let store = test_store().await;
    let options = RequestOptions::new().header("authorization", "Bearer t");

    let response = store.fetch_all("event", Some(&options)).await.into_result().unwrap();

    assert_eq!(response.status(), Some(200));
    assert_eq!(response.meta().unwrap()["auth"], "Bearer t");
    let names: Vec<Value> = response
        .records()
        .iter()
        .filter_map(|r| r.get("name"))
        .collect();
    assert_eq!(names, vec![json!("Meetup"), json!("Conf")]);
}

#[tokio::test]
async fn not_found_over_http() {
    let store = test_store().await;

    let response = store.fetch("event", 99, None).await;

    assert_eq!(response.status(), Some(404));
    assert_eq!(response.error().unwrap().status_code(), Some(404));
    assert!(response.data().is_empty());
}

#[tokio::test]
async fn create_then_delete_over_http() {
    let store = test_store().await;
    let draft = store.add("event", json!({ "name": "Workshop" })).unwrap();

    let created = draft.save(None).await.unwrap();
    assert_eq!(created.id().to_string(), "3");
    assert_eq!(created.get("name"), Some(json!("Workshop")));
    assert!(created.is_persisted());

    assert!(created.remove(None).await.unwrap());
    assert!(store.find("event", created.id()).unwrap().is_none());
}

#[tokio::test]
async fn no_content_over_http() {
    let store = test_store().await;

    let response = store.request("event/1", Method::Delete, None, None).await;

    assert_eq!(response.status(), Some(204));
    assert!(response.error().is_none());
    assert!(response.data().is_empty());
}

#[tokio::test]
async fn refused_connection_is_a_transport_error() {
    let store = Store::new(Config::new().with_base_url("http://127.0.0.1:1/"));

    let response = store.fetch_all("event", None).await;

    assert_eq!(response.status(), None);
    let err = response.into_result().unwrap_err();
    assert!(matches!(err, Error::Network(jsonapi_store::NetworkError::Transport(_))));
}
