use jsonapi_store::network;
use jsonapi_store::{Link, Method, NetworkError, RequestOptions};
use serde_json::json;

use crate::support::{store, MockFetch};

#[tokio::test]
async fn fetch_all_materializes_into_store() {
    let mock = MockFetch::new();
    mock.on(
        Method::Get,
        "http://api/event",
        200,
        json!({ "data": [
            { "id": "1", "type": "event", "attributes": { "name": "A" } },
            { "id": "2", "type": "event", "attributes": { "name": "B" } }
        ]}),
    );
    let store = store(&mock);

    let response = store.fetch_all("event", None).await.into_result().unwrap();

    let records = response.records();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.is_persisted()));
    let found = store.find("event", records[1].id()).unwrap().unwrap();
    assert!(found.ptr_eq(&records[1]));
}

#[tokio::test]
async fn no_content_is_success_without_data() {
    let mock = MockFetch::new();
    mock.on_empty(Method::Delete, "http://api/event/1", 204);
    let store = store(&mock);

    let response = store.request("event/1", Method::Delete, None, None).await;

    assert_eq!(response.status(), Some(204));
    assert!(response.error().is_none());
    assert!(response.raw_data().is_none());
    assert!(response.data().is_empty());
}

#[tokio::test]
async fn error_status_is_captured_not_raised() {
    let mock = MockFetch::new();
    let store = store(&mock);

    let response = store.fetch("event", 404, None).await;

    assert_eq!(response.status(), Some(404));
    assert_eq!(response.error(), Some(&NetworkError::status(404)));
    assert_eq!(
        response.error().unwrap().to_string(),
        "Invalid HTTP status: 404"
    );
    assert_eq!(response.errors().unwrap().len(), 1);
    assert!(response.data().is_empty());
}

#[tokio::test]
async fn request_headers_override_defaults() {
    let mock = MockFetch::new();
    mock.on(Method::Get, "http://api/event", 200, json!({ "data": [] }));
    let store = store(&mock);

    let options = RequestOptions::new()
        .header("content-type", "application/json")
        .header("authorization", "Bearer t");
    let response = store.fetch_all("event", Some(&options)).await;

    let call = mock.last_call();
    assert_eq!(call.headers["content-type"], "application/json");
    assert_eq!(call.headers["authorization"], "Bearer t");
    assert_eq!(response.request_headers()["authorization"], "Bearer t");
    assert_eq!(call.body, None);
}

#[tokio::test]
async fn request_appends_query_options() {
    let mock = MockFetch::new();
    mock.on(
        Method::Get,
        "http://api/search?filter[q]=rust&sort=name",
        200,
        json!({ "data": [] }),
    );
    let store = store(&mock);

    let options = RequestOptions::new().filter("q", "rust").sort("name");
    let response = store.request("search", Method::Get, None, Some(&options)).await;

    assert!(response.error().is_none());
    assert_eq!(mock.last_call().url, "http://api/search?filter[q]=rust&sort=name");
}

#[tokio::test]
async fn link_without_href_makes_no_request() {
    let mock = MockFetch::new();
    let store = store(&mock);

    let missing = network::fetch_link(None, &store, None, None).await;
    let empty = network::fetch_link(Some(&Link::from("")), &store, None, None).await;

    assert_eq!(mock.call_count(), 0);
    assert!(missing.error().is_none());
    assert!(missing.data().is_empty());
    assert_eq!(empty.status(), None);
}

#[tokio::test]
async fn pagination_links_are_cached_per_response() {
    let mock = MockFetch::new();
    mock.on(
        Method::Get,
        "http://api/event",
        200,
        json!({
            "data": [{ "id": "1", "type": "event", "attributes": {} }],
            "links": { "next": "http://api/event?page=2", "prev": null },
            "meta": { "total": 2 }
        }),
    );
    mock.on(
        Method::Get,
        "http://api/event?page=2",
        200,
        json!({ "data": [{ "id": "2", "type": "event", "attributes": {} }] }),
    );
    let store = store(&mock);

    let page = store.fetch_all("event", None).await;
    assert_eq!(page.meta().unwrap()["total"], 2);

    let next = page.next().await.unwrap();
    let again = page.next().await.unwrap();
    assert_eq!(mock.call_count(), 2);
    assert_eq!(next.records()[0].id().to_string(), "2");
    assert!(next.records()[0].ptr_eq(&again.records()[0]));

    page.fetch_link("next", true).await.unwrap();
    assert_eq!(mock.call_count(), 3);

    let prev = page.prev().await.unwrap();
    assert_eq!(mock.call_count(), 3);
    assert!(prev.data().is_empty());
}
