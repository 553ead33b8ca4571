use jsonapi_store::{Error, Id, Method, ModelType, OneOrMany, Record};
use serde_json::{json, Map};

use crate::support::{event_document, store, MockFetch};

fn synced_event(store: &jsonapi_store::Store) -> Record {
    store
        .sync(&event_document())
        .unwrap()
        .record()
        .cloned()
        .unwrap()
}

#[tokio::test]
async fn new_record_is_created_with_post() {
    let mock = MockFetch::new();
    mock.on(
        Method::Post,
        "http://api/event",
        201,
        json!({ "data": {
            "id": "1",
            "type": "event",
            "attributes": { "name": "Meetup" },
            "links": { "self": "http://api/event/1" }
        }}),
    );
    let store = store(&mock);
    let draft = store.add("event", json!({ "name": "Meetup" })).unwrap();

    let created = draft.save(None).await.unwrap();

    let call = mock.last_call();
    assert_eq!(call.method, Method::Post);
    assert_eq!(call.url, "http://api/event");
    assert_eq!(
        call.body.unwrap(),
        json!({ "data": { "type": "event", "attributes": { "name": "Meetup" } } })
    );
    assert_eq!(created.id(), &Id::from("1"));
    assert!(created.is_persisted());
    assert!(created.pending_create().unwrap().related.ptr_eq(&draft));
    assert!(!draft.is_persisted());
}

#[tokio::test]
async fn persisted_record_is_updated_with_patch() {
    let mock = MockFetch::new();
    mock.on(
        Method::Patch,
        "http://api/event/1",
        200,
        json!({ "data": { "id": "1", "type": "event", "attributes": { "name": "Renamed" } } }),
    );
    let store = store(&mock);
    let event = synced_event(&store);
    event.set("name", "Renamed");

    let saved = event.save(None).await.unwrap();

    let call = mock.last_call();
    assert_eq!(call.method, Method::Patch);
    assert_eq!(call.url, "http://api/event/1");
    let body = call.body.unwrap();
    assert_eq!(body["data"]["id"], "1");
    assert_eq!(body["data"]["attributes"], json!({ "name": "Renamed" }));
    assert_eq!(
        body["data"]["relationships"]["organizer"]["data"],
        json!({ "id": "9", "type": "user" })
    );
    assert!(saved.ptr_eq(&event));
}

#[tokio::test]
async fn persisted_record_without_self_link_uses_model_path() {
    let mock = MockFetch::new();
    mock.on_empty(Method::Patch, "http://api/events/7", 204);
    let store = store(&mock).with_type(ModelType::new("event").with_endpoint("events"));
    let event = store
        .sync(&json!({ "data": { "id": 7, "type": "event", "attributes": {} } }))
        .unwrap()
        .record()
        .cloned()
        .unwrap();

    event.save(None).await.unwrap();

    assert_eq!(mock.last_call().url, "http://api/events/7");
}

#[tokio::test]
async fn no_content_marks_record_persisted() {
    let mock = MockFetch::new();
    mock.on_empty(Method::Post, "http://api/event", 204);
    let store = store(&mock);
    let draft = store.add("event", json!({ "name": "Meetup" })).unwrap();

    let saved = draft.save(None).await.unwrap();

    assert!(saved.ptr_eq(&draft));
    assert!(draft.is_persisted());
}

#[tokio::test]
async fn autogenerated_ids_are_sent() {
    let mock = MockFetch::new();
    mock.on_empty(Method::Post, "http://api/event", 204);
    let store = store(&mock).with_type(ModelType::new("event").with_autogenerated_ids(true));
    let draft = store.add("event", json!({})).unwrap();

    draft.save(None).await.unwrap();

    let body = mock.last_call().body.unwrap();
    assert_eq!(body["data"]["id"], draft.id().to_string());
}

#[tokio::test]
async fn save_error_is_raised_and_state_kept() {
    let mock = MockFetch::new();
    mock.on(
        Method::Patch,
        "http://api/event/1",
        422,
        json!({ "errors": [{ "detail": "name is taken" }] }),
    );
    let store = store(&mock);
    let event = synced_event(&store);

    let err = event.save(None).await.unwrap_err();

    assert_eq!(err.status_code(), Some(422));
    assert!(!err.is_usage_error());
    assert!(event.is_persisted());
}

#[tokio::test]
async fn save_relationship_requires_self_link() {
    let mock = MockFetch::new();
    let store = store(&mock);
    let event = store
        .sync(&json!({ "data": {
            "id": "1",
            "type": "event",
            "relationships": { "organizer": { "data": { "id": "9", "type": "user" } } }
        }}))
        .unwrap()
        .record()
        .cloned()
        .unwrap();

    let err = event.save_relationship("organizer", None).await.unwrap_err();

    assert!(matches!(err, Error::MissingRelationshipLink { .. }));
    assert!(err.is_usage_error());
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn save_relationship_sends_identifiers() {
    let mock = MockFetch::new();
    mock.on_empty(
        Method::Patch,
        "http://api/event/1/relationships/organizer",
        204,
    );
    let store = store(&mock);
    let event = synced_event(&store);

    let saved = event.save_relationship("organizer", None).await.unwrap();

    let call = mock.last_call();
    assert_eq!(call.method, Method::Patch);
    assert_eq!(
        call.body.unwrap(),
        json!({ "data": { "id": "9", "type": "user" } })
    );
    assert!(saved.ptr_eq(&event));
}

#[tokio::test]
async fn unpersisted_remove_is_local() {
    let mock = MockFetch::new();
    let store = store(&mock);
    let draft = store.add("event", json!({})).unwrap();

    assert!(draft.remove(None).await.unwrap());

    assert_eq!(mock.call_count(), 0);
    assert!(store.find("event", draft.id()).unwrap().is_none());
}

#[tokio::test]
async fn persisted_remove_deletes_on_server() {
    let mock = MockFetch::new();
    mock.on_empty(Method::Delete, "http://api/event/1", 204);
    let store = store(&mock);
    let event = synced_event(&store);

    assert!(event.remove(None).await.unwrap());

    assert_eq!(mock.last_call().method, Method::Delete);
    assert_eq!(mock.last_call().body, None);
    assert!(!event.is_persisted());
    assert!(store.find("event", event.id()).unwrap().is_none());
}

#[tokio::test]
async fn failed_remove_keeps_record() {
    let mock = MockFetch::new();
    mock.on(Method::Delete, "http://api/event/1", 500, json!({}));
    let store = store(&mock);
    let event = synced_event(&store);

    let err = event.remove(None).await.unwrap_err();

    assert_eq!(err.status_code(), Some(500));
    assert!(event.is_persisted());
    assert!(store.find("event", event.id()).unwrap().is_some());
}

#[tokio::test]
async fn detached_record_cannot_save() {
    let record = Record::new("event", 1, Map::new());
    let err = record.save(None).await.unwrap_err();
    assert!(matches!(err, Error::Detached(_)));
}

#[tokio::test]
async fn fetch_link_is_cached_until_forced() {
    let mock = MockFetch::new();
    mock.on(Method::Get, "http://api/event/1", 200, event_document());
    let store = store(&mock);
    let event = synced_event(&store);

    let first = event.fetch_link("self", None, false).await.unwrap();
    let second = event.fetch_link("self", None, false).await.unwrap();
    assert_eq!(mock.call_count(), 1);
    assert!(first.record().unwrap().ptr_eq(&second.record().unwrap()));
    assert!(first.record().unwrap().ptr_eq(&event));

    event.fetch_link("self", None, true).await.unwrap();
    assert_eq!(mock.call_count(), 2);

    assert!(event.invalidate_link("self"));
    event.fetch_link("self", None, false).await.unwrap();
    assert_eq!(mock.call_count(), 3);
}

#[tokio::test]
async fn missing_link_resolves_empty() {
    let mock = MockFetch::new();
    let store = store(&mock);
    let event = synced_event(&store);

    let response = event.fetch_link("image", None, false).await.unwrap();

    assert_eq!(mock.call_count(), 0);
    assert!(response.data().is_empty());
}

#[tokio::test]
async fn relationship_links_are_cached_separately() {
    let mock = MockFetch::new();
    mock.on(
        Method::Get,
        "http://api/event/1/organizer",
        200,
        json!({ "data": { "id": "9", "type": "user", "attributes": { "name": "Ann" } } }),
    );
    mock.on(
        Method::Get,
        "http://api/event/1/relationships/organizer",
        200,
        json!({ "data": { "id": "9", "type": "user" } }),
    );
    let store = store(&mock);
    let event = synced_event(&store);

    let related = event
        .fetch_relationship_link("organizer", "related", None, false)
        .await
        .unwrap();
    event
        .fetch_relationship_link("organizer", "related", None, false)
        .await
        .unwrap();
    assert_eq!(mock.call_count(), 1);
    assert_eq!(related.record().unwrap().get("name"), Some(json!("Ann")));

    event
        .fetch_relationship_link("organizer", "self", None, false)
        .await
        .unwrap();
    assert_eq!(mock.call_count(), 2);

    event.invalidate_relationship("organizer");
    event
        .fetch_relationship_link("organizer", "related", None, false)
        .await
        .unwrap();
    assert_eq!(mock.call_count(), 3);
}

#[tokio::test]
async fn pending_create_resolves_to_related_record() {
    let mock = MockFetch::new();
    mock.on(
        Method::Post,
        "http://api/image",
        201,
        json!({ "data": {
            "id": "q1",
            "type": "queue-job",
            "links": { "self": "http://api/queue-jobs/q1" }
        }}),
    );
    mock.on(
        Method::Get,
        "http://api/queue-jobs/q1",
        200,
        json!({ "data": { "id": "5", "type": "image", "attributes": { "name": "a.png" } } }),
    );
    let store = store(&mock);
    let image = store.add("image", json!({ "name": "a.png" })).unwrap();

    let job = image.save(None).await.unwrap();
    assert_eq!(job.type_name(), "queue-job");
    assert!(!image.is_persisted());

    let response = job.fetch_link("self", None, false).await.unwrap();

    assert!(response.record().unwrap().ptr_eq(&image));
    assert!(image.is_persisted());
}

#[tokio::test]
async fn pending_create_with_prop_links_relationship() {
    let mock = MockFetch::new();
    mock.on(
        Method::Patch,
        "http://api/event/1/relationships/parent",
        201,
        json!({ "data": {
            "id": "q1",
            "type": "queue-job",
            "links": { "self": "http://api/queue-jobs/q1" }
        }}),
    );
    mock.on(
        Method::Get,
        "http://api/queue-jobs/q1",
        200,
        json!({ "data": { "id": "2", "type": "event", "attributes": { "name": "Series" } } }),
    );
    let store = store(&mock).with_type(ModelType::new("event").with_ref("parent", "event"));
    let event = store
        .sync(&json!({ "data": {
            "id": "1",
            "type": "event",
            "relationships": {
                "parent": {
                    "data": null,
                    "links": { "self": "http://api/event/1/relationships/parent" }
                }
            }
        }}))
        .unwrap()
        .record()
        .cloned()
        .unwrap();

    let job = event.save_relationship("parent", None).await.unwrap();
    assert_eq!(mock.last_call().body.unwrap(), json!({ "data": null }));
    let pending = job.pending_create().unwrap();
    assert!(pending.related.ptr_eq(&event));
    assert_eq!(pending.prop.as_deref(), Some("parent"));

    let response = job.fetch_link("self", None, false).await.unwrap();

    let parent = response.record().unwrap();
    assert_eq!(parent.id(), &Id::from("2"));
    assert_eq!(event.ref_ids("parent"), Some(OneOrMany::One(Id::from("2"))));
    assert!(event.related("parent").unwrap()[0].ptr_eq(&parent));
}

#[tokio::test]
async fn pending_create_ignores_same_type() {
    let mock = MockFetch::new();
    mock.on(
        Method::Post,
        "http://api/event",
        201,
        json!({ "data": {
            "id": "1",
            "type": "event",
            "links": { "self": "http://api/event/1" }
        }}),
    );
    mock.on(Method::Get, "http://api/event/1", 200, event_document());
    let store = store(&mock);
    let draft = store.add("event", json!({})).unwrap();

    let created = draft.save(None).await.unwrap();
    let response = created.fetch_link("self", None, false).await.unwrap();

    assert!(response.record().unwrap().ptr_eq(&created));
    assert!(!draft.is_persisted());
}
