use super::*;
use crate::model::{ItemGroup, ItemGroupDraft};
use crate::net::transport::Method;
use crate::test_helpers::{MockTransport, Scripted, api_with};
use serde_json::json;

fn consumables() -> ItemGroupDraft {
    ItemGroupDraft { name: "Consumables".into(), short_name: "CONS".into(), description: None }
}

fn filters() -> ItemGroupDraft {
    ItemGroupDraft { name: "Filters".into(), short_name: "FLT".into(), description: Some("Oil and air".into()) }
}

// =============================================================================
// STORE
// =============================================================================

#[test]
fn missing_file_loads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let drafts = DraftStore::new(dir.path().join("nested"));

    let loaded: Vec<ItemGroupDraft> = drafts.load("item-groups").unwrap();

    assert!(loaded.is_empty());
}

#[test]
fn push_appends_and_save_replaces() {
    let dir = tempfile::tempdir().unwrap();
    let drafts = DraftStore::new(dir.path());

    assert_eq!(drafts.push("item-groups", consumables()).unwrap(), 1);
    assert_eq!(drafts.push("item-groups", filters()).unwrap(), 2);
    assert_eq!(drafts.load::<ItemGroupDraft>("item-groups").unwrap(), vec![consumables(), filters()]);

    drafts.save("item-groups", &[filters()]).unwrap();
    assert_eq!(drafts.load::<ItemGroupDraft>("item-groups").unwrap(), vec![filters()]);
    assert!(dir.path().join("item-groups.json").exists());
}

#[test]
fn clear_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let drafts = DraftStore::new(dir.path());
    drafts.push("item-groups", consumables()).unwrap();

    drafts.clear("item-groups").unwrap();
    drafts.clear("item-groups").unwrap();

    assert!(drafts.load::<ItemGroupDraft>("item-groups").unwrap().is_empty());
}

#[test]
fn corrupt_file_is_a_drafts_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("item-groups.json"), "{ not json").unwrap();
    let drafts = DraftStore::new(dir.path());

    let err = drafts.load::<ItemGroupDraft>("item-groups").unwrap_err();

    assert!(matches!(err, ClientError::Drafts(_)));
}

// =============================================================================
// FALLBACK
// =============================================================================

#[tokio::test]
async fn unreachable_server_stores_a_draft() {
    let dir = tempfile::tempdir().unwrap();
    let drafts = DraftStore::new(dir.path());
    let transport = MockTransport::new();
    transport.on(Method::Post, "/item-groups", Scripted::Unreachable);
    let (api, notices) = api_with(&transport);
    let mut store: ResourceStore<ItemGroup> = ResourceStore::new();

    let outcome = create_with_fallback(&api, &mut store, &drafts, &consumables()).await.unwrap();

    assert_eq!(outcome, CreateOutcome::Drafted { pending: 1 });
    assert!(store.is_empty());
    assert_eq!(drafts.load::<ItemGroupDraft>("item-groups").unwrap(), vec![consumables()]);
    let titles: Vec<String> = notices.drain().into_iter().map(|n| n.title).collect();
    assert_eq!(titles, vec!["Error".to_owned(), "Saved as draft".to_owned()]);
}

#[tokio::test]
async fn server_rejection_does_not_store_a_draft() {
    let dir = tempfile::tempdir().unwrap();
    let drafts = DraftStore::new(dir.path());
    let transport = MockTransport::new();
    transport.respond(Method::Post, "/item-groups", 409, json!({ "message": "Short name taken" }));
    let (api, _notices) = api_with(&transport);
    let mut store: ResourceStore<ItemGroup> = ResourceStore::new();

    let err = create_with_fallback(&api, &mut store, &drafts, &consumables()).await.unwrap_err();

    assert!(err.is_conflict());
    assert!(drafts.load::<ItemGroupDraft>("item-groups").unwrap().is_empty());
}

#[tokio::test]
async fn invalid_draft_is_neither_sent_nor_stored() {
    let dir = tempfile::tempdir().unwrap();
    let drafts = DraftStore::new(dir.path());
    let transport = MockTransport::new();
    let (api, _notices) = api_with(&transport);
    let mut store: ResourceStore<ItemGroup> = ResourceStore::new();
    let draft = ItemGroupDraft { short_name: "WAY-TOO-LONG".into(), ..consumables() };

    let err = create_with_fallback(&api, &mut store, &drafts, &draft).await.unwrap_err();

    assert!(err.field_errors().and_then(|f| f.get("shortName")).is_some());
    assert!(transport.requests().is_empty());
    assert!(drafts.load::<ItemGroupDraft>("item-groups").unwrap().is_empty());
}

#[tokio::test]
async fn reachable_server_creates_directly() {
    let dir = tempfile::tempdir().unwrap();
    let drafts = DraftStore::new(dir.path());
    let transport = MockTransport::new();
    transport.respond(Method::Post, "/item-groups", 201, json!({ "id": "g1", "name": "Consumables", "shortName": "CONS" }));
    transport.respond(Method::Get, "/item-groups", 200, json!([{ "id": "g1", "name": "Consumables", "shortName": "CONS" }]));
    let (api, _notices) = api_with(&transport);
    let mut store: ResourceStore<ItemGroup> = ResourceStore::new();

    let outcome = create_with_fallback(&api, &mut store, &drafts, &consumables()).await.unwrap();

    assert!(matches!(outcome, CreateOutcome::Created(Some(ref group)) if group.id == "g1"));
    assert!(!dir.path().join("item-groups.json").exists());
}

// =============================================================================
// SYNC
// =============================================================================

#[tokio::test]
async fn sync_keeps_only_unreachable_drafts() {
    let dir = tempfile::tempdir().unwrap();
    let drafts = DraftStore::new(dir.path());
    let bad = ItemGroupDraft { name: "  ".into(), ..filters() };
    drafts.save("item-groups", &[consumables(), bad, filters()]).unwrap();

    let transport = MockTransport::new();
    transport.respond(Method::Post, "/item-groups", 201, json!({ "id": "g1", "name": "Consumables", "shortName": "CONS" }));
    transport.on(Method::Post, "/item-groups", Scripted::Unreachable);
    transport.respond(Method::Get, "/item-groups", 200, json!([{ "id": "g1", "name": "Consumables", "shortName": "CONS" }]));
    let (api, _notices) = api_with(&transport);
    let mut store: ResourceStore<ItemGroup> = ResourceStore::new();

    let report = sync_drafts(&api, &mut store, &drafts).await.unwrap();

    assert_eq!(report.created, 1);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.remaining, 1);
    assert_eq!(drafts.load::<ItemGroupDraft>("item-groups").unwrap(), vec![filters()]);
    assert!(store.get("g1").is_some());
}

#[tokio::test]
async fn sync_clears_storage_when_everything_lands() {
    let dir = tempfile::tempdir().unwrap();
    let drafts = DraftStore::new(dir.path());
    drafts.save("item-groups", &[consumables()]).unwrap();

    let transport = MockTransport::new();
    transport.respond(Method::Post, "/item-groups", 201, json!({ "id": "g1", "name": "Consumables", "shortName": "CONS" }));
    transport.respond(Method::Get, "/item-groups", 200, json!([]));
    let (api, _notices) = api_with(&transport);
    let mut store: ResourceStore<ItemGroup> = ResourceStore::new();

    let report = sync_drafts(&api, &mut store, &drafts).await.unwrap();

    assert_eq!(report.remaining, 0);
    assert!(!dir.path().join("item-groups.json").exists());
}
