//! Tests for the CRM push against a mock HTTP endpoint.
//!
//! The store is an in-memory one seeded with a few names; the CRM is a wiremock
//! server standing in for the contacts endpoint.

use anyhow::Result;
use babynames::crm::{push_contacts, CrmClient};
use babynames::error::PipelineError;
use babynames::models::NameRecord;
use babynames::store::{MemoryStore, NameStore};
use indicatif::ProgressBar;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CONTACTS_PATH: &str = "/crm/v3/objects/contacts";

async fn seeded_store(names: &[(&str, &str)]) -> MemoryStore {
    let mut store = MemoryStore::new();
    let batch: Vec<NameRecord> = names.iter().map(|(n, s)| NameRecord::new(*n, *s)).collect();
    store.insert_ignore(&batch).await.unwrap();
    store
}

fn client_for(server: &MockServer) -> CrmClient {
    CrmClient::with_endpoint("test-token", format!("{}{}", server.uri(), CONTACTS_PATH)).unwrap()
}

#[tokio::test]
async fn test_creates_one_contact_per_row() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CONTACTS_PATH))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(201))
        .expect(3)
        .mount(&server)
        .await;

    let mut store = seeded_store(&[("Ann", "F"), ("Bob", "M"), ("Cara", "F")]).await;
    let stats = push_contacts(&mut store, &client_for(&server), 100, &ProgressBar::hidden()).await?;

    assert_eq!(stats.attempted, 3);
    assert_eq!(stats.created, 3);
    assert_eq!(stats.failed, 0);
    Ok(())
}

#[tokio::test]
async fn test_sends_canonical_field_mapping() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CONTACTS_PATH))
        .and(body_json(serde_json::json!({
            "properties": {"firstname": "Ann", "lastname": "female"}
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let mut store = seeded_store(&[("Ann", "F")]).await;
    let stats = push_contacts(&mut store, &client_for(&server), 100, &ProgressBar::hidden()).await?;

    assert_eq!(stats.created, 1);
    Ok(())
}

#[tokio::test]
async fn test_failed_call_is_skipped() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CONTACTS_PATH))
        .and(body_json(serde_json::json!({
            "properties": {"firstname": "Bob", "lastname": "male"}
        })))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(serde_json::json!({"message": "Contact already exists"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(CONTACTS_PATH))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let mut store = seeded_store(&[("Ann", "F"), ("Bob", "M"), ("Cara", "F")]).await;
    let stats = push_contacts(&mut store, &client_for(&server), 100, &ProgressBar::hidden()).await?;

    assert_eq!(stats.attempted, 3);
    assert_eq!(stats.created, 2);
    assert_eq!(stats.failed, 1);
    Ok(())
}

#[tokio::test]
async fn test_limit_bounds_the_push() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CONTACTS_PATH))
        .respond_with(ResponseTemplate::new(201))
        .expect(2)
        .mount(&server)
        .await;

    let mut store = seeded_store(&[("Ann", "F"), ("Bob", "M"), ("Cara", "F")]).await;
    let stats = push_contacts(&mut store, &client_for(&server), 2, &ProgressBar::hidden()).await?;

    assert_eq!(stats.attempted, 2);
    Ok(())
}

#[tokio::test]
async fn test_error_carries_api_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CONTACTS_PATH))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(serde_json::json!({"message": "Property values were not valid"})),
        )
        .mount(&server)
        .await;

    let mut store = seeded_store(&[("Ann", "F")]).await;
    let row = store.sample(1).await.unwrap().remove(0);
    let err = client_for(&server).create_contact(&row).await.unwrap_err();

    match err {
        PipelineError::DownstreamCall { name, message } => {
            assert_eq!(name, "Ann");
            assert_eq!(message, "Property values were not valid");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_unreachable_endpoint_counts_failures() -> Result<()> {
    // Nothing listens on the discard port
    let client = CrmClient::with_endpoint("test-token", "http://127.0.0.1:9/contacts")?;
    let mut store = seeded_store(&[("Ann", "F"), ("Bob", "M")]).await;

    let stats = push_contacts(&mut store, &client, 100, &ProgressBar::hidden()).await?;

    assert_eq!(stats.failed, 2);
    assert_eq!(stats.created, 0);
    Ok(())
}
