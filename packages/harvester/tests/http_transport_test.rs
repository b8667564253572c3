//! HTTP transport and full pipeline against a mock provider.
//!
//! The transport uses a blocking client, so every call runs inside
//! `spawn_blocking`.

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use seaaroundus_harvester::categories::FishingEntityCategory;
use seaaroundus_harvester::document::CatalogDocument;
use seaaroundus_harvester::{
    HarvestContext, HarvesterConfig, HttpTransport, MemoryVersionStore, PipelineRunner, RunState,
    Transport, TransportErrorKind,
};

fn config_for(server: &MockServer, max_retries: u32) -> HarvesterConfig {
    HarvesterConfig::new()
        .with_api_base_url(&server.uri())
        .unwrap()
        .with_max_retries(max_retries)
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_returns_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/eez/8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": 8}})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = config_for(&mock_server, 3);
    let body = tokio::task::spawn_blocking(move || {
        let transport = HttpTransport::new(&config).unwrap();
        transport.get(&config.urls().detail("eez", 8))
    })
    .await
    .unwrap()
    .unwrap();

    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["data"]["id"], 8);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_client_error_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = config_for(&mock_server, 3);
    let err = tokio::task::spawn_blocking(move || {
        let transport = HttpTransport::new(&config).unwrap();
        transport.get(&config.urls().detail("eez", 999))
    })
    .await
    .unwrap()
    .unwrap_err();

    assert_eq!(err.kind, TransportErrorKind::Network);
    assert!(err.message.contains("404"));
    assert!(err.url.ends_with("/eez/999"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_server_error_is_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&mock_server)
        .await;

    let config = config_for(&mock_server, 2);
    let err = tokio::task::spawn_blocking(move || {
        let transport = HttpTransport::new(&config).unwrap();
        transport.get(&config.urls().index("eez", true))
    })
    .await
    .unwrap()
    .unwrap_err();

    assert_eq!(err.kind, TransportErrorKind::Network);
    assert!(err.message.contains("giving up after 2 attempts"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fishing_entity_pipeline_over_http() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/fishing-entity/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": 32, "title": "Chile"}, {"id": 76, "title": "Brazil"}],
            "metadata": {"version": "2024.1"}
        })))
        .mount(&mock_server)
        .await;

    for (id, title) in [(32, "Chile"), (76, "Brazil")] {
        Mock::given(method("GET"))
            .and(path(format!("/fishing-entity/{id}")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"data": {"id": id, "title": title}})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/fishing-entity/tonnage/taxon/"))
        .and(query_param("region_id", "32"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"key": "Jack mackerel", "values": [[1990, 4.2e6], [2010, 0.7e6]]}]
        })))
        .with_priority(1)
        .mount(&mock_server)
        .await;

    // every other catch combination has no data
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": null})))
        .with_priority(10)
        .mount(&mock_server)
        .await;

    let config = config_for(&mock_server, 1);
    let (state, docs) = tokio::task::spawn_blocking(move || {
        let transport = HttpTransport::new(&config).unwrap();
        let category = FishingEntityCategory::new(&config);
        let mut store = MemoryVersionStore::new();
        let mut docs: Vec<CatalogDocument> = Vec::new();

        let outcome = PipelineRunner::new(HarvestContext::new(&transport, &config), &mut store)
            .run(&category, &mut docs)
            .unwrap();
        (outcome.state, docs)
    })
    .await
    .unwrap();

    assert_eq!(state, RunState::Committed);
    let identities: Vec<&str> = docs.iter().map(|d| d.identity.as_str()).collect();
    assert_eq!(
        identities,
        vec!["fishing-entity-32", "fishing-entity-32-catch-tonnage-taxon", "fishing-entity-76"]
    );
    assert_eq!(docs[1].subjects, vec!["Catch tonnage", "Jack mackerel"]);
}
