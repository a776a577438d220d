//! Integration tests with a mocked language model endpoint
//! Tests the enrichment workflow without hitting the real Gemini API

use gstin_credibility_api::circuit_breaker::llm_circuit_breaker;
use gstin_credibility_api::constants::FALLBACK_EXPLANATION;
use gstin_credibility_api::errors::AppError;
use gstin_credibility_api::narrative::{GeminiClient, NarrativeEnricher, NarrativeGenerator};
use gstin_credibility_api::narrative_cache::NarrativeCache;
use gstin_credibility_api::scoring::generate_report;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "test-model";
const API_KEY: &str = "test-key";
const GENERATE_PATH: &str = "/v1beta/models/test-model:generateContent";

/// Helper function to create a client pointing at the mock server
fn create_test_client(base_url: String) -> GeminiClient {
    GeminiClient::new(
        base_url,
        MODEL.to_string(),
        API_KEY.to_string(),
        Duration::from_secs(5),
    )
    .unwrap()
}

fn create_test_enricher(base_url: String) -> NarrativeEnricher {
    NarrativeEnricher::new(Arc::new(create_test_client(base_url)))
}

fn gemini_text_response(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [{ "text": text }]
            },
            "finishReason": "STOP"
        }]
    })
}

#[tokio::test]
async fn test_gemini_successful_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", API_KEY))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(gemini_text_response("Moderate risk driven by legal exposure.")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(mock_server.uri());
    let result = client.generate("prompt").await;

    assert_eq!(result.unwrap(), "Moderate risk driven by legal exposure.");
}

#[tokio::test]
async fn test_gemini_request_carries_prompt() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text_response("ok")))
        .mount(&mock_server)
        .await;

    let enricher = create_test_enricher(mock_server.uri());
    let report = generate_report("22AAAAA0000A1Z5");
    enricher.enrich(&report).await;

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains("GSTIN 22AAAAA0000A1Z5"));
    assert!(prompt.contains("Partial Credit"));
}

#[tokio::test]
async fn test_gemini_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&mock_server)
        .await;

    let client = create_test_client(mock_server.uri());
    let result = client.generate("prompt").await;

    assert!(matches!(result, Err(AppError::ExternalApiError(_))));
}

#[tokio::test]
async fn test_enrich_falls_back_on_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&mock_server)
        .await;

    let enricher = create_test_enricher(mock_server.uri());
    let report = generate_report("27AAPFU0939F1ZV");

    assert_eq!(enricher.enrich(&report).await, FALLBACK_EXPLANATION);
}

#[tokio::test]
async fn test_enrich_falls_back_on_empty_text() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": []
        })))
        .mount(&mock_server)
        .await;

    let enricher = create_test_enricher(mock_server.uri());
    let report = generate_report("27AAPFU0939F1ZV");

    assert_eq!(enricher.enrich(&report).await, FALLBACK_EXPLANATION);
}

#[tokio::test]
async fn test_enrich_falls_back_on_malformed_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&mock_server)
        .await;

    let enricher = create_test_enricher(mock_server.uri());
    let report = generate_report("27AAPFU0939F1ZV");

    assert_eq!(enricher.enrich(&report).await, FALLBACK_EXPLANATION);
}

#[tokio::test]
async fn test_enrich_falls_back_when_unreachable() {
    // Nothing listens on the discard port
    let enricher = create_test_enricher("http://127.0.0.1:9".to_string());
    let report = generate_report("22AAAAA0000A1Z5");

    assert_eq!(enricher.enrich(&report).await, FALLBACK_EXPLANATION);
}

#[tokio::test]
async fn test_circuit_opens_after_consecutive_failures() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(5) // Sixth call must be rejected by the breaker
        .mount(&mock_server)
        .await;

    let enricher = create_test_enricher(mock_server.uri());
    let report = generate_report("22AAAAA0000A1Z5");

    for _ in 0..6 {
        assert_eq!(enricher.enrich(&report).await, FALLBACK_EXPLANATION);
    }
}

#[tokio::test]
async fn test_successful_narrative_is_cached() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text_response("Cached.")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let enricher = create_test_enricher(mock_server.uri());
    let report = generate_report("22AAAAA0000A1Z5");

    assert_eq!(enricher.enrich(&report).await, "Cached.");
    assert_eq!(enricher.enrich(&report).await, "Cached.");
}

#[tokio::test]
async fn test_expired_narrative_is_regenerated() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text_response("Fresh.")))
        .expect(2)
        .mount(&mock_server)
        .await;

    let enricher = create_test_enricher(mock_server.uri())
        .with_cache(NarrativeCache::new(Duration::from_millis(100), 100));
    let report = generate_report("22AAAAA0000A1Z5");

    assert_eq!(enricher.enrich(&report).await, "Fresh.");
    assert_eq!(enricher.enrich(&report).await, "Fresh.");

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(enricher.enrich(&report).await, "Fresh.");
}

#[tokio::test]
async fn test_enricher_recovers_after_breaker_backoff() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text_response("Back.")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let enricher = create_test_enricher(mock_server.uri()).with_breaker(llm_circuit_breaker(
        2,
        Duration::from_millis(50),
        Duration::from_millis(100),
    ));
    let report = generate_report("22AAAAA0000A1Z5");

    assert_eq!(enricher.enrich(&report).await, FALLBACK_EXPLANATION);
    assert_eq!(enricher.enrich(&report).await, FALLBACK_EXPLANATION);
    // Open: rejected without reaching the model
    assert_eq!(enricher.enrich(&report).await, FALLBACK_EXPLANATION);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(enricher.enrich(&report).await, "Back.");
    // Served from the narrative cache
    assert_eq!(enricher.enrich(&report).await, "Back.");
}

#[tokio::test]
async fn test_fallback_is_not_cached() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text_response("Recovered.")))
        .mount(&mock_server)
        .await;

    let enricher = create_test_enricher(mock_server.uri());
    let report = generate_report("22AAAAA0000A1Z5");

    assert_eq!(enricher.enrich(&report).await, FALLBACK_EXPLANATION);
    assert_eq!(enricher.enrich(&report).await, "Recovered.");
}

#[tokio::test]
async fn test_concurrent_enrichment() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text_response("Concurrent.")))
        .expect(10)
        .mount(&mock_server)
        .await;

    let enricher = create_test_enricher(mock_server.uri());

    // Distinct GSTINs so the narrative cache does not collapse requests
    let mut handles = vec![];
    for i in 0..10 {
        let enricher = enricher.clone();
        let handle = tokio::spawn(async move {
            let report = generate_report(&format!("22AAAAA000{}A1Z5", i));
            enricher.enrich(&report).await
        });
        handles.push(handle);
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), "Concurrent.");
    }
}
