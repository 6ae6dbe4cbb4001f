use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ton_tx_notifier::blockchain::TonApiClient;
use ton_tx_notifier::config::TonApiConfig;
use ton_tx_notifier::error::{FetchError, ParseError};

const ACCOUNT: &str = "UQWallet";
const TRANSACTIONS_PATH: &str = "/v2/blockchain/accounts/UQWallet/transactions";

fn client_for(server: &MockServer, window_size: usize) -> TonApiClient {
    let config = TonApiConfig {
        endpoint: server.uri(),
        timeout_seconds: 5,
    };
    TonApiClient::new(&config, window_size).expect("Failed to build TonAPI client")
}

fn transactions(count: usize) -> serde_json::Value {
    let items: Vec<_> = (0..count)
        .map(|i| {
            json!({
                "hash": format!("h{}", i),
                "utime": 1_717_000_000 - i as i64,
                "in_msg": { "value": 1_000_000_000u64, "source": { "address": "0:aaaa" } },
                "out_msgs": []
            })
        })
        .collect();
    json!({ "transactions": items })
}

#[tokio::test]
async fn test_fetch_returns_window_in_api_order() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(TRANSACTIONS_PATH))
        .and(query_param("limit", "4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(transactions(6)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = client_for(&mock_server, 4).fetch(ACCOUNT).await;

    let fetched = result.expect("Fetch should succeed");
    assert_eq!(fetched.len(), 4, "Only the window should be returned");
    let hashes: Vec<_> = fetched.iter().map(|tx| tx.hash.clone().unwrap()).collect();
    assert_eq!(hashes, vec!["h0", "h1", "h2", "h3"]);
}

#[tokio::test]
async fn test_fetch_empty_history() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(TRANSACTIONS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "transactions": [] })))
        .mount(&mock_server)
        .await;

    let fetched = client_for(&mock_server, 4).fetch(ACCOUNT).await.unwrap();
    assert!(fetched.is_empty());
}

#[tokio::test]
async fn test_fetch_non_success_status() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(TRANSACTIONS_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&mock_server)
        .await;

    let result = client_for(&mock_server, 4).fetch(ACCOUNT).await;

    match result {
        Err(FetchError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "Internal Server Error");
        }
        other => panic!("Expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_malformed_payload() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(TRANSACTIONS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("invalid json"))
        .mount(&mock_server)
        .await;

    let result = client_for(&mock_server, 4).fetch(ACCOUNT).await;
    assert!(matches!(result, Err(FetchError::Parse(ParseError::Payload(_)))));
}

#[tokio::test]
async fn test_fetch_network_failure() {
    let config = TonApiConfig {
        endpoint: "http://127.0.0.1:9".to_string(),
        timeout_seconds: 2,
    };
    let client = TonApiClient::new(&config, 4).unwrap();

    let result = client.fetch(ACCOUNT).await;
    assert!(matches!(result, Err(FetchError::Network(_))));
}
