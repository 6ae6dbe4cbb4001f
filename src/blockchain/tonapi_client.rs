use log::Level;
use reqwest::Client;
use std::time::Duration;
use crate::config::TonApiConfig;
use crate::error::{FetchError, ParseError};
use crate::logging::{LogContext, MetricsLogger, PerformanceMonitor};
use crate::models::{RawTransaction, TransactionsResponse};

/// Read client for the TonAPI account transactions endpoint
#[derive(Clone)]
pub struct TonApiClient {
    client: Client,
    endpoint: String,
    window_size: usize,
}

impl TonApiClient {
    pub fn new(config: &TonApiConfig, window_size: usize) -> Result<Self, FetchError> {
        let endpoint = config.endpoint.trim_end_matches('/').to_string();

        LogContext::new("tonapi_client", "initialization")
            .field("endpoint", &endpoint)
            .field("timeout_seconds", config.timeout_seconds)
            .field("window_size", window_size)
            .emit(Level::Info, "Initializing TonAPI client");

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            endpoint,
            window_size,
        })
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    fn transactions_url(&self, account_address: &str) -> String {
        format!("{}/v2/blockchain/accounts/{}/transactions", self.endpoint, account_address)
    }

    /// Fetch the most recent transactions of an account, newest first as returned by the API.
    ///
    /// At most `window_size` entries are returned; older history is never scanned.
    pub async fn fetch(&self, account_address: &str) -> Result<Vec<RawTransaction>, FetchError> {
        let monitor = PerformanceMonitor::new("tonapi_fetch_transactions");
        let result = self.fetch_inner(account_address).await;
        let duration = monitor.finish_with_result(&result);
        MetricsLogger::log_api_call("tonapi.transactions", duration, result.is_ok());

        if let Ok(transactions) = &result {
            LogContext::new("tonapi_client", "fetch")
                .account(account_address)
                .field("transaction_count", transactions.len())
                .emit(Level::Debug, "Retrieved transactions");
        }

        result
    }

    async fn fetch_inner(&self, account_address: &str) -> Result<Vec<RawTransaction>, FetchError> {
        let response = self
            .client
            .get(self.transactions_url(account_address))
            .query(&[("limit", self.window_size)])
            .send()
            .await
            .map_err(FetchError::Network)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await.map_err(FetchError::Network)?;
        let mut transactions = parse_transactions(&body)?;
        transactions.truncate(self.window_size);
        Ok(transactions)
    }
}

fn parse_transactions(body: &[u8]) -> Result<Vec<RawTransaction>, ParseError> {
    serde_json::from_slice::<TransactionsResponse>(body)
        .map(|response| response.transactions)
        .map_err(ParseError::Payload)
}
