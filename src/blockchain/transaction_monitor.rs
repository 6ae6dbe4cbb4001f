use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use log::{debug, error, info};
use serde::Serialize;
use thiserror::Error;
use tokio::signal;
use tokio::sync::Notify;
use tokio::time::sleep;

use crate::blockchain::{passes_threshold, TonApiClient, TransactionClassifier};
use crate::config::AppConfig;
use crate::error::{FetchError, NotifierError, NotifyError};
use crate::ledger::{Ledger, LedgerStore};
use crate::logging::{ErrorLogger, LogContext, MetricsLogger};
use crate::notification::TelegramNotifier;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Fetch client setup failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("Notifier setup failed: {0}")]
    Notify(#[from] NotifyError),
    #[error("Monitor configuration error: {0}")]
    Config(#[from] crate::error::ConfigError),
}

/// Where the poll loop currently is within a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Fetching,
    Processing,
    Persisting,
    Sleeping,
}

/// Outcome of one fetch/classify/notify/persist pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub fetched: usize,
    pub notified: usize,
    /// Already in the ledger, or without a usable hash or timestamp
    pub skipped: usize,
    pub below_threshold: usize,
    pub failed: usize,
}

/// Cooperative stop request shared with signal handlers and tests
#[derive(Clone, Default)]
pub struct ShutdownHandle {
    requested: Arc<AtomicBool>,
    wake: Arc<Notify>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.requested.store(true, Ordering::Relaxed);
        self.wake.notify_one();
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Relaxed)
    }

    async fn wait(&self) {
        self.wake.notified().await;
    }
}

pub struct TransactionMonitor {
    account_address: String,
    min_amount_minor: u64,
    poll_interval: Duration,
    fetcher: TonApiClient,
    classifier: TransactionClassifier,
    notifier: TelegramNotifier,
    store: LedgerStore,
    ledger: Ledger,
    state: MonitorState,
    shutdown: ShutdownHandle,
}

impl TransactionMonitor {
    /// Build every component from configuration and load the ledger
    pub fn from_config(config: &AppConfig) -> Result<Self, MonitorError> {
        let fetcher = TonApiClient::new(&config.tonapi, config.processing.window_size)?;
        let classifier = TransactionClassifier::new(config.display_offset()?);
        let notifier = TelegramNotifier::new(&config.telegram, &config.wallet)?;
        let store = LedgerStore::new(&config.processing.ledger_path);

        Ok(Self::new(config, fetcher, classifier, notifier, store))
    }

    pub fn new(
        config: &AppConfig,
        fetcher: TonApiClient,
        classifier: TransactionClassifier,
        notifier: TelegramNotifier,
        store: LedgerStore,
    ) -> Self {
        let ledger = store.load();
        info!("Loaded {} processed transactions from {}", ledger.len(), store.path().display());

        Self {
            account_address: config.wallet.address.clone(),
            min_amount_minor: config.min_amount_minor(),
            poll_interval: Duration::from_secs(config.processing.poll_interval_seconds),
            fetcher,
            classifier,
            notifier,
            store,
            ledger,
            state: MonitorState::Idle,
            shutdown: ShutdownHandle::default(),
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Request graceful shutdown
    pub fn shutdown(&self) {
        info!("Requesting graceful shutdown");
        self.shutdown.shutdown();
    }

    fn transition(&mut self, next: MonitorState) {
        debug!("Monitor state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Run cycles until shutdown is requested (Ctrl-C or [`shutdown`](Self::shutdown))
    pub async fn run(&mut self) {
        info!(
            "Watching {} every {}s (threshold {} nanotons, window {})",
            self.account_address,
            self.poll_interval.as_secs(),
            self.min_amount_minor,
            self.fetcher.window_size()
        );

        let handle = self.shutdown.clone();
        let listener = tokio::spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received shutdown signal");
                    handle.shutdown();
                }
                Err(err) => error!("Unable to listen for shutdown signal: {}", err),
            }
        });

        while !self.shutdown.is_requested() {
            info!("Checking for new transactions...");
            if let Err(e) = self.run_cycle().await {
                ErrorLogger::log_error(
                    &NotifierError::Fetch(e),
                    Some(LogContext::new("monitor", "fetch").account(&self.account_address)),
                );
            }

            self.transition(MonitorState::Sleeping);
            tokio::select! {
                _ = sleep(self.poll_interval) => {}
                _ = self.shutdown.wait() => {}
            }
        }

        listener.abort();
        self.transition(MonitorState::Idle);
        info!("Shutdown signal received, transaction monitor stopped");
    }

    /// One cycle: fetch, classify and filter, notify, then persist the ledger once.
    ///
    /// A fetch failure skips the cycle without touching the ledger file. A
    /// failed send leaves the hash out of the ledger so a later cycle can
    /// retry it while it is still inside the window.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, FetchError> {
        let started = Instant::now();

        self.transition(MonitorState::Fetching);
        let transactions = self.fetcher.fetch(&self.account_address).await?;

        self.transition(MonitorState::Processing);
        let mut report = CycleReport {
            fetched: transactions.len(),
            ..CycleReport::default()
        };

        for raw in &transactions {
            let classified = match self.classifier.classify(raw, &self.ledger) {
                Some(classified) => classified,
                None => {
                    report.skipped += 1;
                    continue;
                }
            };

            if !passes_threshold(&classified, self.min_amount_minor) {
                debug!(
                    "Skipping {}: {:.2} TON below threshold",
                    classified.hash,
                    classified.amount()
                );
                report.below_threshold += 1;
                continue;
            }

            let message = self.notifier.render(&classified);
            match self.notifier.send(&message).await {
                Ok(()) => {
                    MetricsLogger::log_notification_sent(&classified);
                    self.ledger.insert(classified.hash);
                    report.notified += 1;
                }
                Err(e) => {
                    ErrorLogger::log_error(
                        &NotifierError::Notify(e),
                        Some(LogContext::new("monitor", "notify").transaction(&classified)),
                    );
                    report.failed += 1;
                }
            }
        }

        self.transition(MonitorState::Persisting);
        if let Err(e) = self.store.save(&self.ledger) {
            // The in-memory ledger stays authoritative and is written again next cycle
            ErrorLogger::log_error(&NotifierError::Ledger(e), Some(LogContext::new("monitor", "persist")));
        }

        MetricsLogger::log_cycle_completed(
            &report,
            self.ledger.len(),
            started.elapsed().as_millis() as u64,
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> AppConfig {
        let mut config = AppConfig::default();
        config.wallet.address = "UQWallet".to_string();
        config.telegram.bot_token = "42:secret".to_string();
        config.telegram.chat_id = "-100500".to_string();
        config.tonapi.endpoint = "http://127.0.0.1:9".to_string();
        config.tonapi.timeout_seconds = 2;
        config.processing.ledger_path = dir.path().join("ledger.json").display().to_string();
        config.processing.poll_interval_seconds = 1;
        config
    }

    #[test]
    fn test_monitor_creation_loads_ledger() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let config = test_config(&dir);

        let mut ledger = Ledger::new();
        ledger.insert("h0");
        LedgerStore::new(&config.processing.ledger_path).save(&ledger).unwrap();

        let monitor = TransactionMonitor::from_config(&config).expect("Failed to build monitor");
        assert!(monitor.ledger().contains("h0"));
        assert_eq!(monitor.state(), MonitorState::Idle);
        assert_eq!(monitor.min_amount_minor, 5_000_000_000);
    }

    #[test]
    fn test_shutdown_signal() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let monitor = TransactionMonitor::from_config(&test_config(&dir)).unwrap();

        let handle = monitor.shutdown_handle();
        assert!(!handle.is_requested());

        monitor.shutdown();
        assert!(handle.is_requested());
    }

    #[tokio::test]
    async fn test_fetch_failure_skips_persistence() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let config = test_config(&dir);
        let mut monitor = TransactionMonitor::from_config(&config).unwrap();

        let result = monitor.run_cycle().await;

        assert!(matches!(result, Err(FetchError::Network(_))));
        assert!(!std::path::Path::new(&config.processing.ledger_path).exists());
    }

    #[tokio::test]
    async fn test_run_returns_after_shutdown() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let mut monitor = TransactionMonitor::from_config(&test_config(&dir)).unwrap();
        let handle = monitor.shutdown_handle();

        let stopper = async move {
            sleep(Duration::from_millis(200)).await;
            handle.shutdown();
        };

        tokio::time::timeout(Duration::from_secs(10), async {
            tokio::join!(monitor.run(), stopper);
        })
        .await
        .expect("Monitor should stop after shutdown request");

        assert_eq!(monitor.state(), MonitorState::Idle);
    }

    #[test]
    fn test_monitor_error_display() {
        let error = MonitorError::Config(crate::error::ConfigError::InvalidUrl("ftp://x".to_string()));
        assert_eq!(format!("{}", error), "Monitor configuration error: Invalid URL format: ftp://x");
    }
}
