pub mod blockchain;
pub mod ledger;
pub mod models;
pub mod notification;
pub mod error;
pub mod logging;
pub mod config;

pub use blockchain::{TonApiClient, TransactionClassifier, TransactionMonitor};
pub use error::{NotifierError, Result};
pub use ledger::{Ledger, LedgerStore};
pub use logging::{LogContext, PerformanceMonitor, ErrorLogger, MetricsLogger};
pub use notification::TelegramNotifier;
pub use config::{AppConfig, WalletConfig, TonApiConfig, TelegramConfig, ProcessingConfig, LoggingConfig};
