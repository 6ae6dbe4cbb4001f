pub mod tonapi_client;
pub mod classifier;
pub mod transaction_monitor;

pub use tonapi_client::TonApiClient;
pub use classifier::{TransactionClassifier, passes_threshold};
pub use transaction_monitor::{TransactionMonitor, MonitorError, MonitorState, CycleReport, ShutdownHandle};
