use log::{info, log, Level};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::time::Instant;
use crate::blockchain::CycleReport;
use crate::config::LoggingConfig;
use crate::error::{ErrorSeverity, NotifierError};
use crate::models::ClassifiedTransaction;

/// Fields attached to a single JSON log line
pub struct LogContext {
    component: &'static str,
    operation: &'static str,
    fields: Map<String, Value>,
}

impl LogContext {
    pub fn new(component: &'static str, operation: &'static str) -> Self {
        Self {
            component,
            operation,
            fields: Map::new(),
        }
    }

    pub fn field(mut self, key: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.fields.insert(key.to_string(), value);
        self
    }

    /// The watched account
    pub fn account(self, address: &str) -> Self {
        self.field("account", address)
    }

    pub fn hash(self, hash: &str) -> Self {
        self.field("hash", hash)
    }

    /// Everything a notification is about, amount in TON with two decimals
    pub fn transaction(self, tx: &ClassifiedTransaction) -> Self {
        self.hash(&tx.hash)
            .field("direction", tx.direction)
            .field("amount_ton", format!("{:.2}", tx.amount()))
            .field("counterparty", &tx.counterparty)
    }

    pub fn elapsed_ms(self, duration_ms: u64) -> Self {
        self.field("duration_ms", duration_ms)
    }

    fn render(&self, level: Level, message: &str) -> String {
        let mut line = Map::new();
        line.insert("timestamp".into(), json!(chrono::Utc::now().to_rfc3339()));
        line.insert("level".into(), json!(level.as_str()));
        line.insert("component".into(), json!(self.component));
        line.insert("operation".into(), json!(self.operation));
        line.insert("message".into(), json!(message));
        line.extend(self.fields.clone());
        Value::Object(line).to_string()
    }

    pub fn emit(&self, level: Level, message: &str) {
        log!(level, "{}", self.render(level, message));
    }
}

/// Times a single outbound call
pub struct PerformanceMonitor {
    start: Instant,
    operation: &'static str,
}

impl PerformanceMonitor {
    pub fn new(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }

    /// Log the outcome and return the elapsed milliseconds
    pub fn finish_with_result<T, E>(self, result: &Result<T, E>) -> u64
    where
        E: std::fmt::Display,
    {
        let duration = self.start.elapsed().as_millis() as u64;
        let context = LogContext::new("performance", self.operation).elapsed_ms(duration);

        match result {
            Ok(_) => context.emit(Level::Debug, "completed"),
            Err(e) => context.field("error", e.to_string()).emit(Level::Warn, "failed"),
        }

        duration
    }
}

pub struct ErrorLogger;

impl ErrorLogger {
    pub fn log_error(error: &NotifierError, context: Option<LogContext>) {
        let severity = error.severity();
        let level = match severity {
            ErrorSeverity::Critical | ErrorSeverity::High => Level::Error,
            ErrorSeverity::Medium => Level::Warn,
            ErrorSeverity::Low => Level::Info,
        };

        context
            .unwrap_or_else(|| LogContext::new("notifier", "unknown"))
            .field("severity", format!("{:?}", severity))
            .emit(level, &error.to_string());
    }
}

pub struct MetricsLogger;

impl MetricsLogger {
    pub fn log_api_call(endpoint: &'static str, duration_ms: u64, success: bool) {
        let context = LogContext::new("metrics", endpoint)
            .elapsed_ms(duration_ms)
            .field("success", success);

        if success {
            context.emit(Level::Debug, "api call completed");
        } else {
            context.emit(Level::Warn, "api call failed");
        }
    }

    pub fn log_notification_sent(tx: &ClassifiedTransaction) {
        LogContext::new("metrics", "notification_sent")
            .transaction(tx)
            .emit(Level::Info, &format!("Sent: {:.2} TON ({})", tx.amount(), tx.direction.label()));
    }

    pub fn log_cycle_completed(report: &CycleReport, ledger_size: usize, duration_ms: u64) {
        let context = LogContext::new("metrics", "cycle_completed")
            .field("report", report)
            .field("ledger_size", ledger_size)
            .elapsed_ms(duration_ms);

        if report.failed > 0 {
            context.emit(Level::Warn, &format!("Cycle finished with {} failed notifications", report.failed));
        } else {
            context.emit(Level::Info, "Cycle finished");
        }
    }
}

/// Initialize logging from configuration. `RUST_LOG` overrides the configured level.
pub fn init_logging(config: &LoggingConfig) -> Result<(), log::SetLoggerError> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.level.as_str()));

    if config.format == "json" {
        builder.format(|buf, record| {
            use std::io::Write;

            let message = record.args().to_string();
            match serde_json::from_str::<Value>(&message) {
                Ok(structured) if structured.is_object() => writeln!(buf, "{}", structured),
                _ => writeln!(
                    buf,
                    "{}",
                    json!({
                        "timestamp": chrono::Utc::now().to_rfc3339(),
                        "level": record.level().to_string(),
                        "target": record.target(),
                        "message": message,
                    })
                ),
            }
        });
    } else {
        builder.format(|buf, record| {
            use std::io::Write;

            writeln!(
                buf,
                "{} [{}] {}: {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        });
    }

    builder.try_init()?;
    info!("Logging initialized at level {}", config.level);
    Ok(())
}
