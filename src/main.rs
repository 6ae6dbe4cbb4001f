use log::info;
use ton_tx_notifier::config::AppConfig;
use ton_tx_notifier::logging::init_logging;
use ton_tx_notifier::TransactionMonitor;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let config = AppConfig::load()?;
    init_logging(&config.logging)?;

    info!("Starting TON transaction notifier");

    let mut monitor = TransactionMonitor::from_config(&config)?;
    monitor.run().await;

    println!("Notifier stopped");
    Ok(())
}
