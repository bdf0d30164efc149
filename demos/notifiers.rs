//! Notifier example
//!
//! Forwards error records to a webhook and exposes logging metrics for
//! scraping. Point WEBHOOK_URL at a request bin to see the payloads.
//!
//! Run with: cargo run --example notifiers

use logz::notifiers::NotifierDescription;
use logz::prelude::*;
use std::sync::Arc;

fn main() -> Result<()> {
    println!("=== logz - Notifier Example ===\n");

    let url = std::env::var("WEBHOOK_URL").unwrap_or_else(|_| "http://127.0.0.1:9/hook".into());
    let mut description = NotifierDescription::new();
    description.insert("ops".into(), NotifierConfig::http(url).with_level("error"));
    description.insert(
        "desktop".into(),
        NotifierConfig::dbus().with_level("critical"),
    );

    let registry = Arc::new(NotifierRegistry::new());
    for err in registry.update_from_config(&description) {
        println!("   skipped notifier: {}", err);
    }

    let metrics = MetricsRegistry::global();
    let address = metrics.enable(0)?;
    println!("Metrics served at http://{}/metrics\n", address);

    let logger = Logger::builder()
        .formatter(Formatter::from_name("json")?)
        .notifiers(registry)
        .metrics(Arc::clone(&metrics))
        .build();

    logger.info("routine message, not forwarded");
    logger.error("payment gateway unreachable");
    logger.critical("database primary lost");

    println!("\nCurrent metrics:");
    for (name, value) in metrics.get_metrics() {
        println!("   {} = {}", name, value);
    }

    metrics.disable();
    println!("\n=== Example completed successfully! ===");

    Ok(())
}
