//! Basic logger usage example
//!
//! Demonstrates console logging, level filtering, structured records and
//! the formatting macros.
//!
//! Run with: cargo run --example basic_usage

use logz::prelude::*;
use logz::{info, warn};

fn main() -> Result<()> {
    println!("=== logz - Basic Usage Example ===\n");

    let logger = Logger::builder().min_level(Level::Trace).build();

    println!("1. Logging at different levels:");
    logger.trace("This is a trace message");
    logger.debug("This is a debug message");
    logger.info("This is an info message");
    logger.success("This is a success message");
    logger.warn("This is a warning message");
    logger.error("This is an error message");
    logger.critical("This is a critical message");

    println!("\n2. Logging with different minimum levels:");
    logger.set_min_level(Level::Info);
    println!("   Minimum level set to INFO - trace and debug won't show:");
    logger.trace("Trace message (hidden)");
    logger.debug("Debug message (hidden)");
    logger.info("Info message (visible)");

    println!("\n3. Structured records:");
    logger.log(
        Record::new(Level::Info, "order placed")
            .with_source("checkout")
            .tag("region", "eu-west-1")
            .with_field("order_id", 1042)
            .with_field("total", 99.5),
    )?;

    println!("\n4. JSON output and macros:");
    logger.set_formatter(Formatter::from_name("json")?);
    let port = 8080;
    info!(logger, "Server listening on port {}", port);
    warn!(logger, "{} connections pending", 12);

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
