//! File logging example
//!
//! Builds a logger from a YAML configuration: console plus a rotating,
//! compressed log file behind a buffered writer.
//!
//! Run with: cargo run --example file_logging

use logz::prelude::*;

const CONFIG: &str = r#"
general:
  prefix: APP
format:
  formatter: text
  level: debug
output:
  output_tty: true
  output_file: application.log
rotating:
  rotate: true
  rotate_max_size: 4096
  rotate_max_back: 3
  rotate_max_age: 7d
  compress: true
buffering:
  buffer_size: 8192
  flush_interval: 500ms
"#;

fn main() -> Result<()> {
    println!("=== logz - File Logging Example ===\n");

    // APP_MIN_LEVEL=warn and friends override the file
    let mut config = LoggerConfig::from_yaml_str(CONFIG)?;
    let prefix = config.general.prefix.clone();
    config.apply_env(&prefix)?;
    let logger = config.build()?;

    println!("1. Logging to both console and file:");
    logger.info("Application started");
    logger.debug("Loading configuration...");
    logger.warn("Using default settings for some options");
    logger.error("Failed to load optional plugin");

    println!("\n2. Enough output to rotate the file a few times:");
    for i in 1..=200 {
        logger.log(
            Record::new(Level::Info, format!("Processing item {}/200", i))
                .with_field("item", i as i64),
        )?;
    }
    logger.success("All operations completed");

    logger.flush()?;

    println!("\n=== Example completed successfully! ===");
    println!("Check 'application.log' and its rotated siblings for the full output");

    Ok(())
}
