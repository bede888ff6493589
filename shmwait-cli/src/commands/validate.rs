// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `shmwait validate` command - Validate configuration file.

use shmwait_core::ConfigLoader;

pub async fn execute(file: &str) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(file = %file, "Validating configuration");

    match ConfigLoader::load_file(file) {
        Ok(config) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Wait Set Settings:");
            println!("  Capacity:     {} slots", config.waitset.capacity);
            println!(
                "  Segment:      {}",
                config
                    .waitset
                    .segment
                    .as_ref()
                    .map(|s| s.as_str())
                    .unwrap_or("<private>")
            );
            println!(
                "  Wait Timeout: {}ms",
                config.waitset.wait_timeout.as_millis()
            );
            println!();
            println!("Services ({}):", config.services.len());
            for (slot, service) in config.services.iter().enumerate() {
                println!("  - {} (event id: {})", service, slot);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed:");
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    }
}
