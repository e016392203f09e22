//! Runnable demo of the HydraWise peripheral against the in-memory stack.
//!
//! Run with: cargo run --example run_server

use std::time::Duration;

use hydrawise_ble::{CharacteristicKind, MockStack, Peripheral, Result};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt().with_env_filter("info").init();

    println!("HydraWise BLE Peripheral");
    println!("========================\n");

    let peripheral = Peripheral::new(MockStack::new()).await?;
    peripheral.start().await?;

    let stack = peripheral.stack();
    let command = peripheral
        .registry()
        .handle_for(CharacteristicKind::Command)?;

    // Script a central: connect shortly after boot and enable telemetry.
    tokio::time::sleep(Duration::from_secs(2)).await;
    stack.connect(7);
    stack.write(7, command, b"START");

    println!("Simulated central connected. Press Ctrl+C to exit.\n");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("\nExiting...");
                break;
            }
            _ = tokio::time::sleep(Duration::from_secs(1)) => {
                print_status(&peripheral);
            }
        }
    }

    stack.disconnect(7);
    peripheral.shutdown().await?;

    Ok(())
}

fn print_status(peripheral: &Peripheral<MockStack>) {
    let stack = peripheral.stack();

    let connection = peripheral
        .connection()
        .map(|conn| conn.to_string())
        .unwrap_or_else(|| "none".to_string());

    println!(
        "state: {:<11}  connection: {:<8}  telemetry: {:<3}  notifications sent: {}",
        peripheral.link_state().to_string(),
        connection,
        if peripheral.is_telemetry_enabled() {
            "on"
        } else {
            "off"
        },
        stack.notification_count(),
    );
}
