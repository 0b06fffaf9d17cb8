// SPDX-License-Identifier: MPL-2.0

//! Demo program: print the modes of the first base station, then every
//! motion event until Ctrl-C.
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=arlo_lib=debug cargo run --example motion_events -- <email> <password>
//! ```

use std::env;
use std::time::Duration;

use arlo_lib::{Arlo, Device, Event, LoopExit};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: {} <email> <password>", args[0]);
        std::process::exit(1);
    }

    let arlo = Arlo::login(&args[1], &args[2]).await?;
    arlo.shutdown_on_interrupt();

    let Some(basestation) = arlo
        .transport()
        .get_devices(Some(Device::BASESTATION))
        .await?
        .into_iter()
        .next()
    else {
        eprintln!("No base station on this account");
        arlo.logout().await?;
        return Ok(());
    };
    println!("Using {basestation}");

    match arlo.get_modes(&basestation).await? {
        Some(reply) => println!("Modes: {}", reply.properties().cloned().unwrap_or_default()),
        None => println!("No reply to the modes query"),
    }

    println!("Waiting for motion (Ctrl-C to stop)...");
    loop {
        let exit = arlo
            .subscribe_to_motion_events(
                &basestation,
                |device: &Device, event: &Event| {
                    println!("Motion on {device}: {}", event.resource().unwrap_or("?"));
                },
                None,
            )
            .await?;
        match exit {
            LoopExit::Shutdown => break,
            other => {
                println!("Event loop ended ({other:?}), resubscribing");
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        }
    }

    arlo.transport().logout().await?;
    println!("Logged out");
    Ok(())
}
