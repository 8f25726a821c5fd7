// ABOUTME: Service binary running one sync cycle at startup then the daily scheduler loop
// ABOUTME: Loads env configuration, initializes logging, and never exits on a failed cycle
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Renpho to Garmin sync service
//!
//! Long-running daemon: loads configuration from the environment, runs one
//! sync cycle immediately, then one per calendar day at `SYNC_TIME`.

use anyhow::{Context, Result};
use renpho_garmin_sync::{
    config::AppConfig,
    logging,
    providers::{garmin::GarminConfig, renpho::RenphoConfig, GarminUploader, RenphoClient},
    scheduler::Scheduler,
    sync::SyncEngine,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env().context("failed to load configuration")?;

    logging::init_from_env()?;
    info!("starting renpho-garmin-sync");
    info!("{}", config.summary());

    // One HTTP client serves both providers
    let http_client = config
        .http
        .build_client()
        .context("failed to build http client")?;

    let source = RenphoClient::new(
        RenphoConfig::new(
            &config.renpho.email,
            &config.renpho.password,
            config.timezone,
        ),
        http_client.clone(),
    )
    .context("failed to build renpho client")?;
    let uploader = GarminUploader::new(
        GarminConfig::new(&config.garmin.email, &config.garmin.password),
        http_client,
    );

    let mut engine = SyncEngine::new(source, uploader);
    let scheduler = Scheduler::new(config.sync_time, config.timezone);

    // Immediate cycle at startup, then the daily loop
    let outcome = engine.run_cycle(scheduler.today()).await;
    info!(outcome = outcome.label(), "startup sync cycle finished");

    scheduler.run(&mut engine).await;
    info!("renpho-garmin-sync stopped");
    Ok(())
}
