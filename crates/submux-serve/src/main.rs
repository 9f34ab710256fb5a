//! submux-serve: Standalone dispatch bridge
//!
//! Loads a service configuration, subscribes to the configured subscriptions
//! and logs every delivered message. Useful as a debug consumer and as a
//! reference wiring of the server crate.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use submux_client::PubSubFactory;
use submux_metadata::ServiceConfig;
use submux_server::{FnHandler, HandlerRegistry, PubSubServer, ServerOptions};

#[derive(Parser, Debug)]
#[command(name = "submux-serve")]
#[command(about = "Pub/sub dispatch bridge")]
struct Args {
    /// Path to service configuration file
    #[arg(short, long)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = ServiceConfig::load(&args.config)?;
    info!(service = %config.name, project = %config.project, "Loaded service configuration");

    let subscriptions = config
        .subscriptions
        .clone()
        .filter(|names| !names.is_empty())
        .ok_or("config must list at least one subscription to serve")?;

    let client = PubSubFactory::create(&config.project, &config.broker).await?;

    let mut registry = HandlerRegistry::new();
    for name in &subscriptions {
        registry.register(
            name.clone(),
            Arc::new(FnHandler::new(|message: submux_client::EmittedMessage| async move {
                info!(
                    subscription = %message.subscription,
                    id = %message.id,
                    bytes = message.payload.len(),
                    "Received message"
                );
                anyhow::Ok(())
            })),
        );
    }

    let options = ServerOptions {
        subscriptions: Some(subscriptions),
        listen: config.listen.clone(),
    };
    let server = PubSubServer::new(client, registry, options);

    let activated = server.serve().await?;
    info!(count = activated.len(), "Serving subscriptions");

    // Shutdown on Ctrl+C
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        shutdown_tx.send(true).ok();
    });

    while !*shutdown_rx.borrow() {
        if shutdown_rx.changed().await.is_err() {
            break;
        }
    }

    server.close().await?;
    info!("Shutdown complete");

    Ok(())
}
