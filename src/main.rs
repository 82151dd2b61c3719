// Secure Shop
// Main entry point: parses the CLI, wires config, logging and shutdown, then serves

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use secure_shop::cli::{self, Cli, Commands};
use secure_shop::config::ShopConfig;
use secure_shop::network::{self, SocketOptions};
use secure_shop::observability::{self, LogFormat};
use secure_shop::signals::{self, ShutdownCoordinator};
use secure_shop::web;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            config,
            port,
            verbose,
        } => run_server(config, port, verbose).await,
        command => cli::commands::execute(command),
    }
}

/// Run all shops until SIGTERM or SIGINT
async fn run_server(config_path: String, port: Option<u16>, verbose: bool) -> Result<()> {
    let mut config = match ShopConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            cli::error(&format!("Configuration error: {e:#}"));
            return Err(e);
        }
    };
    if let Some(port) = port {
        config.server.port = port;
        config.validate()?;
    }

    observability::init(LogFormat::select(&config.logging.format, verbose))?;
    cli::print_banner();

    info!(
        config = %config_path,
        port = config.server.port,
        payment_delay_ms = config.shop.payment_delay_ms,
        "Configuration loaded"
    );

    let coordinator = ShutdownCoordinator::new();

    let shutdown_signal = signals::create_shutdown_listener()?;
    info!("Signal handlers installed (SIGTERM, SIGINT)");

    let app = web::app(&config, coordinator.token());

    let addr = config.server.socket_addr()?;
    let listener = network::bind_listener(&addr, &SocketOptions::default())?;

    cli::info(&format!("Shops available at http://localhost:{}/", config.server.port));
    cli::info("Press Ctrl+C for graceful shutdown");

    let mut server = tokio::spawn(network::serve(listener, app, coordinator.child_token()));

    let early_exit = tokio::select! {
        _ = shutdown_signal => None,
        finished = &mut server => Some(finished),
    };
    coordinator.trigger();

    let finished = match early_exit {
        Some(finished) => finished,
        None => server.await,
    };

    match finished {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Server exited with error: {:#}", e),
        Err(e) => error!("Server task failed: {}", e),
    }

    info!("Secure Shop stopped");
    Ok(())
}
