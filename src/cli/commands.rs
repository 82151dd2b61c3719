// CLI Command Implementations
// Offline commands: configuration checks and catalog listing

use super::{error, info, success, warning, Commands};
use crate::config::ShopConfig;
use crate::shop::catalog::Catalog;
use crate::shop::models::Product;
use crate::store::Stores;
use colored::*;

/// Execute a command that does not start the server
pub fn execute(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Validate { file } => validate_command(&file),
        Commands::Catalog { format } => catalog_command(&format),
        Commands::Start { .. } => {
            anyhow::bail!("start is handled by the server entry point")
        }
    }
}

/// Validate a configuration file without binding anything
fn validate_command(file: &str) -> anyhow::Result<()> {
    info(&format!("Validating {}", file.bright_white()));

    if !std::path::Path::new(file).exists() {
        warning("File not found, checking built-in defaults");
    }

    let config = ShopConfig::from_file(file)?;
    if let Err(e) = config.validate() {
        error(&format!("{e:#}"));
        return Err(e);
    }

    success("Configuration file is valid");
    println!();
    println!(
        "  {} {}:{}",
        "Listen:".bright_white(),
        config.server.bind_addr.cyan(),
        config.server.port.to_string().cyan()
    );
    println!(
        "  {} {}",
        "Secure max quantity:".bright_white(),
        config.shop.secure_max_quantity.to_string().yellow()
    );
    println!(
        "  {} {} ms",
        "Payment delay:".bright_white(),
        config.shop.payment_delay_ms.to_string().yellow()
    );
    println!("  {} {}", "Log format:".bright_white(), config.logging.format.green());
    println!();

    Ok(())
}

/// Print the seeded catalog
fn catalog_command(format: &str) -> anyhow::Result<()> {
    let stores = Stores::in_memory();
    let products = Catalog::seeded(stores.products.clone()).list_products();

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&products)?),
        "table" => print_table(&products),
        other => anyhow::bail!("Unknown format {other:?}, expected \"table\" or \"json\""),
    }

    Ok(())
}

fn print_table(products: &[Product]) {
    println!();
    println!(
        "  {:<4} {:<12} {:>10}",
        "ID".bright_white().bold(),
        "Name".bright_white().bold(),
        "Price".bright_white().bold()
    );
    println!("  {}", "─".repeat(28).bright_black());
    for product in products {
        println!(
            "  {:<4} {:<12} {:>10}",
            product.id.cyan(),
            product.name,
            format!("${:.2}", product.price).green()
        );
    }
    println!();
}
