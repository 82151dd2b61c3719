// Command Line Interface Module
// clap front end for running the shops and inspecting their setup

pub mod commands;

use clap::{Parser, Subcommand};
use colored::*;

/// Secure Shop - paired vulnerable and hardened web shops for security training
#[derive(Parser)]
#[command(name = "secure-shop")]
#[command(version)]
#[command(
    about = "Educational web shop demonstrating price and order tampering",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server with all four shops
    Start {
        /// Configuration file path
        #[arg(short, long, default_value = "shop.toml")]
        config: String,

        /// Listening port, overrides both the file and the PORT variable
        #[arg(short, long)]
        port: Option<u16>,

        /// Human readable logs instead of JSON
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate configuration file
    Validate {
        /// Configuration file to validate
        #[arg(short, long, default_value = "shop.toml")]
        file: String,
    },

    /// Print the product catalog
    Catalog {
        /// Output format: table or json
        #[arg(short, long, default_value = "table")]
        format: String,
    },
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red().bold(), msg);
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue().bold(), msg);
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{} {}", "⚠".yellow().bold(), msg);
}

pub fn print_banner() {
    println!(
        "{}",
        r#"
╔═══════════════════════════════════════════════════════════╗
║                                                           ║
║   SECURE SHOP                                             ║
║                                                           ║
║   Price manipulation and order tampering, side by side    ║
║                                                           ║
╚═══════════════════════════════════════════════════════════╝
    "#
        .bright_cyan()
        .bold()
    );
}
