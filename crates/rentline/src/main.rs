// SPDX-FileCopyrightText: 2026 Rentline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rentline - a Telegram lead-qualification bot for rental listings.
//!
//! This is the binary entry point for the Rentline bot.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod health;
mod serve;

use clap::{Parser, Subcommand};

/// Rentline - a Telegram lead-qualification bot for rental listings.
#[derive(Parser, Debug)]
#[command(name = "rentline", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the bot (default).
    Serve,
    /// Print the effective configuration after validation.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match rentline_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            rentline_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Config) => {
            print_effective_config(&config);
        }
        Some(Commands::Serve) | None => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("rentline: {e}");
                std::process::exit(1);
            }
        }
    }
}

/// Prints the resolved configuration as TOML, with the bot token redacted.
fn print_effective_config(config: &rentline_config::RentlineConfig) {
    let mut shown = config.clone();
    if shown.telegram.bot_token.is_some() {
        shown.telegram.bot_token = Some("<redacted>".to_string());
    }
    match toml::to_string_pretty(&shown) {
        Ok(rendered) => print!("{rendered}"),
        Err(e) => eprintln!("rentline: failed to render config: {e}"),
    }
}

#[cfg(test)]
mod tests {
    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Verify jemalloc is the global allocator by advancing the epoch.
        // Only jemalloc supports this -- the system allocator would fail.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn default_config_renders_with_redacted_token() {
        let mut config = rentline_config::RentlineConfig::default();
        config.telegram.bot_token = Some("123:secret".to_string());

        let mut shown = config.clone();
        shown.telegram.bot_token = Some("<redacted>".to_string());
        let rendered = toml::to_string_pretty(&shown).unwrap();
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("123:secret"));
    }
}
