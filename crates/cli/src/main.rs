//! Cartsync CLI - Headless cart consumer.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart for a session
//! cartsync --token "$TOKEN" show
//!
//! # Add two units of product 42
//! cartsync add 42 -q 2
//!
//! # Remove product 42
//! cartsync remove 42
//! ```
//!
//! # Commands
//!
//! - `show` - Load and print the cart
//! - `add` - Add a product (skipped if it is already in the cart)
//! - `remove` - Remove a product
//!
//! Configuration is read from the environment (see `CartsyncConfig`); the
//! token falls back to `CART_AUTH_TOKEN`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use cartsync_core::{ProductId, Quantity};
use cartsync_storefront::config::CartsyncConfig;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "cartsync")]
#[command(author, version, about = "Cart synchronization tools")]
struct Cli {
    /// Session token (defaults to `CART_AUTH_TOKEN`)
    #[arg(long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and print the cart
    Show,
    /// Add a product to the cart
    Add {
        /// Product id
        product_id: ProductId,

        /// Units to add
        #[arg(short, long, default_value = "1")]
        quantity: Quantity,
    },
    /// Remove a product from the cart
    Remove {
        /// Product id
        product_id: ProductId,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &CartsyncConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    // Log to stderr so stdout stays parseable JSON
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cartsync_storefront=info,cartsync=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match CartsyncConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing();
            tracing::error!("Invalid configuration: {e}");
            return ExitCode::from(2);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    // Return instead of exiting so the Sentry guard drops and flushes
    match run(cli, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Command failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: &CartsyncConfig) -> Result<(), commands::CliError> {
    let mut session = commands::CartSession::open(config, cli.token).await?;

    let report = match cli.command {
        Commands::Show => session.show(),
        Commands::Add {
            product_id,
            quantity,
        } => session.add(product_id, quantity).await,
        Commands::Remove { product_id } => session.remove(product_id).await,
    };

    session.close();
    commands::print_report(&report)
}
