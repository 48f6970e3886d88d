//! QKart CLI - a terminal storefront.
//!
//! # Usage
//!
//! ```bash
//! # Browse and search the catalog
//! qkart products
//! qkart products --search laptop
//! qkart products --refresh          # bypass the catalog cache
//! qkart search                      # type queries, one per line
//!
//! # Account
//! qkart register crio-user --password learnbydoing --confirm-password learnbydoing
//! qkart login crio-user --password learnbydoing
//! qkart whoami
//! qkart logout
//!
//! # Cart and checkout
//! qkart cart add <product-id>
//! qkart cart inc <product-id>
//! qkart addresses add "221B Baker Street, London"
//! qkart checkout --address <address-id>
//! ```
//!
//! # Environment Variables
//!
//! See `qkart_storefront::config`. `QKART_BACKEND_URL` is required.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use qkart_storefront::config::StorefrontConfig;

mod commands;
mod output;

use commands::Context;

#[derive(Parser)]
#[command(name = "qkart")]
#[command(author, version, about = "QKart terminal storefront")]
struct Cli {
    /// Log notifications instead of printing them
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products
    Products {
        /// Only list products matching this name or category
        #[arg(short, long)]
        search: Option<String>,

        /// Skip the cached catalog
        #[arg(long)]
        refresh: bool,
    },
    /// Search interactively; each line read from stdin is a new query
    Search,
    /// Show or change the cart
    Cart {
        #[command(subcommand)]
        action: Option<CartAction>,
    },
    /// Manage shipping addresses
    Addresses {
        #[command(subcommand)]
        action: Option<AddressAction>,
    },
    /// Place the order for the current cart
    Checkout {
        /// Address to ship to
        #[arg(short, long)]
        address: String,
    },
    /// Create an account
    Register {
        username: String,
        #[arg(short, long)]
        password: String,
        #[arg(short, long)]
        confirm_password: String,
    },
    /// Log in and remember the session
    Login {
        username: String,
        #[arg(short, long)]
        password: String,
    },
    /// Forget the session
    Logout,
    /// Show the logged-in user and wallet balance
    Whoami,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add a product with quantity 1
    Add { product_id: String },
    /// Increase a product's quantity by one
    Inc { product_id: String },
    /// Decrease a product's quantity by one (0 removes it)
    Dec { product_id: String },
}

#[derive(Subcommand)]
enum AddressAction {
    /// List saved addresses
    List,
    /// Save a new address
    Add {
        #[arg(required = true, num_args = 1..)]
        address: Vec<String>,
    },
    /// Delete a saved address
    Delete { address_id: String },
}

/// Initialize Sentry error tracking.
///
/// Returns `None` if `SENTRY_DSN` is not configured.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Sentry must be initialized before the tracing subscriber
    let config = StorefrontConfig::from_env();
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "qkart_storefront=info,qkart_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result: Result<(), Box<dyn std::error::Error>> = match config {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut ctx = Context::new(config, cli.quiet)?;

    match cli.command {
        Commands::Products { search, refresh } => {
            commands::catalog::products(&ctx, search.as_deref(), refresh).await?;
        }
        Commands::Search => commands::catalog::interactive_search(&ctx).await?,
        Commands::Cart { action } => match action.unwrap_or(CartAction::Show) {
            CartAction::Show => commands::cart::show(&ctx).await?,
            CartAction::Add { product_id } => commands::cart::add(&ctx, &product_id).await?,
            CartAction::Inc { product_id } => {
                commands::cart::step(&ctx, &product_id, qkart_core::QuantityChange::Add).await?;
            }
            CartAction::Dec { product_id } => {
                commands::cart::step(&ctx, &product_id, qkart_core::QuantityChange::Remove)
                    .await?;
            }
        },
        Commands::Addresses { action } => match action.unwrap_or(AddressAction::List) {
            AddressAction::List => commands::addresses::list(&ctx).await?,
            AddressAction::Add { address } => {
                commands::addresses::add(&ctx, &address.join(" ")).await?;
            }
            AddressAction::Delete { address_id } => {
                commands::addresses::delete(&ctx, &address_id).await?;
            }
        },
        Commands::Checkout { address } => commands::checkout::place_order(&mut ctx, &address).await?,
        Commands::Register {
            username,
            password,
            confirm_password,
        } => commands::account::register(&ctx, username, password, confirm_password).await?,
        Commands::Login { username, password } => {
            commands::account::login(&mut ctx, username, password).await?;
        }
        Commands::Logout => commands::account::logout(&mut ctx)?,
        Commands::Whoami => commands::account::whoami(&ctx),
    }
    Ok(())
}
