//! Product Catalog console
//!
//! Registers users, adds products and cancels subscriptions from stdin.

use clap::{Parser, ValueEnum};
use product_catalog::{
    Catalog, CatalogConfig, DuplicatePolicy, OutputFormat, Session, SessionConfig,
};
use std::io;
use std::num::NonZeroUsize;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Duplicates {
    Reject,
    Replace,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// Product Catalog console
#[derive(Parser, Debug)]
#[command(name = "product-catalog")]
#[command(version, about = "Subscribe users and notify them of new products")]
struct Args {
    /// What to do when a user name is registered twice
    #[arg(long, default_value = "reject", value_enum)]
    duplicates: Duplicates,

    /// Maximum pending notifications per user, at least 1 (unbounded if omitted)
    #[arg(long)]
    inbox_capacity: Option<NonZeroUsize>,

    /// Action word that cancels a subscription
    #[arg(long, default_value = "cancel")]
    cancel_keyword: String,

    /// Notification output format
    #[arg(long, default_value = "text", value_enum)]
    format: Format,

    /// Unregister users whose inbox refuses a notification
    #[arg(long)]
    drop_unreachable: bool,
}

fn main() {
    // Logs go to stderr so they never mix with the console protocol.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> product_catalog::Result<()> {
    let catalog = Catalog::with_config(CatalogConfig {
        duplicate_policy: match args.duplicates {
            Duplicates::Reject => DuplicatePolicy::Reject,
            Duplicates::Replace => DuplicatePolicy::Replace,
        },
        drop_unreachable: args.drop_unreachable,
    });

    let config = SessionConfig {
        cancel_keyword: args.cancel_keyword,
        inbox_capacity: args.inbox_capacity,
        format: match args.format {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
        },
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut session = Session::new(&catalog, config, stdin.lock(), stdout.lock());
    session.run()
}
