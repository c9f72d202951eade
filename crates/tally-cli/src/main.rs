//! Tally CLI
//!
//! Runs engine operations against an in-memory store loaded from a JSON
//! seed. Results go to stdout as JSON, logs to stderr.

use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "tally")]
#[command(about = "Tally - review aggregates, batch fetch and wishlists", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: commands::GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Recompute the aggregate of every item
    Backfill,
    /// Review operations
    Review(commands::review::ReviewArgs),
    /// Fetch items by id, in the given order
    Fetch(commands::catalog::FetchArgs),
    /// Items with the highest aggregate score
    TopRated(commands::catalog::LimitArgs),
    /// Most recently released items
    Recent(commands::catalog::LimitArgs),
    /// Items whose title starts with a prefix
    Search(commands::catalog::SearchArgs),
    /// Wishlist operations
    Wishlist(commands::wishlist::WishlistArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match commands::Context::open(&cli.global) {
        Ok(ctx) => {
            let outcome = match cli.command {
                Commands::Backfill => commands::backfill::execute(&ctx).await,
                Commands::Review(args) => commands::review::execute(&ctx, args).await,
                Commands::Fetch(args) => commands::catalog::execute_fetch(&ctx, args).await,
                Commands::TopRated(args) => commands::catalog::execute_top_rated(&ctx, args).await,
                Commands::Recent(args) => commands::catalog::execute_recent(&ctx, args).await,
                Commands::Search(args) => commands::catalog::execute_search(&ctx, args).await,
                Commands::Wishlist(args) => commands::wishlist::execute(&ctx, args).await,
            };
            outcome.and_then(|_| ctx.save())
        }
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
