//! Wishlist commands (require --user)
//!
//! Usage:
//!   tally --user <UID> wishlist show
//!   tally --user <UID> wishlist toggle <ITEM_ID> [--member]

use clap::{Args, Subcommand};
use serde_json::json;

use super::{print_json, Context};

#[derive(Debug, Args)]
pub struct WishlistArgs {
    #[command(subcommand)]
    pub command: WishlistCommand,
}

#[derive(Debug, Subcommand)]
pub enum WishlistCommand {
    /// Print the current saved set
    Show,
    /// Add an item, or remove it when --member says it is saved
    Toggle {
        item_id: String,
        /// The item is currently saved
        #[arg(long)]
        member: bool,
    },
}

pub async fn execute(ctx: &Context, args: WishlistArgs) -> anyhow::Result<()> {
    let sync = ctx.wishlist();
    match args.command {
        WishlistCommand::Show => {
            let mut live = sync.observe().await?;
            let items = live.next().await.unwrap_or_default();
            live.cancel();
            print_json(&items)
        }
        WishlistCommand::Toggle { item_id, member } => {
            let intent = sync.toggle(&item_id, member).await?;
            print_json(&json!({
                "item_id": item_id,
                "member": intent.resulting_membership(),
            }))
        }
    }
}
