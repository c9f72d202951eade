//! Review commands
//!
//! Usage:
//!   tally review list --item <ID>
//!   tally review add --item <ID> --author <UID> --rating <R> --body <TEXT>
//!   tally review update <REVIEW_ID> --rating <R> --body <TEXT>
//!   tally review delete <REVIEW_ID> --item <ID>
//!   tally review recompute --item <ID>

use clap::{Args, Subcommand};
use serde_json::json;

use super::{print_json, Context};

#[derive(Debug, Args)]
pub struct ReviewArgs {
    #[command(subcommand)]
    pub command: ReviewCommand,
}

#[derive(Debug, Subcommand)]
pub enum ReviewCommand {
    /// List an item's reviews, newest first
    List {
        #[arg(long)]
        item: String,
    },
    /// Add a review and recompute the item's aggregate
    Add {
        #[arg(long)]
        item: String,
        #[arg(long)]
        author: String,
        #[arg(long)]
        rating: f64,
        #[arg(long)]
        body: String,
    },
    /// Change a review's rating and body
    Update {
        review_id: String,
        #[arg(long)]
        rating: f64,
        #[arg(long)]
        body: String,
    },
    /// Delete a review and recompute its item
    Delete {
        review_id: String,
        #[arg(long)]
        item: String,
    },
    /// Recompute one item's aggregate
    Recompute {
        #[arg(long)]
        item: String,
    },
}

pub async fn execute(ctx: &Context, args: ReviewArgs) -> anyhow::Result<()> {
    let reviews = ctx.reviews();
    match args.command {
        ReviewCommand::List { item } => {
            let list = reviews.fetch_for_item(&item).await?;
            print_json(&list)
        }
        ReviewCommand::Add {
            item,
            author,
            rating,
            body,
        } => {
            let review_id = reviews.add(&item, &author, rating, &body).await?;
            print_json(&json!({ "review_id": review_id }))
        }
        ReviewCommand::Update {
            review_id,
            rating,
            body,
        } => {
            reviews.update(&review_id, rating, &body).await?;
            print_json(&json!({ "review_id": review_id, "updated": true }))
        }
        ReviewCommand::Delete { review_id, item } => {
            reviews.delete(&review_id, &item).await?;
            print_json(&json!({ "review_id": review_id, "deleted": true }))
        }
        ReviewCommand::Recompute { item } => {
            let aggregate = reviews.recompute(&item).await?;
            print_json(&json!({
                "item_id": item,
                "aggregate_score": aggregate.score,
                "aggregate_count": aggregate.count,
            }))
        }
    }
}
