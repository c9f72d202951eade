//! Item listings
//!
//! Usage:
//!   tally fetch <ID>...
//!   tally top-rated [--limit N]
//!   tally recent [--limit N]
//!   tally search <PREFIX> [--limit N]

use clap::Args;
use serde::Serialize;

use tally_core::Item;

use super::{print_json, Context};

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Item ids; output keeps this order
    #[arg(required = true)]
    pub ids: Vec<String>,
}

#[derive(Debug, Args)]
pub struct LimitArgs {
    /// Defaults to catalog.default_limit
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    pub prefix: String,
    #[arg(long)]
    pub limit: Option<usize>,
}

/// Display form of an item
#[derive(Debug, Serialize)]
struct ItemView<'a> {
    id: &'a str,
    title: Option<&'a str>,
    release_date: Option<String>,
    genres: Vec<String>,
    platforms: Vec<String>,
    aggregate_score: f64,
    aggregate_count: u64,
}

impl<'a> From<&'a Item> for ItemView<'a> {
    fn from(item: &'a Item) -> Self {
        Self {
            id: &item.id,
            title: item.title(),
            release_date: item.release_date(),
            genres: item.genres(),
            platforms: item.platforms(),
            aggregate_score: item.aggregate_score(),
            aggregate_count: item.aggregate_count(),
        }
    }
}

fn print_items(items: &[Item]) -> anyhow::Result<()> {
    let views: Vec<ItemView<'_>> = items.iter().map(ItemView::from).collect();
    print_json(&views)
}

pub async fn execute_fetch(ctx: &Context, args: FetchArgs) -> anyhow::Result<()> {
    let items = ctx.fetcher().fetch_many(&args.ids).await?;
    print_items(&items)
}

pub async fn execute_top_rated(ctx: &Context, args: LimitArgs) -> anyhow::Result<()> {
    let items = ctx.catalog().top_rated(args.limit).await?;
    print_items(&items)
}

pub async fn execute_recent(ctx: &Context, args: LimitArgs) -> anyhow::Result<()> {
    let items = ctx.catalog().recent(args.limit).await?;
    print_items(&items)
}

pub async fn execute_search(ctx: &Context, args: SearchArgs) -> anyhow::Result<()> {
    let items = ctx.catalog().search_by_title(&args.prefix, args.limit).await?;
    print_items(&items)
}
