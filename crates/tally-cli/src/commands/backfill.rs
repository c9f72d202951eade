//! Recompute every item's aggregate
//!
//! Usage: tally --seed <SEED> [--save <OUT>] backfill
//!
//! Per-item failures are printed in the report; the command still succeeds.

use serde_json::json;

use tally_core::ExError;

use super::{print_json, Context};

pub async fn execute(ctx: &Context) -> anyhow::Result<()> {
    let report = ctx.backfill().recompute_all().await?;

    let items: Vec<_> = report
        .outcomes
        .iter()
        .map(|outcome| match &outcome.result {
            Ok(aggregate) => json!({
                "item_id": outcome.item_id,
                "aggregate_score": aggregate.score,
                "aggregate_count": aggregate.count,
            }),
            Err(err) => {
                let ex: ExError = err.into();
                json!({
                    "item_id": outcome.item_id,
                    "error": { "code": ex.code(), "message": err.to_string() },
                })
            }
        })
        .collect();

    print_json(&json!({
        "attempted": report.attempted(),
        "succeeded": report.succeeded(),
        "items": items,
    }))
}
