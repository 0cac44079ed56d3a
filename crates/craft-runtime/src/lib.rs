#![deny(warnings)]

//! End-to-end crafting calculation: request preparation, rules evaluation
//! and summary rendering.

pub mod config;
pub mod request;
pub mod summary;

pub use config::{load_request, CraftConfig, LoadError};
pub use request::{prepare, CraftingRequest};
pub use summary::{format_days, format_summary, render_summary};

use craft_core::{calculate_end_date, get_result_type, CraftingInput, OutcomeTier};
use craft_econ::{reconcile_cost, CostBreakdown};
use serde::Serialize;
use tracing::debug;

/// Everything derived for one calculation.
#[derive(Clone, Debug, Serialize)]
pub struct CraftingReport {
    pub input: CraftingInput,
    pub tier: OutcomeTier,
    /// `YYYY-MM-DD`, empty when the start date is missing or malformed.
    pub end_date: String,
    pub cost: CostBreakdown,
    pub summary: String,
}

/// Evaluate a prepared input.
pub fn run(input: &CraftingInput) -> CraftingReport {
    let tier = get_result_type(input.crafting_dc, input.crafting_roll);
    let end_date = calculate_end_date(&input.start_date, input.setup_days, input.additional_days);
    let cost = reconcile_cost(input, tier);
    let summary = render_summary(input, tier, &end_date, &cost);
    debug!(%tier, end_date = %end_date, final_cp = cost.final_cost.0, "calculation complete");
    CraftingReport {
        input: input.clone(),
        tier,
        end_date,
        cost,
        summary,
    }
}
