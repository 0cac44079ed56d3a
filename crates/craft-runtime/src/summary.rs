//! Chat-ready text summary of a crafting calculation.
//!
//! Field order and labels are consumed by existing tooling and must not change.

use craft_core::{format_month_day, CraftingInput, OutcomeTier};
use craft_econ::{reconcile_cost, CostBreakdown};

/// `MM/DD`, or `MM/DD-MM/DD` when the window spans more than one day.
pub fn format_days(start_date: &str, end_date: &str) -> String {
    let mut days = format_month_day(start_date);
    let end = format_month_day(end_date);
    if !end.is_empty() && end != days {
        days.push('-');
        days.push_str(&end);
    }
    days
}

fn cost_line(cost: &CostBreakdown) -> String {
    let mut line = format!("**Cost:** {} gp", cost.final_cost.to_gold());
    if cost.formula_cost.0 > 0 {
        line.push_str(&format!(
            " (includes +{} gp for formula)",
            cost.formula_cost.to_gold()
        ));
    }
    if cost.total_reduction.0 > 0 {
        line.push_str(&format!(" (reduced by {} gp)", cost.total_reduction.to_gold()));
    }
    line
}

/// Render a summary from an already reconciled cost.
pub fn render_summary(
    input: &CraftingInput,
    tier: OutcomeTier,
    end_date: &str,
    cost: &CostBreakdown,
) -> String {
    let assurance = if input.use_assurance { "Assurance " } else { "" };
    format!(
        "**Character:** {}\n\
         **Activity:** Craft {} x {}\n\
         **Days:** {}\n\
         **Item Level:** {}\n\
         **DC:** {}\n\
         **Result:** {}{} ({})\n\
         {}\n",
        input.character,
        input.quantity,
        input.item_name,
        format_days(&input.start_date, end_date),
        input.item_level,
        input.crafting_dc,
        assurance,
        tier,
        input.crafting_roll,
        cost_line(cost),
    )
}

/// Reconcile the cost for `tier` and render the summary.
pub fn format_summary(input: &CraftingInput, tier: OutcomeTier, end_date: &str) -> String {
    render_summary(input, tier, end_date, &reconcile_cost(input, tier))
}
