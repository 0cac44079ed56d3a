#![deny(warnings)]

//! Crafting economics: formula prices, earn-income rates and final cost.
//!
//! This module provides:
//! - The formula price step table keyed by item level
//! - The earn-income table keyed by character level and proficiency rank
//! - Cost reconciliation: batch cost, the 50% materials floor, downtime
//!   income reduction and the formula surcharge

use craft_core::{
    parse_coin_string, Copper, CraftingInput, FormulaOption, OutcomeTier, Proficiency,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Formula price for items of at least `level`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormulaCostRow {
    pub level: i32,
    pub price: Copper,
}

const fn formula_row(level: i32, price_cp: i64) -> FormulaCostRow {
    FormulaCostRow {
        level,
        price: Copper(price_cp),
    }
}

/// Formula prices, ascending by level.
pub static FORMULA_COST_TABLE: [FormulaCostRow; 21] = [
    formula_row(0, 50),
    formula_row(1, 100),
    formula_row(2, 200),
    formula_row(3, 300),
    formula_row(4, 500),
    formula_row(5, 800),
    formula_row(6, 1_300),
    formula_row(7, 1_800),
    formula_row(8, 2_500),
    formula_row(9, 3_500),
    formula_row(10, 5_000),
    formula_row(11, 7_000),
    formula_row(12, 10_000),
    formula_row(13, 15_000),
    formula_row(14, 22_500),
    formula_row(15, 32_500),
    formula_row(16, 50_000),
    formula_row(17, 75_000),
    formula_row(18, 120_000),
    formula_row(19, 200_000),
    formula_row(20, 350_000),
];

/// Formula price in copper for an item level.
///
/// Takes the last row whose level does not exceed `item_level`. Levels below
/// the table fall back to the level-0 price; levels above it keep the
/// level-20 price.
pub fn formula_cost_copper(item_level: i32) -> Copper {
    let mut last = FORMULA_COST_TABLE[0].price;
    for row in FORMULA_COST_TABLE.iter() {
        if item_level >= row.level {
            last = row.price;
        } else {
            break;
        }
    }
    last
}

/// Formula price in gold, e.g. `0.5` for level 0.
pub fn get_formula_cost(item_level: i32) -> Decimal {
    formula_cost_copper(item_level).to_gold()
}

/// One level of the earn-income table. Values are coin strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EarnIncomeRow {
    pub level: i32,
    /// Task DC for the level; 0 on the synthetic row.
    pub dc: i32,
    pub failed: &'static str,
    pub trained: &'static str,
    pub expert: &'static str,
    pub master: &'static str,
    pub legendary: &'static str,
}

impl EarnIncomeRow {
    pub fn income_for(&self, rank: Proficiency) -> &'static str {
        match rank {
            Proficiency::Trained => self.trained,
            Proficiency::Expert => self.expert,
            Proficiency::Master => self.master,
            Proficiency::Legendary => self.legendary,
        }
    }
}

const fn income_row(
    level: i32,
    dc: i32,
    failed: &'static str,
    trained: &'static str,
    expert: &'static str,
    master: &'static str,
    legendary: &'static str,
) -> EarnIncomeRow {
    EarnIncomeRow {
        level,
        dc,
        failed,
        trained,
        expert,
        master,
        legendary,
    }
}

/// Level of the synthetic row used only for a level-20 critical success.
pub const CRITICAL_LEVEL_20_ROW: i32 = 21;

/// Earn-income rates per day, levels 0-20 plus the synthetic row 21.
pub static EARN_INCOME_TABLE: [EarnIncomeRow; 22] = [
    income_row(0, 14, "1 cp", "5 cp", "5 cp", "5 cp", "5 cp"),
    income_row(1, 15, "2 cp", "2 sp", "2 sp", "2 sp", "2 sp"),
    income_row(2, 16, "4 cp", "3 sp", "3 sp", "3 sp", "3 sp"),
    income_row(3, 18, "8 cp", "5 sp", "5 sp", "5 sp", "5 sp"),
    income_row(4, 19, "1 sp", "7 sp", "8 sp", "8 sp", "8 sp"),
    income_row(5, 20, "2 sp", "9 sp", "1 gp", "1 gp", "1 gp"),
    income_row(6, 22, "3 sp", "1 gp, 5 sp", "2 gp", "2 gp", "2 gp"),
    income_row(7, 23, "4 sp", "2 gp", "2 gp, 5 sp", "2 gp, 5 sp", "2 gp, 5 sp"),
    income_row(8, 24, "5 sp", "2 gp, 5 sp", "3 gp", "3 gp", "3 gp"),
    income_row(9, 26, "6 sp", "3 gp", "4 gp", "4 gp", "4 gp"),
    income_row(10, 27, "7 sp", "4 gp", "5 gp", "6 gp", "6 gp"),
    income_row(11, 28, "8 sp", "5 gp", "6 gp", "8 gp", "8 gp"),
    income_row(12, 30, "9 sp", "6 gp", "8 gp", "10 gp", "10 gp"),
    income_row(13, 31, "1 gp", "7 gp", "10 gp", "15 gp", "15 gp"),
    income_row(14, 32, "1 gp, 5 sp", "8 gp", "15 gp", "20 gp", "20 gp"),
    income_row(15, 34, "2 gp", "10 gp", "20 gp", "28 gp", "28 gp"),
    income_row(16, 35, "2 gp, 5 sp", "13 gp", "25 gp", "36 gp", "40 gp"),
    income_row(17, 36, "3 gp", "15 gp", "30 gp", "45 gp", "55 gp"),
    income_row(18, 38, "4 gp", "20 gp", "45 gp", "70 gp", "90 gp"),
    income_row(19, 39, "6 gp", "30 gp", "60 gp", "100 gp", "130 gp"),
    income_row(20, 40, "8 gp", "40 gp", "75 gp", "150 gp", "200 gp"),
    income_row(CRITICAL_LEVEL_20_ROW, 0, "-", "50 gp", "90 gp", "175 gp", "300 gp"),
];

/// Exact-key row lookup.
pub fn earn_income_row(level: i32) -> Option<&'static EarnIncomeRow> {
    EARN_INCOME_TABLE.iter().find(|r| r.level == level)
}

/// Earn-income task DC for a level. None for unknown levels and the synthetic row.
pub fn earn_income_task_dc(level: i32) -> Option<i32> {
    earn_income_row(level)
        .map(|r| r.dc)
        .filter(|&dc| dc > 0)
}

/// Income earned per day on a failed earn-income check.
pub fn failure_income(level: i32) -> Copper {
    earn_income_row(level)
        .map(|r| coin_value(r.failed))
        .unwrap_or(Copper::ZERO)
}

fn coin_value(s: &str) -> Copper {
    if s.is_empty() || s == "-" {
        return Copper::ZERO;
    }
    parse_coin_string(s)
}

/// Daily income credited against crafting cost for a check outcome.
///
/// Failures earn nothing. A success reads the row for `character_level`
/// itself; a critical success reads the row one level higher, and at level
/// 20 the synthetic row 21. Missing rows and placeholders yield zero.
pub fn get_earn_income_reduction(
    character_level: i32,
    proficiency: Proficiency,
    tier: OutcomeTier,
) -> Copper {
    let level = match tier {
        OutcomeTier::Failure | OutcomeTier::CriticalFailure => return Copper::ZERO,
        OutcomeTier::Success => character_level,
        OutcomeTier::CriticalSuccess if character_level == 20 => CRITICAL_LEVEL_20_ROW,
        OutcomeTier::CriticalSuccess => character_level.saturating_add(1),
    };
    match earn_income_row(level) {
        // Row 21 exists only for the level-20 critical case.
        Some(row) if row.level != CRITICAL_LEVEL_20_ROW || character_level == 20 => {
            coin_value(row.income_for(proficiency))
        }
        _ => Copper::ZERO,
    }
}

/// Every intermediate amount of a cost reconciliation, in copper.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostBreakdown {
    /// Per-unit gold price after the modifier, floored at zero.
    pub cost_per_unit: Decimal,
    pub base_cost: Copper,
    /// Half the base cost: the least that is ever paid for materials.
    pub min_cost: Copper,
    pub reduction_per_day: Copper,
    pub total_reduction: Copper,
    /// Cost after income, before the formula surcharge.
    pub crafting_cost: Copper,
    pub formula_cost: Copper,
    pub final_cost: Copper,
}

/// Reconcile the payable amount for a batch given the check outcome.
pub fn reconcile_cost(input: &CraftingInput, tier: OutcomeTier) -> CostBreakdown {
    let cost_per_unit = input
        .item_cost
        .checked_add(input.cost_modifier)
        .unwrap_or(if input.item_cost.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        })
        .max(Decimal::ZERO);
    let batch_gold = cost_per_unit
        .checked_mul(Decimal::from(input.quantity))
        .unwrap_or(Decimal::MAX);
    let base_cost = Copper::from_gold(batch_gold);
    let min_cost = base_cost.half_floor();

    let mut reduction_per_day = Copper::ZERO;
    let mut total_reduction = Copper::ZERO;
    if tier.is_success() && input.additional_days > 0 {
        reduction_per_day =
            get_earn_income_reduction(input.character_level, input.proficiency, tier);
        let earned = reduction_per_day.saturating_mul(i64::from(input.additional_days));
        total_reduction = earned.min(min_cost);
    }

    let crafting_cost = (base_cost - total_reduction).max(min_cost);
    let formula_cost = if input.formula_option == FormulaOption::BuyFormula {
        formula_cost_copper(input.item_level)
    } else {
        Copper::ZERO
    };
    let final_cost = crafting_cost + formula_cost;
    debug!(
        base = base_cost.0,
        floor = min_cost.0,
        reduction = total_reduction.0,
        formula = formula_cost.0,
        total = final_cost.0,
        "cost reconciled"
    );
    CostBreakdown {
        cost_per_unit,
        base_cost,
        min_cost,
        reduction_per_day,
        total_reduction,
        crafting_cost,
        formula_cost,
        final_cost,
    }
}
