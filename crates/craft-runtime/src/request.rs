//! Form-style requests and their coercion into [`CraftingInput`].

use craft_core::{
    assurance_roll, calculate_crafting_dc, setup_days_for, CraftingInput, FormulaOption,
    Proficiency,
};
use item_catalog::{is_batch_category, BatchPolicy, CatalogItem, ItemCatalog};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A crafting request as entered by a user. Unset numbers stay `None`.
///
/// Whole numbers are read as `i64` so that out-of-range entries reach
/// [`prepare`] and are coerced there instead of failing to parse.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CraftingRequest {
    pub character: String,
    pub character_level: Option<i64>,
    pub item_name: String,
    pub item_level: Option<i64>,
    pub item_rarity: Option<String>,
    pub item_category: Option<String>,
    pub item_bulk: Option<String>,
    pub item_cost: Option<Decimal>,
    pub cost_modifier: Option<Decimal>,
    pub quantity: Option<i64>,
    pub has_formula: Option<bool>,
    pub formula_option: FormulaOption,
    pub start_date: String,
    pub proficiency: Proficiency,
    pub use_assurance: bool,
    /// Explicit DC; zero or unset means derive it from the item.
    pub crafting_dc: Option<i64>,
    pub dc_adjustment: Option<i64>,
    pub crafting_roll: Option<i64>,
    pub additional_days: Option<i64>,
}

fn fill<T: Clone>(slot: &mut Option<T>, value: &T) {
    if slot.is_none() {
        *slot = Some(value.clone());
    }
}

/// Narrow to `i32`, saturating at its bounds.
fn saturate_i32(v: i64) -> i32 {
    i32::try_from(v).unwrap_or(if v < 0 { i32::MIN } else { i32::MAX })
}

/// Negative counts become zero; counts beyond `u32` saturate.
fn count(v: i64) -> u32 {
    u32::try_from(v.max(0)).unwrap_or(u32::MAX)
}

fn autofill(request: &mut CraftingRequest, item: &CatalogItem) {
    fill(&mut request.item_level, &i64::from(item.level));
    fill(&mut request.item_rarity, &item.rarity);
    fill(&mut request.item_category, &item.category);
    fill(&mut request.item_bulk, &item.bulk);
    fill(&mut request.item_cost, &item.cost);
}

/// Resolve a request into a fully specified [`CraftingInput`].
///
/// Unset item fields come from a case-insensitive catalog match when a
/// catalog is given. Negative levels, costs and day counts become zero.
/// The DC is derived unless an explicit non-zero DC was entered, Assurance
/// replaces the roll, and the quantity is clamped to the batch policy.
pub fn prepare(
    request: &CraftingRequest,
    policy: &BatchPolicy,
    catalog: Option<&ItemCatalog>,
) -> CraftingInput {
    let mut req = request.clone();
    let matched = catalog.and_then(|c| c.find_exact(&req.item_name));
    if let Some(item) = matched {
        debug!(item = %item.name, "autofilled from catalog");
        autofill(&mut req, item);
    }

    let character_level = saturate_i32(req.character_level.unwrap_or(0).max(0));
    let item_level = saturate_i32(req.item_level.unwrap_or(0).max(0));
    let item_rarity = req.item_rarity.unwrap_or_else(|| "common".to_string());
    let item_category = req.item_category.unwrap_or_default();
    let dc_adjustment = saturate_i32(req.dc_adjustment.unwrap_or(0));
    let has_formula = req.has_formula.unwrap_or(true);

    let crafting_dc = match req.crafting_dc {
        Some(dc) if dc != 0 => saturate_i32(dc),
        _ => calculate_crafting_dc(item_level, &item_rarity, dc_adjustment),
    };
    let crafting_roll = if req.use_assurance {
        assurance_roll(character_level, req.proficiency)
    } else {
        saturate_i32(req.crafting_roll.unwrap_or(0))
    };

    let batch_item = matched.is_some_and(|i| i.consumable) || is_batch_category(&item_category);
    let quantity = policy.clamp_quantity(count(req.quantity.unwrap_or(1)), batch_item);

    let input = CraftingInput {
        character: req.character,
        character_level,
        item_name: req.item_name,
        item_level,
        item_rarity,
        item_category,
        item_bulk: req.item_bulk.unwrap_or_default(),
        item_cost: req.item_cost.unwrap_or(Decimal::ZERO).max(Decimal::ZERO),
        cost_modifier: req.cost_modifier.unwrap_or(Decimal::ZERO),
        quantity,
        has_formula,
        formula_option: req.formula_option,
        start_date: req.start_date,
        proficiency: req.proficiency,
        use_assurance: req.use_assurance,
        crafting_dc,
        dc_adjustment,
        crafting_roll,
        setup_days: setup_days_for(has_formula, req.formula_option),
        additional_days: count(req.additional_days.unwrap_or(0)),
    };
    debug!(
        dc = input.crafting_dc,
        roll = input.crafting_roll,
        quantity = input.quantity,
        setup_days = input.setup_days,
        "request prepared"
    );
    input
}
