#![deny(warnings)]

//! Read-only item catalog used to autofill crafting requests.
//!
//! The catalog is a JSON array of [`CatalogItem`] records produced ahead of
//! time from upstream equipment data. This crate loads it, answers name
//! lookups, and decides how many units of an item may be crafted per batch.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Rarities offered for completion, in DC order.
pub const RARITIES: [&str; 4] = ["common", "uncommon", "rare", "unique"];

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid catalog json: {0}")]
    Json(#[from] serde_json::Error),
}

/// One craftable item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub name: String,
    #[serde(default)]
    pub level: i32,
    #[serde(default = "default_rarity")]
    pub rarity: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub bulk: String,
    /// Price in decimal gold. Read from a plain number or a
    /// [`PriceValue`] denomination object.
    #[serde(default, deserialize_with = "cost_in_gold")]
    pub cost: Decimal,
    #[serde(default)]
    pub consumable: bool,
}

fn default_rarity() -> String {
    RARITIES[0].to_string()
}

impl CatalogItem {
    /// Consumables and ammunition can be crafted in batches.
    pub fn is_batch_item(&self) -> bool {
        self.consumable || is_batch_category(&self.category)
    }
}

/// Whether a category name alone marks an item as batch-craftable.
pub fn is_batch_category(category: &str) -> bool {
    let c = category.trim().to_ascii_lowercase();
    c == "consumable" || c == "ammo"
}

/// Denomination object as found in upstream price data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceValue {
    pub pp: Decimal,
    pub gp: Decimal,
    pub sp: Decimal,
    pub cp: Decimal,
}

impl PriceValue {
    /// Decimal gold: `gp + sp/10 + cp/100 + pp*10`, saturating at the
    /// `Decimal` bounds.
    pub fn to_gold(&self) -> Decimal {
        let saturate = |v: Decimal| {
            if v.is_sign_negative() {
                Decimal::MIN
            } else {
                Decimal::MAX
            }
        };
        let pp = self
            .pp
            .checked_mul(Decimal::TEN)
            .unwrap_or_else(|| saturate(self.pp));
        [self.sp / Decimal::TEN, self.cp / Decimal::ONE_HUNDRED, pp]
            .into_iter()
            .fold(self.gp, |acc, part| {
                acc.checked_add(part).unwrap_or_else(|| saturate(part))
            })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CostField {
    Gold(Decimal),
    Coins(PriceValue),
}

fn cost_in_gold<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
    Ok(match CostField::deserialize(deserializer)? {
        CostField::Gold(gold) => gold,
        CostField::Coins(price) => price.to_gold(),
    })
}

/// Maximum batch sizes. The batch limit differs between deployments, so it
/// is configuration rather than a rule constant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchPolicy {
    /// Limit for consumables and ammunition.
    pub batch_limit: u32,
    /// Limit for everything else.
    pub single_limit: u32,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            batch_limit: 4,
            single_limit: 1,
        }
    }
}

impl BatchPolicy {
    pub fn max_batch(&self, is_batch_item: bool) -> u32 {
        let limit = if is_batch_item {
            self.batch_limit
        } else {
            self.single_limit
        };
        limit.max(1)
    }

    /// Clamp a requested quantity into `[1, max_batch]`.
    pub fn clamp_quantity(&self, requested: u32, is_batch_item: bool) -> u32 {
        requested.clamp(1, self.max_batch(is_batch_item))
    }
}

/// Items sorted by name.
#[derive(Clone, Debug, Default)]
pub struct ItemCatalog {
    items: Vec<CatalogItem>,
}

impl ItemCatalog {
    /// Build a catalog, dropping unnamed entries and sorting by name.
    pub fn new(items: Vec<CatalogItem>) -> Self {
        let mut kept: Vec<CatalogItem> = items
            .into_iter()
            .filter(|i| {
                let named = !i.name.trim().is_empty();
                if !named {
                    warn!(level = i.level, "dropping catalog entry without a name");
                }
                named
            })
            .collect();
        kept.sort_by_cached_key(|i| i.name.to_lowercase());
        Self { items: kept }
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let items: Vec<CatalogItem> = serde_json::from_str(json)?;
        Ok(Self::new(items))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path.as_ref())?;
        let catalog = Self::from_json_str(&text)?;
        debug!(path = %path.as_ref().display(), items = catalog.len(), "catalog loaded");
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    /// Case-insensitive exact name match.
    pub fn find_exact(&self, name: &str) -> Option<&CatalogItem> {
        let lower = name.trim().to_lowercase();
        if lower.is_empty() {
            return None;
        }
        self.items.iter().find(|i| i.name.to_lowercase() == lower)
    }

    /// Items whose name contains `query`, ignoring case. Empty query matches nothing.
    pub fn suggest(&self, query: &str) -> Vec<&CatalogItem> {
        if query.is_empty() {
            return Vec::new();
        }
        let lower = query.to_lowercase();
        self.items
            .iter()
            .filter(|i| i.name.to_lowercase().contains(&lower))
            .collect()
    }
}

/// Rarities starting with `query`; all of them for an empty query.
pub fn rarity_suggestions(query: &str) -> Vec<&'static str> {
    let lower = query.to_lowercase();
    RARITIES
        .iter()
        .copied()
        .filter(|r| r.starts_with(&lower))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SAMPLE: &str = r#"[
        {"name": "Healing Potion (Minor)", "level": 1, "rarity": "common",
         "category": "potion", "bulk": "L", "cost": 4, "consumable": true},
        {"name": "arrows", "level": 0, "rarity": "common",
         "category": "ammo", "bulk": "L", "cost": 0.1, "consumable": false},
        {"name": "  ", "level": 3},
        {"name": "Cold Iron Buckler", "level": 2, "category": "shield",
         "bulk": "L", "cost": 30}
    ]"#;

    #[test]
    fn loads_sorted_and_drops_unnamed() {
        let cat = ItemCatalog::from_json_str(SAMPLE).unwrap();
        assert_eq!(cat.len(), 3);
        let names: Vec<&str> = cat.items().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["arrows", "Cold Iron Buckler", "Healing Potion (Minor)"]);
        assert_eq!(cat.items()[1].rarity, "common");
        assert_eq!(cat.items()[0].cost, Decimal::new(1, 1));
    }

    #[test]
    fn lookup_ignores_case() {
        let cat = ItemCatalog::from_json_str(SAMPLE).unwrap();
        assert_eq!(cat.find_exact("cold iron buckler").map(|i| i.level), Some(2));
        assert!(cat.find_exact("cold iron").is_none());
        assert!(cat.find_exact("").is_none());
        assert_eq!(cat.suggest("IRON").len(), 1);
        assert_eq!(cat.suggest("o").len(), 3);
        assert!(cat.suggest("").is_empty());
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            ItemCatalog::from_json_str("{not json"),
            Err(CatalogError::Json(_))
        ));
    }

    #[test]
    fn batch_items_and_limits() {
        let cat = ItemCatalog::from_json_str(SAMPLE).unwrap();
        let potion = cat.find_exact("healing potion (minor)").unwrap();
        let arrows = cat.find_exact("arrows").unwrap();
        let buckler = cat.find_exact("cold iron buckler").unwrap();
        assert!(potion.is_batch_item());
        assert!(arrows.is_batch_item());
        assert!(!buckler.is_batch_item());
        assert!(is_batch_category("Consumable"));

        let policy = BatchPolicy::default();
        assert_eq!(policy.clamp_quantity(10, true), 4);
        assert_eq!(policy.clamp_quantity(0, true), 1);
        assert_eq!(policy.clamp_quantity(3, false), 1);
        let wide = BatchPolicy {
            batch_limit: 24,
            single_limit: 1,
        };
        assert_eq!(wide.clamp_quantity(20, true), 20);
    }

    #[test]
    fn price_object_to_gold() {
        let price: PriceValue = serde_json::from_str(r#"{"gp": 1, "sp": 5, "cp": 3}"#).unwrap();
        assert_eq!(price.to_gold(), Decimal::new(153, 2));
        let pp = PriceValue {
            pp: Decimal::from(2),
            ..Default::default()
        };
        assert_eq!(pp.to_gold(), Decimal::from(20));
        let huge = PriceValue {
            pp: Decimal::MAX,
            gp: Decimal::MAX,
            ..Default::default()
        };
        assert_eq!(huge.to_gold(), Decimal::MAX);
    }

    #[test]
    fn cost_accepts_denomination_objects() {
        let cat = ItemCatalog::from_json_str(
            r#"[{"name": "Bracers of Missile Deflection", "level": 3,
                 "cost": {"gp": 50, "sp": 2}},
                {"name": "Chalk", "cost": {"cp": 1}},
                {"name": "Crown", "cost": {"pp": 1, "gp": 5}}]"#,
        )
        .unwrap();
        let bracers = cat.find_exact("bracers of missile deflection").unwrap();
        assert_eq!(bracers.cost, Decimal::new(502, 1));
        assert_eq!(cat.find_exact("chalk").unwrap().cost, Decimal::new(1, 2));
        assert_eq!(cat.find_exact("crown").unwrap().cost, Decimal::from(15));
        assert!(matches!(
            ItemCatalog::from_json_str(r#"[{"name": "Odd", "cost": true}]"#),
            Err(CatalogError::Json(_))
        ));
    }

    #[test]
    fn rarity_completion() {
        assert_eq!(rarity_suggestions(""), RARITIES.to_vec());
        assert_eq!(rarity_suggestions("un"), vec!["uncommon", "unique"]);
        assert!(rarity_suggestions("x").is_empty());
    }

    proptest! {
        #[test]
        fn clamped_quantity_in_range(q in 0u32..1000, limit in 0u32..50, batch in any::<bool>()) {
            let policy = BatchPolicy { batch_limit: limit, single_limit: 1 };
            let got = policy.clamp_quantity(q, batch);
            prop_assert!(got >= 1);
            prop_assert!(got <= policy.max_batch(batch));
        }
    }
}
