use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use crate::models::mercenary::{get_all_mercenaries, is_modified_mercenary_item};
use crate::models::{CraftingCost, ItemRequirement, Mercenary, PriceMap};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MercenaryCost {
    pub id: u32,
    pub name: String,
    #[serde(flatten)]
    pub cost: CraftingCost,
}

/// Sum `minPrice × quantity` over the requirements. Items without a positive
/// price contribute nothing and are recorded in `unpriced`.
fn requirements_cost<'a>(
    items: impl IntoIterator<Item = &'a ItemRequirement>,
    prices: &PriceMap,
    unpriced: &mut BTreeSet<String>,
) -> u64 {
    items
        .into_iter()
        .map(|item| match prices.get(&item.name) {
            Some(info) if info.min_price > 0 => info.min_price.saturating_mul(item.quantity),
            _ => {
                if !is_modified_mercenary_item(&item.name) {
                    unpriced.insert(item.name.clone());
                }
                0
            }
        })
        .fold(0u64, u64::saturating_add)
}

/// Material cost of a legendary mercenary and every child it consumes.
///
/// Modified-unit materials are never on the market, so they are left out of
/// `unpricedItems` as well as the totals.
pub fn crafting_cost(mercenary: &Mercenary, prices: &PriceMap) -> CraftingCost {
    let mut unpriced = BTreeSet::new();
    let main_cost = requirements_cost(&mercenary.items, prices, &mut unpriced);
    let child_cost = requirements_cost(
        mercenary.child_mercenaries.iter().flat_map(|c| c.items.iter()),
        prices,
        &mut unpriced,
    );
    debug!(
        "Crafting cost for {}: main={} child={} unpriced={}",
        mercenary.name,
        main_cost,
        child_cost,
        unpriced.len()
    );

    CraftingCost {
        main_cost,
        child_cost,
        total_cost: main_cost.saturating_add(child_cost),
        unpriced_items: unpriced.into_iter().collect(),
    }
}

pub fn all_crafting_costs(prices: &PriceMap) -> Vec<MercenaryCost> {
    get_all_mercenaries()
        .iter()
        .map(|m| MercenaryCost {
            id: m.id,
            name: m.name.clone(),
            cost: crafting_cost(m, prices),
        })
        .collect()
}
