//! Production and purchase math over the catalog and a factory record.
//!
//! Everything here is pure: handlers load state, call in, and persist.

use clickfarm_types::factory::{Catalog, Error, Factory, ToolDefinition, CLICK_BASE_REWARD, WAD};

use crate::fixed::{mul_div, mul_wad, pow_wad};

/// Cost-curve multiplier for the unit bought when `owned` units are held.
///
/// Reads the catalog table at `owned`; past its end the curve continues
/// geometrically from the last entry, and with no table at all it is
/// `growth^owned`.
pub fn start_multiplier(catalog: &Catalog, tool: &ToolDefinition, owned: u32) -> Result<u128, Error> {
    let table = &catalog.multipliers;
    if let Some(multiplier) = table.get(owned as usize) {
        return Ok(*multiplier);
    }
    match table.last() {
        Some(last) => {
            let excess = owned as u64 - (table.len() as u64 - 1);
            let growth = pow_wad(tool.growth, excess).ok_or(Error::Overflow)?;
            mul_wad(*last, growth).ok_or(Error::Overflow)
        }
        None => pow_wad(tool.growth, owned as u64).ok_or(Error::Overflow),
    }
}

/// Cost of buying `quantity` units of `slot` starting from `owned`:
/// `cost * start * (growth^quantity - 1) / (growth - 1)`.
pub fn range_cost(catalog: &Catalog, slot: u32, owned: u32, quantity: u32) -> Result<u128, Error> {
    let tool = catalog.tool(slot)?;
    if quantity == 0 {
        return Ok(0);
    }
    let start = mul_wad(tool.cost, start_multiplier(catalog, tool, owned)?).ok_or(Error::Overflow)?;
    if tool.growth <= WAD {
        return start.checked_mul(quantity as u128).ok_or(Error::Overflow);
    }
    let compounded = pow_wad(tool.growth, quantity as u64).ok_or(Error::Overflow)?;
    mul_div(start, compounded - WAD, tool.growth - WAD).ok_or(Error::Overflow)
}

/// Resource produced per second by `factory` at its current holdings and tiers.
pub fn rate(catalog: &Catalog, factory: &Factory) -> Result<u128, Error> {
    let mut base = 0u128;
    for (slot, holding) in factory.tools.iter().enumerate() {
        if holding.amount == 0 {
            continue;
        }
        // Slots dropped from the catalog stop producing.
        let Some(tool) = catalog.tools.get(slot) else {
            continue;
        };
        let level_multiplier = catalog.upgrades_of(tool).multiplier(holding.level);
        let per_unit = mul_wad(tool.yield_per_second, level_multiplier).ok_or(Error::Overflow)?;
        let produced = per_unit
            .checked_mul(holding.amount as u128)
            .ok_or(Error::Overflow)?;
        base = base.checked_add(produced).ok_or(Error::Overflow)?;
    }
    let powered = mul_wad(base, catalog.power.multiplier(factory.power)).ok_or(Error::Overflow)?;
    mul_wad(powered, catalog.evolution.multiplier(factory.evolution)).ok_or(Error::Overflow)
}

/// Resource accrued since the last claim at the rate stored on the factory.
pub fn accrued(factory: &Factory, now: u64) -> Result<u128, Error> {
    let elapsed = now.saturating_sub(factory.last_claim) as u128;
    if elapsed == 0 {
        return Ok(0);
    }
    factory.rate.checked_mul(elapsed).ok_or(Error::Overflow)
}

/// Close the accrual window at `now`, returning the amount to mint.
///
/// Must run before anything that changes holdings or tiers; follow the
/// change with [refresh_rate] once the window is closed.
pub fn settle(factory: &mut Factory, now: u64) -> Result<u128, Error> {
    let amount = accrued(factory, now)?;
    factory.total_earned = factory
        .total_earned
        .checked_add(amount)
        .ok_or(Error::Overflow)?;
    factory.last_claim = factory.last_claim.max(now);
    Ok(amount)
}

/// Re-price the factory against the live catalog. Only valid on a settled
/// factory, otherwise the open window would be valued at the new rate.
pub fn refresh_rate(catalog: &Catalog, factory: &mut Factory) -> Result<(), Error> {
    factory.rate = rate(catalog, factory)?;
    Ok(())
}

/// Aggregate level for a lifetime spend, keyed in whole resource units.
pub fn aggregate_level(catalog: &Catalog, total_spent: u128) -> u32 {
    let level = catalog.levels.floor(total_spent / WAD, 0);
    u32::try_from(level).unwrap_or(u32::MAX)
}

/// Record `cost` as spent and refresh the aggregate level.
pub fn record_spend(catalog: &Catalog, factory: &mut Factory, cost: u128) -> Result<(), Error> {
    factory.total_spent = factory
        .total_spent
        .checked_add(cost)
        .ok_or(Error::Overflow)?;
    factory.level = aggregate_level(catalog, factory.total_spent);
    Ok(())
}

/// Cost of taking `slot` from `level` to `level + 1`, `None` at the top level.
pub fn upgrade_cost(catalog: &Catalog, slot: u32, level: u32) -> Result<Option<u128>, Error> {
    let tool = catalog.tool(slot)?;
    let schedule = catalog.upgrades_of(tool);
    let Some(factor) = level.checked_add(1).and_then(|next| schedule.threshold(next)) else {
        return Ok(None);
    };
    mul_wad(tool.cost, factor).map(Some).ok_or(Error::Overflow)
}

/// Cost of the next power tier, `None` at the ceiling.
pub fn power_cost(catalog: &Catalog, tier: u32) -> Option<u128> {
    catalog.power.threshold(tier.checked_add(1)?)
}

/// Lifetime earnings required for the next evolution tier, `None` at the ceiling.
pub fn evolution_requirement(catalog: &Catalog, tier: u32) -> Option<u128> {
    catalog.evolution.threshold(tier.checked_add(1)?)
}

/// Resource minted to a pass owner for a successful click: one second of
/// production at the stored rate, never less than [CLICK_BASE_REWARD].
pub fn click_reward(factory: &Factory) -> u128 {
    factory.rate.max(CLICK_BASE_REWARD)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clickfarm_types::factory::{Schedule, ToolHolding};
    use proptest::prelude::*;

    const GROWTH: u128 = 1_150_000_000_000_000_000;

    fn catalog() -> Catalog {
        let mut catalog = Catalog::default();
        catalog
            .set_tools(&[15 * WAD, 100 * WAD, 1_100 * WAD], &[WAD / 10, WAD, 8 * WAD])
            .unwrap();
        catalog
    }

    /// 1.15^i for the first `len` units, as configured by the reference deployment.
    fn geometric_table(len: usize) -> Vec<u128> {
        (0..len as u64).map(|i| pow_wad(GROWTH, i).unwrap()).collect()
    }

    fn naive_cost(catalog: &Catalog, slot: u32, owned: u32, quantity: u32) -> u128 {
        let tool = catalog.tool(slot).unwrap();
        let start = mul_wad(tool.cost, start_multiplier(catalog, tool, owned).unwrap()).unwrap();
        (0..quantity as u64)
            .map(|j| mul_wad(start, pow_wad(tool.growth, j).unwrap()).unwrap())
            .sum()
    }

    fn assert_close(closed: u128, naive: u128, quantity: u32) {
        let tolerance = naive / 1_000_000_000 + quantity as u128 + 1;
        let diff = closed.abs_diff(naive);
        assert!(
            diff <= tolerance,
            "closed {closed} naive {naive} diff {diff} tolerance {tolerance}"
        );
    }

    #[test]
    fn test_range_cost_single_unit_is_unit_price() {
        let catalog = catalog();
        assert_eq!(range_cost(&catalog, 0, 0, 1).unwrap(), 15 * WAD);
        // Without a table the second unit costs cost * growth.
        assert_eq!(
            range_cost(&catalog, 0, 1, 1).unwrap(),
            mul_wad(15 * WAD, GROWTH).unwrap()
        );
        assert_eq!(range_cost(&catalog, 0, 0, 0).unwrap(), 0);
    }

    #[test]
    fn test_range_cost_unknown_slot() {
        assert_eq!(range_cost(&catalog(), 3, 0, 1), Err(Error::ToolDoesNotExist(3)));
    }

    #[test]
    fn test_start_multiplier_extends_past_table() {
        let mut catalog = catalog();
        catalog.set_multipliers(vec![WAD, 2 * WAD, 4 * WAD]).unwrap();
        let tool = catalog.tool(0).unwrap().clone();
        assert_eq!(start_multiplier(&catalog, &tool, 1).unwrap(), 2 * WAD);
        assert_eq!(start_multiplier(&catalog, &tool, 2).unwrap(), 4 * WAD);
        assert_eq!(
            start_multiplier(&catalog, &tool, 3).unwrap(),
            mul_wad(4 * WAD, GROWTH).unwrap()
        );
    }

    #[test]
    fn test_rate_applies_levels_power_and_evolution() {
        let mut catalog = catalog();
        catalog.upgrades = Schedule::new(vec![0, 10 * WAD], vec![WAD, 2 * WAD]).unwrap();
        catalog.power = Schedule::new(vec![0, 50 * WAD], vec![WAD, 3 * WAD]).unwrap();
        catalog.evolution = Schedule::new(vec![0, 1_000 * WAD], vec![WAD, 5 * WAD]).unwrap();

        let mut factory = Factory::new(0);
        *factory.holding_mut(0) = ToolHolding { amount: 10, level: 0 };
        *factory.holding_mut(1) = ToolHolding { amount: 1, level: 1 };
        // 10 * 0.1 + 1 * 1 * 2 = 3
        assert_eq!(rate(&catalog, &factory).unwrap(), 3 * WAD);

        factory.power = 1;
        factory.evolution = 1;
        assert_eq!(rate(&catalog, &factory).unwrap(), 45 * WAD);
    }

    #[test]
    fn test_rate_ignores_slots_removed_from_catalog() {
        let mut catalog = catalog();
        let mut factory = Factory::new(0);
        factory.holding_mut(2).amount = 1;
        assert_eq!(rate(&catalog, &factory).unwrap(), 8 * WAD);
        catalog.set_tools(&[WAD], &[WAD]).unwrap();
        assert_eq!(rate(&catalog, &factory).unwrap(), 0);
    }

    #[test]
    fn test_settle_is_idempotent_within_a_timestamp() {
        let catalog = catalog();
        let mut factory = Factory::new(100);
        factory.holding_mut(1).amount = 2;
        refresh_rate(&catalog, &mut factory).unwrap();

        assert_eq!(settle(&mut factory, 110).unwrap(), 20 * WAD);
        assert_eq!(factory.last_claim, 110);
        assert_eq!(settle(&mut factory, 110).unwrap(), 0);
        assert_eq!(factory.total_earned, 20 * WAD);

        // A stale clock never moves the claim timestamp backwards.
        assert_eq!(settle(&mut factory, 105).unwrap(), 0);
        assert_eq!(factory.last_claim, 110);
    }

    #[test]
    fn test_settle_uses_stored_rate() {
        let mut catalog = catalog();
        let mut factory = Factory::new(0);
        factory.holding_mut(1).amount = 1;
        refresh_rate(&catalog, &mut factory).unwrap();

        // A yield change leaves the open window at the old rate.
        catalog.set_tools(&[15 * WAD, 100 * WAD, 1_100 * WAD], &[WAD / 10, 10 * WAD, 8 * WAD]).unwrap();
        assert_eq!(settle(&mut factory, 10).unwrap(), 10 * WAD);

        refresh_rate(&catalog, &mut factory).unwrap();
        assert_eq!(factory.rate, 10 * WAD);
        assert_eq!(settle(&mut factory, 20).unwrap(), 100 * WAD);
    }

    #[test]
    fn test_slot_upgrade_table_overrides_default() {
        let mut catalog = catalog();
        catalog.upgrades = Schedule::new(vec![0, 10 * WAD], vec![WAD, 2 * WAD]).unwrap();
        catalog
            .set_slot_upgrades(1, Some(Schedule::new(vec![0, 3 * WAD], vec![WAD, 5 * WAD]).unwrap()))
            .unwrap();

        let mut factory = Factory::new(0);
        *factory.holding_mut(0) = ToolHolding { amount: 10, level: 1 };
        *factory.holding_mut(1) = ToolHolding { amount: 1, level: 1 };
        // 10 * 0.1 * 2 + 1 * 1 * 5 = 7
        assert_eq!(rate(&catalog, &factory).unwrap(), 7 * WAD);

        assert_eq!(upgrade_cost(&catalog, 0, 0).unwrap(), Some(150 * WAD));
        assert_eq!(upgrade_cost(&catalog, 1, 0).unwrap(), Some(300 * WAD));

        catalog.set_slot_upgrades(1, None).unwrap();
        assert_eq!(upgrade_cost(&catalog, 1, 0).unwrap(), Some(1_000 * WAD));
        assert_eq!(
            catalog.set_slot_upgrades(3, None),
            Err(Error::ToolDoesNotExist(3))
        );
    }

    #[test]
    fn test_aggregate_level_from_spend() {
        let mut catalog = catalog();
        catalog.levels = Schedule::new(
            vec![0, 10, 50, 500, 50_000, 5_000_000],
            vec![0, 1, 5, 25, 50, 100],
        )
        .unwrap();
        let mut factory = Factory::new(0);
        record_spend(&catalog, &mut factory, 9 * WAD).unwrap();
        assert_eq!(factory.level, 0);
        record_spend(&catalog, &mut factory, WAD).unwrap();
        assert_eq!(factory.level, 1);
        record_spend(&catalog, &mut factory, 490 * WAD).unwrap();
        assert_eq!(factory.level, 25);
    }

    #[test]
    fn test_upgrade_and_tier_costs() {
        let mut catalog = catalog();
        catalog.upgrades = Schedule::new(vec![0, 10 * WAD, 50 * WAD], vec![WAD, 2 * WAD, 4 * WAD]).unwrap();
        catalog.power = Schedule::new(vec![0, 7 * WAD], vec![WAD, 2 * WAD]).unwrap();

        assert_eq!(upgrade_cost(&catalog, 0, 0).unwrap(), Some(150 * WAD));
        assert_eq!(upgrade_cost(&catalog, 0, 1).unwrap(), Some(750 * WAD));
        assert_eq!(upgrade_cost(&catalog, 0, 2).unwrap(), None);
        assert_eq!(upgrade_cost(&catalog, 9, 0), Err(Error::ToolDoesNotExist(9)));
        assert_eq!(power_cost(&catalog, 0), Some(7 * WAD));
        assert_eq!(power_cost(&catalog, 1), None);
        assert_eq!(evolution_requirement(&catalog, 0), None);
    }

    #[test]
    fn test_click_reward_floor() {
        let catalog = catalog();
        let mut factory = Factory::new(0);
        assert_eq!(click_reward(&factory), CLICK_BASE_REWARD);
        factory.holding_mut(2).amount = 1;
        refresh_rate(&catalog, &mut factory).unwrap();
        assert_eq!(click_reward(&factory), 8 * WAD);
    }

    proptest! {
        #[test]
        fn test_range_cost_matches_naive_sum(
            slot in 0u32..3,
            owned in 0u32..150,
            quantity in 1u32..60,
            table_len in 0usize..120,
        ) {
            let mut catalog = catalog();
            if table_len > 0 {
                catalog.set_multipliers(geometric_table(table_len)).unwrap();
            }
            let closed = range_cost(&catalog, slot, owned, quantity).unwrap();
            let naive = naive_cost(&catalog, slot, owned, quantity);
            assert_close(closed, naive, quantity);
        }

        #[test]
        fn test_range_cost_is_additive(owned in 0u32..100, first in 1u32..20, second in 1u32..20) {
            // Without a table, buying in two steps costs the same as one batch.
            let catalog = catalog();
            let batch = range_cost(&catalog, 1, owned, first + second).unwrap();
            let split = range_cost(&catalog, 1, owned, first).unwrap()
                + range_cost(&catalog, 1, owned + first, second).unwrap();
            assert_close(batch, split, first + second);
        }

        #[test]
        fn test_accrual_strictly_increases(amount in 1u32..1_000, start in 0u64..1_000_000, gap in 1u64..100_000) {
            let catalog = catalog();
            let mut factory = Factory::new(start);
            factory.holding_mut(0).amount = amount;
            refresh_rate(&catalog, &mut factory).unwrap();
            let first = accrued(&factory, start + gap).unwrap();
            let second = accrued(&factory, start + gap + 1).unwrap();
            prop_assert!(first > 0);
            prop_assert!(second > first);
        }
    }
}
