use super::super::*;
use clickfarm_types::factory::{Catalog, CatalogSection, EvolutionMode, Schedule};

impl<'a, S: State> Layer<'a, S> {
    // === Catalog Handlers ===
    //
    // Catalog updates never touch factories. Each factory keeps the rate it
    // stored at its last settlement until its owner next acts on it.

    async fn update_catalog<F>(
        &mut self,
        public: &PublicKey,
        section: CatalogSection,
        update: F,
    ) -> Result<Vec<Event>, Error>
    where
        F: FnOnce(&mut Catalog) -> Result<(), Error>,
    {
        self.ensure_authority(public)?;
        let mut catalog = views::catalog(self).await;
        update(&mut catalog)?;
        self.insert(Key::Catalog, Value::Catalog(catalog));
        Ok(vec![Event::CatalogUpdated { section }])
    }

    pub(in crate::layer) async fn handle_set_tools(
        &mut self,
        public: &PublicKey,
        costs: &[u128],
        yields: &[u128],
    ) -> Result<Vec<Event>, Error> {
        self.update_catalog(public, CatalogSection::Tools, |catalog| {
            catalog.set_tools(costs, yields)
        })
        .await
    }

    pub(in crate::layer) async fn handle_set_tool_multipliers(
        &mut self,
        public: &PublicKey,
        multipliers: &[u128],
    ) -> Result<Vec<Event>, Error> {
        self.update_catalog(public, CatalogSection::Multipliers, |catalog| {
            catalog.set_multipliers(multipliers.to_vec())
        })
        .await
    }

    pub(in crate::layer) async fn handle_set_tool_upgrades(
        &mut self,
        public: &PublicKey,
        costs: &[u128],
        multipliers: &[u128],
    ) -> Result<Vec<Event>, Error> {
        let schedule = Schedule::new(costs.to_vec(), multipliers.to_vec())?;
        self.update_catalog(public, CatalogSection::Upgrades, |catalog| {
            catalog.upgrades = schedule;
            Ok(())
        })
        .await
    }

    pub(in crate::layer) async fn handle_set_levels(
        &mut self,
        public: &PublicKey,
        thresholds: &[u128],
        values: &[u128],
    ) -> Result<Vec<Event>, Error> {
        let schedule = Schedule::new(thresholds.to_vec(), values.to_vec())?;
        self.update_catalog(public, CatalogSection::Levels, |catalog| {
            catalog.levels = schedule;
            Ok(())
        })
        .await
    }

    pub(in crate::layer) async fn handle_set_power(
        &mut self,
        public: &PublicKey,
        costs: &[u128],
        multipliers: &[u128],
    ) -> Result<Vec<Event>, Error> {
        let schedule = Schedule::new(costs.to_vec(), multipliers.to_vec())?;
        self.update_catalog(public, CatalogSection::Power, |catalog| {
            catalog.power = schedule;
            Ok(())
        })
        .await
    }

    pub(in crate::layer) async fn handle_set_evolution(
        &mut self,
        public: &PublicKey,
        thresholds: &[u128],
        multipliers: &[u128],
        mode: EvolutionMode,
    ) -> Result<Vec<Event>, Error> {
        let schedule = Schedule::new(thresholds.to_vec(), multipliers.to_vec())?;
        self.update_catalog(public, CatalogSection::Evolution, |catalog| {
            catalog.evolution = schedule;
            catalog.evolution_mode = mode;
            Ok(())
        })
        .await
    }

    pub(in crate::layer) async fn handle_set_tool_max_amount(
        &mut self,
        public: &PublicKey,
        amounts: &[u32],
    ) -> Result<Vec<Event>, Error> {
        self.update_catalog(public, CatalogSection::MaxAmounts, |catalog| {
            catalog.set_max_amounts(amounts)
        })
        .await
    }

    pub(in crate::layer) async fn handle_set_tool_growth(
        &mut self,
        public: &PublicKey,
        growths: &[u128],
    ) -> Result<Vec<Event>, Error> {
        self.update_catalog(public, CatalogSection::Growth, |catalog| {
            catalog.set_growths(growths)
        })
        .await
    }

    pub(in crate::layer) async fn handle_set_tool_unlocks(
        &mut self,
        public: &PublicKey,
        levels: &[u32],
    ) -> Result<Vec<Event>, Error> {
        self.update_catalog(public, CatalogSection::Unlocks, |catalog| {
            catalog.set_unlocks(levels)
        })
        .await
    }

    pub(in crate::layer) async fn handle_set_tool_upgrade_schedule(
        &mut self,
        public: &PublicKey,
        slot: u32,
        costs: &[u128],
        multipliers: &[u128],
    ) -> Result<Vec<Event>, Error> {
        self.update_catalog(public, CatalogSection::SlotUpgrades, |catalog| {
            let schedule = match (costs.is_empty(), multipliers.is_empty()) {
                (true, true) => None,
                _ => Some(Schedule::new(costs.to_vec(), multipliers.to_vec())?),
            };
            catalog.set_slot_upgrades(slot, schedule)
        })
        .await
    }
}
