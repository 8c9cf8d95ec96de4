use super::super::*;
use crate::{evolution, progression};
use clickfarm_types::factory::Catalog;

impl<'a, S: State> Layer<'a, S> {
    // === Progression Handlers ===
    //
    // Each handler settles accrual at the stored rate before changing
    // anything that feeds the rate, then stores the factory re-priced
    // against the live catalog.

    /// Mint accrued resource for `pass` to its owner and close the window.
    async fn settle(
        &mut self,
        pass: u64,
        owner: &PublicKey,
        factory: &mut Factory,
    ) -> Result<Vec<Event>, Error> {
        let amount = progression::settle(factory, self.now)?;
        if amount == 0 {
            return Ok(vec![]);
        }
        self.mint(Asset::Resource, owner, amount).await?;
        Ok(vec![Event::Claimed {
            pass,
            owner: owner.clone(),
            amount,
            timestamp: self.now,
        }])
    }

    /// Persist a settled factory with its rate refreshed.
    fn store_factory(&mut self, pass: u64, catalog: &Catalog, mut factory: Factory) -> Result<(), Error> {
        progression::refresh_rate(catalog, &mut factory)?;
        self.insert(Key::Factory(pass), Value::Factory(factory));
        Ok(())
    }

    pub(in crate::layer) async fn handle_claim(
        &mut self,
        public: &PublicKey,
        pass: u64,
    ) -> Result<Vec<Event>, Error> {
        let catalog = views::catalog(self).await;
        let mut factory = self.owned_factory(public, pass).await?;
        let events = self.settle(pass, public, &mut factory).await?;
        self.store_factory(pass, &catalog, factory)?;
        Ok(events)
    }

    pub(in crate::layer) async fn handle_purchase_tool(
        &mut self,
        public: &PublicKey,
        pass: u64,
        slot: u32,
        quantity: u32,
    ) -> Result<Vec<Event>, Error> {
        let catalog = views::catalog(self).await;
        let mut factory = self.owned_factory(public, pass).await?;
        let mut events = self.settle(pass, public, &mut factory).await?;

        let tool = catalog.tool(slot)?;
        if quantity == 0 {
            return Err(Error::InvalidQuantity);
        }
        if factory.level < tool.unlock_level {
            return Err(Error::ToolLocked {
                slot,
                required: tool.unlock_level,
                current: factory.level,
            });
        }
        let owned = factory.holding(slot).amount;
        let amount = match owned.checked_add(quantity) {
            Some(amount) if amount <= tool.max_amount => amount,
            _ => {
                return Err(Error::AmountMaxed {
                    slot,
                    cap: tool.max_amount,
                })
            }
        };

        let cost = progression::range_cost(&catalog, slot, owned, quantity)?;
        self.burn(Asset::Resource, public, cost).await?;
        factory.holding_mut(slot).amount = amount;
        progression::record_spend(&catalog, &mut factory, cost)?;
        self.store_factory(pass, &catalog, factory)?;

        events.push(Event::ToolPurchased {
            pass,
            slot,
            quantity,
            cost,
            amount,
        });
        Ok(events)
    }

    pub(in crate::layer) async fn handle_upgrade_tool(
        &mut self,
        public: &PublicKey,
        pass: u64,
        slot: u32,
    ) -> Result<Vec<Event>, Error> {
        let catalog = views::catalog(self).await;
        let mut factory = self.owned_factory(public, pass).await?;
        let mut events = self.settle(pass, public, &mut factory).await?;

        let current = factory.holding(slot).level;
        let cost = progression::upgrade_cost(&catalog, slot, current)?
            .ok_or(Error::LevelMaxed(slot))?;
        self.burn(Asset::Resource, public, cost).await?;
        let level = current + 1;
        factory.holding_mut(slot).level = level;
        progression::record_spend(&catalog, &mut factory, cost)?;
        self.store_factory(pass, &catalog, factory)?;

        events.push(Event::ToolUpgraded {
            pass,
            slot,
            level,
            cost,
        });
        Ok(events)
    }

    pub(in crate::layer) async fn handle_upgrade_power(
        &mut self,
        public: &PublicKey,
        pass: u64,
    ) -> Result<Vec<Event>, Error> {
        let catalog = views::catalog(self).await;
        let mut factory = self.owned_factory(public, pass).await?;
        let mut events = self.settle(pass, public, &mut factory).await?;

        let cost = progression::power_cost(&catalog, factory.power).ok_or(Error::PowerMaxed)?;
        self.burn(Asset::Resource, public, cost).await?;
        factory.power += 1;
        progression::record_spend(&catalog, &mut factory, cost)?;
        let tier = factory.power;
        self.store_factory(pass, &catalog, factory)?;

        events.push(Event::PowerUpgraded { pass, tier, cost });
        Ok(events)
    }

    pub(in crate::layer) async fn handle_evolve(
        &mut self,
        public: &PublicKey,
        pass: u64,
    ) -> Result<Vec<Event>, Error> {
        let catalog = views::catalog(self).await;
        let mut factory = self.owned_factory(public, pass).await?;
        let mut events = self.settle(pass, public, &mut factory).await?;

        let required = progression::evolution_requirement(&catalog, factory.evolution)
            .ok_or(Error::EvolutionMaxed)?;
        if factory.total_earned < required {
            return Err(Error::EvolutionLocked {
                required,
                earned: factory.total_earned,
            });
        }
        factory.evolution += 1;
        evolution::policy(catalog.evolution_mode).rebase(&mut factory);
        let tier = factory.evolution;
        self.store_factory(pass, &catalog, factory)?;

        events.push(Event::Evolved { pass, tier });
        Ok(events)
    }
}
