use super::super::*;
use crate::{pricing, progression};
use clickfarm_types::factory::{Distribution, QueueEntry, MAX_MESSAGE_LENGTH, QUEUE_CAPACITY};
use tracing::info;

impl<'a, S: State> Layer<'a, S> {
    // === Auction Handlers ===

    pub(in crate::layer) async fn handle_configure_auction(
        &mut self,
        public: &PublicKey,
        floor_price: u128,
        increase_step: u128,
        decay_per_second: u128,
        max_price: u128,
        pass_price: u128,
    ) -> Result<Vec<Event>, Error> {
        self.ensure_authority(public)?;
        if increase_step == 0 {
            return Err(Error::InvalidConfiguration("increase step must be positive"));
        }
        if max_price != 0 && max_price < floor_price {
            return Err(Error::InvalidConfiguration("max price below floor"));
        }

        // Freeze decay accrued under the old parameters before swapping them.
        let now = self.now;
        let mut auction = views::auction(self, now).await;
        let live = pricing::decayed_price(&auction, now);
        auction.floor_price = floor_price;
        auction.increase_step = increase_step;
        auction.decay_per_second = decay_per_second;
        auction.max_price = max_price;
        auction.pass_price = pass_price;
        auction.price = auction.clamp(live);
        auction.last_action = auction.last_action.max(now);
        self.insert(Key::Auction, Value::Auction(auction));

        Ok(vec![Event::AuctionConfigured {
            floor_price,
            increase_step,
            decay_per_second,
            max_price,
            pass_price,
        }])
    }

    pub(in crate::layer) async fn handle_configure_distribution(
        &mut self,
        public: &PublicKey,
        treasury: &PublicKey,
        developer: &PublicKey,
        rewards: &PublicKey,
        treasury_bps: u16,
        developer_bps: u16,
    ) -> Result<Vec<Event>, Error> {
        self.ensure_authority(public)?;
        if !Distribution::bps_valid(treasury_bps, developer_bps) {
            return Err(Error::InvalidConfiguration("shares exceed 100%"));
        }
        self.insert(
            Key::Distribution,
            Value::Distribution(Distribution {
                treasury: treasury.clone(),
                developer: developer.clone(),
                rewards: rewards.clone(),
                treasury_bps,
                developer_bps,
            }),
        );
        Ok(vec![Event::DistributionConfigured {
            treasury_bps,
            developer_bps,
        }])
    }

    /// Pay the current price for `pass`, record the click in the queue and
    /// reward the pass owner with resource.
    #[allow(clippy::too_many_arguments)]
    pub(in crate::layer) async fn handle_click(
        &mut self,
        public: &PublicKey,
        pass: u64,
        epoch_id: u64,
        deadline: u64,
        max_payment: u128,
        payment: u128,
        message: &str,
    ) -> Result<Vec<Event>, Error> {
        if message.len() > MAX_MESSAGE_LENGTH {
            return Err(Error::MessageTooLong {
                length: message.len(),
                max: MAX_MESSAGE_LENGTH,
            });
        }
        let mut factory = self.owned_factory(public, pass).await?;
        let now = self.now;
        let mut auction = views::auction(self, now).await;
        if epoch_id != auction.epoch_id {
            return Err(Error::EpochIdMismatch {
                expected: auction.epoch_id,
                got: epoch_id,
            });
        }
        if now > deadline {
            return Err(Error::DeadlineExpired { deadline, now });
        }
        let price = pricing::decayed_price(&auction, now);
        if price > max_payment {
            return Err(Error::ExceedsMaxPayment { price, max_payment });
        }
        if payment != price {
            return Err(Error::InvalidPayment { price, payment });
        }

        self.burn(Asset::Settlement, public, payment).await?;
        auction.pooled = auction.pooled.checked_add(payment).ok_or(Error::Overflow)?;
        auction.price = pricing::next_price(&auction, price);
        auction.last_action = now;
        let next_price = auction.price;
        self.insert(Key::Auction, Value::Auction(auction));

        // Append, evicting the oldest entry once the ring is full.
        let mut cursor = views::queue_cursor(self).await;
        let index = cursor.tail;
        self.insert(
            Key::QueueSlot(index % QUEUE_CAPACITY),
            Value::QueueEntry(QueueEntry {
                index,
                actor: public.clone(),
                pass,
                payment,
                message: message.to_string(),
                timestamp: now,
                epoch_id,
            }),
        );
        cursor.tail += 1;
        if cursor.count() > QUEUE_CAPACITY {
            cursor.head = cursor.tail - QUEUE_CAPACITY;
        }
        self.insert(Key::Queue, Value::Queue(cursor));

        // Clicks leave the accrual window open, so the stored rate stands.
        let reward = progression::click_reward(&factory);
        self.mint(Asset::Resource, public, reward).await?;
        factory.total_earned = factory
            .total_earned
            .checked_add(reward)
            .ok_or(Error::Overflow)?;
        self.insert(Key::Factory(pass), Value::Factory(factory));

        Ok(vec![Event::Clicked {
            pass,
            actor: public.clone(),
            epoch_id,
            index,
            payment,
            next_price,
            reward,
        }])
    }

    /// Split the pooled proceeds between the configured recipients and open
    /// the next epoch. Anyone may trigger it.
    pub(in crate::layer) async fn handle_claim_and_distribute(
        &mut self,
        _public: &PublicKey,
    ) -> Result<Vec<Event>, Error> {
        let now = self.now;
        let mut auction = views::auction(self, now).await;
        let total = auction.pooled;
        if total == 0 {
            return Err(Error::EmptyPool);
        }
        let distribution = views::distribution(self)
            .await
            .ok_or(Error::NotConfigured)?;

        let split = distribution.split(total);
        self.mint(Asset::Settlement, &distribution.treasury, split.treasury)
            .await?;
        self.mint(Asset::Settlement, &distribution.developer, split.developer)
            .await?;
        self.mint(Asset::Settlement, &distribution.rewards, split.rewards)
            .await?;

        let epoch_id = auction.epoch_id;
        auction.epoch_id = epoch_id.checked_add(1).ok_or(Error::Overflow)?;
        auction.pooled = 0;
        self.insert(Key::Auction, Value::Auction(auction));
        info!(epoch_id, total, "distributed auction proceeds");

        Ok(vec![Event::Distributed {
            epoch_id,
            total,
            treasury: split.treasury,
            developer: split.developer,
            rewards: split.rewards,
        }])
    }
}
