use super::super::*;

impl<'a, S: State> Layer<'a, S> {
    // === Registry Handlers ===

    /// Mint a pass to `public`, paying the configured pass price into the
    /// auction pool.
    pub(in crate::layer) async fn handle_mint_pass(
        &mut self,
        public: &PublicKey,
    ) -> Result<Vec<Event>, Error> {
        let now = self.now;
        let mut auction = views::auction(self, now).await;
        let price = auction.pass_price;
        self.burn(Asset::Settlement, public, price).await?;
        auction.pooled = auction.pooled.checked_add(price).ok_or(Error::Overflow)?;
        self.insert(Key::Auction, Value::Auction(auction));

        let pass = views::next_pass(self).await;
        let next = pass.checked_add(1).ok_or(Error::Overflow)?;
        self.insert(Key::Registry, Value::Registry(next));
        self.insert(Key::Pass(pass), Value::Pass(public.clone()));
        self.insert(Key::Factory(pass), Value::Factory(Factory::new(now)));

        Ok(vec![Event::PassMinted {
            pass,
            owner: public.clone(),
            price,
        }])
    }

    /// Hand a pass and its factory to another account. Unclaimed accrual
    /// travels with the factory.
    pub(in crate::layer) async fn handle_transfer_pass(
        &mut self,
        public: &PublicKey,
        pass: u64,
        to: &PublicKey,
    ) -> Result<Vec<Event>, Error> {
        self.owned_factory(public, pass).await?;
        self.insert(Key::Pass(pass), Value::Pass(to.clone()));
        Ok(vec![Event::PassTransferred {
            pass,
            from: public.clone(),
            to: to.clone(),
        }])
    }

    pub(in crate::layer) async fn handle_fund(
        &mut self,
        public: &PublicKey,
        asset: Asset,
        account: &PublicKey,
        amount: u128,
    ) -> Result<Vec<Event>, Error> {
        self.ensure_authority(public)?;
        if amount == 0 {
            return Err(Error::InvalidQuantity);
        }
        self.mint(asset, account, amount).await?;
        Ok(vec![Event::Funded {
            asset,
            account: account.clone(),
            amount,
        }])
    }
}
