use clickfarm_types::{
    execution::{Event, Instruction, Key, Output, Transaction, Value},
    factory::{Asset, Error, Factory, MAX_ERROR_MESSAGE_LENGTH},
};
use commonware_cryptography::ed25519::PublicKey;
use std::collections::BTreeMap;
use tracing::debug;

use crate::{
    state::{load_account, validate_and_increment_nonce, PrepareError, State, Status},
    views,
};

mod handlers;

/// Staged changes on top of a backing [State] for one batch of transactions.
///
/// Every transaction either applies all of its writes or none of them; a
/// rejected transaction still consumes its nonce.
pub struct Layer<'a, S: State> {
    state: &'a S,
    pending: BTreeMap<Key, Status>,

    authority: PublicKey,
    now: u64,
}

impl<'a, S: State> Layer<'a, S> {
    pub fn new(state: &'a S, authority: PublicKey, now: u64) -> Self {
        Self {
            state,
            pending: BTreeMap::new(),

            authority,
            now,
        }
    }

    fn insert(&mut self, key: Key, value: Value) {
        self.pending.insert(key, Status::Update(value));
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    async fn prepare(&mut self, transaction: &Transaction) -> Result<(), PrepareError> {
        let mut account = load_account(self, &transaction.public).await;
        validate_and_increment_nonce(&mut account, transaction.nonce)?;
        self.insert(
            Key::Account(transaction.public.clone()),
            Value::Account(account),
        );

        Ok(())
    }

    /// Apply a prepared transaction, discarding its writes if it fails.
    async fn apply(&mut self, transaction: &Transaction) -> Result<Vec<Event>, Error> {
        let checkpoint = self.pending.clone();
        let result = self.dispatch(transaction).await;
        if result.is_err() {
            self.pending = checkpoint;
        }
        result
    }

    async fn dispatch(&mut self, transaction: &Transaction) -> Result<Vec<Event>, Error> {
        let public = &transaction.public;
        match &transaction.instruction {
            // Catalog
            Instruction::SetTools { costs, yields } => {
                self.handle_set_tools(public, costs, yields).await
            }
            Instruction::SetToolMultipliers { multipliers } => {
                self.handle_set_tool_multipliers(public, multipliers).await
            }
            Instruction::SetToolUpgrades { costs, multipliers } => {
                self.handle_set_tool_upgrades(public, costs, multipliers)
                    .await
            }
            Instruction::SetLevels { thresholds, values } => {
                self.handle_set_levels(public, thresholds, values).await
            }
            Instruction::SetPower { costs, multipliers } => {
                self.handle_set_power(public, costs, multipliers).await
            }
            Instruction::SetEvolution {
                thresholds,
                multipliers,
                mode,
            } => {
                self.handle_set_evolution(public, thresholds, multipliers, *mode)
                    .await
            }
            Instruction::SetToolMaxAmount { amounts } => {
                self.handle_set_tool_max_amount(public, amounts).await
            }
            Instruction::SetToolGrowth { growths } => {
                self.handle_set_tool_growth(public, growths).await
            }
            Instruction::SetToolUnlocks { levels } => {
                self.handle_set_tool_unlocks(public, levels).await
            }
            Instruction::SetToolUpgradeSchedule {
                slot,
                costs,
                multipliers,
            } => {
                self.handle_set_tool_upgrade_schedule(public, *slot, costs, multipliers)
                    .await
            }

            // Treasury
            Instruction::ConfigureAuction {
                floor_price,
                increase_step,
                decay_per_second,
                max_price,
                pass_price,
            } => {
                self.handle_configure_auction(
                    public,
                    *floor_price,
                    *increase_step,
                    *decay_per_second,
                    *max_price,
                    *pass_price,
                )
                .await
            }
            Instruction::ConfigureDistribution {
                treasury,
                developer,
                rewards,
                treasury_bps,
                developer_bps,
            } => {
                self.handle_configure_distribution(
                    public,
                    treasury,
                    developer,
                    rewards,
                    *treasury_bps,
                    *developer_bps,
                )
                .await
            }
            Instruction::Fund {
                asset,
                account,
                amount,
            } => self.handle_fund(public, *asset, account, *amount).await,

            // Registry
            Instruction::MintPass => self.handle_mint_pass(public).await,
            Instruction::TransferPass { pass, to } => {
                self.handle_transfer_pass(public, *pass, to).await
            }

            // Progression
            Instruction::Claim { pass } => self.handle_claim(public, *pass).await,
            Instruction::PurchaseTool {
                pass,
                slot,
                quantity,
            } => {
                self.handle_purchase_tool(public, *pass, *slot, *quantity)
                    .await
            }
            Instruction::UpgradeTool { pass, slot } => {
                self.handle_upgrade_tool(public, *pass, *slot).await
            }
            Instruction::UpgradePower { pass } => self.handle_upgrade_power(public, *pass).await,
            Instruction::Evolve { pass } => self.handle_evolve(public, *pass).await,

            // Auction
            Instruction::Click {
                pass,
                epoch_id,
                deadline,
                max_payment,
                payment,
                message,
            } => {
                self.handle_click(
                    public,
                    *pass,
                    *epoch_id,
                    *deadline,
                    *max_payment,
                    *payment,
                    message,
                )
                .await
            }
            Instruction::ClaimAndDistribute => self.handle_claim_and_distribute(public).await,
        }
    }

    fn ensure_authority(&self, public: &PublicKey) -> Result<(), Error> {
        if *public != self.authority {
            return Err(Error::NotAuthorized);
        }
        Ok(())
    }

    /// Load the factory behind `pass` after checking `public` owns it.
    async fn owned_factory(&self, public: &PublicKey, pass: u64) -> Result<Factory, Error> {
        let owner = views::owner(self, pass)
            .await
            .ok_or(Error::PassNotFound(pass))?;
        if owner != *public {
            return Err(Error::NotOwner(pass));
        }
        Ok(views::factory(self, pass)
            .await
            .unwrap_or_else(|| Factory::new(self.now)))
    }

    async fn mint(&mut self, asset: Asset, account: &PublicKey, amount: u128) -> Result<(), Error> {
        if amount == 0 {
            return Ok(());
        }
        let balance = views::balance_of(self, asset, account).await;
        let balance = balance.checked_add(amount).ok_or(Error::Overflow)?;
        self.insert(Key::Balance(asset, account.clone()), Value::Balance(balance));
        Ok(())
    }

    async fn burn(&mut self, asset: Asset, account: &PublicKey, amount: u128) -> Result<(), Error> {
        if amount == 0 {
            return Ok(());
        }
        let available = views::balance_of(self, asset, account).await;
        if available < amount {
            return Err(Error::InsufficientBalance {
                required: amount,
                available,
            });
        }
        self.insert(
            Key::Balance(asset, account.clone()),
            Value::Balance(available - amount),
        );
        Ok(())
    }

    pub async fn execute(
        &mut self,
        transactions: Vec<Transaction>,
    ) -> (Vec<Output>, BTreeMap<PublicKey, u64>) {
        let mut processed_nonces = BTreeMap::new();
        let mut outputs = Vec::new();

        for tx in transactions {
            if let Err(err) = self.prepare(&tx).await {
                debug!(?err, public = ?tx.public, "skipping transaction");
                continue;
            }
            processed_nonces.insert(tx.public.clone(), tx.nonce.saturating_add(1));
            match self.apply(&tx).await {
                Ok(events) => outputs.extend(events.into_iter().map(Output::Event)),
                Err(err) => {
                    debug!(%err, public = ?tx.public, nonce = tx.nonce, "transaction rejected");
                    let mut message = err.to_string();
                    message.truncate(MAX_ERROR_MESSAGE_LENGTH);
                    outputs.push(Output::Event(Event::Error {
                        account: tx.public.clone(),
                        code: err.code(),
                        message,
                    }));
                }
            }
            outputs.push(Output::Transaction(tx));
        }

        (outputs, processed_nonces)
    }

    pub fn commit(self) -> Vec<(Key, Status)> {
        self.pending.into_iter().collect()
    }
}

impl<'a, S: State> State for Layer<'a, S> {
    async fn get(&self, key: &Key) -> Option<Value> {
        match self.pending.get(key) {
            Some(Status::Update(value)) => Some(value.clone()),
            Some(Status::Delete) => None,
            None => self.state.get(key).await,
        }
    }

    async fn insert(&mut self, key: Key, value: Value) {
        self.pending.insert(key, Status::Update(value));
    }

    async fn delete(&mut self, key: &Key) {
        self.pending.insert(key.clone(), Status::Delete);
    }
}
