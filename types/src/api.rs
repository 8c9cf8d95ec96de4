use crate::execution::{Event, Output, Transaction};
use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, ReadRangeExt, Write};
use commonware_cryptography::ed25519::PublicKey;
use serde::{Deserialize, Serialize};

/// Maximum number of transactions that can be submitted in a single submission
pub const MAX_SUBMISSION_TRANSACTIONS: usize = 128;

/// Maximum outputs carried by one update (every transaction plus its events)
const MAX_UPDATE_OUTPUTS: usize = MAX_SUBMISSION_TRANSACTIONS * 8;

#[derive(Clone, Debug)]
pub struct Submission {
    pub transactions: Vec<Transaction>,
}

impl Write for Submission {
    fn write(&self, writer: &mut impl BufMut) {
        self.transactions.write(writer);
    }
}

impl Read for Submission {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let transactions = Vec::<Transaction>::read_range(reader, 1..=MAX_SUBMISSION_TRANSACTIONS)?;
        Ok(Self { transactions })
    }
}

impl EncodeSize for Submission {
    fn encode_size(&self) -> usize {
        self.transactions.encode_size()
    }
}

/// Outputs of one executed batch, pushed to update subscribers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Update {
    pub height: u64,
    pub timestamp: u64,
    pub outputs: Vec<Output>,
}

impl Update {
    /// Keep only the outputs relevant to `account`. Returns `None` when nothing remains.
    pub fn filter(self, account: &PublicKey) -> Option<Self> {
        let outputs = self
            .outputs
            .into_iter()
            .filter(|output| match output {
                Output::Event(event) => is_event_relevant_to_account(event, account),
                Output::Transaction(tx) => tx.public == *account,
            })
            .collect::<Vec<_>>();
        if outputs.is_empty() {
            return None;
        }
        Some(Self { outputs, ..self })
    }
}

fn is_event_relevant_to_account(event: &Event, account: &PublicKey) -> bool {
    match event {
        Event::PassTransferred { from, to, .. } => from == account || to == account,
        // Auction-wide events are public
        Event::Clicked { .. } | Event::Distributed { .. } => true,
        event => event.account() == Some(account),
    }
}

impl Write for Update {
    fn write(&self, writer: &mut impl BufMut) {
        self.height.write(writer);
        self.timestamp.write(writer);
        self.outputs.write(writer);
    }
}

impl Read for Update {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            height: u64::read(reader)?,
            timestamp: u64::read(reader)?,
            outputs: Vec::<Output>::read_range(reader, 0..=MAX_UPDATE_OUTPUTS)?,
        })
    }
}

impl EncodeSize for Update {
    fn encode_size(&self) -> usize {
        self.height.encode_size() + self.timestamp.encode_size() + self.outputs.encode_size()
    }
}

/// Subscription filter for updates stream
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub enum UpdatesFilter {
    /// Subscribe to all events
    All,
    /// Subscribe to events for a specific account
    Account(PublicKey),
}

impl Write for UpdatesFilter {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            UpdatesFilter::All => 0u8.write(writer),
            UpdatesFilter::Account(key) => {
                1u8.write(writer);
                key.write(writer);
            }
        }
    }
}

impl Read for UpdatesFilter {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let kind = u8::read(reader)?;
        match kind {
            0 => Ok(UpdatesFilter::All),
            1 => Ok(UpdatesFilter::Account(PublicKey::read(reader)?)),
            _ => Err(Error::InvalidEnum(kind)),
        }
    }
}

impl EncodeSize for UpdatesFilter {
    fn encode_size(&self) -> usize {
        1 + match self {
            UpdatesFilter::All => 0,
            UpdatesFilter::Account(key) => key.encode_size(),
        }
    }
}

/// Serialize fixed-point amounts as decimal strings so JSON clients keep full precision.
pub mod amount {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Progression snapshot of one game pass with accrual evaluated at `now`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryView {
    pub pass: u64,
    pub owner: String,
    pub last_claim: u64,
    pub level: u32,
    pub power: u32,
    pub evolution: u32,
    #[serde(with = "amount")]
    pub balance: u128,
    #[serde(with = "amount")]
    pub pending: u128,
    #[serde(with = "amount")]
    pub rate: u128,
    #[serde(with = "amount")]
    pub total_earned: u128,
    #[serde(with = "amount")]
    pub total_spent: u128,
}

/// One catalog slot joined with a pass's holding in it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolView {
    pub slot: u32,
    pub amount: u32,
    pub max_amount: u32,
    pub unlock_level: u32,
    #[serde(with = "amount")]
    pub yield_per_second: u128,
    /// Price of the next unit, `None` when capped.
    #[serde(with = "option_amount")]
    pub next_cost: Option<u128>,
}

/// Level state of one slot for a pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeView {
    pub slot: u32,
    pub level: u32,
    pub max_level: u32,
    #[serde(with = "amount")]
    pub multiplier: u128,
    /// Cost of the next level, `None` when maxed.
    #[serde(with = "option_amount")]
    pub next_cost: Option<u128>,
}

/// Read-only auction snapshot used to build a guarded click.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionView {
    pub epoch_id: u64,
    #[serde(with = "amount")]
    pub price: u128,
    pub last_action: u64,
    #[serde(with = "amount")]
    pub floor_price: u128,
    #[serde(with = "amount")]
    pub pooled: u128,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntryView {
    pub index: u64,
    pub actor: String,
    pub pass: u64,
    #[serde(with = "amount")]
    pub payment: u128,
    pub message: String,
    pub timestamp: u64,
    pub epoch_id: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueView {
    pub head: u64,
    pub tail: u64,
    pub count: u64,
    pub entries: Vec<QueueEntryView>,
}

pub mod option_amount {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<u128>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => serializer.collect_str(value),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<u128>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.map(|raw| raw.parse().map_err(serde::de::Error::custom))
            .transpose()
    }
}
