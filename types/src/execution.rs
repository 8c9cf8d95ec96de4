use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, Write};
use commonware_cryptography::{
    ed25519::{self, Batch, PublicKey},
    BatchVerifier, Signer, Verifier,
};
use commonware_utils::union;

use crate::factory::{
    read_slots, read_string, read_table, string_encode_size, write_string, Asset, Auction,
    CatalogSection, Catalog, Distribution, EvolutionMode, Factory, QueueCursor, QueueEntry,
    MAX_ERROR_MESSAGE_LENGTH, MAX_MESSAGE_LENGTH,
};

pub const NAMESPACE: &[u8] = b"_CLICKFARM";
pub const TRANSACTION_SUFFIX: &[u8] = b"_TX";

#[inline]
pub fn transaction_namespace(namespace: &[u8]) -> Vec<u8> {
    union(namespace, TRANSACTION_SUFFIX)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub nonce: u64,
    pub instruction: Instruction,

    pub public: ed25519::PublicKey,
    pub signature: ed25519::Signature,
}

impl Transaction {
    fn payload(nonce: &u64, instruction: &Instruction) -> Vec<u8> {
        let mut payload = Vec::new();
        nonce.write(&mut payload);
        instruction.write(&mut payload);

        payload
    }

    pub fn sign(private: &ed25519::PrivateKey, nonce: u64, instruction: Instruction) -> Self {
        let signature = private.sign(
            Some(&transaction_namespace(NAMESPACE)),
            &Self::payload(&nonce, &instruction),
        );

        Self {
            nonce,
            instruction,
            public: private.public_key(),
            signature,
        }
    }

    pub fn verify(&self) -> bool {
        self.public.verify(
            Some(&transaction_namespace(NAMESPACE)),
            &Self::payload(&self.nonce, &self.instruction),
            &self.signature,
        )
    }

    pub fn verify_batch(&self, batch: &mut Batch) {
        batch.add(
            Some(&transaction_namespace(NAMESPACE)),
            &Self::payload(&self.nonce, &self.instruction),
            &self.public,
            &self.signature,
        );
    }
}

impl Write for Transaction {
    fn write(&self, writer: &mut impl BufMut) {
        self.nonce.write(writer);
        self.instruction.write(writer);
        self.public.write(writer);
        self.signature.write(writer);
    }
}

impl Read for Transaction {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let nonce = u64::read(reader)?;
        let instruction = Instruction::read(reader)?;
        let public = ed25519::PublicKey::read(reader)?;
        let signature = ed25519::Signature::read(reader)?;

        Ok(Self {
            nonce,
            instruction,
            public,
            signature,
        })
    }
}

impl EncodeSize for Transaction {
    fn encode_size(&self) -> usize {
        self.nonce.encode_size()
            + self.instruction.encode_size()
            + self.public.encode_size()
            + self.signature.encode_size()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    // Catalog configuration, authority only (tags 0-8, 12)
    /// Replace the tool table. Binary: [0] [costs:Vec<u128>] [yields:Vec<u128>]
    SetTools { costs: Vec<u128>, yields: Vec<u128> },
    /// Replace the purchase-cost curve. Binary: [1] [multipliers:Vec<u128>]
    SetToolMultipliers { multipliers: Vec<u128> },
    /// Replace the per-tool level table. Binary: [2] [costs] [multipliers]
    SetToolUpgrades {
        costs: Vec<u128>,
        multipliers: Vec<u128>,
    },
    /// Replace the aggregate level table. Binary: [3] [thresholds] [values]
    SetLevels {
        thresholds: Vec<u128>,
        values: Vec<u128>,
    },
    /// Replace the power tiers. Binary: [4] [costs] [multipliers]
    SetPower {
        costs: Vec<u128>,
        multipliers: Vec<u128>,
    },
    /// Replace the evolution tiers. Binary: [5] [thresholds] [multipliers] [mode:u8]
    SetEvolution {
        thresholds: Vec<u128>,
        multipliers: Vec<u128>,
        mode: EvolutionMode,
    },
    /// Per-slot supply caps. Binary: [6] [amounts:Vec<u32>]
    SetToolMaxAmount { amounts: Vec<u32> },
    /// Per-slot growth factors. Binary: [7] [growths:Vec<u128>]
    SetToolGrowth { growths: Vec<u128> },
    /// Per-slot unlock levels. Binary: [8] [levels:Vec<u32>]
    SetToolUnlocks { levels: Vec<u32> },
    /// Level table for one slot; empty arrays restore the default table.
    /// Binary: [12] [slot:u32] [costs] [multipliers]
    SetToolUpgradeSchedule {
        slot: u32,
        costs: Vec<u128>,
        multipliers: Vec<u128>,
    },

    // Auction and treasury configuration, authority only (tags 9-11)
    /// Binary: [9] [floor:u128] [step:u128] [decay:u128] [max:u128] [pass:u128]
    ConfigureAuction {
        floor_price: u128,
        increase_step: u128,
        decay_per_second: u128,
        max_price: u128,
        pass_price: u128,
    },
    /// Binary: [10] [treasury] [developer] [rewards] [treasury_bps:u16] [developer_bps:u16]
    ConfigureDistribution {
        treasury: PublicKey,
        developer: PublicKey,
        rewards: PublicKey,
        treasury_bps: u16,
        developer_bps: u16,
    },
    /// Credit tokens to an account. Binary: [11] [asset:u8] [account] [amount:u128]
    Fund {
        asset: Asset,
        account: PublicKey,
        amount: u128,
    },

    // Game pass registry (tags 20-21)
    /// Buy a new game pass at the configured price. Binary: [20]
    MintPass,
    /// Binary: [21] [pass:u64] [to]
    TransferPass { pass: u64, to: PublicKey },

    // Progression, pass owner only (tags 22-26)
    /// Binary: [22] [pass:u64]
    Claim { pass: u64 },
    /// Binary: [23] [pass:u64] [slot:u32] [quantity:u32]
    PurchaseTool { pass: u64, slot: u32, quantity: u32 },
    /// Binary: [24] [pass:u64] [slot:u32]
    UpgradeTool { pass: u64, slot: u32 },
    /// Binary: [25] [pass:u64]
    UpgradePower { pass: u64 },
    /// Binary: [26] [pass:u64]
    Evolve { pass: u64 },

    // Auction (tags 30-31)
    /// Binary: [30] [pass:u64] [epoch:u64] [deadline:u64] [max:u128] [payment:u128] [message]
    Click {
        pass: u64,
        epoch_id: u64,
        deadline: u64,
        max_payment: u128,
        payment: u128,
        message: String,
    },
    /// Permissionless. Binary: [31]
    ClaimAndDistribute,
}

impl Write for Instruction {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::SetTools { costs, yields } => {
                0u8.write(writer);
                costs.write(writer);
                yields.write(writer);
            }
            Self::SetToolMultipliers { multipliers } => {
                1u8.write(writer);
                multipliers.write(writer);
            }
            Self::SetToolUpgrades { costs, multipliers } => {
                2u8.write(writer);
                costs.write(writer);
                multipliers.write(writer);
            }
            Self::SetLevels { thresholds, values } => {
                3u8.write(writer);
                thresholds.write(writer);
                values.write(writer);
            }
            Self::SetPower { costs, multipliers } => {
                4u8.write(writer);
                costs.write(writer);
                multipliers.write(writer);
            }
            Self::SetEvolution {
                thresholds,
                multipliers,
                mode,
            } => {
                5u8.write(writer);
                thresholds.write(writer);
                multipliers.write(writer);
                mode.write(writer);
            }
            Self::SetToolMaxAmount { amounts } => {
                6u8.write(writer);
                amounts.write(writer);
            }
            Self::SetToolGrowth { growths } => {
                7u8.write(writer);
                growths.write(writer);
            }
            Self::SetToolUnlocks { levels } => {
                8u8.write(writer);
                levels.write(writer);
            }
            Self::SetToolUpgradeSchedule {
                slot,
                costs,
                multipliers,
            } => {
                12u8.write(writer);
                slot.write(writer);
                costs.write(writer);
                multipliers.write(writer);
            }
            Self::ConfigureAuction {
                floor_price,
                increase_step,
                decay_per_second,
                max_price,
                pass_price,
            } => {
                9u8.write(writer);
                floor_price.write(writer);
                increase_step.write(writer);
                decay_per_second.write(writer);
                max_price.write(writer);
                pass_price.write(writer);
            }
            Self::ConfigureDistribution {
                treasury,
                developer,
                rewards,
                treasury_bps,
                developer_bps,
            } => {
                10u8.write(writer);
                treasury.write(writer);
                developer.write(writer);
                rewards.write(writer);
                treasury_bps.write(writer);
                developer_bps.write(writer);
            }
            Self::Fund {
                asset,
                account,
                amount,
            } => {
                11u8.write(writer);
                asset.write(writer);
                account.write(writer);
                amount.write(writer);
            }
            Self::MintPass => 20u8.write(writer),
            Self::TransferPass { pass, to } => {
                21u8.write(writer);
                pass.write(writer);
                to.write(writer);
            }
            Self::Claim { pass } => {
                22u8.write(writer);
                pass.write(writer);
            }
            Self::PurchaseTool {
                pass,
                slot,
                quantity,
            } => {
                23u8.write(writer);
                pass.write(writer);
                slot.write(writer);
                quantity.write(writer);
            }
            Self::UpgradeTool { pass, slot } => {
                24u8.write(writer);
                pass.write(writer);
                slot.write(writer);
            }
            Self::UpgradePower { pass } => {
                25u8.write(writer);
                pass.write(writer);
            }
            Self::Evolve { pass } => {
                26u8.write(writer);
                pass.write(writer);
            }
            Self::Click {
                pass,
                epoch_id,
                deadline,
                max_payment,
                payment,
                message,
            } => {
                30u8.write(writer);
                pass.write(writer);
                epoch_id.write(writer);
                deadline.write(writer);
                max_payment.write(writer);
                payment.write(writer);
                write_string(message, writer);
            }
            Self::ClaimAndDistribute => 31u8.write(writer),
        }
    }
}

impl Read for Instruction {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let instruction = match u8::read(reader)? {
            0 => Self::SetTools {
                costs: read_table(reader)?,
                yields: read_table(reader)?,
            },
            1 => Self::SetToolMultipliers {
                multipliers: read_table(reader)?,
            },
            2 => Self::SetToolUpgrades {
                costs: read_table(reader)?,
                multipliers: read_table(reader)?,
            },
            3 => Self::SetLevels {
                thresholds: read_table(reader)?,
                values: read_table(reader)?,
            },
            4 => Self::SetPower {
                costs: read_table(reader)?,
                multipliers: read_table(reader)?,
            },
            5 => Self::SetEvolution {
                thresholds: read_table(reader)?,
                multipliers: read_table(reader)?,
                mode: EvolutionMode::read(reader)?,
            },
            6 => Self::SetToolMaxAmount {
                amounts: read_slots(reader)?,
            },
            7 => Self::SetToolGrowth {
                growths: read_table(reader)?,
            },
            8 => Self::SetToolUnlocks {
                levels: read_slots(reader)?,
            },
            12 => Self::SetToolUpgradeSchedule {
                slot: u32::read(reader)?,
                costs: read_table(reader)?,
                multipliers: read_table(reader)?,
            },
            9 => Self::ConfigureAuction {
                floor_price: u128::read(reader)?,
                increase_step: u128::read(reader)?,
                decay_per_second: u128::read(reader)?,
                max_price: u128::read(reader)?,
                pass_price: u128::read(reader)?,
            },
            10 => Self::ConfigureDistribution {
                treasury: PublicKey::read(reader)?,
                developer: PublicKey::read(reader)?,
                rewards: PublicKey::read(reader)?,
                treasury_bps: u16::read(reader)?,
                developer_bps: u16::read(reader)?,
            },
            11 => Self::Fund {
                asset: Asset::read(reader)?,
                account: PublicKey::read(reader)?,
                amount: u128::read(reader)?,
            },
            20 => Self::MintPass,
            21 => Self::TransferPass {
                pass: u64::read(reader)?,
                to: PublicKey::read(reader)?,
            },
            22 => Self::Claim {
                pass: u64::read(reader)?,
            },
            23 => Self::PurchaseTool {
                pass: u64::read(reader)?,
                slot: u32::read(reader)?,
                quantity: u32::read(reader)?,
            },
            24 => Self::UpgradeTool {
                pass: u64::read(reader)?,
                slot: u32::read(reader)?,
            },
            25 => Self::UpgradePower {
                pass: u64::read(reader)?,
            },
            26 => Self::Evolve {
                pass: u64::read(reader)?,
            },
            30 => Self::Click {
                pass: u64::read(reader)?,
                epoch_id: u64::read(reader)?,
                deadline: u64::read(reader)?,
                max_payment: u128::read(reader)?,
                payment: u128::read(reader)?,
                message: read_string(reader, MAX_MESSAGE_LENGTH)?,
            },
            31 => Self::ClaimAndDistribute,

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(instruction)
    }
}

impl EncodeSize for Instruction {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::SetTools { costs, yields } => costs.encode_size() + yields.encode_size(),
                Self::SetToolMultipliers { multipliers } => multipliers.encode_size(),
                Self::SetToolUpgrades { costs, multipliers }
                | Self::SetPower { costs, multipliers } => {
                    costs.encode_size() + multipliers.encode_size()
                }
                Self::SetLevels { thresholds, values } => {
                    thresholds.encode_size() + values.encode_size()
                }
                Self::SetEvolution {
                    thresholds,
                    multipliers,
                    ..
                } => thresholds.encode_size() + multipliers.encode_size() + EvolutionMode::SIZE,
                Self::SetToolMaxAmount { amounts } => amounts.encode_size(),
                Self::SetToolGrowth { growths } => growths.encode_size(),
                Self::SetToolUnlocks { levels } => levels.encode_size(),
                Self::SetToolUpgradeSchedule {
                    costs, multipliers, ..
                } => u32::SIZE + costs.encode_size() + multipliers.encode_size(),
                Self::ConfigureAuction { .. } => u128::SIZE * 5,
                Self::ConfigureDistribution { .. } => PublicKey::SIZE * 3 + u16::SIZE * 2,
                Self::Fund { .. } => Asset::SIZE + PublicKey::SIZE + u128::SIZE,
                Self::MintPass | Self::ClaimAndDistribute => 0,
                Self::TransferPass { .. } => u64::SIZE + PublicKey::SIZE,
                Self::Claim { .. } | Self::UpgradePower { .. } | Self::Evolve { .. } => u64::SIZE,
                Self::PurchaseTool { .. } => u64::SIZE + u32::SIZE * 2,
                Self::UpgradeTool { .. } => u64::SIZE + u32::SIZE,
                Self::Click { message, .. } => {
                    u64::SIZE * 3 + u128::SIZE * 2 + string_encode_size(message)
                }
            }
    }
}

/// Minimal account structure for transaction nonce tracking.
/// Used for replay protection across all transaction types.
#[derive(Clone, Default, Eq, PartialEq, Debug)]
pub struct Account {
    pub nonce: u64,
}

impl Write for Account {
    fn write(&self, writer: &mut impl BufMut) {
        self.nonce.write(writer);
    }
}

impl Read for Account {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            nonce: u64::read(reader)?,
        })
    }
}

impl EncodeSize for Account {
    fn encode_size(&self) -> usize {
        self.nonce.encode_size()
    }
}

#[derive(Hash, Eq, PartialEq, Ord, PartialOrd, Clone, Debug)]
pub enum Key {
    /// Account for nonce tracking (tag 0)
    Account(PublicKey),

    // Game keys (tags 10-19)
    Catalog,
    Factory(u64),
    /// Owner of a game pass
    Pass(u64),
    /// Next game pass id
    Registry,
    Balance(Asset, PublicKey),
    Auction,
    Queue,
    /// Ring buffer slot (`index % QUEUE_CAPACITY`)
    QueueSlot(u64),
    Distribution,
}

impl Write for Key {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Account(pk) => {
                0u8.write(writer);
                pk.write(writer);
            }
            Self::Catalog => 10u8.write(writer),
            Self::Factory(pass) => {
                11u8.write(writer);
                pass.write(writer);
            }
            Self::Pass(pass) => {
                12u8.write(writer);
                pass.write(writer);
            }
            Self::Registry => 13u8.write(writer),
            Self::Balance(asset, pk) => {
                14u8.write(writer);
                asset.write(writer);
                pk.write(writer);
            }
            Self::Auction => 15u8.write(writer),
            Self::Queue => 16u8.write(writer),
            Self::QueueSlot(slot) => {
                17u8.write(writer);
                slot.write(writer);
            }
            Self::Distribution => 18u8.write(writer),
        }
    }
}

impl Read for Key {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let key = match u8::read(reader)? {
            0 => Self::Account(PublicKey::read(reader)?),
            10 => Self::Catalog,
            11 => Self::Factory(u64::read(reader)?),
            12 => Self::Pass(u64::read(reader)?),
            13 => Self::Registry,
            14 => Self::Balance(Asset::read(reader)?, PublicKey::read(reader)?),
            15 => Self::Auction,
            16 => Self::Queue,
            17 => Self::QueueSlot(u64::read(reader)?),
            18 => Self::Distribution,

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(key)
    }
}

impl EncodeSize for Key {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Account(_) => PublicKey::SIZE,
                Self::Factory(_) | Self::Pass(_) | Self::QueueSlot(_) => u64::SIZE,
                Self::Balance(..) => Asset::SIZE + PublicKey::SIZE,
                Self::Catalog
                | Self::Registry
                | Self::Auction
                | Self::Queue
                | Self::Distribution => 0,
            }
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
#[allow(clippy::large_enum_variant)]
pub enum Value {
    /// Account for nonce tracking (tag 0)
    Account(Account),

    // Game values (tags 10-19)
    Catalog(Catalog),
    Factory(Factory),
    Pass(PublicKey),
    Registry(u64),
    Balance(u128),
    Auction(Auction),
    Queue(QueueCursor),
    QueueEntry(QueueEntry),
    Distribution(Distribution),
}

impl Write for Value {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Account(account) => {
                0u8.write(writer);
                account.write(writer);
            }
            Self::Catalog(catalog) => {
                10u8.write(writer);
                catalog.write(writer);
            }
            Self::Factory(factory) => {
                11u8.write(writer);
                factory.write(writer);
            }
            Self::Pass(owner) => {
                12u8.write(writer);
                owner.write(writer);
            }
            Self::Registry(next) => {
                13u8.write(writer);
                next.write(writer);
            }
            Self::Balance(amount) => {
                14u8.write(writer);
                amount.write(writer);
            }
            Self::Auction(auction) => {
                15u8.write(writer);
                auction.write(writer);
            }
            Self::Queue(cursor) => {
                16u8.write(writer);
                cursor.write(writer);
            }
            Self::QueueEntry(entry) => {
                17u8.write(writer);
                entry.write(writer);
            }
            Self::Distribution(distribution) => {
                18u8.write(writer);
                distribution.write(writer);
            }
        }
    }
}

impl Read for Value {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = match u8::read(reader)? {
            0 => Self::Account(Account::read(reader)?),
            10 => Self::Catalog(Catalog::read(reader)?),
            11 => Self::Factory(Factory::read(reader)?),
            12 => Self::Pass(PublicKey::read(reader)?),
            13 => Self::Registry(u64::read(reader)?),
            14 => Self::Balance(u128::read(reader)?),
            15 => Self::Auction(Auction::read(reader)?),
            16 => Self::Queue(QueueCursor::read(reader)?),
            17 => Self::QueueEntry(QueueEntry::read(reader)?),
            18 => Self::Distribution(Distribution::read(reader)?),

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(value)
    }
}

impl EncodeSize for Value {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Account(account) => account.encode_size(),
                Self::Catalog(catalog) => catalog.encode_size(),
                Self::Factory(factory) => factory.encode_size(),
                Self::Pass(owner) => owner.encode_size(),
                Self::Registry(next) => next.encode_size(),
                Self::Balance(amount) => amount.encode_size(),
                Self::Auction(auction) => auction.encode_size(),
                Self::Queue(cursor) => cursor.encode_size(),
                Self::QueueEntry(entry) => entry.encode_size(),
                Self::Distribution(distribution) => distribution.encode_size(),
            }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::large_enum_variant)]
pub enum Event {
    // Rejection (tag 0)
    Error {
        account: PublicKey,
        code: u8,
        message: String,
    },

    // Configuration (tags 1-4)
    CatalogUpdated {
        section: CatalogSection,
    },
    AuctionConfigured {
        floor_price: u128,
        increase_step: u128,
        decay_per_second: u128,
        max_price: u128,
        pass_price: u128,
    },
    DistributionConfigured {
        treasury_bps: u16,
        developer_bps: u16,
    },
    Funded {
        asset: Asset,
        account: PublicKey,
        amount: u128,
    },

    // Registry (tags 10-11)
    PassMinted {
        pass: u64,
        owner: PublicKey,
        price: u128,
    },
    PassTransferred {
        pass: u64,
        from: PublicKey,
        to: PublicKey,
    },

    // Progression (tags 12-16)
    Claimed {
        pass: u64,
        owner: PublicKey,
        amount: u128,
        timestamp: u64,
    },
    ToolPurchased {
        pass: u64,
        slot: u32,
        quantity: u32,
        cost: u128,
        amount: u32,
    },
    ToolUpgraded {
        pass: u64,
        slot: u32,
        level: u32,
        cost: u128,
    },
    PowerUpgraded {
        pass: u64,
        tier: u32,
        cost: u128,
    },
    Evolved {
        pass: u64,
        tier: u32,
    },

    // Auction (tags 20-21)
    Clicked {
        pass: u64,
        actor: PublicKey,
        epoch_id: u64,
        index: u64,
        payment: u128,
        next_price: u128,
        reward: u128,
    },
    Distributed {
        epoch_id: u64,
        total: u128,
        treasury: u128,
        developer: u128,
        rewards: u128,
    },
}

impl Event {
    /// Account an event should be routed to, if it concerns one.
    pub fn account(&self) -> Option<&PublicKey> {
        match self {
            Self::Error { account, .. } | Self::Funded { account, .. } => Some(account),
            Self::PassMinted { owner, .. } | Self::Claimed { owner, .. } => Some(owner),
            Self::PassTransferred { to, .. } => Some(to),
            Self::Clicked { actor, .. } => Some(actor),
            _ => None,
        }
    }
}

impl Write for Event {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Error {
                account,
                code,
                message,
            } => {
                0u8.write(writer);
                account.write(writer);
                code.write(writer);
                write_string(message, writer);
            }
            Self::CatalogUpdated { section } => {
                1u8.write(writer);
                section.write(writer);
            }
            Self::AuctionConfigured {
                floor_price,
                increase_step,
                decay_per_second,
                max_price,
                pass_price,
            } => {
                2u8.write(writer);
                floor_price.write(writer);
                increase_step.write(writer);
                decay_per_second.write(writer);
                max_price.write(writer);
                pass_price.write(writer);
            }
            Self::DistributionConfigured {
                treasury_bps,
                developer_bps,
            } => {
                3u8.write(writer);
                treasury_bps.write(writer);
                developer_bps.write(writer);
            }
            Self::Funded {
                asset,
                account,
                amount,
            } => {
                4u8.write(writer);
                asset.write(writer);
                account.write(writer);
                amount.write(writer);
            }
            Self::PassMinted { pass, owner, price } => {
                10u8.write(writer);
                pass.write(writer);
                owner.write(writer);
                price.write(writer);
            }
            Self::PassTransferred { pass, from, to } => {
                11u8.write(writer);
                pass.write(writer);
                from.write(writer);
                to.write(writer);
            }
            Self::Claimed {
                pass,
                owner,
                amount,
                timestamp,
            } => {
                12u8.write(writer);
                pass.write(writer);
                owner.write(writer);
                amount.write(writer);
                timestamp.write(writer);
            }
            Self::ToolPurchased {
                pass,
                slot,
                quantity,
                cost,
                amount,
            } => {
                13u8.write(writer);
                pass.write(writer);
                slot.write(writer);
                quantity.write(writer);
                cost.write(writer);
                amount.write(writer);
            }
            Self::ToolUpgraded {
                pass,
                slot,
                level,
                cost,
            } => {
                14u8.write(writer);
                pass.write(writer);
                slot.write(writer);
                level.write(writer);
                cost.write(writer);
            }
            Self::PowerUpgraded { pass, tier, cost } => {
                15u8.write(writer);
                pass.write(writer);
                tier.write(writer);
                cost.write(writer);
            }
            Self::Evolved { pass, tier } => {
                16u8.write(writer);
                pass.write(writer);
                tier.write(writer);
            }
            Self::Clicked {
                pass,
                actor,
                epoch_id,
                index,
                payment,
                next_price,
                reward,
            } => {
                20u8.write(writer);
                pass.write(writer);
                actor.write(writer);
                epoch_id.write(writer);
                index.write(writer);
                payment.write(writer);
                next_price.write(writer);
                reward.write(writer);
            }
            Self::Distributed {
                epoch_id,
                total,
                treasury,
                developer,
                rewards,
            } => {
                21u8.write(writer);
                epoch_id.write(writer);
                total.write(writer);
                treasury.write(writer);
                developer.write(writer);
                rewards.write(writer);
            }
        }
    }
}

impl Read for Event {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let event = match u8::read(reader)? {
            0 => Self::Error {
                account: PublicKey::read(reader)?,
                code: u8::read(reader)?,
                message: read_string(reader, MAX_ERROR_MESSAGE_LENGTH)?,
            },
            1 => Self::CatalogUpdated {
                section: CatalogSection::read(reader)?,
            },
            2 => Self::AuctionConfigured {
                floor_price: u128::read(reader)?,
                increase_step: u128::read(reader)?,
                decay_per_second: u128::read(reader)?,
                max_price: u128::read(reader)?,
                pass_price: u128::read(reader)?,
            },
            3 => Self::DistributionConfigured {
                treasury_bps: u16::read(reader)?,
                developer_bps: u16::read(reader)?,
            },
            4 => Self::Funded {
                asset: Asset::read(reader)?,
                account: PublicKey::read(reader)?,
                amount: u128::read(reader)?,
            },
            10 => Self::PassMinted {
                pass: u64::read(reader)?,
                owner: PublicKey::read(reader)?,
                price: u128::read(reader)?,
            },
            11 => Self::PassTransferred {
                pass: u64::read(reader)?,
                from: PublicKey::read(reader)?,
                to: PublicKey::read(reader)?,
            },
            12 => Self::Claimed {
                pass: u64::read(reader)?,
                owner: PublicKey::read(reader)?,
                amount: u128::read(reader)?,
                timestamp: u64::read(reader)?,
            },
            13 => Self::ToolPurchased {
                pass: u64::read(reader)?,
                slot: u32::read(reader)?,
                quantity: u32::read(reader)?,
                cost: u128::read(reader)?,
                amount: u32::read(reader)?,
            },
            14 => Self::ToolUpgraded {
                pass: u64::read(reader)?,
                slot: u32::read(reader)?,
                level: u32::read(reader)?,
                cost: u128::read(reader)?,
            },
            15 => Self::PowerUpgraded {
                pass: u64::read(reader)?,
                tier: u32::read(reader)?,
                cost: u128::read(reader)?,
            },
            16 => Self::Evolved {
                pass: u64::read(reader)?,
                tier: u32::read(reader)?,
            },
            20 => Self::Clicked {
                pass: u64::read(reader)?,
                actor: PublicKey::read(reader)?,
                epoch_id: u64::read(reader)?,
                index: u64::read(reader)?,
                payment: u128::read(reader)?,
                next_price: u128::read(reader)?,
                reward: u128::read(reader)?,
            },
            21 => Self::Distributed {
                epoch_id: u64::read(reader)?,
                total: u128::read(reader)?,
                treasury: u128::read(reader)?,
                developer: u128::read(reader)?,
                rewards: u128::read(reader)?,
            },

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(event)
    }
}

impl EncodeSize for Event {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Error { message, .. } => {
                    PublicKey::SIZE + u8::SIZE + string_encode_size(message)
                }
                Self::CatalogUpdated { .. } => CatalogSection::SIZE,
                Self::AuctionConfigured { .. } => u128::SIZE * 5,
                Self::DistributionConfigured { .. } => u16::SIZE * 2,
                Self::Funded { .. } => Asset::SIZE + PublicKey::SIZE + u128::SIZE,
                Self::PassMinted { .. } => u64::SIZE + PublicKey::SIZE + u128::SIZE,
                Self::PassTransferred { .. } => u64::SIZE + PublicKey::SIZE * 2,
                Self::Claimed { .. } => u64::SIZE * 2 + PublicKey::SIZE + u128::SIZE,
                Self::ToolPurchased { .. } => u64::SIZE + u32::SIZE * 3 + u128::SIZE,
                Self::ToolUpgraded { .. } => u64::SIZE + u32::SIZE * 2 + u128::SIZE,
                Self::PowerUpgraded { .. } => u64::SIZE + u32::SIZE + u128::SIZE,
                Self::Evolved { .. } => u64::SIZE + u32::SIZE,
                Self::Clicked { .. } => u64::SIZE * 3 + PublicKey::SIZE + u128::SIZE * 3,
                Self::Distributed { .. } => u64::SIZE + u128::SIZE * 4,
            }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Event(Event),
    Transaction(Transaction),
}

impl Write for Output {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Event(event) => {
                0u8.write(writer);
                event.write(writer);
            }
            Self::Transaction(transaction) => {
                1u8.write(writer);
                transaction.write(writer);
            }
        }
    }
}

impl Read for Output {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let kind = u8::read(reader)?;
        match kind {
            0 => Ok(Self::Event(Event::read(reader)?)),
            1 => Ok(Self::Transaction(Transaction::read(reader)?)),
            _ => Err(Error::InvalidEnum(kind)),
        }
    }
}

impl EncodeSize for Output {
    fn encode_size(&self) -> usize {
        1 + match self {
            Self::Event(event) => event.encode_size(),
            Self::Transaction(transaction) => transaction.encode_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commonware_codec::{DecodeExt, Encode};
    use commonware_cryptography::{ed25519::PrivateKey, PrivateKeyExt};
    use rand::{rngs::StdRng, SeedableRng};

    fn signer(seed: u64) -> PrivateKey {
        let mut rng = StdRng::seed_from_u64(seed);
        PrivateKey::from_rng(&mut rng)
    }

    #[test]
    fn test_transaction_sign_and_verify() {
        let private = signer(1);
        let tx = Transaction::sign(
            &private,
            7,
            Instruction::Click {
                pass: 1,
                epoch_id: 0,
                deadline: 100,
                max_payment: 5,
                payment: 5,
                message: "gm".to_string(),
            },
        );
        assert!(tx.verify());

        let decoded = Transaction::decode(tx.encode()).unwrap();
        assert_eq!(decoded, tx);
        assert!(decoded.verify());

        // Tampering with the nonce invalidates the signature.
        let mut tampered = tx.clone();
        tampered.nonce = 8;
        assert!(!tampered.verify());
    }

    #[test]
    fn test_click_message_length_bounded() {
        let private = signer(2);
        let tx = Transaction::sign(
            &private,
            0,
            Instruction::Click {
                pass: 1,
                epoch_id: 0,
                deadline: 0,
                max_payment: 0,
                payment: 0,
                message: "x".repeat(MAX_MESSAGE_LENGTH + 1),
            },
        );
        assert!(Transaction::decode(tx.encode()).is_err());
    }

    #[test]
    fn test_instruction_encode_size_matches() {
        let account = signer(3).public_key();
        let instructions = vec![
            Instruction::SetTools {
                costs: vec![1, 2, 3],
                yields: vec![4, 5, 6],
            },
            Instruction::SetEvolution {
                thresholds: vec![0, 10],
                multipliers: vec![1, 2],
                mode: EvolutionMode::Reset,
            },
            Instruction::SetToolMaxAmount {
                amounts: vec![10, 20],
            },
            Instruction::SetToolUpgradeSchedule {
                slot: 1,
                costs: vec![0, 5],
                multipliers: vec![1, 3],
            },
            Instruction::SetToolUpgradeSchedule {
                slot: 0,
                costs: vec![],
                multipliers: vec![],
            },
            Instruction::ConfigureDistribution {
                treasury: account.clone(),
                developer: account.clone(),
                rewards: account.clone(),
                treasury_bps: 1,
                developer_bps: 2,
            },
            Instruction::Fund {
                asset: Asset::Settlement,
                account,
                amount: u128::MAX,
            },
            Instruction::PurchaseTool {
                pass: 1,
                slot: 2,
                quantity: 3,
            },
            Instruction::ClaimAndDistribute,
        ];
        for instruction in instructions {
            let encoded = instruction.encode();
            assert_eq!(encoded.len(), instruction.encode_size());
            assert_eq!(Instruction::decode(encoded).unwrap(), instruction);
        }
    }

    #[test]
    fn test_unknown_tags_rejected() {
        assert!(Instruction::decode(&[99u8][..]).is_err());
        assert!(Key::decode(&[99u8][..]).is_err());
        assert!(Value::decode(&[99u8][..]).is_err());
        assert!(Event::decode(&[99u8][..]).is_err());
    }
}
