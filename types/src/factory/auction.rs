use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, Write};
use commonware_cryptography::ed25519::PublicKey;

use super::{
    read_string, string_encode_size, write_string, BPS_DENOMINATOR, DEFAULT_DECAY_PER_SECOND,
    DEFAULT_FLOOR_PRICE, DEFAULT_INCREASE_STEP, DEFAULT_INITIAL_PRICE, DEFAULT_PASS_PRICE,
    MAX_MESSAGE_LENGTH,
};

/// Token a balance is denominated in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Asset {
    /// Yield-bearing game resource minted by accrual and burned by purchases.
    Resource = 0,
    /// Token accepted by clicks and paid out by distributions.
    Settlement = 1,
}

impl Write for Asset {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for Asset {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = u8::read(reader)?;
        match value {
            0 => Ok(Self::Resource),
            1 => Ok(Self::Settlement),
            i => Err(Error::InvalidEnum(i)),
        }
    }
}

impl FixedSize for Asset {
    const SIZE: usize = 1;
}

/// Global pricing state machine for clicks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Auction {
    /// Incremented exactly once per distribution.
    pub epoch_id: u64,
    /// Price recorded at `last_action`, before decay.
    pub price: u128,
    pub last_action: u64,
    pub floor_price: u128,
    pub increase_step: u128,
    pub decay_per_second: u128,
    /// Ceiling for the price (0 means unbounded).
    pub max_price: u128,
    /// Settlement price of minting a new game pass.
    pub pass_price: u128,
    /// Settlement proceeds accumulated since the last distribution.
    pub pooled: u128,
}

impl Auction {
    pub fn new(now: u64) -> Self {
        Self {
            epoch_id: 0,
            price: DEFAULT_INITIAL_PRICE,
            last_action: now,
            floor_price: DEFAULT_FLOOR_PRICE,
            increase_step: DEFAULT_INCREASE_STEP,
            decay_per_second: DEFAULT_DECAY_PER_SECOND,
            max_price: 0,
            pass_price: DEFAULT_PASS_PRICE,
            pooled: 0,
        }
    }

    /// Clamp `price` into `[floor_price, max_price]`.
    pub fn clamp(&self, price: u128) -> u128 {
        let price = price.max(self.floor_price);
        if self.max_price == 0 {
            price
        } else {
            price.min(self.max_price)
        }
    }
}

impl Write for Auction {
    fn write(&self, writer: &mut impl BufMut) {
        self.epoch_id.write(writer);
        self.price.write(writer);
        self.last_action.write(writer);
        self.floor_price.write(writer);
        self.increase_step.write(writer);
        self.decay_per_second.write(writer);
        self.max_price.write(writer);
        self.pass_price.write(writer);
        self.pooled.write(writer);
    }
}

impl Read for Auction {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            epoch_id: u64::read(reader)?,
            price: u128::read(reader)?,
            last_action: u64::read(reader)?,
            floor_price: u128::read(reader)?,
            increase_step: u128::read(reader)?,
            decay_per_second: u128::read(reader)?,
            max_price: u128::read(reader)?,
            pass_price: u128::read(reader)?,
            pooled: u128::read(reader)?,
        })
    }
}

impl FixedSize for Auction {
    const SIZE: usize = u64::SIZE * 2 + u128::SIZE * 7;
}

/// Cursors of the action queue. `head <= tail` and `count = tail - head`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueCursor {
    pub head: u64,
    pub tail: u64,
}

impl QueueCursor {
    pub fn count(&self) -> u64 {
        self.tail - self.head
    }
}

impl Write for QueueCursor {
    fn write(&self, writer: &mut impl BufMut) {
        self.head.write(writer);
        self.tail.write(writer);
    }
}

impl Read for QueueCursor {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let head = u64::read(reader)?;
        let tail = u64::read(reader)?;
        if head > tail {
            return Err(Error::Invalid("QueueCursor", "head past tail"));
        }
        Ok(Self { head, tail })
    }
}

impl FixedSize for QueueCursor {
    const SIZE: usize = u64::SIZE * 2;
}

/// A recorded successful click. Immutable once written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueEntry {
    /// Absolute insertion index (monotonic across the whole log).
    pub index: u64,
    pub actor: PublicKey,
    pub pass: u64,
    pub payment: u128,
    pub message: String,
    pub timestamp: u64,
    pub epoch_id: u64,
}

impl Write for QueueEntry {
    fn write(&self, writer: &mut impl BufMut) {
        self.index.write(writer);
        self.actor.write(writer);
        self.pass.write(writer);
        self.payment.write(writer);
        write_string(&self.message, writer);
        self.timestamp.write(writer);
        self.epoch_id.write(writer);
    }
}

impl Read for QueueEntry {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            index: u64::read(reader)?,
            actor: PublicKey::read(reader)?,
            pass: u64::read(reader)?,
            payment: u128::read(reader)?,
            message: read_string(reader, MAX_MESSAGE_LENGTH)?,
            timestamp: u64::read(reader)?,
            epoch_id: u64::read(reader)?,
        })
    }
}

impl EncodeSize for QueueEntry {
    fn encode_size(&self) -> usize {
        self.index.encode_size()
            + self.actor.encode_size()
            + self.pass.encode_size()
            + self.payment.encode_size()
            + string_encode_size(&self.message)
            + self.timestamp.encode_size()
            + self.epoch_id.encode_size()
    }
}

/// Recipients of pooled auction proceeds. The rewards pool receives
/// whatever the treasury and developer shares leave over.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Distribution {
    pub treasury: PublicKey,
    pub developer: PublicKey,
    pub rewards: PublicKey,
    pub treasury_bps: u16,
    pub developer_bps: u16,
}

/// Amounts credited by one distribution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Split {
    pub treasury: u128,
    pub developer: u128,
    pub rewards: u128,
}

impl Distribution {
    pub fn bps_valid(treasury_bps: u16, developer_bps: u16) -> bool {
        treasury_bps as u128 + developer_bps as u128 <= BPS_DENOMINATOR
    }

    /// Split `total`; rounding dust goes to the rewards pool so the parts
    /// always sum to `total`.
    pub fn split(&self, total: u128) -> Split {
        let treasury = total / BPS_DENOMINATOR * self.treasury_bps as u128
            + total % BPS_DENOMINATOR * self.treasury_bps as u128 / BPS_DENOMINATOR;
        let developer = total / BPS_DENOMINATOR * self.developer_bps as u128
            + total % BPS_DENOMINATOR * self.developer_bps as u128 / BPS_DENOMINATOR;
        Split {
            treasury,
            developer,
            rewards: total - treasury - developer,
        }
    }
}

impl Write for Distribution {
    fn write(&self, writer: &mut impl BufMut) {
        self.treasury.write(writer);
        self.developer.write(writer);
        self.rewards.write(writer);
        self.treasury_bps.write(writer);
        self.developer_bps.write(writer);
    }
}

impl Read for Distribution {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let distribution = Self {
            treasury: PublicKey::read(reader)?,
            developer: PublicKey::read(reader)?,
            rewards: PublicKey::read(reader)?,
            treasury_bps: u16::read(reader)?,
            developer_bps: u16::read(reader)?,
        };
        if !Self::bps_valid(distribution.treasury_bps, distribution.developer_bps) {
            return Err(Error::Invalid("Distribution", "shares exceed 100%"));
        }
        Ok(distribution)
    }
}

impl FixedSize for Distribution {
    const SIZE: usize = PublicKey::SIZE * 3 + u16::SIZE * 2;
}
