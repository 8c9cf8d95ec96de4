use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, ReadRangeExt, Write};

use super::MAX_TOOLS;

/// Units owned and level reached in one tool slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ToolHolding {
    pub amount: u32,
    pub level: u32,
}

impl Write for ToolHolding {
    fn write(&self, writer: &mut impl BufMut) {
        self.amount.write(writer);
        self.level.write(writer);
    }
}

impl Read for ToolHolding {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            amount: u32::read(reader)?,
            level: u32::read(reader)?,
        })
    }
}

impl FixedSize for ToolHolding {
    const SIZE: usize = u32::SIZE * 2;
}

/// Progression record of one game pass.
///
/// The spendable resource itself lives in the resource ledger under the pass
/// owner's account; this record only tracks what drives the accrual rate.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Factory {
    /// Timestamp accrual was last settled at. Never decreases.
    pub last_claim: u64,
    /// Production per second (WAD) fixed at the last settlement. Accrual
    /// since `last_claim` is valued at this rate, not at the live catalog.
    pub rate: u128,
    /// Holdings per slot. Slots past the end are implicitly empty.
    pub tools: Vec<ToolHolding>,
    /// Aggregate level derived from `total_spent`.
    pub level: u32,
    pub power: u32,
    pub evolution: u32,
    /// Lifetime resource accrued (drives evolution eligibility).
    pub total_earned: u128,
    /// Lifetime resource spent on tools, upgrades and power.
    pub total_spent: u128,
}

impl Factory {
    pub fn new(now: u64) -> Self {
        Self {
            last_claim: now,
            ..Default::default()
        }
    }

    pub fn holding(&self, slot: u32) -> ToolHolding {
        self.tools.get(slot as usize).copied().unwrap_or_default()
    }

    /// Mutable holding for `slot`, growing the vector as needed.
    pub fn holding_mut(&mut self, slot: u32) -> &mut ToolHolding {
        let index = slot as usize;
        if self.tools.len() <= index {
            self.tools.resize(index + 1, ToolHolding::default());
        }
        &mut self.tools[index]
    }

    pub fn units(&self) -> u64 {
        self.tools.iter().map(|holding| holding.amount as u64).sum()
    }
}

impl Write for Factory {
    fn write(&self, writer: &mut impl BufMut) {
        self.last_claim.write(writer);
        self.rate.write(writer);
        self.tools.write(writer);
        self.level.write(writer);
        self.power.write(writer);
        self.evolution.write(writer);
        self.total_earned.write(writer);
        self.total_spent.write(writer);
    }
}

impl Read for Factory {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            last_claim: u64::read(reader)?,
            rate: u128::read(reader)?,
            tools: Vec::<ToolHolding>::read_range(reader, 0..=MAX_TOOLS)?,
            level: u32::read(reader)?,
            power: u32::read(reader)?,
            evolution: u32::read(reader)?,
            total_earned: u128::read(reader)?,
            total_spent: u128::read(reader)?,
        })
    }
}

impl EncodeSize for Factory {
    fn encode_size(&self) -> usize {
        self.last_claim.encode_size()
            + self.rate.encode_size()
            + self.tools.encode_size()
            + self.level.encode_size()
            + self.power.encode_size()
            + self.evolution.encode_size()
            + self.total_earned.encode_size()
            + self.total_spent.encode_size()
    }
}
