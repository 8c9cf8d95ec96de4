use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error as CodecError, FixedSize, Read, ReadExt, ReadRangeExt, Write};

use super::{
    read_table, Error, DEFAULT_TOOL_GROWTH, DEFAULT_TOOL_MAX_AMOUNT, MAX_TABLE_LENGTH, MAX_TOOLS,
    WAD,
};

/// One purchasable production unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolDefinition {
    /// Price of the first unit (WAD).
    pub cost: u128,
    /// Resource produced per unit per second (WAD).
    pub yield_per_second: u128,
    /// Per-unit price growth factor (WAD, strictly above 1.0).
    pub growth: u128,
    pub max_amount: u32,
    /// Aggregate level required before the slot can be purchased.
    pub unlock_level: u32,
    /// Level table for this slot only. `None` falls back to [Catalog::upgrades].
    pub upgrades: Option<Schedule>,
}

impl ToolDefinition {
    pub fn new(cost: u128, yield_per_second: u128) -> Self {
        Self {
            cost,
            yield_per_second,
            growth: DEFAULT_TOOL_GROWTH,
            max_amount: DEFAULT_TOOL_MAX_AMOUNT,
            unlock_level: 0,
            upgrades: None,
        }
    }
}

impl Write for ToolDefinition {
    fn write(&self, writer: &mut impl BufMut) {
        self.cost.write(writer);
        self.yield_per_second.write(writer);
        self.growth.write(writer);
        self.max_amount.write(writer);
        self.unlock_level.write(writer);
        match &self.upgrades {
            Some(schedule) => {
                true.write(writer);
                schedule.write(writer);
            }
            None => false.write(writer),
        }
    }
}

impl Read for ToolDefinition {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, CodecError> {
        Ok(Self {
            cost: u128::read(reader)?,
            yield_per_second: u128::read(reader)?,
            growth: u128::read(reader)?,
            max_amount: u32::read(reader)?,
            unlock_level: u32::read(reader)?,
            upgrades: match bool::read(reader)? {
                true => Some(Schedule::read(reader)?),
                false => None,
            },
        })
    }
}

impl EncodeSize for ToolDefinition {
    fn encode_size(&self) -> usize {
        u128::SIZE * 3
            + u32::SIZE * 2
            + bool::SIZE
            + self.upgrades.as_ref().map_or(0, |schedule| schedule.encode_size())
    }
}

/// Parallel `(threshold, value)` arrays sorted ascending by threshold.
///
/// Used two ways: as a floor lookup keyed by some progress measure
/// (aggregate level from lifetime spend) and as an indexed tier table where
/// entry `i` holds the cost/requirement to reach tier `i` and the value in
/// effect while at tier `i`. Entry 0 is the base tier.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Schedule {
    pub thresholds: Vec<u128>,
    pub values: Vec<u128>,
}

impl Schedule {
    pub fn new(thresholds: Vec<u128>, values: Vec<u128>) -> Result<Self, Error> {
        if thresholds.is_empty() {
            return Err(Error::InvalidConfiguration("schedule must not be empty"));
        }
        validate_schedule(&thresholds, &values).map_err(Error::InvalidConfiguration)?;
        Ok(Self { thresholds, values })
    }

    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    /// Highest reachable tier index.
    pub fn max_tier(&self) -> u32 {
        self.len().saturating_sub(1) as u32
    }

    /// Value of the greatest threshold `<= input`, or `base` when `input` is
    /// below the first threshold.
    pub fn floor(&self, input: u128, base: u128) -> u128 {
        let index = self.thresholds.partition_point(|threshold| *threshold <= input);
        match index {
            0 => base,
            i => self.values[i - 1],
        }
    }

    /// Cost or requirement to enter `tier`.
    pub fn threshold(&self, tier: u32) -> Option<u128> {
        self.thresholds.get(tier as usize).copied()
    }

    /// Value in effect at `tier`. Tiers past the end of a shrunken table keep
    /// the last value; an empty table is neutral.
    pub fn multiplier(&self, tier: u32) -> u128 {
        match self.values.get(tier as usize) {
            Some(value) => *value,
            None => self.values.last().copied().unwrap_or(WAD),
        }
    }
}

/// Shape checks shared by configuration and decoding. An empty schedule is
/// the unconfigured default and passes.
fn validate_schedule(thresholds: &[u128], values: &[u128]) -> Result<(), &'static str> {
    if thresholds.len() != values.len() {
        return Err("schedule arrays differ in length");
    }
    if thresholds.len() > MAX_TABLE_LENGTH {
        return Err("schedule too long");
    }
    if !is_non_decreasing(thresholds) {
        return Err("thresholds must be ascending");
    }
    if !is_non_decreasing(values) {
        return Err("values must be non-decreasing");
    }
    Ok(())
}

fn is_non_decreasing(values: &[u128]) -> bool {
    values.windows(2).all(|pair| pair[0] <= pair[1])
}

impl Write for Schedule {
    fn write(&self, writer: &mut impl BufMut) {
        self.thresholds.write(writer);
        self.values.write(writer);
    }
}

impl Read for Schedule {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, CodecError> {
        let thresholds = read_table(reader)?;
        let values = read_table(reader)?;
        validate_schedule(&thresholds, &values)
            .map_err(|reason| CodecError::Invalid("Schedule", reason))?;
        Ok(Self { thresholds, values })
    }
}

impl EncodeSize for Schedule {
    fn encode_size(&self) -> usize {
        self.thresholds.encode_size() + self.values.encode_size()
    }
}

/// How tool holdings are rebased when a factory evolves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EvolutionMode {
    /// Holdings are untouched; only the evolution multiplier changes.
    #[default]
    Keep = 0,
    /// Owned amounts are halved (rounded down); levels are kept.
    Halve = 1,
    /// Owned amounts and levels are zeroed.
    Reset = 2,
}

impl Write for EvolutionMode {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for EvolutionMode {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, CodecError> {
        let value = u8::read(reader)?;
        match value {
            0 => Ok(Self::Keep),
            1 => Ok(Self::Halve),
            2 => Ok(Self::Reset),
            i => Err(CodecError::InvalidEnum(i)),
        }
    }
}

impl FixedSize for EvolutionMode {
    const SIZE: usize = 1;
}

/// Which part of the catalog an admin instruction replaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum CatalogSection {
    Tools = 0,
    Multipliers = 1,
    Upgrades = 2,
    Levels = 3,
    Power = 4,
    Evolution = 5,
    MaxAmounts = 6,
    Growth = 7,
    Unlocks = 8,
    SlotUpgrades = 9,
}

impl Write for CatalogSection {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for CatalogSection {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, CodecError> {
        let value = u8::read(reader)?;
        match value {
            0 => Ok(Self::Tools),
            1 => Ok(Self::Multipliers),
            2 => Ok(Self::Upgrades),
            3 => Ok(Self::Levels),
            4 => Ok(Self::Power),
            5 => Ok(Self::Evolution),
            6 => Ok(Self::MaxAmounts),
            7 => Ok(Self::Growth),
            8 => Ok(Self::Unlocks),
            9 => Ok(Self::SlotUpgrades),
            i => Err(CodecError::InvalidEnum(i)),
        }
    }
}

impl FixedSize for CatalogSection {
    const SIZE: usize = 1;
}

/// Global admin-configured game tables.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    pub tools: Vec<ToolDefinition>,
    /// Purchase-cost curve indexed by units already owned (WAD).
    pub multipliers: Vec<u128>,
    /// Default per-tool level table: threshold = upgrade cost as a multiple
    /// of the tool's base cost, value = yield multiplier. Slots with their own
    /// table ignore it.
    pub upgrades: Schedule,
    /// Aggregate level keyed by lifetime spend in whole resource units.
    pub levels: Schedule,
    /// Power tiers: threshold = cost, value = rate multiplier.
    pub power: Schedule,
    /// Evolution tiers: threshold = lifetime earnings required, value = rate multiplier.
    pub evolution: Schedule,
    pub evolution_mode: EvolutionMode,
}

impl Catalog {
    pub fn tool(&self, slot: u32) -> Result<&ToolDefinition, Error> {
        self.tools
            .get(slot as usize)
            .ok_or(Error::ToolDoesNotExist(slot))
    }

    /// Level table in effect for `tool`.
    pub fn upgrades_of<'a>(&'a self, tool: &'a ToolDefinition) -> &'a Schedule {
        tool.upgrades.as_ref().unwrap_or(&self.upgrades)
    }

    /// Replace the tool array wholesale. Slots that survive keep their
    /// growth, cap, unlock and level settings; new slots get defaults.
    pub fn set_tools(&mut self, costs: &[u128], yields: &[u128]) -> Result<(), Error> {
        if costs.is_empty() {
            return Err(Error::InvalidConfiguration("tool table must not be empty"));
        }
        if costs.len() != yields.len() {
            return Err(Error::InvalidConfiguration("tool arrays differ in length"));
        }
        if costs.len() > MAX_TOOLS {
            return Err(Error::InvalidConfiguration("too many tools"));
        }
        if costs.iter().any(|cost| *cost == 0) {
            return Err(Error::InvalidConfiguration("tool cost must be positive"));
        }
        self.tools = costs
            .iter()
            .zip(yields)
            .enumerate()
            .map(|(slot, (cost, yield_per_second))| match self.tools.get(slot) {
                Some(existing) => ToolDefinition {
                    cost: *cost,
                    yield_per_second: *yield_per_second,
                    ..existing.clone()
                },
                None => ToolDefinition::new(*cost, *yield_per_second),
            })
            .collect();
        Ok(())
    }

    pub fn set_multipliers(&mut self, multipliers: Vec<u128>) -> Result<(), Error> {
        if multipliers.is_empty() || multipliers.len() > MAX_TABLE_LENGTH {
            return Err(Error::InvalidConfiguration("multiplier table length"));
        }
        if multipliers[0] == 0 {
            return Err(Error::InvalidConfiguration("multipliers must be positive"));
        }
        if !is_non_decreasing(&multipliers) {
            return Err(Error::InvalidConfiguration("multipliers must be non-decreasing"));
        }
        self.multipliers = multipliers;
        Ok(())
    }

    pub fn set_max_amounts(&mut self, amounts: &[u32]) -> Result<(), Error> {
        self.ensure_per_slot(amounts.len())?;
        for (tool, amount) in self.tools.iter_mut().zip(amounts) {
            tool.max_amount = *amount;
        }
        Ok(())
    }

    pub fn set_growths(&mut self, growths: &[u128]) -> Result<(), Error> {
        self.ensure_per_slot(growths.len())?;
        if growths.iter().any(|growth| *growth <= WAD) {
            return Err(Error::InvalidConfiguration("growth must exceed 1.0"));
        }
        for (tool, growth) in self.tools.iter_mut().zip(growths) {
            tool.growth = *growth;
        }
        Ok(())
    }

    pub fn set_unlocks(&mut self, levels: &[u32]) -> Result<(), Error> {
        self.ensure_per_slot(levels.len())?;
        for (tool, level) in self.tools.iter_mut().zip(levels) {
            tool.unlock_level = *level;
        }
        Ok(())
    }

    /// Give `slot` its own level table, or drop back to the default with `None`.
    pub fn set_slot_upgrades(&mut self, slot: u32, upgrades: Option<Schedule>) -> Result<(), Error> {
        let tool = self
            .tools
            .get_mut(slot as usize)
            .ok_or(Error::ToolDoesNotExist(slot))?;
        tool.upgrades = upgrades;
        Ok(())
    }

    fn ensure_per_slot(&self, len: usize) -> Result<(), Error> {
        if len == 0 || len != self.tools.len() {
            return Err(Error::InvalidConfiguration(
                "per-slot table must match the tool count",
            ));
        }
        Ok(())
    }
}

impl Write for Catalog {
    fn write(&self, writer: &mut impl BufMut) {
        self.tools.write(writer);
        self.multipliers.write(writer);
        self.upgrades.write(writer);
        self.levels.write(writer);
        self.power.write(writer);
        self.evolution.write(writer);
        self.evolution_mode.write(writer);
    }
}

impl Read for Catalog {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, CodecError> {
        Ok(Self {
            tools: Vec::<ToolDefinition>::read_range(reader, 0..=MAX_TOOLS)?,
            multipliers: read_table(reader)?,
            upgrades: Schedule::read(reader)?,
            levels: Schedule::read(reader)?,
            power: Schedule::read(reader)?,
            evolution: Schedule::read(reader)?,
            evolution_mode: EvolutionMode::read(reader)?,
        })
    }
}

impl EncodeSize for Catalog {
    fn encode_size(&self) -> usize {
        self.tools.encode_size()
            + self.multipliers.encode_size()
            + self.upgrades.encode_size()
            + self.levels.encode_size()
            + self.power.encode_size()
            + self.evolution.encode_size()
            + self.evolution_mode.encode_size()
    }
}
