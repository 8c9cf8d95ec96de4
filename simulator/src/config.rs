//! YAML configuration for a local simulator and the genesis instructions it
//! expands to.
//!
//! Token amounts and multipliers are written as decimal strings (`"1.15"`,
//! `"0.001"`) and scaled to 18 decimals, so a config reads the way a
//! deployment script would.

use clickfarm_types::{
    execution::Instruction,
    factory::{Asset, EvolutionMode, DEFAULT_TOOL_GROWTH, DEFAULT_TOOL_MAX_AMOUNT},
};
use commonware_codec::DecodeExt;
use commonware_cryptography::{
    ed25519::{PrivateKey, PublicKey},
    Signer,
};
use commonware_utils::from_hex_formatted;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use tracing::Level;

/// Decimal places of every token amount and WAD multiplier.
pub const DECIMALS: u32 = 18;

#[derive(Deserialize, Serialize)]
pub struct Config {
    /// Hex-encoded ed25519 private key of the configuration authority.
    pub admin_key: String,
    pub port: u16,
    pub log_level: String,

    pub tools: Vec<ToolConfig>,
    /// Purchase-cost curve indexed by units owned.
    #[serde(default)]
    pub multipliers: Vec<String>,
    #[serde(default)]
    pub upgrades: Option<ScheduleConfig>,
    #[serde(default)]
    pub levels: Option<LevelsConfig>,
    #[serde(default)]
    pub power: Option<ScheduleConfig>,
    #[serde(default)]
    pub evolution: Option<EvolutionConfig>,
    pub auction: AuctionConfig,
    #[serde(default)]
    pub distribution: Option<DistributionConfig>,
    /// Balances granted at genesis.
    #[serde(default)]
    pub faucet: Vec<FaucetConfig>,
}

#[derive(Deserialize, Serialize)]
pub struct ToolConfig {
    pub cost: String,
    pub yield_per_second: String,
    #[serde(default)]
    pub growth: Option<String>,
    #[serde(default)]
    pub max_amount: Option<u32>,
    #[serde(default)]
    pub unlock_level: Option<u32>,
    /// Level table for this tool only; omitted tools use `upgrades`.
    #[serde(default)]
    pub upgrades: Option<ScheduleConfig>,
}

#[derive(Deserialize, Serialize)]
pub struct ScheduleConfig {
    pub thresholds: Vec<String>,
    pub values: Vec<String>,
}

/// Aggregate level table. Thresholds are whole resource units, values are levels.
#[derive(Deserialize, Serialize)]
pub struct LevelsConfig {
    pub thresholds: Vec<u64>,
    pub values: Vec<u64>,
}

#[derive(Deserialize, Serialize, Default, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum EvolutionModeConfig {
    #[default]
    Keep,
    Halve,
    Reset,
}

impl From<EvolutionModeConfig> for EvolutionMode {
    fn from(mode: EvolutionModeConfig) -> Self {
        match mode {
            EvolutionModeConfig::Keep => EvolutionMode::Keep,
            EvolutionModeConfig::Halve => EvolutionMode::Halve,
            EvolutionModeConfig::Reset => EvolutionMode::Reset,
        }
    }
}

#[derive(Deserialize, Serialize)]
pub struct EvolutionConfig {
    pub thresholds: Vec<String>,
    pub values: Vec<String>,
    #[serde(default)]
    pub mode: EvolutionModeConfig,
}

#[derive(Deserialize, Serialize)]
pub struct AuctionConfig {
    pub floor_price: String,
    pub increase_step: String,
    pub decay_per_second: String,
    /// Omitted for an unbounded price.
    #[serde(default)]
    pub max_price: Option<String>,
    pub pass_price: String,
}

#[derive(Deserialize, Serialize)]
pub struct DistributionConfig {
    pub treasury: String,
    pub developer: String,
    pub rewards: String,
    pub treasury_bps: u16,
    pub developer_bps: u16,
}

#[derive(Deserialize, Serialize)]
pub struct FaucetConfig {
    pub account: String,
    #[serde(default)]
    pub settlement: Option<String>,
    #[serde(default)]
    pub resource: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be hex: {value}")]
    InvalidHex { field: &'static str, value: String },
    #[error("{field} is invalid: {value}")]
    InvalidDecode {
        field: &'static str,
        value: String,
        #[source]
        source: commonware_codec::Error,
    },
    #[error("invalid log level: {value}")]
    InvalidLogLevel { value: String },
    #[error("{field} is not a decimal amount: {value}")]
    InvalidAmount { field: &'static str, value: String },
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    #[error("genesis instruction rejected (code {code}): {message}")]
    GenesisRejected { code: u8, message: String },
}

pub struct ValidatedConfig {
    pub signer: PrivateKey,
    pub authority: PublicKey,
    pub port: u16,
    pub log_level: Level,
    /// Authority instructions applied, in order, before serving.
    pub genesis: Vec<Instruction>,
}

/// Parse a decimal string such as `"1.15"` into an integer scaled by
/// `10^decimals`. Underscores are ignored. Fails on excess precision or overflow.
pub fn parse_units(value: &str, decimals: u32) -> Option<u128> {
    let value: String = value.trim().chars().filter(|c| *c != '_').collect();
    let (whole, fraction) = value.split_once('.').unwrap_or((&value, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if fraction.len() > decimals as usize {
        return None;
    }
    let is_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !is_digits(whole) || !is_digits(fraction) {
        return None;
    }

    let scale = 10u128.checked_pow(decimals)?;
    let whole = match whole {
        "" => 0,
        digits => digits.parse::<u128>().ok()?,
    };
    let fraction = match fraction {
        "" => 0,
        digits => {
            let padding = 10u128.checked_pow(decimals - digits.len() as u32)?;
            digits.parse::<u128>().ok()?.checked_mul(padding)?
        }
    };
    whole.checked_mul(scale)?.checked_add(fraction)
}

fn amount(field: &'static str, value: &str) -> Result<u128, ConfigError> {
    parse_units(value, DECIMALS).ok_or_else(|| ConfigError::InvalidAmount {
        field,
        value: value.to_string(),
    })
}

fn amounts(field: &'static str, values: &[String]) -> Result<Vec<u128>, ConfigError> {
    values.iter().map(|value| amount(field, value)).collect()
}

fn decode_hex<T: DecodeExt<()>>(field: &'static str, value: &str) -> Result<T, ConfigError> {
    let bytes = from_hex_formatted(value).ok_or(ConfigError::InvalidHex {
        field,
        value: value.to_string(),
    })?;
    T::decode(bytes.as_ref()).map_err(|source| ConfigError::InvalidDecode {
        field,
        value: value.to_string(),
        source,
    })
}

impl Config {
    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        let signer: PrivateKey = decode_hex("admin_key", &self.admin_key)?;
        let authority = signer.public_key();
        let log_level =
            Level::from_str(&self.log_level).map_err(|_| ConfigError::InvalidLogLevel {
                value: self.log_level.clone(),
            })?;
        let genesis = self.genesis()?;

        Ok(ValidatedConfig {
            signer,
            authority,
            port: self.port,
            log_level,
            genesis,
        })
    }

    fn genesis(&self) -> Result<Vec<Instruction>, ConfigError> {
        if self.tools.is_empty() {
            return Err(ConfigError::Empty { field: "tools" });
        }
        let mut genesis = vec![Instruction::SetTools {
            costs: self
                .tools
                .iter()
                .map(|tool| amount("tools.cost", &tool.cost))
                .collect::<Result<_, _>>()?,
            yields: self
                .tools
                .iter()
                .map(|tool| amount("tools.yield_per_second", &tool.yield_per_second))
                .collect::<Result<_, _>>()?,
        }];

        // Per-slot overrides are only sent when at least one tool sets them.
        if self.tools.iter().any(|tool| tool.max_amount.is_some()) {
            genesis.push(Instruction::SetToolMaxAmount {
                amounts: self
                    .tools
                    .iter()
                    .map(|tool| tool.max_amount.unwrap_or(DEFAULT_TOOL_MAX_AMOUNT))
                    .collect(),
            });
        }
        if self.tools.iter().any(|tool| tool.growth.is_some()) {
            genesis.push(Instruction::SetToolGrowth {
                growths: self
                    .tools
                    .iter()
                    .map(|tool| match &tool.growth {
                        Some(growth) => amount("tools.growth", growth),
                        None => Ok(DEFAULT_TOOL_GROWTH),
                    })
                    .collect::<Result<_, _>>()?,
            });
        }
        if self.tools.iter().any(|tool| tool.unlock_level.is_some()) {
            genesis.push(Instruction::SetToolUnlocks {
                levels: self
                    .tools
                    .iter()
                    .map(|tool| tool.unlock_level.unwrap_or_default())
                    .collect(),
            });
        }
        for (slot, tool) in (0u32..).zip(&self.tools) {
            let Some(upgrades) = &tool.upgrades else {
                continue;
            };
            genesis.push(Instruction::SetToolUpgradeSchedule {
                slot,
                costs: amounts("tools.upgrades.thresholds", &upgrades.thresholds)?,
                multipliers: amounts("tools.upgrades.values", &upgrades.values)?,
            });
        }
        if !self.multipliers.is_empty() {
            genesis.push(Instruction::SetToolMultipliers {
                multipliers: amounts("multipliers", &self.multipliers)?,
            });
        }
        if let Some(upgrades) = &self.upgrades {
            genesis.push(Instruction::SetToolUpgrades {
                costs: amounts("upgrades.thresholds", &upgrades.thresholds)?,
                multipliers: amounts("upgrades.values", &upgrades.values)?,
            });
        }
        if let Some(levels) = &self.levels {
            genesis.push(Instruction::SetLevels {
                thresholds: levels.thresholds.iter().map(|t| *t as u128).collect(),
                values: levels.values.iter().map(|v| *v as u128).collect(),
            });
        }
        if let Some(power) = &self.power {
            genesis.push(Instruction::SetPower {
                costs: amounts("power.thresholds", &power.thresholds)?,
                multipliers: amounts("power.values", &power.values)?,
            });
        }
        if let Some(evolution) = &self.evolution {
            genesis.push(Instruction::SetEvolution {
                thresholds: amounts("evolution.thresholds", &evolution.thresholds)?,
                multipliers: amounts("evolution.values", &evolution.values)?,
                mode: evolution.mode.into(),
            });
        }

        let auction = &self.auction;
        genesis.push(Instruction::ConfigureAuction {
            floor_price: amount("auction.floor_price", &auction.floor_price)?,
            increase_step: amount("auction.increase_step", &auction.increase_step)?,
            decay_per_second: amount("auction.decay_per_second", &auction.decay_per_second)?,
            max_price: match &auction.max_price {
                Some(max_price) => amount("auction.max_price", max_price)?,
                None => 0,
            },
            pass_price: amount("auction.pass_price", &auction.pass_price)?,
        });

        if let Some(distribution) = &self.distribution {
            genesis.push(Instruction::ConfigureDistribution {
                treasury: decode_hex("distribution.treasury", &distribution.treasury)?,
                developer: decode_hex("distribution.developer", &distribution.developer)?,
                rewards: decode_hex("distribution.rewards", &distribution.rewards)?,
                treasury_bps: distribution.treasury_bps,
                developer_bps: distribution.developer_bps,
            });
        }

        for grant in &self.faucet {
            let account: PublicKey = decode_hex("faucet.account", &grant.account)?;
            let balances = [
                (Asset::Settlement, &grant.settlement),
                (Asset::Resource, &grant.resource),
            ];
            for (asset, value) in balances {
                let Some(value) = value else {
                    continue;
                };
                genesis.push(Instruction::Fund {
                    asset,
                    account: account.clone(),
                    amount: amount("faucet", value)?,
                });
            }
        }

        Ok(genesis)
    }
}
