/// Fixed-point scale for every amount, price, yield and multiplier (18 decimals).
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// Basis-point denominator for distribution splits.
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Maximum number of tool slots in the catalog
pub const MAX_TOOLS: usize = 64;

/// Maximum entries in any catalog table (cost curve, upgrades, levels, power, evolution)
pub const MAX_TABLE_LENGTH: usize = 512;

/// Maximum length of a click message
pub const MAX_MESSAGE_LENGTH: usize = 256;

/// Maximum length of an error message carried in an event
pub const MAX_ERROR_MESSAGE_LENGTH: usize = 256;

/// Capacity of the action queue ring buffer
pub const QUEUE_CAPACITY: u64 = 256;

/// Maximum entries returned by a single queue fragment read
pub const MAX_QUEUE_FRAGMENT: u64 = 100;

/// Growth factor assigned to tool slots that have not been configured (1.15)
pub const DEFAULT_TOOL_GROWTH: u128 = 1_150_000_000_000_000_000;

/// Supply cap assigned to tool slots that have not been configured
pub const DEFAULT_TOOL_MAX_AMOUNT: u32 = 1_000;

// Auction defaults applied the first time the auction record is touched.
pub const DEFAULT_INITIAL_PRICE: u128 = WAD / 100;
pub const DEFAULT_FLOOR_PRICE: u128 = WAD / 1_000;
pub const DEFAULT_INCREASE_STEP: u128 = WAD / 1_000;
pub const DEFAULT_DECAY_PER_SECOND: u128 = WAD / 1_000_000;
pub const DEFAULT_PASS_PRICE: u128 = WAD;

/// Minimum resource minted to the clicker on a successful click
pub const CLICK_BASE_REWARD: u128 = WAD;

/// Error codes for Error events
pub const ERROR_NOT_AUTHORIZED: u8 = 1;
pub const ERROR_NOT_OWNER: u8 = 2;
pub const ERROR_PASS_NOT_FOUND: u8 = 3;
pub const ERROR_INVALID_CONFIGURATION: u8 = 4;
pub const ERROR_TOOL_DOES_NOT_EXIST: u8 = 5;
pub const ERROR_INVALID_QUANTITY: u8 = 6;
pub const ERROR_TOOL_LOCKED: u8 = 7;
pub const ERROR_AMOUNT_MAXED: u8 = 8;
pub const ERROR_LEVEL_MAXED: u8 = 9;
pub const ERROR_POWER_MAXED: u8 = 10;
pub const ERROR_EVOLUTION_MAXED: u8 = 11;
pub const ERROR_EVOLUTION_LOCKED: u8 = 12;
pub const ERROR_INSUFFICIENT_BALANCE: u8 = 13;
pub const ERROR_EPOCH_ID_MISMATCH: u8 = 14;
pub const ERROR_DEADLINE_EXPIRED: u8 = 15;
pub const ERROR_EXCEEDS_MAX_PAYMENT: u8 = 16;
pub const ERROR_INVALID_PAYMENT: u8 = 17;
pub const ERROR_EMPTY_POOL: u8 = 18;
pub const ERROR_NOT_CONFIGURED: u8 = 19;
pub const ERROR_OVERFLOW: u8 = 20;
pub const ERROR_MESSAGE_TOO_LONG: u8 = 21;
