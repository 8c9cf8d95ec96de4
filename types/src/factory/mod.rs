mod auction;
mod catalog;
mod codec;
mod constants;
mod error;
mod player;

pub use auction::*;
pub use catalog::*;
pub use codec::{read_slots, read_string, read_table, string_encode_size, write_string};
pub use constants::*;
pub use error::Error;
pub use player::*;

#[cfg(test)]
mod tests;
