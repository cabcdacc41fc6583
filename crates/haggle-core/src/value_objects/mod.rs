//! Value objects - immutable domain primitives

mod amount;
mod snowflake;

pub use amount::{Amount, AmountError};
pub use snowflake::{Snowflake, SnowflakeGenerator, SnowflakeParseError};
