//! Offer amount - positive money value in minor currency units
//!
//! Stored as integral cents to keep offer comparison exact; the offer state
//! machine never touches floating point.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A strictly positive money amount in minor units (cents)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    /// Create an amount from minor units, rejecting zero and negatives
    pub fn from_minor(minor: i64) -> Result<Self, AmountError> {
        if minor <= 0 {
            return Err(AmountError::NotPositive(minor));
        }
        Ok(Self(minor))
    }

    /// Get the raw minor-unit value
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Major/minor split for display (e.g. `(12, 50)` for 12.50)
    pub const fn split(&self) -> (i64, i64) {
        (self.0 / 100, self.0 % 100)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (major, minor) = self.split();
        write!(f, "{major}.{minor:02}")
    }
}

/// Error constructing an [`Amount`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("amount must be positive, got {0}")]
    NotPositive(i64),
}
