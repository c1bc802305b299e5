//! Line-item quantity type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// The quantity is zero.
    #[error("quantity must be at least 1")]
    Zero,
    /// The quantity exceeds the per-line maximum.
    #[error("quantity must be at most {max}")]
    TooLarge {
        /// Maximum allowed quantity.
        max: u32,
    },
    /// The input is not a whole number.
    #[error("quantity must be a whole number")]
    NotANumber,
}

/// Number of units of a product on a cart line.
///
/// ## Constraints
///
/// - Range: 1-999
///
/// ## Examples
///
/// ```
/// use cartsync_core::Quantity;
///
/// assert!(Quantity::new(1).is_ok());
/// assert!(Quantity::new(0).is_err());
/// assert_eq!(Quantity::ONE.get(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    /// Largest quantity accepted on a single line.
    pub const MAX: u32 = 999;

    /// A quantity of one unit.
    pub const ONE: Self = Self(1);

    /// Create a quantity, rejecting zero and values above [`Self::MAX`].
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is 0 or greater than 999.
    pub const fn new(value: u32) -> Result<Self, QuantityError> {
        if value == 0 {
            return Err(QuantityError::Zero);
        }
        if value > Self::MAX {
            return Err(QuantityError::TooLarge { max: Self::MAX });
        }
        Ok(Self(value))
    }

    /// Returns the number of units.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for Quantity {
    type Error = QuantityError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

impl std::str::FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<u32>()
            .map_err(|_| QuantityError::NotANumber)?;
        Self::new(value)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_bounds() {
        assert_eq!(Quantity::new(0), Err(QuantityError::Zero));
        assert_eq!(Quantity::new(1).unwrap().get(), 1);
        assert_eq!(Quantity::new(999).unwrap().get(), 999);
        assert_eq!(
            Quantity::new(1000),
            Err(QuantityError::TooLarge { max: 999 })
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!("3".parse::<Quantity>().unwrap().get(), 3);
        assert_eq!("x".parse::<Quantity>(), Err(QuantityError::NotANumber));
        assert_eq!("-1".parse::<Quantity>(), Err(QuantityError::NotANumber));
        assert_eq!("0".parse::<Quantity>(), Err(QuantityError::Zero));
    }

    #[test]
    fn test_deserialize_rejects_zero() {
        assert!(serde_json::from_str::<Quantity>("0").is_err());
        assert_eq!(serde_json::from_str::<Quantity>("2").unwrap().get(), 2);
    }

    #[test]
    fn test_default_is_one() {
        assert_eq!(Quantity::default(), Quantity::ONE);
    }
}
