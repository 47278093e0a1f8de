//! Decimal newtypes for prices, amounts and costs.
//!
//! Keeping the three apart lets the compiler catch a price being used as
//! a quantity. Multiplying a [`Price`] by an [`Amount`] yields a [`Cost`].
//!
//! ```rust
//! use coinbridge_core::types::{Amount, Price};
//! use rust_decimal_macros::dec;
//!
//! let cost = Price::new(dec!(50000)) * Amount::new(dec!(0.1));
//! assert_eq!(cost.as_decimal(), dec!(5000.0));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};
use std::str::FromStr;

macro_rules! decimal_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub Decimal);

        impl $name {
            /// Wraps a decimal.
            #[inline]
            pub fn new(value: Decimal) -> Self {
                Self(value)
            }

            /// Inner decimal.
            #[inline]
            pub fn as_decimal(&self) -> Decimal {
                self.0
            }

            /// Whether the value is zero.
            #[inline]
            pub fn is_zero(&self) -> bool {
                self.0.is_zero()
            }

            /// Absolute value.
            #[inline]
            #[must_use]
            pub fn abs(&self) -> Self {
                Self(self.0.abs())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Decimal> for $name {
            fn from(value: Decimal) -> Self {
                Self(value)
            }
        }

        impl From<$name> for Decimal {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl FromStr for $name {
            type Err = rust_decimal::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Decimal::from_str(s)
                    .or_else(|_| Decimal::from_scientific(s))
                    .map(Self)
            }
        }

        impl Add for $name {
            type Output = Self;

            fn add(self, rhs: Self) -> Self {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $name {
            type Output = Self;

            fn sub(self, rhs: Self) -> Self {
                Self(self.0 - rhs.0)
            }
        }

        impl std::iter::Sum for $name {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                Self(iter.map(|v| v.0).sum())
            }
        }
    };
}

decimal_newtype!(
    /// Price of one unit of base currency in quote currency.
    Price
);
decimal_newtype!(
    /// Quantity of base currency (or contracts).
    Amount
);
decimal_newtype!(
    /// Value in quote currency.
    Cost
);

impl Mul<Amount> for Price {
    type Output = Cost;

    fn mul(self, rhs: Amount) -> Cost {
        Cost(self.0 * rhs.0)
    }
}

impl Mul<Price> for Amount {
    type Output = Cost;

    fn mul(self, rhs: Price) -> Cost {
        Cost(self.0 * rhs.0)
    }
}

impl Cost {
    /// Average price for this cost over `amount`, `None` if `amount` is zero.
    pub fn checked_div_amount(self, amount: Amount) -> Option<Price> {
        self.0.checked_div(amount.0).map(Price)
    }
}

impl Div<Amount> for Cost {
    type Output = Price;

    fn div(self, rhs: Amount) -> Price {
        Price(self.0 / rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_times_amount() {
        let cost = Price::new(dec!(100.5)) * Amount::new(dec!(2));
        assert_eq!(cost, Cost::new(dec!(201.0)));
        assert_eq!(Amount::new(dec!(2)) * Price::new(dec!(3)), Cost::new(dec!(6)));
    }

    #[test]
    fn test_cost_div_amount() {
        let price = Cost::new(dec!(10)) / Amount::new(dec!(4));
        assert_eq!(price, Price::new(dec!(2.5)));
        assert_eq!(Cost::new(dec!(10)).checked_div_amount(Amount::default()), None);
    }

    #[test]
    fn test_from_str_scientific() {
        assert_eq!("0.001".parse::<Amount>().unwrap(), Amount::new(dec!(0.001)));
        assert_eq!("1e-3".parse::<Amount>().unwrap(), Amount::new(dec!(0.001)));
        assert!("abc".parse::<Price>().is_err());
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&Price::new(dec!(1.25))).unwrap();
        assert_eq!(json, "\"1.25\"");
    }

    #[test]
    fn test_sum() {
        let total: Amount = [dec!(1), dec!(2.5)].into_iter().map(Amount::new).sum();
        assert_eq!(total, Amount::new(dec!(3.5)));
    }
}
