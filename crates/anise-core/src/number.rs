use std::cmp::Ordering;
use std::fmt;

use num_bigint::BigInt;
use num_traits::{Signed, Zero};

use crate::error::AniseError;

/// Integer payload: machine width by default, arbitrary precision once the
/// program switched to bigmath. Machine arithmetic is checked; overflow asks
/// the user to switch rather than wrapping silently.
#[derive(Clone, Debug)]
pub enum Number {
    Small(i64),
    Big(BigInt),
}

impl Number {
    pub fn parse(token: &str, big: bool) -> Option<Number> {
        let digits = token.strip_prefix(&['+', '-'][..]).unwrap_or(token);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if big {
            BigInt::parse_bytes(token.as_bytes(), 10).map(Number::Big)
        } else {
            token.parse::<i64>().ok().map(Number::Small)
        }
    }

    fn widen(&self) -> BigInt {
        match self {
            Number::Small(v) => BigInt::from(*v),
            Number::Big(v) => v.clone(),
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Number::Small(v) => *v == 0,
            Number::Big(v) => v.is_zero(),
        }
    }

    pub fn checked_add(&self, other: &Number) -> Result<Number, AniseError> {
        match (self, other) {
            (Number::Small(a), Number::Small(b)) => {
                a.checked_add(*b).map(Number::Small).ok_or_else(overflow)
            }
            _ => Ok(Number::Big(self.widen() + other.widen())),
        }
    }

    pub fn checked_sub(&self, other: &Number) -> Result<Number, AniseError> {
        match (self, other) {
            (Number::Small(a), Number::Small(b)) => {
                a.checked_sub(*b).map(Number::Small).ok_or_else(overflow)
            }
            _ => Ok(Number::Big(self.widen() - other.widen())),
        }
    }

    pub fn checked_mul(&self, other: &Number) -> Result<Number, AniseError> {
        match (self, other) {
            (Number::Small(a), Number::Small(b)) => {
                a.checked_mul(*b).map(Number::Small).ok_or_else(overflow)
            }
            _ => Ok(Number::Big(self.widen() * other.widen())),
        }
    }

    pub fn checked_div(&self, other: &Number) -> Result<Number, AniseError> {
        if other.is_zero() {
            return Err(AniseError::type_err("division by zero"));
        }
        match (self, other) {
            (Number::Small(a), Number::Small(b)) => {
                a.checked_div(*b).map(Number::Small).ok_or_else(overflow)
            }
            _ => Ok(Number::Big(self.widen() / other.widen())),
        }
    }

    pub fn checked_rem(&self, other: &Number) -> Result<Number, AniseError> {
        if other.is_zero() {
            return Err(AniseError::type_err("division by zero"));
        }
        match (self, other) {
            (Number::Small(a), Number::Small(b)) => {
                a.checked_rem(*b).map(Number::Small).ok_or_else(overflow)
            }
            _ => Ok(Number::Big(self.widen() % other.widen())),
        }
    }

    pub fn to_usize(&self) -> Option<usize> {
        match self {
            Number::Small(v) if *v >= 0 => Some(*v as usize),
            Number::Big(v) if !v.is_negative() => {
                use num_traits::ToPrimitive;
                v.to_usize()
            }
            _ => None,
        }
    }
}

fn overflow() -> AniseError {
    AniseError::type_err("integer overflow (switch to bigmath for arbitrary precision)")
}

impl PartialEq for Number {
    fn eq(&self, other: &Number) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Number {}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Number) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Number) -> Ordering {
        match (self, other) {
            (Number::Small(a), Number::Small(b)) => a.cmp(b),
            _ => self.widen().cmp(&other.widen()),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Small(v) => write!(f, "{}", v),
            Number::Big(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for Number {
    fn from(v: i64) -> Self {
        Number::Small(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_machine_and_big() {
        assert_eq!(Number::parse("42", false), Some(Number::Small(42)));
        assert_eq!(Number::parse("-7", false), Some(Number::Small(-7)));
        assert_eq!(Number::parse("abc", false), None);
        assert_eq!(Number::parse("1x2", false), None);
        assert_eq!(Number::parse("", false), None);
        assert_eq!(Number::parse("-", false), None);
        let big = Number::parse("123456789012345678901234567890", true).unwrap();
        assert_eq!(big.to_string(), "123456789012345678901234567890");
    }

    #[test]
    fn machine_overflow_is_an_error() {
        let max = Number::Small(i64::MAX);
        let one = Number::Small(1);
        assert!(max.checked_add(&one).is_err());
        assert_eq!(max.checked_sub(&one).unwrap(), Number::Small(i64::MAX - 1));
    }

    #[test]
    fn mixed_width_promotes() {
        let big = Number::parse("99999999999999999999", true).unwrap();
        let sum = big.checked_add(&Number::Small(1)).unwrap();
        assert_eq!(sum.to_string(), "100000000000000000000");
        assert!(Number::Small(5) < big);
    }

    #[test]
    fn division_by_zero() {
        assert!(Number::Small(1).checked_div(&Number::Small(0)).is_err());
        assert!(Number::Small(1).checked_rem(&Number::Small(0)).is_err());
        assert_eq!(
            Number::Small(7).checked_div(&Number::Small(2)).unwrap(),
            Number::Small(3)
        );
        assert_eq!(
            Number::Small(7).checked_rem(&Number::Small(2)).unwrap(),
            Number::Small(1)
        );
    }
}
