//! Decimal release version numbers.
//!
//! Release versions are decimals, not semantic versions: `10.04` and `10.040`
//! are the same version, `7` and `7.0` are the same version, and `12.10` sorts
//! after `12.04`.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use thiserror::Error;

/// Maximum number of fractional digits accepted when parsing.
const MAX_FRACTION_DIGITS: u8 = 9;

/// Error returned when a string isn't a decimal version number.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid release version {0:?}")]
pub struct ParseVersionError(pub String);

/// A decimal release version such as `10.04`, `5.0` or `12`.
///
/// Equality, ordering and hashing use the numeric value; the number of
/// fractional digits as written is kept only for display.
#[derive(Debug, Clone, Copy)]
pub struct ReleaseVersion {
    whole: u32,
    // Fractional part with trailing zeros removed, `scale` digits wide
    fraction: u32,
    scale: u8,
    // Fractional digits as written (`5.0` has precision 1)
    precision: u8,
}

impl ReleaseVersion {
    /// Builds a version from its parts, e.g. `from_parts(12, 4, 2)` is `12.04`.
    pub const fn from_parts(whole: u32, fraction: u32, digits: u8) -> Self {
        let mut fraction = fraction;
        let mut scale = digits;
        while scale > 0 && fraction % 10 == 0 {
            fraction /= 10;
            scale -= 1;
        }
        ReleaseVersion {
            whole,
            fraction,
            scale,
            precision: digits,
        }
    }

    fn scaled_fraction(&self, scale: u8) -> u64 {
        u64::from(self.fraction) * 10u64.pow(u32::from(scale - self.scale))
    }
}

impl FromStr for ReleaseVersion {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let err = || ParseVersionError(s.to_string());

        let (whole, fraction) = match text.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (text, None),
        };
        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }
        let whole: u32 = whole.parse().map_err(|_| err())?;

        match fraction {
            None => Ok(ReleaseVersion::from_parts(whole, 0, 0)),
            Some(digits) => {
                if digits.is_empty()
                    || digits.len() > usize::from(MAX_FRACTION_DIGITS)
                    || !digits.bytes().all(|b| b.is_ascii_digit())
                {
                    return Err(err());
                }
                let value: u32 = digits.parse().map_err(|_| err())?;
                // Length was checked against MAX_FRACTION_DIGITS above
                Ok(ReleaseVersion::from_parts(whole, value, digits.len() as u8))
            }
        }
    }
}

impl PartialEq for ReleaseVersion {
    fn eq(&self, other: &Self) -> bool {
        self.whole == other.whole && self.fraction == other.fraction && self.scale == other.scale
    }
}

impl Eq for ReleaseVersion {}

impl Hash for ReleaseVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.whole.hash(state);
        self.fraction.hash(state);
        self.scale.hash(state);
    }
}

impl Ord for ReleaseVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let scale = self.scale.max(other.scale);
        self.whole
            .cmp(&other.whole)
            .then_with(|| self.scaled_fraction(scale).cmp(&other.scaled_fraction(scale)))
    }
}

impl PartialOrd for ReleaseVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.whole)?;
        if self.precision > 0 {
            let mut digits = if self.scale > 0 {
                format!("{:0width$}", self.fraction, width = usize::from(self.scale))
            } else {
                String::new()
            };
            while digits.len() < usize::from(self.precision) {
                digits.push('0');
            }
            write!(f, ".{}", digits)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> ReleaseVersion {
        s.parse().expect("valid version in test")
    }

    #[test]
    fn test_decimal_equality() {
        assert_eq!(v("10.04"), v("10.040"));
        assert_eq!(v("7"), v("7.0"));
        assert_ne!(v("10.4"), v("10.04"));
        assert_ne!(v("10"), v("10.04"));
    }

    #[test]
    fn test_numeric_ordering() {
        assert!(v("12.04") < v("12.10"));
        assert!(v("9.10") < v("10.04"));
        assert!(v("0.4") < v("5.0"));
        assert!(v("5.1") > v("5.0"));
        assert!(v("12.1") > v("12.04"));
        assert_eq!(v("12.04").cmp(&v("12.040")), Ordering::Equal);
    }

    #[test]
    fn test_display_keeps_written_precision() {
        assert_eq!(v("10.04").to_string(), "10.04");
        assert_eq!(v("5.0").to_string(), "5.0");
        assert_eq!(v("12").to_string(), "12");
        assert_eq!(v("12.10").to_string(), "12.10");
        assert_eq!(ReleaseVersion::from_parts(12, 4, 2).to_string(), "12.04");
    }

    #[test]
    fn test_rejects_non_decimal_input() {
        for input in ["", "lucid", "10.", ".04", "1.2.3", "-1", "10.04a", "1.0123456789"] {
            assert!(
                input.parse::<ReleaseVersion>().is_err(),
                "{:?} should not parse",
                input
            );
        }
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert_eq!(v(" 18.04 "), v("18.04"));
    }

    #[test]
    fn test_hash_consistent_with_eq() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(v("7"));
        assert!(set.contains(&v("7.00")));
    }
}
