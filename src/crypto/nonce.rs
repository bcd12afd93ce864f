//! 256-bit salt nonce passed to SafeProxyFactory.createProxyWithNonce.

use std::fmt;
use std::str::FromStr;

use rand::RngCore;

use super::keccak256;

/// Label mixed into freshly drawn search seeds.
const SEED_LABEL: &[u8] = b"multisafe";

/// Unsigned 256-bit integer, big-endian.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SaltNonce(pub [u8; 32]);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NonceError {
    #[error("salt nonce is empty")]
    Empty,
    #[error("salt nonce contains invalid digit {0:?}")]
    InvalidDigit(char),
    #[error("salt nonce does not fit in 256 bits")]
    Overflow,
}

impl SaltNonce {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn from_u64(n: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&n.to_be_bytes());
        Self(bytes)
    }

    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Uniformly random nonce.
    pub fn random() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// keccak256(label || random32): the seed drawn after a rejected probe.
    pub fn random_seed() -> Self {
        let mut preimage = [0u8; SEED_LABEL.len() + 32];
        preimage[..SEED_LABEL.len()].copy_from_slice(SEED_LABEL);
        rand::thread_rng().fill_bytes(&mut preimage[SEED_LABEL.len()..]);
        Self(keccak256(&preimage))
    }

    /// Increment as a 256-bit big-endian counter (with wrapping).
    #[inline]
    pub fn increment(&mut self) {
        for byte in self.0.iter_mut().rev() {
            let (val, overflow) = byte.overflowing_add(1);
            *byte = val;
            if !overflow {
                return;
            }
        }
    }

    /// Hex without 0x, 64 chars.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Decimal string, the form the Safe SDK and deep links use.
    pub fn to_decimal(&self) -> String {
        let Some(start) = self.0.iter().position(|&b| b != 0) else {
            return "0".to_string();
        };

        // Least significant digit first.
        let mut digits: Vec<u8> = vec![0];
        for &byte in &self.0[start..] {
            let mut carry = byte as u32;
            for d in digits.iter_mut() {
                let val = (*d as u32) * 256 + carry;
                *d = (val % 10) as u8;
                carry = val / 10;
            }
            while carry > 0 {
                digits.push((carry % 10) as u8);
                carry /= 10;
            }
        }

        digits.iter().rev().map(|d| (b'0' + d) as char).collect()
    }

    pub fn from_decimal(s: &str) -> Result<Self, NonceError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(NonceError::Empty);
        }
        let mut bytes = [0u8; 32];
        for c in s.chars() {
            let digit = c.to_digit(10).ok_or(NonceError::InvalidDigit(c))?;
            let mut carry = digit;
            for byte in bytes.iter_mut().rev() {
                let val = (*byte as u32) * 10 + carry;
                *byte = (val & 0xff) as u8;
                carry = val >> 8;
            }
            if carry != 0 {
                return Err(NonceError::Overflow);
            }
        }
        Ok(Self(bytes))
    }

    /// Parses `0x`-prefixed hex (up to 64 digits).
    pub fn from_hex(s: &str) -> Result<Self, NonceError> {
        let h = s.trim().trim_start_matches("0x");
        if h.is_empty() {
            return Err(NonceError::Empty);
        }
        if h.len() > 64 {
            return Err(NonceError::Overflow);
        }
        if let Some(c) = h.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(NonceError::InvalidDigit(c));
        }
        let padded = format!("{h:0>64}");
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(&padded, &mut bytes).map_err(|_| NonceError::Overflow)?;
        Ok(Self(bytes))
    }
}

impl FromStr for SaltNonce {
    type Err = NonceError;

    /// `0x...` is read as hex, anything else as decimal.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().starts_with("0x") {
            Self::from_hex(s)
        } else {
            Self::from_decimal(s)
        }
    }
}

impl From<SaltNonce> for alloy_primitives::U256 {
    fn from(nonce: SaltNonce) -> Self {
        Self::from_be_bytes(nonce.0)
    }
}

impl fmt::Debug for SaltNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SaltNonce({})", self.to_decimal())
    }
}

impl fmt::Display for SaltNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_decimal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_small_values() {
        assert_eq!(SaltNonce::ZERO.to_decimal(), "0");
        assert_eq!(SaltNonce::from_u64(1643091116067).to_decimal(), "1643091116067");
        assert_eq!(SaltNonce::from_decimal("0").unwrap(), SaltNonce::ZERO);
        assert_eq!(
            SaltNonce::from_decimal("1643091116067").unwrap(),
            SaltNonce::from_u64(1643091116067)
        );
    }

    #[test]
    fn test_decimal_max_value() {
        let max = SaltNonce([0xff; 32]);
        let dec = max.to_decimal();
        assert_eq!(
            dec,
            "115792089237316195423570985008687907853269984665640564039457584007913129639935"
        );
        assert_eq!(SaltNonce::from_decimal(&dec).unwrap(), max);
        assert_eq!(
            SaltNonce::from_decimal(
                "115792089237316195423570985008687907853269984665640564039457584007913129639936"
            ),
            Err(NonceError::Overflow)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(SaltNonce::from_decimal(""), Err(NonceError::Empty));
        assert_eq!(SaltNonce::from_decimal("12a"), Err(NonceError::InvalidDigit('a')));
        assert_eq!("0x".parse::<SaltNonce>(), Err(NonceError::Empty));
    }

    #[test]
    fn test_hex_parse() {
        let n: SaltNonce = "0x17e63b10d14".parse().unwrap();
        assert_eq!(n, SaltNonce::from_u64(0x17e63b10d14));
    }

    #[test]
    fn test_increment_wraps() {
        let mut n = SaltNonce::from_u64(0xff);
        n.increment();
        assert_eq!(n, SaltNonce::from_u64(0x100));

        let mut max = SaltNonce([0xff; 32]);
        max.increment();
        assert_eq!(max, SaltNonce::ZERO);
    }

    #[test]
    fn test_u256_conversion_matches_decimal() {
        let n = SaltNonce::from_decimal("1643091116067").unwrap();
        assert_eq!(<alloy_primitives::U256 as From<SaltNonce>>::from(n).to_string(), n.to_decimal());
    }

    #[test]
    fn test_random_seeds_differ() {
        assert_ne!(SaltNonce::random_seed(), SaltNonce::random_seed());
    }
}
