//! Vanity prefix/suffix constraints on 20-byte addresses.

use crate::crypto::Address;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("{0} must contain only hex characters (0-9, a-f)")]
    NotHex(&'static str),
    #[error("combined prefix + suffix cannot be longer than 40 characters")]
    TooLong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    Match,
    NoMatch,
}

impl MatchResult {
    #[inline]
    pub fn is_match(self) -> bool {
        matches!(self, MatchResult::Match)
    }
}

/// Prefix and/or suffix an address must carry. Matching is case-insensitive;
/// an empty side always matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pattern {
    prefix: String,
    suffix: String,
    /// Pre-parsed nibble arrays for zero-allocation matching.
    prefix_nibbles: Vec<u8>,
    suffix_nibbles: Vec<u8>,
}

/// Convert hex string to nibble array. Each char becomes one u8 (0..15).
fn hex_to_nibbles(hex: &str) -> Vec<u8> {
    hex.bytes()
        .map(|b| match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            b'A'..=b'F' => b - b'A' + 10,
            _ => 0,
        })
        .collect()
}

/// Convert 20-byte address to 40 nibbles on the stack (no heap allocation).
#[inline]
fn addr_to_nibbles(bytes: &[u8; 20]) -> [u8; 40] {
    let mut nibbles = [0u8; 40];
    for i in 0..20 {
        nibbles[i * 2] = bytes[i] >> 4;
        nibbles[i * 2 + 1] = bytes[i] & 0x0f;
    }
    nibbles
}

fn normalize(raw: Option<&str>, what: &'static str) -> Result<String, PatternError> {
    let s = raw.unwrap_or("").trim();
    let s = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    if !s.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(PatternError::NotHex(what));
    }
    Ok(s.to_lowercase())
}

impl Pattern {
    /// Builds a pattern from user input. `0x` is stripped from either side.
    pub fn new(prefix: Option<&str>, suffix: Option<&str>) -> Result<Self, PatternError> {
        let prefix = normalize(prefix, "prefix")?;
        let suffix = normalize(suffix, "suffix")?;
        if prefix.len() + suffix.len() > 40 {
            return Err(PatternError::TooLong);
        }
        Ok(Self {
            prefix_nibbles: hex_to_nibbles(&prefix),
            suffix_nibbles: hex_to_nibbles(&suffix),
            prefix,
            suffix,
        })
    }

    /// Matches every address (expert mode).
    pub fn any() -> Self {
        Self::default()
    }

    /// Returns the required leading hex digits, lowercased.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the required trailing hex digits, lowercased.
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Whether every address matches.
    pub fn is_unconstrained(&self) -> bool {
        self.prefix.is_empty() && self.suffix.is_empty()
    }

    #[inline]
    pub fn matches(&self, address: &Address) -> MatchResult {
        let nibbles = addr_to_nibbles(address.as_bytes());
        let p = self.prefix_nibbles.len();
        let s = self.suffix_nibbles.len();
        if nibbles[..p] == *self.prefix_nibbles && nibbles[40 - s..] == *self.suffix_nibbles {
            MatchResult::Match
        } else {
            MatchResult::NoMatch
        }
    }

    /// Expected number of probes: 16^(constrained nibbles).
    pub fn estimated_difficulty(&self) -> u64 {
        let n = self.prefix.len() + self.suffix.len();
        16u64.saturating_pow(n as u32)
    }

    pub fn difficulty_description(&self) -> String {
        let d = self.estimated_difficulty();
        match d {
            0..=1_000 => "Very Easy (< 1 second)".into(),
            1_001..=100_000 => "Easy (seconds)".into(),
            100_001..=10_000_000 => "Medium (minutes)".into(),
            10_000_001..=1_000_000_000 => "Hard (hours)".into(),
            _ => "Very Hard (days or more)".into(),
        }
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.prefix.is_empty(), self.suffix.is_empty()) {
            (true, true) => write!(f, "(any)"),
            (false, true) => write!(f, "0x{}...", self.prefix),
            (true, false) => write!(f, "0x...{}", self.suffix),
            (false, false) => write!(f, "0x{}...{}", self.prefix, self.suffix),
        }
    }
}
