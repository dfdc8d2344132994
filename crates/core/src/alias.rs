//! Aliases, target URLs and the records that bind them.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;
use url::Url;

/// Maximum alias length in characters.
pub const MAX_ALIAS_LEN: usize = 64;

/// Characters used for generated aliases.
///
/// Excludes glyphs that are easy to confuse when read aloud or copied by hand
/// (`0`/`O`/`o`, `1`/`l`/`I`).
pub const ALIAS_CHARSET: &[u8] = b"abcdefghijkmnpqrstuvwxyzABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// A short key mapped to a target URL.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Alias(String);

impl Alias {
    /// Parse and validate an alias.
    pub fn parse(s: &str) -> crate::Result<Self> {
        if s.is_empty() {
            return Err(crate::Error::InvalidAlias("alias is empty".to_string()));
        }

        let len = s.chars().count();
        if len > MAX_ALIAS_LEN {
            return Err(crate::Error::InvalidAlias(format!(
                "alias is {len} characters long (max {MAX_ALIAS_LEN})"
            )));
        }

        if let Some(c) = s
            .chars()
            .find(|c| c.is_whitespace() || c.is_control() || *c == '/')
        {
            return Err(crate::Error::InvalidAlias(format!(
                "alias contains forbidden character {c:?}"
            )));
        }

        Ok(Self(s.to_string()))
    }

    /// Get the alias as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Alias {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Alias {
    type Error = crate::Error;

    fn try_from(s: String) -> crate::Result<Self> {
        Self::parse(&s)
    }
}

impl From<Alias> for String {
    fn from(alias: Alias) -> Self {
        alias.0
    }
}

impl fmt::Debug for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Alias({})", self.0)
    }
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An absolute URL an alias redirects to.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TargetUrl(Url);

impl TargetUrl {
    /// Parse and validate a target URL.
    ///
    /// The URL must be absolute and carry a host.
    pub fn parse(s: &str) -> crate::Result<Self> {
        let url = Url::parse(s).map_err(|e| crate::Error::InvalidUrl(format!("{s:?}: {e}")))?;
        if !url.has_host() {
            return Err(crate::Error::InvalidUrl(format!("{s:?}: missing host")));
        }
        Ok(Self(url))
    }

    /// Get the URL as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Get the underlying URL.
    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

impl FromStr for TargetUrl {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TargetUrl {
    type Error = crate::Error;

    fn try_from(s: String) -> crate::Result<Self> {
        Self::parse(&s)
    }
}

impl From<TargetUrl> for String {
    fn from(url: TargetUrl) -> Self {
        url.0.into()
    }
}

impl fmt::Debug for TargetUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TargetUrl({})", self.0)
    }
}

impl fmt::Display for TargetUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// A stored alias binding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRecord {
    /// Unique key.
    pub alias: Alias,
    /// Where the alias redirects.
    pub target: TargetUrl,
    /// When the record was saved.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl AliasRecord {
    /// Create a record stamped with the current time.
    pub fn new(alias: Alias, target: TargetUrl) -> Self {
        Self {
            alias,
            target,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Random alias generator.
#[derive(Clone, Copy, Debug)]
pub struct AliasGenerator {
    length: usize,
}

impl AliasGenerator {
    /// Create a generator producing aliases of `length` characters.
    ///
    /// The length is clamped to `1..=MAX_ALIAS_LEN`.
    pub fn new(length: usize) -> Self {
        Self {
            length: length.clamp(1, MAX_ALIAS_LEN),
        }
    }

    /// Length of generated aliases.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Number of distinct aliases this generator can produce, saturating at `u128::MAX`.
    pub fn space_size(&self) -> u128 {
        (ALIAS_CHARSET.len() as u128)
            .checked_pow(self.length as u32)
            .unwrap_or(u128::MAX)
    }

    /// Generate a random candidate alias.
    pub fn generate(&self) -> Alias {
        let mut rng = rand::rng();
        let s: String = (0..self.length)
            .map(|_| ALIAS_CHARSET[rng.random_range(0..ALIAS_CHARSET.len())] as char)
            .collect();
        Alias(s)
    }
}

impl Default for AliasGenerator {
    fn default() -> Self {
        Self::new(6)
    }
}
