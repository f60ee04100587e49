//! Access permission decoding for memory regions.
//!
//! The kernel renders the permissions of a mapping as a fixed four character
//! string such as `rwxp` or `r--s`. Decoding is positional and lenient so
//! that future format extensions never break parsing.

use std::fmt;
use std::str::FromStr;

/// Decoded permission bits of a single mapping.
///
/// `shared` and `private` are never both set; both are unset when the
/// fourth character is neither `s` nor `p`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AccessFlags {
    pub readable: bool,
    pub writable: bool,
    pub executable: bool,
    pub shared: bool,
    pub private: bool,
}

impl AccessFlags {
    /// Decodes a permission string. Never fails: unknown characters and
    /// missing positions simply leave the flag unset.
    pub fn parse(perms: &str) -> Self {
        let b = perms.as_bytes();
        let at = |i: usize| b.get(i).copied();

        Self {
            readable: at(0) == Some(b'r'),
            writable: at(1) == Some(b'w'),
            executable: at(2) == Some(b'x'),
            shared: at(3) == Some(b's'),
            private: at(3) == Some(b'p'),
        }
    }
}

impl From<&str> for AccessFlags {
    fn from(perms: &str) -> Self {
        Self::parse(perms)
    }
}

impl FromStr for AccessFlags {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for AccessFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sharing = if self.shared {
            's'
        } else if self.private {
            'p'
        } else {
            '-'
        };
        write!(
            f,
            "{}{}{}{}",
            if self.readable { 'r' } else { '-' },
            if self.writable { 'w' } else { '-' },
            if self.executable { 'x' } else { '-' },
            sharing
        )
    }
}
